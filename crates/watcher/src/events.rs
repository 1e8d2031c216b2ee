//! Outbound event types and OS event translation
//!
//! Every event carries the root path of the watch request that produced it,
//! not the path inside a watched tree where the change actually happened.

use notify::event::{EventKind, ModifyKind, RenameMode};
use serde::{Serialize, Serializer};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::trace;

/// Kind of change reported to the host
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeKind {
    /// Permissions or other metadata changed
    Chmod,
    /// Path was created (or moved into a watched location)
    Create,
    /// Path was removed
    Remove,
    /// Path was renamed or moved away
    Rename,
    /// File contents changed
    Write,
}

impl ChangeKind {
    /// Wire name of the kind
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Chmod => "chmod",
            Self::Create => "create",
            Self::Remove => "remove",
            Self::Rename => "rename",
            Self::Write => "write",
        }
    }
}

impl std::fmt::Display for ChangeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An OS notification whose kind has no protocol counterpart
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unrecognized event kind {kind:?}")]
pub struct UnrecognizedEventKind {
    pub kind: EventKind,
}

/// Maps an OS event kind to the change kind reported to the host.
///
/// `Ok(None)` means nothing is reported: file access, and the paired rename
/// notification some backends add after the `From`/`To` halves were already
/// delivered.
pub fn classify(kind: &EventKind) -> Result<Option<ChangeKind>, UnrecognizedEventKind> {
    match kind {
        EventKind::Create(_) => Ok(Some(ChangeKind::Create)),
        EventKind::Remove(_) => Ok(Some(ChangeKind::Remove)),
        EventKind::Modify(ModifyKind::Metadata(_)) => Ok(Some(ChangeKind::Chmod)),
        EventKind::Modify(ModifyKind::Name(RenameMode::To)) => Ok(Some(ChangeKind::Create)),
        EventKind::Modify(ModifyKind::Name(RenameMode::Both)) => {
            trace!("Skipping paired rename notification");
            Ok(None)
        }
        EventKind::Modify(ModifyKind::Name(_)) => Ok(Some(ChangeKind::Rename)),
        EventKind::Modify(ModifyKind::Data(_) | ModifyKind::Any | ModifyKind::Other) => {
            Ok(Some(ChangeKind::Write))
        }
        EventKind::Access(_) => Ok(None),
        EventKind::Any | EventKind::Other => Err(UnrecognizedEventKind { kind: *kind }),
    }
}

/// Asynchronous message emitted for a watcher
///
/// Serializes as `{"type": "<kind>", "path": "...", "dest"?: "...", "error"?: "..."}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum WatchEvent {
    Chmod {
        path: PathBuf,
    },
    Create {
        path: PathBuf,
    },
    Remove {
        path: PathBuf,
    },
    Rename {
        path: PathBuf,
        #[serde(
            skip_serializing_if = "Option::is_none",
            serialize_with = "serialize_lossy"
        )]
        dest: Option<PathBuf>,
    },
    Write {
        path: PathBuf,
    },
    /// The OS watch facility reported an error; the watcher keeps running
    Error {
        path: PathBuf,
        error: String,
    },
}

/// OS paths need not be UTF-8; invalid sequences become U+FFFD
fn serialize_lossy<S>(path: &Option<PathBuf>, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    match path {
        Some(path) => serializer.serialize_some(&*path.to_string_lossy()),
        None => serializer.serialize_none(),
    }
}

impl WatchEvent {
    /// Build a change event for `root`. `dest` is only kept for renames.
    pub fn change(kind: ChangeKind, root: &Path, dest: Option<PathBuf>) -> Self {
        let path = root.to_path_buf();
        match kind {
            ChangeKind::Chmod => Self::Chmod { path },
            ChangeKind::Create => Self::Create { path },
            ChangeKind::Remove => Self::Remove { path },
            ChangeKind::Rename => Self::Rename { path, dest },
            ChangeKind::Write => Self::Write { path },
        }
    }

    /// Build an error event for `root`
    pub fn error(root: &Path, message: impl Into<String>) -> Self {
        Self::Error {
            path: root.to_path_buf(),
            error: message.into(),
        }
    }

    /// Translate an OS notification into the event reported for `root`.
    ///
    /// A rename takes the last path the OS reported as its destination.
    pub fn from_notify(
        root: &Path,
        event: &notify::Event,
    ) -> Result<Option<Self>, UnrecognizedEventKind> {
        let Some(kind) = classify(&event.kind)? else {
            trace!("Skipping non-change event {:?} under {:?}", event.kind, root);
            return Ok(None);
        };

        let dest = match kind {
            ChangeKind::Rename => event.paths.last().cloned(),
            _ => None,
        };

        Ok(Some(Self::change(kind, root, dest)))
    }

    /// Root path of the watch that produced this event
    pub fn path(&self) -> &Path {
        match self {
            Self::Chmod { path }
            | Self::Create { path }
            | Self::Remove { path }
            | Self::Rename { path, .. }
            | Self::Write { path }
            | Self::Error { path, .. } => path,
        }
    }

    /// Change kind, or `None` for error events
    pub fn kind(&self) -> Option<ChangeKind> {
        match self {
            Self::Chmod { .. } => Some(ChangeKind::Chmod),
            Self::Create { .. } => Some(ChangeKind::Create),
            Self::Remove { .. } => Some(ChangeKind::Remove),
            Self::Rename { .. } => Some(ChangeKind::Rename),
            Self::Write { .. } => Some(ChangeKind::Write),
            Self::Error { .. } => None,
        }
    }
}

/// Destination for the events of one watcher
///
/// The protocol layer binds one sink to each watch request so events travel
/// back on that request's channel. `emit` must not block.
pub trait EventSink: Send + Sync {
    fn emit(&self, event: WatchEvent);
}

impl EventSink for tokio::sync::mpsc::UnboundedSender<WatchEvent> {
    fn emit(&self, event: WatchEvent) {
        if self.send(event).is_err() {
            trace!("Event receiver dropped");
        }
    }
}
