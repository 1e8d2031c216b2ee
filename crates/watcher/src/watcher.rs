//! Watcher registry and event dispatch
//!
//! `WatcherService` owns every live OS watch handle, keyed by the id handed
//! back to the host. Each handle gets one forwarding task that turns OS
//! notifications into [`WatchEvent`]s on the sink of the request that created
//! it. Registry mutation goes through `&mut self`, so a single request path owns
//! the registry and the id counter.

use crate::{
    events::{EventSink, WatchEvent},
    expand::DirectoryExpander,
    options::WatchOptions,
};
use fswatch_core::config::WatcherConfig;
use fswatch_core::error::{Error, Result};
use notify::{
    Config as NotifyConfig, Event as NotifyEvent, RecommendedWatcher, RecursiveMode,
    Watcher as NotifyWatcher,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, trace, warn};

type NotifyResult = notify::Result<NotifyEvent>;

/// Identifier of a watcher, unique for the lifetime of the process
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WatcherId(u64);

impl WatcherId {
    /// Wrap a raw id received from the host
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    /// Raw integer value
    pub fn get(self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for WatcherId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

/// Reply to a successful watch request
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WatcherInfo {
    #[serde(rename = "watcher-id")]
    pub watcher_id: WatcherId,
    #[serde(rename = "type")]
    kind: &'static str,
}

impl WatcherInfo {
    pub fn new(watcher_id: WatcherId) -> Self {
        Self {
            watcher_id,
            kind: "watcher-info",
        }
    }
}

/// A registered watcher. Dropping it releases the OS handle, which closes the
/// notification channel, and stops the forwarding task.
struct ActiveWatcher {
    root: PathBuf,
    /// Kept alive for its OS registrations only
    _handle: RecommendedWatcher,
    cancellation_token: CancellationToken,
    _task: JoinHandle<()>,
}

impl Drop for ActiveWatcher {
    fn drop(&mut self) {
        self.cancellation_token.cancel();
    }
}

/// Registry of live watchers
pub struct WatcherService {
    config: WatcherConfig,
    expander: DirectoryExpander,
    watchers: HashMap<WatcherId, ActiveWatcher>,
    /// Last id handed out; ids start at 1 and are never reused
    last_id: u64,
}

impl WatcherService {
    /// Create an empty registry
    pub fn new(config: WatcherConfig) -> Self {
        let expander = DirectoryExpander::new().follow_symlinks(config.follow_symlinks);
        Self {
            config,
            expander,
            watchers: HashMap::new(),
            last_id: 0,
        }
    }

    /// Start watching `path`, forwarding its events to `sink`.
    ///
    /// With `options.recursive`, a directory is expanded and every nested path
    /// is registered on its own. Any failure leaves nothing registered: the
    /// partially built handle is dropped, which undoes the paths already added.
    /// Must be called from within a tokio runtime.
    pub fn create(
        &mut self,
        path: impl AsRef<Path>,
        options: &WatchOptions,
        sink: Arc<dyn EventSink>,
    ) -> Result<WatcherId> {
        let root = path.as_ref().to_path_buf();

        let paths = if options.recursive {
            self.expander.enumerate(&root)?
        } else {
            vec![root.clone()]
        };

        let (tx, rx) = mpsc::channel(self.config.event_channel_capacity);
        let mut handle = create_notify_watcher(tx)?;

        for p in &paths {
            handle
                .watch(p, RecursiveMode::NonRecursive)
                .map_err(|e| Error::watcher(format!("Failed to watch path {p:?}: {e}")))?;
        }

        self.last_id += 1;
        let id = WatcherId(self.last_id);

        let cancellation_token = CancellationToken::new();
        let task = spawn_forwarder(id, root.clone(), rx, sink, cancellation_token.clone());

        info!(
            "Watcher {} watching {:?} ({} paths, recursive: {}, delay: {:?})",
            id,
            root,
            paths.len(),
            options.recursive,
            options.delay()
        );

        self.watchers.insert(
            id,
            ActiveWatcher {
                root,
                _handle: handle,
                cancellation_token,
                _task: task,
            },
        );

        Ok(id)
    }

    /// Stop a watcher and release its OS handle.
    ///
    /// Returns `false` when the id is unknown, including ids that were already
    /// cancelled. That case is not an error.
    pub fn cancel(&mut self, id: WatcherId) -> bool {
        match self.watchers.remove(&id) {
            Some(watcher) => {
                info!("Watcher {} on {:?} released", id, watcher.root);
                true
            }
            None => {
                debug!("Cancel for unknown watcher {}", id);
                false
            }
        }
    }

    /// Stop every watcher. Returns how many were released.
    pub fn cancel_all(&mut self) -> usize {
        let count = self.watchers.len();
        self.watchers.clear();
        if count > 0 {
            info!("Released {} watchers", count);
        }
        count
    }

    /// Number of live watchers
    pub fn len(&self) -> usize {
        self.watchers.len()
    }

    /// Whether no watcher is live
    pub fn is_empty(&self) -> bool {
        self.watchers.is_empty()
    }

    /// Whether `id` refers to a live watcher
    pub fn contains(&self, id: WatcherId) -> bool {
        self.watchers.contains_key(&id)
    }

    /// Root path a live watcher was created with
    pub fn root(&self, id: WatcherId) -> Option<&Path> {
        self.watchers.get(&id).map(|w| w.root.as_path())
    }
}

impl std::fmt::Debug for WatcherService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WatcherService")
            .field("config", &self.config)
            .field("watchers", &self.watchers.len())
            .field("last_id", &self.last_id)
            .finish()
    }
}

/// Create a notify watcher feeding `tx`.
///
/// The callback runs on notify's own thread, so it may block when the
/// channel is full instead of dropping notifications.
fn create_notify_watcher(tx: mpsc::Sender<NotifyResult>) -> Result<RecommendedWatcher> {
    RecommendedWatcher::new(
        move |res: NotifyResult| {
            if tx.blocking_send(res).is_err() {
                trace!("Watch channel closed, dropping notification");
            }
        },
        NotifyConfig::default(),
    )
    .map_err(|e| Error::watcher(format!("Failed to create watcher: {e}")))
}

/// Forward notifications for one watcher until it is cancelled or its
/// channel closes. Cancellation is checked before every emission.
fn spawn_forwarder(
    id: WatcherId,
    root: PathBuf,
    mut rx: mpsc::Receiver<NotifyResult>,
    sink: Arc<dyn EventSink>,
    cancellation_token: CancellationToken,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            let item = tokio::select! {
                biased;
                _ = cancellation_token.cancelled() => break,
                item = rx.recv() => item,
            };

            let Some(res) = item else {
                break;
            };

            if cancellation_token.is_cancelled() {
                break;
            }

            match res {
                Ok(event) => {
                    trace!("Watcher {} received {:?}", id, event);
                    match WatchEvent::from_notify(&root, &event) {
                        Ok(Some(out)) => sink.emit(out),
                        Ok(None) => {}
                        Err(e) => {
                            warn!("Watcher {}: {}", id, e);
                            sink.emit(WatchEvent::error(&root, e.to_string()));
                        }
                    }
                }
                Err(e) => {
                    warn!("Watcher {} reported an error: {}", id, e);
                    sink.emit(WatchEvent::error(&root, e.to_string()));
                }
            }
        }
        debug!("Forwarder for watcher {} stopped", id);
    })
}
