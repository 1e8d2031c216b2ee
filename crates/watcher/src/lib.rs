#![deny(warnings)]
#![cfg_attr(not(test), deny(clippy::unwrap_used))]
#![cfg_attr(not(test), deny(clippy::expect_used))]

//! Filesystem watcher registry and event dispatch
//!
//! This crate provides the engine behind the pod:
//! - Directory expansion for recursive watches
//! - A registry of OS watch handles keyed by integer ids
//! - One forwarding task per watcher translating OS notifications into events
//!
//! # Example
//!
//! ```no_run
//! use fswatch_core::config::WatcherConfig;
//! use fswatch_watcher::{WatchEvent, WatchOptions, WatcherService};
//! use std::sync::Arc;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel::<WatchEvent>();
//! let mut service = WatcherService::new(WatcherConfig::default());
//!
//! let id = service.create("/tmp/a.txt", &WatchOptions::default(), Arc::new(tx))?;
//!
//! while let Some(event) = rx.recv().await {
//!     println!("{id}: {event:?}");
//! }
//! # Ok(())
//! # }
//! ```

mod events;
mod expand;
mod options;
mod watcher;

pub use events::{classify, ChangeKind, EventSink, UnrecognizedEventKind, WatchEvent};
pub use expand::DirectoryExpander;
pub use options::WatchOptions;
pub use watcher::{WatcherId, WatcherInfo, WatcherService};
