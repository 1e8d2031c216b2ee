//! Per-request watch options
//!
//! Options arrive from the host as a JSON object with kebab-case keys, e.g.
//! `{"delay-ms": 500, "recursive": true}`. Missing keys take their defaults.

use serde::{Deserialize, Serialize};
use std::time::Duration;

const DEFAULT_DELAY_MS: u64 = 2000;

fn default_delay_ms() -> u64 {
    DEFAULT_DELAY_MS
}

/// Options accepted by a watch request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct WatchOptions {
    /// Requested delay in milliseconds (default: 2000). Accepted as part of the
    /// request shape; events are forwarded as they arrive.
    #[serde(default = "default_delay_ms")]
    pub delay_ms: u64,
    /// Expand a directory into every nested path (default: false)
    #[serde(default)]
    pub recursive: bool,
}

impl WatchOptions {
    /// Options with all defaults
    pub fn new() -> Self {
        Self::default()
    }

    /// Set whether the watch expands directories recursively
    pub fn with_recursive(mut self, recursive: bool) -> Self {
        self.recursive = recursive;
        self
    }

    /// Set the requested delay in milliseconds
    pub fn with_delay_ms(mut self, ms: u64) -> Self {
        self.delay_ms = ms;
        self
    }

    /// Get the requested delay
    pub fn delay(&self) -> Duration {
        Duration::from_millis(self.delay_ms)
    }
}

impl Default for WatchOptions {
    fn default() -> Self {
        Self {
            delay_ms: DEFAULT_DELAY_MS,
            recursive: false,
        }
    }
}
