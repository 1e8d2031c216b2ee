//! Configuration module for the fswatch pod
//!
//! Configuration can be loaded from a TOML file and/or environment variables.
//! Nothing here is required: a pod started by a host with no config file and
//! no environment overrides runs on the defaults.

mod defaults;
mod loading;


use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use defaults::*;

/// Environment variable prefix for configuration overrides
pub const ENV_PREFIX: &str = "FSWATCH_POD";

/// Returns the path to the global configuration file
///
/// The global config is stored at `~/.fswatch-pod/config.toml`.
pub fn global_config_path() -> Result<PathBuf> {
    let home_dir = dirs::home_dir()
        .ok_or_else(|| Error::config("Unable to determine home directory".to_string()))?;
    Ok(home_dir.join(".fswatch-pod").join("config.toml"))
}

/// Main configuration structure for the pod
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// File watcher configuration
    #[serde(default)]
    pub watcher: WatcherConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Configuration for the watcher registry and directory expansion
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WatcherConfig {
    /// Buffered notifications per watcher between the OS notification thread
    /// and the forwarding task. The notification thread blocks when it is full.
    #[serde(default = "default_event_channel_capacity")]
    pub event_channel_capacity: usize,

    /// Follow symbolic links while expanding a recursive watch
    #[serde(default = "default_follow_symlinks")]
    pub follow_symlinks: bool,
}

impl Default for WatcherConfig {
    fn default() -> Self {
        Self {
            event_channel_capacity: default_event_channel_capacity(),
            follow_symlinks: default_follow_symlinks(),
        }
    }
}

/// Logging configuration
///
/// Logs always go to stderr; stdout carries the pod protocol.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Default tracing filter directive, used when `RUST_LOG` is unset
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

impl Config {
    /// Validates the configuration values
    pub fn validate(&self) -> Result<()> {
        if self.watcher.event_channel_capacity == 0 {
            return Err(Error::config(
                "watcher.event_channel_capacity must be greater than 0".to_string(),
            ));
        }

        EnvFilter::try_new(&self.logging.level).map_err(|e| {
            Error::config(format!(
                "Invalid logging.level '{}': {e}",
                self.logging.level
            ))
        })?;

        Ok(())
    }
}
