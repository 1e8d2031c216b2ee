//! Core types shared by the fswatch pod crates
//!
//! - **Configuration**: layered file + environment configuration
//! - **Error handling**: unified error types
//!

pub mod config;
pub mod error;

// Re-export main types for convenience
pub use config::{Config, LoggingConfig, WatcherConfig};
pub use error::{Error, Result};
