use std::path::{Path, PathBuf};
use thiserror::Error;

/// Result type for fswatch operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for fswatch operations
#[derive(Error, Debug)]
pub enum Error {
    /// A path could not be statted or walked
    #[error("File system error at {}: {source}", path.display())]
    FileSystem {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Configuration related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// OS watch facility errors (handle creation, path registration)
    #[error("Watcher error: {0}")]
    Watcher(String),
}

impl Error {
    /// Creates a file system error for `path`
    pub fn file_system(path: impl AsRef<Path>, source: std::io::Error) -> Self {
        Self::FileSystem {
            path: path.as_ref().to_path_buf(),
            source,
        }
    }

    /// Creates a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Creates a watcher error
    pub fn watcher(msg: impl Into<String>) -> Self {
        Self::Watcher(msg.into())
    }
}
