//! Error types for the pod protocol

use thiserror::Error;

/// Result type alias for protocol operations
pub type Result<T> = std::result::Result<T, PodError>;

/// Errors that can occur while serving the pod protocol
#[derive(Debug, Error)]
pub enum PodError {
    #[error("Bencode error: {0}")]
    Bencode(#[from] serde_bencode::Error),

    #[error("Invalid JSON payload: {0}")]
    Json(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Unknown op {0}")]
    UnknownOp(String),

    #[error("Unknown var {0}")]
    UnknownVar(String),

    #[error("Invalid arguments: {0}")]
    InvalidArgs(String),

    #[error(transparent)]
    Watch(#[from] fswatch_core::Error),
}

impl PodError {
    /// Text sent to the host as `ex-message` in an error reply
    pub fn ex_message(&self) -> String {
        match self {
            PodError::Watch(e) => e.to_string(),
            PodError::Json(e) => format!("Invalid arguments: {e}"),
            other => other.to_string(),
        }
    }
}
