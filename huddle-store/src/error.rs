//! Error types for the store contract

use thiserror::Error;

/// Result type for store operations
pub type Result<T> = std::result::Result<T, StoreError>;

/// Errors that can occur talking to a remote store
#[derive(Debug, Error)]
pub enum StoreError {
    /// The connection to the store is gone
    #[error("store disconnected")]
    Disconnected,

    /// The subscription stream was closed by the store
    #[error("subscription closed for {path}")]
    SubscriptionClosed { path: String },

    /// The store refused a write
    #[error("write rejected at {path}: {message}")]
    WriteRejected { path: String, message: String },

    /// A path could not be used to address the tree
    #[error("invalid path '{path}': {message}")]
    InvalidPath { path: String, message: String },

    /// JSON serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl StoreError {
    /// Create a write-rejected error
    pub fn write_rejected(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self::WriteRejected {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Create an invalid path error
    pub fn invalid_path(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidPath {
            path: path.into(),
            message: message.into(),
        }
    }
}
