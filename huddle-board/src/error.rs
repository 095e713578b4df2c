//! Error types for the board engine

use huddle_store::StoreError;
use thiserror::Error;

/// Result type for board operations
pub type Result<T> = std::result::Result<T, BoardError>;

/// Errors that can occur in board operations
#[derive(Debug, Error)]
pub enum BoardError {
    /// Column not found
    #[error("column not found: {id}")]
    ColumnNotFound { id: String },

    /// Task not found
    #[error("task not found: {id}")]
    TaskNotFound { id: String },

    /// Task is not in the column an operation expected it in
    #[error("task {task} is not in column {column}")]
    TaskNotInColumn { task: String, column: String },

    /// An ordering index was outside the list
    #[error("index {index} out of bounds for list of {len}")]
    IndexOutOfBounds { index: usize, len: usize },

    /// A pushed snapshot could not be decoded
    #[error("malformed snapshot: {message}")]
    MalformedSnapshot { message: String },

    /// Store error
    #[error("store error: {0}")]
    Store(#[from] StoreError),

    /// JSON serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl BoardError {
    /// Create a column-not-found error
    pub fn column_not_found(id: impl Into<String>) -> Self {
        Self::ColumnNotFound { id: id.into() }
    }

    /// Create a task-not-found error
    pub fn task_not_found(id: impl Into<String>) -> Self {
        Self::TaskNotFound { id: id.into() }
    }

    /// Create a task-not-in-column error
    pub fn task_not_in_column(task: impl Into<String>, column: impl Into<String>) -> Self {
        Self::TaskNotInColumn {
            task: task.into(),
            column: column.into(),
        }
    }

    /// Create a malformed-snapshot error
    pub fn malformed_snapshot(message: impl Into<String>) -> Self {
        Self::MalformedSnapshot {
            message: message.into(),
        }
    }
}
