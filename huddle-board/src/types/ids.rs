//! ID wrapper types for type-safe identifiers.
//!
//! Strongly typed string wrappers so column, task, and user ids cannot be
//! mixed up. Fresh ids are ULIDs, which stay collision-free under
//! concurrent creation by independent clients; `from_string` adopts ids
//! that already exist in the store.

use serde::{Deserialize, Serialize};
use std::fmt;
use ulid::Ulid;

/// Identifier of a column
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ColumnId(String);

impl ColumnId {
    /// Mint a fresh ULID-backed id
    pub fn new() -> Self {
        Self(Ulid::new().to_string())
    }

    /// Adopt an existing id
    pub fn from_string(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    /// Get the id as a string
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ColumnId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Default for ColumnId {
    fn default() -> Self {
        Self::new()
    }
}

impl From<&str> for ColumnId {
    fn from(s: &str) -> Self {
        Self::from_string(s)
    }
}

/// Identifier of a task
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaskId(String);

impl TaskId {
    /// Mint a fresh ULID-backed id
    pub fn new() -> Self {
        Self(Ulid::new().to_string())
    }

    /// Adopt an existing id
    pub fn from_string(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    /// Get the id as a string
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Default for TaskId {
    fn default() -> Self {
        Self::new()
    }
}

impl From<&str> for TaskId {
    fn from(s: &str) -> Self {
        Self::from_string(s)
    }
}

/// Identifier of a participant, scoped to one session
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(String);

impl UserId {
    /// Mint a fresh ULID-backed id
    pub fn new() -> Self {
        Self(Ulid::new().to_string())
    }

    /// Adopt an existing id
    pub fn from_string(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    /// Get the id as a string
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Default for UserId {
    fn default() -> Self {
        Self::new()
    }
}

impl From<&str> for UserId {
    fn from(s: &str) -> Self {
        Self::from_string(s)
    }
}
