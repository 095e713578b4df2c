//! Column type

use super::ids::{ColumnId, TaskId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A named, ordered group of tasks.
///
/// `task_ids` defines the rendering order and must never contain the same
/// id twice. The ordering operations in [`crate::ordering`] preserve that.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Column {
    pub id: ColumnId,
    pub title: String,
    #[serde(default)]
    pub task_ids: Vec<TaskId>,
    pub created_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Column {
    /// Create a new empty column with the given title
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            id: ColumnId::new(),
            title: title.into(),
            task_ids: Vec::new(),
            created_at: Utc::now(),
            updated_at: None,
        }
    }

    /// Rename the column, stamping `updated_at`
    pub fn rename(&mut self, title: impl Into<String>) {
        self.title = title.into();
        self.updated_at = Some(Utc::now());
    }

    /// Index of a task in this column's ordering, if present
    pub fn position_of(&self, task: &TaskId) -> Option<usize> {
        self.task_ids.iter().position(|id| id == task)
    }

    /// Whether this column references the task
    pub fn contains(&self, task: &TaskId) -> bool {
        self.position_of(task).is_some()
    }
}
