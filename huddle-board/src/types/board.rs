//! The board aggregate as one decoded snapshot

use super::column::Column;
use super::ids::{ColumnId, TaskId};
use super::task::Task;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

/// Everything under the `board/` subtree, decoded.
///
/// This is what a subscription push decodes into and what the engine's
/// projection holds. Every field defaults, so a partial or `Null` push
/// (fresh store, or a concurrent delete of a whole subtree) reads as empty
/// rather than failing.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BoardSnapshot {
    #[serde(default)]
    pub columns: HashMap<ColumnId, Column>,
    #[serde(default)]
    pub tasks: HashMap<TaskId, Task>,
    #[serde(default)]
    pub column_order: Vec<ColumnId>,
}

impl BoardSnapshot {
    /// Decode a pushed store value; `Null` decodes to the empty board
    pub fn from_value(value: Value) -> serde_json::Result<Self> {
        if value.is_null() {
            return Ok(Self::default());
        }
        serde_json::from_value(value)
    }

    /// The column whose ordering references `task`, if any
    pub fn column_of_task(&self, task: &TaskId) -> Option<&Column> {
        self.columns.values().find(|column| column.contains(task))
    }

    /// Columns in rendering order.
    ///
    /// Order entries without a matching column record are skipped; the
    /// membership invariants are eventual, not transactional.
    pub fn ordered_columns(&self) -> impl Iterator<Item = &Column> {
        self.column_order
            .iter()
            .filter_map(|id| self.columns.get(id))
    }

    /// Total number of task references across all columns
    pub fn task_count(&self) -> usize {
        self.columns.values().map(|c| c.task_ids.len()).sum()
    }

    /// Task entities referenced by no column's ordering.
    ///
    /// These are the leftovers of a create that wrote its entity but lost
    /// the ordering-list append; invisible in rendering, still stored.
    pub fn orphaned_tasks(&self) -> Vec<TaskId> {
        self.tasks
            .keys()
            .filter(|id| self.column_of_task(id).is_none())
            .cloned()
            .collect()
    }
}
