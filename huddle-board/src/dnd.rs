//! Translating drag-and-drop events into board operations
//!
//! The drag library owns hit-testing and visuals and hands us an opaque
//! `{active, over}` id pair when a drag ends. The board's only job is to
//! turn that pair, against the current snapshot, into one of the ordering
//! operations - or nothing, when the drop changes nothing.

use crate::types::{BoardSnapshot, ColumnId, TaskId};

/// A resolved drag result, ready to feed into the engine operation of the
/// same name
#[derive(Debug, Clone, PartialEq)]
pub enum DragIntent {
    /// Reorder a task within its column
    ReorderTasks {
        column: ColumnId,
        from: usize,
        to: usize,
    },
    /// Move a task to another column at `dest_index`
    MoveTask {
        task: TaskId,
        source: ColumnId,
        dest: ColumnId,
        dest_index: usize,
    },
    /// Reorder the columns themselves
    ReorderColumns { from: usize, to: usize },
}

/// Resolve a drag-end event against the snapshot the user was looking at.
///
/// Returns `None` when the drop is a no-op (dropped on itself, same
/// position) or when either id no longer resolves - a concurrent edit may
/// have deleted the task mid-drag, in which case there is nothing sensible
/// to do with the gesture.
pub fn resolve_drag_end(board: &BoardSnapshot, active: &str, over: &str) -> Option<DragIntent> {
    if active == over {
        return None;
    }

    let active_task = TaskId::from_string(active);
    if board.tasks.contains_key(&active_task) {
        return resolve_task_drag(board, &active_task, over);
    }

    let active_column = ColumnId::from_string(active);
    if board.columns.contains_key(&active_column) {
        return resolve_column_drag(board, &active_column, over);
    }

    None
}

fn resolve_task_drag(board: &BoardSnapshot, task: &TaskId, over: &str) -> Option<DragIntent> {
    let source = board.column_of_task(task)?;

    // Dropped on another task: land at that task's position.
    let over_task = TaskId::from_string(over);
    if board.tasks.contains_key(&over_task) {
        let dest = board.column_of_task(&over_task)?;
        if source.id == dest.id {
            let from = source.position_of(task)?;
            let to = source.position_of(&over_task)?;
            if from == to {
                return None;
            }
            return Some(DragIntent::ReorderTasks {
                column: source.id.clone(),
                from,
                to,
            });
        }
        return Some(DragIntent::MoveTask {
            task: task.clone(),
            source: source.id.clone(),
            dest: dest.id.clone(),
            dest_index: dest.position_of(&over_task)?,
        });
    }

    // Dropped on a column body: land at the top of that column.
    let over_column = ColumnId::from_string(over);
    if board.columns.contains_key(&over_column) {
        if source.id == over_column {
            return None;
        }
        return Some(DragIntent::MoveTask {
            task: task.clone(),
            source: source.id.clone(),
            dest: over_column,
            dest_index: 0,
        });
    }

    None
}

fn resolve_column_drag(
    board: &BoardSnapshot,
    column: &ColumnId,
    over: &str,
) -> Option<DragIntent> {
    let over_column = ColumnId::from_string(over);
    if !board.columns.contains_key(&over_column) {
        return None;
    }
    let from = board.column_order.iter().position(|id| id == column)?;
    let to = board.column_order.iter().position(|id| id == &over_column)?;
    if from == to {
        return None;
    }
    Some(DragIntent::ReorderColumns { from, to })
}
