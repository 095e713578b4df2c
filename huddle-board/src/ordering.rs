//! Ordering operations over the board's id lists.
//!
//! Pure list math, no I/O: the engine reads the current lists from the
//! store, stages new lists here, writes them back, and waits for the
//! authoritative push. Keeping these free of store calls is what makes the
//! invariants (no duplicates, conservation across moves) testable in
//! isolation.
//!
//! Removal and insertion are both id-based and validated against the lists
//! as just read. A drag that raced a concurrent edit fails with
//! [`BoardError::TaskNotInColumn`] instead of deleting whatever shifted
//! into a stale index.

use crate::error::{BoardError, Result};
use crate::types::{ColumnId, TaskId};

/// The staged result of a cross-column (or within-column) move
#[derive(Debug, Clone, PartialEq)]
pub struct MovePlan {
    /// New ordering for the source column
    pub source: Vec<TaskId>,
    /// New ordering for the destination column; `None` when the move stays
    /// within the source column and only one list changes
    pub dest: Option<Vec<TaskId>>,
}

/// Move one element of `list` from `from` to `to`.
///
/// Standard array-move semantics: the element is removed at `from` and
/// reinserted at `to`, so an insertion point right of `from` lands one slot
/// left of where it was before the removal. `to` past the end clamps to the
/// end; `from == to` returns the list unchanged.
pub fn reorder<T: Clone>(list: &[T], from: usize, to: usize) -> Result<Vec<T>> {
    if from >= list.len() {
        return Err(BoardError::IndexOutOfBounds {
            index: from,
            len: list.len(),
        });
    }

    let mut items = list.to_vec();
    if from == to {
        return Ok(items);
    }
    let item = items.remove(from);
    let to = to.min(items.len());
    items.insert(to, item);
    Ok(items)
}

/// `list` without `id`, plus whether it was present
pub fn remove_id(list: &[TaskId], id: &TaskId) -> (Vec<TaskId>, bool) {
    let filtered: Vec<TaskId> = list.iter().filter(|t| *t != id).cloned().collect();
    let removed = filtered.len() != list.len();
    (filtered, removed)
}

/// Insert `id` at `index`, clamped to the list bounds
pub fn insert_at_clamped(list: &mut Vec<TaskId>, index: usize, id: TaskId) {
    let index = index.min(list.len());
    list.insert(index, id);
}

/// Stage a move of `task` out of `source_column` into `dest_column` at
/// `dest_index`.
///
/// Both lists must be the just-read current orderings. The task is located
/// by value in the source list; if a concurrent edit already took it out,
/// the move fails rather than guessing. The destination is filtered before
/// insertion, so a racing placement of the same task cannot leave two
/// copies. Conservation holds by construction: afterwards the task id
/// appears exactly once across the two lists.
pub fn plan_move(
    source_column: &ColumnId,
    source: &[TaskId],
    dest_column: &ColumnId,
    dest: &[TaskId],
    task: &TaskId,
    dest_index: usize,
) -> Result<MovePlan> {
    if source_column == dest_column {
        let (mut list, removed) = remove_id(source, task);
        if !removed {
            return Err(BoardError::task_not_in_column(
                task.as_str(),
                source_column.as_str(),
            ));
        }
        insert_at_clamped(&mut list, dest_index, task.clone());
        return Ok(MovePlan {
            source: list,
            dest: None,
        });
    }

    let (new_source, removed) = remove_id(source, task);
    if !removed {
        return Err(BoardError::task_not_in_column(
            task.as_str(),
            source_column.as_str(),
        ));
    }

    let (mut new_dest, _) = remove_id(dest, task);
    insert_at_clamped(&mut new_dest, dest_index, task.clone());

    Ok(MovePlan {
        source: new_source,
        dest: Some(new_dest),
    })
}
