//! Board sync engine - the single source of truth for board state
//!
//! The engine owns the local projection of the board and is written
//! against an injected [`RemoteStore`]. The division of labor is strict:
//!
//! - Mutations stage new state from one-shot reads and write it to the
//!   store. They never touch the local projection.
//! - The subscription handler is the only writer of the projection's data;
//!   it replaces the whole projection with every pushed snapshot.
//!
//! So a client's own mutation becomes visible to it the same way everyone
//! else's do: through the next push. "Read for staging, write, then wait
//! for the authoritative push."

use crate::error::{BoardError, Result};
use crate::ordering;
use crate::types::{BoardSnapshot, Column, ColumnId, Task, TaskId};
use huddle_store::{RemoteStore, StorePath};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Where the engine sits relative to the store
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncState {
    /// Not yet subscribed
    Idle,
    /// Subscription issued, first snapshot not yet delivered
    Subscribing,
    /// Live; the projection mirrors the last pushed snapshot
    Synced,
    /// A mutation or the subscription failed; the subscription (if any)
    /// is still delivering and the next snapshot returns to `Synced`
    Error,
    /// Explicitly torn down
    Unsubscribed,
}

/// The read-only view the UI layer consumes.
///
/// Data fields are a pure function of the last pushed snapshot;
/// `state`/`last_error` track the engine itself.
#[derive(Debug, Clone)]
pub struct BoardView {
    pub columns: HashMap<ColumnId, Column>,
    pub tasks: HashMap<TaskId, Task>,
    pub column_order: Vec<ColumnId>,
    pub state: SyncState,
    /// Most recent mutation or subscription failure, kept until the next
    /// `subscribe()` resets it
    pub last_error: Option<String>,
}

impl Default for BoardView {
    fn default() -> Self {
        Self {
            columns: HashMap::new(),
            tasks: HashMap::new(),
            column_order: Vec::new(),
            state: SyncState::Idle,
            last_error: None,
        }
    }
}

impl BoardView {
    /// Whether the first snapshot is still on its way
    pub fn is_loading(&self) -> bool {
        matches!(self.state, SyncState::Idle | SyncState::Subscribing)
    }

    /// The most recent failure, if any
    pub fn error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    /// Columns in rendering order
    pub fn ordered_columns(&self) -> impl Iterator<Item = &Column> {
        self.column_order
            .iter()
            .filter_map(|id| self.columns.get(id))
    }
}

/// Owns the board projection and turns user intents into store writes
pub struct BoardSyncEngine {
    store: Arc<dyn RemoteStore>,
    view: Arc<watch::Sender<BoardView>>,
    handler: tokio::sync::Mutex<Option<JoinHandle<()>>>,
}

impl BoardSyncEngine {
    /// Create an engine over the given store; starts `Idle`
    pub fn new(store: Arc<dyn RemoteStore>) -> Self {
        let (view, _) = watch::channel(BoardView::default());
        Self {
            store,
            view: Arc::new(view),
            handler: tokio::sync::Mutex::new(None),
        }
    }

    /// Watch the projection; fires on every accepted snapshot and on
    /// state transitions
    pub fn view(&self) -> watch::Receiver<BoardView> {
        self.view.subscribe()
    }

    /// The current projection
    pub fn current(&self) -> BoardView {
        self.view.borrow().clone()
    }

    /// Start (or restart) the board subscription.
    ///
    /// The projection is rebuilt from the first pushed snapshot; restarting
    /// replaces the previous subscription.
    pub async fn subscribe(&self) -> Result<()> {
        let mut handler = self.handler.lock().await;
        if let Some(old) = handler.take() {
            old.abort();
        }

        self.view.send_modify(|v| {
            v.state = SyncState::Subscribing;
            v.last_error = None;
        });

        let mut subscription = match self.store.subscribe(&board_path()).await {
            Ok(sub) => sub,
            Err(err) => {
                let err = BoardError::from(err);
                self.view.send_modify(|v| {
                    v.state = SyncState::Error;
                    v.last_error = Some(err.to_string());
                });
                return Err(err);
            }
        };

        debug!("board subscription started");
        let view = Arc::clone(&self.view);
        *handler = Some(tokio::spawn(async move {
            while let Some(value) = subscription.next().await {
                match BoardSnapshot::from_value(value) {
                    Ok(snapshot) => {
                        view.send_modify(|v| {
                            v.columns = snapshot.columns;
                            v.tasks = snapshot.tasks;
                            v.column_order = snapshot.column_order;
                            v.state = SyncState::Synced;
                        });
                    }
                    Err(err) => {
                        warn!("Dropping undecodable snapshot: {}", err);
                        view.send_modify(|v| {
                            v.state = SyncState::Error;
                            v.last_error = Some(
                                BoardError::malformed_snapshot(err.to_string()).to_string(),
                            );
                        });
                    }
                }
            }
            // The store closed the stream underneath us.
            view.send_modify(|v| {
                if v.state != SyncState::Unsubscribed {
                    v.state = SyncState::Error;
                    v.last_error = Some("board subscription closed".to_string());
                }
            });
        }));
        Ok(())
    }

    /// Tear down the subscription. Writes already issued are not undone.
    pub async fn unsubscribe(&self) {
        let mut handler = self.handler.lock().await;
        self.view.send_modify(|v| v.state = SyncState::Unsubscribed);
        if let Some(task) = handler.take() {
            task.abort();
            debug!("board subscription stopped");
        }
    }

    // =========================================================================
    // Mutations - store writes only, never the local projection
    // =========================================================================

    /// Create a column and append it to the column order
    pub async fn create_column(&self, title: impl Into<String>) -> Result<Column> {
        self.try_create_column(title.into())
            .await
            .map_err(|err| self.report("create column", err))
    }

    /// Rename a column, preserving its task ordering
    pub async fn update_column(&self, id: &ColumnId, title: impl Into<String>) -> Result<Column> {
        self.try_update_column(id, title.into())
            .await
            .map_err(|err| self.report("update column", err))
    }

    /// Delete a column, every task it references, and its order entry
    pub async fn delete_column(&self, id: &ColumnId) -> Result<()> {
        self.try_delete_column(id)
            .await
            .map_err(|err| self.report("delete column", err))
    }

    /// Create a task and append it to a column's ordering
    pub async fn create_task(
        &self,
        column_id: &ColumnId,
        title: impl Into<String>,
        description: impl Into<String>,
    ) -> Result<Task> {
        self.try_create_task(column_id, title.into(), description.into())
            .await
            .map_err(|err| self.report("create task", err))
    }

    /// Edit a task's title and description
    pub async fn update_task(
        &self,
        id: &TaskId,
        title: impl Into<String>,
        description: impl Into<String>,
    ) -> Result<Task> {
        self.try_update_task(id, title.into(), description.into())
            .await
            .map_err(|err| self.report("update task", err))
    }

    /// Delete a task and scrub it from its column's ordering
    pub async fn delete_task(&self, task_id: &TaskId, column_id: &ColumnId) -> Result<()> {
        self.try_delete_task(task_id, column_id)
            .await
            .map_err(|err| self.report("delete task", err))
    }

    /// Move a task within its column from `from` to `to`.
    ///
    /// A same-index drag is a no-op: nothing is written.
    pub async fn reorder_tasks_in_column(
        &self,
        column_id: &ColumnId,
        from: usize,
        to: usize,
    ) -> Result<()> {
        self.try_reorder_tasks(column_id, from, to)
            .await
            .map_err(|err| self.report("reorder tasks", err))
    }

    /// Move a task across columns, landing at `dest_index`
    pub async fn move_task(
        &self,
        task_id: &TaskId,
        source: &ColumnId,
        dest: &ColumnId,
        dest_index: usize,
    ) -> Result<()> {
        self.try_move_task(task_id, source, dest, dest_index)
            .await
            .map_err(|err| self.report("move task", err))
    }

    /// Move a column in the rendering order from `from` to `to`
    pub async fn reorder_columns(&self, from: usize, to: usize) -> Result<()> {
        self.try_reorder_columns(from, to)
            .await
            .map_err(|err| self.report("reorder columns", err))
    }

    /// Delete task entities no column references.
    ///
    /// Orphans appear when a create wrote its entity but the ordering-list
    /// append failed (the two steps are not transactional). This sweep is
    /// the recovery path; it only runs when explicitly invoked. Returns the
    /// number of entities removed.
    pub async fn repair(&self) -> Result<usize> {
        self.try_repair()
            .await
            .map_err(|err| self.report("repair", err))
    }

    // =========================================================================
    // Mutation bodies
    // =========================================================================

    async fn try_create_column(&self, title: String) -> Result<Column> {
        let column = Column::new(title);
        debug!("Creating column: {}", column.id);
        self.store
            .write(&column_path(&column.id), serde_json::to_value(&column)?)
            .await?;

        // Read-then-write append; not atomic with the entity write. If this
        // append loses a race the column exists unordered until the next
        // concurrent order write includes it or it is recreated.
        let mut order = self.read_column_order().await?;
        order.push(column.id.clone());
        self.store
            .write(&column_order_path(), serde_json::to_value(&order)?)
            .await?;

        info!("Created column: {}", column.id);
        Ok(column)
    }

    async fn try_update_column(&self, id: &ColumnId, title: String) -> Result<Column> {
        let mut column = self.read_column(id).await?;
        column.rename(title);
        self.store
            .write(&column_path(id), serde_json::to_value(&column)?)
            .await?;
        Ok(column)
    }

    async fn try_delete_column(&self, id: &ColumnId) -> Result<()> {
        let column = self.read_column(id).await?;
        let order = self.read_column_order().await?;
        let remaining: Vec<ColumnId> = order.into_iter().filter(|c| c != id).collect();

        // One indivisible update: cascade the tasks, drop the column, and
        // rewrite the order, so no snapshot shows a half-deleted column.
        let mut updates: Vec<(StorePath, Value)> = column
            .task_ids
            .iter()
            .map(|task_id| (task_path(task_id), Value::Null))
            .collect();
        updates.push((column_path(id), Value::Null));
        updates.push((column_order_path(), serde_json::to_value(&remaining)?));
        self.store.multi_write(updates).await?;

        info!(
            "Deleted column {} and its {} task(s)",
            id,
            column.task_ids.len()
        );
        Ok(())
    }

    async fn try_create_task(
        &self,
        column_id: &ColumnId,
        title: String,
        description: String,
    ) -> Result<Task> {
        let column = self.read_column(column_id).await?;
        let task = Task::new(title).with_description(description);
        debug!("Creating task {} in column {}", task.id, column_id);
        self.store
            .write(&task_path(&task.id), serde_json::to_value(&task)?)
            .await?;

        // Same read-then-write append as create_column. A failure here
        // leaves the entity orphaned; repair() reclaims it.
        let mut task_ids = column.task_ids;
        task_ids.push(task.id.clone());
        self.store
            .write(&column_tasks_path(column_id), serde_json::to_value(&task_ids)?)
            .await?;

        Ok(task)
    }

    async fn try_update_task(&self, id: &TaskId, title: String, description: String) -> Result<Task> {
        let mut task = self.read_task(id).await?;
        task.apply_edit(title, description);
        self.store
            .write(&task_path(id), serde_json::to_value(&task)?)
            .await?;
        Ok(task)
    }

    async fn try_delete_task(&self, task_id: &TaskId, column_id: &ColumnId) -> Result<()> {
        let task_ids = self.read_task_ids(column_id).await?;
        let (remaining, _) = ordering::remove_id(&task_ids, task_id);

        self.store
            .multi_write(vec![
                (task_path(task_id), Value::Null),
                (column_tasks_path(column_id), serde_json::to_value(&remaining)?),
            ])
            .await?;
        Ok(())
    }

    async fn try_reorder_tasks(&self, column_id: &ColumnId, from: usize, to: usize) -> Result<()> {
        if from == to {
            debug!("Reorder in {} is a no-op ({} -> {})", column_id, from, to);
            return Ok(());
        }
        let task_ids = self.read_task_ids(column_id).await?;
        let reordered = ordering::reorder(&task_ids, from, to)?;
        self.store
            .write(&column_tasks_path(column_id), serde_json::to_value(&reordered)?)
            .await?;
        Ok(())
    }

    async fn try_move_task(
        &self,
        task_id: &TaskId,
        source: &ColumnId,
        dest: &ColumnId,
        dest_index: usize,
    ) -> Result<()> {
        // Two separate reads; the plan below re-validates against them, but
        // a third-party write landing between here and the multi-write
        // still wins by last-writer - that window is the store contract's.
        let source_ids = self.read_task_ids(source).await?;
        let dest_ids = if source == dest {
            source_ids.clone()
        } else {
            self.read_task_ids(dest).await?
        };

        let plan = ordering::plan_move(source, &source_ids, dest, &dest_ids, task_id, dest_index)?;

        let mut updates = vec![(
            column_tasks_path(source),
            serde_json::to_value(&plan.source)?,
        )];
        if let Some(dest_list) = &plan.dest {
            updates.push((column_tasks_path(dest), serde_json::to_value(dest_list)?));
        }
        self.store.multi_write(updates).await?;

        debug!("Moved task {} from {} to {}", task_id, source, dest);
        Ok(())
    }

    async fn try_reorder_columns(&self, from: usize, to: usize) -> Result<()> {
        if from == to {
            return Ok(());
        }
        let order = self.read_column_order().await?;
        let reordered = ordering::reorder(&order, from, to)?;
        self.store
            .write(&column_order_path(), serde_json::to_value(&reordered)?)
            .await?;
        Ok(())
    }

    async fn try_repair(&self) -> Result<usize> {
        let value = self.store.read_once(&board_path()).await?;
        let snapshot = BoardSnapshot::from_value(value)
            .map_err(|err| BoardError::malformed_snapshot(err.to_string()))?;

        let orphans = snapshot.orphaned_tasks();
        if orphans.is_empty() {
            return Ok(0);
        }

        let updates: Vec<(StorePath, Value)> = orphans
            .iter()
            .map(|id| (task_path(id), Value::Null))
            .collect();
        self.store.multi_write(updates).await?;

        info!("Repaired board: removed {} orphaned task(s)", orphans.len());
        Ok(orphans.len())
    }

    // =========================================================================
    // Staging reads
    // =========================================================================

    async fn read_column_order(&self) -> Result<Vec<ColumnId>> {
        let value = self.store.read_once(&column_order_path()).await?;
        if value.is_null() {
            return Ok(Vec::new());
        }
        Ok(serde_json::from_value(value)?)
    }

    async fn read_column(&self, id: &ColumnId) -> Result<Column> {
        let value = self.store.read_once(&column_path(id)).await?;
        if value.is_null() {
            return Err(BoardError::column_not_found(id.as_str()));
        }
        Ok(serde_json::from_value(value)?)
    }

    async fn read_task(&self, id: &TaskId) -> Result<Task> {
        let value = self.store.read_once(&task_path(id)).await?;
        if value.is_null() {
            return Err(BoardError::task_not_found(id.as_str()));
        }
        Ok(serde_json::from_value(value)?)
    }

    async fn read_task_ids(&self, id: &ColumnId) -> Result<Vec<TaskId>> {
        let value = self.store.read_once(&column_tasks_path(id)).await?;
        if value.is_null() {
            return Ok(Vec::new());
        }
        Ok(serde_json::from_value(value)?)
    }

    /// Log a failed mutation and reflect it in the view state.
    ///
    /// The subscription is deliberately left alone: snapshots keep
    /// arriving, and the next one returns the state to `Synced`.
    fn report(&self, operation: &'static str, err: BoardError) -> BoardError {
        warn!("{} failed: {}", operation, err);
        self.view.send_modify(|v| {
            v.state = SyncState::Error;
            v.last_error = Some(err.to_string());
        });
        err
    }
}

// =========================================================================
// Path layout
// =========================================================================

fn board_path() -> StorePath {
    StorePath::from("board")
}

fn column_order_path() -> StorePath {
    StorePath::from("board/columnOrder")
}

fn column_path(id: &ColumnId) -> StorePath {
    StorePath::from("board/columns").join(id.as_str())
}

fn column_tasks_path(id: &ColumnId) -> StorePath {
    column_path(id).join("taskIds")
}

fn task_path(id: &TaskId) -> StorePath {
    StorePath::from("board/tasks").join(id.as_str())
}
