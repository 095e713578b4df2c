//! Shared kanban board engine
//!
//! This crate keeps a multi-user kanban board consistent across clients
//! that all talk to one push-based, last-write-wins store. It owns the two
//! layered orderings (column order, per-column task order), the
//! synchronization engine that projects the shared state locally, and the
//! presence tracker that derives who else is online.
//!
//! ## Overview
//!
//! - **One store, many clients** - every client subscribes to the same
//!   subtree and renders whatever arrives
//! - **Writes go up, state comes down** - mutations never touch the local
//!   projection; only pushed snapshots do
//! - **Id-based ordering moves** - drags are re-validated against the
//!   just-read lists, so stale indexes cannot delete the wrong task
//! - **Presence with disconnect fallback** - going online parks a
//!   server-held offline write that fires if the connection drops
//!
//! ## Basic Usage
//!
//! ```rust,no_run
//! use huddle_board::{BoardSyncEngine, PresenceEntry, PresenceTracker};
//! use huddle_store::MemoryStore;
//! use std::sync::Arc;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let store = Arc::new(MemoryStore::new());
//!
//! let engine = BoardSyncEngine::new(store.clone());
//! engine.subscribe().await?;
//! let column = engine.create_column("To Do").await?;
//! engine.create_task(&column.id, "Ship it", "").await?;
//!
//! let presence = PresenceTracker::new(store, PresenceEntry::generate());
//! presence.subscribe().await?;
//! presence.go_online().await?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Store Layout
//!
//! ```text
//! board/
//! ├── columnOrder              # ordered array of column id
//! ├── columns/
//! │   └── {columnId}           # {id, title, taskIds, createdAt, updatedAt?}
//! └── tasks/
//!     └── {taskId}             # {id, title, description, createdAt, updatedAt}
//! presence/
//! └── {userId}                 # {id, name, color, isOnline, lastSeen}
//! ```
//!
//! The membership invariants (order entries resolve, a task lives in
//! exactly one column, no duplicate ids in a list) are eventual, not
//! transactional: readers tolerate their absence, writers restore them.

mod error;
pub mod ordering;
pub mod types;

pub mod dnd;
pub mod engine;
pub mod presence;

pub use dnd::{resolve_drag_end, DragIntent};
pub use engine::{BoardSyncEngine, BoardView, SyncState};
pub use error::{BoardError, Result};
pub use presence::{PresenceTracker, PresenceView};

// Re-export commonly used types
pub use types::{BoardSnapshot, Column, ColumnId, PresenceEntry, Task, TaskId, UserId};
