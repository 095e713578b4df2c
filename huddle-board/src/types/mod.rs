//! Core types for the board engine

mod board;
mod column;
mod ids;
mod presence;
mod task;

// Re-export all types
pub use board::BoardSnapshot;
pub use column::Column;
pub use ids::{ColumnId, TaskId, UserId};
pub use presence::PresenceEntry;
pub use task::Task;
