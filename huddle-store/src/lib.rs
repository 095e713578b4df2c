//! Push-based key-path store for the huddle board
//!
//! This crate defines the contract the board engine talks to: a tree of
//! JSON values addressed by slash-separated paths, with one-shot reads,
//! last-write-wins writes, atomic multi-path updates, subtree
//! subscriptions, and server-held disconnect fallbacks.
//!
//! ## Overview
//!
//! - **Paths are subtrees** - writing a path replaces everything under it
//! - **Last write wins** - no merging; the newest write at a path is the value
//! - **Push, not poll** - subscribers get the full current value immediately
//!   and again on every change under their path
//! - **Disconnect fallbacks** - a write can be parked server-side and fires
//!   if the connection drops without cleanup
//!
//! ## Basic Usage
//!
//! ```rust,no_run
//! use huddle_store::{MemoryStore, RemoteStore, StorePath};
//! use serde_json::json;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let store = MemoryStore::new();
//!
//! let mut sub = store.subscribe(&StorePath::from("board")).await?;
//! store
//!     .write(&StorePath::from("board/columnOrder"), json!(["todo", "done"]))
//!     .await?;
//!
//! // First delivery is the value at subscribe time, then one per change.
//! while let Some(snapshot) = sub.next().await {
//!     println!("board is now {snapshot}");
//!     # break;
//! }
//! # Ok(())
//! # }
//! ```
//!
//! `MemoryStore` is a complete single-process implementation of the
//! contract. It backs the engine's test suite and doubles as a local
//! backend; a hosted realtime database adapter implements the same
//! [`RemoteStore`] trait.

mod error;
mod memory;
mod path;
mod store;

pub use error::{Result, StoreError};
pub use memory::MemoryStore;
pub use path::StorePath;
pub use store::{RemoteStore, Subscription};
