//! The remote store contract the board engine is written against

use crate::error::Result;
use crate::path::StorePath;
use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::mpsc;

/// A push-based key-path store.
///
/// The board engine and presence tracker take this as an injected trait
/// object, which is what lets tests substitute [`MemoryStore`] for a hosted
/// realtime database.
///
/// Semantics every implementation must honor:
///
/// - Writes replace the whole subtree at a path; the last write received by
///   the store wins. Writing [`Value::Null`] deletes the subtree.
/// - [`multi_write`](RemoteStore::multi_write) applies its listed paths as
///   one indivisible unit relative to other multi-writes. It does NOT
///   serialize against a third party's single-path write landing between a
///   caller's reads and this call.
/// - A subscription delivers the full current value at its path immediately,
///   then again after every change under that path. Deliveries for one path
///   arrive in write order; ordering across different paths is unspecified.
///
/// [`MemoryStore`]: crate::MemoryStore
#[async_trait]
pub trait RemoteStore: Send + Sync {
    /// One-shot read of the current value at `path`.
    ///
    /// Races freely with concurrent writers; a missing subtree reads as
    /// [`Value::Null`].
    async fn read_once(&self, path: &StorePath) -> Result<Value>;

    /// Replace the subtree at `path` with `value`.
    async fn write(&self, path: &StorePath, value: Value) -> Result<()>;

    /// Delete the subtree at `path`.
    async fn remove(&self, path: &StorePath) -> Result<()>;

    /// Apply all `updates` as one indivisible unit.
    ///
    /// `Null` values delete their path, matching [`write`](RemoteStore::write).
    async fn multi_write(&self, updates: Vec<(StorePath, Value)>) -> Result<()>;

    /// Subscribe to the subtree at `path`.
    ///
    /// The current value is pushed immediately. Dropping the returned
    /// [`Subscription`] unsubscribes.
    async fn subscribe(&self, path: &StorePath) -> Result<Subscription>;

    /// Park `value` server-side, to be written at `path` if this client's
    /// connection drops without explicit cleanup.
    async fn on_disconnect_write(&self, path: &StorePath, value: Value) -> Result<()>;
}

/// A live subscription to one store path.
///
/// Wraps the push channel; the store keeps delivering until the
/// subscription is dropped or the store itself shuts down.
#[derive(Debug)]
pub struct Subscription {
    path: StorePath,
    receiver: mpsc::UnboundedReceiver<Value>,
}

impl Subscription {
    /// Build a subscription from the receiving half of a push channel
    pub fn new(path: StorePath, receiver: mpsc::UnboundedReceiver<Value>) -> Self {
        Self { path, receiver }
    }

    /// The path this subscription watches
    pub fn path(&self) -> &StorePath {
        &self.path
    }

    /// Wait for the next pushed value.
    ///
    /// Returns `None` once the store has closed the stream; no further
    /// values will arrive.
    pub async fn next(&mut self) -> Option<Value> {
        self.receiver.recv().await
    }
}
