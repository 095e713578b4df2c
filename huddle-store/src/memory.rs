//! In-process implementation of the store contract
//!
//! `MemoryStore` keeps the whole tree as one `serde_json::Value` behind a
//! mutex and fans writes out to subtree subscribers. It is the backend the
//! engine's tests run against and works as a single-process store on its
//! own. Disconnect fallbacks are parked in a registry and applied by
//! [`MemoryStore::simulate_disconnect`], which stands in for the server
//! noticing a dropped connection.

use crate::error::{Result, StoreError};
use crate::path::StorePath;
use crate::store::{RemoteStore, Subscription};
use async_trait::async_trait;
use serde_json::Value;
use std::sync::Mutex;
use tokio::sync::mpsc;
use tracing::{debug, info};

/// A push-based, last-write-wins store living in process memory
#[derive(Debug, Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
}

#[derive(Debug, Default)]
struct Inner {
    tree: Value,
    subscribers: Vec<Subscriber>,
    disconnect_writes: Vec<(StorePath, Value)>,
    fail_writes: usize,
}

#[derive(Debug)]
struct Subscriber {
    path: StorePath,
    sender: mpsc::UnboundedSender<Value>,
}

impl MemoryStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the next `count` writes fail with [`StoreError::WriteRejected`].
    ///
    /// Test support: lets callers exercise their mutation-failure paths.
    /// A `multi_write` counts as a single write.
    pub fn fail_next_writes(&self, count: usize) {
        self.lock().fail_writes = count;
    }

    /// Apply every parked disconnect write, as the server would after this
    /// client's connection dropped, and clear the registry.
    pub fn simulate_disconnect(&self) {
        let mut inner = self.lock();
        let writes = std::mem::take(&mut inner.disconnect_writes);
        if writes.is_empty() {
            return;
        }

        info!("disconnect: applying {} parked write(s)", writes.len());
        let mut changed = Vec::with_capacity(writes.len());
        for (path, value) in writes {
            set_at(&mut inner.tree, &path, value);
            changed.push(path);
        }
        notify(&mut inner, &changed);
    }

    /// Number of parked disconnect writes (test support)
    pub fn disconnect_write_count(&self) -> usize {
        self.lock().disconnect_writes.len()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Inner> {
        // Keep serving after a panicked writer; the tree itself is never
        // left half-mutated (set_at completes or does not run).
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn apply(&self, updates: Vec<(StorePath, Value)>) -> Result<()> {
        let mut inner = self.lock();
        if inner.fail_writes > 0 {
            inner.fail_writes -= 1;
            let path = updates
                .first()
                .map(|(p, _)| p.as_str().to_string())
                .unwrap_or_default();
            return Err(StoreError::write_rejected(path, "injected write failure"));
        }

        let mut changed = Vec::with_capacity(updates.len());
        for (path, value) in updates {
            debug!("write at {}", path);
            set_at(&mut inner.tree, &path, value);
            changed.push(path);
        }
        notify(&mut inner, &changed);
        Ok(())
    }
}

#[async_trait]
impl RemoteStore for MemoryStore {
    async fn read_once(&self, path: &StorePath) -> Result<Value> {
        Ok(value_at(&self.lock().tree, path))
    }

    async fn write(&self, path: &StorePath, value: Value) -> Result<()> {
        self.apply(vec![(path.clone(), value)])
    }

    async fn remove(&self, path: &StorePath) -> Result<()> {
        self.apply(vec![(path.clone(), Value::Null)])
    }

    async fn multi_write(&self, updates: Vec<(StorePath, Value)>) -> Result<()> {
        self.apply(updates)
    }

    async fn subscribe(&self, path: &StorePath) -> Result<Subscription> {
        let (sender, receiver) = mpsc::unbounded_channel();
        let mut inner = self.lock();

        // Deliver the current value before anything else can interleave.
        let current = value_at(&inner.tree, path);
        let _ = sender.send(current);

        debug!("subscribe at {}", path);
        inner.subscribers.push(Subscriber {
            path: path.clone(),
            sender,
        });
        Ok(Subscription::new(path.clone(), receiver))
    }

    async fn on_disconnect_write(&self, path: &StorePath, value: Value) -> Result<()> {
        let mut inner = self.lock();
        // Re-registering at a path replaces the parked write, matching the
        // hosted-store behavior of onDisconnect().set().
        inner.disconnect_writes.retain(|(p, _)| p != path);
        inner.disconnect_writes.push((path.clone(), value));
        Ok(())
    }
}

/// Push the new value at each affected subscriber's own path.
///
/// A subscriber is affected when its path and a changed path overlap in
/// either direction: writing `board` changes what `board/columnOrder`
/// subscribers see, and writing `board/columnOrder` changes what `board`
/// subscribers see. Subscribers whose receivers are gone are dropped.
fn notify(inner: &mut Inner, changed: &[StorePath]) {
    let Inner {
        tree, subscribers, ..
    } = inner;

    subscribers.retain(|sub| {
        let affected = changed
            .iter()
            .any(|path| sub.path.contains(path) || path.contains(&sub.path));
        if !affected {
            return !sub.sender.is_closed();
        }
        sub.sender.send(value_at(tree, &sub.path)).is_ok()
    });
}

/// Read the value at `path`, `Null` if the subtree does not exist
fn value_at(tree: &Value, path: &StorePath) -> Value {
    let mut node = tree;
    for segment in path.segments() {
        match node.get(segment) {
            Some(child) => node = child,
            None => return Value::Null,
        }
    }
    node.clone()
}

/// Replace the subtree at `path`; `Null` deletes it.
///
/// Intermediate nodes are created (or overwritten) as objects, and empty
/// objects left behind by a delete are pruned, so "no children" and
/// "does not exist" stay indistinguishable, as they are in the wire format.
fn set_at(tree: &mut Value, path: &StorePath, value: Value) {
    let segments: Vec<&str> = path.segments().collect();
    if segments.is_empty() {
        *tree = value;
        return;
    }
    if value.is_null() {
        remove_at(tree, &segments);
        return;
    }

    let mut node = tree;
    for segment in &segments[..segments.len() - 1] {
        node = as_object(node)
            .entry((*segment).to_string())
            .or_insert(Value::Null);
    }
    as_object(node).insert(segments[segments.len() - 1].to_string(), value);
}

fn remove_at(node: &mut Value, segments: &[&str]) {
    let Value::Object(map) = node else {
        return;
    };
    if segments.len() == 1 {
        map.remove(segments[0]);
    } else if let Some(child) = map.get_mut(segments[0]) {
        remove_at(child, &segments[1..]);
        if child.is_null() || child.as_object().is_some_and(|m| m.is_empty()) {
            map.remove(segments[0]);
        }
    }
    if map.is_empty() {
        *node = Value::Null;
    }
}

fn as_object(node: &mut Value) -> &mut serde_json::Map<String, Value> {
    if !node.is_object() {
        *node = Value::Object(serde_json::Map::new());
    }
    match node {
        Value::Object(map) => map,
        _ => unreachable!("node was just made an object"),
    }
}
