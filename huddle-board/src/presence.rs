//! Presence tracking - who else is looking at the board
//!
//! Publishes this session's online status with a server-held disconnect
//! fallback, and mirrors the whole presence collection into a watch
//! projection the same way the board engine mirrors the board: the
//! subscription handler is the only writer, and it replaces the map
//! wholesale on every push.

use crate::error::Result;
use crate::types::{PresenceEntry, UserId};
use huddle_store::{RemoteStore, StorePath};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

/// The read-only presence view the UI consumes
#[derive(Debug, Clone, Default)]
pub struct PresenceView {
    /// Every known participant, online or not
    pub users: HashMap<UserId, PresenceEntry>,
}

impl PresenceView {
    /// Every participant the store has seen, including ones currently
    /// offline. This is the headline count the board header shows.
    pub fn total_users(&self) -> usize {
        self.users.len()
    }

    /// Participants currently online
    pub fn online_users(&self) -> impl Iterator<Item = &PresenceEntry> {
        self.users.values().filter(|entry| entry.is_online)
    }

    /// How many participants are online right now
    pub fn online_count(&self) -> usize {
        self.online_users().count()
    }
}

/// Publishes own status and tracks everyone else's
pub struct PresenceTracker {
    store: Arc<dyn RemoteStore>,
    identity: PresenceEntry,
    view: Arc<watch::Sender<PresenceView>>,
    handler: tokio::sync::Mutex<Option<JoinHandle<()>>>,
}

impl PresenceTracker {
    /// Create a tracker for the given identity over the given store
    pub fn new(store: Arc<dyn RemoteStore>, identity: PresenceEntry) -> Self {
        let (view, _) = watch::channel(PresenceView::default());
        Self {
            store,
            identity,
            view: Arc::new(view),
            handler: tokio::sync::Mutex::new(None),
        }
    }

    /// This session's own presence identity
    pub fn identity(&self) -> &PresenceEntry {
        &self.identity
    }

    /// Watch the presence projection
    pub fn view(&self) -> watch::Receiver<PresenceView> {
        self.view.subscribe()
    }

    /// The current presence projection
    pub fn current(&self) -> PresenceView {
        self.view.borrow().clone()
    }

    /// Announce this session as online and park the disconnect fallback.
    ///
    /// The fallback write flips the entry offline server-side if the
    /// connection drops without a graceful `go_offline`.
    pub async fn go_online(&self) -> Result<()> {
        let entry = self.identity.online();
        let path = entry_path(&entry.id);
        self.store
            .write(&path, serde_json::to_value(&entry)?)
            .await?;
        self.store
            .on_disconnect_write(&path, serde_json::to_value(entry.offline())?)
            .await?;
        debug!("Presence online: {}", entry.id);
        Ok(())
    }

    /// Gracefully mark this session offline.
    ///
    /// Best-effort: a failure is logged and returned but never retried;
    /// the parked disconnect write covers the abrupt case.
    pub async fn go_offline(&self) -> Result<()> {
        let entry = self.identity.offline();
        match self
            .store
            .write(&entry_path(&entry.id), serde_json::to_value(&entry)?)
            .await
        {
            Ok(()) => {
                debug!("Presence offline: {}", entry.id);
                Ok(())
            }
            Err(err) => {
                warn!("Offline write failed, not retrying: {}", err);
                Err(err.into())
            }
        }
    }

    /// Start (or restart) watching the presence collection
    pub async fn subscribe(&self) -> Result<()> {
        let mut handler = self.handler.lock().await;
        if let Some(old) = handler.take() {
            old.abort();
        }

        let mut subscription = self.store.subscribe(&presence_path()).await?;
        debug!("presence subscription started");

        let view = Arc::clone(&self.view);
        *handler = Some(tokio::spawn(async move {
            while let Some(value) = subscription.next().await {
                let users = decode_presence(value);
                view.send_modify(|v| v.users = users);
            }
        }));
        Ok(())
    }

    /// Stop watching the presence collection
    pub async fn unsubscribe(&self) {
        if let Some(task) = self.handler.lock().await.take() {
            task.abort();
            debug!("presence subscription stopped");
        }
    }
}

/// Decode the pushed presence collection, keeping whatever arrives.
///
/// Entries that fail to decode are skipped one by one rather than failing
/// the whole push; presence is ephemeral display data.
fn decode_presence(value: Value) -> HashMap<UserId, PresenceEntry> {
    let Value::Object(map) = value else {
        return HashMap::new();
    };

    let mut users = HashMap::with_capacity(map.len());
    for (key, raw) in map {
        match serde_json::from_value::<PresenceEntry>(raw) {
            Ok(entry) => {
                users.insert(UserId::from_string(key), entry);
            }
            Err(err) => {
                warn!("Skipping malformed presence entry {}: {}", key, err);
            }
        }
    }
    users
}

// =========================================================================
// Path layout
// =========================================================================

fn presence_path() -> StorePath {
    StorePath::from("presence")
}

fn entry_path(id: &UserId) -> StorePath {
    presence_path().join(id.as_str())
}
