//! Presence types

use super::ids::UserId;
use chrono::{DateTime, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Avatar colors assigned to generated participants
const AVATAR_COLORS: [&str; 8] = [
    "red", "blue", "green", "yellow", "purple", "pink", "indigo", "teal",
];

/// One participant's presence record.
///
/// Ephemeral: lives under `presence/{userId}`, not part of the board
/// aggregate. `last_seen` is stamped on every transition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PresenceEntry {
    pub id: UserId,
    pub name: String,
    pub color: String,
    pub is_online: bool,
    pub last_seen: DateTime<Utc>,
}

impl PresenceEntry {
    /// Generate a random per-session identity.
    ///
    /// Identity proper is out of scope here; sessions just need a
    /// recognizable name and avatar color until real accounts exist.
    pub fn generate() -> Self {
        let mut rng = rand::rng();
        let color = AVATAR_COLORS[rng.random_range(0..AVATAR_COLORS.len())];
        let name = format!("User {}", rng.random_range(0..1000));
        Self {
            id: UserId::new(),
            name,
            color: color.to_string(),
            is_online: true,
            last_seen: Utc::now(),
        }
    }

    /// This entry marked online, `last_seen` now
    pub fn online(&self) -> Self {
        Self {
            is_online: true,
            last_seen: Utc::now(),
            ..self.clone()
        }
    }

    /// This entry marked offline, `last_seen` now.
    ///
    /// Used both for the graceful sign-off write and as the parked
    /// disconnect fallback.
    pub fn offline(&self) -> Self {
        Self {
            is_online: false,
            last_seen: Utc::now(),
            ..self.clone()
        }
    }
}
