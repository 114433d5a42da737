//! The authenticated-player cache.

use std::collections::HashMap;

use tokio::sync::RwLock;

use authgate_types::PlayerName;

use crate::{AuthCache, AuthRecord};

/// In-memory [`AuthCache`]: the set of players authenticated during this
/// process lifetime, with the record they logged in with.
///
/// The login flow adds entries; the gate only evicts.
#[derive(Debug, Default)]
pub struct PlayerCache {
    players: RwLock<HashMap<PlayerName, AuthRecord>>,
}

impl PlayerCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records `record.name` as authenticated.
    pub async fn add(&self, record: AuthRecord) {
        self.players.write().await.insert(record.name.clone(), record);
    }

    pub async fn is_authenticated(&self, name: &PlayerName) -> bool {
        self.players.read().await.contains_key(name)
    }

    /// The record a player authenticated with.
    pub async fn get(&self, name: &PlayerName) -> Option<AuthRecord> {
        self.players.read().await.get(name).cloned()
    }

    pub async fn len(&self) -> usize {
        self.players.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.players.read().await.is_empty()
    }
}

impl AuthCache for PlayerCache {
    async fn evict(&self, name: &PlayerName) {
        if self.players.write().await.remove(name).is_some() {
            tracing::debug!(%name, "evicted from auth cache");
        }
    }
}
