//! The session manager: remembers which players may resume a session.
//!
//! When a player logs in, the login flow records a session here. If the
//! player drops and reconnects within the session timeout, the gate finds
//! the session and (when the address also matches) logs them straight
//! back in. The manager is responsible for:
//! - Recording sessions on login
//! - Answering `has_session` for the gate
//! - Expiring sessions older than the configured timeout
//! - Dropping sessions on explicit logout
//!
//! # Concurrency note
//!
//! Admission tasks query the manager concurrently, so the map sits behind
//! a Tokio `RwLock`. Lookups take the read lock; only login, logout and
//! expiry take the write lock.

use std::collections::HashMap;
use std::time::Duration;

use tokio::sync::RwLock;
use tokio::time::Instant;

use authgate_types::PlayerName;

use crate::SessionRegistry;

// ---------------------------------------------------------------------------
// SessionConfig
// ---------------------------------------------------------------------------

/// Session behaviour.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Master switch. When `false`, `has_session` always answers `false`
    /// and every join goes through normal authentication.
    pub enabled: bool,

    /// How long a session stays resumable after login.
    /// `Duration::ZERO` means sessions never expire on their own.
    pub timeout: Duration,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            timeout: Duration::from_secs(10 * 60),
        }
    }
}

// ---------------------------------------------------------------------------
// SessionManager
// ---------------------------------------------------------------------------

/// In-memory [`SessionRegistry`].
///
/// ```text
/// add_session() ──→ [live] ──(timeout)──→ expire_stale() removes it
///                     │
///                     └──(logout)──→ remove_session()
/// ```
pub struct SessionManager {
    /// Session start time per player. One session per player; a second
    /// login simply refreshes the start time.
    sessions: RwLock<HashMap<PlayerName, Instant>>,
    config: SessionConfig,
}

impl SessionManager {
    pub fn new(config: SessionConfig) -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            config,
        }
    }

    /// Records a session for `name`, starting now.
    ///
    /// Does nothing when sessions are disabled.
    pub async fn add_session(&self, name: &PlayerName) {
        if !self.config.enabled {
            return;
        }
        self.sessions
            .write()
            .await
            .insert(name.clone(), Instant::now());
        tracing::debug!(%name, "session recorded");
    }

    /// Drops the session for `name`. Returns `true` if there was one.
    pub async fn remove_session(&self, name: &PlayerName) -> bool {
        let removed = self.sessions.write().await.remove(name).is_some();
        if removed {
            tracing::debug!(%name, "session removed");
        }
        removed
    }

    /// Removes every session older than the timeout and returns whose.
    ///
    /// Call periodically; `has_session` already ignores expired sessions,
    /// this only frees the memory.
    pub async fn expire_stale(&self) -> Vec<PlayerName> {
        let mut expired = Vec::new();
        let mut sessions = self.sessions.write().await;
        sessions.retain(|name, started| {
            if self.is_expired(*started) {
                expired.push(name.clone());
                false
            } else {
                true
            }
        });
        drop(sessions);

        if !expired.is_empty() {
            tracing::info!(count = expired.len(), "expired stale sessions");
        }
        expired
    }

    /// Number of stored sessions, expired or not.
    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.sessions.read().await.is_empty()
    }

    fn is_expired(&self, started: Instant) -> bool {
        !self.config.timeout.is_zero() && started.elapsed() > self.config.timeout
    }
}

impl SessionRegistry for SessionManager {
    async fn has_session(&self, name: &PlayerName) -> bool {
        if !self.config.enabled {
            return false;
        }
        self.sessions
            .read()
            .await
            .get(name)
            .is_some_and(|started| !self.is_expired(*started))
    }
}

// =========================================================================
// Tests
// =========================================================================
