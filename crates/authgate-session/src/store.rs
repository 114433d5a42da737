//! Contracts for the auth state the gate reads, plus an in-memory store.
//!
//! The gate does not own any of this state. The persistent store belongs
//! to the storage layer, the session registry to the session subsystem,
//! and the authenticated cache to the login flow. Each implementation is
//! responsible for its own thread safety: the gate calls them from many
//! admission tasks at once and adds no locking of its own.

use std::collections::HashMap;
use std::future::Future;

use tokio::sync::RwLock;

use authgate_types::PlayerName;

use crate::{AuthRecord, StoreError};

// ---------------------------------------------------------------------------
// Contracts
// ---------------------------------------------------------------------------

/// The persistent account store (database, flat file, remote API).
///
/// Every method may perform I/O, so every method is async and fallible.
/// The gate only calls these from admission work, never from the main
/// thread.
pub trait AuthStore: Send + Sync + 'static {
    /// `true` if an account exists for `name`.
    fn has_record(
        &self,
        name: &PlayerName,
    ) -> impl Future<Output = Result<bool, StoreError>> + Send;

    /// `true` if the store marks `name` as currently logged in.
    fn is_logged_in(
        &self,
        name: &PlayerName,
    ) -> impl Future<Output = Result<bool, StoreError>> + Send;

    /// Fetches the record for `name`. `Ok(None)` if it does not exist
    /// (for instance, deleted since `has_record` answered).
    fn get_record(
        &self,
        name: &PlayerName,
    ) -> impl Future<Output = Result<Option<AuthRecord>, StoreError>> + Send;

    /// Clears the logged-in flag for `name`. A missing record is not an
    /// error.
    fn clear_logged_in(
        &self,
        name: &PlayerName,
    ) -> impl Future<Output = Result<(), StoreError>> + Send;
}

/// The in-memory registry of resumable sessions.
pub trait SessionRegistry: Send + Sync + 'static {
    /// `true` if `name` has a live, unexpired session.
    fn has_session(&self, name: &PlayerName) -> impl Future<Output = bool> + Send;
}

/// The process-wide cache of authenticated players.
pub trait AuthCache: Send + Sync + 'static {
    /// Forgets that `name` is authenticated. A no-op if it was not.
    fn evict(&self, name: &PlayerName) -> impl Future<Output = ()> + Send;
}

// ---------------------------------------------------------------------------
// MemoryAuthStore
// ---------------------------------------------------------------------------

/// An [`AuthStore`] kept entirely in memory.
///
/// Never fails. Good for tests, the demo, and servers that load accounts
/// at startup and write them back themselves.
#[derive(Debug, Default)]
pub struct MemoryAuthStore {
    records: RwLock<HashMap<PlayerName, AuthRecord>>,
}

impl MemoryAuthStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts or replaces a record.
    pub async fn insert(&self, record: AuthRecord) {
        self.records.write().await.insert(record.name.clone(), record);
    }

    /// Marks `name` as logged in from `ip`, as a successful login would.
    ///
    /// Returns `false` if there is no record for `name`.
    pub async fn mark_logged_in(&self, name: &PlayerName, ip: &str) -> bool {
        let mut records = self.records.write().await;
        match records.get_mut(name) {
            Some(record) => {
                record.logged_in = true;
                record.last_ip = Some(ip.to_string());
                true
            }
            None => false,
        }
    }

    /// Deletes the record for `name`, returning it.
    pub async fn remove(&self, name: &PlayerName) -> Option<AuthRecord> {
        self.records.write().await.remove(name)
    }

    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.records.read().await.is_empty()
    }
}

impl AuthStore for MemoryAuthStore {
    async fn has_record(&self, name: &PlayerName) -> Result<bool, StoreError> {
        Ok(self.records.read().await.contains_key(name))
    }

    async fn is_logged_in(&self, name: &PlayerName) -> Result<bool, StoreError> {
        Ok(self
            .records
            .read()
            .await
            .get(name)
            .is_some_and(|r| r.logged_in))
    }

    async fn get_record(
        &self,
        name: &PlayerName,
    ) -> Result<Option<AuthRecord>, StoreError> {
        Ok(self.records.read().await.get(name).cloned())
    }

    async fn clear_logged_in(&self, name: &PlayerName) -> Result<(), StoreError> {
        if let Some(record) = self.records.write().await.get_mut(name) {
            record.logged_in = false;
        }
        Ok(())
    }
}
