//! Session reconciliation: may a connecting player skip authentication?
//!
//! The rule is deliberately strict. A player is restored without typing a
//! password only when all of these hold:
//!
//! 1. an account exists,
//! 2. there is a live session for the name, or the store still marks it
//!    logged in,
//! 3. the address the account last logged in from is *exactly* the
//!    connecting address.
//!
//! ```text
//!                  has_record?
//!                 ╱          ╲
//!               no            yes
//!               │              │
//!          NoPriorAuth   session or logged in?
//!                          ╱            ╲
//!                        no              yes ── clear flag, evict cache
//!                        │                        │
//!                   Registered              same address?
//!                                            ╱        ╲
//!                                          yes         no
//!                                           │           │
//!                                 FastPathRestored   StaleSession
//! ```
//!
//! Once the session branch is entered, the logged-in flag is cleared and
//! the cache entry evicted whatever the outcome. A restored player is
//! logged back in by the login flow, which re-creates both.

use std::sync::Arc;

use authgate_types::{Identity, PlayerName};

use crate::{AuthCache, AuthRecord, AuthStore, SessionRegistry, StoreError};

/// Outcome of reconciling a connecting identity with stored auth state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionState {
    /// No account exists for this name.
    NoPriorAuth,

    /// An account exists but no session was active. The player must log
    /// in.
    Registered,

    /// A session was active but cannot be trusted (different address, or
    /// the record disappeared mid-lookup). It has been discarded and the
    /// player must log in again.
    StaleSession {
        /// `true` when the player should be told their session expired.
        /// `false` when the record vanished and there is nothing to say.
        notify: bool,
    },

    /// The session continues: same account, same address. The player is
    /// handed to the login flow without credential checks.
    FastPathRestored(AuthRecord),
}

impl SessionState {
    /// `true` if an account exists for the player.
    pub fn is_registered(&self) -> bool {
        !matches!(self, Self::NoPriorAuth)
    }

    /// `true` if the player still has to authenticate (and therefore
    /// goes to limbo when required).
    pub fn needs_authentication(&self) -> bool {
        !matches!(self, Self::FastPathRestored(_))
    }
}

/// Decides a [`SessionState`] for each join.
///
/// Holds shared handles to the three collaborators. Cloning is cheap, and
/// one reconciler serves every concurrent join.
pub struct SessionReconciler<A, R, C> {
    store: Arc<A>,
    sessions: Arc<R>,
    cache: Arc<C>,
}

impl<A, R, C> Clone for SessionReconciler<A, R, C> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            sessions: Arc::clone(&self.sessions),
            cache: Arc::clone(&self.cache),
        }
    }
}

impl<A, R, C> SessionReconciler<A, R, C>
where
    A: AuthStore,
    R: SessionRegistry,
    C: AuthCache,
{
    pub fn new(store: Arc<A>, sessions: Arc<R>, cache: Arc<C>) -> Self {
        Self {
            store,
            sessions,
            cache,
        }
    }

    /// Reconciles `identity` against the store and registries.
    ///
    /// Runs store I/O; call it from admission work, never from the main
    /// thread.
    ///
    /// # Errors
    /// Any [`StoreError`] from the store aborts reconciliation. Mutations
    /// already made (cleared flag) are not rolled back; the caller refuses
    /// the join.
    pub async fn reconcile(
        &self,
        identity: &Identity,
    ) -> Result<SessionState, StoreError> {
        let name = identity.name();

        if !self.has_record(name).await? {
            tracing::debug!(%name, "no auth record");
            return Ok(SessionState::NoPriorAuth);
        }
        self.reconcile_registered(identity).await
    }

    /// `true` if an account exists for `name`.
    pub async fn has_record(&self, name: &PlayerName) -> Result<bool, StoreError> {
        self.store.has_record(name).await
    }

    /// The session half of [`reconcile`](Self::reconcile), for a player
    /// already known to have an account. Never returns
    /// [`SessionState::NoPriorAuth`].
    ///
    /// # Errors
    /// As for [`reconcile`](Self::reconcile).
    pub async fn reconcile_registered(
        &self,
        identity: &Identity,
    ) -> Result<SessionState, StoreError> {
        let name = identity.name();

        if !self.has_active_session(name).await? {
            return Ok(SessionState::Registered);
        }

        // From here on the old session is consumed, whatever happens.
        let record = self.store.get_record(name).await?;
        self.store.clear_logged_in(name).await?;
        self.cache.evict(name).await;

        let state = match record {
            Some(record) if record.last_ip_is(identity.ip()) => {
                tracing::info!(%name, ip = identity.ip(), "session restored");
                SessionState::FastPathRestored(record)
            }
            Some(record) => {
                tracing::info!(
                    %name,
                    ip = identity.ip(),
                    last_ip = record.last_ip.as_deref().unwrap_or("-"),
                    "session address mismatch, discarding session"
                );
                SessionState::StaleSession { notify: true }
            }
            None => {
                tracing::warn!(%name, "auth record vanished during session lookup");
                SessionState::StaleSession { notify: false }
            }
        };
        Ok(state)
    }

    /// Session registry first: it is in memory and usually answers without
    /// touching the store.
    async fn has_active_session(&self, name: &PlayerName) -> Result<bool, StoreError> {
        if self.sessions.has_session(name).await {
            return Ok(true);
        }
        self.store.is_logged_in(name).await
    }
}
