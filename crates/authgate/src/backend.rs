//! The collaborators a gate is wired to.
//!
//! The gate owns none of the systems it consults. Permissions, the login
//! flow, the account store and the session registries all belong to the
//! rest of the server. [`GateBackend`] names their concrete types once,
//! so the pipeline is generic over a single parameter.

use std::future::Future;
use std::sync::Arc;

use authgate_limbo::CommandRunner;
use authgate_session::{AuthCache, AuthStore, SessionRegistry, StoreError};
use authgate_types::{AuthGroup, Capability, Identity, World};

use crate::OnlineRoster;

/// The host's permission system.
pub trait PermissionService: Send + Sync + 'static {
    /// `true` if the player holds `capability`.
    fn has_capability(
        &self,
        identity: &Identity,
        capability: Capability,
    ) -> impl Future<Output = bool> + Send;

    /// Moves the player into `group`.
    fn set_group(
        &self,
        identity: &Identity,
        group: AuthGroup,
    ) -> impl Future<Output = ()> + Send;
}

/// The login flow, as far as the gate hands players to it.
pub trait LoginFlow: Send + Sync + 'static {
    /// Logs in a player restored from a live session, without checking
    /// credentials.
    ///
    /// The session reconciler has already cleared the store's logged-in
    /// flag and evicted the cache entry. This call is responsible for
    /// re-marking the store, re-creating the session, and releasing the
    /// player into the game.
    fn force_login(
        &self,
        identity: &Identity,
    ) -> impl Future<Output = Result<(), StoreError>> + Send;
}

/// Names the concrete collaborator types for one gate.
///
/// ```ignore
/// struct MyServer;
///
/// impl GateBackend for MyServer {
///     type World = MyWorld;
///     type Commands = JoinCommands;
///     type Store = SqlStore;
///     type Sessions = SessionManager;
///     type Cache = PlayerCache;
///     type Permissions = LuckPerms;
///     type Login = LoginService;
///     type Roster = OnlineTracker;
/// }
/// ```
pub trait GateBackend: Send + Sync + 'static {
    type World: World;
    type Commands: CommandRunner;
    type Store: AuthStore;
    type Sessions: SessionRegistry;
    type Cache: AuthCache;
    type Permissions: PermissionService;
    type Login: LoginFlow;
    type Roster: OnlineRoster;
}

/// Shared handles to the off-thread collaborators of a [`GateBackend`].
pub struct Collaborators<B: GateBackend> {
    pub store: Arc<B::Store>,
    pub sessions: Arc<B::Sessions>,
    pub cache: Arc<B::Cache>,
    pub permissions: Arc<B::Permissions>,
    pub login: Arc<B::Login>,
    pub roster: Arc<B::Roster>,
}

// Derived `Clone` would require `B: Clone`.
impl<B: GateBackend> Clone for Collaborators<B> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            sessions: Arc::clone(&self.sessions),
            cache: Arc::clone(&self.cache),
            permissions: Arc::clone(&self.permissions),
            login: Arc::clone(&self.login),
            roster: Arc::clone(&self.roster),
        }
    }
}
