//! `AuthGate` builder and entry points.
//!
//! This ties the layers together: settings → main thread (world + limbo)
//! → join pipeline on the admission pool.

use std::sync::Arc;

use tokio::task::JoinHandle;

use authgate_limbo::{LimboPlayer, LimboService};
use authgate_scheduler::{MainThread, MainThreadConfig, MainThreadHandle, Scheduler};
use authgate_session::SessionReconciler;
use authgate_types::{Identity, PlayerName};

use crate::{Collaborators, GateBackend, GateError, JoinOutcome, JoinProcess, Realm, RestrictionEntry, Settings};

/// The realm type for a backend.
pub type RealmOf<B> = Realm<<B as GateBackend>::World, <B as GateBackend>::Commands>;

/// Everything a join needs off the main thread, shared by all joins.
pub struct GateContext<B: GateBackend> {
    pub(crate) settings: Settings,
    pub(crate) restrictions: Vec<RestrictionEntry>,
    pub(crate) reconciler: SessionReconciler<B::Store, B::Sessions, B::Cache>,
    pub(crate) permissions: Arc<B::Permissions>,
    pub(crate) login: Arc<B::Login>,
    pub(crate) roster: Arc<B::Roster>,
}

impl<B: GateBackend> GateContext<B> {
    /// Builds the context. `settings` are used as given; validate them
    /// first.
    pub fn new(settings: Settings, collaborators: Collaborators<B>) -> Self {
        let Collaborators {
            store,
            sessions,
            cache,
            permissions,
            login,
            roster,
        } = collaborators;
        Self {
            restrictions: settings.restriction_entries(),
            settings,
            reconciler: SessionReconciler::new(store, sessions, cache),
            permissions,
            login,
            roster,
        }
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }
}

/// Builder for configuring and starting a gate.
///
/// # Example
///
/// ```rust,ignore
/// let settings = Settings::load("authgate.toml")?;
/// let commands = settings.join_commands();
/// let gate = AuthGateBuilder::new()
///     .settings(settings)
///     .build::<MyServer>(world, commands, collaborators)?;
///
/// // On every connection event:
/// gate.on_connect(identity);
/// ```
pub struct AuthGateBuilder {
    settings: Settings,
    main_thread: MainThreadConfig,
}

impl AuthGateBuilder {
    /// Creates a new builder with default settings.
    pub fn new() -> Self {
        Self {
            settings: Settings::default(),
            main_thread: MainThreadConfig::default(),
        }
    }

    /// Sets the gate settings. They are validated on [`build`](Self::build).
    pub fn settings(mut self, settings: Settings) -> Self {
        self.settings = settings;
        self
    }

    /// Sets the main thread name and tick rate.
    pub fn main_thread(mut self, config: MainThreadConfig) -> Self {
        self.main_thread = config;
        self
    }

    /// Moves `world` onto a new main thread and returns the running gate.
    ///
    /// Must be called inside a Tokio runtime, which becomes the admission
    /// pool.
    ///
    /// # Errors
    /// [`GateError::Scheduler`] if the main thread cannot be started.
    pub fn build<B: GateBackend>(
        self,
        world: B::World,
        commands: B::Commands,
        collaborators: Collaborators<B>,
    ) -> Result<AuthGate<B>, GateError> {
        let settings = self.settings.validated();
        let limbo = LimboService::new(settings.limbo_settings(), commands);
        let main = MainThread::spawn(Realm::new(world, limbo), self.main_thread)?;

        tracing::info!(
            restricted = settings.restrictions.enable_restricted_users,
            max_join_per_ip = settings.restrictions.max_join_per_ip,
            timeout_secs = settings.restrictions.timeout_secs,
            force_registration = settings.registration.force,
            "auth gate started"
        );

        Ok(AuthGate {
            context: Arc::new(GateContext::new(settings, collaborators)),
            main,
        })
    }
}

impl Default for AuthGateBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// A running gate. Cheap to clone.
pub struct AuthGate<B: GateBackend> {
    context: Arc<GateContext<B>>,
    main: MainThreadHandle<RealmOf<B>>,
}

impl<B: GateBackend> Clone for AuthGate<B> {
    fn clone(&self) -> Self {
        Self {
            context: Arc::clone(&self.context),
            main: self.main.clone(),
        }
    }
}

impl<B: GateBackend> AuthGate<B> {
    /// Handles a connection event: runs the join pipeline as admission
    /// work and returns at once.
    pub fn on_connect(&self, identity: Identity) -> JoinHandle<Result<JoinOutcome, GateError>> {
        let process = self.join_process();
        self.main
            .run_admission_work(async move { process.run(&identity).await })
    }

    /// Runs the join pipeline on the calling task.
    pub async fn join(&self, identity: &Identity) -> Result<JoinOutcome, GateError> {
        self.join_process().run(identity).await
    }

    /// Takes an authenticated player out of limbo. Called by the login and
    /// registration flows.
    ///
    /// # Errors
    /// [`GateError::Limbo`] if the player is not in limbo,
    /// [`GateError::Scheduler`] if the main thread is gone.
    pub async fn release(&self, name: PlayerName) -> Result<LimboPlayer, GateError> {
        let released = self
            .main
            .call(move |realm: &mut RealmOf<B>| realm.release_from_limbo(&name))
            .await??;
        Ok(released)
    }

    /// Forgets any limbo entry of a player who quit.
    ///
    /// # Errors
    /// [`GateError::Scheduler`] if the main thread is gone.
    pub fn on_quit(&self, name: PlayerName) -> Result<(), GateError> {
        self.main.run_protected(move |realm: &mut RealmOf<B>| {
            if realm.forget(&name).is_some() {
                tracing::debug!(%name, "quit while in limbo");
            }
        })?;
        Ok(())
    }

    /// Runs `f` against the realm on the main thread and returns its
    /// result.
    ///
    /// # Errors
    /// [`GateError::Scheduler`] if the main thread is gone or this is
    /// called from it.
    pub async fn with_realm<R, F>(&self, f: F) -> Result<R, GateError>
    where
        R: Send + 'static,
        F: FnOnce(&mut RealmOf<B>) -> R + Send + 'static,
    {
        Ok(self.main.call(f).await?)
    }

    pub fn context(&self) -> &GateContext<B> {
        &self.context
    }

    /// The scheduler every gate component goes through.
    pub fn main_thread(&self) -> &MainThreadHandle<RealmOf<B>> {
        &self.main
    }

    /// Stops the main thread and returns the realm. Tasks already queued
    /// run first.
    ///
    /// # Errors
    /// [`GateError::Scheduler`] if the main thread already stopped.
    pub async fn shutdown(&self) -> Result<RealmOf<B>, GateError> {
        Ok(self.main.shutdown().await?)
    }

    fn join_process(&self) -> JoinProcess<B, MainThreadHandle<RealmOf<B>>> {
        JoinProcess::new(Arc::clone(&self.context), self.main.clone())
    }
}
