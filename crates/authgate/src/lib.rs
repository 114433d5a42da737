//! # authgate
//!
//! Join admission and session reconciliation for multiplayer game servers.
//!
//! When a player connects, the gate decides before gameplay begins:
//!
//! - whether the connection is allowed at all (restricted names, a cap on
//!   players per address),
//! - which authentication state the player enters (session restored,
//!   unregistered guest, or limbo until login/registration),
//! - which protections apply while they wait (hidden inventory, damage
//!   immunity, blindness, a login timeout).
//!
//! Decisions run on the Tokio pool. Anything that touches a player runs on
//! the single main thread that owns the host world (see
//! [`authgate_scheduler`]).
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use authgate::prelude::*;
//!
//! struct MyServer;
//! impl GateBackend for MyServer { /* name your collaborator types */ }
//!
//! let settings = Settings::load("authgate.toml")?;
//! let commands = settings.join_commands();
//! let gate = AuthGateBuilder::new()
//!     .settings(settings)
//!     .build::<MyServer>(world, commands, collaborators)?;
//!
//! gate.on_connect(Identity::new("Bob", "1.2.3.4", None)?);
//! ```

mod backend;
mod error;
mod gate;
mod join;
pub mod limiter;
mod realm;
pub mod restriction;
mod settings;
mod telemetry;

pub use backend::{Collaborators, GateBackend, LoginFlow, PermissionService};
pub use error::GateError;
pub use gate::{AuthGate, AuthGateBuilder, GateContext, RealmOf};
pub use join::{DenyReason, JoinOutcome, JoinProcess};
pub use limiter::{AdmissionVerdict, OnlineRoster, OnlineTracker};
pub use realm::Realm;
pub use restriction::{RestrictionEntry, RestrictionVerdict};
pub use settings::{
    CommandSettings, HookSettings, RegistrationSettings, RestrictionSettings, Settings,
    SettingsError,
};
pub use telemetry::init_logging;

/// Everything needed to wire a gate into a server.
pub mod prelude {
    pub use crate::{
        AuthGate, AuthGateBuilder, Collaborators, DenyReason, GateBackend, GateError, JoinOutcome, LoginFlow,
        OnlineRoster, OnlineTracker, PermissionService, Realm, Settings,
    };
    pub use authgate_limbo::{CommandRunner, JoinCommands, LimboKind, NoCommands};
    pub use authgate_scheduler::{ClockConfig, MainThreadConfig, Scheduler};
    pub use authgate_session::{
        AuthCache, AuthRecord, AuthStore, MemoryAuthStore, PlayerCache, SessionConfig,
        SessionManager, SessionRegistry, StoreError,
    };
    pub use authgate_types::{
        AuthGroup, Capability, GameMode, Identity, MessageKey, PlayerHandle, PlayerName, World,
    };
}
