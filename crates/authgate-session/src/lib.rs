//! Authentication state for authgate.
//!
//! This crate answers one question for the join pipeline: does the
//! connecting player already have a session we can trust?
//!
//! 1. **Contracts**: [`AuthStore`], [`SessionRegistry`] and [`AuthCache`]
//!    describe the persistent store and the two in-memory registries the
//!    gate consults. They are owned by other parts of the server.
//! 2. **In-memory implementations**: [`MemoryAuthStore`],
//!    [`SessionManager`] and [`PlayerCache`] for tests, demos and
//!    single-process servers.
//! 3. **Reconciliation**: [`SessionReconciler`] turns those lookups into a
//!    [`SessionState`]: restore the session, discard it, or none at all.
//!
//! # How it fits in the stack
//!
//! ```text
//! authgate (pipeline)  ← acts on the SessionState
//!     ↕
//! Session layer (this crate)  ← reads and invalidates auth state
//!     ↕
//! Types  ← PlayerName, Identity
//! ```

mod cache;
mod error;
mod manager;
mod reconciler;
mod record;
mod store;

pub use cache::PlayerCache;
pub use error::StoreError;
pub use manager::{SessionConfig, SessionManager};
pub use reconciler::{SessionReconciler, SessionState};
pub use record::AuthRecord;
pub use store::{AuthCache, AuthStore, MemoryAuthStore, SessionRegistry};
