//! Unified error type for the gate.

use authgate_limbo::LimboError;
use authgate_scheduler::SchedulerError;
use authgate_session::StoreError;
use authgate_types::IdentityError;

use crate::SettingsError;

/// Top-level error that wraps the errors of every authgate crate.
///
/// The `#[from]` attribute on each variant lets `?` convert sub-crate
/// errors automatically.
#[derive(Debug, thiserror::Error)]
pub enum GateError {
    /// The auth store or login flow failed.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// The main thread is gone or could not be started.
    #[error(transparent)]
    Scheduler(#[from] SchedulerError),

    #[error(transparent)]
    Limbo(#[from] LimboError),

    #[error(transparent)]
    Settings(#[from] SettingsError),

    /// The host reported an unusable identity.
    #[error(transparent)]
    Identity(#[from] IdentityError),
}
