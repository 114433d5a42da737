//! Error types for the session layer.

use authgate_types::PlayerName;

/// Failures reported by an [`AuthStore`](crate::AuthStore).
///
/// The gate never retries; retry and backoff are the store's business.
/// A join that hits one of these is refused.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    /// The backing store could not be reached.
    #[error("auth store unavailable: {0}")]
    Unavailable(String),

    /// The store answered, but the data for this player is unusable.
    #[error("corrupt auth record for {name}: {reason}")]
    Corrupt { name: PlayerName, reason: String },
}
