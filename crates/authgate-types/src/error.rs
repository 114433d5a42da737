//! Error types for the identity layer.

/// Errors raised while building an [`Identity`](crate::Identity) from what
/// the host reports about a connection.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum IdentityError {
    /// The host reported an empty (or whitespace-only) player name.
    #[error("player name is empty")]
    EmptyName,

    /// The host reported an empty address for the connection.
    #[error("connection address is empty for player {0}")]
    EmptyAddress(String),
}
