//! Error types for the limbo layer.

use authgate_types::PlayerName;

/// Errors that can occur while admitting or releasing limbo players.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LimboError {
    /// The player is already in limbo. The previous entry must be released
    /// (by the login, registration or quit flow) before a new one can be
    /// created. Nothing was changed.
    #[error("player {0} is already in limbo")]
    AlreadyInLimbo(PlayerName),

    /// The player is not in limbo.
    #[error("player {0} is not in limbo")]
    NotInLimbo(PlayerName),
}
