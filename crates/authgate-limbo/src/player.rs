//! The limbo player: protective state for one waiting player.

use std::fmt;

use serde::{Deserialize, Serialize};

use authgate_types::PlayerName;

/// Why the player is waiting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LimboKind {
    /// No account yet: waiting for `/register`.
    PendingRegistration,
    /// Account exists: waiting for `/login`.
    PendingLogin,
}

impl LimboKind {
    pub fn for_registered(registered: bool) -> Self {
        if registered {
            Self::PendingLogin
        } else {
            Self::PendingRegistration
        }
    }
}

impl fmt::Display for LimboKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::PendingRegistration => write!(f, "PendingRegistration"),
            Self::PendingLogin => write!(f, "PendingLogin"),
        }
    }
}

/// State held for a player in limbo.
///
/// Records what was done to the player on admission so that exactly that
/// can be undone on release.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LimboPlayer {
    pub name: PlayerName,
    pub kind: LimboKind,
    /// Tick at which the player entered limbo.
    pub admitted_at: u64,
    /// Tick after which the player is kicked. `None` = no timeout.
    pub deadline: Option<u64>,
    /// Damage immunity granted on admission, in ticks.
    pub damage_immunity_ticks: u32,
    /// Blindness applied on admission, in ticks. `None` if not applied.
    pub blindness_ticks: Option<u32>,
    /// Whether the player's inventory is currently hidden from them.
    pub inventory_hidden: bool,
}

impl LimboPlayer {
    /// `true` once `now` has reached the deadline.
    pub fn is_overdue(&self, now: u64) -> bool {
        self.deadline.is_some_and(|deadline| now >= deadline)
    }
}
