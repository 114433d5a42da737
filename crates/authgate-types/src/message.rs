//! User-visible messages.
//!
//! The gate never builds free-form strings for players. Every kick reason
//! and notice is a [`MessageKey`], which keeps the wording in one place and
//! lets hosts localize by matching on the key instead of the English text.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Identifies a message the gate sends to (or kicks) a player with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MessageKey {
    /// Kick: the name is restricted and the address is not on its
    /// allow-list.
    NotOwnerError,

    /// Kick: too many players are already online from this address.
    SameIpOnline,

    /// Notice: a live session was found for this address, so the player
    /// is logged in without typing a password.
    SessionReconnection,

    /// Notice: a session existed but for a different address. The player
    /// must authenticate again.
    SessionExpired,

    /// Kick: the player stayed in limbo past the registration timeout.
    LoginTimeout,

    /// Kick: the join pipeline failed (store unreachable, main thread
    /// gone). The gate fails safe by refusing the player.
    JoinFailed,
}

impl MessageKey {
    /// The default English text for this key.
    pub fn text(self) -> &'static str {
        match self {
            Self::NotOwnerError => {
                "You are not the owner of this account. Please choose another name!"
            }
            Self::SameIpOnline => {
                "A player with the same IP is already in game!"
            }
            Self::SessionReconnection => "Session restored, you are logged in.",
            Self::SessionExpired => {
                "Your session has expired, please log in again."
            }
            Self::LoginTimeout => "Login timeout exceeded, you have been kicked.",
            Self::JoinFailed => {
                "An error occurred while joining, please try again later."
            }
        }
    }
}

impl fmt::Display for MessageKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.text())
    }
}
