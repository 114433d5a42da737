//! Identity types: who is connecting, and from where.
//!
//! Player names are case-insensitive. "Bob", "BOB" and "bob" are the same
//! account, so every registry in authgate keys on the lower-cased
//! [`PlayerName`] while the original spelling is kept in [`Identity`] for
//! display purposes.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::IdentityError;

// ---------------------------------------------------------------------------
// PlayerName
// ---------------------------------------------------------------------------

/// The canonical, lower-case key for a player account.
///
/// This is a newtype wrapper around `String`. Building one always goes
/// through [`PlayerName::new`], which lower-cases the input, so two
/// `PlayerName`s compare equal exactly when the names match
/// case-insensitively.
///
/// `#[serde(transparent)]` makes a `PlayerName` serialize as the bare
/// string `"bob"` rather than `{ "0": "bob" }`.
#[derive(
    Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct PlayerName(String);

impl PlayerName {
    /// Creates the canonical key for `name` (trimmed and lower-cased).
    pub fn new(name: &str) -> Self {
        Self(name.trim().to_lowercase())
    }

    /// The canonical lower-case form.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns `true` if `other` names the same account, ignoring case.
    pub fn matches(&self, other: &str) -> bool {
        self.0 == other.trim().to_lowercase()
    }
}

impl fmt::Display for PlayerName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for PlayerName {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

// ---------------------------------------------------------------------------
// Identity
// ---------------------------------------------------------------------------

/// Everything the gate knows about a connection when the join event fires.
///
/// Immutable for the lifetime of one join: the pipeline clones it into
/// every task it schedules rather than sharing a mutable copy.
///
/// The address is kept as the text the host reports (`"1.2.3.4"`,
/// `"localhost"`) because restriction entries and stored session records
/// are compared against that exact text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    /// The name as the player typed it. Used in messages and commands.
    display_name: String,
    /// Canonical lower-case key.
    name: PlayerName,
    /// Connecting address.
    ip: String,
    /// Reverse-resolved hostname of `ip`, if the host resolved one.
    hostname: Option<String>,
}

impl Identity {
    /// Builds an identity from the raw values the host reports.
    ///
    /// # Errors
    /// - [`IdentityError::EmptyName`] if `name` is blank.
    /// - [`IdentityError::EmptyAddress`] if `ip` is blank.
    pub fn new(
        name: &str,
        ip: &str,
        hostname: Option<&str>,
    ) -> Result<Self, IdentityError> {
        let display_name = name.trim();
        if display_name.is_empty() {
            return Err(IdentityError::EmptyName);
        }
        let ip = ip.trim();
        if ip.is_empty() {
            return Err(IdentityError::EmptyAddress(display_name.to_string()));
        }
        // A blank hostname means the lookup produced nothing useful.
        let hostname = hostname
            .map(str::trim)
            .filter(|h| !h.is_empty())
            .map(str::to_string);

        Ok(Self {
            display_name: display_name.to_string(),
            name: PlayerName::new(display_name),
            ip: ip.to_string(),
            hostname,
        })
    }

    /// The name exactly as the player typed it.
    pub fn display_name(&self) -> &str {
        &self.display_name
    }

    /// The canonical key.
    pub fn name(&self) -> &PlayerName {
        &self.name
    }

    /// The connecting address, as reported by the host.
    pub fn ip(&self) -> &str {
        &self.ip
    }

    /// The resolved hostname, if any.
    pub fn hostname(&self) -> Option<&str> {
        self.hostname.as_deref()
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.display_name, self.ip)
    }
}
