//! The persisted authentication record.

use serde::{Deserialize, Serialize};

use authgate_types::PlayerName;

/// What the auth store remembers about an account.
///
/// The gate reads records and clears the logged-in flag. It never writes an
/// authenticated record: that is the login flow's job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthRecord {
    /// Account key.
    pub name: PlayerName,
    /// Address of the last successful login. `None` for accounts that
    /// never logged in (or were imported without one).
    pub last_ip: Option<String>,
    /// Whether the store considers the player currently logged in.
    pub logged_in: bool,
    /// Unix time of the last login, in milliseconds.
    pub last_login_ms: Option<u64>,
}

impl AuthRecord {
    /// A registered account that is not logged in.
    pub fn registered(name: PlayerName) -> Self {
        Self {
            name,
            last_ip: None,
            logged_in: false,
            last_login_ms: None,
        }
    }

    /// Sets the last login address.
    pub fn with_last_ip(mut self, ip: &str) -> Self {
        self.last_ip = Some(ip.to_string());
        self
    }

    /// Marks the record as logged in.
    pub fn logged_in(mut self) -> Self {
        self.logged_in = true;
        self
    }

    /// `true` if the last login came from exactly `ip`.
    pub fn last_ip_is(&self, ip: &str) -> bool {
        self.last_ip.as_deref() == Some(ip)
    }
}
