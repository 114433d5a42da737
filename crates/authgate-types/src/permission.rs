//! Permission groups and capabilities.
//!
//! Group assignment and permission storage belong to the host's permission
//! plugin. The gate only names the groups it asks for and the capabilities
//! it checks.

use std::fmt;

use serde::{Deserialize, Serialize};

/// The authentication group a player is placed in while joining.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AuthGroup {
    /// No account exists for this name.
    Unregistered,
    /// An account exists but the player has not logged in yet.
    RegisteredUnauthenticated,
    /// The player is authenticated.
    LoggedIn,
}

impl fmt::Display for AuthGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unregistered => write!(f, "unregistered"),
            Self::RegisteredUnauthenticated => {
                write!(f, "registered-unauthenticated")
            }
            Self::LoggedIn => write!(f, "logged-in"),
        }
    }
}

/// A capability the gate checks before applying a restriction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Capability {
    /// Exempt from the forced switch to survival mode on join.
    BypassForceSurvival,
    /// Exempt from the per-IP join cap.
    AllowMultipleAccounts,
}

impl Capability {
    /// The permission node hosts usually store this capability under.
    pub fn node(self) -> &'static str {
        match self {
            Self::BypassForceSurvival => "authgate.bypass.forcesurvival",
            Self::AllowMultipleAccounts => "authgate.allow.multipleaccounts",
        }
    }
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.node())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_auth_group_display() {
        assert_eq!(AuthGroup::Unregistered.to_string(), "unregistered");
        assert_eq!(
            AuthGroup::RegisteredUnauthenticated.to_string(),
            "registered-unauthenticated"
        );
    }

    #[test]
    fn test_capability_node() {
        assert_eq!(
            Capability::AllowMultipleAccounts.to_string(),
            "authgate.allow.multipleaccounts"
        );
    }
}
