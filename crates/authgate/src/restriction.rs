//! Name restrictions: tie an account name to the addresses allowed to use
//! it.
//!
//! Restriction is opt-in per name. A name that appears nowhere in the
//! allow-list is never refused here; a name that does appear may only
//! join from one of the addresses listed for it.

use authgate_types::PlayerName;

/// One `"name;address"` allow-list entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RestrictionEntry {
    name: PlayerName,
    /// An IP address (compared exactly) or a hostname (compared ignoring
    /// case).
    address: String,
}

impl RestrictionEntry {
    pub fn new(name: &str, address: &str) -> Self {
        Self {
            name: PlayerName::new(name),
            address: address.trim().to_string(),
        }
    }

    /// Parses `"name;address"`. Returns `None` if there is no `;` or
    /// either side is blank.
    pub fn parse(raw: &str) -> Option<Self> {
        let (name, address) = raw.split_once(';')?;
        if name.trim().is_empty() || address.trim().is_empty() {
            return None;
        }
        Some(Self::new(name, address))
    }

    pub fn name(&self) -> &PlayerName {
        &self.name
    }

    pub fn address(&self) -> &str {
        &self.address
    }

    fn permits(&self, ip: &str, hostname: Option<&str>) -> bool {
        self.address == ip
            || hostname.is_some_and(|h| self.address.eq_ignore_ascii_case(h))
    }
}

/// Result of [`evaluate`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RestrictionVerdict {
    Allowed,
    /// The name is restricted and no entry for it matches the address.
    Denied,
}

impl RestrictionVerdict {
    pub fn is_allowed(self) -> bool {
        self == Self::Allowed
    }
}

/// Checks a connecting name and address against the allow-list.
///
/// Pure: no I/O, no side effects. The caller acts on a denial.
pub fn evaluate(
    name: &PlayerName,
    ip: &str,
    hostname: Option<&str>,
    entries: &[RestrictionEntry],
    enabled: bool,
) -> RestrictionVerdict {
    if !enabled {
        return RestrictionVerdict::Allowed;
    }

    let mut restricted = false;
    for entry in entries.iter().filter(|e| &e.name == name) {
        if entry.permits(ip, hostname) {
            return RestrictionVerdict::Allowed;
        }
        restricted = true;
    }

    if restricted {
        RestrictionVerdict::Denied
    } else {
        RestrictionVerdict::Allowed
    }
}
