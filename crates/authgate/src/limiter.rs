//! Per-address join cap.
//!
//! Several accounts joining from the same address is the usual sign of an
//! alt farm. The cap counts players already online from the connecting
//! address and refuses the join once the count exceeds the limit.
//!
//! Loopback connections (proxies, local testing) and players holding
//! [`Capability::AllowMultipleAccounts`](authgate_types::Capability) are
//! exempt.

use std::collections::{HashMap, HashSet};
use std::sync::{PoisonError, RwLock};

use authgate_types::PlayerName;

/// Result of [`check`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdmissionVerdict {
    Admitted,
    /// Too many players online from the address.
    TooManyFromIp { online: usize, max: i64 },
}

impl AdmissionVerdict {
    pub fn is_admitted(self) -> bool {
        self == Self::Admitted
    }
}

/// `true` for the addresses the cap never applies to.
pub fn is_loopback(ip: &str) -> bool {
    ip == "127.0.0.1" || ip.eq_ignore_ascii_case("localhost")
}

/// Applies the per-address cap.
///
/// `online_by_ip` is the number of players online from `ip`, including
/// the one joining. `max_allowed <= 0` disables the cap.
pub fn check(
    ip: &str,
    online_by_ip: usize,
    max_allowed: i64,
    has_bypass: bool,
) -> AdmissionVerdict {
    if max_allowed <= 0 || is_loopback(ip) || has_bypass {
        return AdmissionVerdict::Admitted;
    }
    let over = i64::try_from(online_by_ip).map_or(true, |online| online > max_allowed);
    if over {
        AdmissionVerdict::TooManyFromIp {
            online: online_by_ip,
            max: max_allowed,
        }
    } else {
        AdmissionVerdict::Admitted
    }
}

/// Source of the online-by-address count.
///
/// The count is read once per join and may be slightly stale by the
/// time the pipeline acts on it.
pub trait OnlineRoster: Send + Sync + 'static {
    fn count_by_ip(&self, ip: &str) -> usize;
}

/// In-memory [`OnlineRoster`]. The host calls
/// [`connect`](Self::connect) when a player comes online (before the join
/// pipeline runs) and [`disconnect`](Self::disconnect) when they leave.
#[derive(Debug, Default)]
pub struct OnlineTracker {
    by_ip: RwLock<HashMap<String, HashSet<PlayerName>>>,
}

impl OnlineTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records `name` as online from `ip`. Returns `false` if it already
    /// was.
    pub fn connect(&self, name: &PlayerName, ip: &str) -> bool {
        let mut by_ip = self.by_ip.write().unwrap_or_else(PoisonError::into_inner);
        let added = by_ip.entry(ip.to_string()).or_default().insert(name.clone());
        tracing::trace!(%name, ip, added, "roster connect");
        added
    }

    /// Forgets `name` on `ip`. Returns `false` if it was not recorded.
    pub fn disconnect(&self, name: &PlayerName, ip: &str) -> bool {
        let mut by_ip = self.by_ip.write().unwrap_or_else(PoisonError::into_inner);
        let Some(names) = by_ip.get_mut(ip) else {
            return false;
        };
        let removed = names.remove(name);
        if names.is_empty() {
            by_ip.remove(ip);
        }
        removed
    }

    /// Total players online across all addresses.
    pub fn len(&self) -> usize {
        self.by_ip
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .values()
            .map(HashSet::len)
            .sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl OnlineRoster for OnlineTracker {
    fn count_by_ip(&self, ip: &str) -> usize {
        self.by_ip
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(ip)
            .map_or(0, HashSet::len)
    }
}
