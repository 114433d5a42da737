//! The limbo registry: who is in limbo right now.

use std::collections::HashMap;

use authgate_types::PlayerName;

use crate::{LimboError, LimboPlayer};

/// Every player currently in limbo, keyed by name.
///
/// Holds at most one [`LimboPlayer`] per name (key invariant). Inserting a
/// second one is rejected rather than overwriting the first, because the
/// first one records protections that still have to be undone.
#[derive(Debug, Default)]
pub struct LimboRegistry {
    players: HashMap<PlayerName, LimboPlayer>,
}

impl LimboRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `player` to limbo.
    ///
    /// # Errors
    /// [`LimboError::AlreadyInLimbo`] if the name is taken; the registry
    /// is left unchanged.
    pub fn insert(&mut self, player: LimboPlayer) -> Result<&LimboPlayer, LimboError> {
        use std::collections::hash_map::Entry;

        match self.players.entry(player.name.clone()) {
            Entry::Occupied(_) => Err(LimboError::AlreadyInLimbo(player.name)),
            Entry::Vacant(slot) => Ok(slot.insert(player)),
        }
    }

    /// Takes `name` out of limbo.
    pub fn remove(&mut self, name: &PlayerName) -> Option<LimboPlayer> {
        self.players.remove(name)
    }

    pub fn get(&self, name: &PlayerName) -> Option<&LimboPlayer> {
        self.players.get(name)
    }

    pub fn contains(&self, name: &PlayerName) -> bool {
        self.players.contains_key(name)
    }

    /// Removes and returns every player whose deadline is at or before
    /// `now`.
    pub fn expire_overdue(&mut self, now: u64) -> Vec<LimboPlayer> {
        let overdue: Vec<PlayerName> = self
            .players
            .values()
            .filter(|p| p.is_overdue(now))
            .map(|p| p.name.clone())
            .collect();

        overdue
            .iter()
            .filter_map(|name| self.players.remove(name))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.players.len()
    }

    pub fn is_empty(&self) -> bool {
        self.players.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::LimboKind;

    fn limbo(name: &str, deadline: Option<u64>) -> LimboPlayer {
        LimboPlayer {
            name: PlayerName::new(name),
            kind: LimboKind::PendingRegistration,
            admitted_at: 0,
            deadline,
            damage_immunity_ticks: 0,
            blindness_ticks: None,
            inventory_hidden: false,
        }
    }

    #[test]
    fn test_insert_new_player_succeeds() {
        let mut reg = LimboRegistry::new();
        reg.insert(limbo("bob", None)).expect("should insert");
        assert!(reg.contains(&PlayerName::new("BOB")));
        assert_eq!(reg.len(), 1);
    }

    #[test]
    fn test_insert_duplicate_rejected_and_original_kept() {
        let mut reg = LimboRegistry::new();
        reg.insert(limbo("bob", Some(10))).unwrap();

        let result = reg.insert(limbo("Bob", Some(99)));

        assert_eq!(
            result.err(),
            Some(LimboError::AlreadyInLimbo(PlayerName::new("bob")))
        );
        assert_eq!(reg.len(), 1);
        assert_eq!(reg.get(&PlayerName::new("bob")).unwrap().deadline, Some(10));
    }

    #[test]
    fn test_remove_then_insert_again_succeeds() {
        let mut reg = LimboRegistry::new();
        reg.insert(limbo("bob", None)).unwrap();
        assert!(reg.remove(&PlayerName::new("bob")).is_some());

        assert!(reg.insert(limbo("bob", None)).is_ok());
    }

    #[test]
    fn test_expire_overdue_removes_only_overdue() {
        let mut reg = LimboRegistry::new();
        reg.insert(limbo("early", Some(100))).unwrap();
        reg.insert(limbo("late", Some(200))).unwrap();
        reg.insert(limbo("forever", None)).unwrap();

        let expired = reg.expire_overdue(150);

        assert_eq!(expired.len(), 1);
        assert_eq!(expired[0].name, PlayerName::new("early"));
        assert_eq!(reg.len(), 2);
        assert!(reg.expire_overdue(150).is_empty());
    }
}
