//! The state owned by the main thread.

use tracing::{debug, info};

use authgate_limbo::{AdmitRequest, CommandRunner, LimboError, LimboPlayer, LimboService};
use authgate_scheduler::{Simulation, TickInfo};
use authgate_types::{GameMode, MessageKey, PlayerHandle, PlayerName, World};

/// The host world plus the limbo registry, moved onto the main thread
/// together so every protected task sees both.
///
/// Player lookups return `None` once a player has left. Protected tasks
/// run after the join that scheduled them, so every helper here treats a
/// missing player as a normal outcome and reports it as `false`.
pub struct Realm<W, K> {
    world: W,
    limbo: LimboService<K>,
    tick: u64,
}

impl<W: World, K: CommandRunner> Realm<W, K> {
    pub fn new(world: W, limbo: LimboService<K>) -> Self {
        Self {
            world,
            limbo,
            tick: 0,
        }
    }

    pub fn world(&self) -> &W {
        &self.world
    }

    pub fn world_mut(&mut self) -> &mut W {
        &mut self.world
    }

    pub fn limbo(&self) -> &LimboService<K> {
        &self.limbo
    }

    /// The last tick seen by [`Simulation::on_tick`].
    pub fn tick(&self) -> u64 {
        self.tick
    }

    /// Disconnects a player with `reason`.
    pub fn kick(&mut self, name: &PlayerName, reason: MessageKey) -> bool {
        let Some(player) = self.world.player_mut(name) else {
            debug!(%name, ?reason, "kick skipped, player already gone");
            return false;
        };
        player.kick(reason.text());
        info!(%name, ?reason, "player kicked");
        true
    }

    pub fn send(&mut self, name: &PlayerName, message: MessageKey) -> bool {
        match self.world.player_mut(name) {
            Some(player) => {
                player.send_message(message.text());
                true
            }
            None => false,
        }
    }

    pub fn set_game_mode(&mut self, name: &PlayerName, mode: GameMode) -> bool {
        match self.world.player_mut(name) {
            Some(player) => {
                player.set_game_mode(mode);
                true
            }
            None => false,
        }
    }

    pub fn ban_ip(&mut self, ip: &str) {
        self.world.ban_ip(ip);
        info!(ip, "address banned");
    }

    /// Puts a player in limbo at the current tick.
    ///
    /// Returns `Ok(false)` without creating anything if the player left.
    ///
    /// # Errors
    /// [`LimboError::AlreadyInLimbo`] if a limbo entry already exists.
    pub fn admit_to_limbo(
        &mut self,
        name: PlayerName,
        registered: bool,
        hide_inventory: bool,
    ) -> Result<bool, LimboError> {
        let Some(player) = self.world.player_mut(&name) else {
            debug!(%name, "limbo skipped, player already gone");
            return Ok(false);
        };
        let request = AdmitRequest {
            name,
            registered,
            hide_inventory,
            now: self.tick,
        };
        self.limbo.admit(player, request)?;
        Ok(true)
    }

    /// Takes an authenticated player out of limbo.
    ///
    /// If the player already left, the entry is dropped without touching
    /// the player.
    ///
    /// # Errors
    /// [`LimboError::NotInLimbo`] if there is no entry for `name`.
    pub fn release_from_limbo(&mut self, name: &PlayerName) -> Result<LimboPlayer, LimboError> {
        match self.world.player_mut(name) {
            Some(player) => self.limbo.release(name, player),
            None => self
                .limbo
                .discard(name)
                .ok_or_else(|| LimboError::NotInLimbo(name.clone())),
        }
    }

    /// Forgets the limbo entry of a player who quit.
    pub fn forget(&mut self, name: &PlayerName) -> Option<LimboPlayer> {
        self.limbo.discard(name)
    }
}

impl<W: World, K: CommandRunner> Simulation for Realm<W, K> {
    fn on_tick(&mut self, tick: &TickInfo) {
        self.tick = tick.tick;
        for expired in self.limbo.expire_overdue(self.tick) {
            info!(name = %expired.name, tick = self.tick, "limbo timeout");
            self.kick(&expired.name, MessageKey::LoginTimeout);
        }
    }
}
