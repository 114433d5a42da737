//! The limbo service: admits players to limbo and releases them.
//!
//! Admission applies protections in a fixed order. Each step assumes the
//! previous ones are in place:
//!
//! ```text
//! 1. duplicate check     (nothing applied yet)
//! 2. hide inventory      (registered players, if enabled)
//! 3. damage immunity     (for the timeout)
//! 4. message of the day  (if enabled)
//! 5. blindness           (for the timeout, if enabled)
//! 6. registry entry
//! 7. join commands       (expect the full limbo state above)
//! ```
//!
//! Step 1 is the only one that can fail, and it fails before anything
//! touches the player, so admission is all-or-nothing.

use authgate_types::{
    BLINDNESS_AMPLIFIER, PlayerHandle, PlayerName, secs_to_ticks,
};

use crate::{CommandRunner, LimboError, LimboKind, LimboPlayer, LimboRegistry};

/// Blindness length when no timeout is configured. Effects cannot be
/// infinite, so this stands in for "until login".
pub const BLINDNESS_FALLBACK_TICKS: u32 = 99_999;

/// Limbo behaviour, taken from the gate settings.
#[derive(Debug, Clone)]
pub struct LimboSettings {
    /// Seconds a player may stay in limbo. 0 or less = no timeout.
    pub timeout_secs: i64,
    /// Black out the player's screen while in limbo.
    pub apply_blindness: bool,
    /// Run the `motd` command on admission.
    pub show_motd: bool,
}

impl Default for LimboSettings {
    fn default() -> Self {
        Self {
            timeout_secs: 30,
            apply_blindness: false,
            show_motd: false,
        }
    }
}

impl LimboSettings {
    /// The timeout in ticks (0 = none).
    pub fn timeout_ticks(&self) -> u32 {
        secs_to_ticks(self.timeout_secs)
    }
}

/// Per-join input to [`LimboService::admit`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdmitRequest {
    pub name: PlayerName,
    /// Whether an account exists.
    pub registered: bool,
    /// Hide the inventory until login.
    pub hide_inventory: bool,
    /// Current server tick.
    pub now: u64,
}

/// Owns the [`LimboRegistry`] and applies limbo protections.
pub struct LimboService<K> {
    registry: LimboRegistry,
    settings: LimboSettings,
    commands: K,
}

impl<K: CommandRunner> LimboService<K> {
    pub fn new(settings: LimboSettings, commands: K) -> Self {
        Self {
            registry: LimboRegistry::new(),
            settings,
            commands,
        }
    }

    /// Places a player in limbo and applies every protection.
    ///
    /// # Errors
    /// [`LimboError::AlreadyInLimbo`] if the player is already in limbo.
    /// In that case nothing was applied to `player`.
    pub fn admit<P: PlayerHandle>(
        &mut self,
        player: &mut P,
        request: AdmitRequest,
    ) -> Result<&LimboPlayer, LimboError> {
        if self.registry.contains(&request.name) {
            return Err(LimboError::AlreadyInLimbo(request.name));
        }

        let timeout_ticks = self.settings.timeout_ticks();
        let deadline = (timeout_ticks > 0).then(|| request.now + u64::from(timeout_ticks));

        let inventory_hidden = request.hide_inventory && hide_inventory(player);

        player.set_no_damage_ticks(timeout_ticks);

        if self.settings.show_motd {
            player.perform_command("motd");
        }

        let blindness_ticks = self.settings.apply_blindness.then(|| {
            let duration = if timeout_ticks == 0 {
                BLINDNESS_FALLBACK_TICKS
            } else {
                timeout_ticks
            };
            player.add_blindness(duration, BLINDNESS_AMPLIFIER);
            duration
        });

        let limbo = LimboPlayer {
            name: request.name,
            kind: LimboKind::for_registered(request.registered),
            admitted_at: request.now,
            deadline,
            damage_immunity_ticks: timeout_ticks,
            blindness_ticks,
            inventory_hidden,
        };

        let entry = self.registry.insert(limbo)?;
        tracing::info!(
            name = %entry.name,
            kind = %entry.kind,
            deadline = ?entry.deadline,
            "player admitted to limbo"
        );

        self.commands.run_on_join(player);
        Ok(entry)
    }

    /// Takes a player out of limbo and undoes what admission applied.
    ///
    /// Called by the login and registration flows once the player has
    /// authenticated.
    ///
    /// # Errors
    /// [`LimboError::NotInLimbo`] if there is no limbo entry for the name.
    pub fn release<P: PlayerHandle>(
        &mut self,
        name: &PlayerName,
        player: &mut P,
    ) -> Result<LimboPlayer, LimboError> {
        let limbo = self
            .registry
            .remove(name)
            .ok_or_else(|| LimboError::NotInLimbo(name.clone()))?;

        if limbo.blindness_ticks.is_some() {
            player.remove_blindness();
        }
        if limbo.inventory_hidden {
            player.restore_inventory();
        }
        player.set_no_damage_ticks(0);

        tracing::info!(%name, "player released from limbo");
        Ok(limbo)
    }

    /// Drops the limbo entry of a player who left, without touching the
    /// (gone) player object.
    pub fn discard(&mut self, name: &PlayerName) -> Option<LimboPlayer> {
        self.registry.remove(name)
    }

    /// Removes every player whose timeout has passed. The caller kicks
    /// them.
    pub fn expire_overdue(&mut self, now: u64) -> Vec<LimboPlayer> {
        self.registry.expire_overdue(now)
    }

    pub fn registry(&self) -> &LimboRegistry {
        &self.registry
    }

    pub fn settings(&self) -> &LimboSettings {
        &self.settings
    }
}

/// Hides the inventory. If the host refuses, the real inventory is resent
/// so the client is not left showing a half-hidden one.
fn hide_inventory<P: PlayerHandle>(player: &mut P) -> bool {
    if player.hide_inventory() {
        return true;
    }
    player.update_inventory();
    tracing::debug!(
        player = player.display_name(),
        "inventory protection vetoed by host"
    );
    false
}
