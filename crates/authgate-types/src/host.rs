//! Host traits: the narrow view of the game server the gate may touch.
//!
//! The game server owns its world and its player objects. authgate never
//! stores them. Instead, the world is moved into the main thread actor
//! (see `authgate-scheduler`) and only ever reached as `&mut W` inside a
//! protected task. Because a `&mut` borrow cannot escape the task closure,
//! the compiler enforces the rule that player state is mutated on the main
//! thread only.
//!
//! Implement [`World`] and [`PlayerHandle`] for your server. Tests and the
//! demo use small in-memory fakes.

use crate::PlayerName;

/// Simulation ticks per second. Durations handed to the host (damage
/// immunity, effect length) are expressed in ticks.
pub const TICKS_PER_SECOND: u32 = 20;

/// Amplifier used for the limbo blindness effect.
pub const BLINDNESS_AMPLIFIER: u8 = 2;

/// Converts a configured number of seconds to ticks.
///
/// Zero or negative values mean "disabled" and map to 0. Large values
/// saturate instead of overflowing.
pub fn secs_to_ticks(secs: i64) -> u32 {
    if secs <= 0 {
        return 0;
    }
    let ticks = secs.saturating_mul(i64::from(TICKS_PER_SECOND));
    u32::try_from(ticks).unwrap_or(u32::MAX)
}

/// Game modes the gate can force a player into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GameMode {
    Survival,
    Creative,
    Adventure,
    Spectator,
}

/// A live player object owned by the host.
///
/// Every method is called on the main thread, from inside a protected
/// task. Implementations therefore need no internal locking.
pub trait PlayerHandle {
    /// The name as the host displays it.
    fn display_name(&self) -> &str;

    /// Disconnects the player with a reason shown on their screen.
    fn kick(&mut self, reason: &str);

    /// Sends a chat line to the player.
    fn send_message(&mut self, text: &str);

    /// Switches the player's game mode.
    fn set_game_mode(&mut self, mode: GameMode);

    /// Hides the player's inventory from their own client.
    ///
    /// Returns `false` if the host (or another plugin) vetoed the request,
    /// in which case the caller resends the real inventory with
    /// [`update_inventory`](Self::update_inventory).
    fn hide_inventory(&mut self) -> bool;

    /// Shows the real inventory again after [`hide_inventory`](Self::hide_inventory).
    fn restore_inventory(&mut self);

    /// Resends the player's current inventory to their client.
    fn update_inventory(&mut self);

    /// Makes the player immune to damage for `ticks` ticks. 0 clears it.
    fn set_no_damage_ticks(&mut self, ticks: u32);

    /// Applies a blindness effect. The host has no notion of an infinite
    /// effect, so `duration_ticks` is always finite.
    fn add_blindness(&mut self, duration_ticks: u32, amplifier: u8);

    /// Removes a blindness effect applied by [`add_blindness`](Self::add_blindness).
    fn remove_blindness(&mut self);

    /// Runs a command as if the player had typed it (without the slash).
    fn perform_command(&mut self, command: &str);
}

/// The game server's world, as seen by the gate.
///
/// `Send + 'static` because the world is moved onto the main thread when
/// the gate starts.
pub trait World: Send + 'static {
    /// The host's player type.
    type Player: PlayerHandle;

    /// Looks up an online player by canonical name.
    ///
    /// Returns `None` if the player already left. Protected tasks run
    /// some time after they were scheduled, so callers must treat a
    /// missing player as a normal outcome.
    fn player_mut(&mut self, name: &PlayerName) -> Option<&mut Self::Player>;

    /// Adds `ip` to the server's network ban list.
    fn ban_ip(&mut self, ip: &str);
}
