//! Gate settings, loaded from TOML.
//!
//! Every key is optional. A missing file section falls back to the
//! defaults below, so an empty file is a valid configuration.
//!
//! ```toml
//! [restrictions]
//! unrestricted-names = ["npc_shopkeeper"]
//! force-survival-mode = false
//! enable-restricted-users = true
//! allowed-restricted-users = ["admin;127.0.0.1", "admin;home.example.org"]
//! ban-unknown-ip = false
//! max-join-per-ip = 2
//! protect-inventory-before-login = true
//! timeout-secs = 30
//!
//! [registration]
//! force = true
//! apply-blind-effect = false
//!
//! [hooks]
//! use-motd = false
//!
//! [commands]
//! on-join = ["spawn", "msg %p Welcome!"]
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use authgate_limbo::{JoinCommands, LimboSettings};
use authgate_types::PlayerName;

use crate::RestrictionEntry;

/// Errors raised while loading settings.
#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    /// The settings file could not be read.
    #[error("failed to read settings from {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The file is not valid TOML, or a value has the wrong type.
    #[error("invalid settings: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Top-level gate settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct Settings {
    pub restrictions: RestrictionSettings,
    pub registration: RegistrationSettings,
    pub hooks: HookSettings,
    pub commands: CommandSettings,
}

/// Who may join, from where, and how they are protected until login.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct RestrictionSettings {
    /// Names that skip the gate entirely (NPCs, bots).
    pub unrestricted_names: Vec<String>,
    /// Switch joining players to survival mode.
    pub force_survival_mode: bool,
    /// Enforce `allowed-restricted-users`.
    pub enable_restricted_users: bool,
    /// `"name;address"` pairs. A listed name may only join from one of
    /// its addresses (IP or hostname).
    pub allowed_restricted_users: Vec<String>,
    /// Ban the address of a player refused by the restriction list.
    pub ban_unknown_ip: bool,
    /// Players allowed online per address. 0 disables the cap.
    pub max_join_per_ip: i64,
    /// Hide a registered player's inventory until they log in.
    pub protect_inventory_before_login: bool,
    /// Seconds a player may stay in limbo. 0 disables the timeout.
    pub timeout_secs: i64,
}

impl Default for RestrictionSettings {
    fn default() -> Self {
        Self {
            unrestricted_names: Vec::new(),
            force_survival_mode: false,
            enable_restricted_users: false,
            allowed_restricted_users: Vec::new(),
            ban_unknown_ip: false,
            max_join_per_ip: 0,
            protect_inventory_before_login: true,
            timeout_secs: 30,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct RegistrationSettings {
    /// Unregistered players must register before playing. When `false`
    /// they play as guests and never enter limbo.
    pub force: bool,
    /// Black out the screen while in limbo.
    pub apply_blind_effect: bool,
}

impl Default for RegistrationSettings {
    fn default() -> Self {
        Self {
            force: true,
            apply_blind_effect: false,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct HookSettings {
    /// Show the message of the day on entering limbo.
    pub use_motd: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct CommandSettings {
    /// Commands run as the player on entering limbo. `%p` is the player's
    /// name.
    pub on_join: Vec<String>,
}

impl Settings {
    /// Reads and parses a TOML settings file. The result is not yet
    /// [validated](Self::validated).
    ///
    /// # Errors
    /// [`SettingsError::Io`] if the file cannot be read,
    /// [`SettingsError::Parse`] if it is not valid.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, SettingsError> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|source| SettingsError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        debug!(path = %path.display(), "loaded settings file");
        Self::from_toml_str(&text)
    }

    /// Parses settings from TOML text.
    ///
    /// # Errors
    /// [`SettingsError::Parse`] if the text is not valid.
    pub fn from_toml_str(text: &str) -> Result<Self, SettingsError> {
        Ok(toml::from_str(text)?)
    }

    /// Normalizes values the gate cannot use as-is.
    ///
    /// - negative `max-join-per-ip` and `timeout-secs` become 0 (disabled)
    /// - blank names and commands are dropped
    /// - `allowed-restricted-users` entries without a `;` are dropped
    ///
    /// Each change is logged at `warn`.
    pub fn validated(mut self) -> Self {
        let r = &mut self.restrictions;

        if r.max_join_per_ip < 0 {
            warn!(value = r.max_join_per_ip, "max-join-per-ip is negative, disabling the cap");
            r.max_join_per_ip = 0;
        }
        if r.timeout_secs < 0 {
            warn!(value = r.timeout_secs, "timeout-secs is negative, disabling the timeout");
            r.timeout_secs = 0;
        }

        r.unrestricted_names.retain(|n| !n.trim().is_empty());

        r.allowed_restricted_users.retain(|raw| {
            let ok = RestrictionEntry::parse(raw).is_some();
            if !ok {
                warn!(entry = %raw, "skipping malformed allowed-restricted-users entry, expected \"name;address\"");
            }
            ok
        });

        self.commands.on_join.retain(|c| !c.trim().is_empty());
        self
    }

    /// The parsed restriction allow-list. Malformed entries are skipped.
    pub fn restriction_entries(&self) -> Vec<RestrictionEntry> {
        self.restrictions
            .allowed_restricted_users
            .iter()
            .filter_map(|raw| RestrictionEntry::parse(raw))
            .collect()
    }

    /// `true` if `name` bypasses the gate.
    pub fn is_unrestricted(&self, name: &PlayerName) -> bool {
        self.restrictions
            .unrestricted_names
            .iter()
            .any(|n| name.matches(n))
    }

    /// Limbo behaviour derived from these settings.
    pub fn limbo_settings(&self) -> LimboSettings {
        LimboSettings {
            timeout_secs: self.restrictions.timeout_secs,
            apply_blindness: self.registration.apply_blind_effect,
            show_motd: self.hooks.use_motd,
        }
    }

    /// The join command runner for `commands.on-join`.
    pub fn join_commands(&self) -> JoinCommands {
        JoinCommands::new(self.commands.on_join.iter().cloned())
    }
}
