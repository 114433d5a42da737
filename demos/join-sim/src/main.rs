//! Join simulation: a handful of players connect to a gate wired with
//! in-memory collaborators, and every effect on them is logged.
//!
//! ```text
//! cargo run -p join-sim                 # built-in settings
//! cargo run -p join-sim -- gate.toml    # your own settings file
//! RUST_LOG=debug cargo run -p join-sim  # include scheduling detail
//! ```

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use authgate::prelude::*;
use authgate::{GateError, RealmOf};
use tracing::info;

const DEMO_SETTINGS: &str = r#"
[restrictions]
enable-restricted-users = true
allowed-restricted-users = ["admin;10.0.0.1", "oops-no-separator"]
ban-unknown-ip = true
max-join-per-ip = 2
timeout-secs = 2

[registration]
force = true
apply-blind-effect = true

[hooks]
use-motd = true

[commands]
on-join = ["/spawn", "msg %p Type /register or /login"]
"#;

// ---------------------------------------------------------------------------
// Host
// ---------------------------------------------------------------------------

/// A player that logs what happens to it.
struct ConsolePlayer {
    name: String,
    online: bool,
}

impl PlayerHandle for ConsolePlayer {
    fn display_name(&self) -> &str {
        &self.name
    }
    fn kick(&mut self, reason: &str) {
        self.online = false;
        info!(player = %self.name, reason, "KICK");
    }
    fn send_message(&mut self, text: &str) {
        info!(player = %self.name, text, "CHAT");
    }
    fn set_game_mode(&mut self, mode: GameMode) {
        info!(player = %self.name, ?mode, "GAMEMODE");
    }
    fn hide_inventory(&mut self) -> bool {
        info!(player = %self.name, "INVENTORY hidden");
        true
    }
    fn restore_inventory(&mut self) {
        info!(player = %self.name, "INVENTORY restored");
    }
    fn update_inventory(&mut self) {}
    fn set_no_damage_ticks(&mut self, ticks: u32) {
        info!(player = %self.name, ticks, "NO-DAMAGE");
    }
    fn add_blindness(&mut self, duration_ticks: u32, amplifier: u8) {
        info!(player = %self.name, duration_ticks, amplifier, "BLINDNESS on");
    }
    fn remove_blindness(&mut self) {
        info!(player = %self.name, "BLINDNESS off");
    }
    fn perform_command(&mut self, command: &str) {
        info!(player = %self.name, command, "COMMAND");
    }
}

#[derive(Default)]
struct ConsoleWorld {
    players: HashMap<PlayerName, ConsolePlayer>,
}

impl ConsoleWorld {
    fn spawn(&mut self, name: &str) {
        self.players.insert(
            PlayerName::new(name),
            ConsolePlayer {
                name: name.to_string(),
                online: true,
            },
        );
    }
}

impl World for ConsoleWorld {
    type Player = ConsolePlayer;

    fn player_mut(&mut self, name: &PlayerName) -> Option<&mut ConsolePlayer> {
        self.players.get_mut(name).filter(|p| p.online)
    }

    fn ban_ip(&mut self, ip: &str) {
        info!(ip, "BAN");
    }
}

// ---------------------------------------------------------------------------
// Collaborators
// ---------------------------------------------------------------------------

/// Everyone gets the default group and no capabilities.
struct OpenPermissions;

impl PermissionService for OpenPermissions {
    async fn has_capability(&self, _identity: &Identity, _capability: Capability) -> bool {
        false
    }

    async fn set_group(&self, identity: &Identity, group: AuthGroup) {
        info!(player = %identity, %group, "GROUP");
    }
}

struct SimLogin {
    store: Arc<MemoryAuthStore>,
    sessions: Arc<SessionManager>,
}

impl LoginFlow for SimLogin {
    async fn force_login(&self, identity: &Identity) -> Result<(), StoreError> {
        self.store
            .mark_logged_in(identity.name(), identity.ip())
            .await;
        self.sessions.add_session(identity.name()).await;
        info!(player = %identity, "LOGIN (session)");
        Ok(())
    }
}

struct Sim;

impl GateBackend for Sim {
    type World = ConsoleWorld;
    type Commands = JoinCommands;
    type Store = MemoryAuthStore;
    type Sessions = SessionManager;
    type Cache = PlayerCache;
    type Permissions = OpenPermissions;
    type Login = SimLogin;
    type Roster = OnlineTracker;
}

// ---------------------------------------------------------------------------
// Simulation
// ---------------------------------------------------------------------------

async fn connect(
    gate: &AuthGate<Sim>,
    roster: &OnlineTracker,
    name: &str,
    ip: &str,
) -> Result<(), GateError> {
    let identity = Identity::new(name, ip, None)?;
    let spawn_name = name.to_string();
    gate.with_realm(move |realm: &mut RealmOf<Sim>| realm.world_mut().spawn(&spawn_name))
        .await?;
    roster.connect(identity.name(), ip);

    match gate.on_connect(identity).await {
        Ok(result) => {
            let outcome = result?;
            info!(player = name, ip, ?outcome, "JOIN");
        }
        Err(e) => tracing::error!(player = name, error = %e, "join task panicked"),
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), GateError> {
    authgate::init_logging("info,authgate=debug");

    let settings = match std::env::args().nth(1) {
        Some(path) => Settings::load(path)?,
        None => Settings::from_toml_str(DEMO_SETTINGS)?,
    };

    let store = Arc::new(MemoryAuthStore::new());
    let sessions = Arc::new(SessionManager::new(SessionConfig::default()));
    let roster = Arc::new(OnlineTracker::new());

    // One returning player with a live session, one who must log in.
    store
        .insert(AuthRecord::registered(PlayerName::new("steve")).with_last_ip("10.0.0.7"))
        .await;
    sessions.add_session(&PlayerName::new("steve")).await;
    store
        .insert(AuthRecord::registered(PlayerName::new("alex")).with_last_ip("10.0.0.8"))
        .await;

    let collaborators = Collaborators::<Sim> {
        store: Arc::clone(&store),
        sessions: Arc::clone(&sessions),
        cache: Arc::new(PlayerCache::new()),
        permissions: Arc::new(OpenPermissions),
        login: Arc::new(SimLogin {
            store: Arc::clone(&store),
            sessions: Arc::clone(&sessions),
        }),
        roster: Arc::clone(&roster),
    };
    let commands = settings.join_commands();
    let gate = AuthGateBuilder::new()
        .settings(settings)
        .build::<Sim>(ConsoleWorld::default(), commands, collaborators)?;

    connect(&gate, &roster, "Bob", "1.2.3.4").await?;
    connect(&gate, &roster, "Admin", "6.6.6.6").await?;
    connect(&gate, &roster, "Steve", "10.0.0.7").await?;
    connect(&gate, &roster, "Alex", "10.0.0.9").await?;
    connect(&gate, &roster, "Alt1", "1.2.3.4").await?;
    connect(&gate, &roster, "Alt2", "1.2.3.4").await?;

    // Alex logs in; Bob never registers and times out.
    let released = gate.release(PlayerName::new("alex")).await?;
    info!(player = %released.name, "LOGIN (password)");

    tokio::time::sleep(Duration::from_millis(2_500)).await;

    let realm = gate.shutdown().await?;
    info!(
        waiting = realm.limbo().registry().len(),
        tick = realm.tick(),
        "simulation finished"
    );
    Ok(())
}
