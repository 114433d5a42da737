//! End-to-end tests: joins through a real `AuthGate` with a real main
//! thread and in-memory collaborators.
//!
//! The main thread uses an event-driven clock so no ticks fire during a
//! test. Player effects are read back from the realm after `shutdown`,
//! which runs every protected task queued before it.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use authgate::prelude::*;
use authgate::{DenyReason, GateError, RealmOf};
use authgate_limbo::LimboError;

// =========================================================================
// Fake host
// =========================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
enum Call {
    Kick(String),
    Message(String),
    GameMode(GameMode),
    HideInventory,
    RestoreInventory,
    UpdateInventory,
    NoDamage(u32),
    Blind(u32, u8),
    Unblind,
    Command(String),
}

struct FakePlayer {
    name: String,
    calls: Vec<Call>,
}

impl FakePlayer {
    fn kicks(&self) -> Vec<&str> {
        self.calls
            .iter()
            .filter_map(|c| match c {
                Call::Kick(reason) => Some(reason.as_str()),
                _ => None,
            })
            .collect()
    }
}

impl PlayerHandle for FakePlayer {
    fn display_name(&self) -> &str {
        &self.name
    }
    fn kick(&mut self, reason: &str) {
        self.calls.push(Call::Kick(reason.to_string()));
    }
    fn send_message(&mut self, text: &str) {
        self.calls.push(Call::Message(text.to_string()));
    }
    fn set_game_mode(&mut self, mode: GameMode) {
        self.calls.push(Call::GameMode(mode));
    }
    fn hide_inventory(&mut self) -> bool {
        self.calls.push(Call::HideInventory);
        true
    }
    fn restore_inventory(&mut self) {
        self.calls.push(Call::RestoreInventory);
    }
    fn update_inventory(&mut self) {
        self.calls.push(Call::UpdateInventory);
    }
    fn set_no_damage_ticks(&mut self, ticks: u32) {
        self.calls.push(Call::NoDamage(ticks));
    }
    fn add_blindness(&mut self, duration_ticks: u32, amplifier: u8) {
        self.calls.push(Call::Blind(duration_ticks, amplifier));
    }
    fn remove_blindness(&mut self) {
        self.calls.push(Call::Unblind);
    }
    fn perform_command(&mut self, command: &str) {
        self.calls.push(Call::Command(command.to_string()));
    }
}

#[derive(Default)]
struct FakeWorld {
    players: HashMap<PlayerName, FakePlayer>,
    bans: Vec<String>,
}

impl FakeWorld {
    fn with_players(names: &[&str]) -> Self {
        let mut world = Self::default();
        for n in names {
            world.players.insert(
                PlayerName::new(n),
                FakePlayer {
                    name: n.to_string(),
                    calls: Vec::new(),
                },
            );
        }
        world
    }
}

impl World for FakeWorld {
    type Player = FakePlayer;

    fn player_mut(&mut self, name: &PlayerName) -> Option<&mut FakePlayer> {
        self.players.get_mut(name)
    }

    fn ban_ip(&mut self, ip: &str) {
        self.bans.push(ip.to_string());
    }
}

// =========================================================================
// Fake collaborators
// =========================================================================

/// A memory store that can be switched off, entirely or for everything
/// but the account lookup.
#[derive(Default)]
struct SwitchableStore {
    inner: MemoryAuthStore,
    down: AtomicBool,
    sessions_down: AtomicBool,
}

impl SwitchableStore {
    fn check(&self) -> Result<(), StoreError> {
        if self.down.load(Ordering::SeqCst) {
            Err(StoreError::Unavailable("connection refused".into()))
        } else {
            Ok(())
        }
    }

    fn check_session(&self) -> Result<(), StoreError> {
        self.check()?;
        if self.sessions_down.load(Ordering::SeqCst) {
            Err(StoreError::Unavailable("session table locked".into()))
        } else {
            Ok(())
        }
    }
}

impl AuthStore for SwitchableStore {
    async fn has_record(&self, name: &PlayerName) -> Result<bool, StoreError> {
        self.check()?;
        self.inner.has_record(name).await
    }

    async fn is_logged_in(&self, name: &PlayerName) -> Result<bool, StoreError> {
        self.check_session()?;
        self.inner.is_logged_in(name).await
    }

    async fn get_record(&self, name: &PlayerName) -> Result<Option<AuthRecord>, StoreError> {
        self.check_session()?;
        self.inner.get_record(name).await
    }

    async fn clear_logged_in(&self, name: &PlayerName) -> Result<(), StoreError> {
        self.check_session()?;
        self.inner.clear_logged_in(name).await
    }
}

#[derive(Default)]
struct FakePermissions {
    granted: HashSet<Capability>,
    groups: Mutex<Vec<(PlayerName, AuthGroup)>>,
}

impl FakePermissions {
    fn groups(&self) -> Vec<(PlayerName, AuthGroup)> {
        self.groups.lock().unwrap().clone()
    }
}

impl PermissionService for FakePermissions {
    async fn has_capability(&self, _identity: &Identity, capability: Capability) -> bool {
        self.granted.contains(&capability)
    }

    async fn set_group(&self, identity: &Identity, group: AuthGroup) {
        self.groups
            .lock()
            .unwrap()
            .push((identity.name().clone(), group));
    }
}

/// Logs players back in the way a real login flow would: re-marks the
/// store and re-creates the session.
struct FakeLogin {
    store: Arc<SwitchableStore>,
    sessions: Arc<SessionManager>,
    forced: Mutex<Vec<PlayerName>>,
}

impl LoginFlow for FakeLogin {
    async fn force_login(&self, identity: &Identity) -> Result<(), StoreError> {
        self.store
            .inner
            .mark_logged_in(identity.name(), identity.ip())
            .await;
        self.sessions.add_session(identity.name()).await;
        self.forced.lock().unwrap().push(identity.name().clone());
        Ok(())
    }
}

struct TestServer;

impl GateBackend for TestServer {
    type World = FakeWorld;
    type Commands = JoinCommands;
    type Store = SwitchableStore;
    type Sessions = SessionManager;
    type Cache = PlayerCache;
    type Permissions = FakePermissions;
    type Login = FakeLogin;
    type Roster = OnlineTracker;
}

// =========================================================================
// Harness
// =========================================================================

struct Harness {
    gate: AuthGate<TestServer>,
    store: Arc<SwitchableStore>,
    sessions: Arc<SessionManager>,
    permissions: Arc<FakePermissions>,
    login: Arc<FakeLogin>,
    roster: Arc<OnlineTracker>,
}

impl Harness {
    /// Starts a gate. Every name in `online` gets a player object.
    fn start(settings: Settings, online: &[&str], permissions: FakePermissions) -> Self {
        let store = Arc::new(SwitchableStore::default());
        let sessions = Arc::new(SessionManager::new(SessionConfig::default()));
        let permissions = Arc::new(permissions);
        let login = Arc::new(FakeLogin {
            store: Arc::clone(&store),
            sessions: Arc::clone(&sessions),
            forced: Mutex::new(Vec::new()),
        });
        let roster = Arc::new(OnlineTracker::new());

        let collaborators = Collaborators::<TestServer> {
            store: Arc::clone(&store),
            sessions: Arc::clone(&sessions),
            cache: Arc::new(PlayerCache::new()),
            permissions: Arc::clone(&permissions),
            login: Arc::clone(&login),
            roster: Arc::clone(&roster),
        };
        let commands = settings.join_commands();
        let gate = AuthGateBuilder::new()
            .settings(settings)
            .main_thread(MainThreadConfig {
                thread_name: "test-main".to_string(),
                clock: ClockConfig::event_driven(),
            })
            .build::<TestServer>(FakeWorld::with_players(online), commands, collaborators)
            .expect("gate should start");

        Self {
            gate,
            store,
            sessions,
            permissions,
            login,
            roster,
        }
    }

    /// Marks the player online and runs the pipeline for them.
    async fn join(&self, name: &str, ip: &str) -> Result<JoinOutcome, GateError> {
        let identity = Identity::new(name, ip, None).unwrap();
        self.roster.connect(identity.name(), ip);
        self.gate.join(&identity).await
    }

    async fn finish(self) -> RealmOf<TestServer> {
        self.gate.shutdown().await.expect("shutdown")
    }
}

fn calls<'a>(realm: &'a RealmOf<TestServer>, name: &str) -> &'a [Call] {
    &realm.world().players[&PlayerName::new(name)].calls
}

fn kicks<'a>(realm: &'a RealmOf<TestServer>, name: &str) -> Vec<&'a str> {
    realm.world().players[&PlayerName::new(name)].kicks()
}

// =========================================================================
// The common case
// =========================================================================

#[tokio::test]
async fn test_join_new_player_goes_to_limbo_as_unregistered() {
    let h = Harness::start(Settings::default(), &["bob"], FakePermissions::default());

    let outcome = h.join("bob", "1.2.3.4").await.unwrap();

    assert_eq!(outcome, JoinOutcome::Limbo(LimboKind::PendingRegistration));
    assert_eq!(
        h.permissions.groups(),
        vec![(PlayerName::new("bob"), AuthGroup::Unregistered)]
    );

    let realm = h.finish().await;
    let limbo = realm
        .limbo()
        .registry()
        .get(&PlayerName::new("bob"))
        .expect("bob should be in limbo");
    assert_eq!(limbo.damage_immunity_ticks, 30 * 20);
    assert!(!limbo.inventory_hidden);
    assert!(calls(&realm, "bob").contains(&Call::NoDamage(600)));
    assert!(kicks(&realm, "bob").is_empty());
}

#[tokio::test]
async fn test_join_registered_player_hides_inventory_and_runs_commands() {
    let mut settings = Settings::default();
    settings.commands.on_join = vec!["/say %p joined".into()];
    let h = Harness::start(settings, &["Alice"], FakePermissions::default());
    h.store
        .inner
        .insert(AuthRecord::registered(PlayerName::new("alice")))
        .await;

    let outcome = h.join("Alice", "1.2.3.4").await.unwrap();

    assert_eq!(outcome, JoinOutcome::Limbo(LimboKind::PendingLogin));
    assert_eq!(
        h.permissions.groups(),
        vec![(PlayerName::new("alice"), AuthGroup::RegisteredUnauthenticated)]
    );
    let realm = h.finish().await;
    assert_eq!(
        calls(&realm, "alice"),
        &[
            Call::HideInventory,
            Call::NoDamage(600),
            Call::Command("say Alice joined".into()),
        ]
    );
}

#[tokio::test]
async fn test_join_optional_registration_admits_guest_without_limbo() {
    let mut settings = Settings::default();
    settings.registration.force = false;
    let h = Harness::start(settings, &["bob"], FakePermissions::default());

    let outcome = h.join("bob", "1.2.3.4").await.unwrap();

    assert_eq!(outcome, JoinOutcome::Unregistered);
    assert_eq!(h.permissions.groups()[0].1, AuthGroup::Unregistered);
    let realm = h.finish().await;
    assert!(realm.limbo().registry().is_empty());
    assert!(calls(&realm, "bob").is_empty());
}

#[tokio::test]
async fn test_join_unrestricted_name_skips_everything() {
    let mut settings = Settings::default();
    settings.restrictions.unrestricted_names = vec!["Shopkeeper".into()];
    settings.restrictions.force_survival_mode = true;
    let h = Harness::start(settings, &["shopkeeper"], FakePermissions::default());

    let outcome = h.join("SHOPKEEPER", "1.2.3.4").await.unwrap();

    assert_eq!(outcome, JoinOutcome::Unrestricted);
    assert!(h.permissions.groups().is_empty());
    let realm = h.finish().await;
    assert!(calls(&realm, "shopkeeper").is_empty());
}

#[tokio::test]
async fn test_join_force_survival_respects_bypass() {
    let mut settings = Settings::default();
    settings.restrictions.force_survival_mode = true;

    let h = Harness::start(settings.clone(), &["bob"], FakePermissions::default());
    h.join("bob", "1.2.3.4").await.unwrap();
    let realm = h.finish().await;
    assert_eq!(calls(&realm, "bob")[0], Call::GameMode(GameMode::Survival));

    let bypass = FakePermissions {
        granted: HashSet::from([Capability::BypassForceSurvival]),
        ..FakePermissions::default()
    };
    let h = Harness::start(settings, &["bob"], bypass);
    h.join("bob", "1.2.3.4").await.unwrap();
    let realm = h.finish().await;
    assert!(!calls(&realm, "bob").contains(&Call::GameMode(GameMode::Survival)));
}

// =========================================================================
// Admission checks
// =========================================================================

fn restricted_settings(ban: bool) -> Settings {
    let mut settings = Settings::default();
    settings.restrictions.enable_restricted_users = true;
    settings.restrictions.allowed_restricted_users = vec!["admin;10.0.0.1".into()];
    settings.restrictions.ban_unknown_ip = ban;
    settings
}

#[tokio::test]
async fn test_join_restricted_name_from_other_ip_is_kicked_and_banned() {
    let h = Harness::start(restricted_settings(true), &["admin"], FakePermissions::default());

    let outcome = h.join("Admin", "6.6.6.6").await.unwrap();

    assert_eq!(outcome, JoinOutcome::Denied(DenyReason::Restricted));
    assert!(h.permissions.groups().is_empty(), "no state before admission");
    let realm = h.finish().await;
    assert_eq!(kicks(&realm, "admin"), vec![MessageKey::NotOwnerError.text()]);
    assert_eq!(realm.world().bans, vec!["6.6.6.6"]);
    assert!(realm.limbo().registry().is_empty());
}

#[tokio::test]
async fn test_join_restricted_name_from_listed_ip_is_allowed() {
    let h = Harness::start(restricted_settings(true), &["admin"], FakePermissions::default());

    let outcome = h.join("admin", "10.0.0.1").await.unwrap();

    assert!(matches!(outcome, JoinOutcome::Limbo(_)));
    let realm = h.finish().await;
    assert!(kicks(&realm, "admin").is_empty());
    assert!(realm.world().bans.is_empty());
}

#[tokio::test]
async fn test_join_restricted_without_ban_only_kicks() {
    let h = Harness::start(restricted_settings(false), &["admin"], FakePermissions::default());

    h.join("admin", "6.6.6.6").await.unwrap();

    let realm = h.finish().await;
    assert_eq!(kicks(&realm, "admin").len(), 1);
    assert!(realm.world().bans.is_empty());
}

fn capped_settings(max: i64) -> Settings {
    let mut settings = Settings::default();
    settings.restrictions.max_join_per_ip = max;
    settings
}

#[tokio::test]
async fn test_join_third_player_from_same_ip_is_kicked() {
    let h = Harness::start(capped_settings(2), &["a", "b", "c", "d"], FakePermissions::default());

    assert!(matches!(h.join("a", "9.9.9.9").await.unwrap(), JoinOutcome::Limbo(_)));
    assert!(matches!(h.join("b", "9.9.9.9").await.unwrap(), JoinOutcome::Limbo(_)));
    let third = h.join("c", "9.9.9.9").await.unwrap();
    let fourth = h.join("d", "8.8.8.8").await.unwrap();

    assert_eq!(third, JoinOutcome::Denied(DenyReason::TooManyFromIp));
    assert!(matches!(fourth, JoinOutcome::Limbo(_)));
    let realm = h.finish().await;
    assert_eq!(kicks(&realm, "c"), vec![MessageKey::SameIpOnline.text()]);
    assert!(!realm.limbo().registry().contains(&PlayerName::new("c")));
    assert!(kicks(&realm, "d").is_empty());
}

#[tokio::test]
async fn test_join_ip_cap_bypass_capability_is_exempt() {
    let multi = FakePermissions {
        granted: HashSet::from([Capability::AllowMultipleAccounts]),
        ..FakePermissions::default()
    };
    let h = Harness::start(capped_settings(1), &["a", "b"], multi);

    h.join("a", "9.9.9.9").await.unwrap();
    let second = h.join("b", "9.9.9.9").await.unwrap();

    assert!(matches!(second, JoinOutcome::Limbo(_)));
    h.finish().await;
}

#[tokio::test]
async fn test_join_ip_cap_loopback_is_exempt() {
    let h = Harness::start(capped_settings(1), &["a", "b"], FakePermissions::default());

    h.join("a", "127.0.0.1").await.unwrap();
    let second = h.join("b", "127.0.0.1").await.unwrap();

    assert!(matches!(second, JoinOutcome::Limbo(_)));
    let realm = h.finish().await;
    assert!(kicks(&realm, "b").is_empty());
}

// =========================================================================
// Sessions
// =========================================================================

#[tokio::test]
async fn test_join_live_session_same_ip_is_restored() {
    let h = Harness::start(Settings::default(), &["bob"], FakePermissions::default());
    let bob = PlayerName::new("bob");
    h.store
        .inner
        .insert(AuthRecord::registered(bob.clone()).with_last_ip("1.2.3.4"))
        .await;
    h.sessions.add_session(&bob).await;

    let outcome = h.join("bob", "1.2.3.4").await.unwrap();

    assert_eq!(outcome, JoinOutcome::SessionRestored);
    assert_eq!(*h.login.forced.lock().unwrap(), vec![bob.clone()]);
    assert_eq!(
        h.permissions.groups(),
        vec![(bob.clone(), AuthGroup::RegisteredUnauthenticated)]
    );
    // The login flow re-marked the store after the reconciler cleared it.
    assert!(h.store.is_logged_in(&bob).await.unwrap());

    let realm = h.finish().await;
    assert!(realm.limbo().registry().is_empty());
    assert_eq!(
        calls(&realm, "bob"),
        &[Call::Message(MessageKey::SessionReconnection.text().into())]
    );
}

#[tokio::test]
async fn test_join_session_from_other_ip_is_discarded() {
    let h = Harness::start(Settings::default(), &["bob"], FakePermissions::default());
    let bob = PlayerName::new("bob");
    h.store
        .inner
        .insert(
            AuthRecord::registered(bob.clone())
                .with_last_ip("1.2.3.4")
                .logged_in(),
        )
        .await;

    let outcome = h.join("bob", "5.6.7.8").await.unwrap();

    assert_eq!(outcome, JoinOutcome::Limbo(LimboKind::PendingLogin));
    assert!(h.login.forced.lock().unwrap().is_empty());
    assert!(!h.store.is_logged_in(&bob).await.unwrap());

    let realm = h.finish().await;
    let calls = calls(&realm, "bob");
    assert_eq!(calls[0], Call::Message(MessageKey::SessionExpired.text().into()));
    assert!(calls.contains(&Call::HideInventory));
    assert!(realm.limbo().registry().contains(&bob));
}

// =========================================================================
// Failures and lifecycle
// =========================================================================

#[tokio::test]
async fn test_join_store_down_kicks_and_returns_error() {
    let h = Harness::start(Settings::default(), &["bob"], FakePermissions::default());
    h.store.down.store(true, Ordering::SeqCst);

    let result = h.join("bob", "1.2.3.4").await;

    assert!(matches!(result, Err(GateError::Store(StoreError::Unavailable(_)))));
    assert!(h.permissions.groups().is_empty());
    let realm = h.finish().await;
    assert_eq!(kicks(&realm, "bob"), vec![MessageKey::JoinFailed.text()]);
    assert!(realm.limbo().registry().is_empty());
}

#[tokio::test]
async fn test_join_session_lookup_failure_still_assigns_group() {
    let h = Harness::start(Settings::default(), &["bob"], FakePermissions::default());
    let bob = PlayerName::new("bob");
    h.store.inner.insert(AuthRecord::registered(bob.clone())).await;
    h.store.sessions_down.store(true, Ordering::SeqCst);

    let result = h.join("bob", "1.2.3.4").await;

    assert!(matches!(result, Err(GateError::Store(StoreError::Unavailable(_)))));
    assert_eq!(
        h.permissions.groups(),
        vec![(bob, AuthGroup::RegisteredUnauthenticated)]
    );
    let realm = h.finish().await;
    assert_eq!(kicks(&realm, "bob"), vec![MessageKey::JoinFailed.text()]);
}

#[tokio::test]
async fn test_join_after_shutdown_is_scheduler_error() {
    let h = Harness::start(Settings::default(), &["bob"], FakePermissions::default());
    let gate = h.gate.clone();
    h.finish().await;

    let identity = Identity::new("bob", "1.2.3.4", None).unwrap();
    let result = gate.join(&identity).await;

    assert!(matches!(result, Err(GateError::Scheduler(_))));
}

#[tokio::test]
async fn test_join_twice_keeps_single_limbo_entry() {
    let h = Harness::start(Settings::default(), &["bob"], FakePermissions::default());

    let first = h.join("bob", "1.2.3.4").await.unwrap();
    let second = h.join("bob", "1.2.3.4").await;

    assert_eq!(first, JoinOutcome::Limbo(LimboKind::PendingRegistration));
    assert!(matches!(
        second,
        Err(GateError::Limbo(LimboError::AlreadyInLimbo(ref name))) if *name == PlayerName::new("bob")
    ));
    let realm = h.finish().await;
    assert_eq!(realm.limbo().registry().len(), 1);
    let no_damage = calls(&realm, "bob")
        .iter()
        .filter(|c| matches!(c, Call::NoDamage(_)))
        .count();
    assert_eq!(no_damage, 1, "second admission must not touch the player");
    assert!(kicks(&realm, "bob").is_empty(), "the limbo entry keeps holding bob");
}

#[tokio::test]
async fn test_join_player_gone_before_admission_returns_left() {
    let h = Harness::start(Settings::default(), &[], FakePermissions::default());

    let outcome = h.join("ghost", "1.2.3.4").await.unwrap();

    assert_eq!(outcome, JoinOutcome::Left);
    let realm = h.finish().await;
    assert!(realm.limbo().registry().is_empty());
}

#[tokio::test]
async fn test_on_connect_runs_pipeline_as_admission_work() {
    let h = Harness::start(Settings::default(), &["bob"], FakePermissions::default());
    let identity = Identity::new("bob", "1.2.3.4", None).unwrap();
    h.roster.connect(identity.name(), identity.ip());

    let outcome = h.gate.on_connect(identity).await.expect("task should not panic");

    assert_eq!(outcome.unwrap(), JoinOutcome::Limbo(LimboKind::PendingRegistration));
    h.finish().await;
}

#[tokio::test]
async fn test_release_takes_player_out_of_limbo() {
    let mut settings = Settings::default();
    settings.registration.apply_blind_effect = true;
    let h = Harness::start(settings, &["bob"], FakePermissions::default());
    h.store
        .inner
        .insert(AuthRecord::registered(PlayerName::new("bob")))
        .await;
    h.join("bob", "1.2.3.4").await.unwrap();

    let released = h.gate.release(PlayerName::new("bob")).await.unwrap();
    let again = h.gate.release(PlayerName::new("bob")).await;

    assert_eq!(released.kind, LimboKind::PendingLogin);
    assert!(matches!(again, Err(GateError::Limbo(LimboError::NotInLimbo(_)))));
    let realm = h.finish().await;
    let calls = calls(&realm, "bob");
    assert!(calls.ends_with(&[Call::Unblind, Call::RestoreInventory, Call::NoDamage(0)]));
}

#[tokio::test]
async fn test_on_quit_forgets_limbo_entry() {
    let h = Harness::start(Settings::default(), &["bob"], FakePermissions::default());
    h.join("bob", "1.2.3.4").await.unwrap();

    h.gate.on_quit(PlayerName::new("bob")).unwrap();

    let in_limbo = h
        .gate
        .with_realm(|realm| realm.limbo().registry().contains(&PlayerName::new("bob")))
        .await
        .unwrap();
    assert!(!in_limbo);
    h.finish().await;
}
