//! The join pipeline: one run per connection event.
//!
//! ```text
//!   unrestricted name? ──yes──→ Unrestricted
//!         │
//!   force survival                       (protected)
//!         │
//!   restriction list ──denied──→ kick + optional ban   (protected)
//!         │
//!   per-address cap ──over──→ kick                     (protected)
//!         │
//!   account lookup, set group
//!         │
//!   reconcile session
//!   fast path? ──yes──→ notice (protected), force_login → SessionRestored
//!         │
//!   stale? → notice (protected)
//!         │
//!   guest allowed? ──yes──→ Unregistered
//!         │
//!   limbo admission                       (protected, awaited)
//!         ├── admitted ──→ Limbo
//!         └── player gone ──→ Left
//! ```
//!
//! Decisions run on the admission pool. Everything that touches the
//! player goes through [`Scheduler::run_protected`], in pipeline order.
//! Admission checks finish before any session or limbo state changes, and
//! a kick is always the last thing the pipeline does for a join.

use std::sync::Arc;

use tokio::sync::oneshot;
use tracing::{debug, info, warn};

use authgate_limbo::{LimboError, LimboKind};
use authgate_scheduler::{Scheduler, SchedulerError};
use authgate_session::SessionState;
use authgate_types::{AuthGroup, Capability, GameMode, Identity, MessageKey, PlayerName};

use crate::limiter::{self, AdmissionVerdict};
use crate::restriction::{self, RestrictionVerdict};
use crate::{GateBackend, GateContext, GateError, LoginFlow, OnlineRoster, PermissionService, RealmOf};

/// Why a join was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DenyReason {
    /// The name is restricted to other addresses.
    Restricted,
    /// Too many players online from the address.
    TooManyFromIp,
}

/// What the pipeline decided for one join.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinOutcome {
    /// The name is configured to skip the gate.
    Unrestricted,
    /// The player was kicked.
    Denied(DenyReason),
    /// A live session was restored and the player handed to the login
    /// flow.
    SessionRestored,
    /// No account and registration is optional: the player plays as a
    /// guest.
    Unregistered,
    /// The player was sent to limbo to log in or register.
    Limbo(LimboKind),
    /// The player disconnected before the limbo entry could be created.
    Left,
}

/// Runs the join pipeline against a shared [`GateContext`].
pub struct JoinProcess<B: GateBackend, S> {
    context: Arc<GateContext<B>>,
    scheduler: S,
}

impl<B, S> JoinProcess<B, S>
where
    B: GateBackend,
    S: Scheduler<RealmOf<B>>,
{
    pub fn new(context: Arc<GateContext<B>>, scheduler: S) -> Self {
        Self { context, scheduler }
    }

    /// Runs the pipeline for `identity`.
    ///
    /// # Errors
    /// Store and scheduler failures, and [`LimboError::AlreadyInLimbo`]
    /// for a second join of a player still in limbo. Except for the
    /// latter, the player is kicked with [`MessageKey::JoinFailed`] before
    /// the error is returned: a join that cannot be decided is refused.
    pub async fn run(&self, identity: &Identity) -> Result<JoinOutcome, GateError> {
        let result = self.process(identity).await;
        match &result {
            Ok(outcome) => {
                debug!(player = %identity, ?outcome, "join processed");
            }
            Err(GateError::Limbo(error @ LimboError::AlreadyInLimbo(_))) => {
                // The existing entry still holds the player.
                warn!(player = %identity, %error, "join ignored");
            }
            Err(error) => {
                warn!(player = %identity, %error, "join failed, refusing player");
                let name = identity.name().clone();
                if let Err(e) = self.scheduler.run_protected(move |realm: &mut RealmOf<B>| {
                    realm.kick(&name, MessageKey::JoinFailed);
                }) {
                    warn!(player = %identity, error = %e, "could not kick after failed join");
                }
            }
        }
        result
    }

    async fn process(&self, identity: &Identity) -> Result<JoinOutcome, GateError> {
        let ctx = &*self.context;
        let settings = &ctx.settings.restrictions;
        let name = identity.name();

        if ctx.settings.is_unrestricted(name) {
            info!(%name, "unrestricted name, skipping gate");
            return Ok(JoinOutcome::Unrestricted);
        }

        if settings.force_survival_mode
            && !ctx
                .permissions
                .has_capability(identity, Capability::BypassForceSurvival)
                .await
        {
            let name = name.clone();
            self.scheduler.run_protected(move |realm: &mut RealmOf<B>| {
                realm.set_game_mode(&name, GameMode::Survival);
            })?;
        }

        if let Some(reason) = self.admission_check(identity).await? {
            return Ok(JoinOutcome::Denied(reason));
        }

        let registered = ctx.reconciler.has_record(name).await?;
        let group = if registered {
            AuthGroup::RegisteredUnauthenticated
        } else {
            AuthGroup::Unregistered
        };
        ctx.permissions.set_group(identity, group).await;

        let state = if registered {
            ctx.reconciler.reconcile_registered(identity).await?
        } else {
            SessionState::NoPriorAuth
        };

        match state {
            SessionState::FastPathRestored(_) => {
                self.notify(name, MessageKey::SessionReconnection)?;
                ctx.login.force_login(identity).await?;
                info!(%name, ip = identity.ip(), "session restored");
                return Ok(JoinOutcome::SessionRestored);
            }
            SessionState::StaleSession { notify: true } => {
                self.notify(name, MessageKey::SessionExpired)?;
            }
            SessionState::StaleSession { notify: false }
            | SessionState::Registered
            | SessionState::NoPriorAuth => {}
        }

        if !registered && !ctx.settings.registration.force {
            info!(%name, "unregistered guest admitted");
            return Ok(JoinOutcome::Unregistered);
        }

        let hide_inventory = registered && settings.protect_inventory_before_login;
        let limbo_name = name.clone();
        let (reply_tx, reply_rx) = oneshot::channel();
        self.scheduler.run_protected(move |realm: &mut RealmOf<B>| {
            let _ = reply_tx.send(realm.admit_to_limbo(limbo_name, registered, hide_inventory));
        })?;
        let admitted = reply_rx
            .await
            .map_err(|_| SchedulerError::MainThreadGone)??;

        if !admitted {
            debug!(%name, "left before limbo admission");
            return Ok(JoinOutcome::Left);
        }
        let kind = LimboKind::for_registered(registered);
        info!(%name, %kind, "sent to limbo");
        Ok(JoinOutcome::Limbo(kind))
    }

    /// Restriction list, then per-address cap. On refusal the kick (and
    /// ban) is scheduled and the reason returned.
    async fn admission_check(&self, identity: &Identity) -> Result<Option<DenyReason>, GateError> {
        let ctx = &*self.context;
        let settings = &ctx.settings.restrictions;
        let name = identity.name();
        let ip = identity.ip();

        let verdict = restriction::evaluate(
            name,
            ip,
            identity.hostname(),
            &ctx.restrictions,
            settings.enable_restricted_users,
        );
        if verdict == RestrictionVerdict::Denied {
            let ban = settings.ban_unknown_ip;
            info!(%name, ip, ban, "restricted name from unlisted address");
            let (kick_name, ban_ip) = (name.clone(), ip.to_string());
            self.scheduler.run_protected(move |realm: &mut RealmOf<B>| {
                realm.kick(&kick_name, MessageKey::NotOwnerError);
                if ban {
                    realm.ban_ip(&ban_ip);
                }
            })?;
            return Ok(Some(DenyReason::Restricted));
        }

        let max = settings.max_join_per_ip;
        let online = ctx.roster.count_by_ip(ip);
        let bypass = max > 0
            && !limiter::is_loopback(ip)
            && ctx
                .permissions
                .has_capability(identity, Capability::AllowMultipleAccounts)
                .await;
        if let AdmissionVerdict::TooManyFromIp { online, max } = limiter::check(ip, online, max, bypass) {
            info!(%name, ip, online, max, "too many players from address");
            let kick_name = name.clone();
            self.scheduler.run_protected(move |realm: &mut RealmOf<B>| {
                realm.kick(&kick_name, MessageKey::SameIpOnline);
            })?;
            return Ok(Some(DenyReason::TooManyFromIp));
        }

        Ok(None)
    }

    fn notify(&self, name: &PlayerName, message: MessageKey) -> Result<(), GateError> {
        let name = name.clone();
        self.scheduler.run_protected(move |realm: &mut RealmOf<B>| {
            realm.send(&name, message);
        })?;
        Ok(())
    }
}
