//! The server clock: fixed-rate ticks for the main thread.
//!
//! Game servers advance their simulation in ticks (20 per second is the
//! usual rate). The main thread actor drives its [`Simulation`](crate::Simulation)
//! from this clock, which is also what turns "30 seconds to log in" into a
//! concrete deadline tick.
//!
//! # Event-driven mode
//!
//! With `tick_rate_hz == 0` the clock never fires and
//! [`ServerClock::wait_for_tick`] pends forever. The main thread then only
//! reacts to queued tasks, which is what most unit tests want.

use std::time::{Duration, Instant};

use tokio::time::{self, Instant as TokioInstant};
use tracing::{debug, trace, warn};

use authgate_types::TICKS_PER_SECOND;

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// Configuration for the [`ServerClock`].
#[derive(Debug, Clone)]
pub struct ClockConfig {
    /// Ticks per second. 0 = event-driven (no ticks).
    pub tick_rate_hz: u32,
    /// Fraction of the tick budget (0.0–1.0) a single tick may use before
    /// a warning is logged.
    pub budget_warn_threshold: f64,
}

impl Default for ClockConfig {
    fn default() -> Self {
        Self {
            tick_rate_hz: TICKS_PER_SECOND,
            budget_warn_threshold: 0.80,
        }
    }
}

impl ClockConfig {
    /// Highest supported tick rate.
    pub const MAX_TICK_RATE_HZ: u32 = 100;

    /// A config for `tick_rate_hz` with default settings otherwise.
    pub fn with_rate(tick_rate_hz: u32) -> Self {
        Self {
            tick_rate_hz,
            ..Default::default()
        }
    }

    /// A config whose clock never fires.
    pub fn event_driven() -> Self {
        Self::with_rate(0)
    }

    /// Clamps out-of-range values. Called by [`ServerClock::new`].
    pub fn validated(mut self) -> Self {
        if self.tick_rate_hz > Self::MAX_TICK_RATE_HZ {
            warn!(
                rate = self.tick_rate_hz,
                max = Self::MAX_TICK_RATE_HZ,
                "tick_rate_hz exceeds maximum, clamping"
            );
            self.tick_rate_hz = Self::MAX_TICK_RATE_HZ;
        }
        self.budget_warn_threshold = self.budget_warn_threshold.clamp(0.0, 1.0);
        self
    }

    /// Length of one tick, or `None` in event-driven mode.
    pub fn tick_duration(&self) -> Option<Duration> {
        if self.tick_rate_hz == 0 {
            None
        } else {
            Some(Duration::from_secs_f64(1.0 / f64::from(self.tick_rate_hz)))
        }
    }
}

// ---------------------------------------------------------------------------
// TickInfo
// ---------------------------------------------------------------------------

/// Describes one tick, handed to `Simulation::on_tick`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TickInfo {
    /// Tick number, starting at 1 and never repeating.
    pub tick: u64,
    /// `true` if the clock woke up noticeably late for this tick.
    pub lagged: bool,
    /// Ticks dropped because of lag.
    pub ticks_skipped: u64,
}

// ---------------------------------------------------------------------------
// ServerClock
// ---------------------------------------------------------------------------

/// Fixed-rate tick source. One per main thread.
///
/// A late wakeup drops the missed ticks and schedules the next one a full
/// tick from now, so a struggling server does not fire a burst.
pub struct ServerClock {
    config: ClockConfig,
    tick_duration: Option<Duration>,
    tick_count: u64,
    next_tick: Option<TokioInstant>,
    /// Wall-clock start of the tick being processed, consumed by
    /// [`record_tick_end`](Self::record_tick_end).
    tick_start: Option<Instant>,
}

impl ServerClock {
    /// Creates a clock. The first tick is due one tick duration from now.
    pub fn new(config: ClockConfig) -> Self {
        let config = config.validated();
        let tick_duration = config.tick_duration();
        let next_tick = tick_duration.map(|d| TokioInstant::now() + d);

        match tick_duration {
            None => debug!("server clock created in event-driven mode"),
            Some(d) => debug!(
                rate_hz = config.tick_rate_hz,
                budget_ms = d.as_secs_f64() * 1000.0,
                "server clock created"
            ),
        }

        Self {
            config,
            tick_duration,
            tick_count: 0,
            next_tick,
            tick_start: None,
        }
    }

    /// Waits for the next tick.
    ///
    /// Pends forever in event-driven mode, so it is safe to use as one
    /// branch of a `tokio::select!`.
    pub async fn wait_for_tick(&mut self) -> TickInfo {
        let (next, tick_dur) = match (self.next_tick, self.tick_duration) {
            (Some(next), Some(dur)) => (next, dur),
            _ => std::future::pending().await,
        };

        time::sleep_until(next).await;

        let now = TokioInstant::now();
        self.tick_count += 1;
        self.tick_start = Some(Instant::now());

        // More than 10% late counts as lag.
        let late_by = now.saturating_duration_since(next);
        let lagged = late_by > tick_dur / 10;
        let mut ticks_skipped = 0u64;
        if lagged {
            ticks_skipped = (late_by.as_nanos() / tick_dur.as_nanos()) as u64;
            if ticks_skipped > 0 {
                warn!(
                    tick = self.tick_count,
                    skipped = ticks_skipped,
                    late_ms = late_by.as_secs_f64() * 1000.0,
                    "server is lagging, skipping ticks"
                );
            }
        }
        self.next_tick = Some(now + tick_dur);

        trace!(tick = self.tick_count, lagged, "tick");

        TickInfo {
            tick: self.tick_count,
            lagged,
            ticks_skipped,
        }
    }

    /// Marks the end of the current tick's work and warns when it ate too
    /// much of the budget. A call without a preceding tick is ignored.
    pub fn record_tick_end(&mut self) {
        let (Some(start), Some(budget)) =
            (self.tick_start.take(), self.tick_duration)
        else {
            return;
        };
        let elapsed = start.elapsed();
        let utilization = elapsed.as_secs_f64() / budget.as_secs_f64();
        if utilization >= self.config.budget_warn_threshold {
            warn!(
                tick = self.tick_count,
                elapsed_ms = elapsed.as_secs_f64() * 1000.0,
                budget_ms = budget.as_secs_f64() * 1000.0,
                "tick used most of its budget"
            );
        }
    }

    pub fn is_event_driven(&self) -> bool {
        self.tick_duration.is_none()
    }

    /// Ticks fired so far.
    pub fn tick_count(&self) -> u64 {
        self.tick_count
    }
}
