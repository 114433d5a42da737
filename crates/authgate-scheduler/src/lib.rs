//! Thread discipline for authgate.
//!
//! A game server has one authoritative thread that owns the world. Joins,
//! however, arrive concurrently and need slow store lookups. This crate
//! separates the two:
//!
//! 1. **Server clock**: [`ServerClock`] fires fixed-rate ticks (20 Hz by
//!    default) for the main thread.
//! 2. **Main thread**: [`MainThread`] owns the live state and runs queued
//!    tasks one at a time, in order.
//! 3. **Scheduler facade**: the [`Scheduler`] trait, with `run_protected` for
//!    main-thread work, `run_admission_work` for everything else.
//!
//! # Integration
//!
//! ```ignore
//! let main = MainThread::spawn(realm, MainThreadConfig::default())?;
//! main.run_admission_work(async move {
//!     let allowed = store.has_record(&name).await?;   // off-thread
//!     main.run_protected(move |realm| realm.kick(&name)); // on-thread
//! });
//! ```

mod clock;
mod error;
mod facade;
mod main_thread;

pub use clock::{ClockConfig, ServerClock, TickInfo};
pub use error::SchedulerError;
pub use facade::Scheduler;
pub use main_thread::{MainThread, MainThreadConfig, MainThreadHandle, Simulation};
