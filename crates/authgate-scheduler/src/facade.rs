//! The scheduling seam every gate component goes through.
//!
//! Work on a join falls into exactly two kinds:
//!
//! - **Protected work** mutates live server state (kick a player, ban an
//!   address, create a limbo entry). It must run on the main thread.
//! - **Admission work** only reads and decides (store lookups, counting
//!   connections). It runs on the Tokio pool so store I/O never stalls
//!   the simulation.
//!
//! [`Scheduler`] makes the choice explicit at every call site.

use std::future::Future;

use tokio::task::JoinHandle;

use crate::{MainThreadHandle, SchedulerError, Simulation};

/// The two scheduling primitives.
///
/// # Ordering
///
/// Protected tasks run in submission order. Two tasks submitted one after
/// the other by the same join pipeline therefore never swap places.
pub trait Scheduler<S>: Clone + Send + Sync + 'static {
    /// Queues `task` for the main thread.
    ///
    /// # Errors
    /// [`SchedulerError::MainThreadGone`] if the main thread has stopped.
    fn run_protected<F>(&self, task: F) -> Result<(), SchedulerError>
    where
        F: FnOnce(&mut S) + Send + 'static;

    /// Runs `work` on the admission pool.
    fn run_admission_work<F>(&self, work: F) -> JoinHandle<F::Output>
    where
        F: Future + Send + 'static,
        F::Output: Send + 'static;
}

impl<S: Simulation> Scheduler<S> for MainThreadHandle<S> {
    fn run_protected<F>(&self, task: F) -> Result<(), SchedulerError>
    where
        F: FnOnce(&mut S) + Send + 'static,
    {
        self.submit(Box::new(task))
    }

    fn run_admission_work<F>(&self, work: F) -> JoinHandle<F::Output>
    where
        F: Future + Send + 'static,
        F::Output: Send + 'static,
    {
        self.pool().spawn(work)
    }
}
