//! The main thread: a single OS thread that owns all live server state.
//!
//! Everything a player can observe (kicks, effects, limbo entries, the ban
//! list) lives in one state value `S` that is moved onto a dedicated thread
//! when [`MainThread::spawn`] runs. The only way to touch it afterwards is
//! to send that thread a task: a closure receiving `&mut S`.
//!
//! This is the actor model again. There is no lock around `S`, because only
//! one thread ever holds it, and tasks run one at a time in the order they
//! were queued.
//!
//! ```text
//!   admission workers (tokio pool)           main thread
//!   ──────────────────────────────           ───────────
//!   run_protected(task) ──── mpsc ────────→  task(&mut S)
//!   call(f).await      ←─── oneshot ───────  f(&mut S) -> R
//!                                            clock tick → S::on_tick
//! ```

use std::panic::{self, AssertUnwindSafe};
use std::thread::{self, ThreadId};

use tokio::runtime::{self, Handle};
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, error, info};

use crate::{ClockConfig, SchedulerError, ServerClock, TickInfo};

/// State owned by the main thread.
///
/// `on_tick` runs once per clock tick, between queued tasks.
pub trait Simulation: Send + 'static {
    fn on_tick(&mut self, tick: &TickInfo);
}

/// A unit of work for the main thread.
pub(crate) type Task<S> = Box<dyn FnOnce(&mut S) + Send + 'static>;

/// Commands the main thread understands.
enum MainCommand<S> {
    /// Run a task against the state.
    Run(Task<S>),
    /// Stop the loop and hand the state back.
    Shutdown { reply: oneshot::Sender<S> },
}

/// Settings for the main thread.
#[derive(Debug, Clone)]
pub struct MainThreadConfig {
    /// OS thread name, visible in debuggers and panic messages.
    pub thread_name: String,
    /// Tick source driving [`Simulation::on_tick`].
    pub clock: ClockConfig,
}

impl Default for MainThreadConfig {
    fn default() -> Self {
        Self {
            thread_name: "authgate-main".to_string(),
            clock: ClockConfig::default(),
        }
    }
}

/// Entry point for starting the main thread.
pub struct MainThread;

impl MainThread {
    /// Moves `state` onto a new main thread and returns a handle to it.
    ///
    /// Must be called from inside a Tokio runtime: that runtime becomes the
    /// pool that [`run_admission_work`](crate::Scheduler::run_admission_work)
    /// spawns onto.
    ///
    /// # Errors
    /// - [`SchedulerError::NoRuntime`] outside a Tokio runtime.
    /// - [`SchedulerError::Spawn`] if the OS refused to create the thread.
    pub fn spawn<S: Simulation>(
        state: S,
        config: MainThreadConfig,
    ) -> Result<MainThreadHandle<S>, SchedulerError> {
        let pool = Handle::try_current().map_err(|_| SchedulerError::NoRuntime)?;
        let (tx, rx) = mpsc::unbounded_channel();

        let actor = MainActor {
            state,
            clock_config: config.clock,
            receiver: rx,
        };

        let join = thread::Builder::new()
            .name(config.thread_name.clone())
            .spawn(move || actor.run_blocking())
            .map_err(SchedulerError::Spawn)?;

        info!(thread = %config.thread_name, "main thread started");

        Ok(MainThreadHandle {
            sender: tx,
            thread_id: join.thread().id(),
            pool,
        })
    }
}

/// Handle to the main thread. Cheap to clone; every clone feeds the same
/// queue.
pub struct MainThreadHandle<S> {
    sender: mpsc::UnboundedSender<MainCommand<S>>,
    thread_id: ThreadId,
    pool: Handle,
}

// Derived `Clone` would require `S: Clone`, which the state need not be.
impl<S> Clone for MainThreadHandle<S> {
    fn clone(&self) -> Self {
        Self {
            sender: self.sender.clone(),
            thread_id: self.thread_id,
            pool: self.pool.clone(),
        }
    }
}

impl<S: Simulation> MainThreadHandle<S> {
    /// Queues `task` to run on the main thread.
    ///
    /// Never runs the task inline, even when called from the main thread
    /// itself: the task goes to the back of the queue and runs after the
    /// current one returns. The queue is unbounded, so this never blocks.
    pub(crate) fn submit(&self, task: Task<S>) -> Result<(), SchedulerError> {
        self.sender
            .send(MainCommand::Run(task))
            .map_err(|_| SchedulerError::MainThreadGone)
    }

    /// Runs `f` on the main thread and waits for its result.
    ///
    /// Must not be awaited from the main thread: the reply could only be
    /// produced by the thread that is waiting for it.
    pub async fn call<R, F>(&self, f: F) -> Result<R, SchedulerError>
    where
        R: Send + 'static,
        F: FnOnce(&mut S) -> R + Send + 'static,
    {
        if self.is_main_thread() {
            return Err(SchedulerError::CalledFromMainThread);
        }
        let (reply_tx, reply_rx) = oneshot::channel();
        self.submit(Box::new(move |state: &mut S| {
            let _ = reply_tx.send(f(state));
        }))?;
        reply_rx.await.map_err(|_| SchedulerError::MainThreadGone)
    }

    /// Stops the main thread and returns its state.
    ///
    /// Tasks queued before this call still run first.
    pub async fn shutdown(&self) -> Result<S, SchedulerError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.sender
            .send(MainCommand::Shutdown { reply: reply_tx })
            .map_err(|_| SchedulerError::MainThreadGone)?;
        reply_rx.await.map_err(|_| SchedulerError::MainThreadGone)
    }

    /// `true` when called from the main thread.
    pub fn is_main_thread(&self) -> bool {
        thread::current().id() == self.thread_id
    }

    /// `true` once the main thread has stopped.
    pub fn is_closed(&self) -> bool {
        self.sender.is_closed()
    }

    pub(crate) fn pool(&self) -> &Handle {
        &self.pool
    }
}

/// The state and queue living on the main thread.
struct MainActor<S> {
    state: S,
    clock_config: ClockConfig,
    receiver: mpsc::UnboundedReceiver<MainCommand<S>>,
}

impl<S: Simulation> MainActor<S> {
    /// Thread entry point: builds a single-threaded runtime for the clock
    /// and runs the loop on it.
    fn run_blocking(self) {
        let rt = match runtime::Builder::new_current_thread().enable_time().build()
        {
            Ok(rt) => rt,
            Err(e) => {
                // Dropping `self` closes the queue, so every handle
                // reports MainThreadGone from now on.
                error!(error = %e, "failed to build main thread runtime");
                return;
            }
        };
        rt.block_on(self.run());
    }

    async fn run(mut self) {
        let mut clock = ServerClock::new(self.clock_config.clone());
        let mut shutdown_reply = None;

        debug!(event_driven = clock.is_event_driven(), "main loop running");

        loop {
            tokio::select! {
                // A due tick goes before queued work, so a task backlog
                // cannot hold back timeouts.
                biased;

                tick = clock.wait_for_tick() => {
                    self.state.on_tick(&tick);
                    clock.record_tick_end();
                }
                cmd = self.receiver.recv() => match cmd {
                    Some(MainCommand::Run(task)) => self.run_task(task),
                    Some(MainCommand::Shutdown { reply }) => {
                        shutdown_reply = Some(reply);
                        break;
                    }
                    None => {
                        debug!("all main thread handles dropped");
                        break;
                    }
                },
            }
        }

        info!(ticks = clock.tick_count(), "main thread stopped");

        // Close the queue before replying so nothing can be submitted
        // once the caller holds the state again.
        let MainActor {
            state, receiver, ..
        } = self;
        drop(receiver);
        if let Some(reply) = shutdown_reply {
            let _ = reply.send(state);
        }
    }

    /// Runs one task. A panicking task is logged and dropped; the main
    /// thread keeps serving the rest of the queue.
    fn run_task(&mut self, task: Task<S>) {
        let state = &mut self.state;
        if panic::catch_unwind(AssertUnwindSafe(move || task(state))).is_err() {
            error!("protected task panicked");
        }
    }
}
