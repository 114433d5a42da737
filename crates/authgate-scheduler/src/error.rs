//! Error types for the scheduler layer.

/// Errors raised when handing work to the main thread.
#[derive(Debug, thiserror::Error)]
pub enum SchedulerError {
    /// The main thread has stopped (shut down, or its runtime failed to
    /// start). Nothing queued now will ever run.
    #[error("main thread is not running")]
    MainThreadGone,

    /// [`MainThread::spawn`](crate::MainThread::spawn) was called outside a
    /// Tokio runtime, so there is no pool for admission work.
    #[error("no tokio runtime available for admission work")]
    NoRuntime,

    /// The OS refused to start the main thread.
    #[error("failed to spawn main thread: {0}")]
    Spawn(#[source] std::io::Error),

    /// A blocking round-trip was requested from the main thread itself,
    /// which would wait on its own reply forever.
    #[error("cannot wait for the main thread from the main thread")]
    CalledFromMainThread,
}
