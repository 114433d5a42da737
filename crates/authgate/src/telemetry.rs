//! Log output for binaries embedding the gate.

use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt;
use tracing_subscriber::prelude::*;

/// Installs a `fmt` subscriber filtered by `RUST_LOG`, falling back to
/// `default_filter` (e.g. `"authgate=info"`) when it is unset or invalid.
///
/// Thread names are shown so main thread work is easy to tell apart from
/// admission work. Returns `false` if a global subscriber was already
/// installed.
pub fn init_logging(default_filter: &str) -> bool {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_filter));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt::layer().with_target(true).with_thread_names(true))
        .try_init()
        .is_ok()
}
