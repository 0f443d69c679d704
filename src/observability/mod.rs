//! Logging bootstrap for binaries and tests.

use tracing_subscriber::EnvFilter;

/// Install the global fmt subscriber. Reads `RUST_LOG`, defaulting to
/// `info`. Calling it again later is a no-op, so tests can all call it.
pub fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}
