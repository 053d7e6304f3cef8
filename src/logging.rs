//! Tracing subscriber setup for the binary.

use tracing_subscriber::EnvFilter;

/// Levels accepted by `debug.log_level` and `--debug`.
pub const LOG_LEVELS: [&str; 6] = ["off", "error", "warn", "info", "debug", "trace"];

/// Install a compact stderr subscriber. `RUST_LOG` takes precedence over
/// `level`.
///
/// Returns `false` if a global subscriber was already set by the host.
#[must_use]
pub fn init_tracing(level: &str) -> bool {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .compact()
        .try_init()
        .is_ok()
}
