//! Logging setup for hosts that don't bring their own subscriber.
//!
//! Everything the engine logs goes through `tracing`; embedding hosts with
//! an existing subscriber should skip this module entirely.

use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// Env var controlling the log filter, e.g. `MURMUR_LOG=murmur=debug`.
pub const LOG_ENV_VAR: &str = "MURMUR_LOG";

/// Initialize structured JSON logging for the whole process.
///
/// Defaults to `warn` unless overridden by [`LOG_ENV_VAR`]. Safe to call
/// more than once; only the first call installs a subscriber.
pub fn init() {
    init_with_default("warn");
}

/// Like [`init`], with an explicit fallback directive for when
/// [`LOG_ENV_VAR`] is unset.
pub fn init_with_default(directive: &str) {
    let filter =
        EnvFilter::try_from_env(LOG_ENV_VAR).unwrap_or_else(|_| EnvFilter::new(directive));

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().json().with_target(true))
        .try_init();
}
