use tracing_subscriber::EnvFilter;

/// Environment variable holding a `tracing` filter directive, e.g. `chromium_sync=debug`.
pub const LOG_ENV_VAR: &str = "CHROMIUM_SYNC_LOG";

/// Install the global subscriber.
///
/// Logs go to stderr because stdout carries JSON results. `verbosity` picks the
/// default level when [`LOG_ENV_VAR`] is unset: 0 → warn, 1 → info, 2+ → debug.
pub fn init_logging(verbosity: u8) {
    let filter = EnvFilter::try_from_env(LOG_ENV_VAR)
        .unwrap_or_else(|_| EnvFilter::new(default_directive(verbosity)));

    // A second init (e.g. from tests) is harmless.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

fn default_directive(verbosity: u8) -> &'static str {
    match verbosity {
        0 => "warn",
        1 => "info",
        _ => "debug",
    }
}
