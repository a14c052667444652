//! Diagnostic logging setup.
//!
//! Diagnostics go to stderr through `tracing`; user-facing progress is
//! printed separately by the workflow.

use tracing_subscriber::EnvFilter;

/// Log level used when `--verbose` is not given.
pub const DEFAULT_LOG_LEVEL: &str = "warn";

/// Log level used with `--verbose`.
pub const VERBOSE_LOG_LEVEL: &str = "debug";

/// Returns the filter directive for the given verbosity.
pub fn level_for(verbose: bool) -> &'static str {
    if verbose {
        VERBOSE_LOG_LEVEL
    } else {
        DEFAULT_LOG_LEVEL
    }
}

/// Installs the global subscriber. `RUST_LOG` takes precedence over the flag.
pub fn init(verbose: bool) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level_for(verbose)));

    // Fails only if a subscriber is already installed.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}
