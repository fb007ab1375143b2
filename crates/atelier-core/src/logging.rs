//! Tracing subscriber installation for embedders and tests.

use tracing_subscriber::{EnvFilter, fmt};

use crate::config::logging::LoggingConfig;

/// Initialize tracing from the logging configuration.
///
/// The `RUST_LOG` environment variable overrides the configured level.
/// Safe to call more than once; subsequent calls are no-ops.
pub fn init(config: &LoggingConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.level));

    let result = match config.format.as_str() {
        "json" => fmt()
            .json()
            .with_env_filter(filter)
            .with_target(true)
            .try_init(),
        _ => fmt().pretty().with_env_filter(filter).try_init(),
    };

    // Already-installed subscriber (e.g. a second test in the same binary).
    if result.is_err() {
        tracing::debug!("Tracing subscriber already installed");
    }
}
