//! Synchronizer configuration schemas.
//!
//! All configuration structs are deserialized from TOML files via the
//! `config` crate. Each sub-module represents a logical configuration
//! section.

pub mod channel;
pub mod fetch;
pub mod logging;

use serde::{Deserialize, Serialize};

use self::channel::ChannelConfig;
use self::fetch::FetchConfig;
use self::logging::LoggingConfig;

use crate::error::AppError;

/// Root synchronizer configuration.
///
/// This struct is the top-level deserialization target for the merged
/// TOML configuration files (default.toml + environment overlay).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SyncConfig {
    /// Initial fetch settings.
    #[serde(default)]
    pub fetch: FetchConfig,
    /// Realtime channel settings.
    #[serde(default)]
    pub channel: ChannelConfig,
    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl SyncConfig {
    /// Load configuration for the given environment.
    ///
    /// Merges the default configuration with an environment-specific
    /// overlay and environment variables prefixed with `ATELIER`.
    pub fn load(env: &str) -> Result<Self, AppError> {
        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name(&format!("config/{env}")).required(false))
            .add_source(
                config::Environment::with_prefix("ATELIER")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .map_err(|e| AppError::configuration(format!("Failed to build config: {e}")))?;

        config
            .try_deserialize()
            .map_err(|e| AppError::configuration(format!("Failed to deserialize config: {e}")))
    }
}
