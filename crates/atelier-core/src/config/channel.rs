//! Realtime channel configuration.

use serde::{Deserialize, Serialize};

/// Settings for the realtime channel manager.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChannelConfig {
    /// Time bound for the transport authenticate call, in seconds.
    #[serde(default = "default_auth_timeout")]
    pub auth_timeout_seconds: u64,
    /// Time bound for the transport subscribe handshake, in seconds.
    #[serde(default = "default_subscribe_timeout")]
    pub subscribe_timeout_seconds: u64,
    /// Base backoff before the first channel retry, in milliseconds.
    #[serde(default = "default_backoff_base")]
    pub retry_backoff_base_ms: u64,
    /// Maximum backoff cap, in milliseconds.
    #[serde(default = "default_backoff_max")]
    pub retry_backoff_max_ms: u64,
    /// Maximum channel retries before giving up until an explicit refresh.
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    /// Clock-skew leeway applied to credential expiry checks, in seconds.
    #[serde(default = "default_leeway")]
    pub credential_leeway_seconds: u64,
    /// Buffer size of the inbound event queue.
    #[serde(default = "default_event_buffer")]
    pub event_buffer_size: usize,
}

impl Default for ChannelConfig {
    fn default() -> Self {
        Self {
            auth_timeout_seconds: default_auth_timeout(),
            subscribe_timeout_seconds: default_subscribe_timeout(),
            retry_backoff_base_ms: default_backoff_base(),
            retry_backoff_max_ms: default_backoff_max(),
            max_retries: default_max_retries(),
            credential_leeway_seconds: default_leeway(),
            event_buffer_size: default_event_buffer(),
        }
    }
}

fn default_auth_timeout() -> u64 {
    10
}

fn default_subscribe_timeout() -> u64 {
    10
}

fn default_backoff_base() -> u64 {
    2_000
}

fn default_backoff_max() -> u64 {
    300_000
}

fn default_max_retries() -> u32 {
    20
}

fn default_leeway() -> u64 {
    5
}

fn default_event_buffer() -> usize {
    256
}
