//! Initial fetch configuration.

use serde::{Deserialize, Serialize};

/// Settings for the initial notification fetch.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FetchConfig {
    /// Maximum number of records requested in the initial load.
    #[serde(default = "default_initial_limit")]
    pub initial_limit: u32,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            initial_limit: default_initial_limit(),
        }
    }
}

fn default_initial_limit() -> u32 {
    50
}
