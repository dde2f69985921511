//! Request dispatcher configuration.

use serde::{Deserialize, Serialize};

/// Configuration for the outbound request dispatcher.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DispatchConfig {
    /// Timeout in seconds applied when a call spec leaves its timeout at zero.
    #[serde(default = "default_timeout_secs")]
    pub default_timeout_secs: u64,

    /// Timeout in seconds for user/customer activity reports.
    #[serde(default = "default_reporter_timeout_secs")]
    pub reporter_timeout_secs: u64,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            default_timeout_secs: default_timeout_secs(),
            reporter_timeout_secs: default_reporter_timeout_secs(),
        }
    }
}

fn default_timeout_secs() -> u64 {
    5
}

fn default_reporter_timeout_secs() -> u64 {
    15
}
