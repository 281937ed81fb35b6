//! Executor configuration

use serde::{Deserialize, Serialize};

fn default_max_retries() -> u32 {
    3
}

fn default_true() -> bool {
    true
}

/// Per-executor settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExecutorConfig {
    /// Maximum retry attempts when the escalator recommends retrying
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// Delegate failures to the recovery protocol
    #[serde(default = "default_true")]
    pub error_recovery: bool,

    /// Record retry lessons through the learning service
    #[serde(default = "default_true")]
    pub learning: bool,
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        Self {
            max_retries: default_max_retries(),
            error_recovery: true,
            learning: true,
        }
    }
}

impl ExecutorConfig {
    /// Config with an explicit retry budget
    pub fn with_max_retries(max_retries: u32) -> Self {
        Self {
            max_retries,
            ..Default::default()
        }
    }
}
