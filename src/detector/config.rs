//! Loop detector thresholds

use serde::{Deserialize, Serialize};

/// Thresholds and windows for loop detection
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoopDetectorConfig {
    /// Same-task executions inside the time window before blocking
    pub max_same_task_retries: usize,

    /// Recency window for the same-task check, in milliseconds
    pub time_window_ms: u64,

    /// Pattern/fingerprint repeats before blocking
    pub max_sequence_repeats: usize,

    /// Ring buffer capacity; only this many entries affect any check
    pub sequence_window_size: usize,
}

impl Default for LoopDetectorConfig {
    fn default() -> Self {
        Self {
            max_same_task_retries: 5,
            time_window_ms: 300_000,
            max_sequence_repeats: 3,
            sequence_window_size: 20,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = LoopDetectorConfig::default();
        assert_eq!(config.max_same_task_retries, 5);
        assert_eq!(config.time_window_ms, 300_000);
        assert_eq!(config.max_sequence_repeats, 3);
        assert_eq!(config.sequence_window_size, 20);
    }

    #[test]
    fn test_partial_yaml_fills_defaults() {
        let config: LoopDetectorConfig = serde_yaml::from_str("max_same_task_retries: 7").unwrap();
        assert_eq!(config.max_same_task_retries, 7);
        assert_eq!(config.sequence_window_size, 20);
    }
}
