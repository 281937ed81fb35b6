//! Loop detection over buffered execution history
//!
//! Three independent heuristics flag agents stuck repeating work:
//! same-task hammering inside a time window, state regression (identical
//! output fingerprints), and repeating task sequences. Checks run
//! cheapest-first and the first positive wins, which bounds per-call cost
//! and means a same-task detection masks a concurrently-true sequence
//! detection.

use std::collections::{HashMap, HashSet};

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::config::LoopDetectorConfig;
use super::ring::RingBuffer;

/// One observed execution, fed by the caller
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionEntry {
    /// Task the execution belonged to
    pub task_id: String,
    /// Operation-type label (e.g. "implement", "review")
    pub operation_type: String,
    /// When the execution happened
    pub timestamp: DateTime<Utc>,
    /// Optional fingerprint of the produced output
    pub output_hash: Option<String>,
}

impl ExecutionEntry {
    /// Create an entry stamped with the current time
    pub fn new(task_id: impl Into<String>, operation_type: impl Into<String>) -> Self {
        Self {
            task_id: task_id.into(),
            operation_type: operation_type.into(),
            timestamp: Utc::now(),
            output_hash: None,
        }
    }

    /// Attach an output fingerprint
    pub fn with_output_hash(mut self, hash: impl Into<String>) -> Self {
        self.output_hash = Some(hash.into());
        self
    }

    /// "task_id:operation_type" signature used by sequence detection
    pub fn signature(&self) -> String {
        format!("{}:{}", self.task_id, self.operation_type)
    }
}

/// Kind of loop a detection refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum LoopType {
    SameTask,
    TaskSequence,
    StateRegression,
}

impl std::fmt::Display for LoopType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            LoopType::SameTask => "same-task",
            LoopType::TaskSequence => "task-sequence",
            LoopType::StateRegression => "state-regression",
        };
        f.write_str(s)
    }
}

/// What the caller should do about a detection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SuggestedAction {
    /// No loop detected, keep going
    Continue,
    /// Approaching a threshold
    Warn,
    /// Threshold reached; the caller should stop this task
    Block,
}

/// Detection verdict (advisory telemetry; the caller decides)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoopDetectionResult {
    pub detected: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub loop_type: Option<LoopType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub execution_count: Option<usize>,
    pub suggested_action: SuggestedAction,
}

impl LoopDetectionResult {
    fn none() -> Self {
        Self {
            detected: false,
            loop_type: None,
            details: None,
            execution_count: None,
            suggested_action: SuggestedAction::Continue,
        }
    }

    fn positive(
        loop_type: LoopType,
        details: String,
        count: usize,
        action: SuggestedAction,
    ) -> Self {
        Self {
            detected: true,
            loop_type: Some(loop_type),
            details: Some(details),
            execution_count: Some(count),
            suggested_action: action,
        }
    }
}

/// Counters exposed for observability
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LoopMetrics {
    pub total_executions: u64,
    pub loops_detected: u64,
    pub blocked_executions: u64,
    pub unique_tasks: u64,
}

/// Keeps bounded execution history and classifies loop patterns.
///
/// Single-writer by design: methods take `&mut self`. Callers sharing a
/// detector across tasks wrap it in a mutex.
pub struct LoopDetector {
    config: LoopDetectorConfig,
    history: RingBuffer<ExecutionEntry>,
    /// All-time unique "task:operation" signatures since the last reset;
    /// deliberately not pruned to the ring buffer.
    signatures: HashSet<String>,
    total_executions: u64,
    loops_detected: u64,
    blocked_executions: u64,
}

impl LoopDetector {
    /// Create a detector with default thresholds
    pub fn new() -> Self {
        Self::with_config(LoopDetectorConfig::default())
    }

    /// Create a detector with explicit thresholds
    pub fn with_config(config: LoopDetectorConfig) -> Self {
        let history = RingBuffer::new(config.sequence_window_size);
        Self {
            config,
            history,
            signatures: HashSet::new(),
            total_executions: 0,
            loops_detected: 0,
            blocked_executions: 0,
        }
    }

    /// Record one execution into the bounded history
    pub fn record_execution(&mut self, entry: ExecutionEntry) {
        debug!(
            task_id = %entry.task_id,
            operation = %entry.operation_type,
            "record_execution"
        );
        self.signatures.insert(entry.signature());
        self.history.push(entry);
        self.total_executions += 1;
    }

    /// Classify the current history for `task_id`.
    ///
    /// Checks run cheapest-first; the first positive is returned and
    /// counted. A warn or block both count as detections; only block
    /// increments `blocked_executions`.
    pub fn check_for_loop(&mut self, task_id: &str) -> LoopDetectionResult {
        let result = self
            .check_same_task(task_id)
            .or_else(|| self.check_state_regression(task_id))
            .or_else(|| self.check_task_sequence());

        match result {
            Some(result) => {
                self.loops_detected += 1;
                if result.suggested_action == SuggestedAction::Block {
                    self.blocked_executions += 1;
                    warn!(
                        task_id,
                        loop_type = %result.loop_type.map(|t| t.to_string()).unwrap_or_default(),
                        "loop detected, suggesting block"
                    );
                }
                result
            }
            None => LoopDetectionResult::none(),
        }
    }

    /// Same task executed too many times within the time window
    fn check_same_task(&self, task_id: &str) -> Option<LoopDetectionResult> {
        let cutoff = Utc::now() - Duration::milliseconds(self.config.time_window_ms as i64);
        let count = self
            .history
            .iter_chronological()
            .filter(|e| e.task_id == task_id && e.timestamp >= cutoff)
            .count();

        let threshold = self.config.max_same_task_retries;
        if count >= threshold {
            Some(LoopDetectionResult::positive(
                LoopType::SameTask,
                format!(
                    "task '{task_id}' executed {count} times within {}ms",
                    self.config.time_window_ms
                ),
                count,
                SuggestedAction::Block,
            ))
        } else if count + 1 >= threshold && count > 0 {
            Some(LoopDetectionResult::positive(
                LoopType::SameTask,
                format!("task '{task_id}' approaching retry limit ({count}/{threshold})"),
                count,
                SuggestedAction::Warn,
            ))
        } else {
            None
        }
    }

    /// The same output fingerprint keeps coming back for one task
    fn check_state_regression(&self, task_id: &str) -> Option<LoopDetectionResult> {
        let mut counts: HashMap<&str, usize> = HashMap::new();
        let mut fingerprinted = 0usize;
        for entry in self.history.iter_chronological() {
            if entry.task_id != task_id {
                continue;
            }
            if let Some(hash) = entry.output_hash.as_deref() {
                fingerprinted += 1;
                *counts.entry(hash).or_insert(0) += 1;
            }
        }
        if fingerprinted < 2 {
            return None;
        }

        let (hash, count) = counts.into_iter().max_by_key(|(_, c)| *c)?;
        let threshold = self.config.max_sequence_repeats;
        if count >= threshold {
            Some(LoopDetectionResult::positive(
                LoopType::StateRegression,
                format!("task '{task_id}' produced identical output '{hash}' {count} times"),
                count,
                SuggestedAction::Block,
            ))
        } else if count + 1 >= threshold && count >= 2 {
            Some(LoopDetectionResult::positive(
                LoopType::StateRegression,
                format!("task '{task_id}' repeating output '{hash}' ({count}/{threshold})"),
                count,
                SuggestedAction::Warn,
            ))
        } else {
            None
        }
    }

    /// A periodic signature pattern repeats across the buffer.
    ///
    /// For each period length ascending, the tail of the signature list is
    /// the candidate pattern; repeats are counted walking backward in
    /// non-overlapping blocks. The shortest qualifying period wins.
    fn check_task_sequence(&self) -> Option<LoopDetectionResult> {
        let signatures: Vec<String> = self
            .history
            .iter_chronological()
            .map(ExecutionEntry::signature)
            .collect();
        let n = signatures.len();
        if n < 4 {
            return None;
        }

        let threshold = self.config.max_sequence_repeats;
        for len in 2..=n / 2 {
            let pattern = &signatures[n - len..];

            let mut repeats = 0usize;
            let mut end = n;
            while end >= len && signatures[end - len..end] == *pattern {
                repeats += 1;
                end -= len;
            }

            if repeats >= threshold {
                return Some(LoopDetectionResult::positive(
                    LoopType::TaskSequence,
                    pattern.join(" -> "),
                    repeats,
                    SuggestedAction::Block,
                ));
            }
            if repeats + 1 >= threshold && repeats >= 2 {
                return Some(LoopDetectionResult::positive(
                    LoopType::TaskSequence,
                    pattern.join(" -> "),
                    repeats,
                    SuggestedAction::Warn,
                ));
            }
        }

        None
    }

    /// Current counters; `total_executions` and `unique_tasks` are
    /// monotonic until [`LoopDetector::reset`]
    pub fn metrics(&self) -> LoopMetrics {
        LoopMetrics {
            total_executions: self.total_executions,
            loops_detected: self.loops_detected,
            blocked_executions: self.blocked_executions,
            unique_tasks: self.signatures.len() as u64,
        }
    }

    /// Clear the buffer, counters, and signature set
    pub fn reset(&mut self) {
        debug!("reset: clearing loop detector state");
        self.history.clear();
        self.signatures.clear();
        self.total_executions = 0;
        self.loops_detected = 0;
        self.blocked_executions = 0;
    }
}

impl Default for LoopDetector {
    fn default() -> Self {
        Self::new()
    }
}
