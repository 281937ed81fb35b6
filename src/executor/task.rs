//! Task and result types for the executor

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A unit of work routed to one team
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Task {
    /// Unique task id
    pub id: String,
    /// Human-readable description
    pub description: String,
    /// Label of the team that should process this task
    pub team: String,
    /// Opaque work payload handed to the team
    #[serde(default)]
    pub payload: Value,
    /// Arbitrary metadata (labels, trace ids, ...)
    #[serde(default)]
    pub metadata: Value,
}

impl Task {
    /// Create a task with empty payload and metadata
    pub fn new(
        id: impl Into<String>,
        description: impl Into<String>,
        team: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            description: description.into(),
            team: team.into(),
            payload: Value::Null,
            metadata: Value::Null,
        }
    }

    /// Attach a work payload
    pub fn with_payload(mut self, payload: Value) -> Self {
        self.payload = payload;
        self
    }
}

/// Token accounting reported by a team
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct TokenUsage {
    pub input_tokens: u64,
    pub output_tokens: u64,
}

impl TokenUsage {
    pub fn total(&self) -> u64 {
        self.input_tokens + self.output_tokens
    }
}

/// What a team reports back after processing a task
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TeamOutput {
    /// Whether the team considers the task done
    pub success: bool,
    /// Result payload on success
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    /// Failure description when `success` is false
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Tokens spent processing, for budget accounting
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token_usage: Option<TokenUsage>,
}

impl TeamOutput {
    /// A successful output carrying a result payload
    pub fn succeeded(result: Value) -> Self {
        Self {
            success: true,
            result: Some(result),
            error: None,
            token_usage: None,
        }
    }

    /// A failed output with an error description
    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            success: false,
            result: None,
            error: Some(error.into()),
            token_usage: None,
        }
    }
}

/// Outcome of post-execution confidence validation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationReport {
    pub passed: bool,
    /// Confidence score in [0.0, 1.0]
    pub score: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

/// Runner-level status recorded through the state manager
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunnerStatus {
    Idle,
    Running,
    Errored,
}

/// The single result of one `execute_task` call.
///
/// Exactly one per call, retries included: only the final attempt's
/// result surfaces. A failed result always carries a non-empty error.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkflowResult {
    pub success: bool,
    pub task_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub duration_ms: u64,
    pub team: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub validation: Option<ValidationReport>,
}

impl WorkflowResult {
    /// Build a success result
    pub fn succeeded(task: &Task, result: Option<Value>, duration_ms: u64) -> Self {
        Self {
            success: true,
            task_id: task.id.clone(),
            result,
            error: None,
            duration_ms,
            team: task.team.clone(),
            validation: None,
        }
    }

    /// Build a failure result; an empty error is replaced with a
    /// placeholder so `success=false` always carries a description
    pub fn failed(task: &Task, error: impl Into<String>, duration_ms: u64) -> Self {
        let error = error.into();
        let error = if error.is_empty() {
            "unknown error".to_string()
        } else {
            error
        };
        Self {
            success: false,
            task_id: task.id.clone(),
            result: None,
            error: Some(error),
            duration_ms,
            team: task.team.clone(),
            validation: None,
        }
    }
}
