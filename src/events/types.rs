//! Event types emitted during task execution
//!
//! These events are advisory telemetry: consumers (dashboards, loggers,
//! metrics sinks) subscribe to observe execution, but nothing in the
//! executor's control flow depends on whether anyone is listening.

use serde::{Deserialize, Serialize};

/// Events emitted by the execution core
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum CoreEvent {
    /// A task entered the execution pipeline
    WorkflowStarted { task_id: String, team: String },

    /// A task completed successfully
    WorkflowCompleted { task_id: String, duration_ms: u64 },

    /// A task finished with a failure result
    WorkflowFailed { task_id: String, error: String },

    /// A retry attempt is about to run
    ErrorRetry {
        task_id: String,
        attempt: u32,
        max_retries: u32,
    },

    /// A retry attempt succeeded after earlier failures
    ErrorRecovered { task_id: String, attempts: u32 },

    /// The escalator gave up on the task
    ErrorEscalated { task_id: String, action: String },

    /// The runner itself was marked errored
    RunnerError { task_id: String, message: String },
}

impl CoreEvent {
    /// Event type name for logging and filtering
    pub fn event_type(&self) -> &'static str {
        match self {
            CoreEvent::WorkflowStarted { .. } => "WorkflowStarted",
            CoreEvent::WorkflowCompleted { .. } => "WorkflowCompleted",
            CoreEvent::WorkflowFailed { .. } => "WorkflowFailed",
            CoreEvent::ErrorRetry { .. } => "ErrorRetry",
            CoreEvent::ErrorRecovered { .. } => "ErrorRecovered",
            CoreEvent::ErrorEscalated { .. } => "ErrorEscalated",
            CoreEvent::RunnerError { .. } => "RunnerError",
        }
    }

    /// The task this event belongs to
    pub fn task_id(&self) -> &str {
        match self {
            CoreEvent::WorkflowStarted { task_id, .. }
            | CoreEvent::WorkflowCompleted { task_id, .. }
            | CoreEvent::WorkflowFailed { task_id, .. }
            | CoreEvent::ErrorRetry { task_id, .. }
            | CoreEvent::ErrorRecovered { task_id, .. }
            | CoreEvent::ErrorEscalated { task_id, .. }
            | CoreEvent::RunnerError { task_id, .. } => task_id,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_type_names() {
        let event = CoreEvent::WorkflowStarted {
            task_id: "t-1".to_string(),
            team: "builders".to_string(),
        };
        assert_eq!(event.event_type(), "WorkflowStarted");
        assert_eq!(event.task_id(), "t-1");
    }

    #[test]
    fn test_event_serialization() {
        let event = CoreEvent::ErrorRetry {
            task_id: "t-2".to_string(),
            attempt: 1,
            max_retries: 3,
        };
        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains("error_retry"));
        let back: CoreEvent = serde_json::from_str(&json).unwrap();
        assert_eq!(back.task_id(), "t-2");
    }
}
