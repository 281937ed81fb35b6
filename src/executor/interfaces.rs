//! External collaborator interfaces
//!
//! The executor consumes these through narrow traits; concrete
//! implementations (team runtimes, escalation policy, persistence,
//! learning caches, budget accounting) live outside this core. Learning
//! and budget calls are best-effort: the executor swallows their failures
//! at the call boundary.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;

use super::error::ExecError;
use super::task::{RunnerStatus, Task, TeamOutput, TokenUsage, ValidationReport, WorkflowResult};

/// A worker team that can process tasks
#[async_trait]
pub trait Team: Send + Sync {
    /// Team label, matching `Task::team`
    fn name(&self) -> &str;

    /// Process one task to completion
    async fn process_task(&self, task: &Task) -> Result<TeamOutput, ExecError>;
}

/// Lookup of teams by label
pub trait TeamRegistry: Send + Sync {
    fn get(&self, label: &str) -> Option<Arc<dyn Team>>;
}

/// How an error was classified by the escalator
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorClassification {
    /// Category label ("transient", "configuration", ...)
    pub category: String,
    /// Severity label ("low", "high", ...)
    pub severity: String,
    /// Whether the escalator considers a retry worthwhile
    pub retryable: bool,
}

/// The escalator's recommended next step
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EscalationAction {
    Retry,
    FailTask,
    StopRunner,
    Ignore,
    Log,
}

impl std::fmt::Display for EscalationAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            EscalationAction::Retry => "retry",
            EscalationAction::FailTask => "fail_task",
            EscalationAction::StopRunner => "stop_runner",
            EscalationAction::Ignore => "ignore",
            EscalationAction::Log => "log",
        };
        f.write_str(s)
    }
}

/// Classifies errors and recommends recovery actions
#[async_trait]
pub trait ErrorEscalator: Send + Sync {
    /// Classify an error without side effects
    fn classify(&self, error: &ExecError) -> ErrorClassification;

    /// Recommend what to do about an error on a given task
    async fn handle_error(&self, task: &Task, error: &ExecError)
    -> eyre::Result<EscalationAction>;

    /// Reset the failure streak after a success
    async fn record_success(&self, task_id: &str) -> eyre::Result<()>;
}

/// Records task outcomes and runner status
#[async_trait]
pub trait StateManager: Send + Sync {
    async fn record_result(&self, result: &WorkflowResult) -> eyre::Result<()>;

    async fn set_status(&self, status: RunnerStatus) -> eyre::Result<()>;
}

/// Caches fixes for recurring errors. Fire-and-forget on both sides.
#[async_trait]
pub trait LearningService: Send + Sync {
    /// Record a lesson keyed by an error description
    async fn learn(&self, key: &str, lesson: &str) -> eyre::Result<()>;

    /// Look up a cached fix for an error description
    async fn lookup(&self, key: &str) -> eyre::Result<Option<String>>;
}

/// Tracks token spend per task
#[async_trait]
pub trait BudgetTracker: Send + Sync {
    async fn add_tokens(&self, task_id: &str, usage: TokenUsage) -> eyre::Result<()>;

    async fn usage_stats(&self) -> eyre::Result<Value>;
}

/// Post-execution confidence validation
#[async_trait]
pub trait ConfidenceValidator: Send + Sync {
    async fn validate(&self, task: &Task, result: &Value) -> eyre::Result<ValidationReport>;
}
