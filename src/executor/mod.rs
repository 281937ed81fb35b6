//! Task execution pipeline
//!
//! The executor sequences one task through pre-hooks, team processing,
//! post-execution validation, and a bounded-retry recovery protocol.
//! External collaborators (teams, escalation policy, state, learning,
//! budget) are consumed through the traits in [`interfaces`].

mod config;
mod core;
mod error;
mod interfaces;
mod task;

pub use self::core::TaskExecutor;
pub use config::ExecutorConfig;
pub use error::ExecError;
pub use interfaces::{
    BudgetTracker, ConfidenceValidator, ErrorClassification, ErrorEscalator, EscalationAction,
    LearningService, StateManager, Team, TeamRegistry,
};
pub use task::{RunnerStatus, Task, TeamOutput, TokenUsage, ValidationReport, WorkflowResult};
