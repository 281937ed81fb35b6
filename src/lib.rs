//! Hivecore - execution core for a multi-agent task-orchestration platform
//!
//! Hivecore drives individual units of work ("tasks") through a
//! configurable, event-driven pipeline of extension points ("hooks"),
//! guards against runaway execution loops, and recovers from transient
//! failures via classified retry policies.
//!
//! # Core Components
//!
//! - **Hook Execution Engine** ([`hooks`]): runs ordered or concurrent
//!   sets of extension callbacks against an event context and aggregates
//!   outcomes, with per-dispatch timeouts and bounded history
//! - **Task Executor** ([`executor`]): sequences one task through the hook
//!   pipeline, attaches validation and budget accounting, and implements a
//!   bounded-retry recovery protocol
//! - **Loop Detector** ([`detector`]): keeps bounded execution history and
//!   runs three independent heuristics flagging agents stuck repeating
//!   work
//!
//! Concrete hooks, team runtimes, escalation policy, persistence, and
//! learning caches are external collaborators consumed through narrow
//! traits; see [`executor`] and [`hooks::HookRegistry`].

pub mod config;
pub mod detector;
pub mod events;
pub mod executor;
pub mod hooks;
pub mod logging;

// Re-export commonly used types
pub use config::Config;
pub use detector::{
    ExecutionEntry, LoopDetectionResult, LoopDetector, LoopDetectorConfig, LoopMetrics, LoopType,
    SuggestedAction,
};
pub use events::{CoreEvent, EventBus, EventEmitter, create_event_bus};
pub use executor::{
    BudgetTracker, ConfidenceValidator, ErrorClassification, ErrorEscalator, EscalationAction,
    ExecError, ExecutorConfig, LearningService, RunnerStatus, StateManager, Task, TaskExecutor,
    Team, TeamOutput, TeamRegistry, TokenUsage, ValidationReport, WorkflowResult,
};
pub use hooks::{
    EventContext, ExecuteOptions, ExecutionRecord, Hook, HookAction, HookEngine, HookEngineConfig,
    HookError, HookEventKind, HookOutcome, HookRegistry, InMemoryHookRegistry,
};
