//! Integration tests for the execution core
//!
//! These tests wire the public pieces together: hook engine + registry,
//! task executor with stub collaborators, loop detector fed from results,
//! and the event bus observing the whole run.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::{Value, json};

use hivecore::{
    ErrorClassification, ErrorEscalator, EscalationAction, EventBus, EventContext, ExecError,
    ExecutionEntry, ExecutorConfig, Hook, HookAction, HookEngine, HookError, HookEventKind,
    HookOutcome, InMemoryHookRegistry, LoopDetector, RunnerStatus, StateManager, SuggestedAction,
    Task, TaskExecutor, Team, TeamOutput, TeamRegistry, WorkflowResult,
};

// =============================================================================
// Stub collaborators
// =============================================================================

struct EchoTeam;

#[async_trait]
impl Team for EchoTeam {
    fn name(&self) -> &str {
        "echo"
    }
    async fn process_task(&self, task: &Task) -> Result<TeamOutput, ExecError> {
        Ok(TeamOutput::succeeded(json!({ "echoed": task.payload })))
    }
}

struct FlakyTeam {
    failures_left: Mutex<u32>,
}

#[async_trait]
impl Team for FlakyTeam {
    fn name(&self) -> &str {
        "flaky"
    }
    async fn process_task(&self, _task: &Task) -> Result<TeamOutput, ExecError> {
        let mut left = self.failures_left.lock().unwrap();
        if *left > 0 {
            *left -= 1;
            return Err(ExecError::Team {
                team: "flaky".to_string(),
                message: "temporary outage".to_string(),
            });
        }
        Ok(TeamOutput::succeeded(json!("finally")))
    }
}

struct MapRegistry {
    teams: HashMap<String, Arc<dyn Team>>,
}

impl MapRegistry {
    fn new(teams: Vec<Arc<dyn Team>>) -> Arc<Self> {
        let teams = teams
            .into_iter()
            .map(|t| (t.name().to_string(), t))
            .collect();
        Arc::new(Self { teams })
    }
}

impl TeamRegistry for MapRegistry {
    fn get(&self, label: &str) -> Option<Arc<dyn Team>> {
        self.teams.get(label).cloned()
    }
}

struct RetryEscalator;

#[async_trait]
impl ErrorEscalator for RetryEscalator {
    fn classify(&self, error: &ExecError) -> ErrorClassification {
        ErrorClassification {
            category: "transient".to_string(),
            severity: "low".to_string(),
            retryable: error.is_retryable(),
        }
    }
    async fn handle_error(
        &self,
        _task: &Task,
        error: &ExecError,
    ) -> eyre::Result<EscalationAction> {
        Ok(if error.is_retryable() {
            EscalationAction::Retry
        } else {
            EscalationAction::FailTask
        })
    }
    async fn record_success(&self, _task_id: &str) -> eyre::Result<()> {
        Ok(())
    }
}

#[derive(Default)]
struct MemoryState {
    results: Mutex<Vec<WorkflowResult>>,
}

#[async_trait]
impl StateManager for MemoryState {
    async fn record_result(&self, result: &WorkflowResult) -> eyre::Result<()> {
        self.results.lock().unwrap().push(result.clone());
        Ok(())
    }
    async fn set_status(&self, _status: RunnerStatus) -> eyre::Result<()> {
        Ok(())
    }
}

struct SecurityGate;

#[async_trait]
impl Hook for SecurityGate {
    fn name(&self) -> &str {
        "security-gate"
    }
    fn event(&self) -> HookEventKind {
        HookEventKind::TaskBefore
    }
    fn priority(&self) -> u32 {
        10
    }
    async fn execute(&self, ctx: &EventContext) -> Result<HookOutcome, HookError> {
        let forbidden = ctx
            .payload
            .pointer("/payload/forbidden")
            .and_then(Value::as_bool)
            .unwrap_or(false);
        if forbidden {
            Ok(HookOutcome::abort("forbidden payload"))
        } else {
            Ok(HookOutcome::ok())
        }
    }
}

fn executor_for(
    teams: Vec<Arc<dyn Team>>,
    hooks: Vec<Arc<dyn Hook>>,
    config: ExecutorConfig,
) -> (TaskExecutor, Arc<MemoryState>, Arc<EventBus>) {
    let registry = InMemoryHookRegistry::new();
    for hook in hooks {
        registry.register(hook);
    }
    let engine = Arc::new(HookEngine::new(Arc::new(registry)));
    let state = Arc::new(MemoryState::default());
    let bus = Arc::new(EventBus::new(256));
    let executor = TaskExecutor::new(
        engine,
        MapRegistry::new(teams),
        Arc::new(RetryEscalator),
        state.clone(),
        bus.clone(),
        config,
    );
    (executor, state, bus)
}

// =============================================================================
// End-to-end executor flows
// =============================================================================

#[tokio::test]
async fn test_task_flows_through_pipeline() {
    let (executor, state, bus) = executor_for(
        vec![Arc::new(EchoTeam)],
        vec![Arc::new(SecurityGate)],
        ExecutorConfig::default(),
    );
    let mut rx = bus.subscribe();

    let task = Task::new("task-1", "echo it", "echo").with_payload(json!({"msg": "hello"}));
    let result = executor.execute_task(&task).await;

    assert!(result.success);
    assert_eq!(result.result, Some(json!({ "echoed": { "msg": "hello" } })));
    assert_eq!(state.results.lock().unwrap().len(), 1);

    assert_eq!(rx.recv().await.unwrap().event_type(), "WorkflowStarted");
    assert_eq!(rx.recv().await.unwrap().event_type(), "WorkflowCompleted");
}

#[tokio::test]
async fn test_security_gate_blocks_forbidden_task() {
    let (executor, _state, _bus) = executor_for(
        vec![Arc::new(EchoTeam)],
        vec![Arc::new(SecurityGate)],
        ExecutorConfig::default(),
    );

    let task = Task::new("task-2", "sneaky", "echo").with_payload(json!({"forbidden": true}));
    let result = executor.execute_task(&task).await;

    assert!(!result.success);
    assert_eq!(
        result.error.as_deref(),
        Some("Blocked by validation: forbidden payload")
    );
}

#[tokio::test]
async fn test_flaky_team_recovers_through_retries() {
    let flaky = Arc::new(FlakyTeam {
        failures_left: Mutex::new(2),
    });
    let (executor, state, bus) =
        executor_for(vec![flaky], vec![], ExecutorConfig::with_max_retries(3));
    let mut rx = bus.subscribe();

    let task = Task::new("task-3", "keep trying", "flaky");
    let result = executor.execute_task(&task).await;

    assert!(result.success);
    assert_eq!(result.result, Some(json!("finally")));
    // Only the final attempt's result is recorded and returned.
    assert_eq!(state.results.lock().unwrap().len(), 1);

    let mut types = Vec::new();
    while let Ok(event) = rx.try_recv() {
        types.push(event.event_type());
    }
    assert!(types.contains(&"ErrorRetry"));
    assert!(types.contains(&"ErrorRecovered"));
}

#[tokio::test]
async fn test_missing_team_fails_cleanly() {
    let (executor, _state, _bus) = executor_for(vec![], vec![], ExecutorConfig::default());

    let task = Task::new("task-4", "orphan", "ghosts");
    let result = executor.execute_task(&task).await;

    assert!(!result.success);
    assert!(result.error.as_deref().unwrap().contains("ghosts"));
}

// =============================================================================
// Loop detector fed from execution results
// =============================================================================

#[tokio::test]
async fn test_detector_blocks_after_repeated_executions() {
    let (executor, _state, _bus) =
        executor_for(vec![Arc::new(EchoTeam)], vec![], ExecutorConfig::default());
    let mut detector = LoopDetector::new();

    let task = Task::new("task-5", "again and again", "echo");
    for _ in 0..5 {
        let result = executor.execute_task(&task).await;
        assert!(result.success);
        detector.record_execution(ExecutionEntry::new(&task.id, "execute"));
    }

    let verdict = detector.check_for_loop(&task.id);
    assert!(verdict.detected);
    assert_eq!(verdict.suggested_action, SuggestedAction::Block);

    let metrics = detector.metrics();
    assert_eq!(metrics.total_executions, 5);
    assert_eq!(metrics.blocked_executions, 1);
}

// =============================================================================
// Hook engine surface
// =============================================================================

#[tokio::test]
async fn test_hook_history_tracks_dispatches() {
    let registry = InMemoryHookRegistry::new();
    registry.register(Arc::new(SecurityGate));
    let engine = HookEngine::new(Arc::new(registry));

    engine
        .execute_hooks(
            HookEventKind::TaskBefore,
            json!({"payload": {"forbidden": false}}),
            Default::default(),
        )
        .await
        .unwrap();

    let history = engine.history(None).await;
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].hook_name, "security-gate");
    assert_eq!(
        history[0].outcome.as_ref().unwrap().action,
        HookAction::Continue
    );
}
