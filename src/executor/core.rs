//! Task executor
//!
//! Drives one task through the hook pipeline: pre-execution gates, team
//! processing, post-execution validation, and a bounded-retry recovery
//! protocol on failure. `execute_task` never returns an error; every path
//! resolves to a [`WorkflowResult`].

use std::sync::Arc;
use std::time::Instant;

use serde_json::Value;
use tracing::{debug, info, warn};

use crate::events::{EventBus, EventEmitter};
use crate::hooks::{ExecuteOptions, HookAction, HookEngine, HookEventKind};

use super::config::ExecutorConfig;
use super::error::ExecError;
use super::interfaces::{
    BudgetTracker, ConfidenceValidator, ErrorEscalator, EscalationAction, LearningService,
    StateManager, Team, TeamRegistry,
};
use super::task::{RunnerStatus, Task, TeamOutput, WorkflowResult};

/// Sequences one task through hooks, team processing, and recovery
pub struct TaskExecutor {
    hooks: Arc<HookEngine>,
    teams: Arc<dyn TeamRegistry>,
    escalator: Arc<dyn ErrorEscalator>,
    state: Arc<dyn StateManager>,
    events: Arc<EventBus>,
    learning: Option<Arc<dyn LearningService>>,
    budget: Option<Arc<dyn BudgetTracker>>,
    validator: Option<Arc<dyn ConfidenceValidator>>,
    config: ExecutorConfig,
}

impl TaskExecutor {
    /// Create an executor with the required collaborators
    pub fn new(
        hooks: Arc<HookEngine>,
        teams: Arc<dyn TeamRegistry>,
        escalator: Arc<dyn ErrorEscalator>,
        state: Arc<dyn StateManager>,
        events: Arc<EventBus>,
        config: ExecutorConfig,
    ) -> Self {
        Self {
            hooks,
            teams,
            escalator,
            state,
            events,
            learning: None,
            budget: None,
            validator: None,
            config,
        }
    }

    /// Attach a learning service for error-fix caching
    pub fn with_learning(mut self, learning: Arc<dyn LearningService>) -> Self {
        self.learning = Some(learning);
        self
    }

    /// Attach a budget tracker for token accounting
    pub fn with_budget_tracker(mut self, budget: Arc<dyn BudgetTracker>) -> Self {
        self.budget = Some(budget);
        self
    }

    /// Attach a post-execution confidence validator
    pub fn with_validator(mut self, validator: Arc<dyn ConfidenceValidator>) -> Self {
        self.validator = Some(validator);
        self
    }

    /// Execute one task end to end.
    ///
    /// Never returns an error: hook aborts, team failures, and recovery
    /// exhaustion all surface as a failure result with a human-readable
    /// error. Only the final attempt's result is returned.
    pub async fn execute_task(&self, task: &Task) -> WorkflowResult {
        let started = Instant::now();
        let emitter = self.events.emitter_for(&task.id);
        info!(task_id = %task.id, team = %task.team, "execute_task: starting");
        emitter.workflow_started(&task.team);

        // Pre-execution gates. An abort outcome blocks the task before
        // the team ever sees it.
        if let Some(blocked) = self.run_pre_hooks(task, started).await {
            warn!(task_id = %task.id, error = ?blocked.error, "task blocked by pre-hook");
            emitter.workflow_failed(blocked.error.as_deref().unwrap_or_default());
            self.record(&blocked).await;
            return blocked;
        }

        match self.run_team(task).await {
            Ok(output) if output.success => {
                let mut result =
                    WorkflowResult::succeeded(task, output.result.clone(), elapsed_ms(started));
                self.post_process(task, &mut result, &output).await;
                self.finalize_success(task, &result).await;
                emitter.workflow_completed(result.duration_ms);
                result
            }
            Ok(output) => {
                // The team answered cleanly but reported failure; this is
                // a result, not an exception, so recovery stays out of it.
                let error = output
                    .error
                    .unwrap_or_else(|| "team reported failure".to_string());
                let result = WorkflowResult::failed(task, error.clone(), elapsed_ms(started));
                self.record(&result).await;
                emitter.workflow_failed(&error);
                result
            }
            Err(err) => self.handle_failure(task, err, started, &emitter).await,
        }
    }

    /// Dispatch TASK_BEFORE hooks. Returns a blocked result when an abort
    /// outcome fires; engine-level failures degrade to "no hooks fired".
    async fn run_pre_hooks(&self, task: &Task, started: Instant) -> Option<WorkflowResult> {
        let opts = ExecuteOptions {
            stop_on_action: vec![HookAction::Abort],
            ..Default::default()
        };
        let outcomes = match self
            .hooks
            .execute_hooks(HookEventKind::TaskBefore, task_payload(task), opts)
            .await
        {
            Ok(outcomes) => outcomes,
            Err(err) => {
                warn!(task_id = %task.id, error = %err, "pre-hook pipeline failed, continuing without gates");
                return None;
            }
        };

        let abort = outcomes.into_iter().find(|o| o.action == HookAction::Abort)?;
        let message = abort
            .message
            .unwrap_or_else(|| "hook aborted".to_string());
        Some(WorkflowResult::failed(
            task,
            format!("Blocked by validation: {message}"),
            elapsed_ms(started),
        ))
    }

    /// Resolve the team and process the task once
    async fn run_team(&self, task: &Task) -> Result<TeamOutput, ExecError> {
        let team: Arc<dyn Team> =
            self.teams
                .get(&task.team)
                .ok_or_else(|| ExecError::TeamNotFound {
                    team: task.team.clone(),
                })?;
        debug!(task_id = %task.id, team = team.name(), "run_team: dispatching");
        team.process_task(task).await
    }

    /// Post-execution steps after a team success. Everything here is
    /// best-effort: failures are logged and absorbed, never surfaced.
    async fn post_process(&self, task: &Task, result: &mut WorkflowResult, output: &TeamOutput) {
        if let Some(validator) = &self.validator {
            let payload = result.result.clone().unwrap_or(Value::Null);
            match validator.validate(task, &payload).await {
                Ok(report) => result.validation = Some(report),
                Err(err) => {
                    debug!(task_id = %task.id, error = %err, "confidence validation failed, omitting report");
                }
            }
        }

        if let Err(err) = self
            .hooks
            .execute_hooks(
                HookEventKind::TaskAfter,
                result_payload(task, result),
                ExecuteOptions::default(),
            )
            .await
        {
            warn!(task_id = %task.id, error = %err, "post-hook pipeline failed");
        }

        if let (Some(budget), Some(usage)) = (&self.budget, output.token_usage) {
            if let Err(err) = budget.add_tokens(&task.id, usage).await {
                debug!(task_id = %task.id, error = %err, "budget tracker rejected token report");
            }
        }
    }

    async fn finalize_success(&self, task: &Task, result: &WorkflowResult) {
        self.record(result).await;
        if let Err(err) = self.escalator.record_success(&task.id).await {
            debug!(task_id = %task.id, error = %err, "record_success failed");
        }
    }

    /// Error path for exceptions out of team execution
    async fn handle_failure(
        &self,
        task: &Task,
        err: ExecError,
        started: Instant,
        emitter: &EventEmitter,
    ) -> WorkflowResult {
        warn!(task_id = %task.id, error = %err, "task execution failed");

        if self.config.error_recovery {
            if let Some(result) = self.attempt_recovery(task, &err, started, emitter).await {
                return result;
            }
        }

        self.default_failure(task, err, started, emitter).await
    }

    /// Recovery protocol. Returns `None` for ignore/log recommendations
    /// and for internal recovery failures, so the original error falls
    /// through to default handling unmasked.
    async fn attempt_recovery(
        &self,
        task: &Task,
        err: &ExecError,
        started: Instant,
        emitter: &EventEmitter,
    ) -> Option<WorkflowResult> {
        let classification = self.escalator.classify(err);
        debug!(
            task_id = %task.id,
            category = %classification.category,
            retryable = classification.retryable,
            "attempt_recovery: classified"
        );

        let action = match self.escalator.handle_error(task, err).await {
            Ok(action) => action,
            Err(escalator_err) => {
                warn!(task_id = %task.id, error = %escalator_err, "escalator failed, falling back to default handling");
                return None;
            }
        };
        debug!(task_id = %task.id, action = %action, "attempt_recovery: escalator recommendation");

        match action {
            EscalationAction::Retry => Some(self.retry_task(task, err, started, emitter).await),
            EscalationAction::FailTask => {
                Some(self.fail_task(task, err.to_string(), action, started, emitter).await)
            }
            EscalationAction::StopRunner => {
                if let Err(state_err) = self.state.set_status(RunnerStatus::Errored).await {
                    warn!(task_id = %task.id, error = %state_err, "failed to mark runner errored");
                }
                emitter.runner_error(&err.to_string());
                Some(self.fail_task(task, err.to_string(), action, started, emitter).await)
            }
            EscalationAction::Ignore | EscalationAction::Log => None,
        }
    }

    /// Sequential re-attempts of team processing, no inter-attempt delay.
    /// First success wins; exhaustion fails the task with the last
    /// attempt's error.
    async fn retry_task(
        &self,
        task: &Task,
        original_err: &ExecError,
        started: Instant,
        emitter: &EventEmitter,
    ) -> WorkflowResult {
        let mut last_error = original_err.to_string();

        for attempt in 1..=self.config.max_retries {
            emitter.error_retry(attempt, self.config.max_retries);
            debug!(task_id = %task.id, attempt, "retry_task: re-attempting team execution");

            match self.run_team(task).await {
                Ok(output) if output.success => {
                    let result =
                        WorkflowResult::succeeded(task, output.result, elapsed_ms(started));
                    self.finalize_success(task, &result).await;
                    emitter.error_recovered(attempt);
                    info!(task_id = %task.id, attempt, "retry_task: recovered");

                    if self.config.learning {
                        if let Some(learning) = &self.learning {
                            let lesson = format!("retry succeeded after {attempt} attempt(s)");
                            if let Err(err) =
                                learning.learn(&original_err.to_string(), &lesson).await
                            {
                                debug!(task_id = %task.id, error = %err, "learning record failed");
                            }
                        }
                    }
                    return result;
                }
                Ok(output) => {
                    last_error = output
                        .error
                        .unwrap_or_else(|| "team reported failure".to_string());
                }
                Err(err) => {
                    last_error = err.to_string();
                }
            }
        }

        self.fail_task(task, last_error, EscalationAction::FailTask, started, emitter)
            .await
    }

    async fn fail_task(
        &self,
        task: &Task,
        error: String,
        action: EscalationAction,
        started: Instant,
        emitter: &EventEmitter,
    ) -> WorkflowResult {
        emitter.error_escalated(&action.to_string());
        let result = WorkflowResult::failed(task, error, elapsed_ms(started));
        self.record(&result).await;
        emitter.workflow_failed(result.error.as_deref().unwrap_or_default());
        result
    }

    /// Default failure handling when recovery is disabled or declined:
    /// classify, fire error hooks, consult learning, honor a stop-runner
    /// recommendation, and return a failure result.
    async fn default_failure(
        &self,
        task: &Task,
        err: ExecError,
        started: Instant,
        emitter: &EventEmitter,
    ) -> WorkflowResult {
        let classification = self.escalator.classify(&err);
        debug!(
            task_id = %task.id,
            category = %classification.category,
            retryable = classification.retryable,
            "default_failure: classified"
        );

        let opts = ExecuteOptions {
            metadata: serde_json::to_value(&classification).ok(),
            ..Default::default()
        };
        if let Err(hook_err) = self
            .hooks
            .execute_hooks(HookEventKind::TaskError, error_payload(task, &err), opts)
            .await
        {
            warn!(task_id = %task.id, error = %hook_err, "error-hook pipeline failed");
        }

        if let Some(learning) = &self.learning {
            match learning.lookup(&err.to_string()).await {
                Ok(Some(lesson)) => {
                    info!(task_id = %task.id, lesson = %lesson, "learning service has a cached fix")
                }
                Ok(None) => {}
                Err(lookup_err) => {
                    debug!(task_id = %task.id, error = %lookup_err, "learning lookup failed")
                }
            }
        }

        // The stop-runner recommendation still applies without recovery.
        if let Ok(EscalationAction::StopRunner) = self.escalator.handle_error(task, &err).await {
            if let Err(state_err) = self.state.set_status(RunnerStatus::Errored).await {
                warn!(task_id = %task.id, error = %state_err, "failed to mark runner errored");
            }
            emitter.runner_error(&err.to_string());
        }

        let result = WorkflowResult::failed(task, err.to_string(), elapsed_ms(started));
        self.record(&result).await;
        emitter.workflow_failed(result.error.as_deref().unwrap_or_default());
        result
    }

    async fn record(&self, result: &WorkflowResult) {
        if let Err(err) = self.state.record_result(result).await {
            warn!(task_id = %result.task_id, error = %err, "state manager failed to record result");
        }
    }
}

fn elapsed_ms(started: Instant) -> u64 {
    started.elapsed().as_millis() as u64
}

fn task_payload(task: &Task) -> Value {
    serde_json::to_value(task).unwrap_or(Value::Null)
}

fn result_payload(task: &Task, result: &WorkflowResult) -> Value {
    serde_json::json!({
        "task": serde_json::to_value(task).unwrap_or(Value::Null),
        "result": serde_json::to_value(result).unwrap_or(Value::Null),
    })
}

fn error_payload(task: &Task, err: &ExecError) -> Value {
    serde_json::json!({
        "task": serde_json::to_value(task).unwrap_or(Value::Null),
        "error": err.to_string(),
    })
}
