//! Hook execution engine
//!
//! Dispatches registered hooks against an event context, sequentially or
//! in parallel, races every dispatch against a timeout, and keeps a
//! bounded history of execution records.

use std::collections::VecDeque;
use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::sync::Mutex;
use tracing::{debug, warn};
use uuid::Uuid;

use super::context::{EventContext, HookEventKind};
use super::hook::{Hook, HookAction, HookError, HookOutcome};
use super::registry::HookRegistry;

/// Default timeout for a single hook dispatch
pub const DEFAULT_HOOK_TIMEOUT_MS: u64 = 5_000;

/// Default cap on retained execution records
pub const DEFAULT_MAX_HISTORY: usize = 500;

/// Per-call dispatch options
#[derive(Debug, Clone)]
pub struct ExecuteOptions {
    /// Run all eligible hooks concurrently instead of in order
    pub parallel: bool,
    /// Per-dispatch timeout override; engine default when `None`
    pub timeout: Option<Duration>,
    /// Propagate hook errors/timeouts instead of substituting a
    /// synthesized continue outcome
    pub stop_on_error: bool,
    /// Actions that end a sequential chain early
    pub stop_on_action: Vec<HookAction>,
    /// Metadata attached to the event context
    pub metadata: Option<Value>,
}

impl Default for ExecuteOptions {
    fn default() -> Self {
        Self {
            parallel: false,
            timeout: None,
            stop_on_error: false,
            stop_on_action: vec![HookAction::Abort],
            metadata: None,
        }
    }
}

/// One entry of hook execution history
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionRecord {
    /// Unique record id
    pub id: String,
    /// Name of the dispatched hook
    pub hook_name: String,
    /// Event kind that was dispatched
    pub event: HookEventKind,
    /// Snapshot of the context the hook saw
    pub context: EventContext,
    /// The produced outcome, absent when the dispatch errored
    pub outcome: Option<HookOutcome>,
    /// Error description for failed or timed-out dispatches
    pub error: Option<String>,
    /// When the dispatch finished
    pub timestamp: DateTime<Utc>,
    /// End-to-end dispatch duration, timeout overhead included
    pub duration_ms: u64,
}

/// Engine configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HookEngineConfig {
    /// Default per-dispatch timeout in milliseconds
    pub timeout_ms: u64,
    /// Cap on retained execution records (FIFO eviction past it)
    pub max_history: usize,
}

impl Default for HookEngineConfig {
    fn default() -> Self {
        Self {
            timeout_ms: DEFAULT_HOOK_TIMEOUT_MS,
            max_history: DEFAULT_MAX_HISTORY,
        }
    }
}

/// Runs ordered or concurrent sets of hooks against an event context.
///
/// The engine owns no hooks; it looks them up through a [`HookRegistry`]
/// per dispatch. Shared mutable state is limited to the bounded history,
/// guarded by a mutex so the engine can be shared across tasks.
pub struct HookEngine {
    registry: Arc<dyn HookRegistry>,
    history: Mutex<VecDeque<ExecutionRecord>>,
    config: HookEngineConfig,
}

impl HookEngine {
    /// Create an engine with default configuration
    pub fn new(registry: Arc<dyn HookRegistry>) -> Self {
        Self::with_config(registry, HookEngineConfig::default())
    }

    /// Create an engine with explicit configuration
    pub fn with_config(registry: Arc<dyn HookRegistry>, config: HookEngineConfig) -> Self {
        debug!(
            timeout_ms = config.timeout_ms,
            max_history = config.max_history,
            "HookEngine::with_config: creating engine"
        );
        Self {
            registry,
            history: Mutex::new(VecDeque::new()),
            config,
        }
    }

    fn timeout_for(&self, opts: &ExecuteOptions) -> Duration {
        opts.timeout
            .unwrap_or(Duration::from_millis(self.config.timeout_ms))
    }

    /// Execute all enabled hooks for `event` and collect their outcomes.
    ///
    /// Returns an empty list (not an error) when nothing is registered for
    /// the event; history stays untouched in that case.
    ///
    /// Sequential mode (default) runs hooks one at a time in registration
    /// order, stops after any action in `stop_on_action`, and threads
    /// modify payloads into the next hook's context. Parallel mode runs
    /// every eligible hook concurrently against the initial context and
    /// returns outcomes in registration order regardless of completion
    /// order.
    pub async fn execute_hooks(
        &self,
        event: HookEventKind,
        payload: Value,
        opts: ExecuteOptions,
    ) -> Result<Vec<HookOutcome>, HookError> {
        let hooks = self.registry.get_by_event(event);
        if hooks.is_empty() {
            debug!(%event, "execute_hooks: no hooks registered");
            return Ok(Vec::new());
        }

        let ctx = EventContext::new(event, payload, opts.metadata.clone().unwrap_or(Value::Null));

        if opts.parallel {
            self.execute_parallel(hooks, ctx, &opts).await
        } else {
            self.execute_sequential(hooks, ctx, &opts).await
        }
    }

    async fn execute_sequential(
        &self,
        hooks: Vec<Arc<dyn Hook>>,
        mut ctx: EventContext,
        opts: &ExecuteOptions,
    ) -> Result<Vec<HookOutcome>, HookError> {
        let timeout = self.timeout_for(opts);
        let mut outcomes: Vec<HookOutcome> = Vec::with_capacity(hooks.len());

        for hook in &hooks {
            // Filtered against the current (possibly modified) context,
            // immediately before dispatch.
            if !hook.should_run(&ctx) {
                debug!(hook = hook.name(), "execute_sequential: should_run declined");
                continue;
            }

            let outcome = match self.dispatch(hook, &ctx, timeout).await {
                Ok(outcome) => outcome,
                Err(err) => {
                    if opts.stop_on_error {
                        return Err(err);
                    }
                    warn!(hook = hook.name(), error = %err, "hook failed, substituting continue outcome");
                    synthesized_failure(&err)
                }
            };

            let stop = opts.stop_on_action.contains(&outcome.action);
            let replacement = match (&outcome.action, &outcome.payload) {
                (HookAction::Modify, Some(payload)) => Some(payload.clone()),
                _ => None,
            };

            outcomes.push(outcome);

            if stop {
                debug!(hook = hook.name(), "execute_sequential: stop action reached");
                break;
            }
            if let Some(payload) = replacement {
                ctx = ctx.with_payload(payload, outcomes.clone());
            }
        }

        Ok(outcomes)
    }

    async fn execute_parallel(
        &self,
        hooks: Vec<Arc<dyn Hook>>,
        ctx: EventContext,
        opts: &ExecuteOptions,
    ) -> Result<Vec<HookOutcome>, HookError> {
        let timeout = self.timeout_for(opts);

        // Eligibility is decided against the initial context; parallel
        // branches never merge, so there is no payload propagation.
        let eligible: Vec<Arc<dyn Hook>> = hooks
            .into_iter()
            .filter(|hook| hook.should_run(&ctx))
            .collect();

        let dispatches = eligible.iter().map(|hook| self.dispatch(hook, &ctx, timeout));
        let results = futures::future::join_all(dispatches).await;

        // join_all preserves input order, so outcomes land in
        // registration order independent of completion order.
        let mut outcomes = Vec::with_capacity(results.len());
        for (hook, result) in eligible.iter().zip(results) {
            match result {
                Ok(outcome) => outcomes.push(outcome),
                Err(err) => {
                    if opts.stop_on_error {
                        return Err(err);
                    }
                    warn!(hook = hook.name(), error = %err, "hook failed, substituting continue outcome");
                    outcomes.push(synthesized_failure(&err));
                }
            }
        }

        Ok(outcomes)
    }

    /// Execute hooks for `event`, then left-fold the outcomes.
    ///
    /// The accumulator is seeded with `None`; the reducer sees each
    /// outcome with its index in dispatch order.
    pub async fn execute_and_reduce<T, F>(
        &self,
        event: HookEventKind,
        payload: Value,
        opts: ExecuteOptions,
        mut reducer: F,
    ) -> Result<Option<T>, HookError>
    where
        F: FnMut(Option<T>, &HookOutcome, usize) -> Option<T>,
    {
        let outcomes = self.execute_hooks(event, payload, opts).await?;
        let mut acc = None;
        for (index, outcome) in outcomes.iter().enumerate() {
            acc = reducer(acc, outcome, index);
        }
        Ok(acc)
    }

    /// Execute hooks sequentially until one returns the target action.
    ///
    /// Always sequential, regardless of `opts.parallel`. Hook errors are
    /// swallowed and the chain continues unless `stop_on_error` is set.
    pub async fn execute_until_action(
        &self,
        event: HookEventKind,
        payload: Value,
        action: HookAction,
        opts: ExecuteOptions,
    ) -> Result<Option<HookOutcome>, HookError> {
        let hooks = self.registry.get_by_event(event);
        if hooks.is_empty() {
            return Ok(None);
        }

        let timeout = self.timeout_for(&opts);
        let mut ctx = EventContext::new(event, payload, opts.metadata.clone().unwrap_or(Value::Null));
        let mut collected: Vec<HookOutcome> = Vec::new();

        for hook in &hooks {
            if !hook.should_run(&ctx) {
                continue;
            }

            match self.dispatch(hook, &ctx, timeout).await {
                Ok(outcome) => {
                    if outcome.action == action {
                        debug!(hook = hook.name(), "execute_until_action: match");
                        return Ok(Some(outcome));
                    }
                    let replacement = match (&outcome.action, &outcome.payload) {
                        (HookAction::Modify, Some(payload)) => Some(payload.clone()),
                        _ => None,
                    };
                    collected.push(outcome);
                    if let Some(payload) = replacement {
                        ctx = ctx.with_payload(payload, collected.clone());
                    }
                }
                Err(err) => {
                    if opts.stop_on_error {
                        return Err(err);
                    }
                    warn!(hook = hook.name(), error = %err, "hook failed, continuing scan");
                }
            }
        }

        Ok(None)
    }

    /// Dispatch one hook, racing it against the timeout, and append an
    /// execution record whatever the result.
    async fn dispatch(
        &self,
        hook: &Arc<dyn Hook>,
        ctx: &EventContext,
        timeout: Duration,
    ) -> Result<HookOutcome, HookError> {
        let started = Instant::now();
        let raced = tokio::time::timeout(timeout, hook.execute(ctx)).await;
        let duration_ms = started.elapsed().as_millis() as u64;

        let result = match raced {
            Ok(inner) => inner,
            // The in-flight future is dropped here; there is no forced
            // cancellation of whatever work it delegated to.
            Err(_elapsed) => Err(HookError::Timeout {
                hook: hook.name().to_string(),
                timeout_ms: timeout.as_millis() as u64,
            }),
        };

        self.record(hook.name(), ctx, &result, duration_ms).await;
        result
    }

    async fn record(
        &self,
        hook_name: &str,
        ctx: &EventContext,
        result: &Result<HookOutcome, HookError>,
        duration_ms: u64,
    ) {
        let record = ExecutionRecord {
            id: Uuid::now_v7().to_string(),
            hook_name: hook_name.to_string(),
            event: ctx.event,
            context: ctx.clone(),
            outcome: result.as_ref().ok().cloned(),
            error: result.as_ref().err().map(|e| e.to_string()),
            timestamp: Utc::now(),
            duration_ms,
        };

        let mut history = self.history.lock().await;
        history.push_back(record);
        while history.len() > self.config.max_history {
            history.pop_front();
        }
    }

    /// Retained execution records, most recent first
    pub async fn history(&self, limit: Option<usize>) -> Vec<ExecutionRecord> {
        let history = self.history.lock().await;
        let take = limit.unwrap_or(history.len());
        history.iter().rev().take(take).cloned().collect()
    }

    /// Drop all retained execution records
    pub async fn clear_history(&self) {
        self.history.lock().await.clear();
    }
}

fn synthesized_failure(err: &HookError) -> HookOutcome {
    HookOutcome::ok().with_message(format!("Hook execution failed: {err}"))
}
