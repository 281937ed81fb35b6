//! Core hook types and the Hook trait

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use super::context::{EventContext, HookEventKind};

/// What a hook wants the engine to do next.
///
/// The set is open: the engine special-cases only [`HookAction::Abort`]
/// (default stop action) and [`HookAction::Modify`] (payload replacement).
/// Everything else passes through to the caller untouched.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum HookAction {
    /// Proceed to the next hook
    Continue,
    /// Replace the payload for subsequent hooks (sequential mode only)
    Modify,
    /// Stop the chain
    Abort,
    /// Ask the caller to retry the surrounding operation
    Retry,
    /// Caller-defined action the engine passes through verbatim
    Custom(String),
}

/// The result of a single hook invocation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HookOutcome {
    /// Always present; drives engine control flow
    pub action: HookAction,
    /// Replacement payload, honored only when `action` is `Modify`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payload: Option<Value>,
    /// Human-readable note (abort reasons, failure descriptions)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// Arbitrary hook-specific metadata
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Value>,
}

impl HookOutcome {
    /// Shorthand for a plain continue outcome
    pub fn ok() -> Self {
        Self {
            action: HookAction::Continue,
            payload: None,
            message: None,
            metadata: None,
        }
    }

    /// Continue with a replacement payload for subsequent hooks
    pub fn modify(payload: Value) -> Self {
        Self {
            action: HookAction::Modify,
            payload: Some(payload),
            message: None,
            metadata: None,
        }
    }

    /// Stop the chain with a reason
    pub fn abort(message: impl Into<String>) -> Self {
        Self {
            action: HookAction::Abort,
            payload: None,
            message: Some(message.into()),
            metadata: None,
        }
    }

    /// Attach a message to any outcome
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }
}

/// Hook execution errors
#[derive(Debug, Error)]
pub enum HookError {
    #[error("hook '{hook}' timed out after {timeout_ms}ms")]
    Timeout { hook: String, timeout_ms: u64 },

    #[error("hook '{hook}' failed: {reason}")]
    Failed { hook: String, reason: String },
}

/// An extension callback bound to one event kind.
///
/// Hooks are owned externally; the engine never constructs or destroys
/// them, it only dispatches. Implementations must be `Send + Sync` since
/// parallel dispatch runs several hooks concurrently against a shared
/// read-only context.
#[async_trait]
pub trait Hook: Send + Sync {
    /// Unique name, used in history records and log lines
    fn name(&self) -> &str;

    /// The single event kind this hook fires on
    fn event(&self) -> HookEventKind;

    /// Dispatch order within an event: lower runs first (default 100)
    fn priority(&self) -> u32 {
        100
    }

    /// Disabled hooks are skipped at registry lookup time
    fn is_enabled(&self) -> bool {
        true
    }

    /// Per-dispatch predicate, checked just before execution.
    ///
    /// Sequential mode evaluates this against the current (possibly
    /// modified) context; parallel mode against the initial context.
    fn should_run(&self, _ctx: &EventContext) -> bool {
        true
    }

    /// Execute against the context, producing one outcome
    async fn execute(&self, ctx: &EventContext) -> Result<HookOutcome, HookError>;
}
