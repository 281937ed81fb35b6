//! Event kinds and the per-dispatch context envelope

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::hook::HookOutcome;

/// Points in the task lifecycle where hooks can be attached
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum HookEventKind {
    /// Before team execution; an abort outcome here blocks the task
    TaskBefore,
    /// After successful team execution
    TaskAfter,
    /// After a task entered the error path
    TaskError,
}

impl std::fmt::Display for HookEventKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            HookEventKind::TaskBefore => "task-before",
            HookEventKind::TaskAfter => "task-after",
            HookEventKind::TaskError => "task-error",
        };
        f.write_str(s)
    }
}

/// Per-invocation envelope passed to every hook.
///
/// Built fresh for each `execute_hooks` call. A modify outcome derives a
/// *new* context via [`EventContext::with_payload`]; the original is never
/// mutated, so earlier hooks (and concurrent parallel branches) never
/// observe later changes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventContext {
    /// The event kind being dispatched
    pub event: HookEventKind,
    /// When this context was built
    pub timestamp: DateTime<Utc>,
    /// Opaque payload the caller attached to the dispatch
    pub payload: Value,
    /// Caller-supplied metadata (classification info, trace ids, ...)
    pub metadata: Value,
    /// Outcomes of hooks that already ran in this sequential chain
    pub previous_results: Vec<HookOutcome>,
}

impl EventContext {
    /// Build a fresh context for one dispatch
    pub fn new(event: HookEventKind, payload: Value, metadata: Value) -> Self {
        Self {
            event,
            timestamp: Utc::now(),
            payload,
            metadata,
            previous_results: Vec::new(),
        }
    }

    /// Derive a new context with a replacement payload.
    ///
    /// Used after a modify outcome: subsequent hooks see the new payload
    /// plus the outcomes collected so far, while every earlier context
    /// value stays untouched.
    pub fn with_payload(&self, payload: Value, previous_results: Vec<HookOutcome>) -> Self {
        Self {
            event: self.event,
            timestamp: self.timestamp,
            payload,
            metadata: self.metadata.clone(),
            previous_results,
        }
    }
}
