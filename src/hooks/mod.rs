//! Hook execution engine
//!
//! Hooks are event-scoped extension callbacks: pre-execution gates,
//! post-execution validators, error-triggered learners. The engine looks
//! them up by event kind, dispatches sequentially or in parallel with a
//! per-dispatch timeout, and keeps a bounded execution history.

mod context;
mod engine;
mod hook;
mod registry;

pub use context::{EventContext, HookEventKind};
pub use engine::{
    DEFAULT_HOOK_TIMEOUT_MS, DEFAULT_MAX_HISTORY, ExecuteOptions, ExecutionRecord, HookEngine,
    HookEngineConfig,
};
pub use hook::{Hook, HookAction, HookError, HookOutcome};
pub use registry::{HookRegistry, InMemoryHookRegistry};
