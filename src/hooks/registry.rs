//! Hook registry: lookup of enabled hooks by event kind
//!
//! The engine consumes only the [`HookRegistry`] trait; hook storage and
//! lifecycle belong to the embedding application. [`InMemoryHookRegistry`]
//! is the stock implementation used by tests and simple deployments.

use std::sync::{Arc, RwLock};

use super::context::HookEventKind;
use super::hook::Hook;

/// Lookup interface the engine dispatches through.
///
/// `get_by_event` must return only enabled hooks, ordered by priority
/// (lower first) with registration order breaking ties.
pub trait HookRegistry: Send + Sync {
    /// All enabled hooks for an event kind, in dispatch order
    fn get_by_event(&self, event: HookEventKind) -> Vec<Arc<dyn Hook>>;

    /// Total number of registered hooks (enabled or not)
    fn count(&self) -> usize;
}

struct HookEntry {
    hook: Arc<dyn Hook>,
    priority: u32,
}

/// Simple in-process registry.
///
/// Hooks are sorted by priority at registration time; the sort is stable,
/// so equal priorities keep registration order.
pub struct InMemoryHookRegistry {
    hooks: RwLock<Vec<HookEntry>>,
}

impl InMemoryHookRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self {
            hooks: RwLock::new(Vec::new()),
        }
    }

    /// Register a hook at its own declared priority
    pub fn register(&self, hook: Arc<dyn Hook>) {
        let priority = hook.priority();
        self.register_with_priority(hook, priority);
    }

    /// Register a hook at an explicit priority (lower runs first)
    pub fn register_with_priority(&self, hook: Arc<dyn Hook>, priority: u32) {
        let mut hooks = self.hooks.write().unwrap_or_else(|e| e.into_inner());
        hooks.push(HookEntry { hook, priority });
        hooks.sort_by_key(|e| e.priority);
    }

    /// Remove a hook by name. Returns `true` if it was found and removed.
    pub fn unregister(&self, name: &str) -> bool {
        let mut hooks = self.hooks.write().unwrap_or_else(|e| e.into_inner());
        let before = hooks.len();
        hooks.retain(|e| e.hook.name() != name);
        hooks.len() < before
    }

    /// All registered hook names in dispatch order
    pub fn list(&self) -> Vec<String> {
        let hooks = self.hooks.read().unwrap_or_else(|e| e.into_inner());
        hooks.iter().map(|e| e.hook.name().to_string()).collect()
    }
}

impl Default for InMemoryHookRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl HookRegistry for InMemoryHookRegistry {
    fn get_by_event(&self, event: HookEventKind) -> Vec<Arc<dyn Hook>> {
        let hooks = self.hooks.read().unwrap_or_else(|e| e.into_inner());
        hooks
            .iter()
            .filter(|e| e.hook.event() == event && e.hook.is_enabled())
            .map(|e| e.hook.clone())
            .collect()
    }

    fn count(&self) -> usize {
        self.hooks.read().unwrap_or_else(|e| e.into_inner()).len()
    }
}
