//! Event Bus - central pub/sub system for execution events
//!
//! The EventBus uses tokio broadcast channels to deliver events to all
//! subscribers with minimal latency. The executor emits, consumers
//! (loggers, dashboards, metrics) subscribe. Emission is fire-and-forget
//! and never affects execution control flow.

use std::sync::Arc;

use tokio::sync::broadcast;
use tracing::debug;

use super::types::CoreEvent;

/// Default channel capacity (events)
pub const DEFAULT_CHANNEL_CAPACITY: usize = 4_096;

/// Central event bus for execution telemetry
pub struct EventBus {
    tx: broadcast::Sender<CoreEvent>,
}

impl EventBus {
    /// Create a new event bus with the given capacity
    pub fn new(capacity: usize) -> Self {
        debug!(capacity, "EventBus::new: creating event bus");
        let (tx, _) = broadcast::channel(capacity);
        Self { tx }
    }

    /// Create a new event bus with default capacity
    pub fn with_default_capacity() -> Self {
        Self::new(DEFAULT_CHANNEL_CAPACITY)
    }

    /// Emit an event to all subscribers
    ///
    /// Fire-and-forget: with no subscribers the event is dropped; with a
    /// full channel the oldest events are dropped.
    pub fn emit(&self, event: CoreEvent) {
        debug!(
            event_type = event.event_type(),
            task_id = event.task_id(),
            "EventBus::emit"
        );
        // Ignore send errors (no subscribers is OK)
        let _ = self.tx.send(event);
    }

    /// Subscribe to receive events emitted after this call
    pub fn subscribe(&self) -> broadcast::Receiver<CoreEvent> {
        self.tx.subscribe()
    }

    /// Create an emitter handle bound to one task
    pub fn emitter_for(&self, task_id: impl Into<String>) -> EventEmitter {
        EventEmitter {
            tx: self.tx.clone(),
            task_id: task_id.into(),
        }
    }

    /// Number of active subscribers
    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::with_default_capacity()
    }
}

/// Handle for emitting events without owning the bus
///
/// Cheap to clone; carries a pre-set task ID so call sites stay terse.
#[derive(Clone)]
pub struct EventEmitter {
    tx: broadcast::Sender<CoreEvent>,
    task_id: String,
}

impl EventEmitter {
    /// The task ID this emitter is bound to
    pub fn task_id(&self) -> &str {
        &self.task_id
    }

    /// Emit a raw event
    pub fn emit(&self, event: CoreEvent) {
        debug!(event_type = event.event_type(), "EventEmitter::emit");
        let _ = self.tx.send(event);
    }

    /// Emit a workflow started event
    pub fn workflow_started(&self, team: &str) {
        self.emit(CoreEvent::WorkflowStarted {
            task_id: self.task_id.clone(),
            team: team.to_string(),
        });
    }

    /// Emit a workflow completed event
    pub fn workflow_completed(&self, duration_ms: u64) {
        self.emit(CoreEvent::WorkflowCompleted {
            task_id: self.task_id.clone(),
            duration_ms,
        });
    }

    /// Emit a workflow failed event
    pub fn workflow_failed(&self, error: &str) {
        self.emit(CoreEvent::WorkflowFailed {
            task_id: self.task_id.clone(),
            error: error.to_string(),
        });
    }

    /// Emit a retry attempt event
    pub fn error_retry(&self, attempt: u32, max_retries: u32) {
        self.emit(CoreEvent::ErrorRetry {
            task_id: self.task_id.clone(),
            attempt,
            max_retries,
        });
    }

    /// Emit a recovery event
    pub fn error_recovered(&self, attempts: u32) {
        self.emit(CoreEvent::ErrorRecovered {
            task_id: self.task_id.clone(),
            attempts,
        });
    }

    /// Emit an escalation event
    pub fn error_escalated(&self, action: &str) {
        self.emit(CoreEvent::ErrorEscalated {
            task_id: self.task_id.clone(),
            action: action.to_string(),
        });
    }

    /// Emit a runner-level error event
    pub fn runner_error(&self, message: &str) {
        self.emit(CoreEvent::RunnerError {
            task_id: self.task_id.clone(),
            message: message.to_string(),
        });
    }
}

/// Create an event bus wrapped in an Arc for shared ownership
pub fn create_event_bus() -> Arc<EventBus> {
    Arc::new(EventBus::with_default_capacity())
}
