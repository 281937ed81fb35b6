//! Advisory pub/sub events for the execution core
//!
//! Lifecycle events stream over a tokio broadcast channel. Consumers
//! subscribe; the executor emits and never waits.

mod bus;
mod types;

pub use bus::{DEFAULT_CHANNEL_CAPACITY, EventBus, EventEmitter, create_event_bus};
pub use types::CoreEvent;
