//! EventBus - per-subscriber queue broadcast for intents and job events.
//!
//! External actors publish intents (`intent.start_run`, `intent.stop_run`);
//! the orchestrator publishes lifecycle and progress events (`job.*`). Any
//! number of observers register their own queue and consume it through a
//! [`SubscriptionLoop`].

/// Core event bus implementation (registry and queues).
pub mod bus;
/// Cancellable consumer loop.
pub mod subscription;
/// Event type definitions.
pub mod types;

pub use bus::{EventBus, SubscriberId, Subscription};
pub use subscription::{EventHandler, LoopExit, SubscriptionLoop, DEFAULT_POLL_TIMEOUT};
pub use types::{kinds, Event, Intent, JobEvent, ResultKey};
