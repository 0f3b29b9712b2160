//! Adscout Core - Event Bus and Job Orchestration
//!
//! This crate provides the coordination core of adscout:
//! - Event bus: per-subscriber queues, publish never blocks
//! - Subscription loop: cancellable consumer with failure isolation
//! - Job orchestrator: intents become keyword batches with progress events
//! - Queue: batch admission (sequential or bounded concurrent)
//! - Shutdown: graceful drain of in-flight batches
//! - Store: persistence contract, in-memory store and run metrics
//! - Search: search provider contract

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod error;
pub mod event_bus;
pub mod journal;
pub mod orchestrator;
pub mod queue;
pub mod search;
pub mod shutdown;
pub mod store;

pub use error::{format_error_for_cli, Error, Result, UserFriendlyError};
pub use event_bus::{
    kinds, Event, EventBus, EventHandler, Intent, JobEvent, LoopExit, ResultKey, SubscriberId,
    Subscription, SubscriptionLoop,
};
pub use journal::EventJournal;
pub use orchestrator::{JobOrchestrator, OrchestratorConfig};
pub use queue::{BatchPermit, BatchQueue, QueueConfig, QueueMode};
pub use search::{ProviderError, ResultItem, SearchProvider};
pub use shutdown::{ShutdownController, ShutdownPhase, TaskGuard};
pub use store::{
    EventRecord, MemoryStore, PersistenceStore, ResultRecord, RunMetrics, RunRecord, RunRecordId,
    RunStatus, RunUpdate, StoreError, Upsert,
};
