//! Job orchestrator
//!
//! Owns the intent-to-job state machine. A start intent becomes a batch:
//! `job.started`, then per keyword `job.progress` followed by
//! `job.keyword_done` or `job.error`, then exactly one `job.finished`.
//!
//! # Module Structure
//!
//! - `config`: `OrchestratorConfig`
//! - `core`: `JobOrchestrator` handle, public operations, intent listener
//! - `batch`: per-batch keyword loop with failure isolation

mod batch;
mod config;
mod core;


pub use config::OrchestratorConfig;
pub use core::JobOrchestrator;
