//! Persistence contract for run and result records
//!
//! The orchestrator writes one run record per keyword attempt and upserts
//! result records keyed by `unique_id`. Storage engines implement
//! [`PersistenceStore`]; [`MemoryStore`] is the in-process implementation.

mod memory;
mod metrics;

pub use memory::MemoryStore;
pub use metrics::{percentile, KeywordMetrics, RunMetrics};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Identifier of a run record.
pub type RunRecordId = i64;

/// Persistence failure.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Engine-level failure
    #[error("database error: {0}")]
    Database(String),
    /// Run record not found
    #[error("run record not found: {0}")]
    NotFound(RunRecordId),
    /// Payload could not be (de)serialized
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Status of a keyword attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    /// Search in progress
    Running,
    /// Results persisted
    Finished,
    /// Search or persistence failed
    Failed,
}

impl RunStatus {
    /// Storage representation.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Running => "running",
            Self::Finished => "finished",
            Self::Failed => "failed",
        }
    }
}

impl std::fmt::Display for RunStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for RunStatus {
    type Err = StoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "running" => Ok(Self::Running),
            "finished" => Ok(Self::Finished),
            "failed" => Ok(Self::Failed),
            other => Err(StoreError::Database(format!("unknown run status: {other}"))),
        }
    }
}

/// One keyword attempt within a batch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunRecord {
    /// Record id
    pub id: RunRecordId,
    /// Keyword searched
    pub keyword: String,
    /// Creation time
    pub started_at: DateTime<Utc>,
    /// Wall time spent on search and persistence
    pub duration_seconds: f64,
    /// Number of upserted results
    pub results_count: i64,
    /// Attempt status
    pub status: RunStatus,
}

/// Final state written to a run record.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RunUpdate {
    /// Elapsed seconds
    pub duration_seconds: f64,
    /// Number of upserted results
    pub results_count: i64,
    /// New status
    pub status: RunStatus,
}

/// A stored search result, identified by `unique_id`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResultRecord {
    /// Idempotency key
    pub unique_id: String,
    /// Keyword that produced the result
    pub keyword: String,
    /// Country code
    pub country: String,
    /// Advertiser domain
    pub domain: String,
    /// Title text
    pub title: String,
    /// Body text
    pub body: Option<String>,
    /// Media URL
    pub media_url: Option<String>,
}

/// Outcome of an upsert.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Upsert {
    /// A new record was created
    Inserted,
    /// An existing record was overwritten
    Updated,
}

/// A persisted bus event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventRecord {
    /// Event type
    #[serde(rename = "type")]
    pub kind: String,
    /// Event payload
    pub payload: Value,
    /// Event timestamp
    pub created_at: DateTime<Utc>,
}

/// Storage used by the job orchestrator.
///
/// Implementations provide their own synchronization; every method may be
/// called concurrently.
#[async_trait]
pub trait PersistenceStore: Send + Sync {
    /// Create a run record with status `running`.
    async fn create_run_record(&self, keyword: &str) -> Result<RunRecordId, StoreError>;

    /// Write the final state of a run record.
    async fn update_run_record(&self, id: RunRecordId, update: RunUpdate) -> Result<(), StoreError>;

    /// Insert or overwrite a result record keyed by `unique_id`.
    async fn upsert_result_record(&self, record: &ResultRecord) -> Result<Upsert, StoreError>;

    /// Fetch a run record.
    async fn get_run_record(&self, id: RunRecordId) -> Result<Option<RunRecord>, StoreError>;

    /// All run records, newest first.
    async fn list_run_records(&self) -> Result<Vec<RunRecord>, StoreError>;

    /// Fetch a result record.
    async fn get_result_record(&self, unique_id: &str) -> Result<Option<ResultRecord>, StoreError>;

    /// All result records ordered by `unique_id`.
    async fn list_result_records(&self) -> Result<Vec<ResultRecord>, StoreError>;

    /// Number of stored result records.
    async fn count_result_records(&self) -> Result<usize, StoreError>;

    /// Append an event to the journal.
    async fn record_event(&self, record: &EventRecord) -> Result<(), StoreError>;

    /// Most recent journal entries, newest first.
    async fn list_events(&self, limit: usize) -> Result<Vec<EventRecord>, StoreError>;
}
