use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use uuid::Uuid;

use crate::error::{Error, Result};

/// Event type names understood or produced by the orchestrator.
pub mod kinds {
    /// Request to start a keyword batch
    pub const INTENT_START_RUN: &str = "intent.start_run";
    /// Request to stop in-flight batches
    pub const INTENT_STOP_RUN: &str = "intent.stop_run";
    /// A batch was accepted
    pub const JOB_STARTED: &str = "job.started";
    /// A keyword is being searched
    pub const JOB_PROGRESS: &str = "job.progress";
    /// A keyword finished and its results were stored
    pub const JOB_KEYWORD_DONE: &str = "job.keyword_done";
    /// A keyword failed
    pub const JOB_ERROR: &str = "job.error";
    /// A batch reached its end
    pub const JOB_FINISHED: &str = "job.finished";
    /// A stop intent was received
    pub const JOB_STOP_REQUESTED: &str = "job.stop_requested";
}

/// An immutable, named message carried by the [`EventBus`](super::EventBus).
///
/// Events have no identity beyond value equality. The payload is free-form
/// JSON whose shape depends on the event type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    #[serde(rename = "type")]
    kind: String,
    payload: Value,
    timestamp: DateTime<Utc>,
}

impl Event {
    /// Create an event stamped with the current time.
    pub fn new(kind: impl Into<String>, payload: Value) -> Self {
        Self::with_timestamp(kind, payload, Utc::now())
    }

    /// Create an event with an explicit timestamp.
    pub fn with_timestamp(kind: impl Into<String>, payload: Value, timestamp: DateTime<Utc>) -> Self {
        Self {
            kind: kind.into(),
            payload,
            timestamp,
        }
    }

    /// Dot-namespaced event type, e.g. `job.progress`.
    pub fn kind(&self) -> &str {
        &self.kind
    }

    /// Event payload.
    pub fn payload(&self) -> &Value {
        &self.payload
    }

    /// Creation time.
    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    /// Read a string field from an object payload.
    pub fn str_field(&self, key: &str) -> Option<&str> {
        self.payload.get(key).and_then(Value::as_str)
    }

    /// Batch id carried by `job.*` events.
    pub fn batch_id(&self) -> Option<Uuid> {
        self.str_field("batch_id").and_then(|s| s.parse().ok())
    }
}

/// Key of a stored result, reported in `job.keyword_done`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResultKey {
    /// Idempotency key of the result record
    pub unique_id: String,
}

/// Lifecycle and progress events produced by the job orchestrator.
#[derive(Debug, Clone, PartialEq)]
pub enum JobEvent {
    /// A batch was accepted and scheduled
    Started {
        /// Batch identifier
        batch_id: Uuid,
        /// Keywords in processing order
        keywords: Vec<String>,
        /// Country code for every search in the batch
        country: String,
    },
    /// A keyword is about to be searched
    Progress {
        /// Batch identifier
        batch_id: Uuid,
        /// Keyword being processed
        keyword: String,
    },
    /// A keyword's results were persisted
    KeywordDone {
        /// Batch identifier
        batch_id: Uuid,
        /// Keyword that completed
        keyword: String,
        /// Number of upserted results
        count: usize,
        /// Keys of the upserted results
        results: Vec<ResultKey>,
    },
    /// A keyword failed; the batch continues
    Error {
        /// Batch identifier
        batch_id: Uuid,
        /// Keyword that failed
        keyword: String,
        /// Human-readable failure message
        error: String,
    },
    /// The batch ended, whether completed or cut short
    Finished {
        /// Batch identifier
        batch_id: Uuid,
        /// Keywords originally submitted
        keywords: Vec<String>,
    },
    /// A stop intent was received
    StopRequested,
}

impl JobEvent {
    /// Event type name for this variant.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Started { .. } => kinds::JOB_STARTED,
            Self::Progress { .. } => kinds::JOB_PROGRESS,
            Self::KeywordDone { .. } => kinds::JOB_KEYWORD_DONE,
            Self::Error { .. } => kinds::JOB_ERROR,
            Self::Finished { .. } => kinds::JOB_FINISHED,
            Self::StopRequested => kinds::JOB_STOP_REQUESTED,
        }
    }

    fn payload(&self) -> Value {
        match self {
            Self::Started {
                batch_id,
                keywords,
                country,
            } => json!({ "batch_id": batch_id, "keywords": keywords, "country": country }),
            Self::Progress { batch_id, keyword } => {
                json!({ "batch_id": batch_id, "keyword": keyword, "status": "searching" })
            }
            Self::KeywordDone {
                batch_id,
                keyword,
                count,
                results,
            } => json!({
                "batch_id": batch_id,
                "keyword": keyword,
                "count": count,
                "results": results,
            }),
            Self::Error {
                batch_id,
                keyword,
                error,
            } => json!({ "batch_id": batch_id, "keyword": keyword, "error": error }),
            Self::Finished { batch_id, keywords } => {
                json!({ "batch_id": batch_id, "keywords": keywords })
            }
            Self::StopRequested => json!({}),
        }
    }
}

impl From<JobEvent> for Event {
    fn from(event: JobEvent) -> Self {
        Event::new(event.kind(), event.payload())
    }
}

#[derive(Debug, Default, Deserialize)]
struct StartRunPayload {
    #[serde(default)]
    keywords: Vec<String>,
    #[serde(default)]
    country: Option<String>,
}

/// A requested action consumed by the orchestrator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Intent {
    /// Start a keyword batch
    StartRun {
        /// Keywords in processing order, duplicates preserved
        keywords: Vec<String>,
        /// Country code; the orchestrator default applies when absent
        country: Option<String>,
    },
    /// Stop in-flight batches at the next keyword boundary
    StopRun,
}

impl Intent {
    /// Interpret an event as an intent.
    ///
    /// Returns `Ok(None)` for events that are not intents.
    pub fn parse(event: &Event) -> Result<Option<Self>> {
        match event.kind() {
            kinds::INTENT_START_RUN => {
                let payload = match event.payload() {
                    Value::Null => StartRunPayload::default(),
                    other => serde_json::from_value(other.clone())
                        .map_err(|e| Error::InvalidIntent(e.to_string()))?,
                };
                Ok(Some(Self::StartRun {
                    keywords: payload.keywords,
                    country: payload.country,
                }))
            }
            kinds::INTENT_STOP_RUN => Ok(Some(Self::StopRun)),
            _ => Ok(None),
        }
    }
}

impl From<Intent> for Event {
    fn from(intent: Intent) -> Self {
        match intent {
            Intent::StartRun { keywords, country } => {
                let mut payload = json!({ "keywords": keywords });
                if let Some(country) = country {
                    payload["country"] = Value::String(country);
                }
                Event::new(kinds::INTENT_START_RUN, payload)
            }
            Intent::StopRun => Event::new(kinds::INTENT_STOP_RUN, json!({})),
        }
    }
}
