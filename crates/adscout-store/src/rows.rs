//! Row types for database queries

use adscout_core::{EventRecord, ResultRecord, RunRecord, RunRecordId, StoreError};
use chrono::{DateTime, Utc};
use sqlx::FromRow;

#[derive(FromRow)]
pub(super) struct RunRow {
    pub id: RunRecordId,
    pub keyword: String,
    pub started_at: DateTime<Utc>,
    pub duration_seconds: f64,
    pub results_count: i64,
    pub status: String,
}

impl TryFrom<RunRow> for RunRecord {
    type Error = StoreError;

    fn try_from(row: RunRow) -> Result<Self, StoreError> {
        Ok(RunRecord {
            id: row.id,
            keyword: row.keyword,
            started_at: row.started_at,
            duration_seconds: row.duration_seconds,
            results_count: row.results_count,
            status: row.status.parse()?,
        })
    }
}

#[derive(FromRow)]
pub(super) struct ResultRow {
    pub unique_id: String,
    pub keyword: String,
    pub country: String,
    pub domain: String,
    pub title: String,
    pub body: Option<String>,
    pub media_url: Option<String>,
}

impl From<ResultRow> for ResultRecord {
    fn from(row: ResultRow) -> Self {
        ResultRecord {
            unique_id: row.unique_id,
            keyword: row.keyword,
            country: row.country,
            domain: row.domain,
            title: row.title,
            body: row.body,
            media_url: row.media_url,
        }
    }
}

#[derive(FromRow)]
pub(super) struct EventRow {
    #[sqlx(rename = "type")]
    pub kind: String,
    pub payload_json: String,
    pub created_at: DateTime<Utc>,
}

impl TryFrom<EventRow> for EventRecord {
    type Error = StoreError;

    fn try_from(row: EventRow) -> Result<Self, StoreError> {
        Ok(EventRecord {
            kind: row.kind,
            payload: serde_json::from_str(&row.payload_json)?,
            created_at: row.created_at,
        })
    }
}
