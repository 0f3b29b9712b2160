use adscout_core::{
    EventRecord, PersistenceStore, ResultRecord, RunRecord, RunRecordId, RunStatus, RunUpdate,
    StoreError, Upsert,
};
use async_trait::async_trait;
use chrono::Utc;
use tracing::debug;

use super::rows::{EventRow, ResultRow, RunRow};
use super::SqliteStore;

fn query_failed(action: &str, e: sqlx::Error) -> StoreError {
    StoreError::Database(format!("Failed to {}: {}", action, e))
}

#[async_trait]
impl PersistenceStore for SqliteStore {
    async fn create_run_record(&self, keyword: &str) -> Result<RunRecordId, StoreError> {
        let result = sqlx::query(
            r#"
            INSERT INTO run_records (keyword, started_at, duration_seconds, results_count, status)
            VALUES (?, ?, 0, 0, ?)
            "#,
        )
        .bind(keyword)
        .bind(Utc::now())
        .bind(RunStatus::Running.as_str())
        .execute(&self.pool)
        .await
        .map_err(|e| query_failed("create run record", e))?;

        let id = result.last_insert_rowid();
        debug!(run_id = id, keyword = %keyword, "Run record created");
        Ok(id)
    }

    async fn update_run_record(&self, id: RunRecordId, update: RunUpdate) -> Result<(), StoreError> {
        let result = sqlx::query(
            r#"
            UPDATE run_records SET
                duration_seconds = ?, results_count = ?, status = ?
            WHERE id = ?
            "#,
        )
        .bind(update.duration_seconds)
        .bind(update.results_count)
        .bind(update.status.as_str())
        .bind(id)
        .execute(&self.pool)
        .await
        .map_err(|e| query_failed("update run record", e))?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound(id));
        }
        Ok(())
    }

    async fn upsert_result_record(&self, record: &ResultRecord) -> Result<Upsert, StoreError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| query_failed("begin transaction", e))?;

        let existing: Option<(String,)> =
            sqlx::query_as("SELECT unique_id FROM result_records WHERE unique_id = ?")
                .bind(&record.unique_id)
                .fetch_optional(&mut *tx)
                .await
                .map_err(|e| query_failed("look up result record", e))?;

        let now = Utc::now();
        sqlx::query(
            r#"
            INSERT INTO result_records (
                unique_id, keyword, country, domain, title, body, media_url,
                first_seen_at, last_seen_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT(unique_id) DO UPDATE SET
                keyword = excluded.keyword,
                country = excluded.country,
                domain = excluded.domain,
                title = excluded.title,
                body = excluded.body,
                media_url = excluded.media_url,
                last_seen_at = excluded.last_seen_at
            "#,
        )
        .bind(&record.unique_id)
        .bind(&record.keyword)
        .bind(&record.country)
        .bind(&record.domain)
        .bind(&record.title)
        .bind(&record.body)
        .bind(&record.media_url)
        .bind(now)
        .bind(now)
        .execute(&mut *tx)
        .await
        .map_err(|e| query_failed("upsert result record", e))?;

        tx.commit()
            .await
            .map_err(|e| query_failed("commit result record", e))?;

        Ok(if existing.is_some() {
            Upsert::Updated
        } else {
            Upsert::Inserted
        })
    }

    async fn get_run_record(&self, id: RunRecordId) -> Result<Option<RunRecord>, StoreError> {
        let row: Option<RunRow> = sqlx::query_as("SELECT * FROM run_records WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| query_failed("get run record", e))?;

        row.map(RunRecord::try_from).transpose()
    }

    async fn list_run_records(&self) -> Result<Vec<RunRecord>, StoreError> {
        let rows: Vec<RunRow> = sqlx::query_as("SELECT * FROM run_records ORDER BY id DESC")
            .fetch_all(&self.pool)
            .await
            .map_err(|e| query_failed("list run records", e))?;

        rows.into_iter().map(RunRecord::try_from).collect()
    }

    async fn get_result_record(&self, unique_id: &str) -> Result<Option<ResultRecord>, StoreError> {
        let row: Option<ResultRow> =
            sqlx::query_as("SELECT * FROM result_records WHERE unique_id = ?")
                .bind(unique_id)
                .fetch_optional(&self.pool)
                .await
                .map_err(|e| query_failed("get result record", e))?;

        Ok(row.map(ResultRecord::from))
    }

    async fn list_result_records(&self) -> Result<Vec<ResultRecord>, StoreError> {
        let rows: Vec<ResultRow> =
            sqlx::query_as("SELECT * FROM result_records ORDER BY unique_id ASC")
                .fetch_all(&self.pool)
                .await
                .map_err(|e| query_failed("list result records", e))?;

        Ok(rows.into_iter().map(ResultRecord::from).collect())
    }

    async fn count_result_records(&self) -> Result<usize, StoreError> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM result_records")
            .fetch_one(&self.pool)
            .await
            .map_err(|e| query_failed("count result records", e))?;

        Ok(usize::try_from(count).unwrap_or_default())
    }

    async fn record_event(&self, record: &EventRecord) -> Result<(), StoreError> {
        let payload = serde_json::to_string(&record.payload)?;

        sqlx::query("INSERT INTO events (type, payload_json, created_at) VALUES (?, ?, ?)")
            .bind(&record.kind)
            .bind(payload)
            .bind(record.created_at)
            .execute(&self.pool)
            .await
            .map_err(|e| query_failed("record event", e))?;

        Ok(())
    }

    async fn list_events(&self, limit: usize) -> Result<Vec<EventRecord>, StoreError> {
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);
        let rows: Vec<EventRow> = sqlx::query_as(
            "SELECT type, payload_json, created_at FROM events ORDER BY id DESC LIMIT ?",
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| query_failed("list events", e))?;

        rows.into_iter().map(EventRecord::try_from).collect()
    }
}
