use adscout_core::StoreError;
use tracing::debug;

use super::SqliteStore;

fn migration_failed(step: &str, e: sqlx::Error) -> StoreError {
    StoreError::Database(format!("Migration failed ({}): {}", step, e))
}

impl SqliteStore {
    /// Create tables and indexes if they do not exist yet
    pub(super) async fn migrate(&self) -> Result<(), StoreError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| StoreError::Database(e.to_string()))?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS run_records (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                keyword TEXT NOT NULL,
                started_at TIMESTAMP NOT NULL,
                duration_seconds REAL NOT NULL DEFAULT 0,
                results_count INTEGER NOT NULL DEFAULT 0,
                status TEXT NOT NULL DEFAULT 'running'
            )
            "#,
        )
        .execute(&mut *tx)
        .await
        .map_err(|e| migration_failed("run_records", e))?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS result_records (
                unique_id TEXT PRIMARY KEY,
                keyword TEXT NOT NULL,
                country TEXT NOT NULL,
                domain TEXT NOT NULL,
                title TEXT NOT NULL,
                body TEXT,
                media_url TEXT,
                first_seen_at TIMESTAMP NOT NULL,
                last_seen_at TIMESTAMP NOT NULL
            )
            "#,
        )
        .execute(&mut *tx)
        .await
        .map_err(|e| migration_failed("result_records", e))?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS events (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                type TEXT NOT NULL,
                payload_json TEXT NOT NULL,
                created_at TIMESTAMP NOT NULL
            )
            "#,
        )
        .execute(&mut *tx)
        .await
        .map_err(|e| migration_failed("events", e))?;

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_runs_keyword ON run_records(keyword)")
            .execute(&mut *tx)
            .await
            .map_err(|e| migration_failed("idx_runs_keyword", e))?;

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_results_domain ON result_records(domain)")
            .execute(&mut *tx)
            .await
            .map_err(|e| migration_failed("idx_results_domain", e))?;

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_events_type ON events(type)")
            .execute(&mut *tx)
            .await
            .map_err(|e| migration_failed("idx_events_type", e))?;

        tx.commit()
            .await
            .map_err(|e| StoreError::Database(e.to_string()))?;

        debug!("SQLite schema initialized");
        Ok(())
    }
}
