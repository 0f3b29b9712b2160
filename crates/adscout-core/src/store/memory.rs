use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use tracing::debug;

use super::{
    EventRecord, PersistenceStore, ResultRecord, RunRecord, RunRecordId, RunStatus, RunUpdate,
    StoreError, Upsert,
};

#[derive(Debug, Default)]
struct Tables {
    next_run_id: RunRecordId,
    runs: BTreeMap<RunRecordId, RunRecord>,
    results: BTreeMap<String, ResultRecord>,
    events: Vec<EventRecord>,
}

/// In-memory store (for development/testing)
///
/// Data is lost when the process exits.
#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl MemoryStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl PersistenceStore for MemoryStore {
    async fn create_run_record(&self, keyword: &str) -> Result<RunRecordId, StoreError> {
        let mut tables = self.tables.write().await;
        tables.next_run_id += 1;
        let id = tables.next_run_id;
        tables.runs.insert(
            id,
            RunRecord {
                id,
                keyword: keyword.to_string(),
                started_at: Utc::now(),
                duration_seconds: 0.0,
                results_count: 0,
                status: RunStatus::Running,
            },
        );
        debug!(run_id = id, keyword, "Run record created");
        Ok(id)
    }

    async fn update_run_record(&self, id: RunRecordId, update: RunUpdate) -> Result<(), StoreError> {
        let mut tables = self.tables.write().await;
        let run = tables.runs.get_mut(&id).ok_or(StoreError::NotFound(id))?;
        run.duration_seconds = update.duration_seconds;
        run.results_count = update.results_count;
        run.status = update.status;
        Ok(())
    }

    async fn upsert_result_record(&self, record: &ResultRecord) -> Result<Upsert, StoreError> {
        let mut tables = self.tables.write().await;
        let outcome = match tables.results.insert(record.unique_id.clone(), record.clone()) {
            Some(_) => Upsert::Updated,
            None => Upsert::Inserted,
        };
        Ok(outcome)
    }

    async fn get_run_record(&self, id: RunRecordId) -> Result<Option<RunRecord>, StoreError> {
        Ok(self.tables.read().await.runs.get(&id).cloned())
    }

    async fn list_run_records(&self) -> Result<Vec<RunRecord>, StoreError> {
        Ok(self.tables.read().await.runs.values().rev().cloned().collect())
    }

    async fn get_result_record(&self, unique_id: &str) -> Result<Option<ResultRecord>, StoreError> {
        Ok(self.tables.read().await.results.get(unique_id).cloned())
    }

    async fn list_result_records(&self) -> Result<Vec<ResultRecord>, StoreError> {
        Ok(self.tables.read().await.results.values().cloned().collect())
    }

    async fn count_result_records(&self) -> Result<usize, StoreError> {
        Ok(self.tables.read().await.results.len())
    }

    async fn record_event(&self, record: &EventRecord) -> Result<(), StoreError> {
        self.tables.write().await.events.push(record.clone());
        Ok(())
    }

    async fn list_events(&self, limit: usize) -> Result<Vec<EventRecord>, StoreError> {
        let tables = self.tables.read().await;
        Ok(tables.events.iter().rev().take(limit).cloned().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn result(unique_id: &str, title: &str) -> ResultRecord {
        ResultRecord {
            unique_id: unique_id.to_string(),
            keyword: "k1".to_string(),
            country: "US".to_string(),
            domain: "k1.example.com".to_string(),
            title: title.to_string(),
            body: None,
            media_url: None,
        }
    }

    #[tokio::test]
    async fn test_run_record_lifecycle() {
        let store = MemoryStore::new();
        let id = store.create_run_record("k1").await.unwrap();

        let run = store.get_run_record(id).await.unwrap().unwrap();
        assert_eq!(run.status, RunStatus::Running);

        store
            .update_run_record(
                id,
                RunUpdate {
                    duration_seconds: 0.5,
                    results_count: 3,
                    status: RunStatus::Finished,
                },
            )
            .await
            .unwrap();

        let run = store.get_run_record(id).await.unwrap().unwrap();
        assert_eq!(run.status, RunStatus::Finished);
        assert_eq!(run.results_count, 3);
    }

    #[tokio::test]
    async fn test_update_missing_run() {
        let store = MemoryStore::new();
        let update = RunUpdate {
            duration_seconds: 0.0,
            results_count: 0,
            status: RunStatus::Failed,
        };
        assert!(matches!(
            store.update_run_record(42, update).await,
            Err(StoreError::NotFound(42))
        ));
    }

    #[tokio::test]
    async fn test_upsert_overwrites() {
        let store = MemoryStore::new();

        assert_eq!(
            store.upsert_result_record(&result("a", "first")).await.unwrap(),
            Upsert::Inserted
        );
        assert_eq!(
            store.upsert_result_record(&result("a", "second")).await.unwrap(),
            Upsert::Updated
        );

        assert_eq!(store.count_result_records().await.unwrap(), 1);
        let stored = store.get_result_record("a").await.unwrap().unwrap();
        assert_eq!(stored.title, "second");
    }

    #[tokio::test]
    async fn test_list_events_newest_first() {
        let store = MemoryStore::new();
        for kind in ["a", "b", "c"] {
            store
                .record_event(&EventRecord {
                    kind: kind.to_string(),
                    payload: serde_json::json!({}),
                    created_at: Utc::now(),
                })
                .await
                .unwrap();
        }

        let events = store.list_events(2).await.unwrap();
        let kinds: Vec<_> = events.iter().map(|e| e.kind.as_str()).collect();
        assert_eq!(kinds, vec!["c", "b"]);
    }
}
