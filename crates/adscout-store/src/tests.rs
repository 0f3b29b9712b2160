use super::*;
use adscout_core::{
    EventRecord, PersistenceStore, ResultRecord, RunMetrics, RunStatus, RunUpdate, StoreError,
    Upsert,
};
use chrono::Utc;
use serde_json::json;
use tempfile::TempDir;

struct TestContext {
    store: SqliteStore,
    _dir: TempDir,
}

async fn create_test_context() -> TestContext {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("test_adscout.db");
    let store = SqliteStore::from_path(&path).await.unwrap();
    TestContext { store, _dir: dir }
}

fn result(unique_id: &str, keyword: &str, title: &str) -> ResultRecord {
    ResultRecord {
        unique_id: unique_id.to_string(),
        keyword: keyword.to_string(),
        country: "US".to_string(),
        domain: format!("{keyword}.example.com"),
        title: title.to_string(),
        body: Some("body".to_string()),
        media_url: None,
    }
}

#[tokio::test]
async fn test_run_record_lifecycle() {
    let ctx = create_test_context().await;
    let store = &ctx.store;

    let id = store.create_run_record("k1").await.unwrap();
    let run = store.get_run_record(id).await.unwrap().unwrap();
    assert_eq!(run.keyword, "k1");
    assert_eq!(run.status, RunStatus::Running);
    assert_eq!(run.results_count, 0);

    store
        .update_run_record(
            id,
            RunUpdate {
                duration_seconds: 1.25,
                results_count: 4,
                status: RunStatus::Finished,
            },
        )
        .await
        .unwrap();

    let run = store.get_run_record(id).await.unwrap().unwrap();
    assert_eq!(run.status, RunStatus::Finished);
    assert_eq!(run.results_count, 4);
    assert!((run.duration_seconds - 1.25).abs() < f64::EPSILON);
}

#[tokio::test]
async fn test_update_missing_run_record() {
    let ctx = create_test_context().await;
    let update = RunUpdate {
        duration_seconds: 0.0,
        results_count: 0,
        status: RunStatus::Failed,
    };

    let err = ctx.store.update_run_record(42, update).await.unwrap_err();
    assert!(matches!(err, StoreError::NotFound(42)));
    assert!(ctx.store.get_run_record(42).await.unwrap().is_none());
}

#[tokio::test]
async fn test_list_run_records_newest_first() {
    let ctx = create_test_context().await;
    let store = &ctx.store;

    let first = store.create_run_record("k1").await.unwrap();
    let second = store.create_run_record("k1").await.unwrap();
    assert_ne!(first, second);

    let runs = store.list_run_records().await.unwrap();
    let ids: Vec<_> = runs.iter().map(|r| r.id).collect();
    assert_eq!(ids, vec![second, first]);
}

#[tokio::test]
async fn test_upsert_is_idempotent() {
    let ctx = create_test_context().await;
    let store = &ctx.store;

    let outcome = store
        .upsert_result_record(&result("k1:US:1", "k1", "first"))
        .await
        .unwrap();
    assert_eq!(outcome, Upsert::Inserted);

    let outcome = store
        .upsert_result_record(&result("k1:US:1", "k1", "second"))
        .await
        .unwrap();
    assert_eq!(outcome, Upsert::Updated);

    assert_eq!(store.count_result_records().await.unwrap(), 1);
    let stored = store.get_result_record("k1:US:1").await.unwrap().unwrap();
    assert_eq!(stored.title, "second");
    assert_eq!(stored.body.as_deref(), Some("body"));
}

#[tokio::test]
async fn test_list_result_records_ordered() {
    let ctx = create_test_context().await;
    let store = &ctx.store;

    store.upsert_result_record(&result("b", "k2", "t")).await.unwrap();
    store.upsert_result_record(&result("a", "k1", "t")).await.unwrap();

    let ids: Vec<_> = store
        .list_result_records()
        .await
        .unwrap()
        .into_iter()
        .map(|r| r.unique_id)
        .collect();
    assert_eq!(ids, vec!["a".to_string(), "b".to_string()]);
}

#[tokio::test]
async fn test_event_journal() {
    let ctx = create_test_context().await;
    let store = &ctx.store;

    for n in 0..3 {
        store
            .record_event(&EventRecord {
                kind: "job.progress".to_string(),
                payload: json!({ "keyword": format!("k{n}"), "status": "searching" }),
                created_at: Utc::now(),
            })
            .await
            .unwrap();
    }

    let events = store.list_events(2).await.unwrap();
    assert_eq!(events.len(), 2);
    assert_eq!(events[0].payload["keyword"], "k2");
    assert_eq!(events[1].payload["keyword"], "k1");
    assert_eq!(events[0].kind, "job.progress");
}

#[tokio::test]
async fn test_data_survives_reopen() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("nested").join("adscout.db");

    {
        let store = SqliteStore::from_path(&path).await.unwrap();
        store.create_run_record("k1").await.unwrap();
        store.upsert_result_record(&result("k1:US:1", "k1", "t")).await.unwrap();
        store.close().await;
    }

    let store = SqliteStore::from_path(&path).await.unwrap();
    assert!(store.health_check().await.unwrap());
    assert_eq!(store.list_run_records().await.unwrap().len(), 1);
    assert_eq!(store.count_result_records().await.unwrap(), 1);
}

#[tokio::test]
async fn test_metrics_from_stored_records() {
    let ctx = create_test_context().await;
    let store = &ctx.store;

    for (keyword, secs) in [("k1", 1.0), ("k2", 3.0)] {
        let id = store.create_run_record(keyword).await.unwrap();
        store
            .update_run_record(
                id,
                RunUpdate {
                    duration_seconds: secs,
                    results_count: 1,
                    status: RunStatus::Finished,
                },
            )
            .await
            .unwrap();
        store
            .upsert_result_record(&result(&format!("{keyword}:US:1"), keyword, "t"))
            .await
            .unwrap();
    }

    let runs = store.list_run_records().await.unwrap();
    let results = store.list_result_records().await.unwrap();
    let metrics = RunMetrics::from_records(&runs, &results);

    assert_eq!(metrics.total_runs, 2);
    assert_eq!(metrics.total_results, 2);
    assert_eq!(metrics.avg_duration, Some(2.0));
}

#[test]
fn test_default_path() {
    if let Ok(path) = SqliteStore::default_path() {
        assert!(path.ends_with(".adscout/adscout.db"));
    }
}
