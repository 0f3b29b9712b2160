//! Data CLI commands
//!
//! `adscout init-db`: create the database schema
//! `adscout metrics`: aggregate run statistics
//! `adscout runs`: list recent run records
//! `adscout events`: show the event journal
//! `adscout ads`: list stored results

use adscout_core::{EventRecord, PersistenceStore, ResultRecord, RunMetrics, RunRecord};
use anyhow::Result;

use crate::app::{load_config, open_store};

/// Create (or migrate) the configured database.
pub async fn init_db() -> Result<()> {
    let config = load_config()?;
    let store = open_store(&config).await?;
    store.health_check().await?;
    println!("Database ready at {}", config.database.resolved_path()?.display());
    store.close().await;
    Ok(())
}

pub async fn metrics() -> Result<()> {
    let config = load_config()?;
    let store = open_store(&config).await?;

    let runs = store.list_run_records().await?;
    let results = store.list_result_records().await?;
    let metrics = RunMetrics::from_records(&runs, &results);
    store.close().await;

    println!("Runs:     {} ({} failed)", metrics.total_runs, metrics.failed_runs);
    println!("Results:  {}", metrics.total_results);
    println!(
        "Duration: avg {}  p50 {}  p95 {}",
        format_secs(metrics.avg_duration),
        format_secs(metrics.p50_duration),
        format_secs(metrics.p95_duration)
    );

    if !metrics.per_keyword.is_empty() {
        println!();
        println!("{:<24} {:>6} {:>8} {:>10}", "KEYWORD", "RUNS", "RESULTS", "AVG");
        for (keyword, m) in &metrics.per_keyword {
            println!(
                "{:<24} {:>6} {:>8} {:>10}",
                truncate(keyword, 24),
                m.runs,
                m.results,
                format_secs(m.avg_duration)
            );
        }
    }

    if !metrics.per_domain.is_empty() {
        println!();
        println!("{:<32} {:>8}", "DOMAIN", "RESULTS");
        for (domain, count) in &metrics.per_domain {
            println!("{:<32} {:>8}", truncate(domain, 32), count);
        }
    }
    Ok(())
}

pub async fn runs(limit: usize) -> Result<()> {
    let config = load_config()?;
    let store = open_store(&config).await?;
    let runs = store.list_run_records().await?;
    store.close().await;

    if runs.is_empty() {
        println!("No runs recorded yet.");
        return Ok(());
    }

    println!(
        "{:>6}  {:<24} {:<20} {:>9} {:>8}  STATUS",
        "ID", "KEYWORD", "STARTED", "DURATION", "RESULTS"
    );
    for run in runs.iter().take(limit) {
        println!("{}", format_run(run));
    }
    Ok(())
}

pub async fn events(limit: usize) -> Result<()> {
    let config = load_config()?;
    let store = open_store(&config).await?;
    let events = store.list_events(limit).await?;
    store.close().await;

    if events.is_empty() {
        println!("No events journaled yet.");
        return Ok(());
    }

    // oldest first, like a log
    for event in events.iter().rev() {
        println!("{}", format_event(event));
    }
    Ok(())
}

pub async fn ads(id: Option<String>, domain: Option<String>) -> Result<()> {
    let config = load_config()?;
    let store = open_store(&config).await?;

    let results: Vec<ResultRecord> = match id {
        Some(id) => store.get_result_record(&id).await?.into_iter().collect(),
        None => store.list_result_records().await?,
    };
    store.close().await;

    let results: Vec<_> = results
        .into_iter()
        .filter(|r| domain.as_deref().map_or(true, |d| r.domain == d))
        .collect();

    if results.is_empty() {
        println!("No results found.");
        return Ok(());
    }

    println!("{:<32} {:<24} {:<4} {}", "UNIQUE ID", "DOMAIN", "CC", "TITLE");
    for result in &results {
        println!(
            "{:<32} {:<24} {:<4} {}",
            truncate(&result.unique_id, 32),
            truncate(&result.domain, 24),
            result.country,
            result.title
        );
    }
    Ok(())
}

fn format_event(event: &EventRecord) -> String {
    format!(
        "{}  {:<20} {}",
        event.created_at.format("%Y-%m-%d %H:%M:%S%.3f"),
        event.kind,
        event.payload
    )
}

fn format_run(run: &RunRecord) -> String {
    format!(
        "{:>6}  {:<24} {:<20} {:>9} {:>8}  {}",
        run.id,
        truncate(&run.keyword, 24),
        run.started_at.format("%Y-%m-%d %H:%M:%S"),
        format!("{:.2}s", run.duration_seconds),
        run.results_count,
        run.status
    )
}

fn format_secs(value: Option<f64>) -> String {
    match value {
        Some(secs) => format!("{secs:.2}s"),
        None => "-".to_string(),
    }
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let cut: String = s.chars().take(max.saturating_sub(1)).collect();
        format!("{cut}…")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_secs() {
        assert_eq!(format_secs(Some(1.234)), "1.23s");
        assert_eq!(format_secs(None), "-");
    }

    #[test]
    fn test_format_event() {
        let event = EventRecord {
            kind: "job.progress".to_string(),
            payload: serde_json::json!({ "keyword": "k1" }),
            created_at: chrono::DateTime::from_timestamp(0, 0).unwrap(),
        };
        let line = format_event(&event);
        assert!(line.starts_with("1970-01-01 00:00:00.000"));
        assert!(line.contains("job.progress"));
        assert!(line.contains("\"keyword\":\"k1\""));
    }

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("abcdefghij", 5), "abcd…");
    }
}
