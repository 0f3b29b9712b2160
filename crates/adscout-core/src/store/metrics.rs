//! Run metrics
//!
//! Aggregates over stored run and result records: totals, duration
//! percentiles and a per-keyword breakdown.

use std::collections::BTreeMap;

use serde::Serialize;

use super::{ResultRecord, RunRecord, RunStatus};

/// Per-keyword aggregate.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct KeywordMetrics {
    /// Number of run records
    pub runs: usize,
    /// Number of stored results
    pub results: usize,
    /// Mean duration of completed runs
    pub avg_duration: Option<f64>,
}

/// Summary over all stored runs and results.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RunMetrics {
    /// Number of stored results
    pub total_results: usize,
    /// Number of run records
    pub total_runs: usize,
    /// Number of failed runs
    pub failed_runs: usize,
    /// Mean duration of completed runs
    pub avg_duration: Option<f64>,
    /// Median duration
    pub p50_duration: Option<f64>,
    /// 95th percentile duration
    pub p95_duration: Option<f64>,
    /// Breakdown by keyword
    pub per_keyword: BTreeMap<String, KeywordMetrics>,
    /// Result count by domain
    pub per_domain: BTreeMap<String, usize>,
}

impl RunMetrics {
    /// Aggregate the given records.
    ///
    /// Durations of runs still `running` are not counted.
    #[must_use]
    pub fn from_records(runs: &[RunRecord], results: &[ResultRecord]) -> Self {
        let mut durations: Vec<f64> = runs
            .iter()
            .filter(|r| r.status != RunStatus::Running)
            .map(|r| r.duration_seconds)
            .collect();
        durations.sort_by(f64::total_cmp);

        let mut per_keyword: BTreeMap<String, KeywordMetrics> = BTreeMap::new();
        let mut keyword_durations: BTreeMap<&str, Vec<f64>> = BTreeMap::new();
        for run in runs {
            per_keyword.entry(run.keyword.clone()).or_default().runs += 1;
            if run.status != RunStatus::Running {
                keyword_durations
                    .entry(run.keyword.as_str())
                    .or_default()
                    .push(run.duration_seconds);
            }
        }
        for (keyword, values) in keyword_durations {
            if let Some(entry) = per_keyword.get_mut(keyword) {
                entry.avg_duration = mean(&values);
            }
        }

        let mut per_domain: BTreeMap<String, usize> = BTreeMap::new();
        for result in results {
            per_keyword.entry(result.keyword.clone()).or_default().results += 1;
            *per_domain.entry(result.domain.clone()).or_default() += 1;
        }

        Self {
            total_results: results.len(),
            total_runs: runs.len(),
            failed_runs: runs.iter().filter(|r| r.status == RunStatus::Failed).count(),
            avg_duration: mean(&durations),
            p50_duration: percentile(&durations, 0.5),
            p95_duration: percentile(&durations, 0.95),
            per_keyword,
            per_domain,
        }
    }
}

fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

/// Linear-interpolated percentile of an ascending slice; `q` in `0.0..=1.0`.
#[must_use]
pub fn percentile(sorted: &[f64], q: f64) -> Option<f64> {
    if sorted.is_empty() {
        return None;
    }
    let idx = (sorted.len() - 1) as f64 * q.clamp(0.0, 1.0);
    let lo = idx.floor() as usize;
    let hi = (lo + 1).min(sorted.len() - 1);
    if lo == hi {
        return Some(sorted[lo]);
    }
    Some(sorted[lo] * (hi as f64 - idx) + sorted[hi] * (idx - lo as f64))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn run(keyword: &str, duration: f64, status: RunStatus) -> RunRecord {
        RunRecord {
            id: 0,
            keyword: keyword.to_string(),
            started_at: Utc::now(),
            duration_seconds: duration,
            results_count: 0,
            status,
        }
    }

    #[test]
    fn test_empty_metrics() {
        let metrics = RunMetrics::from_records(&[], &[]);
        assert_eq!(metrics.total_runs, 0);
        assert_eq!(metrics.total_results, 0);
        assert_eq!(metrics.avg_duration, None);
        assert_eq!(metrics.p50_duration, None);
    }

    #[test]
    fn test_single_run() {
        let metrics = RunMetrics::from_records(&[run("k1", 1.23, RunStatus::Finished)], &[]);
        assert_eq!(metrics.total_runs, 1);
        assert!((metrics.avg_duration.unwrap() - 1.23).abs() < 1e-9);
        assert_eq!(metrics.p50_duration, metrics.p95_duration);
    }

    #[test]
    fn test_multiple_runs() {
        let runs = vec![
            run("k1", 1.0, RunStatus::Finished),
            run("k2", 2.0, RunStatus::Finished),
            run("k3", 3.0, RunStatus::Finished),
            run("k3", 0.0, RunStatus::Running),
        ];
        let metrics = RunMetrics::from_records(&runs, &[]);

        assert_eq!(metrics.total_runs, 4);
        assert!((metrics.avg_duration.unwrap() - 2.0).abs() < 1e-9);
        assert!((metrics.p50_duration.unwrap() - 2.0).abs() < 1e-9);
        assert!(metrics.p95_duration.unwrap() <= 3.0);
        assert_eq!(metrics.per_keyword["k3"].runs, 2);
        assert_eq!(metrics.per_keyword["k3"].avg_duration, Some(3.0));
    }

    #[test]
    fn test_per_domain_counts() {
        let result = |id: &str, domain: &str| ResultRecord {
            unique_id: id.to_string(),
            keyword: "k1".to_string(),
            country: "US".to_string(),
            domain: domain.to_string(),
            title: String::new(),
            body: None,
            media_url: None,
        };
        let results = vec![
            result("a", "x.example.com"),
            result("b", "x.example.com"),
            result("c", "y.example.com"),
        ];
        let metrics = RunMetrics::from_records(&[], &results);

        assert_eq!(metrics.per_domain["x.example.com"], 2);
        assert_eq!(metrics.per_keyword["k1"].results, 3);
    }

    #[test]
    fn test_percentile_interpolates() {
        let values = [1.0, 2.0, 3.0, 4.0];
        assert_eq!(percentile(&values, 0.5), Some(2.5));
        assert_eq!(percentile(&values, 1.0), Some(4.0));
        assert_eq!(percentile(&values, 0.0), Some(1.0));
    }
}
