//! Batch runner
//!
//! Processes the keywords of one batch in order. Every keyword failure
//! (provider, persistence or panic) is turned into a `job.error` event and
//! the batch moves on; `job.finished` is published exactly once per batch.

use std::panic::AssertUnwindSafe;
use std::time::Instant;

use chrono::Utc;
use futures::FutureExt;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::event_bus::{JobEvent, ResultKey};
use crate::search::ResultItem;
use crate::store::{ResultRecord, RunRecordId, RunStatus, RunUpdate};

use super::core::Shared;

#[derive(Debug, Default)]
struct BatchSummary {
    done: usize,
    failed: usize,
    cancelled: bool,
}

impl Shared {
    pub(crate) async fn run_batch(
        &self,
        batch_id: Uuid,
        keywords: Vec<String>,
        country: String,
        cancel: CancellationToken,
    ) {
        let permit = self.queue.acquire().await;
        let summary = match &permit {
            Some(_) => {
                if let Err(e) = self.activate_provider().await {
                    warn!(batch_id = %batch_id, error = %e, "Search provider failed to start");
                }
                self.process_keywords(batch_id, &keywords, &country, &cancel).await
            }
            None => {
                warn!(batch_id = %batch_id, "Batch queue closed before admission");
                BatchSummary {
                    cancelled: true,
                    ..BatchSummary::default()
                }
            }
        };

        // published while still holding the admission slot
        self.bus.publish(JobEvent::Finished { batch_id, keywords });
        drop(permit);

        info!(
            batch_id = %batch_id,
            done = summary.done,
            failed = summary.failed,
            cancelled = summary.cancelled,
            "Batch finished"
        );
    }

    async fn process_keywords(
        &self,
        batch_id: Uuid,
        keywords: &[String],
        country: &str,
        cancel: &CancellationToken,
    ) -> BatchSummary {
        let mut summary = BatchSummary::default();

        for (position, keyword) in keywords.iter().enumerate() {
            if cancel.is_cancelled() {
                info!(
                    batch_id = %batch_id,
                    remaining = keywords.len() - position,
                    "Batch cancelled at keyword boundary"
                );
                summary.cancelled = true;
                break;
            }

            match self.run_keyword(batch_id, keyword, country).await {
                Ok(results) => {
                    summary.done += 1;
                    self.bus.publish(JobEvent::KeywordDone {
                        batch_id,
                        keyword: keyword.clone(),
                        count: results.len(),
                        results,
                    });
                }
                Err(e) => {
                    summary.failed += 1;
                    warn!(batch_id = %batch_id, keyword = %keyword, error = %e, "Keyword failed");
                    self.bus.publish(JobEvent::Error {
                        batch_id,
                        keyword: keyword.clone(),
                        error: e.to_string(),
                    });
                }
            }
        }

        summary
    }

    /// One keyword attempt. The run record is written outside the unwind
    /// boundary so every failure, panics included, can be recorded on it.
    async fn run_keyword(&self, batch_id: Uuid, keyword: &str, country: &str) -> Result<Vec<ResultKey>> {
        let started = Instant::now();
        let run_id = self.store.create_run_record(keyword).await?;

        let outcome = AssertUnwindSafe(self.process_keyword(batch_id, run_id, keyword, country, started))
            .catch_unwind()
            .await
            .unwrap_or_else(|_| Err(Error::Internal("keyword processing panicked".to_string())));

        if outcome.is_err() && self.config.mark_failed_runs {
            let update = RunUpdate {
                duration_seconds: started.elapsed().as_secs_f64(),
                results_count: 0,
                status: RunStatus::Failed,
            };
            if let Err(update_err) = self.store.update_run_record(run_id, update).await {
                warn!(run_id, error = %update_err, "Failed to mark run record as failed");
            }
        }
        outcome
    }

    async fn process_keyword(
        &self,
        batch_id: Uuid,
        run_id: RunRecordId,
        keyword: &str,
        country: &str,
        started: Instant,
    ) -> Result<Vec<ResultKey>> {
        self.bus.publish(JobEvent::Progress {
            batch_id,
            keyword: keyword.to_string(),
        });

        let results = self.search_and_persist(keyword, country).await?;
        self.store
            .update_run_record(
                run_id,
                RunUpdate {
                    duration_seconds: started.elapsed().as_secs_f64(),
                    results_count: results.len() as i64,
                    status: RunStatus::Finished,
                },
            )
            .await?;
        debug!(run_id, keyword, count = results.len(), "Keyword persisted");
        Ok(results)
    }

    async fn search_and_persist(&self, keyword: &str, country: &str) -> Result<Vec<ResultKey>> {
        let items = self.provider.search(keyword, country).await?;

        let mut results = Vec::with_capacity(items.len());
        for (index, item) in items.into_iter().enumerate() {
            let record = to_record(item, keyword, country, index);
            self.store.upsert_result_record(&record).await?;
            results.push(ResultKey {
                unique_id: record.unique_id,
            });
        }
        Ok(results)
    }
}

fn to_record(item: ResultItem, keyword: &str, country: &str, index: usize) -> ResultRecord {
    let unique_id = item
        .unique_id
        .filter(|id| !id.is_empty())
        .unwrap_or_else(|| synthesize_key(keyword, index));

    ResultRecord {
        unique_id,
        keyword: keyword.to_string(),
        country: item.country.unwrap_or_else(|| country.to_string()),
        domain: item.domain,
        title: item.title,
        body: item.body,
        media_url: item.media_url,
    }
}

/// Key for a provider item without its own id: keyword + timestamp (+ position).
fn synthesize_key(keyword: &str, index: usize) -> String {
    let nanos = Utc::now().timestamp_nanos_opt().unwrap_or_default();
    format!("{keyword}:{nanos}:{index}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_to_record_keeps_provider_key() {
        let item = ResultItem {
            unique_id: Some("k1:US:1".to_string()),
            title: "t".to_string(),
            domain: "k1.example.com".to_string(),
            ..ResultItem::default()
        };
        let record = to_record(item, "k1", "US", 0);
        assert_eq!(record.unique_id, "k1:US:1");
        assert_eq!(record.country, "US");
    }

    #[test]
    fn test_to_record_synthesizes_missing_key() {
        let item = ResultItem {
            unique_id: Some(String::new()),
            country: Some("BR".to_string()),
            ..ResultItem::default()
        };
        let a = to_record(item.clone(), "k1", "US", 0);
        let b = to_record(item, "k1", "US", 1);

        assert!(a.unique_id.starts_with("k1:"));
        assert_ne!(a.unique_id, b.unique_id);
        assert_eq!(a.country, "BR");
    }
}
