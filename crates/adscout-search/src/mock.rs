//! Mock search provider
//!
//! Returns one fake ad per keyword after a configurable delay. Useful for
//! local runs and end-to-end tests without network access.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Duration;

use adscout_core::{ProviderError, ResultItem, SearchProvider};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Configuration for [`MockProvider`]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MockProviderConfig {
    /// Simulated search latency in milliseconds
    #[serde(default = "default_latency_ms")]
    pub latency_ms: u64,
}

fn default_latency_ms() -> u64 {
    100
}

impl Default for MockProviderConfig {
    fn default() -> Self {
        Self {
            latency_ms: default_latency_ms(),
        }
    }
}

impl MockProviderConfig {
    /// Set the simulated latency
    #[must_use]
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency_ms = latency.as_millis() as u64;
        self
    }

    fn latency(&self) -> Duration {
        Duration::from_millis(self.latency_ms)
    }
}

/// Provider producing `{keyword}:{country}:1` results
#[derive(Debug, Default)]
pub struct MockProvider {
    config: MockProviderConfig,
    running: AtomicBool,
    searches: AtomicU64,
}

impl MockProvider {
    /// Create a stopped provider
    #[must_use]
    pub fn new(config: MockProviderConfig) -> Self {
        Self {
            config,
            running: AtomicBool::new(false),
            searches: AtomicU64::new(0),
        }
    }

    /// Whether `start` was called without a later `stop`
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Number of searches served
    #[must_use]
    pub fn search_count(&self) -> u64 {
        self.searches.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SearchProvider for MockProvider {
    async fn start(&self) -> Result<(), ProviderError> {
        if !self.running.swap(true, Ordering::SeqCst) {
            debug!(latency_ms = self.config.latency_ms, "Mock provider started");
        }
        Ok(())
    }

    async fn search(&self, keyword: &str, country: &str) -> Result<Vec<ResultItem>, ProviderError> {
        if !self.is_running() {
            return Err(ProviderError::NotStarted);
        }

        tokio::time::sleep(self.config.latency()).await;
        self.searches.fetch_add(1, Ordering::SeqCst);

        Ok(vec![ResultItem {
            unique_id: Some(format!("{keyword}:{country}:1")),
            title: format!("Mock ad for {keyword}"),
            domain: format!("{}.example.com", keyword.to_lowercase()),
            country: Some(country.to_string()),
            ..ResultItem::default()
        }])
    }

    async fn stop(&self) {
        if self.running.swap(false, Ordering::SeqCst) {
            debug!("Mock provider stopped");
        }
    }
}
