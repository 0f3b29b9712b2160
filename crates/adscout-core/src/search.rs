//! Search provider contract
//!
//! A provider turns a `(keyword, country)` pair into result items. Concrete
//! providers live outside the core (see the `adscout-search` crate).

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Provider failure surfaced for a single keyword.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ProviderError {
    /// `search` was called before `start`
    #[error("provider not started")]
    NotStarted,
    /// The search itself failed
    #[error("search failed: {0}")]
    Failed(String),
}

/// One item returned by a provider.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResultItem {
    /// Stable idempotency key; synthesized by the orchestrator when absent
    #[serde(default, alias = "id")]
    pub unique_id: Option<String>,
    /// Title text
    pub title: String,
    /// Advertiser domain
    pub domain: String,
    /// Body text
    #[serde(default)]
    pub body: Option<String>,
    /// Media URL
    #[serde(default)]
    pub media_url: Option<String>,
    /// Country override; the batch country applies when absent
    #[serde(default)]
    pub country: Option<String>,
}

/// Keyword search backend.
///
/// Implementations must tolerate repeated calls to every method.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SearchProvider: Send + Sync {
    /// Activate the provider.
    async fn start(&self) -> Result<(), ProviderError>;

    /// Search one keyword.
    async fn search(&self, keyword: &str, country: &str) -> Result<Vec<ResultItem>, ProviderError>;

    /// Deactivate the provider.
    async fn stop(&self);
}
