//! Application configuration types

use adscout_core::OrchestratorConfig;
use adscout_search::MockProviderConfig;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub search: MockProviderConfig,
    #[serde(default)]
    pub bus: BusConfig,
    #[serde(default)]
    pub orchestrator: OrchestratorConfig,
}

/// SQLite database settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// Database file; empty selects the per-user default location
    #[serde(default)]
    pub path: String,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: "adscout.db".to_string(),
        }
    }
}

impl DatabaseConfig {
    pub fn resolved_path(&self) -> anyhow::Result<PathBuf> {
        if self.path.trim().is_empty() {
            Ok(adscout_store::SqliteStore::default_path()?)
        } else {
            Ok(PathBuf::from(&self.path))
        }
    }
}

/// Event bus settings for CLI observers
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BusConfig {
    /// Observer queue capacity (0 = unbounded)
    #[serde(default)]
    pub subscriber_capacity: usize,
}
