//! Application wiring
//!
//! Builds the bus, store, provider and orchestrator from `AppConfig`.

mod config;
mod loader;

pub use config::AppConfig;
pub use loader::load_config;

use std::sync::Arc;

use adscout_core::{EventBus, JobOrchestrator};
use adscout_search::MockProvider;
use adscout_store::SqliteStore;
use anyhow::{Context, Result};
use tracing::info;

/// Running components of one CLI invocation
pub struct App {
    pub bus: EventBus,
    pub store: Arc<SqliteStore>,
    pub orchestrator: JobOrchestrator,
}

/// Open the configured database.
pub async fn open_store(config: &AppConfig) -> Result<SqliteStore> {
    let path = config.database.resolved_path()?;
    SqliteStore::from_path(&path)
        .await
        .with_context(|| format!("Failed to open database at {}", path.display()))
}

impl App {
    /// Wire every component; nothing runs until the listener is spawned.
    pub async fn build(config: &AppConfig) -> Result<Self> {
        let store = Arc::new(open_store(config).await?);
        let provider = Arc::new(MockProvider::new(config.search.clone()));
        let bus = EventBus::new();

        let orchestrator = JobOrchestrator::new(
            bus.clone(),
            provider,
            store.clone(),
            config.orchestrator.clone(),
        )
        .map_err(|e| anyhow::anyhow!(adscout_core::format_error_for_cli(&e)))?;

        info!(mode = ?config.orchestrator.mode, "Adscout wired");
        Ok(Self {
            bus,
            store,
            orchestrator,
        })
    }
}
