//! Configuration loading
//!
//! Handles loading configuration from embedded defaults, files, and environment.

use super::config::AppConfig;
use anyhow::{Context, Result};
use config::{Config, Environment, File, FileFormat};

/// Embedded default configuration (compiled into binary)
pub const DEFAULT_CONFIG: &str = include_str!("../../config/default.toml");

/// Load configuration from files and environment
pub fn load_config() -> Result<AppConfig> {
    let config = Config::builder()
        .add_source(File::from_str(DEFAULT_CONFIG, FileFormat::Toml))
        .add_source(File::with_name("config/local").required(false))
        // ADSCOUT_ORCHESTRATOR__MODE=concurrent
        .add_source(
            Environment::with_prefix("ADSCOUT")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        )
        .build()
        .context("Failed to build configuration")?;

    let app: AppConfig = config
        .try_deserialize()
        .context("Failed to deserialize configuration")?;

    app.orchestrator
        .validate()
        .map_err(|e| anyhow::anyhow!(adscout_core::format_error_for_cli(&e)))?;
    Ok(app)
}

#[cfg(test)]
mod tests {
    use super::*;
    use adscout_core::QueueMode;

    #[test]
    fn test_embedded_defaults_parse() {
        let app: AppConfig = Config::builder()
            .add_source(File::from_str(DEFAULT_CONFIG, FileFormat::Toml))
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap();

        assert_eq!(app.database.path, "adscout.db");
        assert_eq!(app.search.latency_ms, 100);
        assert_eq!(app.orchestrator.mode, QueueMode::Sequential);
        assert_eq!(app.orchestrator.max_concurrent_batches, 4);
        assert_eq!(app.orchestrator.default_country, "US");
        assert_eq!(app.orchestrator.poll_timeout_ms, 500);
        assert!(app.orchestrator.mark_failed_runs);
        assert!(app.orchestrator.validate().is_ok());
    }

    #[test]
    fn test_overrides_layer_on_defaults() {
        let app: AppConfig = Config::builder()
            .add_source(File::from_str(DEFAULT_CONFIG, FileFormat::Toml))
            .add_source(File::from_str(
                "[orchestrator]\nmode = \"concurrent\"\nmax_concurrent_batches = 2\n",
                FileFormat::Toml,
            ))
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap();

        assert_eq!(app.orchestrator.mode, QueueMode::Concurrent);
        assert_eq!(app.orchestrator.max_concurrent_batches, 2);
        assert_eq!(app.orchestrator.default_country, "US");
    }
}
