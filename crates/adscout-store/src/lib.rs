//! Adscout Store - SQLite persistence
//!
//! Implements [`PersistenceStore`](adscout_core::PersistenceStore) on an
//! embedded SQLite database:
//! - `run_records`: one row per keyword attempt
//! - `result_records`: search results, upserted by `unique_id`
//! - `events`: journal of bus events
//!
//! # Usage
//!
//! ```no_run
//! use adscout_store::SqliteStore;
//!
//! # async fn example() -> Result<(), adscout_core::StoreError> {
//! // Default location: ~/.adscout/adscout.db
//! let store = SqliteStore::new_default().await?;
//!
//! // Or specify a custom path
//! let store = SqliteStore::from_path("/path/to/adscout.db").await?;
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod migrations;
mod queries;
mod rows;

#[cfg(test)]
mod tests;

use std::path::{Path, PathBuf};
use std::str::FromStr;

use adscout_core::StoreError;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions};
use tracing::info;

/// SQLite-backed store for run records, result records and the event journal
#[derive(Debug, Clone)]
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    /// Open (or create) the database at `path` and run migrations.
    ///
    /// # Errors
    ///
    /// Returns error if the directory, connection or migration fails.
    pub async fn from_path(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let path = path.as_ref();

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| {
                StoreError::Database(format!("Failed to create database directory: {}", e))
            })?;
        }

        let options = SqliteConnectOptions::from_str(&format!("sqlite:{}", path.display()))
            .map_err(|e| StoreError::Database(format!("Invalid SQLite path: {}", e)))?
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal);

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await
            .map_err(|e| StoreError::Database(format!("Failed to connect to SQLite: {}", e)))?;

        let store = Self { pool };
        store.migrate().await?;

        info!(path = %path.display(), "SQLite store initialized");
        Ok(store)
    }

    /// Open the store at the default location (~/.adscout/adscout.db)
    pub async fn new_default() -> Result<Self, StoreError> {
        let path = Self::default_path()?;
        Self::from_path(&path).await
    }

    /// Get the default database path
    pub fn default_path() -> Result<PathBuf, StoreError> {
        let home = dirs::home_dir()
            .ok_or_else(|| StoreError::Database("Could not determine home directory".to_string()))?;
        Ok(home.join(".adscout").join("adscout.db"))
    }

    /// Check database health
    pub async fn health_check(&self) -> Result<bool, StoreError> {
        sqlx::query("SELECT 1")
            .fetch_one(&self.pool)
            .await
            .map_err(|e| StoreError::Database(format!("Health check failed: {}", e)))?;
        Ok(true)
    }

    /// Close all pooled connections.
    pub async fn close(&self) {
        self.pool.close().await;
    }
}
