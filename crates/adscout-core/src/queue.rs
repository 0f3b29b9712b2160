//! Batch admission
//!
//! Controls how overlapping keyword batches are admitted:
//! - Sequential: one batch at a time, later batches queue behind it
//! - Concurrent: up to `max_concurrent` batches in flight

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};
use tracing::debug;

use crate::error::{Error, Result};

/// Admission mode for batches
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QueueMode {
    /// Process one batch at a time (default)
    #[default]
    Sequential,
    /// Allow several batches to run side by side
    Concurrent,
}

/// Configuration for the batch queue
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueueConfig {
    /// Queue mode
    #[serde(default)]
    pub mode: QueueMode,
    /// Maximum batches in flight (Concurrent mode)
    #[serde(default = "default_max_concurrent")]
    pub max_concurrent: usize,
}

fn default_max_concurrent() -> usize {
    4
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            mode: QueueMode::Sequential,
            max_concurrent: default_max_concurrent(),
        }
    }
}

/// Admission lock shared by every batch of one orchestrator.
#[derive(Debug)]
pub struct BatchQueue {
    mode: QueueMode,
    semaphore: Arc<Semaphore>,
}

impl BatchQueue {
    /// Create a new batch queue.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidConfig`] when `max_concurrent` is zero.
    pub fn new(config: &QueueConfig) -> Result<Self> {
        if config.max_concurrent == 0 {
            return Err(Error::invalid_config(
                "orchestrator.max_concurrent_batches",
                "must be at least 1",
            ));
        }
        let permits = match config.mode {
            QueueMode::Sequential => 1,
            QueueMode::Concurrent => config.max_concurrent,
        };
        Ok(Self {
            mode: config.mode,
            semaphore: Arc::new(Semaphore::new(permits)),
        })
    }

    /// Wait for an admission slot. The slot is released when the permit drops.
    ///
    /// Returns `None` once the queue has been closed.
    pub async fn acquire(&self) -> Option<BatchPermit> {
        let permit = self.semaphore.clone().acquire_owned().await.ok()?;
        debug!(mode = ?self.mode, "Batch admitted");
        Some(BatchPermit { _permit: permit })
    }

    /// Stop admitting batches; pending and future `acquire` calls return `None`.
    pub fn close(&self) {
        self.semaphore.close();
    }

    /// Get the current queue mode.
    pub fn mode(&self) -> QueueMode {
        self.mode
    }

    /// Number of free admission slots.
    pub fn available_slots(&self) -> usize {
        self.semaphore.available_permits()
    }
}

/// A permit that releases the admission slot when dropped.
#[derive(Debug)]
pub struct BatchPermit {
    _permit: OwnedSemaphorePermit,
}
