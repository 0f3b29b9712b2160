//! Orchestrator configuration

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::error::{Error, Result};
use crate::event_bus::DEFAULT_POLL_TIMEOUT;
use crate::queue::{QueueConfig, QueueMode};
use crate::shutdown::DEFAULT_SHUTDOWN_TIMEOUT_SECS;

/// Configuration for the job orchestrator
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrchestratorConfig {
    /// Batch admission mode
    #[serde(default)]
    pub mode: QueueMode,
    /// Maximum batches in flight in concurrent mode
    #[serde(default = "default_max_concurrent_batches")]
    pub max_concurrent_batches: usize,
    /// Country used when a start intent omits one
    #[serde(default = "default_country")]
    pub default_country: String,
    /// Bound on each wait of the intent listener, in milliseconds
    #[serde(default = "default_poll_timeout_ms")]
    pub poll_timeout_ms: u64,
    /// Capacity of the intent listener queue (0 = unbounded)
    #[serde(default)]
    pub intent_queue_capacity: usize,
    /// How long `shutdown(true)` waits for in-flight batches
    #[serde(default = "default_shutdown_timeout_secs")]
    pub shutdown_timeout_secs: u64,
    /// Set status `failed` on the run record of a keyword that errored
    #[serde(default = "default_true")]
    pub mark_failed_runs: bool,
}

fn default_max_concurrent_batches() -> usize {
    4
}

fn default_country() -> String {
    "US".to_string()
}

fn default_poll_timeout_ms() -> u64 {
    DEFAULT_POLL_TIMEOUT.as_millis() as u64
}

fn default_shutdown_timeout_secs() -> u64 {
    DEFAULT_SHUTDOWN_TIMEOUT_SECS
}

fn default_true() -> bool {
    true
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            mode: QueueMode::default(),
            max_concurrent_batches: default_max_concurrent_batches(),
            default_country: default_country(),
            poll_timeout_ms: default_poll_timeout_ms(),
            intent_queue_capacity: 0,
            shutdown_timeout_secs: default_shutdown_timeout_secs(),
            mark_failed_runs: true,
        }
    }
}

impl OrchestratorConfig {
    /// Create a new configuration
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the batch admission mode
    #[must_use]
    pub fn with_mode(mut self, mode: QueueMode) -> Self {
        self.mode = mode;
        self
    }

    /// Set the batch pool size
    #[must_use]
    pub fn with_max_concurrent_batches(mut self, max: usize) -> Self {
        self.max_concurrent_batches = max;
        self
    }

    /// Set the default country
    #[must_use]
    pub fn with_default_country(mut self, country: impl Into<String>) -> Self {
        self.default_country = country.into();
        self
    }

    /// Set the intent listener poll timeout
    #[must_use]
    pub fn with_poll_timeout(mut self, timeout: Duration) -> Self {
        self.poll_timeout_ms = timeout.as_millis() as u64;
        self
    }

    /// Set the shutdown drain timeout
    #[must_use]
    pub fn with_shutdown_timeout(mut self, timeout: Duration) -> Self {
        self.shutdown_timeout_secs = timeout.as_secs();
        self
    }

    /// Keep failed keywords' run records in status `running`
    #[must_use]
    pub fn with_mark_failed_runs(mut self, enabled: bool) -> Self {
        self.mark_failed_runs = enabled;
        self
    }

    /// Poll timeout as a `Duration`
    #[must_use]
    pub fn poll_timeout(&self) -> Duration {
        Duration::from_millis(self.poll_timeout_ms)
    }

    /// Shutdown timeout as a `Duration`
    #[must_use]
    pub fn shutdown_timeout(&self) -> Duration {
        Duration::from_secs(self.shutdown_timeout_secs)
    }

    pub(crate) fn queue_config(&self) -> QueueConfig {
        QueueConfig {
            mode: self.mode,
            max_concurrent: self.max_concurrent_batches,
        }
    }

    /// Reject settings the orchestrator cannot run with.
    pub fn validate(&self) -> Result<()> {
        if self.max_concurrent_batches == 0 {
            return Err(Error::invalid_config(
                "orchestrator.max_concurrent_batches",
                "must be at least 1",
            ));
        }
        if self.poll_timeout_ms == 0 {
            return Err(Error::invalid_config(
                "orchestrator.poll_timeout_ms",
                "must be positive",
            ));
        }
        if self.default_country.trim().is_empty() {
            return Err(Error::invalid_config(
                "orchestrator.default_country",
                "must not be empty",
            ));
        }
        Ok(())
    }
}
