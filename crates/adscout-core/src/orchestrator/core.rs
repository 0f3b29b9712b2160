//! Orchestrator core structure
//!
//! Contains the `JobOrchestrator` handle, its public operations and the
//! intent listener.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use async_trait::async_trait;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::event_bus::{Event, EventBus, EventHandler, Intent, JobEvent, LoopExit, SubscriptionLoop};
use crate::queue::BatchQueue;
use crate::search::SearchProvider;
use crate::shutdown::{ShutdownController, ShutdownPhase};
use crate::store::PersistenceStore;

use super::config::OrchestratorConfig;

/// State shared between the orchestrator handle and its batch tasks.
pub(crate) struct Shared {
    pub(crate) bus: EventBus,
    pub(crate) provider: Arc<dyn SearchProvider>,
    pub(crate) store: Arc<dyn PersistenceStore>,
    pub(crate) config: OrchestratorConfig,
    pub(crate) queue: BatchQueue,
    /// Cancelled by a stop intent, then replaced for later batches
    stop_token: Mutex<CancellationToken>,
    pub(crate) shutdown: Arc<ShutdownController>,
    provider_active: AtomicBool,
}

/// Turns intents into keyword batches and reports their progress on the bus.
///
/// Cloning is cheap; clones drive the same orchestrator.
#[derive(Clone)]
pub struct JobOrchestrator {
    pub(crate) shared: Arc<Shared>,
}

impl std::fmt::Debug for JobOrchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JobOrchestrator")
            .field("config", &self.shared.config)
            .field("phase", &self.shared.shutdown.phase())
            .finish_non_exhaustive()
    }
}

impl JobOrchestrator {
    /// Create a new orchestrator
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidConfig`] for an unusable configuration.
    pub fn new(
        bus: EventBus,
        provider: Arc<dyn SearchProvider>,
        store: Arc<dyn PersistenceStore>,
        config: OrchestratorConfig,
    ) -> Result<Self> {
        config.validate()?;
        let queue = BatchQueue::new(&config.queue_config())?;
        let shutdown = ShutdownController::with_timeout(config.shutdown_timeout());

        info!(
            mode = ?config.mode,
            max_concurrent_batches = config.max_concurrent_batches,
            "Job orchestrator created"
        );

        Ok(Self {
            shared: Arc::new(Shared {
                bus,
                provider,
                store,
                queue,
                stop_token: Mutex::new(shutdown.token()),
                shutdown,
                config,
                provider_active: AtomicBool::new(false),
            }),
        })
    }

    /// The bus this orchestrator publishes on.
    #[must_use]
    pub fn bus(&self) -> &EventBus {
        &self.shared.bus
    }

    /// Active configuration.
    #[must_use]
    pub fn config(&self) -> &OrchestratorConfig {
        &self.shared.config
    }

    /// Whether new batches are accepted.
    #[must_use]
    pub fn is_accepting(&self) -> bool {
        self.shared.shutdown.is_accepting_work()
    }

    /// Activate the search provider.
    ///
    /// Batches call this on admission, so direct callers of
    /// [`start`](Self::start) need not. A failed activation is retried by the
    /// next call.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Provider`] when the provider refuses to start.
    pub async fn activate(&self) -> Result<()> {
        self.shared.activate_provider().await
    }

    /// Start a keyword batch without waiting for it.
    ///
    /// Publishes `job.started` before returning, then runs the batch on a
    /// background task. Keywords are processed in the given order; duplicates
    /// are processed independently.
    ///
    /// # Errors
    ///
    /// [`Error::EmptyBatch`] without keywords, [`Error::ShuttingDown`] after
    /// shutdown began.
    pub fn start(&self, keywords: Vec<String>, country: impl Into<String>) -> Result<Uuid> {
        if !self.shared.shutdown.is_accepting_work() {
            return Err(Error::ShuttingDown);
        }
        if keywords.is_empty() {
            return Err(Error::EmptyBatch);
        }

        let country = country.into();
        let batch_id = Uuid::new_v4();
        let cancel = self.shared.current_stop_token();
        let guard = self.shared.shutdown.register_task();

        self.shared.bus.publish(JobEvent::Started {
            batch_id,
            keywords: keywords.clone(),
            country: country.clone(),
        });
        info!(batch_id = %batch_id, keywords = keywords.len(), country = %country, "Batch started");

        let shared = Arc::clone(&self.shared);
        tokio::spawn(async move {
            let _guard = guard;
            shared.run_batch(batch_id, keywords, country, cancel).await;
        });

        Ok(batch_id)
    }

    /// Ask in-flight and queued batches to stop at the next keyword boundary.
    ///
    /// The keyword currently being searched is not interrupted. Batches
    /// started afterwards are unaffected.
    pub fn request_stop(&self) {
        let previous = {
            let mut token = self
                .shared
                .stop_token
                .lock()
                .unwrap_or_else(PoisonError::into_inner);
            std::mem::replace(&mut *token, self.shared.shutdown.token())
        };
        previous.cancel();

        self.shared.bus.publish(JobEvent::StopRequested);
        info!("Stop requested");
    }

    /// Stop accepting intents and cancel in-flight batches.
    ///
    /// With `wait`, blocks until outstanding batches and the intent listener
    /// have finished or the shutdown timeout elapsed.
    pub async fn shutdown(&self, wait: bool) -> ShutdownPhase {
        self.shared.queue.close();
        let phase = self.shared.shutdown.shutdown(wait).await;

        if self.shared.shutdown.active_task_count() == 0 {
            self.shared.provider_active.store(false, Ordering::SeqCst);
            self.shared.provider.stop().await;
        } else {
            warn!(
                active_tasks = self.shared.shutdown.active_task_count(),
                "Leaving search provider running for abandoned batches"
            );
        }
        phase
    }

    /// Activate the provider and start consuming intents from the bus.
    ///
    /// The listener registers before this returns, so intents published
    /// afterwards are never missed. It runs until [`shutdown`](Self::shutdown).
    pub async fn spawn_listener(&self) -> Result<JoinHandle<LoopExit>> {
        if !self.shared.shutdown.is_accepting_work() {
            return Err(Error::ShuttingDown);
        }
        if let Err(e) = self.shared.activate_provider().await {
            warn!(error = %e, "Search provider failed to start");
        }

        let subscription = self.shared.bus.subscribe(self.shared.config.intent_queue_capacity);
        let listener = SubscriptionLoop::new(subscription).with_poll_timeout(self.shared.config.poll_timeout());
        let cancel = self.shared.shutdown.token();
        let guard = self.shared.shutdown.register_task();
        let handler = self.clone();

        info!("Intent listener started");
        Ok(tokio::spawn(async move {
            let _guard = guard;
            listener.run(&handler, cancel).await
        }))
    }
}

#[async_trait]
impl EventHandler for JobOrchestrator {
    async fn handle(&self, event: &Event) -> anyhow::Result<()> {
        match Intent::parse(event)? {
            Some(Intent::StartRun { keywords, country }) => {
                let country = country.unwrap_or_else(|| self.shared.config.default_country.clone());
                self.start(keywords, country)?;
            }
            Some(Intent::StopRun) => self.request_stop(),
            None => {}
        }
        Ok(())
    }
}

impl Shared {
    pub(crate) async fn activate_provider(&self) -> Result<()> {
        if self.provider_active.load(Ordering::SeqCst) {
            return Ok(());
        }
        self.provider.start().await?;
        self.provider_active.store(true, Ordering::SeqCst);
        debug!("Search provider activated");
        Ok(())
    }

    fn current_stop_token(&self) -> CancellationToken {
        self.stop_token
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}
