//! Graceful shutdown
//!
//! Coordinates shutdown of the intent listener and in-flight batches.
//!
//! ## Usage
//!
//! ```ignore
//! let shutdown = ShutdownController::new();
//!
//! // Track a background task
//! let guard = shutdown.register_task();
//! tokio::spawn(async move { work().await; drop(guard); });
//!
//! // Stop accepting work and wait for tracked tasks
//! shutdown.shutdown(true).await;
//! ```

use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Default shutdown timeout in seconds
pub const DEFAULT_SHUTDOWN_TIMEOUT_SECS: u64 = 30;

const DRAIN_CHECK_INTERVAL: Duration = Duration::from_millis(20);

/// Shutdown phases
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShutdownPhase {
    /// Normal operation
    Running,
    /// Shutdown initiated - new work is refused
    Stopping,
    /// Waiting for active tasks to complete
    Draining,
    /// Drain timed out or was skipped - remaining tasks are abandoned
    Terminating,
    /// Shutdown complete
    Terminated,
}

impl ShutdownPhase {
    fn from_u32(value: u32) -> Self {
        match value {
            0 => Self::Running,
            1 => Self::Stopping,
            2 => Self::Draining,
            3 => Self::Terminating,
            _ => Self::Terminated,
        }
    }
}

impl std::fmt::Display for ShutdownPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Running => write!(f, "Running"),
            Self::Stopping => write!(f, "Stopping"),
            Self::Draining => write!(f, "Draining"),
            Self::Terminating => write!(f, "Terminating"),
            Self::Terminated => write!(f, "Terminated"),
        }
    }
}

/// Shutdown controller for coordinating graceful shutdown
#[derive(Debug)]
pub struct ShutdownController {
    /// Cancelled when shutdown begins
    cancel_token: CancellationToken,
    /// Current shutdown phase
    phase: AtomicU32,
    /// Whether shutdown has been initiated
    shutdown_initiated: AtomicBool,
    /// Active task count
    active_tasks: AtomicU32,
    /// Drain timeout
    timeout: Duration,
}

impl ShutdownController {
    /// Create a new shutdown controller with default timeout
    #[must_use]
    pub fn new() -> Arc<Self> {
        Self::with_timeout(Duration::from_secs(DEFAULT_SHUTDOWN_TIMEOUT_SECS))
    }

    /// Create a new shutdown controller with custom timeout
    #[must_use]
    pub fn with_timeout(timeout: Duration) -> Arc<Self> {
        Arc::new(Self {
            cancel_token: CancellationToken::new(),
            phase: AtomicU32::new(ShutdownPhase::Running as u32),
            shutdown_initiated: AtomicBool::new(false),
            active_tasks: AtomicU32::new(0),
            timeout,
        })
    }

    /// Token cancelled when shutdown begins
    #[must_use]
    pub fn token(&self) -> CancellationToken {
        self.cancel_token.child_token()
    }

    /// Get current shutdown phase
    #[must_use]
    pub fn phase(&self) -> ShutdownPhase {
        ShutdownPhase::from_u32(self.phase.load(Ordering::SeqCst))
    }

    /// Check if shutdown has been initiated
    #[must_use]
    pub fn is_shutting_down(&self) -> bool {
        self.shutdown_initiated.load(Ordering::SeqCst)
    }

    /// Check if still accepting new work
    #[must_use]
    pub fn is_accepting_work(&self) -> bool {
        self.phase() == ShutdownPhase::Running
    }

    /// Register a new active task
    pub fn register_task(self: &Arc<Self>) -> TaskGuard {
        self.active_tasks.fetch_add(1, Ordering::SeqCst);
        TaskGuard {
            controller: Arc::clone(self),
        }
    }

    /// Get the count of active tasks
    #[must_use]
    pub fn active_task_count(&self) -> u32 {
        self.active_tasks.load(Ordering::SeqCst)
    }

    fn set_phase(&self, phase: ShutdownPhase) {
        self.phase.store(phase as u32, Ordering::SeqCst);
        info!(phase = %phase, "Shutdown phase changed");
    }

    /// Initiate shutdown
    ///
    /// Refuses new work and cancels the shutdown token. With `wait`, blocks
    /// until every registered task has finished or the timeout elapsed;
    /// without it, remaining tasks are abandoned immediately. Returns the
    /// final phase, which is `Terminated` for the first caller.
    pub async fn shutdown(&self, wait: bool) -> ShutdownPhase {
        if self
            .shutdown_initiated
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            debug!("Shutdown already initiated");
            return self.phase();
        }

        info!(wait, "Initiating shutdown...");
        self.set_phase(ShutdownPhase::Stopping);
        self.cancel_token.cancel();

        if wait {
            self.set_phase(ShutdownPhase::Draining);
            let drain_start = tokio::time::Instant::now();

            loop {
                let active = self.active_task_count();
                if active == 0 {
                    info!("All tasks completed gracefully");
                    break;
                }

                if drain_start.elapsed() >= self.timeout {
                    warn!(
                        active_tasks = active,
                        timeout_secs = self.timeout.as_secs(),
                        "Shutdown timeout exceeded, abandoning remaining tasks"
                    );
                    self.set_phase(ShutdownPhase::Terminating);
                    break;
                }

                tokio::time::sleep(DRAIN_CHECK_INTERVAL).await;
            }
        } else if self.active_task_count() > 0 {
            self.set_phase(ShutdownPhase::Terminating);
        }

        self.set_phase(ShutdownPhase::Terminated);
        ShutdownPhase::Terminated
    }
}

/// Guard for tracking active tasks
///
/// Decrements the active task count when dropped.
#[derive(Debug)]
pub struct TaskGuard {
    controller: Arc<ShutdownController>,
}

impl TaskGuard {
    /// Check if shutdown was requested
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.controller.cancel_token.is_cancelled()
    }
}

impl Drop for TaskGuard {
    fn drop(&mut self) {
        self.controller.active_tasks.fetch_sub(1, Ordering::SeqCst);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_shutdown_phases() {
        let controller = ShutdownController::new();
        assert_eq!(controller.phase(), ShutdownPhase::Running);
        assert!(controller.is_accepting_work());
        assert!(!controller.is_shutting_down());

        let phase = controller.shutdown(true).await;

        assert_eq!(phase, ShutdownPhase::Terminated);
        assert_eq!(controller.phase(), ShutdownPhase::Terminated);
        assert!(!controller.is_accepting_work());
        assert!(controller.is_shutting_down());
    }

    #[tokio::test]
    async fn test_task_guard() {
        let controller = ShutdownController::new();

        {
            let _guard1 = controller.register_task();
            let _guard2 = controller.register_task();
            assert_eq!(controller.active_task_count(), 2);
        }

        assert_eq!(controller.active_task_count(), 0);
    }

    #[tokio::test]
    async fn test_cancellation_propagation() {
        let controller = ShutdownController::new();
        let token = controller.token();
        let guard = controller.register_task();

        assert!(!token.is_cancelled());
        controller.shutdown(false).await;

        assert!(token.is_cancelled());
        assert!(guard.is_cancelled());
    }

    #[tokio::test]
    async fn test_wait_drains_tasks() {
        let controller = ShutdownController::new();
        let guard = controller.register_task();

        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(50)).await;
            drop(guard);
        });

        controller.shutdown(true).await;
        assert_eq!(controller.active_task_count(), 0);
    }

    #[tokio::test]
    async fn test_wait_times_out() {
        let controller = ShutdownController::with_timeout(Duration::from_millis(50));
        let _stuck = controller.register_task();

        let phase = controller.shutdown(true).await;
        assert_eq!(phase, ShutdownPhase::Terminated);
        assert_eq!(controller.active_task_count(), 1);
    }

    #[tokio::test]
    async fn test_double_shutdown() {
        let controller = ShutdownController::new();

        let c1 = controller.clone();
        let c2 = controller.clone();
        let (a, b) = tokio::join!(c1.shutdown(true), c2.shutdown(true));

        assert!(a == ShutdownPhase::Terminated || b == ShutdownPhase::Terminated);
        assert_eq!(controller.phase(), ShutdownPhase::Terminated);
    }
}
