use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use futures::FutureExt;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, warn};

use super::bus::Subscription;
use super::types::Event;

/// Default bound on a single wait for the next event.
pub const DEFAULT_POLL_TIMEOUT: Duration = Duration::from_millis(500);

/// Consumer of bus events.
///
/// Errors are reported per invocation and never stop the loop feeding the
/// handler.
#[async_trait]
pub trait EventHandler: Send + Sync {
    /// Handle one event.
    async fn handle(&self, event: &Event) -> anyhow::Result<()>;
}

#[async_trait]
impl<F> EventHandler for F
where
    F: Fn(&Event) -> anyhow::Result<()> + Send + Sync,
{
    async fn handle(&self, event: &Event) -> anyhow::Result<()> {
        self(event)
    }
}

/// Why a subscription loop returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopExit {
    /// The cancellation token fired
    Cancelled,
    /// The bus was dropped and the queue ran dry
    Closed,
}

enum Poll {
    Cancelled,
    Next(Option<Event>),
}

/// Cancellable loop turning queued events into handler calls for one subscriber.
///
/// The subscription is unregistered on every exit path, including a panic
/// unwinding through [`SubscriptionLoop::run`].
#[derive(Debug)]
pub struct SubscriptionLoop {
    subscription: Subscription,
    poll_timeout: Duration,
}

impl SubscriptionLoop {
    /// Wrap an already registered subscription.
    ///
    /// Register before spawning the loop so no event published in between is missed.
    #[must_use]
    pub fn new(subscription: Subscription) -> Self {
        Self {
            subscription,
            poll_timeout: DEFAULT_POLL_TIMEOUT,
        }
    }

    /// Set the bound on each wait for the next event.
    #[must_use]
    pub fn with_poll_timeout(mut self, poll_timeout: Duration) -> Self {
        self.poll_timeout = poll_timeout;
        self
    }

    /// Run until cancelled or until the bus goes away.
    pub async fn run<H>(self, handler: &H, cancel: CancellationToken) -> LoopExit
    where
        H: EventHandler + ?Sized,
    {
        let Self {
            subscription,
            poll_timeout,
        } = self;
        let id = subscription.id();
        debug!(subscriber = id, "Subscription loop started");

        let exit = loop {
            if cancel.is_cancelled() {
                break LoopExit::Cancelled;
            }

            let poll = tokio::select! {
                biased;
                _ = cancel.cancelled() => Poll::Cancelled,
                next = subscription.recv_timeout(poll_timeout) => Poll::Next(next),
            };

            match poll {
                Poll::Cancelled => break LoopExit::Cancelled,
                Poll::Next(Some(event)) => deliver(handler, &event, id).await,
                Poll::Next(None) => {
                    if !subscription.is_bus_alive() && subscription.is_empty() {
                        break LoopExit::Closed;
                    }
                }
            }
        };

        subscription.unregister();
        debug!(subscriber = id, exit = ?exit, "Subscription loop stopped");
        exit
    }

    /// Spawn the loop onto the tokio runtime.
    pub fn spawn<H>(self, handler: Arc<H>, cancel: CancellationToken) -> JoinHandle<LoopExit>
    where
        H: EventHandler + ?Sized + 'static,
    {
        tokio::spawn(async move { self.run(handler.as_ref(), cancel).await })
    }
}

async fn deliver<H>(handler: &H, event: &Event, subscriber: u64)
where
    H: EventHandler + ?Sized,
{
    match AssertUnwindSafe(handler.handle(event)).catch_unwind().await {
        Ok(Ok(())) => {}
        Ok(Err(e)) => {
            warn!(subscriber, event_type = event.kind(), error = %e, "Event handler failed");
        }
        Err(_) => {
            error!(subscriber, event_type = event.kind(), "Event handler panicked");
        }
    }
}
