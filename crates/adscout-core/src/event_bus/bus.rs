use std::collections::{BTreeMap, VecDeque};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError, Weak};
use std::time::Duration;

use tokio::sync::Notify;
use tracing::{debug, warn};

use super::types::Event;

/// Opaque identifier of a registered subscriber.
pub type SubscriberId = u64;

/// FIFO delivery queue owned jointly by the bus registry and one subscriber.
#[derive(Debug)]
struct SubscriberQueue {
    items: Mutex<VecDeque<Event>>,
    /// 0 means unbounded
    capacity: usize,
    notify: Notify,
}

impl SubscriberQueue {
    fn new(capacity: usize) -> Self {
        Self {
            items: Mutex::new(VecDeque::new()),
            capacity,
            notify: Notify::new(),
        }
    }

    fn items(&self) -> std::sync::MutexGuard<'_, VecDeque<Event>> {
        self.items.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Enqueue without blocking. Returns false when the queue is full.
    fn try_push(&self, event: Event) -> bool {
        {
            let mut items = self.items();
            if self.capacity > 0 && items.len() >= self.capacity {
                return false;
            }
            items.push_back(event);
        }
        self.notify.notify_one();
        true
    }

    fn try_pop(&self) -> Option<Event> {
        self.items().pop_front()
    }

    fn drain(&self) -> Vec<Event> {
        self.items().drain(..).collect()
    }

    fn len(&self) -> usize {
        self.items().len()
    }

    async fn pop_timeout(&self, timeout: Duration) -> Option<Event> {
        let deadline = tokio::time::Instant::now() + timeout;
        loop {
            if let Some(event) = self.try_pop() {
                return Some(event);
            }
            // notify_one stores a permit, so a push between try_pop and here is not lost
            if tokio::time::timeout_at(deadline, self.notify.notified())
                .await
                .is_err()
            {
                return self.try_pop();
            }
        }
    }
}

#[derive(Debug, Default)]
struct BusInner {
    next_id: AtomicU64,
    subscribers: Mutex<Vec<(SubscriberId, Arc<SubscriberQueue>)>>,
}

impl BusInner {
    fn subscribers(&self) -> std::sync::MutexGuard<'_, Vec<(SubscriberId, Arc<SubscriberQueue>)>> {
        self.subscribers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    fn unregister(&self, id: SubscriberId) -> bool {
        let mut subscribers = self.subscribers();
        let before = subscribers.len();
        subscribers.retain(|(sid, _)| *sid != id);
        before != subscribers.len()
    }
}

/// Thread-safe multi-subscriber broadcast bus.
///
/// Every subscriber owns its own FIFO queue. Publishing never blocks and
/// never fails: a delivery that does not fit into a bounded queue is dropped
/// for that subscriber only. Subscribers only see events published after
/// they registered.
///
/// Cloning is cheap; clones share the same registry.
#[derive(Debug, Clone, Default)]
pub struct EventBus {
    inner: Arc<BusInner>,
}

impl EventBus {
    /// Create an empty bus.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Publish an event to every registered subscriber.
    ///
    /// Returns the number of subscribers whose queue accepted the event.
    /// The registry lock is held across the (non-blocking) enqueue loop so a
    /// publish is atomic with respect to `subscribe` and `unregister`, and every
    /// subscriber observes publishes in the same linear order.
    pub fn publish(&self, event: impl Into<Event>) -> usize {
        let event = event.into();
        let subscribers = self.inner.subscribers();
        let mut delivered = 0;
        for (id, queue) in subscribers.iter() {
            if queue.try_push(event.clone()) {
                delivered += 1;
            } else {
                warn!(subscriber = id, event_type = event.kind(), "Subscriber queue full, event dropped");
            }
        }
        delivered
    }

    /// Register a new subscriber with the given queue capacity (0 = unbounded).
    #[must_use]
    pub fn subscribe(&self, capacity: usize) -> Subscription {
        let id = self.inner.next_id.fetch_add(1, Ordering::Relaxed);
        let queue = Arc::new(SubscriberQueue::new(capacity));
        self.inner.subscribers().push((id, queue.clone()));
        debug!(subscriber = id, capacity, "Subscriber registered");
        Subscription {
            id,
            queue,
            bus: Arc::downgrade(&self.inner),
        }
    }

    /// Remove a subscriber. Unknown or already removed ids are ignored.
    ///
    /// Returns whether a subscriber was removed. Events already queued stay
    /// available to the subscription handle.
    pub fn unregister(&self, id: SubscriberId) -> bool {
        let removed = self.inner.unregister(id);
        if removed {
            debug!(subscriber = id, "Subscriber unregistered");
        }
        removed
    }

    /// Remove and return every queued event, per subscriber.
    ///
    /// Registration state is untouched. Intended for diagnostics and tests.
    pub fn drain(&self) -> BTreeMap<SubscriberId, Vec<Event>> {
        self.inner
            .subscribers()
            .iter()
            .map(|(id, queue)| (*id, queue.drain()))
            .collect()
    }

    /// Number of registered subscribers.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.inner.subscribers().len()
    }
}

/// Handle to a registered subscriber queue.
///
/// Holds only a weak reference back to the bus. Dropping the handle
/// unregisters it.
#[derive(Debug)]
pub struct Subscription {
    id: SubscriberId,
    queue: Arc<SubscriberQueue>,
    bus: Weak<BusInner>,
}

impl Subscription {
    /// Subscriber identifier.
    #[must_use]
    pub fn id(&self) -> SubscriberId {
        self.id
    }

    /// Take the next queued event, if any.
    pub fn try_recv(&self) -> Option<Event> {
        self.queue.try_pop()
    }

    /// Wait up to `timeout` for the next event.
    pub async fn recv_timeout(&self, timeout: Duration) -> Option<Event> {
        self.queue.pop_timeout(timeout).await
    }

    /// Take every queued event.
    pub fn drain(&self) -> Vec<Event> {
        self.queue.drain()
    }

    /// Number of queued events.
    #[must_use]
    pub fn len(&self) -> usize {
        self.queue.len()
    }

    /// Whether the queue is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether the bus this handle was registered on still exists.
    #[must_use]
    pub fn is_bus_alive(&self) -> bool {
        self.bus.strong_count() > 0
    }

    /// Unregister from the bus. Idempotent.
    pub fn unregister(&self) {
        if let Some(bus) = self.bus.upgrade() {
            if bus.unregister(self.id) {
                debug!(subscriber = self.id, "Subscriber unregistered");
            }
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.unregister();
    }
}
