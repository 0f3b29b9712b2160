//! Event journal
//!
//! A bus subscriber that appends every event it sees to the persistence
//! store, so the reporting side can list recent activity.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::event_bus::{Event, EventBus, EventHandler, LoopExit, SubscriptionLoop};
use crate::store::{EventRecord, PersistenceStore};

impl From<&Event> for EventRecord {
    fn from(event: &Event) -> Self {
        Self {
            kind: event.kind().to_string(),
            payload: event.payload().clone(),
            created_at: event.timestamp(),
        }
    }
}

/// Persists bus events.
pub struct EventJournal {
    store: Arc<dyn PersistenceStore>,
}

impl EventJournal {
    /// Create a journal writing to `store`.
    pub fn new(store: Arc<dyn PersistenceStore>) -> Self {
        Self { store }
    }

    /// Register on `bus` and persist events until `cancel` fires.
    pub fn spawn(self, bus: &EventBus, cancel: CancellationToken) -> JoinHandle<LoopExit> {
        SubscriptionLoop::new(bus.subscribe(0)).spawn(Arc::new(self), cancel)
    }
}

#[async_trait]
impl EventHandler for EventJournal {
    async fn handle(&self, event: &Event) -> anyhow::Result<()> {
        self.store.record_event(&EventRecord::from(event)).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use serde_json::json;
    use std::time::Duration;

    #[tokio::test]
    async fn test_journal_records_events() {
        let bus = EventBus::new();
        let store = Arc::new(MemoryStore::new());
        let cancel = CancellationToken::new();

        let handle = EventJournal::new(store.clone()).spawn(&bus, cancel.clone());

        bus.publish(Event::new("job.started", json!({ "keywords": ["k1"] })));
        bus.publish(Event::new("job.finished", json!({ "keywords": ["k1"] })));

        let deadline = tokio::time::Instant::now() + Duration::from_secs(2);
        while store.list_events(10).await.unwrap().len() < 2 && tokio::time::Instant::now() < deadline {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }

        let events = store.list_events(10).await.unwrap();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].kind, "job.finished");
        assert_eq!(events[1].payload["keywords"][0], "k1");

        cancel.cancel();
        assert_eq!(handle.await.unwrap(), LoopExit::Cancelled);
    }
}
