use dashmap::DashMap;
use uuid::Uuid;
use anyhow::{Result, bail};

use crate::event_sourcing::core::{Aggregate, DomainEvent, EventEnvelope};

// ============================================================================
// In-Memory Event Journal
// ============================================================================
//
// Append-only, per-aggregate event streams.
//
// Responsibilities:
// 1. Append events with an optimistic version check
// 2. Load event history for an aggregate
// 3. Rebuild an aggregate from its history
//
// Callers append while holding the aggregate's own lock, so a version
// conflict here means two writers bypassed that lock.
//
// ============================================================================

pub struct EventStore<E: DomainEvent> {
    streams: DashMap<Uuid, Vec<EventEnvelope<E>>>,
    aggregate_type_name: String,
}

impl<E: DomainEvent> EventStore<E> {
    pub fn new(aggregate_type_name: &str) -> Self {
        Self {
            streams: DashMap::new(),
            aggregate_type_name: aggregate_type_name.to_string(),
        }
    }

    /// Append events to the aggregate's stream.
    /// Returns the new version number after appending.
    pub async fn append_events(
        &self,
        aggregate_id: Uuid,
        expected_version: i64,
        events: Vec<E>,
        correlation_id: Uuid,
    ) -> Result<i64> {
        if events.is_empty() {
            bail!("Cannot append empty event list");
        }

        let mut stream = self.streams.entry(aggregate_id).or_default();
        let current_version = stream.last().map(|e| e.sequence_number).unwrap_or(0);
        if current_version != expected_version {
            bail!(
                "Concurrency conflict on {} {}: expected version {}, but current is {}",
                self.aggregate_type_name,
                aggregate_id,
                expected_version,
                current_version
            );
        }

        let event_count = events.len();
        let mut new_version = expected_version;
        for event in events {
            new_version += 1;
            stream.push(EventEnvelope::new(aggregate_id, new_version, event, correlation_id));
        }

        tracing::debug!(
            aggregate_id = %aggregate_id,
            aggregate_type = %self.aggregate_type_name,
            new_version = new_version,
            event_count = event_count,
            "Appended events to journal"
        );

        Ok(new_version)
    }

    /// Load all events for an aggregate, oldest first
    pub async fn load_events(&self, aggregate_id: Uuid) -> Result<Vec<EventEnvelope<E>>> {
        Ok(self
            .streams
            .get(&aggregate_id)
            .map(|stream| stream.clone())
            .unwrap_or_default())
    }

    pub async fn aggregate_exists(&self, aggregate_id: Uuid) -> bool {
        self.streams.contains_key(&aggregate_id)
    }

    /// Rebuild an aggregate by replaying its stream
    pub async fn load_aggregate<A>(&self, aggregate_id: Uuid) -> Result<A>
    where
        A: Aggregate<Event = E>,
        A::Error: std::fmt::Display,
    {
        let events = self.load_events(aggregate_id).await?;
        if events.is_empty() {
            bail!("{} {} has no history", self.aggregate_type_name, aggregate_id);
        }
        A::load_from_events(events)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::{Deserialize, Serialize};

    #[derive(Serialize, Deserialize, Clone, Debug)]
    struct Restocked(u32);

    impl DomainEvent for Restocked {
        fn event_type(&self) -> &'static str { "Restocked" }
    }

    #[tokio::test]
    async fn test_append_assigns_sequence_numbers() {
        let store = EventStore::<Restocked>::new("Part");
        let id = Uuid::new_v4();
        let correlation = Uuid::new_v4();

        let version = store
            .append_events(id, 0, vec![Restocked(1), Restocked(2)], correlation)
            .await
            .unwrap();
        assert_eq!(version, 2);

        let events = store.load_events(id).await.unwrap();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].sequence_number, 1);
        assert_eq!(events[1].sequence_number, 2);
        assert!(events.iter().all(|e| e.correlation_id == correlation));
    }

    #[tokio::test]
    async fn test_append_rejects_stale_version() {
        let store = EventStore::<Restocked>::new("Part");
        let id = Uuid::new_v4();

        store.append_events(id, 0, vec![Restocked(1)], Uuid::new_v4()).await.unwrap();
        let result = store.append_events(id, 0, vec![Restocked(2)], Uuid::new_v4()).await;

        assert!(result.is_err());
        assert_eq!(store.load_events(id).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_unknown_aggregate_has_empty_history() {
        let store = EventStore::<Restocked>::new("Part");
        let id = Uuid::new_v4();

        assert!(!store.aggregate_exists(id).await);
        assert!(store.load_events(id).await.unwrap().is_empty());
    }
}
