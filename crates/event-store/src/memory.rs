use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::{
    AggregateId, EventQuery, EventStoreError, Result, StoredEvent, Version,
    store::{AppendOptions, EventStore, EventStream, validate_batch},
};

/// In-memory event store used in tests and local development.
///
/// Provides the same semantics as the PostgreSQL implementation, including
/// the expected-version conflict check.
#[derive(Clone, Default)]
pub struct InMemoryEventStore {
    events: Arc<RwLock<Vec<StoredEvent>>>,
}

impl InMemoryEventStore {
    /// Creates a new empty in-memory event store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the total number of events stored.
    pub async fn event_count(&self) -> usize {
        self.events.read().await.len()
    }

    /// Clears all events.
    pub async fn clear(&self) {
        self.events.write().await.clear();
    }
}

#[async_trait]
impl EventStore for InMemoryEventStore {
    async fn append(&self, events: Vec<StoredEvent>, options: AppendOptions) -> Result<Version> {
        validate_batch(&events)?;

        let aggregate_id = events[0].aggregate_id;
        let mut store = self.events.write().await;

        let current_version = store
            .iter()
            .filter(|e| e.aggregate_id == aggregate_id)
            .map(|e| e.version)
            .max()
            .unwrap_or(Version::initial());

        if let Some(expected) = options.expected_version
            && current_version != expected
        {
            return Err(EventStoreError::ConcurrencyConflict {
                aggregate_id,
                expected,
                actual: current_version,
            });
        }

        // Simulates the unique (aggregate_id, version) constraint.
        if events[0].version <= current_version && current_version != Version::initial() {
            return Err(EventStoreError::ConcurrencyConflict {
                aggregate_id,
                expected: options.expected_version.unwrap_or(current_version),
                actual: current_version,
            });
        }

        let last_version = events.last().map(|e| e.version).unwrap_or(current_version);
        store.extend(events);
        metrics::counter!("event_store_appends_total").increment(1);

        Ok(last_version)
    }

    async fn events_for_aggregate(&self, aggregate_id: AggregateId) -> Result<Vec<StoredEvent>> {
        let store = self.events.read().await;
        let mut events: Vec<_> = store
            .iter()
            .filter(|e| e.aggregate_id == aggregate_id)
            .cloned()
            .collect();
        events.sort_by_key(|e| e.version);
        Ok(events)
    }

    async fn query_events(&self, query: EventQuery) -> Result<Vec<StoredEvent>> {
        let store = self.events.read().await;
        let mut events: Vec<_> = store
            .iter()
            .filter(|e| {
                if let Some(id) = query.aggregate_id
                    && e.aggregate_id != id
                {
                    return false;
                }
                if let Some(ref agg_type) = query.aggregate_type
                    && &e.aggregate_type != agg_type
                {
                    return false;
                }
                if let Some(ref types) = query.event_types
                    && !types.contains(&e.event_type)
                {
                    return false;
                }
                if let Some(from) = query.from_version
                    && e.version < from
                {
                    return false;
                }
                if let Some(after) = query.occurred_after
                    && e.occurred_at < after
                {
                    return false;
                }
                if let Some(before) = query.occurred_before
                    && e.occurred_at > before
                {
                    return false;
                }
                true
            })
            .cloned()
            .collect();

        events.sort_by(|a, b| {
            a.occurred_at
                .cmp(&b.occurred_at)
                .then(a.version.cmp(&b.version))
        });

        if let Some(limit) = query.limit {
            events.truncate(limit);
        }

        Ok(events)
    }

    async fn stream_all_events(&self) -> Result<EventStream> {
        use futures_util::stream;

        let store = self.events.read().await;
        let mut events = store.clone();
        events.sort_by(|a, b| {
            a.recorded_at
                .cmp(&b.recorded_at)
                .then(a.event_id.as_uuid().cmp(&b.event_id.as_uuid()))
        });

        Ok(Box::pin(stream::iter(events.into_iter().map(Ok))))
    }

    async fn aggregate_version(&self, aggregate_id: AggregateId) -> Result<Option<Version>> {
        let store = self.events.read().await;
        Ok(store
            .iter()
            .filter(|e| e.aggregate_id == aggregate_id)
            .map(|e| e.version)
            .max())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tracking_event(aggregate_id: AggregateId, version: i64, event_type: &str) -> StoredEvent {
        StoredEvent::new(
            aggregate_id,
            "Shipment",
            event_type,
            Version::new(version),
            &serde_json::json!({"status": "in_transit"}),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn append_and_read_back() {
        let store = InMemoryEventStore::new();
        let id = AggregateId::new();

        let version = store
            .append(
                vec![tracking_event(id, 1, "ShipmentOpened")],
                AppendOptions::expect_new(),
            )
            .await
            .unwrap();
        assert_eq!(version, Version::first());

        let events = store.events_for_aggregate(id).await.unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].event_type, "ShipmentOpened");
    }

    #[tokio::test]
    async fn append_batch_returns_last_version() {
        let store = InMemoryEventStore::new();
        let id = AggregateId::new();

        let version = store
            .append(
                vec![
                    tracking_event(id, 1, "ShipmentOpened"),
                    tracking_event(id, 2, "TrackingRecorded"),
                    tracking_event(id, 3, "TrackingRecorded"),
                ],
                AppendOptions::expect_new(),
            )
            .await
            .unwrap();

        assert_eq!(version, Version::new(3));
        assert_eq!(store.event_count().await, 3);
    }

    #[tokio::test]
    async fn stale_expected_version_conflicts() {
        let store = InMemoryEventStore::new();
        let id = AggregateId::new();

        store
            .append(
                vec![tracking_event(id, 1, "ShipmentOpened")],
                AppendOptions::expect_new(),
            )
            .await
            .unwrap();

        let result = store
            .append(
                vec![tracking_event(id, 2, "TrackingRecorded")],
                AppendOptions::expect_version(Version::initial()),
            )
            .await;

        assert!(matches!(
            result,
            Err(EventStoreError::ConcurrencyConflict { .. })
        ));
    }

    #[tokio::test]
    async fn matching_expected_version_succeeds() {
        let store = InMemoryEventStore::new();
        let id = AggregateId::new();

        store
            .append(
                vec![tracking_event(id, 1, "ShipmentOpened")],
                AppendOptions::expect_new(),
            )
            .await
            .unwrap();

        let result = store
            .append(
                vec![tracking_event(id, 2, "TrackingRecorded")],
                AppendOptions::expect_version(Version::first()),
            )
            .await;

        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn query_orders_by_occurred_at_not_arrival() {
        let store = InMemoryEventStore::new();
        let id = AggregateId::new();

        let newer = tracking_event(id, 1, "TrackingRecorded");
        let older = tracking_event(id, 2, "TrackingRecorded")
            .at(chrono::Utc::now() - chrono::Duration::hours(2));

        store
            .append(vec![newer, older], AppendOptions::expect_new())
            .await
            .unwrap();

        let events = store
            .query_events(EventQuery::for_aggregate(id))
            .await
            .unwrap();
        assert_eq!(events.len(), 2);
        // The late-arriving but older fact sorts first.
        assert_eq!(events[0].version, Version::new(2));
        assert_eq!(events[1].version, Version::new(1));
    }

    #[tokio::test]
    async fn query_filters_by_event_type() {
        let store = InMemoryEventStore::new();
        let id1 = AggregateId::new();
        let id2 = AggregateId::new();

        store
            .append(
                vec![tracking_event(id1, 1, "DisputeOpened")],
                AppendOptions::new(),
            )
            .await
            .unwrap();
        store
            .append(
                vec![tracking_event(id2, 1, "SellerResponded")],
                AppendOptions::new(),
            )
            .await
            .unwrap();

        let opened = store
            .query_events(EventQuery::new().event_type("DisputeOpened"))
            .await
            .unwrap();
        assert_eq!(opened.len(), 1);
        assert_eq!(opened[0].aggregate_id, id1);
    }

    #[tokio::test]
    async fn stream_yields_all_events() {
        use futures_util::StreamExt;

        let store = InMemoryEventStore::new();
        store
            .append(
                vec![tracking_event(AggregateId::new(), 1, "OrderPlaced")],
                AppendOptions::new(),
            )
            .await
            .unwrap();
        store
            .append(
                vec![tracking_event(AggregateId::new(), 1, "ShipmentOpened")],
                AppendOptions::new(),
            )
            .await
            .unwrap();

        let stream = store.stream_all_events().await.unwrap();
        let events: Vec<_> = stream.collect().await;
        assert_eq!(events.len(), 2);
    }

    #[tokio::test]
    async fn aggregate_version_tracks_latest() {
        let store = InMemoryEventStore::new();
        let id = AggregateId::new();

        assert_eq!(store.aggregate_version(id).await.unwrap(), None);

        store
            .append(
                vec![
                    tracking_event(id, 1, "ShipmentOpened"),
                    tracking_event(id, 2, "TrackingRecorded"),
                ],
                AppendOptions::new(),
            )
            .await
            .unwrap();

        assert_eq!(
            store.aggregate_version(id).await.unwrap(),
            Some(Version::new(2))
        );
    }
}
