use std::pin::Pin;

use async_trait::async_trait;
use futures_core::Stream;

use crate::{AggregateId, EventQuery, EventStoreError, Result, StoredEvent, Version};

/// Options for appending events to the store.
#[derive(Debug, Clone, Default)]
pub struct AppendOptions {
    /// Expected current version of the aggregate.
    ///
    /// When set, the append fails with [`EventStoreError::ConcurrencyConflict`]
    /// if the aggregate has moved past this version. Unset skips the check.
    pub expected_version: Option<Version>,
}

impl AppendOptions {
    /// No version check.
    pub fn new() -> Self {
        Self::default()
    }

    /// Expects the aggregate to be at a specific version.
    pub fn expect_version(version: Version) -> Self {
        Self {
            expected_version: Some(version),
        }
    }

    /// Expects the aggregate to not exist yet.
    pub fn expect_new() -> Self {
        Self {
            expected_version: Some(Version::initial()),
        }
    }
}

/// A stream of stored events.
pub type EventStream = Pin<Box<dyn Stream<Item = Result<StoredEvent>> + Send>>;

/// Core trait for event store implementations.
///
/// All implementations must be thread-safe; the HTTP layer issues
/// concurrent requests against the same aggregates.
#[async_trait]
pub trait EventStore: Send + Sync {
    /// Appends a batch of events atomically.
    ///
    /// Either all events are persisted or none are. Returns the aggregate
    /// version after the append.
    async fn append(&self, events: Vec<StoredEvent>, options: AppendOptions) -> Result<Version>;

    /// Returns all events for an aggregate in version order.
    async fn events_for_aggregate(&self, aggregate_id: AggregateId) -> Result<Vec<StoredEvent>>;

    /// Returns events matching a query, ordered by domain timestamp.
    async fn query_events(&self, query: EventQuery) -> Result<Vec<StoredEvent>>;

    /// Streams every event in the store in ingestion order.
    ///
    /// Used by the projection processor for catch-up and rebuild.
    async fn stream_all_events(&self) -> Result<EventStream>;

    /// Returns the current version of an aggregate, or None if it has no events.
    async fn aggregate_version(&self, aggregate_id: AggregateId) -> Result<Option<Version>>;
}

/// Convenience methods implemented for every event store.
#[async_trait]
pub trait EventStoreExt: EventStore {
    /// Appends a single event.
    async fn append_event(&self, event: StoredEvent, options: AppendOptions) -> Result<Version> {
        self.append(vec![event], options).await
    }

    /// Returns true if the aggregate has at least one event.
    async fn aggregate_exists(&self, aggregate_id: AggregateId) -> Result<bool> {
        Ok(self.aggregate_version(aggregate_id).await?.is_some())
    }
}

impl<T: EventStore + ?Sized> EventStoreExt for T {}

/// Validates an event batch before appending.
///
/// A batch must be non-empty, target a single aggregate, and carry
/// sequential versions.
pub fn validate_batch(events: &[StoredEvent]) -> Result<()> {
    let first = events
        .first()
        .ok_or_else(|| EventStoreError::InvalidBatch("empty event batch".to_string()))?;

    let mut expected = first.version;
    for event in events.iter().skip(1) {
        if event.aggregate_id != first.aggregate_id {
            return Err(EventStoreError::InvalidBatch(
                "all events in a batch must target the same aggregate".to_string(),
            ));
        }
        if event.aggregate_type != first.aggregate_type {
            return Err(EventStoreError::InvalidBatch(
                "all events in a batch must share an aggregate type".to_string(),
            ));
        }
        expected = expected.next();
        if event.version != expected {
            return Err(EventStoreError::InvalidBatch(format!(
                "event versions must be sequential: expected {}, got {}",
                expected, event.version
            )));
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn event(aggregate_id: AggregateId, version: i64) -> StoredEvent {
        StoredEvent::new(
            aggregate_id,
            "Shipment",
            "TrackingRecorded",
            Version::new(version),
            &serde_json::json!({}),
        )
        .unwrap()
    }

    #[test]
    fn empty_batch_rejected() {
        assert!(matches!(
            validate_batch(&[]),
            Err(EventStoreError::InvalidBatch(_))
        ));
    }

    #[test]
    fn mixed_aggregates_rejected() {
        let batch = vec![event(AggregateId::new(), 1), event(AggregateId::new(), 2)];
        assert!(validate_batch(&batch).is_err());
    }

    #[test]
    fn non_sequential_versions_rejected() {
        let id = AggregateId::new();
        let batch = vec![event(id, 1), event(id, 3)];
        assert!(validate_batch(&batch).is_err());
    }

    #[test]
    fn sequential_batch_accepted() {
        let id = AggregateId::new();
        let batch = vec![event(id, 1), event(id, 2), event(id, 3)];
        assert!(validate_batch(&batch).is_ok());
    }
}
