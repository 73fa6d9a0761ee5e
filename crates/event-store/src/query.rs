use chrono::{DateTime, Utc};

use crate::{AggregateId, Version};

/// Filter criteria for querying stored events.
///
/// Used by read-side consumers that need a slice of the log, e.g. the
/// tracking history of one shipment or all dispute turns in a time window.
#[derive(Debug, Clone, Default)]
pub struct EventQuery {
    /// Restrict to a single aggregate.
    pub aggregate_id: Option<AggregateId>,

    /// Restrict to an aggregate type ("Order", "Shipment", "Dispute").
    pub aggregate_type: Option<String>,

    /// Restrict to any of these event types.
    pub event_types: Option<Vec<String>>,

    /// Minimum version, inclusive.
    pub from_version: Option<Version>,

    /// Events that occurred at or after this time.
    pub occurred_after: Option<DateTime<Utc>>,

    /// Events that occurred at or before this time.
    pub occurred_before: Option<DateTime<Utc>>,

    /// Maximum number of events to return.
    pub limit: Option<usize>,
}

impl EventQuery {
    /// Creates an empty query matching every event.
    pub fn new() -> Self {
        Self::default()
    }

    /// Query for a single aggregate's events.
    pub fn for_aggregate(aggregate_id: AggregateId) -> Self {
        Self {
            aggregate_id: Some(aggregate_id),
            ..Default::default()
        }
    }

    /// Restricts to an aggregate type.
    pub fn aggregate_type(mut self, aggregate_type: impl Into<String>) -> Self {
        self.aggregate_type = Some(aggregate_type.into());
        self
    }

    /// Restricts to a single event type.
    pub fn event_type(mut self, event_type: impl Into<String>) -> Self {
        self.event_types = Some(vec![event_type.into()]);
        self
    }

    /// Restricts to any of the given event types.
    pub fn event_types(mut self, event_types: Vec<String>) -> Self {
        self.event_types = Some(event_types);
        self
    }

    /// Restricts to versions at or above the given one.
    pub fn from_version(mut self, version: Version) -> Self {
        self.from_version = Some(version);
        self
    }

    /// Restricts to events occurring at or after the given time.
    pub fn occurred_after(mut self, at: DateTime<Utc>) -> Self {
        self.occurred_after = Some(at);
        self
    }

    /// Restricts to events occurring at or before the given time.
    pub fn occurred_before(mut self, at: DateTime<Utc>) -> Self {
        self.occurred_before = Some(at);
        self
    }

    /// Caps the number of returned events.
    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn for_aggregate_sets_only_the_id() {
        let id = AggregateId::new();
        let query = EventQuery::for_aggregate(id);
        assert_eq!(query.aggregate_id, Some(id));
        assert!(query.event_types.is_none());
        assert!(query.limit.is_none());
    }

    #[test]
    fn builder_chain() {
        let query = EventQuery::new()
            .aggregate_type("Dispute")
            .event_type("SellerResponded")
            .from_version(Version::new(2))
            .limit(10);

        assert_eq!(query.aggregate_type.as_deref(), Some("Dispute"));
        assert_eq!(
            query.event_types,
            Some(vec!["SellerResponded".to_string()])
        );
        assert_eq!(query.from_version, Some(Version::new(2)));
        assert_eq!(query.limit, Some(10));
    }
}
