//! Domain error types.

use thiserror::Error;

use crate::dispute::DisputeError;
use crate::order::OrderError;
use crate::shipment::ShipmentError;

/// Errors that can occur in the domain layer.
#[derive(Debug, Error)]
pub enum DomainError {
    /// Error from the event store.
    #[error("event store error: {0}")]
    EventStore(#[from] event_store::EventStoreError),

    /// Order business rule violation.
    #[error("order error: {0}")]
    Order(#[from] OrderError),

    /// Shipment business rule violation.
    #[error("shipment error: {0}")]
    Shipment(#[from] ShipmentError),

    /// Dispute business rule violation.
    #[error("dispute error: {0}")]
    Dispute(#[from] DisputeError),

    /// The aggregate was not found.
    #[error("{aggregate_type} not found: {aggregate_id}")]
    AggregateNotFound {
        aggregate_type: &'static str,
        aggregate_id: String,
    },

    /// Event payload serialization failed.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl DomainError {
    /// Returns true if the error is an optimistic concurrency conflict.
    ///
    /// Callers that lost a race can reload and retry.
    pub fn is_concurrency_conflict(&self) -> bool {
        matches!(
            self,
            DomainError::EventStore(event_store::EventStoreError::ConcurrencyConflict { .. })
        )
    }
}
