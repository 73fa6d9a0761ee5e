//! Fulfillment workflow errors.

use common::{AggregateId, DisputeNumber, ReferenceKind};
use domain::DomainError;
use thiserror::Error;

/// Errors surfaced by the fulfillment coordinators.
#[derive(Debug, Error)]
pub enum FulfillmentError {
    /// The referenced order does not exist.
    #[error("order not found: {0}")]
    OrderNotFound(AggregateId),

    /// The referenced shipment does not exist.
    #[error("shipment not found: {0}")]
    ShipmentNotFound(AggregateId),

    /// The referenced dispute does not exist.
    #[error("dispute not found: {0}")]
    DisputeNotFound(AggregateId),

    /// The caller is not allowed to act on this resource.
    #[error("forbidden: {0}")]
    Forbidden(String),

    /// The order already has a dispute that is still open.
    #[error("order {order_id} already has active dispute {dispute_number}")]
    ActiveDisputeExists {
        order_id: AggregateId,
        dispute_id: AggregateId,
        dispute_number: DisputeNumber,
    },

    /// The generator could not claim a fresh reference number.
    #[error("could not allocate a unique {kind:?} number")]
    NumberSpaceExhausted { kind: ReferenceKind },

    /// An evidence upload failed validation.
    #[error("upload rejected: {0}")]
    UploadRejected(String),

    /// Blob storage failed; nothing was recorded.
    #[error("blob storage failure: {0}")]
    BlobStorage(String),

    /// Error from the domain layer.
    #[error(transparent)]
    Domain(#[from] DomainError),
}

impl FulfillmentError {
    /// Returns true if the error is an optimistic concurrency conflict.
    pub fn is_concurrency_conflict(&self) -> bool {
        matches!(self, FulfillmentError::Domain(e) if e.is_concurrency_conflict())
    }
}
