//! Shared identifier types used across the fulfillment core.

mod ids;
mod numbers;

pub use ids::{AggregateId, BuyerId, SellerId};
pub use numbers::{
    DisputeNumber, InvalidReferenceNumber, OrderNumber, ReferenceKind, TrackingNumber,
};
