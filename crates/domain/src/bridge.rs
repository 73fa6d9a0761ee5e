//! Mapping between shipment and order status vocabularies.
//!
//! Couriers speak in fine-grained scan statuses; buyers see a coarse
//! five-step order status. The forward map runs on every tracking event to
//! keep the order in step. The reverse map synthesizes a plausible tracking
//! view for orders that have no shipment yet.

use crate::order::OrderStatus;
use crate::shipment::ShipmentStatus;

/// Returns the coarse order status a shipment status maps to.
///
/// `failed_delivery` stays at `shipped`: the parcel is still with the
/// courier and the next attempt may succeed. Only `returned` unwinds the
/// order to `cancelled`.
pub fn order_status_for(status: ShipmentStatus) -> OrderStatus {
    match status {
        ShipmentStatus::Pending | ShipmentStatus::PaymentVerified => OrderStatus::Pending,
        ShipmentStatus::SellerConfirmed => OrderStatus::Processing,
        ShipmentStatus::Packed => OrderStatus::Packed,
        ShipmentStatus::Shipped
        | ShipmentStatus::InTransit
        | ShipmentStatus::OutForDelivery
        | ShipmentStatus::FailedDelivery => OrderStatus::Shipped,
        ShipmentStatus::Delivered => OrderStatus::Delivered,
        ShipmentStatus::Returned => OrderStatus::Cancelled,
    }
}

/// Returns the representative shipment status for an order status.
///
/// Used to render a pseudo tracking view for orders without a shipment.
pub fn default_shipment_status(status: OrderStatus) -> ShipmentStatus {
    match status {
        OrderStatus::Pending => ShipmentStatus::Pending,
        OrderStatus::Processing => ShipmentStatus::SellerConfirmed,
        OrderStatus::Packed => ShipmentStatus::Packed,
        OrderStatus::Shipped => ShipmentStatus::Shipped,
        OrderStatus::Delivered => ShipmentStatus::Delivered,
        OrderStatus::Cancelled => ShipmentStatus::Returned,
    }
}
