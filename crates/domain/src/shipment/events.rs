use chrono::{DateTime, Utc};
use common::{AggregateId, SellerId, TrackingNumber};
use serde::{Deserialize, Serialize};

use crate::aggregate::DomainEvent;

use super::{DeliveryProof, PackageSpec, TrackingEvent};

/// Events emitted by the shipment aggregate.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum ShipmentEvent {
    /// A shipment was opened for an order.
    ShipmentOpened {
        shipment_id: AggregateId,
        tracking_number: TrackingNumber,
        order_id: AggregateId,
        seller_id: SellerId,
        courier: Option<String>,
        package: Option<PackageSpec>,
        estimated_delivery: Option<DateTime<Utc>>,
        opened_at: DateTime<Utc>,
    },

    /// A courier scan was recorded.
    TrackingRecorded { entry: TrackingEvent },

    /// The courier reported the parcel's position without a status change.
    ///
    /// Carries a synthetic scan at the current status so the ping shows up
    /// in the customer-visible history.
    LocationPinged { entry: TrackingEvent },

    /// The parcel was handed over, with proof.
    DeliveryConfirmed {
        entry: TrackingEvent,
        proof: DeliveryProof,
    },

    /// A delivery attempt failed.
    DeliveryFailed {
        entry: TrackingEvent,
        reason: Option<String>,
    },
}

impl DomainEvent for ShipmentEvent {
    fn event_type(&self) -> &'static str {
        match self {
            ShipmentEvent::ShipmentOpened { .. } => "ShipmentOpened",
            ShipmentEvent::TrackingRecorded { .. } => "TrackingRecorded",
            ShipmentEvent::LocationPinged { .. } => "LocationPinged",
            ShipmentEvent::DeliveryConfirmed { .. } => "DeliveryConfirmed",
            ShipmentEvent::DeliveryFailed { .. } => "DeliveryFailed",
        }
    }

    fn occurred_at(&self) -> DateTime<Utc> {
        match self {
            ShipmentEvent::ShipmentOpened { opened_at, .. } => *opened_at,
            ShipmentEvent::TrackingRecorded { entry } => entry.occurred_at,
            ShipmentEvent::LocationPinged { entry } => entry.occurred_at,
            ShipmentEvent::DeliveryConfirmed { entry, .. } => entry.occurred_at,
            ShipmentEvent::DeliveryFailed { entry, .. } => entry.occurred_at,
        }
    }
}
