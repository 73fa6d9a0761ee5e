//! Shipment aggregate: the courier-facing tracking log.
//!
//! A shipment accumulates tracking events as couriers scan the parcel.
//! Webhooks arrive late and out of order, so the shipment's current status
//! is the status of the event with the latest occurrence time, not the
//! last one to arrive.

mod aggregate;
mod events;
mod service;
mod state;
mod value_objects;

pub use aggregate::Shipment;
pub use events::ShipmentEvent;
pub use service::ShipmentService;
pub use state::{InvalidShipmentStatus, ShipmentStatus};
pub use value_objects::{DeliveryProof, GeoPoint, LocationFix, PackageSpec, TrackingEvent};

use thiserror::Error;

/// Business rule violations for shipments.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ShipmentError {
    /// The shipment was already opened.
    #[error("shipment has already been opened")]
    AlreadyOpened,

    /// The shipment does not exist yet.
    #[error("shipment has not been opened")]
    NotOpened,

    /// The shipment reached a terminal status and takes no more updates.
    #[error("shipment is closed in status {status}")]
    Closed { status: ShipmentStatus },
}
