use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::ShipmentStatus;

/// A geographic coordinate reported by a courier scan.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub latitude: f64,
    pub longitude: f64,
}

/// The parcel's last known position.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocationFix {
    /// Coordinates, when the courier provides them.
    pub point: Option<GeoPoint>,

    /// Human-readable place, e.g. "Sorting facility, Rotterdam".
    pub address: String,

    /// When the parcel was seen there.
    pub recorded_at: DateTime<Utc>,
}

/// Evidence attached when a courier hands the parcel over.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeliveryProof {
    /// Who accepted the parcel, if recorded.
    pub delivered_to: Option<String>,

    /// Photo of the handed-over parcel.
    pub image_url: Option<String>,

    /// Recipient signature capture.
    pub signature_url: Option<String>,
}

/// Physical description of the parcel, as given by the seller.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PackageSpec {
    pub weight_grams: Option<u32>,
    pub length_cm: Option<u32>,
    pub width_cm: Option<u32>,
    pub height_cm: Option<u32>,
    pub description: Option<String>,
}

/// One scan in the shipment's tracking history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackingEvent {
    /// Unique identifier of this scan.
    pub id: Uuid,

    /// The status the courier reported.
    pub status: ShipmentStatus,

    /// Where the scan happened.
    pub location: String,

    /// Courier-provided description, e.g. "Arrived at sorting facility".
    pub description: String,

    /// The courier that produced the scan, when it differs from the
    /// shipment's main courier.
    pub courier: Option<String>,

    /// Coordinates of the scan, when provided.
    pub point: Option<GeoPoint>,

    /// When the scan happened in the world.
    pub occurred_at: DateTime<Utc>,
}

impl TrackingEvent {
    /// Creates a tracking event with a fresh identifier.
    pub fn new(
        status: ShipmentStatus,
        location: impl Into<String>,
        description: impl Into<String>,
        courier: Option<String>,
        point: Option<GeoPoint>,
        occurred_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            status,
            location: location.into(),
            description: description.into(),
            courier,
            point,
            occurred_at,
        }
    }
}
