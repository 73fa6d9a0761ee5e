use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Fine-grained shipment status reported by courier scans.
///
/// This is the vocabulary courier webhooks speak. The bridge collapses it
/// onto the coarse [`crate::order::OrderStatus`] buyers see.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShipmentStatus {
    #[default]
    Pending,
    PaymentVerified,
    SellerConfirmed,
    Packed,
    Shipped,
    InTransit,
    OutForDelivery,
    Delivered,
    FailedDelivery,
    Returned,
}

impl ShipmentStatus {
    /// Returns true for statuses the shipment never leaves.
    ///
    /// `failed_delivery` is not terminal: the courier retries the next
    /// working day, or the parcel comes back as `returned`.
    pub fn is_terminal(&self) -> bool {
        matches!(self, ShipmentStatus::Delivered | ShipmentStatus::Returned)
    }

    /// Returns the wire name of the status.
    pub fn as_str(&self) -> &'static str {
        match self {
            ShipmentStatus::Pending => "pending",
            ShipmentStatus::PaymentVerified => "payment_verified",
            ShipmentStatus::SellerConfirmed => "seller_confirmed",
            ShipmentStatus::Packed => "packed",
            ShipmentStatus::Shipped => "shipped",
            ShipmentStatus::InTransit => "in_transit",
            ShipmentStatus::OutForDelivery => "out_for_delivery",
            ShipmentStatus::Delivered => "delivered",
            ShipmentStatus::FailedDelivery => "failed_delivery",
            ShipmentStatus::Returned => "returned",
        }
    }
}

impl std::fmt::Display for ShipmentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing an unknown status string.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unknown shipment status: {0}")]
pub struct InvalidShipmentStatus(pub String);

impl std::str::FromStr for ShipmentStatus {
    type Err = InvalidShipmentStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(ShipmentStatus::Pending),
            "payment_verified" => Ok(ShipmentStatus::PaymentVerified),
            "seller_confirmed" => Ok(ShipmentStatus::SellerConfirmed),
            "packed" => Ok(ShipmentStatus::Packed),
            "shipped" => Ok(ShipmentStatus::Shipped),
            "in_transit" => Ok(ShipmentStatus::InTransit),
            "out_for_delivery" => Ok(ShipmentStatus::OutForDelivery),
            "delivered" => Ok(ShipmentStatus::Delivered),
            "failed_delivery" => Ok(ShipmentStatus::FailedDelivery),
            "returned" => Ok(ShipmentStatus::Returned),
            other => Err(InvalidShipmentStatus(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn terminal_statuses() {
        assert!(ShipmentStatus::Delivered.is_terminal());
        assert!(ShipmentStatus::Returned.is_terminal());
        assert!(!ShipmentStatus::FailedDelivery.is_terminal());
        assert!(!ShipmentStatus::OutForDelivery.is_terminal());
    }

    #[test]
    fn parse_round_trips_every_status() {
        for status in [
            ShipmentStatus::Pending,
            ShipmentStatus::PaymentVerified,
            ShipmentStatus::SellerConfirmed,
            ShipmentStatus::Packed,
            ShipmentStatus::Shipped,
            ShipmentStatus::InTransit,
            ShipmentStatus::OutForDelivery,
            ShipmentStatus::Delivered,
            ShipmentStatus::FailedDelivery,
            ShipmentStatus::Returned,
        ] {
            assert_eq!(status.as_str().parse::<ShipmentStatus>(), Ok(status));
        }
    }

    #[test]
    fn parse_rejects_unknown_status() {
        assert!("lost_in_warehouse".parse::<ShipmentStatus>().is_err());
    }
}
