use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Coarse order status shown to buyers on marketplace pages.
///
/// Orders do not move through these states on their own; the status is
/// derived from shipment tracking through the bridge, except for
/// cancellation which is a direct order command.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    #[default]
    Pending,
    Processing,
    Packed,
    Shipped,
    Delivered,
    Cancelled,
}

impl OrderStatus {
    /// Returns true while the buyer can still cancel.
    ///
    /// Once the seller has packed the parcel, cancellation turns into a
    /// return or dispute instead.
    pub fn can_cancel(&self) -> bool {
        matches!(self, OrderStatus::Pending | OrderStatus::Processing)
    }

    /// Returns true for statuses the order never leaves.
    pub fn is_terminal(&self) -> bool {
        matches!(self, OrderStatus::Delivered | OrderStatus::Cancelled)
    }

    /// Returns the wire name of the status.
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Processing => "processing",
            OrderStatus::Packed => "packed",
            OrderStatus::Shipped => "shipped",
            OrderStatus::Delivered => "delivered",
            OrderStatus::Cancelled => "cancelled",
        }
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One step in the order's visible history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimelineEntry {
    /// The status the order reached.
    pub status: OrderStatus,

    /// When the status was reached.
    pub timestamp: DateTime<Utc>,

    /// Pre-rendered timestamp for display, e.g. "Aug 23, 2026 2:05 PM".
    pub display_time: String,
}

impl TimelineEntry {
    /// Creates a timeline entry, rendering the display form of the time.
    pub fn new(status: OrderStatus, timestamp: DateTime<Utc>) -> Self {
        Self {
            status,
            timestamp,
            display_time: timestamp.format("%b %-d, %Y %-I:%M %p").to_string(),
        }
    }
}
