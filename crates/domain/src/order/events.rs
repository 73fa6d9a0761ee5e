use chrono::{DateTime, Utc};
use common::{AggregateId, BuyerId, OrderNumber, SellerId};
use serde::{Deserialize, Serialize};

use crate::aggregate::DomainEvent;

use super::OrderStatus;

/// Events emitted by the order aggregate.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum OrderEvent {
    /// A buyer placed an order with a seller.
    OrderPlaced {
        order_id: AggregateId,
        order_number: OrderNumber,
        buyer_id: BuyerId,
        seller_id: SellerId,
        buyer_email: Option<String>,
        shipping_address: Option<String>,
        total_cents: i64,
        placed_at: DateTime<Utc>,
    },

    /// Tracking activity moved the order to a new coarse status.
    StatusBridged {
        status: OrderStatus,
        note: Option<String>,
        changed_at: DateTime<Utc>,
    },

    /// The order was cancelled before shipping.
    OrderCancelled {
        reason: String,
        cancelled_by: String,
        cancelled_at: DateTime<Utc>,
    },
}

impl DomainEvent for OrderEvent {
    fn event_type(&self) -> &'static str {
        match self {
            OrderEvent::OrderPlaced { .. } => "OrderPlaced",
            OrderEvent::StatusBridged { .. } => "StatusBridged",
            OrderEvent::OrderCancelled { .. } => "OrderCancelled",
        }
    }

    fn occurred_at(&self) -> DateTime<Utc> {
        match self {
            OrderEvent::OrderPlaced { placed_at, .. } => *placed_at,
            OrderEvent::StatusBridged { changed_at, .. } => *changed_at,
            OrderEvent::OrderCancelled { cancelled_at, .. } => *cancelled_at,
        }
    }
}
