use chrono::{DateTime, Utc};
use common::{AggregateId, BuyerId, DisputeNumber, SellerId};
use serde::{Deserialize, Serialize};

use crate::aggregate::DomainEvent;

use super::{DisputeKind, DisputeOutcome, DisputePriority, Evidence};

/// Events emitted by the dispute aggregate.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum DisputeEvent {
    /// A buyer opened a dispute against an order.
    DisputeOpened {
        dispute_id: AggregateId,
        dispute_number: DisputeNumber,
        order_id: AggregateId,
        buyer_id: BuyerId,
        seller_id: SellerId,
        kind: DisputeKind,
        reason: String,
        description: String,
        priority: DisputePriority,
        response_deadline: DateTime<Utc>,
        opened_at: DateTime<Utc>,
    },

    /// The seller submitted their single response.
    SellerResponded {
        text: String,
        responded_at: DateTime<Utc>,
    },

    /// The buyer replied, re-arming the response deadline.
    BuyerResponded {
        text: String,
        new_deadline: DateTime<Utc>,
        responded_at: DateTime<Utc>,
    },

    /// Evidence files were attached.
    EvidenceAdded {
        entries: Vec<Evidence>,
        added_at: DateTime<Utc>,
    },

    /// The dispute moved to platform review.
    EscalatedToReview { escalated_at: DateTime<Utc> },

    /// An admin closed the dispute with an outcome.
    DisputeResolved {
        outcome: DisputeOutcome,
        resolution: String,
        resolved_by: String,
        resolved_at: DateTime<Utc>,
    },
}

impl DomainEvent for DisputeEvent {
    fn event_type(&self) -> &'static str {
        match self {
            DisputeEvent::DisputeOpened { .. } => "DisputeOpened",
            DisputeEvent::SellerResponded { .. } => "SellerResponded",
            DisputeEvent::BuyerResponded { .. } => "BuyerResponded",
            DisputeEvent::EvidenceAdded { .. } => "EvidenceAdded",
            DisputeEvent::EscalatedToReview { .. } => "EscalatedToReview",
            DisputeEvent::DisputeResolved { .. } => "DisputeResolved",
        }
    }

    fn occurred_at(&self) -> DateTime<Utc> {
        match self {
            DisputeEvent::DisputeOpened { opened_at, .. } => *opened_at,
            DisputeEvent::SellerResponded { responded_at, .. } => *responded_at,
            DisputeEvent::BuyerResponded { responded_at, .. } => *responded_at,
            DisputeEvent::EvidenceAdded { added_at, .. } => *added_at,
            DisputeEvent::EscalatedToReview { escalated_at } => *escalated_at,
            DisputeEvent::DisputeResolved { resolved_at, .. } => *resolved_at,
        }
    }
}
