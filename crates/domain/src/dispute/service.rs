//! Dispute service providing a simplified API for dispute operations.

use common::{AggregateId, BuyerId, DisputeNumber, SellerId};
use event_store::EventStore;

use crate::command::{CommandHandler, CommandResult};
use crate::error::DomainError;

use super::{Dispute, DisputeKind, DisputeOutcome, DisputePriority, Evidence};

/// Service for managing disputes.
pub struct DisputeService<S: EventStore> {
    handler: CommandHandler<S, Dispute>,
}

impl<S: EventStore> DisputeService<S> {
    /// Creates a new dispute service with the given event store.
    pub fn new(store: S) -> Self {
        Self {
            handler: CommandHandler::new(store),
        }
    }

    /// Returns a reference to the underlying command handler.
    pub fn handler(&self) -> &CommandHandler<S, Dispute> {
        &self.handler
    }

    /// Opens a dispute against an order.
    #[allow(clippy::too_many_arguments)]
    #[tracing::instrument(skip_all, fields(%dispute_id, %order_id, %dispute_number))]
    pub async fn open_dispute(
        &self,
        dispute_id: AggregateId,
        dispute_number: DisputeNumber,
        order_id: AggregateId,
        buyer_id: BuyerId,
        seller_id: SellerId,
        kind: DisputeKind,
        reason: String,
        description: String,
        priority: DisputePriority,
    ) -> Result<CommandResult<Dispute>, DomainError> {
        self.handler
            .execute(dispute_id, |dispute| {
                dispute.open(
                    dispute_id,
                    dispute_number,
                    order_id,
                    buyer_id,
                    seller_id,
                    kind,
                    reason,
                    description,
                    priority,
                )
            })
            .await
    }

    /// Submits the seller's single response, with optional evidence.
    #[tracing::instrument(skip_all, fields(%dispute_id))]
    pub async fn respond_as_seller(
        &self,
        dispute_id: AggregateId,
        text: String,
        evidence: Vec<Evidence>,
    ) -> Result<CommandResult<Dispute>, DomainError> {
        self.handler
            .execute(dispute_id, |dispute| {
                dispute.respond_as_seller(text, evidence)
            })
            .await
    }

    /// Submits the buyer's reply.
    #[tracing::instrument(skip_all, fields(%dispute_id))]
    pub async fn respond_as_buyer(
        &self,
        dispute_id: AggregateId,
        text: String,
    ) -> Result<CommandResult<Dispute>, DomainError> {
        self.handler
            .execute(dispute_id, |dispute| dispute.respond_as_buyer(text))
            .await
    }

    /// Attaches evidence to a dispute.
    #[tracing::instrument(skip_all, fields(%dispute_id))]
    pub async fn add_evidence(
        &self,
        dispute_id: AggregateId,
        entries: Vec<Evidence>,
    ) -> Result<CommandResult<Dispute>, DomainError> {
        self.handler
            .execute(dispute_id, |dispute| dispute.add_evidence(entries))
            .await
    }

    /// Escalates a dispute to platform review.
    #[tracing::instrument(skip(self), fields(%dispute_id))]
    pub async fn escalate(
        &self,
        dispute_id: AggregateId,
    ) -> Result<CommandResult<Dispute>, DomainError> {
        self.handler
            .execute(dispute_id, |dispute| dispute.escalate())
            .await
    }

    /// Closes a dispute with an outcome.
    #[tracing::instrument(skip_all, fields(%dispute_id, ?outcome))]
    pub async fn resolve(
        &self,
        dispute_id: AggregateId,
        outcome: DisputeOutcome,
        resolution: String,
        resolved_by: String,
    ) -> Result<CommandResult<Dispute>, DomainError> {
        self.handler
            .execute(dispute_id, |dispute| {
                dispute.resolve(outcome, resolution, resolved_by)
            })
            .await
    }

    /// Loads a dispute by ID, or None if it doesn't exist.
    #[tracing::instrument(skip(self), fields(%dispute_id))]
    pub async fn get_dispute(
        &self,
        dispute_id: AggregateId,
    ) -> Result<Option<Dispute>, DomainError> {
        self.handler.load_existing(dispute_id).await
    }

    /// Loads a dispute by ID, failing if it doesn't exist.
    pub async fn require_dispute(
        &self,
        dispute_id: AggregateId,
    ) -> Result<Dispute, DomainError> {
        self.handler.load_required(dispute_id).await
    }
}
