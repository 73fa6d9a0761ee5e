//! Dispute coordinator: authorization and the one-active-dispute rule.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use common::{AggregateId, BuyerId, SellerId};
use domain::dispute::{
    Dispute, DisputeKind, DisputeOutcome, DisputePriority, DisputeService, Party,
};
use domain::order::OrderService;
use event_store::{EventQuery, EventStore};
use tokio::sync::RwLock;

use crate::actor::Actor;
use crate::blob::{BlobStore, UploadFile, store_evidence};
use crate::error::FulfillmentError;
use crate::numbers::NumberGenerator;

/// Coordinates the dispute workflow on top of the dispute service.
///
/// Holds the order-to-active-dispute index that enforces at most one open
/// dispute per order. The index is rebuilt from the event log at startup
/// via [`DisputeCoordinator::rebuild_active_index`].
pub struct DisputeCoordinator<S, B>
where
    S: EventStore + Clone,
    B: BlobStore,
{
    store: S,
    disputes: DisputeService<S>,
    orders: OrderService<S>,
    numbers: NumberGenerator,
    blobs: B,
    active: Arc<RwLock<HashMap<AggregateId, AggregateId>>>,
}

impl<S, B> DisputeCoordinator<S, B>
where
    S: EventStore + Clone,
    B: BlobStore,
{
    /// Creates a new dispute coordinator.
    pub fn new(store: S, numbers: NumberGenerator, blobs: B) -> Self {
        Self {
            disputes: DisputeService::new(store.clone()),
            orders: OrderService::new(store.clone()),
            store,
            numbers,
            blobs,
            active: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Returns the dispute service, for read paths.
    pub fn disputes(&self) -> &DisputeService<S> {
        &self.disputes
    }

    /// Rebuilds the active-dispute index from the event log.
    pub async fn rebuild_active_index(&self) -> Result<(), FulfillmentError> {
        let opened = self
            .store
            .query_events(EventQuery::new().event_type("DisputeOpened"))
            .await
            .map_err(domain::DomainError::from)?;

        let mut active = self.active.write().await;
        active.clear();
        for stored in opened {
            if let Some(dispute) = self.disputes.get_dispute(stored.aggregate_id).await?
                && dispute.status().is_active()
                && let Some(order_id) = dispute.order_id()
            {
                active.insert(order_id, stored.aggregate_id);
            }
        }
        tracing::info!(active = active.len(), "rebuilt active dispute index");
        Ok(())
    }

    /// Opens a dispute for the calling buyer, with optional evidence.
    ///
    /// Evidence files are stored before the dispute is created; if the
    /// order already has an open dispute the call fails and names it.
    #[tracing::instrument(skip_all, fields(actor = actor.role(), %order_id, ?kind))]
    pub async fn open_dispute(
        &self,
        actor: &Actor,
        order_id: AggregateId,
        kind: DisputeKind,
        reason: String,
        description: String,
        priority: DisputePriority,
        files: Vec<UploadFile>,
    ) -> Result<Dispute, FulfillmentError> {
        let Actor::Buyer(buyer_id) = actor else {
            return Err(FulfillmentError::Forbidden(
                "only buyers open disputes".to_string(),
            ));
        };

        let order = self
            .orders
            .get_order(order_id)
            .await?
            .ok_or(FulfillmentError::OrderNotFound(order_id))?;
        if order.buyer_id() != Some(*buyer_id) {
            return Err(FulfillmentError::Forbidden(
                "only the buyer on this order may dispute it".to_string(),
            ));
        }
        let seller_id = order
            .seller_id()
            .ok_or(FulfillmentError::OrderNotFound(order_id))?;

        self.check_no_active_dispute(order_id).await?;

        let evidence = store_evidence(&self.blobs, &files, Party::Buyer).await?;

        // Re-checked under the write lock so racing opens serialize.
        let mut active = self.active.write().await;
        if let Some(&existing) = active.get(&order_id) {
            if let Some(dispute) = self.disputes.get_dispute(existing).await?
                && dispute.status().is_active()
            {
                let dispute_number = dispute
                    .dispute_number()
                    .cloned()
                    .ok_or(FulfillmentError::DisputeNotFound(existing))?;
                return Err(FulfillmentError::ActiveDisputeExists {
                    order_id,
                    dispute_id: existing,
                    dispute_number,
                });
            }
            active.remove(&order_id);
        }

        let dispute_id = AggregateId::new();
        let dispute_number = self.numbers.dispute_number().await?;
        let result = self
            .disputes
            .open_dispute(
                dispute_id,
                dispute_number,
                order_id,
                *buyer_id,
                seller_id,
                kind,
                reason,
                description,
                priority,
            )
            .await?;
        active.insert(order_id, dispute_id);
        drop(active);

        let dispute = if evidence.is_empty() {
            result.aggregate
        } else {
            self.disputes
                .add_evidence(dispute_id, evidence)
                .await?
                .aggregate
        };

        metrics::counter!("disputes_opened_total").increment(1);
        Ok(dispute)
    }

    /// Submits the seller's single response, with optional evidence.
    ///
    /// Deadlines are soft: a response after the window is accepted and
    /// logged, and the overdue flag simply clears.
    #[tracing::instrument(skip_all, fields(actor = actor.role(), %dispute_id))]
    pub async fn seller_respond(
        &self,
        actor: &Actor,
        dispute_id: AggregateId,
        text: String,
        files: Vec<UploadFile>,
    ) -> Result<Dispute, FulfillmentError> {
        let dispute = self.require_dispute(dispute_id).await?;
        actor.require_seller(dispute_seller(&dispute, dispute_id)?)?;

        if dispute.is_overdue(Utc::now()) {
            tracing::warn!(%dispute_id, "seller response arrived after the deadline");
        }

        let evidence = store_evidence(&self.blobs, &files, Party::Seller).await?;
        let result = self
            .disputes
            .respond_as_seller(dispute_id, text, evidence)
            .await?;
        Ok(result.aggregate)
    }

    /// Submits the buyer's reply to the seller's response.
    #[tracing::instrument(skip_all, fields(actor = actor.role(), %dispute_id))]
    pub async fn buyer_respond(
        &self,
        actor: &Actor,
        dispute_id: AggregateId,
        text: String,
    ) -> Result<Dispute, FulfillmentError> {
        let dispute = self.require_dispute(dispute_id).await?;
        actor.require_buyer(dispute_buyer(&dispute, dispute_id)?)?;

        let result = self.disputes.respond_as_buyer(dispute_id, text).await?;
        Ok(result.aggregate)
    }

    /// Attaches evidence files submitted by either party.
    #[tracing::instrument(skip_all, fields(actor = actor.role(), %dispute_id))]
    pub async fn upload_evidence(
        &self,
        actor: &Actor,
        dispute_id: AggregateId,
        files: Vec<UploadFile>,
    ) -> Result<Dispute, FulfillmentError> {
        let dispute = self.require_dispute(dispute_id).await?;
        actor.require_party(
            dispute_buyer(&dispute, dispute_id)?,
            dispute_seller(&dispute, dispute_id)?,
        )?;

        let evidence = store_evidence(&self.blobs, &files, actor.party()).await?;
        let result = self.disputes.add_evidence(dispute_id, evidence).await?;
        Ok(result.aggregate)
    }

    /// Escalates a dispute to platform review.
    #[tracing::instrument(skip_all, fields(actor = actor.role(), %dispute_id))]
    pub async fn escalate(
        &self,
        actor: &Actor,
        dispute_id: AggregateId,
    ) -> Result<Dispute, FulfillmentError> {
        let dispute = self.require_dispute(dispute_id).await?;
        actor.require_party(
            dispute_buyer(&dispute, dispute_id)?,
            dispute_seller(&dispute, dispute_id)?,
        )?;

        let result = self.disputes.escalate(dispute_id).await?;
        metrics::counter!("disputes_escalated_total").increment(1);
        Ok(result.aggregate)
    }

    /// Closes a dispute with an outcome. Admin only.
    #[tracing::instrument(skip_all, fields(actor = actor.role(), %dispute_id, ?outcome))]
    pub async fn resolve(
        &self,
        actor: &Actor,
        dispute_id: AggregateId,
        outcome: DisputeOutcome,
        resolution: String,
        resolved_by: String,
    ) -> Result<Dispute, FulfillmentError> {
        actor.require_admin()?;
        let dispute = self.require_dispute(dispute_id).await?;

        let result = self
            .disputes
            .resolve(dispute_id, outcome, resolution, resolved_by)
            .await?;

        if let Some(order_id) = dispute.order_id() {
            let mut active = self.active.write().await;
            if active.get(&order_id) == Some(&dispute_id) {
                active.remove(&order_id);
            }
        }

        metrics::counter!("disputes_resolved_total").increment(1);
        Ok(result.aggregate)
    }

    /// Loads a dispute for one of its parties or an admin.
    pub async fn get_dispute(
        &self,
        actor: &Actor,
        dispute_id: AggregateId,
    ) -> Result<Dispute, FulfillmentError> {
        let dispute = self.require_dispute(dispute_id).await?;
        actor.require_party(
            dispute_buyer(&dispute, dispute_id)?,
            dispute_seller(&dispute, dispute_id)?,
        )?;
        Ok(dispute)
    }

    async fn require_dispute(
        &self,
        dispute_id: AggregateId,
    ) -> Result<Dispute, FulfillmentError> {
        self.disputes
            .get_dispute(dispute_id)
            .await?
            .ok_or(FulfillmentError::DisputeNotFound(dispute_id))
    }

    /// Fails with the existing dispute's identity if the order has one open.
    async fn check_no_active_dispute(
        &self,
        order_id: AggregateId,
    ) -> Result<(), FulfillmentError> {
        let existing = { self.active.read().await.get(&order_id).copied() };
        if let Some(dispute_id) = existing {
            if let Some(dispute) = self.disputes.get_dispute(dispute_id).await?
                && dispute.status().is_active()
            {
                let dispute_number = dispute
                    .dispute_number()
                    .cloned()
                    .ok_or(FulfillmentError::DisputeNotFound(dispute_id))?;
                return Err(FulfillmentError::ActiveDisputeExists {
                    order_id,
                    dispute_id,
                    dispute_number,
                });
            }
            // Stale entry: the dispute closed without an index update.
            self.active.write().await.remove(&order_id);
        }
        Ok(())
    }
}

fn dispute_buyer(dispute: &Dispute, dispute_id: AggregateId) -> Result<BuyerId, FulfillmentError> {
    dispute
        .buyer_id()
        .ok_or(FulfillmentError::DisputeNotFound(dispute_id))
}

fn dispute_seller(
    dispute: &Dispute,
    dispute_id: AggregateId,
) -> Result<SellerId, FulfillmentError> {
    dispute
        .seller_id()
        .ok_or(FulfillmentError::DisputeNotFound(dispute_id))
}
