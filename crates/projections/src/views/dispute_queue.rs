//! Dispute queue read model for triage and deadline monitoring.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use common::{AggregateId, BuyerId, DisputeNumber, SellerId};
use domain::dispute::{DisputeEvent, DisputeKind, DisputePriority, DisputeStatus};
use event_store::StoredEvent;
use tokio::sync::RwLock;

use crate::projection::{Projection, ProjectionPosition};
use crate::read_model::ReadModel;
use crate::{ProjectionError, Result};

/// One open dispute as it appears in the triage queue.
#[derive(Debug, Clone)]
pub struct DisputeQueueEntry {
    pub dispute_id: AggregateId,
    pub dispute_number: DisputeNumber,
    pub order_id: AggregateId,
    pub buyer_id: BuyerId,
    pub seller_id: SellerId,
    pub kind: DisputeKind,
    pub priority: DisputePriority,
    pub status: DisputeStatus,
    pub response_deadline: Option<DateTime<Utc>>,
    pub opened_at: DateTime<Utc>,
    pub last_activity_at: DateTime<Utc>,
}

impl DisputeQueueEntry {
    /// Whether the pending response is past its deadline.
    pub fn deadline_expired(&self, now: DateTime<Utc>) -> bool {
        self.response_deadline.is_some_and(|deadline| now > deadline)
    }

    /// Whether the seller currently owes a response.
    pub fn awaiting_seller(&self) -> bool {
        matches!(self.status, DisputeStatus::New | DisputeStatus::BuyerResponse)
    }
}

/// Read model view of open disputes, ordered queries by deadline.
///
/// Resolved disputes drop out of the view; history stays in the event log.
#[derive(Clone)]
pub struct DisputeQueueView {
    disputes: Arc<RwLock<HashMap<AggregateId, DisputeQueueEntry>>>,
    position: Arc<RwLock<ProjectionPosition>>,
}

impl DisputeQueueView {
    /// Creates a new empty dispute queue view.
    pub fn new() -> Self {
        Self {
            disputes: Arc::new(RwLock::new(HashMap::new())),
            position: Arc::new(RwLock::new(ProjectionPosition::zero())),
        }
    }

    /// Gets a single open dispute.
    pub async fn get(&self, dispute_id: AggregateId) -> Option<DisputeQueueEntry> {
        self.disputes.read().await.get(&dispute_id).cloned()
    }

    /// Gets all open disputes, most urgent deadline first.
    pub async fn all(&self) -> Vec<DisputeQueueEntry> {
        let mut entries: Vec<_> = self.disputes.read().await.values().cloned().collect();
        entries.sort_by_key(|e| (e.response_deadline, e.opened_at));
        entries
    }

    /// Gets open disputes where a party owes a response.
    pub async fn action_items(&self) -> Vec<DisputeQueueEntry> {
        let mut entries: Vec<_> = self
            .disputes
            .read()
            .await
            .values()
            .filter(|e| e.response_deadline.is_some())
            .cloned()
            .collect();
        entries.sort_by_key(|e| e.response_deadline);
        entries
    }

    /// Gets open disputes whose response deadline has passed.
    pub async fn overdue(&self, now: DateTime<Utc>) -> Vec<DisputeQueueEntry> {
        let mut entries: Vec<_> = self
            .disputes
            .read()
            .await
            .values()
            .filter(|e| e.deadline_expired(now))
            .cloned()
            .collect();
        entries.sort_by_key(|e| e.response_deadline);
        entries
    }

    /// Gets open disputes whose deadline falls within the window from now.
    pub async fn due_within(&self, now: DateTime<Utc>, window: Duration) -> Vec<DisputeQueueEntry> {
        let cutoff = now + window;
        let mut entries: Vec<_> = self
            .disputes
            .read()
            .await
            .values()
            .filter(|e| {
                e.response_deadline
                    .is_some_and(|deadline| deadline > now && deadline <= cutoff)
            })
            .cloned()
            .collect();
        entries.sort_by_key(|e| e.response_deadline);
        entries
    }

    /// Gets open disputes for a specific seller.
    pub async fn for_seller(&self, seller_id: SellerId) -> Vec<DisputeQueueEntry> {
        self.disputes
            .read()
            .await
            .values()
            .filter(|e| e.seller_id == seller_id)
            .cloned()
            .collect()
    }
}

impl Default for DisputeQueueView {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Projection for DisputeQueueView {
    fn name(&self) -> &'static str {
        "DisputeQueueView"
    }

    async fn handle(&self, event: &StoredEvent) -> Result<()> {
        if event.aggregate_type != "Dispute" {
            let mut pos = self.position.write().await;
            *pos = pos.advance();
            return Ok(());
        }

        let dispute_event: DisputeEvent = serde_json::from_value(event.payload.clone())
            .map_err(|e| ProjectionError::malformed(&event.event_type, e))?;
        let dispute_id = event.aggregate_id;

        let mut disputes = self.disputes.write().await;

        match dispute_event {
            DisputeEvent::DisputeOpened {
                dispute_number,
                order_id,
                buyer_id,
                seller_id,
                kind,
                priority,
                response_deadline,
                opened_at,
                ..
            } => {
                disputes.insert(
                    dispute_id,
                    DisputeQueueEntry {
                        dispute_id,
                        dispute_number,
                        order_id,
                        buyer_id,
                        seller_id,
                        kind,
                        priority,
                        status: DisputeStatus::New,
                        response_deadline: Some(response_deadline),
                        opened_at,
                        last_activity_at: opened_at,
                    },
                );
            }
            DisputeEvent::SellerResponded { responded_at, .. } => {
                if let Some(entry) = disputes.get_mut(&dispute_id) {
                    entry.status = DisputeStatus::SellerResponse;
                    entry.response_deadline = None;
                    entry.last_activity_at = responded_at;
                }
            }
            DisputeEvent::BuyerResponded {
                new_deadline,
                responded_at,
                ..
            } => {
                if let Some(entry) = disputes.get_mut(&dispute_id) {
                    entry.status = DisputeStatus::BuyerResponse;
                    entry.response_deadline = Some(new_deadline);
                    entry.last_activity_at = responded_at;
                }
            }
            DisputeEvent::EvidenceAdded { added_at, .. } => {
                if let Some(entry) = disputes.get_mut(&dispute_id) {
                    entry.last_activity_at = added_at;
                }
            }
            DisputeEvent::EscalatedToReview { escalated_at } => {
                if let Some(entry) = disputes.get_mut(&dispute_id) {
                    entry.status = DisputeStatus::UnderReview;
                    entry.response_deadline = None;
                    entry.last_activity_at = escalated_at;
                }
            }
            DisputeEvent::DisputeResolved { .. } => {
                disputes.remove(&dispute_id);
            }
        }

        let mut pos = self.position.write().await;
        *pos = pos.advance();

        Ok(())
    }

    async fn position(&self) -> ProjectionPosition {
        *self.position.read().await
    }

    async fn reset(&self) -> Result<()> {
        self.disputes.write().await.clear();
        *self.position.write().await = ProjectionPosition::zero();
        Ok(())
    }
}

impl ReadModel for DisputeQueueView {
    fn name(&self) -> &'static str {
        "DisputeQueueView"
    }

    fn count(&self) -> usize {
        // Use try_read to avoid blocking; returns 0 if lock is held
        self.disputes.try_read().map(|d| d.len()).unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use domain::DomainEvent;
    use domain::dispute::DisputeOutcome;
    use event_store::Version;

    fn stored(dispute_id: AggregateId, version: i64, event: &DisputeEvent) -> StoredEvent {
        StoredEvent::new(
            dispute_id,
            "Dispute",
            event.event_type(),
            Version::new(version),
            event,
        )
        .unwrap()
    }

    fn opened(dispute_id: AggregateId, opened_at: DateTime<Utc>) -> DisputeEvent {
        DisputeEvent::DisputeOpened {
            dispute_id,
            dispute_number: DisputeNumber::from_generated("DSP-20260823-0A1B2C".to_string()),
            order_id: AggregateId::new(),
            buyer_id: BuyerId::new(),
            seller_id: SellerId::new(),
            kind: DisputeKind::Refund,
            reason: "never arrived".to_string(),
            description: "tracking went quiet".to_string(),
            priority: DisputePriority::Medium,
            response_deadline: opened_at + Duration::days(7),
            opened_at,
        }
    }

    #[tokio::test]
    async fn opened_dispute_enters_the_queue() {
        let view = DisputeQueueView::new();
        let dispute_id = AggregateId::new();
        let now = Utc::now();

        view.handle(&stored(dispute_id, 1, &opened(dispute_id, now)))
            .await
            .unwrap();

        let entry = view.get(dispute_id).await.unwrap();
        assert_eq!(entry.status, DisputeStatus::New);
        assert!(entry.awaiting_seller());
        assert_eq!(entry.response_deadline, Some(now + Duration::days(7)));
    }

    #[tokio::test]
    async fn seller_response_clears_the_deadline() {
        let view = DisputeQueueView::new();
        let dispute_id = AggregateId::new();
        let now = Utc::now();

        view.handle(&stored(dispute_id, 1, &opened(dispute_id, now)))
            .await
            .unwrap();
        view.handle(&stored(
            dispute_id,
            2,
            &DisputeEvent::SellerResponded {
                text: "refund offered".to_string(),
                responded_at: now,
            },
        ))
        .await
        .unwrap();

        let entry = view.get(dispute_id).await.unwrap();
        assert_eq!(entry.status, DisputeStatus::SellerResponse);
        assert!(entry.response_deadline.is_none());
        assert!(view.action_items().await.is_empty());
    }

    #[tokio::test]
    async fn buyer_reply_rearms_the_deadline() {
        let view = DisputeQueueView::new();
        let dispute_id = AggregateId::new();
        let now = Utc::now();

        view.handle(&stored(dispute_id, 1, &opened(dispute_id, now)))
            .await
            .unwrap();
        view.handle(&stored(
            dispute_id,
            2,
            &DisputeEvent::SellerResponded {
                text: "refund offered".to_string(),
                responded_at: now,
            },
        ))
        .await
        .unwrap();
        view.handle(&stored(
            dispute_id,
            3,
            &DisputeEvent::BuyerResponded {
                text: "partial refund only".to_string(),
                new_deadline: now + Duration::days(7),
                responded_at: now,
            },
        ))
        .await
        .unwrap();

        let entry = view.get(dispute_id).await.unwrap();
        assert_eq!(entry.status, DisputeStatus::BuyerResponse);
        assert!(entry.awaiting_seller());
        assert_eq!(view.action_items().await.len(), 1);
    }

    #[tokio::test]
    async fn resolved_dispute_leaves_the_queue() {
        let view = DisputeQueueView::new();
        let dispute_id = AggregateId::new();
        let now = Utc::now();

        view.handle(&stored(dispute_id, 1, &opened(dispute_id, now)))
            .await
            .unwrap();
        view.handle(&stored(
            dispute_id,
            2,
            &DisputeEvent::DisputeResolved {
                outcome: DisputeOutcome::Approved,
                resolution: "refund issued".to_string(),
                resolved_by: "admin-1".to_string(),
                resolved_at: now,
            },
        ))
        .await
        .unwrap();

        assert!(view.get(dispute_id).await.is_none());
        assert_eq!(view.all().await.len(), 0);
    }

    #[tokio::test]
    async fn overdue_and_due_within_windows() {
        let view = DisputeQueueView::new();
        let now = Utc::now();

        // Opened eight days ago: already past its deadline.
        let stale = AggregateId::new();
        view.handle(&stored(stale, 1, &opened(stale, now - Duration::days(8))))
            .await
            .unwrap();

        // Opened six days ago: due within the next day.
        let closing = AggregateId::new();
        view.handle(&stored(
            closing,
            1,
            &opened(closing, now - Duration::days(6)),
        ))
        .await
        .unwrap();

        let overdue = view.overdue(now).await;
        assert_eq!(overdue.len(), 1);
        assert_eq!(overdue[0].dispute_id, stale);
        assert!(overdue[0].deadline_expired(now));

        let due_soon = view.due_within(now, Duration::days(2)).await;
        assert_eq!(due_soon.len(), 1);
        assert_eq!(due_soon[0].dispute_id, closing);
    }

    #[tokio::test]
    async fn escalation_parks_the_dispute_without_a_deadline() {
        let view = DisputeQueueView::new();
        let dispute_id = AggregateId::new();
        let now = Utc::now();

        view.handle(&stored(dispute_id, 1, &opened(dispute_id, now)))
            .await
            .unwrap();
        view.handle(&stored(
            dispute_id,
            2,
            &DisputeEvent::EscalatedToReview { escalated_at: now },
        ))
        .await
        .unwrap();

        let entry = view.get(dispute_id).await.unwrap();
        assert_eq!(entry.status, DisputeStatus::UnderReview);
        assert!(entry.response_deadline.is_none());
        assert!(view.overdue(now + Duration::days(30)).await.is_empty());
    }

    #[tokio::test]
    async fn non_dispute_events_only_advance_the_position() {
        let view = DisputeQueueView::new();
        let event = StoredEvent::new(
            AggregateId::new(),
            "Order",
            "OrderCancelled",
            Version::first(),
            &serde_json::json!({"reason": "test"}),
        )
        .unwrap();

        view.handle(&event).await.unwrap();
        assert_eq!(view.all().await.len(), 0);
        assert_eq!(view.position().await.events_processed, 1);
    }

    #[tokio::test]
    async fn reset_clears_the_queue() {
        let view = DisputeQueueView::new();
        let dispute_id = AggregateId::new();

        view.handle(&stored(dispute_id, 1, &opened(dispute_id, Utc::now())))
            .await
            .unwrap();
        assert_eq!(ReadModel::count(&view), 1);

        view.reset().await.unwrap();
        assert_eq!(view.all().await.len(), 0);
        assert_eq!(view.position().await.events_processed, 0);
    }
}
