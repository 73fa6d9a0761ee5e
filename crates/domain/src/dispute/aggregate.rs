use chrono::{DateTime, Duration, Utc};
use common::{AggregateId, BuyerId, DisputeNumber, SellerId};
use event_store::Version;

use crate::aggregate::Aggregate;

use super::{
    DisputeError, DisputeEvent, DisputeKind, DisputeOutcome, DisputePriority, DisputeStatus,
    Evidence, NextAction, PartyResponse, ResolutionRecord,
};

/// How long a party has to respond before the dispute shows as overdue.
///
/// The deadline is soft: a late response is still accepted, but the
/// dispute surfaces in the overdue queue so the review team can step in.
pub const RESPONSE_WINDOW_DAYS: i64 = 7;

fn response_window() -> Duration {
    Duration::days(RESPONSE_WINDOW_DAYS)
}

/// The dispute aggregate.
#[derive(Debug, Default, Clone)]
pub struct Dispute {
    id: Option<AggregateId>,
    version: Version,
    dispute_number: Option<DisputeNumber>,
    order_id: Option<AggregateId>,
    buyer_id: Option<BuyerId>,
    seller_id: Option<SellerId>,
    kind: Option<DisputeKind>,
    reason: String,
    description: String,
    priority: DisputePriority,
    status: DisputeStatus,
    evidence: Vec<Evidence>,
    seller_response: Option<PartyResponse>,
    buyer_response: Option<PartyResponse>,
    response_deadline: Option<DateTime<Utc>>,
    resolution: Option<ResolutionRecord>,
    opened_at: Option<DateTime<Utc>>,
}

impl Dispute {
    /// Returns the public dispute number.
    pub fn dispute_number(&self) -> Option<&DisputeNumber> {
        self.dispute_number.as_ref()
    }

    /// Returns the disputed order.
    pub fn order_id(&self) -> Option<AggregateId> {
        self.order_id
    }

    /// Returns the buyer who opened the dispute.
    pub fn buyer_id(&self) -> Option<BuyerId> {
        self.buyer_id
    }

    /// Returns the seller on the other side.
    pub fn seller_id(&self) -> Option<SellerId> {
        self.seller_id
    }

    /// Returns what the buyer is asking for.
    pub fn kind(&self) -> Option<DisputeKind> {
        self.kind
    }

    /// Returns the buyer's stated reason.
    pub fn reason(&self) -> &str {
        &self.reason
    }

    /// Returns the buyer's full description of the problem.
    pub fn description(&self) -> &str {
        &self.description
    }

    /// Returns the review queue priority.
    pub fn priority(&self) -> DisputePriority {
        self.priority
    }

    /// Returns the current status.
    pub fn status(&self) -> DisputeStatus {
        self.status
    }

    /// Returns all attached evidence, oldest first.
    pub fn evidence(&self) -> &[Evidence] {
        &self.evidence
    }

    /// Returns the seller's single response, once given.
    pub fn seller_response(&self) -> Option<&PartyResponse> {
        self.seller_response.as_ref()
    }

    /// Returns the buyer's latest response.
    pub fn buyer_response(&self) -> Option<&PartyResponse> {
        self.buyer_response.as_ref()
    }

    /// Returns the pending response deadline, if a party owes a move.
    pub fn response_deadline(&self) -> Option<DateTime<Utc>> {
        self.response_deadline
    }

    /// Returns how the dispute was closed, once resolved.
    pub fn resolution(&self) -> Option<&ResolutionRecord> {
        self.resolution.as_ref()
    }

    /// Returns when the dispute was opened.
    pub fn opened_at(&self) -> Option<DateTime<Utc>> {
        self.opened_at
    }

    /// Returns true when the deadline passed without the awaited response.
    pub fn is_overdue(&self, now: DateTime<Utc>) -> bool {
        self.status.is_active()
            && self
                .response_deadline
                .is_some_and(|deadline| deadline < now)
    }

    /// Describes what the dispute is waiting for.
    pub fn next_action(&self, now: DateTime<Utc>) -> NextAction {
        let (message, action_required) = match self.status {
            DisputeStatus::New | DisputeStatus::BuyerResponse => {
                ("Waiting for the seller to respond", true)
            }
            DisputeStatus::SellerResponse => ("Waiting for the buyer to respond", false),
            DisputeStatus::UnderReview => ("Under platform review", false),
            DisputeStatus::Approved | DisputeStatus::Rejected | DisputeStatus::Resolved => {
                ("Dispute closed", false)
            }
        };

        NextAction {
            message: message.to_string(),
            action_required,
            deadline_expired: self.is_overdue(now),
        }
    }

    // Commands

    /// Opens the dispute, arming the seller's response deadline.
    #[allow(clippy::too_many_arguments)]
    pub fn open(
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
    ) -> Result<Vec<DisputeEvent>, DisputeError> {
        if self.id.is_some() {
            return Err(DisputeError::AlreadyOpened);
        }

        let opened_at = Utc::now();
        Ok(vec![DisputeEvent::DisputeOpened {
            dispute_id,
            dispute_number,
            order_id,
            buyer_id,
            seller_id,
            kind,
            reason,
            description,
            priority,
            response_deadline: opened_at + response_window(),
            opened_at,
        }])
    }

    /// Submits the seller's single response.
    pub fn respond_as_seller(
        &self,
        text: String,
        evidence: Vec<Evidence>,
    ) -> Result<Vec<DisputeEvent>, DisputeError> {
        if self.id.is_none() {
            return Err(DisputeError::NotOpened);
        }
        if self.status.is_terminal() {
            return Err(DisputeError::Closed {
                status: self.status,
            });
        }
        if self.seller_response.is_some() {
            return Err(DisputeError::SellerResponseAlreadySubmitted);
        }
        if !matches!(
            self.status,
            DisputeStatus::New | DisputeStatus::BuyerResponse
        ) {
            return Err(DisputeError::NotSellersTurn {
                status: self.status,
            });
        }

        let now = Utc::now();
        let mut events = vec![DisputeEvent::SellerResponded {
            text,
            responded_at: now,
        }];
        if !evidence.is_empty() {
            events.push(DisputeEvent::EvidenceAdded {
                entries: evidence,
                added_at: now,
            });
        }
        Ok(events)
    }

    /// Submits the buyer's reply to the seller's response.
    ///
    /// One reply per turn: legal only while the seller's response is the
    /// latest word. The reply re-arms the seller's deadline.
    pub fn respond_as_buyer(&self, text: String) -> Result<Vec<DisputeEvent>, DisputeError> {
        if self.id.is_none() {
            return Err(DisputeError::NotOpened);
        }
        if self.status.is_terminal() {
            return Err(DisputeError::Closed {
                status: self.status,
            });
        }
        if self.status != DisputeStatus::SellerResponse {
            return Err(DisputeError::NotBuyersTurn {
                status: self.status,
            });
        }

        let now = Utc::now();
        Ok(vec![DisputeEvent::BuyerResponded {
            text,
            new_deadline: now + response_window(),
            responded_at: now,
        }])
    }

    /// Attaches evidence without changing whose turn it is.
    pub fn add_evidence(&self, entries: Vec<Evidence>) -> Result<Vec<DisputeEvent>, DisputeError> {
        if self.id.is_none() {
            return Err(DisputeError::NotOpened);
        }
        if self.status.is_terminal() {
            return Err(DisputeError::Closed {
                status: self.status,
            });
        }
        if entries.is_empty() {
            return Ok(vec![]);
        }

        Ok(vec![DisputeEvent::EvidenceAdded {
            entries,
            added_at: Utc::now(),
        }])
    }

    /// Moves the dispute to platform review.
    pub fn escalate(&self) -> Result<Vec<DisputeEvent>, DisputeError> {
        if self.id.is_none() {
            return Err(DisputeError::NotOpened);
        }
        if self.status.is_terminal() {
            return Err(DisputeError::Closed {
                status: self.status,
            });
        }
        if self.status == DisputeStatus::UnderReview {
            return Ok(vec![]);
        }

        Ok(vec![DisputeEvent::EscalatedToReview {
            escalated_at: Utc::now(),
        }])
    }

    /// Closes the dispute with an outcome.
    pub fn resolve(
        &self,
        outcome: DisputeOutcome,
        resolution: String,
        resolved_by: String,
    ) -> Result<Vec<DisputeEvent>, DisputeError> {
        if self.id.is_none() {
            return Err(DisputeError::NotOpened);
        }
        if self.status.is_terminal() {
            return Err(DisputeError::Closed {
                status: self.status,
            });
        }

        Ok(vec![DisputeEvent::DisputeResolved {
            outcome,
            resolution,
            resolved_by,
            resolved_at: Utc::now(),
        }])
    }
}

impl Aggregate for Dispute {
    type Event = DisputeEvent;
    type Error = DisputeError;

    fn aggregate_type() -> &'static str {
        "Dispute"
    }

    fn id(&self) -> Option<AggregateId> {
        self.id
    }

    fn version(&self) -> Version {
        self.version
    }

    fn set_version(&mut self, version: Version) {
        self.version = version;
    }

    fn apply(&mut self, event: Self::Event) {
        match event {
            DisputeEvent::DisputeOpened {
                dispute_id,
                dispute_number,
                order_id,
                buyer_id,
                seller_id,
                kind,
                reason,
                description,
                priority,
                response_deadline,
                opened_at,
            } => {
                self.id = Some(dispute_id);
                self.dispute_number = Some(dispute_number);
                self.order_id = Some(order_id);
                self.buyer_id = Some(buyer_id);
                self.seller_id = Some(seller_id);
                self.kind = Some(kind);
                self.reason = reason;
                self.description = description;
                self.priority = priority;
                self.status = DisputeStatus::New;
                self.response_deadline = Some(response_deadline);
                self.opened_at = Some(opened_at);
            }
            DisputeEvent::SellerResponded { text, responded_at } => {
                self.seller_response = Some(PartyResponse { text, responded_at });
                self.status = DisputeStatus::SellerResponse;
                // The ball is in the buyer's court; no deadline runs on them.
                self.response_deadline = None;
            }
            DisputeEvent::BuyerResponded {
                text,
                new_deadline,
                responded_at,
            } => {
                self.buyer_response = Some(PartyResponse { text, responded_at });
                self.status = DisputeStatus::BuyerResponse;
                self.response_deadline = Some(new_deadline);
            }
            DisputeEvent::EvidenceAdded { entries, .. } => {
                self.evidence.extend(entries);
            }
            DisputeEvent::EscalatedToReview { .. } => {
                self.status = DisputeStatus::UnderReview;
                self.response_deadline = None;
            }
            DisputeEvent::DisputeResolved {
                outcome,
                resolution,
                resolved_by,
                resolved_at,
            } => {
                self.status = match outcome {
                    DisputeOutcome::Approved => DisputeStatus::Approved,
                    DisputeOutcome::Rejected => DisputeStatus::Rejected,
                    DisputeOutcome::Resolved => DisputeStatus::Resolved,
                };
                self.response_deadline = None;
                self.resolution = Some(ResolutionRecord {
                    outcome,
                    resolution,
                    resolved_by,
                    resolved_at,
                });
            }
        }
    }
}
