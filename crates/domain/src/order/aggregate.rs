use chrono::{DateTime, Utc};
use common::{AggregateId, BuyerId, OrderNumber, SellerId};
use event_store::Version;

use crate::aggregate::Aggregate;

use super::{OrderError, OrderEvent, OrderStatus, TimelineEntry};

/// The order aggregate.
///
/// State is rebuilt by replaying [`OrderEvent`]s; command methods validate
/// against the current state and return the events to append.
#[derive(Debug, Default, Clone)]
pub struct Order {
    id: Option<AggregateId>,
    version: Version,
    order_number: Option<OrderNumber>,
    buyer_id: Option<BuyerId>,
    seller_id: Option<SellerId>,
    buyer_email: Option<String>,
    shipping_address: Option<String>,
    total_cents: i64,
    status: OrderStatus,
    timeline: Vec<TimelineEntry>,
}

impl Order {
    /// Returns the public order number.
    pub fn order_number(&self) -> Option<&OrderNumber> {
        self.order_number.as_ref()
    }

    /// Returns the buyer.
    pub fn buyer_id(&self) -> Option<BuyerId> {
        self.buyer_id
    }

    /// Returns the seller.
    pub fn seller_id(&self) -> Option<SellerId> {
        self.seller_id
    }

    /// Returns the contact email given at checkout, used for guest lookups.
    pub fn buyer_email(&self) -> Option<&str> {
        self.buyer_email.as_deref()
    }

    /// Returns the shipping address.
    pub fn shipping_address(&self) -> Option<&str> {
        self.shipping_address.as_deref()
    }

    /// Returns the order total in cents.
    pub fn total_cents(&self) -> i64 {
        self.total_cents
    }

    /// Returns the current coarse status.
    pub fn status(&self) -> OrderStatus {
        self.status
    }

    /// Returns the visible status history, oldest first.
    pub fn timeline(&self) -> &[TimelineEntry] {
        &self.timeline
    }

    // Commands

    /// Places the order.
    pub fn place(
        &self,
        order_id: AggregateId,
        order_number: OrderNumber,
        buyer_id: BuyerId,
        seller_id: SellerId,
        buyer_email: Option<String>,
        shipping_address: Option<String>,
        total_cents: i64,
    ) -> Result<Vec<OrderEvent>, OrderError> {
        if self.id.is_some() {
            return Err(OrderError::AlreadyPlaced);
        }

        Ok(vec![OrderEvent::OrderPlaced {
            order_id,
            order_number,
            buyer_id,
            seller_id,
            buyer_email,
            shipping_address,
            total_cents,
            placed_at: Utc::now(),
        }])
    }

    /// Moves the order to the coarse status derived from tracking.
    ///
    /// A repeat of the current status is a no-op, so the bridge can run on
    /// every tracking event without bloating the order's history.
    pub fn bridge_to(
        &self,
        status: OrderStatus,
        note: Option<String>,
        changed_at: DateTime<Utc>,
    ) -> Result<Vec<OrderEvent>, OrderError> {
        if self.id.is_none() {
            return Err(OrderError::NotPlaced);
        }
        if status == self.status {
            return Ok(vec![]);
        }
        if self.status.is_terminal() {
            return Err(OrderError::InvalidStateTransition {
                from: self.status,
                to: status,
            });
        }

        Ok(vec![OrderEvent::StatusBridged {
            status,
            note,
            changed_at,
        }])
    }

    /// Cancels the order.
    ///
    /// Allowed only while the order is pending or processing. After the
    /// seller packs the parcel the buyer must go through a dispute instead.
    pub fn cancel(
        &self,
        reason: impl Into<String>,
        cancelled_by: impl Into<String>,
    ) -> Result<Vec<OrderEvent>, OrderError> {
        if self.id.is_none() {
            return Err(OrderError::NotPlaced);
        }
        if !self.status.can_cancel() {
            return Err(OrderError::CannotCancel {
                status: self.status,
            });
        }

        Ok(vec![OrderEvent::OrderCancelled {
            reason: reason.into(),
            cancelled_by: cancelled_by.into(),
            cancelled_at: Utc::now(),
        }])
    }
}

impl Aggregate for Order {
    type Event = OrderEvent;
    type Error = OrderError;

    fn aggregate_type() -> &'static str {
        "Order"
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
            OrderEvent::OrderPlaced {
                order_id,
                order_number,
                buyer_id,
                seller_id,
                buyer_email,
                shipping_address,
                total_cents,
                placed_at,
            } => {
                self.id = Some(order_id);
                self.order_number = Some(order_number);
                self.buyer_id = Some(buyer_id);
                self.seller_id = Some(seller_id);
                self.buyer_email = buyer_email;
                self.shipping_address = shipping_address;
                self.total_cents = total_cents;
                self.status = OrderStatus::Pending;
                self.timeline
                    .push(TimelineEntry::new(OrderStatus::Pending, placed_at));
            }
            OrderEvent::StatusBridged {
                status, changed_at, ..
            } => {
                self.status = status;
                self.timeline.push(TimelineEntry::new(status, changed_at));
            }
            OrderEvent::OrderCancelled { cancelled_at, .. } => {
                self.status = OrderStatus::Cancelled;
                self.timeline
                    .push(TimelineEntry::new(OrderStatus::Cancelled, cancelled_at));
            }
        }
    }
}
