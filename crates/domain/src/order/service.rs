//! Order service providing a simplified API for order operations.

use chrono::{DateTime, Utc};
use common::{AggregateId, BuyerId, OrderNumber, SellerId};
use event_store::EventStore;

use crate::command::{CommandHandler, CommandResult};
use crate::error::DomainError;

use super::{Order, OrderStatus};

/// Service for managing orders.
///
/// Wraps the command handler and exposes one method per order operation.
pub struct OrderService<S: EventStore> {
    handler: CommandHandler<S, Order>,
}

impl<S: EventStore> OrderService<S> {
    /// Creates a new order service with the given event store.
    pub fn new(store: S) -> Self {
        Self {
            handler: CommandHandler::new(store),
        }
    }

    /// Returns a reference to the underlying command handler.
    pub fn handler(&self) -> &CommandHandler<S, Order> {
        &self.handler
    }

    /// Places a new order.
    #[tracing::instrument(skip_all, fields(%order_id, %order_number))]
    pub async fn place_order(
        &self,
        order_id: AggregateId,
        order_number: OrderNumber,
        buyer_id: BuyerId,
        seller_id: SellerId,
        buyer_email: Option<String>,
        shipping_address: Option<String>,
        total_cents: i64,
    ) -> Result<CommandResult<Order>, DomainError> {
        self.handler
            .execute(order_id, |order| {
                order.place(
                    order_id,
                    order_number,
                    buyer_id,
                    seller_id,
                    buyer_email,
                    shipping_address,
                    total_cents,
                )
            })
            .await
    }

    /// Moves an order to the coarse status derived from tracking.
    #[tracing::instrument(skip(self, note), fields(%order_id, %status))]
    pub async fn bridge_status(
        &self,
        order_id: AggregateId,
        status: OrderStatus,
        note: Option<String>,
        changed_at: DateTime<Utc>,
    ) -> Result<CommandResult<Order>, DomainError> {
        self.handler
            .execute(order_id, |order| order.bridge_to(status, note, changed_at))
            .await
    }

    /// Cancels an order.
    #[tracing::instrument(skip(self, reason), fields(%order_id))]
    pub async fn cancel_order(
        &self,
        order_id: AggregateId,
        reason: String,
        cancelled_by: String,
    ) -> Result<CommandResult<Order>, DomainError> {
        self.handler
            .execute(order_id, |order| order.cancel(reason, cancelled_by))
            .await
    }

    /// Loads an order by ID, or None if it doesn't exist.
    #[tracing::instrument(skip(self), fields(%order_id))]
    pub async fn get_order(&self, order_id: AggregateId) -> Result<Option<Order>, DomainError> {
        self.handler.load_existing(order_id).await
    }

    /// Loads an order by ID, failing if it doesn't exist.
    pub async fn require_order(&self, order_id: AggregateId) -> Result<Order, DomainError> {
        self.handler.load_required(order_id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregate::Aggregate;
    use event_store::InMemoryEventStore;

    async fn place(service: &OrderService<InMemoryEventStore>) -> AggregateId {
        let order_id = AggregateId::new();
        service
            .place_order(
                order_id,
                OrderNumber::parse("ORD-TEST-1").unwrap(),
                BuyerId::new(),
                SellerId::new(),
                Some("buyer@example.com".to_string()),
                None,
                2_000,
            )
            .await
            .unwrap();
        order_id
    }

    #[tokio::test]
    async fn place_and_get_order() {
        let service = OrderService::new(InMemoryEventStore::new());
        let order_id = place(&service).await;

        let order = service.get_order(order_id).await.unwrap().unwrap();
        assert_eq!(order.id(), Some(order_id));
        assert_eq!(order.status(), OrderStatus::Pending);
    }

    #[tokio::test]
    async fn bridge_persists_new_status() {
        let service = OrderService::new(InMemoryEventStore::new());
        let order_id = place(&service).await;

        let result = service
            .bridge_status(order_id, OrderStatus::Packed, None, Utc::now())
            .await
            .unwrap();
        assert_eq!(result.aggregate.status(), OrderStatus::Packed);

        // Re-bridging the same status appends nothing.
        let result = service
            .bridge_status(order_id, OrderStatus::Packed, None, Utc::now())
            .await
            .unwrap();
        assert!(result.events.is_empty());
    }

    #[tokio::test]
    async fn cancel_order_from_pending() {
        let service = OrderService::new(InMemoryEventStore::new());
        let order_id = place(&service).await;

        let result = service
            .cancel_order(order_id, "duplicate order".to_string(), "buyer".to_string())
            .await
            .unwrap();
        assert_eq!(result.aggregate.status(), OrderStatus::Cancelled);
    }

    #[tokio::test]
    async fn get_missing_order_returns_none() {
        let service = OrderService::new(InMemoryEventStore::new());
        assert!(service.get_order(AggregateId::new()).await.unwrap().is_none());
    }
}
