//! Shipment service providing a simplified API for tracking operations.

use chrono::{DateTime, Utc};
use common::{AggregateId, SellerId, TrackingNumber};
use event_store::EventStore;

use crate::command::{CommandHandler, CommandResult};
use crate::error::DomainError;

use super::{GeoPoint, PackageSpec, Shipment, ShipmentStatus};

/// Service for managing shipments.
pub struct ShipmentService<S: EventStore> {
    handler: CommandHandler<S, Shipment>,
}

impl<S: EventStore> ShipmentService<S> {
    /// Creates a new shipment service with the given event store.
    pub fn new(store: S) -> Self {
        Self {
            handler: CommandHandler::new(store),
        }
    }

    /// Returns a reference to the underlying command handler.
    pub fn handler(&self) -> &CommandHandler<S, Shipment> {
        &self.handler
    }

    /// Opens a shipment for an order.
    #[allow(clippy::too_many_arguments)]
    #[tracing::instrument(skip_all, fields(%shipment_id, %order_id, %tracking_number))]
    pub async fn open_shipment(
        &self,
        shipment_id: AggregateId,
        tracking_number: TrackingNumber,
        order_id: AggregateId,
        seller_id: SellerId,
        courier: Option<String>,
        package: Option<PackageSpec>,
        estimated_delivery: Option<DateTime<Utc>>,
    ) -> Result<CommandResult<Shipment>, DomainError> {
        self.handler
            .execute(shipment_id, |shipment| {
                shipment.open(
                    shipment_id,
                    tracking_number,
                    order_id,
                    seller_id,
                    courier,
                    package,
                    estimated_delivery,
                )
            })
            .await
    }

    /// Records a courier scan on a shipment.
    #[allow(clippy::too_many_arguments)]
    #[tracing::instrument(skip_all, fields(%shipment_id, %status))]
    pub async fn record_tracking(
        &self,
        shipment_id: AggregateId,
        status: ShipmentStatus,
        location: String,
        description: String,
        courier: Option<String>,
        point: Option<GeoPoint>,
        occurred_at: DateTime<Utc>,
    ) -> Result<CommandResult<Shipment>, DomainError> {
        self.handler
            .execute(shipment_id, |shipment| {
                shipment.record_tracking(status, location, description, courier, point, occurred_at)
            })
            .await
    }

    /// Updates a shipment's position.
    #[tracing::instrument(skip_all, fields(%shipment_id))]
    pub async fn ping_location(
        &self,
        shipment_id: AggregateId,
        point: Option<GeoPoint>,
        address: String,
        occurred_at: DateTime<Utc>,
    ) -> Result<CommandResult<Shipment>, DomainError> {
        self.handler
            .execute(shipment_id, |shipment| {
                shipment.ping_location(point, address, occurred_at)
            })
            .await
    }

    /// Confirms delivery with proof.
    #[tracing::instrument(skip_all, fields(%shipment_id))]
    pub async fn confirm_delivery(
        &self,
        shipment_id: AggregateId,
        delivered_to: Option<String>,
        image_url: Option<String>,
        signature_url: Option<String>,
        occurred_at: DateTime<Utc>,
    ) -> Result<CommandResult<Shipment>, DomainError> {
        self.handler
            .execute(shipment_id, |shipment| {
                shipment.confirm_delivery(delivered_to, image_url, signature_url, occurred_at)
            })
            .await
    }

    /// Records a failed delivery attempt.
    #[tracing::instrument(skip_all, fields(%shipment_id))]
    pub async fn record_failed_delivery(
        &self,
        shipment_id: AggregateId,
        reason: Option<String>,
        occurred_at: DateTime<Utc>,
    ) -> Result<CommandResult<Shipment>, DomainError> {
        self.handler
            .execute(shipment_id, |shipment| {
                shipment.record_failed_delivery(reason, occurred_at)
            })
            .await
    }

    /// Loads a shipment by ID, or None if it doesn't exist.
    #[tracing::instrument(skip(self), fields(%shipment_id))]
    pub async fn get_shipment(
        &self,
        shipment_id: AggregateId,
    ) -> Result<Option<Shipment>, DomainError> {
        self.handler.load_existing(shipment_id).await
    }

    /// Loads a shipment by ID, failing if it doesn't exist.
    pub async fn require_shipment(
        &self,
        shipment_id: AggregateId,
    ) -> Result<Shipment, DomainError> {
        self.handler.load_required(shipment_id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use event_store::InMemoryEventStore;

    async fn open(service: &ShipmentService<InMemoryEventStore>) -> AggregateId {
        let shipment_id = AggregateId::new();
        service
            .open_shipment(
                shipment_id,
                TrackingNumber::parse("SHP-TEST-1").unwrap(),
                AggregateId::new(),
                SellerId::new(),
                Some("DHL".to_string()),
                None,
                None,
            )
            .await
            .unwrap();
        shipment_id
    }

    #[tokio::test]
    async fn record_and_reload_tracking() {
        let service = ShipmentService::new(InMemoryEventStore::new());
        let shipment_id = open(&service).await;

        service
            .record_tracking(
                shipment_id,
                ShipmentStatus::InTransit,
                "Hub A".to_string(),
                "Arrived at hub".to_string(),
                None,
                None,
                Utc::now(),
            )
            .await
            .unwrap();

        let shipment = service.get_shipment(shipment_id).await.unwrap().unwrap();
        assert_eq!(shipment.status(), ShipmentStatus::InTransit);
        assert_eq!(shipment.history().len(), 1);
    }

    #[tokio::test]
    async fn confirm_delivery_stamps_actual_delivery() {
        let service = ShipmentService::new(InMemoryEventStore::new());
        let shipment_id = open(&service).await;

        let delivered_at = Utc::now();
        service
            .confirm_delivery(
                shipment_id,
                Some("recipient".to_string()),
                Some("https://blobs/img.jpg".to_string()),
                None,
                delivered_at,
            )
            .await
            .unwrap();

        let shipment = service.get_shipment(shipment_id).await.unwrap().unwrap();
        assert_eq!(shipment.status(), ShipmentStatus::Delivered);
        assert_eq!(shipment.actual_delivery(), Some(delivered_at));
        assert!(shipment.proof().is_some());
    }
}
