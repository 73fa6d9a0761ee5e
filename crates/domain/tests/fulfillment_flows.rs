//! Integration tests driving the three aggregates together through an
//! in-memory event store, the way the coordinators do in production.

use chrono::{Duration, Utc};
use common::{AggregateId, BuyerId, DisputeNumber, OrderNumber, SellerId, TrackingNumber};
use domain::bridge;
use domain::dispute::{DisputeKind, DisputeOutcome, DisputePriority, DisputeService, DisputeStatus};
use domain::order::{OrderService, OrderStatus};
use domain::shipment::{ShipmentService, ShipmentStatus};
use event_store::InMemoryEventStore;

struct World {
    orders: OrderService<InMemoryEventStore>,
    shipments: ShipmentService<InMemoryEventStore>,
    disputes: DisputeService<InMemoryEventStore>,
    buyer: BuyerId,
    seller: SellerId,
}

impl World {
    fn new() -> Self {
        let store = InMemoryEventStore::new();
        Self {
            orders: OrderService::new(store.clone()),
            shipments: ShipmentService::new(store.clone()),
            disputes: DisputeService::new(store),
            buyer: BuyerId::new(),
            seller: SellerId::new(),
        }
    }

    async fn place_order(&self) -> AggregateId {
        let order_id = AggregateId::new();
        self.orders
            .place_order(
                order_id,
                OrderNumber::parse("ORD-20260823-TEST").unwrap(),
                self.buyer,
                self.seller,
                Some("buyer@example.com".to_string()),
                Some("1 Canal St, Amsterdam".to_string()),
                12_900,
            )
            .await
            .unwrap();
        order_id
    }

    async fn open_shipment(&self, order_id: AggregateId) -> AggregateId {
        let shipment_id = AggregateId::new();
        self.shipments
            .open_shipment(
                shipment_id,
                TrackingNumber::parse("SHP-20260823-TEST").unwrap(),
                order_id,
                self.seller,
                Some("PostNL".to_string()),
                None,
                Some(Utc::now() + Duration::days(3)),
            )
            .await
            .unwrap();
        shipment_id
    }

    /// Records a scan and bridges the order, as the tracking coordinator does.
    async fn track_and_bridge(
        &self,
        order_id: AggregateId,
        shipment_id: AggregateId,
        status: ShipmentStatus,
        location: &str,
    ) {
        let result = self
            .shipments
            .record_tracking(
                shipment_id,
                status,
                location.to_string(),
                "scan".to_string(),
                None,
                None,
                Utc::now(),
            )
            .await
            .unwrap();

        let derived = result.aggregate.status();
        self.orders
            .bridge_status(
                order_id,
                bridge::order_status_for(derived),
                Some(derived.as_str().to_string()),
                result.aggregate.status_at().unwrap(),
            )
            .await
            .unwrap();
    }
}

#[tokio::test]
async fn happy_path_from_placement_to_delivery() {
    let world = World::new();
    let order_id = world.place_order().await;
    let shipment_id = world.open_shipment(order_id).await;

    for (status, location) in [
        (ShipmentStatus::SellerConfirmed, "Seller warehouse"),
        (ShipmentStatus::Packed, "Seller warehouse"),
        (ShipmentStatus::Shipped, "Origin depot"),
        (ShipmentStatus::InTransit, "Sorting hub"),
        (ShipmentStatus::OutForDelivery, "Local depot"),
        (ShipmentStatus::Delivered, "Front door"),
    ] {
        world
            .track_and_bridge(order_id, shipment_id, status, location)
            .await;
    }

    let order = world.orders.get_order(order_id).await.unwrap().unwrap();
    assert_eq!(order.status(), OrderStatus::Delivered);
    // pending, processing, packed, shipped, delivered: in_transit and
    // out_for_delivery both map to shipped and appear once.
    assert_eq!(order.timeline().len(), 5);

    let shipment = world
        .shipments
        .get_shipment(shipment_id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(shipment.history().len(), 6);
    assert!(shipment.actual_delivery().is_some());
}

#[tokio::test]
async fn late_webhook_does_not_roll_the_shipment_back() {
    let world = World::new();
    let order_id = world.place_order().await;
    let shipment_id = world.open_shipment(order_id).await;

    let now = Utc::now();
    world
        .shipments
        .record_tracking(
            shipment_id,
            ShipmentStatus::OutForDelivery,
            "Local depot".to_string(),
            "scan".to_string(),
            None,
            None,
            now,
        )
        .await
        .unwrap();

    // A scan from six hours ago arrives after the newer one.
    let result = world
        .shipments
        .record_tracking(
            shipment_id,
            ShipmentStatus::InTransit,
            "Sorting hub".to_string(),
            "scan".to_string(),
            None,
            None,
            now - Duration::hours(6),
        )
        .await
        .unwrap();

    assert_eq!(result.aggregate.status(), ShipmentStatus::OutForDelivery);
    assert_eq!(result.aggregate.history().len(), 2);
}

#[tokio::test]
async fn failed_delivery_keeps_the_order_shipped() {
    let world = World::new();
    let order_id = world.place_order().await;
    let shipment_id = world.open_shipment(order_id).await;

    world
        .track_and_bridge(order_id, shipment_id, ShipmentStatus::Shipped, "Depot")
        .await;
    world
        .track_and_bridge(
            order_id,
            shipment_id,
            ShipmentStatus::FailedDelivery,
            "Front door",
        )
        .await;

    let order = world.orders.get_order(order_id).await.unwrap().unwrap();
    assert_eq!(order.status(), OrderStatus::Shipped);

    // The retry can still deliver.
    world
        .track_and_bridge(
            order_id,
            shipment_id,
            ShipmentStatus::Delivered,
            "Front door",
        )
        .await;
    let order = world.orders.get_order(order_id).await.unwrap().unwrap();
    assert_eq!(order.status(), OrderStatus::Delivered);
}

#[tokio::test]
async fn returned_parcel_cancels_the_order() {
    let world = World::new();
    let order_id = world.place_order().await;
    let shipment_id = world.open_shipment(order_id).await;

    world
        .track_and_bridge(order_id, shipment_id, ShipmentStatus::Shipped, "Depot")
        .await;
    world
        .track_and_bridge(order_id, shipment_id, ShipmentStatus::Returned, "Origin")
        .await;

    let order = world.orders.get_order(order_id).await.unwrap().unwrap();
    assert_eq!(order.status(), OrderStatus::Cancelled);
}

#[tokio::test]
async fn dispute_negotiation_over_a_delivered_order() {
    let world = World::new();
    let order_id = world.place_order().await;

    let dispute_id = AggregateId::new();
    world
        .disputes
        .open_dispute(
            dispute_id,
            DisputeNumber::parse("DSP-20260823-TEST").unwrap(),
            order_id,
            world.buyer,
            world.seller,
            DisputeKind::Quality,
            "wrong color".to_string(),
            "ordered navy, received orange".to_string(),
            DisputePriority::Medium,
        )
        .await
        .unwrap();

    world
        .disputes
        .respond_as_seller(dispute_id, "we will send a replacement".to_string(), vec![])
        .await
        .unwrap();
    world
        .disputes
        .respond_as_buyer(dispute_id, "replacement works for me".to_string())
        .await
        .unwrap();

    let result = world
        .disputes
        .resolve(
            dispute_id,
            DisputeOutcome::Resolved,
            "replacement shipped".to_string(),
            "admin-3".to_string(),
        )
        .await
        .unwrap();

    assert_eq!(result.aggregate.status(), DisputeStatus::Resolved);
    let dispute = world
        .disputes
        .get_dispute(dispute_id)
        .await
        .unwrap()
        .unwrap();
    assert!(dispute.resolution().is_some());
    assert_eq!(dispute.order_id(), Some(order_id));
}
