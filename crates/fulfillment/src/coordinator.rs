//! Tracking coordinator: keeps orders and shipments in step.
//!
//! Every accepted courier scan runs the status bridge so the buyer-facing
//! order status always reflects the latest tracking. The shipment for an
//! order is created lazily on the first scan.

use chrono::{DateTime, Utc};
use common::{AggregateId, SellerId};
use domain::bridge;
use domain::order::{Order, OrderService};
use domain::shipment::{GeoPoint, Shipment, ShipmentService, ShipmentStatus};
use event_store::EventStore;
use uuid::Uuid;

use crate::actor::Actor;
use crate::blob::{BlobStore, UploadFile, validate_files};
use crate::error::FulfillmentError;
use crate::numbers::NumberGenerator;

/// Namespace for deriving a shipment id from its order id.
const SHIPMENT_NAMESPACE: Uuid = Uuid::from_u128(0x6f1b_82d4_9c3e_4a57_b0aa_52e1_77c8_04d9);

/// Returns the shipment id an order's shipment lives at.
///
/// Deriving the id makes shipment creation race-free without any lookup
/// table: concurrent first scans target the same aggregate, and the event
/// store's version check lets exactly one open it.
pub fn shipment_id_for_order(order_id: AggregateId) -> AggregateId {
    AggregateId::from_uuid(Uuid::new_v5(
        &SHIPMENT_NAMESPACE,
        order_id.as_uuid().as_bytes(),
    ))
}

/// A courier scan as submitted over HTTP.
#[derive(Debug, Clone)]
pub struct TrackingSubmission {
    pub status: ShipmentStatus,
    pub location: String,
    pub description: String,
    pub courier: Option<String>,
    pub point: Option<GeoPoint>,

    /// When the scan happened; defaults to now for live submissions.
    pub occurred_at: Option<DateTime<Utc>>,
}

/// Coordinates order placement, tracking ingestion, and the status bridge.
pub struct TrackingCoordinator<S, B>
where
    S: EventStore + Clone,
    B: BlobStore,
{
    orders: OrderService<S>,
    shipments: ShipmentService<S>,
    numbers: NumberGenerator,
    blobs: B,
}

impl<S, B> TrackingCoordinator<S, B>
where
    S: EventStore + Clone,
    B: BlobStore,
{
    /// Creates a new tracking coordinator.
    pub fn new(store: S, numbers: NumberGenerator, blobs: B) -> Self {
        Self {
            orders: OrderService::new(store.clone()),
            shipments: ShipmentService::new(store),
            numbers,
            blobs,
        }
    }

    /// Returns the order service, for read paths.
    pub fn orders(&self) -> &OrderService<S> {
        &self.orders
    }

    /// Returns the shipment service, for read paths.
    pub fn shipments(&self) -> &ShipmentService<S> {
        &self.shipments
    }

    /// Places an order for the calling buyer.
    #[tracing::instrument(skip_all, fields(actor = actor.role(), %seller_id))]
    pub async fn place_order(
        &self,
        actor: &Actor,
        seller_id: SellerId,
        buyer_email: Option<String>,
        shipping_address: Option<String>,
        total_cents: i64,
    ) -> Result<Order, FulfillmentError> {
        let Actor::Buyer(buyer_id) = actor else {
            return Err(FulfillmentError::Forbidden(
                "only buyers place orders".to_string(),
            ));
        };

        let order_id = AggregateId::new();
        let order_number = self.numbers.order_number().await?;
        let result = self
            .orders
            .place_order(
                order_id,
                order_number,
                *buyer_id,
                seller_id,
                buyer_email,
                shipping_address,
                total_cents,
            )
            .await?;

        metrics::counter!("orders_placed_total").increment(1);
        Ok(result.aggregate)
    }

    /// Cancels an order on behalf of its buyer.
    #[tracing::instrument(skip_all, fields(actor = actor.role(), %order_id))]
    pub async fn cancel_order(
        &self,
        actor: &Actor,
        order_id: AggregateId,
        reason: String,
    ) -> Result<Order, FulfillmentError> {
        let order = self.require_order(order_id).await?;
        actor.require_buyer(order_buyer(&order, order_id)?)?;

        let result = self
            .orders
            .cancel_order(order_id, reason, actor.role().to_string())
            .await?;

        metrics::counter!("orders_cancelled_total").increment(1);
        Ok(result.aggregate)
    }

    /// Records a courier scan against an order, creating the shipment on
    /// first contact, then bridges the order status.
    #[tracing::instrument(skip_all, fields(actor = actor.role(), %order_id, status = %submission.status))]
    pub async fn record_event(
        &self,
        actor: &Actor,
        order_id: AggregateId,
        submission: TrackingSubmission,
    ) -> Result<Shipment, FulfillmentError> {
        let order = self.require_order(order_id).await?;
        actor.require_seller(order_seller(&order, order_id)?)?;

        let occurred_at = submission.occurred_at.unwrap_or_else(Utc::now);

        // A rejected scan must leave the log untouched, so the bridge
        // transition is checked before any shipment event is appended.
        order
            .bridge_to(bridge::order_status_for(submission.status), None, occurred_at)
            .map_err(domain::DomainError::from)?;

        self.ensure_shipment(order_id, order_seller(&order, order_id)?)
            .await?;
        let shipment_id = shipment_id_for_order(order_id);

        let result = self
            .shipments
            .record_tracking(
                shipment_id,
                submission.status,
                submission.location,
                submission.description,
                submission.courier,
                submission.point,
                occurred_at,
            )
            .await?;

        self.bridge_order(order_id, &result.aggregate).await?;
        metrics::counter!("tracking_events_recorded_total").increment(1);
        Ok(result.aggregate)
    }

    /// Updates a shipment's position.
    #[tracing::instrument(skip_all, fields(actor = actor.role(), %shipment_id))]
    pub async fn update_location(
        &self,
        actor: &Actor,
        shipment_id: AggregateId,
        point: Option<GeoPoint>,
        address: String,
        occurred_at: Option<DateTime<Utc>>,
    ) -> Result<Shipment, FulfillmentError> {
        let shipment = self.require_shipment(shipment_id).await?;
        actor.require_seller(shipment_seller(&shipment, shipment_id)?)?;

        let result = self
            .shipments
            .ping_location(
                shipment_id,
                point,
                address,
                occurred_at.unwrap_or_else(Utc::now),
            )
            .await?;
        Ok(result.aggregate)
    }

    /// Confirms delivery, storing proof files before any state changes.
    #[tracing::instrument(skip_all, fields(actor = actor.role(), %shipment_id))]
    pub async fn confirm_delivery(
        &self,
        actor: &Actor,
        shipment_id: AggregateId,
        delivered_to: Option<String>,
        photo: Option<UploadFile>,
        signature: Option<UploadFile>,
        occurred_at: Option<DateTime<Utc>>,
    ) -> Result<Shipment, FulfillmentError> {
        let shipment = self.require_shipment(shipment_id).await?;
        actor.require_seller(shipment_seller(&shipment, shipment_id)?)?;

        let files: Vec<UploadFile> = photo.iter().chain(signature.iter()).cloned().collect();
        validate_files(&files)?;

        let mut image_url = None;
        if let Some(file) = &photo {
            image_url = Some(self.blobs.put(file).await?);
        }
        let mut signature_url = None;
        if let Some(file) = &signature {
            signature_url = Some(self.blobs.put(file).await?);
        }

        let result = self
            .shipments
            .confirm_delivery(
                shipment_id,
                delivered_to,
                image_url,
                signature_url,
                occurred_at.unwrap_or_else(Utc::now),
            )
            .await?;

        let order_id = shipment_order(&result.aggregate, shipment_id)?;
        self.bridge_order(order_id, &result.aggregate).await?;
        metrics::counter!("deliveries_confirmed_total").increment(1);
        Ok(result.aggregate)
    }

    /// Records a failed delivery attempt.
    #[tracing::instrument(skip_all, fields(actor = actor.role(), %shipment_id))]
    pub async fn record_failed_delivery(
        &self,
        actor: &Actor,
        shipment_id: AggregateId,
        reason: Option<String>,
        occurred_at: Option<DateTime<Utc>>,
    ) -> Result<Shipment, FulfillmentError> {
        let shipment = self.require_shipment(shipment_id).await?;
        actor.require_seller(shipment_seller(&shipment, shipment_id)?)?;

        let result = self
            .shipments
            .record_failed_delivery(shipment_id, reason, occurred_at.unwrap_or_else(Utc::now))
            .await?;

        let order_id = shipment_order(&result.aggregate, shipment_id)?;
        self.bridge_order(order_id, &result.aggregate).await?;
        Ok(result.aggregate)
    }

    async fn require_order(&self, order_id: AggregateId) -> Result<Order, FulfillmentError> {
        self.orders
            .get_order(order_id)
            .await?
            .ok_or(FulfillmentError::OrderNotFound(order_id))
    }

    async fn require_shipment(
        &self,
        shipment_id: AggregateId,
    ) -> Result<Shipment, FulfillmentError> {
        self.shipments
            .get_shipment(shipment_id)
            .await?
            .ok_or(FulfillmentError::ShipmentNotFound(shipment_id))
    }

    /// Loads the order's shipment, opening it on first contact.
    async fn ensure_shipment(
        &self,
        order_id: AggregateId,
        seller_id: SellerId,
    ) -> Result<Shipment, FulfillmentError> {
        let shipment_id = shipment_id_for_order(order_id);
        if let Some(shipment) = self.shipments.get_shipment(shipment_id).await? {
            return Ok(shipment);
        }

        let tracking_number = self.numbers.tracking_number().await?;
        match self
            .shipments
            .open_shipment(
                shipment_id,
                tracking_number,
                order_id,
                seller_id,
                None,
                None,
                None,
            )
            .await
        {
            Ok(result) => {
                metrics::counter!("shipments_opened_total").increment(1);
                Ok(result.aggregate)
            }
            // A concurrent first scan opened it; use theirs.
            Err(e)
                if e.is_concurrency_conflict()
                    || matches!(
                        e,
                        domain::DomainError::Shipment(
                            domain::shipment::ShipmentError::AlreadyOpened
                        )
                    ) =>
            {
                Ok(self.shipments.require_shipment(shipment_id).await?)
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Bridges the shipment's derived status onto the order.
    ///
    /// A lost write race against another scan is retried once with fresh
    /// state; a second loss propagates as a conflict.
    async fn bridge_order(
        &self,
        order_id: AggregateId,
        shipment: &Shipment,
    ) -> Result<(), FulfillmentError> {
        let derived = shipment.status();
        let target = bridge::order_status_for(derived);
        let note = Some(derived.as_str().to_string());
        let at = shipment.status_at().unwrap_or_else(Utc::now);

        match self
            .orders
            .bridge_status(order_id, target, note.clone(), at)
            .await
        {
            Ok(_) => Ok(()),
            Err(e) if e.is_concurrency_conflict() => {
                tracing::warn!(%order_id, %target, "status bridge lost a write race, retrying");
                self.orders.bridge_status(order_id, target, note, at).await?;
                Ok(())
            }
            Err(e) => Err(e.into()),
        }
    }
}

fn order_buyer(order: &Order, order_id: AggregateId) -> Result<common::BuyerId, FulfillmentError> {
    order
        .buyer_id()
        .ok_or(FulfillmentError::OrderNotFound(order_id))
}

fn order_seller(order: &Order, order_id: AggregateId) -> Result<SellerId, FulfillmentError> {
    order
        .seller_id()
        .ok_or(FulfillmentError::OrderNotFound(order_id))
}

fn shipment_seller(
    shipment: &Shipment,
    shipment_id: AggregateId,
) -> Result<SellerId, FulfillmentError> {
    shipment
        .seller_id()
        .ok_or(FulfillmentError::ShipmentNotFound(shipment_id))
}

fn shipment_order(
    shipment: &Shipment,
    shipment_id: AggregateId,
) -> Result<AggregateId, FulfillmentError> {
    shipment
        .order_id()
        .ok_or(FulfillmentError::ShipmentNotFound(shipment_id))
}

/// Authorizes a tracking lookup.
///
/// Parties to the order and admins always pass. Guests must present the
/// email given at checkout; anyone else is refused.
pub fn authorize_tracking_access(
    actor: Option<&Actor>,
    order: &Order,
    email: Option<&str>,
) -> Result<(), FulfillmentError> {
    match actor {
        Some(Actor::Admin) => Ok(()),
        Some(Actor::Buyer(id)) if order.buyer_id() == Some(*id) => Ok(()),
        Some(Actor::Seller(id)) if order.seller_id() == Some(*id) => Ok(()),
        Some(_) => Err(FulfillmentError::Forbidden(
            "not a party to this order".to_string(),
        )),
        None => {
            let given = email.ok_or_else(|| {
                FulfillmentError::Forbidden("guest lookups require the order email".to_string())
            })?;
            let known = order.buyer_email().ok_or_else(|| {
                FulfillmentError::Forbidden("this order has no guest email on file".to_string())
            })?;
            if given.eq_ignore_ascii_case(known) {
                Ok(())
            } else {
                Err(FulfillmentError::Forbidden(
                    "email does not match this order".to_string(),
                ))
            }
        }
    }
}
