use chrono::{DateTime, Utc};
use common::{AggregateId, SellerId, TrackingNumber};
use event_store::Version;

use crate::aggregate::Aggregate;

use super::{
    DeliveryProof, GeoPoint, LocationFix, PackageSpec, ShipmentError, ShipmentEvent,
    ShipmentStatus, TrackingEvent,
};

/// The shipment aggregate.
///
/// The tracking history is append-only; it never loses or reorders scans.
/// Derived fields (status, location, delivery time) follow the scan with
/// the latest occurrence time, so a late-arriving older scan lands in the
/// history without rolling the shipment backwards.
#[derive(Debug, Default, Clone)]
pub struct Shipment {
    id: Option<AggregateId>,
    version: Version,
    tracking_number: Option<TrackingNumber>,
    order_id: Option<AggregateId>,
    seller_id: Option<SellerId>,
    courier: Option<String>,
    package: Option<PackageSpec>,
    status: ShipmentStatus,
    status_at: Option<DateTime<Utc>>,
    history: Vec<TrackingEvent>,
    current_location: Option<LocationFix>,
    estimated_delivery: Option<DateTime<Utc>>,
    actual_delivery: Option<DateTime<Utc>>,
    proof: Option<DeliveryProof>,
    failed_attempts: u32,
}

impl Shipment {
    /// Returns the public tracking number.
    pub fn tracking_number(&self) -> Option<&TrackingNumber> {
        self.tracking_number.as_ref()
    }

    /// Returns the order this shipment fulfills.
    pub fn order_id(&self) -> Option<AggregateId> {
        self.order_id
    }

    /// Returns the seller who ships the parcel.
    pub fn seller_id(&self) -> Option<SellerId> {
        self.seller_id
    }

    /// Returns the main courier.
    pub fn courier(&self) -> Option<&str> {
        self.courier.as_deref()
    }

    /// Returns the parcel description.
    pub fn package(&self) -> Option<&PackageSpec> {
        self.package.as_ref()
    }

    /// Returns the current status, derived from the latest scan by
    /// occurrence time.
    pub fn status(&self) -> ShipmentStatus {
        self.status
    }

    /// Returns when the current status was observed in the world.
    pub fn status_at(&self) -> Option<DateTime<Utc>> {
        self.status_at
    }

    /// Returns the full tracking history in arrival order.
    pub fn history(&self) -> &[TrackingEvent] {
        &self.history
    }

    /// Returns the parcel's last known position.
    pub fn current_location(&self) -> Option<&LocationFix> {
        self.current_location.as_ref()
    }

    /// Returns the estimated delivery time given at shipping.
    pub fn estimated_delivery(&self) -> Option<DateTime<Utc>> {
        self.estimated_delivery
    }

    /// Returns when the parcel was first delivered.
    ///
    /// Set once; repeated delivery confirmations never move it.
    pub fn actual_delivery(&self) -> Option<DateTime<Utc>> {
        self.actual_delivery
    }

    /// Returns the delivery proof, if confirmed with one.
    pub fn proof(&self) -> Option<&DeliveryProof> {
        self.proof.as_ref()
    }

    /// Returns how many delivery attempts have failed.
    pub fn failed_attempts(&self) -> u32 {
        self.failed_attempts
    }

    // Commands

    /// Opens a shipment for an order.
    #[allow(clippy::too_many_arguments)]
    pub fn open(
        &self,
        shipment_id: AggregateId,
        tracking_number: TrackingNumber,
        order_id: AggregateId,
        seller_id: SellerId,
        courier: Option<String>,
        package: Option<PackageSpec>,
        estimated_delivery: Option<DateTime<Utc>>,
    ) -> Result<Vec<ShipmentEvent>, ShipmentError> {
        if self.id.is_some() {
            return Err(ShipmentError::AlreadyOpened);
        }

        Ok(vec![ShipmentEvent::ShipmentOpened {
            shipment_id,
            tracking_number,
            order_id,
            seller_id,
            courier,
            package,
            estimated_delivery,
            opened_at: Utc::now(),
        }])
    }

    /// Records a courier scan.
    ///
    /// Resubmitting the current terminal status is accepted so courier
    /// webhook retries stay idempotent; any other update on a closed
    /// shipment is rejected.
    pub fn record_tracking(
        &self,
        status: ShipmentStatus,
        location: impl Into<String>,
        description: impl Into<String>,
        courier: Option<String>,
        point: Option<GeoPoint>,
        occurred_at: DateTime<Utc>,
    ) -> Result<Vec<ShipmentEvent>, ShipmentError> {
        if self.id.is_none() {
            return Err(ShipmentError::NotOpened);
        }
        if self.status.is_terminal() && status != self.status {
            return Err(ShipmentError::Closed {
                status: self.status,
            });
        }

        let entry = TrackingEvent::new(status, location, description, courier, point, occurred_at);
        Ok(vec![ShipmentEvent::TrackingRecorded { entry }])
    }

    /// Updates the parcel's position without a status change.
    ///
    /// The ping lands in the history as a synthetic scan at the current
    /// status. A fix older than the one already held is dropped as a
    /// no-op; pings arrive out of order and the map should never jump
    /// backwards.
    pub fn ping_location(
        &self,
        point: Option<GeoPoint>,
        address: impl Into<String>,
        occurred_at: DateTime<Utc>,
    ) -> Result<Vec<ShipmentEvent>, ShipmentError> {
        if self.id.is_none() {
            return Err(ShipmentError::NotOpened);
        }
        if let Some(fix) = &self.current_location
            && occurred_at < fix.recorded_at
        {
            return Ok(vec![]);
        }

        let entry = TrackingEvent::new(
            self.status,
            address,
            "Location update",
            None,
            point,
            occurred_at,
        );
        Ok(vec![ShipmentEvent::LocationPinged { entry }])
    }

    /// Confirms the parcel was handed over.
    ///
    /// Accepted again on an already delivered shipment so proof uploaded
    /// after the courier scan still lands; the delivery time keeps its
    /// first value.
    pub fn confirm_delivery(
        &self,
        delivered_to: Option<String>,
        image_url: Option<String>,
        signature_url: Option<String>,
        occurred_at: DateTime<Utc>,
    ) -> Result<Vec<ShipmentEvent>, ShipmentError> {
        if self.id.is_none() {
            return Err(ShipmentError::NotOpened);
        }
        if self.status == ShipmentStatus::Returned {
            return Err(ShipmentError::Closed {
                status: self.status,
            });
        }

        let location = self
            .current_location
            .as_ref()
            .map(|fix| fix.address.clone())
            .unwrap_or_default();
        let entry = TrackingEvent::new(
            ShipmentStatus::Delivered,
            location,
            "Delivery confirmed",
            None,
            None,
            occurred_at,
        );

        Ok(vec![ShipmentEvent::DeliveryConfirmed {
            entry,
            proof: DeliveryProof {
                delivered_to,
                image_url,
                signature_url,
            },
        }])
    }

    /// Records a failed delivery attempt.
    pub fn record_failed_delivery(
        &self,
        reason: Option<String>,
        occurred_at: DateTime<Utc>,
    ) -> Result<Vec<ShipmentEvent>, ShipmentError> {
        if self.id.is_none() {
            return Err(ShipmentError::NotOpened);
        }
        if self.status.is_terminal() {
            return Err(ShipmentError::Closed {
                status: self.status,
            });
        }

        let description = reason
            .clone()
            .unwrap_or_else(|| "Delivery attempt failed".to_string());
        let location = self
            .current_location
            .as_ref()
            .map(|fix| fix.address.clone())
            .unwrap_or_default();
        let entry = TrackingEvent::new(
            ShipmentStatus::FailedDelivery,
            location,
            description,
            None,
            None,
            occurred_at,
        );

        Ok(vec![ShipmentEvent::DeliveryFailed { entry, reason }])
    }

    // Event application helpers

    fn observe_status(&mut self, status: ShipmentStatus, occurred_at: DateTime<Utc>) {
        if self.status_at.is_none_or(|at| occurred_at >= at) {
            self.status = status;
            self.status_at = Some(occurred_at);
        }
    }

    fn observe_location(
        &mut self,
        point: Option<GeoPoint>,
        address: &str,
        occurred_at: DateTime<Utc>,
    ) {
        if address.is_empty() && point.is_none() {
            return;
        }
        if self
            .current_location
            .as_ref()
            .is_none_or(|fix| occurred_at >= fix.recorded_at)
        {
            self.current_location = Some(LocationFix {
                point,
                address: address.to_string(),
                recorded_at: occurred_at,
            });
        }
    }

    fn apply_scan(&mut self, entry: TrackingEvent) {
        self.observe_status(entry.status, entry.occurred_at);
        self.observe_location(entry.point, &entry.location, entry.occurred_at);
        if entry.status == ShipmentStatus::Delivered && self.actual_delivery.is_none() {
            self.actual_delivery = Some(entry.occurred_at);
        }
        if entry.status == ShipmentStatus::FailedDelivery {
            self.failed_attempts += 1;
        }
        self.history.push(entry);
    }
}

impl Aggregate for Shipment {
    type Event = ShipmentEvent;
    type Error = ShipmentError;

    fn aggregate_type() -> &'static str {
        "Shipment"
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
            ShipmentEvent::ShipmentOpened {
                shipment_id,
                tracking_number,
                order_id,
                seller_id,
                courier,
                package,
                estimated_delivery,
                opened_at,
            } => {
                self.id = Some(shipment_id);
                self.tracking_number = Some(tracking_number);
                self.order_id = Some(order_id);
                self.seller_id = Some(seller_id);
                self.courier = courier;
                self.package = package;
                self.estimated_delivery = estimated_delivery;
                self.observe_status(ShipmentStatus::Pending, opened_at);
            }
            ShipmentEvent::TrackingRecorded { entry } => {
                self.apply_scan(entry);
            }
            // The entry repeats the current status, so only the location
            // moves; counters and delivery stamps stay untouched.
            ShipmentEvent::LocationPinged { entry } => {
                self.observe_location(entry.point, &entry.location, entry.occurred_at);
                self.history.push(entry);
            }
            ShipmentEvent::DeliveryConfirmed { entry, proof } => {
                if self.proof.is_none() {
                    self.proof = Some(proof);
                }
                self.apply_scan(entry);
            }
            ShipmentEvent::DeliveryFailed { entry, .. } => {
                self.apply_scan(entry);
            }
        }
    }
}
