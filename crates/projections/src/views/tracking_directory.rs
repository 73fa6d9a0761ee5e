//! Directory read model resolving public reference numbers to aggregates.
//!
//! Tracking lookups accept either an order number or a tracking number.
//! This view maintains the mapping from those identifiers to aggregate ids
//! so the query path never scans the event log.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use common::AggregateId;
use domain::order::OrderEvent;
use domain::shipment::ShipmentEvent;
use event_store::StoredEvent;
use tokio::sync::RwLock;

use crate::projection::{Projection, ProjectionPosition};
use crate::{ProjectionError, Result};
use crate::read_model::ReadModel;

/// The aggregates behind a tracking identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrackingHandle {
    pub order_id: AggregateId,
    pub shipment_id: Option<AggregateId>,
}

#[derive(Default)]
struct Directory {
    orders_by_number: HashMap<String, AggregateId>,
    shipments_by_number: HashMap<String, (AggregateId, AggregateId)>,
    shipment_by_order: HashMap<AggregateId, AggregateId>,
}

/// Read model view mapping reference numbers to order and shipment ids.
#[derive(Clone, Default)]
pub struct TrackingDirectoryView {
    directory: Arc<RwLock<Directory>>,
    position: Arc<RwLock<ProjectionPosition>>,
}

impl TrackingDirectoryView {
    /// Creates a new empty directory view.
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolves an order number or tracking number to its aggregates.
    ///
    /// Identifiers are matched case-insensitively after trimming.
    pub async fn resolve(&self, identifier: &str) -> Option<TrackingHandle> {
        let key = normalize(identifier);
        let directory = self.directory.read().await;

        if let Some(&(shipment_id, order_id)) = directory.shipments_by_number.get(&key) {
            return Some(TrackingHandle {
                order_id,
                shipment_id: Some(shipment_id),
            });
        }

        directory
            .orders_by_number
            .get(&key)
            .map(|&order_id| TrackingHandle {
                order_id,
                shipment_id: directory.shipment_by_order.get(&order_id).copied(),
            })
    }

    /// Returns the shipment opened for an order, if any.
    pub async fn shipment_for_order(&self, order_id: AggregateId) -> Option<AggregateId> {
        self.directory
            .read()
            .await
            .shipment_by_order
            .get(&order_id)
            .copied()
    }
}

fn normalize(identifier: &str) -> String {
    identifier.trim().to_uppercase()
}

#[async_trait]
impl Projection for TrackingDirectoryView {
    fn name(&self) -> &'static str {
        "TrackingDirectoryView"
    }

    async fn handle(&self, event: &StoredEvent) -> Result<()> {
        match event.aggregate_type.as_str() {
            "Order" => {
                if event.event_type == "OrderPlaced" {
                    let order_event: OrderEvent = serde_json::from_value(event.payload.clone())
                        .map_err(|e| ProjectionError::malformed(&event.event_type, e))?;
                    if let OrderEvent::OrderPlaced {
                        order_id,
                        order_number,
                        ..
                    } = order_event
                    {
                        self.directory
                            .write()
                            .await
                            .orders_by_number
                            .insert(normalize(order_number.as_str()), order_id);
                    }
                }
            }
            "Shipment" => {
                if event.event_type == "ShipmentOpened" {
                    let shipment_event: ShipmentEvent =
                        serde_json::from_value(event.payload.clone())
                            .map_err(|e| ProjectionError::malformed(&event.event_type, e))?;
                    if let ShipmentEvent::ShipmentOpened {
                        shipment_id,
                        tracking_number,
                        order_id,
                        ..
                    } = shipment_event
                    {
                        let mut directory = self.directory.write().await;
                        directory
                            .shipments_by_number
                            .insert(normalize(tracking_number.as_str()), (shipment_id, order_id));
                        directory.shipment_by_order.insert(order_id, shipment_id);
                    }
                }
            }
            _ => {}
        }

        let mut pos = self.position.write().await;
        *pos = pos.advance();

        Ok(())
    }

    async fn position(&self) -> ProjectionPosition {
        *self.position.read().await
    }

    async fn reset(&self) -> Result<()> {
        *self.directory.write().await = Directory::default();
        *self.position.write().await = ProjectionPosition::zero();
        Ok(())
    }
}

impl ReadModel for TrackingDirectoryView {
    fn name(&self) -> &'static str {
        "TrackingDirectoryView"
    }

    fn count(&self) -> usize {
        self.directory
            .try_read()
            .map(|d| d.orders_by_number.len() + d.shipments_by_number.len())
            .unwrap_or(0)
    }
}
