//! Tracking lookup and courier ingestion endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Multipart, Path, Query, State};
use axum::http::HeaderMap;
use chrono::{DateTime, Utc};
use domain::Aggregate;
use domain::bridge;
use domain::shipment::{
    DeliveryProof, GeoPoint, LocationFix, Shipment, ShipmentStatus, TrackingEvent,
};
use event_store::EventStore;
use fulfillment::TrackingSubmission;
use fulfillment::coordinator::authorize_tracking_access;
use serde::{Deserialize, Serialize};

use crate::error::ApiError;
use crate::routes::orders::{OrderResponse, order_response};
use crate::routes::{
    AppState, actor_from_headers, collect_multipart, parse_aggregate_id, require_actor,
};

// -- Request types --

#[derive(Deserialize)]
pub struct TrackingLookupQuery {
    pub email: Option<String>,
}

#[derive(Deserialize)]
pub struct TrackingEventRequest {
    pub status: ShipmentStatus,
    pub location: String,
    pub description: String,
    pub courier: Option<String>,
    pub point: Option<GeoPoint>,
    pub occurred_at: Option<DateTime<Utc>>,
}

#[derive(Deserialize)]
pub struct LocationUpdateRequest {
    pub point: Option<GeoPoint>,
    pub address: String,
    pub occurred_at: Option<DateTime<Utc>>,
}

#[derive(Deserialize)]
pub struct FailedDeliveryRequest {
    pub reason: Option<String>,
    pub occurred_at: Option<DateTime<Utc>>,
}

// -- Response types --

/// The parcel as shown on the tracking page.
///
/// Orders with no shipment yet get a synthesized package so the page can
/// render a consistent shape before the first courier scan.
#[derive(Serialize)]
pub struct PackageResponse {
    pub tracking_number: Option<String>,
    pub status: String,
    pub courier: Option<String>,
    pub estimated_delivery: Option<DateTime<Utc>>,
    pub actual_delivery: Option<DateTime<Utc>>,
    pub current_location: Option<LocationFix>,
    pub failed_attempts: u32,
    pub proof: Option<DeliveryProof>,
    pub history: Vec<TrackingEvent>,
    pub synthesized: bool,
}

/// One package view per shipment; orders with no shipment yet carry a
/// single synthesized view.
#[derive(Serialize)]
pub struct TrackingResponse {
    pub order: OrderResponse,
    pub packages: Vec<PackageResponse>,
}

#[derive(Serialize)]
pub struct ShipmentResponse {
    pub id: String,
    pub order_id: String,
    pub package: PackageResponse,
}

fn package_response(shipment: &Shipment) -> PackageResponse {
    PackageResponse {
        tracking_number: shipment
            .tracking_number()
            .map(|n| n.as_str().to_string()),
        status: shipment.status().to_string(),
        courier: shipment.courier().map(String::from),
        estimated_delivery: shipment.estimated_delivery(),
        actual_delivery: shipment.actual_delivery(),
        current_location: shipment.current_location().cloned(),
        failed_attempts: shipment.failed_attempts(),
        proof: shipment.proof().cloned(),
        history: shipment.history().to_vec(),
        synthesized: false,
    }
}

fn synthesized_package(order: &domain::order::Order) -> PackageResponse {
    PackageResponse {
        tracking_number: None,
        status: bridge::default_shipment_status(order.status()).to_string(),
        courier: None,
        estimated_delivery: None,
        actual_delivery: None,
        current_location: None,
        failed_attempts: 0,
        proof: None,
        history: Vec::new(),
        synthesized: true,
    }
}

fn shipment_response(shipment: &Shipment) -> Result<ShipmentResponse, ApiError> {
    let id = shipment
        .id()
        .ok_or_else(|| ApiError::Internal("shipment aggregate has no id".to_string()))?;
    Ok(ShipmentResponse {
        id: id.to_string(),
        order_id: shipment
            .order_id()
            .map(|o| o.to_string())
            .unwrap_or_default(),
        package: package_response(shipment),
    })
}

// -- Handlers --

/// GET /tracking/:identifier — look up a parcel by order or tracking number.
///
/// Parties and admins pass on identity alone; guests must supply the
/// email given at checkout as the `email` query parameter.
#[tracing::instrument(skip_all, fields(%identifier))]
pub async fn lookup<S: EventStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    headers: HeaderMap,
    Path(identifier): Path<String>,
    Query(query): Query<TrackingLookupQuery>,
) -> Result<Json<TrackingResponse>, ApiError> {
    let actor = actor_from_headers(&headers)?;
    state.refresh_views().await?;

    let handle = state
        .directory
        .resolve(&identifier)
        .await
        .ok_or_else(|| ApiError::NotFound(format!("no order or shipment matches {identifier}")))?;

    let order = state
        .tracking
        .orders()
        .get_order(handle.order_id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("order for {identifier} not found")))?;
    authorize_tracking_access(actor.as_ref(), &order, query.email.as_deref())?;

    let packages = match handle.shipment_id {
        Some(shipment_id) => {
            let shipment = state
                .tracking
                .shipments()
                .require_shipment(shipment_id)
                .await?;
            vec![package_response(&shipment)]
        }
        None => vec![synthesized_package(&order)],
    };

    Ok(Json(TrackingResponse {
        order: order_response(&order)?,
        packages,
    }))
}

/// POST /tracking/orders/:id/events — record a courier scan.
#[tracing::instrument(skip_all, fields(%id))]
pub async fn record_event<S: EventStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    headers: HeaderMap,
    Path(id): Path<String>,
    Json(req): Json<TrackingEventRequest>,
) -> Result<Json<ShipmentResponse>, ApiError> {
    let actor = require_actor(&headers)?;
    let order_id = parse_aggregate_id(&id)?;

    let shipment = state
        .tracking
        .record_event(
            &actor,
            order_id,
            TrackingSubmission {
                status: req.status,
                location: req.location,
                description: req.description,
                courier: req.courier,
                point: req.point,
                occurred_at: req.occurred_at,
            },
        )
        .await?;

    Ok(Json(shipment_response(&shipment)?))
}

/// PATCH /tracking/shipments/:id/location — update the parcel's position.
#[tracing::instrument(skip_all, fields(%id))]
pub async fn update_location<S: EventStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    headers: HeaderMap,
    Path(id): Path<String>,
    Json(req): Json<LocationUpdateRequest>,
) -> Result<Json<ShipmentResponse>, ApiError> {
    let actor = require_actor(&headers)?;
    let shipment_id = parse_aggregate_id(&id)?;

    let shipment = state
        .tracking
        .update_location(&actor, shipment_id, req.point, req.address, req.occurred_at)
        .await?;

    Ok(Json(shipment_response(&shipment)?))
}

/// POST /tracking/shipments/:id/confirm-delivery — close out the parcel.
///
/// Multipart body: optional `delivered_to` and `occurred_at` text fields,
/// optional `photo` and `signature` files.
#[tracing::instrument(skip_all, fields(%id))]
pub async fn confirm_delivery<S: EventStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    headers: HeaderMap,
    Path(id): Path<String>,
    multipart: Multipart,
) -> Result<Json<ShipmentResponse>, ApiError> {
    let actor = require_actor(&headers)?;
    let shipment_id = parse_aggregate_id(&id)?;

    let (texts, files) = collect_multipart(multipart).await?;
    let occurred_at = texts
        .get("occurred_at")
        .map(|s| parse_timestamp("occurred_at", s))
        .transpose()?;

    let mut photo = None;
    let mut signature = None;
    for (field, file) in files {
        match field.as_str() {
            "photo" => photo = Some(file),
            "signature" => signature = Some(file),
            other => {
                return Err(ApiError::BadRequest(format!(
                    "unexpected file field {other}"
                )));
            }
        }
    }

    let shipment = state
        .tracking
        .confirm_delivery(
            &actor,
            shipment_id,
            texts.get("delivered_to").cloned(),
            photo,
            signature,
            occurred_at,
        )
        .await?;

    Ok(Json(shipment_response(&shipment)?))
}

/// POST /tracking/shipments/:id/failed-delivery — record a failed attempt.
#[tracing::instrument(skip_all, fields(%id))]
pub async fn failed_delivery<S: EventStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    headers: HeaderMap,
    Path(id): Path<String>,
    Json(req): Json<FailedDeliveryRequest>,
) -> Result<Json<ShipmentResponse>, ApiError> {
    let actor = require_actor(&headers)?;
    let shipment_id = parse_aggregate_id(&id)?;

    let shipment = state
        .tracking
        .record_failed_delivery(&actor, shipment_id, req.reason, req.occurred_at)
        .await?;

    Ok(Json(shipment_response(&shipment)?))
}

pub(crate) fn parse_timestamp(field: &str, value: &str) -> Result<DateTime<Utc>, ApiError> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| ApiError::BadRequest(format!("invalid {field}: {e}")))
}
