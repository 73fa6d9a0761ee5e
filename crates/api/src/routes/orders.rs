//! Order placement, cancellation, and inspection endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, State};
use axum::http::HeaderMap;
use common::SellerId;
use domain::Aggregate;
use domain::order::Order;
use event_store::EventStore;
use fulfillment::coordinator::authorize_tracking_access;
use serde::{Deserialize, Serialize};

use crate::error::ApiError;
use crate::routes::{AppState, parse_aggregate_id, require_actor};

// -- Request types --

#[derive(Deserialize)]
pub struct PlaceOrderRequest {
    pub seller_id: String,
    pub buyer_email: Option<String>,
    pub shipping_address: Option<String>,
    pub total_cents: i64,
}

#[derive(Deserialize)]
pub struct CancelOrderRequest {
    pub reason: String,
}

// -- Response types --

#[derive(Serialize)]
pub struct TimelineEntryResponse {
    pub status: String,
    pub timestamp: String,
    pub display_time: String,
}

#[derive(Serialize)]
pub struct OrderResponse {
    pub id: String,
    pub order_number: String,
    pub buyer_id: String,
    pub seller_id: String,
    pub status: String,
    pub total_cents: i64,
    pub shipping_address: Option<String>,
    pub timeline: Vec<TimelineEntryResponse>,
}

pub(crate) fn order_response(order: &Order) -> Result<OrderResponse, ApiError> {
    let id = order
        .id()
        .ok_or_else(|| ApiError::Internal("order aggregate has no id".to_string()))?;
    Ok(OrderResponse {
        id: id.to_string(),
        order_number: order
            .order_number()
            .map(|n| n.as_str().to_string())
            .unwrap_or_default(),
        buyer_id: order.buyer_id().map(|b| b.to_string()).unwrap_or_default(),
        seller_id: order.seller_id().map(|s| s.to_string()).unwrap_or_default(),
        status: order.status().to_string(),
        total_cents: order.total_cents(),
        shipping_address: order.shipping_address().map(String::from),
        timeline: order
            .timeline()
            .iter()
            .map(|entry| TimelineEntryResponse {
                status: entry.status.to_string(),
                timestamp: entry.timestamp.to_rfc3339(),
                display_time: entry.display_time.clone(),
            })
            .collect(),
    })
}

// -- Handlers --

/// POST /orders — place an order as the calling buyer.
#[tracing::instrument(skip_all)]
pub async fn place<S: EventStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    headers: HeaderMap,
    Json(req): Json<PlaceOrderRequest>,
) -> Result<(axum::http::StatusCode, Json<OrderResponse>), ApiError> {
    let actor = require_actor(&headers)?;
    let seller_uuid = uuid::Uuid::parse_str(&req.seller_id)
        .map_err(|e| ApiError::BadRequest(format!("invalid seller_id: {e}")))?;
    if req.total_cents <= 0 {
        return Err(ApiError::BadRequest(
            "total_cents must be positive".to_string(),
        ));
    }

    let order = state
        .tracking
        .place_order(
            &actor,
            SellerId::from_uuid(seller_uuid),
            req.buyer_email,
            req.shipping_address,
            req.total_cents,
        )
        .await?;

    Ok((axum::http::StatusCode::CREATED, Json(order_response(&order)?)))
}

/// POST /orders/:id/cancel — cancel an order that has not shipped.
#[tracing::instrument(skip_all, fields(%id))]
pub async fn cancel<S: EventStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    headers: HeaderMap,
    Path(id): Path<String>,
    Json(req): Json<CancelOrderRequest>,
) -> Result<Json<OrderResponse>, ApiError> {
    let actor = require_actor(&headers)?;
    let order_id = parse_aggregate_id(&id)?;

    let order = state.tracking.cancel_order(&actor, order_id, req.reason).await?;
    Ok(Json(order_response(&order)?))
}

/// GET /orders/:id — load an order, visible to its parties and admins.
#[tracing::instrument(skip_all, fields(%id))]
pub async fn get<S: EventStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Result<Json<OrderResponse>, ApiError> {
    let actor = require_actor(&headers)?;
    let order_id = parse_aggregate_id(&id)?;

    let order = state
        .tracking
        .orders()
        .get_order(order_id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("order {id} not found")))?;
    authorize_tracking_access(Some(&actor), &order, None)?;

    Ok(Json(order_response(&order)?))
}

/// Response type for stored event data.
#[derive(Serialize)]
pub struct StoredEventResponse {
    pub event_id: String,
    pub event_type: String,
    pub aggregate_id: String,
    pub version: i64,
    pub occurred_at: String,
    pub recorded_at: String,
    pub payload: serde_json::Value,
}

/// GET /orders/:id/events — the order's event log, for parties and admins.
#[tracing::instrument(skip_all, fields(%id))]
pub async fn events<S: EventStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Result<Json<Vec<StoredEventResponse>>, ApiError> {
    let actor = require_actor(&headers)?;
    let order_id = parse_aggregate_id(&id)?;

    let order = state
        .tracking
        .orders()
        .get_order(order_id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("order {id} not found")))?;
    authorize_tracking_access(Some(&actor), &order, None)?;

    let events = state
        .event_store
        .events_for_aggregate(order_id)
        .await
        .map_err(|e| ApiError::Internal(e.to_string()))?;

    let responses: Vec<StoredEventResponse> = events
        .into_iter()
        .map(|e| StoredEventResponse {
            event_id: e.event_id.to_string(),
            event_type: e.event_type,
            aggregate_id: e.aggregate_id.to_string(),
            version: e.version.as_i64(),
            occurred_at: e.occurred_at.to_rfc3339(),
            recorded_at: e.recorded_at.to_rfc3339(),
            payload: e.payload,
        })
        .collect();

    Ok(Json(responses))
}
