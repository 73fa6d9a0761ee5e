//! Route handlers and shared request plumbing.

pub mod disputes;
pub mod health;
pub mod metrics;
pub mod orders;
pub mod tracking;

use std::collections::HashMap;
use std::sync::Arc;

use axum::extract::Multipart;
use axum::http::HeaderMap;
use common::{AggregateId, BuyerId, SellerId};
use event_store::EventStore;
use fulfillment::{Actor, DisputeCoordinator, InMemoryBlobStore, TrackingCoordinator, UploadFile};
use projections::{DisputeQueueView, ProjectionProcessor, TrackingDirectoryView};
use serde::de::DeserializeOwned;

use crate::error::ApiError;

/// Shared application state accessible from all handlers.
pub struct AppState<S: EventStore + Clone> {
    pub tracking: TrackingCoordinator<S, InMemoryBlobStore>,
    pub disputes: DisputeCoordinator<S, InMemoryBlobStore>,
    pub dispute_queue: Arc<DisputeQueueView>,
    pub directory: Arc<TrackingDirectoryView>,
    pub event_store: S,
    pub projection_processor: Arc<ProjectionProcessor<S>>,
}

impl<S: EventStore + Clone> AppState<S> {
    /// Brings the read models up to date before a query.
    pub async fn refresh_views(&self) -> Result<(), ApiError> {
        self.projection_processor
            .run_catch_up()
            .await
            .map_err(|e| ApiError::Internal(e.to_string()))
    }
}

/// Reads the caller identity the gateway asserts in headers.
///
/// `x-actor-role` is `buyer`, `seller`, or `admin`; buyers and sellers
/// also carry their id in `x-actor-id`. Absent headers mean a guest.
pub fn actor_from_headers(headers: &HeaderMap) -> Result<Option<Actor>, ApiError> {
    let Some(role) = headers.get("x-actor-role") else {
        return Ok(None);
    };
    let role = role
        .to_str()
        .map_err(|_| ApiError::Unauthenticated("unreadable x-actor-role header".to_string()))?;

    match role {
        "admin" => Ok(Some(Actor::Admin)),
        "buyer" => Ok(Some(Actor::Buyer(BuyerId::from_uuid(actor_id(headers)?)))),
        "seller" => Ok(Some(Actor::Seller(SellerId::from_uuid(actor_id(headers)?)))),
        other => Err(ApiError::Unauthenticated(format!(
            "unknown actor role {other}"
        ))),
    }
}

/// Like [`actor_from_headers`], but guests are refused.
pub fn require_actor(headers: &HeaderMap) -> Result<Actor, ApiError> {
    actor_from_headers(headers)?
        .ok_or_else(|| ApiError::Unauthenticated("this endpoint requires a signed-in actor".to_string()))
}

fn actor_id(headers: &HeaderMap) -> Result<uuid::Uuid, ApiError> {
    let value = headers
        .get("x-actor-id")
        .ok_or_else(|| ApiError::Unauthenticated("missing x-actor-id header".to_string()))?;
    let value = value
        .to_str()
        .map_err(|_| ApiError::Unauthenticated("unreadable x-actor-id header".to_string()))?;
    uuid::Uuid::parse_str(value)
        .map_err(|e| ApiError::Unauthenticated(format!("invalid x-actor-id: {e}")))
}

pub(crate) fn parse_aggregate_id(id: &str) -> Result<AggregateId, ApiError> {
    let uuid = uuid::Uuid::parse_str(id)
        .map_err(|e| ApiError::BadRequest(format!("invalid id format: {e}")))?;
    Ok(AggregateId::from(uuid))
}

/// Parses a lowercase wire name into a serde snake_case enum.
pub(crate) fn parse_enum<T: DeserializeOwned>(field: &str, value: &str) -> Result<T, ApiError> {
    serde_json::from_value(serde_json::Value::String(value.to_string()))
        .map_err(|_| ApiError::BadRequest(format!("invalid {field}: {value}")))
}

/// Drains a multipart request into named text fields and uploaded files.
///
/// Files keep the multipart field name they arrived under, so handlers
/// can tell a `photo` from a `signature`.
pub(crate) async fn collect_multipart(
    mut multipart: Multipart,
) -> Result<(HashMap<String, String>, Vec<(String, UploadFile)>), ApiError> {
    let mut texts = HashMap::new();
    let mut files = Vec::new();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::BadRequest(format!("invalid multipart body: {e}")))?
    {
        let name = field.name().unwrap_or_default().to_string();
        if let Some(filename) = field.file_name() {
            let filename = filename.to_string();
            let content_type = field
                .content_type()
                .unwrap_or("application/octet-stream")
                .to_string();
            let bytes = field
                .bytes()
                .await
                .map_err(|e| ApiError::BadRequest(format!("failed to read {filename}: {e}")))?;
            files.push((
                name,
                UploadFile {
                    filename,
                    content_type,
                    bytes: bytes.to_vec(),
                },
            ));
        } else {
            let value = field
                .text()
                .await
                .map_err(|e| ApiError::BadRequest(format!("failed to read field {name}: {e}")))?;
            texts.insert(name, value);
        }
    }

    Ok((texts, files))
}
