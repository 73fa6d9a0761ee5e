//! Dispute workflow endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Multipart, Path, Query, State};
use axum::http::HeaderMap;
use chrono::{DateTime, Duration, Utc};
use domain::Aggregate;
use domain::dispute::{
    Dispute, DisputeKind, DisputeOutcome, DisputePriority, Evidence, NextAction, PartyResponse,
    ResolutionRecord,
};
use event_store::EventStore;
use serde::{Deserialize, Serialize};

use crate::error::ApiError;
use crate::routes::{AppState, collect_multipart, parse_aggregate_id, parse_enum, require_actor};

// -- Request types --

#[derive(Deserialize)]
pub struct BuyerResponseRequest {
    pub text: String,
}

#[derive(Deserialize)]
pub struct ResolveRequest {
    pub outcome: DisputeOutcome,
    pub resolution: String,
    pub resolved_by: String,
}

// -- Response types --

#[derive(Serialize)]
pub struct DisputeResponse {
    pub id: String,
    pub dispute_number: String,
    pub order_id: String,
    pub buyer_id: String,
    pub seller_id: String,
    pub kind: Option<DisputeKind>,
    pub priority: DisputePriority,
    pub status: String,
    pub reason: String,
    pub description: String,
    pub evidence: Vec<Evidence>,
    pub seller_response: Option<PartyResponse>,
    pub buyer_response: Option<PartyResponse>,
    pub response_deadline: Option<DateTime<Utc>>,
    pub resolution: Option<ResolutionRecord>,
    pub opened_at: Option<DateTime<Utc>>,
    pub next_action: NextAction,
}

#[derive(Deserialize)]
pub struct ActionItemsQuery {
    /// Width of the "due soon" window, in minutes. Defaults to 24 hours.
    pub window_minutes: Option<i64>,
}

#[derive(Serialize)]
pub struct ActionItemsResponse {
    pub overdue: usize,
    pub due_soon: usize,
    pub items: Vec<ActionItemResponse>,
}

#[derive(Serialize)]
pub struct ActionItemResponse {
    pub dispute_id: String,
    pub dispute_number: String,
    pub order_id: String,
    pub priority: DisputePriority,
    pub status: String,
    pub response_deadline: Option<DateTime<Utc>>,
    pub deadline_expired: bool,
    pub opened_at: DateTime<Utc>,
}

fn dispute_response(dispute: &Dispute) -> Result<DisputeResponse, ApiError> {
    let id = dispute
        .id()
        .ok_or_else(|| ApiError::Internal("dispute aggregate has no id".to_string()))?;
    Ok(DisputeResponse {
        id: id.to_string(),
        dispute_number: dispute
            .dispute_number()
            .map(|n| n.as_str().to_string())
            .unwrap_or_default(),
        order_id: dispute
            .order_id()
            .map(|o| o.to_string())
            .unwrap_or_default(),
        buyer_id: dispute
            .buyer_id()
            .map(|b| b.to_string())
            .unwrap_or_default(),
        seller_id: dispute
            .seller_id()
            .map(|s| s.to_string())
            .unwrap_or_default(),
        kind: dispute.kind(),
        priority: dispute.priority(),
        status: dispute.status().as_str().to_string(),
        reason: dispute.reason().to_string(),
        description: dispute.description().to_string(),
        evidence: dispute.evidence().to_vec(),
        seller_response: dispute.seller_response().cloned(),
        buyer_response: dispute.buyer_response().cloned(),
        response_deadline: dispute.response_deadline(),
        resolution: dispute.resolution().cloned(),
        opened_at: dispute.opened_at(),
        next_action: dispute.next_action(Utc::now()),
    })
}

// -- Handlers --

/// POST /disputes — open a dispute as the calling buyer.
///
/// Multipart body: `order_id`, `kind`, `reason`, `description`, optional
/// `priority`, plus any evidence files.
#[tracing::instrument(skip_all)]
pub async fn open<S: EventStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    headers: HeaderMap,
    multipart: Multipart,
) -> Result<(axum::http::StatusCode, Json<DisputeResponse>), ApiError> {
    let actor = require_actor(&headers)?;
    let (texts, files) = collect_multipart(multipart).await?;

    let order_id = parse_aggregate_id(required(&texts, "order_id")?)?;
    let kind: DisputeKind = parse_enum("kind", required(&texts, "kind")?)?;
    let reason = required(&texts, "reason")?.to_string();
    let description = required(&texts, "description")?.to_string();
    let priority = match texts.get("priority") {
        Some(value) => parse_enum("priority", value)?,
        None => DisputePriority::default(),
    };

    let dispute = state
        .disputes
        .open_dispute(
            &actor,
            order_id,
            kind,
            reason,
            description,
            priority,
            files.into_iter().map(|(_, file)| file).collect(),
        )
        .await?;

    Ok((
        axum::http::StatusCode::CREATED,
        Json(dispute_response(&dispute)?),
    ))
}

/// GET /disputes/action-items — the triage queue, for admins.
///
/// `window_minutes` sets the width of the "due soon" count.
#[tracing::instrument(skip_all)]
pub async fn action_items<S: EventStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    headers: HeaderMap,
    Query(query): Query<ActionItemsQuery>,
) -> Result<Json<ActionItemsResponse>, ApiError> {
    let actor = require_actor(&headers)?;
    actor.require_admin().map_err(ApiError::from)?;
    state.refresh_views().await?;

    let now = Utc::now();
    let window = Duration::minutes(query.window_minutes.unwrap_or(24 * 60).max(0));

    let overdue = state.dispute_queue.overdue(now).await.len();
    let due_soon = state.dispute_queue.due_within(now, window).await.len();
    let items: Vec<ActionItemResponse> = state
        .dispute_queue
        .action_items()
        .await
        .into_iter()
        .map(|entry| ActionItemResponse {
            dispute_id: entry.dispute_id.to_string(),
            dispute_number: entry.dispute_number.as_str().to_string(),
            order_id: entry.order_id.to_string(),
            priority: entry.priority,
            status: entry.status.as_str().to_string(),
            response_deadline: entry.response_deadline,
            deadline_expired: entry.deadline_expired(now),
            opened_at: entry.opened_at,
        })
        .collect();

    Ok(Json(ActionItemsResponse {
        overdue,
        due_soon,
        items,
    }))
}

/// GET /disputes/:id — load a dispute, visible to its parties and admins.
#[tracing::instrument(skip_all, fields(%id))]
pub async fn get<S: EventStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Result<Json<DisputeResponse>, ApiError> {
    let actor = require_actor(&headers)?;
    let dispute_id = parse_aggregate_id(&id)?;

    let dispute = state.disputes.get_dispute(&actor, dispute_id).await?;
    Ok(Json(dispute_response(&dispute)?))
}

/// POST /disputes/:id/seller-response — the seller's single answer.
///
/// Multipart body: `text`, plus any evidence files.
#[tracing::instrument(skip_all, fields(%id))]
pub async fn seller_response<S: EventStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    headers: HeaderMap,
    Path(id): Path<String>,
    multipart: Multipart,
) -> Result<Json<DisputeResponse>, ApiError> {
    let actor = require_actor(&headers)?;
    let dispute_id = parse_aggregate_id(&id)?;

    let (texts, files) = collect_multipart(multipart).await?;
    let text = required(&texts, "text")?.to_string();

    let dispute = state
        .disputes
        .seller_respond(
            &actor,
            dispute_id,
            text,
            files.into_iter().map(|(_, file)| file).collect(),
        )
        .await?;

    Ok(Json(dispute_response(&dispute)?))
}

/// POST /disputes/:id/buyer-response — the buyer's reply.
#[tracing::instrument(skip_all, fields(%id))]
pub async fn buyer_response<S: EventStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    headers: HeaderMap,
    Path(id): Path<String>,
    Json(req): Json<BuyerResponseRequest>,
) -> Result<Json<DisputeResponse>, ApiError> {
    let actor = require_actor(&headers)?;
    let dispute_id = parse_aggregate_id(&id)?;

    let dispute = state
        .disputes
        .buyer_respond(&actor, dispute_id, req.text)
        .await?;

    Ok(Json(dispute_response(&dispute)?))
}

/// POST /disputes/:id/evidence — attach evidence files.
#[tracing::instrument(skip_all, fields(%id))]
pub async fn upload_evidence<S: EventStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    headers: HeaderMap,
    Path(id): Path<String>,
    multipart: Multipart,
) -> Result<Json<DisputeResponse>, ApiError> {
    let actor = require_actor(&headers)?;
    let dispute_id = parse_aggregate_id(&id)?;

    let (_, files) = collect_multipart(multipart).await?;
    let dispute = state
        .disputes
        .upload_evidence(
            &actor,
            dispute_id,
            files.into_iter().map(|(_, file)| file).collect(),
        )
        .await?;

    Ok(Json(dispute_response(&dispute)?))
}

/// POST /disputes/:id/escalate — move the dispute to platform review.
#[tracing::instrument(skip_all, fields(%id))]
pub async fn escalate<S: EventStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Result<Json<DisputeResponse>, ApiError> {
    let actor = require_actor(&headers)?;
    let dispute_id = parse_aggregate_id(&id)?;

    let dispute = state.disputes.escalate(&actor, dispute_id).await?;
    Ok(Json(dispute_response(&dispute)?))
}

/// POST /disputes/:id/resolve — close the dispute with an outcome.
#[tracing::instrument(skip_all, fields(%id))]
pub async fn resolve<S: EventStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    headers: HeaderMap,
    Path(id): Path<String>,
    Json(req): Json<ResolveRequest>,
) -> Result<Json<DisputeResponse>, ApiError> {
    let actor = require_actor(&headers)?;
    let dispute_id = parse_aggregate_id(&id)?;

    let dispute = state
        .disputes
        .resolve(&actor, dispute_id, req.outcome, req.resolution, req.resolved_by)
        .await?;

    Ok(Json(dispute_response(&dispute)?))
}

fn required<'a>(
    texts: &'a std::collections::HashMap<String, String>,
    field: &str,
) -> Result<&'a str, ApiError> {
    texts
        .get(field)
        .map(String::as_str)
        .ok_or_else(|| ApiError::BadRequest(format!("missing field {field}")))
}
