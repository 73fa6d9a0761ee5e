//! API error types with HTTP response mapping.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use domain::dispute::DisputeError;
use domain::order::OrderError;
use domain::shipment::ShipmentError;
use domain::DomainError;
use event_store::EventStoreError;
use fulfillment::FulfillmentError;

/// API-level error type that maps to HTTP responses.
#[derive(Debug)]
pub enum ApiError {
    /// Missing or malformed caller identity.
    Unauthenticated(String),
    /// Resource not found.
    NotFound(String),
    /// Bad request from the client.
    BadRequest(String),
    /// Fulfillment workflow error.
    Fulfillment(FulfillmentError),
    /// Internal server error.
    Internal(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            ApiError::Unauthenticated(msg) => (
                StatusCode::UNAUTHORIZED,
                serde_json::json!({ "error": msg }),
            ),
            ApiError::NotFound(msg) => {
                (StatusCode::NOT_FOUND, serde_json::json!({ "error": msg }))
            }
            ApiError::BadRequest(msg) => (
                StatusCode::BAD_REQUEST,
                serde_json::json!({ "error": msg }),
            ),
            ApiError::Fulfillment(err) => fulfillment_error_to_response(err),
            ApiError::Internal(msg) => {
                tracing::error!(error = %msg, "internal server error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    serde_json::json!({ "error": msg }),
                )
            }
        };

        (status, axum::Json(body)).into_response()
    }
}

fn fulfillment_error_to_response(err: FulfillmentError) -> (StatusCode, serde_json::Value) {
    let status = match &err {
        FulfillmentError::Forbidden(_) => StatusCode::FORBIDDEN,
        FulfillmentError::OrderNotFound(_)
        | FulfillmentError::ShipmentNotFound(_)
        | FulfillmentError::DisputeNotFound(_) => StatusCode::NOT_FOUND,
        FulfillmentError::ActiveDisputeExists {
            dispute_id,
            dispute_number,
            ..
        } => {
            // Point the caller at the dispute that blocks them.
            return (
                StatusCode::CONFLICT,
                serde_json::json!({
                    "error": err.to_string(),
                    "dispute_id": dispute_id.to_string(),
                    "dispute_number": dispute_number.as_str(),
                }),
            );
        }
        FulfillmentError::UploadRejected(_) => StatusCode::BAD_REQUEST,
        FulfillmentError::BlobStorage(_) => StatusCode::SERVICE_UNAVAILABLE,
        FulfillmentError::NumberSpaceExhausted { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        FulfillmentError::Domain(domain_err) => domain_error_status(domain_err),
    };

    if status == StatusCode::INTERNAL_SERVER_ERROR {
        tracing::error!(error = %err, "internal server error");
    }
    (status, serde_json::json!({ "error": err.to_string() }))
}

fn domain_error_status(err: &DomainError) -> StatusCode {
    match err {
        DomainError::AggregateNotFound { .. } => StatusCode::NOT_FOUND,
        DomainError::EventStore(EventStoreError::ConcurrencyConflict { .. }) => {
            StatusCode::CONFLICT
        }
        DomainError::Order(order_err) => match order_err {
            OrderError::NotPlaced => StatusCode::NOT_FOUND,
            OrderError::AlreadyPlaced => StatusCode::CONFLICT,
            OrderError::InvalidStateTransition { .. } | OrderError::CannotCancel { .. } => {
                StatusCode::UNPROCESSABLE_ENTITY
            }
        },
        DomainError::Shipment(shipment_err) => match shipment_err {
            ShipmentError::NotOpened => StatusCode::NOT_FOUND,
            ShipmentError::AlreadyOpened => StatusCode::CONFLICT,
            ShipmentError::Closed { .. } => StatusCode::UNPROCESSABLE_ENTITY,
        },
        DomainError::Dispute(dispute_err) => match dispute_err {
            DisputeError::NotOpened => StatusCode::NOT_FOUND,
            DisputeError::AlreadyOpened | DisputeError::SellerResponseAlreadySubmitted => {
                StatusCode::CONFLICT
            }
            DisputeError::Closed { .. }
            | DisputeError::NotSellersTurn { .. }
            | DisputeError::NotBuyersTurn { .. } => StatusCode::UNPROCESSABLE_ENTITY,
        },
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl From<FulfillmentError> for ApiError {
    fn from(err: FulfillmentError) -> Self {
        ApiError::Fulfillment(err)
    }
}

impl From<DomainError> for ApiError {
    fn from(err: DomainError) -> Self {
        ApiError::Fulfillment(FulfillmentError::Domain(err))
    }
}
