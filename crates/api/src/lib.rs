//! HTTP API server for the fulfillment and dispute core.
//!
//! Exposes order placement, tracking ingestion and lookup, and the
//! dispute workflow, with structured logging (tracing) and Prometheus
//! metrics.

pub mod config;
pub mod error;
pub mod routes;

use std::sync::Arc;

use axum::Router;
use axum::routing::{get, patch, post};
use event_store::EventStore;
use fulfillment::{DisputeCoordinator, InMemoryBlobStore, NumberGenerator, TrackingCoordinator};
use metrics_exporter_prometheus::PrometheusHandle;
use projections::{DisputeQueueView, Projection, ProjectionProcessor, TrackingDirectoryView};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use routes::AppState;

/// Creates the Axum application router with all routes and shared state.
pub fn create_app<S: EventStore + Clone + 'static>(
    state: Arc<AppState<S>>,
    metrics_handle: PrometheusHandle,
) -> Router {
    let metrics_router = Router::new()
        .route("/metrics", get(routes::metrics::render))
        .with_state(metrics_handle);

    Router::new()
        .route("/health", get(routes::health::check))
        .route("/orders", post(routes::orders::place::<S>))
        .route("/orders/{id}", get(routes::orders::get::<S>))
        .route("/orders/{id}/cancel", post(routes::orders::cancel::<S>))
        .route("/orders/{id}/events", get(routes::orders::events::<S>))
        .route("/tracking/{identifier}", get(routes::tracking::lookup::<S>))
        .route(
            "/tracking/orders/{id}/events",
            post(routes::tracking::record_event::<S>),
        )
        .route(
            "/tracking/shipments/{id}/location",
            patch(routes::tracking::update_location::<S>),
        )
        .route(
            "/tracking/shipments/{id}/confirm-delivery",
            post(routes::tracking::confirm_delivery::<S>),
        )
        .route(
            "/tracking/shipments/{id}/failed-delivery",
            post(routes::tracking::failed_delivery::<S>),
        )
        .route("/disputes", post(routes::disputes::open::<S>))
        .route(
            "/disputes/action-items",
            get(routes::disputes::action_items::<S>),
        )
        .route("/disputes/{id}", get(routes::disputes::get::<S>))
        .route(
            "/disputes/{id}/seller-response",
            post(routes::disputes::seller_response::<S>),
        )
        .route(
            "/disputes/{id}/buyer-response",
            post(routes::disputes::buyer_response::<S>),
        )
        .route(
            "/disputes/{id}/evidence",
            post(routes::disputes::upload_evidence::<S>),
        )
        .route(
            "/disputes/{id}/escalate",
            post(routes::disputes::escalate::<S>),
        )
        .route(
            "/disputes/{id}/resolve",
            post(routes::disputes::resolve::<S>),
        )
        .with_state(state)
        .merge(metrics_router)
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
}

/// Creates the default application state over the given event store.
///
/// Callers should run [`DisputeCoordinator::rebuild_active_index`] and a
/// projection catch-up before serving traffic.
pub fn create_default_state<S: EventStore + Clone + 'static>(
    event_store: S,
) -> Arc<AppState<S>> {
    let numbers = NumberGenerator::new();
    let blobs = InMemoryBlobStore::new();

    let tracking = TrackingCoordinator::new(event_store.clone(), numbers.clone(), blobs.clone());
    let disputes = DisputeCoordinator::new(event_store.clone(), numbers, blobs);

    let dispute_queue = Arc::new(DisputeQueueView::new());
    let directory = Arc::new(TrackingDirectoryView::new());

    let mut processor = ProjectionProcessor::new(event_store.clone());
    processor.register(Box::new(dispute_queue.as_ref().clone()) as Box<dyn Projection>);
    processor.register(Box::new(directory.as_ref().clone()) as Box<dyn Projection>);
    let processor = Arc::new(processor);

    Arc::new(AppState {
        tracking,
        disputes,
        dispute_queue,
        directory,
        event_store,
        projection_processor: processor,
    })
}
