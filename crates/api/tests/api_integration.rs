//! Integration tests for the API server.

use std::sync::{Arc, OnceLock};

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use event_store::InMemoryEventStore;
use metrics_exporter_prometheus::PrometheusHandle;
use tower::ServiceExt;

static METRICS_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

fn get_metrics_handle() -> PrometheusHandle {
    METRICS_HANDLE
        .get_or_init(|| {
            let builder = metrics_exporter_prometheus::PrometheusBuilder::new();
            builder
                .install_recorder()
                .expect("failed to install Prometheus recorder")
        })
        .clone()
}

fn setup() -> (
    Router,
    Arc<api::routes::AppState<InMemoryEventStore>>,
    Buyer,
    Seller,
) {
    let store = InMemoryEventStore::new();
    let state = api::create_default_state(store);
    let app = api::create_app(state.clone(), get_metrics_handle());
    (
        app,
        state,
        Buyer(uuid::Uuid::new_v4()),
        Seller(uuid::Uuid::new_v4()),
    )
}

#[derive(Clone, Copy)]
struct Buyer(uuid::Uuid);
#[derive(Clone, Copy)]
struct Seller(uuid::Uuid);

trait ActorHeaders {
    fn apply(&self, builder: axum::http::request::Builder) -> axum::http::request::Builder;
}

impl ActorHeaders for Buyer {
    fn apply(&self, builder: axum::http::request::Builder) -> axum::http::request::Builder {
        builder
            .header("x-actor-role", "buyer")
            .header("x-actor-id", self.0.to_string())
    }
}

impl ActorHeaders for Seller {
    fn apply(&self, builder: axum::http::request::Builder) -> axum::http::request::Builder {
        builder
            .header("x-actor-role", "seller")
            .header("x-actor-id", self.0.to_string())
    }
}

struct Admin;
impl ActorHeaders for Admin {
    fn apply(&self, builder: axum::http::request::Builder) -> axum::http::request::Builder {
        builder.header("x-actor-role", "admin")
    }
}

async fn send_json(
    app: &Router,
    method: &str,
    uri: &str,
    actor: Option<&dyn ActorHeaders>,
    body: Option<serde_json::Value>,
) -> (StatusCode, serde_json::Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(actor) = actor {
        builder = actor.apply(builder);
    }
    let request = match body {
        Some(json) => builder
            .header("content-type", "application/json")
            .body(Body::from(serde_json::to_string(&json).unwrap()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json = if bytes.is_empty() {
        serde_json::Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, json)
}

fn multipart_body(fields: &[(&str, &str)]) -> (String, Body) {
    let boundary = "test-boundary";
    let mut body = String::new();
    for (name, value) in fields {
        body.push_str(&format!(
            "--{boundary}\r\ncontent-disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n"
        ));
    }
    body.push_str(&format!("--{boundary}--\r\n"));
    (
        format!("multipart/form-data; boundary={boundary}"),
        Body::from(body),
    )
}

async fn send_multipart(
    app: &Router,
    uri: &str,
    actor: &dyn ActorHeaders,
    fields: &[(&str, &str)],
) -> (StatusCode, serde_json::Value) {
    let (content_type, body) = multipart_body(fields);
    let request = actor
        .apply(Request::builder().method("POST").uri(uri))
        .header("content-type", content_type)
        .body(body)
        .unwrap();

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, serde_json::from_slice(&bytes).unwrap())
}

async fn place_order(app: &Router, buyer: Buyer, seller: Seller) -> serde_json::Value {
    let (status, order) = send_json(
        app,
        "POST",
        "/orders",
        Some(&buyer),
        Some(serde_json::json!({
            "seller_id": seller.0.to_string(),
            "buyer_email": "buyer@example.com",
            "total_cents": 4200
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    order
}

#[tokio::test]
async fn health_check() {
    let (app, _, _, _) = setup();
    let (status, json) = send_json(&app, "GET", "/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["status"], "ok");
    assert_eq!(json["service"], "api");
}

#[tokio::test]
async fn place_order_returns_reference_number() {
    let (app, _, buyer, seller) = setup();
    let order = place_order(&app, buyer, seller).await;

    assert!(order["order_number"].as_str().unwrap().starts_with("ORD-"));
    assert_eq!(order["status"], "pending");
    assert_eq!(order["timeline"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn placing_an_order_requires_an_actor() {
    let (app, _, _, seller) = setup();
    let (status, _) = send_json(
        &app,
        "POST",
        "/orders",
        None,
        Some(serde_json::json!({
            "seller_id": seller.0.to_string(),
            "total_cents": 100
        })),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn tracking_event_bridges_the_order_status() {
    let (app, _, buyer, seller) = setup();
    let order = place_order(&app, buyer, seller).await;
    let order_id = order["id"].as_str().unwrap();

    let (status, shipment) = send_json(
        &app,
        "POST",
        &format!("/tracking/orders/{order_id}/events"),
        Some(&seller),
        Some(serde_json::json!({
            "status": "in_transit",
            "location": "Sorting hub",
            "description": "departed facility",
            "courier": "PostNL"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(shipment["package"]["status"], "in_transit");
    assert!(
        shipment["package"]["tracking_number"]
            .as_str()
            .unwrap()
            .starts_with("SHP-")
    );

    let (status, order) = send_json(
        &app,
        "GET",
        &format!("/orders/{order_id}"),
        Some(&buyer),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(order["status"], "shipped");
}

#[tokio::test]
async fn only_the_assigned_seller_records_tracking() {
    let (app, _, buyer, seller) = setup();
    let order = place_order(&app, buyer, seller).await;
    let order_id = order["id"].as_str().unwrap();

    let intruder = Seller(uuid::Uuid::new_v4());
    let (status, _) = send_json(
        &app,
        "POST",
        &format!("/tracking/orders/{order_id}/events"),
        Some(&intruder),
        Some(serde_json::json!({
            "status": "shipped",
            "location": "Depot",
            "description": "scan"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn guest_tracking_lookup_by_order_number() {
    let (app, _, buyer, seller) = setup();
    let order = place_order(&app, buyer, seller).await;
    let order_number = order["order_number"].as_str().unwrap();

    // Before any scan the package is synthesized from the order status.
    let (status, tracking) = send_json(
        &app,
        "GET",
        &format!("/tracking/{order_number}?email=buyer@example.com"),
        None,
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let packages = tracking["packages"].as_array().unwrap();
    assert_eq!(packages.len(), 1);
    assert_eq!(packages[0]["synthesized"], true);
    assert_eq!(packages[0]["status"], "pending");

    let (status, _) = send_json(
        &app,
        "GET",
        &format!("/tracking/{order_number}?email=wrong@example.com"),
        None,
        None,
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = send_json(&app, "GET", &format!("/tracking/{order_number}"), None, None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn tracking_lookup_by_tracking_number_shows_history() {
    let (app, _, buyer, seller) = setup();
    let order = place_order(&app, buyer, seller).await;
    let order_id = order["id"].as_str().unwrap();

    let (_, shipment) = send_json(
        &app,
        "POST",
        &format!("/tracking/orders/{order_id}/events"),
        Some(&seller),
        Some(serde_json::json!({
            "status": "out_for_delivery",
            "location": "Local depot",
            "description": "on the van"
        })),
    )
    .await;
    let tracking_number = shipment["package"]["tracking_number"].as_str().unwrap();

    let (status, tracking) = send_json(
        &app,
        "GET",
        &format!("/tracking/{tracking_number}"),
        Some(&buyer),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let packages = tracking["packages"].as_array().unwrap();
    assert_eq!(packages.len(), 1);
    assert_eq!(packages[0]["synthesized"], false);
    assert_eq!(packages[0]["history"].as_array().unwrap().len(), 1);
    assert_eq!(tracking["order"]["status"], "shipped");
}

#[tokio::test]
async fn unknown_identifier_is_not_found() {
    let (app, _, _, _) = setup();
    let (status, _) = send_json(&app, "GET", "/tracking/ORD-20260823-FFFFFF", None, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn cancel_window_closes_once_packed() {
    let (app, _, buyer, seller) = setup();
    let order = place_order(&app, buyer, seller).await;
    let order_id = order["id"].as_str().unwrap();

    send_json(
        &app,
        "POST",
        &format!("/tracking/orders/{order_id}/events"),
        Some(&seller),
        Some(serde_json::json!({
            "status": "packed",
            "location": "Warehouse",
            "description": "boxed"
        })),
    )
    .await;

    let (status, _) = send_json(
        &app,
        "POST",
        &format!("/orders/{order_id}/cancel"),
        Some(&buyer),
        Some(serde_json::json!({ "reason": "changed my mind" })),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn dispute_workflow_over_http() {
    let (app, _, buyer, seller) = setup();
    let order = place_order(&app, buyer, seller).await;
    let order_id = order["id"].as_str().unwrap().to_string();

    // Open.
    let (status, dispute) = send_multipart(
        &app,
        "/disputes",
        &buyer,
        &[
            ("order_id", order_id.as_str()),
            ("kind", "quality"),
            ("reason", "damaged on arrival"),
            ("description", "screen cracked"),
            ("priority", "high"),
        ],
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert!(dispute["dispute_number"].as_str().unwrap().starts_with("DSP-"));
    assert_eq!(dispute["status"], "new");
    assert_eq!(dispute["next_action"]["action_required"], true);
    let dispute_id = dispute["id"].as_str().unwrap().to_string();

    // A second open conflicts and names the existing dispute.
    let (status, conflict) = send_multipart(
        &app,
        "/disputes",
        &buyer,
        &[
            ("order_id", order_id.as_str()),
            ("kind", "refund"),
            ("reason", "still broken"),
            ("description", "second attempt"),
        ],
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(conflict["dispute_id"].as_str().unwrap(), dispute_id);

    // Seller responds once.
    let (status, dispute) = send_multipart(
        &app,
        &format!("/disputes/{dispute_id}/seller-response"),
        &seller,
        &[("text", "refund offered")],
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(dispute["status"], "seller_response");

    let (status, _) = send_multipart(
        &app,
        &format!("/disputes/{dispute_id}/seller-response"),
        &seller,
        &[("text", "more thoughts")],
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);

    // Buyer replies, then an admin resolves.
    let (status, dispute) = send_json(
        &app,
        "POST",
        &format!("/disputes/{dispute_id}/buyer-response"),
        Some(&buyer),
        Some(serde_json::json!({ "text": "partial refund only" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(dispute["status"], "buyer_response");

    let (status, _) = send_json(
        &app,
        "POST",
        &format!("/disputes/{dispute_id}/resolve"),
        Some(&seller),
        Some(serde_json::json!({
            "outcome": "approved",
            "resolution": "no",
            "resolved_by": "seller"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, dispute) = send_json(
        &app,
        "POST",
        &format!("/disputes/{dispute_id}/resolve"),
        Some(&Admin),
        Some(serde_json::json!({
            "outcome": "approved",
            "resolution": "refund issued",
            "resolved_by": "admin-1"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(dispute["status"], "approved");
    assert_eq!(dispute["next_action"]["message"], "Dispute closed");
}

#[tokio::test]
async fn action_items_are_admin_only() {
    let (app, _, buyer, seller) = setup();
    let order = place_order(&app, buyer, seller).await;
    let order_id = order["id"].as_str().unwrap().to_string();

    send_multipart(
        &app,
        "/disputes",
        &buyer,
        &[
            ("order_id", order_id.as_str()),
            ("kind", "delivery"),
            ("reason", "left in the rain"),
            ("description", "box soaked"),
        ],
    )
    .await;

    let (status, _) = send_json(&app, "GET", "/disputes/action-items", Some(&buyer), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = send_json(
        &app,
        "GET",
        "/disputes/action-items?window_minutes=20160",
        Some(&Admin),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["overdue"], 0);
    // The 7-day response deadline falls inside a 14-day window.
    assert_eq!(body["due_soon"], 1);
    let items = body["items"].as_array().unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0]["status"], "new");
    assert_eq!(items[0]["deadline_expired"], false);
}

#[tokio::test]
async fn invalid_id_format_is_a_bad_request() {
    let (app, _, buyer, _) = setup();
    let (status, _) = send_json(&app, "GET", "/orders/not-a-uuid", Some(&buyer), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn order_events_expose_both_timestamps() {
    let (app, _, buyer, seller) = setup();
    let order = place_order(&app, buyer, seller).await;
    let order_id = order["id"].as_str().unwrap();

    let (status, events) = send_json(
        &app,
        "GET",
        &format!("/orders/{order_id}/events"),
        Some(&buyer),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let events = events.as_array().unwrap();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0]["event_type"], "OrderPlaced");
    assert_eq!(events[0]["version"], 1);
    assert!(events[0]["occurred_at"].as_str().is_some());
    assert!(events[0]["recorded_at"].as_str().is_some());
}
