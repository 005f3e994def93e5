//! Integration tests for the API server.

use std::sync::OnceLock;

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use metrics_exporter_prometheus::PrometheusHandle;
use serde_json::{Value, json};
use store::MemoryStore;
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

fn setup() -> Router {
    let store = MemoryStore::new();
    let state = api::create_state(store);
    api::create_app(state, get_metrics_handle())
}

async fn send(
    app: &Router,
    method: &str,
    uri: &str,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    let body = match body {
        Some(value) => {
            builder = builder.header("content-type", "application/json");
            Body::from(serde_json::to_string(&value).unwrap())
        }
        None => Body::empty(),
    };

    let response = app
        .clone()
        .oneshot(builder.body(body).unwrap())
        .await
        .unwrap();

    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, json)
}

/// Seeds a user, category, product, and order; returns their IDs plus the
/// product's ID as strings.
async fn seed_commerce(app: &Router, stock: i64, price_cents: i64) -> (String, String, String) {
    let (status, user) = send(
        app,
        "POST",
        "/users",
        Some(json!({"name": "Ana", "email": format!("{}@example.com", uuid::Uuid::new_v4())})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let user_id = user["id"].as_str().unwrap().to_string();

    let (status, category) = send(
        app,
        "POST",
        "/categories",
        Some(json!({"name": "Gadgets"})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let category_id = category["id"].as_str().unwrap().to_string();

    let (status, product) = send(
        app,
        "POST",
        "/products",
        Some(json!({
            "name": "Widget",
            "price_cents": price_cents,
            "quantity_in_stock": stock,
            "category_id": category_id,
            "user_id": user_id,
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let product_id = product["id"].as_str().unwrap().to_string();

    let (status, order) = send(app, "POST", "/orders", Some(json!({"user_id": user_id}))).await;
    assert_eq!(status, StatusCode::CREATED);
    let order_id = order["id"].as_str().unwrap().to_string();

    (order_id, product_id, user_id)
}

#[tokio::test]
async fn test_health_check() {
    let app = setup();
    let (status, json) = send(&app, "GET", "/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["status"], "ok");
}

#[tokio::test]
async fn test_line_item_full_flow() {
    let app = setup();
    let (order_id, product_id, _) = seed_commerce(&app, 50, 1000).await;

    // Create: stock 50 -> 45, total 0 -> 5000, unit price snapshotted.
    let (status, item) = send(
        &app,
        "POST",
        "/order-items",
        Some(json!({"order_id": order_id, "product_id": product_id, "quantity": 5})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(item["unit_price_cents"], 1000);
    assert_eq!(item["subtotal_cents"], 5000);
    let item_id = item["id"].as_str().unwrap().to_string();

    let (_, product) = send(&app, "GET", &format!("/products/{product_id}"), None).await;
    assert_eq!(product["quantity_in_stock"], 45);
    let (_, order) = send(&app, "GET", &format!("/orders/{order_id}"), None).await;
    assert_eq!(order["total_price_cents"], 5000);

    // Update quantity to 8: stock 45 + 5 - 8 = 42, total 8000.
    let (status, item) = send(
        &app,
        "PATCH",
        &format!("/order-items/{item_id}"),
        Some(json!({"quantity": 8})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(item["quantity"], 8);

    let (_, product) = send(&app, "GET", &format!("/products/{product_id}"), None).await;
    assert_eq!(product["quantity_in_stock"], 42);
    let (_, order) = send(&app, "GET", &format!("/orders/{order_id}"), None).await;
    assert_eq!(order["total_price_cents"], 8000);

    // Delete: everything restored.
    let (status, _) = send(&app, "DELETE", &format!("/order-items/{item_id}"), None).await;
    assert_eq!(status, StatusCode::OK);

    let (_, product) = send(&app, "GET", &format!("/products/{product_id}"), None).await;
    assert_eq!(product["quantity_in_stock"], 50);
    let (_, order) = send(&app, "GET", &format!("/orders/{order_id}"), None).await;
    assert_eq!(order["total_price_cents"], 0);

    let (status, _) = send(&app, "GET", &format!("/order-items/{item_id}"), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_create_line_item_missing_references() {
    let app = setup();
    let (_, product_id, _) = seed_commerce(&app, 50, 1000).await;

    let (status, _) = send(
        &app,
        "POST",
        "/order-items",
        Some(json!({
            "order_id": uuid::Uuid::new_v4().to_string(),
            "product_id": product_id,
            "quantity": 1,
        })),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_create_line_item_insufficient_stock() {
    let app = setup();
    let (order_id, product_id, _) = seed_commerce(&app, 100, 1000).await;

    let (status, json) = send(
        &app,
        "POST",
        "/order-items",
        Some(json!({"order_id": order_id, "product_id": product_id, "quantity": 150})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(json["error"].as_str().unwrap().contains("Insufficient stock"));

    // Rejection left stock and total untouched.
    let (_, product) = send(&app, "GET", &format!("/products/{product_id}"), None).await;
    assert_eq!(product["quantity_in_stock"], 100);
    let (_, order) = send(&app, "GET", &format!("/orders/{order_id}"), None).await;
    assert_eq!(order["total_price_cents"], 0);
}

#[tokio::test]
async fn test_create_line_item_zero_quantity() {
    let app = setup();
    let (order_id, product_id, _) = seed_commerce(&app, 10, 1000).await;

    let (status, _) = send(
        &app,
        "POST",
        "/order-items",
        Some(json!({"order_id": order_id, "product_id": product_id, "quantity": 0})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_invalid_id_is_bad_request() {
    let app = setup();

    let (status, _) = send(&app, "GET", "/order-items/not-a-uuid", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(&app, "GET", "/users/not-a-uuid", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_move_line_item_between_products() {
    let app = setup();
    let (order_id, product_a, user_id) = seed_commerce(&app, 10, 100).await;

    // Second product in a fresh category.
    let (_, category) = send(&app, "POST", "/categories", Some(json!({"name": "Other"}))).await;
    let (status, product_b) = send(
        &app,
        "POST",
        "/products",
        Some(json!({
            "name": "Gadget",
            "price_cents": 200,
            "quantity_in_stock": 10,
            "category_id": category["id"],
            "user_id": user_id,
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let product_b = product_b["id"].as_str().unwrap().to_string();

    let (_, item) = send(
        &app,
        "POST",
        "/order-items",
        Some(json!({"order_id": order_id, "product_id": product_a, "quantity": 3})),
    )
    .await;
    let item_id = item["id"].as_str().unwrap().to_string();

    let (status, item) = send(
        &app,
        "PATCH",
        &format!("/order-items/{item_id}"),
        Some(json!({"product_id": product_b, "quantity": 4})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(item["unit_price_cents"], 200);

    let (_, a) = send(&app, "GET", &format!("/products/{product_a}"), None).await;
    assert_eq!(a["quantity_in_stock"], 10);
    let (_, b) = send(&app, "GET", &format!("/products/{product_b}"), None).await;
    assert_eq!(b["quantity_in_stock"], 6);
}

#[tokio::test]
async fn test_duplicate_user_email_rejected() {
    let app = setup();

    let (status, _) = send(
        &app,
        "POST",
        "/users",
        Some(json!({"name": "Ana", "email": "ana@example.com"})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, json) = send(
        &app,
        "POST",
        "/users",
        Some(json!({"name": "Other", "email": "ana@example.com"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(json["error"].as_str().unwrap().contains("Email"));
}

#[tokio::test]
async fn test_order_copies_customer_fields() {
    let app = setup();

    let (_, user) = send(
        &app,
        "POST",
        "/users",
        Some(json!({"name": "Ana", "email": "ana2@example.com"})),
    )
    .await;

    let (status, order) = send(
        &app,
        "POST",
        "/orders",
        Some(json!({"user_id": user["id"]})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(order["customer_name"], "Ana");
    assert_eq!(order["customer_email"], "ana2@example.com");
    assert_eq!(order["total_price_cents"], 0);
}

#[tokio::test]
async fn test_pagination_envelope() {
    let app = setup();
    for i in 0..5 {
        let (status, _) = send(
            &app,
            "POST",
            "/users",
            Some(json!({"name": "U", "email": format!("user{i}@example.com")})),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
    }

    let (status, page) = send(&app, "GET", "/users?page=2&limit=2", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(page["total"], 5);
    assert_eq!(page["result"].as_array().unwrap().len(), 2);
    assert_eq!(page["previous"]["page"], 1);
    assert_eq!(page["next"]["page"], 3);
}

#[tokio::test]
async fn test_product_search_by_category() {
    let app = setup();
    let (_, product_id, _) = seed_commerce(&app, 5, 100).await;

    let (status, products) = send(&app, "GET", "/products/search?category=Gadg", None).await;
    assert_eq!(status, StatusCode::OK);
    let products = products.as_array().unwrap();
    assert!(products.iter().any(|p| p["id"] == product_id.as_str()));

    let (status, _) = send(&app, "GET", "/products/search?category=Nonexistent", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_order_items_listing() {
    let app = setup();
    let (order_id, product_id, _) = seed_commerce(&app, 50, 1000).await;

    send(
        &app,
        "POST",
        "/order-items",
        Some(json!({"order_id": order_id, "product_id": product_id, "quantity": 2})),
    )
    .await;

    let (status, body) = send(&app, "GET", &format!("/orders/{order_id}/items"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["order"]["id"], order_id.as_str());
    assert_eq!(body["items"].as_array().unwrap().len(), 1);

    let (status, page) = send(&app, "GET", "/order-items?page=1&limit=10", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(page["total"], 1);
}

#[tokio::test]
async fn test_metrics_endpoint() {
    let app = setup();
    let response = app
        .oneshot(
            Request::builder()
                .uri("/metrics")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}
