//! HTTP API server with observability for the order-fulfillment backend.
//!
//! Provides REST endpoints for the catalog entities (users, categories,
//! products), orders, and order line items, with structured logging
//! (tracing) and Prometheus metrics. Line-item writes go exclusively
//! through the reconciliation engine.

pub mod config;
pub mod error;
pub mod routes;

use std::sync::Arc;

use axum::Router;
use axum::routing::get;
use catalog::{CategoryService, OrderService, ProductService, UserService};
use engine::ReconciliationEngine;
use metrics_exporter_prometheus::PrometheusHandle;
use store::CommerceStore;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use routes::AppState;

/// Creates the Axum application router with all routes and shared state.
pub fn create_app<S: CommerceStore + Clone + 'static>(
    state: Arc<AppState<S>>,
    metrics_handle: PrometheusHandle,
) -> Router {
    let metrics_router = Router::new()
        .route("/metrics", get(routes::metrics::get))
        .with_state(metrics_handle);

    Router::new()
        .route("/health", get(routes::health::check))
        .route(
            "/users",
            axum::routing::post(routes::users::create::<S>).get(routes::users::list::<S>),
        )
        .route(
            "/users/{id}",
            get(routes::users::get::<S>)
                .patch(routes::users::update::<S>)
                .delete(routes::users::delete::<S>),
        )
        .route("/users/{id}/products", get(routes::users::products::<S>))
        .route("/users/{id}/orders", get(routes::users::orders::<S>))
        .route(
            "/categories",
            axum::routing::post(routes::categories::create::<S>)
                .get(routes::categories::list::<S>),
        )
        .route(
            "/categories/{id}",
            get(routes::categories::get::<S>)
                .patch(routes::categories::update::<S>)
                .delete(routes::categories::delete::<S>),
        )
        .route(
            "/products",
            axum::routing::post(routes::products::create::<S>).get(routes::products::list::<S>),
        )
        .route("/products/search", get(routes::products::search::<S>))
        .route(
            "/products/{id}",
            get(routes::products::get::<S>)
                .patch(routes::products::update::<S>)
                .delete(routes::products::delete::<S>),
        )
        .route(
            "/orders",
            axum::routing::post(routes::orders::create::<S>).get(routes::orders::list::<S>),
        )
        .route(
            "/orders/{id}",
            get(routes::orders::get::<S>)
                .patch(routes::orders::update::<S>)
                .delete(routes::orders::delete::<S>),
        )
        .route("/orders/{id}/items", get(routes::orders::items::<S>))
        .route(
            "/order-items",
            axum::routing::post(routes::line_items::create::<S>)
                .get(routes::line_items::list::<S>),
        )
        .route(
            "/order-items/{id}",
            get(routes::line_items::get::<S>)
                .patch(routes::line_items::update::<S>)
                .delete(routes::line_items::delete::<S>),
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

/// Creates the application state: one service per entity and the
/// reconciliation engine, all sharing the same store.
pub fn create_state<S: CommerceStore + Clone + 'static>(store: S) -> Arc<AppState<S>> {
    Arc::new(AppState {
        users: UserService::new(store.clone()),
        categories: CategoryService::new(store.clone()),
        products: ProductService::new(store.clone()),
        orders: OrderService::new(store.clone()),
        engine: ReconciliationEngine::new(store.clone()),
        store,
    })
}
