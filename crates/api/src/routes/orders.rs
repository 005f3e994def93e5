//! Order CRUD endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use catalog::{OrderUpdate, Page};
use common::{Money, OrderId, UserId};
use serde::{Deserialize, Serialize};
use store::{CommerceStore, OrderRecord};

use crate::error::ApiError;
use crate::routes::{AppState, PageQuery, parse_id};

use super::line_items::LineItemResponse;

// -- Request types --

#[derive(Deserialize)]
pub struct CreateOrderRequest {
    pub user_id: String,
}

#[derive(Deserialize)]
pub struct UpdateOrderRequest {
    pub user_id: Option<String>,
    pub total_price_cents: Option<i64>,
}

// -- Response types --

#[derive(Serialize)]
pub struct OrderResponse {
    pub id: String,
    pub user_id: String,
    pub customer_name: String,
    pub customer_email: String,
    pub total_price_cents: i64,
    pub created_at: String,
}

impl From<OrderRecord> for OrderResponse {
    fn from(record: OrderRecord) -> Self {
        Self {
            id: record.id.to_string(),
            user_id: record.user_id.to_string(),
            customer_name: record.customer_name,
            customer_email: record.customer_email,
            total_price_cents: record.total_price.cents(),
            created_at: record.created_at.to_rfc3339(),
        }
    }
}

#[derive(Serialize)]
pub struct OrderItemsResponse {
    pub order: OrderResponse,
    pub items: Vec<LineItemResponse>,
}

// -- Handlers --

/// POST /orders — create an empty order for a user.
#[tracing::instrument(skip(state, req))]
pub async fn create<S: CommerceStore + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Json(req): Json<CreateOrderRequest>,
) -> Result<(StatusCode, Json<OrderResponse>), ApiError> {
    let user_id: UserId = parse_id(&req.user_id, "user")?;
    let order = state.orders.create(user_id).await?;
    Ok((StatusCode::CREATED, Json(order.into())))
}

/// GET /orders — list orders, paginated.
#[tracing::instrument(skip(state))]
pub async fn list<S: CommerceStore + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Query(query): Query<PageQuery>,
) -> Result<Json<Page<OrderResponse>>, ApiError> {
    let page = state.orders.list(query.params()).await?;
    Ok(Json(page.map(OrderResponse::from)))
}

/// GET /orders/:id — load an order by ID.
#[tracing::instrument(skip(state))]
pub async fn get<S: CommerceStore + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<String>,
) -> Result<Json<OrderResponse>, ApiError> {
    let id: OrderId = parse_id(&id, "order")?;
    let order = state.orders.get(id).await?;
    Ok(Json(order.into()))
}

/// PATCH /orders/:id — reassign the user and/or correct the total.
#[tracing::instrument(skip(state, req))]
pub async fn update<S: CommerceStore + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<String>,
    Json(req): Json<UpdateOrderRequest>,
) -> Result<Json<OrderResponse>, ApiError> {
    let id: OrderId = parse_id(&id, "order")?;
    let user_id = req
        .user_id
        .as_deref()
        .map(|u| parse_id::<UserId>(u, "user"))
        .transpose()?;

    let order = state
        .orders
        .update(
            id,
            OrderUpdate {
                user_id,
                total_price: req.total_price_cents.map(Money::from_cents),
            },
        )
        .await?;
    Ok(Json(order.into()))
}

/// DELETE /orders/:id — remove an order.
#[tracing::instrument(skip(state))]
pub async fn delete<S: CommerceStore + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<String>,
) -> Result<Json<OrderResponse>, ApiError> {
    let id: OrderId = parse_id(&id, "order")?;
    let order = state.orders.delete(id).await?;
    Ok(Json(order.into()))
}

/// GET /orders/:id/items — load an order with its line items.
#[tracing::instrument(skip(state))]
pub async fn items<S: CommerceStore + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<String>,
) -> Result<Json<OrderItemsResponse>, ApiError> {
    let id: OrderId = parse_id(&id, "order")?;
    let (order, items) = state.orders.items(id).await?;
    Ok(Json(OrderItemsResponse {
        order: order.into(),
        items: items.into_iter().map(Into::into).collect(),
    }))
}
