//! Line-item endpoints.
//!
//! All writes go through the reconciliation engine so that stock, order
//! totals, and the line item itself change atomically. Reads go straight
//! to the store.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use catalog::Page;
use common::{LineItemId, Money, OrderId, ProductId};
use engine::LineItemPatch;
use serde::{Deserialize, Serialize};
use store::{CommerceStore, LineItemRecord, LineItems};

use crate::error::ApiError;
use crate::routes::{AppState, PageQuery, parse_id};

// -- Request types --

#[derive(Deserialize)]
pub struct CreateLineItemRequest {
    pub order_id: String,
    pub product_id: String,
    pub quantity: u32,
}

#[derive(Deserialize)]
pub struct UpdateLineItemRequest {
    pub order_id: Option<String>,
    pub product_id: Option<String>,
    pub quantity: Option<u32>,
    pub unit_price_cents: Option<i64>,
}

// -- Response types --

#[derive(Serialize)]
pub struct LineItemResponse {
    pub id: String,
    pub order_id: String,
    pub product_id: String,
    pub quantity: u32,
    pub unit_price_cents: i64,
    pub subtotal_cents: i64,
    pub created_at: String,
}

impl From<LineItemRecord> for LineItemResponse {
    fn from(record: LineItemRecord) -> Self {
        Self {
            id: record.id.to_string(),
            order_id: record.order_id.to_string(),
            product_id: record.product_id.to_string(),
            quantity: record.quantity,
            unit_price_cents: record.unit_price.cents(),
            subtotal_cents: record.subtotal().cents(),
            created_at: record.created_at.to_rfc3339(),
        }
    }
}

// -- Handlers --

/// POST /order-items — create a line item, reserving stock and adding the
/// subtotal to the order.
#[tracing::instrument(skip(state, req))]
pub async fn create<S: CommerceStore + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Json(req): Json<CreateLineItemRequest>,
) -> Result<(StatusCode, Json<LineItemResponse>), ApiError> {
    let order_id: OrderId = parse_id(&req.order_id, "order")?;
    let product_id: ProductId = parse_id(&req.product_id, "product")?;

    let item = state
        .engine
        .create_line_item(order_id, product_id, req.quantity)
        .await?;

    Ok((StatusCode::CREATED, Json(item.into())))
}

/// GET /order-items — list line items, paginated.
#[tracing::instrument(skip(state))]
pub async fn list<S: CommerceStore + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Query(query): Query<PageQuery>,
) -> Result<Json<Page<LineItemResponse>>, ApiError> {
    let params = query.params();
    let result = state
        .store
        .list(params.limit, params.offset())
        .await
        .map_err(|e| ApiError::Internal(e.to_string()))?;
    let total = state
        .store
        .count()
        .await
        .map_err(|e| ApiError::Internal(e.to_string()))?;

    Ok(Json(
        Page::assemble(result, total, params).map(LineItemResponse::from),
    ))
}

/// GET /order-items/:id — load a line item by ID.
#[tracing::instrument(skip(state))]
pub async fn get<S: CommerceStore + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<String>,
) -> Result<Json<LineItemResponse>, ApiError> {
    let id: LineItemId = parse_id(&id, "line item")?;
    let item = state
        .store
        .find(id)
        .await
        .map_err(|e| ApiError::Internal(e.to_string()))?
        .ok_or_else(|| ApiError::NotFound(format!("Line item not found: {id}")))?;

    Ok(Json(item.into()))
}

/// PATCH /order-items/:id — rewrite fields, atomically moving the stock
/// reservation and order-total contribution when the product and/or order
/// change.
#[tracing::instrument(skip(state, req))]
pub async fn update<S: CommerceStore + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<String>,
    Json(req): Json<UpdateLineItemRequest>,
) -> Result<Json<LineItemResponse>, ApiError> {
    let id: LineItemId = parse_id(&id, "line item")?;
    let order_id = req
        .order_id
        .as_deref()
        .map(|o| parse_id::<OrderId>(o, "order"))
        .transpose()?;
    let product_id = req
        .product_id
        .as_deref()
        .map(|p| parse_id::<ProductId>(p, "product"))
        .transpose()?;

    if req.unit_price_cents.is_some_and(|p| p < 0) {
        return Err(ApiError::BadRequest(
            "unit price must not be negative".into(),
        ));
    }

    let item = state
        .engine
        .update_line_item(
            id,
            LineItemPatch {
                order_id,
                product_id,
                quantity: req.quantity,
                unit_price: req.unit_price_cents.map(Money::from_cents),
            },
        )
        .await?;

    Ok(Json(item.into()))
}

/// DELETE /order-items/:id — delete a line item, releasing its stock and
/// removing its subtotal from the order.
#[tracing::instrument(skip(state))]
pub async fn delete<S: CommerceStore + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<String>,
) -> Result<Json<LineItemResponse>, ApiError> {
    let id: LineItemId = parse_id(&id, "line item")?;
    let item = state.engine.delete_line_item(id).await?;
    Ok(Json(item.into()))
}
