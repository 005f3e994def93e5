//! Product CRUD and search endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use catalog::Page;
use common::{CategoryId, Money, ProductId, UserId};
use serde::{Deserialize, Serialize};
use store::{CommerceStore, NewProduct, ProductPatch, ProductRecord};

use crate::error::ApiError;
use crate::routes::{AppState, PageQuery, parse_id};

// -- Request types --

#[derive(Deserialize)]
pub struct CreateProductRequest {
    pub name: String,
    pub description: Option<String>,
    pub price_cents: i64,
    pub quantity_in_stock: i64,
    pub category_id: String,
    pub user_id: String,
}

#[derive(Deserialize)]
pub struct UpdateProductRequest {
    pub name: Option<String>,
    pub description: Option<String>,
    pub price_cents: Option<i64>,
    pub quantity_in_stock: Option<i64>,
    pub category_id: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    pub category: String,
}

// -- Response types --

#[derive(Serialize)]
pub struct ProductResponse {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    pub price_cents: i64,
    pub quantity_in_stock: i64,
    pub category_id: String,
    pub user_id: String,
    pub created_at: String,
}

impl From<ProductRecord> for ProductResponse {
    fn from(record: ProductRecord) -> Self {
        Self {
            id: record.id.to_string(),
            name: record.name,
            description: record.description,
            price_cents: record.price.cents(),
            quantity_in_stock: record.quantity_in_stock,
            category_id: record.category_id.to_string(),
            user_id: record.user_id.to_string(),
            created_at: record.created_at.to_rfc3339(),
        }
    }
}

// -- Handlers --

/// POST /products — create a product.
#[tracing::instrument(skip(state, req))]
pub async fn create<S: CommerceStore + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Json(req): Json<CreateProductRequest>,
) -> Result<(StatusCode, Json<ProductResponse>), ApiError> {
    if req.price_cents < 0 {
        return Err(ApiError::BadRequest("price must not be negative".into()));
    }
    if req.quantity_in_stock < 0 {
        return Err(ApiError::BadRequest("stock must not be negative".into()));
    }

    let category_id: CategoryId = parse_id(&req.category_id, "category")?;
    let user_id: UserId = parse_id(&req.user_id, "user")?;

    let product = state
        .products
        .create(NewProduct {
            name: req.name,
            description: req.description,
            price: Money::from_cents(req.price_cents),
            quantity_in_stock: req.quantity_in_stock,
            category_id,
            user_id,
        })
        .await?;

    Ok((StatusCode::CREATED, Json(product.into())))
}

/// GET /products — list products, paginated.
#[tracing::instrument(skip(state))]
pub async fn list<S: CommerceStore + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Query(query): Query<PageQuery>,
) -> Result<Json<Page<ProductResponse>>, ApiError> {
    let page = state.products.list(query.params()).await?;
    Ok(Json(page.map(ProductResponse::from)))
}

/// GET /products/search?category= — list products by category name.
#[tracing::instrument(skip(state))]
pub async fn search<S: CommerceStore + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Query(query): Query<SearchQuery>,
) -> Result<Json<Vec<ProductResponse>>, ApiError> {
    let products = state.products.search_by_category(&query.category).await?;
    Ok(Json(products.into_iter().map(Into::into).collect()))
}

/// GET /products/:id — load a product by ID.
#[tracing::instrument(skip(state))]
pub async fn get<S: CommerceStore + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<String>,
) -> Result<Json<ProductResponse>, ApiError> {
    let id: ProductId = parse_id(&id, "product")?;
    let product = state.products.get(id).await?;
    Ok(Json(product.into()))
}

/// PATCH /products/:id — overwrite the supplied fields.
///
/// Stock and price edits here are administrative corrections outside the
/// reconciliation engine's authority.
#[tracing::instrument(skip(state, req))]
pub async fn update<S: CommerceStore + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<String>,
    Json(req): Json<UpdateProductRequest>,
) -> Result<Json<ProductResponse>, ApiError> {
    let id: ProductId = parse_id(&id, "product")?;

    if req.price_cents.is_some_and(|p| p < 0) {
        return Err(ApiError::BadRequest("price must not be negative".into()));
    }
    if req.quantity_in_stock.is_some_and(|q| q < 0) {
        return Err(ApiError::BadRequest("stock must not be negative".into()));
    }

    let category_id = req
        .category_id
        .as_deref()
        .map(|c| parse_id::<CategoryId>(c, "category"))
        .transpose()?;

    let product = state
        .products
        .update(
            id,
            ProductPatch {
                name: req.name,
                description: req.description,
                price: req.price_cents.map(Money::from_cents),
                quantity_in_stock: req.quantity_in_stock,
                category_id,
            },
        )
        .await?;
    Ok(Json(product.into()))
}

/// DELETE /products/:id — remove a product.
#[tracing::instrument(skip(state))]
pub async fn delete<S: CommerceStore + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<String>,
) -> Result<Json<ProductResponse>, ApiError> {
    let id: ProductId = parse_id(&id, "product")?;
    let product = state.products.delete(id).await?;
    Ok(Json(product.into()))
}
