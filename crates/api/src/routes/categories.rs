//! Category CRUD endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use catalog::Page;
use common::CategoryId;
use serde::{Deserialize, Serialize};
use store::{CategoryPatch, CategoryRecord, CommerceStore, NewCategory};

use crate::error::ApiError;
use crate::routes::{AppState, PageQuery, parse_id};

// -- Request types --

#[derive(Deserialize)]
pub struct CreateCategoryRequest {
    pub name: String,
    pub description: Option<String>,
}

#[derive(Deserialize)]
pub struct UpdateCategoryRequest {
    pub name: Option<String>,
    pub description: Option<String>,
}

// -- Response types --

#[derive(Serialize)]
pub struct CategoryResponse {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    pub created_at: String,
}

impl From<CategoryRecord> for CategoryResponse {
    fn from(record: CategoryRecord) -> Self {
        Self {
            id: record.id.to_string(),
            name: record.name,
            description: record.description,
            created_at: record.created_at.to_rfc3339(),
        }
    }
}

// -- Handlers --

/// POST /categories — create a category.
#[tracing::instrument(skip(state, req))]
pub async fn create<S: CommerceStore + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Json(req): Json<CreateCategoryRequest>,
) -> Result<(StatusCode, Json<CategoryResponse>), ApiError> {
    let category = state
        .categories
        .create(NewCategory {
            name: req.name,
            description: req.description,
        })
        .await?;

    Ok((StatusCode::CREATED, Json(category.into())))
}

/// GET /categories — list categories, paginated.
#[tracing::instrument(skip(state))]
pub async fn list<S: CommerceStore + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Query(query): Query<PageQuery>,
) -> Result<Json<Page<CategoryResponse>>, ApiError> {
    let page = state.categories.list(query.params()).await?;
    Ok(Json(page.map(CategoryResponse::from)))
}

/// GET /categories/:id — load a category by ID.
#[tracing::instrument(skip(state))]
pub async fn get<S: CommerceStore + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<String>,
) -> Result<Json<CategoryResponse>, ApiError> {
    let id: CategoryId = parse_id(&id, "category")?;
    let category = state.categories.get(id).await?;
    Ok(Json(category.into()))
}

/// PATCH /categories/:id — overwrite the supplied fields.
#[tracing::instrument(skip(state, req))]
pub async fn update<S: CommerceStore + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<String>,
    Json(req): Json<UpdateCategoryRequest>,
) -> Result<Json<CategoryResponse>, ApiError> {
    let id: CategoryId = parse_id(&id, "category")?;
    let category = state
        .categories
        .update(
            id,
            CategoryPatch {
                name: req.name,
                description: req.description,
            },
        )
        .await?;
    Ok(Json(category.into()))
}

/// DELETE /categories/:id — remove a category.
#[tracing::instrument(skip(state))]
pub async fn delete<S: CommerceStore + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<String>,
) -> Result<Json<CategoryResponse>, ApiError> {
    let id: CategoryId = parse_id(&id, "category")?;
    let category = state.categories.delete(id).await?;
    Ok(Json(category.into()))
}
