//! User CRUD endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use catalog::Page;
use common::UserId;
use serde::{Deserialize, Serialize};
use store::{CommerceStore, NewUser, UserPatch, UserRecord};

use crate::error::ApiError;
use crate::routes::{AppState, PageQuery, parse_id};

use super::orders::OrderResponse;
use super::products::ProductResponse;

// -- Request types --

#[derive(Deserialize)]
pub struct CreateUserRequest {
    pub name: String,
    pub email: String,
}

#[derive(Deserialize)]
pub struct UpdateUserRequest {
    pub name: Option<String>,
    pub email: Option<String>,
}

// -- Response types --

#[derive(Serialize)]
pub struct UserResponse {
    pub id: String,
    pub name: String,
    pub email: String,
    pub created_at: String,
}

impl From<UserRecord> for UserResponse {
    fn from(record: UserRecord) -> Self {
        Self {
            id: record.id.to_string(),
            name: record.name,
            email: record.email,
            created_at: record.created_at.to_rfc3339(),
        }
    }
}

// -- Handlers --

/// POST /users — register a new user.
#[tracing::instrument(skip(state, req))]
pub async fn create<S: CommerceStore + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Json(req): Json<CreateUserRequest>,
) -> Result<(StatusCode, Json<UserResponse>), ApiError> {
    let user = state
        .users
        .create(NewUser {
            name: req.name,
            email: req.email,
        })
        .await?;

    Ok((StatusCode::CREATED, Json(user.into())))
}

/// GET /users — list users, paginated.
#[tracing::instrument(skip(state))]
pub async fn list<S: CommerceStore + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Query(query): Query<PageQuery>,
) -> Result<Json<Page<UserResponse>>, ApiError> {
    let page = state.users.list(query.params()).await?;
    Ok(Json(page.map(UserResponse::from)))
}

/// GET /users/:id — load a user by ID.
#[tracing::instrument(skip(state))]
pub async fn get<S: CommerceStore + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<String>,
) -> Result<Json<UserResponse>, ApiError> {
    let id: UserId = parse_id(&id, "user")?;
    let user = state.users.get(id).await?;
    Ok(Json(user.into()))
}

/// PATCH /users/:id — overwrite the supplied fields.
#[tracing::instrument(skip(state, req))]
pub async fn update<S: CommerceStore + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<String>,
    Json(req): Json<UpdateUserRequest>,
) -> Result<Json<UserResponse>, ApiError> {
    let id: UserId = parse_id(&id, "user")?;
    let user = state
        .users
        .update(
            id,
            UserPatch {
                name: req.name,
                email: req.email,
            },
        )
        .await?;
    Ok(Json(user.into()))
}

/// DELETE /users/:id — remove a user.
#[tracing::instrument(skip(state))]
pub async fn delete<S: CommerceStore + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<String>,
) -> Result<Json<UserResponse>, ApiError> {
    let id: UserId = parse_id(&id, "user")?;
    let user = state.users.delete(id).await?;
    Ok(Json(user.into()))
}

/// GET /users/:id/products — list products owned by a user.
#[tracing::instrument(skip(state))]
pub async fn products<S: CommerceStore + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<String>,
) -> Result<Json<Vec<ProductResponse>>, ApiError> {
    let id: UserId = parse_id(&id, "user")?;
    let products = state.users.products(id).await?;
    Ok(Json(products.into_iter().map(Into::into).collect()))
}

/// GET /users/:id/orders — list orders placed by a user.
#[tracing::instrument(skip(state))]
pub async fn orders<S: CommerceStore + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<String>,
) -> Result<Json<Vec<OrderResponse>>, ApiError> {
    let id: UserId = parse_id(&id, "user")?;
    let orders = state.users.orders(id).await?;
    Ok(Json(orders.into_iter().map(Into::into).collect()))
}
