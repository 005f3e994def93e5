//! API error types with HTTP response mapping.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use catalog::CatalogError;
use engine::EngineError;

/// API-level error type that maps to HTTP responses.
#[derive(Debug)]
pub enum ApiError {
    /// Resource not found.
    NotFound(String),
    /// Bad request from the client.
    BadRequest(String),
    /// Reconciliation engine error.
    Engine(EngineError),
    /// Catalog service error.
    Catalog(CatalogError),
    /// Internal server error.
    Internal(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::Engine(err) => engine_error_to_response(err),
            ApiError::Catalog(err) => catalog_error_to_response(err),
            ApiError::Internal(msg) => {
                tracing::error!(error = %msg, "internal server error");
                (StatusCode::INTERNAL_SERVER_ERROR, msg)
            }
        };

        let body = serde_json::json!({ "error": message });
        (status, axum::Json(body)).into_response()
    }
}

fn engine_error_to_response(err: EngineError) -> (StatusCode, String) {
    match &err {
        EngineError::OrderNotFound(_)
        | EngineError::ProductNotFound(_)
        | EngineError::LineItemNotFound(_) => (StatusCode::NOT_FOUND, err.to_string()),
        EngineError::InsufficientStock { .. } | EngineError::InvalidQuantity { .. } => {
            (StatusCode::BAD_REQUEST, err.to_string())
        }
        EngineError::Conflict => (StatusCode::CONFLICT, err.to_string()),
        EngineError::Store(_) => {
            tracing::error!(error = %err, "store failure in engine operation");
            (StatusCode::INTERNAL_SERVER_ERROR, err.to_string())
        }
    }
}

fn catalog_error_to_response(err: CatalogError) -> (StatusCode, String) {
    match &err {
        CatalogError::UserNotFound(_)
        | CatalogError::CategoryNotFound(_)
        | CatalogError::ProductNotFound(_)
        | CatalogError::OrderNotFound(_)
        | CatalogError::NoCategoryMatches(_) => (StatusCode::NOT_FOUND, err.to_string()),
        CatalogError::EmailTaken(_) => (StatusCode::BAD_REQUEST, err.to_string()),
        CatalogError::Store(_) => {
            tracing::error!(error = %err, "store failure in catalog operation");
            (StatusCode::INTERNAL_SERVER_ERROR, err.to_string())
        }
    }
}

impl From<EngineError> for ApiError {
    fn from(err: EngineError) -> Self {
        ApiError::Engine(err)
    }
}

impl From<CatalogError> for ApiError {
    fn from(err: CatalogError) -> Self {
        ApiError::Catalog(err)
    }
}
