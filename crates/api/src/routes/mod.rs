//! Route handlers.

pub mod categories;
pub mod health;
pub mod line_items;
pub mod metrics;
pub mod orders;
pub mod products;
pub mod users;

use catalog::{CategoryService, OrderService, PageParams, ProductService, UserService};
use engine::ReconciliationEngine;
use serde::Deserialize;
use store::CommerceStore;
use uuid::Uuid;

use crate::error::ApiError;

/// Shared application state accessible from all handlers.
pub struct AppState<S: CommerceStore> {
    pub users: UserService<S>,
    pub categories: CategoryService<S>,
    pub products: ProductService<S>,
    pub orders: OrderService<S>,
    pub engine: ReconciliationEngine<S>,
    pub store: S,
}

/// `?page=&limit=` query parameters shared by the list endpoints.
#[derive(Debug, Default, Deserialize)]
pub struct PageQuery {
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

impl PageQuery {
    pub fn params(&self) -> PageParams {
        PageParams::new(self.page, self.limit)
    }
}

/// Parses a path segment into a typed UUID identifier.
pub(crate) fn parse_id<T: From<Uuid>>(id: &str, entity: &str) -> Result<T, ApiError> {
    let uuid = Uuid::parse_str(id)
        .map_err(|e| ApiError::BadRequest(format!("Invalid {entity} ID: {e}")))?;
    Ok(T::from(uuid))
}
