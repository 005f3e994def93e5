use common::{CategoryId, OrderId, ProductId, UserId};
use store::StoreError;
use thiserror::Error;

/// Errors surfaced by the catalog services.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// The user does not exist.
    #[error("User not found: {0}")]
    UserNotFound(UserId),

    /// The category does not exist.
    #[error("Category not found: {0}")]
    CategoryNotFound(CategoryId),

    /// The product does not exist.
    #[error("Product not found: {0}")]
    ProductNotFound(ProductId),

    /// The order does not exist.
    #[error("Order not found: {0}")]
    OrderNotFound(OrderId),

    /// No category name contains the searched text.
    #[error("No category matching '{0}'")]
    NoCategoryMatches(String),

    /// The email address is already registered to another user.
    #[error("Email already in use: {0}")]
    EmailTaken(String),

    /// Any other store failure.
    #[error("Store error: {0}")]
    Store(StoreError),
}

impl From<StoreError> for CatalogError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::UserNotFound(id) => CatalogError::UserNotFound(id),
            StoreError::CategoryNotFound(id) => CatalogError::CategoryNotFound(id),
            StoreError::ProductNotFound(id) => CatalogError::ProductNotFound(id),
            StoreError::OrderNotFound(id) => CatalogError::OrderNotFound(id),
            StoreError::EmailTaken(email) => CatalogError::EmailTaken(email),
            other => CatalogError::Store(other),
        }
    }
}

/// Result type for catalog operations.
pub type Result<T> = std::result::Result<T, CatalogError>;
