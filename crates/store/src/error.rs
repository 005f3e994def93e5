use common::{CategoryId, LineItemId, OrderId, ProductId, UserId};
use thiserror::Error;

/// Errors that can occur when interacting with the backing store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The user was not found.
    #[error("User not found: {0}")]
    UserNotFound(UserId),

    /// The category was not found.
    #[error("Category not found: {0}")]
    CategoryNotFound(CategoryId),

    /// The product was not found.
    #[error("Product not found: {0}")]
    ProductNotFound(ProductId),

    /// The order was not found.
    #[error("Order not found: {0}")]
    OrderNotFound(OrderId),

    /// The line item was not found.
    #[error("Line item not found: {0}")]
    LineItemNotFound(LineItemId),

    /// A stock reservation exceeded the available quantity.
    #[error(
        "Insufficient stock for product {product_id}: requested {requested}, available {available}"
    )]
    InsufficientStock {
        product_id: ProductId,
        requested: u32,
        available: i64,
    },

    /// The email address is already registered to another user.
    #[error("Email already in use: {0}")]
    EmailTaken(String),

    /// The transaction could not be serialized against a concurrent one.
    /// Recoverable by retrying the whole operation.
    #[error("Transaction conflict")]
    Conflict,

    /// A database error occurred.
    #[error("Database error: {0}")]
    Database(sqlx::Error),

    /// A database migration error occurred.
    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),
}

impl StoreError {
    /// Returns true when the error is a retryable serialization conflict.
    pub fn is_conflict(&self) -> bool {
        matches!(self, StoreError::Conflict)
    }
}

impl From<sqlx::Error> for StoreError {
    fn from(e: sqlx::Error) -> Self {
        // SQLSTATE 40001 = serialization_failure, 40P01 = deadlock_detected.
        if let sqlx::Error::Database(db_err) = &e
            && matches!(db_err.code().as_deref(), Some("40001") | Some("40P01"))
        {
            return StoreError::Conflict;
        }
        StoreError::Database(e)
    }
}

/// Result type for store operations.
pub type Result<T> = std::result::Result<T, StoreError>;
