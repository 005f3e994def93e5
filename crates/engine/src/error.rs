use common::{LineItemId, OrderId, ProductId};
use store::StoreError;
use thiserror::Error;

/// Errors surfaced by the reconciliation engine.
///
/// Every failure leaves all three aggregates untouched: the transaction is
/// rolled back before the error reaches the caller.
#[derive(Debug, Error)]
pub enum EngineError {
    /// The referenced order does not exist.
    #[error("Order not found: {0}")]
    OrderNotFound(OrderId),

    /// The referenced product does not exist.
    #[error("Product not found: {0}")]
    ProductNotFound(ProductId),

    /// The referenced line item does not exist.
    #[error("Line item not found: {0}")]
    LineItemNotFound(LineItemId),

    /// The requested quantity exceeds the available stock at validation
    /// time.
    #[error(
        "Insufficient stock for product {product_id}: requested {requested}, available {available}"
    )]
    InsufficientStock {
        product_id: ProductId,
        requested: u32,
        available: i64,
    },

    /// The caller supplied a quantity of zero.
    #[error("Invalid quantity: {quantity} (must be greater than 0)")]
    InvalidQuantity { quantity: u32 },

    /// The backing store could not serialize the operation against a
    /// concurrent conflicting one, and the retry budget is exhausted.
    #[error("Transaction conflict, operation was not applied")]
    Conflict,

    /// Any other store failure.
    #[error("Store error: {0}")]
    Store(StoreError),
}

impl From<StoreError> for EngineError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::OrderNotFound(id) => EngineError::OrderNotFound(id),
            StoreError::ProductNotFound(id) => EngineError::ProductNotFound(id),
            StoreError::LineItemNotFound(id) => EngineError::LineItemNotFound(id),
            StoreError::InsufficientStock {
                product_id,
                requested,
                available,
            } => EngineError::InsufficientStock {
                product_id,
                requested,
                available,
            },
            StoreError::Conflict => EngineError::Conflict,
            other => EngineError::Store(other),
        }
    }
}

/// Result type for engine operations.
pub type Result<T> = std::result::Result<T, EngineError>;
