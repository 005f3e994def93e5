//! Engine-facing repository traits.
//!
//! These four interfaces are the only writers of `quantity_in_stock` and
//! `total_price` on the line-item path. They all execute inside a caller's
//! transaction scope so one engine operation can touch up to three records
//! across two aggregates atomically.

use async_trait::async_trait;
use common::{LineItemId, Money, OrderId, ProductId};

use crate::error::Result;
use crate::records::{LineItemFields, LineItemRecord, NewLineItem, OrderRecord, ProductRecord};
use crate::tx::TxStore;

/// Owns each product's available stock quantity.
#[async_trait]
pub trait StockLedger: TxStore {
    /// Decrements the product's stock by `quantity` after a sufficiency
    /// check, returning the new stock level.
    ///
    /// Fails with [`StoreError::InsufficientStock`](crate::StoreError) when
    /// `quantity` exceeds the currently available stock.
    async fn reserve(&self, tx: &mut Self::Tx, product_id: ProductId, quantity: u32)
    -> Result<i64>;

    /// Increments the product's stock by `quantity` unconditionally,
    /// returning the new stock level. Only used to undo a prior
    /// reservation.
    async fn release(&self, tx: &mut Self::Tx, product_id: ProductId, quantity: u32)
    -> Result<i64>;
}

/// Owns each order's running total price.
#[async_trait]
pub trait OrderTotals: TxStore {
    /// Adds `delta` (positive or negative) to the order's total price.
    async fn adjust(&self, tx: &mut Self::Tx, order_id: OrderId, delta: Money) -> Result<()>;
}

/// Owns line-item records.
#[async_trait]
pub trait LineItems: TxStore {
    /// Creates a line item inside the transaction scope.
    async fn insert(&self, tx: &mut Self::Tx, item: NewLineItem) -> Result<LineItemRecord>;

    /// Point lookup inside the transaction scope.
    async fn fetch(&self, tx: &mut Self::Tx, id: LineItemId) -> Result<Option<LineItemRecord>>;

    /// Overwrites the mutable fields, leaving identity and creation time
    /// untouched.
    async fn replace(
        &self,
        tx: &mut Self::Tx,
        id: LineItemId,
        fields: LineItemFields,
    ) -> Result<LineItemRecord>;

    /// Removes the record, returning the pre-delete snapshot (the engine
    /// needs it to compute reversal deltas).
    async fn remove(&self, tx: &mut Self::Tx, id: LineItemId) -> Result<Option<LineItemRecord>>;

    /// Point lookup outside any transaction, for read endpoints.
    async fn find(&self, id: LineItemId) -> Result<Option<LineItemRecord>>;

    /// Lists line items for paginated reads, newest last.
    async fn list(&self, limit: i64, offset: i64) -> Result<Vec<LineItemRecord>>;

    /// Returns the total number of line items.
    async fn count(&self) -> Result<i64>;

    /// Lists the line items referencing one order.
    async fn list_by_order(&self, order_id: OrderId) -> Result<Vec<LineItemRecord>>;
}

/// Resolves order and product references for the engine.
///
/// Reads happen inside the engine's transaction; the PostgreSQL
/// implementation locks the returned row (`SELECT ... FOR UPDATE`) so the
/// restore-then-validate-then-reserve sequence is serialized per product
/// and per order.
#[async_trait]
pub trait CatalogLookup: TxStore {
    /// Resolves an order, or `None` when it does not exist.
    async fn lookup_order(&self, tx: &mut Self::Tx, id: OrderId) -> Result<Option<OrderRecord>>;

    /// Resolves a product, or `None` when it does not exist.
    async fn lookup_product(
        &self,
        tx: &mut Self::Tx,
        id: ProductId,
    ) -> Result<Option<ProductRecord>>;
}
