//! Transaction-scope abstraction.
//!
//! Every reconciliation-engine operation acquires one transaction scope at
//! the start and releases it (committed or rolled back) on every exit path.
//! Repository calls that must be atomic with each other borrow the same
//! scope.

use async_trait::async_trait;

use crate::crud::{Categories, Orders, Products, Users};
use crate::error::Result;
use crate::repository::{CatalogLookup, LineItems, OrderTotals, StockLedger};

/// A store that can open and settle transaction scopes.
///
/// Implementations must guarantee that all reads and writes performed
/// through one scope are serializable with respect to concurrent scopes
/// touching the same rows: the PostgreSQL store locks the product and order
/// rows it reads, and the in-memory store serializes whole transactions.
#[async_trait]
pub trait TxStore: Send + Sync {
    /// Transaction scope handle.
    type Tx: Send;

    /// Opens a new transaction scope.
    async fn begin(&self) -> Result<Self::Tx>;

    /// Commits the scope, making all its mutations visible atomically.
    async fn commit(&self, tx: Self::Tx) -> Result<()>;

    /// Discards every mutation performed through the scope.
    async fn rollback(&self, tx: Self::Tx) -> Result<()>;
}

/// The full store surface the application wires together: transaction
/// scopes, the engine-facing repositories, and catalog CRUD.
pub trait CommerceStore:
    TxStore + StockLedger + OrderTotals + LineItems + CatalogLookup + Users + Categories + Products + Orders
{
}

impl<T> CommerceStore for T where
    T: TxStore
        + StockLedger
        + OrderTotals
        + LineItems
        + CatalogLookup
        + Users
        + Categories
        + Products
        + Orders
{
}
