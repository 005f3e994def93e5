//! Persistence layer for the order-fulfillment backend.
//!
//! This crate provides:
//! - record types for every persisted entity
//! - the [`TxStore`] transaction-scope abstraction
//! - the engine-facing repository traits ([`StockLedger`], [`OrderTotals`],
//!   [`LineItems`], [`CatalogLookup`])
//! - catalog CRUD traits ([`Users`], [`Categories`], [`Products`], [`Orders`])
//! - a PostgreSQL implementation and an in-memory implementation with the
//!   same interface for testing

pub mod crud;
pub mod error;
pub mod memory;
pub mod postgres;
pub mod records;
pub mod repository;
pub mod tx;

pub use crud::{Categories, Orders, Products, Users};
pub use error::{Result, StoreError};
pub use memory::MemoryStore;
pub use postgres::PostgresStore;
pub use records::{
    CategoryPatch, CategoryRecord, LineItemFields, LineItemRecord, NewCategory, NewLineItem,
    NewOrder, NewProduct, NewUser, OrderPatch, OrderRecord, ProductPatch, ProductRecord,
    UserPatch, UserRecord,
};
pub use repository::{CatalogLookup, LineItems, OrderTotals, StockLedger};
pub use tx::{CommerceStore, TxStore};
