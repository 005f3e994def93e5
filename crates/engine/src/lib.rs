//! Line-item reconciliation engine.
//!
//! A single logical line-item operation touches up to three records across
//! two aggregate roots: the product's available stock, the order's running
//! total, and the line item itself. This crate orchestrates those writes
//! under one transaction scope so that every operation either commits all
//! of them or none.

pub mod error;
mod reconcile;

pub use error::{EngineError, Result};
pub use reconcile::{DEFAULT_MAX_ATTEMPTS, LineItemPatch, ReconciliationEngine};
