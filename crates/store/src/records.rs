//! Record types for the persisted entities.
//!
//! `*Record` structs mirror table rows. `New*` structs carry the fields a
//! caller supplies on insert; identity and timestamps are assigned by the
//! store. `*Patch` structs name the fields to overwrite on update, leaving
//! `None` fields untouched.

use chrono::{DateTime, Utc};
use common::{CategoryId, LineItemId, Money, OrderId, ProductId, UserId};
use serde::{Deserialize, Serialize};

/// A registered user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserRecord {
    pub id: UserId,
    pub name: String,
    /// Unique across all users.
    pub email: String,
    pub created_at: DateTime<Utc>,
}

/// Fields for creating a user.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub name: String,
    pub email: String,
}

/// Fields to overwrite on a user.
#[derive(Debug, Clone, Default)]
pub struct UserPatch {
    pub name: Option<String>,
    pub email: Option<String>,
}

/// A product category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryRecord {
    pub id: CategoryId,
    pub name: String,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Fields for creating a category.
#[derive(Debug, Clone)]
pub struct NewCategory {
    pub name: String,
    pub description: Option<String>,
}

/// Fields to overwrite on a category.
#[derive(Debug, Clone, Default)]
pub struct CategoryPatch {
    pub name: Option<String>,
    pub description: Option<String>,
}

/// A catalog product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductRecord {
    pub id: ProductId,
    pub name: String,
    pub description: Option<String>,
    /// Current catalog unit price. Line items snapshot this at
    /// creation/move time rather than joining against it.
    pub price: Money,
    /// Available stock. Never negative.
    pub quantity_in_stock: i64,
    pub category_id: CategoryId,
    pub user_id: UserId,
    pub created_at: DateTime<Utc>,
}

/// Fields for creating a product.
#[derive(Debug, Clone)]
pub struct NewProduct {
    pub name: String,
    pub description: Option<String>,
    pub price: Money,
    pub quantity_in_stock: i64,
    pub category_id: CategoryId,
    pub user_id: UserId,
}

/// Fields to overwrite on a product.
///
/// Administrative stock/price corrections go through here, outside the
/// reconciliation engine's authority.
#[derive(Debug, Clone, Default)]
pub struct ProductPatch {
    pub name: Option<String>,
    pub description: Option<String>,
    pub price: Option<Money>,
    pub quantity_in_stock: Option<i64>,
    pub category_id: Option<CategoryId>,
}

/// A customer order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderRecord {
    pub id: OrderId,
    pub user_id: UserId,
    /// Copied from the owning user at create/update time.
    pub customer_name: String,
    /// Copied from the owning user at create/update time.
    pub customer_email: String,
    /// Running total. Equals the sum of `quantity * unit_price` over the
    /// order's line items after every committed engine operation.
    pub total_price: Money,
    pub created_at: DateTime<Utc>,
}

/// Fields for creating an order.
#[derive(Debug, Clone)]
pub struct NewOrder {
    pub user_id: UserId,
    pub customer_name: String,
    pub customer_email: String,
}

/// Fields to overwrite on an order.
#[derive(Debug, Clone, Default)]
pub struct OrderPatch {
    pub user_id: Option<UserId>,
    pub customer_name: Option<String>,
    pub customer_email: Option<String>,
    pub total_price: Option<Money>,
}

/// A line item linking one order to one product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineItemRecord {
    pub id: LineItemId,
    pub order_id: OrderId,
    pub product_id: ProductId,
    /// Always greater than zero.
    pub quantity: u32,
    /// Snapshot of the product's price at creation/move time.
    pub unit_price: Money,
    pub created_at: DateTime<Utc>,
}

impl LineItemRecord {
    /// Returns `quantity * unit_price`.
    pub fn subtotal(&self) -> Money {
        self.unit_price.multiply(self.quantity)
    }
}

/// Fields for creating a line item.
#[derive(Debug, Clone)]
pub struct NewLineItem {
    pub order_id: OrderId,
    pub product_id: ProductId,
    pub quantity: u32,
    pub unit_price: Money,
}

/// The full set of mutable line-item fields, written as one overwrite by
/// the engine's update/move operation.
#[derive(Debug, Clone, Copy)]
pub struct LineItemFields {
    pub order_id: OrderId,
    pub product_id: ProductId,
    pub quantity: u32,
    pub unit_price: Money,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn line_item_subtotal() {
        let item = LineItemRecord {
            id: LineItemId::new(),
            order_id: OrderId::new(),
            product_id: ProductId::new(),
            quantity: 3,
            unit_price: Money::from_cents(1050),
            created_at: Utc::now(),
        };
        assert_eq!(item.subtotal(), Money::from_cents(3150));
    }

    #[test]
    fn record_serialization_roundtrip() {
        let record = ProductRecord {
            id: ProductId::new(),
            name: "Widget".to_string(),
            description: None,
            price: Money::from_cents(999),
            quantity_in_stock: 10,
            category_id: CategoryId::new(),
            user_id: UserId::new(),
            created_at: Utc::now(),
        };
        let json = serde_json::to_string(&record).unwrap();
        let back: ProductRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(back, record);
    }
}
