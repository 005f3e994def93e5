//! Catalog CRUD traits.
//!
//! Field-level passthrough persistence for users, categories, products, and
//! orders. Each method is a single statement against the pool; none of
//! these carry cross-entity invariants, so they do not take a transaction
//! scope. Update methods return `None` when the record does not exist.

use async_trait::async_trait;
use common::{CategoryId, OrderId, ProductId, UserId};

use crate::error::Result;
use crate::records::{
    CategoryPatch, CategoryRecord, NewCategory, NewOrder, NewProduct, NewUser, OrderPatch,
    OrderRecord, ProductPatch, ProductRecord, UserPatch, UserRecord,
};

/// User persistence.
#[async_trait]
pub trait Users: Send + Sync {
    /// Inserts a user. Fails with
    /// [`StoreError::EmailTaken`](crate::StoreError) when the email is
    /// already registered.
    async fn insert_user(&self, user: NewUser) -> Result<UserRecord>;

    async fn fetch_user(&self, id: UserId) -> Result<Option<UserRecord>>;

    async fn fetch_user_by_email(&self, email: &str) -> Result<Option<UserRecord>>;

    async fn list_users(&self, limit: i64, offset: i64) -> Result<Vec<UserRecord>>;

    async fn count_users(&self) -> Result<i64>;

    async fn update_user(&self, id: UserId, patch: UserPatch) -> Result<Option<UserRecord>>;

    /// Removes the user, returning the pre-delete snapshot.
    async fn remove_user(&self, id: UserId) -> Result<Option<UserRecord>>;
}

/// Category persistence.
#[async_trait]
pub trait Categories: Send + Sync {
    async fn insert_category(&self, category: NewCategory) -> Result<CategoryRecord>;

    async fn fetch_category(&self, id: CategoryId) -> Result<Option<CategoryRecord>>;

    /// Finds the first category whose name contains `needle`.
    async fn fetch_category_by_name(&self, needle: &str) -> Result<Option<CategoryRecord>>;

    async fn list_categories(&self, limit: i64, offset: i64) -> Result<Vec<CategoryRecord>>;

    async fn count_categories(&self) -> Result<i64>;

    async fn update_category(
        &self,
        id: CategoryId,
        patch: CategoryPatch,
    ) -> Result<Option<CategoryRecord>>;

    async fn remove_category(&self, id: CategoryId) -> Result<Option<CategoryRecord>>;
}

/// Product persistence.
#[async_trait]
pub trait Products: Send + Sync {
    async fn insert_product(&self, product: NewProduct) -> Result<ProductRecord>;

    async fn fetch_product(&self, id: ProductId) -> Result<Option<ProductRecord>>;

    async fn list_products(&self, limit: i64, offset: i64) -> Result<Vec<ProductRecord>>;

    async fn count_products(&self) -> Result<i64>;

    async fn list_products_by_user(&self, user_id: UserId) -> Result<Vec<ProductRecord>>;

    async fn list_products_by_category(&self, category_id: CategoryId)
    -> Result<Vec<ProductRecord>>;

    async fn update_product(
        &self,
        id: ProductId,
        patch: ProductPatch,
    ) -> Result<Option<ProductRecord>>;

    async fn remove_product(&self, id: ProductId) -> Result<Option<ProductRecord>>;
}

/// Order persistence.
#[async_trait]
pub trait Orders: Send + Sync {
    async fn insert_order(&self, order: NewOrder) -> Result<OrderRecord>;

    async fn fetch_order(&self, id: OrderId) -> Result<Option<OrderRecord>>;

    async fn list_orders(&self, limit: i64, offset: i64) -> Result<Vec<OrderRecord>>;

    async fn count_orders(&self) -> Result<i64>;

    async fn list_orders_by_user(&self, user_id: UserId) -> Result<Vec<OrderRecord>>;

    async fn update_order(&self, id: OrderId, patch: OrderPatch) -> Result<Option<OrderRecord>>;

    async fn remove_order(&self, id: OrderId) -> Result<Option<OrderRecord>>;
}
