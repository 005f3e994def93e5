//! In-memory store implementation for testing.
//!
//! Provides the same interface as the PostgreSQL implementation. A
//! transaction scope holds the whole-state mutex from `begin` until
//! `commit`/`rollback`, so concurrent transactions are trivially
//! serialized; rollback restores a snapshot taken at `begin`.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use common::{CategoryId, LineItemId, Money, OrderId, ProductId, UserId};
use tokio::sync::{Mutex, OwnedMutexGuard};

use crate::crud::{Categories, Orders, Products, Users};
use crate::error::{Result, StoreError};
use crate::records::{
    CategoryPatch, CategoryRecord, LineItemFields, LineItemRecord, NewCategory, NewLineItem,
    NewOrder, NewProduct, NewUser, OrderPatch, OrderRecord, ProductPatch, ProductRecord,
    UserPatch, UserRecord,
};
use crate::repository::{CatalogLookup, LineItems, OrderTotals, StockLedger};
use crate::tx::TxStore;

#[derive(Debug, Clone, Default)]
struct MemoryState {
    users: HashMap<UserId, UserRecord>,
    categories: HashMap<CategoryId, CategoryRecord>,
    products: HashMap<ProductId, ProductRecord>,
    orders: HashMap<OrderId, OrderRecord>,
    line_items: HashMap<LineItemId, LineItemRecord>,
}

/// In-memory store.
#[derive(Clone, Default)]
pub struct MemoryStore {
    state: Arc<Mutex<MemoryState>>,
}

/// An open in-memory transaction: exclusive access to the state plus the
/// snapshot that rollback restores.
pub struct MemoryTx {
    guard: OwnedMutexGuard<MemoryState>,
    snapshot: MemoryState,
}

impl MemoryStore {
    /// Creates a new empty in-memory store.
    pub fn new() -> Self {
        Self::default()
    }
}

fn sorted_by_age<T, K>(records: impl Iterator<Item = T>, key: impl Fn(&T) -> K) -> Vec<T>
where
    K: Ord,
{
    let mut out: Vec<T> = records.collect();
    out.sort_by_key(key);
    out
}

#[async_trait]
impl TxStore for MemoryStore {
    type Tx = MemoryTx;

    async fn begin(&self) -> Result<Self::Tx> {
        let guard = Arc::clone(&self.state).lock_owned().await;
        let snapshot = guard.clone();
        Ok(MemoryTx { guard, snapshot })
    }

    async fn commit(&self, tx: Self::Tx) -> Result<()> {
        // Mutations were applied in place; releasing the guard publishes
        // them.
        drop(tx);
        Ok(())
    }

    async fn rollback(&self, mut tx: Self::Tx) -> Result<()> {
        *tx.guard = tx.snapshot;
        Ok(())
    }
}

#[async_trait]
impl StockLedger for MemoryStore {
    async fn reserve(
        &self,
        tx: &mut Self::Tx,
        product_id: ProductId,
        quantity: u32,
    ) -> Result<i64> {
        let product = tx
            .guard
            .products
            .get_mut(&product_id)
            .ok_or(StoreError::ProductNotFound(product_id))?;

        if i64::from(quantity) > product.quantity_in_stock {
            return Err(StoreError::InsufficientStock {
                product_id,
                requested: quantity,
                available: product.quantity_in_stock,
            });
        }

        product.quantity_in_stock -= i64::from(quantity);
        Ok(product.quantity_in_stock)
    }

    async fn release(
        &self,
        tx: &mut Self::Tx,
        product_id: ProductId,
        quantity: u32,
    ) -> Result<i64> {
        let product = tx
            .guard
            .products
            .get_mut(&product_id)
            .ok_or(StoreError::ProductNotFound(product_id))?;

        product.quantity_in_stock += i64::from(quantity);
        Ok(product.quantity_in_stock)
    }
}

#[async_trait]
impl OrderTotals for MemoryStore {
    async fn adjust(&self, tx: &mut Self::Tx, order_id: OrderId, delta: Money) -> Result<()> {
        let order = tx
            .guard
            .orders
            .get_mut(&order_id)
            .ok_or(StoreError::OrderNotFound(order_id))?;

        order.total_price += delta;
        Ok(())
    }
}

#[async_trait]
impl LineItems for MemoryStore {
    async fn insert(&self, tx: &mut Self::Tx, item: NewLineItem) -> Result<LineItemRecord> {
        let record = LineItemRecord {
            id: LineItemId::new(),
            order_id: item.order_id,
            product_id: item.product_id,
            quantity: item.quantity,
            unit_price: item.unit_price,
            created_at: Utc::now(),
        };
        tx.guard.line_items.insert(record.id, record.clone());
        Ok(record)
    }

    async fn fetch(&self, tx: &mut Self::Tx, id: LineItemId) -> Result<Option<LineItemRecord>> {
        Ok(tx.guard.line_items.get(&id).cloned())
    }

    async fn replace(
        &self,
        tx: &mut Self::Tx,
        id: LineItemId,
        fields: LineItemFields,
    ) -> Result<LineItemRecord> {
        let record = tx
            .guard
            .line_items
            .get_mut(&id)
            .ok_or(StoreError::LineItemNotFound(id))?;

        record.order_id = fields.order_id;
        record.product_id = fields.product_id;
        record.quantity = fields.quantity;
        record.unit_price = fields.unit_price;
        Ok(record.clone())
    }

    async fn remove(&self, tx: &mut Self::Tx, id: LineItemId) -> Result<Option<LineItemRecord>> {
        Ok(tx.guard.line_items.remove(&id))
    }

    async fn find(&self, id: LineItemId) -> Result<Option<LineItemRecord>> {
        let state = self.state.lock().await;
        Ok(state.line_items.get(&id).cloned())
    }

    async fn list(&self, limit: i64, offset: i64) -> Result<Vec<LineItemRecord>> {
        let state = self.state.lock().await;
        let all = sorted_by_age(state.line_items.values().cloned(), |r| {
            (r.created_at, r.id.as_uuid())
        });
        Ok(all
            .into_iter()
            .skip(offset.max(0) as usize)
            .take(limit.max(0) as usize)
            .collect())
    }

    async fn count(&self) -> Result<i64> {
        let state = self.state.lock().await;
        Ok(state.line_items.len() as i64)
    }

    async fn list_by_order(&self, order_id: OrderId) -> Result<Vec<LineItemRecord>> {
        let state = self.state.lock().await;
        Ok(sorted_by_age(
            state
                .line_items
                .values()
                .filter(|r| r.order_id == order_id)
                .cloned(),
            |r| (r.created_at, r.id.as_uuid()),
        ))
    }
}

#[async_trait]
impl CatalogLookup for MemoryStore {
    async fn lookup_order(&self, tx: &mut Self::Tx, id: OrderId) -> Result<Option<OrderRecord>> {
        Ok(tx.guard.orders.get(&id).cloned())
    }

    async fn lookup_product(
        &self,
        tx: &mut Self::Tx,
        id: ProductId,
    ) -> Result<Option<ProductRecord>> {
        Ok(tx.guard.products.get(&id).cloned())
    }
}

#[async_trait]
impl Users for MemoryStore {
    async fn insert_user(&self, user: NewUser) -> Result<UserRecord> {
        let mut state = self.state.lock().await;

        if state.users.values().any(|u| u.email == user.email) {
            return Err(StoreError::EmailTaken(user.email));
        }

        let record = UserRecord {
            id: UserId::new(),
            name: user.name,
            email: user.email,
            created_at: Utc::now(),
        };
        state.users.insert(record.id, record.clone());
        Ok(record)
    }

    async fn fetch_user(&self, id: UserId) -> Result<Option<UserRecord>> {
        let state = self.state.lock().await;
        Ok(state.users.get(&id).cloned())
    }

    async fn fetch_user_by_email(&self, email: &str) -> Result<Option<UserRecord>> {
        let state = self.state.lock().await;
        Ok(state.users.values().find(|u| u.email == email).cloned())
    }

    async fn list_users(&self, limit: i64, offset: i64) -> Result<Vec<UserRecord>> {
        let state = self.state.lock().await;
        let all = sorted_by_age(state.users.values().cloned(), |r| {
            (r.created_at, r.id.as_uuid())
        });
        Ok(all
            .into_iter()
            .skip(offset.max(0) as usize)
            .take(limit.max(0) as usize)
            .collect())
    }

    async fn count_users(&self) -> Result<i64> {
        let state = self.state.lock().await;
        Ok(state.users.len() as i64)
    }

    async fn update_user(&self, id: UserId, patch: UserPatch) -> Result<Option<UserRecord>> {
        let mut state = self.state.lock().await;

        if let Some(email) = &patch.email
            && state
                .users
                .values()
                .any(|u| u.id != id && &u.email == email)
        {
            return Err(StoreError::EmailTaken(email.clone()));
        }

        let Some(record) = state.users.get_mut(&id) else {
            return Ok(None);
        };
        if let Some(name) = patch.name {
            record.name = name;
        }
        if let Some(email) = patch.email {
            record.email = email;
        }
        Ok(Some(record.clone()))
    }

    async fn remove_user(&self, id: UserId) -> Result<Option<UserRecord>> {
        let mut state = self.state.lock().await;
        Ok(state.users.remove(&id))
    }
}

#[async_trait]
impl Categories for MemoryStore {
    async fn insert_category(&self, category: NewCategory) -> Result<CategoryRecord> {
        let mut state = self.state.lock().await;
        let record = CategoryRecord {
            id: CategoryId::new(),
            name: category.name,
            description: category.description,
            created_at: Utc::now(),
        };
        state.categories.insert(record.id, record.clone());
        Ok(record)
    }

    async fn fetch_category(&self, id: CategoryId) -> Result<Option<CategoryRecord>> {
        let state = self.state.lock().await;
        Ok(state.categories.get(&id).cloned())
    }

    async fn fetch_category_by_name(&self, needle: &str) -> Result<Option<CategoryRecord>> {
        let state = self.state.lock().await;
        let matches = sorted_by_age(
            state
                .categories
                .values()
                .filter(|c| c.name.contains(needle))
                .cloned(),
            |r| (r.created_at, r.id.as_uuid()),
        );
        Ok(matches.into_iter().next())
    }

    async fn list_categories(&self, limit: i64, offset: i64) -> Result<Vec<CategoryRecord>> {
        let state = self.state.lock().await;
        let all = sorted_by_age(state.categories.values().cloned(), |r| {
            (r.created_at, r.id.as_uuid())
        });
        Ok(all
            .into_iter()
            .skip(offset.max(0) as usize)
            .take(limit.max(0) as usize)
            .collect())
    }

    async fn count_categories(&self) -> Result<i64> {
        let state = self.state.lock().await;
        Ok(state.categories.len() as i64)
    }

    async fn update_category(
        &self,
        id: CategoryId,
        patch: CategoryPatch,
    ) -> Result<Option<CategoryRecord>> {
        let mut state = self.state.lock().await;
        let Some(record) = state.categories.get_mut(&id) else {
            return Ok(None);
        };
        if let Some(name) = patch.name {
            record.name = name;
        }
        if let Some(description) = patch.description {
            record.description = Some(description);
        }
        Ok(Some(record.clone()))
    }

    async fn remove_category(&self, id: CategoryId) -> Result<Option<CategoryRecord>> {
        let mut state = self.state.lock().await;
        Ok(state.categories.remove(&id))
    }
}

#[async_trait]
impl Products for MemoryStore {
    async fn insert_product(&self, product: NewProduct) -> Result<ProductRecord> {
        let mut state = self.state.lock().await;
        let record = ProductRecord {
            id: ProductId::new(),
            name: product.name,
            description: product.description,
            price: product.price,
            quantity_in_stock: product.quantity_in_stock,
            category_id: product.category_id,
            user_id: product.user_id,
            created_at: Utc::now(),
        };
        state.products.insert(record.id, record.clone());
        Ok(record)
    }

    async fn fetch_product(&self, id: ProductId) -> Result<Option<ProductRecord>> {
        let state = self.state.lock().await;
        Ok(state.products.get(&id).cloned())
    }

    async fn list_products(&self, limit: i64, offset: i64) -> Result<Vec<ProductRecord>> {
        let state = self.state.lock().await;
        let all = sorted_by_age(state.products.values().cloned(), |r| {
            (r.created_at, r.id.as_uuid())
        });
        Ok(all
            .into_iter()
            .skip(offset.max(0) as usize)
            .take(limit.max(0) as usize)
            .collect())
    }

    async fn count_products(&self) -> Result<i64> {
        let state = self.state.lock().await;
        Ok(state.products.len() as i64)
    }

    async fn list_products_by_user(&self, user_id: UserId) -> Result<Vec<ProductRecord>> {
        let state = self.state.lock().await;
        Ok(sorted_by_age(
            state
                .products
                .values()
                .filter(|p| p.user_id == user_id)
                .cloned(),
            |r| (r.created_at, r.id.as_uuid()),
        ))
    }

    async fn list_products_by_category(
        &self,
        category_id: CategoryId,
    ) -> Result<Vec<ProductRecord>> {
        let state = self.state.lock().await;
        Ok(sorted_by_age(
            state
                .products
                .values()
                .filter(|p| p.category_id == category_id)
                .cloned(),
            |r| (r.created_at, r.id.as_uuid()),
        ))
    }

    async fn update_product(
        &self,
        id: ProductId,
        patch: ProductPatch,
    ) -> Result<Option<ProductRecord>> {
        let mut state = self.state.lock().await;
        let Some(record) = state.products.get_mut(&id) else {
            return Ok(None);
        };
        if let Some(name) = patch.name {
            record.name = name;
        }
        if let Some(description) = patch.description {
            record.description = Some(description);
        }
        if let Some(price) = patch.price {
            record.price = price;
        }
        if let Some(quantity_in_stock) = patch.quantity_in_stock {
            record.quantity_in_stock = quantity_in_stock;
        }
        if let Some(category_id) = patch.category_id {
            record.category_id = category_id;
        }
        Ok(Some(record.clone()))
    }

    async fn remove_product(&self, id: ProductId) -> Result<Option<ProductRecord>> {
        let mut state = self.state.lock().await;
        Ok(state.products.remove(&id))
    }
}

#[async_trait]
impl Orders for MemoryStore {
    async fn insert_order(&self, order: NewOrder) -> Result<OrderRecord> {
        let mut state = self.state.lock().await;
        let record = OrderRecord {
            id: OrderId::new(),
            user_id: order.user_id,
            customer_name: order.customer_name,
            customer_email: order.customer_email,
            total_price: Money::zero(),
            created_at: Utc::now(),
        };
        state.orders.insert(record.id, record.clone());
        Ok(record)
    }

    async fn fetch_order(&self, id: OrderId) -> Result<Option<OrderRecord>> {
        let state = self.state.lock().await;
        Ok(state.orders.get(&id).cloned())
    }

    async fn list_orders(&self, limit: i64, offset: i64) -> Result<Vec<OrderRecord>> {
        let state = self.state.lock().await;
        let all = sorted_by_age(state.orders.values().cloned(), |r| {
            (r.created_at, r.id.as_uuid())
        });
        Ok(all
            .into_iter()
            .skip(offset.max(0) as usize)
            .take(limit.max(0) as usize)
            .collect())
    }

    async fn count_orders(&self) -> Result<i64> {
        let state = self.state.lock().await;
        Ok(state.orders.len() as i64)
    }

    async fn list_orders_by_user(&self, user_id: UserId) -> Result<Vec<OrderRecord>> {
        let state = self.state.lock().await;
        Ok(sorted_by_age(
            state
                .orders
                .values()
                .filter(|o| o.user_id == user_id)
                .cloned(),
            |r| (r.created_at, r.id.as_uuid()),
        ))
    }

    async fn update_order(&self, id: OrderId, patch: OrderPatch) -> Result<Option<OrderRecord>> {
        let mut state = self.state.lock().await;
        let Some(record) = state.orders.get_mut(&id) else {
            return Ok(None);
        };
        if let Some(user_id) = patch.user_id {
            record.user_id = user_id;
        }
        if let Some(customer_name) = patch.customer_name {
            record.customer_name = customer_name;
        }
        if let Some(customer_email) = patch.customer_email {
            record.customer_email = customer_email;
        }
        if let Some(total_price) = patch.total_price {
            record.total_price = total_price;
        }
        Ok(Some(record.clone()))
    }

    async fn remove_order(&self, id: OrderId) -> Result<Option<OrderRecord>> {
        let mut state = self.state.lock().await;
        Ok(state.orders.remove(&id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn seed_product(store: &MemoryStore, stock: i64, price_cents: i64) -> ProductRecord {
        let user = store
            .insert_user(NewUser {
                name: "Ana".to_string(),
                email: format!("{}@example.com", UserId::new()),
            })
            .await
            .unwrap();
        let category = store
            .insert_category(NewCategory {
                name: "Tools".to_string(),
                description: None,
            })
            .await
            .unwrap();
        store
            .insert_product(NewProduct {
                name: "Widget".to_string(),
                description: None,
                price: Money::from_cents(price_cents),
                quantity_in_stock: stock,
                category_id: category.id,
                user_id: user.id,
            })
            .await
            .unwrap()
    }

    async fn seed_order(store: &MemoryStore) -> OrderRecord {
        let user = store
            .insert_user(NewUser {
                name: "Bo".to_string(),
                email: format!("{}@example.com", UserId::new()),
            })
            .await
            .unwrap();
        store
            .insert_order(NewOrder {
                user_id: user.id,
                customer_name: user.name.clone(),
                customer_email: user.email.clone(),
            })
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn reserve_decrements_and_returns_new_stock() {
        let store = MemoryStore::new();
        let product = seed_product(&store, 10, 100).await;

        let mut tx = store.begin().await.unwrap();
        let new_stock = store.reserve(&mut tx, product.id, 4).await.unwrap();
        store.commit(tx).await.unwrap();

        assert_eq!(new_stock, 6);
        let stored = store.fetch_product(product.id).await.unwrap().unwrap();
        assert_eq!(stored.quantity_in_stock, 6);
    }

    #[tokio::test]
    async fn reserve_rejects_insufficient_stock() {
        let store = MemoryStore::new();
        let product = seed_product(&store, 3, 100).await;

        let mut tx = store.begin().await.unwrap();
        let result = store.reserve(&mut tx, product.id, 4).await;
        store.rollback(tx).await.unwrap();

        assert!(matches!(
            result,
            Err(StoreError::InsufficientStock {
                requested: 4,
                available: 3,
                ..
            })
        ));
        let stored = store.fetch_product(product.id).await.unwrap().unwrap();
        assert_eq!(stored.quantity_in_stock, 3);
    }

    #[tokio::test]
    async fn release_increments_unconditionally() {
        let store = MemoryStore::new();
        let product = seed_product(&store, 5, 100).await;

        let mut tx = store.begin().await.unwrap();
        let new_stock = store.release(&mut tx, product.id, 7).await.unwrap();
        store.commit(tx).await.unwrap();

        assert_eq!(new_stock, 12);
    }

    #[tokio::test]
    async fn rollback_restores_all_mutations() {
        let store = MemoryStore::new();
        let product = seed_product(&store, 10, 250).await;
        let order = seed_order(&store).await;

        let mut tx = store.begin().await.unwrap();
        store.reserve(&mut tx, product.id, 5).await.unwrap();
        store
            .adjust(&mut tx, order.id, Money::from_cents(1250))
            .await
            .unwrap();
        store
            .insert(
                &mut tx,
                NewLineItem {
                    order_id: order.id,
                    product_id: product.id,
                    quantity: 5,
                    unit_price: Money::from_cents(250),
                },
            )
            .await
            .unwrap();
        store.rollback(tx).await.unwrap();

        let stored_product = store.fetch_product(product.id).await.unwrap().unwrap();
        let stored_order = store.fetch_order(order.id).await.unwrap().unwrap();
        assert_eq!(stored_product.quantity_in_stock, 10);
        assert_eq!(stored_order.total_price, Money::zero());
        assert_eq!(store.count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn adjust_applies_signed_deltas() {
        let store = MemoryStore::new();
        let order = seed_order(&store).await;

        let mut tx = store.begin().await.unwrap();
        store
            .adjust(&mut tx, order.id, Money::from_cents(1000))
            .await
            .unwrap();
        store
            .adjust(&mut tx, order.id, Money::from_cents(-400))
            .await
            .unwrap();
        store.commit(tx).await.unwrap();

        let stored = store.fetch_order(order.id).await.unwrap().unwrap();
        assert_eq!(stored.total_price, Money::from_cents(600));
    }

    #[tokio::test]
    async fn duplicate_email_rejected() {
        let store = MemoryStore::new();
        store
            .insert_user(NewUser {
                name: "Ana".to_string(),
                email: "ana@example.com".to_string(),
            })
            .await
            .unwrap();

        let result = store
            .insert_user(NewUser {
                name: "Other".to_string(),
                email: "ana@example.com".to_string(),
            })
            .await;

        assert!(matches!(result, Err(StoreError::EmailTaken(_))));
        assert_eq!(store.count_users().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn remove_returns_pre_delete_snapshot() {
        let store = MemoryStore::new();
        let product = seed_product(&store, 10, 100).await;
        let order = seed_order(&store).await;

        let mut tx = store.begin().await.unwrap();
        let item = store
            .insert(
                &mut tx,
                NewLineItem {
                    order_id: order.id,
                    product_id: product.id,
                    quantity: 2,
                    unit_price: Money::from_cents(100),
                },
            )
            .await
            .unwrap();
        let removed = store.remove(&mut tx, item.id).await.unwrap().unwrap();
        store.commit(tx).await.unwrap();

        assert_eq!(removed, item);
        assert_eq!(store.count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn category_search_matches_substring() {
        let store = MemoryStore::new();
        store
            .insert_category(NewCategory {
                name: "Kitchen Tools".to_string(),
                description: None,
            })
            .await
            .unwrap();

        let found = store.fetch_category_by_name("Tool").await.unwrap();
        assert!(found.is_some());
        let missing = store.fetch_category_by_name("Garden").await.unwrap();
        assert!(missing.is_none());
    }
}
