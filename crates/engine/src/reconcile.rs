//! The reconciliation operations: create, update/move, delete.

use common::{LineItemId, Money, OrderId, ProductId};
use store::{
    CatalogLookup, LineItemFields, LineItemRecord, LineItems, NewLineItem, OrderTotals,
    StockLedger,
};

use crate::error::{EngineError, Result};

/// Default number of attempts before a serialization conflict is surfaced
/// to the caller.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;

/// Fields of a line item that an update may rewrite.
///
/// `None` keeps the current value. Supplying a different `product_id`
/// and no `unit_price` re-snapshots the price from the new product.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LineItemPatch {
    pub order_id: Option<OrderId>,
    pub product_id: Option<ProductId>,
    pub quantity: Option<u32>,
    pub unit_price: Option<Money>,
}

/// Orchestrates the stock ledger, the order total accumulator, and the
/// line item store under one transaction scope per operation.
///
/// The engine holds no in-process locks; serialization of concurrent
/// operations against the same product or order is delegated to the
/// store's transaction discipline. Operations that fail with a store
/// conflict are retried a bounded number of times before
/// [`EngineError::Conflict`] is returned.
pub struct ReconciliationEngine<S> {
    store: S,
    max_attempts: u32,
}

impl<S> ReconciliationEngine<S>
where
    S: StockLedger + OrderTotals + LineItems + CatalogLookup,
{
    /// Creates an engine with the default retry budget.
    pub fn new(store: S) -> Self {
        Self::with_max_attempts(store, DEFAULT_MAX_ATTEMPTS)
    }

    /// Creates an engine with an explicit retry budget (at least one
    /// attempt).
    pub fn with_max_attempts(store: S, max_attempts: u32) -> Self {
        Self {
            store,
            max_attempts: max_attempts.max(1),
        }
    }

    /// Creates a line item for `order_id` against `product_id`, reserving
    /// `quantity` units of stock and adding the subtotal to the order's
    /// running total. The unit price is snapshotted from the product's
    /// current catalog price.
    #[tracing::instrument(skip(self))]
    pub async fn create_line_item(
        &self,
        order_id: OrderId,
        product_id: ProductId,
        quantity: u32,
    ) -> Result<LineItemRecord> {
        if quantity == 0 {
            return Err(EngineError::InvalidQuantity { quantity });
        }

        let started = std::time::Instant::now();
        let mut attempt = 1;
        let result = loop {
            match self.create_once(order_id, product_id, quantity).await {
                Err(EngineError::Conflict) if attempt < self.max_attempts => {
                    metrics::counter!("reconcile_conflict_retries_total").increment(1);
                    tracing::warn!(attempt, "transaction conflict on create, retrying");
                    attempt += 1;
                }
                outcome => break outcome,
            }
        };
        metrics::histogram!("reconcile_duration_seconds")
            .record(started.elapsed().as_secs_f64());
        if result.is_ok() {
            metrics::counter!("line_items_created_total").increment(1);
        }
        result
    }

    /// Applies `patch` to an existing line item, atomically moving its
    /// stock reservation and order-total contribution when the product
    /// and/or order change.
    #[tracing::instrument(skip(self))]
    pub async fn update_line_item(
        &self,
        id: LineItemId,
        patch: LineItemPatch,
    ) -> Result<LineItemRecord> {
        if patch.quantity == Some(0) {
            return Err(EngineError::InvalidQuantity { quantity: 0 });
        }

        let started = std::time::Instant::now();
        let mut attempt = 1;
        let result = loop {
            match self.update_once(id, patch).await {
                Err(EngineError::Conflict) if attempt < self.max_attempts => {
                    metrics::counter!("reconcile_conflict_retries_total").increment(1);
                    tracing::warn!(attempt, "transaction conflict on update, retrying");
                    attempt += 1;
                }
                outcome => break outcome,
            }
        };
        metrics::histogram!("reconcile_duration_seconds")
            .record(started.elapsed().as_secs_f64());
        if result.is_ok() {
            metrics::counter!("line_items_updated_total").increment(1);
        }
        result
    }

    /// Deletes a line item, releasing its stock reservation and removing
    /// its subtotal from the order. Returns the deleted snapshot.
    #[tracing::instrument(skip(self))]
    pub async fn delete_line_item(&self, id: LineItemId) -> Result<LineItemRecord> {
        let started = std::time::Instant::now();
        let mut attempt = 1;
        let result = loop {
            match self.delete_once(id).await {
                Err(EngineError::Conflict) if attempt < self.max_attempts => {
                    metrics::counter!("reconcile_conflict_retries_total").increment(1);
                    tracing::warn!(attempt, "transaction conflict on delete, retrying");
                    attempt += 1;
                }
                outcome => break outcome,
            }
        };
        metrics::histogram!("reconcile_duration_seconds")
            .record(started.elapsed().as_secs_f64());
        if result.is_ok() {
            metrics::counter!("line_items_deleted_total").increment(1);
        }
        result
    }

    async fn create_once(
        &self,
        order_id: OrderId,
        product_id: ProductId,
        quantity: u32,
    ) -> Result<LineItemRecord> {
        let mut tx = self.store.begin().await?;
        match self.create_in_tx(&mut tx, order_id, product_id, quantity).await {
            Ok(item) => {
                self.store.commit(tx).await?;
                Ok(item)
            }
            Err(err) => {
                if let Err(rollback_err) = self.store.rollback(tx).await {
                    tracing::warn!(error = %rollback_err, "rollback failed");
                }
                Err(err)
            }
        }
    }

    async fn update_once(&self, id: LineItemId, patch: LineItemPatch) -> Result<LineItemRecord> {
        let mut tx = self.store.begin().await?;
        match self.update_in_tx(&mut tx, id, patch).await {
            Ok(item) => {
                self.store.commit(tx).await?;
                Ok(item)
            }
            Err(err) => {
                if let Err(rollback_err) = self.store.rollback(tx).await {
                    tracing::warn!(error = %rollback_err, "rollback failed");
                }
                Err(err)
            }
        }
    }

    async fn delete_once(&self, id: LineItemId) -> Result<LineItemRecord> {
        let mut tx = self.store.begin().await?;
        match self.delete_in_tx(&mut tx, id).await {
            Ok(item) => {
                self.store.commit(tx).await?;
                Ok(item)
            }
            Err(err) => {
                if let Err(rollback_err) = self.store.rollback(tx).await {
                    tracing::warn!(error = %rollback_err, "rollback failed");
                }
                Err(err)
            }
        }
    }

    async fn create_in_tx(
        &self,
        tx: &mut S::Tx,
        order_id: OrderId,
        product_id: ProductId,
        quantity: u32,
    ) -> Result<LineItemRecord> {
        let order = self
            .store
            .lookup_order(tx, order_id)
            .await?
            .ok_or(EngineError::OrderNotFound(order_id))?;
        let product = self
            .store
            .lookup_product(tx, product_id)
            .await?
            .ok_or(EngineError::ProductNotFound(product_id))?;

        if i64::from(quantity) > product.quantity_in_stock {
            return Err(EngineError::InsufficientStock {
                product_id,
                requested: quantity,
                available: product.quantity_in_stock,
            });
        }

        // Snapshot, not a live join: later catalog price changes must not
        // affect this line item.
        let unit_price = product.price;

        self.store.reserve(tx, product_id, quantity).await?;
        let item = self
            .store
            .insert(
                tx,
                NewLineItem {
                    order_id: order.id,
                    product_id: product.id,
                    quantity,
                    unit_price,
                },
            )
            .await?;
        self.store
            .adjust(tx, order.id, unit_price.multiply(quantity))
            .await?;

        Ok(item)
    }

    async fn update_in_tx(
        &self,
        tx: &mut S::Tx,
        id: LineItemId,
        patch: LineItemPatch,
    ) -> Result<LineItemRecord> {
        let old = self
            .store
            .fetch(tx, id)
            .await?
            .ok_or(EngineError::LineItemNotFound(id))?;

        let new_product_id = patch.product_id.unwrap_or(old.product_id);
        let new_order_id = patch.order_id.unwrap_or(old.order_id);
        let new_quantity = patch.quantity.unwrap_or(old.quantity);

        // Moving to a different product requires resolving it (also takes
        // the row lock that serializes the stock validation below).
        let new_product = if new_product_id != old.product_id {
            Some(
                self.store
                    .lookup_product(tx, new_product_id)
                    .await?
                    .ok_or(EngineError::ProductNotFound(new_product_id))?,
            )
        } else {
            None
        };

        let new_unit_price = match (patch.unit_price, &new_product) {
            (Some(price), _) => price,
            (None, Some(product)) => product.price,
            (None, None) => old.unit_price,
        };

        if new_order_id != old.order_id {
            self.store
                .lookup_order(tx, new_order_id)
                .await?
                .ok_or(EngineError::OrderNotFound(new_order_id))?;
        }

        // Restore the original reservation first so the item's own prior
        // claim counts as available when validating the new quantity.
        let restored = self.store.release(tx, old.product_id, old.quantity).await?;
        let available = match &new_product {
            Some(product) => product.quantity_in_stock,
            None => restored,
        };
        if i64::from(new_quantity) > available {
            return Err(EngineError::InsufficientStock {
                product_id: new_product_id,
                requested: new_quantity,
                available,
            });
        }
        self.store.reserve(tx, new_product_id, new_quantity).await?;

        let old_subtotal = old.subtotal();
        let new_subtotal = new_unit_price.multiply(new_quantity);
        if new_order_id != old.order_id {
            self.store.adjust(tx, old.order_id, -old_subtotal).await?;
            self.store.adjust(tx, new_order_id, new_subtotal).await?;
        } else {
            self.store
                .adjust(tx, old.order_id, new_subtotal - old_subtotal)
                .await?;
        }

        let updated = self
            .store
            .replace(
                tx,
                id,
                LineItemFields {
                    order_id: new_order_id,
                    product_id: new_product_id,
                    quantity: new_quantity,
                    unit_price: new_unit_price,
                },
            )
            .await?;

        Ok(updated)
    }

    async fn delete_in_tx(&self, tx: &mut S::Tx, id: LineItemId) -> Result<LineItemRecord> {
        let old = self
            .store
            .fetch(tx, id)
            .await?
            .ok_or(EngineError::LineItemNotFound(id))?;

        self.store.release(tx, old.product_id, old.quantity).await?;
        self.store.adjust(tx, old.order_id, -old.subtotal()).await?;
        let snapshot = self
            .store
            .remove(tx, id)
            .await?
            .ok_or(EngineError::LineItemNotFound(id))?;

        Ok(snapshot)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use store::{MemoryStore, NewCategory, NewOrder, NewProduct, NewUser, Orders, Products};
    use store::{Categories, Users};

    async fn seed(store: &MemoryStore, stock: i64, price_cents: i64) -> (OrderId, ProductId) {
        let user = store
            .insert_user(NewUser {
                name: "Ana".to_string(),
                email: format!("{}@example.com", common::UserId::new()),
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
        let product = store
            .insert_product(NewProduct {
                name: "Widget".to_string(),
                description: None,
                price: Money::from_cents(price_cents),
                quantity_in_stock: stock,
                category_id: category.id,
                user_id: user.id,
            })
            .await
            .unwrap();
        let order = store
            .insert_order(NewOrder {
                user_id: user.id,
                customer_name: user.name.clone(),
                customer_email: user.email.clone(),
            })
            .await
            .unwrap();
        (order.id, product.id)
    }

    #[tokio::test]
    async fn create_snapshots_price_and_reserves_stock() {
        let store = MemoryStore::new();
        let (order_id, product_id) = seed(&store, 50, 1000).await;
        let engine = ReconciliationEngine::new(store.clone());

        let item = engine
            .create_line_item(order_id, product_id, 5)
            .await
            .unwrap();

        assert_eq!(item.unit_price, Money::from_cents(1000));
        assert_eq!(item.quantity, 5);

        let product = store.fetch_product(product_id).await.unwrap().unwrap();
        let order = store.fetch_order(order_id).await.unwrap().unwrap();
        assert_eq!(product.quantity_in_stock, 45);
        assert_eq!(order.total_price, Money::from_cents(5000));
    }

    #[tokio::test]
    async fn create_rejects_zero_quantity_without_touching_store() {
        let store = MemoryStore::new();
        let (order_id, product_id) = seed(&store, 50, 1000).await;
        let engine = ReconciliationEngine::new(store.clone());

        let result = engine.create_line_item(order_id, product_id, 0).await;
        assert!(matches!(
            result,
            Err(EngineError::InvalidQuantity { quantity: 0 })
        ));
    }

    #[tokio::test]
    async fn create_fails_for_missing_order() {
        let store = MemoryStore::new();
        let (_, product_id) = seed(&store, 50, 1000).await;
        let engine = ReconciliationEngine::new(store.clone());

        let missing = OrderId::new();
        let result = engine.create_line_item(missing, product_id, 1).await;
        assert!(matches!(result, Err(EngineError::OrderNotFound(id)) if id == missing));
    }

    #[tokio::test]
    async fn create_fails_for_missing_product() {
        let store = MemoryStore::new();
        let (order_id, _) = seed(&store, 50, 1000).await;
        let engine = ReconciliationEngine::new(store.clone());

        let missing = ProductId::new();
        let result = engine.create_line_item(order_id, missing, 1).await;
        assert!(matches!(result, Err(EngineError::ProductNotFound(id)) if id == missing));
    }

    #[tokio::test]
    async fn update_of_missing_item_fails() {
        let store = MemoryStore::new();
        seed(&store, 50, 1000).await;
        let engine = ReconciliationEngine::new(store.clone());

        let missing = LineItemId::new();
        let result = engine
            .update_line_item(missing, LineItemPatch::default())
            .await;
        assert!(matches!(result, Err(EngineError::LineItemNotFound(id)) if id == missing));
    }

    #[tokio::test]
    async fn update_rejects_zero_quantity() {
        let store = MemoryStore::new();
        let (order_id, product_id) = seed(&store, 50, 1000).await;
        let engine = ReconciliationEngine::new(store.clone());
        let item = engine
            .create_line_item(order_id, product_id, 5)
            .await
            .unwrap();

        let result = engine
            .update_line_item(
                item.id,
                LineItemPatch {
                    quantity: Some(0),
                    ..Default::default()
                },
            )
            .await;
        assert!(matches!(result, Err(EngineError::InvalidQuantity { .. })));
    }

    #[tokio::test]
    async fn delete_of_missing_item_fails() {
        let store = MemoryStore::new();
        seed(&store, 50, 1000).await;
        let engine = ReconciliationEngine::new(store.clone());

        let missing = LineItemId::new();
        let result = engine.delete_line_item(missing).await;
        assert!(matches!(result, Err(EngineError::LineItemNotFound(id)) if id == missing));
    }
}
