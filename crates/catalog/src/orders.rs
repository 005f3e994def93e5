//! Order CRUD service.
//!
//! Orders denormalize the owning user's name and email; both are copied at
//! creation and re-copied when an update reassigns the user. The running
//! `total_price` is maintained by the reconciliation engine; setting it
//! here is an administrative correction.

use common::{Money, OrderId, UserId};
use store::{LineItemRecord, LineItems, NewOrder, OrderPatch, OrderRecord, Orders, Users};

use crate::error::{CatalogError, Result};
use crate::page::{Page, PageParams};

/// Caller-facing update fields for an order.
#[derive(Debug, Clone, Copy, Default)]
pub struct OrderUpdate {
    pub user_id: Option<UserId>,
    pub total_price: Option<Money>,
}

/// Service for managing orders.
pub struct OrderService<S> {
    store: S,
}

impl<S> OrderService<S>
where
    S: Orders + Users + LineItems,
{
    /// Creates a new order service with the given store.
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Creates an empty order for a user, copying the user's name and
    /// email onto the order.
    #[tracing::instrument(skip(self))]
    pub async fn create(&self, user_id: UserId) -> Result<OrderRecord> {
        let user = self
            .store
            .fetch_user(user_id)
            .await?
            .ok_or(CatalogError::UserNotFound(user_id))?;

        Ok(self
            .store
            .insert_order(NewOrder {
                user_id: user.id,
                customer_name: user.name,
                customer_email: user.email,
            })
            .await?)
    }

    #[tracing::instrument(skip(self))]
    pub async fn get(&self, id: OrderId) -> Result<OrderRecord> {
        self.store
            .fetch_order(id)
            .await?
            .ok_or(CatalogError::OrderNotFound(id))
    }

    #[tracing::instrument(skip(self))]
    pub async fn list(&self, params: PageParams) -> Result<Page<OrderRecord>> {
        let result = self
            .store
            .list_orders(params.limit, params.offset())
            .await?;
        let total = self.store.count_orders().await?;
        Ok(Page::assemble(result, total, params))
    }

    /// Applies an update. Reassigning the user re-resolves it and
    /// re-copies the customer name and email.
    #[tracing::instrument(skip(self))]
    pub async fn update(&self, id: OrderId, update: OrderUpdate) -> Result<OrderRecord> {
        self.get(id).await?;

        let mut patch = OrderPatch {
            total_price: update.total_price,
            ..Default::default()
        };

        if let Some(user_id) = update.user_id {
            let user = self
                .store
                .fetch_user(user_id)
                .await?
                .ok_or(CatalogError::UserNotFound(user_id))?;
            patch.user_id = Some(user.id);
            patch.customer_name = Some(user.name);
            patch.customer_email = Some(user.email);
        }

        self.store
            .update_order(id, patch)
            .await?
            .ok_or(CatalogError::OrderNotFound(id))
    }

    /// Deletes an order, returning the removed record.
    #[tracing::instrument(skip(self))]
    pub async fn delete(&self, id: OrderId) -> Result<OrderRecord> {
        self.store
            .remove_order(id)
            .await?
            .ok_or(CatalogError::OrderNotFound(id))
    }

    /// Returns an order together with its line items.
    #[tracing::instrument(skip(self))]
    pub async fn items(&self, id: OrderId) -> Result<(OrderRecord, Vec<LineItemRecord>)> {
        let order = self.get(id).await?;
        let items = self.store.list_by_order(id).await?;
        Ok((order, items))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use store::{MemoryStore, NewUser};

    async fn seeded() -> (OrderService<MemoryStore>, UserId, UserId) {
        let store = MemoryStore::new();
        let ana = store
            .insert_user(NewUser {
                name: "Ana".to_string(),
                email: "ana@example.com".to_string(),
            })
            .await
            .unwrap();
        let bo = store
            .insert_user(NewUser {
                name: "Bo".to_string(),
                email: "bo@example.com".to_string(),
            })
            .await
            .unwrap();
        (OrderService::new(store), ana.id, bo.id)
    }

    #[tokio::test]
    async fn create_copies_customer_fields() {
        let (service, ana, _) = seeded().await;

        let order = service.create(ana).await.unwrap();
        assert_eq!(order.customer_name, "Ana");
        assert_eq!(order.customer_email, "ana@example.com");
        assert_eq!(order.total_price, Money::zero());
    }

    #[tokio::test]
    async fn create_for_missing_user_fails() {
        let (service, _, _) = seeded().await;
        let missing = UserId::new();
        let result = service.create(missing).await;
        assert!(matches!(result, Err(CatalogError::UserNotFound(id)) if id == missing));
    }

    #[tokio::test]
    async fn reassigning_user_recopies_customer_fields() {
        let (service, ana, bo) = seeded().await;
        let order = service.create(ana).await.unwrap();

        let updated = service
            .update(
                order.id,
                OrderUpdate {
                    user_id: Some(bo),
                    total_price: None,
                },
            )
            .await
            .unwrap();

        assert_eq!(updated.user_id, bo);
        assert_eq!(updated.customer_name, "Bo");
        assert_eq!(updated.customer_email, "bo@example.com");
    }

    #[tokio::test]
    async fn reassigning_to_missing_user_fails() {
        let (service, ana, _) = seeded().await;
        let order = service.create(ana).await.unwrap();

        let result = service
            .update(
                order.id,
                OrderUpdate {
                    user_id: Some(UserId::new()),
                    total_price: None,
                },
            )
            .await;
        assert!(matches!(result, Err(CatalogError::UserNotFound(_))));

        // Customer fields untouched.
        let stored = service.get(order.id).await.unwrap();
        assert_eq!(stored.customer_name, "Ana");
    }

    #[tokio::test]
    async fn administrative_total_correction() {
        let (service, ana, _) = seeded().await;
        let order = service.create(ana).await.unwrap();

        let updated = service
            .update(
                order.id,
                OrderUpdate {
                    user_id: None,
                    total_price: Some(Money::from_cents(1234)),
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.total_price, Money::from_cents(1234));
    }

    #[tokio::test]
    async fn items_returns_order_and_line_items() {
        let (service, ana, _) = seeded().await;
        let order = service.create(ana).await.unwrap();

        let (stored, items) = service.items(order.id).await.unwrap();
        assert_eq!(stored.id, order.id);
        assert!(items.is_empty());
    }

    #[tokio::test]
    async fn delete_missing_fails() {
        let (service, _, _) = seeded().await;
        let result = service.delete(OrderId::new()).await;
        assert!(matches!(result, Err(CatalogError::OrderNotFound(_))));
    }
}
