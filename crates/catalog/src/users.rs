//! User CRUD service.

use common::UserId;
use store::{NewUser, OrderRecord, Orders, ProductRecord, Products, UserPatch, UserRecord, Users};

use crate::error::{CatalogError, Result};
use crate::page::{Page, PageParams};

/// Service for managing users.
pub struct UserService<S> {
    store: S,
}

impl<S> UserService<S>
where
    S: Users + Products + Orders,
{
    /// Creates a new user service with the given store.
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Creates a user, rejecting an email that is already registered.
    #[tracing::instrument(skip(self))]
    pub async fn create(&self, new: NewUser) -> Result<UserRecord> {
        if self.store.fetch_user_by_email(&new.email).await?.is_some() {
            return Err(CatalogError::EmailTaken(new.email));
        }
        Ok(self.store.insert_user(new).await?)
    }

    /// Loads a user by ID.
    #[tracing::instrument(skip(self))]
    pub async fn get(&self, id: UserId) -> Result<UserRecord> {
        self.store
            .fetch_user(id)
            .await?
            .ok_or(CatalogError::UserNotFound(id))
    }

    /// Lists users, paginated.
    #[tracing::instrument(skip(self))]
    pub async fn list(&self, params: PageParams) -> Result<Page<UserRecord>> {
        let result = self
            .store
            .list_users(params.limit, params.offset())
            .await?;
        let total = self.store.count_users().await?;
        Ok(Page::assemble(result, total, params))
    }

    /// Overwrites the supplied fields.
    #[tracing::instrument(skip(self))]
    pub async fn update(&self, id: UserId, patch: UserPatch) -> Result<UserRecord> {
        self.store
            .update_user(id, patch)
            .await?
            .ok_or(CatalogError::UserNotFound(id))
    }

    /// Deletes a user, returning the removed record.
    #[tracing::instrument(skip(self))]
    pub async fn delete(&self, id: UserId) -> Result<UserRecord> {
        self.store
            .remove_user(id)
            .await?
            .ok_or(CatalogError::UserNotFound(id))
    }

    /// Lists the products owned by a user.
    #[tracing::instrument(skip(self))]
    pub async fn products(&self, id: UserId) -> Result<Vec<ProductRecord>> {
        self.get(id).await?;
        Ok(self.store.list_products_by_user(id).await?)
    }

    /// Lists the orders placed by a user.
    #[tracing::instrument(skip(self))]
    pub async fn orders(&self, id: UserId) -> Result<Vec<OrderRecord>> {
        self.get(id).await?;
        Ok(self.store.list_orders_by_user(id).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use store::MemoryStore;

    fn service() -> UserService<MemoryStore> {
        UserService::new(MemoryStore::new())
    }

    fn new_user(email: &str) -> NewUser {
        NewUser {
            name: "Ana".to_string(),
            email: email.to_string(),
        }
    }

    #[tokio::test]
    async fn create_and_get() {
        let service = service();
        let user = service.create(new_user("ana@example.com")).await.unwrap();
        let fetched = service.get(user.id).await.unwrap();
        assert_eq!(fetched, user);
    }

    #[tokio::test]
    async fn duplicate_email_rejected() {
        let service = service();
        service.create(new_user("ana@example.com")).await.unwrap();

        let result = service.create(new_user("ana@example.com")).await;
        assert!(matches!(result, Err(CatalogError::EmailTaken(_))));
    }

    #[tokio::test]
    async fn get_missing_fails() {
        let service = service();
        let missing = UserId::new();
        let result = service.get(missing).await;
        assert!(matches!(result, Err(CatalogError::UserNotFound(id)) if id == missing));
    }

    #[tokio::test]
    async fn update_overwrites_named_fields_only() {
        let service = service();
        let user = service.create(new_user("ana@example.com")).await.unwrap();

        let updated = service
            .update(
                user.id,
                UserPatch {
                    name: Some("Ana Maria".to_string()),
                    email: None,
                },
            )
            .await
            .unwrap();

        assert_eq!(updated.name, "Ana Maria");
        assert_eq!(updated.email, "ana@example.com");
    }

    #[tokio::test]
    async fn delete_returns_snapshot() {
        let service = service();
        let user = service.create(new_user("ana@example.com")).await.unwrap();

        let removed = service.delete(user.id).await.unwrap();
        assert_eq!(removed, user);

        let result = service.get(user.id).await;
        assert!(matches!(result, Err(CatalogError::UserNotFound(_))));
    }

    #[tokio::test]
    async fn list_paginates() {
        let service = service();
        for i in 0..5 {
            service
                .create(new_user(&format!("user{i}@example.com")))
                .await
                .unwrap();
        }

        let page = service
            .list(PageParams::new(Some(2), Some(2)))
            .await
            .unwrap();
        assert_eq!(page.total, 5);
        assert_eq!(page.result.len(), 2);
        assert!(page.previous.is_some());
        assert!(page.next.is_some());
    }
}
