//! Category CRUD service.

use common::CategoryId;
use store::{Categories, CategoryPatch, CategoryRecord, NewCategory};

use crate::error::{CatalogError, Result};
use crate::page::{Page, PageParams};

/// Service for managing product categories.
pub struct CategoryService<S> {
    store: S,
}

impl<S> CategoryService<S>
where
    S: Categories,
{
    /// Creates a new category service with the given store.
    pub fn new(store: S) -> Self {
        Self { store }
    }

    #[tracing::instrument(skip(self))]
    pub async fn create(&self, new: NewCategory) -> Result<CategoryRecord> {
        Ok(self.store.insert_category(new).await?)
    }

    #[tracing::instrument(skip(self))]
    pub async fn get(&self, id: CategoryId) -> Result<CategoryRecord> {
        self.store
            .fetch_category(id)
            .await?
            .ok_or(CatalogError::CategoryNotFound(id))
    }

    #[tracing::instrument(skip(self))]
    pub async fn list(&self, params: PageParams) -> Result<Page<CategoryRecord>> {
        let result = self
            .store
            .list_categories(params.limit, params.offset())
            .await?;
        let total = self.store.count_categories().await?;
        Ok(Page::assemble(result, total, params))
    }

    #[tracing::instrument(skip(self))]
    pub async fn update(&self, id: CategoryId, patch: CategoryPatch) -> Result<CategoryRecord> {
        self.store
            .update_category(id, patch)
            .await?
            .ok_or(CatalogError::CategoryNotFound(id))
    }

    #[tracing::instrument(skip(self))]
    pub async fn delete(&self, id: CategoryId) -> Result<CategoryRecord> {
        self.store
            .remove_category(id)
            .await?
            .ok_or(CatalogError::CategoryNotFound(id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use store::MemoryStore;

    fn service() -> CategoryService<MemoryStore> {
        CategoryService::new(MemoryStore::new())
    }

    #[tokio::test]
    async fn create_get_update_delete() {
        let service = service();
        let category = service
            .create(NewCategory {
                name: "Tools".to_string(),
                description: Some("Hand tools".to_string()),
            })
            .await
            .unwrap();

        let fetched = service.get(category.id).await.unwrap();
        assert_eq!(fetched, category);

        let updated = service
            .update(
                category.id,
                CategoryPatch {
                    name: Some("Power Tools".to_string()),
                    description: None,
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.name, "Power Tools");
        assert_eq!(updated.description.as_deref(), Some("Hand tools"));

        service.delete(category.id).await.unwrap();
        let result = service.get(category.id).await;
        assert!(matches!(result, Err(CatalogError::CategoryNotFound(_))));
    }

    #[tokio::test]
    async fn missing_category_fails() {
        let service = service();
        let missing = CategoryId::new();
        assert!(matches!(
            service.get(missing).await,
            Err(CatalogError::CategoryNotFound(id)) if id == missing
        ));
        assert!(matches!(
            service.delete(missing).await,
            Err(CatalogError::CategoryNotFound(_))
        ));
    }
}
