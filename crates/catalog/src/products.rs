//! Product CRUD service.

use common::ProductId;
use store::{Categories, NewProduct, ProductPatch, ProductRecord, Products, Users};

use crate::error::{CatalogError, Result};
use crate::page::{Page, PageParams};

/// Service for managing catalog products.
///
/// `quantity_in_stock` updates made here are administrative corrections;
/// the reconciliation engine is the only writer on the line-item path.
pub struct ProductService<S> {
    store: S,
}

impl<S> ProductService<S>
where
    S: Products + Users + Categories,
{
    /// Creates a new product service with the given store.
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Creates a product after validating that the owning user and the
    /// category exist.
    #[tracing::instrument(skip(self))]
    pub async fn create(&self, new: NewProduct) -> Result<ProductRecord> {
        self.store
            .fetch_user(new.user_id)
            .await?
            .ok_or(CatalogError::UserNotFound(new.user_id))?;
        self.store
            .fetch_category(new.category_id)
            .await?
            .ok_or(CatalogError::CategoryNotFound(new.category_id))?;

        Ok(self.store.insert_product(new).await?)
    }

    #[tracing::instrument(skip(self))]
    pub async fn get(&self, id: ProductId) -> Result<ProductRecord> {
        self.store
            .fetch_product(id)
            .await?
            .ok_or(CatalogError::ProductNotFound(id))
    }

    #[tracing::instrument(skip(self))]
    pub async fn list(&self, params: PageParams) -> Result<Page<ProductRecord>> {
        let result = self
            .store
            .list_products(params.limit, params.offset())
            .await?;
        let total = self.store.count_products().await?;
        Ok(Page::assemble(result, total, params))
    }

    #[tracing::instrument(skip(self))]
    pub async fn update(&self, id: ProductId, patch: ProductPatch) -> Result<ProductRecord> {
        if let Some(category_id) = patch.category_id {
            self.store
                .fetch_category(category_id)
                .await?
                .ok_or(CatalogError::CategoryNotFound(category_id))?;
        }

        self.store
            .update_product(id, patch)
            .await?
            .ok_or(CatalogError::ProductNotFound(id))
    }

    #[tracing::instrument(skip(self))]
    pub async fn delete(&self, id: ProductId) -> Result<ProductRecord> {
        self.store
            .remove_product(id)
            .await?
            .ok_or(CatalogError::ProductNotFound(id))
    }

    /// Lists the products of the first category whose name contains
    /// `needle`.
    #[tracing::instrument(skip(self))]
    pub async fn search_by_category(&self, needle: &str) -> Result<Vec<ProductRecord>> {
        let category = self
            .store
            .fetch_category_by_name(needle)
            .await?
            .ok_or_else(|| CatalogError::NoCategoryMatches(needle.to_string()))?;

        Ok(self.store.list_products_by_category(category.id).await?)
    }
}
