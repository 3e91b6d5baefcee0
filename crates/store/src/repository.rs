//! Record store interface for product documents.

use std::sync::Arc;

use thiserror::Error;

use waxcrate_catalog::Product;
use waxcrate_core::{CatalogError, ProductId, Sku};

/// Record store operation error.
///
/// Infrastructure errors, as opposed to the domain-level `CatalogError`.
/// The lifecycle layer maps these at its boundary.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RepositoryError {
    /// The store's uniqueness constraint on `sku` rejected the write.
    /// This is the linearization point for concurrent SKU allocation:
    /// callers recover by re-allocating, not by retrying the same SKU.
    #[error("duplicate SKU: {0}")]
    DuplicateSku(String),

    /// No record with the given id.
    #[error("product not found")]
    NotFound,

    /// Store unavailable or otherwise broken.
    #[error("record store failure: {0}")]
    Backend(String),
}

impl From<RepositoryError> for CatalogError {
    fn from(value: RepositoryError) -> Self {
        match value {
            RepositoryError::DuplicateSku(sku) => CatalogError::DuplicateSku(sku),
            RepositoryError::NotFound => CatalogError::NotFound,
            RepositoryError::Backend(msg) => CatalogError::Repository(msg),
        }
    }
}

/// CRUD over product records in the record store.
///
/// The only component permitted to write product records. Implementations
/// must enforce the uniqueness constraint on `sku` atomically with the
/// write: a duplicate submitted concurrently is rejected by the store, not
/// merely by the allocator's pre-check.
#[async_trait::async_trait]
pub trait ProductRepository: Send + Sync {
    /// Insert a new record. Fails `DuplicateSku` if the SKU is taken.
    async fn create(&self, product: Product) -> Result<Product, RepositoryError>;

    async fn get(&self, id: ProductId) -> Result<Product, RepositoryError>;

    /// Replace the record with the given id. Fails `NotFound` if absent,
    /// `DuplicateSku` if the new SKU collides with a different record.
    async fn update(&self, id: ProductId, product: Product) -> Result<Product, RepositoryError>;

    async fn delete(&self, id: ProductId) -> Result<(), RepositoryError>;

    /// Whether any record other than `exclude` holds this SKU.
    async fn exists_with_sku(
        &self,
        sku: &Sku,
        exclude: Option<ProductId>,
    ) -> Result<bool, RepositoryError>;

    /// All records, ordered by creation time, newest first.
    async fn list(&self) -> Result<Vec<Product>, RepositoryError>;
}

#[async_trait::async_trait]
impl<S> ProductRepository for Arc<S>
where
    S: ProductRepository + ?Sized,
{
    async fn create(&self, product: Product) -> Result<Product, RepositoryError> {
        (**self).create(product).await
    }

    async fn get(&self, id: ProductId) -> Result<Product, RepositoryError> {
        (**self).get(id).await
    }

    async fn update(&self, id: ProductId, product: Product) -> Result<Product, RepositoryError> {
        (**self).update(id, product).await
    }

    async fn delete(&self, id: ProductId) -> Result<(), RepositoryError> {
        (**self).delete(id).await
    }

    async fn exists_with_sku(
        &self,
        sku: &Sku,
        exclude: Option<ProductId>,
    ) -> Result<bool, RepositoryError> {
        (**self).exists_with_sku(sku, exclude).await
    }

    async fn list(&self) -> Result<Vec<Product>, RepositoryError> {
        (**self).list().await
    }
}
