//! Binary-object store interface (uploaded product images).

use std::sync::Arc;

use thiserror::Error;

use waxcrate_core::{AssetRef, CatalogError};

/// Asset store operation error.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AssetStoreError {
    /// The store could not be reached.
    #[error("asset store unavailable: {0}")]
    Unavailable(String),

    /// The store refused the operation (quota, malformed payload, ...).
    #[error("asset store rejected the operation: {0}")]
    Rejected(String),
}

impl From<AssetStoreError> for CatalogError {
    fn from(value: AssetStoreError) -> Self {
        CatalogError::asset_store(value.to_string())
    }
}

/// Store keyed by opaque asset references.
///
/// `delete` is idempotent: deleting a ref the store no longer holds is a
/// no-op success. The lifecycle protocol relies on this to make its
/// cleanup steps safely retryable.
#[async_trait::async_trait]
pub trait AssetStore: Send + Sync {
    /// Upload a binary object, returning its handle.
    async fn upload(&self, bytes: Vec<u8>) -> Result<AssetRef, AssetStoreError>;

    /// Delete the object behind `asset`. Missing refs succeed.
    async fn delete(&self, asset: &AssetRef) -> Result<(), AssetStoreError>;

    /// Every ref currently live in the store (used by the orphan sweep).
    async fn list(&self) -> Result<Vec<AssetRef>, AssetStoreError>;
}

#[async_trait::async_trait]
impl<S> AssetStore for Arc<S>
where
    S: AssetStore + ?Sized,
{
    async fn upload(&self, bytes: Vec<u8>) -> Result<AssetRef, AssetStoreError> {
        (**self).upload(bytes).await
    }

    async fn delete(&self, asset: &AssetRef) -> Result<(), AssetStoreError> {
        (**self).delete(asset).await
    }

    async fn list(&self) -> Result<Vec<AssetRef>, AssetStoreError> {
        (**self).list().await
    }
}
