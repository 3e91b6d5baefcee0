//! Product lifecycle orchestration.
//!
//! Create/update/delete composed from the allocator, the record store and
//! the asset store, owning the cross-store consistency protocol. The two
//! stores share no transaction, so the protocol fixes a step order and
//! leans on idempotent, best-effort compensating deletes:
//!
//! - the record write always happens before any asset deletion it triggers;
//! - asset deletions are fanned out best-effort and never fail the
//!   operation — a leaked orphan beats a dangling reference;
//! - a write-time SKU collision (lost allocation race) is retried from a
//!   fresh allocation, bounded, then surfaced as `AllocationExhausted`.

use std::sync::Arc;

use chrono::Utc;
use futures::future::join_all;
use serde::{Deserialize, Serialize};

use waxcrate_catalog::{CategoryConfig, Product, ProductDraft, ProductPatch};
use waxcrate_core::{AssetRef, CatalogError, CatalogResult, ProductId};
use waxcrate_store::{AssetStore, ProductRepository, RepositoryError};

use crate::allocator::SkuAllocator;

/// How many times a write-time `DuplicateSku` rejection triggers a fresh
/// allocation before the operation gives up.
pub const SKU_WRITE_RETRIES: u32 = 5;

/// Successful update, plus refs whose deletion failed (advisory only;
/// callers must not treat a non-empty list as operation failure).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateOutcome {
    pub product: Product,
    pub orphaned_assets: Vec<AssetRef>,
}

/// Successful delete, plus refs whose deletion failed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeleteOutcome {
    pub orphaned_assets: Vec<AssetRef>,
}

/// The catalog's only writer: every product mutation flows through here.
#[derive(Debug, Clone)]
pub struct ProductLifecycleService<R, A> {
    repository: R,
    assets: A,
    categories: Arc<CategoryConfig>,
    allocator: SkuAllocator<R>,
}

impl<R, A> ProductLifecycleService<R, A>
where
    R: ProductRepository + Clone,
    A: AssetStore,
{
    pub fn new(repository: R, assets: A, categories: Arc<CategoryConfig>) -> Self {
        let allocator = SkuAllocator::new(repository.clone(), categories.clone());
        Self {
            repository,
            assets,
            categories,
            allocator,
        }
    }

    /// Create a product from a validated draft.
    ///
    /// No asset-store mutation happens here: the caller uploaded the refs
    /// out-of-band, so the only failure-recovery burden is SKU allocation.
    pub async fn create(&self, draft: ProductDraft) -> CatalogResult<Product> {
        draft.validate(&self.categories)?;
        let prefix = self.categories.prefix_for(&draft.category)?.to_string();

        let mut retries = 0;
        loop {
            let sku = self.allocator.allocate(&draft.category, None).await?;
            let product = draft
                .clone()
                .into_product(ProductId::new(), sku, Utc::now());

            match self.repository.create(product).await {
                Ok(created) => {
                    tracing::info!(id = %created.id, sku = %created.sku, "product created");
                    return Ok(created);
                }
                Err(RepositoryError::DuplicateSku(sku)) => {
                    // Lost the race against a concurrent allocator. Retry
                    // from a fresh allocation, never the stale candidate.
                    retries += 1;
                    if retries > SKU_WRITE_RETRIES {
                        return Err(CatalogError::AllocationExhausted {
                            prefix,
                            attempts: retries,
                        });
                    }
                    tracing::debug!(%sku, retry = retries, "SKU taken at commit, re-allocating");
                }
                Err(other) => return Err(other.into()),
            }
        }
    }

    /// Apply a partial update.
    ///
    /// The record write goes first: if it fails, the old assets are still
    /// referenced and nothing has been deleted. Only after it succeeds are
    /// the dropped refs deleted, best-effort; failures come back as
    /// `orphaned_assets` warnings, never as an error.
    pub async fn update(&self, id: ProductId, patch: ProductPatch) -> CatalogResult<UpdateOutcome> {
        patch.validate(&self.categories)?;
        let current = self.repository.get(id).await?;
        let to_remove = patch.assets_to_remove(&current);
        let category_change = patch.changes_category(&current);

        let mut retries = 0;
        let updated = loop {
            let sku = match (&patch.category, category_change) {
                (Some(category), true) => self.allocator.allocate(category, Some(id)).await?,
                _ => current.sku.clone(),
            };
            let merged = patch.merge_into(&current, sku, Utc::now());

            match self.repository.update(id, merged).await {
                Ok(updated) => break updated,
                Err(RepositoryError::DuplicateSku(sku)) if category_change => {
                    retries += 1;
                    if retries > SKU_WRITE_RETRIES {
                        let prefix = self
                            .categories
                            .prefix_for(patch.category.as_deref().unwrap_or_default())?
                            .to_string();
                        return Err(CatalogError::AllocationExhausted {
                            prefix,
                            attempts: retries,
                        });
                    }
                    tracing::debug!(%sku, retry = retries, "SKU taken at commit, re-allocating");
                }
                Err(other) => return Err(other.into()),
            }
        };

        let orphaned_assets = self.delete_assets(&to_remove).await;
        tracing::info!(
            id = %updated.id,
            sku = %updated.sku,
            removed_assets = to_remove.len() - orphaned_assets.len(),
            orphaned = orphaned_assets.len(),
            "product updated"
        );
        Ok(UpdateOutcome {
            product: updated,
            orphaned_assets,
        })
    }

    /// Delete a product and its assets.
    ///
    /// Assets go first so a failed record deletion leaves a safely
    /// retryable state (asset deletes are idempotent). The record is
    /// removed even when every asset deletion failed: the record is the
    /// authoritative "this product no longer exists" signal, and the
    /// leftovers are reported for later cleanup.
    pub async fn delete(&self, id: ProductId) -> CatalogResult<DeleteOutcome> {
        let current = self.repository.get(id).await?;

        let orphaned_assets = self.delete_assets(&current.asset_refs).await;
        self.repository.delete(id).await?;

        tracing::info!(
            id = %id,
            sku = %current.sku,
            orphaned = orphaned_assets.len(),
            "product deleted"
        );
        Ok(DeleteOutcome { orphaned_assets })
    }

    pub async fn get(&self, id: ProductId) -> CatalogResult<Product> {
        Ok(self.repository.get(id).await?)
    }

    /// All products, newest first.
    pub async fn list(&self) -> CatalogResult<Vec<Product>> {
        Ok(self.repository.list().await?)
    }

    /// Best-effort deletion fan-out. Every ref is attempted regardless of
    /// other failures; the refs that could not be deleted are returned.
    async fn delete_assets(&self, refs: &[AssetRef]) -> Vec<AssetRef> {
        let attempts = refs.iter().map(|asset| async move {
            match self.assets.delete(asset).await {
                Ok(()) => None,
                Err(err) => {
                    tracing::warn!(asset = %asset, error = %err, "asset deletion failed, leaving orphan");
                    Some(asset.clone())
                }
            }
        });
        join_all(attempts).await.into_iter().flatten().collect()
    }
}
