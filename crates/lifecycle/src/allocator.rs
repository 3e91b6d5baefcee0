//! SKU allocation.
//!
//! There is no central sequence counter. The allocator scans the SKU
//! namespace of a category from sequence 1 upward and takes the first
//! candidate the record store does not know — an optimistic guess that the
//! store's uniqueness constraint re-validates at commit time. When a commit
//! loses that race, the caller re-enters `allocate` from the top (fresh
//! existence scan, never a cached counter).

use std::sync::Arc;

use waxcrate_catalog::CategoryConfig;
use waxcrate_core::{CatalogError, CatalogResult, ProductId, Sku};
use waxcrate_store::ProductRepository;

/// Upper bound on candidates examined per allocation. Guarantees
/// termination under pathological contention; in practice a catalog
/// this size would have outgrown three-digit SKUs long before.
pub const MAX_ALLOCATION_ATTEMPTS: u32 = 10_000;

/// Ephemeral (prefix, sequence) pair examined during allocation. Never
/// persisted on its own; only a successful product write pins it down.
#[derive(Debug, Clone, PartialEq, Eq)]
struct SkuCandidate {
    prefix: String,
    sequence: u32,
}

impl SkuCandidate {
    fn to_sku(&self) -> Sku {
        Sku::format(&self.prefix, self.sequence)
    }
}

/// Allocates category-prefixed SKUs against the record store.
#[derive(Debug, Clone)]
pub struct SkuAllocator<R> {
    repository: R,
    categories: Arc<CategoryConfig>,
    max_attempts: u32,
}

impl<R: ProductRepository> SkuAllocator<R> {
    pub fn new(repository: R, categories: Arc<CategoryConfig>) -> Self {
        Self {
            repository,
            categories,
            max_attempts: MAX_ALLOCATION_ATTEMPTS,
        }
    }

    /// Override the attempt bound (tests exercise exhaustion with small bounds).
    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts;
        self
    }

    /// Produce a SKU currently unused within the record store.
    ///
    /// `exclude` names a record whose own SKU does not count as taken —
    /// the "update the same product within the same category" case.
    ///
    /// Fails `InvalidCategory` when the code has no configured prefix and
    /// `AllocationExhausted` once `max_attempts` candidates were all taken.
    pub async fn allocate(
        &self,
        category_code: &str,
        exclude: Option<ProductId>,
    ) -> CatalogResult<Sku> {
        let prefix = self.categories.prefix_for(category_code)?.to_string();

        for sequence in 1..=self.max_attempts {
            let candidate = SkuCandidate {
                prefix: prefix.clone(),
                sequence,
            };
            let sku = candidate.to_sku();
            if !self.repository.exists_with_sku(&sku, exclude).await? {
                tracing::debug!(sku = %sku, attempts = sequence, "allocated SKU candidate");
                return Ok(sku);
            }
        }

        Err(CatalogError::AllocationExhausted {
            prefix,
            attempts: self.max_attempts,
        })
    }
}
