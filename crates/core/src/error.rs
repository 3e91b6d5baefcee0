//! Catalog error model.

use thiserror::Error;

/// Result type used across the catalog engine.
pub type CatalogResult<T> = Result<T, CatalogError>;

/// Catalog-level error.
///
/// Covers the full taxonomy the lifecycle service reports to its caller.
/// Infrastructure layers have their own error enums and are folded into
/// this one at the orchestration boundary.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CatalogError {
    /// Caller-correctable input problem (missing field, malformed value).
    /// Reported directly, never retried.
    #[error("validation failed: {0}")]
    Validation(String),

    /// The category code has no configured SKU prefix.
    #[error("unknown category: {0}")]
    InvalidCategory(String),

    /// The requested product record is absent.
    #[error("product not found")]
    NotFound,

    /// The record store rejected a write because the SKU is already taken.
    /// Transient: the lifecycle layer re-allocates and retries internally
    /// before ever surfacing this.
    #[error("duplicate SKU: {0}")]
    DuplicateSku(String),

    /// SKU allocation gave up after the configured attempt bound.
    #[error("SKU allocation exhausted for prefix '{prefix}' after {attempts} attempts")]
    AllocationExhausted { prefix: String, attempts: u32 },

    /// The record store failed on the primary write. Fatal to the
    /// operation; guaranteed to leave no partial state because asset
    /// mutations only follow a successful record write.
    #[error("repository failure: {0}")]
    Repository(String),

    /// The asset store failed outside the best-effort deletion paths
    /// (those are collected as warnings, not errors).
    #[error("asset store failure: {0}")]
    AssetStore(String),
}

impl CatalogError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn invalid_category(code: impl Into<String>) -> Self {
        Self::InvalidCategory(code.into())
    }

    pub fn duplicate_sku(sku: impl Into<String>) -> Self {
        Self::DuplicateSku(sku.into())
    }

    pub fn repository(msg: impl Into<String>) -> Self {
        Self::Repository(msg.into())
    }

    pub fn asset_store(msg: impl Into<String>) -> Self {
        Self::AssetStore(msg.into())
    }
}
