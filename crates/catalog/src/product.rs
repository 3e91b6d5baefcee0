//! Product record and its create/update command types.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use waxcrate_core::{AssetRef, CatalogError, CatalogResult, ProductId, Sku};

use crate::category::CategoryConfig;

/// The catalog record.
///
/// Identity is twofold: the opaque `id` (assigned by the record store) and
/// the business-facing `sku` (unique, immutable except on category change).
/// `asset_refs` is ordered; order is display order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub sku: Sku,
    pub name: String,
    pub description: String,
    pub category: String,
    /// Price in minor currency units (cents).
    pub price: u64,
    pub stock: u32,
    pub asset_refs: Vec<AssetRef>,
    pub attributes: BTreeMap<String, String>,
    pub featured: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Command: create a product.
///
/// Asset uploads happen out-of-band before this command is built; the draft
/// carries the refs the caller already obtained from the asset store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductDraft {
    pub name: String,
    pub description: String,
    pub category: String,
    pub price: u64,
    pub stock: u32,
    pub asset_refs: Vec<AssetRef>,
    pub attributes: BTreeMap<String, String>,
    pub featured: bool,
}

impl ProductDraft {
    /// Validate the draft against the category configuration.
    pub fn validate(&self, categories: &CategoryConfig) -> CatalogResult<()> {
        if self.name.trim().is_empty() {
            return Err(CatalogError::validation("name cannot be empty"));
        }
        if self.description.trim().is_empty() {
            return Err(CatalogError::validation("description cannot be empty"));
        }
        if !categories.contains(&self.category) {
            return Err(CatalogError::invalid_category(&self.category));
        }
        if self.asset_refs.is_empty() {
            return Err(CatalogError::validation(
                "at least one asset reference is required",
            ));
        }
        Ok(())
    }

    /// Build the record for a validated draft once a SKU has been allocated.
    pub fn into_product(self, id: ProductId, sku: Sku, now: DateTime<Utc>) -> Product {
        Product {
            id,
            sku,
            name: self.name,
            description: self.description,
            category: self.category,
            price: self.price,
            stock: self.stock,
            asset_refs: self.asset_refs,
            attributes: self.attributes,
            featured: self.featured,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Command: partial update of a product. Absent fields are left untouched.
///
/// An empty `asset_refs` list is a valid patch value: it drops every image
/// (the lifecycle service then deletes the now-unreferenced assets).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductPatch {
    pub name: Option<String>,
    pub description: Option<String>,
    pub category: Option<String>,
    pub price: Option<u64>,
    pub stock: Option<u32>,
    pub asset_refs: Option<Vec<AssetRef>>,
    pub attributes: Option<BTreeMap<String, String>>,
    pub featured: Option<bool>,
}

impl ProductPatch {
    /// Validate the supplied fields against the category configuration.
    pub fn validate(&self, categories: &CategoryConfig) -> CatalogResult<()> {
        if let Some(name) = &self.name {
            if name.trim().is_empty() {
                return Err(CatalogError::validation("name cannot be empty"));
            }
        }
        if let Some(description) = &self.description {
            if description.trim().is_empty() {
                return Err(CatalogError::validation("description cannot be empty"));
            }
        }
        if let Some(category) = &self.category {
            if !categories.contains(category) {
                return Err(CatalogError::invalid_category(category));
            }
        }
        Ok(())
    }

    /// Whether this patch moves the product to a different category.
    pub fn changes_category(&self, current: &Product) -> bool {
        self.category
            .as_ref()
            .is_some_and(|c| *c != current.category)
    }

    /// Asset refs present on `current` but absent from the patched set.
    ///
    /// Empty when the patch does not touch assets.
    pub fn assets_to_remove(&self, current: &Product) -> Vec<AssetRef> {
        match &self.asset_refs {
            Some(next) => current
                .asset_refs
                .iter()
                .filter(|r| !next.contains(r))
                .cloned()
                .collect(),
            None => Vec::new(),
        }
    }

    /// Merge the patch into `current`, producing the record to write.
    ///
    /// The SKU is handled by the caller (it only changes with the category,
    /// and allocation is not this type's business).
    pub fn merge_into(&self, current: &Product, sku: Sku, now: DateTime<Utc>) -> Product {
        Product {
            id: current.id,
            sku,
            name: self.name.clone().unwrap_or_else(|| current.name.clone()),
            description: self
                .description
                .clone()
                .unwrap_or_else(|| current.description.clone()),
            category: self
                .category
                .clone()
                .unwrap_or_else(|| current.category.clone()),
            price: self.price.unwrap_or(current.price),
            stock: self.stock.unwrap_or(current.stock),
            asset_refs: self
                .asset_refs
                .clone()
                .unwrap_or_else(|| current.asset_refs.clone()),
            attributes: self
                .attributes
                .clone()
                .unwrap_or_else(|| current.attributes.clone()),
            featured: self.featured.unwrap_or(current.featured),
            created_at: current.created_at,
            updated_at: now,
        }
    }
}
