//! Category configuration.
//!
//! The category→prefix table is an explicit configuration object injected
//! into the allocator and validation, loaded once at startup. Unknown
//! category codes are rejected everywhere they appear.

use serde::{Deserialize, Serialize};

use waxcrate_core::{CatalogError, CatalogResult};

/// One configured product category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    /// Stable code used on product records (e.g. `vinyl-cd`).
    pub code: String,
    /// Human-readable name.
    pub name: String,
    pub description: String,
    /// Short SKU prefix (e.g. `VC`). Unique across categories.
    pub sku_prefix: String,
    /// Attribute keys the UI pre-populates for products in this category.
    pub default_attributes: Vec<String>,
}

/// The full category table.
///
/// Built once at startup and shared read-only from then on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryConfig {
    categories: Vec<Category>,
}

impl CategoryConfig {
    /// Build a config from a category list.
    ///
    /// Rejects empty codes/prefixes and duplicate codes or prefixes: a
    /// duplicated prefix would make two categories allocate from the same
    /// SKU namespace.
    pub fn new(categories: Vec<Category>) -> CatalogResult<Self> {
        for (idx, cat) in categories.iter().enumerate() {
            if cat.code.trim().is_empty() {
                return Err(CatalogError::validation(format!(
                    "category at index {idx} has an empty code"
                )));
            }
            if cat.sku_prefix.trim().is_empty() {
                return Err(CatalogError::validation(format!(
                    "category '{}' has an empty SKU prefix",
                    cat.code
                )));
            }
            for earlier in &categories[..idx] {
                if earlier.code == cat.code {
                    return Err(CatalogError::validation(format!(
                        "duplicate category code '{}'",
                        cat.code
                    )));
                }
                if earlier.sku_prefix == cat.sku_prefix {
                    return Err(CatalogError::validation(format!(
                        "SKU prefix '{}' is shared by '{}' and '{}'",
                        cat.sku_prefix, earlier.code, cat.code
                    )));
                }
            }
        }
        Ok(Self { categories })
    }

    /// The catalog's standard category set.
    pub fn standard() -> Self {
        Self {
            categories: vec![
                Category {
                    code: "vinyl-cd".to_string(),
                    name: "Vinyl and CDs".to_string(),
                    description: "Pre-loved vinyl records and CDs from various artistes"
                        .to_string(),
                    sku_prefix: "VC".to_string(),
                    default_attributes: vec![
                        "Condition".to_string(),
                        "Artist".to_string(),
                        "Genre".to_string(),
                    ],
                },
                Category {
                    code: "audio-equipment".to_string(),
                    name: "Audio Equipment".to_string(),
                    description: "Vintage audio equipment".to_string(),
                    sku_prefix: "AE".to_string(),
                    default_attributes: vec![
                        "Condition".to_string(),
                        "Brand".to_string(),
                        "Model".to_string(),
                    ],
                },
            ],
        }
    }

    pub fn get(&self, code: &str) -> Option<&Category> {
        self.categories.iter().find(|c| c.code == code)
    }

    pub fn contains(&self, code: &str) -> bool {
        self.get(code).is_some()
    }

    /// Resolve a category code to its SKU prefix.
    pub fn prefix_for(&self, code: &str) -> CatalogResult<&str> {
        self.get(code)
            .map(|c| c.sku_prefix.as_str())
            .ok_or_else(|| CatalogError::invalid_category(code))
    }

    pub fn iter(&self) -> impl Iterator<Item = &Category> {
        self.categories.iter()
    }
}
