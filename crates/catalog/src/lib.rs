//! `waxcrate-catalog` — the product data model.
//!
//! Product records, their create/update command types, and the category
//! configuration the SKU allocator and validation run against.

pub mod category;
pub mod product;

pub use category::{Category, CategoryConfig};
pub use product::{Product, ProductDraft, ProductPatch};
