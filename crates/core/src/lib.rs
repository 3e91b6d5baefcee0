//! `waxcrate-core` — catalog engine foundation building blocks.
//!
//! This crate contains **pure domain** primitives (no infrastructure concerns).

pub mod error;
pub mod id;
pub mod sku;

pub use error::{CatalogError, CatalogResult};
pub use id::{AssetRef, ProductId};
pub use sku::{Sku, SKU_PAD_WIDTH};
