//! `waxcrate-store` — storage interfaces and in-memory backends.
//!
//! The record store and the binary-object store are independent systems
//! with independent failure modes; each gets its own trait and error enum.
//! The in-memory implementations back the test suite and dev setups.

pub mod asset_store;
pub mod in_memory;
pub mod repository;

pub use asset_store::{AssetStore, AssetStoreError};
pub use in_memory::{InMemoryAssetStore, InMemoryProductRepository};
pub use repository::{ProductRepository, RepositoryError};
