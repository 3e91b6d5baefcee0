//! `waxcrate-lifecycle` — SKU allocation and the cross-store consistency
//! protocol behind product create/update/delete.

pub mod allocator;
pub mod service;
pub mod sweep;

#[cfg(test)]
mod integration_tests;

pub use allocator::{MAX_ALLOCATION_ATTEMPTS, SkuAllocator};
pub use service::{DeleteOutcome, ProductLifecycleService, SKU_WRITE_RETRIES, UpdateOutcome};
pub use sweep::{OrphanSweep, SweepReport};
