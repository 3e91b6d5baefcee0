//! Orphaned-asset reconciliation.
//!
//! Update/delete leak an orphan whenever an asset deletion fails after the
//! record write. The sweep is the independently schedulable cleanup pass:
//! collect every ref any product still holds, diff against the asset
//! store's contents, best-effort delete the remainder.
//!
//! The sweep can race a create whose refs were uploaded but not yet
//! committed to a record; schedule it against a quiescent catalog.

use std::collections::HashSet;

use futures::future::join_all;
use serde::{Deserialize, Serialize};

use waxcrate_core::{AssetRef, CatalogResult};
use waxcrate_store::{AssetStore, ProductRepository};

/// What one sweep pass did.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SweepReport {
    /// Refs live in the asset store when the pass started.
    pub scanned: usize,
    /// Unreferenced refs successfully deleted.
    pub deleted: Vec<AssetRef>,
    /// Unreferenced refs whose deletion failed (still orphaned).
    pub failed: Vec<AssetRef>,
}

/// One-shot reconciliation pass over the asset store.
#[derive(Debug, Clone)]
pub struct OrphanSweep<R, A> {
    repository: R,
    assets: A,
}

impl<R, A> OrphanSweep<R, A>
where
    R: ProductRepository,
    A: AssetStore,
{
    pub fn new(repository: R, assets: A) -> Self {
        Self { repository, assets }
    }

    /// Run the pass. Never deletes a ref any product references.
    pub async fn run(&self) -> CatalogResult<SweepReport> {
        let referenced: HashSet<AssetRef> = self
            .repository
            .list()
            .await?
            .into_iter()
            .flat_map(|p| p.asset_refs)
            .collect();

        let live = self.assets.list().await?;
        let scanned = live.len();
        let orphans: Vec<AssetRef> = live
            .into_iter()
            .filter(|asset| !referenced.contains(asset))
            .collect();

        let attempts = orphans.iter().map(|asset| async move {
            match self.assets.delete(asset).await {
                Ok(()) => (asset.clone(), true),
                Err(err) => {
                    tracing::warn!(asset = %asset, error = %err, "orphan deletion failed");
                    (asset.clone(), false)
                }
            }
        });

        let mut report = SweepReport {
            scanned,
            ..SweepReport::default()
        };
        for (asset, deleted) in join_all(attempts).await {
            if deleted {
                report.deleted.push(asset);
            } else {
                report.failed.push(asset);
            }
        }

        tracing::info!(
            scanned = report.scanned,
            deleted = report.deleted.len(),
            failed = report.failed.len(),
            "orphan sweep finished"
        );
        Ok(report)
    }
}
