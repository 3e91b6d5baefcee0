//! In-memory store implementations.
//!
//! Intended for tests/dev. Not optimized for performance.

use std::collections::{HashMap, HashSet};
use std::sync::RwLock;
use std::sync::atomic::{AtomicBool, Ordering};

use uuid::Uuid;

use waxcrate_catalog::Product;
use waxcrate_core::{AssetRef, ProductId, Sku};

use crate::asset_store::{AssetStore, AssetStoreError};
use crate::repository::{ProductRepository, RepositoryError};

#[derive(Debug, Default)]
struct Records {
    /// Insertion sequence alongside each record; `list` orders by it so
    /// creation order survives identical timestamps.
    products: HashMap<ProductId, (u64, Product)>,
    next_seq: u64,
}

/// In-memory product record store.
///
/// The single write lock is what makes `create`/`update` atomic with
/// respect to the SKU uniqueness constraint: the existence scan and the
/// insert happen under one critical section.
#[derive(Debug, Default)]
pub struct InMemoryProductRepository {
    records: RwLock<Records>,
}

impl InMemoryProductRepository {
    pub fn new() -> Self {
        Self::default()
    }

    fn sku_taken(records: &Records, sku: &Sku, exclude: Option<ProductId>) -> bool {
        records
            .products
            .iter()
            .any(|(id, (_, p))| p.sku == *sku && Some(*id) != exclude)
    }
}

#[async_trait::async_trait]
impl ProductRepository for InMemoryProductRepository {
    async fn create(&self, product: Product) -> Result<Product, RepositoryError> {
        let mut records = self
            .records
            .write()
            .map_err(|_| RepositoryError::Backend("lock poisoned".to_string()))?;

        if records.products.contains_key(&product.id) {
            return Err(RepositoryError::Backend(format!(
                "record {} already exists",
                product.id
            )));
        }
        if Self::sku_taken(&records, &product.sku, None) {
            return Err(RepositoryError::DuplicateSku(product.sku.to_string()));
        }

        let seq = records.next_seq;
        records.next_seq += 1;
        records.products.insert(product.id, (seq, product.clone()));
        Ok(product)
    }

    async fn get(&self, id: ProductId) -> Result<Product, RepositoryError> {
        let records = self
            .records
            .read()
            .map_err(|_| RepositoryError::Backend("lock poisoned".to_string()))?;
        records
            .products
            .get(&id)
            .map(|(_, p)| p.clone())
            .ok_or(RepositoryError::NotFound)
    }

    async fn update(&self, id: ProductId, product: Product) -> Result<Product, RepositoryError> {
        let mut records = self
            .records
            .write()
            .map_err(|_| RepositoryError::Backend("lock poisoned".to_string()))?;

        if !records.products.contains_key(&id) {
            return Err(RepositoryError::NotFound);
        }
        if Self::sku_taken(&records, &product.sku, Some(id)) {
            return Err(RepositoryError::DuplicateSku(product.sku.to_string()));
        }

        let entry = records
            .products
            .get_mut(&id)
            .ok_or(RepositoryError::NotFound)?;
        entry.1 = product.clone();
        Ok(product)
    }

    async fn delete(&self, id: ProductId) -> Result<(), RepositoryError> {
        let mut records = self
            .records
            .write()
            .map_err(|_| RepositoryError::Backend("lock poisoned".to_string()))?;
        records
            .products
            .remove(&id)
            .map(|_| ())
            .ok_or(RepositoryError::NotFound)
    }

    async fn exists_with_sku(
        &self,
        sku: &Sku,
        exclude: Option<ProductId>,
    ) -> Result<bool, RepositoryError> {
        let records = self
            .records
            .read()
            .map_err(|_| RepositoryError::Backend("lock poisoned".to_string()))?;
        Ok(Self::sku_taken(&records, sku, exclude))
    }

    async fn list(&self) -> Result<Vec<Product>, RepositoryError> {
        let records = self
            .records
            .read()
            .map_err(|_| RepositoryError::Backend("lock poisoned".to_string()))?;
        let mut entries: Vec<(u64, Product)> = records.products.values().cloned().collect();
        entries.sort_by(|a, b| b.0.cmp(&a.0));
        Ok(entries.into_iter().map(|(_, p)| p).collect())
    }
}

/// In-memory asset store with failure injection for tests.
#[derive(Debug, Default)]
pub struct InMemoryAssetStore {
    objects: RwLock<HashMap<AssetRef, Vec<u8>>>,
    unavailable: AtomicBool,
    deny_deletes: RwLock<HashSet<AssetRef>>,
}

impl InMemoryAssetStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert an object under a caller-chosen handle (test fixture setup).
    pub fn seed(&self, handle: &str) -> AssetRef {
        let asset = AssetRef::new(handle).expect("seed handle must be non-empty");
        self.objects
            .write()
            .expect("asset store lock poisoned")
            .insert(asset.clone(), Vec::new());
        asset
    }

    /// Make every subsequent operation fail as unreachable.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    /// Make deletion of one specific ref fail while others succeed.
    pub fn fail_delete_of(&self, asset: &AssetRef) {
        self.deny_deletes
            .write()
            .expect("asset store lock poisoned")
            .insert(asset.clone());
    }

    pub fn contains(&self, asset: &AssetRef) -> bool {
        self.objects
            .read()
            .expect("asset store lock poisoned")
            .contains_key(asset)
    }

    pub fn len(&self) -> usize {
        self.objects
            .read()
            .expect("asset store lock poisoned")
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn check_available(&self) -> Result<(), AssetStoreError> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(AssetStoreError::Unavailable(
                "injected outage".to_string(),
            ));
        }
        Ok(())
    }
}

#[async_trait::async_trait]
impl AssetStore for InMemoryAssetStore {
    async fn upload(&self, bytes: Vec<u8>) -> Result<AssetRef, AssetStoreError> {
        self.check_available()?;
        let asset = AssetRef::new(format!("assets/{}", Uuid::now_v7()))
            .map_err(|e| AssetStoreError::Rejected(e.to_string()))?;
        self.objects
            .write()
            .map_err(|_| AssetStoreError::Unavailable("lock poisoned".to_string()))?
            .insert(asset.clone(), bytes);
        Ok(asset)
    }

    async fn delete(&self, asset: &AssetRef) -> Result<(), AssetStoreError> {
        self.check_available()?;
        if self
            .deny_deletes
            .read()
            .map_err(|_| AssetStoreError::Unavailable("lock poisoned".to_string()))?
            .contains(asset)
        {
            return Err(AssetStoreError::Rejected(format!(
                "injected delete failure for {asset}"
            )));
        }
        // Idempotent: removing a missing ref is a no-op success.
        self.objects
            .write()
            .map_err(|_| AssetStoreError::Unavailable("lock poisoned".to_string()))?
            .remove(asset);
        Ok(())
    }

    async fn list(&self) -> Result<Vec<AssetRef>, AssetStoreError> {
        self.check_available()?;
        let objects = self
            .objects
            .read()
            .map_err(|_| AssetStoreError::Unavailable("lock poisoned".to_string()))?;
        Ok(objects.keys().cloned().collect())
    }
}
