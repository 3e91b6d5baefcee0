//! Integration tests for the full lifecycle pipeline.
//!
//! Tests: draft/patch → allocator → repository → asset store, including
//! the consistency protocol's ordering and warning semantics.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};

use waxcrate_catalog::{CategoryConfig, Product, ProductDraft, ProductPatch};
use waxcrate_core::{AssetRef, CatalogError, ProductId, Sku};
use waxcrate_store::{
    InMemoryAssetStore, InMemoryProductRepository, ProductRepository, RepositoryError,
};

use crate::service::{ProductLifecycleService, SKU_WRITE_RETRIES};
use crate::sweep::OrphanSweep;

type Repo = Arc<InMemoryProductRepository>;
type Assets = Arc<InMemoryAssetStore>;

fn setup() -> (ProductLifecycleService<Repo, Assets>, Repo, Assets) {
    waxcrate_observability::init_with_default("waxcrate=debug");
    let repo: Repo = Arc::new(InMemoryProductRepository::new());
    let assets: Assets = Arc::new(InMemoryAssetStore::new());
    let service = ProductLifecycleService::new(
        repo.clone(),
        assets.clone(),
        Arc::new(CategoryConfig::standard()),
    );
    (service, repo, assets)
}

fn draft(category: &str, asset_refs: Vec<AssetRef>) -> ProductDraft {
    ProductDraft {
        name: "A Love Supreme".to_string(),
        description: "1965 stereo pressing".to_string(),
        category: category.to_string(),
        price: 5500,
        stock: 1,
        asset_refs,
        attributes: BTreeMap::from([("Condition".to_string(), "VG".to_string())]),
        featured: false,
    }
}

fn seed_assets(assets: &InMemoryAssetStore, handles: &[&str]) -> Vec<AssetRef> {
    handles.iter().map(|h| assets.seed(h)).collect()
}

#[tokio::test]
async fn create_assigns_dense_skus_per_category() {
    let (service, _, assets) = setup();
    let refs = seed_assets(&assets, &["img/1", "img/2", "img/3"]);

    let first = service.create(draft("vinyl-cd", vec![refs[0].clone()])).await.unwrap();
    let second = service.create(draft("vinyl-cd", vec![refs[1].clone()])).await.unwrap();
    let third = service.create(draft("vinyl-cd", vec![refs[2].clone()])).await.unwrap();

    assert_eq!(first.sku, Sku::format("VC", 1));
    assert_eq!(second.sku, Sku::format("VC", 2));
    assert_eq!(third.sku, Sku::format("VC", 3));
}

#[tokio::test]
async fn create_validates_before_touching_the_store() {
    let (service, repo, assets) = setup();
    let refs = seed_assets(&assets, &["img/1"]);

    let mut bad = draft("vinyl-cd", refs.clone());
    bad.name = "  ".to_string();
    assert!(matches!(
        service.create(bad).await.unwrap_err(),
        CatalogError::Validation(_)
    ));

    let unknown = draft("furniture", refs);
    assert!(matches!(
        service.create(unknown).await.unwrap_err(),
        CatalogError::InvalidCategory(_)
    ));

    assert!(repo.list().await.unwrap().is_empty());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_creates_get_distinct_skus() {
    let (service, repo, assets) = setup();
    let service = Arc::new(service);

    let mut handles = Vec::new();
    for i in 0..8 {
        let service = service.clone();
        let asset = assets.seed(&format!("img/{i}"));
        handles.push(tokio::spawn(async move {
            service.create(draft("vinyl-cd", vec![asset])).await
        }));
    }

    let mut skus = Vec::new();
    for handle in handles {
        let product = handle.await.unwrap().unwrap();
        assert!(product.sku.has_prefix("VC"));
        skus.push(product.sku);
    }
    skus.sort_by(|a, b| a.as_str().cmp(b.as_str()));
    skus.dedup();
    assert_eq!(skus.len(), 8);
    assert_eq!(repo.list().await.unwrap().len(), 8);
}

#[tokio::test]
async fn field_only_update_keeps_sku_and_assets() {
    let (service, _, assets) = setup();
    let refs = seed_assets(&assets, &["img/a", "img/b"]);
    let product = service.create(draft("vinyl-cd", refs.clone())).await.unwrap();

    let patch = ProductPatch {
        price: Some(9900),
        stock: Some(3),
        attributes: Some(BTreeMap::from([(
            "Condition".to_string(),
            "NM".to_string(),
        )])),
        ..Default::default()
    };
    let outcome = service.update(product.id, patch).await.unwrap();

    assert_eq!(outcome.product.sku, product.sku);
    assert_eq!(outcome.product.price, 9900);
    assert!(outcome.orphaned_assets.is_empty());
    // No asset deletion was triggered.
    assert!(assets.contains(&refs[0]));
    assert!(assets.contains(&refs[1]));
}

#[tokio::test]
async fn category_change_allocates_under_the_new_prefix() {
    let (service, _, assets) = setup();
    let refs = seed_assets(&assets, &["img/1", "img/2", "img/3"]);

    // Existing VC001 so the subject product gets VC002; existing AE001.
    service.create(draft("vinyl-cd", vec![refs[0].clone()])).await.unwrap();
    let subject = service.create(draft("vinyl-cd", vec![refs[1].clone()])).await.unwrap();
    service
        .create(draft("audio-equipment", vec![refs[2].clone()]))
        .await
        .unwrap();
    assert_eq!(subject.sku, Sku::format("VC", 2));

    let patch = ProductPatch {
        category: Some("audio-equipment".to_string()),
        ..Default::default()
    };
    let outcome = service.update(subject.id, patch).await.unwrap();

    assert_eq!(outcome.product.sku, Sku::format("AE", 2));
    assert_eq!(outcome.product.category, "audio-equipment");
    assert!(outcome.orphaned_assets.is_empty());
}

#[tokio::test]
async fn same_category_patch_never_reallocates() {
    let (service, _, assets) = setup();
    let refs = seed_assets(&assets, &["img/1"]);
    let product = service.create(draft("vinyl-cd", refs)).await.unwrap();

    let patch = ProductPatch {
        category: Some("vinyl-cd".to_string()),
        name: Some("renamed".to_string()),
        ..Default::default()
    };
    let outcome = service.update(product.id, patch).await.unwrap();
    assert_eq!(outcome.product.sku, product.sku);
}

#[tokio::test]
async fn subset_patch_deletes_exactly_the_difference() {
    let (service, repo, assets) = setup();
    let refs = seed_assets(&assets, &["img/a", "img/b", "img/c"]);
    let product = service.create(draft("vinyl-cd", refs.clone())).await.unwrap();

    let patch = ProductPatch {
        asset_refs: Some(vec![refs[0].clone(), refs[2].clone()]),
        ..Default::default()
    };
    let outcome = service.update(product.id, patch).await.unwrap();

    assert_eq!(
        outcome.product.asset_refs,
        vec![refs[0].clone(), refs[2].clone()]
    );
    assert!(outcome.orphaned_assets.is_empty());
    assert!(assets.contains(&refs[0]));
    assert!(!assets.contains(&refs[1]));
    assert!(assets.contains(&refs[2]));
    assert_eq!(
        repo.get(product.id).await.unwrap().asset_refs,
        vec![refs[0].clone(), refs[2].clone()]
    );
}

#[tokio::test]
async fn empty_asset_patch_drops_every_image() {
    let (service, repo, assets) = setup();
    let refs = seed_assets(&assets, &["img/a", "img/b"]);
    let product = service.create(draft("vinyl-cd", refs.clone())).await.unwrap();

    let patch = ProductPatch {
        asset_refs: Some(vec![]),
        ..Default::default()
    };
    let outcome = service.update(product.id, patch).await.unwrap();

    // Replacing with the empty set deletes every previously held ref.
    assert!(outcome.product.asset_refs.is_empty());
    assert!(outcome.orphaned_assets.is_empty());
    assert!(!assets.contains(&refs[0]));
    assert!(!assets.contains(&refs[1]));
    assert!(assets.is_empty());
    assert!(repo.get(product.id).await.unwrap().asset_refs.is_empty());
}

#[tokio::test]
async fn failed_asset_deletion_is_a_warning_not_an_error() {
    let (service, repo, assets) = setup();
    let refs = seed_assets(&assets, &["img/a", "img/b", "img/c"]);
    let product = service.create(draft("vinyl-cd", refs.clone())).await.unwrap();
    assets.fail_delete_of(&refs[1]);

    let patch = ProductPatch {
        asset_refs: Some(vec![refs[0].clone()]),
        ..Default::default()
    };
    let outcome = service.update(product.id, patch).await.unwrap();

    // The record write stuck; b stayed behind as an orphan, c went away.
    assert_eq!(outcome.product.asset_refs, vec![refs[0].clone()]);
    assert_eq!(outcome.orphaned_assets, vec![refs[1].clone()]);
    assert!(assets.contains(&refs[1]));
    assert!(!assets.contains(&refs[2]));
    assert_eq!(
        repo.get(product.id).await.unwrap().asset_refs,
        vec![refs[0].clone()]
    );
}

#[tokio::test]
async fn update_of_missing_product_is_not_found() {
    let (service, _, _) = setup();
    let err = service
        .update(ProductId::new(), ProductPatch::default())
        .await
        .unwrap_err();
    assert_eq!(err, CatalogError::NotFound);
}

#[tokio::test]
async fn delete_removes_record_and_every_asset() {
    let (service, repo, assets) = setup();
    let refs = seed_assets(&assets, &["img/a", "img/b"]);
    let product = service.create(draft("vinyl-cd", refs.clone())).await.unwrap();

    let outcome = service.delete(product.id).await.unwrap();

    assert!(outcome.orphaned_assets.is_empty());
    assert!(assets.is_empty());
    assert_eq!(
        repo.get(product.id).await.unwrap_err(),
        RepositoryError::NotFound
    );
}

#[tokio::test]
async fn delete_survives_a_fully_unreachable_asset_store() {
    let (service, repo, assets) = setup();
    let refs = seed_assets(&assets, &["img/a", "img/b", "img/c"]);
    let product = service.create(draft("vinyl-cd", refs.clone())).await.unwrap();
    assets.set_unavailable(true);

    let mut outcome = service.delete(product.id).await.unwrap();

    // Record removal is authoritative; every ref is reported as an orphan.
    outcome.orphaned_assets.sort();
    let mut expected = refs.clone();
    expected.sort();
    assert_eq!(outcome.orphaned_assets, expected);
    assert!(repo.get(product.id).await.is_err());
}

#[tokio::test]
async fn second_delete_is_not_found_and_touches_no_assets() {
    let (service, _, assets) = setup();
    let refs = seed_assets(&assets, &["img/a"]);
    let product = service.create(draft("vinyl-cd", refs)).await.unwrap();

    service.delete(product.id).await.unwrap();
    let before = assets.len();
    let err = service.delete(product.id).await.unwrap_err();

    assert_eq!(err, CatalogError::NotFound);
    assert_eq!(assets.len(), before);
}

#[tokio::test]
async fn list_is_newest_first() {
    let (service, _, assets) = setup();
    let refs = seed_assets(&assets, &["img/1", "img/2"]);
    let first = service.create(draft("vinyl-cd", vec![refs[0].clone()])).await.unwrap();
    let second = service
        .create(draft("audio-equipment", vec![refs[1].clone()]))
        .await
        .unwrap();

    let ids: Vec<ProductId> = service.list().await.unwrap().iter().map(|p| p.id).collect();
    assert_eq!(ids, vec![second.id, first.id]);
}

#[tokio::test]
async fn sweep_deletes_only_unreferenced_assets() {
    let (service, repo, assets) = setup();
    let referenced = seed_assets(&assets, &["img/kept"]);
    let orphan = assets.seed("img/orphan");
    service.create(draft("vinyl-cd", referenced.clone())).await.unwrap();

    let report = OrphanSweep::new(repo.clone(), assets.clone())
        .run()
        .await
        .unwrap();

    assert_eq!(report.scanned, 2);
    assert_eq!(report.deleted, vec![orphan.clone()]);
    assert!(report.failed.is_empty());
    assert!(assets.contains(&referenced[0]));
    assert!(!assets.contains(&orphan));
}

#[tokio::test]
async fn sweep_reports_undeletable_orphans() {
    let (_, repo, assets) = setup();
    let stuck = assets.seed("img/stuck");
    assets.fail_delete_of(&stuck);

    let report = OrphanSweep::new(repo, assets.clone()).run().await.unwrap();

    assert_eq!(report.failed, vec![stuck.clone()]);
    assert!(report.deleted.is_empty());
    assert!(assets.contains(&stuck));
}

/// Repository wrapper that rejects the first N writes with `DuplicateSku`,
/// simulating a lost allocation race at the store's uniqueness constraint.
#[derive(Debug, Clone)]
struct ContendedRepository {
    inner: Repo,
    create_rejections: Arc<AtomicU32>,
    update_rejections: Arc<AtomicU32>,
}

impl ContendedRepository {
    fn new(inner: Repo, create_rejections: u32, update_rejections: u32) -> Self {
        Self {
            inner,
            create_rejections: Arc::new(AtomicU32::new(create_rejections)),
            update_rejections: Arc::new(AtomicU32::new(update_rejections)),
        }
    }

    fn take(counter: &AtomicU32) -> bool {
        counter
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok()
    }
}

#[async_trait::async_trait]
impl ProductRepository for ContendedRepository {
    async fn create(&self, product: Product) -> Result<Product, RepositoryError> {
        if Self::take(&self.create_rejections) {
            return Err(RepositoryError::DuplicateSku(product.sku.to_string()));
        }
        self.inner.create(product).await
    }

    async fn get(&self, id: ProductId) -> Result<Product, RepositoryError> {
        self.inner.get(id).await
    }

    async fn update(&self, id: ProductId, product: Product) -> Result<Product, RepositoryError> {
        if Self::take(&self.update_rejections) {
            return Err(RepositoryError::DuplicateSku(product.sku.to_string()));
        }
        self.inner.update(id, product).await
    }

    async fn delete(&self, id: ProductId) -> Result<(), RepositoryError> {
        self.inner.delete(id).await
    }

    async fn exists_with_sku(
        &self,
        sku: &Sku,
        exclude: Option<ProductId>,
    ) -> Result<bool, RepositoryError> {
        self.inner.exists_with_sku(sku, exclude).await
    }

    async fn list(&self) -> Result<Vec<Product>, RepositoryError> {
        self.inner.list().await
    }
}

fn contended_service(
    create_rejections: u32,
    update_rejections: u32,
) -> (
    ProductLifecycleService<ContendedRepository, Assets>,
    Assets,
) {
    let repo = ContendedRepository::new(
        Arc::new(InMemoryProductRepository::new()),
        create_rejections,
        update_rejections,
    );
    let assets: Assets = Arc::new(InMemoryAssetStore::new());
    let service =
        ProductLifecycleService::new(repo, assets.clone(), Arc::new(CategoryConfig::standard()));
    (service, assets)
}

#[tokio::test]
async fn create_retries_a_lost_sku_race() {
    let (service, assets) = contended_service(2, 0);
    let refs = seed_assets(&assets, &["img/1"]);

    let product = service.create(draft("vinyl-cd", refs)).await.unwrap();
    assert!(product.sku.has_prefix("VC"));
}

#[tokio::test]
async fn create_gives_up_after_the_retry_bound() {
    let (service, assets) = contended_service(SKU_WRITE_RETRIES + 1, 0);
    let refs = seed_assets(&assets, &["img/1"]);

    let err = service.create(draft("vinyl-cd", refs)).await.unwrap_err();
    match err {
        CatalogError::AllocationExhausted { prefix, .. } => assert_eq!(prefix, "VC"),
        other => panic!("expected AllocationExhausted, got {other:?}"),
    }
}

#[tokio::test]
async fn category_change_retries_a_lost_sku_race() {
    let (service, assets) = contended_service(0, 1);
    let refs = seed_assets(&assets, &["img/1"]);
    let product = service.create(draft("vinyl-cd", refs)).await.unwrap();

    let patch = ProductPatch {
        category: Some("audio-equipment".to_string()),
        ..Default::default()
    };
    let outcome = service.update(product.id, patch).await.unwrap();
    assert!(outcome.product.sku.has_prefix("AE"));
}
