use async_trait::async_trait;
use bytes::Bytes;
use image::{DynamicImage, ImageFormat, Rgb, RgbImage};
use object_store::{memory::InMemory, path::Path, Attribute, ObjectStore as _};
use portfolio_catalog::{
    adapters::outbound::{
        imaging::{BlockingPool, ImageDerivativeGenerator},
        persistence::ObjectStoreDocumentRepository,
        storage::ApacheObjectStoreAdapter,
    },
    domain::{
        errors::{CatalogError, StorageError, StorageResult, ValidationError},
        models::{
            AssetRole, CollectionDocument, CreateRecordRequest, DocumentVersion, Record,
            RecordFields, RecordPatch, VersionedDocument,
        },
        naming,
        ordering::{MoveDirection, MoveOutcome, OrdinalAssignment},
        value_objects::{Namespace, ObjectKey},
    },
    ports::{
        repositories::DocumentRepository,
        services::CatalogService,
        storage::{ObjectStore, PutObjectOptions, PutOutcome, StoredObject},
    },
    services::{AssetPipeline, CatalogServiceImpl},
};
use std::{
    collections::BTreeMap,
    io::Cursor,
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc,
    },
};

fn memory_store() -> Arc<dyn ObjectStore> {
    Arc::new(ApacheObjectStoreAdapter::new(Arc::new(InMemory::new())))
}

fn catalog_over(store: Arc<dyn ObjectStore>) -> CatalogServiceImpl {
    let generator = Arc::new(ImageDerivativeGenerator::new(BlockingPool::new(2)));
    let pipeline = AssetPipeline::new(store.clone(), generator);
    let documents = Arc::new(ObjectStoreDocumentRepository::new(store));
    CatalogServiceImpl::new(documents, pipeline)
}

fn png(width: u32, height: u32) -> Bytes {
    let img = RgbImage::from_pixel(width, height, Rgb([30, 120, 200]));
    let mut buf = Vec::new();
    DynamicImage::ImageRgb8(img)
        .write_to(&mut Cursor::new(&mut buf), ImageFormat::Png)
        .unwrap();
    Bytes::from(buf)
}

/// Simulates a finished direct upload: the original plus every client-made derivative
async fn upload_artwork(store: &Arc<dyn ObjectStore>, id: u64) -> ObjectKey {
    let original = naming::original_key(Namespace::Artworks, &id.to_string(), "work.png", "image/png")
        .unwrap();
    store
        .put_object(&original, Bytes::from_static(b"png"), PutObjectOptions::default())
        .await
        .unwrap();
    for (_, key) in naming::derivative_keys_for(Namespace::Artworks, &original) {
        store
            .put_object(&key, Bytes::from_static(b"jpg"), PutObjectOptions::default())
            .await
            .unwrap();
    }
    original
}

async fn upload_photo(store: &Arc<dyn ObjectStore>, namespace: Namespace, id: u64) -> ObjectKey {
    let original = naming::original_key(namespace, &id.to_string(), "photo.png", "image/png").unwrap();
    store
        .put_object(&original, png(900, 600), PutObjectOptions::default())
        .await
        .unwrap();
    original
}

async fn create_artwork(
    catalog: &CatalogServiceImpl,
    store: &Arc<dyn ObjectStore>,
    id: u64,
    title: &str,
    year: i32,
) -> Record {
    let key = upload_artwork(store, id).await;
    catalog
        .create(
            Namespace::Artworks,
            CreateRecordRequest {
                record_id: Some(id.to_string()),
                fields: RecordFields {
                    title: Some(title.to_string()),
                    year: Some(year),
                    ..Default::default()
                },
                assets: vec![key.to_string()],
                ..Default::default()
            },
        )
        .await
        .unwrap()
}

fn exhibition_fields(title: &str) -> RecordFields {
    RecordFields {
        title: Some(title.to_string()),
        start_date: chrono::NaiveDate::from_ymd_opt(2024, 5, 1),
        end_date: chrono::NaiveDate::from_ymd_opt(2024, 6, 30),
        location: Some("Oslo".to_string()),
        ..Default::default()
    }
}

/// `(id, year, number)` in list order
async fn ordinals(catalog: &CatalogServiceImpl) -> Vec<(String, i32, u32)> {
    catalog
        .list(Namespace::Artworks)
        .await
        .unwrap()
        .iter()
        .filter_map(Record::as_artwork)
        .map(|a| (a.id.clone(), a.year, a.number))
        .collect()
}

#[tokio::test]
async fn created_artworks_get_contiguous_numbers_per_year() {
    let store = memory_store();
    let catalog = catalog_over(store.clone());

    create_artwork(&catalog, &store, 1001, "Dawn", 2024).await;
    create_artwork(&catalog, &store, 1002, "Noon", 2024).await;
    create_artwork(&catalog, &store, 1003, "Old Work", 2023).await;
    create_artwork(&catalog, &store, 1004, "Dusk", 2024).await;

    assert_eq!(
        ordinals(&catalog).await,
        vec![
            ("1001".to_string(), 2024, 1),
            ("1002".to_string(), 2024, 2),
            ("1004".to_string(), 2024, 3),
            ("1003".to_string(), 2023, 1),
        ]
    );

    let record = catalog.get(Namespace::Artworks, "1001").await.unwrap();
    let roles: Vec<AssetRole> = record.assets().iter().map(|a| a.role).collect();
    assert_eq!(
        roles,
        vec![
            AssetRole::Original,
            AssetRole::ThumbnailSmall,
            AssetRole::ThumbnailMedium,
            AssetRole::ThumbnailLarge
        ]
    );
}

#[tokio::test]
async fn create_requires_confirmed_uploads() {
    let store = memory_store();
    let catalog = catalog_over(store.clone());

    let err = catalog
        .create(
            Namespace::Artworks,
            CreateRecordRequest {
                record_id: Some("2001".to_string()),
                fields: RecordFields {
                    title: Some("Ghost".to_string()),
                    year: Some(2024),
                    ..Default::default()
                },
                assets: vec!["Artworks/Original/2001.png".to_string()],
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, CatalogError::AssetNotUploaded { .. }));

    // Client-made derivatives must be there too
    let original = ObjectKey::new("Artworks/Original/2002.png").unwrap();
    store
        .put_object(&original, Bytes::from_static(b"png"), PutObjectOptions::default())
        .await
        .unwrap();
    let err = catalog
        .create(
            Namespace::Artworks,
            CreateRecordRequest {
                record_id: Some("2002".to_string()),
                fields: RecordFields {
                    title: Some("Half".to_string()),
                    year: Some(2024),
                    ..Default::default()
                },
                assets: vec![original.to_string()],
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, CatalogError::AssetNotUploaded { .. }));
    assert!(catalog.list(Namespace::Artworks).await.unwrap().is_empty());
}

#[tokio::test]
async fn create_validates_before_any_io() {
    let catalog = catalog_over(memory_store());

    let err = catalog
        .create(
            Namespace::Artworks,
            CreateRecordRequest {
                fields: RecordFields {
                    title: Some("No Year".to_string()),
                    ..Default::default()
                },
                assets: vec!["Artworks/Original/1.png".to_string()],
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        CatalogError::Validation(ValidationError::MissingField { field: "year", .. })
    ));

    let err = catalog
        .create(
            Namespace::Artworks,
            CreateRecordRequest {
                fields: RecordFields {
                    title: Some("Elsewhere".to_string()),
                    year: Some(2024),
                    ..Default::default()
                },
                assets: vec!["Texts/Original/1.pdf".to_string()],
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        CatalogError::Validation(ValidationError::KeyOutsideNamespace { .. })
    ));
}

#[tokio::test]
async fn delete_removes_record_assets_and_derivatives() {
    let store = memory_store();
    let catalog = catalog_over(store.clone());

    create_artwork(&catalog, &store, 3001, "One", 2024).await;
    create_artwork(&catalog, &store, 3002, "Two", 2024).await;
    create_artwork(&catalog, &store, 3003, "Three", 2024).await;

    let report = catalog.delete(Namespace::Artworks, "3002").await.unwrap();
    assert!(report.is_complete());
    assert_eq!(report.deleted.len(), 4);
    for key in &report.deleted {
        assert!(!store.object_exists(key).await.unwrap());
    }

    // Repeated delete is a not-found and leaves the rest alone
    let err = catalog.delete(Namespace::Artworks, "3002").await.unwrap_err();
    assert!(matches!(err, CatalogError::RecordNotFound { .. }));

    create_artwork(&catalog, &store, 3004, "Four", 2024).await;
    assert_eq!(
        ordinals(&catalog).await,
        vec![
            ("3001".to_string(), 2024, 1),
            ("3003".to_string(), 2024, 2),
            ("3004".to_string(), 2024, 3),
        ]
    );
}

/// Store whose deletes always fail
struct FailingDeletes {
    inner: Arc<dyn ObjectStore>,
}

#[async_trait]
impl ObjectStore for FailingDeletes {
    async fn put_object(
        &self,
        key: &ObjectKey,
        data: Bytes,
        options: PutObjectOptions,
    ) -> StorageResult<PutOutcome> {
        self.inner.put_object(key, data, options).await
    }

    async fn get_object(&self, key: &ObjectKey) -> StorageResult<StoredObject> {
        self.inner.get_object(key).await
    }

    async fn delete_object(&self, _key: &ObjectKey) -> StorageResult<()> {
        Err(StorageError::InfrastructureError {
            message: "delete refused".to_string(),
            source: None,
        })
    }

    async fn object_exists(&self, key: &ObjectKey) -> StorageResult<bool> {
        self.inner.object_exists(key).await
    }
}

#[tokio::test]
async fn failed_asset_deletion_still_removes_the_record() {
    let store: Arc<dyn ObjectStore> = Arc::new(FailingDeletes {
        inner: memory_store(),
    });
    let catalog = catalog_over(store.clone());

    create_artwork(&catalog, &store, 4001, "Stubborn", 2022).await;

    let report = catalog.delete(Namespace::Artworks, "4001").await.unwrap();
    assert!(!report.is_complete());
    assert_eq!(report.failed.len(), 4);
    assert!(report.deleted.is_empty());

    assert!(matches!(
        catalog.get(Namespace::Artworks, "4001").await,
        Err(CatalogError::RecordNotFound { .. })
    ));
}

#[tokio::test]
async fn move_swaps_with_neighbour_and_stops_at_boundary() {
    let store = memory_store();
    let catalog = catalog_over(store.clone());

    create_artwork(&catalog, &store, 5001, "A", 2024).await;
    create_artwork(&catalog, &store, 5002, "B", 2024).await;
    create_artwork(&catalog, &store, 5003, "C", 2023).await;

    let outcome = catalog
        .move_record(Namespace::Artworks, "5002", MoveDirection::Up)
        .await
        .unwrap();
    assert!(matches!(outcome, MoveOutcome::Moved { from: 2, to: 1 }));

    let outcome = catalog
        .move_record(Namespace::Artworks, "5002", MoveDirection::Up)
        .await
        .unwrap();
    assert_eq!(outcome, MoveOutcome::AtBoundary);

    // Alone in its year
    let outcome = catalog
        .move_record(Namespace::Artworks, "5003", MoveDirection::Down)
        .await
        .unwrap();
    assert_eq!(outcome, MoveOutcome::AtBoundary);

    assert_eq!(
        ordinals(&catalog).await,
        vec![
            ("5002".to_string(), 2024, 1),
            ("5001".to_string(), 2024, 2),
            ("5003".to_string(), 2023, 1),
        ]
    );

    let err = catalog
        .move_record(Namespace::Artworks, "missing", MoveDirection::Down)
        .await
        .unwrap_err();
    assert!(matches!(err, CatalogError::RecordNotFound { .. }));

    let err = catalog
        .move_record(Namespace::Exhibitions, "any", MoveDirection::Up)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        CatalogError::Validation(ValidationError::OrderingNotSupported(Namespace::Exhibitions))
    ));
}

#[tokio::test]
async fn reorder_applies_known_ids_and_reports_unknown_ones() {
    let store = memory_store();
    let catalog = catalog_over(store.clone());

    create_artwork(&catalog, &store, 6001, "A", 2024).await;
    create_artwork(&catalog, &store, 6002, "B", 2024).await;
    create_artwork(&catalog, &store, 6003, "C", 2024).await;

    let report = catalog
        .reorder_records(
            Namespace::Artworks,
            vec![
                OrdinalAssignment {
                    id: "6003".to_string(),
                    ordinal: 1,
                },
                OrdinalAssignment {
                    id: "6001".to_string(),
                    ordinal: 7,
                },
                OrdinalAssignment {
                    id: "ghost".to_string(),
                    ordinal: 2,
                },
            ],
        )
        .await
        .unwrap();

    assert_eq!(report.applied, 2);
    assert_eq!(report.ignored, vec!["ghost".to_string()]);
    assert_eq!(
        ordinals(&catalog).await,
        vec![
            ("6003".to_string(), 2024, 1),
            ("6002".to_string(), 2024, 2),
            ("6001".to_string(), 2024, 3),
        ]
    );
}

#[tokio::test]
async fn empty_reorder_after_delete_renumbers_survivor() {
    let store = memory_store();
    let catalog = catalog_over(store.clone());

    create_artwork(&catalog, &store, 6101, "A", 2024).await;
    create_artwork(&catalog, &store, 6102, "B", 2024).await;
    catalog.delete(Namespace::Artworks, "6101").await.unwrap();

    let report = catalog
        .reorder_records(Namespace::Artworks, vec![])
        .await
        .unwrap();

    assert_eq!(report.applied, 0);
    assert!(report.ignored.is_empty());
    assert_eq!(ordinals(&catalog).await, vec![("6102".to_string(), 2024, 1)]);
}

#[tokio::test]
async fn commit_metadata_is_written_onto_originals() {
    let raw = Arc::new(InMemory::new());
    let store: Arc<dyn ObjectStore> = Arc::new(ApacheObjectStoreAdapter::new(raw.clone()));
    let catalog = catalog_over(store.clone());

    let original = naming::original_key(Namespace::Artworks, "6201", "work.png", "image/png").unwrap();
    store
        .put_object(
            &original,
            Bytes::from_static(b"png"),
            PutObjectOptions::builder().content_type("image/png".to_string()).build(),
        )
        .await
        .unwrap();
    for (_, key) in naming::derivative_keys_for(Namespace::Artworks, &original) {
        store
            .put_object(&key, Bytes::from_static(b"jpg"), PutObjectOptions::default())
            .await
            .unwrap();
    }

    catalog
        .create(
            Namespace::Artworks,
            CreateRecordRequest {
                record_id: Some("6201".to_string()),
                fields: RecordFields {
                    title: Some("Dusk".to_string()),
                    year: Some(2024),
                    ..Default::default()
                },
                assets: vec![original.to_string()],
                metadata: BTreeMap::from([("Title".to_string(), "Dusk".to_string())]),
            },
        )
        .await
        .unwrap();

    let stored = raw.get(&Path::from(original.as_str())).await.unwrap();
    let title = stored
        .attributes
        .get(&Attribute::Metadata("title".into()))
        .map(|v| v.to_string());
    assert_eq!(title.as_deref(), Some("Dusk"));
    let content_type = stored
        .attributes
        .get(&Attribute::ContentType)
        .map(|v| v.to_string());
    assert_eq!(content_type.as_deref(), Some("image/png"));
    assert_eq!(stored.bytes().await.unwrap(), Bytes::from_static(b"png"));
}

#[tokio::test]
async fn changing_year_moves_artwork_to_end_of_new_year() {
    let store = memory_store();
    let catalog = catalog_over(store.clone());

    create_artwork(&catalog, &store, 7001, "A", 2023).await;
    create_artwork(&catalog, &store, 7002, "B", 2023).await;
    create_artwork(&catalog, &store, 7003, "C", 2024).await;

    let updated = catalog
        .update(
            Namespace::Artworks,
            "7001",
            RecordPatch {
                fields: RecordFields {
                    year: Some(2024),
                    medium: Some("Oil on linen".to_string()),
                    ..Default::default()
                },
                assets: None,
            },
        )
        .await
        .unwrap();

    let artwork = updated.as_artwork().unwrap();
    assert_eq!((artwork.year, artwork.number), (2024, 2));
    assert_eq!(artwork.medium.as_deref(), Some("Oil on linen"));
    assert_eq!(artwork.title, "A");
    assert_eq!(artwork.assets.len(), 4);

    assert_eq!(
        ordinals(&catalog).await,
        vec![
            ("7003".to_string(), 2024, 1),
            ("7001".to_string(), 2024, 2),
            ("7002".to_string(), 2023, 1),
        ]
    );
}

#[tokio::test]
async fn update_rejects_fields_of_other_variants() {
    let store = memory_store();
    let catalog = catalog_over(store.clone());
    create_artwork(&catalog, &store, 8001, "A", 2024).await;

    let err = catalog
        .update(
            Namespace::Artworks,
            "8001",
            RecordPatch {
                fields: RecordFields {
                    location: Some("Bergen".to_string()),
                    ..Default::default()
                },
                assets: None,
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        CatalogError::Validation(ValidationError::FieldNotApplicable {
            field: "location",
            ..
        })
    ));
}

#[tokio::test]
async fn exhibition_gallery_grows_and_shrinks_by_stem() {
    let store = memory_store();
    let catalog = catalog_over(store.clone());

    let first = upload_photo(&store, Namespace::Exhibitions, 9001).await;
    let created = catalog
        .create(
            Namespace::Exhibitions,
            CreateRecordRequest {
                record_id: None,
                fields: exhibition_fields("Night Garden"),
                assets: vec![first.to_string()],
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(created.id(), "night-garden");

    // The thumbnail was rendered on commit
    let thumbnail = ObjectKey::new("Exhibitions/Thumbnail/9001.jpg").unwrap();
    let stored = store.get_object(&thumbnail).await.unwrap();
    let decoded = image::load_from_memory(&stored.data).unwrap();
    assert_eq!((decoded.width(), decoded.height()), (600, 400));

    let second = upload_photo(&store, Namespace::Exhibitions, 9002).await;
    let record = catalog
        .add_asset(Namespace::Exhibitions, "night-garden", second.as_str())
        .await
        .unwrap();
    assert_eq!(record.assets().len(), 4);

    // Adding the same photo twice does not duplicate it
    let record = catalog
        .add_asset(Namespace::Exhibitions, "night-garden", second.as_str())
        .await
        .unwrap();
    assert_eq!(record.assets().len(), 4);

    // A thumbnail URL selects the whole family
    let record = catalog
        .remove_asset(
            Namespace::Exhibitions,
            "night-garden",
            "https://cdn.example.com/Exhibitions/Thumbnail/9001.jpg?v=3",
        )
        .await
        .unwrap();
    let stems: Vec<&str> = record.assets().iter().map(|a| a.stem()).collect();
    assert_eq!(stems, vec!["9002", "9002"]);
    assert!(!store.object_exists(&first).await.unwrap());
    assert!(!store.object_exists(&thumbnail).await.unwrap());

    let err = catalog
        .remove_asset(Namespace::Exhibitions, "night-garden", "9001")
        .await
        .unwrap_err();
    assert!(matches!(err, CatalogError::AssetNotFound { .. }));
}

#[tokio::test]
async fn duplicate_slug_is_rejected() {
    let store = memory_store();
    let catalog = catalog_over(store.clone());

    let request = CreateRecordRequest {
        record_id: None,
        fields: exhibition_fields("Spring Show"),
        assets: Vec::new(),
        ..Default::default()
    };
    catalog
        .create(Namespace::Exhibitions, request.clone())
        .await
        .unwrap();

    let err = catalog
        .create(Namespace::Exhibitions, request)
        .await
        .unwrap_err();
    assert!(matches!(err, CatalogError::RecordAlreadyExists { ref id, .. } if id == "spring-show"));
}

#[tokio::test]
async fn contact_is_a_singleton_without_uploads() {
    let catalog = catalog_over(memory_store());

    let record = catalog
        .create(
            Namespace::Contact,
            CreateRecordRequest {
                record_id: Some("ignored".to_string()),
                fields: RecordFields {
                    text: Some("studio@example.com".to_string()),
                    ..Default::default()
                },
                assets: Vec::new(),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(record.id(), "contact");

    let err = catalog
        .add_asset(Namespace::Contact, "contact", "Contact/Original/1.png")
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        CatalogError::Validation(ValidationError::GalleryNotSupported(Namespace::Contact))
    ));
}

/// Repository that loses every write race
struct AlwaysStale {
    inner: ObjectStoreDocumentRepository,
    puts: AtomicUsize,
}

#[async_trait]
impl DocumentRepository for AlwaysStale {
    async fn get(&self, namespace: Namespace) -> StorageResult<VersionedDocument> {
        self.inner.get(namespace).await
    }

    async fn put(
        &self,
        namespace: Namespace,
        _document: &CollectionDocument,
        expected: &DocumentVersion,
    ) -> StorageResult<DocumentVersion> {
        self.puts.fetch_add(1, Ordering::SeqCst);
        Err(StorageError::VersionConflict {
            key: ObjectKey::new(format!("Metadata/{}.json", namespace)).unwrap(),
            expected_version: expected.as_tag().map(str::to_string),
        })
    }
}

#[tokio::test]
async fn persistent_conflicts_give_up_after_configured_attempts() {
    let store = memory_store();
    let documents = Arc::new(AlwaysStale {
        inner: ObjectStoreDocumentRepository::new(store.clone()),
        puts: AtomicUsize::new(0),
    });
    let pipeline = AssetPipeline::new(
        store,
        Arc::new(ImageDerivativeGenerator::new(BlockingPool::new(1))),
    );
    let catalog = CatalogServiceImpl::new(documents.clone(), pipeline).with_max_commit_attempts(4);

    let err = catalog
        .create(
            Namespace::Texts,
            CreateRecordRequest {
                record_id: Some("1".to_string()),
                fields: RecordFields {
                    title: Some("Essay".to_string()),
                    ..Default::default()
                },
                assets: Vec::new(),
                ..Default::default()
            },
        )
        .await;

    // Texts need their PDF; validation fails before any write
    assert!(matches!(
        err,
        Err(CatalogError::Validation(ValidationError::MissingAsset { .. }))
    ));
    assert_eq!(documents.puts.load(Ordering::SeqCst), 0);

    let err = catalog
        .create(
            Namespace::Contact,
            CreateRecordRequest {
                fields: RecordFields {
                    text: Some("hello".to_string()),
                    ..Default::default()
                },
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        CatalogError::CommitConflict {
            namespace: Namespace::Contact,
            attempts: 4
        }
    ));
    assert_eq!(documents.puts.load(Ordering::SeqCst), 4);
}

#[tokio::test]
async fn concurrent_creates_all_land_with_distinct_numbers() {
    let store = memory_store();
    let catalog = Arc::new(catalog_over(store.clone()).with_max_commit_attempts(16));

    let mut keys = Vec::new();
    for id in 10001..=10004u64 {
        keys.push((id, upload_artwork(&store, id).await));
    }

    let tasks: Vec<_> = keys
        .into_iter()
        .map(|(id, key)| {
            let catalog = catalog.clone();
            tokio::spawn(async move {
                catalog
                    .create(
                        Namespace::Artworks,
                        CreateRecordRequest {
                            record_id: Some(id.to_string()),
                            fields: RecordFields {
                                title: Some(format!("Work {}", id)),
                                year: Some(2025),
                                ..Default::default()
                            },
                            assets: vec![key.to_string()],
                            ..Default::default()
                        },
                    )
                    .await
            })
        })
        .collect();
    for task in tasks {
        task.await.unwrap().unwrap();
    }

    let mut numbers: Vec<u32> = ordinals(&catalog).await.iter().map(|(_, _, n)| *n).collect();
    numbers.sort_unstable();
    assert_eq!(numbers, vec![1, 2, 3, 4]);
}
