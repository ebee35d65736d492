use async_trait::async_trait;
use bytes::Bytes;
use futures::TryStreamExt;
use image::{DynamicImage, ImageFormat, Rgb, RgbImage};
use object_store::{memory::InMemory, path::Path, Attribute, ObjectStore as _};
use portfolio_catalog::{
    adapters::outbound::{
        imaging::{BlockingPool, ImageDerivativeGenerator},
        storage::{
            s3::{create_s3_store, S3Config},
            ApacheObjectStoreAdapter, LocalUploadSigner, ObjectStoreUploadSigner,
        },
    },
    domain::{
        errors::{CatalogError, ImageError, StorageResult, ValidationError},
        models::{DerivativeVariant, FileDescriptor, UploadIntentRequest, UploadedFile},
        value_objects::{Namespace, ObjectKey},
    },
    ports::{
        services::UploadService,
        storage::{ObjectStore, UploadSigner},
    },
    services::{AssetPipeline, UploadServiceImpl},
};
use std::{
    collections::BTreeMap,
    io::Cursor,
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc,
    },
    time::Duration,
};

/// Signer that counts how often it was asked
struct CountingSigner {
    inner: LocalUploadSigner,
    calls: AtomicUsize,
}

#[async_trait]
impl UploadSigner for CountingSigner {
    async fn presign_put(&self, key: &ObjectKey, expires_in: Duration) -> StorageResult<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.inner.presign_put(key, expires_in).await
    }
}

struct Harness {
    uploads: UploadServiceImpl,
    signer: Arc<CountingSigner>,
    raw: Arc<InMemory>,
    store: Arc<dyn ObjectStore>,
}

fn harness() -> Harness {
    let raw = Arc::new(InMemory::new());
    let store: Arc<dyn ObjectStore> = Arc::new(ApacheObjectStoreAdapter::new(raw.clone()));
    let signer = Arc::new(CountingSigner {
        inner: LocalUploadSigner::new("http://localhost:3000", "secret"),
        calls: AtomicUsize::new(0),
    });
    let generator = Arc::new(ImageDerivativeGenerator::new(BlockingPool::new(2)));
    let uploads = UploadServiceImpl::new(signer.clone(), AssetPipeline::new(store.clone(), generator))
        .with_url_ttl(Duration::from_secs(120));
    Harness {
        uploads,
        signer,
        raw,
        store,
    }
}

fn png(width: u32, height: u32) -> Bytes {
    let img = RgbImage::from_pixel(width, height, Rgb([250, 200, 10]));
    let mut buf = Vec::new();
    DynamicImage::ImageRgb8(img)
        .write_to(&mut Cursor::new(&mut buf), ImageFormat::Png)
        .unwrap();
    Bytes::from(buf)
}

fn descriptor(file_name: &str, mime_type: &str) -> FileDescriptor {
    FileDescriptor {
        file_name: file_name.to_string(),
        mime_type: mime_type.to_string(),
    }
}

#[tokio::test]
async fn batch_intent_allocates_consecutive_ids() {
    let h = harness();
    let intent = h
        .uploads
        .issue_upload_intent(
            Namespace::Artworks,
            UploadIntentRequest {
                files: vec![
                    descriptor("a.PNG", "image/png"),
                    descriptor("b.jpg", "image/jpeg"),
                    descriptor("c", "image/webp"),
                ],
                metadata: BTreeMap::from([("Title".to_string(), "Dusk".to_string())]),
            },
        )
        .await
        .unwrap();

    let ids: Vec<u64> = intent.files.iter().map(|f| f.id).collect();
    let base = ids[0];
    assert_eq!(ids, vec![base, base + 1, base + 2]);
    assert_eq!(intent.record_id, base.to_string());

    let originals: Vec<&str> = intent.files.iter().map(|f| f.original.key.as_str()).collect();
    assert_eq!(
        originals,
        vec![
            format!("Artworks/Original/{}.png", base),
            format!("Artworks/Original/{}.jpg", base + 1),
            format!("Artworks/Original/{}.webp", base + 2),
        ]
    );

    // One original plus three client-made derivatives per file
    assert_eq!(h.signer.calls.load(Ordering::SeqCst), 12);
    for ticket in &intent.files {
        assert!(ticket.original.url.starts_with("http://localhost:3000/uploads/Artworks/Original/"));
        let variants: Vec<Option<DerivativeVariant>> =
            ticket.derivatives.iter().map(|d| d.variant).collect();
        assert_eq!(
            variants,
            vec![
                Some(DerivativeVariant::Small),
                Some(DerivativeVariant::Medium),
                Some(DerivativeVariant::Large)
            ]
        );
    }
}

#[tokio::test]
async fn caller_metadata_is_attached_to_originals_only() {
    let h = harness();
    let intent = h
        .uploads
        .issue_upload_intent(
            Namespace::Artworks,
            UploadIntentRequest {
                files: vec![descriptor("work.png", "image/png")],
                metadata: BTreeMap::from([
                    ("Title".to_string(), "Dusk".to_string()),
                    ("year".to_string(), "2024".to_string()),
                ]),
            },
        )
        .await
        .unwrap();

    let ticket = &intent.files[0];
    let headers = &ticket.original.headers;
    assert_eq!(headers["Content-Type"], "image/png");
    assert_eq!(headers["x-amz-meta-title"], "Dusk");
    assert_eq!(headers["x-amz-meta-year"], "2024");
    assert!(intent.pending_metadata.is_empty());

    for derivative in &ticket.derivatives {
        assert_eq!(derivative.headers.len(), 1);
        assert_eq!(derivative.headers["Content-Type"], "image/jpeg");
        assert!(derivative.key.as_str().ends_with(".jpg"));
    }
}

#[tokio::test]
async fn s3_presigned_intent_carries_metadata_out_of_band() {
    let s3 = create_s3_store(&S3Config {
        bucket: "portfolio".to_string(),
        region: "us-east-1".to_string(),
        access_key: Some("key".to_string()),
        secret_key: Some("secret".to_string()),
        endpoint: None,
    })
    .unwrap();
    let store: Arc<dyn ObjectStore> = Arc::new(ApacheObjectStoreAdapter::new(Arc::new(InMemory::new())));
    let generator = Arc::new(ImageDerivativeGenerator::new(BlockingPool::new(1)));
    let uploads = UploadServiceImpl::new(
        Arc::new(ObjectStoreUploadSigner::new(s3)),
        AssetPipeline::new(store, generator),
    );

    let intent = uploads
        .issue_upload_intent(
            Namespace::Artworks,
            UploadIntentRequest {
                files: vec![descriptor("work.png", "image/png")],
                metadata: BTreeMap::from([
                    ("Title".to_string(), "Dusk".to_string()),
                    ("year".to_string(), "2024".to_string()),
                ]),
            },
        )
        .await
        .unwrap();

    let original = &intent.files[0].original;
    assert_eq!(original.headers.len(), 1);
    assert_eq!(original.headers["Content-Type"], "image/png");
    assert!(original.url.contains("X-Amz-SignedHeaders=host"));
    assert_eq!(intent.pending_metadata["title"], "Dusk");
    assert_eq!(intent.pending_metadata["year"], "2024");
}

#[tokio::test]
async fn server_generated_namespaces_get_no_derivative_urls() {
    let h = harness();
    let intent = h
        .uploads
        .issue_upload_intent(
            Namespace::Exhibitions,
            UploadIntentRequest {
                files: vec![descriptor("opening.jpg", "image/jpeg")],
                metadata: BTreeMap::new(),
            },
        )
        .await
        .unwrap();
    assert!(intent.files[0].derivatives.is_empty());
    assert_eq!(h.signer.calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn invalid_batches_fail_before_signing() {
    let h = harness();

    let err = h
        .uploads
        .issue_upload_intent(
            Namespace::Artworks,
            UploadIntentRequest {
                files: vec![
                    descriptor("a.png", "image/png"),
                    descriptor("b.gif", "image/gif"),
                ],
                metadata: BTreeMap::new(),
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        CatalogError::Validation(ValidationError::UnsupportedContentType { .. })
    ));

    let err = h
        .uploads
        .issue_upload_intent(Namespace::Texts, UploadIntentRequest::default())
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        CatalogError::Validation(ValidationError::EmptyUploadBatch)
    ));

    let err = h
        .uploads
        .issue_upload_intent(
            Namespace::Contact,
            UploadIntentRequest {
                files: vec![descriptor("me.png", "image/png")],
                metadata: BTreeMap::new(),
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        CatalogError::Validation(ValidationError::UploadsNotSupported(Namespace::Contact))
    ));

    assert_eq!(h.signer.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn server_upload_stores_original_with_metadata_and_thumbnail() {
    let h = harness();
    let batch = h
        .uploads
        .upload_batch(
            Namespace::Cv,
            vec![UploadedFile {
                file_name: "poster.png".to_string(),
                content_type: "image/png".to_string(),
                data: png(1600, 2262),
            }],
            BTreeMap::from([("caption".to_string(), "Solo show".to_string())]),
        )
        .await
        .unwrap();

    let stored = &batch.files[0];
    assert_eq!(batch.record_id, stored.id.to_string());
    assert_eq!(stored.derivatives.len(), 1);

    let original = h
        .raw
        .get(&Path::from(stored.original.storage_key.as_str()))
        .await
        .unwrap();
    let caption = original
        .attributes
        .get(&Attribute::Metadata("caption".into()))
        .map(|v| v.to_string());
    assert_eq!(caption.as_deref(), Some("Solo show"));

    let thumbnail_key = &stored.derivatives[0].storage_key;
    let thumbnail = h.raw.get(&Path::from(thumbnail_key.as_str())).await.unwrap();
    assert!(thumbnail
        .attributes
        .get(&Attribute::Metadata("caption".into()))
        .is_none());

    let data = thumbnail.bytes().await.unwrap();
    let decoded = image::load_from_memory(&data).unwrap();
    assert!(decoded.width() <= 800 && decoded.height() <= 1131);
}

#[tokio::test]
async fn server_upload_renders_every_artwork_variant() {
    let h = harness();
    let batch = h
        .uploads
        .upload_batch(
            Namespace::Artworks,
            vec![
                UploadedFile {
                    file_name: "one.png".to_string(),
                    content_type: "image/png".to_string(),
                    data: png(400, 300),
                },
                UploadedFile {
                    file_name: "two.png".to_string(),
                    content_type: "image/png".to_string(),
                    data: png(300, 400),
                },
            ],
            BTreeMap::new(),
        )
        .await
        .unwrap();

    assert_eq!(batch.files.len(), 2);
    assert_eq!(batch.files[1].id, batch.files[0].id + 1);
    for upload in &batch.files {
        for reference in upload.references() {
            assert!(h.store.object_exists(&reference.storage_key).await.unwrap());
        }
        assert_eq!(upload.derivatives.len(), 3);
    }
}

#[tokio::test]
async fn undecodable_upload_stores_nothing() {
    let h = harness();
    let err = h
        .uploads
        .upload_batch(
            Namespace::Exhibitions,
            vec![UploadedFile {
                file_name: "broken.png".to_string(),
                content_type: "image/png".to_string(),
                data: Bytes::from_static(b"not really a png"),
            }],
            BTreeMap::new(),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, CatalogError::Image(ImageError::Decode(_))));

    let listed: Vec<_> = h.raw.list(None).try_collect().await.unwrap();
    assert!(listed.is_empty());
}

#[tokio::test]
async fn pdf_uploads_have_no_derivatives() {
    let h = harness();
    let batch = h
        .uploads
        .upload_batch(
            Namespace::Texts,
            vec![UploadedFile {
                file_name: "essay.pdf".to_string(),
                content_type: "application/pdf".to_string(),
                data: Bytes::from_static(b"%PDF-1.7"),
            }],
            BTreeMap::new(),
        )
        .await
        .unwrap();

    let upload = &batch.files[0];
    assert!(upload.derivatives.is_empty());
    assert!(upload.original.storage_key.as_str().ends_with(".pdf"));
    let stored = h.store.get_object(&upload.original.storage_key).await.unwrap();
    assert_eq!(stored.content_type.as_deref(), Some("application/pdf"));
}
