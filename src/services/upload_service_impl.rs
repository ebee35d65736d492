use async_trait::async_trait;
use chrono::Utc;
use futures::future::join_all;
use std::{collections::BTreeMap, sync::Arc, time::Duration};
use tracing::{info, instrument, warn};

use crate::{
    domain::{
        errors::{CatalogResult, ValidationError},
        models::{
            DerivativeMode, DerivativeVariant, SignedTarget, UploadBatch, UploadIntent,
            UploadIntentRequest, UploadTicket, UploadedFile, DERIVATIVE_CONTENT_TYPE,
        },
        naming,
        value_objects::{Namespace, ObjectKey},
    },
    ports::{services::UploadService, storage::UploadSigner},
    services::{object_metadata, AssetPipeline},
};

pub const DEFAULT_UPLOAD_URL_TTL: Duration = Duration::from_secs(300);

const CONTENT_TYPE_HEADER: &str = "Content-Type";

#[derive(Clone)]
pub struct UploadServiceImpl {
    signer: Arc<dyn UploadSigner>,
    pipeline: AssetPipeline,
    url_ttl: Duration,
}

impl UploadServiceImpl {
    pub fn new(signer: Arc<dyn UploadSigner>, pipeline: AssetPipeline) -> Self {
        Self {
            signer,
            pipeline,
            url_ttl: DEFAULT_UPLOAD_URL_TTL,
        }
    }

    pub fn with_url_ttl(mut self, ttl: Duration) -> Self {
        self.url_ttl = ttl;
        self
    }

    /// Checks shared by both upload paths; runs before any signing or storage I/O
    fn validate_batch<'a>(
        namespace: Namespace,
        content_types: impl ExactSizeIterator<Item = &'a str>,
    ) -> Result<(), ValidationError> {
        if namespace.accepted_content_types().is_empty() {
            return Err(ValidationError::UploadsNotSupported(namespace));
        }
        if content_types.len() == 0 {
            return Err(ValidationError::EmptyUploadBatch);
        }
        for content_type in content_types {
            if !namespace.accepts_content_type(content_type) {
                return Err(ValidationError::UnsupportedContentType {
                    namespace,
                    content_type: content_type.to_string(),
                });
            }
        }
        Ok(())
    }

    async fn sign(
        &self,
        key: ObjectKey,
        headers: BTreeMap<String, String>,
        variant: Option<DerivativeVariant>,
    ) -> CatalogResult<SignedTarget> {
        let url = self.signer.presign_put(&key, self.url_ttl).await?;
        Ok(SignedTarget {
            key,
            url,
            headers,
            variant,
        })
    }
}

#[async_trait]
impl UploadService for UploadServiceImpl {
    #[instrument(skip(self, request), fields(files = request.files.len()))]
    async fn issue_upload_intent(
        &self,
        namespace: Namespace,
        request: UploadIntentRequest,
    ) -> CatalogResult<UploadIntent> {
        Self::validate_batch(
            namespace,
            request.files.iter().map(|f| f.mime_type.as_str()),
        )?;

        let ids = naming::batch_ids(naming::now_millis(), request.files.len());
        let ttl = chrono::Duration::from_std(self.url_ttl).unwrap_or(chrono::Duration::minutes(5));
        let expires_at = Utc::now() + ttl;

        // Caller metadata travels with originals only. When the signer cannot cover
        // `x-amz-meta-*` headers it is handed back for the commit to apply instead.
        let (metadata_headers, pending_metadata) = if self.signer.accepts_unsigned_headers() {
            let headers: BTreeMap<String, String> = request
                .metadata
                .iter()
                .filter_map(|(field, value)| {
                    naming::metadata_header(field).map(|header| (header, value.clone()))
                })
                .collect();
            (headers, BTreeMap::new())
        } else {
            (BTreeMap::new(), object_metadata(&request.metadata))
        };
        let client_derivatives = namespace
            .derivative_plan()
            .filter(|plan| plan.mode == DerivativeMode::ClientUploaded);

        let mut files = Vec::with_capacity(request.files.len());
        for (file, id) in request.files.iter().zip(ids) {
            let stem = id.to_string();

            let original_key =
                naming::original_key(namespace, &stem, &file.file_name, &file.mime_type)?;
            let mut headers = metadata_headers.clone();
            headers.insert(CONTENT_TYPE_HEADER.to_string(), file.mime_type.clone());
            let original = self.sign(original_key, headers, None).await?;

            let mut derivatives = Vec::new();
            if let Some(plan) = client_derivatives {
                for spec in plan.specs {
                    let key = naming::derivative_key(namespace, spec.variant, &stem)?;
                    let headers = BTreeMap::from([(
                        CONTENT_TYPE_HEADER.to_string(),
                        DERIVATIVE_CONTENT_TYPE.to_string(),
                    )]);
                    derivatives.push(self.sign(key, headers, Some(spec.variant)).await?);
                }
            }

            files.push(UploadTicket {
                file_name: file.file_name.clone(),
                id,
                original,
                derivatives,
            });
        }

        let record_id = files
            .first()
            .map(|ticket| ticket.id.to_string())
            .unwrap_or_default();
        info!(namespace = %namespace, record_id = %record_id, files = files.len(), "Upload intent issued");

        Ok(UploadIntent {
            namespace,
            record_id,
            expires_at,
            files,
            pending_metadata,
        })
    }

    #[instrument(skip(self, files, metadata), fields(files = files.len()))]
    async fn upload_batch(
        &self,
        namespace: Namespace,
        files: Vec<UploadedFile>,
        metadata: BTreeMap<String, String>,
    ) -> CatalogResult<UploadBatch> {
        Self::validate_batch(namespace, files.iter().map(|f| f.content_type.as_str()))?;

        let ids = naming::batch_ids(naming::now_millis(), files.len());
        let record_id = ids.first().map(u64::to_string).unwrap_or_default();

        let results = join_all(
            files
                .into_iter()
                .zip(ids)
                .map(|(file, id)| self.pipeline.store_upload(namespace, id, file, &metadata)),
        )
        .await;

        let mut stored = Vec::with_capacity(results.len());
        let mut first_error = None;
        for result in results {
            match result {
                Ok(upload) => stored.push(upload),
                Err(e) => {
                    warn!(namespace = %namespace, error = %e, "File in upload batch failed");
                    first_error.get_or_insert(e);
                }
            }
        }

        if let Some(err) = first_error {
            for upload in &stored {
                for reference in upload.references() {
                    warn!(key = %reference.storage_key, "Orphaned by failed upload batch");
                }
            }
            return Err(err);
        }

        info!(namespace = %namespace, record_id = %record_id, files = stored.len(), "Upload batch stored");
        Ok(UploadBatch {
            namespace,
            record_id,
            files: stored,
        })
    }
}
