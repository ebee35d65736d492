use bytes::Bytes;
use futures::future::{join_all, try_join, try_join_all};
use std::{
    collections::{BTreeMap, BTreeSet},
    sync::Arc,
};
use tracing::{debug, warn};

use crate::{
    domain::{
        errors::{CatalogError, CatalogResult, StorageError},
        models::{
            AssetReference, AssetRole, DeletionReport, Derivative, DerivativeMode, DerivativeVariant,
            StoredUpload, UploadedFile, DERIVATIVE_CONTENT_TYPE,
        },
        naming,
        value_objects::{Namespace, ObjectKey},
    },
    ports::{
        imaging::DerivativeGenerator,
        storage::{ObjectStore, PutObjectOptions},
    },
};

/// Fan-out helpers shared by the upload and catalog services: storing originals,
/// producing and storing derivatives, and best-effort cleanup.
#[derive(Clone)]
pub struct AssetPipeline {
    store: Arc<dyn ObjectStore>,
    generator: Arc<dyn DerivativeGenerator>,
}

impl AssetPipeline {
    pub fn new(store: Arc<dyn ObjectStore>, generator: Arc<dyn DerivativeGenerator>) -> Self {
        Self { store, generator }
    }

    pub fn store(&self) -> &Arc<dyn ObjectStore> {
        &self.store
    }

    /// Fails with [`CatalogError::AssetNotUploaded`] when nothing is stored under `key`
    pub async fn ensure_uploaded(&self, key: &ObjectKey) -> CatalogResult<()> {
        if self.store.object_exists(key).await? {
            Ok(())
        } else {
            Err(CatalogError::AssetNotUploaded { key: key.clone() })
        }
    }

    /// Store one file received through the application tier.
    ///
    /// Every derivative of the namespace plan is rendered before anything is written, so
    /// an undecodable image leaves no objects behind. The original and its derivatives
    /// are then written concurrently.
    pub async fn store_upload(
        &self,
        namespace: Namespace,
        id: u64,
        file: UploadedFile,
        metadata: &BTreeMap<String, String>,
    ) -> CatalogResult<StoredUpload> {
        let stem = id.to_string();
        let original_key =
            naming::original_key(namespace, &stem, &file.file_name, &file.content_type)?;

        let derivatives = match namespace.derivative_plan() {
            Some(plan) => {
                self.generator
                    .generate(file.data.clone(), plan.specs.to_vec())
                    .await?
            }
            None => Vec::new(),
        };

        let options = PutObjectOptions::builder()
            .content_type(file.content_type.clone())
            .metadata(object_metadata(metadata))
            .build();

        let put_original = async {
            self.store
                .put_object(&original_key, file.data, options)
                .await
                .map_err(CatalogError::from)
        };
        let (_, derivatives) = try_join(
            put_original,
            self.put_derivatives(namespace, &stem, derivatives),
        )
        .await?;

        debug!(namespace = %namespace, key = %original_key, derivatives = derivatives.len(), "Stored upload");

        Ok(StoredUpload {
            id,
            file_name: file.file_name,
            original: AssetReference::new(namespace.original_role(), original_key, file.content_type),
            derivatives,
        })
    }

    /// References for a confirmed original: the original itself plus its derivative family.
    ///
    /// Client-uploaded derivatives must already exist under their convention keys.
    /// Server-generated ones are reused when all of them exist and rendered otherwise.
    pub async fn resolve_original(
        &self,
        namespace: Namespace,
        original: &ObjectKey,
    ) -> CatalogResult<Vec<AssetReference>> {
        self.ensure_uploaded(original).await?;

        let content_type = naming::mime_for_extension(original.extension().unwrap_or_default());
        let mut references = vec![AssetReference::new(
            namespace.original_role(),
            original.clone(),
            content_type,
        )];

        let Some(plan) = namespace.derivative_plan() else {
            return Ok(references);
        };
        let expected = naming::derivative_keys_for(namespace, original);

        match plan.mode {
            DerivativeMode::ClientUploaded => {
                try_join_all(expected.iter().map(|(_, key)| self.ensure_uploaded(key))).await?;
                references.extend(derivative_references(expected));
            }
            DerivativeMode::ServerGenerated => {
                let present = try_join_all(
                    expected
                        .iter()
                        .map(|(_, key)| self.store.object_exists(key)),
                )
                .await?;

                if present.iter().all(|exists| *exists) {
                    references.extend(derivative_references(expected));
                } else {
                    let data = self.read_original(original).await?;
                    let derivatives = self.generator.generate(data, plan.specs.to_vec()).await?;
                    references.extend(
                        self.put_derivatives(namespace, original.file_stem(), derivatives)
                            .await?,
                    );
                }
            }
        }

        Ok(references)
    }

    /// Rewrite confirmed originals with caller metadata, keeping their content type.
    /// Used when the upload URLs could not carry `x-amz-meta-*` headers.
    pub async fn apply_metadata(
        &self,
        originals: &[ObjectKey],
        metadata: &BTreeMap<String, String>,
    ) -> CatalogResult<()> {
        let metadata = object_metadata(metadata);
        if metadata.is_empty() {
            return Ok(());
        }

        try_join_all(originals.iter().map(|key| {
            let metadata = metadata.clone();
            async move {
                let stored = self.store.get_object(key).await?;
                let options = PutObjectOptions::builder()
                    .maybe_content_type(stored.content_type)
                    .metadata(metadata)
                    .build();
                self.store.put_object(key, stored.data, options).await?;
                debug!(key = %key, "Applied caller metadata");
                Ok::<_, CatalogError>(())
            }
        }))
        .await?;
        Ok(())
    }

    /// Delete every key, continuing past failures. Keys that are already gone count as deleted.
    pub async fn delete_best_effort(&self, keys: impl IntoIterator<Item = ObjectKey>) -> DeletionReport {
        let keys: BTreeSet<ObjectKey> = keys.into_iter().collect();

        let results = join_all(keys.into_iter().map(|key| async move {
            let result = self.store.delete_object(&key).await;
            (key, result)
        }))
        .await;

        let mut report = DeletionReport::default();
        for (key, result) in results {
            match result {
                Ok(()) | Err(StorageError::ObjectNotFound { .. }) => report.deleted.push(key),
                Err(e) => {
                    warn!(key = %key, error = %e, "Failed to delete asset; object left orphaned");
                    report.failed.push(key);
                }
            }
        }
        report
    }

    /// Stored keys of the references plus every convention derivative of their originals
    pub fn cleanup_keys<'a>(
        namespace: Namespace,
        references: impl IntoIterator<Item = &'a AssetReference>,
    ) -> Vec<ObjectKey> {
        let mut keys = Vec::new();
        for reference in references {
            keys.push(reference.storage_key.clone());
            if reference.role.is_original() {
                keys.extend(
                    naming::derivative_keys_for(namespace, &reference.storage_key)
                        .into_iter()
                        .map(|(_, key)| key),
                );
            }
        }
        keys
    }

    async fn read_original(&self, key: &ObjectKey) -> CatalogResult<Bytes> {
        match self.store.get_object(key).await {
            Ok(stored) => Ok(stored.data),
            Err(StorageError::ObjectNotFound { .. }) => {
                Err(CatalogError::AssetNotUploaded { key: key.clone() })
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn put_derivatives(
        &self,
        namespace: Namespace,
        stem: &str,
        derivatives: Vec<Derivative>,
    ) -> CatalogResult<Vec<AssetReference>> {
        let puts = derivatives.into_iter().map(|derivative| async move {
            let key = naming::derivative_key(namespace, derivative.variant, stem)?;
            let options = PutObjectOptions::builder()
                .content_type(DERIVATIVE_CONTENT_TYPE)
                .build();
            self.store.put_object(&key, derivative.data, options).await?;
            Ok::<_, CatalogError>(AssetReference::new(
                AssetRole::for_variant(derivative.variant),
                key,
                DERIVATIVE_CONTENT_TYPE,
            ))
        });
        try_join_all(puts).await
    }
}

fn derivative_references(
    keys: Vec<(DerivativeVariant, ObjectKey)>,
) -> impl Iterator<Item = AssetReference> {
    keys.into_iter().map(|(variant, key)| {
        AssetReference::new(AssetRole::for_variant(variant), key, DERIVATIVE_CONTENT_TYPE)
    })
}

/// Caller fields as object metadata names. Fields that sanitize to nothing are dropped.
pub fn object_metadata(fields: &BTreeMap<String, String>) -> BTreeMap<String, String> {
    fields
        .iter()
        .filter_map(|(field, value)| naming::metadata_name(field).map(|name| (name, value.clone())))
        .collect()
}
