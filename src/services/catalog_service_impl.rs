use async_trait::async_trait;
use chrono::Utc;
use futures::future::try_join_all;
use std::{cmp::Reverse, sync::Arc};
use tracing::{info, instrument, warn};

use crate::{
    domain::{
        errors::{CatalogError, CatalogResult, ValidationError},
        models::{
            AssetReference, CollectionDocument, CreateRecordRequest, DeletionReport, Record,
            RecordPatch, VersionedDocument,
        },
        naming,
        ordering::{self, MoveDirection, MoveOutcome, OrdinalAssignment, ReorderReport},
        value_objects::{Namespace, ObjectKey},
    },
    ports::{repositories::DocumentRepository, services::CatalogService},
    services::AssetPipeline,
};

pub const DEFAULT_MAX_COMMIT_ATTEMPTS: usize = 3;

/// Record lifecycle over whole-namespace documents.
///
/// Every mutation reads the document, applies a closure and writes it back guarded by
/// the version it read. A lost race re-runs the closure against fresh state.
#[derive(Clone)]
pub struct CatalogServiceImpl {
    documents: Arc<dyn DocumentRepository>,
    pipeline: AssetPipeline,
    max_commit_attempts: usize,
}

impl CatalogServiceImpl {
    pub fn new(documents: Arc<dyn DocumentRepository>, pipeline: AssetPipeline) -> Self {
        Self {
            documents,
            pipeline,
            max_commit_attempts: DEFAULT_MAX_COMMIT_ATTEMPTS,
        }
    }

    pub fn with_max_commit_attempts(mut self, attempts: usize) -> Self {
        self.max_commit_attempts = attempts.max(1);
        self
    }

    async fn commit<T, F>(&self, namespace: Namespace, mut mutate: F) -> CatalogResult<T>
    where
        F: FnMut(&mut CollectionDocument) -> CatalogResult<T> + Send,
        T: Send,
    {
        let attempts = self.max_commit_attempts;
        for attempt in 1..=attempts {
            let VersionedDocument {
                mut document,
                version,
            } = self.documents.get(namespace).await?;

            let outcome = mutate(&mut document)?;

            match self.documents.put(namespace, &document, &version).await {
                Ok(_) => return Ok(outcome),
                Err(e) if e.is_conflict() => {
                    warn!(namespace = %namespace, attempt, "Document changed concurrently; retrying");
                }
                Err(e) => return Err(e.into()),
            }
        }

        Err(CatalogError::CommitConflict {
            namespace,
            attempts,
        })
    }

    /// Parse confirmed keys, rejecting anything that is not an original of this namespace
    fn parse_original_keys(namespace: Namespace, keys: &[String]) -> CatalogResult<Vec<ObjectKey>> {
        keys.iter()
            .map(|raw| {
                let key = ObjectKey::new(raw.trim())?;
                naming::ensure_in_namespace(namespace, &key)?;
                if !naming::is_original_key(namespace, &key) {
                    return Err(ValidationError::InvalidField {
                        field: "assets".to_string(),
                        value: raw.clone(),
                        expected: format!(
                            "a key under {}/{}/",
                            namespace.storage_prefix(),
                            naming::ORIGINAL_FOLDER
                        ),
                    }
                    .into());
                }
                Ok(key)
            })
            .collect()
    }

    fn check_required_assets(namespace: Namespace, originals: &[ObjectKey]) -> CatalogResult<()> {
        let (required, expected) = match namespace {
            Namespace::Artworks => (Some(1), "exactly one original image"),
            Namespace::Texts => (Some(1), "exactly one PDF"),
            Namespace::Contact if !originals.is_empty() => {
                return Err(ValidationError::UploadsNotSupported(namespace).into())
            }
            _ => (None, ""),
        };
        match required {
            Some(count) if originals.len() != count => {
                Err(ValidationError::MissingAsset {
                    namespace,
                    expected,
                }
                .into())
            }
            _ => Ok(()),
        }
    }

    /// References for every original, reusing families the record already holds
    async fn resolve_assets(
        &self,
        namespace: Namespace,
        originals: &[ObjectKey],
        existing: &[AssetReference],
    ) -> CatalogResult<Vec<AssetReference>> {
        let families = try_join_all(originals.iter().map(|key| async move {
            let held = existing
                .iter()
                .any(|r| r.role.is_original() && &r.storage_key == key);
            if held {
                Ok(existing
                    .iter()
                    .filter(|r| r.stem() == key.file_stem())
                    .cloned()
                    .collect())
            } else {
                self.pipeline.resolve_original(namespace, key).await
            }
        }))
        .await?;
        Ok(families.into_iter().flatten().collect())
    }

    fn record_not_found(namespace: Namespace, id: &str) -> CatalogError {
        CatalogError::RecordNotFound {
            namespace,
            id: id.to_string(),
        }
    }

    fn ensure_ordered(namespace: Namespace) -> CatalogResult<()> {
        if namespace.is_ordered() {
            Ok(())
        } else {
            Err(ValidationError::OrderingNotSupported(namespace).into())
        }
    }

    fn ensure_gallery(namespace: Namespace) -> CatalogResult<()> {
        if namespace.is_gallery() {
            Ok(())
        } else {
            Err(ValidationError::GalleryNotSupported(namespace).into())
        }
    }
}

#[async_trait]
impl CatalogService for CatalogServiceImpl {
    #[instrument(skip(self))]
    async fn list(&self, namespace: Namespace) -> CatalogResult<Vec<Record>> {
        let loaded = self.documents.get(namespace).await?;
        let mut records: Vec<Record> = loaded.document.records().into_iter().cloned().collect();

        if namespace.is_ordered() {
            records.sort_by_key(|record| match record {
                Record::Artwork(artwork) => (Reverse(artwork.year), artwork.number),
                _ => (Reverse(i32::MIN), u32::MAX),
            });
        }
        Ok(records)
    }

    #[instrument(skip(self))]
    async fn get(&self, namespace: Namespace, id: &str) -> CatalogResult<Record> {
        let loaded = self.documents.get(namespace).await?;
        loaded
            .document
            .get(id)
            .cloned()
            .ok_or_else(|| Self::record_not_found(namespace, id))
    }

    #[instrument(skip(self, request))]
    async fn create(
        &self,
        namespace: Namespace,
        request: CreateRecordRequest,
    ) -> CatalogResult<Record> {
        let CreateRecordRequest {
            record_id,
            fields,
            assets,
            metadata,
        } = request;

        fields.validate_for_create(namespace)?;
        let originals = Self::parse_original_keys(namespace, &assets)?;
        Self::check_required_assets(namespace, &originals)?;
        let id = namespace
            .id_strategy()
            .derive(record_id.as_deref(), &fields, naming::now_millis())?;

        // Fail before rendering any derivatives. The commit below re-checks.
        if self.documents.get(namespace).await?.document.contains(&id) {
            return Err(CatalogError::RecordAlreadyExists { namespace, id });
        }

        let references = self.resolve_assets(namespace, &originals, &[]).await?;
        let record = Record::from_fields(namespace, id, &fields, references, Utc::now())?;
        self.pipeline.apply_metadata(&originals, &metadata).await?;

        let record = self
            .commit(namespace, |document| {
                let mut record = record.clone();
                if let Record::Artwork(artwork) = &mut record {
                    artwork.number =
                        ordering::append_ordinal(&mut document.artworks_mut(), artwork.year);
                }
                document
                    .insert(record.clone())
                    .map_err(|existing| CatalogError::RecordAlreadyExists {
                        namespace,
                        id: existing.id().to_string(),
                    })?;
                Ok(record)
            })
            .await?;

        info!(namespace = %namespace, id = %record.id(), assets = record.assets().len(), "Record created");
        Ok(record)
    }

    #[instrument(skip(self, patch))]
    async fn update(
        &self,
        namespace: Namespace,
        id: &str,
        patch: RecordPatch,
    ) -> CatalogResult<Record> {
        let RecordPatch { fields, assets } = patch;
        fields.validate_applicable(namespace)?;

        let assets = match assets {
            Some(keys) => {
                let originals = Self::parse_original_keys(namespace, &keys)?;
                Self::check_required_assets(namespace, &originals)?;
                let current = self.get(namespace, id).await?;
                Some(
                    self.resolve_assets(namespace, &originals, current.assets())
                        .await?,
                )
            }
            None => None,
        };

        let now = Utc::now();
        let record = self
            .commit(namespace, |document| {
                let years = {
                    let record = document
                        .get_mut(id)
                        .ok_or_else(|| Self::record_not_found(namespace, id))?;
                    let before = record.as_artwork().map(|a| a.year);
                    record.apply_patch(&fields, now)?;
                    if let (Some(assets), Some(slot)) = (&assets, record.assets_mut()) {
                        *slot = assets.clone();
                    }
                    before.zip(record.as_artwork().map(|a| a.year))
                };

                // A new year puts the artwork last in that year
                if let Some((old_year, new_year)) = years.filter(|(old, new)| old != new) {
                    let mut artworks = document.artworks_mut();
                    if let Some(moved) = artworks.iter_mut().find(|a| a.id == id) {
                        moved.number = u32::MAX;
                    }
                    ordering::normalize_partition(&mut artworks, new_year);
                    ordering::normalize_partition(&mut artworks, old_year);
                }

                document
                    .get(id)
                    .cloned()
                    .ok_or_else(|| Self::record_not_found(namespace, id))
            })
            .await?;

        info!(namespace = %namespace, id = %id, "Record updated");
        Ok(record)
    }

    #[instrument(skip(self))]
    async fn delete(&self, namespace: Namespace, id: &str) -> CatalogResult<DeletionReport> {
        let removed = self
            .commit(namespace, |document| {
                document
                    .remove(id)
                    .ok_or_else(|| Self::record_not_found(namespace, id))
            })
            .await?;

        let keys = AssetPipeline::cleanup_keys(namespace, removed.assets());
        let report = self.pipeline.delete_best_effort(keys).await;

        if !report.is_complete() {
            warn!(
                namespace = %namespace,
                id = %id,
                failed = report.failed.len(),
                "Record deleted with orphaned assets"
            );
        }
        info!(namespace = %namespace, id = %id, deleted = report.deleted.len(), "Record deleted");
        Ok(report)
    }

    #[instrument(skip(self))]
    async fn move_record(
        &self,
        namespace: Namespace,
        id: &str,
        direction: MoveDirection,
    ) -> CatalogResult<MoveOutcome> {
        Self::ensure_ordered(namespace)?;

        self.commit(namespace, |document| {
            ordering::swap_move(&mut document.artworks_mut(), id, direction)
                .map_err(|_| Self::record_not_found(namespace, id))
        })
        .await
    }

    #[instrument(skip(self, assignments), fields(count = assignments.len()))]
    async fn reorder_records(
        &self,
        namespace: Namespace,
        assignments: Vec<OrdinalAssignment>,
    ) -> CatalogResult<ReorderReport> {
        Self::ensure_ordered(namespace)?;

        let report = self
            .commit(namespace, |document| {
                Ok(ordering::bulk_reorder(
                    &mut document.artworks_mut(),
                    &assignments,
                ))
            })
            .await?;

        if !report.ignored.is_empty() {
            warn!(namespace = %namespace, ignored = ?report.ignored, "Reorder named unknown records");
        }
        Ok(report)
    }

    #[instrument(skip(self))]
    async fn add_asset(&self, namespace: Namespace, id: &str, key: &str) -> CatalogResult<Record> {
        Self::ensure_gallery(namespace)?;
        let originals = Self::parse_original_keys(namespace, &[key.to_string()])?;

        let current = self.get(namespace, id).await?;
        let references = self
            .resolve_assets(namespace, &originals, current.assets())
            .await?;

        let now = Utc::now();
        self.commit(namespace, |document| {
            let record = document
                .get_mut(id)
                .ok_or_else(|| Self::record_not_found(namespace, id))?;
            if let Some(assets) = record.assets_mut() {
                for reference in &references {
                    if !assets.contains(reference) {
                        assets.push(reference.clone());
                    }
                }
            }
            record.touch(now);
            Ok(record.clone())
        })
        .await
    }

    #[instrument(skip(self))]
    async fn remove_asset(
        &self,
        namespace: Namespace,
        id: &str,
        reference: &str,
    ) -> CatalogResult<Record> {
        Self::ensure_gallery(namespace)?;
        let not_found = || CatalogError::AssetNotFound {
            id: id.to_string(),
            reference: reference.to_string(),
        };
        let stem = naming::reference_stem(reference).ok_or_else(not_found)?;

        let now = Utc::now();
        let (record, removed) = self
            .commit(namespace, |document| {
                let record = document
                    .get_mut(id)
                    .ok_or_else(|| Self::record_not_found(namespace, id))?;
                let assets = record.assets_mut().ok_or_else(not_found)?;

                let (removed, kept): (Vec<AssetReference>, Vec<AssetReference>) =
                    assets.drain(..).partition(|r| r.stem() == stem);
                *assets = kept;
                if removed.is_empty() {
                    return Err(not_found());
                }

                record.touch(now);
                Ok((record.clone(), removed))
            })
            .await?;

        let report = self
            .pipeline
            .delete_best_effort(AssetPipeline::cleanup_keys(namespace, &removed))
            .await;
        info!(
            namespace = %namespace,
            id = %id,
            stem = %stem,
            deleted = report.deleted.len(),
            failed = report.failed.len(),
            "Asset removed"
        );
        Ok(record)
    }
}
