use async_trait::async_trait;
use bytes::Bytes;
use std::sync::Arc;
use tracing::debug;

use crate::{
    adapters::outbound::storage::StoreError,
    domain::{
        errors::{StorageError, StorageResult},
        models::{CollectionDocument, DocumentVersion, VersionedDocument},
        value_objects::{Namespace, ObjectKey},
    },
    ports::{
        repositories::DocumentRepository,
        storage::{ObjectStore, PutObjectOptions, WritePrecondition},
    },
};

const DOCUMENT_PREFIX: &str = "Metadata";
const DOCUMENT_CONTENT_TYPE: &str = "application/json";
const DOCUMENT_CACHE_CONTROL: &str = "no-cache, no-store, must-revalidate";

/// `Metadata/<namespace>.json`
pub fn document_key(namespace: Namespace) -> StorageResult<ObjectKey> {
    ObjectKey::new(format!("{}/{}.json", DOCUMENT_PREFIX, namespace.as_str())).map_err(|e| {
        StorageError::ValidationError {
            message: e.to_string(),
        }
    })
}

/// Collection documents kept as JSON objects next to the assets they describe.
/// Entity tags serve as version tokens.
#[derive(Clone)]
pub struct ObjectStoreDocumentRepository {
    store: Arc<dyn ObjectStore>,
}

impl ObjectStoreDocumentRepository {
    pub fn new(store: Arc<dyn ObjectStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl DocumentRepository for ObjectStoreDocumentRepository {
    async fn get(&self, namespace: Namespace) -> StorageResult<VersionedDocument> {
        let key = document_key(namespace)?;

        let stored = match self.store.get_object(&key).await {
            Ok(stored) => stored,
            Err(StorageError::ObjectNotFound { .. }) => {
                debug!(namespace = %namespace, "No document stored yet");
                return Ok(VersionedDocument {
                    document: CollectionDocument::empty(namespace.layout()),
                    version: DocumentVersion::Absent,
                });
            }
            Err(e) => return Err(e),
        };

        let document: CollectionDocument =
            serde_json::from_slice(&stored.data).map_err(|e| StorageError::CorruptDocument {
                key: key.clone(),
                reason: e.to_string(),
            })?;

        if document.layout() != namespace.layout() {
            return Err(StorageError::CorruptDocument {
                key,
                reason: format!(
                    "expected a {:?} document, found {:?}",
                    namespace.layout(),
                    document.layout()
                ),
            });
        }

        // Without an entity tag the write could not be guarded
        let version = stored
            .e_tag
            .map(DocumentVersion::Tagged)
            .ok_or_else(|| StorageError::UnsupportedOperation {
                operation: "conditional_put".to_string(),
                reason: format!("store returned no entity tag for {}", key),
            })?;

        Ok(VersionedDocument { document, version })
    }

    async fn put(
        &self,
        namespace: Namespace,
        document: &CollectionDocument,
        expected: &DocumentVersion,
    ) -> StorageResult<DocumentVersion> {
        let key = document_key(namespace)?;
        let body = serde_json::to_vec_pretty(document)
            .map_err(|e| StorageError::from(StoreError::Serialization(e)))?;

        let precondition = match expected {
            DocumentVersion::Absent => WritePrecondition::MustNotExist,
            DocumentVersion::Tagged(e_tag) => WritePrecondition::MatchETag(e_tag.clone()),
        };
        let options = PutObjectOptions::builder()
            .content_type(DOCUMENT_CONTENT_TYPE)
            .cache_control(DOCUMENT_CACHE_CONTROL)
            .precondition(precondition)
            .build();

        let outcome = self
            .store
            .put_object(&key, Bytes::from(body), options)
            .await?;

        debug!(namespace = %namespace, records = document.len(), "Document written");

        outcome
            .e_tag
            .map(DocumentVersion::Tagged)
            .ok_or_else(|| StorageError::UnsupportedOperation {
                operation: "conditional_put".to_string(),
                reason: format!("store returned no entity tag for {}", key),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        adapters::outbound::storage::ApacheObjectStoreAdapter,
        domain::models::{Record, RecordFields},
    };
    use chrono::Utc;
    use object_store::memory::InMemory;

    fn repository() -> (ObjectStoreDocumentRepository, Arc<dyn ObjectStore>) {
        let store: Arc<dyn ObjectStore> =
            Arc::new(ApacheObjectStoreAdapter::new(Arc::new(InMemory::new())));
        (ObjectStoreDocumentRepository::new(store.clone()), store)
    }

    fn exhibition() -> Record {
        let fields = RecordFields {
            title: Some("Night Garden".to_string()),
            start_date: chrono::NaiveDate::from_ymd_opt(2024, 3, 1),
            end_date: chrono::NaiveDate::from_ymd_opt(2024, 4, 1),
            location: Some("Kunsthall".to_string()),
            ..Default::default()
        };
        Record::from_fields(
            Namespace::Exhibitions,
            "night-garden".to_string(),
            &fields,
            Vec::new(),
            Utc::now(),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn missing_document_reads_as_empty() {
        let (repo, _) = repository();
        let loaded = repo.get(Namespace::Artworks).await.unwrap();
        assert_eq!(loaded.version, DocumentVersion::Absent);
        assert!(loaded.document.is_empty());
        assert_eq!(loaded.document.layout(), Namespace::Artworks.layout());
    }

    #[tokio::test]
    async fn put_then_get_round_trips() {
        let (repo, store) = repository();
        let mut document = CollectionDocument::empty(Namespace::Exhibitions.layout());
        document.insert(exhibition()).unwrap();

        let version = repo
            .put(Namespace::Exhibitions, &document, &DocumentVersion::Absent)
            .await
            .unwrap();

        let loaded = repo.get(Namespace::Exhibitions).await.unwrap();
        assert_eq!(loaded.document, document);
        assert_eq!(loaded.version, version);

        let raw = store
            .get_object(&document_key(Namespace::Exhibitions).unwrap())
            .await
            .unwrap();
        assert_eq!(raw.content_type.as_deref(), Some(DOCUMENT_CONTENT_TYPE));
    }

    #[tokio::test]
    async fn stale_version_is_rejected() {
        let (repo, _) = repository();
        let empty = CollectionDocument::empty(Namespace::Exhibitions.layout());
        let first = repo
            .put(Namespace::Exhibitions, &empty, &DocumentVersion::Absent)
            .await
            .unwrap();

        let mut document = empty.clone();
        document.insert(exhibition()).unwrap();
        repo.put(Namespace::Exhibitions, &document, &first)
            .await
            .unwrap();

        // A second writer still holding `first` must lose
        let err = repo
            .put(Namespace::Exhibitions, &empty, &first)
            .await
            .unwrap_err();
        assert!(err.is_conflict());

        // So must a writer that believes nothing is stored yet
        let err = repo
            .put(Namespace::Exhibitions, &empty, &DocumentVersion::Absent)
            .await
            .unwrap_err();
        assert!(err.is_conflict());

        assert_eq!(repo.get(Namespace::Exhibitions).await.unwrap().document, document);
    }

    #[tokio::test]
    async fn unreadable_document_is_an_error() {
        let (repo, store) = repository();
        store
            .put_object(
                &document_key(Namespace::Texts).unwrap(),
                Bytes::from_static(b"not json"),
                PutObjectOptions::default(),
            )
            .await
            .unwrap();

        assert!(matches!(
            repo.get(Namespace::Texts).await,
            Err(StorageError::CorruptDocument { .. })
        ));
    }
}
