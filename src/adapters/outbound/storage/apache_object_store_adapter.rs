use async_trait::async_trait;
use bytes::Bytes;
use object_store::{
    path::Path as ObjectPath, Attribute, AttributeValue, Attributes, ObjectStore as ApacheObjectStore,
    PutMode, PutOptions, PutPayload, UpdateVersion,
};
use std::sync::Arc;

use crate::{
    domain::{
        errors::{StorageError, StorageResult},
        value_objects::ObjectKey,
    },
    ports::storage::{ObjectStore, PutObjectOptions, PutOutcome, StoredObject, WritePrecondition},
};

/// Adapter that implements our ObjectStore trait using Apache object_store
#[derive(Clone)]
pub struct ApacheObjectStoreAdapter {
    inner: Arc<dyn ApacheObjectStore>,
}

impl ApacheObjectStoreAdapter {
    pub fn new(store: Arc<dyn ApacheObjectStore>) -> Self {
        Self { inner: store }
    }

    fn put_options(options: PutObjectOptions) -> PutOptions {
        let mode = match options.precondition {
            WritePrecondition::None => PutMode::Overwrite,
            WritePrecondition::MustNotExist => PutMode::Create,
            WritePrecondition::MatchETag(e_tag) => PutMode::Update(UpdateVersion {
                e_tag: Some(e_tag),
                version: None,
            }),
        };

        let mut attributes = Attributes::new();
        if let Some(content_type) = options.content_type {
            attributes.insert(Attribute::ContentType, AttributeValue::from(content_type));
        }
        if let Some(cache_control) = options.cache_control {
            attributes.insert(Attribute::CacheControl, AttributeValue::from(cache_control));
        }
        for (name, value) in options.metadata {
            attributes.insert(Attribute::Metadata(name.into()), AttributeValue::from(value));
        }

        PutOptions {
            mode,
            attributes,
            ..Default::default()
        }
    }
}

#[async_trait]
impl ObjectStore for ApacheObjectStoreAdapter {
    async fn put_object(
        &self,
        key: &ObjectKey,
        data: Bytes,
        options: PutObjectOptions,
    ) -> StorageResult<PutOutcome> {
        let path = ObjectPath::from(key.as_str());
        let expected = match &options.precondition {
            WritePrecondition::MatchETag(e_tag) => Some(e_tag.clone()),
            _ => None,
        };

        let result = self
            .inner
            .put_opts(&path, PutPayload::from(data), Self::put_options(options))
            .await
            .map_err(|e| match StorageError::from(e) {
                StorageError::VersionConflict { .. } => StorageError::VersionConflict {
                    key: key.clone(),
                    expected_version: expected,
                },
                other => other,
            })?;

        Ok(PutOutcome {
            e_tag: result.e_tag,
            version: result.version,
        })
    }

    async fn get_object(&self, key: &ObjectKey) -> StorageResult<StoredObject> {
        let path = ObjectPath::from(key.as_str());

        let result = self.inner.get(&path).await.map_err(|e| match e {
            object_store::Error::NotFound { .. } => {
                StorageError::ObjectNotFound { key: key.clone() }
            }
            _ => StorageError::InfrastructureError {
                message: format!("Failed to get object: {}", e),
                source: Some(e.to_string()),
            },
        })?;

        let e_tag = result.meta.e_tag.clone();
        let content_type = result
            .attributes
            .get(&Attribute::ContentType)
            .map(|value| value.to_string());

        let data = result
            .bytes()
            .await
            .map_err(|e| StorageError::InfrastructureError {
                message: format!("Failed to read object bytes: {}", e),
                source: Some(e.to_string()),
            })?;

        Ok(StoredObject {
            data,
            e_tag,
            content_type,
        })
    }

    async fn delete_object(&self, key: &ObjectKey) -> StorageResult<()> {
        let path = ObjectPath::from(key.as_str());

        self.inner.delete(&path).await.map_err(|e| match e {
            object_store::Error::NotFound { .. } => {
                StorageError::ObjectNotFound { key: key.clone() }
            }
            _ => StorageError::InfrastructureError {
                message: format!("Failed to delete object: {}", e),
                source: Some(e.to_string()),
            },
        })?;

        Ok(())
    }

    async fn object_exists(&self, key: &ObjectKey) -> StorageResult<bool> {
        let path = ObjectPath::from(key.as_str());

        match self.inner.head(&path).await {
            Ok(_) => Ok(true),
            Err(object_store::Error::NotFound { .. }) => Ok(false),
            Err(e) => Err(StorageError::InfrastructureError {
                message: format!("Failed to check object existence: {}", e),
                source: Some(e.to_string()),
            }),
        }
    }
}
