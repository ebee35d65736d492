use async_trait::async_trait;
use bon::Builder;
use bytes::Bytes;
use std::{collections::BTreeMap, time::Duration};

use crate::domain::{errors::StorageResult, value_objects::ObjectKey};

/// Port for object storage operations
/// This abstracts the actual storage backend (S3, in-memory, etc.)
#[async_trait]
pub trait ObjectStore: Send + Sync + 'static {
    /// Store object data, honouring the write precondition
    async fn put_object(
        &self,
        key: &ObjectKey,
        data: Bytes,
        options: PutObjectOptions,
    ) -> StorageResult<PutOutcome>;

    /// Retrieve object data together with its entity tag
    async fn get_object(&self, key: &ObjectKey) -> StorageResult<StoredObject>;

    /// Delete object data
    async fn delete_object(&self, key: &ObjectKey) -> StorageResult<()>;

    /// Check if object exists
    async fn object_exists(&self, key: &ObjectKey) -> StorageResult<bool>;
}

/// Port for handing out direct-to-storage write capabilities
#[async_trait]
pub trait UploadSigner: Send + Sync + 'static {
    /// URL that accepts one `PUT` of `key` until `expires_in` elapses
    async fn presign_put(&self, key: &ObjectKey, expires_in: Duration) -> StorageResult<String>;

    /// Whether a client `PUT` may send headers the URL was not signed with.
    /// SigV4 presigned URLs sign only `host`, and S3 rejects unsigned `x-amz-*` headers.
    fn accepts_unsigned_headers(&self) -> bool {
        true
    }
}

/// Condition a write must satisfy to be applied
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum WritePrecondition {
    /// Unconditional overwrite
    #[default]
    None,
    /// Fail if any object is stored under the key
    MustNotExist,
    /// Fail unless the stored object still carries this entity tag
    MatchETag(String),
}

#[derive(Debug, Clone, Default, Builder)]
pub struct PutObjectOptions {
    #[builder(into)]
    pub content_type: Option<String>,
    #[builder(into)]
    pub cache_control: Option<String>,
    /// User metadata, stored as `x-amz-meta-*` on S3
    #[builder(default)]
    pub metadata: BTreeMap<String, String>,
    #[builder(default)]
    pub precondition: WritePrecondition,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PutOutcome {
    pub e_tag: Option<String>,
    pub version: Option<String>,
}

#[derive(Debug, Clone)]
pub struct StoredObject {
    pub data: Bytes,
    pub e_tag: Option<String>,
    pub content_type: Option<String>,
}
