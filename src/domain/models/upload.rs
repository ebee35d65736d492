use bytes::Bytes;
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;

use crate::domain::{
    models::{AssetReference, DerivativeVariant, RecordFields},
    value_objects::{Namespace, ObjectKey},
};

/// A file the client intends to upload
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileDescriptor {
    pub file_name: String,
    pub mime_type: String,
}

/// Request for direct-upload URLs
#[derive(Debug, Clone, Default)]
pub struct UploadIntentRequest {
    pub files: Vec<FileDescriptor>,
    /// Caller fields stored as object metadata on originals only
    pub metadata: BTreeMap<String, String>,
}

/// One key the client may write directly to storage
#[derive(Debug, Clone)]
pub struct SignedTarget {
    pub key: ObjectKey,
    pub url: String,
    /// Headers the client must send with the PUT
    pub headers: BTreeMap<String, String>,
    /// `None` for the original
    pub variant: Option<DerivativeVariant>,
}

#[derive(Debug, Clone)]
pub struct UploadTicket {
    pub file_name: String,
    pub id: u64,
    pub original: SignedTarget,
    pub derivatives: Vec<SignedTarget>,
}

/// Upload capabilities for a batch. Issuing one never creates a record.
#[derive(Debug, Clone)]
pub struct UploadIntent {
    pub namespace: Namespace,
    /// Id of the first file, to be echoed back on commit
    pub record_id: String,
    pub expires_at: DateTime<Utc>,
    pub files: Vec<UploadTicket>,
    /// Caller metadata the upload URLs cannot carry. Echoed back on commit, which writes
    /// it onto the originals. Empty when the original targets already send it as headers.
    pub pending_metadata: BTreeMap<String, String>,
}

/// A file received through the application tier
#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub file_name: String,
    pub content_type: String,
    pub data: Bytes,
}

#[derive(Debug, Clone)]
pub struct StoredUpload {
    pub id: u64,
    pub file_name: String,
    pub original: AssetReference,
    pub derivatives: Vec<AssetReference>,
}

impl StoredUpload {
    pub fn references(&self) -> impl Iterator<Item = &AssetReference> {
        std::iter::once(&self.original).chain(self.derivatives.iter())
    }
}

#[derive(Debug, Clone)]
pub struct UploadBatch {
    pub namespace: Namespace,
    pub record_id: String,
    pub files: Vec<StoredUpload>,
}

/// Commit of a record whose uploads have completed
#[derive(Debug, Clone, Default)]
pub struct CreateRecordRequest {
    /// Id handed out with the upload intent, for timestamp-id namespaces
    pub record_id: Option<String>,
    pub fields: RecordFields,
    /// Keys of confirmed original uploads, in display order
    pub assets: Vec<String>,
    /// Object metadata to write onto the originals before committing
    pub metadata: BTreeMap<String, String>,
}

/// Partial update; assets are replaced only when supplied
#[derive(Debug, Clone, Default)]
pub struct RecordPatch {
    pub fields: RecordFields,
    /// Original keys in display order. Derivative references are resolved again.
    pub assets: Option<Vec<String>>,
}

/// Outcome of best-effort object cleanup
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeletionReport {
    pub deleted: Vec<ObjectKey>,
    pub failed: Vec<ObjectKey>,
}

impl DeletionReport {
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }
}
