use async_trait::async_trait;

use crate::domain::{
    errors::StorageResult,
    models::{CollectionDocument, DocumentVersion, VersionedDocument},
    value_objects::Namespace,
};

/// Repository for the per-namespace metadata documents.
/// A document is always read and written as a whole.
#[async_trait]
pub trait DocumentRepository: Send + Sync + 'static {
    /// Load the namespace document. A missing document is an empty one at
    /// [`DocumentVersion::Absent`].
    async fn get(&self, namespace: Namespace) -> StorageResult<VersionedDocument>;

    /// Overwrite the document if it is still at `expected`.
    /// Returns the version of the stored write.
    async fn put(
        &self,
        namespace: Namespace,
        document: &CollectionDocument,
        expected: &DocumentVersion,
    ) -> StorageResult<DocumentVersion>;
}
