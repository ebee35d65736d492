use async_trait::async_trait;
use std::collections::BTreeMap;

use crate::domain::{
    errors::CatalogResult,
    models::{UploadBatch, UploadIntent, UploadIntentRequest, UploadedFile},
    value_objects::Namespace,
};

/// Port for getting binaries into storage
#[async_trait]
pub trait UploadService: Send + Sync + 'static {
    /// Signed direct-upload targets for a batch. Never creates a record.
    async fn issue_upload_intent(
        &self,
        namespace: Namespace,
        request: UploadIntentRequest,
    ) -> CatalogResult<UploadIntent>;

    /// Store files received through the application tier, with their derivatives
    async fn upload_batch(
        &self,
        namespace: Namespace,
        files: Vec<UploadedFile>,
        metadata: BTreeMap<String, String>,
    ) -> CatalogResult<UploadBatch>;
}
