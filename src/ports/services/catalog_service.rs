use async_trait::async_trait;

use crate::domain::{
    errors::CatalogResult,
    models::{CreateRecordRequest, DeletionReport, Record, RecordPatch},
    ordering::{MoveDirection, MoveOutcome, OrdinalAssignment, ReorderReport},
    value_objects::Namespace,
};

/// Port for record lifecycle operations
/// Every mutation is a read-modify-write of the whole namespace document
#[async_trait]
pub trait CatalogService: Send + Sync + 'static {
    /// Records of a namespace. Ordered namespaces come sorted by year (newest first), then number.
    async fn list(&self, namespace: Namespace) -> CatalogResult<Vec<Record>>;

    async fn get(&self, namespace: Namespace, id: &str) -> CatalogResult<Record>;

    /// Commit a record whose uploads have completed
    async fn create(
        &self,
        namespace: Namespace,
        request: CreateRecordRequest,
    ) -> CatalogResult<Record>;

    /// Merge supplied fields; assets are replaced only when supplied
    async fn update(
        &self,
        namespace: Namespace,
        id: &str,
        patch: RecordPatch,
    ) -> CatalogResult<Record>;

    /// Remove the record. Asset cleanup is best effort and reported, not fatal.
    async fn delete(&self, namespace: Namespace, id: &str) -> CatalogResult<DeletionReport>;

    /// Swap the record with its neighbour in the same year
    async fn move_record(
        &self,
        namespace: Namespace,
        id: &str,
        direction: MoveDirection,
    ) -> CatalogResult<MoveOutcome>;

    /// Apply explicit ordinals and renumber every year
    async fn reorder_records(
        &self,
        namespace: Namespace,
        assignments: Vec<OrdinalAssignment>,
    ) -> CatalogResult<ReorderReport>;

    /// Append an uploaded photo to a gallery record
    async fn add_asset(&self, namespace: Namespace, id: &str, key: &str) -> CatalogResult<Record>;

    /// Remove the photo family whose file stem matches `reference`
    async fn remove_asset(
        &self,
        namespace: Namespace,
        id: &str,
        reference: &str,
    ) -> CatalogResult<Record>;
}
