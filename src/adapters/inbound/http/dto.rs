use axum::{http::StatusCode, Json};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

use crate::{
    adapters::outbound::storage::SignatureError,
    domain::{
        errors::{CatalogError, ImageError, StorageError, ValidationError},
        models::{
            AssetReference, CreateRecordRequest, DeletionReport, DerivativeVariant,
            FileDescriptor, Record, RecordFields, RecordPatch, SignedTarget, StoredUpload,
            UploadBatch, UploadIntent, UploadIntentRequest, UploadTicket,
        },
        ordering::{MoveDirection, MoveOutcome, OrdinalAssignment, ReorderReport},
        value_objects::Namespace,
    },
};

/// Error half of every handler result
pub type HandlerError = (StatusCode, Json<ErrorResponseDto>);

// Upload intent

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileDescriptorDto {
    pub file_name: String,
    pub mime_type: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UploadIntentRequestDto {
    pub files: Vec<FileDescriptorDto>,
    #[serde(default)]
    pub metadata: BTreeMap<String, String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SignedTargetDto {
    pub key: String,
    pub url: String,
    pub headers: BTreeMap<String, String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub variant: Option<DerivativeVariant>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadTicketDto {
    pub file_name: String,
    pub id: String,
    pub original: SignedTargetDto,
    pub derivatives: Vec<SignedTargetDto>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadIntentResponseDto {
    pub namespace: Namespace,
    pub record_id: String,
    pub expires_at: DateTime<Utc>,
    pub files: Vec<UploadTicketDto>,
    /// Send back as `metadata` when committing the record
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub pending_metadata: BTreeMap<String, String>,
}

// Server-side uploads

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredUploadDto {
    pub file_name: String,
    pub id: String,
    pub original: AssetReference,
    pub derivatives: Vec<AssetReference>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadBatchResponseDto {
    pub success: bool,
    pub namespace: Namespace,
    pub record_id: String,
    pub files: Vec<StoredUploadDto>,
}

/// Query string of a locally signed upload URL
#[derive(Debug, Clone, Deserialize)]
pub struct SignedUploadQuery {
    pub expires: i64,
    pub signature: String,
}

// Records

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateRecordDto {
    pub record_id: Option<String>,
    #[serde(default)]
    pub fields: RecordFields,
    #[serde(default)]
    pub assets: Vec<String>,
    /// Pending metadata handed out with the upload intent
    #[serde(default)]
    pub metadata: BTreeMap<String, String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PatchRecordDto {
    #[serde(default)]
    pub fields: RecordFields,
    pub assets: Option<Vec<String>>,
}

#[derive(Debug, Clone, Serialize)]
pub struct RecordListResponseDto {
    pub namespace: Namespace,
    pub count: usize,
    pub records: Vec<Record>,
}

#[derive(Debug, Clone, Serialize)]
pub struct RecordResponseDto {
    pub success: bool,
    pub record: Record,
}

#[derive(Debug, Clone, Serialize)]
pub struct DeleteRecordResponseDto {
    pub success: bool,
    pub deleted: Vec<String>,
    pub failed: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MoveRecordDto {
    pub direction: MoveDirection,
}

#[derive(Debug, Clone, Serialize)]
pub struct MoveRecordResponseDto {
    pub success: bool,
    pub moved: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub number: Option<u32>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ReorderItemDto {
    pub id: String,
    pub number: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ReorderRequestDto {
    pub items: Vec<ReorderItemDto>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ReorderResponseDto {
    pub success: bool,
    pub applied: usize,
    pub ignored: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AddAssetDto {
    pub key: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AssetReferenceQuery {
    pub reference: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct HealthResponseDto {
    pub status: &'static str,
    pub version: &'static str,
}

/// DTO for error responses
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponseDto {
    pub error: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<HashMap<String, serde_json::Value>>,
    pub timestamp: DateTime<Utc>,
}

// Conversion implementations

impl From<UploadIntentRequestDto> for UploadIntentRequest {
    fn from(dto: UploadIntentRequestDto) -> Self {
        UploadIntentRequest {
            files: dto
                .files
                .into_iter()
                .map(|file| FileDescriptor {
                    file_name: file.file_name,
                    mime_type: file.mime_type,
                })
                .collect(),
            metadata: dto.metadata,
        }
    }
}

impl From<SignedTarget> for SignedTargetDto {
    fn from(target: SignedTarget) -> Self {
        SignedTargetDto {
            key: target.key.to_string(),
            url: target.url,
            headers: target.headers,
            variant: target.variant,
        }
    }
}

impl From<UploadTicket> for UploadTicketDto {
    fn from(ticket: UploadTicket) -> Self {
        UploadTicketDto {
            file_name: ticket.file_name,
            id: ticket.id.to_string(),
            original: ticket.original.into(),
            derivatives: ticket.derivatives.into_iter().map(Into::into).collect(),
        }
    }
}

impl From<UploadIntent> for UploadIntentResponseDto {
    fn from(intent: UploadIntent) -> Self {
        UploadIntentResponseDto {
            namespace: intent.namespace,
            record_id: intent.record_id,
            expires_at: intent.expires_at,
            files: intent.files.into_iter().map(Into::into).collect(),
            pending_metadata: intent.pending_metadata,
        }
    }
}

impl From<StoredUpload> for StoredUploadDto {
    fn from(upload: StoredUpload) -> Self {
        StoredUploadDto {
            file_name: upload.file_name,
            id: upload.id.to_string(),
            original: upload.original,
            derivatives: upload.derivatives,
        }
    }
}

impl From<UploadBatch> for UploadBatchResponseDto {
    fn from(batch: UploadBatch) -> Self {
        UploadBatchResponseDto {
            success: true,
            namespace: batch.namespace,
            record_id: batch.record_id,
            files: batch.files.into_iter().map(Into::into).collect(),
        }
    }
}

impl From<CreateRecordDto> for CreateRecordRequest {
    fn from(dto: CreateRecordDto) -> Self {
        CreateRecordRequest {
            record_id: dto.record_id,
            fields: dto.fields,
            assets: dto.assets,
            metadata: dto.metadata,
        }
    }
}

impl From<PatchRecordDto> for RecordPatch {
    fn from(dto: PatchRecordDto) -> Self {
        RecordPatch {
            fields: dto.fields,
            assets: dto.assets,
        }
    }
}

impl From<DeletionReport> for DeleteRecordResponseDto {
    fn from(report: DeletionReport) -> Self {
        DeleteRecordResponseDto {
            success: true,
            deleted: report.deleted.iter().map(ToString::to_string).collect(),
            failed: report.failed.iter().map(ToString::to_string).collect(),
        }
    }
}

impl From<MoveOutcome> for MoveRecordResponseDto {
    fn from(outcome: MoveOutcome) -> Self {
        match outcome {
            MoveOutcome::Moved { to, .. } => MoveRecordResponseDto {
                success: true,
                moved: true,
                number: Some(to),
            },
            MoveOutcome::AtBoundary => MoveRecordResponseDto {
                success: true,
                moved: false,
                number: None,
            },
        }
    }
}

impl From<ReorderRequestDto> for Vec<OrdinalAssignment> {
    fn from(dto: ReorderRequestDto) -> Self {
        dto.items
            .into_iter()
            .map(|item| OrdinalAssignment {
                id: item.id,
                ordinal: item.number,
            })
            .collect()
    }
}

impl From<ReorderReport> for ReorderResponseDto {
    fn from(report: ReorderReport) -> Self {
        ReorderResponseDto {
            success: true,
            applied: report.applied,
            ignored: report.ignored,
        }
    }
}

impl RecordResponseDto {
    pub fn new(record: Record) -> Self {
        Self {
            success: true,
            record,
        }
    }
}

impl RecordListResponseDto {
    pub fn new(namespace: Namespace, records: Vec<Record>) -> Self {
        Self {
            namespace,
            count: records.len(),
            records,
        }
    }
}

/// HTTP status for a catalog failure
pub fn catalog_error_status(error: &CatalogError) -> StatusCode {
    match error {
        CatalogError::Validation(_) => StatusCode::BAD_REQUEST,
        CatalogError::Storage(err) => StatusCode::from(err),
        CatalogError::Image(ImageError::Decode(_)) | CatalogError::Image(ImageError::InvalidSpec(_)) => {
            StatusCode::UNPROCESSABLE_ENTITY
        }
        CatalogError::Image(_) => StatusCode::INTERNAL_SERVER_ERROR,
        CatalogError::RecordNotFound { .. }
        | CatalogError::AssetNotFound { .. }
        | CatalogError::AssetNotUploaded { .. } => StatusCode::NOT_FOUND,
        CatalogError::RecordAlreadyExists { .. } | CatalogError::CommitConflict { .. } => {
            StatusCode::CONFLICT
        }
    }
}

impl ErrorResponseDto {
    fn new(error: &str, message: String, details: HashMap<String, serde_json::Value>) -> Self {
        ErrorResponseDto {
            error: error.to_string(),
            message,
            details: if details.is_empty() {
                None
            } else {
                Some(details)
            },
            timestamp: Utc::now(),
        }
    }

    pub fn from_catalog_error(error: &CatalogError) -> Self {
        let mut details = HashMap::new();
        let kind = match error {
            CatalogError::Validation(_) => "ValidationError",
            CatalogError::Storage(err) => return Self::from_storage_error(err),
            CatalogError::Image(_) => "ImageError",
            CatalogError::RecordNotFound { namespace, id } => {
                details.insert("namespace".to_string(), namespace.as_str().into());
                details.insert("id".to_string(), id.as_str().into());
                "RecordNotFound"
            }
            CatalogError::RecordAlreadyExists { namespace, id } => {
                details.insert("namespace".to_string(), namespace.as_str().into());
                details.insert("id".to_string(), id.as_str().into());
                "RecordAlreadyExists"
            }
            CatalogError::AssetNotFound { id, reference } => {
                details.insert("id".to_string(), id.as_str().into());
                details.insert("reference".to_string(), reference.as_str().into());
                "AssetNotFound"
            }
            CatalogError::AssetNotUploaded { key } => {
                details.insert("key".to_string(), key.as_str().into());
                "AssetNotUploaded"
            }
            CatalogError::CommitConflict {
                namespace,
                attempts,
            } => {
                details.insert("namespace".to_string(), namespace.as_str().into());
                details.insert("attempts".to_string(), (*attempts).into());
                "CommitConflict"
            }
        };
        Self::new(kind, error.to_string(), details)
    }

    pub fn from_storage_error(error: &StorageError) -> Self {
        let mut details = HashMap::new();

        match error {
            StorageError::ObjectNotFound { key }
            | StorageError::AccessDenied { key, .. }
            | StorageError::CorruptDocument { key, .. } => {
                details.insert("key".to_string(), key.as_str().into());
            }
            StorageError::VersionConflict {
                key,
                expected_version,
            } => {
                details.insert("key".to_string(), key.as_str().into());
                if let Some(version) = expected_version {
                    details.insert("expected_version".to_string(), version.as_str().into());
                }
            }
            _ => {}
        }

        Self::new("StorageError", error.to_string(), details)
    }

    pub fn bad_request(message: &str) -> Self {
        Self::new("BadRequest", message.to_string(), HashMap::new())
    }

    pub fn not_found(message: &str) -> Self {
        Self::new("NotFound", message.to_string(), HashMap::new())
    }

    pub fn forbidden(message: &str) -> Self {
        Self::new("Forbidden", message.to_string(), HashMap::new())
    }
}

/// Map a catalog failure to a handler error
pub fn catalog_error(error: CatalogError) -> HandlerError {
    (
        catalog_error_status(&error),
        Json(ErrorResponseDto::from_catalog_error(&error)),
    )
}

pub fn storage_error(error: StorageError) -> HandlerError {
    (
        StatusCode::from(&error),
        Json(ErrorResponseDto::from_storage_error(&error)),
    )
}

pub fn validation_error(error: ValidationError) -> HandlerError {
    (
        StatusCode::BAD_REQUEST,
        Json(ErrorResponseDto::new(
            "ValidationError",
            error.to_string(),
            HashMap::new(),
        )),
    )
}

pub fn signature_error(error: SignatureError) -> HandlerError {
    (
        StatusCode::FORBIDDEN,
        Json(ErrorResponseDto::forbidden(&error.to_string())),
    )
}
