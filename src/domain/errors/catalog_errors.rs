use crate::domain::{
    errors::{ImageError, StorageError, ValidationError},
    value_objects::{Namespace, ObjectKey},
};

/// Errors surfaced by record lifecycle and upload operations
#[derive(Debug, Clone)]
pub enum CatalogError {
    /// Input rejected before any storage I/O
    Validation(ValidationError),

    /// Object store or document repository failure
    Storage(StorageError),

    /// Derivative generation failed
    Image(ImageError),

    /// No record with this id in the namespace document
    RecordNotFound { namespace: Namespace, id: String },

    /// A record with this id already exists
    RecordAlreadyExists { namespace: Namespace, id: String },

    /// No asset of the record matches the supplied reference
    AssetNotFound { id: String, reference: String },

    /// A confirmed key has no stored object behind it
    AssetNotUploaded { key: ObjectKey },

    /// Compare-and-swap kept losing against concurrent writers
    CommitConflict { namespace: Namespace, attempts: usize },
}

impl std::fmt::Display for CatalogError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CatalogError::Validation(err) => write!(f, "{}", err),
            CatalogError::Storage(err) => write!(f, "{}", err),
            CatalogError::Image(err) => write!(f, "{}", err),
            CatalogError::RecordNotFound { namespace, id } => {
                write!(f, "Record '{}' not found in {}", id, namespace)
            }
            CatalogError::RecordAlreadyExists { namespace, id } => {
                write!(f, "Record '{}' already exists in {}", id, namespace)
            }
            CatalogError::AssetNotFound { id, reference } => {
                write!(f, "Record '{}' has no asset matching '{}'", id, reference)
            }
            CatalogError::AssetNotUploaded { key } => {
                write!(f, "Upload not found in storage: {}", key)
            }
            CatalogError::CommitConflict {
                namespace,
                attempts,
            } => {
                write!(
                    f,
                    "Could not commit {} document after {} attempts due to concurrent writes",
                    namespace, attempts
                )
            }
        }
    }
}

impl std::error::Error for CatalogError {}

impl From<ValidationError> for CatalogError {
    fn from(err: ValidationError) -> Self {
        CatalogError::Validation(err)
    }
}

impl From<StorageError> for CatalogError {
    fn from(err: StorageError) -> Self {
        CatalogError::Storage(err)
    }
}

impl From<ImageError> for CatalogError {
    fn from(err: ImageError) -> Self {
        CatalogError::Image(err)
    }
}

/// Result type for catalog operations
pub type CatalogResult<T> = Result<T, CatalogError>;
