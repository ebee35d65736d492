use crate::domain::{errors::StorageError, value_objects::ObjectKey};
use thiserror::Error as ThisError;

#[derive(ThisError, Debug)]
pub enum StoreError {
    #[error("Object store error: {0}")]
    ObjectStore(#[from] object_store::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Invalid store configuration: {0}")]
    Configuration(String),

    #[error("{0}")]
    Other(String),
}

fn key_from_path(path: &str) -> Result<ObjectKey, StorageError> {
    ObjectKey::new(path.to_string()).map_err(|_| StorageError::ValidationError {
        message: format!("Invalid object path from store: {}", path),
    })
}

/// Convert object_store errors to domain storage errors
impl From<object_store::Error> for StorageError {
    fn from(err: object_store::Error) -> Self {
        match err {
            object_store::Error::NotFound { path, .. } => match key_from_path(&path) {
                Ok(key) => StorageError::ObjectNotFound { key },
                Err(e) => e,
            },
            // A create-only write against an existing object lost the race
            object_store::Error::AlreadyExists { path, .. } => match key_from_path(&path) {
                Ok(key) => StorageError::VersionConflict {
                    key,
                    expected_version: None,
                },
                Err(e) => e,
            },
            object_store::Error::Precondition { path, .. } => match key_from_path(&path) {
                Ok(key) => StorageError::VersionConflict {
                    key,
                    expected_version: None,
                },
                Err(e) => e,
            },
            object_store::Error::PermissionDenied { path, .. } => match key_from_path(&path) {
                Ok(key) => StorageError::AccessDenied {
                    key,
                    operation: "object_store".to_string(),
                },
                Err(e) => e,
            },
            object_store::Error::NotSupported { .. } | object_store::Error::NotImplemented => {
                StorageError::UnsupportedOperation {
                    operation: "unknown".to_string(),
                    reason: err.to_string(),
                }
            }
            _ => StorageError::InfrastructureError {
                message: format!("Object store operation failed: {}", err),
                source: Some(err.to_string()),
            },
        }
    }
}

/// Convert infrastructure StoreError to domain StorageError
impl From<StoreError> for StorageError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::ObjectStore(object_err) => object_err.into(),
            StoreError::Serialization(serde_err) => StorageError::InfrastructureError {
                message: format!("Serialization failed: {}", serde_err),
                source: Some(serde_err.to_string()),
            },
            StoreError::Configuration(msg) => StorageError::ValidationError { message: msg },
            StoreError::Other(msg) => StorageError::InfrastructureError {
                message: msg,
                source: None,
            },
        }
    }
}

/// Convert domain StorageError to HTTP status codes for API responses
impl From<&StorageError> for http::StatusCode {
    fn from(err: &StorageError) -> Self {
        match err {
            StorageError::ObjectNotFound { .. } => http::StatusCode::NOT_FOUND,
            StorageError::VersionConflict { .. } => http::StatusCode::CONFLICT,
            StorageError::ValidationError { .. } => http::StatusCode::BAD_REQUEST,
            StorageError::AccessDenied { .. } => http::StatusCode::FORBIDDEN,
            StorageError::UnsupportedOperation { .. } => http::StatusCode::NOT_IMPLEMENTED,
            StorageError::CorruptDocument { .. } | StorageError::InfrastructureError { .. } => {
                http::StatusCode::BAD_GATEWAY
            }
        }
    }
}
