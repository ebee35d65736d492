use crate::domain::value_objects::Namespace;

/// Validation errors raised before any storage I/O happens
#[derive(Debug, Clone, PartialEq)]
pub enum ValidationError {
    // ObjectKey validation errors
    EmptyObjectKey,
    ObjectKeyTooLong {
        actual: usize,
        max: usize,
    },
    InvalidObjectKeyCharacter(char),
    ObjectKeyStartsWithSlash,
    ObjectKeyContainsDoubleSlash,
    KeyOutsideNamespace {
        key: String,
        namespace: Namespace,
    },

    // Namespace errors
    UnknownNamespace(String),
    UploadsNotSupported(Namespace),
    OrderingNotSupported(Namespace),
    GalleryNotSupported(Namespace),

    // Upload errors
    EmptyUploadBatch,
    UnsupportedContentType {
        namespace: Namespace,
        content_type: String,
    },
    InvalidDerivativeSpec(String),

    // Record schema errors
    MissingField {
        namespace: Namespace,
        field: &'static str,
    },
    MissingAsset {
        namespace: Namespace,
        expected: &'static str,
    },
    FieldNotApplicable {
        namespace: Namespace,
        field: &'static str,
    },
    InvalidField {
        field: String,
        value: String,
        expected: String,
    },
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            // ObjectKey errors
            ValidationError::EmptyObjectKey => write!(f, "Object key cannot be empty"),
            ValidationError::ObjectKeyTooLong { actual, max } => {
                write!(f, "Object key too long: {} bytes (max: {})", actual, max)
            }
            ValidationError::InvalidObjectKeyCharacter(c) => {
                write!(f, "Invalid character in object key: '{}'", c)
            }
            ValidationError::ObjectKeyStartsWithSlash => {
                write!(f, "Object key cannot start with '/'")
            }
            ValidationError::ObjectKeyContainsDoubleSlash => {
                write!(f, "Object key cannot contain '//'")
            }
            ValidationError::KeyOutsideNamespace { key, namespace } => {
                write!(
                    f,
                    "Key '{}' is outside the '{}' storage prefix",
                    key,
                    namespace.storage_prefix()
                )
            }

            // Namespace errors
            ValidationError::UnknownNamespace(name) => {
                write!(f, "Unknown namespace: {}", name)
            }
            ValidationError::UploadsNotSupported(namespace) => {
                write!(f, "Namespace '{}' does not accept uploads", namespace)
            }
            ValidationError::OrderingNotSupported(namespace) => {
                write!(f, "Namespace '{}' has no ordinal ordering", namespace)
            }
            ValidationError::GalleryNotSupported(namespace) => {
                write!(f, "Namespace '{}' has no photo gallery", namespace)
            }

            // Upload errors
            ValidationError::EmptyUploadBatch => {
                write!(f, "Upload batch must contain at least one file")
            }
            ValidationError::UnsupportedContentType {
                namespace,
                content_type,
            } => {
                write!(
                    f,
                    "Content type '{}' is not accepted by namespace '{}'",
                    content_type, namespace
                )
            }
            ValidationError::InvalidDerivativeSpec(reason) => {
                write!(f, "Invalid derivative spec: {}", reason)
            }

            // Record schema errors
            ValidationError::MissingField { namespace, field } => {
                write!(f, "Field '{}' is required for {}", field, namespace)
            }
            ValidationError::MissingAsset {
                namespace,
                expected,
            } => {
                write!(f, "{} records require {}", namespace, expected)
            }
            ValidationError::FieldNotApplicable { namespace, field } => {
                write!(f, "Field '{}' does not apply to {}", field, namespace)
            }
            ValidationError::InvalidField {
                field,
                value,
                expected,
            } => {
                write!(
                    f,
                    "Invalid value for field '{}': '{}' (expected: {})",
                    field, value, expected
                )
            }
        }
    }
}

impl std::error::Error for ValidationError {}
