use thiserror::Error;

/// Failures of derivative generation. Any of these aborts the whole upload.
#[derive(Debug, Clone, Error)]
pub enum ImageError {
    #[error("Failed to decode source image: {0}")]
    Decode(String),

    #[error("Failed to encode derivative '{variant}': {reason}")]
    Encode { variant: String, reason: String },

    #[error("Invalid derivative spec: {0}")]
    InvalidSpec(String),

    #[error("Image worker failed: {0}")]
    Worker(String),
}

pub type ImageResult<T> = Result<T, ImageError>;
