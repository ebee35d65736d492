use bytes::Bytes;
use serde::{Deserialize, Serialize};

use crate::domain::errors::ValidationError;

/// Size tag of a derivative. `Single` is used by namespaces with one thumbnail per photo.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DerivativeVariant {
    Small,
    Medium,
    Large,
    Single,
}

impl DerivativeVariant {
    /// Path segment under `Thumbnail/`, if the variant has one
    pub fn folder(&self) -> Option<&'static str> {
        match self {
            DerivativeVariant::Small => Some("Small"),
            DerivativeVariant::Medium => Some("Medium"),
            DerivativeVariant::Large => Some("Large"),
            DerivativeVariant::Single => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        self.folder().unwrap_or("Thumbnail")
    }
}

/// How a derivative fills its bounding box
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FitMode {
    /// Crop to fill exactly `max_width x max_height`, center anchored
    Cover,
    /// Scale down keeping aspect ratio; never upscale
    Inside,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DerivativeSpec {
    pub variant: DerivativeVariant,
    pub max_width: u32,
    pub max_height: u32,
    pub fit: FitMode,
    /// JPEG quality, 0-100. The encoder floor is 1, so 0 encodes as 1.
    pub quality: u8,
}

impl DerivativeSpec {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.max_width == 0 || self.max_height == 0 {
            return Err(ValidationError::InvalidDerivativeSpec(format!(
                "{} bounds must be non-zero, got {}x{}",
                self.variant.as_str(),
                self.max_width,
                self.max_height
            )));
        }
        if self.quality > 100 {
            return Err(ValidationError::InvalidDerivativeSpec(format!(
                "{} quality must be within 0-100, got {}",
                self.variant.as_str(),
                self.quality
            )));
        }
        Ok(())
    }

    /// Quality handed to the JPEG encoder
    pub fn encoder_quality(&self) -> u8 {
        self.quality.clamp(1, 100)
    }
}

/// Who produces the derivatives of an upload
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DerivativeMode {
    /// The client renders derivatives and uploads them through presigned URLs
    ClientUploaded,
    /// The server renders derivatives from the stored original
    ServerGenerated,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DerivativePlan {
    pub mode: DerivativeMode,
    pub specs: &'static [DerivativeSpec],
}

/// An encoded derivative ready to be stored
#[derive(Debug, Clone)]
pub struct Derivative {
    pub variant: DerivativeVariant,
    pub width: u32,
    pub height: u32,
    pub data: Bytes,
}

/// Content type every derivative is encoded as
pub const DERIVATIVE_CONTENT_TYPE: &str = "image/jpeg";

/// Extension every derivative key uses
pub const DERIVATIVE_EXTENSION: &str = "jpg";
