use serde::{Deserialize, Serialize};

use crate::domain::{models::DerivativeVariant, value_objects::ObjectKey};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AssetRole {
    Original,
    ThumbnailSmall,
    ThumbnailMedium,
    ThumbnailLarge,
    /// Single-resolution derivative paired with a gallery photo
    Thumbnail,
    GalleryPhoto,
}

impl AssetRole {
    pub fn for_variant(variant: DerivativeVariant) -> Self {
        match variant {
            DerivativeVariant::Small => AssetRole::ThumbnailSmall,
            DerivativeVariant::Medium => AssetRole::ThumbnailMedium,
            DerivativeVariant::Large => AssetRole::ThumbnailLarge,
            DerivativeVariant::Single => AssetRole::Thumbnail,
        }
    }

    pub fn is_original(&self) -> bool {
        matches!(self, AssetRole::Original | AssetRole::GalleryPhoto)
    }
}

/// Pointer from a record to one stored object
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssetReference {
    pub role: AssetRole,
    pub storage_key: ObjectKey,
    pub content_type: String,
}

impl AssetReference {
    pub fn new(role: AssetRole, storage_key: ObjectKey, content_type: impl Into<String>) -> Self {
        Self {
            role,
            storage_key,
            content_type: content_type.into(),
        }
    }

    /// Id shared by an original and all of its derivatives
    pub fn stem(&self) -> &str {
        self.storage_key.file_stem()
    }
}
