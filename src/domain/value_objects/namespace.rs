use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::domain::{
    errors::ValidationError,
    models::{
        AssetRole, DerivativeMode, DerivativePlan, DerivativeSpec, DerivativeVariant,
        DocumentLayout, FitMode, IdStrategy,
    },
};

const IMAGE_TYPES: &[&str] = &["image/jpeg", "image/png", "image/webp"];
const PDF_TYPES: &[&str] = &["application/pdf"];

const ARTWORK_DERIVATIVES: &[DerivativeSpec] = &[
    DerivativeSpec {
        variant: DerivativeVariant::Small,
        max_width: 300,
        max_height: 300,
        fit: FitMode::Cover,
        quality: 90,
    },
    DerivativeSpec {
        variant: DerivativeVariant::Medium,
        max_width: 800,
        max_height: 800,
        fit: FitMode::Inside,
        quality: 90,
    },
    DerivativeSpec {
        variant: DerivativeVariant::Large,
        max_width: 1600,
        max_height: 1600,
        fit: FitMode::Inside,
        quality: 95,
    },
];

const EXHIBITION_DERIVATIVES: &[DerivativeSpec] = &[DerivativeSpec {
    variant: DerivativeVariant::Single,
    max_width: 600,
    max_height: 400,
    fit: FitMode::Cover,
    quality: 90,
}];

const POSTER_DERIVATIVES: &[DerivativeSpec] = &[DerivativeSpec {
    variant: DerivativeVariant::Single,
    max_width: 800,
    max_height: 1131,
    fit: FitMode::Inside,
    quality: 95,
}];

/// A collection of records sharing a schema, a document and a storage-key prefix
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Namespace {
    Artworks,
    Exhibitions,
    Cv,
    Texts,
    Contact,
}

impl Namespace {
    pub const ALL: [Namespace; 5] = [
        Namespace::Artworks,
        Namespace::Exhibitions,
        Namespace::Cv,
        Namespace::Texts,
        Namespace::Contact,
    ];

    /// Name used in routes and document keys
    pub fn as_str(&self) -> &'static str {
        match self {
            Namespace::Artworks => "artworks",
            Namespace::Exhibitions => "exhibitions",
            Namespace::Cv => "cv",
            Namespace::Texts => "texts",
            Namespace::Contact => "contact",
        }
    }

    /// First segment of every asset key in this namespace
    pub fn storage_prefix(&self) -> &'static str {
        match self {
            Namespace::Artworks => "Artworks",
            Namespace::Exhibitions => "Exhibitions",
            Namespace::Cv => "CV",
            Namespace::Texts => "Texts",
            Namespace::Contact => "Contact",
        }
    }

    pub fn layout(&self) -> DocumentLayout {
        match self {
            Namespace::Artworks | Namespace::Texts => DocumentLayout::List,
            Namespace::Exhibitions | Namespace::Cv | Namespace::Contact => DocumentLayout::Map,
        }
    }

    pub fn id_strategy(&self) -> IdStrategy {
        match self {
            Namespace::Artworks | Namespace::Texts => IdStrategy::Timestamp,
            Namespace::Exhibitions => IdStrategy::TitleSlug,
            Namespace::Cv => IdStrategy::Singleton("profile"),
            Namespace::Contact => IdStrategy::Singleton("contact"),
        }
    }

    pub fn accepted_content_types(&self) -> &'static [&'static str] {
        match self {
            Namespace::Artworks | Namespace::Exhibitions | Namespace::Cv => IMAGE_TYPES,
            Namespace::Texts => PDF_TYPES,
            Namespace::Contact => &[],
        }
    }

    pub fn accepts_content_type(&self, content_type: &str) -> bool {
        let essence = content_type
            .split(';')
            .next()
            .unwrap_or_default()
            .trim()
            .to_ascii_lowercase();
        self.accepted_content_types()
            .iter()
            .any(|accepted| *accepted == essence)
    }

    pub fn derivative_plan(&self) -> Option<DerivativePlan> {
        match self {
            Namespace::Artworks => Some(DerivativePlan {
                mode: DerivativeMode::ClientUploaded,
                specs: ARTWORK_DERIVATIVES,
            }),
            Namespace::Exhibitions => Some(DerivativePlan {
                mode: DerivativeMode::ServerGenerated,
                specs: EXHIBITION_DERIVATIVES,
            }),
            Namespace::Cv => Some(DerivativePlan {
                mode: DerivativeMode::ServerGenerated,
                specs: POSTER_DERIVATIVES,
            }),
            Namespace::Texts | Namespace::Contact => None,
        }
    }

    /// Records are ordered by a per-year `number` field
    pub fn is_ordered(&self) -> bool {
        matches!(self, Namespace::Artworks)
    }

    /// Records carry a growable list of photos
    pub fn is_gallery(&self) -> bool {
        matches!(self, Namespace::Exhibitions | Namespace::Cv)
    }

    pub fn original_role(&self) -> AssetRole {
        if self.is_gallery() {
            AssetRole::GalleryPhoto
        } else {
            AssetRole::Original
        }
    }
}

impl std::fmt::Display for Namespace {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Namespace {
    type Err = ValidationError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Namespace::ALL
            .into_iter()
            .find(|ns| ns.as_str().eq_ignore_ascii_case(value))
            .ok_or_else(|| ValidationError::UnknownNamespace(value.to_string()))
    }
}
