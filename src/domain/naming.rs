//! Storage key conventions.
//!
//! Every asset key has the shape `<Prefix>/<Subfolder>/[<Variant>/]<id>.<ext>`:
//!
//! | asset                         | key                                     |
//! |-------------------------------|-----------------------------------------|
//! | original                      | `Artworks/Original/1700000000000.png`   |
//! | multi-resolution derivative   | `Artworks/Thumbnail/Small/1700000000000.jpg` |
//! | single-resolution derivative  | `Exhibitions/Thumbnail/1700000000000.jpg` |
//!
//! An original and all of its derivatives share the same file stem, which is what
//! convention substitution relies on.

use crate::domain::{
    errors::ValidationError,
    models::{DerivativeVariant, DERIVATIVE_EXTENSION},
    value_objects::{Namespace, ObjectKey},
};

pub const ORIGINAL_FOLDER: &str = "Original";
pub const THUMBNAIL_FOLDER: &str = "Thumbnail";
pub const FALLBACK_EXTENSION: &str = "bin";

const MAX_EXTENSION_LEN: usize = 8;

/// Current wall-clock time in milliseconds
pub fn now_millis() -> u64 {
    u64::try_from(chrono::Utc::now().timestamp_millis()).unwrap_or_default()
}

/// Ids for a batch issued together: `base, base + 1, ...`. Distinct even when the
/// whole batch is issued within one millisecond.
pub fn batch_ids(base: u64, count: usize) -> Vec<u64> {
    (0..count as u64).map(|offset| base + offset).collect()
}

pub fn original_key(
    namespace: Namespace,
    id: &str,
    file_name: &str,
    mime_type: &str,
) -> Result<ObjectKey, ValidationError> {
    let extension = safe_extension(file_name, mime_type);
    ObjectKey::new(format!(
        "{}/{}/{}.{}",
        namespace.storage_prefix(),
        ORIGINAL_FOLDER,
        id,
        extension
    ))
}

pub fn derivative_key(
    namespace: Namespace,
    variant: DerivativeVariant,
    id: &str,
) -> Result<ObjectKey, ValidationError> {
    let key = match variant.folder() {
        Some(size) => format!(
            "{}/{}/{}/{}.{}",
            namespace.storage_prefix(),
            THUMBNAIL_FOLDER,
            size,
            id,
            DERIVATIVE_EXTENSION
        ),
        None => format!(
            "{}/{}/{}.{}",
            namespace.storage_prefix(),
            THUMBNAIL_FOLDER,
            id,
            DERIVATIVE_EXTENSION
        ),
    };
    ObjectKey::new(key)
}

/// Every derivative key the namespace's plan produces for an original
pub fn derivative_keys_for(
    namespace: Namespace,
    original: &ObjectKey,
) -> Vec<(DerivativeVariant, ObjectKey)> {
    let Some(plan) = namespace.derivative_plan() else {
        return Vec::new();
    };
    plan.specs
        .iter()
        .filter_map(|spec| {
            derivative_key(namespace, spec.variant, original.file_stem())
                .ok()
                .map(|key| (spec.variant, key))
        })
        .collect()
}

/// `<Prefix>/Original/<stem>.` for a derivative key. The original's extension is not
/// derivable, so callers match this as a prefix.
pub fn original_prefix_for(namespace: Namespace, derivative: &ObjectKey) -> String {
    format!(
        "{}/{}/{}.",
        namespace.storage_prefix(),
        ORIGINAL_FOLDER,
        derivative.file_stem()
    )
}

/// True when the key sits under `<Prefix>/Original/`
pub fn is_original_key(namespace: Namespace, key: &ObjectKey) -> bool {
    key.has_prefix(&format!("{}/{}/", namespace.storage_prefix(), ORIGINAL_FOLDER))
}

pub fn ensure_in_namespace(namespace: Namespace, key: &ObjectKey) -> Result<(), ValidationError> {
    if key.has_prefix(&format!("{}/", namespace.storage_prefix())) {
        Ok(())
    } else {
        Err(ValidationError::KeyOutsideNamespace {
            key: key.to_string(),
            namespace,
        })
    }
}

/// Extension for an original: the file name's extension when it is short and
/// alphanumeric, else the MIME type's, else [`FALLBACK_EXTENSION`].
pub fn safe_extension(file_name: &str, mime_type: &str) -> String {
    let from_name = file_name
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .filter(|ext| {
            !ext.is_empty()
                && ext.len() <= MAX_EXTENSION_LEN
                && ext.chars().all(|c| c.is_ascii_alphanumeric())
        });

    from_name
        .or_else(|| extension_for_mime(mime_type).map(str::to_string))
        .unwrap_or_else(|| FALLBACK_EXTENSION.to_string())
}

pub fn extension_for_mime(mime_type: &str) -> Option<&'static str> {
    let essence = mime_type.split(';').next().unwrap_or_default().trim();
    match essence.to_ascii_lowercase().as_str() {
        "image/jpeg" | "image/jpg" => Some("jpg"),
        "image/png" => Some("png"),
        "image/webp" => Some("webp"),
        "image/gif" => Some("gif"),
        "application/pdf" => Some("pdf"),
        _ => None,
    }
}

pub fn mime_for_extension(extension: &str) -> &'static str {
    match extension.to_ascii_lowercase().as_str() {
        "jpg" | "jpeg" => "image/jpeg",
        "png" => "image/png",
        "webp" => "image/webp",
        "gif" => "image/gif",
        "pdf" => "application/pdf",
        _ => "application/octet-stream",
    }
}

/// Lower-case ASCII alphanumerics joined by single dashes
pub fn slugify(title: &str) -> String {
    let mut slug = String::with_capacity(title.len());
    for c in title.chars() {
        if c.is_ascii_alphanumeric() {
            slug.push(c.to_ascii_lowercase());
        } else if !slug.is_empty() && !slug.ends_with('-') {
            slug.push('-');
        }
    }
    while slug.ends_with('-') {
        slug.pop();
    }
    slug
}

/// Ids end up inside object keys, so they are restricted to `[A-Za-z0-9_-]`
pub fn is_safe_id(id: &str) -> bool {
    !id.is_empty()
        && id.len() <= 128
        && id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}

/// File stem of a stored reference, which may be a bare key or a full URL
pub fn reference_stem(reference: &str) -> Option<&str> {
    let path = reference
        .split(['?', '#'])
        .next()
        .unwrap_or_default()
        .trim_end_matches('/');
    let file_name = path.rsplit('/').next().unwrap_or_default();
    let stem = match file_name.rfind('.') {
        Some(0) | None => file_name,
        Some(idx) => &file_name[..idx],
    };
    if stem.is_empty() {
        None
    } else {
        Some(stem)
    }
}

pub const METADATA_HEADER_PREFIX: &str = "x-amz-meta-";

/// Object metadata name for a caller field: lower-case, `[a-z0-9_-]` only
pub fn metadata_name(field: &str) -> Option<String> {
    let name: String = field
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '-' || *c == '_')
        .map(|c| c.to_ascii_lowercase())
        .collect();
    if name.is_empty() {
        None
    } else {
        Some(name)
    }
}

/// `x-amz-meta-*` header name for a caller metadata field
pub fn metadata_header(field: &str) -> Option<String> {
    metadata_name(field).map(|name| format!("{}{}", METADATA_HEADER_PREFIX, name))
}
