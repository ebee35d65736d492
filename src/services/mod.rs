mod asset_pipeline;
mod catalog_service_impl;
mod upload_service_impl;

pub use asset_pipeline::{object_metadata, AssetPipeline};
pub use catalog_service_impl::{CatalogServiceImpl, DEFAULT_MAX_COMMIT_ATTEMPTS};
pub use upload_service_impl::{UploadServiceImpl, DEFAULT_UPLOAD_URL_TTL};
