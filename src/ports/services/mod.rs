mod catalog_service;
mod upload_service;

pub use catalog_service::CatalogService;
pub use upload_service::UploadService;
