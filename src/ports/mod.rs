pub mod imaging;
pub mod repositories;
pub mod services;
pub mod storage;

// Re-export all port traits for convenience
pub use imaging::DerivativeGenerator;
pub use repositories::DocumentRepository;
pub use services::{CatalogService, UploadService};
pub use storage::{ObjectStore, PutObjectOptions, UploadSigner, WritePrecondition};
