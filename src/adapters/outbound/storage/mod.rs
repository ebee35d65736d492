// Infrastructure error types
pub mod error;

// Storage implementations
pub mod apache_object_store_adapter;
pub mod signer;

// Provider-specific configuration
pub mod s3;

// Re-export key types
pub use apache_object_store_adapter::ApacheObjectStoreAdapter;
pub use error::StoreError;
pub use signer::{LocalUploadSigner, ObjectStoreUploadSigner, SignatureError};
