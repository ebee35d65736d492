pub mod errors;
pub mod models;
pub mod naming;
pub mod ordering;
pub mod value_objects;

// Re-export commonly used types
pub use errors::{CatalogError, CatalogResult, ImageError, StorageError, ValidationError};
pub use models::*;
pub use value_objects::*;
