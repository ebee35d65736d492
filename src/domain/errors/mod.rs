mod catalog_errors;
mod image_errors;
mod storage_errors;
mod validation_errors;

pub use catalog_errors::*;
pub use image_errors::*;
pub use storage_errors::*;
pub use validation_errors::*;
