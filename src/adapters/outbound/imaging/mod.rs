mod blocking_pool;
mod image_generator;

pub use blocking_pool::BlockingPool;
pub use image_generator::{render_derivatives, ImageDerivativeGenerator};
