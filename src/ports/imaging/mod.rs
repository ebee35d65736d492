use async_trait::async_trait;
use bytes::Bytes;

use crate::domain::{
    errors::ImageResult,
    models::{Derivative, DerivativeSpec},
};

/// Port for producing resized, re-encoded copies of an original image
#[async_trait]
pub trait DerivativeGenerator: Send + Sync + 'static {
    /// One derivative per spec, in spec order. Fails as a whole; no partial sets.
    async fn generate(
        &self,
        original: Bytes,
        specs: Vec<DerivativeSpec>,
    ) -> ImageResult<Vec<Derivative>>;
}
