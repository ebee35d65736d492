use async_trait::async_trait;
use bytes::Bytes;
use image::{
    codecs::jpeg::JpegEncoder, imageops::FilterType, DynamicImage, ExtendedColorType,
};
use tracing::debug;

use crate::{
    adapters::outbound::imaging::BlockingPool,
    domain::{
        errors::{ImageError, ImageResult},
        models::{Derivative, DerivativeSpec, FitMode},
    },
    ports::imaging::DerivativeGenerator,
};

/// Derivatives rendered with the `image` crate on a [`BlockingPool`]
#[derive(Debug, Clone)]
pub struct ImageDerivativeGenerator {
    pool: BlockingPool,
}

impl ImageDerivativeGenerator {
    pub fn new(pool: BlockingPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl DerivativeGenerator for ImageDerivativeGenerator {
    async fn generate(
        &self,
        original: Bytes,
        specs: Vec<DerivativeSpec>,
    ) -> ImageResult<Vec<Derivative>> {
        if specs.is_empty() {
            return Ok(Vec::new());
        }
        self.pool
            .run(move || render_derivatives(&original, &specs))
            .await
    }
}

/// Decode once and render every spec. Synchronous; call from a blocking context.
pub fn render_derivatives(
    original: &[u8],
    specs: &[DerivativeSpec],
) -> ImageResult<Vec<Derivative>> {
    for spec in specs {
        spec.validate()
            .map_err(|e| ImageError::InvalidSpec(e.to_string()))?;
    }

    let source = image::load_from_memory(original).map_err(|e| ImageError::Decode(e.to_string()))?;
    debug!(
        width = source.width(),
        height = source.height(),
        variants = specs.len(),
        "Rendering derivatives"
    );

    specs.iter().map(|spec| render(&source, spec)).collect()
}

fn render(source: &DynamicImage, spec: &DerivativeSpec) -> ImageResult<Derivative> {
    let resized = match spec.fit {
        FitMode::Cover => source.resize_to_fill(spec.max_width, spec.max_height, FilterType::Lanczos3),
        FitMode::Inside
            if source.width() <= spec.max_width && source.height() <= spec.max_height =>
        {
            source.clone()
        }
        FitMode::Inside => source.resize(spec.max_width, spec.max_height, FilterType::Lanczos3),
    };

    let rgb = resized.to_rgb8();
    let mut buffer = Vec::new();
    let mut encoder = JpegEncoder::new_with_quality(&mut buffer, spec.encoder_quality());
    encoder
        .encode(rgb.as_raw(), rgb.width(), rgb.height(), ExtendedColorType::Rgb8)
        .map_err(|e| ImageError::Encode {
            variant: spec.variant.as_str().to_string(),
            reason: e.to_string(),
        })?;

    Ok(Derivative {
        variant: spec.variant,
        width: rgb.width(),
        height: rgb.height(),
        data: Bytes::from(buffer),
    })
}
