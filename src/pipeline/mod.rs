//! The analysis and outfit-image flows: upload -> compression -> prompt -> model -> parse.

pub mod compression;
pub mod ingest;
pub mod parser;
pub mod prompts;

use thiserror::Error;
use tracing::{info, warn};

use crate::llm::gateway::{GatewayError, ImageRequest, ModelGateway, TextRequest};
use crate::llm::media::InlineImage;
use crate::models::{CoordinateRequest, CoordinateResult, ImageGenerationRequest};
use crate::utils::language::Language;

pub use compression::{compress_image, CompressionOptions, CompressionResult};
pub use ingest::{validate_upload, AcceptedUpload, IngestError, ALLOWED_IMAGE_TYPES};
pub use parser::{parse_coordinate_response, ParseError};
pub use prompts::{coordination_prompt, image_generation_prompt};

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Gateway(#[from] GatewayError),
    #[error(transparent)]
    Parse(#[from] ParseError),
}

/// Compresses an accepted upload off the async runtime.
///
/// Compression never fails the request: a panicked worker yields the original photo.
pub async fn prepare_photo(upload: AcceptedUpload, options: CompressionOptions) -> InlineImage {
    let original = upload.image.clone();
    let handle = tokio::task::spawn_blocking(move || {
        compress_image(&upload.image.bytes, &upload.image.mime_type, &options)
    });
    match handle.await {
        Ok(result) => result.image,
        Err(err) => {
            warn!("Image compression task failed: {}", err);
            original
        }
    }
}

/// One analysis round trip. The caller has already validated `request`.
pub async fn analyze(
    gateway: &dyn ModelGateway,
    request: &CoordinateRequest,
    photo: Option<InlineImage>,
) -> Result<CoordinateResult, PipelineError> {
    let with_photo = photo.is_some();
    let prompt = coordination_prompt(request, with_photo);
    let raw = gateway
        .generate_text(TextRequest {
            prompt,
            image: photo,
        })
        .await?;

    let result = parse_coordinate_response(&raw).map_err(|err| {
        warn!(
            "Unparseable analysis response ({} chars): {}",
            raw.chars().count(),
            err
        );
        err
    })?;
    info!(
        "Analysis parsed: with_photo={} score={:?} tips={} accessories={} colors={}",
        with_photo,
        result.score,
        result.styling_tips.len(),
        result.accessories.len(),
        result.color_palette.len()
    );
    Ok(result)
}

/// Generates the three-outfit composite and returns it as a `data:` URL.
pub async fn generate_outfit_image(
    gateway: &dyn ModelGateway,
    request: &ImageGenerationRequest,
    reference: Option<InlineImage>,
    language: Language,
) -> Result<String, PipelineError> {
    let prompt = image_generation_prompt(request, reference.is_some(), language);
    let image = gateway
        .generate_image(ImageRequest { prompt, reference })
        .await?;
    info!(
        "Outfit image generated: mime={} bytes={}",
        image.mime_type,
        image.bytes.len()
    );
    Ok(image.data_url())
}
