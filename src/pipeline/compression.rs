//! Best-effort shrinking of large uploads before they are inlined into a model request.

use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use image::{DynamicImage, ImageResult, Rgb, RgbImage};
use tracing::{info, warn};

use crate::config::{DEFAULT_COMPRESSION_TARGET, DEFAULT_COMPRESSION_THRESHOLD};
use crate::llm::media::InlineImage;

const OUTPUT_MIME_TYPE: &str = "image/jpeg";

#[derive(Debug, Clone, Copy)]
pub struct CompressionOptions {
    /// Inputs smaller than this are passed through untouched.
    pub threshold_bytes: usize,
    pub max_size_bytes: usize,
    pub initial_quality: u8,
    pub quality_step: u8,
    pub quality_floor: u8,
    pub scale: f32,
    /// Quality used while downscaling, never lower than this.
    pub resized_quality_floor: u8,
    pub min_width: u32,
}

impl Default for CompressionOptions {
    fn default() -> Self {
        CompressionOptions {
            threshold_bytes: DEFAULT_COMPRESSION_THRESHOLD,
            max_size_bytes: DEFAULT_COMPRESSION_TARGET,
            initial_quality: 80,
            quality_step: 10,
            quality_floor: 20,
            scale: 0.8,
            resized_quality_floor: 60,
            min_width: 400,
        }
    }
}

#[derive(Debug, Clone)]
pub struct CompressionResult {
    pub image: InlineImage,
    pub original_size: usize,
    pub compressed_size: usize,
    pub compressed: bool,
}

impl CompressionResult {
    fn unchanged(bytes: &[u8], mime_type: &str) -> Self {
        CompressionResult {
            image: InlineImage::new(bytes.to_vec(), mime_type),
            original_size: bytes.len(),
            compressed_size: bytes.len(),
            compressed: false,
        }
    }
}

/// Shrinks `bytes` toward `options.max_size_bytes` when it reaches the threshold.
///
/// Re-encodes as JPEG with decreasing quality, then downscales in steps until the
/// output fits or the width floor is reached. Any decode or encode failure yields
/// the original buffer.
pub fn compress_image(
    bytes: &[u8],
    mime_type: &str,
    options: &CompressionOptions,
) -> CompressionResult {
    let original_size = bytes.len();
    if original_size < options.threshold_bytes {
        return CompressionResult::unchanged(bytes, mime_type);
    }

    match shrink(bytes, options) {
        Ok(compressed) => {
            let compressed_size = compressed.len();
            info!(
                "Image compressed: {:.2}MB -> {:.2}MB ({:.1}%)",
                original_size as f64 / 1024.0 / 1024.0,
                compressed_size as f64 / 1024.0 / 1024.0,
                compressed_size as f64 / original_size as f64 * 100.0
            );
            CompressionResult {
                image: InlineImage::new(compressed, OUTPUT_MIME_TYPE),
                original_size,
                compressed_size,
                compressed: true,
            }
        }
        Err(err) => {
            warn!("Image compression failed, sending original: {}", err);
            CompressionResult::unchanged(bytes, mime_type)
        }
    }
}

fn shrink(bytes: &[u8], options: &CompressionOptions) -> ImageResult<Vec<u8>> {
    let source = flatten_alpha(&image::load_from_memory(bytes)?);
    let mut quality = options.initial_quality.clamp(1, 100);
    let mut encoded = encode_jpeg(&source, quality)?;

    while encoded.len() > options.max_size_bytes && quality > options.quality_floor {
        quality = quality
            .saturating_sub(options.quality_step.max(1))
            .max(options.quality_floor.max(1));
        encoded = encode_jpeg(&source, quality)?;
    }

    if encoded.len() <= options.max_size_bytes {
        return Ok(encoded);
    }

    let (mut width, mut height) = source.dimensions();
    width = scaled(width, options.scale);
    height = scaled(height, options.scale);
    encoded = encode_jpeg(&fit_inside(&source, width, height), quality)?;

    while encoded.len() > options.max_size_bytes && width > options.min_width {
        width = scaled(width, options.scale);
        height = scaled(height, options.scale);
        encoded = encode_jpeg(
            &fit_inside(&source, width, height),
            quality.max(options.resized_quality_floor),
        )?;
    }

    Ok(encoded)
}

fn scaled(value: u32, scale: f32) -> u32 {
    ((value as f32 * scale).floor() as u32).max(1)
}

/// Resizes preserving aspect ratio within the box, never enlarging.
fn fit_inside(source: &RgbImage, width: u32, height: u32) -> RgbImage {
    if width >= source.width() && height >= source.height() {
        return source.clone();
    }
    DynamicImage::ImageRgb8(source.clone())
        .resize(width, height, FilterType::Triangle)
        .to_rgb8()
}

/// JPEG has no alpha channel, so transparent pixels are composited onto white.
fn flatten_alpha(image: &DynamicImage) -> RgbImage {
    if !image.color().has_alpha() {
        return image.to_rgb8();
    }
    let rgba = image.to_rgba8();
    let mut flattened = RgbImage::new(rgba.width(), rgba.height());
    for (x, y, pixel) in rgba.enumerate_pixels() {
        let alpha = u16::from(pixel[3]);
        let blend = |channel: u8| -> u8 {
            (((u16::from(channel) * alpha) + (255 * (255 - alpha))) / 255) as u8
        };
        flattened.put_pixel(x, y, Rgb([blend(pixel[0]), blend(pixel[1]), blend(pixel[2])]));
    }
    flattened
}

fn encode_jpeg(image: &RgbImage, quality: u8) -> ImageResult<Vec<u8>> {
    let mut bytes = Vec::new();
    let mut encoder = JpegEncoder::new_with_quality(&mut bytes, quality);
    encoder.encode_image(image)?;
    Ok(bytes)
}
