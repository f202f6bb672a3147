//! CPU-bound half of the photo pipeline: decode, bound the width, re-encode

use image::{DynamicImage, ImageFormat, ImageReader, codecs::jpeg::JpegEncoder, imageops::FilterType};
use std::io::Cursor;
use tracing::debug;

use crate::errors::{AppError, AppResult};

/// JPEG produced from an uploaded image
#[derive(Debug, Clone)]
pub struct NormalizedImage {
    pub bytes: Vec<u8>,
    pub width: u32,
    pub height: u32,
    pub source_format: ImageFormat,
    pub resized: bool,
}

/// Output size for an image bounded to `max_width`, keeping the aspect ratio.
///
/// Images at or under the bound keep their size. Height is rounded to the
/// nearest pixel and never drops below 1.
pub fn target_dimensions(width: u32, height: u32, max_width: u32) -> (u32, u32) {
    if width <= max_width || width == 0 {
        return (width, height);
    }
    let scaled = (u64::from(height) * u64::from(max_width) + u64::from(width) / 2) / u64::from(width);
    (max_width, scaled.max(1) as u32)
}

/// Decode `data` in whatever format it carries
pub fn decode(data: &[u8]) -> AppResult<(DynamicImage, ImageFormat)> {
    let reader = ImageReader::new(Cursor::new(data))
        .with_guessed_format()
        .map_err(|e| AppError::decode(format!("Failed to read image header: {e}")))?;

    let format = reader
        .format()
        .ok_or_else(|| AppError::decode("Unrecognized image format"))?;

    let image = reader
        .decode()
        .map_err(|e| AppError::decode(format!("Failed to decode {format:?} image: {e}")))?;

    Ok((image, format))
}

/// Encode as baseline JPEG; alpha is discarded
pub fn encode_jpeg(image: &DynamicImage, quality: u8) -> AppResult<Vec<u8>> {
    let rgb = image.to_rgb8();
    let mut out = Vec::new();
    JpegEncoder::new_with_quality(&mut out, quality)
        .encode_image(&rgb)
        .map_err(|e| AppError::encode(format!("Failed to encode JPEG: {e}")))?;
    Ok(out)
}

/// Decode, downsample wider-than-`max_width` images with Lanczos3, and
/// re-encode as JPEG at `quality`. Re-encoding happens even for JPEG input.
pub fn normalize(data: &[u8], max_width: u32, quality: u8) -> AppResult<NormalizedImage> {
    let (image, source_format) = decode(data)?;
    let (width, height) = (image.width(), image.height());
    let (target_width, target_height) = target_dimensions(width, height, max_width);

    let resized = (target_width, target_height) != (width, height);
    let image = if resized {
        debug!(
            "Resizing {:?} image {}x{} -> {}x{}",
            source_format, width, height, target_width, target_height
        );
        image.resize_exact(target_width, target_height, FilterType::Lanczos3)
    } else {
        image
    };

    let bytes = encode_jpeg(&image, quality)?;

    Ok(NormalizedImage {
        bytes,
        width: image.width(),
        height: image.height(),
        source_format,
        resized,
    })
}
