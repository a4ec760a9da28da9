//! Image resizing with the image crate.

use crate::convert::{ConvertOptions, EncodedImage, OutputFormat, decode, encode};
use crate::{ImageError, Result};
use image::imageops::FilterType;

/// Largest accepted edge length in pixels
pub const MAX_DIMENSION: u32 = 16_384;

/// Options for image resizing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResizeOptions {
    /// Target width in pixels
    pub width: u32,
    /// Target height in pixels
    pub height: u32,
    /// Output format
    pub format: OutputFormat,
    /// Quality (1-100)
    pub quality: u8,
    /// Compression level (1-100), when compression is enabled
    pub compression_level: Option<u8>,
}

impl ResizeOptions {
    /// Resize to `width`x`height` keeping the given encoding settings.
    pub fn new(width: u32, height: u32, encoding: &ConvertOptions) -> Self {
        Self {
            width,
            height,
            format: encoding.format,
            quality: encoding.quality,
            compression_level: encoding.compression_level,
        }
    }

    fn encoding(&self) -> ConvertOptions {
        ConvertOptions {
            format: self.format,
            quality: self.quality,
            compression_level: self.compression_level,
        }
    }
}

/// Check that a target size is usable.
pub fn validate_dimensions(width: u32, height: u32) -> Result<()> {
    if width == 0 || height == 0 || width > MAX_DIMENSION || height > MAX_DIMENSION {
        return Err(ImageError::InvalidDimensions {
            width,
            height,
            max: MAX_DIMENSION,
        });
    }
    Ok(())
}

/// Resize an image to exactly the requested dimensions.
///
/// The caller owns aspect-ratio math (see [`crate::locked_height`]).
///
/// # Arguments
/// * `data` - Encoded image bytes
/// * `options` - Target size and encoding
///
/// # Returns
/// Resized image data
pub fn resize_image(data: &[u8], options: &ResizeOptions) -> Result<EncodedImage> {
    validate_dimensions(options.width, options.height)?;

    let img = decode(data)?;

    // Resize if needed
    let resized = if (img.width(), img.height()) != (options.width, options.height) {
        img.resize_exact(options.width, options.height, FilterType::Triangle)
    } else {
        img
    };

    let bytes = encode(&resized, &options.encoding())?;

    tracing::debug!(
        width = options.width,
        height = options.height,
        format = %options.format,
        output_bytes = bytes.len(),
        "Resized image"
    );

    Ok(EncodedImage {
        bytes,
        format: options.format,
        width: options.width,
        height: options.height,
    })
}
