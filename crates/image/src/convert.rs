//! Format conversion: decode a source image and re-encode it.
//!
//! Conversion never changes pixel dimensions; use [`crate::resize_image`]
//! for that.

use crate::alpha::{WHITE, flatten_alpha};
use crate::{ImageError, ImageFormat, Result, detect_format, svg};
use image::codecs::png::{CompressionType, FilterType as PngFilter, PngEncoder};
use image::{ColorType, DynamicImage, ImageEncoder, ImageOutputFormat};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::io::Cursor;
use std::str::FromStr;

/// Formats the converter can write.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// JPEG (lossy, quality applies)
    #[serde(rename = "jpg", alias = "jpeg")]
    Jpeg,
    /// PNG (lossless, compression level applies)
    Png,
    /// WebP (lossless encoder)
    WebP,
    /// GIF (256-color palette)
    Gif,
    /// SVG document embedding a PNG raster
    Svg,
    /// TIFF (lossless)
    Tiff,
}

impl OutputFormat {
    /// Every output format, in menu order.
    pub const ALL: [OutputFormat; 6] = [
        OutputFormat::Jpeg,
        OutputFormat::Png,
        OutputFormat::WebP,
        OutputFormat::Gif,
        OutputFormat::Svg,
        OutputFormat::Tiff,
    ];

    /// File extension written for this format.
    pub fn extension(&self) -> &'static str {
        match self {
            OutputFormat::Jpeg => "jpg",
            OutputFormat::Png => "png",
            OutputFormat::WebP => "webp",
            OutputFormat::Gif => "gif",
            OutputFormat::Svg => "svg",
            OutputFormat::Tiff => "tiff",
        }
    }

    /// MIME type of the encoded output.
    pub fn mime_type(&self) -> &'static str {
        self.as_image_format().mime_type()
    }

    /// Whether the quality slider changes the encoded output.
    pub fn is_lossy(&self) -> bool {
        matches!(self, OutputFormat::Jpeg)
    }

    /// Whether the compression level changes the encoded output.
    pub fn uses_compression(&self) -> bool {
        matches!(self, OutputFormat::Jpeg | OutputFormat::Png | OutputFormat::Svg)
    }

    /// The detected-format counterpart.
    pub fn as_image_format(&self) -> ImageFormat {
        match self {
            OutputFormat::Jpeg => ImageFormat::Jpeg,
            OutputFormat::Png => ImageFormat::Png,
            OutputFormat::WebP => ImageFormat::WebP,
            OutputFormat::Gif => ImageFormat::Gif,
            OutputFormat::Svg => ImageFormat::Svg,
            OutputFormat::Tiff => ImageFormat::Tiff,
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_image_format().name())
    }
}

impl FromStr for OutputFormat {
    type Err = ImageError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().trim_start_matches('.').to_ascii_lowercase().as_str() {
            "jpg" | "jpeg" => Ok(OutputFormat::Jpeg),
            "png" => Ok(OutputFormat::Png),
            "webp" => Ok(OutputFormat::WebP),
            "gif" => Ok(OutputFormat::Gif),
            "svg" => Ok(OutputFormat::Svg),
            "tiff" | "tif" => Ok(OutputFormat::Tiff),
            other => Err(ImageError::UnsupportedFormat(other.to_string())),
        }
    }
}

/// Parameters for a conversion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConvertOptions {
    /// Target format
    pub format: OutputFormat,
    /// Quality percentage (1-100)
    pub quality: u8,
    /// Compression level (1-100), when compression is enabled
    pub compression_level: Option<u8>,
}

impl Default for ConvertOptions {
    fn default() -> Self {
        Self {
            format: OutputFormat::Jpeg,
            quality: 85,
            compression_level: None,
        }
    }
}

impl ConvertOptions {
    /// Quality actually handed to lossy encoders.
    pub fn effective_quality(&self) -> u8 {
        effective_quality(self.quality, self.compression_level)
    }
}

/// Encoded output of a conversion or resize.
#[derive(Clone, PartialEq, Eq)]
pub struct EncodedImage {
    /// Encoded bytes
    pub bytes: Vec<u8>,
    /// Format of `bytes`
    pub format: OutputFormat,
    /// Pixel width
    pub width: u32,
    /// Pixel height
    pub height: u32,
}

impl fmt::Debug for EncodedImage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EncodedImage")
            .field("bytes", &self.bytes.len())
            .field("format", &self.format)
            .field("width", &self.width)
            .field("height", &self.height)
            .finish()
    }
}

/// Combine quality and compression level into one encoder quality.
///
/// Without a compression level the quality is used as is. With one, the
/// two act as multiplicative factors: `round(quality * level / 100)`,
/// clamped to 1..=100.
///
/// # Example
/// ```
/// use snapconvert_image::effective_quality;
///
/// assert_eq!(effective_quality(90, None), 90);
/// assert_eq!(effective_quality(90, Some(80)), 72);
/// ```
pub fn effective_quality(quality: u8, compression_level: Option<u8>) -> u8 {
    let quality = quality.clamp(1, 100);
    match compression_level {
        None => quality,
        Some(level) => {
            let level = u32::from(level.clamp(1, 100));
            let combined = (u32::from(quality) * level + 50) / 100;
            u8::try_from(combined.clamp(1, 100)).unwrap_or(100)
        }
    }
}

/// Decode any supported source into a bitmap.
pub fn decode(data: &[u8]) -> Result<DynamicImage> {
    let format = detect_format(data).map_err(|e| match e {
        ImageError::UnknownFormat => ImageError::Decode("Unrecognized image data".to_string()),
        other => ImageError::Decode(other.to_string()),
    })?;

    match (format, format.to_image_crate()) {
        (ImageFormat::Svg, _) => svg::rasterize(data),
        // No AVIF decoder in the image 0.24 feature set
        (ImageFormat::Avif, _) | (_, None) => Err(ImageError::Decode(format!(
            "{} sources cannot be decoded",
            format.name()
        ))),
        (_, Some(image_format)) => image::load_from_memory_with_format(data, image_format)
            .map_err(|e| ImageError::Decode(e.to_string())),
    }
}

/// Encode a bitmap in the requested format.
pub fn encode(img: &DynamicImage, options: &ConvertOptions) -> Result<Vec<u8>> {
    let mut buffer = Cursor::new(Vec::new());

    let written = match options.format {
        OutputFormat::Jpeg => flatten_alpha(img, WHITE)
            .write_to(&mut buffer, ImageOutputFormat::Jpeg(options.effective_quality())),
        OutputFormat::Png => {
            return encode_png(img, options.compression_level);
        }
        OutputFormat::WebP => {
            DynamicImage::ImageRgba8(img.to_rgba8()).write_to(&mut buffer, ImageOutputFormat::WebP)
        }
        OutputFormat::Gif => {
            DynamicImage::ImageRgba8(img.to_rgba8()).write_to(&mut buffer, ImageOutputFormat::Gif)
        }
        OutputFormat::Tiff => {
            DynamicImage::ImageRgba8(img.to_rgba8()).write_to(&mut buffer, ImageOutputFormat::Tiff)
        }
        OutputFormat::Svg => {
            let png = encode_png(img, options.compression_level)?;
            return Ok(svg::wrap_png(&png, img.width(), img.height()).into_bytes());
        }
    };

    written.map_err(|e| ImageError::Encode(e.to_string()))?;
    Ok(buffer.into_inner())
}

/// Write RGBA8 PNG, mapping the compression level onto the encoder's
/// compression presets.
pub(crate) fn encode_png(img: &DynamicImage, compression_level: Option<u8>) -> Result<Vec<u8>> {
    let compression = match compression_level {
        None => CompressionType::Default,
        Some(level) if level <= 33 => CompressionType::Fast,
        Some(level) if level <= 66 => CompressionType::Default,
        Some(_) => CompressionType::Best,
    };

    let rgba = img.to_rgba8();
    let mut bytes = Vec::new();
    PngEncoder::new_with_quality(&mut bytes, compression, PngFilter::Adaptive)
        .write_image(rgba.as_raw(), rgba.width(), rgba.height(), ColorType::Rgba8)
        .map_err(|e| ImageError::Encode(e.to_string()))?;
    Ok(bytes)
}

/// Convert image bytes to another format.
///
/// # Arguments
/// * `data` - Source file bytes
/// * `options` - Target format and quality
///
/// # Returns
/// Encoded bytes with the (unchanged) pixel dimensions
pub fn convert(data: &[u8], options: &ConvertOptions) -> Result<EncodedImage> {
    let img = decode(data)?;
    let bytes = encode(&img, options)?;

    tracing::debug!(
        format = %options.format,
        quality = options.effective_quality(),
        width = img.width(),
        height = img.height(),
        input_bytes = data.len(),
        output_bytes = bytes.len(),
        "Converted image"
    );

    Ok(EncodedImage {
        bytes,
        format: options.format,
        width: img.width(),
        height: img.height(),
    })
}
