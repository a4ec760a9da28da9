//! Error types for the image crate.

use thiserror::Error;

/// Result type alias for image operations.
pub type Result<T> = std::result::Result<T, ImageError>;

/// Errors that can occur during image operations.
#[derive(Debug, Error)]
pub enum ImageError {
    /// Unknown image format
    #[error("Unknown image format")]
    UnknownFormat,

    /// Invalid image data
    #[error("Invalid image data: {0}")]
    InvalidData(String),

    /// The source could not be decoded
    #[error("Could not decode image: {0}")]
    Decode(String),

    /// The decoded image could not be written in the target format
    #[error("Could not encode image: {0}")]
    Encode(String),

    /// Target dimensions are zero or too large
    #[error("Invalid dimensions {width}x{height}: width and height must be between 1 and {max}")]
    InvalidDimensions {
        /// Requested width
        width: u32,
        /// Requested height
        height: u32,
        /// Largest accepted edge
        max: u32,
    },

    /// Unrecognized output format name
    #[error("Unsupported output format `{0}`")]
    UnsupportedFormat(String),

    /// SVG parsing or rendering failed
    #[error("SVG error: {0}")]
    Svg(String),

    /// IO error
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// Image processing error
    #[cfg(feature = "processing")]
    #[error("Image processing error: {0}")]
    ProcessingError(#[from] image::ImageError),
}

impl ImageError {
    /// True when the failure happened while reading the source image
    pub fn is_decode(&self) -> bool {
        match self {
            ImageError::UnknownFormat
            | ImageError::InvalidData(_)
            | ImageError::Decode(_)
            | ImageError::Svg(_) => true,
            #[cfg(feature = "processing")]
            ImageError::ProcessingError(e) => {
                matches!(e, image::ImageError::Decoding(_) | image::ImageError::Unsupported(_))
            }
            _ => false,
        }
    }
}
