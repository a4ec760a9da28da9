//! Image decoding, format conversion and resizing for snapconvert.
//!
//! This crate provides:
//! - Format detection from magic bytes
//! - Metadata extraction
//! - Conversion between JPEG, PNG, WebP, GIF, TIFF and SVG
//! - Exact-size resizing and aspect-ratio helpers
//! - Alpha flattening for formats without transparency

#![warn(missing_docs)]

mod aspect;
mod detect;
mod error;
mod metadata;

#[cfg(feature = "processing")]
mod alpha;

#[cfg(feature = "processing")]
mod convert;

#[cfg(feature = "processing")]
mod resize;

#[cfg(feature = "processing")]
mod svg;

pub use aspect::{locked_height, locked_width};
pub use detect::{ImageFormat, detect_format};
pub use error::{ImageError, Result};
pub use metadata::{ImageMetadata, extract_metadata};

#[cfg(feature = "processing")]
pub use alpha::{WHITE, flatten_alpha, has_alpha_channel};

#[cfg(feature = "processing")]
pub use convert::{ConvertOptions, EncodedImage, OutputFormat, convert, decode, effective_quality, encode};

#[cfg(feature = "processing")]
pub use resize::{MAX_DIMENSION, ResizeOptions, resize_image, validate_dimensions};
