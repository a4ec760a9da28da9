//! Error types for the converter

use snapconvert_core::ErrorCode;
use snapconvert_image::ImageError;
use thiserror::Error;

/// Result type alias for converter operations
pub type Result<T> = std::result::Result<T, ConverterError>;

/// Converter errors
#[derive(Debug, Error)]
pub enum ConverterError {
    /// A file was rejected on intake
    #[error("{name}: {reason}")]
    Validation {
        /// Original file name
        name: String,
        /// Why it was rejected
        reason: String,
        /// Matching error code
        code: ErrorCode,
    },

    /// Decoding, encoding or resizing failed
    #[error(transparent)]
    Image(#[from] ImageError),

    /// The sliding-window limit was reached
    #[error("Too many conversions, try again in a moment")]
    RateLimited,

    /// No source with this id
    #[error("Unknown source file `{0}`")]
    UnknownSource(String),

    /// No converted file with this id
    #[error("Unknown converted file `{0}`")]
    UnknownConverted(String),

    /// The blob behind a converted file is gone
    #[error("Converted data is no longer available")]
    BlobReleased,

    /// Archive could not be produced
    #[error("Archive error: {0}")]
    Archive(String),

    /// Zip writer failure
    #[error("Zip error: {0}")]
    Zip(#[from] zip::result::ZipError),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl ConverterError {
    /// Create an archive error
    pub fn archive(msg: impl Into<String>) -> Self {
        Self::Archive(msg.into())
    }

    /// Map onto the shared error code table
    #[must_use]
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::Validation { code, .. } => *code,
            Self::Image(e) => match e {
                ImageError::UnknownFormat => ErrorCode::UnknownFormat,
                ImageError::InvalidDimensions { .. } => ErrorCode::InvalidDimensions,
                ImageError::UnsupportedFormat(_) => ErrorCode::UnsupportedOutput,
                ImageError::Encode(_) => ErrorCode::EncodeError,
                ImageError::IoError(_) => ErrorCode::IoError,
                other if other.is_decode() => ErrorCode::DecodeError,
                _ => ErrorCode::EncodeError,
            },
            Self::RateLimited => ErrorCode::RateLimited,
            Self::UnknownSource(_) | Self::UnknownConverted(_) => ErrorCode::ValidationError,
            Self::BlobReleased => ErrorCode::BlobReleased,
            Self::Archive(_) | Self::Zip(_) => ErrorCode::ArchiveError,
            Self::Io(_) => ErrorCode::IoError,
        }
    }
}

impl From<ConverterError> for snapconvert_core::Error {
    fn from(err: ConverterError) -> Self {
        let code = err.code();
        let message = err.to_string();
        snapconvert_core::Error::new(code, message).with_source(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes() {
        assert_eq!(ConverterError::RateLimited.code(), ErrorCode::RateLimited);
        assert_eq!(
            ConverterError::from(ImageError::Decode("bad".into())).code(),
            ErrorCode::DecodeError
        );
        assert_eq!(
            ConverterError::from(ImageError::InvalidDimensions {
                width: 0,
                height: 1,
                max: 10
            })
            .code(),
            ErrorCode::InvalidDimensions
        );
        assert_eq!(ConverterError::archive("empty").code(), ErrorCode::ArchiveError);
    }

    #[test]
    fn test_image_error_is_transparent() {
        let err = ConverterError::from(ImageError::Decode("truncated".into()));
        assert_eq!(err.to_string(), "Could not decode image: truncated");
    }

    #[test]
    fn test_into_core_error() {
        let core: snapconvert_core::Error = ConverterError::BlobReleased.into();
        assert_eq!(core.code, ErrorCode::BlobReleased);
    }
}
