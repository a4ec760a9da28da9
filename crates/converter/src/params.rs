//! Session-wide conversion parameters.

use serde::{Deserialize, Serialize};
use snapconvert_core::config::ConversionConfig;
use snapconvert_image::{ConvertOptions, OutputFormat};

/// Output format, quality and compression chosen for the session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversionParameters {
    /// Target format
    pub format: OutputFormat,
    /// Quality percentage (1-100)
    pub quality: u8,
    /// Apply `compression_level` on top of quality
    pub compression_enabled: bool,
    /// Compression level (1-100)
    pub compression_level: u8,
}

impl Default for ConversionParameters {
    fn default() -> Self {
        Self {
            format: OutputFormat::Jpeg,
            quality: 85,
            compression_enabled: false,
            compression_level: 80,
        }
    }
}

impl ConversionParameters {
    /// Parameters for `format` with default quality settings
    pub fn for_format(format: OutputFormat) -> Self {
        Self {
            format,
            ..Self::default()
        }
    }

    /// Copy with quality and level pulled into 1..=100
    #[must_use]
    pub fn clamped(self) -> Self {
        Self {
            quality: self.quality.clamp(1, 100),
            compression_level: self.compression_level.clamp(1, 100),
            ..self
        }
    }

    /// Compression level if enabled
    pub fn active_compression(&self) -> Option<u8> {
        self.compression_enabled.then_some(self.compression_level)
    }

    /// Encoder options for these parameters
    pub fn to_convert_options(&self) -> ConvertOptions {
        ConvertOptions {
            format: self.format,
            quality: self.quality,
            compression_level: self.active_compression(),
        }
    }

    /// Build from the `[conversion]` config section
    pub fn from_config(config: &ConversionConfig) -> snapconvert_image::Result<Self> {
        Ok(Self {
            format: config.format.parse()?,
            quality: config.quality,
            compression_enabled: config.compression_enabled,
            compression_level: config.compression_level,
        }
        .clamped())
    }
}
