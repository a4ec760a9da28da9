//! Configuration schema definitions

use crate::memory::DEFAULT_MEMORY_BUDGET;
use crate::rate_limit::RateLimitConfig;
use crate::validation::{FileLimits, ValidationResult, Validator, MAX_FILE_SIZE};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Output format names accepted in configuration
pub const OUTPUT_FORMAT_NAMES: &[&str] = &["jpg", "jpeg", "png", "webp", "gif", "svg", "tiff", "tif"];

/// Root configuration schema
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ConfigSchema {
    /// `[general]` section
    #[serde(default)]
    pub general: GeneralConfig,

    /// `[conversion]` section
    #[serde(default)]
    pub conversion: ConversionConfig,

    /// `[limits]` section
    #[serde(default)]
    pub limits: LimitsConfig,
}

impl ConfigSchema {
    /// Check value ranges and names
    pub fn validate(&self) -> ValidationResult {
        let mut result = Validator::new()
            .one_of(
                "conversion.format",
                &self.conversion.format.to_ascii_lowercase(),
                OUTPUT_FORMAT_NAMES,
            )
            .range("conversion.quality", self.conversion.quality, 1, 100)
            .range("conversion.compression_level", self.conversion.compression_level, 1, 100)
            .range("limits.max_file_size_mb", self.limits.max_file_size_mb, 1, 1024)
            .range("limits.rate_limit_window_secs", self.limits.rate_limit_window_secs, 1, 86_400)
            .validate();

        result.merge(
            Validator::new()
                .range("limits.rate_limit_max", self.limits.rate_limit_max, 1, u32::MAX)
                .range("limits.memory_budget_mb", self.limits.memory_budget_mb, 16, u64::MAX / (1024 * 1024))
                .validate(),
        );
        result
    }
}

/// General configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneralConfig {
    /// Domain tag appended to download and archive names
    #[serde(default)]
    pub domain: String,

    /// Default archive base name
    #[serde(default = "default_archive_base_name")]
    pub archive_base_name: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            domain: String::new(),
            archive_base_name: default_archive_base_name(),
        }
    }
}

fn default_archive_base_name() -> String {
    "converted-images".to_string()
}

/// Conversion defaults
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversionConfig {
    /// Output format name
    #[serde(default = "default_format")]
    pub format: String,

    /// Quality percentage (1-100)
    #[serde(default = "default_quality")]
    pub quality: u8,

    /// Apply the compression level on top of quality
    #[serde(default)]
    pub compression_enabled: bool,

    /// Compression level (1-100)
    #[serde(default = "default_compression_level")]
    pub compression_level: u8,
}

impl Default for ConversionConfig {
    fn default() -> Self {
        Self {
            format: default_format(),
            quality: default_quality(),
            compression_enabled: false,
            compression_level: default_compression_level(),
        }
    }
}

fn default_format() -> String {
    "jpg".to_string()
}

fn default_quality() -> u8 {
    85
}

fn default_compression_level() -> u8 {
    80
}

/// Resource limits
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LimitsConfig {
    /// Per-file size ceiling in megabytes
    #[serde(default = "default_max_file_size_mb")]
    pub max_file_size_mb: u64,

    /// Conversions allowed per window
    #[serde(default = "default_rate_limit_max")]
    pub rate_limit_max: u32,

    /// Rate limit window in seconds
    #[serde(default = "default_rate_limit_window_secs")]
    pub rate_limit_window_secs: u64,

    /// Memory budget for the pressure warning, in megabytes
    #[serde(default = "default_memory_budget_mb")]
    pub memory_budget_mb: u64,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_file_size_mb: default_max_file_size_mb(),
            rate_limit_max: default_rate_limit_max(),
            rate_limit_window_secs: default_rate_limit_window_secs(),
            memory_budget_mb: default_memory_budget_mb(),
        }
    }
}

impl LimitsConfig {
    /// File limits for validation
    pub fn file_limits(&self) -> FileLimits {
        FileLimits {
            max_file_size: self.max_file_size_mb.saturating_mul(1024 * 1024),
        }
    }

    /// Rate limiter configuration
    pub fn rate_limit(&self) -> RateLimitConfig {
        RateLimitConfig::strict(self.rate_limit_max, Duration::from_secs(self.rate_limit_window_secs))
    }

    /// Memory budget in bytes
    pub fn memory_budget_bytes(&self) -> u64 {
        self.memory_budget_mb.saturating_mul(1024 * 1024)
    }
}

fn default_max_file_size_mb() -> u64 {
    MAX_FILE_SIZE / (1024 * 1024)
}

fn default_rate_limit_max() -> u32 {
    100
}

fn default_rate_limit_window_secs() -> u64 {
    60
}

fn default_memory_budget_mb() -> u64 {
    DEFAULT_MEMORY_BUDGET / (1024 * 1024)
}
