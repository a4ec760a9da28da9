//! Core utilities for snapconvert
//!
//! Shared functionality used by the image, converter and CLI crates:
//!
//! - **Error handling**: structured errors with codes, context, and recovery suggestions
//! - **Validation**: accept/reject checks for incoming files and name sanitization
//! - **Rate limiting**: sliding-window bound on conversions
//! - **Memory**: coarse memory-pressure estimate for conversion batches
//! - **Configuration**: TOML-based defaults with validation
//!
//! # Example
//!
//! ```rust
//! use snapconvert_core::validation::{validate_file, FileLimits};
//!
//! let check = validate_file("report.pdf", "application/pdf", 1024, &FileLimits::default());
//! assert!(!check.is_accepted());
//! ```
//!
//! Error codes map onto process exit codes:
//!
//! ```rust
//! use snapconvert_core::{exit_codes, ErrorCode};
//!
//! assert_eq!(ErrorCode::ArchiveEmpty.exit_code(), exit_codes::ARCHIVE_ERROR);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod config;
pub mod error;
pub mod memory;
pub mod rate_limit;
pub mod validation;

pub use error::{exit_codes, Error, ErrorCode, Result, ResultExt};

/// Re-export commonly used types
pub mod prelude {
    pub use crate::config::{Config, ConfigSchema};
    pub use crate::error::{exit_codes, Error, ErrorCode, Result, ResultExt};
    pub use crate::memory::{estimate_batch, MemoryEstimate, MemoryPressure, PendingImage};
    pub use crate::rate_limit::{RateLimitConfig, SlidingWindowLimiter};
    pub use crate::validation::{sanitize_file_name, validate_file, FileLimits, FileValidation};
}
