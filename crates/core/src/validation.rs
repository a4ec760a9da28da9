//! Input file validation and file name sanitization
//!
//! Every file handed to the converter passes through [`validate_file`] first:
//! - Declared MIME type must be an image type
//! - Size must be non-zero and under the configured ceiling
//! - Extension must be one the converter accepts
//! - The name is sanitized for use as a download or archive entry name
//!
//! # Example
//!
//! ```rust
//! use snapconvert_core::validation::{validate_file, FileLimits};
//!
//! let check = validate_file("holiday photo.png", "image/png", 2048, &FileLimits::default());
//! assert!(check.is_accepted());
//! assert_eq!(check.sanitized_name, "holiday-photo.png");
//! ```

use crate::error::{Error, ErrorCode, Result};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

/// Hard per-file size ceiling (50 MB)
pub const MAX_FILE_SIZE: u64 = 50 * 1024 * 1024;

/// Extensions accepted for conversion input
pub const ACCEPTED_EXTENSIONS: &[&str] = &[
    "jpg", "jpeg", "png", "gif", "webp", "avif", "bmp", "tiff", "tif", "svg",
];

/// Longest sanitized name, extension included
const MAX_NAME_LENGTH: usize = 200;

static UNSAFE_CHARS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"[<>:"/\\|?*\x00-\x1F\x7F]"#).unwrap());
static WHITESPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());
static DASH_BEFORE_DOT: Lazy<Regex> = Lazy::new(|| Regex::new(r"-+\.").unwrap());
static DOT_RUNS: Lazy<Regex> = Lazy::new(|| Regex::new(r"\.{2,}").unwrap());
static DASH_RUNS: Lazy<Regex> = Lazy::new(|| Regex::new(r"-{2,}").unwrap());

/// Validation error
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationError {
    /// Field that failed validation
    pub field: String,
    /// Error message
    pub message: String,
    /// Error code
    pub code: String,
    /// Expected value (if applicable)
    pub expected: Option<String>,
    /// Actual value (if applicable)
    pub actual: Option<String>,
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Validation result
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ValidationResult {
    errors: Vec<ValidationError>,
    warnings: Vec<ValidationError>,
}

impl ValidationResult {
    /// Create a new empty result
    pub fn new() -> Self {
        Self::default()
    }

    /// Check if validation passed
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    /// Get all errors
    pub fn errors(&self) -> &[ValidationError] {
        &self.errors
    }

    /// Get all warnings
    pub fn warnings(&self) -> &[ValidationError] {
        &self.warnings
    }

    /// Add an error
    pub fn add_error(&mut self, error: ValidationError) {
        self.errors.push(error);
    }

    /// Add a warning
    pub fn add_warning(&mut self, warning: ValidationError) {
        self.warnings.push(warning);
    }

    /// Merge another result into this one
    pub fn merge(&mut self, other: ValidationResult) {
        self.errors.extend(other.errors);
        self.warnings.extend(other.warnings);
    }

    /// Convert to Result type
    pub fn to_result(self) -> Result<()> {
        if self.is_valid() {
            Ok(())
        } else {
            let messages: Vec<String> = self.errors.iter().map(|e| e.to_string()).collect();
            Err(Error::new(
                ErrorCode::ValidationError,
                format!("Validation failed: {}", messages.join("; ")),
            ))
        }
    }
}

/// Fluent validator builder
pub struct Validator {
    result: ValidationResult,
}

impl Default for Validator {
    fn default() -> Self {
        Self::new()
    }
}

impl Validator {
    /// Create a new validator
    pub fn new() -> Self {
        Self {
            result: ValidationResult::new(),
        }
    }

    /// Validate that a field is not empty
    pub fn required(mut self, field: &str, value: &str) -> Self {
        if value.trim().is_empty() {
            self.result.add_error(ValidationError {
                field: field.to_string(),
                message: "Field is required".to_string(),
                code: "REQUIRED".to_string(),
                expected: Some("non-empty value".to_string()),
                actual: Some("empty".to_string()),
            });
        }
        self
    }

    /// Validate that a value is in a list of allowed values
    pub fn one_of(mut self, field: &str, value: &str, allowed: &[&str]) -> Self {
        if !allowed.contains(&value) {
            self.result.add_error(ValidationError {
                field: field.to_string(),
                message: format!("Must be one of: {}", allowed.join(", ")),
                code: "ONE_OF".to_string(),
                expected: Some(allowed.join(", ")),
                actual: Some(value.to_string()),
            });
        }
        self
    }

    /// Validate a numeric range
    pub fn range<T: PartialOrd + std::fmt::Display>(
        mut self,
        field: &str,
        value: T,
        min: T,
        max: T,
    ) -> Self {
        if value < min || value > max {
            self.result.add_error(ValidationError {
                field: field.to_string(),
                message: format!("Must be between {} and {}", min, max),
                code: "RANGE".to_string(),
                expected: Some(format!("{} - {}", min, max)),
                actual: Some(value.to_string()),
            });
        }
        self
    }

    /// Add a custom validation with its own error code
    pub fn check<F>(mut self, field: &str, code: &str, f: F) -> Self
    where
        F: FnOnce() -> Option<String>,
    {
        if let Some(message) = f() {
            self.result.add_error(ValidationError {
                field: field.to_string(),
                message,
                code: code.to_string(),
                expected: None,
                actual: None,
            });
        }
        self
    }

    /// Add a warning (non-blocking)
    pub fn warn_if(mut self, field: &str, code: &str, condition: bool, message: &str) -> Self {
        if condition {
            self.result.add_warning(ValidationError {
                field: field.to_string(),
                message: message.to_string(),
                code: code.to_string(),
                expected: None,
                actual: None,
            });
        }
        self
    }

    /// Complete validation and return result
    pub fn validate(self) -> ValidationResult {
        self.result
    }
}

/// Limits applied to incoming files
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileLimits {
    /// Maximum accepted size in bytes
    pub max_file_size: u64,
}

impl Default for FileLimits {
    fn default() -> Self {
        Self {
            max_file_size: MAX_FILE_SIZE,
        }
    }
}

/// Outcome of validating one candidate file
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileValidation {
    /// Name safe for downloads and archive entries
    pub sanitized_name: String,
    /// Collected errors and warnings
    pub result: ValidationResult,
}

impl FileValidation {
    /// True when the file may be converted
    pub fn is_accepted(&self) -> bool {
        self.result.is_valid()
    }

    /// First rejection reason, if any
    pub fn reason(&self) -> Option<&str> {
        self.result.errors().first().map(|e| e.message.as_str())
    }

    /// Error code of the first rejection
    pub fn error_code(&self) -> Option<ErrorCode> {
        self.result.errors().first().map(|e| match e.code.as_str() {
            "UNSUPPORTED_TYPE" | "UNSUPPORTED_EXTENSION" => ErrorCode::UnsupportedType,
            "FILE_TOO_LARGE" => ErrorCode::FileTooLarge,
            "EMPTY_FILE" => ErrorCode::EmptyFile,
            "REQUIRED" => ErrorCode::InvalidFileName,
            _ => ErrorCode::ValidationError,
        })
    }
}

/// Validate a candidate file from its declared metadata.
///
/// Rejects non-image MIME types, empty files, files over the size ceiling
/// and unaccepted extensions. A MIME type that disagrees with the extension
/// and a name that needed sanitizing are reported as warnings.
pub fn validate_file(name: &str, mime: &str, size: u64, limits: &FileLimits) -> FileValidation {
    let sanitized_name = sanitize_file_name(name);
    let extension = extension_of(&sanitized_name);
    let mime = mime.trim().to_ascii_lowercase();

    let result = Validator::new()
        .required("name", name)
        .check("type", "UNSUPPORTED_TYPE", || {
            (!mime.starts_with("image/"))
                .then(|| format!("Not an image file (declared type `{}`)", display_mime(&mime)))
        })
        .check("size", "EMPTY_FILE", || (size == 0).then(|| "File is empty".to_string()))
        .check("size", "FILE_TOO_LARGE", || {
            (size > limits.max_file_size).then(|| {
                format!(
                    "File is too large ({:.1} MB, limit {} MB)",
                    size as f64 / (1024.0 * 1024.0),
                    limits.max_file_size / (1024 * 1024)
                )
            })
        })
        .check("extension", "UNSUPPORTED_EXTENSION", || {
            match extension.as_deref() {
                Some(ext) if ACCEPTED_EXTENSIONS.contains(&ext) => None,
                Some(ext) => Some(format!("Unsupported file extension `.{}`", ext)),
                None => Some("File has no extension".to_string()),
            }
        })
        .warn_if(
            "type",
            "MIME_MISMATCH",
            mime.starts_with("image/")
                && extension
                    .as_deref()
                    .and_then(mime_for_extension)
                    .is_some_and(|expected| !mime_matches(expected, &mime)),
            "Declared type does not match the file extension",
        )
        .warn_if(
            "name",
            "NAME_SANITIZED",
            !name.trim().is_empty() && sanitized_name != name,
            "File name was changed to remove unsafe characters",
        )
        .validate();

    FileValidation {
        sanitized_name,
        result,
    }
}

/// Strip characters that are unsafe in download and archive entry names.
///
/// Directory components are dropped, reserved and control characters are
/// removed, whitespace runs become `-`, and leading/trailing dots are
/// trimmed. The result is never empty.
pub fn sanitize_file_name(name: &str) -> String {
    let base = name.rsplit(['/', '\\']).next().unwrap_or(name);
    let cleaned = UNSAFE_CHARS.replace_all(base, "");
    let cleaned = WHITESPACE.replace_all(cleaned.trim(), "-");
    let cleaned = DASH_BEFORE_DOT.replace_all(&cleaned, ".");
    let cleaned = DOT_RUNS.replace_all(&cleaned, ".");
    let cleaned = DASH_RUNS.replace_all(&cleaned, "-");
    let cleaned = cleaned.trim_matches(|c: char| c == '.' || c == '-' || c.is_whitespace());

    let mut sanitized = truncate_preserving_extension(cleaned, MAX_NAME_LENGTH);
    if sanitized.is_empty() || sanitized.starts_with('.') {
        sanitized = format!("image{}", sanitized);
    }
    sanitized
}

/// Lowercased extension of a file name, if any
pub fn extension_of(name: &str) -> Option<String> {
    let (stem, ext) = name.rsplit_once('.')?;
    if stem.is_empty() || ext.is_empty() {
        return None;
    }
    Some(ext.to_ascii_lowercase())
}

/// Canonical MIME type for an accepted extension
pub fn mime_for_extension(ext: &str) -> Option<&'static str> {
    match ext.to_ascii_lowercase().as_str() {
        "jpg" | "jpeg" => Some("image/jpeg"),
        "png" => Some("image/png"),
        "gif" => Some("image/gif"),
        "webp" => Some("image/webp"),
        "avif" => Some("image/avif"),
        "bmp" => Some("image/bmp"),
        "tiff" | "tif" => Some("image/tiff"),
        "svg" => Some("image/svg+xml"),
        _ => None,
    }
}

fn mime_matches(expected: &str, declared: &str) -> bool {
    expected == declared
        || matches!(
            (expected, declared),
            ("image/jpeg", "image/jpg" | "image/pjpeg")
                | ("image/bmp", "image/x-ms-bmp" | "image/x-bmp")
                | ("image/svg+xml", "image/svg")
        )
}

fn display_mime(mime: &str) -> &str {
    if mime.is_empty() { "unknown" } else { mime }
}

fn truncate_preserving_extension(name: &str, max: usize) -> String {
    if name.chars().count() <= max {
        return name.to_string();
    }
    match name.rsplit_once('.') {
        Some((stem, ext)) if ext.chars().count() < max / 2 => {
            let keep = max - ext.chars().count() - 1;
            let stem: String = stem.chars().take(keep).collect();
            format!("{}.{}", stem.trim_end_matches(['.', '-']), ext)
        }
        _ => name.chars().take(max).collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    const MB: u64 = 1024 * 1024;

    #[test]
    fn test_accepts_small_png() {
        let check = validate_file("cat.png", "image/png", 10 * 1024, &FileLimits::default());
        assert!(check.is_accepted());
        assert!(check.result.warnings().is_empty());
        assert_eq!(check.sanitized_name, "cat.png");
    }

    #[test]
    fn test_accepts_exactly_at_ceiling() {
        let check = validate_file("big.jpg", "image/jpeg", MAX_FILE_SIZE, &FileLimits::default());
        assert!(check.is_accepted());
    }

    #[test]
    fn test_rejects_over_ceiling() {
        let check = validate_file("big.jpg", "image/jpeg", 51 * MB, &FileLimits::default());
        assert!(!check.is_accepted());
        assert_eq!(check.error_code(), Some(ErrorCode::FileTooLarge));
        assert!(check.reason().unwrap().contains("too large"));
    }

    #[test]
    fn test_rejects_non_image_type() {
        let check = validate_file("notes.png", "text/plain", 100, &FileLimits::default());
        assert!(!check.is_accepted());
        assert_eq!(check.error_code(), Some(ErrorCode::UnsupportedType));
        assert!(check.reason().unwrap().contains("text/plain"));
    }

    #[test]
    fn test_rejects_empty_file() {
        let check = validate_file("empty.png", "image/png", 0, &FileLimits::default());
        assert_eq!(check.error_code(), Some(ErrorCode::EmptyFile));
    }

    #[test]
    fn test_rejects_unknown_extension() {
        let check = validate_file("photo.heic", "image/heic", 100, &FileLimits::default());
        assert!(!check.is_accepted());
        assert!(check.reason().unwrap().contains(".heic"));
    }

    #[test]
    fn test_custom_limit() {
        let limits = FileLimits { max_file_size: 1024 };
        assert!(!validate_file("a.gif", "image/gif", 2048, &limits).is_accepted());
    }

    #[test]
    fn test_mime_mismatch_is_warning() {
        let check = validate_file("photo.png", "image/jpeg", 100, &FileLimits::default());
        assert!(check.is_accepted());
        assert_eq!(check.result.warnings()[0].code, "MIME_MISMATCH");
    }

    #[test]
    fn test_mime_alias_is_not_mismatch() {
        let check = validate_file("photo.jpg", "image/jpg", 100, &FileLimits::default());
        assert!(check.result.warnings().is_empty());
    }

    #[test]
    fn test_sanitize_strips_reserved_characters() {
        assert_eq!(sanitize_file_name("my<photo>?.png"), "myphoto.png");
        assert_eq!(sanitize_file_name("a|b:c*d.jpg"), "abcd.jpg");
    }

    #[test]
    fn test_sanitize_drops_directories() {
        assert_eq!(sanitize_file_name("../../etc/passwd"), "passwd");
        assert_eq!(sanitize_file_name(r"C:\Users\me\cat.png"), "cat.png");
    }

    #[test]
    fn test_sanitize_whitespace_and_dots() {
        assert_eq!(sanitize_file_name("  summer   trip .png"), "summer-trip.png");
        assert_eq!(sanitize_file_name("photo..final...png"), "photo.final.png");
        assert_eq!(sanitize_file_name("...hidden.png"), "hidden.png");
    }

    #[test]
    fn test_sanitize_empty_becomes_image() {
        assert_eq!(sanitize_file_name(""), "image");
        assert_eq!(sanitize_file_name("???"), "image");
        assert_eq!(sanitize_file_name("/"), "image");
    }

    #[test]
    fn test_sanitize_truncates_keeping_extension() {
        let long = format!("{}.webp", "x".repeat(400));
        let sanitized = sanitize_file_name(&long);
        assert_eq!(sanitized.chars().count(), MAX_NAME_LENGTH);
        assert!(sanitized.ends_with(".webp"));
    }

    #[test]
    fn test_sanitized_name_warning() {
        let check = validate_file("bad:name.png", "image/png", 10, &FileLimits::default());
        assert!(check.is_accepted());
        assert!(check.result.warnings().iter().any(|w| w.code == "NAME_SANITIZED"));
    }

    #[test]
    fn test_extension_of() {
        assert_eq!(extension_of("a.PNG").as_deref(), Some("png"));
        assert_eq!(extension_of("archive.tar.gz").as_deref(), Some("gz"));
        assert_eq!(extension_of("noext"), None);
        assert_eq!(extension_of(".hidden"), None);
    }

    #[test]
    fn test_to_result() {
        let check = validate_file("x.txt", "text/plain", 10, &FileLimits::default());
        let err = check.result.to_result().unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationError);
    }

    #[test]
    fn test_range_validation() {
        let result = Validator::new().range("quality", 150, 1, 100).validate();
        assert!(!result.is_valid());
        assert_eq!(result.errors()[0].code, "RANGE");
    }

    #[test]
    fn test_one_of_validation() {
        let result = Validator::new()
            .one_of("format", "ico", &["jpg", "png"])
            .validate();
        assert_eq!(result.errors()[0].code, "ONE_OF");
    }

    proptest! {
        #[test]
        fn prop_sanitized_names_are_safe(name in "\\PC{0,300}") {
            let sanitized = sanitize_file_name(&name);
            prop_assert!(!sanitized.is_empty());
            prop_assert!(!sanitized.starts_with('.'));
            prop_assert!(!sanitized.contains(".."));
            prop_assert!(!sanitized.chars().any(|c| "<>:\"/\\|?*".contains(c) || c.is_control()));
            prop_assert!(sanitized.chars().count() <= MAX_NAME_LENGTH);
        }

        #[test]
        fn prop_sanitize_is_idempotent(name in "[a-zA-Z0-9 ._<>-]{0,60}") {
            let once = sanitize_file_name(&name);
            prop_assert_eq!(sanitize_file_name(&once), once);
        }

        #[test]
        fn prop_oversized_files_rejected(size in (MAX_FILE_SIZE + 1)..(10 * MAX_FILE_SIZE)) {
            let check = validate_file("a.png", "image/png", size, &FileLimits::default());
            prop_assert!(!check.is_accepted());
        }
    }
}
