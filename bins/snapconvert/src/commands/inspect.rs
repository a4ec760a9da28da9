//! `snapconvert detect` and `snapconvert metadata`

use anyhow::{Context, Result};
use snapconvert_cli::output::{Status, format_size};
use snapconvert_core::exit_codes;
use snapconvert_image::{detect_format, extract_metadata};
use std::path::Path;

/// Print the detected format
pub fn detect(path: &Path) -> Result<i32> {
    let data = std::fs::read(path).with_context(|| format!("Failed to read {}", path.display()))?;

    match detect_format(&data) {
        Ok(format) => {
            Status::detail("Format", format.name());
            Status::detail("MIME", format.mime_type());
            Status::detail("Extensions", &format.extensions().join(", "));
            Ok(exit_codes::SUCCESS)
        }
        Err(e) => {
            Status::error(&format!("{}: {}", path.display(), e));
            Ok(exit_codes::VALIDATION_ERROR)
        }
    }
}

/// Print dimensions and format
pub fn metadata(path: &Path, json: bool) -> Result<i32> {
    let data = std::fs::read(path).with_context(|| format!("Failed to read {}", path.display()))?;

    let Some(meta) = extract_metadata(&data) else {
        Status::error(&format!("{}: could not read image dimensions", path.display()));
        return Ok(exit_codes::VALIDATION_ERROR);
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&meta)?);
    } else {
        let orientation = if meta.is_landscape() {
            "Landscape"
        } else if meta.is_portrait() {
            "Portrait"
        } else {
            "Square"
        };
        Status::detail("Format", meta.format.name());
        Status::detail("Dimensions", &format!("{}x{}", meta.width, meta.height));
        Status::detail("Aspect ratio", &format!("{:.2}", meta.aspect_ratio()));
        Status::detail("Size", &format_size(meta.size_bytes as u64));
        Status::detail("Orientation", orientation);
    }
    Ok(exit_codes::SUCCESS)
}
