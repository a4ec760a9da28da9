//! `snapconvert validate`

use anyhow::Result;
use snapconvert_cli::output::{Status, format_count};
use snapconvert_converter::SourceFile;
use snapconvert_core::config::Config;
use snapconvert_core::exit_codes;
use snapconvert_core::validation::validate_file;
use std::path::PathBuf;

/// Check each file against the intake rules
pub fn run(paths: &[PathBuf], config: &Config) -> Result<i32> {
    let limits = config.schema.limits.file_limits();
    let mut rejected = 0;

    for path in paths {
        let source = match SourceFile::from_path(path) {
            Ok(source) => source,
            Err(e) => {
                Status::error(&format!("{}: {}", path.display(), e));
                rejected += 1;
                continue;
            }
        };

        let check = validate_file(&source.name, &source.mime, source.size(), &limits);
        if check.is_accepted() {
            Status::success(&format!("{} -> {}", source.name, check.sanitized_name));
        } else {
            rejected += 1;
            Status::error(&format!("{}: {}", source.name, check.reason().unwrap_or("rejected")));
        }
        for warning in check.result.warnings() {
            Status::warning(&format!("{}: {}", source.name, warning.message));
        }
    }

    if rejected > 0 {
        Status::info(&format!("{} rejected", format_count(rejected, "file", "files")));
        Ok(exit_codes::VALIDATION_ERROR)
    } else {
        Ok(exit_codes::SUCCESS)
    }
}
