//! `snapconvert convert`

use super::{EncodingArgs, read_sources};
use anyhow::Result;
use snapconvert_cli::notify::StatusNotifier;
use snapconvert_cli::output::{Status, format_count, format_duration, format_size_change};
use snapconvert_cli::progress::{file_progress, finish_error, finish_success, spinner};
use snapconvert_converter::naming::dedupe;
use snapconvert_converter::{ConverterSession, FileState};
use snapconvert_core::config::Config;
use snapconvert_core::exit_codes;
use std::collections::HashSet;
use std::path::PathBuf;
use std::time::Instant;

/// Arguments for `convert`
#[derive(clap::Args, Debug)]
pub struct ConvertArgs {
    /// Images to convert
    #[arg(required = true)]
    pub files: Vec<PathBuf>,

    #[command(flatten)]
    pub encoding: EncodingArgs,

    /// Write one zip archive instead of separate files (optional base name)
    #[arg(long, value_name = "NAME", num_args = 0..=1, default_missing_value = "")]
    pub zip: Option<String>,

    /// Retry failed files once after the batch
    #[arg(long)]
    pub retry: bool,
}

/// Run the command, returning the process exit code
pub fn run(args: ConvertArgs, config: &Config, notifier: StatusNotifier) -> Result<i32> {
    let started = Instant::now();
    let session_config = args.encoding.session_config(config, None)?;
    let mut session = ConverterSession::new(session_config).with_notifier(notifier);

    let (sources, unreadable) = read_sources(&args.files);
    let intake = session.add_files(sources);
    let queued = session.sources().len();
    if queued == 0 {
        Status::error("No files to convert");
        return Ok(exit_codes::VALIDATION_ERROR);
    }

    let pb = file_progress(queued as u64);
    let summary = session.convert_all_with_progress(false, |p| pb.set_position(p.completed as u64));
    if summary.is_complete() {
        finish_success(&pb, &format_count(summary.succeeded, "file", "files"));
    } else {
        finish_error(&pb, &format!("{} failed", summary.failed));
    }

    let mut failed = summary.failed;
    if args.retry && failed > 0 {
        let errored: Vec<String> = session
            .sources()
            .iter()
            .filter(|s| matches!(s.state, FileState::Errored(_)))
            .map(|s| s.file.id().to_string())
            .collect();
        for id in errored {
            if session.retry(&id).is_ok() {
                failed -= 1;
            }
        }
    }

    for (name, reason) in session.errors() {
        Status::detail(name, reason);
    }

    if session.converted().is_empty() {
        return Ok(exit_codes::CONVERSION_ERROR);
    }

    match &args.zip {
        Some(base) => {
            let pb = spinner("Building archive...");
            let base = (!base.trim().is_empty()).then_some(base.as_str());
            let (archive, report) = session.download_all(base)?;
            let path = archive.write_to_dir(&args.encoding.output)?;
            finish_success(&pb, &format!("{} ({})", path.display(), format_count(report.included.len(), "entry", "entries")));
        }
        None => {
            let mut written = HashSet::new();
            for file in session.converted() {
                let mut download = session.download(&file.id)?;
                download.file_name = dedupe(&download.file_name, &written);
                written.insert(download.file_name.clone());
                let path = download.write_to_dir(&args.encoding.output)?;
                Status::success(&format!(
                    "{} {}x{} {}",
                    path.display(),
                    file.width,
                    file.height,
                    format_size_change(file.original_size, file.converted_size)
                ));
            }
        }
    }

    tracing::info!(elapsed = %format_duration(started.elapsed()), "Convert finished");

    let incomplete = failed > 0 || !intake.rejected.is_empty() || unreadable > 0;
    Ok(if incomplete { exit_codes::PARTIAL } else { exit_codes::SUCCESS })
}
