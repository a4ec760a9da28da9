//! `snapconvert resize`

use super::{EncodingArgs, read_sources};
use anyhow::{Context, Result, bail};
use snapconvert_cli::notify::StatusNotifier;
use snapconvert_cli::output::{Status, format_size_change};
use snapconvert_converter::{ConverterSession, ResizeDialog};
use snapconvert_core::config::Config;
use snapconvert_core::exit_codes;
use snapconvert_image::{OutputFormat, detect_format};
use std::path::PathBuf;

/// Arguments for `resize`
#[derive(clap::Args, Debug)]
pub struct ResizeArgs {
    /// Image to resize
    pub file: PathBuf,

    /// Target width in pixels
    #[arg(long)]
    pub width: u32,

    /// Target height in pixels (requires --no-lock)
    #[arg(long, requires = "no_lock")]
    pub height: Option<u32>,

    /// Do not keep the aspect ratio
    #[arg(long)]
    pub no_lock: bool,

    #[command(flatten)]
    pub encoding: EncodingArgs,
}

/// Run the command, returning the process exit code
pub fn run(args: ResizeArgs, config: &Config, notifier: StatusNotifier) -> Result<i32> {
    let (mut sources, _) = read_sources(std::slice::from_ref(&args.file));
    let Some(source) = sources.pop() else {
        return Ok(exit_codes::FAILURE);
    };

    // Without --format, keep the source's own format when it can be written
    let source_format = detect_format(source.bytes())
        .ok()
        .and_then(|f| f.extensions().first().and_then(|ext| ext.parse::<OutputFormat>().ok()));

    let session_config = args.encoding.session_config(config, source_format)?;
    let mut session = ConverterSession::new(session_config).with_notifier(notifier);

    if session.add_files(vec![source]).accepted.is_empty() {
        return Ok(exit_codes::VALIDATION_ERROR);
    }
    if !session.convert_all(false).is_complete() {
        for (name, reason) in session.errors() {
            Status::detail(name, reason);
        }
        return Ok(exit_codes::CONVERSION_ERROR);
    }

    let Some(file) = session.converted().first() else {
        bail!("Conversion produced no output");
    };
    let mut dialog = ResizeDialog::open(file);
    dialog.set_aspect_lock(!args.no_lock);
    dialog.set_width(args.width);
    if let Some(height) = args.height {
        dialog.set_height(height);
    }

    if dialog.confirm(&mut session).is_err() {
        Status::error(dialog.error().unwrap_or("Resize failed"));
        return Ok(exit_codes::CONVERSION_ERROR);
    }

    let id = dialog.converted_id().to_string();
    let file = session
        .converted_file(&id)
        .context("Resized file is missing from the session")?;
    let path = session.download(&id)?.write_to_dir(&args.encoding.output)?;

    Status::success(&format!(
        "{} {}x{} {}",
        path.display(),
        file.width,
        file.height,
        format_size_change(file.original_size, file.converted_size)
    ));
    Ok(exit_codes::SUCCESS)
}
