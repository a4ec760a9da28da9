//! CLI command implementations

pub mod convert;
pub mod inspect;
pub mod resize;
pub mod validate;

use snapconvert_converter::{ConversionParameters, SessionConfig, SourceFile};
use snapconvert_core::config::Config;
use snapconvert_image::OutputFormat;
use std::path::PathBuf;

/// Encoding flags shared by `convert` and `resize`
#[derive(clap::Args, Debug, Clone)]
pub struct EncodingArgs {
    /// Output format (jpg, png, webp, gif, svg, tiff)
    #[arg(short, long)]
    pub format: Option<OutputFormat>,

    /// Quality 1-100
    #[arg(short, long, value_parser = clap::value_parser!(u8).range(1..=100))]
    pub quality: Option<u8>,

    /// Enable compression at this level (1-100)
    #[arg(long = "compress", value_name = "LEVEL", value_parser = clap::value_parser!(u8).range(1..=100))]
    pub compress: Option<u8>,

    /// Directory to write results into
    #[arg(short, long, default_value = ".")]
    pub output: PathBuf,

    /// Domain tag appended to output names
    #[arg(long)]
    pub domain: Option<String>,
}

impl EncodingArgs {
    /// Session settings from config, overridden by flags
    pub fn session_config(&self, config: &Config, default_format: Option<OutputFormat>) -> anyhow::Result<SessionConfig> {
        let mut session = SessionConfig::from_schema(&config.schema)?;

        let base = session.parameters;
        session.parameters = ConversionParameters {
            format: self.format.or(default_format).unwrap_or(base.format),
            quality: self.quality.unwrap_or(base.quality),
            compression_enabled: self.compress.is_some() || base.compression_enabled,
            compression_level: self.compress.unwrap_or(base.compression_level),
        };
        if let Some(domain) = &self.domain {
            session.domain = domain.clone();
        }
        Ok(session)
    }
}

/// Read input files, reporting the ones that cannot be read
pub fn read_sources(paths: &[PathBuf]) -> (Vec<SourceFile>, usize) {
    let mut unreadable = 0;
    let sources = paths
        .iter()
        .filter_map(|path| match SourceFile::from_path(path) {
            Ok(source) => Some(source),
            Err(e) => {
                snapconvert_cli::output::Status::error(&format!("{}: {}", path.display(), e));
                unreadable += 1;
                None
            }
        })
        .collect();
    (sources, unreadable)
}
