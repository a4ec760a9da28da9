//! snapconvert: convert, resize and package images.

use clap::{Parser, Subcommand};
use owo_colors::OwoColorize;
use snapconvert_cli::notify::StatusNotifier;
use snapconvert_converter::ConverterError;
use snapconvert_core::config::Config;
use snapconvert_core::exit_codes;
use snapconvert_telemetry::TelemetryConfig;
use std::path::PathBuf;
use std::process::ExitCode;

mod commands;

use commands::{convert, inspect, resize, validate};

/// Image format converter and resizer
#[derive(Parser)]
#[command(name = "snapconvert")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Only print warnings and errors
    #[arg(long, global = true, conflicts_with = "verbose")]
    quiet: bool,

    /// Path to a snapconvert.toml
    #[arg(long, global = true, env = "SNAPCONVERT_CONFIG")]
    config: Option<PathBuf>,

    /// Write logs to stderr as JSON lines
    #[arg(long, global = true)]
    log_json: bool,

    /// Print collected metrics as JSON when done
    #[arg(long, global = true)]
    metrics: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Convert images to another format
    Convert(convert::ConvertArgs),

    /// Convert one image and resize it
    Resize(resize::ResizeArgs),

    /// Detect image format from file contents
    Detect {
        /// Path to image file
        path: PathBuf,
    },

    /// Show dimensions and format of an image
    Metadata {
        /// Path to image file
        path: PathBuf,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Check whether files would be accepted for conversion
    Validate {
        /// Files to check
        #[arg(required = true)]
        paths: Vec<PathBuf>,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let mut telemetry = if cli.verbose {
        TelemetryConfig::verbose()
    } else {
        TelemetryConfig::default()
    };
    telemetry.json = cli.log_json;
    if let Err(e) = snapconvert_telemetry::init_with_config(telemetry) {
        eprintln!("{} {}", "Warning:".yellow().bold(), e);
    }

    let notifier = StatusNotifier { quiet: cli.quiet };

    let result = load_config(&cli).and_then(|config| match cli.command {
        Commands::Convert(args) => convert::run(args, &config, notifier),
        Commands::Resize(args) => resize::run(args, &config, notifier),
        Commands::Detect { path } => inspect::detect(&path),
        Commands::Metadata { path, json } => inspect::metadata(&path, json),
        Commands::Validate { paths } => validate::run(&paths, &config),
    });

    if cli.metrics {
        match serde_json::to_string_pretty(&snapconvert_telemetry::metrics().export_json()) {
            Ok(json) => eprintln!("{json}"),
            Err(e) => tracing::warn!(error = %e, "Could not serialize metrics"),
        }
    }

    match result {
        Ok(code) => exit_code(code),
        Err(e) => {
            eprintln!("{} {:#}", "Error:".red().bold(), e);
            exit_code(exit_code_for(&e))
        }
    }
}

fn load_config(cli: &Cli) -> anyhow::Result<Config> {
    let path = cli.config.as_ref().map(|p| p.to_string_lossy().into_owned());
    let config = Config::load(path.as_deref())?;
    if let Some(path) = &config.path {
        tracing::debug!(%path, "Loaded config");
    }
    Ok(config)
}

fn exit_code_for(err: &anyhow::Error) -> i32 {
    if let Some(e) = err.downcast_ref::<snapconvert_core::Error>() {
        return e.code.exit_code();
    }
    if let Some(e) = err.downcast_ref::<ConverterError>() {
        return e.code().exit_code();
    }
    exit_codes::FAILURE
}

fn exit_code(code: i32) -> ExitCode {
    ExitCode::from(u8::try_from(code).unwrap_or(1))
}
