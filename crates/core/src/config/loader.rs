//! Configuration file loading

use super::schema::ConfigSchema;
use crate::error::{Error, ErrorCode, Result};
use std::path::Path;

/// Configuration wrapper
#[derive(Debug, Clone)]
pub struct Config {
    /// Parsed settings
    pub schema: ConfigSchema,
    /// File the settings came from, if any
    pub path: Option<String>,
}

impl Config {
    /// Load configuration from a file path or use defaults
    pub fn load(path: Option<&str>) -> Result<Self> {
        let config_path = path.map(String::from).or_else(find_config_file);

        let schema = if let Some(ref p) = config_path {
            load_config_file(p)?
        } else {
            ConfigSchema::default()
        };

        let validation = schema.validate();
        if !validation.is_valid() {
            let messages: Vec<String> = validation.errors().iter().map(|e| e.to_string()).collect();
            return Err(Error::new(ErrorCode::InvalidConfigValue, messages.join("; "))
                .with_context(config_path.clone().unwrap_or_else(|| "defaults".to_string())));
        }

        Ok(Self {
            schema,
            path: config_path,
        })
    }

    /// Load with defaults only (no file)
    pub fn defaults() -> Self {
        Self {
            schema: ConfigSchema::default(),
            path: None,
        }
    }
}

/// Find configuration file in standard locations
fn find_config_file() -> Option<String> {
    let candidates = [
        ".snapconvert.toml",
        "snapconvert.toml",
        ".config/snapconvert.toml",
    ];

    candidates
        .into_iter()
        .find(|candidate| Path::new(candidate).exists())
        .map(String::from)
}

/// Load and parse a TOML configuration file
fn load_config_file(path: &str) -> Result<ConfigSchema> {
    let content = std::fs::read_to_string(path).map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            Error::new(ErrorCode::ConfigNotFound, format!("Configuration file not found: {}", path))
                .with_suggestion("Create a .snapconvert.toml file or pass --config with an existing path")
        } else {
            Error::config(format!("Failed to read config file {}: {}", path, e)).with_source(e)
        }
    })?;

    toml::from_str(&content).map_err(|e| {
        Error::new(ErrorCode::ConfigParseError, format!("Failed to parse config file {}: {}", path, e))
            .with_source(e)
    })
}
