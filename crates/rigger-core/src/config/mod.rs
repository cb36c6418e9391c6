pub mod schema;

use crate::log::{self, Topic};
use schema::{ConfigSchemaError, Validate};
use std::{fs, path::Path};
use thiserror::Error as ThisError;

pub use schema::ConfigModel;

/// Errors related to configuration loading and parsing.
#[derive(Debug, ThisError)]
pub enum ConfigError {
    #[error("cannot read config {path}: {reason}")]
    CannotRead { path: String, reason: String },

    /// TOML could not be parsed into the expected structure.
    #[error("toml error: {0}")]
    CannotParseToml(String),

    /// Wrapper for data schema-level errors.
    #[error(transparent)]
    ConfigSchema(#[from] ConfigSchemaError),
}

///
/// Config
///

pub struct Config {}

impl Config {
    /// Parse and validate a configuration from a TOML string.
    pub fn from_toml(config_str: &str) -> Result<ConfigModel, ConfigError> {
        let config: ConfigModel =
            toml::from_str(config_str).map_err(|e| ConfigError::CannotParseToml(e.to_string()))?;

        // validate
        config.validate().map_err(ConfigError::from)?;

        Ok(config)
    }

    /// Read, parse and validate a configuration file.
    pub fn load(path: impl AsRef<Path>) -> Result<ConfigModel, ConfigError> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|e| ConfigError::CannotRead {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;

        let config = Self::from_toml(&text)?;
        crate::log!(
            Topic::Config,
            Info,
            "loaded {} for {}",
            path.display(),
            config.environment()
        );

        Ok(config)
    }

    /// Apply process-wide settings (log level, log context) for a config.
    pub fn apply(config: &ConfigModel) {
        log::set_min_level(config.log.level);
        log::set_context(config.environment.name.as_str());
    }

    /// Return a config as a TOML string.
    pub fn to_toml(config: &ConfigModel) -> Result<String, ConfigError> {
        toml::to_string_pretty(config).map_err(|e| ConfigError::CannotParseToml(e.to_string()))
    }
}

///
/// TESTS
///
