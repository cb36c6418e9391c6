mod environment;
mod executor;
mod log;
mod registry;

pub use environment::*;
pub use executor::*;
pub use log::*;
pub use registry::*;

use crate::ids::{Environment, EnvironmentMode, EnvironmentName, IdError};
use serde::{Deserialize, Serialize};
use thiserror::Error as ThisError;

///
/// ConfigSchemaError
///

#[derive(Debug, ThisError)]
pub enum ConfigSchemaError {
    #[error("validation error: {0}")]
    ValidationError(String),
}

///
/// Validate
///

pub trait Validate {
    fn validate(&self) -> Result<(), ConfigSchemaError>;
}

///
/// ConfigModel
///

#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ConfigModel {
    pub environment: EnvironmentConfig,

    #[serde(default)]
    pub registry: RegistryConfig,

    #[serde(default)]
    pub executor: ExecutorConfig,

    #[serde(default)]
    pub log: LogConfig,
}

impl ConfigModel {
    /// Config with defaults everywhere except the environment selector.
    pub fn for_environment(name: &str, mode: Option<EnvironmentMode>) -> Result<Self, IdError> {
        Ok(Self {
            environment: EnvironmentConfig {
                name: EnvironmentName::new(name)?,
                mode,
            },
            registry: RegistryConfig::default(),
            executor: ExecutorConfig::default(),
            log: LogConfig::default(),
        })
    }

    #[must_use]
    pub fn environment(&self) -> Environment {
        self.environment.resolve()
    }
}

impl Validate for ConfigModel {
    fn validate(&self) -> Result<(), ConfigSchemaError> {
        self.registry.validate()?;
        self.executor.validate()?;

        Ok(())
    }
}
