use super::{ConfigSchemaError, Validate};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

///
/// Defaults
///

mod defaults {
    use std::path::PathBuf;

    pub fn dir() -> PathBuf {
        PathBuf::from(".")
    }

    pub const fn max_conflict_retries() -> u32 {
        3
    }
}

pub const MAX_CONFLICT_RETRIES: u32 = 16;

///
/// RegistryConfig
///

#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct RegistryConfig {
    /// Directory holding one sub-directory of address documents per environment.
    #[serde(default = "defaults::dir")]
    pub dir: PathBuf,

    #[serde(default = "defaults::max_conflict_retries")]
    pub max_conflict_retries: u32,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            dir: defaults::dir(),
            max_conflict_retries: defaults::max_conflict_retries(),
        }
    }
}

impl Validate for RegistryConfig {
    fn validate(&self) -> Result<(), ConfigSchemaError> {
        if self.max_conflict_retries > MAX_CONFLICT_RETRIES {
            return Err(ConfigSchemaError::ValidationError(format!(
                "registry.max_conflict_retries {} exceeds max {MAX_CONFLICT_RETRIES}",
                self.max_conflict_retries
            )));
        }

        if self.dir.as_os_str().is_empty() {
            return Err(ConfigSchemaError::ValidationError(
                "registry.dir must not be empty".to_string(),
            ));
        }

        Ok(())
    }
}
