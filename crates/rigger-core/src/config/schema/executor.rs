use super::{ConfigSchemaError, Validate};
use serde::{Deserialize, Serialize};
use std::time::Duration;

///
/// Defaults
///

mod defaults {
    pub const fn max_attempts() -> u32 {
        3
    }

    pub const fn confirmation_timeout_secs() -> u64 {
        120
    }
}

pub const MAX_ATTEMPTS: u32 = 10;
pub const MAX_CONFIRMATION_TIMEOUT_SECS: u64 = 3_600;

///
/// ExecutorConfig
///

#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ExecutorConfig {
    /// Total attempts per transaction, the first one included.
    #[serde(default = "defaults::max_attempts")]
    pub max_attempts: u32,

    #[serde(default = "defaults::confirmation_timeout_secs")]
    pub confirmation_timeout_secs: u64,
}

impl ExecutorConfig {
    #[must_use]
    pub const fn confirmation_timeout(&self) -> Duration {
        Duration::from_secs(self.confirmation_timeout_secs)
    }
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        Self {
            max_attempts: defaults::max_attempts(),
            confirmation_timeout_secs: defaults::confirmation_timeout_secs(),
        }
    }
}

impl Validate for ExecutorConfig {
    fn validate(&self) -> Result<(), ConfigSchemaError> {
        if self.max_attempts == 0 || self.max_attempts > MAX_ATTEMPTS {
            return Err(ConfigSchemaError::ValidationError(format!(
                "executor.max_attempts {} must be within 1..={MAX_ATTEMPTS}",
                self.max_attempts
            )));
        }

        if self.confirmation_timeout_secs == 0
            || self.confirmation_timeout_secs > MAX_CONFIRMATION_TIMEOUT_SECS
        {
            return Err(ConfigSchemaError::ValidationError(format!(
                "executor.confirmation_timeout_secs {} must be within 1..={MAX_CONFIRMATION_TIMEOUT_SECS}",
                self.confirmation_timeout_secs
            )));
        }

        Ok(())
    }
}
