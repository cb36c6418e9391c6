use crate::ids::{Environment, EnvironmentMode, EnvironmentName};
use serde::{Deserialize, Serialize};

///
/// EnvironmentConfig
///
/// The single selector for idempotency behaviour and registry partition.
///

#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct EnvironmentConfig {
    pub name: EnvironmentName,

    // falls back to EnvironmentMode::for_name
    #[serde(default)]
    pub mode: Option<EnvironmentMode>,
}

impl EnvironmentConfig {
    #[must_use]
    pub fn resolve(&self) -> Environment {
        let mode = self
            .mode
            .unwrap_or_else(|| EnvironmentMode::for_name(&self.name));

        Environment::new(self.name.clone(), mode)
    }
}
