use super::{IdError, check_chars};
use derive_more::Display;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

pub const ENVIRONMENT_NAME_MAX_BYTES: usize = 64;

// network names that reset their chain state between runs
const EPHEMERAL_NAMES: &[&str] = &["local-dev", "localhost"];

///
/// EnvironmentName
///
/// Deployment target name (e.g. "avalancheTest"). Doubles as a directory
/// name in the file-backed registry, hence the restricted alphabet.
///

#[derive(Clone, Debug, Deserialize, Display, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
#[serde(try_from = "String", into = "String")]
pub struct EnvironmentName(String);

impl EnvironmentName {
    pub fn new(value: impl Into<String>) -> Result<Self, IdError> {
        let value = value.into();
        check_chars(
            "environment name",
            &value,
            ENVIRONMENT_NAME_MAX_BYTES,
            |c| c.is_ascii_alphanumeric() || c == '-' || c == '_',
        )?;

        Ok(Self(value))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for EnvironmentName {
    type Err = IdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl TryFrom<String> for EnvironmentName {
    type Error = IdError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<EnvironmentName> for String {
    fn from(name: EnvironmentName) -> Self {
        name.0
    }
}

///
/// EnvironmentMode
///
/// Ephemeral targets reset remote state on every run, so recorded
/// addresses are never trusted there.
///

#[derive(Clone, Copy, Debug, Deserialize, Display, Eq, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EnvironmentMode {
    Ephemeral,
    Persistent,
}

impl EnvironmentMode {
    /// Default mode for a network name when configuration does not say.
    #[must_use]
    pub fn for_name(name: &EnvironmentName) -> Self {
        if EPHEMERAL_NAMES.contains(&name.as_str()) {
            Self::Ephemeral
        } else {
            Self::Persistent
        }
    }

    #[must_use]
    pub const fn is_ephemeral(self) -> bool {
        matches!(self, Self::Ephemeral)
    }
}

///
/// Environment
///

#[derive(Clone, Debug, Display, Eq, PartialEq)]
#[display("{name} ({mode})")]
pub struct Environment {
    pub name: EnvironmentName,
    pub mode: EnvironmentMode,
}

impl Environment {
    #[must_use]
    pub const fn new(name: EnvironmentName, mode: EnvironmentMode) -> Self {
        Self { name, mode }
    }

    #[must_use]
    pub const fn is_ephemeral(&self) -> bool {
        self.mode.is_ephemeral()
    }
}

///
/// TESTS
///
