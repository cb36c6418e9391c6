//!
//! Registry partition key for per-instrument resource families.
//!
//! Keys are explicit and validated: a symbol such as "ETH/USD" maps to its
//! full base asset ("ETH"), never to a fixed-width prefix, so "ETH" and
//! "ETHX" land in different partitions.
//!

use super::{IdError, check_chars};
use derive_more::Display;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

pub const SHARD_KEY_MAX_BYTES: usize = 16;

///
/// ShardKey
///

#[derive(Clone, Debug, Deserialize, Display, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
#[serde(try_from = "String", into = "String")]
pub struct ShardKey(String);

impl ShardKey {
    /// Build a key from an already-normalised value.
    /// Accepts uppercase ASCII letters and digits only.
    pub fn new(value: impl Into<String>) -> Result<Self, IdError> {
        let value = value.into();
        check_chars("shard key", &value, SHARD_KEY_MAX_BYTES, |c| {
            c.is_ascii_uppercase() || c.is_ascii_digit()
        })?;

        Ok(Self(value))
    }

    /// Derive the key from an instrument symbol ("eth/usd" -> "ETH").
    pub fn from_symbol(symbol: &str) -> Result<Self, IdError> {
        let base = symbol.split('/').next().unwrap_or_default().trim();

        Self::new(base.to_ascii_uppercase())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for ShardKey {
    type Err = IdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl TryFrom<String> for ShardKey {
    type Error = IdError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<ShardKey> for String {
    fn from(key: ShardKey) -> Self {
        key.0
    }
}

///
/// TESTS
///

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_symbol_takes_full_base_asset() {
        assert_eq!(ShardKey::from_symbol("ETH/USD").unwrap().as_str(), "ETH");
        assert_eq!(ShardKey::from_symbol("ethx/usd").unwrap().as_str(), "ETHX");
        assert_eq!(ShardKey::from_symbol("BTC").unwrap().as_str(), "BTC");
    }

    #[test]
    fn similar_prefixes_stay_distinct() {
        let eth = ShardKey::from_symbol("ETH/USD").unwrap();
        let ethx = ShardKey::from_symbol("ETHX/USD").unwrap();

        assert_ne!(eth, ethx);
    }

    #[test]
    fn rejects_empty_and_invalid_keys() {
        assert_eq!(
            ShardKey::from_symbol("/USD"),
            Err(IdError::Empty { what: "shard key" })
        );
        assert!(matches!(
            ShardKey::new("eth"),
            Err(IdError::InvalidChar { ch: 'e', .. })
        ));
        assert!(matches!(
            ShardKey::new("A".repeat(SHARD_KEY_MAX_BYTES + 1)),
            Err(IdError::TooLong { .. })
        ));
    }

    #[test]
    fn deserialize_validates() {
        let ok: Result<ShardKey, _> = serde_json::from_str("\"BTC\"");
        let bad: Result<ShardKey, _> = serde_json::from_str("\"b-tc\"");

        assert_eq!(ok.unwrap().as_str(), "BTC");
        assert!(bad.is_err());
    }
}
