//!
//! Identifiers for deployable resources.
//! `ResourceKind` names the contract type the factory table dispatches on;
//! `ResourceKey` is the registry key an instance is recorded under.
//!

use derive_more::Display;
use serde::{Deserialize, Serialize};
use std::{borrow::Borrow, borrow::Cow};

///
/// ResourceKind
///
/// Contract type name (e.g. "MarketFactory", "OrderBook").
///
/// Stored as `Cow<'static, str>` so recipe constants are zero-copy while
/// dynamic values allocate only when needed.
///

#[derive(Clone, Debug, Deserialize, Display, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
#[serde(transparent)]
pub struct ResourceKind(pub Cow<'static, str>);

impl ResourceKind {
    #[must_use]
    pub const fn new(s: &'static str) -> Self {
        Self(Cow::Borrowed(s))
    }

    #[must_use]
    pub const fn owned(s: String) -> Self {
        Self(Cow::Owned(s))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&'static str> for ResourceKind {
    fn from(s: &'static str) -> Self {
        Self(Cow::Borrowed(s))
    }
}

impl From<String> for ResourceKind {
    fn from(s: String) -> Self {
        Self(Cow::Owned(s))
    }
}

impl AsRef<str> for ResourceKind {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl Borrow<str> for ResourceKind {
    fn borrow(&self) -> &str {
        self.as_str()
    }
}

///
/// ResourceKey
///
/// Registry key of one resource instance within a partition: the label
/// when one was given, otherwise the kind name.
///

#[derive(Clone, Debug, Deserialize, Display, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
#[serde(transparent)]
pub struct ResourceKey(pub Cow<'static, str>);

impl ResourceKey {
    #[must_use]
    pub const fn new(s: &'static str) -> Self {
        Self(Cow::Borrowed(s))
    }

    #[must_use]
    pub const fn owned(s: String) -> Self {
        Self(Cow::Owned(s))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Key the implementation behind an upgradeable proxy is recorded under.
    #[must_use]
    pub fn implementation(&self) -> Self {
        Self::owned(format!("{}Impl", self.0))
    }
}

impl From<&ResourceKind> for ResourceKey {
    fn from(kind: &ResourceKind) -> Self {
        Self(kind.0.clone())
    }
}

impl From<&'static str> for ResourceKey {
    fn from(s: &'static str) -> Self {
        Self(Cow::Borrowed(s))
    }
}

impl From<String> for ResourceKey {
    fn from(s: String) -> Self {
        Self(Cow::Owned(s))
    }
}

impl AsRef<str> for ResourceKey {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl Borrow<str> for ResourceKey {
    fn borrow(&self) -> &str {
        self.as_str()
    }
}

///
/// TESTS
///
