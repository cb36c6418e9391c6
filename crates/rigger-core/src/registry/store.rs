use super::{RegistryError, file::RunLock};
use crate::ids::{Address, EnvironmentName, ResourceKey, ShardKey};
use derive_more::{Deref, DerefMut, Display};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

///
/// Partition
///
/// One (environment, shard) pair; the unit of persistence.
///

#[derive(Clone, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct Partition {
    pub environment: EnvironmentName,
    pub shard: Option<ShardKey>,
}

impl Partition {
    #[must_use]
    pub fn new(environment: &EnvironmentName, shard: Option<&ShardKey>) -> Self {
        Self {
            environment: environment.clone(),
            shard: shard.cloned(),
        }
    }
}

impl std::fmt::Display for Partition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.shard {
            Some(shard) => write!(f, "{}/{shard}", self.environment),
            None => write!(f, "{}", self.environment),
        }
    }
}

///
/// Document
///
/// Flat key → address mapping, serialised as a single JSON object.
///

#[derive(Clone, Debug, Default, Deref, DerefMut, Deserialize, Eq, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Document(BTreeMap<ResourceKey, Address>);

impl Document {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn into_inner(self) -> BTreeMap<ResourceKey, Address> {
        self.0
    }
}

///
/// Revision
///
/// Opaque version tag of a stored document, compared on write.
///

#[derive(Clone, Debug, Display, Eq, PartialEq)]
pub struct Revision(pub String);

///
/// Snapshot
///
/// A document as loaded, plus the revision to present when writing it back.
/// `revision` is `None` when no document exists yet.
///

#[derive(Clone, Debug, Default)]
pub struct Snapshot {
    pub document: Document,
    pub revision: Option<Revision>,
}

///
/// RegistryStore
///
/// Backing store for the address registry. Writes are compare-and-swap:
/// `store` must fail with [`RegistryError::Conflict`] when the current
/// revision differs from `expected`, so read-merge-write never silently
/// drops a concurrent update.
///

pub trait RegistryStore: Send + Sync {
    /// Load a partition. A missing document is an empty snapshot; an
    /// unreadable or corrupt one is an error, never "empty".
    fn load(&self, partition: &Partition) -> Result<Snapshot, RegistryError>;

    /// Overwrite a partition if its revision still matches `expected`.
    fn store(
        &self,
        partition: &Partition,
        document: &Document,
        expected: Option<&Revision>,
    ) -> Result<Revision, RegistryError>;

    /// Remove every partition of an environment. Returns how many existed.
    fn clear(&self, environment: &EnvironmentName) -> Result<usize, RegistryError>;

    /// Take the run-level lock for an environment, when the store has one.
    fn lock(&self, _environment: &EnvironmentName) -> Result<Option<RunLock>, RegistryError> {
        Ok(None)
    }
}
