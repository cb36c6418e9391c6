//! AddressRegistry
//!
//! Persistent key → address mapping, one document per
//! (environment, shard) partition.
//!
//! Invariants:
//! - `get` never reports "absent" for a document it could not read.
//! - `put` is read-merge-write of the whole partition, committed with a
//!   revision check; a concurrent writer forces a re-read, not a lost update.
//! - `reset` is the only deletion path and clears a whole environment.

mod file;
mod memory;
mod store;

pub use file::{DOCUMENT_PREFIX, FileStore, LOCK_FILE, RunLock};
pub use memory::MemoryStore;
pub use store::{Document, Partition, RegistryStore, Revision, Snapshot};

use crate::{
    config::schema::RegistryConfig,
    ids::{Address, EnvironmentName, ResourceKey, ShardKey},
    log::Topic,
};
use std::sync::Arc;
use thiserror::Error as ThisError;

///
/// RegistryError
///

#[derive(Debug, ThisError)]
pub enum RegistryError {
    #[error("registry {partition} unreadable: {reason}")]
    IoFailure { partition: String, reason: String },

    #[error("registry {partition} is corrupt: {reason}")]
    Corrupt { partition: String, reason: String },

    #[error("registry {partition} changed during write")]
    Conflict { partition: String },

    #[error("registry {partition} still conflicting after {attempts} attempts")]
    ConflictRetriesExhausted { partition: String, attempts: u32 },

    #[error("environment {environment} is locked ({path})")]
    Locked { environment: String, path: String },
}

impl RegistryError {
    /// True when the backing store could not be read or parsed.
    #[must_use]
    pub const fn is_io_failure(&self) -> bool {
        matches!(self, Self::IoFailure { .. } | Self::Corrupt { .. })
    }
}

///
/// RegistryRecord
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct RegistryRecord {
    pub key: ResourceKey,
    pub address: Address,
    pub environment: EnvironmentName,
    pub shard: Option<ShardKey>,
}

///
/// AddressRegistry
///

#[derive(Clone)]
pub struct AddressRegistry {
    store: Arc<dyn RegistryStore>,
    max_conflict_retries: u32,
}

impl AddressRegistry {
    #[must_use]
    pub fn new(store: Arc<dyn RegistryStore>, max_conflict_retries: u32) -> Self {
        Self {
            store,
            max_conflict_retries,
        }
    }

    /// File-backed registry rooted at the configured directory.
    #[must_use]
    pub fn from_config(cfg: &RegistryConfig) -> Self {
        Self::new(Arc::new(FileStore::new(&cfg.dir)), cfg.max_conflict_retries)
    }

    #[must_use]
    pub fn store(&self) -> &Arc<dyn RegistryStore> {
        &self.store
    }

    // ---------------------------------------------------------------------
    // Queries
    // ---------------------------------------------------------------------

    pub fn get(
        &self,
        environment: &EnvironmentName,
        shard: Option<&ShardKey>,
        key: &ResourceKey,
    ) -> Result<Option<Address>, RegistryError> {
        let partition = Partition::new(environment, shard);
        let snapshot = self.store.load(&partition)?;

        Ok(snapshot.document.get(key).cloned())
    }

    /// Every record of one partition, ordered by key.
    pub fn records(
        &self,
        environment: &EnvironmentName,
        shard: Option<&ShardKey>,
    ) -> Result<Vec<RegistryRecord>, RegistryError> {
        let partition = Partition::new(environment, shard);
        let snapshot = self.store.load(&partition)?;

        Ok(snapshot
            .document
            .into_inner()
            .into_iter()
            .map(|(key, address)| RegistryRecord {
                key,
                address,
                environment: environment.clone(),
                shard: shard.cloned(),
            })
            .collect())
    }

    // ---------------------------------------------------------------------
    // Mutation
    // ---------------------------------------------------------------------

    /// Record `key → address`, overwriting any previous value for the key.
    pub fn put(
        &self,
        environment: &EnvironmentName,
        shard: Option<&ShardKey>,
        key: &ResourceKey,
        address: &Address,
    ) -> Result<(), RegistryError> {
        let partition = Partition::new(environment, shard);
        let attempts = self.max_conflict_retries.saturating_add(1);

        for attempt in 1..=attempts {
            let Snapshot {
                mut document,
                revision,
            } = self.store.load(&partition)?;
            document.insert(key.clone(), address.clone());

            match self.store.store(&partition, &document, revision.as_ref()) {
                Ok(_) => {
                    log!(
                        Topic::Registry,
                        Debug,
                        "recorded {key} = {address} in {partition}"
                    );
                    return Ok(());
                }
                Err(RegistryError::Conflict { .. }) => {
                    log!(
                        Topic::Registry,
                        Warn,
                        "⚠️ {partition} changed under write of {key} (attempt {attempt}/{attempts})"
                    );
                }
                Err(err) => return Err(err),
            }
        }

        Err(RegistryError::ConflictRetriesExhausted {
            partition: partition.to_string(),
            attempts,
        })
    }

    /// Drop every partition of an environment, forcing fresh deployment.
    pub fn reset(&self, environment: &EnvironmentName) -> Result<usize, RegistryError> {
        let removed = self.store.clear(environment)?;
        log!(
            Topic::Registry,
            Ok,
            "🗑️ reset {environment}: {removed} document(s) removed"
        );

        Ok(removed)
    }

    pub fn lock(&self, environment: &EnvironmentName) -> Result<Option<RunLock>, RegistryError> {
        self.store.lock(environment)
    }
}

///
/// TESTS
///
