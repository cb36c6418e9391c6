use super::{
    RegistryError,
    store::{Document, Partition, RegistryStore, Revision, Snapshot},
};
use crate::ids::EnvironmentName;
use std::{collections::BTreeMap, sync::Mutex};

///
/// MemoryStore
///
/// In-process store with counter revisions. Useful for tests and for
/// embedding the engine behind a transactional backend.
///

#[derive(Debug, Default)]
pub struct MemoryStore {
    inner: Mutex<MemoryState>,
}

#[derive(Debug, Default)]
struct MemoryState {
    partitions: BTreeMap<Partition, (Document, u64)>,
    next_revision: u64,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn with_state<R>(
        &self,
        partition: &str,
        f: impl FnOnce(&mut MemoryState) -> Result<R, RegistryError>,
    ) -> Result<R, RegistryError> {
        let mut state = self.inner.lock().map_err(|_| RegistryError::IoFailure {
            partition: partition.to_string(),
            reason: "memory store poisoned".to_string(),
        })?;

        f(&mut state)
    }
}

impl RegistryStore for MemoryStore {
    fn load(&self, partition: &Partition) -> Result<Snapshot, RegistryError> {
        self.with_state(&partition.to_string(), |state| {
            Ok(state
                .partitions
                .get(partition)
                .map(|(doc, rev)| Snapshot {
                    document: doc.clone(),
                    revision: Some(Revision(rev.to_string())),
                })
                .unwrap_or_default())
        })
    }

    fn store(
        &self,
        partition: &Partition,
        document: &Document,
        expected: Option<&Revision>,
    ) -> Result<Revision, RegistryError> {
        let label = partition.to_string();

        self.with_state(&label, |state| {
            let current = state
                .partitions
                .get(partition)
                .map(|(_, rev)| Revision(rev.to_string()));

            if current.as_ref() != expected {
                return Err(RegistryError::Conflict {
                    partition: partition.to_string(),
                });
            }

            state.next_revision += 1;
            let rev = state.next_revision;
            state
                .partitions
                .insert(partition.clone(), (document.clone(), rev));

            Ok(Revision(rev.to_string()))
        })
    }

    fn clear(&self, environment: &EnvironmentName) -> Result<usize, RegistryError> {
        self.with_state(environment.as_str(), |state| {
            let before = state.partitions.len();
            state
                .partitions
                .retain(|partition, _| &partition.environment != environment);

            Ok(before - state.partitions.len())
        })
    }
}

///
/// TESTS
///
