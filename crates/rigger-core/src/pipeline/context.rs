use super::{ResourceRef, StepError};
use crate::{ids::Address, resolve::DeployedHandle};
use std::collections::BTreeMap;

///
/// RunContext
///
/// Handles resolved so far in this run, keyed by shard and registry key,
/// plus the deploying account. Nothing here is persisted; a rerun rebuilds
/// it from the registry.
///

#[derive(Clone, Debug)]
pub struct RunContext {
    deployer: Address,
    handles: BTreeMap<ResourceRef, DeployedHandle>,
}

impl RunContext {
    #[must_use]
    pub const fn new(deployer: Address) -> Self {
        Self {
            deployer,
            handles: BTreeMap::new(),
        }
    }

    #[must_use]
    pub const fn deployer(&self) -> &Address {
        &self.deployer
    }

    /// Track a handle, replacing any earlier one for the same reference.
    pub fn insert(&mut self, handle: DeployedHandle) -> ResourceRef {
        let reference = ResourceRef {
            shard: handle.shard.clone(),
            key: handle.key.clone(),
        };
        self.handles.insert(reference.clone(), handle);

        reference
    }

    #[must_use]
    pub fn get(&self, reference: &ResourceRef) -> Option<&DeployedHandle> {
        self.handles.get(reference)
    }

    pub fn handle(&self, reference: &ResourceRef) -> Result<&DeployedHandle, StepError> {
        self.get(reference)
            .ok_or_else(|| StepError::UnresolvedReference(reference.clone()))
    }

    pub fn address(&self, reference: &ResourceRef) -> Result<&Address, StepError> {
        self.handle(reference).map(|handle| &handle.address)
    }

    pub fn handles(&self) -> impl Iterator<Item = (&ResourceRef, &DeployedHandle)> {
        self.handles.iter()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.handles.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.handles.is_empty()
    }
}
