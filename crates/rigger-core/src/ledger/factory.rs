use super::ResourceFactory;
use crate::ids::ResourceKind;
use std::{collections::BTreeMap, sync::Arc};

///
/// FactoryTable
///
/// Kind name → factory, populated once at startup. Replaces by-name
/// reflection with explicit registration; unknown kinds are an error at
/// resolve time rather than a runtime lookup failure deep in the ledger.
///

#[derive(Clone, Default)]
pub struct FactoryTable {
    factories: BTreeMap<ResourceKind, Arc<dyn ResourceFactory>>,
}

impl FactoryTable {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a factory under its own kind.
    /// Returns the factory it replaced, if any.
    pub fn register(
        &mut self,
        factory: Arc<dyn ResourceFactory>,
    ) -> Option<Arc<dyn ResourceFactory>> {
        self.factories.insert(factory.kind().clone(), factory)
    }

    #[must_use]
    pub fn with(mut self, factory: Arc<dyn ResourceFactory>) -> Self {
        self.register(factory);
        self
    }

    #[must_use]
    pub fn get(&self, kind: &ResourceKind) -> Option<Arc<dyn ResourceFactory>> {
        self.factories.get(kind).cloned()
    }

    #[must_use]
    pub fn contains(&self, kind: &ResourceKind) -> bool {
        self.factories.contains_key(kind)
    }

    pub fn kinds(&self) -> impl Iterator<Item = &ResourceKind> {
        self.factories.keys()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.factories.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.factories.is_empty()
    }
}
