use crate::{
    ids::{ResourceKey, ResourceKind, ShardKey},
    ledger::ArgValue,
};

///
/// ResourceDescriptor
///
/// What to deploy or attach: contract kind, constructor arguments, the
/// registry key (defaults to the kind name) and an optional shard.
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ResourceDescriptor {
    pub kind: ResourceKind,
    pub args: Vec<ArgValue>,
    pub label: Option<ResourceKey>,
    pub shard: Option<ShardKey>,
}

impl ResourceDescriptor {
    #[must_use]
    pub const fn new(kind: ResourceKind) -> Self {
        Self {
            kind,
            args: Vec::new(),
            label: None,
            shard: None,
        }
    }

    #[must_use]
    pub fn label(mut self, label: impl Into<ResourceKey>) -> Self {
        self.label = Some(label.into());
        self
    }

    #[must_use]
    pub fn arg(mut self, arg: impl Into<ArgValue>) -> Self {
        self.args.push(arg.into());
        self
    }

    #[must_use]
    pub fn args(mut self, args: impl IntoIterator<Item = ArgValue>) -> Self {
        self.args.extend(args);
        self
    }

    #[must_use]
    pub fn shard(mut self, shard: ShardKey) -> Self {
        self.shard = Some(shard);
        self
    }

    /// Registry key the resource is recorded under.
    #[must_use]
    pub fn key(&self) -> ResourceKey {
        self.label
            .clone()
            .unwrap_or_else(|| ResourceKey::from(&self.kind))
    }
}

///
/// TESTS
///
