use crate::{
    ids::{Address, ResourceKey, ResourceKind, ShardKey, TxHash},
    ledger::ResourceClient,
};
use derive_more::Display;
use std::{fmt, sync::Arc};

///
/// Origin
///
/// How a handle came to exist during this run.
///

#[derive(Clone, Debug, Display, Eq, PartialEq)]
pub enum Origin {
    #[display("attached")]
    Attached,

    #[display("created in {tx_hash}")]
    Created { tx_hash: TxHash },
}

///
/// DeployedHandle
///
/// A resolved resource: its identity plus a live client bound to its
/// address.
///

#[derive(Clone)]
pub struct DeployedHandle {
    pub kind: ResourceKind,
    pub key: ResourceKey,
    pub shard: Option<ShardKey>,
    pub address: Address,
    pub origin: Origin,
    client: Arc<dyn ResourceClient>,
}

impl DeployedHandle {
    #[must_use]
    pub fn new(
        kind: ResourceKind,
        key: ResourceKey,
        shard: Option<ShardKey>,
        address: Address,
        origin: Origin,
        client: Arc<dyn ResourceClient>,
    ) -> Self {
        Self {
            kind,
            key,
            shard,
            address,
            origin,
            client,
        }
    }

    #[must_use]
    pub fn client(&self) -> &Arc<dyn ResourceClient> {
        &self.client
    }

    #[must_use]
    pub const fn was_created(&self) -> bool {
        matches!(self.origin, Origin::Created { .. })
    }
}

impl fmt::Debug for DeployedHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DeployedHandle")
            .field("kind", &self.kind)
            .field("key", &self.key)
            .field("shard", &self.shard)
            .field("address", &self.address)
            .field("origin", &self.origin)
            .finish_non_exhaustive()
    }
}

///
/// UpgradeableHandle
///
/// Proxy plus implementation pair. The proxy handle's client speaks the
/// implementation's interface.
///

#[derive(Clone, Debug)]
pub struct UpgradeableHandle {
    pub proxy: DeployedHandle,
    pub implementation: DeployedHandle,
}
