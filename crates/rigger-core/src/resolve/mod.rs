//! DeployOrAttach
//!
//! Turns a [`ResourceDescriptor`] into a live [`DeployedHandle`].
//!
//! - Ephemeral environments always create.
//! - Persistent environments attach to a recorded address with zero
//!   transactions, and create + record only when nothing is recorded.
//! - The registry is written exactly once per created resource, after the
//!   creation is confirmed. Failures never write.

mod descriptor;
mod handle;

pub use descriptor::ResourceDescriptor;
pub use handle::{DeployedHandle, Origin, UpgradeableHandle};

use crate::{
    executor::{TxError, TxExecutor},
    ids::{Environment, ResourceKey, ResourceKind, ShardKey, TxHash},
    ledger::{FactoryTable, ResourceFactory, render_args},
    log::Topic,
    registry::{AddressRegistry, Partition, RegistryError},
};
use std::sync::Arc;
use thiserror::Error as ThisError;

///
/// ResolveError
///

#[derive(Debug, ThisError)]
pub enum ResolveError {
    #[error("no factory registered for kind {0}")]
    UnknownKind(ResourceKind),

    #[error("{key} is not recorded in {partition}")]
    NotRecorded { key: ResourceKey, partition: String },

    #[error("creation of {key} confirmed in {tx_hash} without a contract address")]
    MissingAddress { key: ResourceKey, tx_hash: TxHash },

    #[error(transparent)]
    Registry(#[from] RegistryError),

    #[error(transparent)]
    Tx(#[from] TxError),
}

///
/// Resolver
///

#[derive(Clone)]
pub struct Resolver {
    environment: Environment,
    registry: AddressRegistry,
    executor: Arc<TxExecutor>,
    factories: Arc<FactoryTable>,
}

impl Resolver {
    #[must_use]
    pub const fn new(
        environment: Environment,
        registry: AddressRegistry,
        executor: Arc<TxExecutor>,
        factories: Arc<FactoryTable>,
    ) -> Self {
        Self {
            environment,
            registry,
            executor,
            factories,
        }
    }

    #[must_use]
    pub const fn environment(&self) -> &Environment {
        &self.environment
    }

    #[must_use]
    pub const fn registry(&self) -> &AddressRegistry {
        &self.registry
    }

    #[must_use]
    pub const fn executor(&self) -> &Arc<TxExecutor> {
        &self.executor
    }

    #[must_use]
    pub fn factories(&self) -> &FactoryTable {
        &self.factories
    }

    // ---------------------------------------------------------------------
    // Resolution
    // ---------------------------------------------------------------------

    /// Attach when recorded (persistent only), otherwise create and record.
    pub async fn resolve(&self, desc: &ResourceDescriptor) -> Result<DeployedHandle, ResolveError> {
        let factory = self.factory(&desc.kind)?;
        let key = desc.key();

        if !self.environment.is_ephemeral()
            && let Some(handle) = self.lookup(factory.as_ref(), desc, &key)?
        {
            return Ok(handle);
        }

        self.create(factory.as_ref(), desc, key).await
    }

    /// Bind to the recorded address; never deploys.
    pub fn attach_existing(&self, desc: &ResourceDescriptor) -> Result<DeployedHandle, ResolveError> {
        let factory = self.factory(&desc.kind)?;
        let key = desc.key();

        self.lookup(factory.as_ref(), desc, &key)?
            .ok_or_else(|| ResolveError::NotRecorded {
                partition: Partition::new(&self.environment.name, desc.shard.as_ref()).to_string(),
                key,
            })
    }

    /// Create and record regardless of mode or registry contents.
    /// The new address replaces any previous record under the same key.
    pub async fn deploy_fresh(
        &self,
        desc: &ResourceDescriptor,
    ) -> Result<DeployedHandle, ResolveError> {
        let factory = self.factory(&desc.kind)?;

        self.create(factory.as_ref(), desc, desc.key()).await
    }

    /// Resolve an implementation (`{label}Impl`) and the proxy in front of
    /// it (`{label}`). The proxy is created with the implementation address
    /// as its only constructor argument.
    pub async fn resolve_upgradeable(
        &self,
        desc: &ResourceDescriptor,
        proxy_kind: &ResourceKind,
    ) -> Result<UpgradeableHandle, ResolveError> {
        let implementation_factory = self.factory(&desc.kind)?;
        self.factory(proxy_kind)?;

        let label = desc.key();
        let implementation = self
            .resolve(&ResourceDescriptor {
                label: Some(label.implementation()),
                ..desc.clone()
            })
            .await?;

        let mut proxy_desc = ResourceDescriptor::new(proxy_kind.clone())
            .label(label)
            .arg(implementation.address.clone());
        proxy_desc.shard.clone_from(&desc.shard);
        let proxy = self.resolve(&proxy_desc).await?;

        let client = implementation_factory.attach(&proxy.address);
        let proxy = DeployedHandle::new(
            desc.kind.clone(),
            proxy.key,
            proxy.shard,
            proxy.address,
            proxy.origin,
            client,
        );

        Ok(UpgradeableHandle {
            proxy,
            implementation,
        })
    }

    // ---------------------------------------------------------------------
    // Internals
    // ---------------------------------------------------------------------

    fn factory(&self, kind: &ResourceKind) -> Result<Arc<dyn ResourceFactory>, ResolveError> {
        self.factories
            .get(kind)
            .ok_or_else(|| ResolveError::UnknownKind(kind.clone()))
    }

    fn lookup(
        &self,
        factory: &dyn ResourceFactory,
        desc: &ResourceDescriptor,
        key: &ResourceKey,
    ) -> Result<Option<DeployedHandle>, ResolveError> {
        let shard = desc.shard.as_ref();
        let Some(address) = self.registry.get(&self.environment.name, shard, key)? else {
            return Ok(None);
        };

        log!(
            Topic::Resolve,
            Info,
            "{key} attached at {address}{}",
            shard_suffix(shard)
        );
        let client = factory.attach(&address);

        Ok(Some(DeployedHandle::new(
            desc.kind.clone(),
            key.clone(),
            desc.shard.clone(),
            address,
            Origin::Attached,
            client,
        )))
    }

    async fn create(
        &self,
        factory: &dyn ResourceFactory,
        desc: &ResourceDescriptor,
        key: ResourceKey,
    ) -> Result<DeployedHandle, ResolveError> {
        let shard = desc.shard.as_ref();
        log!(
            Topic::Resolve,
            Info,
            "deploying {key}{}({})",
            shard_suffix(shard),
            render_args(&desc.args)
        );

        let label = format!("deploy {key}");
        let receipt = self
            .executor
            .submit(&label, || factory.create(&desc.args))
            .await?;

        let Some(address) = receipt.contract_address else {
            return Err(ResolveError::MissingAddress {
                key,
                tx_hash: receipt.tx_hash,
            });
        };

        self.registry
            .put(&self.environment.name, shard, &key, &address)?;
        log!(
            Topic::Resolve,
            Ok,
            "{key} deployed at {address}{}",
            shard_suffix(shard)
        );

        let client = factory.attach(&address);

        Ok(DeployedHandle::new(
            desc.kind.clone(),
            key,
            desc.shard.clone(),
            address,
            Origin::Created {
                tx_hash: receipt.tx_hash,
            },
            client,
        ))
    }
}

fn shard_suffix(shard: Option<&ShardKey>) -> String {
    shard.map(|s| format!(" [{s}]")).unwrap_or_default()
}
