//! Session
//!
//! One provisioning run against one environment: validated config, the
//! environment's run lock, and the shared executor, resolver and grant
//! manager every pipeline of the run goes through.

use crate::{
    Error,
    config::{Config, ConfigModel, schema::Validate},
    executor::{ExecutorPolicy, TxExecutor},
    grant::RoleGrantManager,
    ids::{Address, Environment},
    ledger::FactoryTable,
    log::Topic,
    pipeline::{Pipeline, PipelineError, PipelineReport, RunContext},
    registry::{AddressRegistry, FileStore, RegistryError, RegistryStore, RunLock},
    resolve::Resolver,
};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

///
/// SessionBuilder
///

pub struct SessionBuilder {
    config: ConfigModel,
    deployer: Address,
    store: Option<Arc<dyn RegistryStore>>,
    factories: FactoryTable,
    cancel: CancellationToken,
}

impl SessionBuilder {
    /// Use a custom registry store instead of the configured directory.
    #[must_use]
    pub fn store(mut self, store: Arc<dyn RegistryStore>) -> Self {
        self.store = Some(store);
        self
    }

    #[must_use]
    pub fn factories(mut self, factories: FactoryTable) -> Self {
        self.factories = factories;
        self
    }

    #[must_use]
    pub fn cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// Validate config, apply log settings and take the environment lock.
    pub fn build(self) -> Result<Session, Error> {
        self.config.validate().map_err(crate::config::ConfigError::from)?;
        Config::apply(&self.config);

        let environment = self.config.environment();
        let store = self
            .store
            .unwrap_or_else(|| Arc::new(FileStore::new(&self.config.registry.dir)));
        let registry = AddressRegistry::new(store, self.config.registry.max_conflict_retries);
        let lock = registry.lock(&environment.name)?;

        let executor = Arc::new(TxExecutor::with_cancellation(
            ExecutorPolicy::from(&self.config.executor),
            self.cancel,
        ));
        let resolver = Resolver::new(
            environment.clone(),
            registry,
            executor.clone(),
            Arc::new(self.factories),
        );

        log!(
            Topic::Config,
            Info,
            "session for {environment}, deployer {}, {} resource kinds",
            self.deployer,
            resolver.factories().len()
        );

        Ok(Session {
            config: self.config,
            environment,
            grants: RoleGrantManager::new(executor),
            resolver,
            context: RunContext::new(self.deployer),
            lock,
        })
    }
}

///
/// Session
///

pub struct Session {
    config: ConfigModel,
    environment: Environment,
    resolver: Resolver,
    grants: RoleGrantManager,
    context: RunContext,
    lock: Option<RunLock>,
}

impl Session {
    #[must_use]
    pub fn builder(config: ConfigModel, deployer: Address) -> SessionBuilder {
        SessionBuilder {
            config,
            deployer,
            store: None,
            factories: FactoryTable::new(),
            cancel: CancellationToken::new(),
        }
    }

    #[must_use]
    pub const fn config(&self) -> &ConfigModel {
        &self.config
    }

    #[must_use]
    pub const fn environment(&self) -> &Environment {
        &self.environment
    }

    #[must_use]
    pub const fn resolver(&self) -> &Resolver {
        &self.resolver
    }

    #[must_use]
    pub const fn grants(&self) -> &RoleGrantManager {
        &self.grants
    }

    #[must_use]
    pub const fn registry(&self) -> &AddressRegistry {
        self.resolver.registry()
    }

    #[must_use]
    pub fn executor(&self) -> &TxExecutor {
        self.resolver.executor()
    }

    #[must_use]
    pub const fn context(&self) -> &RunContext {
        &self.context
    }

    #[must_use]
    pub const fn deployer(&self) -> &Address {
        self.context.deployer()
    }

    #[must_use]
    pub const fn is_locked(&self) -> bool {
        self.lock.is_some()
    }

    /// Cancel every in-flight and future confirmation wait of this run.
    pub fn cancel(&self) {
        self.executor().cancellation().cancel();
    }

    #[must_use]
    pub fn total_gas_used(&self) -> u64 {
        self.executor().total_gas_used()
    }

    // ---------------------------------------------------------------------
    // Run
    // ---------------------------------------------------------------------

    /// Clear the environment's registry when it is ephemeral.
    /// Returns the number of documents removed, or `None` when persistent.
    pub fn reset_if_ephemeral(&self) -> Result<Option<usize>, RegistryError> {
        if !self.environment.is_ephemeral() {
            return Ok(None);
        }

        self.registry().reset(&self.environment.name).map(Some)
    }

    /// Run a pipeline on this session's shared context.
    pub async fn run(&mut self, pipeline: &Pipeline) -> Result<PipelineReport, PipelineError> {
        pipeline
            .run(&self.resolver, &self.grants, &mut self.context)
            .await
    }
}
