use rigger_core::{
    executor::{ExecutorPolicy, TxError, TxExecutor},
    ids::{Address, Environment, EnvironmentMode, EnvironmentName, ResourceKind, ShardKey},
    registry::{AddressRegistry, FileStore, MemoryStore, RegistryError, RegistryStore},
    resolve::{Origin, ResolveError, ResourceDescriptor, Resolver},
};
use rigger_testkit::{Fault, SimLedger, Target};
use std::{fs, sync::Arc, time::Duration};

const KINDS: [&str; 5] = ["Vault", "USDC", "MarketRouter", "ERC1967Proxy", "Market"];

fn resolver(ledger: &SimLedger, store: Arc<dyn RegistryStore>, mode: EnvironmentMode) -> Resolver {
    let environment = Environment::new(EnvironmentName::new("fuji").unwrap(), mode);
    let executor = TxExecutor::new(ExecutorPolicy {
        max_attempts: 3,
        confirmation_timeout: Duration::from_millis(50),
    });

    Resolver::new(
        environment,
        AddressRegistry::new(store, 3),
        Arc::new(executor),
        Arc::new(ledger.factory_table(KINDS)),
    )
}

fn persistent(ledger: &SimLedger) -> Resolver {
    resolver(ledger, Arc::new(MemoryStore::new()), EnvironmentMode::Persistent)
}

fn core_vault() -> ResourceDescriptor {
    ResourceDescriptor::new(ResourceKind::new("Vault")).label("CoreVault")
}

fn fuji() -> EnvironmentName {
    EnvironmentName::new("fuji").unwrap()
}

#[tokio::test]
async fn persistent_resolve_attaches_on_second_call() {
    let ledger = SimLedger::new();
    let resolver = persistent(&ledger);

    let first = resolver.resolve(&core_vault()).await.unwrap();
    let submissions = ledger.submissions();
    let second = resolver.resolve(&core_vault()).await.unwrap();

    assert!(first.was_created());
    assert_eq!(second.origin, Origin::Attached);
    assert_eq!(first.address, second.address);
    assert_eq!(ledger.deployments_of("Vault"), 1);
    assert_eq!(ledger.submissions(), submissions);
}

#[tokio::test]
async fn ephemeral_resolve_always_creates() {
    let ledger = SimLedger::new();
    let resolver = resolver(&ledger, Arc::new(MemoryStore::new()), EnvironmentMode::Ephemeral);

    let first = resolver.resolve(&core_vault()).await.unwrap();
    resolver.registry().reset(&fuji()).unwrap();
    let second = resolver.resolve(&core_vault()).await.unwrap();
    let third = resolver.resolve(&core_vault()).await.unwrap();

    assert_ne!(first.address, second.address);
    assert_ne!(second.address, third.address);
    assert_eq!(ledger.deployments_of("Vault"), 3);

    // ephemeral runs still record the latest address
    let recorded = resolver
        .registry()
        .get(&fuji(), None, &"CoreVault".into())
        .unwrap();
    assert_eq!(recorded, Some(third.address));
}

#[tokio::test]
async fn sharded_vault_scenario_on_file_store() {
    let dir = tempfile::tempdir().unwrap();
    let ledger = SimLedger::new();
    let store = Arc::new(FileStore::new(dir.path()));
    let resolver = resolver(&ledger, store.clone(), EnvironmentMode::Persistent);
    let eth = ShardKey::new("ETH").unwrap();
    let desc = core_vault().shard(eth.clone());

    let deployed = resolver.resolve(&desc).await.unwrap();
    let path = dir.path().join("fuji").join("contract-addresses-ETH.json");
    let body: serde_json::Value = serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
    assert_eq!(body["CoreVault"], deployed.address.as_str());

    let submissions = ledger.submissions();
    let attached = resolver.resolve(&desc).await.unwrap();
    assert_eq!(attached.address, deployed.address);
    assert_eq!(ledger.submissions(), submissions);

    // the global partition never saw it
    assert_eq!(
        resolver.registry().get(&fuji(), None, &"CoreVault".into()).unwrap(),
        None
    );

    resolver.registry().reset(&fuji()).unwrap();
    assert!(resolver.registry().records(&fuji(), Some(&eth)).unwrap().is_empty());
}

#[tokio::test]
async fn corrupt_registry_fails_closed() {
    let dir = tempfile::tempdir().unwrap();
    let ledger = SimLedger::new();
    let store = Arc::new(FileStore::new(dir.path()));
    let resolver = resolver(&ledger, store, EnvironmentMode::Persistent);

    fs::create_dir_all(dir.path().join("fuji")).unwrap();
    fs::write(dir.path().join("fuji").join("contract-addresses.json"), "{ not json").unwrap();

    let get = resolver.registry().get(&fuji(), None, &"CoreVault".into());
    assert!(get.unwrap_err().is_io_failure());

    let err = resolver.resolve(&core_vault()).await.unwrap_err();
    assert!(matches!(err, ResolveError::Registry(ref e) if e.is_io_failure()));
    assert_eq!(ledger.submissions(), 0);
}

#[tokio::test]
async fn missing_contract_address_records_nothing() {
    let ledger = SimLedger::new();
    let resolver = persistent(&ledger);
    ledger.fail_once(Target::deploy("Vault"), Fault::NoAddress);

    let err = resolver.resolve(&core_vault()).await.unwrap_err();

    assert!(matches!(err, ResolveError::MissingAddress { .. }));
    assert!(resolver.registry().records(&fuji(), None).unwrap().is_empty());
}

#[tokio::test]
async fn failed_creation_records_nothing() {
    let ledger = SimLedger::new();
    let resolver = persistent(&ledger);
    ledger.fail(Target::deploy("Vault"), Fault::Revert("out of gas".into()), 3);

    let err = resolver.resolve(&core_vault()).await.unwrap_err();

    assert!(matches!(
        err,
        ResolveError::Tx(TxError::Reverted { attempts: 3, .. })
    ));
    assert_eq!(ledger.submissions(), 3);
    assert!(resolver.registry().records(&fuji(), None).unwrap().is_empty());
}

#[tokio::test]
async fn transient_revert_is_retried_then_recorded() {
    let ledger = SimLedger::new();
    let resolver = persistent(&ledger);
    ledger.fail_once(Target::deploy("Vault"), Fault::Revert("nonce".into()));

    let handle = resolver.resolve(&core_vault()).await.unwrap();

    assert!(handle.was_created());
    assert_eq!(ledger.submissions(), 2);
    assert_eq!(ledger.deployments_of("Vault"), 1);
}

#[tokio::test]
async fn hanging_creation_times_out() {
    let ledger = SimLedger::new();
    let resolver = persistent(&ledger);
    ledger.fail(Target::deploy("Vault"), Fault::Hang, 3);

    let err = resolver.resolve(&core_vault()).await.unwrap_err();

    assert!(matches!(err, ResolveError::Tx(TxError::TimedOut { attempts: 3, .. })));
}

#[tokio::test]
async fn rejected_creation_is_not_retried() {
    let ledger = SimLedger::new();
    let resolver = persistent(&ledger);
    ledger.fail(Target::deploy("Vault"), Fault::Reject("insufficient funds".into()), 5);

    let err = resolver.resolve(&core_vault()).await.unwrap_err();

    assert!(matches!(err, ResolveError::Tx(TxError::SubmissionFailed { .. })));
    assert_eq!(ledger.submissions(), 0);
}

#[tokio::test]
async fn cancelled_run_creates_nothing() {
    let ledger = SimLedger::new();
    let resolver = persistent(&ledger);
    resolver.executor().cancellation().cancel();

    let err = resolver.resolve(&core_vault()).await.unwrap_err();

    assert!(matches!(err, ResolveError::Tx(TxError::Cancelled { .. })));
    assert_eq!(ledger.submissions(), 0);
}

#[tokio::test]
async fn unknown_kind_is_rejected() {
    let ledger = SimLedger::new();
    let resolver = persistent(&ledger);

    let err = resolver
        .resolve(&ResourceDescriptor::new(ResourceKind::new("Oracle")))
        .await
        .unwrap_err();

    assert!(matches!(err, ResolveError::UnknownKind(ref k) if k.as_str() == "Oracle"));
}

#[tokio::test]
async fn attach_existing_requires_a_record() {
    let ledger = SimLedger::new();
    let resolver = persistent(&ledger);

    let err = resolver.attach_existing(&core_vault()).unwrap_err();
    assert!(matches!(err, ResolveError::NotRecorded { .. }));

    let deployed = resolver.resolve(&core_vault()).await.unwrap();
    let attached = resolver.attach_existing(&core_vault()).unwrap();
    assert_eq!(attached.address, deployed.address);
    assert_eq!(attached.client().address(), &deployed.address);
}

#[tokio::test]
async fn deploy_fresh_replaces_the_record() {
    let ledger = SimLedger::new();
    let resolver = persistent(&ledger);

    let old = resolver.resolve(&core_vault()).await.unwrap();
    let new = resolver.deploy_fresh(&core_vault()).await.unwrap();

    assert_ne!(old.address, new.address);
    assert_eq!(
        resolver.registry().get(&fuji(), None, &"CoreVault".into()).unwrap(),
        Some(new.address)
    );
}

#[tokio::test]
async fn upgradeable_records_proxy_and_implementation() {
    let ledger = SimLedger::new();
    let resolver = persistent(&ledger);
    let desc = ResourceDescriptor::new(ResourceKind::new("MarketRouter"));
    let proxy_kind = ResourceKind::new("ERC1967Proxy");

    let pair = resolver.resolve_upgradeable(&desc, &proxy_kind).await.unwrap();

    assert_eq!(pair.proxy.key.as_str(), "MarketRouter");
    assert_eq!(pair.implementation.key.as_str(), "MarketRouterImpl");
    assert_eq!(pair.proxy.kind.as_str(), "MarketRouter");
    assert_eq!(ledger.deployments_of("ERC1967Proxy"), 1);

    let records: Vec<(String, Address)> = resolver
        .registry()
        .records(&fuji(), None)
        .unwrap()
        .into_iter()
        .map(|r| (r.key.as_str().to_string(), r.address))
        .collect();
    assert_eq!(
        records,
        vec![
            ("MarketRouter".to_string(), pair.proxy.address.clone()),
            ("MarketRouterImpl".to_string(), pair.implementation.address.clone()),
        ]
    );

    let again = resolver.resolve_upgradeable(&desc, &proxy_kind).await.unwrap();
    assert!(!again.proxy.was_created());
    assert!(!again.implementation.was_created());
    assert_eq!(ledger.deployments(), 2);
}

#[tokio::test]
async fn lock_is_exclusive_per_environment() {
    let dir = tempfile::tempdir().unwrap();
    let registry = AddressRegistry::new(Arc::new(FileStore::new(dir.path())), 3);

    let held = registry.lock(&fuji()).unwrap();
    assert!(held.is_some());
    assert!(matches!(
        registry.lock(&fuji()),
        Err(RegistryError::Locked { .. })
    ));

    drop(held);
    assert!(registry.lock(&fuji()).unwrap().is_some());
}
