use rigger_core::{
    Session,
    config::ConfigModel,
    ids::{EnvironmentMode, ResourceKey, ShardKey},
    ledger::ArgValue,
    pipeline::ResourceRef,
    registry::MemoryStore,
};
use rigger_market::{
    MarketError, MarketSpec, deploy_all, deploy_base, deploy_market, kinds,
    recipe::{self, ORDER_BOOK_LONG},
    roles, wire_market,
};
use rigger_testkit::{Fake, Fault, SimLedger, Target};
use std::sync::Arc;

const DEPLOYER: u64 = 999;

fn config(mode: EnvironmentMode) -> ConfigModel {
    let mut config = ConfigModel::for_environment("fuji", Some(mode)).unwrap();
    config.executor.max_attempts = 2;
    config.executor.confirmation_timeout_secs = 1;
    config
}

fn link_flags(ledger: &SimLedger) {
    ledger.link_flag("isMarket", "create");
    ledger.link_flag(recipe::INITIALIZED_QUERY, "initialize");
}

fn session(ledger: &SimLedger, mode: EnvironmentMode) -> Session {
    link_flags(ledger);

    Session::builder(config(mode), Fake::address(DEPLOYER))
        .store(Arc::new(MemoryStore::new()))
        .factories(ledger.factory_table(kinds::ALL))
        .build()
        .unwrap()
}

fn eth() -> MarketSpec {
    MarketSpec::new("ETH", Fake::address(10_001))
}

fn ethx() -> MarketSpec {
    MarketSpec::new("ETHX/USD", Fake::address(10_002))
}

#[tokio::test]
async fn full_deployment_builds_and_wires_every_market() {
    let ledger = SimLedger::new();
    let mut session = session(&ledger, EnvironmentMode::Persistent);

    let report = deploy_all(&mut session, &[eth()]).await.unwrap();

    // 16 base contracts plus the router proxy, then 9 per market
    assert_eq!(ledger.deployments(), 17 + 9);
    assert_eq!(ledger.deployments_of("FastPriceFeed"), 1);
    assert_eq!(ledger.deployments_of("MockOracle"), 0);
    assert_eq!(ledger.deployments_of("ERC1967Proxy"), 1);
    assert_eq!(ledger.deployments_of("OrderStore"), 4);
    assert_eq!(report.created.len(), 26);
    assert_eq!(report.grants_applied, 8 + 3 + 4);
    assert_eq!(ledger.calls_of("create"), 1);
    assert_eq!(ledger.calls_of("setMarket"), 1);
    assert_eq!(ledger.calls_of("initialize"), 7);
    assert_eq!(ledger.calls_of("setFeeAndRates"), 1);
    assert_eq!(ledger.calls_of("setMaxMarketSizeLimit"), 1);

    let env = session.environment().name.clone();
    let shard = ShardKey::new("ETH").unwrap();
    assert_eq!(session.registry().records(&env, None).unwrap().len(), 17);
    assert_eq!(session.registry().records(&env, Some(&shard)).unwrap().len(), 9);

    let ctx = session.context();
    let factory = ctx.address(&ResourceRef::global("MarketFactory")).unwrap();
    let router = ctx.address(&ResourceRef::global("MarketRouter")).unwrap();
    let market = ctx.address(&ResourceRef::sharded(shard.clone(), "Market")).unwrap();
    let fee_router = ctx.address(&ResourceRef::global("FeeRouter")).unwrap();
    assert!(ledger.holds_role(router, &roles::MARKET_MGR_ROLE, factory));
    assert!(ledger.holds_role(factory, &roles::MARKET_MGR_ROLE, &Fake::address(DEPLOYER)));
    assert!(ledger.holds_role(fee_router, &roles::ROLE_CONTROLLER, market));

    let create = ledger
        .invocations()
        .into_iter()
        .find(|call| call.method == "create")
        .unwrap();
    assert_eq!(&create.address, factory);
    assert_eq!(create.args[0].to_string(), "\"ETH/USD\"");

    let router_init = ledger
        .invocations()
        .into_iter()
        .find(|call| call.method == "initialize" && &call.address == router)
        .unwrap();
    let global_valid = ctx.address(&ResourceRef::global("GlobalValid")).unwrap();
    assert_eq!(router_init.args[1], ArgValue::Address(global_valid.clone()));

    let limit = ledger
        .invocations()
        .into_iter()
        .find(|call| call.method == "setMaxMarketSizeLimit")
        .unwrap();
    assert_eq!(&limit.address, global_valid);
    assert_eq!(limit.args[0], ArgValue::Address(market.clone()));
}

#[tokio::test]
async fn rerun_only_repeats_unguarded_calls() {
    let ledger = SimLedger::new();
    let mut session = session(&ledger, EnvironmentMode::Persistent);
    deploy_all(&mut session, &[eth()]).await.unwrap();

    let deployments = ledger.deployments();
    let grants = ledger.grants();
    let report = deploy_all(&mut session, &[eth()]).await.unwrap();

    assert_eq!(ledger.deployments(), deployments);
    assert_eq!(ledger.grants(), grants);
    assert!(report.created.is_empty());
    assert_eq!(report.grants_applied, 0);
    // seven initializers and the market registration
    assert_eq!(report.skipped, 8);
    assert_eq!(ledger.calls_of("create"), 1);
    assert_eq!(ledger.calls_of("initialize"), 7);
    // plain setters have no guard and go out again
    assert_eq!(ledger.calls_of("setMarket"), 2);
    assert_eq!(ledger.calls_of("setFeeAndRates"), 2);
    assert_eq!(ledger.calls_of("setMaxMarketSizeLimit"), 2);
}

#[tokio::test]
async fn similar_symbols_get_distinct_shards() {
    let ledger = SimLedger::new();
    let mut session = session(&ledger, EnvironmentMode::Persistent);

    deploy_all(&mut session, &[eth(), ethx()]).await.unwrap();

    assert_eq!(ledger.deployments_of("Market"), 2);
    assert_eq!(ledger.calls_of("create"), 2);

    let env = session.environment().name.clone();
    let registry = session.registry();
    let eth_key = ShardKey::new("ETH").unwrap();
    let ethx_key = ShardKey::new("ETHX").unwrap();
    let eth_book = registry.get(&env, Some(&eth_key), &ORDER_BOOK_LONG).unwrap();
    let ethx_book = registry.get(&env, Some(&ethx_key), &ORDER_BOOK_LONG).unwrap();
    assert!(eth_book.is_some());
    assert_ne!(eth_book, ethx_book);
}

#[tokio::test]
async fn duplicate_shards_fail_before_any_transaction() {
    let ledger = SimLedger::new();
    let mut session = session(&ledger, EnvironmentMode::Persistent);

    let err = deploy_all(&mut session, &[eth(), MarketSpec::new("eth/usd", Fake::address(1))])
        .await
        .unwrap_err();

    assert!(matches!(err, MarketError::DuplicateShard { .. }));
    assert_eq!(ledger.submissions(), 0);
}

#[tokio::test]
async fn ephemeral_runs_start_over_with_a_mock_oracle() {
    let ledger = SimLedger::new();
    let mut session = session(&ledger, EnvironmentMode::Ephemeral);

    deploy_base(&mut session).await.unwrap();
    deploy_base(&mut session).await.unwrap();

    assert_eq!(ledger.deployments_of("MockOracle"), 2);
    assert_eq!(ledger.deployments_of("FastPriceFeed"), 0);
    assert_eq!(ledger.deployments_of("GlobalValid"), 2);
}

#[tokio::test]
async fn market_needs_base_first() {
    let ledger = SimLedger::new();
    let mut session = session(&ledger, EnvironmentMode::Persistent);

    let err = deploy_market(&mut session, &eth()).await.unwrap_err();

    let MarketError::Pipeline(err) = err else {
        panic!("expected a pipeline failure");
    };
    assert!(err.to_string().contains("attach MarketFactory"));
    assert_eq!(ledger.deployments(), 0);
}

#[tokio::test]
async fn failed_market_deployment_resumes() {
    let ledger = SimLedger::new();
    let mut session = session(&ledger, EnvironmentMode::Persistent);
    deploy_base(&mut session).await.unwrap();

    ledger.fail(Target::deploy("MarketValid"), Fault::Revert("out of gas".into()), 2);
    assert!(deploy_market(&mut session, &eth()).await.is_err());
    assert_eq!(ledger.deployments_of("Market"), 1);

    deploy_market(&mut session, &eth()).await.unwrap();
    wire_market(&mut session, &eth()).await.unwrap();

    assert_eq!(ledger.deployments_of("Market"), 1);
    assert_eq!(ledger.deployments_of("OrderBook"), 2);
    assert_eq!(ledger.calls_of("create"), 1);
}

#[tokio::test]
async fn file_registry_survives_sessions() {
    let dir = tempfile::tempdir().unwrap();
    let ledger = SimLedger::new();
    link_flags(&ledger);
    let mut config = config(EnvironmentMode::Persistent);
    config.registry.dir = dir.path().to_path_buf();

    {
        let mut session = Session::builder(config.clone(), Fake::address(DEPLOYER))
            .factories(ledger.factory_table(kinds::ALL))
            .build()
            .unwrap();
        deploy_all(&mut session, &[eth()]).await.unwrap();
    }

    assert!(dir.path().join("fuji").join("contract-addresses.json").exists());
    assert!(dir.path().join("fuji").join("contract-addresses-ETH.json").exists());

    let deployments = ledger.deployments();
    let mut session = Session::builder(config, Fake::address(DEPLOYER))
        .factories(ledger.factory_table(kinds::ALL))
        .build()
        .unwrap();
    deploy_all(&mut session, &[eth()]).await.unwrap();

    assert_eq!(ledger.deployments(), deployments);
    let implementation = session
        .registry()
        .get(
            &session.environment().name,
            None,
            &ResourceKey::new("MarketRouterImpl"),
        )
        .unwrap();
    assert!(implementation.is_some());
}

#[test]
fn wiring_attaches_the_right_oracle() {
    let persistent = config(EnvironmentMode::Persistent).environment();
    let pipeline = recipe::wiring_pipeline(&persistent, &eth()).unwrap();

    assert!(
        pipeline
            .steps()
            .iter()
            .any(|step| step.describe() == "attach FastPriceFeed")
    );
}
