use rigger_core::{
    Error, Session,
    config::ConfigModel,
    executor::TxError,
    ids::{EnvironmentMode, ShardKey},
    ledger::LedgerError,
    pipeline::{Arg, Pipeline, PipelineError, ResourceRef, ResourceTemplate, Step, StepError},
    registry::{MemoryStore, RegistryError},
    resolve::ResolveError,
};
use rigger_testkit::{Fake, Fault, SimLedger, Target};
use std::sync::Arc;

const KINDS: [&str; 4] = ["FeeVault", "FundFee", "FeeRouter", "MarketFactory"];

fn session(ledger: &SimLedger, mode: EnvironmentMode) -> Session {
    let mut config = ConfigModel::for_environment("fuji", Some(mode)).unwrap();
    config.executor.max_attempts = 1;
    config.executor.confirmation_timeout_secs = 1;

    Session::builder(config, Fake::address(999))
        .store(Arc::new(MemoryStore::new()))
        .factories(ledger.factory_table(KINDS))
        .build()
        .unwrap()
}

fn fee_pipeline() -> Pipeline {
    Pipeline::new("fee")
        .step(Step::resolve(ResourceTemplate::new("FeeVault")))
        .step(Step::resolve(
            ResourceTemplate::new("FundFee").arg(Arg::global("FeeVault")),
        ))
        .step(Step::resolve(ResourceTemplate::new("FeeRouter")))
        .step(Step::grant(
            ResourceRef::global("FeeVault"),
            "ROLE_CONTROLLER",
            Arg::global("FundFee"),
        ))
}

#[tokio::test]
async fn pipeline_resumes_after_partial_failure() {
    let ledger = SimLedger::new();
    ledger.fail_once(Target::deploy("FundFee"), Fault::Revert("out of gas".into()));

    let mut first = session(&ledger, EnvironmentMode::Persistent);
    let err = first.run(&fee_pipeline()).await.unwrap_err();
    let PipelineError::StepFailed { index, step, source, .. } = err;
    assert_eq!(index, 1);
    assert_eq!(step, "resolve FundFee");
    assert!(matches!(source, StepError::Resolve(ResolveError::Tx(TxError::Reverted { .. }))));
    assert_eq!(ledger.deployments_of("FeeVault"), 1);
    assert_eq!(ledger.deployments_of("FeeRouter"), 0);

    // same registry, fresh run
    let store = first.registry().store().clone();
    drop(first);
    let mut config = ConfigModel::for_environment("fuji", Some(EnvironmentMode::Persistent)).unwrap();
    config.executor.max_attempts = 1;
    let mut second = Session::builder(config, Fake::address(999))
        .store(store)
        .factories(ledger.factory_table(KINDS))
        .build()
        .unwrap();

    let before = ledger.submissions();
    let report = second.run(&fee_pipeline()).await.unwrap();

    assert_eq!(report.attached, vec![ResourceRef::global("FeeVault")]);
    assert_eq!(
        report.created,
        vec![ResourceRef::global("FundFee"), ResourceRef::global("FeeRouter")]
    );
    assert_eq!(report.grants_applied, 1);
    assert_eq!(ledger.deployments_of("FeeVault"), 1);
    // two creations and one grant
    assert_eq!(ledger.submissions(), before + 3);

    // a third run does nothing at all
    let before = ledger.submissions();
    let report = second.run(&fee_pipeline()).await.unwrap();
    assert_eq!(ledger.submissions(), before);
    assert_eq!(report.created.len(), 0);
    assert_eq!(report.grants_unchanged, 1);
}

#[tokio::test]
async fn constructor_references_are_bound_to_addresses() {
    let ledger = SimLedger::new();
    let mut session = session(&ledger, EnvironmentMode::Persistent);

    session.run(&fee_pipeline()).await.unwrap();

    let vault = session
        .context()
        .get(&ResourceRef::global("FeeVault"))
        .unwrap();
    let fund_fee = session
        .context()
        .get(&ResourceRef::global("FundFee"))
        .unwrap();
    assert!(ledger.holds_role(
        &vault.address,
        &"ROLE_CONTROLLER".into(),
        &fund_fee.address
    ));
}

#[tokio::test]
async fn guarded_invoke_runs_once() {
    let ledger = SimLedger::new();
    ledger.link_flag("isMarket", "create");
    let mut session = session(&ledger, EnvironmentMode::Persistent);
    let eth = ShardKey::new("ETH").unwrap();

    let pipeline = Pipeline::new("wire")
        .step(Step::resolve(ResourceTemplate::new("MarketFactory")))
        .step(Step::resolve(
            ResourceTemplate::new("FeeVault").label("Market").shard(eth.clone()),
        ))
        .step(
            Step::invoke(
                ResourceRef::global("MarketFactory"),
                "create",
                vec![Arg::sharded(eth.clone(), "Market")],
            )
            .skip_if("isMarket", vec![Arg::sharded(eth, "Market")]),
        );

    let first = session.run(&pipeline).await.unwrap();
    let second = session.run(&pipeline).await.unwrap();

    assert_eq!(first.invocations, 1);
    assert_eq!(second.invocations, 0);
    assert_eq!(second.skipped, 1);
    assert_eq!(ledger.calls_of("create"), 1);
}

fn guarded_create() -> Pipeline {
    Pipeline::new("wire")
        .step(Step::resolve(ResourceTemplate::new("MarketFactory")))
        .step(
            Step::invoke(
                ResourceRef::global("MarketFactory"),
                "create",
                vec![Arg::Deployer],
            )
            .skip_if("isMarket", vec![Arg::Deployer]),
        )
}

#[tokio::test]
async fn hanging_guard_query_fails_the_step() {
    let ledger = SimLedger::new();
    let mut session = session(&ledger, EnvironmentMode::Persistent);
    ledger.set_queries_hang(true);

    let err = session.run(&guarded_create()).await.unwrap_err();

    assert!(matches!(
        err.step_error(),
        StepError::GuardQueryFailure {
            source: LedgerError::NoAnswer(_),
            ..
        }
    ));
    assert_eq!(ledger.calls_of("create"), 0);
}

#[tokio::test]
async fn session_cancel_stops_a_hanging_guard() {
    let ledger = SimLedger::new();
    let mut session = session(&ledger, EnvironmentMode::Persistent);
    session
        .run(&Pipeline::new("base").step(Step::resolve(ResourceTemplate::new("MarketFactory"))))
        .await
        .unwrap();
    ledger.set_queries_hang(true);
    session.cancel();

    let err = session.run(&guarded_create()).await.unwrap_err();

    assert!(matches!(
        err.step_error(),
        StepError::GuardQueryFailure {
            source: LedgerError::Cancelled,
            ..
        }
    ));
    assert_eq!(ledger.calls_of("create"), 0);
}

#[tokio::test]
async fn unguarded_invoke_repeats_on_rerun() {
    let ledger = SimLedger::new();
    let mut session = session(&ledger, EnvironmentMode::Persistent);

    let pipeline = Pipeline::new("init")
        .step(Step::resolve(ResourceTemplate::new("FeeRouter")))
        .step(Step::invoke(
            ResourceRef::global("FeeRouter"),
            "setFeeVault",
            vec![Arg::Deployer],
        ));

    session.run(&pipeline).await.unwrap();
    session.run(&pipeline).await.unwrap();

    assert_eq!(ledger.calls_of("setFeeVault"), 2);
    assert_eq!(
        ledger.invocations()[0].args,
        vec![rigger_core::ledger::ArgValue::Address(Fake::address(999))]
    );
}

#[tokio::test]
async fn missing_reference_names_the_step() {
    let ledger = SimLedger::new();
    let mut session = session(&ledger, EnvironmentMode::Persistent);

    let pipeline = Pipeline::new("broken").step(Step::grant(
        ResourceRef::global("FeeVault"),
        "ROLE_CONTROLLER",
        Arg::Deployer,
    ));

    let err = session.run(&pipeline).await.unwrap_err();

    assert!(matches!(err.step_error(), StepError::UnresolvedReference(_)));
    assert!(err.to_string().contains("grant ROLE_CONTROLLER on FeeVault"));
    assert_eq!(ledger.submissions(), 0);

    let err = Error::from(err);
    assert_eq!(err.class(), rigger_core::ErrorClass::Domain);
}

#[tokio::test]
async fn attach_step_never_deploys() {
    let ledger = SimLedger::new();
    let mut session = session(&ledger, EnvironmentMode::Persistent);

    let pipeline = Pipeline::new("market").step(Step::attach(ResourceTemplate::new("MarketFactory")));
    let err = session.run(&pipeline).await.unwrap_err();
    assert!(matches!(
        err.step_error(),
        StepError::Resolve(ResolveError::NotRecorded { .. })
    ));

    let base = Pipeline::new("base").step(Step::resolve(ResourceTemplate::new("MarketFactory")));
    session.run(&base).await.unwrap();
    let report = session.run(&pipeline).await.unwrap();
    assert_eq!(report.attached.len(), 1);
    assert_eq!(ledger.deployments(), 1);
}

#[tokio::test]
async fn ephemeral_reset_clears_previous_records() {
    let ledger = SimLedger::new();
    let mut session = session(&ledger, EnvironmentMode::Ephemeral);
    let pipeline = Pipeline::new("base").step(Step::resolve(ResourceTemplate::new("FeeVault")));

    session.run(&pipeline).await.unwrap();
    assert_eq!(session.reset_if_ephemeral().unwrap(), Some(1));
    session.run(&pipeline).await.unwrap();

    assert_eq!(ledger.deployments_of("FeeVault"), 2);
    assert!(session.total_gas_used() > 0);
}

#[tokio::test]
async fn persistent_session_never_resets() {
    let ledger = SimLedger::new();
    let session = session(&ledger, EnvironmentMode::Persistent);

    assert_eq!(session.reset_if_ephemeral().unwrap(), None);
    assert!(!session.is_locked());
}

#[test]
fn file_backed_sessions_lock_the_environment() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = ConfigModel::for_environment("fuji", None).unwrap();
    config.registry.dir = dir.path().to_path_buf();

    let first = Session::builder(config.clone(), Fake::address(1))
        .build()
        .unwrap();
    assert!(first.is_locked());

    let second = Session::builder(config.clone(), Fake::address(1)).build();
    assert!(matches!(
        second,
        Err(Error::Registry(RegistryError::Locked { .. }))
    ));

    drop(first);
    assert!(Session::builder(config, Fake::address(1)).build().is_ok());
}

#[test]
fn invalid_config_is_rejected_before_locking() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = ConfigModel::for_environment("fuji", None).unwrap();
    config.registry.dir = dir.path().to_path_buf();
    config.executor.max_attempts = 0;

    let result = Session::builder(config, Fake::address(1)).build();

    assert!(matches!(result, Err(Error::Config(_))));
    assert!(!dir.path().join("fuji").join(".rigger.lock").exists());
}
