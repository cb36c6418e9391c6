//! Provisioning recipes for the market protocol.
//!
//! - `base`: shared infrastructure (validation, collateral, liquidity
//!   vault, trading managers, fee routing, price oracle), its one-time
//!   `initialize` calls and the controller grants between them.
//! - `market <SHARD>`: the per-instrument contracts, each built against
//!   the market factory, recorded in the instrument's shard.
//! - `wire <SHARD>`: registers the instrument with the factory and the
//!   vault router, sets its fee rates and size limit and grants the manager
//!   roles.
//!
//! `initialize` calls are skipped once the target reports `isInitialized`;
//! `create` is skipped once the factory reports `isMarket(market)`. The
//! remaining setters have no query and are re-sent on every run.
//!
//! Market and wiring pipelines attach to base contracts instead of
//! resolving them, so they never redeploy shared infrastructure.

use crate::{
    MarketError, MarketSpec,
    kinds::{self, *},
    roles::*,
};
use rigger_core::{
    Session,
    ids::{Environment, IdError, ResourceKey, ResourceKind, RoleId, ShardKey},
    log::Topic,
    pipeline::{Arg, Pipeline, PipelineReport, ResourceRef, ResourceTemplate, Step},
};
use std::collections::BTreeMap;

pub const USDC_SUPPLY: u128 = 1_000_000_000_000_000_000;
pub const LP_TOKEN_NAME: &str = "BLP";
pub const ORDER_STORES: usize = 4;
pub const INITIALIZED_QUERY: &str = "isInitialized";

pub const ORDER_BOOK_LONG: ResourceKey = ResourceKey::new("orderBookLong");
pub const ORDER_BOOK_SHORT: ResourceKey = ResourceKey::new("orderBookShort");

// ---------------------------------------------------------------------
// Pipelines
// ---------------------------------------------------------------------

#[must_use]
pub fn base_pipeline(environment: &Environment) -> Pipeline {
    Pipeline::new("base")
        .step(resolve(GLOBAL_VALID))
        .step(Step::resolve(
            ResourceTemplate::new(USDC)
                .arg("USDC")
                .arg("USDC")
                .arg(USDC_SUPPLY),
        ))
        .step(Step::resolve(
            ResourceTemplate::new(CORE_VAULT)
                .arg(global(&USDC))
                .arg(LP_TOKEN_NAME)
                .arg(LP_TOKEN_NAME),
        ))
        .step(resolve(VAULT_ROUTER))
        .step(resolve(VAULT_REWARD))
        .step(resolve(REWARD_DISTRIBUTOR))
        .step(resolve(MARKET_FACTORY))
        .step(Step::upgradeable(
            ResourceTemplate::new(MARKET_ROUTER),
            ERC1967_PROXY,
        ))
        .step(Step::resolve(
            ResourceTemplate::new(MARKET_READER).arg(global(&MARKET_FACTORY)),
        ))
        .step(resolve(POSITION_ADD_MGR))
        .step(resolve(POSITION_SUB_MGR))
        .step(resolve(ORDER_MGR))
        .step(resolve(FEE_VAULT))
        .step(Step::resolve(
            ResourceTemplate::new(FUND_FEE).arg(global(&FEE_VAULT)),
        ))
        .step(Step::resolve(
            ResourceTemplate::new(FEE_ROUTER).arg(global(&MARKET_FACTORY)),
        ))
        .step(resolve(kinds::oracle(environment)))
        .step(initialize(&FEE_ROUTER, vec![global(&FEE_VAULT), global(&FUND_FEE)]))
        .step(initialize(
            &MARKET_ROUTER,
            vec![
                global(&MARKET_FACTORY),
                global(&GLOBAL_VALID),
                global(&VAULT_ROUTER),
            ],
        ))
        .step(initialize(
            &MARKET_READER,
            vec![global(&MARKET_ROUTER), global(&VAULT_ROUTER)],
        ))
        .step(initialize(&CORE_VAULT, vec![global(&VAULT_ROUTER)]))
        .step(initialize(
            &VAULT_ROUTER,
            vec![global(&CORE_VAULT), global(&FEE_ROUTER)],
        ))
        .step(initialize(
            &VAULT_REWARD,
            vec![
                global(&CORE_VAULT),
                global(&VAULT_ROUTER),
                global(&FEE_ROUTER),
                global(&REWARD_DISTRIBUTOR),
            ],
        ))
        // the vault's asset is the collateral token
        .step(initialize(
            &REWARD_DISTRIBUTOR,
            vec![global(&USDC), global(&VAULT_REWARD)],
        ))
        .step(grant(&FEE_VAULT, ROLE_CONTROLLER, global(&FUND_FEE)))
        .step(grant(&FEE_VAULT, ROLE_CONTROLLER, global(&FEE_ROUTER)))
        .step(grant(&FUND_FEE, ROLE_CONTROLLER, global(&FEE_ROUTER)))
        .step(grant(&FEE_ROUTER, ROLE_CONTROLLER, global(&VAULT_ROUTER)))
        .step(grant(&FEE_ROUTER, ROLE_CONTROLLER, global(&VAULT_REWARD)))
        .step(grant(&FEE_ROUTER, ROLE_CONTROLLER, global(&CORE_VAULT)))
        .step(grant(&CORE_VAULT, ROLE_CONTROLLER, global(&VAULT_REWARD)))
        .step(grant(&CORE_VAULT, ROLE_CONTROLLER, global(&VAULT_ROUTER)))
}

pub fn market_pipeline(market: &MarketSpec) -> Result<Pipeline, IdError> {
    let shard = market.shard()?;
    let built = |kind: ResourceKind| {
        ResourceTemplate::new(kind)
            .shard(shard.clone())
            .arg(global(&MARKET_FACTORY))
    };

    let mut pipeline = Pipeline::new(format!("market {shard}"))
        .step(Step::attach(ResourceTemplate::new(MARKET_FACTORY)))
        .step(Step::attach(ResourceTemplate::new(MARKET_ROUTER)))
        .step(Step::resolve(built(MARKET)))
        .step(Step::resolve(built(POSITION_BOOK)))
        .step(Step::resolve(built(ORDER_BOOK).label(ORDER_BOOK_LONG)))
        .step(Step::resolve(built(ORDER_BOOK).label(ORDER_BOOK_SHORT)))
        .step(Step::resolve(built(MARKET_VALID)));

    for index in 0..ORDER_STORES {
        pipeline.push(Step::resolve(
            built(ORDER_STORE).label(order_store(index)),
        ));
    }

    Ok(pipeline
        .step(Step::grant(
            in_shard(&shard, &MARKET_VALID),
            MARKET_MGR_ROLE,
            global(&MARKET_FACTORY),
        ))
        .step(grant(&MARKET_ROUTER, MARKET_MGR_ROLE, global(&MARKET_FACTORY)))
        .step(grant(&MARKET_FACTORY, MARKET_MGR_ROLE, Arg::Deployer)))
}

pub fn wiring_pipeline(environment: &Environment, market: &MarketSpec) -> Result<Pipeline, IdError> {
    let shard = market.shard()?;
    let oracle = kinds::oracle(environment);
    let mut pipeline = Pipeline::new(format!("wire {shard}"));

    for kind in [
        MARKET_FACTORY,
        MARKET_ROUTER,
        VAULT_ROUTER,
        CORE_VAULT,
        FEE_ROUTER,
        GLOBAL_VALID,
        POSITION_ADD_MGR,
        POSITION_SUB_MGR,
        ORDER_MGR,
        USDC,
        oracle.clone(),
    ] {
        pipeline.push(Step::attach(ResourceTemplate::new(kind)));
    }

    let attach = |kind: ResourceKind, label: ResourceKey| {
        Step::attach(ResourceTemplate::new(kind).label(label).shard(shard.clone()))
    };
    pipeline.push(attach(MARKET, ResourceKey::from(&MARKET)));
    pipeline.push(attach(POSITION_BOOK, ResourceKey::from(&POSITION_BOOK)));
    pipeline.push(attach(ORDER_BOOK, ORDER_BOOK_LONG));
    pipeline.push(attach(ORDER_BOOK, ORDER_BOOK_SHORT));
    pipeline.push(attach(MARKET_VALID, ResourceKey::from(&MARKET_VALID)));
    for index in 0..ORDER_STORES {
        pipeline.push(attach(ORDER_STORE, order_store(index)));
    }

    let market_ref = Arg::Ref(in_shard(&shard, &MARKET));

    Ok(pipeline
        .step(
            Step::invoke(
                global_ref(&MARKET_FACTORY),
                "create",
                create_args(market, &shard, &oracle)?,
            )
            .skip_if("isMarket", vec![market_ref.clone()]),
        )
        .step(Step::invoke(
            global_ref(&VAULT_ROUTER),
            "setMarket",
            vec![market_ref.clone(), global(&CORE_VAULT)],
        ))
        .step(Step::invoke(
            global_ref(&FEE_ROUTER),
            "setFeeAndRates",
            vec![
                market_ref.clone(),
                Arg::List(market.params.fee_rates.map(Arg::from).to_vec()),
            ],
        ))
        .step(Step::invoke(
            global_ref(&GLOBAL_VALID),
            "setMaxMarketSizeLimit",
            vec![market_ref.clone(), Arg::from(market.params.max_market_size)],
        ))
        .step(grant(&FEE_ROUTER, ROLE_CONTROLLER, market_ref))
        .step(grant(&FEE_ROUTER, MARKET_MGR_ROLE, Arg::Deployer))
        .step(grant(&VAULT_ROUTER, VAULT_MGR_ROLE, Arg::Deployer))
        .step(grant(&GLOBAL_VALID, GLOBAL_MGR_ROLE, Arg::Deployer)))
}

// `MarketFactory.create` input: name, market, component addresses, the
// four order stores, then the trading limits.
fn create_args(
    market: &MarketSpec,
    shard: &ShardKey,
    oracle: &ResourceKind,
) -> Result<Vec<Arg>, IdError> {
    let local = |kind: &ResourceKind| Arg::Ref(in_shard(shard, kind));
    let local_key = |key: ResourceKey| Arg::sharded(shard.clone(), key);
    let p = &market.params;

    let components = vec![
        local(&POSITION_BOOK),
        local_key(ORDER_BOOK_LONG),
        local_key(ORDER_BOOK_SHORT),
        local(&MARKET_VALID),
        global(oracle),
        global(&POSITION_SUB_MGR),
        global(&POSITION_ADD_MGR),
        Arg::from(market.index_token.clone()),
        global(&FEE_ROUTER),
        global(&MARKET_ROUTER),
        global(&VAULT_ROUTER),
        global(&USDC),
        global(&GLOBAL_VALID),
        global(&ORDER_MGR),
    ];

    let mut args = vec![
        Arg::from(market.name()?.as_str()),
        local(&MARKET),
        Arg::List(components),
    ];
    args.extend((0..ORDER_STORES).map(|index| local_key(order_store(index))));
    args.extend(
        [
            p.min_slippage,
            p.max_slippage,
            p.min_leverage,
            p.max_leverage,
            p.max_trade_amount,
            p.min_pay,
            p.min_collateral,
        ]
        .map(Arg::from),
    );
    args.extend([
        Arg::from(p.allow_open),
        Arg::from(p.allow_close),
        Arg::from(p.token_digits),
    ]);

    Ok(args)
}

// ---------------------------------------------------------------------
// Runs
// ---------------------------------------------------------------------

/// Shared infrastructure. Ephemeral environments start from an empty
/// registry.
pub async fn deploy_base(session: &mut Session) -> Result<PipelineReport, MarketError> {
    if let Some(removed) = session.reset_if_ephemeral()? {
        rigger_core::log!(
            Topic::Pipeline,
            Info,
            "ephemeral {}: cleared {removed} registry document(s)",
            session.environment().name
        );
    }

    let pipeline = base_pipeline(session.environment());

    Ok(session.run(&pipeline).await?)
}

pub async fn deploy_market(
    session: &mut Session,
    market: &MarketSpec,
) -> Result<PipelineReport, MarketError> {
    let pipeline = market_pipeline(market)?;

    Ok(session.run(&pipeline).await?)
}

pub async fn wire_market(
    session: &mut Session,
    market: &MarketSpec,
) -> Result<PipelineReport, MarketError> {
    let pipeline = wiring_pipeline(session.environment(), market)?;

    Ok(session.run(&pipeline).await?)
}

/// Base, then every market followed by its wiring.
pub async fn deploy_all(
    session: &mut Session,
    markets: &[MarketSpec],
) -> Result<PipelineReport, MarketError> {
    check_distinct_shards(markets)?;

    let mut report = deploy_base(session).await?;
    for market in markets {
        report.absorb(deploy_market(session, market).await?);
        report.absorb(wire_market(session, market).await?);
    }

    rigger_core::log!(
        Topic::Pipeline,
        Ok,
        "🎉 {} market(s) live on {}, total gasUsed: {}",
        markets.len(),
        session.environment(),
        session.total_gas_used()
    );

    Ok(report)
}

fn check_distinct_shards(markets: &[MarketSpec]) -> Result<(), MarketError> {
    let mut seen: BTreeMap<ShardKey, &str> = BTreeMap::new();

    for market in markets {
        let shard = market.shard()?;
        if let Some(first) = seen.insert(shard.clone(), &market.symbol) {
            return Err(MarketError::DuplicateShard {
                first: first.to_string(),
                second: market.symbol.clone(),
                shard: shard.to_string(),
            });
        }
    }

    Ok(())
}

// ---------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------

fn resolve(kind: ResourceKind) -> Step {
    Step::resolve(ResourceTemplate::new(kind))
}

fn global(kind: &ResourceKind) -> Arg {
    Arg::Ref(global_ref(kind))
}

fn global_ref(kind: &ResourceKind) -> ResourceRef {
    ResourceRef::global(ResourceKey::from(kind))
}

fn in_shard(shard: &ShardKey, kind: &ResourceKind) -> ResourceRef {
    ResourceRef::sharded(shard.clone(), ResourceKey::from(kind))
}

fn grant(target: &ResourceKind, role: RoleId, principal: Arg) -> Step {
    Step::grant(global_ref(target), role, principal)
}

fn initialize(target: &ResourceKind, args: Vec<Arg>) -> Step {
    Step::invoke(global_ref(target), "initialize", args).skip_if(INITIALIZED_QUERY, Vec::new())
}

fn order_store(index: usize) -> ResourceKey {
    ResourceKey::owned(format!("OrderStore{index}"))
}

///
/// TESTS
///
