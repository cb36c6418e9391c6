//! Contract kinds of the market protocol. Each kind's registry key is its
//! name unless a recipe labels it.

use rigger_core::ids::{Environment, ResourceKind};

// base
pub const GLOBAL_VALID: ResourceKind = ResourceKind::new("GlobalValid");
pub const USDC: ResourceKind = ResourceKind::new("USDC");

// liquidity
pub const CORE_VAULT: ResourceKind = ResourceKind::new("CoreVault");
pub const VAULT_ROUTER: ResourceKind = ResourceKind::new("VaultRouter");
pub const VAULT_REWARD: ResourceKind = ResourceKind::new("VaultReward");
pub const REWARD_DISTRIBUTOR: ResourceKind = ResourceKind::new("RewardDistributor");

// trading
pub const MARKET_FACTORY: ResourceKind = ResourceKind::new("MarketFactory");
pub const MARKET_ROUTER: ResourceKind = ResourceKind::new("MarketRouter");
pub const MARKET_READER: ResourceKind = ResourceKind::new("MarketReader");
pub const POSITION_ADD_MGR: ResourceKind = ResourceKind::new("PositionAddMgr");
pub const POSITION_SUB_MGR: ResourceKind = ResourceKind::new("PositionSubMgr");
pub const ORDER_MGR: ResourceKind = ResourceKind::new("OrderMgr");

// fees
pub const FEE_VAULT: ResourceKind = ResourceKind::new("FeeVault");
pub const FUND_FEE: ResourceKind = ResourceKind::new("FundFee");
pub const FEE_ROUTER: ResourceKind = ResourceKind::new("FeeRouter");

// oracles
pub const MOCK_ORACLE: ResourceKind = ResourceKind::new("MockOracle");
pub const FAST_PRICE_FEED: ResourceKind = ResourceKind::new("FastPriceFeed");

pub const ERC1967_PROXY: ResourceKind = ResourceKind::new("ERC1967Proxy");

// per market
pub const MARKET: ResourceKind = ResourceKind::new("Market");
pub const POSITION_BOOK: ResourceKind = ResourceKind::new("PositionBook");
pub const ORDER_BOOK: ResourceKind = ResourceKind::new("OrderBook");
pub const MARKET_VALID: ResourceKind = ResourceKind::new("MarketValid");
pub const ORDER_STORE: ResourceKind = ResourceKind::new("OrderStore");

/// Every kind the recipes resolve; register a factory for each.
pub const ALL: [ResourceKind; 23] = [
    GLOBAL_VALID,
    USDC,
    CORE_VAULT,
    VAULT_ROUTER,
    VAULT_REWARD,
    REWARD_DISTRIBUTOR,
    MARKET_FACTORY,
    MARKET_ROUTER,
    MARKET_READER,
    POSITION_ADD_MGR,
    POSITION_SUB_MGR,
    ORDER_MGR,
    FEE_VAULT,
    FUND_FEE,
    FEE_ROUTER,
    MOCK_ORACLE,
    FAST_PRICE_FEED,
    ERC1967_PROXY,
    MARKET,
    POSITION_BOOK,
    ORDER_BOOK,
    MARKET_VALID,
    ORDER_STORE,
];

/// Price oracle for an environment: a mock on ephemeral targets.
#[must_use]
pub const fn oracle(environment: &Environment) -> ResourceKind {
    if environment.is_ephemeral() {
        MOCK_ORACLE
    } else {
        FAST_PRICE_FEED
    }
}
