use rigger_core::ids::{Address, IdError, ShardKey};

///
/// MarketParams
///
/// Trading limits handed to `MarketFactory.create`.
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct MarketParams {
    pub min_slippage: u128,
    pub max_slippage: u128,
    pub min_leverage: u128,
    pub max_leverage: u128,
    pub max_trade_amount: u128,
    pub min_pay: u128,
    pub min_collateral: u128,
    pub allow_open: bool,
    pub allow_close: bool,
    pub token_digits: u128,

    /// `FeeRouter.setFeeAndRates` input for the market.
    pub fee_rates: [u128; 5],
    /// `GlobalValid.setMaxMarketSizeLimit`, in 18-decimal units.
    pub max_market_size: u128,
}

impl Default for MarketParams {
    fn default() -> Self {
        Self {
            min_slippage: 1,
            max_slippage: 500,
            min_leverage: 2,
            max_leverage: 200,
            max_trade_amount: 100_000,
            min_pay: 10,
            min_collateral: 5,
            allow_open: true,
            allow_close: true,
            token_digits: 18,
            fee_rates: [100_000, 100_000, 0, 10u128.pow(18), 5 * 10u128.pow(18)],
            max_market_size: 100_000_000 * 10u128.pow(18),
        }
    }
}

///
/// MarketSpec
///
/// One instrument: its symbol, the index token it tracks and its limits.
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct MarketSpec {
    pub symbol: String,
    pub index_token: Address,
    pub params: MarketParams,
}

impl MarketSpec {
    #[must_use]
    pub fn new(symbol: impl Into<String>, index_token: Address) -> Self {
        Self {
            symbol: symbol.into(),
            index_token,
            params: MarketParams::default(),
        }
    }

    #[must_use]
    pub fn params(mut self, params: MarketParams) -> Self {
        self.params = params;
        self
    }

    /// Shard every per-market resource is recorded in.
    pub fn shard(&self) -> Result<ShardKey, IdError> {
        ShardKey::from_symbol(&self.symbol)
    }

    /// Display name passed on chain, quoted against USD unless given.
    pub fn name(&self) -> Result<String, IdError> {
        let shard = self.shard()?;

        Ok(match self.symbol.split_once('/') {
            Some((_, quote)) => format!("{shard}/{}", quote.trim().to_ascii_uppercase()),
            None => format!("{shard}/USD"),
        })
    }
}

///
/// TESTS
///
