//! Pool-derived feeds: spot price and time-weighted average price

use alloy_primitives::{Address, U256};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::debug;

use oracle_core::{AssetDirectory, Clock, FeedError, FeedProvider, FeedResult, Params, ProviderId};

use crate::market::{MarketData, PoolSnapshot};
use crate::pools::PoolReserves;
use crate::reference::decode;

pub const POOL_PROVIDER: &str = "pool";

pub const SPOT_PRICE: &str = "spot_price";
pub const TWAP: &str = "twap";

/// Minimum snapshots inside the window for a valid TWAP
pub const MIN_TWAP_OBSERVATIONS: usize = 2;

/// Parameters for [`SPOT_PRICE`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpotParams {
    pub pool: Address,
}

/// Parameters for [`TWAP`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TwapParams {
    pub pool: Address,
    /// Window length in seconds
    pub period: u64,
}

/// Pool feed provider
pub struct PoolFeeds {
    market: Arc<MarketData>,
    directory: Arc<AssetDirectory>,
    clock: Arc<dyn Clock>,
}

impl PoolFeeds {
    pub fn new(market: Arc<MarketData>, directory: Arc<AssetDirectory>, clock: Arc<dyn Clock>) -> Self {
        Self {
            market,
            directory,
            clock,
        }
    }

    fn token_decimals(&self, token: Address) -> FeedResult<u8> {
        self.directory
            .decimals(token)
            .ok_or(FeedError::UnknownToken(token))
    }

    fn price_from(&self, reserves: &PoolReserves, asset: Address, decimals: u8) -> FeedResult<U256> {
        let other = reserves
            .counterpart(asset)
            .ok_or(FeedError::AssetNotInPool {
                asset,
                pool: reserves.address,
            })?;
        reserves.spot_price(
            asset,
            self.token_decimals(asset)?,
            self.token_decimals(other)?,
            decimals,
        )
    }

    fn spot(&self, asset: Address, decimals: u8, params: &Params) -> FeedResult<U256> {
        let p: SpotParams = decode(params)?;
        let reserves = self.market.pool(p.pool).ok_or(FeedError::PoolNotFound(p.pool))?;
        self.price_from(&reserves, asset, decimals)
    }

    /// TWAP = sum(price_i * duration_i) / sum(duration_i)
    ///
    /// Each snapshot's price prevails until the next snapshot; the last one
    /// prevails until now.
    fn twap(&self, asset: Address, decimals: u8, params: &Params) -> FeedResult<U256> {
        let p: TwapParams = decode(params)?;
        if p.period == 0 {
            return Err(FeedError::InvalidParams("period must be non-zero".to_string()));
        }
        if self.market.pool(p.pool).is_none() {
            return Err(FeedError::PoolNotFound(p.pool));
        }

        let now = self.clock.now();
        let snapshots = self
            .market
            .pool_history(p.pool, now.saturating_sub(p.period), now);

        if snapshots.len() < MIN_TWAP_OBSERVATIONS {
            return Err(FeedError::InsufficientHistory {
                pool: p.pool,
                required: MIN_TWAP_OBSERVATIONS,
                available: snapshots.len(),
            });
        }

        let mut weighted_sum = U256::ZERO;
        let mut total_duration: u64 = 0;

        for (i, PoolSnapshot { reserves, timestamp }) in snapshots.iter().enumerate() {
            let until = snapshots.get(i + 1).map_or(now, |next| next.timestamp);
            let duration = until - timestamp;
            if duration == 0 {
                continue;
            }
            let price = self.price_from(reserves, asset, decimals)?;
            weighted_sum = price
                .checked_mul(U256::from(duration))
                .and_then(|w| weighted_sum.checked_add(w))
                .ok_or(FeedError::Overflow)?;
            total_duration += duration;
        }

        if total_duration == 0 {
            return Err(FeedError::InsufficientHistory {
                pool: p.pool,
                required: MIN_TWAP_OBSERVATIONS,
                available: snapshots.len(),
            });
        }

        Ok(weighted_sum / U256::from(total_duration))
    }
}

impl FeedProvider for PoolFeeds {
    fn id(&self) -> ProviderId {
        ProviderId::from(POOL_PROVIDER)
    }

    fn entry_points(&self) -> &'static [&'static str] {
        &[SPOT_PRICE, TWAP]
    }

    fn price(
        &self,
        entry_point: &str,
        asset: Address,
        decimals: u8,
        params: &Params,
    ) -> FeedResult<U256> {
        debug!(%asset, entry_point, "Reading pool feed");
        match entry_point {
            SPOT_PRICE => self.spot(asset, decimals, params),
            TWAP => self.twap(asset, decimals, params),
            other => Err(FeedError::UnknownEntryPoint(other.to_string())),
        }
    }
}
