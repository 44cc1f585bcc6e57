//! Price resolution
//!
//! Turns an asset's configuration into a price: one call per feed, the
//! moving average appended when the strategy consumes it, then the strategy.

use alloy_primitives::{Address, U256};
use std::sync::Arc;
use tracing::{debug, warn};

use oracle_core::math::{mul_div, pow10};
use oracle_core::{Clock, OracleError, OracleResult, PricePoint, PriceVariant};

use crate::providers::ProviderRegistry;
use crate::registry::{AssetConfig, AssetRegistry};

pub struct PriceResolver {
    registry: Arc<AssetRegistry>,
    providers: Arc<ProviderRegistry>,
    clock: Arc<dyn Clock>,
    decimals: u8,
}

impl PriceResolver {
    pub fn new(
        registry: Arc<AssetRegistry>,
        providers: Arc<ProviderRegistry>,
        clock: Arc<dyn Clock>,
        decimals: u8,
    ) -> Self {
        Self {
            registry,
            providers,
            clock,
            decimals,
        }
    }

    pub fn decimals(&self) -> u8 {
        self.decimals
    }

    pub fn now(&self) -> u64 {
        self.clock.now()
    }

    /// Live price for an already-loaded configuration
    pub fn compute(&self, asset: Address, config: &AssetConfig) -> OracleResult<U256> {
        let mut prices = Vec::with_capacity(config.input_count());

        for (index, feed) in config.feeds.iter().enumerate() {
            let provider = self.providers.feed(&feed.provider)?;
            let price = provider
                .price(&feed.entry_point, asset, self.decimals, &feed.params)
                .map_err(|source| {
                    warn!(%asset, index, provider = %feed.provider, error = %source, "Feed call failed");
                    OracleError::FeedCallFailed {
                        asset,
                        index,
                        provider: feed.provider.clone(),
                        source,
                    }
                })?;
            prices.push(price);
        }

        if config.use_moving_average {
            let average = config
                .moving_average
                .average()
                .ok_or(OracleError::InsufficientObservations(asset))?;
            prices.push(average);
        }

        let price = match (prices.as_slice(), &config.strategy) {
            ([single], _) => *single,
            (_, Some(strategy)) => {
                let provider = self.providers.strategy(&strategy.provider)?;
                provider
                    .aggregate(&strategy.entry_point, &prices, &strategy.params)
                    .map_err(|source| {
                        warn!(%asset, provider = %strategy.provider, error = %source, "Strategy call failed");
                        OracleError::StrategyCallFailed {
                            asset,
                            provider: strategy.provider.clone(),
                            source,
                        }
                    })?
            }
            (_, None) => return Err(OracleError::MissingStrategy(asset)),
        };

        if price.is_zero() {
            return Err(OracleError::ZeroPrice(asset));
        }
        debug!(%asset, %price, inputs = prices.len(), "Computed price");
        Ok(price)
    }

    pub fn resolve(&self, asset: Address, variant: PriceVariant) -> OracleResult<PricePoint> {
        match variant {
            PriceVariant::Current => {
                let price = self
                    .registry
                    .read(asset, |config| self.compute(asset, config))??;
                Ok(PricePoint::new(price, self.clock.now()))
            }
            PriceVariant::Last => self.registry.read(asset, AssetConfig::cached),
            PriceVariant::MovingAverage => self
                .registry
                .read(asset, |config| {
                    config.moving_average.average().map(|average| {
                        PricePoint::new(average, config.moving_average.last_observation_time())
                    })
                })?
                .ok_or(OracleError::InsufficientObservations(asset)),
        }
    }

    /// Cached price when at most `max_age` seconds old, otherwise a live one.
    /// Nothing is persisted.
    pub fn resolve_with_max_age(&self, asset: Address, max_age: u64) -> OracleResult<PricePoint> {
        let now = self.clock.now();
        let cached = self.registry.read(asset, AssetConfig::cached)?;
        if !cached.price.is_zero() && !cached.is_stale(max_age, now) {
            return Ok(cached);
        }
        debug!(%asset, age = cached.age(now), max_age, "Cached price too old, recomputing");
        self.resolve(asset, PriceVariant::Current)
    }

    /// Price of `asset` denominated in `base`
    pub fn resolve_ratio(
        &self,
        asset: Address,
        base: Address,
        variant: PriceVariant,
    ) -> OracleResult<PricePoint> {
        let quote = self.resolve(asset, variant)?;
        let base_point = self.resolve(base, variant)?;
        self.ratio(asset, quote, base, base_point)
    }

    pub fn resolve_ratio_with_max_age(
        &self,
        asset: Address,
        base: Address,
        max_age: u64,
    ) -> OracleResult<PricePoint> {
        let quote = self.resolve_with_max_age(asset, max_age)?;
        let base_point = self.resolve_with_max_age(base, max_age)?;
        self.ratio(asset, quote, base, base_point)
    }

    /// quote * 10^decimals / base, stamped with the older leg's timestamp
    fn ratio(
        &self,
        asset: Address,
        quote: PricePoint,
        base: Address,
        base_point: PricePoint,
    ) -> OracleResult<PricePoint> {
        if quote.price.is_zero() {
            return Err(OracleError::ZeroPrice(asset));
        }
        if base_point.price.is_zero() {
            return Err(OracleError::ZeroPrice(base));
        }
        let unit = pow10(self.decimals).ok_or(OracleError::Overflow)?;
        let price = mul_div(quote.price, unit, base_point.price).ok_or(OracleError::Overflow)?;
        Ok(PricePoint::new(
            price,
            quote.timestamp.min(base_point.timestamp),
        ))
    }
}
