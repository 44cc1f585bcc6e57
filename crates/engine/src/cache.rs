//! Price cache writes
//!
//! Storing computes the live price and, under the asset's write lock,
//! updates the cache and pushes the moving-average observation together.

use alloy_primitives::Address;
use std::sync::Arc;
use tracing::debug;

use oracle_core::{OracleResult, PricePoint};

use crate::registry::AssetRegistry;
use crate::resolver::PriceResolver;

pub struct CacheController {
    registry: Arc<AssetRegistry>,
    resolver: Arc<PriceResolver>,
}

impl CacheController {
    pub fn new(registry: Arc<AssetRegistry>, resolver: Arc<PriceResolver>) -> Self {
        Self { registry, resolver }
    }

    /// Cached price is non-zero and at most `max_age` seconds old
    pub fn is_fresh(&self, asset: Address, max_age: u64) -> OracleResult<bool> {
        let now = self.resolver.now();
        self.registry.read(asset, |config| {
            let cached = config.cached();
            !cached.price.is_zero() && !cached.is_stale(max_age, now)
        })
    }

    /// Compute the current price and persist it
    pub fn store_price(&self, asset: Address) -> OracleResult<PricePoint> {
        let now = self.resolver.now();
        let point = self.registry.mutate(asset, |config| {
            let price = self.resolver.compute(asset, config)?;
            if config.store_moving_average {
                config.moving_average.push(price, now)?;
            }
            config.cached_price = price;
            config.cached_timestamp = now;
            Ok(PricePoint::new(price, now))
        })?;
        debug!(%asset, price = %point.price, timestamp = point.timestamp, "Stored price");
        Ok(point)
    }
}
