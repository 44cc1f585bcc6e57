//! Oracle facade
//!
//! Public entry points. Mutations are checked against the access-control
//! collaborator first and announce themselves on the event channel once
//! they succeed.

use alloy_primitives::{Address, U256};
use rayon::prelude::*;
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::{debug, info, warn};

use oracle_core::{
    AccessControl, AssetDirectory, Clock, Component, OracleConfig, OracleError, OracleEvent,
    OracleResult, Operation, PricePoint, PriceVariant,
};

use crate::cache::CacheController;
use crate::providers::ProviderRegistry;
use crate::registry::{AssetConfig, AssetDefinition, AssetRegistry, MovingAverageSettings};
use crate::resolver::PriceResolver;

/// Capacity of the event channel; slow subscribers lag past this
pub const EVENT_CAPACITY: usize = 1_024;

pub struct Oracle {
    config: OracleConfig,
    providers: Arc<ProviderRegistry>,
    registry: Arc<AssetRegistry>,
    resolver: Arc<PriceResolver>,
    cache: CacheController,
    access: Arc<dyn AccessControl>,
    events: broadcast::Sender<OracleEvent>,
}

impl Oracle {
    pub fn new(
        config: OracleConfig,
        providers: Arc<ProviderRegistry>,
        directory: Arc<AssetDirectory>,
        access: Arc<dyn AccessControl>,
        clock: Arc<dyn Clock>,
    ) -> OracleResult<Self> {
        config.validate()?;

        let registry = Arc::new(AssetRegistry::new(
            Arc::clone(&providers),
            directory,
            Arc::clone(&clock),
            config.observation_frequency,
        ));
        let resolver = Arc::new(PriceResolver::new(
            Arc::clone(&registry),
            Arc::clone(&providers),
            clock,
            config.decimals,
        ));
        let cache = CacheController::new(Arc::clone(&registry), Arc::clone(&resolver));
        let (events, _) = broadcast::channel(EVENT_CAPACITY);

        info!(
            decimals = config.decimals,
            observation_frequency = config.observation_frequency,
            "Oracle initialized"
        );

        Ok(Self {
            config,
            providers,
            registry,
            resolver,
            cache,
            access,
            events,
        })
    }

    /// Installed feed and strategy providers
    pub fn providers(&self) -> &Arc<ProviderRegistry> {
        &self.providers
    }

    pub fn subscribe(&self) -> broadcast::Receiver<OracleEvent> {
        self.events.subscribe()
    }

    pub fn add_asset(
        &self,
        caller: Address,
        asset: Address,
        definition: AssetDefinition,
    ) -> OracleResult<()> {
        self.authorize(caller, Operation::AddAsset)?;
        let feeds = definition.feeds.len();
        self.registry
            .add(asset, definition, |config| self.resolver.compute(asset, config))
            .map_err(|e| {
                warn!(%asset, error = %e, "Failed to add asset");
                e
            })?;
        info!(%asset, feeds, "Asset added");
        self.emit(OracleEvent::AssetAdded { asset });
        Ok(())
    }

    pub fn remove_asset(&self, caller: Address, asset: Address) -> OracleResult<()> {
        self.authorize(caller, Operation::RemoveAsset)?;
        self.registry.remove(asset).map_err(|e| {
            warn!(%asset, error = %e, "Failed to remove asset");
            e
        })?;
        info!(%asset, "Asset removed");
        self.emit(OracleEvent::AssetRemoved { asset });
        Ok(())
    }

    pub fn update_feeds(
        &self,
        caller: Address,
        asset: Address,
        feeds: Vec<Component>,
    ) -> OracleResult<()> {
        self.authorize(caller, Operation::UpdateFeeds)?;
        let count = feeds.len();
        self.registry.update_feeds(asset, feeds).map_err(|e| {
            warn!(%asset, error = %e, "Failed to update feeds");
            e
        })?;
        info!(%asset, feeds = count, "Feeds updated");
        self.emit(OracleEvent::FeedsUpdated { asset });
        Ok(())
    }

    pub fn update_strategy(
        &self,
        caller: Address,
        asset: Address,
        strategy: Option<Component>,
        use_moving_average: bool,
    ) -> OracleResult<()> {
        self.authorize(caller, Operation::UpdateStrategy)?;
        let provider = strategy.as_ref().map(|s| s.provider.to_string());
        self.registry
            .update_strategy(asset, strategy, use_moving_average)
            .map_err(|e| {
                warn!(%asset, error = %e, "Failed to update strategy");
                e
            })?;
        info!(%asset, ?provider, use_moving_average, "Strategy updated");
        self.emit(OracleEvent::StrategyUpdated { asset });
        Ok(())
    }

    pub fn update_moving_average(
        &self,
        caller: Address,
        asset: Address,
        settings: MovingAverageSettings,
    ) -> OracleResult<()> {
        self.authorize(caller, Operation::UpdateMovingAverage)?;
        let (store, duration) = (settings.store, settings.duration);
        self.registry
            .update_moving_average(asset, settings, |config| {
                self.resolver.compute(asset, config)
            })
            .map_err(|e| {
                warn!(%asset, error = %e, "Failed to update moving average");
                e
            })?;
        info!(%asset, store, duration, "Moving average updated");
        self.emit(OracleEvent::MovingAverageUpdated { asset });
        Ok(())
    }

    /// Compute, cache and (if configured) record the current price
    pub fn store_price(&self, caller: Address, asset: Address) -> OracleResult<PricePoint> {
        self.authorize(caller, Operation::StorePrice)?;
        self.store_authorized(asset)
    }

    /// Store prices for every tracked asset in parallel.
    ///
    /// Each asset succeeds or fails on its own; results keep tracked order.
    pub fn store_all(
        &self,
        caller: Address,
    ) -> OracleResult<Vec<(Address, OracleResult<PricePoint>)>> {
        self.authorize(caller, Operation::StorePrice)?;
        let assets = self.registry.tracked();

        let results: Vec<(Address, OracleResult<PricePoint>)> = assets
            .par_iter()
            .map(|asset| (*asset, self.store_authorized(*asset)))
            .collect();

        let failed = results.iter().filter(|(_, r)| r.is_err()).count();
        info!(assets = results.len(), failed, "Stored prices");
        Ok(results)
    }

    /// Tracked assets
    pub fn assets(&self) -> Vec<Address> {
        self.registry.tracked()
    }

    pub fn asset_data(&self, asset: Address) -> OracleResult<AssetConfig> {
        self.registry.snapshot(asset)
    }

    pub fn is_configured(&self, asset: Address) -> bool {
        self.registry.contains(asset)
    }

    pub fn decimals(&self) -> u8 {
        self.config.decimals
    }

    pub fn observation_frequency(&self) -> u64 {
        self.config.observation_frequency
    }

    /// Current price
    pub fn price(&self, asset: Address) -> OracleResult<U256> {
        Ok(self.resolve(asset, PriceVariant::Current)?.price)
    }

    pub fn price_with_max_age(&self, asset: Address, max_age: u64) -> OracleResult<U256> {
        Ok(self.resolve_with_max_age(asset, max_age)?.price)
    }

    pub fn resolve(&self, asset: Address, variant: PriceVariant) -> OracleResult<PricePoint> {
        self.resolver.resolve(asset, variant)
    }

    pub fn resolve_with_max_age(&self, asset: Address, max_age: u64) -> OracleResult<PricePoint> {
        self.resolver.resolve_with_max_age(asset, max_age)
    }

    pub fn resolve_ratio(
        &self,
        asset: Address,
        base: Address,
        variant: PriceVariant,
    ) -> OracleResult<PricePoint> {
        self.resolver.resolve_ratio(asset, base, variant)
    }

    pub fn resolve_ratio_with_max_age(
        &self,
        asset: Address,
        base: Address,
        max_age: u64,
    ) -> OracleResult<PricePoint> {
        self.resolver.resolve_ratio_with_max_age(asset, base, max_age)
    }

    /// Cached price is non-zero and within `max_age`
    pub fn is_fresh(&self, asset: Address, max_age: u64) -> OracleResult<bool> {
        self.cache.is_fresh(asset, max_age)
    }

    fn store_authorized(&self, asset: Address) -> OracleResult<PricePoint> {
        let point = self.cache.store_price(asset).map_err(|e| {
            warn!(%asset, error = %e, "Failed to store price");
            e
        })?;
        self.emit(OracleEvent::PriceStored {
            asset,
            price: point.price,
            timestamp: point.timestamp,
        });
        Ok(point)
    }

    fn authorize(&self, caller: Address, operation: Operation) -> OracleResult<()> {
        if !self.access.is_authorized(caller, operation) {
            warn!(%caller, %operation, "Unauthorized call");
            return Err(OracleError::Unauthorized { caller, operation });
        }
        Ok(())
    }

    fn emit(&self, event: OracleEvent) {
        if self.events.send(event).is_err() {
            debug!("No event subscribers");
        }
    }
}
