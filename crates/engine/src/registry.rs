//! Asset registry
//!
//! Owns every tracked asset's configuration. Each asset sits behind its own
//! lock; mutations are applied to a copy and swapped in only on success, so
//! a failed update never leaves a partially written configuration behind.

use alloy_primitives::{Address, U256};
use dashmap::DashMap;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use oracle_core::{
    AssetDirectory, Clock, Component, OracleError, OracleResult, PricePoint,
};

use crate::observations::ObservationBuffer;
use crate::providers::ProviderRegistry;

/// Full configuration and state of one tracked asset
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssetConfig {
    pub feeds: Vec<Component>,
    pub strategy: Option<Component>,
    /// Append the moving average to the strategy inputs
    pub use_moving_average: bool,
    /// Push every stored price into the observation buffer
    pub store_moving_average: bool,
    pub moving_average: ObservationBuffer,
    pub cached_price: U256,
    pub cached_timestamp: u64,
}

impl AssetConfig {
    /// Number of prices fed to the strategy
    pub fn input_count(&self) -> usize {
        self.feeds.len() + usize::from(self.use_moving_average)
    }

    pub fn moving_average_duration(&self) -> u64 {
        self.moving_average.duration()
    }

    pub fn cached(&self) -> PricePoint {
        PricePoint::new(self.cached_price, self.cached_timestamp)
    }

    fn set_cache(&mut self, point: PricePoint) {
        self.cached_price = point.price;
        self.cached_timestamp = point.timestamp;
    }
}

/// Moving-average part of an asset definition or update
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MovingAverageSettings {
    pub store: bool,
    pub duration: u64,
    pub last_observation_time: u64,
    pub observations: Vec<U256>,
}

impl MovingAverageSettings {
    /// No moving average; the cache is seeded from a live price
    pub fn disabled() -> Self {
        Self::default()
    }

    /// No moving average; seed the cache with a known price
    pub fn cached(price: U256, timestamp: u64) -> Self {
        Self {
            store: false,
            duration: 0,
            last_observation_time: timestamp,
            observations: vec![price],
        }
    }

    pub fn stored(duration: u64, last_observation_time: u64, observations: Vec<U256>) -> Self {
        Self {
            store: true,
            duration,
            last_observation_time,
            observations,
        }
    }
}

/// Everything needed to start tracking an asset
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssetDefinition {
    pub feeds: Vec<Component>,
    #[serde(default)]
    pub strategy: Option<Component>,
    #[serde(default)]
    pub use_moving_average: bool,
    #[serde(default)]
    pub moving_average: MovingAverageSettings,
}

impl AssetDefinition {
    pub fn new(feeds: Vec<Component>) -> Self {
        Self {
            feeds,
            strategy: None,
            use_moving_average: false,
            moving_average: MovingAverageSettings::disabled(),
        }
    }

    pub fn with_strategy(mut self, strategy: Component) -> Self {
        self.strategy = Some(strategy);
        self
    }

    pub fn with_moving_average(mut self, settings: MovingAverageSettings) -> Self {
        self.moving_average = settings;
        self
    }

    pub fn using_moving_average(mut self) -> Self {
        self.use_moving_average = true;
        self
    }
}

/// Mapping asset -> configuration, plus insertion-ordered asset list
pub struct AssetRegistry {
    assets: DashMap<Address, Arc<RwLock<AssetConfig>>>,
    tracked: RwLock<Vec<Address>>,
    providers: Arc<ProviderRegistry>,
    directory: Arc<AssetDirectory>,
    clock: Arc<dyn Clock>,
    observation_frequency: u64,
}

impl AssetRegistry {
    pub fn new(
        providers: Arc<ProviderRegistry>,
        directory: Arc<AssetDirectory>,
        clock: Arc<dyn Clock>,
        observation_frequency: u64,
    ) -> Self {
        Self {
            assets: DashMap::new(),
            tracked: RwLock::new(Vec::new()),
            providers,
            directory,
            clock,
            observation_frequency,
        }
    }

    /// Start tracking `asset`.
    ///
    /// When no cached price results from the definition, `seed` computes a
    /// live price for the new configuration so the cache never starts at zero.
    pub fn add<F>(&self, asset: Address, definition: AssetDefinition, seed: F) -> OracleResult<()>
    where
        F: FnOnce(&AssetConfig) -> OracleResult<U256>,
    {
        if asset == Address::ZERO {
            return Err(OracleError::InvalidAsset);
        }
        if self.assets.contains_key(&asset) {
            return Err(OracleError::AlreadyConfigured(asset));
        }
        if !self.directory.contains(asset) {
            return Err(OracleError::InvalidResource(asset));
        }

        self.check_feeds(asset, &definition.feeds)?;
        if let Some(strategy) = &definition.strategy {
            self.providers.check_strategy(strategy)?;
        }
        let settings = definition.moving_average;
        self.check_timestamp(settings.last_observation_time)?;
        if definition.use_moving_average && !settings.store {
            return Err(OracleError::MovingAverageNotStored(asset));
        }

        let store = settings.store;
        let (buffer, cache) = self.build_moving_average(settings)?;
        if definition.use_moving_average && buffer.is_empty() {
            return Err(empty_moving_average());
        }
        let mut config = AssetConfig {
            feeds: definition.feeds,
            strategy: definition.strategy,
            use_moving_average: definition.use_moving_average,
            store_moving_average: store,
            moving_average: buffer,
            cached_price: U256::ZERO,
            cached_timestamp: 0,
        };
        check_strategy_presence(asset, &config)?;

        match cache {
            Some(point) => config.set_cache(point),
            None => {
                let price = seed(&config)?;
                if price.is_zero() {
                    return Err(OracleError::ZeroPrice(asset));
                }
                config.set_cache(PricePoint::new(price, self.clock.now()));
            }
        }

        let mut tracked = self.tracked.write();
        if self.assets.contains_key(&asset) {
            return Err(OracleError::AlreadyConfigured(asset));
        }
        self.assets.insert(asset, Arc::new(RwLock::new(config)));
        tracked.push(asset);
        Ok(())
    }

    /// Stop tracking `asset`, dropping all of its state
    pub fn remove(&self, asset: Address) -> OracleResult<AssetConfig> {
        if asset == Address::ZERO {
            return Err(OracleError::InvalidAsset);
        }
        let mut tracked = self.tracked.write();
        let (_, entry) = self
            .assets
            .remove(&asset)
            .ok_or(OracleError::NotConfigured(asset))?;
        if let Some(pos) = tracked.iter().position(|a| *a == asset) {
            tracked.swap_remove(pos);
        }
        let config = entry.read().clone();
        Ok(config)
    }

    /// Replace the feed list
    pub fn update_feeds(&self, asset: Address, feeds: Vec<Component>) -> OracleResult<()> {
        self.check_feeds(asset, &feeds)?;
        self.mutate(asset, |config| {
            config.feeds = feeds;
            check_strategy_presence(asset, config)
        })
    }

    /// Replace the strategy and whether it consumes the moving average
    pub fn update_strategy(
        &self,
        asset: Address,
        strategy: Option<Component>,
        use_moving_average: bool,
    ) -> OracleResult<()> {
        if let Some(strategy) = &strategy {
            self.providers.check_strategy(strategy)?;
        }
        self.mutate(asset, |config| {
            if use_moving_average && !config.store_moving_average {
                return Err(OracleError::MovingAverageNotStored(asset));
            }
            if use_moving_average && config.moving_average.is_empty() {
                return Err(empty_moving_average());
            }
            config.strategy = strategy;
            config.use_moving_average = use_moving_average;
            check_strategy_presence(asset, config)
        })
    }

    /// Replace the moving-average configuration.
    ///
    /// Without a stored moving average, a single supplied observation becomes
    /// the cache; with none, `seed` computes a live price instead.
    pub fn update_moving_average<F>(
        &self,
        asset: Address,
        settings: MovingAverageSettings,
        seed: F,
    ) -> OracleResult<()>
    where
        F: FnOnce(&AssetConfig) -> OracleResult<U256>,
    {
        self.check_timestamp(settings.last_observation_time)?;
        let now = self.clock.now();

        self.mutate(asset, |config| {
            let store = settings.store;
            if !store && config.use_moving_average {
                return Err(OracleError::InvalidMAConfig(
                    "moving average is consumed by the strategy".to_string(),
                ));
            }

            let (buffer, cache) = self.build_moving_average(settings)?;
            if config.use_moving_average && buffer.is_empty() {
                return Err(empty_moving_average());
            }
            config.store_moving_average = store;
            config.moving_average = buffer;

            match cache {
                Some(point) => config.set_cache(point),
                None if !store => {
                    let price = seed(config)?;
                    if price.is_zero() {
                        return Err(OracleError::ZeroPrice(asset));
                    }
                    config.set_cache(PricePoint::new(price, now));
                }
                None => {}
            }
            Ok(())
        })
    }

    /// Run `f` against a copy of the asset's configuration under its write
    /// lock; the copy replaces the original only if `f` succeeds.
    pub fn mutate<R, F>(&self, asset: Address, f: F) -> OracleResult<R>
    where
        F: FnOnce(&mut AssetConfig) -> OracleResult<R>,
    {
        let entry = self.entry(asset)?;
        self.mutate_entry(asset, &entry, f)
    }

    fn mutate_entry<R, F>(
        &self,
        asset: Address,
        entry: &Arc<RwLock<AssetConfig>>,
        f: F,
    ) -> OracleResult<R>
    where
        F: FnOnce(&mut AssetConfig) -> OracleResult<R>,
    {
        let mut guard = entry.write();
        // a concurrent remove may have detached this entry
        let attached = self
            .assets
            .get(&asset)
            .is_some_and(|current| Arc::ptr_eq(current.value(), entry));
        if !attached {
            return Err(OracleError::NotConfigured(asset));
        }
        let mut draft = guard.clone();
        let result = f(&mut draft)?;
        *guard = draft;
        Ok(result)
    }

    /// Run `f` against the asset's configuration under its read lock
    pub fn read<R, F>(&self, asset: Address, f: F) -> OracleResult<R>
    where
        F: FnOnce(&AssetConfig) -> R,
    {
        let entry = self.entry(asset)?;
        let guard = entry.read();
        Ok(f(&guard))
    }

    pub fn snapshot(&self, asset: Address) -> OracleResult<AssetConfig> {
        self.read(asset, AssetConfig::clone)
    }

    pub fn contains(&self, asset: Address) -> bool {
        self.assets.contains_key(&asset)
    }

    /// Tracked assets in insertion order (removals may reorder)
    pub fn tracked(&self) -> Vec<Address> {
        self.tracked.read().clone()
    }

    pub fn len(&self) -> usize {
        self.assets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.assets.is_empty()
    }

    pub fn observation_frequency(&self) -> u64 {
        self.observation_frequency
    }

    fn entry(&self, asset: Address) -> OracleResult<Arc<RwLock<AssetConfig>>> {
        if asset == Address::ZERO {
            return Err(OracleError::InvalidAsset);
        }
        self.assets
            .get(&asset)
            .map(|r| Arc::clone(r.value()))
            .ok_or(OracleError::NotConfigured(asset))
    }

    fn check_feeds(&self, asset: Address, feeds: &[Component]) -> OracleResult<()> {
        if feeds.is_empty() {
            return Err(OracleError::NoFeeds(asset));
        }
        feeds.iter().try_for_each(|feed| self.providers.check_feed(feed))
    }

    fn check_timestamp(&self, timestamp: u64) -> OracleResult<()> {
        let now = self.clock.now();
        if timestamp > now {
            return Err(OracleError::FutureTimestamp { timestamp, now });
        }
        Ok(())
    }

    /// Observation buffer plus the cache value implied by the settings
    fn build_moving_average(
        &self,
        settings: MovingAverageSettings,
    ) -> OracleResult<(ObservationBuffer, Option<PricePoint>)> {
        let MovingAverageSettings {
            store,
            duration,
            last_observation_time,
            observations,
        } = settings;

        if store {
            let buffer = ObservationBuffer::configure(
                duration,
                self.observation_frequency,
                observations,
                last_observation_time,
            )?;
            let cache = buffer
                .latest()
                .map(|price| PricePoint::new(price, last_observation_time));
            return Ok((buffer, cache));
        }

        if observations.len() > 1 {
            return Err(OracleError::TooManyObservations(observations.len()));
        }
        if duration != 0 {
            return Err(OracleError::UnexpectedDuration(duration));
        }
        let cache = match observations.first() {
            Some(price) if price.is_zero() => return Err(OracleError::ZeroObservation),
            Some(price) => Some(PricePoint::new(*price, last_observation_time)),
            None => None,
        };
        Ok((ObservationBuffer::default(), cache))
    }
}

fn empty_moving_average() -> OracleError {
    OracleError::InvalidMAConfig("moving average is consumed but holds no observations".to_string())
}

/// More than one price input requires a strategy
fn check_strategy_presence(asset: Address, config: &AssetConfig) -> OracleResult<()> {
    if config.input_count() > 1 && config.strategy.is_none() {
        return Err(OracleError::MissingStrategy(asset));
    }
    Ok(())
}
