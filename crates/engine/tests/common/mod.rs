#![allow(dead_code)]

use alloy_primitives::{Address, U256};
use dashmap::DashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use oracle_core::{
    Asset, AssetDirectory, Component, FeedError, FeedProvider, FeedResult, ManualClock,
    OracleConfig, Params, Permissions, ProviderId,
};
use oracle_engine::{Oracle, ProviderRegistry};
use oracle_strategy::SimpleStrategy;

pub const NOW: u64 = 1_700_000_000;
pub const FREQUENCY: u64 = 3_600;
pub const MOCK_PROVIDER: &str = "mock";
pub const PRICE: &str = "price";

pub fn admin() -> Address {
    Address::repeat_byte(0xAD)
}

pub fn keeper() -> Address {
    Address::repeat_byte(0x4E)
}

pub fn ohm() -> Address {
    Address::repeat_byte(0x01)
}

pub fn dai() -> Address {
    Address::repeat_byte(0x02)
}

pub fn weth() -> Address {
    Address::repeat_byte(0x03)
}

pub fn e18(amount: u64) -> U256 {
    U256::from(amount) * U256::from(10u64).pow(U256::from(18u64))
}

/// Feed provider whose answers are set by the test, keyed by a `slot` param
#[derive(Default)]
pub struct MockFeed {
    prices: DashMap<u64, U256>,
    failing: DashMap<u64, ()>,
    calls: AtomicUsize,
}

impl MockFeed {
    pub fn set(&self, slot: u64, price: U256) {
        self.prices.insert(slot, price);
    }

    pub fn fail(&self, slot: u64) {
        self.failing.insert(slot, ());
    }

    pub fn recover(&self, slot: u64) {
        self.failing.remove(&slot);
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::Relaxed)
    }
}

impl FeedProvider for MockFeed {
    fn id(&self) -> ProviderId {
        ProviderId::from(MOCK_PROVIDER)
    }

    fn entry_points(&self) -> &'static [&'static str] {
        &[PRICE]
    }

    fn price(&self, _: &str, asset: Address, _: u8, params: &Params) -> FeedResult<U256> {
        self.calls.fetch_add(1, Ordering::Relaxed);
        let slot: u64 = params
            .decode()
            .map_err(|e| FeedError::InvalidParams(e.to_string()))?;
        if self.failing.contains_key(&slot) {
            return Err(FeedError::SourceNotFound(asset));
        }
        self.prices
            .get(&slot)
            .map(|p| *p)
            .ok_or(FeedError::SourceNotFound(asset))
    }
}

/// Feed component reading `slot` of the mock provider
pub fn feed(slot: u64) -> Component {
    Component::new(
        MOCK_PROVIDER,
        PRICE,
        Params::encode(&slot).expect("slot encodes"),
    )
}

pub fn strategy(entry_point: &str) -> Component {
    Component::new(oracle_strategy::SIMPLE_PROVIDER, entry_point, Params::none())
}

pub struct Harness {
    pub oracle: Oracle,
    pub feed: Arc<MockFeed>,
    pub clock: Arc<ManualClock>,
    pub permissions: Arc<Permissions>,
    pub directory: Arc<AssetDirectory>,
}

pub fn harness() -> Harness {
    let feed = Arc::new(MockFeed::default());
    let providers = Arc::new(ProviderRegistry::new());
    providers.install_feed(feed.clone());
    providers.install_strategy(Arc::new(SimpleStrategy::new()));

    let directory = Arc::new(AssetDirectory::with_assets([
        Asset::new(ohm(), "OHM", 9),
        Asset::new(dai(), "DAI", 18),
        Asset::new(weth(), "WETH", 18),
    ]));

    let permissions = Arc::new(Permissions::new());
    permissions.grant_all(admin());
    permissions.grant(keeper(), oracle_core::Operation::StorePrice);

    let clock = Arc::new(ManualClock::new(NOW));
    let config = OracleConfig {
        decimals: 18,
        observation_frequency: FREQUENCY,
    };

    let oracle = Oracle::new(
        config,
        providers,
        Arc::clone(&directory),
        permissions.clone(),
        clock.clone(),
    )
    .expect("valid config");

    Harness {
        oracle,
        feed,
        clock,
        permissions,
        directory,
    }
}
