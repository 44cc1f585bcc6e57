mod common;

use alloy_primitives::{Address, U256};
use common::*;
use std::sync::Arc;

use oracle_core::{Asset, Component, OracleError, Params, PricePoint, PriceVariant};
use oracle_engine::{AssetDefinition, MovingAverageSettings};
use oracle_price_feed::pool_feeds::SPOT_PRICE;
use oracle_price_feed::reference::ONE_FEED;
use oracle_price_feed::{
    MarketData, OneFeedParams, PoolFeeds, PoolReserves, ReferenceAnswer, ReferenceFeeds,
    SpotParams, POOL_PROVIDER, REFERENCE_PROVIDER,
};
use oracle_strategy::strategies::AVERAGE;

fn usdc() -> Address {
    Address::repeat_byte(0x0C)
}

fn eth_usd_feed() -> Address {
    Address::repeat_byte(0xE1)
}

fn pool() -> Address {
    Address::repeat_byte(0xAA)
}

/// ETH/USD answer with 8 decimals
fn eth_usd(usd: u64, updated_at: u64) -> ReferenceAnswer {
    ReferenceAnswer {
        answer: U256::from(usd) * U256::from(100_000_000u64),
        decimals: 8,
        round_id: 10,
        answered_in_round: 10,
        updated_at,
    }
}

/// USDC/WETH pool pricing one WETH at `usd` USDC
fn reserves(usd: u64) -> PoolReserves {
    PoolReserves {
        address: pool(),
        token0: usdc(),
        token1: weth(),
        reserve0: U256::from(usd) * U256::from(1_000_000u64) * U256::from(1_000u64),
        reserve1: e18(1_000),
    }
}

fn setup() -> (Harness, Arc<MarketData>) {
    let h = harness();
    h.directory.register(Asset::new(usdc(), "USDC", 6));

    let market = Arc::new(MarketData::new());
    let providers = h.oracle.providers();
    providers.install_feed(Arc::new(ReferenceFeeds::new(
        Arc::clone(&market),
        h.clock.clone(),
    )));
    providers.install_feed(Arc::new(PoolFeeds::new(
        Arc::clone(&market),
        Arc::clone(&h.directory),
        h.clock.clone(),
    )));
    (h, market)
}

fn weth_feeds() -> Vec<Component> {
    let reference = Params::encode(&OneFeedParams {
        feed: eth_usd_feed(),
        update_threshold: 3_600,
    })
    .unwrap();
    let spot = Params::encode(&SpotParams { pool: pool() }).unwrap();
    vec![
        Component::new(REFERENCE_PROVIDER, ONE_FEED, reference),
        Component::new(POOL_PROVIDER, SPOT_PRICE, spot),
    ]
}

#[test]
fn test_reference_and_pool_feeds_averaged() {
    let (h, market) = setup();
    market.update_answer(eth_usd_feed(), eth_usd(2_010, NOW - 30));
    market.update_pool(reserves(1_990), NOW - 12);

    let definition = AssetDefinition::new(weth_feeds())
        .with_strategy(strategy(AVERAGE))
        .with_moving_average(MovingAverageSettings::stored(FREQUENCY * 2, NOW, vec![]));
    h.oracle.add_asset(admin(), weth(), definition).unwrap();

    assert_eq!(h.oracle.price(weth()).unwrap(), e18(2_000));

    h.clock.advance(FREQUENCY);
    market.update_answer(eth_usd_feed(), eth_usd(2_100, NOW + FREQUENCY - 5));
    market.update_pool(reserves(2_100), NOW + FREQUENCY - 1);
    h.oracle.store_price(keeper(), weth()).unwrap();

    assert_eq!(
        h.oracle.resolve(weth(), PriceVariant::MovingAverage).unwrap(),
        PricePoint::new(e18(2_100), NOW + FREQUENCY)
    );
}

#[test]
fn test_stale_reference_answer_rejects_store() {
    let (h, market) = setup();
    market.update_answer(eth_usd_feed(), eth_usd(2_000, NOW));
    market.update_pool(reserves(2_000), NOW);

    h.oracle
        .add_asset(
            admin(),
            weth(),
            AssetDefinition::new(weth_feeds()).with_strategy(strategy(AVERAGE)),
        )
        .unwrap();
    let cached = h.oracle.resolve(weth(), PriceVariant::Last).unwrap();

    h.clock.advance(3_601);
    let err = h.oracle.store_price(keeper(), weth()).unwrap_err();
    assert!(matches!(err, OracleError::FeedCallFailed { index: 0, .. }));
    assert_eq!(h.oracle.resolve(weth(), PriceVariant::Last).unwrap(), cached);
}

#[test]
fn test_weth_in_dai() {
    let (h, market) = setup();
    market.update_answer(eth_usd_feed(), eth_usd(2_000, NOW));
    market.update_pool(reserves(2_000), NOW);
    h.feed.set(1, e18(1));

    h.oracle
        .add_asset(
            admin(),
            weth(),
            AssetDefinition::new(weth_feeds()).with_strategy(strategy(AVERAGE)),
        )
        .unwrap();
    h.oracle
        .add_asset(admin(), dai(), AssetDefinition::new(vec![feed(1)]))
        .unwrap();

    h.feed.set(1, U256::from(999_000_000_000_000_000u64));
    let point = h
        .oracle
        .resolve_ratio(weth(), dai(), PriceVariant::Current)
        .unwrap();
    // 2000 / 0.999
    assert_eq!(point.price, U256::from(2_002_002_002_002_002_002_002u128));
}
