mod common;

use alloy_primitives::U256;
use common::*;
use oracle_core::{OracleError, PricePoint, PriceVariant};
use oracle_engine::{AssetDefinition, MovingAverageSettings};
use oracle_strategy::strategies::{AVERAGE, FIRST_NON_ZERO};

fn values(v: &[u64]) -> Vec<U256> {
    v.iter().map(|x| e18(*x)).collect()
}

#[test]
fn test_configured_observations_round_trip() {
    let h = harness();
    let observations = values(&[10, 12, 14]);
    let definition = AssetDefinition::new(vec![feed(1)]).with_moving_average(
        MovingAverageSettings::stored(FREQUENCY * 3, NOW - 60, observations.clone()),
    );
    h.oracle.add_asset(admin(), ohm(), definition).unwrap();

    let data = h.oracle.asset_data(ohm()).unwrap();
    assert!(data.store_moving_average);
    assert_eq!(data.moving_average_duration(), FREQUENCY * 3);
    assert_eq!(data.moving_average.observations(), observations.as_slice());
    assert_eq!(data.cached(), PricePoint::new(e18(14), NOW - 60));
    assert_eq!(
        h.oracle.resolve(ohm(), PriceVariant::MovingAverage).unwrap(),
        PricePoint::new(e18(12), NOW - 60)
    );
}

#[test]
fn test_store_price_pushes_into_full_buffer() {
    let h = harness();
    h.feed.set(1, e18(20));
    let definition = AssetDefinition::new(vec![feed(1)]).with_moving_average(
        MovingAverageSettings::stored(FREQUENCY * 3, NOW, values(&[10, 12, 14])),
    );
    h.oracle.add_asset(admin(), ohm(), definition).unwrap();

    h.clock.advance(FREQUENCY);
    let stored = h.oracle.store_price(keeper(), ohm()).unwrap();
    assert_eq!(stored, PricePoint::new(e18(20), NOW + FREQUENCY));

    let data = h.oracle.asset_data(ohm()).unwrap();
    assert_eq!(data.moving_average.observations(), values(&[20, 12, 14]).as_slice());
    assert_eq!(data.moving_average.cumulative(), e18(46));
    assert_eq!(data.moving_average.last_observation_time(), NOW + FREQUENCY);
    assert_eq!(data.cached(), stored);
}

#[test]
fn test_moving_average_appended_to_strategy_inputs() {
    let h = harness();
    h.feed.set(1, U256::ZERO);
    h.feed.set(2, e18(30));
    let definition = AssetDefinition::new(vec![feed(1)])
        .with_strategy(strategy(FIRST_NON_ZERO))
        .with_moving_average(MovingAverageSettings::stored(
            FREQUENCY * 2,
            NOW,
            values(&[8, 12]),
        ))
        .using_moving_average();
    h.oracle.add_asset(admin(), ohm(), definition).unwrap();

    // Feed reads zero, so the first non-zero input is the moving average
    assert_eq!(h.oracle.price(ohm()).unwrap(), e18(10));

    h.oracle
        .update_strategy(admin(), ohm(), Some(strategy(AVERAGE)), true)
        .unwrap();
    h.oracle.update_feeds(admin(), ohm(), vec![feed(2)]).unwrap();
    // (30 + 10) / 2
    assert_eq!(h.oracle.price(ohm()).unwrap(), e18(20));
}

#[test]
fn test_update_moving_average_round_trip() {
    let h = harness();
    h.feed.set(1, e18(5));
    h.oracle
        .add_asset(admin(), ohm(), AssetDefinition::new(vec![feed(1)]))
        .unwrap();

    let observations = values(&[3, 5, 7, 9]);
    h.oracle
        .update_moving_average(
            admin(),
            ohm(),
            MovingAverageSettings::stored(FREQUENCY * 4, NOW - 30, observations.clone()),
        )
        .unwrap();

    let data = h.oracle.asset_data(ohm()).unwrap();
    assert!(data.store_moving_average);
    assert_eq!(data.moving_average_duration(), FREQUENCY * 4);
    assert_eq!(data.moving_average.observations(), observations.as_slice());
    assert_eq!(data.moving_average.cumulative(), e18(24));
    assert_eq!(data.cached(), PricePoint::new(e18(9), NOW - 30));
    assert_eq!(
        h.oracle.resolve(ohm(), PriceVariant::MovingAverage).unwrap(),
        PricePoint::new(e18(6), NOW - 30)
    );
}

#[test]
fn test_using_moving_average_without_observations_is_rejected() {
    let h = harness();
    h.feed.set(1, e18(5));
    let definition = AssetDefinition::new(vec![feed(1)])
        .with_strategy(strategy(AVERAGE))
        .with_moving_average(MovingAverageSettings::stored(FREQUENCY * 3, NOW, vec![]))
        .using_moving_average();

    assert!(matches!(
        h.oracle.add_asset(admin(), ohm(), definition),
        Err(OracleError::InvalidMAConfig(_))
    ));
    assert!(!h.oracle.is_configured(ohm()));
    assert!(h.oracle.assets().is_empty());
}

#[test]
fn test_consuming_empty_moving_average_is_rejected_on_update() {
    let h = harness();
    h.feed.set(1, e18(5));
    let definition = AssetDefinition::new(vec![feed(1)])
        .with_strategy(strategy(AVERAGE))
        .with_moving_average(MovingAverageSettings::stored(FREQUENCY * 2, NOW, vec![]));
    h.oracle.add_asset(admin(), ohm(), definition).unwrap();
    let before = h.oracle.asset_data(ohm()).unwrap();

    assert!(matches!(
        h.oracle
            .update_strategy(admin(), ohm(), Some(strategy(AVERAGE)), true),
        Err(OracleError::InvalidMAConfig(_))
    ));
    assert_eq!(h.oracle.asset_data(ohm()).unwrap(), before);

    // the buffer fills from stored prices, after which it may be consumed
    h.oracle.store_price(keeper(), ohm()).unwrap();
    h.oracle
        .update_strategy(admin(), ohm(), Some(strategy(AVERAGE)), true)
        .unwrap();
    assert_eq!(h.oracle.price(ohm()).unwrap(), e18(5));
}

#[test]
fn test_emptying_consumed_moving_average_is_rejected() {
    let h = harness();
    h.feed.set(1, e18(30));
    let definition = AssetDefinition::new(vec![feed(1)])
        .with_strategy(strategy(AVERAGE))
        .with_moving_average(MovingAverageSettings::stored(
            FREQUENCY * 2,
            NOW,
            values(&[8, 12]),
        ))
        .using_moving_average();
    h.oracle.add_asset(admin(), ohm(), definition).unwrap();
    let before = h.oracle.asset_data(ohm()).unwrap();

    assert!(matches!(
        h.oracle.update_moving_average(
            admin(),
            ohm(),
            MovingAverageSettings::stored(FREQUENCY * 3, NOW, vec![]),
        ),
        Err(OracleError::InvalidMAConfig(_))
    ));
    assert_eq!(h.oracle.asset_data(ohm()).unwrap(), before);
    assert_eq!(h.oracle.price(ohm()).unwrap(), e18(20));
}

#[test]
fn test_disabling_consumed_moving_average_fails() {
    let h = harness();
    h.feed.set(1, e18(5));
    let definition = AssetDefinition::new(vec![feed(1)])
        .with_strategy(strategy(AVERAGE))
        .with_moving_average(MovingAverageSettings::stored(FREQUENCY, NOW, values(&[5])))
        .using_moving_average();
    h.oracle.add_asset(admin(), ohm(), definition).unwrap();
    let before = h.oracle.asset_data(ohm()).unwrap();

    assert!(matches!(
        h.oracle
            .update_moving_average(admin(), ohm(), MovingAverageSettings::disabled()),
        Err(OracleError::InvalidMAConfig(_))
    ));
    assert_eq!(h.oracle.asset_data(ohm()).unwrap(), before);
}

#[test]
fn test_update_moving_average_validation_is_all_or_nothing() {
    let h = harness();
    h.feed.set(1, e18(5));
    h.oracle
        .add_asset(admin(), ohm(), AssetDefinition::new(vec![feed(1)]))
        .unwrap();
    let before = h.oracle.asset_data(ohm()).unwrap();

    let cases = [
        MovingAverageSettings::stored(FREQUENCY * 3, NOW + 1, values(&[1, 2, 3])),
        MovingAverageSettings::stored(FREQUENCY * 3, NOW, values(&[1, 2])),
        MovingAverageSettings::stored(FREQUENCY * 3, NOW, vec![e18(1), U256::ZERO, e18(1)]),
        MovingAverageSettings::stored(FREQUENCY + 1, NOW, vec![]),
        MovingAverageSettings {
            observations: values(&[1, 2]),
            ..Default::default()
        },
    ];
    for settings in cases {
        assert!(h.oracle.update_moving_average(admin(), ohm(), settings).is_err());
        assert_eq!(h.oracle.asset_data(ohm()).unwrap(), before);
    }
}

#[test]
fn test_disable_with_single_observation_sets_cache() {
    let h = harness();
    h.feed.set(1, e18(5));
    let definition = AssetDefinition::new(vec![feed(1)])
        .with_moving_average(MovingAverageSettings::stored(FREQUENCY, NOW, values(&[4])));
    h.oracle.add_asset(admin(), ohm(), definition).unwrap();

    h.oracle
        .update_moving_average(admin(), ohm(), MovingAverageSettings::cached(e18(9), NOW - 5))
        .unwrap();

    let data = h.oracle.asset_data(ohm()).unwrap();
    assert!(!data.store_moving_average);
    assert_eq!(data.moving_average_duration(), 0);
    assert!(data.moving_average.is_empty());
    assert_eq!(data.cached(), PricePoint::new(e18(9), NOW - 5));
}

#[test]
fn test_store_all_reports_each_asset() {
    let h = harness();
    h.feed.set(1, e18(1));
    h.feed.set(2, e18(2));
    h.feed.set(3, e18(3));
    h.oracle
        .add_asset(admin(), ohm(), AssetDefinition::new(vec![feed(1)]))
        .unwrap();
    h.oracle
        .add_asset(admin(), dai(), AssetDefinition::new(vec![feed(2)]))
        .unwrap();
    h.oracle
        .add_asset(admin(), weth(), AssetDefinition::new(vec![feed(3)]))
        .unwrap();

    h.feed.fail(2);
    h.clock.advance(30);
    let results = h.oracle.store_all(keeper()).unwrap();

    assert_eq!(results.len(), 3);
    for (asset, result) in &results {
        if *asset == dai() {
            assert!(matches!(result, Err(OracleError::FeedCallFailed { .. })));
        } else {
            assert_eq!(result.as_ref().unwrap().timestamp, NOW + 30);
        }
    }
    assert_eq!(h.oracle.resolve(dai(), PriceVariant::Last).unwrap().timestamp, NOW);
    assert_eq!(h.oracle.resolve(weth(), PriceVariant::Last).unwrap().price, e18(3));

    assert!(matches!(
        h.oracle.store_all(ohm()),
        Err(OracleError::Unauthorized { .. })
    ));
}
