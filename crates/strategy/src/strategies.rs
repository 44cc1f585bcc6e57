//! Simple price aggregation strategies
//!
//! Zero prices are treated as missing inputs by every entry point.

use alloy_primitives::U256;
use serde::{Deserialize, Serialize};
use tracing::debug;

use oracle_core::math::{deviation_bps, BPS};
use oracle_core::{Params, ProviderId, StrategyError, StrategyProvider, StrategyResult};

pub const SIMPLE_PROVIDER: &str = "simple";

pub const FIRST_NON_ZERO: &str = "first_non_zero";
pub const AVERAGE: &str = "average";
pub const MEDIAN: &str = "median";
pub const AVERAGE_IF_DEVIATION: &str = "average_if_deviation";
pub const MEDIAN_IF_DEVIATION: &str = "median_if_deviation";
pub const MEDIAN_WITHIN_DEVIATION: &str = "median_within_deviation";

/// Parameters for the deviation-aware entry points
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviationParams {
    /// Allowed deviation in basis points, 1..10_000
    pub deviation_bps: u32,
}

impl DeviationParams {
    fn decode(params: &Params) -> StrategyResult<Self> {
        let p: Self = params
            .decode()
            .map_err(|e| StrategyError::InvalidParams(e.to_string()))?;
        if p.deviation_bps == 0 || p.deviation_bps >= BPS {
            return Err(StrategyError::InvalidParams(format!(
                "deviation_bps {} outside 1..{}",
                p.deviation_bps, BPS
            )));
        }
        Ok(p)
    }
}

/// Stateless strategy provider
#[derive(Debug, Clone, Copy, Default)]
pub struct SimpleStrategy;

impl SimpleStrategy {
    pub fn new() -> Self {
        Self
    }

    fn first_non_zero(&self, prices: &[U256]) -> StrategyResult<U256> {
        require_count(prices, 1)?;
        Ok(prices.iter().copied().find(|p| !p.is_zero()).unwrap_or(U256::ZERO))
    }

    fn average(&self, prices: &[U256]) -> StrategyResult<U256> {
        require_count(prices, 2)?;
        mean(&non_zero(prices))
    }

    fn median(&self, prices: &[U256]) -> StrategyResult<U256> {
        require_count(prices, 3)?;
        median(non_zero(prices))
    }

    /// Benchmark (mean or median) when the spread is wide, first price otherwise
    fn if_deviation(
        &self,
        prices: &[U256],
        params: &Params,
        use_median: bool,
    ) -> StrategyResult<U256> {
        require_count(prices, if use_median { 3 } else { 2 })?;
        let max_bps = DeviationParams::decode(params)?.deviation_bps;

        let values = non_zero(prices);
        if values.len() < 2 {
            return Ok(values.first().copied().unwrap_or(U256::ZERO));
        }

        let first = values[0];
        let benchmark = if use_median {
            median(values.clone())?
        } else {
            mean(&values)?
        };

        let (min, max) = min_max(&values);
        if exceeds(min, benchmark, max_bps)? || exceeds(max, benchmark, max_bps)? {
            debug!(%benchmark, max_bps, "Deviation detected, using benchmark");
            Ok(benchmark)
        } else {
            Ok(first)
        }
    }

    fn median_within_deviation(&self, prices: &[U256], params: &Params) -> StrategyResult<U256> {
        require_count(prices, 2)?;
        let max_bps = DeviationParams::decode(params)?.deviation_bps;

        let values = non_zero(prices);
        if values.is_empty() {
            return Ok(U256::ZERO);
        }

        let benchmark = median(values.clone())?;
        for price in values {
            let deviation = deviation_bps(price, benchmark).ok_or(StrategyError::Overflow)?;
            if deviation > U256::from(max_bps) {
                return Err(StrategyError::DeviationExceeded {
                    price,
                    benchmark,
                    deviation_bps: deviation,
                    max_bps,
                });
            }
        }
        Ok(benchmark)
    }
}

impl StrategyProvider for SimpleStrategy {
    fn id(&self) -> ProviderId {
        ProviderId::from(SIMPLE_PROVIDER)
    }

    fn entry_points(&self) -> &'static [&'static str] {
        &[
            FIRST_NON_ZERO,
            AVERAGE,
            MEDIAN,
            AVERAGE_IF_DEVIATION,
            MEDIAN_IF_DEVIATION,
            MEDIAN_WITHIN_DEVIATION,
        ]
    }

    fn aggregate(&self, entry_point: &str, prices: &[U256], params: &Params) -> StrategyResult<U256> {
        match entry_point {
            FIRST_NON_ZERO => self.first_non_zero(prices),
            AVERAGE => self.average(prices),
            MEDIAN => self.median(prices),
            AVERAGE_IF_DEVIATION => self.if_deviation(prices, params, false),
            MEDIAN_IF_DEVIATION => self.if_deviation(prices, params, true),
            MEDIAN_WITHIN_DEVIATION => self.median_within_deviation(prices, params),
            other => Err(StrategyError::UnknownEntryPoint(other.to_string())),
        }
    }
}

fn require_count(prices: &[U256], required: usize) -> StrategyResult<()> {
    if prices.len() < required {
        return Err(StrategyError::PriceCountInvalid {
            required,
            actual: prices.len(),
        });
    }
    Ok(())
}

fn non_zero(prices: &[U256]) -> Vec<U256> {
    prices.iter().copied().filter(|p| !p.is_zero()).collect()
}

fn mean(values: &[U256]) -> StrategyResult<U256> {
    if values.is_empty() {
        return Ok(U256::ZERO);
    }
    let sum = values
        .iter()
        .try_fold(U256::ZERO, |acc, v| acc.checked_add(*v))
        .ok_or(StrategyError::Overflow)?;
    Ok(sum / U256::from(values.len()))
}

/// Median; falls back to the mean below three values
fn median(mut values: Vec<U256>) -> StrategyResult<U256> {
    if values.len() < 3 {
        return mean(&values);
    }
    values.sort();
    let mid = values.len() / 2;
    if values.len() % 2 == 1 {
        Ok(values[mid])
    } else {
        mean(&values[mid - 1..=mid])
    }
}

fn min_max(values: &[U256]) -> (U256, U256) {
    values.iter().fold((U256::MAX, U256::ZERO), |(lo, hi), v| {
        (lo.min(*v), hi.max(*v))
    })
}

fn exceeds(value: U256, benchmark: U256, max_bps: u32) -> StrategyResult<bool> {
    deviation_bps(value, benchmark)
        .map(|d| d > U256::from(max_bps))
        .ok_or(StrategyError::Overflow)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn prices(values: &[u64]) -> Vec<U256> {
        values.iter().map(|v| U256::from(*v)).collect()
    }

    fn deviation(bps: u32) -> Params {
        Params::encode(&DeviationParams { deviation_bps: bps }).unwrap()
    }

    fn run(entry_point: &str, values: &[u64], params: &Params) -> StrategyResult<U256> {
        SimpleStrategy::new().aggregate(entry_point, &prices(values), params)
    }

    #[test]
    fn test_simple_strategy() {
        let strategy = SimpleStrategy::new();
        assert_eq!(strategy.id(), ProviderId::from("simple"));
        assert!(strategy.supports(MEDIAN));
        assert!(!strategy.supports("mode"));
    }

    #[test]
    fn test_first_non_zero() {
        assert_eq!(run(FIRST_NON_ZERO, &[0, 7, 9], &Params::none()).unwrap(), U256::from(7u64));
        assert_eq!(run(FIRST_NON_ZERO, &[0, 0], &Params::none()).unwrap(), U256::ZERO);
        assert!(matches!(
            run(FIRST_NON_ZERO, &[], &Params::none()),
            Err(StrategyError::PriceCountInvalid { required: 1, actual: 0 })
        ));
    }

    #[test]
    fn test_average_skips_zero() {
        assert_eq!(run(AVERAGE, &[10, 0, 20], &Params::none()).unwrap(), U256::from(15u64));
        assert!(matches!(
            run(AVERAGE, &[10], &Params::none()),
            Err(StrategyError::PriceCountInvalid { required: 2, .. })
        ));
    }

    #[test]
    fn test_median_odd_and_even() {
        assert_eq!(run(MEDIAN, &[30, 10, 20], &Params::none()).unwrap(), U256::from(20u64));
        assert_eq!(run(MEDIAN, &[40, 10, 30, 20], &Params::none()).unwrap(), U256::from(25u64));
        // two usable prices: falls back to the average
        assert_eq!(run(MEDIAN, &[10, 0, 30], &Params::none()).unwrap(), U256::from(20u64));
    }

    #[test]
    fn test_average_if_deviation() {
        // within 5%: first price wins
        assert_eq!(
            run(AVERAGE_IF_DEVIATION, &[100, 102], &deviation(500)).unwrap(),
            U256::from(100u64)
        );
        // 100 vs 200: average
        assert_eq!(
            run(AVERAGE_IF_DEVIATION, &[100, 200], &deviation(500)).unwrap(),
            U256::from(150u64)
        );
        // single usable price
        assert_eq!(
            run(AVERAGE_IF_DEVIATION, &[0, 42], &deviation(500)).unwrap(),
            U256::from(42u64)
        );
    }

    #[test]
    fn test_median_if_deviation() {
        assert_eq!(
            run(MEDIAN_IF_DEVIATION, &[101, 100, 99], &deviation(500)).unwrap(),
            U256::from(101u64)
        );
        assert_eq!(
            run(MEDIAN_IF_DEVIATION, &[300, 100, 99], &deviation(500)).unwrap(),
            U256::from(100u64)
        );
    }

    #[test]
    fn test_median_within_deviation_rejects_outlier() {
        assert_eq!(
            run(MEDIAN_WITHIN_DEVIATION, &[100, 101, 99], &deviation(200)).unwrap(),
            U256::from(100u64)
        );

        let err = run(MEDIAN_WITHIN_DEVIATION, &[100, 101, 150], &deviation(200)).unwrap_err();
        match err {
            StrategyError::DeviationExceeded { price, benchmark, max_bps, .. } => {
                assert_eq!(price, U256::from(150u64));
                assert_eq!(benchmark, U256::from(101u64));
                assert_eq!(max_bps, 200);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_invalid_deviation_params() {
        assert!(matches!(
            run(AVERAGE_IF_DEVIATION, &[1, 2], &deviation(0)),
            Err(StrategyError::InvalidParams(_))
        ));
        assert!(matches!(
            run(AVERAGE_IF_DEVIATION, &[1, 2], &deviation(10_000)),
            Err(StrategyError::InvalidParams(_))
        ));
        assert!(matches!(
            run(MEDIAN_WITHIN_DEVIATION, &[1, 2], &Params::none()),
            Err(StrategyError::InvalidParams(_))
        ));
    }

    #[test]
    fn test_unknown_entry_point() {
        assert!(matches!(
            run("mode", &[1, 2], &Params::none()),
            Err(StrategyError::UnknownEntryPoint(_))
        ));
    }
}
