//! Configuration types

use serde::{Deserialize, Serialize};

use crate::{OracleError, OracleResult};

/// Largest output precision; keeps `price * 10^decimals` inside U256
pub const MAX_DECIMALS: u8 = 38;

/// Module-wide oracle settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OracleConfig {
    /// Fractional digits of every price the oracle returns
    pub decimals: u8,
    /// Seconds between observations; moving average durations are multiples of it
    pub observation_frequency: u64,
}

impl Default for OracleConfig {
    fn default() -> Self {
        Self {
            decimals: 18,
            observation_frequency: 8 * 60 * 60, // 8 hours
        }
    }
}

impl OracleConfig {
    pub fn validate(&self) -> OracleResult<()> {
        if self.decimals > MAX_DECIMALS {
            return Err(OracleError::InvalidConfig(format!(
                "decimals {} > {}",
                self.decimals, MAX_DECIMALS
            )));
        }
        if self.observation_frequency == 0 {
            return Err(OracleError::InvalidConfig(
                "observation_frequency must be non-zero".to_string(),
            ));
        }
        Ok(())
    }
}
