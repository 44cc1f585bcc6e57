//! Constant-product pool reserves

use alloy_primitives::{Address, U256};
use serde::{Deserialize, Serialize};

use oracle_core::math::{mul_div, pow10};
use oracle_core::{FeedError, FeedResult};

/// Uniswap V2 style pool (constant product)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolReserves {
    pub address: Address,
    pub token0: Address,
    pub token1: Address,
    pub reserve0: U256,
    pub reserve1: U256,
}

impl PoolReserves {
    pub fn contains(&self, token: Address) -> bool {
        token == self.token0 || token == self.token1
    }

    /// The token paired with `token`
    pub fn counterpart(&self, token: Address) -> Option<Address> {
        if token == self.token0 {
            Some(self.token1)
        } else if token == self.token1 {
            Some(self.token0)
        } else {
            None
        }
    }

    /// (reserve of `token`, reserve of its counterpart)
    fn reserves_for(&self, token: Address) -> Option<(U256, U256)> {
        if token == self.token0 {
            Some((self.reserve0, self.reserve1))
        } else if token == self.token1 {
            Some((self.reserve1, self.reserve0))
        } else {
            None
        }
    }

    /// Spot price of `asset` in units of the counterpart token, with
    /// `out_decimals` fractional digits.
    ///
    /// price = (reserveOther / 10^otherDecimals) / (reserveAsset / 10^assetDecimals)
    pub fn spot_price(
        &self,
        asset: Address,
        asset_decimals: u8,
        other_decimals: u8,
        out_decimals: u8,
    ) -> FeedResult<U256> {
        let (reserve_asset, reserve_other) =
            self.reserves_for(asset).ok_or(FeedError::AssetNotInPool {
                asset,
                pool: self.address,
            })?;

        if reserve_asset.is_zero() || reserve_other.is_zero() {
            return Err(FeedError::ZeroReserves(self.address));
        }

        let numerator_scale = pow10(asset_decimals)
            .zip(pow10(out_decimals))
            .and_then(|(a, b)| a.checked_mul(b))
            .ok_or(FeedError::Overflow)?;
        let denominator = pow10(other_decimals)
            .and_then(|scale| reserve_asset.checked_mul(scale))
            .ok_or(FeedError::Overflow)?;

        mul_div(reserve_other, numerator_scale, denominator).ok_or(FeedError::Overflow)
    }
}
