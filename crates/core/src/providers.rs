//! Provider capabilities
//!
//! Feeds and strategies are pluggable. The engine only knows these two
//! call contracts; each provider decodes its own [`Params`].

use alloy_primitives::{Address, U256};

use crate::{FeedResult, Params, ProviderId, StrategyResult};

/// Produces a price for an asset, normalized to `decimals`
pub trait FeedProvider: Send + Sync {
    fn id(&self) -> ProviderId;

    /// Entry points this provider answers
    fn entry_points(&self) -> &'static [&'static str];

    fn price(
        &self,
        entry_point: &str,
        asset: Address,
        decimals: u8,
        params: &Params,
    ) -> FeedResult<U256>;

    fn supports(&self, entry_point: &str) -> bool {
        self.entry_points().contains(&entry_point)
    }
}

/// Combines an ordered list of prices into one
pub trait StrategyProvider: Send + Sync {
    fn id(&self) -> ProviderId;

    fn entry_points(&self) -> &'static [&'static str];

    fn aggregate(&self, entry_point: &str, prices: &[U256], params: &Params) -> StrategyResult<U256>;

    fn supports(&self, entry_point: &str) -> bool {
        self.entry_points().contains(&entry_point)
    }
}
