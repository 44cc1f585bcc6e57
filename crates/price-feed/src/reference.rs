//! Aggregator-style reference feeds
//!
//! Reads round answers from [`MarketData`], validates freshness and round
//! completeness, and normalizes them to the requested precision.

use alloy_primitives::{Address, U256};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::debug;

use oracle_core::math::{mul_div, pow10, scale};
use oracle_core::{Clock, FeedError, FeedProvider, FeedResult, Params, ProviderId};

use crate::market::MarketData;

pub const REFERENCE_PROVIDER: &str = "reference";

pub const ONE_FEED: &str = "one_feed";
pub const TWO_FEED_DIV: &str = "two_feed_div";
pub const TWO_FEED_MUL: &str = "two_feed_mul";

/// Parameters for [`ONE_FEED`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OneFeedParams {
    pub feed: Address,
    /// Maximum answer age in seconds
    pub update_threshold: u64,
}

/// Parameters for [`TWO_FEED_DIV`] and [`TWO_FEED_MUL`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TwoFeedParams {
    pub first: Address,
    pub first_threshold: u64,
    pub second: Address,
    pub second_threshold: u64,
}

/// Reference feed provider
pub struct ReferenceFeeds {
    market: Arc<MarketData>,
    clock: Arc<dyn Clock>,
}

impl ReferenceFeeds {
    pub fn new(market: Arc<MarketData>, clock: Arc<dyn Clock>) -> Self {
        Self { market, clock }
    }

    /// Latest answer of `feed`, checked and scaled to `decimals`
    fn validated(&self, feed: Address, threshold: u64, decimals: u8) -> FeedResult<U256> {
        let round = self
            .market
            .answer(feed)
            .ok_or(FeedError::SourceNotFound(feed))?;
        let now = self.clock.now();

        if round.answer.is_zero() || round.answered_in_round < round.round_id {
            return Err(FeedError::InvalidAnswer(feed));
        }
        if round.updated_at > now || now - round.updated_at > threshold {
            return Err(FeedError::Stale {
                source_id: feed,
                updated_at: round.updated_at,
                now,
                threshold,
            });
        }

        scale(round.answer, round.decimals, decimals).ok_or(FeedError::Overflow)
    }

    fn one_feed(&self, decimals: u8, params: &Params) -> FeedResult<U256> {
        let p: OneFeedParams = decode(params)?;
        self.validated(p.feed, p.update_threshold, decimals)
    }

    fn two_feed(&self, decimals: u8, params: &Params, divide: bool) -> FeedResult<U256> {
        let p: TwoFeedParams = decode(params)?;
        let first = self.validated(p.first, p.first_threshold, decimals)?;
        let second = self.validated(p.second, p.second_threshold, decimals)?;
        let unit = pow10(decimals).ok_or(FeedError::Overflow)?;

        let price = if divide {
            mul_div(first, unit, second)
        } else {
            mul_div(first, second, unit)
        };
        price.ok_or(FeedError::Overflow)
    }
}

impl FeedProvider for ReferenceFeeds {
    fn id(&self) -> ProviderId {
        ProviderId::from(REFERENCE_PROVIDER)
    }

    fn entry_points(&self) -> &'static [&'static str] {
        &[ONE_FEED, TWO_FEED_DIV, TWO_FEED_MUL]
    }

    fn price(
        &self,
        entry_point: &str,
        asset: Address,
        decimals: u8,
        params: &Params,
    ) -> FeedResult<U256> {
        debug!(%asset, entry_point, "Reading reference feed");
        match entry_point {
            ONE_FEED => self.one_feed(decimals, params),
            TWO_FEED_DIV => self.two_feed(decimals, params, true),
            TWO_FEED_MUL => self.two_feed(decimals, params, false),
            other => Err(FeedError::UnknownEntryPoint(other.to_string())),
        }
    }
}

pub(crate) fn decode<T: serde::de::DeserializeOwned>(params: &Params) -> FeedResult<T> {
    params
        .decode()
        .map_err(|e| FeedError::InvalidParams(e.to_string()))
}
