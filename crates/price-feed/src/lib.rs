//! Feed providers for the price oracle
//!
//! Features:
//! - Aggregator-style reference feeds (single feed, two-feed ratio and product)
//! - Pool-derived spot prices from constant-product reserves
//! - Time-weighted average prices over pool reserve history
//! - Concurrent in-memory market data shared by all providers

pub mod market;
pub mod pools;
pub mod reference;
pub mod pool_feeds;

pub use market::{MarketData, PoolSnapshot, ReferenceAnswer};
pub use pools::PoolReserves;
pub use reference::{OneFeedParams, ReferenceFeeds, TwoFeedParams, REFERENCE_PROVIDER};
pub use pool_feeds::{PoolFeeds, SpotParams, TwapParams, POOL_PROVIDER};
