//! Error types

use alloy_primitives::{Address, U256};
use thiserror::Error;

use crate::{Operation, ProviderId};

/// Oracle engine errors
#[derive(Debug, Error)]
pub enum OracleError {
    #[error("Asset {0} not configured")]
    NotConfigured(Address),

    #[error("Asset {0} already configured")]
    AlreadyConfigured(Address),

    #[error("No asset identifier supplied")]
    InvalidAsset,

    #[error("Asset {0} is not a known resource")]
    InvalidResource(Address),

    #[error("Price for {0} resolved to zero")]
    ZeroPrice(Address),

    #[error("Observation value cannot be zero")]
    ZeroObservation,

    #[error("No observations stored for {0}")]
    InsufficientObservations(Address),

    #[error("Invalid observation count: expected {expected}, got {actual}")]
    InvalidObservationCount { expected: usize, actual: usize },

    #[error("Invalid moving average configuration: {0}")]
    InvalidMAConfig(String),

    #[error("Moving average not stored for {0}")]
    MovingAverageNotStored(Address),

    #[error("Asset {0} has more than one price input but no strategy")]
    MissingStrategy(Address),

    #[error("Asset {0} needs at least one feed")]
    NoFeeds(Address),

    #[error("Feed provider {0} not installed")]
    FeedNotInstalled(ProviderId),

    #[error("Strategy provider {0} not installed")]
    StrategyNotInstalled(ProviderId),

    #[error("Provider {provider} has no entry point {entry_point}")]
    UnsupportedEntryPoint {
        provider: ProviderId,
        entry_point: String,
    },

    #[error("Timestamp {timestamp} is in the future (now {now})")]
    FutureTimestamp { timestamp: u64, now: u64 },

    #[error("Too many observations: {0} supplied, at most 1 allowed without a moving average")]
    TooManyObservations(usize),

    #[error("Unexpected moving average duration {0} without a moving average")]
    UnexpectedDuration(u64),

    #[error("Feed {index} ({provider}) failed for {asset}: {source}")]
    FeedCallFailed {
        asset: Address,
        index: usize,
        provider: ProviderId,
        #[source]
        source: FeedError,
    },

    #[error("Strategy {provider} failed for {asset}: {source}")]
    StrategyCallFailed {
        asset: Address,
        provider: ProviderId,
        #[source]
        source: StrategyError,
    },

    #[error("Caller {caller} not authorized for {operation}")]
    Unauthorized { caller: Address, operation: Operation },

    #[error("Arithmetic overflow")]
    Overflow,

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

/// Errors raised by feed providers
#[derive(Debug, Error)]
pub enum FeedError {
    #[error("Unknown entry point: {0}")]
    UnknownEntryPoint(String),

    #[error("Invalid parameters: {0}")]
    InvalidParams(String),

    #[error("Source {0} not found")]
    SourceNotFound(Address),

    #[error("Source {0} returned an invalid answer")]
    InvalidAnswer(Address),

    #[error("Source {source_id} stale: updated at {updated_at}, now {now}, threshold {threshold}s")]
    Stale {
        source_id: Address,
        updated_at: u64,
        now: u64,
        threshold: u64,
    },

    #[error("Pool {0} not found")]
    PoolNotFound(Address),

    #[error("Asset {asset} is not in pool {pool}")]
    AssetNotInPool { asset: Address, pool: Address },

    #[error("Pool {0} has zero reserves")]
    ZeroReserves(Address),

    #[error("Unknown decimals for token {0}")]
    UnknownToken(Address),

    #[error("Pool {pool} has {available} observations in window, need {required}")]
    InsufficientHistory {
        pool: Address,
        required: usize,
        available: usize,
    },

    #[error("Arithmetic overflow")]
    Overflow,
}

/// Errors raised by strategy providers
#[derive(Debug, Error)]
pub enum StrategyError {
    #[error("Unknown entry point: {0}")]
    UnknownEntryPoint(String),

    #[error("Invalid parameters: {0}")]
    InvalidParams(String),

    #[error("Strategy needs at least {required} prices, got {actual}")]
    PriceCountInvalid { required: usize, actual: usize },

    #[error("Price {price} deviates {deviation_bps}bps from {benchmark} (max {max_bps}bps)")]
    DeviationExceeded {
        price: U256,
        benchmark: U256,
        deviation_bps: U256,
        max_bps: u32,
    },

    #[error("Arithmetic overflow")]
    Overflow,
}

/// Result type alias
pub type OracleResult<T> = Result<T, OracleError>;
pub type FeedResult<T> = Result<T, FeedError>;
pub type StrategyResult<T> = Result<T, StrategyError>;
