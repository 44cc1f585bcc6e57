//! Aggregation strategies for the price oracle
//!
//! Features:
//! - First non-zero, average and median aggregation
//! - Deviation-triggered fallbacks
//! - Strict deviation bound that rejects disagreeing feeds

pub mod strategies;

pub use strategies::{DeviationParams, SimpleStrategy, SIMPLE_PROVIDER};
