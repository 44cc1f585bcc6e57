//! Market data read by the feed providers
//!
//! Uses DashMap for concurrent reads/writes with minimal contention

use alloy_primitives::{Address, U256};
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::pools::PoolReserves;

/// Default number of reserve snapshots kept per pool
pub const DEFAULT_MAX_HISTORY: usize = 1_440;

/// Round answer published by an aggregator-style reference feed
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReferenceAnswer {
    pub answer: U256,
    pub decimals: u8,
    pub round_id: u64,
    pub answered_in_round: u64,
    pub updated_at: u64,
}

/// Pool reserves observed at a point in time
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PoolSnapshot {
    pub reserves: PoolReserves,
    pub timestamp: u64,
}

/// In-memory store of reference answers and pool reserves
#[derive(Debug)]
pub struct MarketData {
    /// Latest answer per reference feed
    answers: DashMap<Address, ReferenceAnswer>,

    /// Latest reserves per pool
    pools: DashMap<Address, PoolReserves>,

    /// Reserve snapshots per pool, oldest first
    history: DashMap<Address, VecDeque<PoolSnapshot>>,

    max_history: usize,
    update_count: AtomicU64,
}

impl MarketData {
    pub fn new() -> Self {
        Self::with_max_history(DEFAULT_MAX_HISTORY)
    }

    pub fn with_max_history(max_history: usize) -> Self {
        Self {
            answers: DashMap::new(),
            pools: DashMap::new(),
            history: DashMap::new(),
            max_history: max_history.max(1),
            update_count: AtomicU64::new(0),
        }
    }

    /// Publish a new round for a reference feed
    pub fn update_answer(&self, feed: Address, answer: ReferenceAnswer) {
        self.answers.insert(feed, answer);
        self.update_count.fetch_add(1, Ordering::Relaxed);
    }

    pub fn answer(&self, feed: Address) -> Option<ReferenceAnswer> {
        self.answers.get(&feed).map(|r| r.value().clone())
    }

    /// Record pool reserves observed at `timestamp`. A snapshot older than
    /// the latest one is dropped.
    pub fn update_pool(&self, reserves: PoolReserves, timestamp: u64) {
        let address = reserves.address;

        let mut history = self.history.entry(address).or_default();
        if history.back().is_some_and(|last| last.timestamp > timestamp) {
            return;
        }
        history.push_back(PoolSnapshot {
            reserves: reserves.clone(),
            timestamp,
        });
        while history.len() > self.max_history {
            history.pop_front();
        }

        // written under the history entry so both agree on the latest snapshot
        self.pools.insert(address, reserves);
        self.update_count.fetch_add(1, Ordering::Relaxed);
    }

    pub fn pool(&self, address: Address) -> Option<PoolReserves> {
        self.pools.get(&address).map(|r| r.value().clone())
    }

    /// Snapshots for `pool` with `from <= timestamp <= to`, oldest first
    pub fn pool_history(&self, pool: Address, from: u64, to: u64) -> Vec<PoolSnapshot> {
        self.history
            .get(&pool)
            .map(|h| {
                h.iter()
                    .filter(|s| s.timestamp >= from && s.timestamp <= to)
                    .cloned()
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn stats(&self) -> MarketStats {
        MarketStats {
            answer_count: self.answers.len(),
            pool_count: self.pools.len(),
            update_count: self.update_count.load(Ordering::Relaxed),
        }
    }
}

impl Default for MarketData {
    fn default() -> Self {
        Self::new()
    }
}

/// Statistics about market data
#[derive(Debug, Clone)]
pub struct MarketStats {
    pub answer_count: usize,
    pub pool_count: usize,
    pub update_count: u64,
}
