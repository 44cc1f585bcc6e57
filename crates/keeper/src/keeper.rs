//! Heartbeat keeper
//!
//! Builds an oracle from a deployment and stores every tracked asset's
//! price on a fixed interval.

use alloy_primitives::Address;
use anyhow::{Context, Result};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::oneshot;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{error, info, warn};

use oracle_core::{AssetDirectory, Clock, Permissions, SystemClock};
use oracle_engine::{Oracle, ProviderRegistry};
use oracle_price_feed::{MarketData, PoolFeeds, ReferenceFeeds};
use oracle_strategy::SimpleStrategy;

use crate::deployment::DeploymentConfig;

/// Outcome of one heartbeat
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HeartbeatReport {
    pub stored: usize,
    pub failed: usize,
}

pub struct Keeper {
    oracle: Arc<Oracle>,
    market: Arc<MarketData>,
    clock: Arc<dyn Clock>,
    deployment: DeploymentConfig,
    round: AtomicU64,
}

impl Keeper {
    pub fn new(deployment: DeploymentConfig) -> Result<Self> {
        Self::with_clock(deployment, Arc::new(SystemClock))
    }

    pub fn with_clock(deployment: DeploymentConfig, clock: Arc<dyn Clock>) -> Result<Self> {
        let directory = Arc::new(AssetDirectory::with_assets(deployment.tokens.iter().cloned()));
        let market = Arc::new(MarketData::new());

        let providers = Arc::new(ProviderRegistry::new());
        providers.install_feed(Arc::new(ReferenceFeeds::new(
            Arc::clone(&market),
            Arc::clone(&clock),
        )));
        providers.install_feed(Arc::new(PoolFeeds::new(
            Arc::clone(&market),
            Arc::clone(&directory),
            Arc::clone(&clock),
        )));
        providers.install_strategy(Arc::new(SimpleStrategy::new()));

        let permissions = Arc::new(Permissions::new());
        permissions.grant_all(deployment.keeper.admin);
        permissions.grant(deployment.keeper.keeper, oracle_core::Operation::StorePrice);

        let oracle = Oracle::new(
            deployment.oracle.clone(),
            providers,
            directory,
            permissions,
            Arc::clone(&clock),
        )?;

        let keeper = Self {
            oracle: Arc::new(oracle),
            market,
            clock,
            deployment,
            round: AtomicU64::new(0),
        };
        keeper.publish_market()?;
        keeper.register_assets()?;
        Ok(keeper)
    }

    pub fn oracle(&self) -> &Arc<Oracle> {
        &self.oracle
    }

    pub fn market(&self) -> &Arc<MarketData> {
        &self.market
    }

    /// Republish the static answers and reserves stamped with the current time
    fn publish_market(&self) -> Result<()> {
        let now = self.clock.now();
        let round = self.round.fetch_add(1, Ordering::Relaxed) + 1;

        for entry in &self.deployment.answers {
            self.market.update_answer(entry.feed, entry.at(round, now)?);
        }
        for entry in &self.deployment.pools {
            self.market.update_pool(entry.reserves()?, now);
        }
        Ok(())
    }

    fn register_assets(&self) -> Result<()> {
        let admin = self.deployment.keeper.admin;
        for entry in &self.deployment.assets {
            self.oracle
                .add_asset(admin, entry.address, entry.definition()?)
                .with_context(|| format!("failed to add asset {}", entry.address))?;
        }
        info!(assets = self.deployment.assets.len(), "Assets registered");
        Ok(())
    }

    fn keeper_address(&self) -> Address {
        self.deployment.keeper.keeper
    }

    /// Refresh market data and store every tracked price once
    pub fn heartbeat(&self) -> Result<HeartbeatReport> {
        self.publish_market()?;
        let results = self.oracle.store_all(self.keeper_address())?;

        let mut report = HeartbeatReport::default();
        for (asset, result) in results {
            match result {
                Ok(point) => {
                    report.stored += 1;
                    info!(%asset, price = %point.price, timestamp = point.timestamp, "Price stored");
                }
                Err(e) => {
                    report.failed += 1;
                    warn!(%asset, error = %e, "Price not stored");
                }
            }
        }
        Ok(report)
    }

    /// Run heartbeats until `shutdown` fires
    pub async fn run(self: Arc<Self>, mut shutdown: oneshot::Receiver<()>) -> Result<()> {
        let mut ticker = interval(self.deployment.keeper.heartbeat());
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        info!(
            heartbeat_secs = self.deployment.keeper.heartbeat_secs,
            keeper = %self.keeper_address(),
            "Keeper running"
        );

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    let keeper = Arc::clone(&self);
                    match tokio::task::spawn_blocking(move || keeper.heartbeat()).await {
                        Ok(Ok(report)) => {
                            info!(stored = report.stored, failed = report.failed, "Heartbeat complete");
                        }
                        Ok(Err(e)) => error!("Heartbeat failed: {:#}", e),
                        Err(e) => error!("Heartbeat task panicked: {}", e),
                    }
                }
                _ = &mut shutdown => {
                    info!("Keeper shutting down");
                    break;
                }
            }
        }
        Ok(())
    }
}
