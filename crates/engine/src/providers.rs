//! Installed feed and strategy providers

use dashmap::DashMap;
use std::sync::Arc;
use tracing::info;

use oracle_core::{
    Component, FeedProvider, OracleError, OracleResult, ProviderId, StrategyProvider,
};

/// Capability table: provider id -> implementation
#[derive(Default)]
pub struct ProviderRegistry {
    feeds: DashMap<ProviderId, Arc<dyn FeedProvider>>,
    strategies: DashMap<ProviderId, Arc<dyn StrategyProvider>>,
}

impl ProviderRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Install a feed provider, replacing any provider with the same id
    pub fn install_feed(&self, provider: Arc<dyn FeedProvider>) {
        let id = provider.id();
        info!(provider = %id, entry_points = ?provider.entry_points(), "Installed feed provider");
        self.feeds.insert(id, provider);
    }

    pub fn install_strategy(&self, provider: Arc<dyn StrategyProvider>) {
        let id = provider.id();
        info!(provider = %id, entry_points = ?provider.entry_points(), "Installed strategy provider");
        self.strategies.insert(id, provider);
    }

    pub fn uninstall_feed(&self, id: &ProviderId) -> bool {
        self.feeds.remove(id).is_some()
    }

    pub fn uninstall_strategy(&self, id: &ProviderId) -> bool {
        self.strategies.remove(id).is_some()
    }

    pub fn feed(&self, id: &ProviderId) -> OracleResult<Arc<dyn FeedProvider>> {
        self.feeds
            .get(id)
            .map(|r| Arc::clone(r.value()))
            .ok_or_else(|| OracleError::FeedNotInstalled(id.clone()))
    }

    pub fn strategy(&self, id: &ProviderId) -> OracleResult<Arc<dyn StrategyProvider>> {
        self.strategies
            .get(id)
            .map(|r| Arc::clone(r.value()))
            .ok_or_else(|| OracleError::StrategyNotInstalled(id.clone()))
    }

    /// Feed component points at an installed provider and a known entry point
    pub fn check_feed(&self, feed: &Component) -> OracleResult<()> {
        let provider = self.feed(&feed.provider)?;
        if !provider.supports(&feed.entry_point) {
            return Err(unsupported(feed));
        }
        Ok(())
    }

    pub fn check_strategy(&self, strategy: &Component) -> OracleResult<()> {
        let provider = self.strategy(&strategy.provider)?;
        if !provider.supports(&strategy.entry_point) {
            return Err(unsupported(strategy));
        }
        Ok(())
    }

    pub fn feed_ids(&self) -> Vec<ProviderId> {
        let mut ids: Vec<ProviderId> = self.feeds.iter().map(|r| r.key().clone()).collect();
        ids.sort();
        ids
    }

    pub fn strategy_ids(&self) -> Vec<ProviderId> {
        let mut ids: Vec<ProviderId> = self.strategies.iter().map(|r| r.key().clone()).collect();
        ids.sort();
        ids
    }
}

fn unsupported(component: &Component) -> OracleError {
    OracleError::UnsupportedEntryPoint {
        provider: component.provider.clone(),
        entry_point: component.entry_point.clone(),
    }
}
