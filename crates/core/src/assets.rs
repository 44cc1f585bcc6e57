//! Asset directory
//!
//! Known token handles and their decimals. An asset must be registered
//! here before the oracle will track it, and pool feeds read token
//! decimals from it.
//!
//! CRITICAL: decimals differ per token!
//! - USDC/USDT: 6 decimals
//! - WBTC: 8 decimals
//! - Most others: 18 decimals

use alloy_primitives::Address;
use dashmap::DashMap;
use serde::{Deserialize, Serialize};

/// Token information
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Asset {
    pub address: Address,
    pub symbol: String,
    pub decimals: u8,
}

impl Asset {
    pub fn new(address: Address, symbol: &str, decimals: u8) -> Self {
        Self {
            address,
            symbol: symbol.to_string(),
            decimals,
        }
    }
}

/// Registry of valid asset handles
#[derive(Debug, Default)]
pub struct AssetDirectory {
    assets: DashMap<Address, Asset>,
}

impl AssetDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_assets(assets: impl IntoIterator<Item = Asset>) -> Self {
        let directory = Self::new();
        for asset in assets {
            directory.register(asset);
        }
        directory
    }

    pub fn register(&self, asset: Asset) {
        self.assets.insert(asset.address, asset);
    }

    pub fn unregister(&self, address: Address) -> Option<Asset> {
        self.assets.remove(&address).map(|(_, asset)| asset)
    }

    /// Whether `address` is a valid resource handle
    pub fn contains(&self, address: Address) -> bool {
        self.assets.contains_key(&address)
    }

    pub fn get(&self, address: Address) -> Option<Asset> {
        self.assets.get(&address).map(|r| r.value().clone())
    }

    pub fn decimals(&self, address: Address) -> Option<u8> {
        self.assets.get(&address).map(|r| r.decimals)
    }

    /// Symbol for logs, falling back to the address
    pub fn label(&self, address: Address) -> String {
        self.assets
            .get(&address)
            .map(|r| r.symbol.clone())
            .unwrap_or_else(|| address.to_string())
    }

    pub fn len(&self) -> usize {
        self.assets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.assets.is_empty()
    }
}
