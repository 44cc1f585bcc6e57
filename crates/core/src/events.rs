//! Notifications emitted by the oracle

use alloy_primitives::{Address, U256};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum OracleEvent {
    AssetAdded { asset: Address },
    AssetRemoved { asset: Address },
    FeedsUpdated { asset: Address },
    StrategyUpdated { asset: Address },
    MovingAverageUpdated { asset: Address },
    PriceStored {
        asset: Address,
        price: U256,
        timestamp: u64,
    },
}

impl OracleEvent {
    pub fn asset(&self) -> Address {
        match self {
            OracleEvent::AssetAdded { asset }
            | OracleEvent::AssetRemoved { asset }
            | OracleEvent::FeedsUpdated { asset }
            | OracleEvent::StrategyUpdated { asset }
            | OracleEvent::MovingAverageUpdated { asset }
            | OracleEvent::PriceStored { asset, .. } => *asset,
        }
    }
}
