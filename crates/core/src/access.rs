//! Access control for mutating oracle entry points

use alloy_primitives::Address;
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;

/// Mutating operations gated by access control
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Operation {
    AddAsset,
    RemoveAsset,
    UpdateFeeds,
    UpdateStrategy,
    UpdateMovingAverage,
    StorePrice,
}

impl Operation {
    pub const ALL: [Operation; 6] = [
        Operation::AddAsset,
        Operation::RemoveAsset,
        Operation::UpdateFeeds,
        Operation::UpdateStrategy,
        Operation::UpdateMovingAverage,
        Operation::StorePrice,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Operation::AddAsset => "add_asset",
            Operation::RemoveAsset => "remove_asset",
            Operation::UpdateFeeds => "update_feeds",
            Operation::UpdateStrategy => "update_strategy",
            Operation::UpdateMovingAverage => "update_moving_average",
            Operation::StorePrice => "store_price",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Permission check consulted before every mutating entry point
pub trait AccessControl: Send + Sync {
    fn is_authorized(&self, caller: Address, operation: Operation) -> bool;
}

/// Role table: caller -> set of permitted operations
#[derive(Debug, Default)]
pub struct Permissions {
    grants: DashMap<Address, HashSet<Operation>>,
}

impl Permissions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn grant(&self, caller: Address, operation: Operation) {
        self.grants.entry(caller).or_default().insert(operation);
    }

    /// Grant every operation, e.g. to an administrator
    pub fn grant_all(&self, caller: Address) {
        let mut ops = self.grants.entry(caller).or_default();
        ops.extend(Operation::ALL);
    }

    pub fn revoke(&self, caller: Address, operation: Operation) {
        if let Some(mut ops) = self.grants.get_mut(&caller) {
            ops.remove(&operation);
        }
    }

    pub fn with_grant(self, caller: Address, operation: Operation) -> Self {
        self.grant(caller, operation);
        self
    }
}

impl AccessControl for Permissions {
    fn is_authorized(&self, caller: Address, operation: Operation) -> bool {
        self.grants
            .get(&caller)
            .map(|ops| ops.contains(&operation))
            .unwrap_or(false)
    }
}
