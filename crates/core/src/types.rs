//! Core type definitions

use alloy_primitives::U256;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier of an installed feed or strategy provider
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProviderId(String);

impl ProviderId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for ProviderId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl fmt::Display for ProviderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Provider-specific call parameters.
///
/// The engine stores and forwards these verbatim; only the provider that
/// owns the entry point decodes them.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Params(serde_json::Value);

impl Params {
    /// Empty parameter set
    pub fn none() -> Self {
        Self(serde_json::Value::Null)
    }

    pub fn encode<T: Serialize>(value: &T) -> Result<Self, serde_json::Error> {
        serde_json::to_value(value).map(Self)
    }

    pub fn decode<T: DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        T::deserialize(&self.0)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_null()
    }

    pub fn raw(&self) -> &serde_json::Value {
        &self.0
    }
}

impl From<serde_json::Value> for Params {
    fn from(value: serde_json::Value) -> Self {
        Self(value)
    }
}

/// A call into an installed provider: feed or strategy
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Component {
    pub provider: ProviderId,
    pub entry_point: String,
    #[serde(default)]
    pub params: Params,
}

impl Component {
    pub fn new(provider: impl Into<ProviderId>, entry_point: &str, params: Params) -> Self {
        Self {
            provider: provider.into(),
            entry_point: entry_point.to_string(),
            params,
        }
    }
}

/// Which price to resolve for an asset
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PriceVariant {
    /// Computed live from the feeds (and strategy)
    Current,
    /// Last stored price
    Last,
    /// Average of the stored observations
    MovingAverage,
}

impl PriceVariant {
    pub fn name(&self) -> &'static str {
        match self {
            PriceVariant::Current => "current",
            PriceVariant::Last => "last",
            PriceVariant::MovingAverage => "moving_average",
        }
    }
}

impl fmt::Display for PriceVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// A price together with the time it refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PricePoint {
    pub price: U256,
    pub timestamp: u64,
}

impl PricePoint {
    pub fn new(price: U256, timestamp: u64) -> Self {
        Self { price, timestamp }
    }

    pub fn age(&self, now: u64) -> u64 {
        now.saturating_sub(self.timestamp)
    }

    pub fn is_stale(&self, max_age: u64, now: u64) -> bool {
        self.age(now) > max_age
    }
}
