//! Deployment configuration
//!
//! Loaded from a TOML file with `ORACLE__`-prefixed environment overrides,
//! e.g. `ORACLE__KEEPER__HEARTBEAT_SECS=60`.

use alloy_primitives::{Address, U256};
use anyhow::{Context, Result};
use config::{Config, Environment, File, FileFormat};
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

use oracle_core::{Asset, Component, OracleConfig};
use oracle_engine::{AssetDefinition, MovingAverageSettings};
use oracle_price_feed::{PoolReserves, ReferenceAnswer};

pub const ENV_PREFIX: &str = "ORACLE";

#[derive(Debug, Clone, Deserialize)]
pub struct DeploymentConfig {
    #[serde(default)]
    pub oracle: OracleConfig,
    pub keeper: KeeperSettings,
    #[serde(default)]
    pub tokens: Vec<Asset>,
    #[serde(default)]
    pub answers: Vec<AnswerEntry>,
    #[serde(default)]
    pub pools: Vec<PoolEntry>,
    #[serde(default)]
    pub assets: Vec<AssetEntry>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct KeeperSettings {
    /// Holds every permission
    pub admin: Address,
    /// Allowed to store prices
    pub keeper: Address,
    #[serde(default = "default_heartbeat_secs")]
    pub heartbeat_secs: u64,
}

fn default_heartbeat_secs() -> u64 {
    8 * 60 * 60
}

impl KeeperSettings {
    pub fn heartbeat(&self) -> Duration {
        Duration::from_secs(self.heartbeat_secs)
    }
}

/// Static reference answer, republished on every heartbeat
#[derive(Debug, Clone, Deserialize)]
pub struct AnswerEntry {
    pub feed: Address,
    /// Decimal integer string
    pub answer: String,
    pub decimals: u8,
}

impl AnswerEntry {
    pub fn at(&self, round_id: u64, updated_at: u64) -> Result<ReferenceAnswer> {
        Ok(ReferenceAnswer {
            answer: parse_amount(&self.answer)?,
            decimals: self.decimals,
            round_id,
            answered_in_round: round_id,
            updated_at,
        })
    }
}

/// Static pool reserves
#[derive(Debug, Clone, Deserialize)]
pub struct PoolEntry {
    pub address: Address,
    pub token0: Address,
    pub token1: Address,
    pub reserve0: String,
    pub reserve1: String,
}

impl PoolEntry {
    pub fn reserves(&self) -> Result<PoolReserves> {
        Ok(PoolReserves {
            address: self.address,
            token0: self.token0,
            token1: self.token1,
            reserve0: parse_amount(&self.reserve0)?,
            reserve1: parse_amount(&self.reserve1)?,
        })
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct AssetEntry {
    pub address: Address,
    pub feeds: Vec<Component>,
    #[serde(default)]
    pub strategy: Option<Component>,
    #[serde(default)]
    pub use_moving_average: bool,
    #[serde(default)]
    pub moving_average: Option<MovingAverageEntry>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MovingAverageEntry {
    pub duration: u64,
    #[serde(default)]
    pub last_observation_time: u64,
    #[serde(default)]
    pub observations: Vec<String>,
}

impl AssetEntry {
    pub fn definition(&self) -> Result<AssetDefinition> {
        let mut definition = AssetDefinition::new(self.feeds.clone());
        definition.strategy = self.strategy.clone();
        definition.use_moving_average = self.use_moving_average;

        if let Some(ma) = &self.moving_average {
            let observations = ma
                .observations
                .iter()
                .map(|o| parse_amount(o))
                .collect::<Result<Vec<U256>>>()?;
            definition.moving_average =
                MovingAverageSettings::stored(ma.duration, ma.last_observation_time, observations);
        }
        Ok(definition)
    }
}

fn parse_amount(value: &str) -> Result<U256> {
    value
        .trim()
        .parse::<U256>()
        .with_context(|| format!("invalid amount {value:?}"))
}

impl DeploymentConfig {
    /// Load from `path` (if it exists) and the environment
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut builder = Config::builder();
        if let Some(path) = path {
            builder = builder.add_source(File::from(path).format(FileFormat::Toml).required(true));
        }
        let config = builder
            .add_source(Environment::with_prefix(ENV_PREFIX).separator("__").try_parsing(true))
            .build()
            .context("failed to read deployment config")?;
        Self::finish(config)
    }

    /// Parse TOML text directly
    pub fn from_toml(text: &str) -> Result<Self> {
        let config = Config::builder()
            .add_source(File::from_str(text, FileFormat::Toml))
            .build()
            .context("failed to parse deployment config")?;
        Self::finish(config)
    }

    fn finish(config: Config) -> Result<Self> {
        let deployment: Self = config
            .try_deserialize()
            .context("invalid deployment config")?;
        deployment.validate()?;
        Ok(deployment)
    }

    pub fn validate(&self) -> Result<()> {
        self.oracle.validate()?;
        anyhow::ensure!(self.keeper.heartbeat_secs > 0, "heartbeat_secs must be non-zero");
        for asset in &self.assets {
            anyhow::ensure!(
                self.tokens.iter().any(|t| t.address == asset.address),
                "asset {} has no token entry",
                asset.address
            );
        }
        Ok(())
    }
}
