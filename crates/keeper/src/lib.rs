//! Oracle keeper
//!
//! Loads a deployment, wires feeds, strategies and permissions into an
//! oracle and stores prices on a heartbeat.

pub mod deployment;
pub mod keeper;

pub use deployment::{DeploymentConfig, KeeperSettings};
pub use keeper::{HeartbeatReport, Keeper};
