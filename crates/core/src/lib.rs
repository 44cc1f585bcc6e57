//! Core types and utilities for the price oracle
//!
//! This crate provides shared types used across all components:
//! - Asset, price and provider component types
//! - Feed and strategy provider capabilities
//! - Error taxonomy
//! - Fixed-point math
//! - Configuration, clock, access control and events

pub mod types;
pub mod assets;
pub mod providers;
pub mod access;
pub mod clock;
pub mod events;
pub mod math;
pub mod config;
pub mod errors;

pub use types::*;
pub use assets::*;
pub use providers::*;
pub use access::*;
pub use clock::*;
pub use events::*;
pub use config::*;
pub use errors::*;
