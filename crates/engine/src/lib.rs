//! Price oracle engine
//!
//! Features:
//! - Per-asset feed, strategy and moving-average configuration
//! - Ring-buffer moving average with O(1) updates
//! - Current, cached and moving-average price resolution
//! - Parallel price storage with rayon
//! - Event notifications over a broadcast channel

pub mod observations;
pub mod providers;
pub mod registry;
pub mod resolver;
pub mod cache;
pub mod oracle;

pub use observations::{ObservationBuffer, MAX_OBSERVATIONS};
pub use providers::ProviderRegistry;
pub use registry::{AssetConfig, AssetDefinition, AssetRegistry, MovingAverageSettings};
pub use resolver::PriceResolver;
pub use cache::CacheController;
pub use oracle::{Oracle, EVENT_CAPACITY};
