//! Flood discovery
//!
//! Archives an area that is not known in advance by growing it outward from
//! a seed tile. Each fetched tile with at least `pixel_threshold` opaque
//! pixels admits its kernel neighbors, as long as they lie within
//! `search_radius` of the seed and have not been seen before. The run ends
//! when the frontier is exhausted.
//!
//! ```ignore
//! use wplace_archiver::discovery::{DiscoveryConfig, DiscoveryEngine};
//!
//! let engine = DiscoveryEngine::new(DiscoveryConfig::new(seed).with_search_radius(40.0))?;
//! let summary = engine.run(&queue, &tile_writer, &error_log).await?;
//! ```

mod config;
mod engine;
mod error;
mod frontier;
mod pixels;

pub use config::{
    DiscoveryConfig, DEFAULT_DISCOVERY_CONCURRENCY, DEFAULT_PIXEL_THRESHOLD,
    DEFAULT_SEARCH_RADIUS, DEFAULT_STARTING_X, DEFAULT_STARTING_Y, DEFAULT_TOLERANCE_RADIUS,
};
pub use engine::{DiscoveryEngine, DiscoverySummary};
pub use error::DiscoveryError;
pub use frontier::{Frontier, FrontierCounts, TileState};
pub use pixels::{count_opaque_pixels, count_opaque_pixels_in_image};
