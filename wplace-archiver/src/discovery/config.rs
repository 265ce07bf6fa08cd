//! Flood discovery configuration.

use crate::coord::{TilePosition, MAX_KERNEL_REACH};

use super::error::DiscoveryError;

// =============================================================================
// Defaults
// =============================================================================

/// Default seed column.
pub const DEFAULT_STARTING_X: i64 = 1024;

/// Default seed row.
pub const DEFAULT_STARTING_Y: i64 = 1024;

/// Default maximum distance from the seed, in tiles.
pub const DEFAULT_SEARCH_RADIUS: f64 = 50.0;

/// Default neighbor kernel radius. 1.5 selects the 8 surrounding tiles.
pub const DEFAULT_TOLERANCE_RADIUS: f64 = 1.5;

/// Default minimum opaque pixels for a tile to expand its neighbors.
pub const DEFAULT_PIXEL_THRESHOLD: u32 = 10;

/// Default number of concurrently scheduled fetch tasks.
pub const DEFAULT_DISCOVERY_CONCURRENCY: usize = 10;

/// Configuration for one flood discovery run.
#[derive(Debug, Clone, PartialEq)]
pub struct DiscoveryConfig {
    /// Seed tile, admitted unconditionally.
    pub starting_tile: TilePosition,

    /// Maximum Euclidean distance from the seed for admitted tiles.
    pub search_radius: f64,

    /// Radius of the neighbor kernel examined around a qualifying tile.
    pub tolerance_radius: f64,

    /// Minimum count of pixels with non-zero alpha needed to expand.
    pub pixel_threshold: u32,

    /// Maximum fetch tasks scheduled at once.
    pub concurrency: usize,
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            starting_tile: TilePosition::wrap(DEFAULT_STARTING_X, DEFAULT_STARTING_Y),
            search_radius: DEFAULT_SEARCH_RADIUS,
            tolerance_radius: DEFAULT_TOLERANCE_RADIUS,
            pixel_threshold: DEFAULT_PIXEL_THRESHOLD,
            concurrency: DEFAULT_DISCOVERY_CONCURRENCY,
        }
    }
}

impl DiscoveryConfig {
    /// Creates a default configuration seeded at `starting_tile`.
    pub fn new(starting_tile: TilePosition) -> Self {
        Self {
            starting_tile,
            ..Self::default()
        }
    }

    /// Sets the search radius.
    pub fn with_search_radius(mut self, radius: f64) -> Self {
        self.search_radius = radius;
        self
    }

    /// Sets the kernel radius.
    pub fn with_tolerance_radius(mut self, radius: f64) -> Self {
        self.tolerance_radius = radius;
        self
    }

    /// Sets the pixel threshold.
    pub fn with_pixel_threshold(mut self, threshold: u32) -> Self {
        self.pixel_threshold = threshold;
        self
    }

    /// Sets the scheduler width.
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency;
        self
    }

    /// Checks the configuration.
    pub fn validate(&self) -> Result<(), DiscoveryError> {
        if !self.search_radius.is_finite() || self.search_radius < 0.0 {
            return Err(DiscoveryError::InvalidConfig(format!(
                "search radius must be a finite non-negative number, got {}",
                self.search_radius
            )));
        }
        if !self.tolerance_radius.is_finite() || self.tolerance_radius < 0.0 {
            return Err(DiscoveryError::InvalidConfig(format!(
                "tolerance radius must be a finite non-negative number, got {}",
                self.tolerance_radius
            )));
        }
        if self.tolerance_radius > MAX_KERNEL_REACH as f64 {
            return Err(DiscoveryError::InvalidConfig(format!(
                "tolerance radius must be at most {}, got {}",
                MAX_KERNEL_REACH, self.tolerance_radius
            )));
        }
        if self.concurrency == 0 {
            return Err(DiscoveryError::InvalidConfig(
                "concurrency must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}
