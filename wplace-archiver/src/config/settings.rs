//! Typed configuration sections.

use std::path::PathBuf;
use std::time::Duration;

use crate::coord::TilePosition;
use crate::discovery::{
    DiscoveryConfig, DEFAULT_DISCOVERY_CONCURRENCY, DEFAULT_PIXEL_THRESHOLD,
    DEFAULT_SEARCH_RADIUS, DEFAULT_STARTING_X, DEFAULT_STARTING_Y, DEFAULT_TOLERANCE_RADIUS,
};
use crate::fetch::{
    BackoffPolicy, FetchQueueConfig, DEFAULT_BACKOFF_FACTOR, DEFAULT_BACKPRESSURE_TARGET,
    DEFAULT_MAX_DELAY_MS, DEFAULT_REQUESTS_PER_SECOND, DEFAULT_REQUEST_CONCURRENCY,
    DEFAULT_STARTING_DELAY_MS,
};
use crate::provider::TileUrlTemplate;

use super::file::config_directory;

/// Default archive output directory.
pub const DEFAULT_OUTPUT_DIR: &str = "archives";

/// Default number of archive cycles (0 runs forever).
pub const DEFAULT_CYCLES: u32 = 1;

/// Default time between cycle starts, in seconds.
pub const DEFAULT_INTERVAL_SECS: u64 = 3600;

/// Default log file name.
pub const DEFAULT_LOG_FILE: &str = "wplace-archiver.log";

/// Complete user configuration.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ConfigFile {
    pub network: NetworkSettings,
    pub flood: FloodSettings,
    pub output: OutputSettings,
    pub logging: LoggingSettings,
}

/// `[network]` section.
#[derive(Debug, Clone, PartialEq)]
pub struct NetworkSettings {
    pub requests_per_second: usize,
    pub request_concurrency: usize,
    pub starting_delay_ms: u64,
    pub backoff_factor: f64,
    pub max_delay_ms: u64,
    pub backpressure_target: usize,
    pub tile_url: TileUrlTemplate,
}

impl Default for NetworkSettings {
    fn default() -> Self {
        Self {
            requests_per_second: DEFAULT_REQUESTS_PER_SECOND,
            request_concurrency: DEFAULT_REQUEST_CONCURRENCY,
            starting_delay_ms: DEFAULT_STARTING_DELAY_MS,
            backoff_factor: DEFAULT_BACKOFF_FACTOR,
            max_delay_ms: DEFAULT_MAX_DELAY_MS,
            backpressure_target: DEFAULT_BACKPRESSURE_TARGET,
            tile_url: TileUrlTemplate::default(),
        }
    }
}

impl NetworkSettings {
    /// Backoff policy built from the delay settings.
    pub fn backoff(&self) -> BackoffPolicy {
        BackoffPolicy::new(
            Duration::from_millis(self.starting_delay_ms),
            self.backoff_factor,
            Duration::from_millis(self.max_delay_ms),
        )
    }

    /// Fetch queue configuration.
    pub fn fetch_queue_config(&self) -> FetchQueueConfig {
        FetchQueueConfig::default()
            .with_requests_per_second(self.requests_per_second)
            .with_request_concurrency(self.request_concurrency)
            .with_backoff(self.backoff())
            .with_backpressure_target(self.backpressure_target)
            .with_urls(self.tile_url.clone())
    }
}

/// `[flood]` section.
#[derive(Debug, Clone, PartialEq)]
pub struct FloodSettings {
    pub starting_tile: TilePosition,
    pub search_radius: f64,
    pub tolerance_radius: f64,
    pub pixel_threshold: u32,
    pub concurrency: usize,
}

impl Default for FloodSettings {
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

impl FloodSettings {
    /// Discovery configuration.
    pub fn discovery_config(&self) -> DiscoveryConfig {
        DiscoveryConfig::new(self.starting_tile)
            .with_search_radius(self.search_radius)
            .with_tolerance_radius(self.tolerance_radius)
            .with_pixel_threshold(self.pixel_threshold)
            .with_concurrency(self.concurrency)
    }
}

/// `[output]` section.
#[derive(Debug, Clone, PartialEq)]
pub struct OutputSettings {
    pub directory: PathBuf,
    pub cycles: u32,
    pub interval_secs: u64,
}

impl Default for OutputSettings {
    fn default() -> Self {
        Self {
            directory: PathBuf::from(DEFAULT_OUTPUT_DIR),
            cycles: DEFAULT_CYCLES,
            interval_secs: DEFAULT_INTERVAL_SECS,
        }
    }
}

/// `[logging]` section.
#[derive(Debug, Clone, PartialEq)]
pub struct LoggingSettings {
    pub directory: PathBuf,
    pub file: String,
    pub stdout: bool,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            directory: config_directory().join("logs"),
            file: DEFAULT_LOG_FILE.to_string(),
            stdout: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::WPLACE_TILE_URL;

    #[test]
    fn test_network_defaults_match_queue_defaults() {
        let network = NetworkSettings::default();
        let queue = network.fetch_queue_config();
        assert_eq!(queue.requests_per_second, DEFAULT_REQUESTS_PER_SECOND);
        assert_eq!(queue.backoff, BackoffPolicy::default());
        assert_eq!(queue.urls.as_str(), WPLACE_TILE_URL);
    }

    #[test]
    fn test_flood_to_discovery_config() {
        let flood = FloodSettings {
            starting_tile: TilePosition::wrap(10, 20),
            search_radius: 5.0,
            tolerance_radius: 2.0,
            pixel_threshold: 3,
            concurrency: 7,
        };
        let config = flood.discovery_config();
        assert_eq!(config.starting_tile, TilePosition::wrap(10, 20));
        assert_eq!(config.search_radius, 5.0);
        assert_eq!(config.tolerance_radius, 2.0);
        assert_eq!(config.pixel_threshold, 3);
        assert_eq!(config.concurrency, 7);
    }
}
