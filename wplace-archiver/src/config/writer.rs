//! INI serialization logic for converting `ConfigFile` → INI string.

use std::path::Path;

use super::settings::ConfigFile;

fn path_to_string(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}

/// Convert a `ConfigFile` to a commented INI string for saving.
pub(super) fn to_config_string(config: &ConfigFile) -> String {
    let network = &config.network;
    let flood = &config.flood;
    let output = &config.output;
    let logging = &config.logging;

    format!(
        r#"[network]
; Maximum request starts within any one-second window
requests_per_second = {}
; Maximum requests in flight at once
request_concurrency = {}
; Retry backoff: delay = starting_delay_ms * backoff_factor^attempt, capped at max_delay_ms
; Requests are aborted after max_delay_ms + 5 seconds without a response
starting_delay_ms = {}
backoff_factor = {}
max_delay_ms = {}
; Region mode stops pulling new tiles while this many requests wait for dispatch
backpressure_target = {}
; Tile endpoint; {{x}} and {{y}} are replaced with the tile column and row
tile_url = {}

[flood]
; Seed tile as x,y (0-2047 on each axis)
starting_tile = {}
; Maximum distance in tiles from the seed tile
search_radius = {}
; Neighbor radius examined around a tile with content (1.5 = the 8 surrounding tiles)
tolerance_radius = {}
; Minimum non-transparent pixels for a tile to expand its neighbors
pixel_threshold = {}
; Tiles scheduled at once
concurrency = {}

[output]
; Each cycle writes into <directory>/<UTC timestamp>/
directory = {}
; Number of archive cycles (0 = run forever)
cycles = {}
; Seconds between cycle starts
interval_secs = {}

[logging]
directory = {}
file = {}
; Also log to stdout
stdout = {}
"#,
        network.requests_per_second,
        network.request_concurrency,
        network.starting_delay_ms,
        network.backoff_factor,
        network.max_delay_ms,
        network.backpressure_target,
        network.tile_url.as_str(),
        flood.starting_tile,
        flood.search_radius,
        flood.tolerance_radius,
        flood.pixel_threshold,
        flood.concurrency,
        path_to_string(&output.directory),
        output.cycles,
        output.interval_secs,
        path_to_string(&logging.directory),
        logging.file,
        logging.stdout,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_contains_every_section() {
        let content = to_config_string(&ConfigFile::default());
        for section in ["[network]", "[flood]", "[output]", "[logging]"] {
            assert!(content.contains(section), "missing {}", section);
        }
        assert!(content.contains("starting_tile = 1024,1024"));
        assert!(content.contains("tolerance_radius = 1.5"));
        assert!(content.contains("tile_url = https://backend.wplace.live/files/s0/tiles/{x}/{y}.png"));
    }
}
