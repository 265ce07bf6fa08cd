//! wplace tile endpoint.
//!
//! # URL Pattern
//!
//! `https://backend.wplace.live/files/s0/tiles/{x}/{y}.png`
//!
//! - X: column, 0 to 2047 (west to east)
//! - Y: row, 0 to 2047 (north to south)
//! - No authentication required
//! - Tiles that have never been painted return HTTP 404

use crate::coord::TilePosition;

/// Default tile URL template.
pub const WPLACE_TILE_URL: &str = "https://backend.wplace.live/files/s0/tiles/{x}/{y}.png";

/// Builds tile URLs from a template containing `{x}` and `{y}` placeholders.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TileUrlTemplate {
    template: String,
}

impl TileUrlTemplate {
    /// Creates a template. Returns `None` unless both placeholders are present.
    pub fn new(template: impl Into<String>) -> Option<Self> {
        let template = template.into();
        if template.contains("{x}") && template.contains("{y}") {
            Some(Self { template })
        } else {
            None
        }
    }

    /// The raw template string.
    pub fn as_str(&self) -> &str {
        &self.template
    }

    /// Builds the URL for a tile.
    pub fn url_for(&self, position: &TilePosition) -> String {
        self.template
            .replace("{x}", &position.x().to_string())
            .replace("{y}", &position.y().to_string())
    }
}

impl Default for TileUrlTemplate {
    fn default() -> Self {
        Self {
            template: WPLACE_TILE_URL.to_string(),
        }
    }
}
