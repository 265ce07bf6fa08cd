//! Tile space
//!
//! Addressing and arithmetic for tiles on the finite, wrapping wplace canvas
//! grid, plus the neighbor kernel used by flood discovery and rectangular
//! regions used by fixed-area archiving.

mod kernel;
mod region;
mod types;

pub use kernel::{DiscoveryKernel, MAX_KERNEL_REACH};
pub use region::TileRegion;
pub use types::{wrap_component, CoordError, TileOffset, TilePosition, MAP_SIZE};

/// Parses a canonical `x,y` string into a wrapped tile position.
#[inline]
pub fn parse_position(s: &str) -> Result<TilePosition, CoordError> {
    s.parse()
}

/// Euclidean distance between two positions, in tiles.
#[inline]
pub fn distance(a: &TilePosition, b: &TilePosition) -> f64 {
    a.distance(b)
}
