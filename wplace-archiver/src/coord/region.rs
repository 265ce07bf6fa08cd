//! Rectangular tile regions for fixed-area archiving.

use std::str::FromStr;

use super::types::{CoordError, TilePosition};

/// Inclusive rectangle of tile positions.
///
/// Corners are normalized on construction so `min` is the top-left tile and
/// `max` the bottom-right one. Regions do not wrap across the map edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TileRegion {
    min: TilePosition,
    max: TilePosition,
}

impl TileRegion {
    /// Creates a region spanning both corners (inclusive).
    pub fn new(a: TilePosition, b: TilePosition) -> Self {
        Self {
            min: TilePosition::wrap(a.x().min(b.x()), a.y().min(b.y())),
            max: TilePosition::wrap(a.x().max(b.x()), a.y().max(b.y())),
        }
    }

    /// Top-left corner.
    pub fn min(&self) -> TilePosition {
        self.min
    }

    /// Bottom-right corner.
    pub fn max(&self) -> TilePosition {
        self.max
    }

    /// Width in tiles.
    pub fn width(&self) -> u64 {
        (self.max.x() - self.min.x() + 1) as u64
    }

    /// Height in tiles.
    pub fn height(&self) -> u64 {
        (self.max.y() - self.min.y() + 1) as u64
    }

    /// Number of tiles in the region.
    pub fn len(&self) -> u64 {
        self.width() * self.height()
    }

    /// Always false: a region holds at least one tile.
    pub fn is_empty(&self) -> bool {
        false
    }

    /// Returns true if the position lies inside the region.
    pub fn contains(&self, position: &TilePosition) -> bool {
        (self.min.x()..=self.max.x()).contains(&position.x())
            && (self.min.y()..=self.max.y()).contains(&position.y())
    }

    /// Iterates the region in row-major order.
    pub fn positions(&self) -> impl Iterator<Item = TilePosition> + Send + 'static {
        let (min, max) = (self.min, self.max);
        (min.y()..=max.y())
            .flat_map(move |y| (min.x()..=max.x()).map(move |x| TilePosition::wrap(x, y)))
    }
}

impl FromStr for TileRegion {
    type Err = CoordError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (a, b) = s
            .split_once(':')
            .ok_or_else(|| CoordError::RegionFormat(s.to_string()))?;
        let a: TilePosition = a
            .parse()
            .map_err(|_| CoordError::RegionFormat(s.to_string()))?;
        let b: TilePosition = b
            .parse()
            .map_err(|_| CoordError::RegionFormat(s.to_string()))?;
        Ok(Self::new(a, b))
    }
}
