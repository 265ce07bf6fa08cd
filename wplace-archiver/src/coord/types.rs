//! Tile position type definitions

use std::fmt;
use std::ops::Sub;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;

/// Number of tiles along each axis of the wplace canvas.
///
/// The canvas is a 2048×2048 grid of 1000×1000 pixel tiles (zoom 11 in
/// slippy-map terms). Positions wrap around at this boundary.
pub const MAP_SIZE: i64 = 2048;

/// Errors that can occur when reading tile addresses.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CoordError {
    /// Input is not of the form `x,y`.
    #[error("Invalid tile position '{0}': expected two integers separated by a comma")]
    Format(String),

    /// Input is not of the form `x1,y1:x2,y2`.
    #[error("Invalid tile region '{0}': expected 'x1,y1:x2,y2'")]
    RegionFormat(String),
}

/// Wraps a single component into `[0, MAP_SIZE)`.
///
/// Uses euclidean remainder so that values past either edge wrap
/// proportionally (`MAP_SIZE + 5` becomes `5`, `-1` becomes `MAP_SIZE - 1`).
#[inline]
pub fn wrap_component(value: i64) -> i64 {
    value.rem_euclid(MAP_SIZE)
}

/// Address of a tile on the wrapping canvas grid.
///
/// Both components are always in `[0, MAP_SIZE)`. The only way to build a
/// position is through [`TilePosition::wrap`] (or parsing, which wraps too),
/// so the invariant holds for every value of this type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TilePosition {
    x: i64,
    y: i64,
}

impl TilePosition {
    /// Creates a position, wrapping both components into map bounds.
    #[inline]
    pub fn wrap(x: i64, y: i64) -> Self {
        Self {
            x: wrap_component(x),
            y: wrap_component(y),
        }
    }

    /// X coordinate (west to east).
    #[inline]
    pub fn x(&self) -> i64 {
        self.x
    }

    /// Y coordinate (north to south).
    #[inline]
    pub fn y(&self) -> i64 {
        self.y
    }

    /// Returns the position shifted by `(dx, dy)`, wrapped into map bounds.
    #[inline]
    pub fn offset(&self, dx: i64, dy: i64) -> Self {
        Self::wrap(self.x + dx, self.y + dy)
    }

    /// Returns the position shifted by a relative offset.
    #[inline]
    pub fn translate(&self, offset: TileOffset) -> Self {
        self.offset(offset.dx, offset.dy)
    }

    /// Euclidean distance to another position, in tiles.
    ///
    /// Measured on the wrapped coordinates; the distance does not take the
    /// short way around the map edge.
    #[inline]
    pub fn distance(&self, other: &TilePosition) -> f64 {
        (*self - *other).length()
    }
}

impl fmt::Display for TilePosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{}", self.x, self.y)
    }
}

impl FromStr for TilePosition {
    type Err = CoordError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (x, y) = s
            .split_once(',')
            .ok_or_else(|| CoordError::Format(s.to_string()))?;

        let parse = |part: &str| -> Result<i64, CoordError> {
            // i64::from_str accepts a leading '+', the canonical form does not.
            if part.starts_with('+') {
                return Err(CoordError::Format(s.to_string()));
            }
            part.parse::<i64>()
                .map_err(|_| CoordError::Format(s.to_string()))
        };

        Ok(Self::wrap(parse(x)?, parse(y)?))
    }
}

impl Sub for TilePosition {
    type Output = TileOffset;

    fn sub(self, rhs: Self) -> Self::Output {
        TileOffset::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl Serialize for TilePosition {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for TilePosition {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// Relative vector between two tile positions.
///
/// Unlike [`TilePosition`] the components are not wrapped, so an offset can
/// point in any direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TileOffset {
    /// Horizontal component.
    pub dx: i64,
    /// Vertical component.
    pub dy: i64,
}

impl TileOffset {
    /// Creates a new offset.
    pub const fn new(dx: i64, dy: i64) -> Self {
        Self { dx, dy }
    }

    /// Euclidean length of the offset.
    #[inline]
    pub fn length(&self) -> f64 {
        ((self.dx * self.dx + self.dy * self.dy) as f64).sqrt()
    }
}

impl fmt::Display for TileOffset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({:+}, {:+})", self.dx, self.dy)
    }
}
