//! Neighbor offset kernel for flood discovery.
//!
//! The kernel is the set of relative positions examined around a tile whose
//! content passed the pixel threshold. It holds every integer offset
//! `(dx, dy)` with `0 < sqrt(dx² + dy²) <= tolerance_radius`. The bound is
//! inclusive: with a radius of `1.5` the four diagonals (at `√2`) are part
//! of the kernel, and with a radius of exactly `1.0` the four orthogonal
//! neighbors are.

use super::types::{TileOffset, MAP_SIZE};

/// Largest useful kernel reach along either axis.
///
/// Offsets in `-MAX_KERNEL_REACH..=MAX_KERNEL_REACH` already cover every
/// column and row once positions wrap, so wider kernels only repeat targets.
pub const MAX_KERNEL_REACH: i64 = MAP_SIZE / 2;

/// Precomputed set of discovery offsets.
#[derive(Debug, Clone, PartialEq)]
pub struct DiscoveryKernel {
    offsets: Vec<TileOffset>,
}

impl DiscoveryKernel {
    /// Builds the kernel for the given tolerance radius.
    ///
    /// A radius below `1.0` yields an empty kernel (no neighbor is close
    /// enough), which stops discovery at the seed tile. The reach is capped
    /// at [`MAX_KERNEL_REACH`].
    pub fn new(tolerance_radius: f64) -> Self {
        let reach = if tolerance_radius.is_finite() && tolerance_radius > 0.0 {
            (tolerance_radius.floor() as i64).min(MAX_KERNEL_REACH)
        } else {
            0
        };

        let mut offsets = Vec::new();
        for dy in -reach..=reach {
            for dx in -reach..=reach {
                let offset = TileOffset::new(dx, dy);
                let length = offset.length();
                if length > 0.0 && length <= tolerance_radius {
                    offsets.push(offset);
                }
            }
        }

        Self { offsets }
    }

    /// The offsets in the kernel.
    pub fn offsets(&self) -> &[TileOffset] {
        &self.offsets
    }

    /// Number of offsets in the kernel.
    pub fn len(&self) -> usize {
        self.offsets.len()
    }

    /// Returns true if the kernel has no offsets.
    pub fn is_empty(&self) -> bool {
        self.offsets.is_empty()
    }

    /// Iterates over the offsets.
    pub fn iter(&self) -> impl Iterator<Item = &TileOffset> {
        self.offsets.iter()
    }
}
