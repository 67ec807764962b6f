//! Map bounds.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::coord::Hex;

/// Errors from constructing a map.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MapError {
    /// Width or height was zero.
    #[error("map dimensions must be non-zero (got {width}x{height})")]
    EmptyDimension {
        /// Requested width
        width: u32,
        /// Requested height
        height: u32,
    },
    /// Width or height does not fit the signed coordinate space.
    #[error("map dimensions {width}x{height} exceed the coordinate range")]
    TooLarge {
        /// Requested width
        width: u32,
        /// Requested height
        height: u32,
    },
}

/// Rectangular map bounds: columns `0..width`, rows `0..height`.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "RawMapSize")]
pub struct MapSize {
    width: u32,
    height: u32,
}

#[derive(Deserialize)]
struct RawMapSize {
    width: u32,
    height: u32,
}

impl TryFrom<RawMapSize> for MapSize {
    type Error = MapError;

    fn try_from(raw: RawMapSize) -> Result<Self, Self::Error> {
        Self::new(raw.width, raw.height)
    }
}

impl MapSize {
    /// Creates map bounds.
    ///
    /// # Errors
    ///
    /// Returns [`MapError`] if either dimension is zero or larger than `i32::MAX`.
    pub fn new(width: u32, height: u32) -> Result<Self, MapError> {
        if width == 0 || height == 0 {
            return Err(MapError::EmptyDimension { width, height });
        }
        if i32::try_from(width).is_err() || i32::try_from(height).is_err() {
            return Err(MapError::TooLarge { width, height });
        }
        Ok(Self { width, height })
    }

    /// Number of columns.
    #[must_use]
    pub const fn width(&self) -> u32 {
        self.width
    }

    /// Number of rows.
    #[must_use]
    pub const fn height(&self) -> u32 {
        self.height
    }

    /// Returns true if `cell` lies on the map.
    #[must_use]
    pub fn contains(&self, cell: Hex) -> bool {
        u32::try_from(cell.col).is_ok_and(|c| c < self.width)
            && u32::try_from(cell.row).is_ok_and(|r| r < self.height)
    }

    /// The on-map cells adjacent to `cell`, in direction index order.
    ///
    /// Interior cells have six neighbors; edge and corner cells fewer.
    #[must_use]
    pub fn neighbors(&self, cell: Hex) -> Vec<Hex> {
        cell.neighbors()
            .into_iter()
            .filter(|n| self.contains(*n))
            .collect()
    }

    /// One greedy step from `from` toward `to`.
    ///
    /// Picks the on-map neighbor closest to `to`, breaking ties by direction
    /// index. Returns `None` if already there or if no neighbor gets closer.
    #[must_use]
    pub fn step_toward(&self, from: Hex, to: Hex) -> Option<Hex> {
        let current = from.distance(to);
        if current == 0 {
            return None;
        }
        self.neighbors(from)
            .into_iter()
            .map(|n| (n.distance(to), n))
            .filter(|(d, _)| *d < current)
            .min_by_key(|(d, _)| *d)
            .map(|(_, n)| n)
    }

    /// Iterates every cell, column-major.
    pub fn cells(&self) -> impl Iterator<Item = Hex> + '_ {
        #[allow(clippy::cast_possible_wrap)]
        let (w, h) = (self.width as i32, self.height as i32);
        (0..w).flat_map(move |col| (0..h).map(move |row| Hex::new(col, row)))
    }
}
