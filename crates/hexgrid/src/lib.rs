//! # Hexgrid
//!
//! Pure, side-effect-free math over a hex battle map.
//!
//! Cells are addressed with offset `(col, row)` coordinates in the "odd-q"
//! layout: hexes are flat-topped and every odd column is shifted down by half
//! a row. All distance and adjacency questions are answered by converting to
//! cube coordinates, where the hex lattice becomes plain integer vector math.
//!
//! - [`Hex`]: an offset cell, with adjacency and distance
//! - [`Cube`]: the cube-coordinate form used for all geometry
//! - [`Direction`] / [`DirectionSet`]: the six hex-aligned headings
//! - [`MapSize`]: map bounds, bounded neighbors and greedy stepping
//! - [`IsoProjection`]: isometric pixel projection, for presentation only
//!
//! ## Quick Start
//!
//! ```
//! use hexgrid::{Hex, MapSize};
//!
//! let map = MapSize::new(20, 15).unwrap();
//! let a = Hex::new(5, 7);
//! let b = Hex::new(15, 7);
//!
//! assert_eq!(hexgrid::distance(a, b), hexgrid::distance(b, a));
//! assert_eq!(hexgrid::distance(a, a), 0);
//! assert!(map.neighbors(a).len() == 6);
//! assert!(map.neighbors(Hex::new(0, 0)).len() < 6);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod coord;
pub mod cube;
pub mod direction;
pub mod map;
pub mod projection;

pub use coord::Hex;
pub use cube::Cube;
pub use direction::{Direction, DirectionSet};
pub use map::{MapError, MapSize};
pub use projection::IsoProjection;

/// Hex-step distance between two cells.
///
/// Symmetric, and zero exactly when `a == b`.
#[must_use]
pub fn distance(a: Hex, b: Hex) -> u32 {
    a.distance(b)
}

/// All six cells adjacent to `cell`, ignoring map bounds.
///
/// Use [`MapSize::neighbors`] when only on-map cells are wanted.
#[must_use]
pub fn neighbors(cell: Hex) -> [Hex; 6] {
    cell.neighbors()
}
