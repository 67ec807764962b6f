//! Offset `(col, row)` cell coordinates.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::cube::Cube;
use crate::direction::{bearing, Direction, DirectionSet};

/// A map cell in odd-q offset coordinates.
///
/// Odd columns are shifted down by half a row, so the row offsets of a
/// cell's neighbors depend on the parity of its column. Conversion to
/// [`Cube`] hides that asymmetry from every other calculation.
///
/// # Example
///
/// ```
/// use hexgrid::Hex;
///
/// let even = Hex::new(2, 3);
/// let odd = Hex::new(3, 3);
///
/// // The north-east neighbor of an even column sits one row up,
/// // the one of an odd column stays on the same row.
/// assert_eq!(even.neighbor(hexgrid::Direction::NorthEast), Hex::new(3, 2));
/// assert_eq!(odd.neighbor(hexgrid::Direction::NorthEast), Hex::new(4, 3));
/// ```
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
pub struct Hex {
    /// Column (x)
    pub col: i32,
    /// Row (y)
    pub row: i32,
}

impl Hex {
    /// Creates a cell from column and row.
    #[must_use]
    pub const fn new(col: i32, row: i32) -> Self {
        Self { col, row }
    }

    /// Converts to cube coordinates.
    #[must_use]
    pub const fn to_cube(self) -> Cube {
        let x = self.col;
        let z = self.row - (self.col - (self.col & 1)) / 2;
        Cube::new(x, z)
    }

    /// Converts from cube coordinates.
    #[must_use]
    pub const fn from_cube(cube: Cube) -> Self {
        let col = cube.x;
        let row = cube.z + (cube.x - (cube.x & 1)) / 2;
        Self { col, row }
    }

    /// The adjacent cell in `direction`.
    #[must_use]
    pub fn neighbor(self, direction: Direction) -> Self {
        Self::from_cube(self.to_cube() + direction.cube())
    }

    /// All six adjacent cells, in direction index order.
    #[must_use]
    pub fn neighbors(self) -> [Self; 6] {
        Direction::ALL.map(|d| self.neighbor(d))
    }

    /// Hex-step distance to `other`.
    #[must_use]
    pub fn distance(self, other: Self) -> u32 {
        self.to_cube().distance(other.to_cube())
    }

    /// Absolute direction(s) from `self` toward `other`.
    ///
    /// See [`bearing`](crate::direction::bearing) for boundary handling.
    #[must_use]
    pub fn bearing_to(self, other: Self) -> DirectionSet {
        bearing(other.to_cube() - self.to_cube())
    }
}

impl fmt::Debug for Hex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Hex({}, {})", self.col, self.row)
    }
}

impl fmt::Display for Hex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.col, self.row)
    }
}

impl From<(i32, i32)> for Hex {
    fn from((col, row): (i32, i32)) -> Self {
        Self::new(col, row)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    mod conversion_tests {
        use super::*;

        #[test]
        fn cube_round_trip_even_and_odd_columns() {
            for col in -4..=4 {
                for row in -4..=4 {
                    let hex = Hex::new(col, row);
                    assert_eq!(Hex::from_cube(hex.to_cube()), hex);
                }
            }
        }

        #[test]
        fn origin_maps_to_origin() {
            assert_eq!(Hex::new(0, 0).to_cube(), Cube::ZERO);
        }
    }

    mod neighbor_tests {
        use super::*;

        #[test]
        fn even_column_neighbors() {
            let hex = Hex::new(2, 2);
            assert_eq!(
                hex.neighbors(),
                [
                    Hex::new(2, 1),
                    Hex::new(3, 1),
                    Hex::new(3, 2),
                    Hex::new(2, 3),
                    Hex::new(1, 2),
                    Hex::new(1, 1),
                ]
            );
        }

        #[test]
        fn odd_column_neighbors() {
            let hex = Hex::new(3, 2);
            assert_eq!(
                hex.neighbors(),
                [
                    Hex::new(3, 1),
                    Hex::new(4, 2),
                    Hex::new(4, 3),
                    Hex::new(3, 3),
                    Hex::new(2, 3),
                    Hex::new(2, 2),
                ]
            );
        }

        #[test]
        fn every_neighbor_is_one_step_away() {
            for hex in [Hex::new(0, 0), Hex::new(5, 7), Hex::new(-3, 2)] {
                for n in hex.neighbors() {
                    assert_eq!(hex.distance(n), 1);
                }
            }
        }
    }

    mod distance_tests {
        use super::*;

        #[test]
        fn straight_row_distance() {
            // Along a row, each column costs one step.
            assert_eq!(Hex::new(5, 7).distance(Hex::new(15, 7)), 10);
        }

        #[test]
        fn straight_column_distance() {
            assert_eq!(Hex::new(4, 0).distance(Hex::new(4, 9)), 9);
        }

        proptest! {
            #[test]
            fn distance_is_symmetric(a in (-50i32..50, -50i32..50), b in (-50i32..50, -50i32..50)) {
                let a = Hex::from(a);
                let b = Hex::from(b);
                prop_assert_eq!(a.distance(b), b.distance(a));
            }

            #[test]
            fn distance_to_self_is_zero(a in (-50i32..50, -50i32..50)) {
                let a = Hex::from(a);
                prop_assert_eq!(a.distance(a), 0);
            }

            #[test]
            fn triangle_inequality(
                a in (-30i32..30, -30i32..30),
                b in (-30i32..30, -30i32..30),
                c in (-30i32..30, -30i32..30),
            ) {
                let (a, b, c) = (Hex::from(a), Hex::from(b), Hex::from(c));
                prop_assert!(a.distance(c) <= a.distance(b) + b.distance(c));
            }
        }
    }

    mod bearing_tests {
        use super::*;

        #[test]
        fn bearing_to_neighbor_matches_direction() {
            let hex = Hex::new(3, 4);
            for d in Direction::ALL {
                assert_eq!(hex.bearing_to(hex.neighbor(d)), d.as_set());
            }
        }

        #[test]
        fn bearing_along_row_is_boundary() {
            // Due east on a flat-top grid sits between NE and SE.
            let bearing = Hex::new(5, 7).bearing_to(Hex::new(15, 7));
            assert!(bearing.contains(DirectionSet::NORTH_EAST | DirectionSet::SOUTH_EAST));
        }
    }
}
