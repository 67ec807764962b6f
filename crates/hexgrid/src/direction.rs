//! The six hex-aligned directions.
//!
//! Directions are numbered clockwise starting from north, which is also the
//! meaning of a ship's `facing` value `0..=5`:
//!
//! | index | direction | cube delta   |
//! |-------|-----------|--------------|
//! | 0     | North     | ( 0, +1, -1) |
//! | 1     | NorthEast | (+1,  0, -1) |
//! | 2     | SouthEast | (+1, -1,  0) |
//! | 3     | South     | ( 0, -1, +1) |
//! | 4     | SouthWest | (-1,  0, +1) |
//! | 5     | NorthWest | (-1, +1,  0) |

use std::fmt;

use bitflags::bitflags;
use serde::{Deserialize, Serialize};

use crate::cube::Cube;

/// One of the six hex-aligned headings.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum Direction {
    /// Straight up the column
    North,
    /// Up and to the right
    NorthEast,
    /// Down and to the right
    SouthEast,
    /// Straight down the column
    South,
    /// Down and to the left
    SouthWest,
    /// Up and to the left
    NorthWest,
}

impl Direction {
    /// All directions in clockwise index order.
    pub const ALL: [Self; 6] = [
        Self::North,
        Self::NorthEast,
        Self::SouthEast,
        Self::South,
        Self::SouthWest,
        Self::NorthWest,
    ];

    /// Returns the direction for a facing index, or `None` outside `0..=5`.
    #[must_use]
    pub const fn from_index(index: u8) -> Option<Self> {
        match index {
            0 => Some(Self::North),
            1 => Some(Self::NorthEast),
            2 => Some(Self::SouthEast),
            3 => Some(Self::South),
            4 => Some(Self::SouthWest),
            5 => Some(Self::NorthWest),
            _ => None,
        }
    }

    /// Returns the facing index `0..=5`.
    #[must_use]
    pub const fn index(self) -> u8 {
        self as u8
    }

    /// Unit step in cube coordinates.
    #[must_use]
    pub const fn cube(self) -> Cube {
        match self {
            Self::North => Cube::new(0, -1),
            Self::NorthEast => Cube::new(1, -1),
            Self::SouthEast => Cube::new(1, 0),
            Self::South => Cube::new(0, 1),
            Self::SouthWest => Cube::new(-1, 1),
            Self::NorthWest => Cube::new(-1, 0),
        }
    }

    /// Rotates clockwise by `steps` sixths of a turn (negative is counter-clockwise).
    #[must_use]
    pub fn rotated(self, steps: i32) -> Self {
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let index = (i32::from(self.index()) + steps).rem_euclid(6) as u8;
        Self::ALL[usize::from(index)]
    }

    /// Clockwise offset of `self` from `reference`, in `0..=5`.
    #[must_use]
    pub const fn relative_to(self, reference: Self) -> u8 {
        (self.index() + 6 - reference.index()) % 6
    }

    /// The direction pointing the other way.
    #[must_use]
    pub fn opposite(self) -> Self {
        self.rotated(3)
    }

    /// The single-member set containing this direction.
    #[must_use]
    pub const fn as_set(self) -> DirectionSet {
        DirectionSet::from_bits_truncate(1 << self.index())
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::North => "N",
            Self::NorthEast => "NE",
            Self::SouthEast => "SE",
            Self::South => "S",
            Self::SouthWest => "SW",
            Self::NorthWest => "NW",
        };
        write!(f, "{name}")
    }
}

impl TryFrom<u8> for Direction {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Self::from_index(value).ok_or_else(|| format!("facing must be 0..=5, got {value}"))
    }
}

impl From<Direction> for u8 {
    fn from(direction: Direction) -> Self {
        direction.index()
    }
}

bitflags! {
    /// A set of absolute directions, one bit per [`Direction`] index.
    #[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
    pub struct DirectionSet: u8 {
        /// North
        const NORTH = 1 << 0;
        /// North-east
        const NORTH_EAST = 1 << 1;
        /// South-east
        const SOUTH_EAST = 1 << 2;
        /// South
        const SOUTH = 1 << 3;
        /// South-west
        const SOUTH_WEST = 1 << 4;
        /// North-west
        const NORTH_WEST = 1 << 5;
    }
}

impl DirectionSet {
    /// Iterates the member directions in index order.
    pub fn directions(self) -> impl Iterator<Item = Direction> {
        Direction::ALL
            .into_iter()
            .filter(move |d| self.contains(d.as_set()))
    }
}

/// The sector(s) a cube delta points into.
///
/// Returns every direction whose unit vector has the largest dot product
/// with `delta`: one direction for a target inside a sector, two when the
/// target lies exactly on the boundary between sectors, and the empty set
/// for a zero delta.
#[must_use]
pub fn bearing(delta: Cube) -> DirectionSet {
    if delta == Cube::ZERO {
        return DirectionSet::empty();
    }
    let best = Direction::ALL
        .iter()
        .map(|d| delta.dot(d.cube()))
        .max()
        .unwrap_or_default();
    Direction::ALL
        .into_iter()
        .filter(|d| delta.dot(d.cube()) == best)
        .fold(DirectionSet::empty(), |set, d| set | d.as_set())
}
