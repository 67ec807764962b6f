//! Cube coordinates.
//!
//! A cube coordinate `(x, y, z)` always satisfies `x + y + z == 0`. The six
//! unit directions are the permutations of `(+1, -1, 0)`, and the plane
//! `x + y + z = 0` with the ordinary dot product is a similarity of the hex
//! layout, so angular questions reduce to integer dot products.

use std::ops::{Add, Sub};

use serde::{Deserialize, Serialize};

/// A cell in cube coordinates.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Cube {
    /// Column axis
    pub x: i32,
    /// Anti-diagonal axis (`-x - z`)
    pub y: i32,
    /// Row axis
    pub z: i32,
}

impl Cube {
    /// The origin cell.
    pub const ZERO: Self = Self { x: 0, y: 0, z: 0 };

    /// Creates a cube coordinate from its `x` and `z` components.
    ///
    /// `y` is derived so the `x + y + z == 0` constraint always holds.
    #[must_use]
    pub const fn new(x: i32, z: i32) -> Self {
        Self { x, y: -x - z, z }
    }

    /// Number of hex steps from the origin.
    #[must_use]
    pub const fn length(self) -> u32 {
        (self.x.unsigned_abs() + self.y.unsigned_abs() + self.z.unsigned_abs()) / 2
    }

    /// Number of hex steps between two cube coordinates.
    #[must_use]
    pub fn distance(self, other: Self) -> u32 {
        (self - other).length()
    }

    /// Integer dot product, used to rank directions by angular closeness.
    #[must_use]
    pub const fn dot(self, other: Self) -> i32 {
        self.x * other.x + self.y * other.y + self.z * other.z
    }
}

impl Add for Cube {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self {
            x: self.x + rhs.x,
            y: self.y + rhs.y,
            z: self.z + rhs.z,
        }
    }
}

impl Sub for Cube {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self {
        Self {
            x: self.x - rhs.x,
            y: self.y - rhs.y,
            z: self.z - rhs.z,
        }
    }
}
