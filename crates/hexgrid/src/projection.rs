//! Isometric pixel projection.
//!
//! This is a presentation helper for renderers. Gameplay code must never
//! consult it: range, adjacency and arcs are all answered in cube space.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::coord::Hex;

const SQRT_3: f32 = 1.732_050_8;

/// Fixed-angle isometric projection of flat-top hex centers.
///
/// A cell center is first laid out on a flat plane (`hex_size` is the
/// center-to-corner radius), then rotated by 45 degrees and squashed
/// vertically by `sin(tilt)`.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct IsoProjection {
    /// Hex radius in pixels
    pub hex_size: f32,
    /// Camera tilt in radians (30 degrees gives classic 2:1 isometric)
    pub tilt: f32,
    /// Pixel offset added after projection
    pub origin: Vec2,
}

impl Default for IsoProjection {
    fn default() -> Self {
        Self {
            hex_size: 32.0,
            tilt: std::f32::consts::FRAC_PI_6,
            origin: Vec2::ZERO,
        }
    }
}

impl IsoProjection {
    /// Flat (top-down) pixel center of a cell.
    #[must_use]
    pub fn flat_center(&self, cell: Hex) -> Vec2 {
        #[allow(clippy::cast_precision_loss)]
        let (col, row) = (cell.col as f32, cell.row as f32);
        let parity = if cell.col & 1 == 1 { 0.5 } else { 0.0 };
        Vec2::new(
            self.hex_size * 1.5 * col,
            self.hex_size * SQRT_3 * (row + parity),
        )
    }

    /// Isometric pixel position of a cell center.
    #[must_use]
    pub fn project(&self, cell: Hex) -> Vec2 {
        let flat = self.flat_center(cell);
        let (sin45, cos45) = std::f32::consts::FRAC_PI_4.sin_cos();
        let rotated = Vec2::new(
            flat.x * cos45 - flat.y * sin45,
            flat.x * sin45 + flat.y * cos45,
        );
        Vec2::new(rotated.x, rotated.y * self.tilt.sin()) + self.origin
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn origin_projects_to_offset() {
        let projection = IsoProjection {
            origin: Vec2::new(100.0, 50.0),
            ..IsoProjection::default()
        };
        let p = projection.project(Hex::new(0, 0));
        assert!((p - Vec2::new(100.0, 50.0)).length() < 1e-4);
    }

    #[test]
    fn odd_columns_are_shifted_down() {
        let projection = IsoProjection::default();
        let even = projection.flat_center(Hex::new(2, 0));
        let odd = projection.flat_center(Hex::new(3, 0));
        assert!(odd.y > even.y);
    }

    #[test]
    fn projection_is_vertically_squashed() {
        let projection = IsoProjection::default();
        let p = projection.project(Hex::new(0, 4));
        let flat = projection.flat_center(Hex::new(0, 4));
        // Rotation preserves length; the tilt then shrinks y by half.
        assert!(p.length() < flat.length());
    }
}
