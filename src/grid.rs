// src/grid.rs
//! The bounded build region: an integer cell grid centered on the world origin.

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

/// Static description of the buildable volume. Immutable after world creation;
/// placement reads it for validity checks, setup reads it to size the ground.
///
/// Cells span the region symmetrically in X/Z and upward from y = 0.
#[derive(Resource, Clone, Copy, Debug, Serialize, Deserialize)]
pub struct VolumeGridBounds {
    /// Cell counts per axis.
    pub dims: IVec3,
    /// Edge length of one cubic cell, in meters.
    pub cell_size: f32,
}

impl Default for VolumeGridBounds {
    fn default() -> Self {
        Self { dims: IVec3::new(64, 32, 64), cell_size: 0.5 }
    }
}

impl VolumeGridBounds {
    /// Total world-space extent per axis.
    pub fn extent(&self) -> Vec3 {
        self.dims.as_vec3() * self.cell_size
    }

    /// Lowest corner of the region (X/Z symmetric, floor at y = 0).
    pub fn world_min(&self) -> Vec3 {
        let e = self.extent();
        Vec3::new(-e.x * 0.5, 0.0, -e.z * 0.5)
    }

    /// Highest corner of the region.
    pub fn world_max(&self) -> Vec3 {
        let e = self.extent();
        Vec3::new(e.x * 0.5, e.y, e.z * 0.5)
    }

    /// Whether a world-space point lies inside the buildable region.
    pub fn contains(&self, p: Vec3) -> bool {
        let min = self.world_min();
        let max = self.world_max();
        p.x >= min.x && p.x <= max.x
            && p.y >= min.y && p.y <= max.y
            && p.z >= min.z && p.z <= max.z
    }

    /// Whether an axis-aligned box (min/max corners) fits fully inside the region.
    pub fn contains_box(&self, box_min: Vec3, box_max: Vec3) -> bool {
        self.contains(box_min) && self.contains(box_max)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn origin_is_inside() {
        let grid = VolumeGridBounds::default();
        assert!(grid.contains(Vec3::ZERO));
        assert!(grid.contains(Vec3::new(0.0, 1.0, 0.0)));
    }

    #[test]
    fn below_floor_is_outside() {
        let grid = VolumeGridBounds::default();
        assert!(!grid.contains(Vec3::new(0.0, -0.1, 0.0)));
    }

    #[test]
    fn extent_matches_dims() {
        let grid = VolumeGridBounds { dims: IVec3::new(10, 4, 20), cell_size: 0.5 };
        assert_eq!(grid.extent(), Vec3::new(5.0, 2.0, 10.0));
        assert_eq!(grid.world_min(), Vec3::new(-2.5, 0.0, -5.0));
        assert_eq!(grid.world_max(), Vec3::new(2.5, 2.0, 5.0));
    }
}
