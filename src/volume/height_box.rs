// src/volume/height_box.rs
//! Two-height cuboid: an XZ footprint point plus two independently draggable
//! height points. The taller of the two wins; mesh and collider otherwise
//! match the corner box.

use bevy::prelude::*;

use crate::bounds::{Aabb, Obb};
use crate::volume::core::SizeClamp;

/// Derived size: footprint X/Z double (symmetric about the origin), height is
/// the larger magnitude of the two height points.
pub fn height_box_size(footprint: Vec3, height_a: f32, height_b: f32, clamp: &SizeClamp) -> Vec3 {
    let h = height_a.abs().max(height_b.abs());
    clamp.apply(Vec3::new(footprint.x.abs() * 2.0, h, footprint.z.abs() * 2.0))
}

pub fn height_box_collider(size: Vec3) -> Obb {
    Obb::axis_aligned(Vec3::new(0.0, size.y * 0.5, 0.0), size * 0.5)
}

/// Bounds straight from the three control points, so selection works even
/// before the mesh has been regenerated.
pub fn height_box_bounds_from_points(
    footprint: Vec3,
    height_a: f32,
    height_b: f32,
    clamp: &SizeClamp,
) -> Aabb {
    let size = height_box_size(footprint, height_a, height_b, clamp);
    Aabb::new(Vec3::new(0.0, size.y * 0.5, 0.0), size * 0.5)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn taller_height_wins() {
        let clamp = SizeClamp::new(Vec3::splat(0.1), Vec3::splat(50.0));
        let s = height_box_size(Vec3::new(1.0, 0.0, 1.5), 0.5, 3.0, &clamp);
        assert_eq!(s, Vec3::new(2.0, 3.0, 3.0));
        let s = height_box_size(Vec3::new(1.0, 0.0, 1.5), -4.0, 3.0, &clamp);
        assert_eq!(s.y, 4.0);
    }

    #[test]
    fn bounds_come_from_points_not_mesh() {
        let clamp = SizeClamp::new(Vec3::splat(0.1), Vec3::splat(50.0));
        let b = height_box_bounds_from_points(Vec3::new(1.0, 0.0, 1.0), 2.0, 1.0, &clamp);
        assert_eq!(b.center, Vec3::new(0.0, 1.0, 0.0));
        assert_eq!(b.half, Vec3::new(1.0, 1.0, 1.0));
    }
}
