// src/volume/box_corner.rs
//! Corner-point cuboid: one control point drives a ground-anchored box.
//! The interior partition template reuses this generator unchanged.

use bevy::prelude::*;

use crate::bounds::Obb;
use crate::volume::core::SizeClamp;

/// Derived size from a single corner control point. The point marks a corner
/// of the top face, so X/Z double (symmetric about the origin) while Y is
/// taken as-is.
pub fn corner_box_size(point: Vec3, clamp: &SizeClamp) -> Vec3 {
    clamp.apply(Vec3::new(point.x.abs() * 2.0, point.y.abs(), point.z.abs() * 2.0))
}

/// Collision box for the derived size: centered at half height, full extents.
pub fn corner_box_collider(size: Vec3) -> Obb {
    Obb::axis_aligned(Vec3::new(0.0, size.y * 0.5, 0.0), size * 0.5)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn control_point_2_3_2_gives_4_3_4() {
        let clamp = SizeClamp::new(Vec3::ONE, Vec3::splat(20.0));
        let size = corner_box_size(Vec3::new(2.0, 3.0, 2.0), &clamp);
        assert_eq!(size, Vec3::new(4.0, 3.0, 4.0));
    }

    #[test]
    fn negative_components_behave_like_positive() {
        let clamp = SizeClamp::new(Vec3::splat(0.1), Vec3::splat(50.0));
        let a = corner_box_size(Vec3::new(-2.0, -3.0, -2.0), &clamp);
        let b = corner_box_size(Vec3::new(2.0, 3.0, 2.0), &clamp);
        assert_eq!(a, b);
    }

    #[test]
    fn size_stays_inside_clamp() {
        let clamp = SizeClamp::new(Vec3::ONE, Vec3::new(20.0, 20.0, 20.0));
        for p in [
            Vec3::ZERO,
            Vec3::new(0.01, 0.01, 0.01),
            Vec3::new(100.0, 100.0, 100.0),
            Vec3::new(-40.0, 3.0, 0.2),
        ] {
            let s = corner_box_size(p, &clamp);
            assert!(s.cmpge(clamp.min).all(), "size {:?} under min", s);
            assert!(s.cmple(clamp.max).all(), "size {:?} over max", s);
        }
    }

    #[test]
    fn collider_is_centered_at_half_height() {
        let collider = corner_box_collider(Vec3::new(4.0, 3.0, 4.0));
        assert_eq!(collider.center, Vec3::new(0.0, 1.5, 0.0));
        assert_eq!(collider.half, Vec3::new(2.0, 1.5, 2.0));
    }
}
