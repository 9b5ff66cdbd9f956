// src/bounds.rs
//! Axis-aligned and oriented bounding boxes, overlap tests, and the
//! child-bounds encapsulation path used for derived entity bounds.
//! Everything here is pure math; nothing mutates ECS state.

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

/// Axis-aligned box as center + half-extents.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Aabb {
    pub center: Vec3,
    pub half: Vec3,
}

impl Aabb {
    pub fn new(center: Vec3, half: Vec3) -> Self {
        Self { center, half }
    }

    pub fn from_min_max(min: Vec3, max: Vec3) -> Self {
        Self { center: (min + max) * 0.5, half: (max - min) * 0.5 }
    }

    /// Smallest box containing every point; `None` for an empty iterator.
    pub fn from_points(points: impl IntoIterator<Item = Vec3>) -> Option<Self> {
        let mut iter = points.into_iter();
        let first = iter.next()?;
        let (mut min, mut max) = (first, first);
        for p in iter {
            min = min.min(p);
            max = max.max(p);
        }
        Some(Self::from_min_max(min, max))
    }

    pub fn min(&self) -> Vec3 {
        self.center - self.half
    }

    pub fn max(&self) -> Vec3 {
        self.center + self.half
    }

    pub fn corners(&self) -> [Vec3; 8] {
        let (min, max) = (self.min(), self.max());
        [
            Vec3::new(min.x, min.y, min.z),
            Vec3::new(max.x, min.y, min.z),
            Vec3::new(min.x, max.y, min.z),
            Vec3::new(max.x, max.y, min.z),
            Vec3::new(min.x, min.y, max.z),
            Vec3::new(max.x, min.y, max.z),
            Vec3::new(min.x, max.y, max.z),
            Vec3::new(max.x, max.y, max.z),
        ]
    }

    /// Shrink every side by `margin` (floored at zero extent). Used to keep
    /// float noise from reporting touching boxes as overlapping.
    pub fn shrunk(&self, margin: f32) -> Self {
        Self { center: self.center, half: (self.half - Vec3::splat(margin)).max(Vec3::ZERO) }
    }

    /// Symmetric AABB overlap test.
    pub fn overlaps(&self, other: &Aabb) -> bool {
        let d = (self.center - other.center).abs();
        let reach = self.half + other.half;
        d.x < reach.x && d.y < reach.y && d.z < reach.z
    }

    pub fn union(&self, other: &Aabb) -> Self {
        Self::from_min_max(self.min().min(other.min()), self.max().max(other.max()))
    }
}

/// Oriented box: an AABB with an arbitrary rotation about its center.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Obb {
    pub center: Vec3,
    pub half: Vec3,
    pub rotation: Quat,
}

impl Obb {
    pub fn new(center: Vec3, half: Vec3, rotation: Quat) -> Self {
        Self { center, half, rotation }
    }

    /// Axis-aligned box with the same center and half-extents.
    pub fn axis_aligned(center: Vec3, half: Vec3) -> Self {
        Self { center, half, rotation: Quat::IDENTITY }
    }

    pub fn corners(&self) -> [Vec3; 8] {
        let local = Aabb::new(Vec3::ZERO, self.half).corners();
        local.map(|c| self.center + self.rotation * c)
    }

    /// Tight axis-aligned envelope. The extent along each world axis is the
    /// sum of the absolute projections of the rotated box axes.
    pub fn to_aabb(&self) -> Aabb {
        let ax = self.rotation * Vec3::X * self.half.x;
        let ay = self.rotation * Vec3::Y * self.half.y;
        let az = self.rotation * Vec3::Z * self.half.z;
        let reach = Vec3::new(
            ax.x.abs() + ay.x.abs() + az.x.abs(),
            ax.y.abs() + ay.y.abs() + az.y.abs(),
            ax.z.abs() + ay.z.abs() + az.z.abs(),
        );
        Aabb::new(self.center, reach)
    }

    /// Apply an entity's world transform to a local-space box.
    pub fn transformed_by(&self, translation: Vec3, rotation: Quat) -> Obb {
        Obb {
            center: translation + rotation * self.center,
            half: self.half,
            rotation: rotation * self.rotation,
        }
    }
}

/// Entity-local bounds, refreshed after geometry recompute. Identity rotation
/// for the box variants; walls carry a genuinely oriented box.
#[derive(Component, Clone, Copy, Debug)]
pub struct LocalBounds(pub Obb);

impl LocalBounds {
    pub fn unit() -> Self {
        LocalBounds(Obb::axis_aligned(Vec3::new(0.0, 0.5, 0.0), Vec3::splat(0.5)))
    }

    /// World-space axis-aligned envelope under the given transform.
    pub fn world_aabb(&self, translation: Vec3, rotation: Quat) -> Aabb {
        self.0.transformed_by(translation, rotation).to_aabb()
    }
}

/// Default bounds path: take world-space boxes of an entity's renderable
/// children, pull their 8 corners into the entity's local frame, and take the
/// encapsulating box. Handles rotated children correctly.
pub fn local_bounds_from_world_boxes(
    entity_translation: Vec3,
    entity_rotation: Quat,
    world_boxes: impl IntoIterator<Item = Aabb>,
) -> Option<Aabb> {
    let inv = entity_rotation.inverse();
    let corners = world_boxes
        .into_iter()
        .flat_map(|b| b.corners())
        .map(|c| inv * (c - entity_translation));
    Aabb::from_points(corners)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: Vec3, b: Vec3) -> bool {
        (a - b).length() < 1e-4
    }

    #[test]
    fn overlap_is_symmetric() {
        let a = Aabb::new(Vec3::ZERO, Vec3::splat(1.0));
        let b = Aabb::new(Vec3::new(1.5, 0.0, 0.0), Vec3::splat(1.0));
        let c = Aabb::new(Vec3::new(5.0, 0.0, 0.0), Vec3::splat(1.0));
        assert_eq!(a.overlaps(&b), b.overlaps(&a));
        assert!(a.overlaps(&b));
        assert_eq!(a.overlaps(&c), c.overlaps(&a));
        assert!(!a.overlaps(&c));
    }

    #[test]
    fn shrink_prevents_touch_false_positive() {
        let a = Aabb::new(Vec3::ZERO, Vec3::splat(1.0));
        let b = Aabb::new(Vec3::new(2.0, 0.0, 0.0), Vec3::splat(1.0));
        // exactly touching faces do not overlap once shrunk
        assert!(!a.shrunk(0.02).overlaps(&b.shrunk(0.02)));
    }

    #[test]
    fn rotated_obb_envelope_grows() {
        let obb = Obb::new(
            Vec3::ZERO,
            Vec3::new(2.0, 0.5, 0.5),
            Quat::from_rotation_y(std::f32::consts::FRAC_PI_4),
        );
        let aabb = obb.to_aabb();
        let expect = (2.0_f32 + 0.5) * std::f32::consts::FRAC_1_SQRT_2;
        assert!((aabb.half.x - expect).abs() < 1e-4, "got {}", aabb.half.x);
        assert!((aabb.half.z - expect).abs() < 1e-4);
        assert!((aabb.half.y - 0.5).abs() < 1e-4);
    }

    #[test]
    fn child_encapsulation_in_rotated_parent() {
        // parent rotated 90 deg about Y; child box sits 2m along world +X,
        // which is local -Z (or +Z depending on handedness) for the parent.
        let rot = Quat::from_rotation_y(std::f32::consts::FRAC_PI_2);
        let child = Aabb::new(Vec3::new(2.0, 0.0, 0.0), Vec3::splat(0.5));
        let local = local_bounds_from_world_boxes(Vec3::ZERO, rot, [child]).unwrap();
        assert!(approx(local.half, Vec3::splat(0.5)), "half {:?}", local.half);
        assert!((local.center.length() - 2.0).abs() < 1e-4);
        assert!(local.center.x.abs() < 1e-4, "center {:?}", local.center);
    }

    #[test]
    fn from_points_empty_is_none() {
        assert!(Aabb::from_points(std::iter::empty()).is_none());
    }
}
