// src/placement/session.rs
//! Ghost-placement session state and the snapping/validity math behind it.
//! The systems in `placement` drive this; everything here is testable without
//! an App.

use bevy::prelude::*;

use crate::bounds::{Aabb, Obb};
use crate::grid::VolumeGridBounds;
use crate::templates::TemplateId;

/// Live ghost-preview state between `begin` and `commit`/`cancel`.
#[derive(Clone, Copy, Debug)]
pub struct GhostState {
    pub template: TemplateId,
    /// Root ghost entity (pivot at the bottom center).
    pub ghost: Entity,
    /// Child entity carrying the preview mesh/material.
    pub ghost_visual: Entity,
    /// Local bounds cached once at `begin` so per-frame drags don't jitter.
    pub cached_local_bounds: Aabb,
    pub position: Vec3,
    pub yaw_deg: f32,
    pub valid: bool,
    /// True while the ghost is glued to another entity's face; grid-bounds
    /// validity is skipped in that state.
    pub surface_snapped: bool,
}

/// At most one placement runs at a time; beginning a new one cancels the old.
#[derive(Resource, Default)]
pub struct PlacementSession {
    pub active: Option<GhostState>,
}

/// Marker for the ghost preview entity (never collidable, never committed).
#[derive(Component)]
pub struct GhostPreview;

// ---------- Snapping ----------

/// Round X/Z to the nearest grid multiple; Y passes through.
pub fn snap_to_grid_xz(p: Vec3, grid: f32) -> Vec3 {
    if grid <= 0.0 {
        return p;
    }
    Vec3::new((p.x / grid).round() * grid, p.y, (p.z / grid).round() * grid)
}

/// Contact face from a hit normal: the dominant axis of the absolute normal
/// wins, ties broken with Y over X over Z.
pub fn contact_face_from_normal(n: Vec3) -> Vec3 {
    let a = n.abs();
    if a.y >= a.x && a.y >= a.z {
        Vec3::new(0.0, n.y.signum(), 0.0)
    } else if a.x >= a.z {
        Vec3::new(n.x.signum(), 0.0, 0.0)
    } else {
        Vec3::new(0.0, 0.0, n.z.signum())
    }
}

/// Pivot position that brings the bounds face opposite `face` flush to the
/// hit point, centered on the hit along the other two axes.
pub fn pivot_for_face(local: &Aabb, face: Vec3, hit: Vec3) -> Vec3 {
    let (min, max) = (local.min(), local.max());
    let mut pivot = hit - local.center;
    for axis in 0..3 {
        if face[axis] > 0.5 {
            pivot[axis] = hit[axis] - min[axis];
        } else if face[axis] < -0.5 {
            pivot[axis] = hit[axis] - max[axis];
        }
    }
    pivot
}

/// Ground placement: bottom face of the bounds sits at the hit point.
pub fn pivot_for_ground(local: &Aabb, hit: Vec3) -> Vec3 {
    pivot_for_face(local, Vec3::Y, hit)
}

// ---------- Validity ----------

/// World-space envelope of the cached bounds under the ghost pose.
pub fn ghost_world_aabb(local: &Aabb, position: Vec3, yaw_deg: f32) -> Aabb {
    Obb::new(local.center, local.half, Quat::IDENTITY)
        .transformed_by(position, Quat::from_rotation_y(yaw_deg.to_radians()))
        .to_aabb()
}

/// A ghost pose is valid when it sits inside the buildable region (skipped
/// while surface-snapped onto another entity) and its margin-shrunk envelope
/// overlaps no other placed entity.
pub fn placement_valid(
    world_box: &Aabb,
    surface_snapped: bool,
    grid: &VolumeGridBounds,
    others: impl IntoIterator<Item = Aabb>,
    margin: f32,
) -> bool {
    if !surface_snapped && !grid.contains_box(world_box.min(), world_box.max()) {
        return false;
    }
    let shrunk = world_box.shrunk(margin);
    for other in others {
        if shrunk.overlaps(&other.shrunk(margin)) {
            return false;
        }
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn aligned_hits_snap_to_themselves() {
        let p = snap_to_grid_xz(Vec3::new(5.0, 0.0, 5.0), 0.5);
        assert_eq!(p, Vec3::new(5.0, 0.0, 5.0));
    }

    #[test]
    fn unaligned_hit_rounds_to_half_grid() {
        let p = snap_to_grid_xz(Vec3::new(5.2, 0.0, 5.3), 0.5);
        assert_eq!(p, Vec3::new(5.0, 0.0, 5.5));
    }

    #[test]
    fn dominant_axis_wins_with_y_x_z_tie_order() {
        assert_eq!(contact_face_from_normal(Vec3::new(0.1, 0.9, 0.1)), Vec3::Y);
        assert_eq!(contact_face_from_normal(Vec3::new(-0.9, 0.1, 0.1)), Vec3::NEG_X);
        assert_eq!(contact_face_from_normal(Vec3::new(0.1, 0.2, 0.9)), Vec3::Z);
        // exact ties: Y beats X beats Z
        assert_eq!(contact_face_from_normal(Vec3::new(1.0, 1.0, 1.0)), Vec3::Y);
        assert_eq!(contact_face_from_normal(Vec3::new(1.0, 0.0, 1.0)), Vec3::X);
    }

    #[test]
    fn face_pivot_puts_bottom_on_top_face() {
        // bottom-anchored unit bounds: center (0,0.5,0), half 0.5
        let local = Aabb::new(Vec3::new(0.0, 0.5, 0.0), Vec3::splat(0.5));
        let hit = Vec3::new(2.0, 3.0, 2.0);
        let pivot = pivot_for_face(&local, Vec3::Y, hit);
        // bounds min y is 0, so the pivot lands exactly on the face
        assert_eq!(pivot, Vec3::new(2.0, 3.0, 2.0));
    }

    #[test]
    fn side_face_pushes_box_outward() {
        let local = Aabb::new(Vec3::new(0.0, 0.5, 0.0), Vec3::splat(0.5));
        let hit = Vec3::new(1.0, 0.5, 0.0);
        // hit the +X face of something: our -X side (local min x = -0.5) touches
        let pivot = pivot_for_face(&local, Vec3::X, hit);
        assert_eq!(pivot.x, 1.5);
        assert_eq!(pivot.y, 0.0);
        // and from the other side our +X face touches
        let pivot = pivot_for_face(&local, Vec3::NEG_X, Vec3::new(-1.0, 0.5, 0.0));
        assert_eq!(pivot.x, -1.5);
    }

    #[test]
    fn validity_inside_empty_grid() {
        let grid = VolumeGridBounds::default();
        let b = Aabb::new(Vec3::new(0.0, 0.5, 0.0), Vec3::splat(0.5));
        assert!(placement_valid(&b, false, &grid, [], 0.02));
    }

    #[test]
    fn validity_rejects_out_of_bounds_unless_surface_snapped() {
        let grid = VolumeGridBounds { dims: IVec3::new(4, 4, 4), cell_size: 1.0 };
        let outside = Aabb::new(Vec3::new(10.0, 0.5, 0.0), Vec3::splat(0.5));
        assert!(!placement_valid(&outside, false, &grid, [], 0.02));
        assert!(placement_valid(&outside, true, &grid, [], 0.02));
    }

    #[test]
    fn validity_rejects_overlap_symmetrically() {
        let grid = VolumeGridBounds::default();
        let a = Aabb::new(Vec3::new(0.0, 0.5, 0.0), Vec3::splat(0.5));
        let b = Aabb::new(Vec3::new(0.4, 0.5, 0.0), Vec3::splat(0.5));
        assert!(!placement_valid(&a, false, &grid, [b], 0.02));
        assert!(!placement_valid(&b, false, &grid, [a], 0.02));
        // touching faces are fine thanks to the margin
        let c = Aabb::new(Vec3::new(1.0, 0.5, 0.0), Vec3::splat(0.5));
        assert!(placement_valid(&a, false, &grid, [c], 0.02));
    }
}
