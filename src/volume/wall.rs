// src/volume/wall.rs
//! Polyline wall: an ordered run of bottom control points sharing one height.
//! Point edits go through the operations here so the minimum-point invariant
//! and index bookkeeping stay in one place.

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

use crate::bounds::Obb;

/// A wall never drops below this many control points.
pub const MIN_WALL_POINTS: usize = 2;

/// Segments shorter than this produce no collider or panel.
pub const MIN_SEGMENT_LEN: f32 = 1e-3;

/// How far `extend_from` pushes a new point past an endpoint.
pub const EXTEND_DISTANCE: f32 = 2.0;

#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum WallEditError {
    #[error("a wall keeps at least {MIN_WALL_POINTS} points")]
    TooFewPoints,
    #[error("point index {0} out of range")]
    BadIndex(usize),
}

/// Bottom control points (y forced to 0) plus the single shared height.
/// Top points are derived, never stored.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct WallState {
    pub points: Vec<Vec3>,
    pub height: f32,
}

impl WallState {
    pub fn new(points: Vec<Vec3>, height: f32) -> Self {
        let mut wall = Self { points, height };
        for p in &mut wall.points {
            p.y = 0.0;
        }
        wall
    }

    /// Derived top points: the bottom run lifted to the shared height.
    pub fn top_points(&self) -> Vec<Vec3> {
        self.points.iter().map(|p| Vec3::new(p.x, self.height, p.z)).collect()
    }

    /// Append a new bottom point at the given position (y discarded).
    /// Returns the index of the new point.
    pub fn add_point_at(&mut self, pos: Vec3) -> usize {
        self.points.push(Vec3::new(pos.x, 0.0, pos.z));
        self.points.len() - 1
    }

    /// Insert the midpoint of `index` and its successor after `index`.
    /// Later point indices shift up by one.
    pub fn insert_after(&mut self, index: usize) -> Result<usize, WallEditError> {
        if index + 1 >= self.points.len() {
            return Err(WallEditError::BadIndex(index));
        }
        let mid = (self.points[index] + self.points[index + 1]) * 0.5;
        self.points.insert(index + 1, Vec3::new(mid.x, 0.0, mid.z));
        Ok(index + 1)
    }

    /// Grow the wall past an endpoint: 2 units along the adjoining segment's
    /// direction, or +X when the wall has only one point.
    pub fn extend_from(&mut self, index: usize) -> Result<usize, WallEditError> {
        let n = self.points.len();
        if index >= n {
            return Err(WallEditError::BadIndex(index));
        }
        let dir = if n < 2 {
            Vec3::X
        } else if index == 0 {
            flat_dir(self.points[1], self.points[0]).unwrap_or(Vec3::X)
        } else {
            flat_dir(self.points[index - 1], self.points[index]).unwrap_or(Vec3::X)
        };
        let new_point = self.points[index] + dir * EXTEND_DISTANCE;
        if index == 0 {
            self.points.insert(0, new_point);
            Ok(0)
        } else {
            self.points.insert(index + 1, new_point);
            Ok(index + 1)
        }
    }

    /// Remove a point. Rejected when the wall would drop below the minimum;
    /// the point list is left untouched in that case.
    pub fn delete_point(&mut self, index: usize) -> Result<(), WallEditError> {
        if index >= self.points.len() {
            return Err(WallEditError::BadIndex(index));
        }
        if self.points.len() <= MIN_WALL_POINTS {
            return Err(WallEditError::TooFewPoints);
        }
        self.points.remove(index);
        Ok(())
    }

    /// Set the shared height, clamped; propagates to every derived top point.
    pub fn set_height(&mut self, h: f32, min: f32, max: f32) {
        self.height = h.clamp(min, max);
    }

    /// Move one bottom point horizontally (y pinned to 0).
    pub fn set_point_xz(&mut self, index: usize, x: f32, z: f32) -> Result<(), WallEditError> {
        let p = self.points.get_mut(index).ok_or(WallEditError::BadIndex(index))?;
        *p = Vec3::new(x, 0.0, z);
        Ok(())
    }

    /// One oriented collision box per consecutive pair: forward axis along the
    /// horizontal segment direction, centered at the segment midpoint at half
    /// height, sized (thickness, height, segment length). Degenerate segments
    /// are skipped.
    pub fn segment_colliders(&self, thickness: f32) -> Vec<Obb> {
        let mut out = Vec::with_capacity(self.points.len().saturating_sub(1));
        for pair in self.points.windows(2) {
            let (p0, p1) = (pair[0], pair[1]);
            let flat = Vec3::new(p1.x - p0.x, 0.0, p1.z - p0.z);
            let len = flat.length();
            if len < MIN_SEGMENT_LEN {
                continue;
            }
            let dir = flat / len;
            let yaw = dir.x.atan2(dir.z);
            let mid = (p0 + p1) * 0.5;
            out.push(Obb::new(
                Vec3::new(mid.x, self.height * 0.5, mid.z),
                Vec3::new(thickness * 0.5, self.height * 0.5, len * 0.5),
                Quat::from_rotation_y(yaw),
            ));
        }
        out
    }

    /// Selection bounds: an oriented box whose long axis follows the vector
    /// from the first to the last point. Spans along that axis and its
    /// horizontal perpendicular are padded by the wall thickness. Falls back
    /// to a unit box below two points.
    pub fn oriented_bounds(&self, thickness: f32) -> Obb {
        if self.points.len() < 2 {
            return Obb::axis_aligned(Vec3::new(0.0, 0.5, 0.0), Vec3::splat(0.5));
        }
        let first = self.points[0];
        let last = self.points[self.points.len() - 1];
        let axis = flat_dir(first, last).unwrap_or(Vec3::X);
        let perp = Vec3::new(-axis.z, 0.0, axis.x);

        let mut along_min = f32::INFINITY;
        let mut along_max = f32::NEG_INFINITY;
        let mut perp_min = f32::INFINITY;
        let mut perp_max = f32::NEG_INFINITY;
        for p in &self.points {
            let rel = *p - first;
            let a = rel.dot(axis);
            let q = rel.dot(perp);
            along_min = along_min.min(a);
            along_max = along_max.max(a);
            perp_min = perp_min.min(q);
            perp_max = perp_max.max(q);
        }

        let center = first
            + axis * (along_min + along_max) * 0.5
            + perp * (perp_min + perp_max) * 0.5
            + Vec3::new(0.0, self.height * 0.5, 0.0);
        let half = Vec3::new(
            (perp_max - perp_min + thickness) * 0.5,
            self.height * 0.5,
            (along_max - along_min + thickness) * 0.5,
        );
        Obb::new(center, half, Quat::from_rotation_y(axis.x.atan2(axis.z)))
    }
}

/// Horizontal unit direction from `a` to `b`; `None` when degenerate.
fn flat_dir(a: Vec3, b: Vec3) -> Option<Vec3> {
    let flat = Vec3::new(b.x - a.x, 0.0, b.z - a.z);
    let len = flat.length();
    if len < MIN_SEGMENT_LEN { None } else { Some(flat / len) }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn two_point_wall() -> WallState {
        WallState::new(vec![Vec3::ZERO, Vec3::new(4.0, 0.0, 0.0)], 2.5)
    }

    #[test]
    fn single_segment_collider_matches_layout() {
        let wall = two_point_wall();
        let boxes = wall.segment_colliders(0.3);
        assert_eq!(boxes.len(), 1);
        let b = &boxes[0];
        assert!((b.center - Vec3::new(2.0, 1.25, 0.0)).length() < 1e-5);
        // size (thickness, height, length)
        assert!((b.half * 2.0 - Vec3::new(0.3, 2.5, 4.0)).length() < 1e-5);
        // forward axis points along the segment
        let forward = b.rotation * Vec3::Z;
        assert!((forward - Vec3::X).length() < 1e-4, "forward {:?}", forward);
    }

    #[test]
    fn insert_after_splits_at_midpoint() {
        let mut wall = two_point_wall();
        let idx = wall.insert_after(0).unwrap();
        assert_eq!(idx, 1);
        assert_eq!(wall.points.len(), 3);
        assert!((wall.points[1] - Vec3::new(2.0, 0.0, 0.0)).length() < 1e-6);
        assert_eq!(wall.segment_colliders(0.3).len(), 2);
    }

    #[test]
    fn delete_below_minimum_is_rejected_without_mutation() {
        let mut wall = two_point_wall();
        let before = wall.points.clone();
        assert_eq!(wall.delete_point(0), Err(WallEditError::TooFewPoints));
        assert_eq!(wall.delete_point(1), Err(WallEditError::TooFewPoints));
        assert_eq!(wall.points, before);
    }

    #[test]
    fn delete_shifts_later_points_down() {
        let mut wall = two_point_wall();
        wall.add_point_at(Vec3::new(4.0, 0.0, 4.0));
        let last = wall.points[2];
        wall.delete_point(1).unwrap();
        assert_eq!(wall.points.len(), 2);
        assert_eq!(wall.points[1], last);
    }

    #[test]
    fn extend_from_endpoint_projects_along_last_segment() {
        let mut wall = two_point_wall();
        let idx = wall.extend_from(1).unwrap();
        assert_eq!(idx, 2);
        assert!((wall.points[2] - Vec3::new(6.0, 0.0, 0.0)).length() < 1e-5);

        let idx = wall.extend_from(0).unwrap();
        assert_eq!(idx, 0);
        assert!((wall.points[0] - Vec3::new(-2.0, 0.0, 0.0)).length() < 1e-5);
    }

    #[test]
    fn set_height_clamps_and_propagates_to_tops() {
        let mut wall = two_point_wall();
        wall.set_height(99.0, 0.5, 8.0);
        assert_eq!(wall.height, 8.0);
        for top in wall.top_points() {
            assert_eq!(top.y, 8.0);
        }
    }

    #[test]
    fn degenerate_segment_skipped() {
        let mut wall = two_point_wall();
        wall.add_point_at(Vec3::new(4.0, 0.0, 0.0)); // zero-length tail
        assert_eq!(wall.segment_colliders(0.3).len(), 1);
    }

    #[test]
    fn oriented_bounds_follow_first_to_last() {
        let wall = WallState::new(
            vec![Vec3::ZERO, Vec3::new(4.0, 0.0, 0.0), Vec3::new(4.0, 0.0, 2.0)],
            2.0,
        );
        let obb = wall.oriented_bounds(0.3);
        assert!((obb.half.y - 1.0).abs() < 1e-5);
        // long axis covers the first-to-last span plus thickness
        let axis_len = Vec3::new(4.0, 0.0, 2.0).length();
        assert!(obb.half.z * 2.0 > axis_len, "span {} too small", obb.half.z * 2.0);
    }

    #[test]
    fn bottom_points_pinned_to_ground() {
        let wall = WallState::new(vec![Vec3::new(0.0, 3.0, 0.0), Vec3::new(1.0, -2.0, 0.0)], 1.0);
        assert!(wall.points.iter().all(|p| p.y == 0.0));
    }
}
