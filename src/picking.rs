// src/picking.rs
//! Synchronous ray queries: cursor rays, ground plane, boxes, and handle
//! spheres. All calls either return a hit or `None` within the frame.

use bevy::prelude::*;

use crate::bounds::{LocalBounds, Obb};

/// Result of casting a ray against placed geometry.
#[derive(Clone, Copy, Debug)]
pub struct RayHit {
    pub entity: Entity,
    pub point: Vec3,
    /// World-space outward normal of the face that was hit.
    pub normal: Vec3,
    pub distance: f32,
}

/// Build a world-space ray through the given screen position.
pub fn viewport_ray(
    camera: &Camera,
    cam_transform: &GlobalTransform,
    screen_pos: Vec2,
) -> Option<Ray3d> {
    camera.viewport_to_world(cam_transform, screen_pos).ok()
}

/// Intersect a ray with a plane defined by a point and normal.
pub fn ray_plane(ray: Ray3d, plane_point: Vec3, plane_normal: Vec3) -> Option<Vec3> {
    let denom = ray.direction.dot(plane_normal);
    if denom.abs() < 1e-6 {
        return None;
    }
    let t = (plane_point - ray.origin).dot(plane_normal) / denom;
    if t < 0.0 {
        return None;
    }
    Some(ray.origin + *ray.direction * t)
}

/// Ray vs. sphere; returns distance along the ray to the near intersection.
pub fn ray_sphere(ray: Ray3d, center: Vec3, radius: f32) -> Option<f32> {
    let oc = ray.origin - center;
    let b = oc.dot(*ray.direction);
    let c = oc.length_squared() - radius * radius;
    let disc = b * b - c;
    if disc < 0.0 {
        return None;
    }
    let t = -b - disc.sqrt();
    if t < 0.0 { None } else { Some(t) }
}

/// Slab-method ray vs. oriented box. The ray is pulled into box-local space,
/// where the test reduces to an AABB intersection.
pub fn ray_obb(origin: Vec3, direction: Vec3, obb: &Obb) -> Option<f32> {
    let inv = obb.rotation.inverse();
    let local_origin = inv * (origin - obb.center);
    let local_dir = inv * direction;

    let mut t_min = f32::NEG_INFINITY;
    let mut t_max = f32::INFINITY;
    for axis in 0..3 {
        let o = local_origin[axis];
        let d = local_dir[axis];
        let h = obb.half[axis];
        if d.abs() < 1e-8 {
            if o.abs() > h {
                return None;
            }
            continue;
        }
        let mut t0 = (-h - o) / d;
        let mut t1 = (h - o) / d;
        if t0 > t1 {
            std::mem::swap(&mut t0, &mut t1);
        }
        t_min = t_min.max(t0);
        t_max = t_max.min(t1);
        if t_min > t_max {
            return None;
        }
    }
    if t_max < 0.0 {
        return None;
    }
    Some(if t_min >= 0.0 { t_min } else { t_max })
}

/// Outward face normal of an OBB at a surface point: nearest local face wins.
pub fn obb_face_normal(obb: &Obb, surface_point: Vec3) -> Vec3 {
    let local = obb.rotation.inverse() * (surface_point - obb.center);
    let faces = [
        (Vec3::X, obb.half.x - local.x),
        (Vec3::NEG_X, obb.half.x + local.x),
        (Vec3::Y, obb.half.y - local.y),
        (Vec3::NEG_Y, obb.half.y + local.y),
        (Vec3::Z, obb.half.z - local.z),
        (Vec3::NEG_Z, obb.half.z + local.z),
    ];
    let mut best = Vec3::Y;
    let mut best_dist = f32::MAX;
    for (normal, dist) in faces {
        if dist.abs() < best_dist {
            best_dist = dist.abs();
            best = normal;
        }
    }
    (obb.rotation * best).normalize()
}

/// Cast a ray against a set of candidate entities (world bounds supplied by
/// the caller), returning the closest hit with its contact face normal.
pub fn cast_ray_entities<'a>(
    ray: Ray3d,
    candidates: impl IntoIterator<Item = (Entity, &'a LocalBounds, Vec3, Quat)>,
) -> Option<RayHit> {
    let mut closest: Option<RayHit> = None;
    for (entity, bounds, translation, rotation) in candidates {
        let world_obb = bounds.0.transformed_by(translation, rotation);
        if let Some(distance) = ray_obb(ray.origin, *ray.direction, &world_obb) {
            if closest.map_or(true, |h| distance < h.distance) {
                let point = ray.origin + *ray.direction * distance;
                let normal = obb_face_normal(&world_obb, point);
                closest = Some(RayHit { entity, point, normal, distance });
            }
        }
    }
    closest
}

#[cfg(test)]
mod tests {
    use super::*;

    fn down_ray(x: f32, z: f32) -> Ray3d {
        Ray3d::new(Vec3::new(x, 10.0, z), Dir3::NEG_Y)
    }

    #[test]
    fn plane_hit_from_above() {
        let hit = ray_plane(down_ray(3.0, -2.0), Vec3::ZERO, Vec3::Y).unwrap();
        assert!((hit - Vec3::new(3.0, 0.0, -2.0)).length() < 1e-5);
    }

    #[test]
    fn plane_parallel_misses() {
        let ray = Ray3d::new(Vec3::new(0.0, 1.0, 0.0), Dir3::X);
        assert!(ray_plane(ray, Vec3::ZERO, Vec3::Y).is_none());
    }

    #[test]
    fn obb_hit_top_face() {
        let obb = Obb::axis_aligned(Vec3::new(0.0, 1.0, 0.0), Vec3::new(1.0, 1.0, 1.0));
        let t = ray_obb(Vec3::new(0.0, 10.0, 0.0), Vec3::NEG_Y, &obb).unwrap();
        assert!((t - 8.0).abs() < 1e-5, "t = {}", t);
        let n = obb_face_normal(&obb, Vec3::new(0.0, 2.0, 0.0));
        assert!((n - Vec3::Y).length() < 1e-5);
    }

    #[test]
    fn obb_rotated_side_face_normal() {
        let rot = Quat::from_rotation_y(std::f32::consts::FRAC_PI_2);
        let obb = Obb::new(Vec3::ZERO, Vec3::new(2.0, 1.0, 0.5), rot);
        let p = obb.center + rot * Vec3::new(2.0, 0.0, 0.0);
        let n = obb_face_normal(&obb, p);
        assert!((n - (rot * Vec3::X)).length() < 1e-4);
    }

    #[test]
    fn obb_miss() {
        let obb = Obb::axis_aligned(Vec3::ZERO, Vec3::splat(0.5));
        assert!(ray_obb(Vec3::new(5.0, 10.0, 0.0), Vec3::NEG_Y, &obb).is_none());
    }

    #[test]
    fn sphere_hit_distance() {
        let t = ray_sphere(down_ray(0.0, 0.0), Vec3::ZERO, 1.0).unwrap();
        assert!((t - 9.0).abs() < 1e-4);
    }
}
