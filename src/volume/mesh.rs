// src/volume/mesh.rs
//! Mesh builders for procedural volumes. Meshes are rebuilt wholesale on
//! every recompute; nothing here is patched in place.

use bevy::prelude::*;
use bevy::render::mesh::{Indices, Mesh, PrimitiveTopology};

/// Push one quad face: 4 corners in counter-clockwise order viewed from
/// outside, one shared normal, per-face UVs.
fn push_face(
    positions: &mut Vec<[f32; 3]>,
    normals: &mut Vec<[f32; 3]>,
    uvs: &mut Vec<[f32; 2]>,
    indices: &mut Vec<u32>,
    corners: [Vec3; 4],
    normal: Vec3,
) {
    let base = positions.len() as u32;
    for c in corners {
        positions.push([c.x, c.y, c.z]);
        normals.push([normal.x, normal.y, normal.z]);
    }
    uvs.extend_from_slice(&[[0.0, 0.0], [1.0, 0.0], [1.0, 1.0], [0.0, 1.0]]);
    indices.extend_from_slice(&[base, base + 1, base + 2, base + 2, base + 3, base]);
}

/// Explicit 24-vertex, 6-face box anchored at the local origin: symmetric in
/// X/Z, spanning y = 0 up to y = size.y. Outward winding per face.
pub fn box_mesh(size: Vec3) -> Mesh {
    let hx = size.x * 0.5;
    let hz = size.z * 0.5;
    let y0 = 0.0;
    let y1 = size.y;

    let mut positions: Vec<[f32; 3]> = Vec::with_capacity(24);
    let mut normals: Vec<[f32; 3]> = Vec::with_capacity(24);
    let mut uvs: Vec<[f32; 2]> = Vec::with_capacity(24);
    let mut indices: Vec<u32> = Vec::with_capacity(36);

    // +Y (top)
    push_face(
        &mut positions, &mut normals, &mut uvs, &mut indices,
        [
            Vec3::new(-hx, y1, -hz),
            Vec3::new(-hx, y1, hz),
            Vec3::new(hx, y1, hz),
            Vec3::new(hx, y1, -hz),
        ],
        Vec3::Y,
    );
    // -Y (bottom)
    push_face(
        &mut positions, &mut normals, &mut uvs, &mut indices,
        [
            Vec3::new(-hx, y0, -hz),
            Vec3::new(hx, y0, -hz),
            Vec3::new(hx, y0, hz),
            Vec3::new(-hx, y0, hz),
        ],
        Vec3::NEG_Y,
    );
    // +X
    push_face(
        &mut positions, &mut normals, &mut uvs, &mut indices,
        [
            Vec3::new(hx, y0, hz),
            Vec3::new(hx, y0, -hz),
            Vec3::new(hx, y1, -hz),
            Vec3::new(hx, y1, hz),
        ],
        Vec3::X,
    );
    // -X
    push_face(
        &mut positions, &mut normals, &mut uvs, &mut indices,
        [
            Vec3::new(-hx, y0, -hz),
            Vec3::new(-hx, y0, hz),
            Vec3::new(-hx, y1, hz),
            Vec3::new(-hx, y1, -hz),
        ],
        Vec3::NEG_X,
    );
    // +Z
    push_face(
        &mut positions, &mut normals, &mut uvs, &mut indices,
        [
            Vec3::new(-hx, y0, hz),
            Vec3::new(hx, y0, hz),
            Vec3::new(hx, y1, hz),
            Vec3::new(-hx, y1, hz),
        ],
        Vec3::Z,
    );
    // -Z
    push_face(
        &mut positions, &mut normals, &mut uvs, &mut indices,
        [
            Vec3::new(hx, y0, -hz),
            Vec3::new(-hx, y0, -hz),
            Vec3::new(-hx, y1, -hz),
            Vec3::new(hx, y1, -hz),
        ],
        Vec3::NEG_Z,
    );

    let mut mesh = Mesh::new(PrimitiveTopology::TriangleList, Default::default());
    mesh.insert_attribute(Mesh::ATTRIBUTE_POSITION, positions);
    mesh.insert_attribute(Mesh::ATTRIBUTE_NORMAL, normals);
    mesh.insert_attribute(Mesh::ATTRIBUTE_UV_0, uvs);
    mesh.insert_indices(Indices::U32(indices));
    mesh
}

/// Wall panels: one double-sided quad per segment, bottom points at y = 0,
/// tops at the shared height. Segments below `min_len` are skipped, matching
/// the collider generation.
pub fn wall_mesh(bottom: &[Vec3], height: f32, min_len: f32) -> Mesh {
    let mut positions: Vec<[f32; 3]> = Vec::new();
    let mut normals: Vec<[f32; 3]> = Vec::new();
    let mut uvs: Vec<[f32; 2]> = Vec::new();
    let mut indices: Vec<u32> = Vec::new();

    for pair in bottom.windows(2) {
        let (p0, p1) = (pair[0], pair[1]);
        let flat = Vec3::new(p1.x - p0.x, 0.0, p1.z - p0.z);
        if flat.length() < min_len {
            continue;
        }
        let up = Vec3::new(0.0, height, 0.0);
        let normal = Vec3::new(flat.z, 0.0, -flat.x).normalize();

        // front face
        push_face(
            &mut positions, &mut normals, &mut uvs, &mut indices,
            [p0, p1, p1 + up, p0 + up],
            normal,
        );
        // back face, reversed winding
        push_face(
            &mut positions, &mut normals, &mut uvs, &mut indices,
            [p1, p0, p0 + up, p1 + up],
            -normal,
        );
    }

    let mut mesh = Mesh::new(PrimitiveTopology::TriangleList, Default::default());
    mesh.insert_attribute(Mesh::ATTRIBUTE_POSITION, positions);
    mesh.insert_attribute(Mesh::ATTRIBUTE_NORMAL, normals);
    mesh.insert_attribute(Mesh::ATTRIBUTE_UV_0, uvs);
    mesh.insert_indices(Indices::U32(indices));
    mesh
}

#[cfg(test)]
mod tests {
    use super::*;
    use bevy::render::mesh::VertexAttributeValues;

    fn positions_of(mesh: &Mesh) -> Vec<Vec3> {
        match mesh.attribute(Mesh::ATTRIBUTE_POSITION).unwrap() {
            VertexAttributeValues::Float32x3(v) => v.iter().map(|p| Vec3::from(*p)).collect(),
            _ => panic!("unexpected position format"),
        }
    }

    #[test]
    fn box_has_24_vertices_and_36_indices() {
        let mesh = box_mesh(Vec3::new(2.0, 3.0, 4.0));
        let pos = positions_of(&mesh);
        assert_eq!(pos.len(), 24);
        match mesh.indices().unwrap() {
            Indices::U32(idx) => assert_eq!(idx.len(), 36),
            _ => panic!("unexpected index format"),
        }
    }

    #[test]
    fn box_spans_zero_to_height() {
        let mesh = box_mesh(Vec3::new(2.0, 3.0, 4.0));
        let pos = positions_of(&mesh);
        let min_y = pos.iter().map(|p| p.y).fold(f32::INFINITY, f32::min);
        let max_y = pos.iter().map(|p| p.y).fold(f32::NEG_INFINITY, f32::max);
        assert_eq!(min_y, 0.0);
        assert_eq!(max_y, 3.0);
        let max_x = pos.iter().map(|p| p.x).fold(f32::NEG_INFINITY, f32::max);
        assert_eq!(max_x, 1.0);
    }

    #[test]
    fn degenerate_wall_segment_produces_no_panels() {
        let p = Vec3::new(1.0, 0.0, 1.0);
        let mesh = wall_mesh(&[p, p], 2.0, 1e-3);
        assert!(positions_of(&mesh).is_empty());
    }

    #[test]
    fn one_segment_gives_two_panels() {
        let mesh = wall_mesh(&[Vec3::ZERO, Vec3::new(4.0, 0.0, 0.0)], 2.5, 1e-3);
        // 2 faces x 4 verts
        assert_eq!(positions_of(&mesh).len(), 8);
    }
}
