//! # Procedural Geometry
//!
//! Vertex-normal computation and the handful of procedural shapes the demos
//! use: the wireframe floor grid, the axis cross, and solid primitives for
//! tests and examples.

pub mod primitives;

pub use primitives::{axis, cube, floor, sphere};

/// Raw geometry produced by the generators: positions plus a 16-bit
/// triangle or line list.
#[derive(Debug, Clone, Default)]
pub struct GeometryData {
    pub positions: Vec<[f32; 3]>,
    pub indices: Vec<u16>,
}

impl GeometryData {
    pub fn new() -> Self {
        Self::default()
    }
}

/// Computes per-vertex normals for a triangle list.
///
/// Each triangle's face normal is the cross product of the edges
/// `v2 - v1` and `v0 - v1` (Sarrus-rule ordering), summed — not averaged —
/// into every contributing vertex, then each vertex normal is normalized at
/// the end. Zero-length accumulations are guarded by substituting length 1
/// so degenerate faces never divide by zero.
pub fn vertex_normals(positions: &[[f32; 3]], indices: &[u16]) -> Vec<[f32; 3]> {
    let mut normals = vec![[0.0f32; 3]; positions.len()];

    for triangle in indices.chunks_exact(3) {
        let i0 = triangle[0] as usize;
        let i1 = triangle[1] as usize;
        let i2 = triangle[2] as usize;

        let v0 = positions[i0];
        let v1 = positions[i1];
        let v2 = positions[i2];

        let e1 = [v2[0] - v1[0], v2[1] - v1[1], v2[2] - v1[2]];
        let e2 = [v0[0] - v1[0], v0[1] - v1[1], v0[2] - v1[2]];

        let face = [
            e1[1] * e2[2] - e1[2] * e2[1],
            e1[2] * e2[0] - e1[0] * e2[2],
            e1[0] * e2[1] - e1[1] * e2[0],
        ];

        for &index in &[i0, i1, i2] {
            normals[index][0] += face[0];
            normals[index][1] += face[1];
            normals[index][2] += face[2];
        }
    }

    for normal in &mut normals {
        let mut length =
            (normal[0] * normal[0] + normal[1] * normal[1] + normal[2] * normal[2]).sqrt();
        if length == 0.0 {
            length = 1.0;
        }
        normal[0] /= length;
        normal[1] /= length;
        normal[2] /= length;
    }

    normals
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flat_triangle_normals_equal_face_normal() {
        // One triangle in the xz plane, counter-clockwise seen from +y.
        let positions = [[0.0, 0.0, 0.0], [0.0, 0.0, 1.0], [1.0, 0.0, 1.0]];
        let indices = [0u16, 1, 2];

        let normals = vertex_normals(&positions, &indices);
        for n in &normals {
            assert!((n[0] - 0.0).abs() < 1e-6);
            assert!((n[1] - 1.0).abs() < 1e-6);
            assert!((n[2] - 0.0).abs() < 1e-6);
        }
    }

    #[test]
    fn unreferenced_vertices_get_guarded_zero_normal() {
        let positions = [[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [5.0, 5.0, 5.0]];
        let indices = [0u16, 1, 2];

        let normals = vertex_normals(&positions, &indices);
        // The orphan vertex accumulates nothing; the guard leaves it at
        // zero instead of NaN.
        assert_eq!(normals[3], [0.0, 0.0, 0.0]);
        assert!(normals[0][2].abs() > 0.9);
    }

    #[test]
    fn shared_vertices_sum_face_contributions() {
        // Two coplanar triangles sharing an edge; every normal still
        // normalizes to the shared face normal.
        let positions = [
            [0.0, 0.0, 0.0],
            [1.0, 0.0, 0.0],
            [1.0, 1.0, 0.0],
            [0.0, 1.0, 0.0],
        ];
        let indices = [0u16, 1, 2, 2, 3, 0];

        let normals = vertex_normals(&positions, &indices);
        for n in &normals {
            assert!(n[2].abs() > 0.999, "normal {:?} not on the z axis", n);
        }
    }

    #[test]
    fn floor_is_a_line_grid() {
        let data = floor(80.0, 2);
        // Three lines per direction for two segments.
        assert_eq!(data.positions.len(), 12);
        assert_eq!(data.indices.len(), 12);
        assert!(data.positions.iter().all(|p| p[1] == 0.0));
    }

    #[test]
    fn axis_spans_all_three_axes() {
        let data = axis(10.0);
        assert_eq!(data.positions.len(), 6);
        assert_eq!(data.indices, vec![0, 1, 2, 3, 4, 5]);
    }

    #[test]
    fn sphere_indices_stay_in_range() {
        let data = sphere(1.0, 12, 8);
        let max = *data.indices.iter().max().unwrap() as usize;
        assert!(max < data.positions.len());
        assert_eq!(data.indices.len() % 3, 0);
    }
}
