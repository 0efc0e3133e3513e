//! # Primitive Shape Generation
//!
//! Generators for the common objects the demos build procedurally. The
//! floor and axis are line lists meant to be drawn in wireframe mode; cube
//! and sphere are triangle lists.

use super::GeometryData;
use std::f32::consts::PI;

/// Generate a wireframe floor grid on the xz plane.
///
/// The grid spans `[-dimension, dimension]` on both axes with `lines`
/// segments per direction, so `lines + 1` grid lines each way. Indices are
/// consecutive pairs forming a line list.
pub fn floor(dimension: f32, lines: u32) -> GeometryData {
    let mut data = GeometryData::new();
    let lines = lines.max(1);
    let increment = 2.0 * dimension / lines as f32;

    for l in 0..=lines {
        let offset = -dimension + l as f32 * increment;

        // Line parallel to x.
        data.positions.push([-dimension, 0.0, offset]);
        data.positions.push([dimension, 0.0, offset]);

        // Line parallel to z.
        data.positions.push([offset, 0.0, -dimension]);
        data.positions.push([offset, 0.0, dimension]);
    }

    data.indices = (0..data.positions.len() as u16).collect();
    data
}

/// Generate the three coordinate axis lines.
///
/// The x and z axes span the full `dimension`; the y axis spans half of it,
/// matching the original demos' axis helper.
pub fn axis(dimension: f32) -> GeometryData {
    let mut data = GeometryData::new();

    data.positions = vec![
        [-dimension, 0.0, 0.0],
        [dimension, 0.0, 0.0],
        [0.0, -dimension / 2.0, 0.0],
        [0.0, dimension / 2.0, 0.0],
        [0.0, 0.0, -dimension],
        [0.0, 0.0, dimension],
    ];
    data.indices = vec![0, 1, 2, 3, 4, 5];
    data
}

/// Generate a cube centered at the origin with the given edge length.
pub fn cube(size: f32) -> GeometryData {
    let h = size / 2.0;
    let mut data = GeometryData::new();

    data.positions = vec![
        [-h, -h, h],
        [h, -h, h],
        [h, h, h],
        [-h, h, h],
        [-h, -h, -h],
        [-h, h, -h],
        [h, h, -h],
        [h, -h, -h],
    ];

    #[rustfmt::skip]
    let indices: Vec<u16> = vec![
        0, 1, 2,  2, 3, 0, // front
        4, 5, 6,  6, 7, 4, // back
        3, 2, 6,  6, 5, 3, // top
        4, 7, 1,  1, 0, 4, // bottom
        1, 7, 6,  6, 2, 1, // right
        4, 0, 3,  3, 5, 4, // left
    ];
    data.indices = indices;
    data
}

/// Generate a UV sphere.
///
/// # Arguments
/// * `radius` - Sphere radius
/// * `longitude_segments` - Number of vertical slices
/// * `latitude_segments` - Number of horizontal stacks
pub fn sphere(radius: f32, longitude_segments: u32, latitude_segments: u32) -> GeometryData {
    let mut data = GeometryData::new();

    let long_segs = longitude_segments.max(3);
    let lat_segs = latitude_segments.max(2);

    for lat in 0..=lat_segs {
        let theta = lat as f32 * PI / lat_segs as f32;
        let sin_theta = theta.sin();
        let cos_theta = theta.cos();

        for long in 0..=long_segs {
            let phi = long as f32 * 2.0 * PI / long_segs as f32;

            let x = sin_theta * phi.cos();
            let y = cos_theta;
            let z = sin_theta * phi.sin();

            data.positions.push([radius * x, radius * y, radius * z]);
        }
    }

    let stride = long_segs + 1;
    for lat in 0..lat_segs {
        for long in 0..long_segs {
            let first = (lat * stride + long) as u16;
            let second = first + stride as u16;

            data.indices.push(first);
            data.indices.push(second);
            data.indices.push(first + 1);

            data.indices.push(second);
            data.indices.push(second + 1);
            data.indices.push(first + 1);
        }
    }

    data
}
