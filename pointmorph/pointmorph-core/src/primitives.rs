//! Procedural meshes for demos and tests. All are centred on the origin.

use std::f32::consts::{PI, TAU};

use point_api::SourceMesh;

pub fn triangle() -> SourceMesh {
    SourceMesh::from_geometry(vec![[-0.5, -0.5, 0.0], [0.5, -0.5, 0.0], [0.0, 0.5, 0.0]], vec![0, 1, 2])
}

pub fn quad() -> SourceMesh {
    SourceMesh::from_geometry(
        vec![[-0.5, -0.5, 0.0], [0.5, -0.5, 0.0], [0.5, 0.5, 0.0], [-0.5, 0.5, 0.0]],
        vec![0, 1, 2, 0, 2, 3],
    )
}

/// Axis-aligned cube with edge length `size`; 8 shared vertices, 12 triangles.
pub fn cube(size: f32) -> SourceMesh {
    let h = size * 0.5;
    let positions = vec![
        [-h, -h, -h],
        [h, -h, -h],
        [h, h, -h],
        [-h, h, -h],
        [-h, -h, h],
        [h, -h, h],
        [h, h, h],
        [-h, h, h],
    ];
    #[rustfmt::skip]
    let indices = vec![
        0, 2, 1, 0, 3, 2, // -z
        4, 5, 6, 4, 6, 7, // +z
        0, 1, 5, 0, 5, 4, // -y
        3, 7, 6, 3, 6, 2, // +y
        0, 4, 7, 0, 7, 3, // -x
        1, 2, 6, 1, 6, 5, // +x
    ];
    SourceMesh::from_geometry(positions, indices)
}

pub fn tetrahedron(size: f32) -> SourceMesh {
    let s = size * 0.5;
    let positions = vec![[s, s, s], [s, -s, -s], [-s, s, -s], [-s, -s, s]];
    SourceMesh::from_geometry(positions, vec![0, 1, 2, 0, 3, 1, 0, 2, 3, 1, 3, 2])
}

pub fn octahedron(radius: f32) -> SourceMesh {
    let r = radius;
    let positions = vec![[r, 0.0, 0.0], [-r, 0.0, 0.0], [0.0, r, 0.0], [0.0, -r, 0.0], [0.0, 0.0, r], [0.0, 0.0, -r]];
    #[rustfmt::skip]
    let indices = vec![
        0, 2, 4, 2, 1, 4, 1, 3, 4, 3, 0, 4,
        2, 0, 5, 1, 2, 5, 3, 1, 5, 0, 3, 5,
    ];
    SourceMesh::from_geometry(positions, indices)
}

/// Latitude/longitude sphere: `(segments + 1) * (rings + 1)` vertices, `2 * segments * rings` triangles.
pub fn uv_sphere(radius: f32, segments: u32, rings: u32) -> SourceMesh {
    let segments = segments.max(3);
    let rings = rings.max(2);
    let mut positions = Vec::with_capacity(((segments + 1) * (rings + 1)) as usize);
    for ring in 0..=rings {
        let phi = PI * ring as f32 / rings as f32;
        for seg in 0..=segments {
            let theta = TAU * seg as f32 / segments as f32;
            positions.push([
                radius * phi.sin() * theta.cos(),
                radius * phi.cos(),
                radius * phi.sin() * theta.sin(),
            ]);
        }
    }
    let indices = grid_indices(segments, rings);
    SourceMesh::from_geometry(positions, indices)
}

pub fn torus(major_radius: f32, minor_radius: f32, segments: u32, sides: u32) -> SourceMesh {
    let segments = segments.max(3);
    let sides = sides.max(3);
    let mut positions = Vec::with_capacity(((segments + 1) * (sides + 1)) as usize);
    for side in 0..=sides {
        let phi = TAU * side as f32 / sides as f32;
        let ring = major_radius + minor_radius * phi.cos();
        for seg in 0..=segments {
            let theta = TAU * seg as f32 / segments as f32;
            positions.push([ring * theta.cos(), minor_radius * phi.sin(), ring * theta.sin()]);
        }
    }
    let indices = grid_indices(segments, sides);
    SourceMesh::from_geometry(positions, indices)
}

fn grid_indices(columns: u32, rows: u32) -> Vec<u32> {
    let stride = columns + 1;
    let mut indices = Vec::with_capacity((columns * rows * 6) as usize);
    for row in 0..rows {
        for col in 0..columns {
            let a = row * stride + col;
            let b = a + stride;
            indices.extend_from_slice(&[a, b, a + 1, a + 1, b, b + 1]);
        }
    }
    indices
}

/// Shapes cycled by the debug programs.
pub fn demo_set() -> Vec<SourceMesh> {
    vec![
        cube(1.0),
        octahedron(1.0),
        uv_sphere(1.0, 32, 16),
        torus(1.0, 0.35, 48, 16),
        tetrahedron(1.5),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_valid(mesh: &SourceMesh) {
        assert!(mesh.triangle_count() > 0);
        assert_eq!(mesh.indices.len() % 3, 0);
        assert!(mesh.indices.iter().all(|&i| i < mesh.vertex_count()));
        assert!(mesh.bounds_magnitude() > 0.0);
    }

    #[test]
    fn demo_shapes_are_well_formed() {
        for mesh in demo_set() {
            assert_valid(&mesh);
        }
        assert_valid(&triangle());
        assert_valid(&quad());
    }

    #[test]
    fn counts() {
        assert_eq!(triangle().triangle_count(), 1);
        assert_eq!(quad().triangle_count(), 2);
        assert_eq!(quad().vertex_count(), 4);
        assert_eq!(cube(1.0).triangle_count(), 12);
        assert_eq!(uv_sphere(1.0, 16, 8).triangle_count(), 256);
        assert_eq!(torus(1.0, 0.25, 12, 6).triangle_count(), 144);
    }

    #[test]
    fn cube_bounds_follow_size() {
        assert_eq!(cube(2.0).bounds_size, [2.0, 2.0, 2.0]);
    }
}
