//! Surface sampling math shared by the resampler, the transitioner and the CPU reference backend.
//! `random_pair`, `fold` and `place_on_triangle` mirror `sample.wgsl` line for line.

use glam::Vec3;
use point_api::{MeshBufferIds, SourceMesh};

pub const MIN_RESOLUTION: u32 = 10;
pub const MAX_RESOLUTION: u32 = 1000;

/// Target range for the bounding magnitude of every rendered cloud.
pub const MIN_VISUAL_SIZE: f32 = 4.0;
pub const MAX_VISUAL_SIZE: f32 = 5.0;

const STEP_SPARSE: f32 = 300.0;
const STEP_DENSE: f32 = 250.0;

/// Position buffer capacity for a resolution.
pub fn point_capacity(resolution: u32) -> u32 {
    resolution * resolution
}

/// `floor(resolution² / triangles)`. Zero when the mesh has more triangles than the buffer has slots.
pub fn points_per_triangle(resolution: u32, triangles: u32) -> u32 {
    if triangles == 0 {
        return 0;
    }
    point_capacity(resolution) / triangles
}

/// Points actually written for a mesh: `ppt * triangles - 1`, never below zero.
/// The `- 1` keeps the last slot untouched so a full mesh can never overrun the buffer.
pub fn candidate_count(points_per_triangle: u32, triangles: u32) -> u32 {
    (points_per_triangle * triangles).saturating_sub(1)
}

/// Reflect `(u, v)` across the diagonal `u + v = 1` so it lands inside the unit simplex.
pub fn fold(u: f32, v: f32) -> (f32, f32) {
    if u + v > 1.0 {
        (1.0 - u, 1.0 - v)
    } else {
        (u, v)
    }
}

pub fn pcg_hash(input: u32) -> u32 {
    let state = input.wrapping_mul(747_796_405).wrapping_add(2_891_336_453);
    let word = ((state >> ((state >> 28) + 4)) ^ state).wrapping_mul(277_803_737);
    (word >> 22) ^ word
}

fn unit_float(bits: u32) -> f32 {
    (bits >> 8) as f32 / 16_777_216.0
}

/// Two uniform scalars in `[0, 1)` for slot `index` of a sampling seeded with `seed`.
pub fn random_pair(seed: u32, index: u32) -> (f32, f32) {
    let h1 = pcg_hash(index ^ pcg_hash(seed));
    let h2 = pcg_hash(h1);
    (unit_float(h1), unit_float(h2))
}

/// `clamp(m, 4, 5) / m`: brings every mesh to a comparable on-screen size.
pub fn normalization_factor(bounds_magnitude: f32) -> f32 {
    if !(bounds_magnitude > 0.0) || !bounds_magnitude.is_finite() {
        return 1.0;
    }
    bounds_magnitude.clamp(MIN_VISUAL_SIZE, MAX_VISUAL_SIZE) / bounds_magnitude
}

pub fn lerp(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}

/// Renderer step constant: `lerp(300, 250, clamp01(resolution / vertex_count))`.
pub fn step_size(resolution: u32, vertex_count: f32) -> f32 {
    let t = if vertex_count > 0.0 {
        (resolution as f32 / vertex_count).clamp(0.0, 1.0)
    } else {
        1.0
    };
    lerp(STEP_SPARSE, STEP_DENSE, t)
}

/// Random point on triangle `abc` for slot `index`, scaled by `scale`.
pub fn place_on_triangle(a: Vec3, b: Vec3, c: Vec3, seed: u32, index: u32, scale: f32) -> Vec3 {
    let (u, v) = random_pair(seed, index);
    let (u, v) = fold(u, v);
    (a + (b - a) * u + (c - a) * v) * scale
}

/// How one mesh is spread over the position buffer for a given resolution and seed.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SurfaceSampling {
    pub mesh_index: usize,
    pub resolution: u32,
    pub triangle_count: u32,
    pub vertex_count: u32,
    pub points_per_triangle: u32,
    pub candidates: u32,
    pub seed: u32,
    pub scale: f32,
}

impl SurfaceSampling {
    pub fn new(mesh_index: usize, mesh: &SourceMesh, resolution: u32, seed: u32) -> Self {
        let triangle_count = mesh.triangle_count();
        let points_per_triangle = points_per_triangle(resolution, triangle_count);
        Self {
            mesh_index,
            resolution,
            triangle_count,
            vertex_count: mesh.vertex_count(),
            points_per_triangle,
            candidates: candidate_count(points_per_triangle, triangle_count),
            seed,
            scale: normalization_factor(mesh.bounds_magnitude()),
        }
    }

    /// Step constant when this mesh is shown on its own.
    pub fn natural_step_size(&self) -> f32 {
        step_size(self.resolution, self.vertex_count as f32)
    }

    /// CPU evaluation of slot `index`. Caller guarantees `index < candidates`.
    pub fn point(&self, mesh: &SourceMesh, index: u32) -> Vec3 {
        let tri = (index / self.points_per_triangle) as usize;
        let vertex = |k: usize| Vec3::from(mesh.positions[mesh.indices[tri * 3 + k] as usize]);
        place_on_triangle(vertex(0), vertex(1), vertex(2), self.seed, index, self.scale)
    }
}

/// A mesh that is resident on the backend together with its current sampling.
#[derive(Debug, Clone, Copy)]
pub struct MeshSlot<'a> {
    pub mesh: &'a SourceMesh,
    pub buffers: MeshBufferIds,
    pub sampling: SurfaceSampling,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    #[test]
    fn points_never_exceed_capacity() {
        for resolution in [MIN_RESOLUTION, 11, 64, 250, 999, MAX_RESOLUTION] {
            for triangles in [1u32, 2, 3, 7, 12, 100, 4_999, 10_000, 1_000_001] {
                let ppt = points_per_triangle(resolution, triangles);
                assert_eq!(ppt, resolution * resolution / triangles);
                let total = candidate_count(ppt, triangles);
                assert!(total < point_capacity(resolution), "R={} T={}", resolution, triangles);
            }
        }
    }

    #[test]
    fn too_many_triangles_gives_zero_points() {
        assert_eq!(points_per_triangle(10, 101), 0);
        assert_eq!(candidate_count(0, 101), 0);
    }

    #[test]
    fn fold_lands_in_simplex_and_is_idempotent() {
        let mut rng = StdRng::seed_from_u64(0x5eed);
        for _ in 0..10_000 {
            let (u, v) = fold(rng.gen::<f32>(), rng.gen::<f32>());
            assert!(u >= 0.0 && v >= 0.0 && u + v <= 1.0, "({}, {})", u, v);
            assert_eq!(fold(u, v), (u, v));
        }
        assert_eq!(fold(1.0, 0.0), (1.0, 0.0));
        assert_eq!(fold(0.75, 0.75), (0.25, 0.25));
    }

    #[test]
    fn random_pair_is_deterministic_and_in_range() {
        for index in 0..2_000 {
            let (u, v) = random_pair(42, index);
            assert!((0.0..1.0).contains(&u) && (0.0..1.0).contains(&v));
            assert_eq!(random_pair(42, index), (u, v));
        }
        assert_ne!(random_pair(1, 0), random_pair(2, 0));
    }

    #[test]
    fn normalized_magnitude_stays_in_visual_range() {
        for magnitude in [0.1f32, 1.0, 4.5, 10.0, 100.0] {
            let scaled = magnitude * normalization_factor(magnitude);
            assert!(
                (MIN_VISUAL_SIZE - 1e-4..=MAX_VISUAL_SIZE + 1e-4).contains(&scaled),
                "{} -> {}",
                magnitude,
                scaled
            );
        }
        assert_eq!(normalization_factor(0.0), 1.0);
    }

    #[test]
    fn step_size_table() {
        assert_eq!(step_size(100, 50.0), 250.0);
        assert_eq!(step_size(100, 400.0), 287.5);
        assert_eq!(step_size(100, 0.0), 250.0);
        let sparse = step_size(10, 1.0e9);
        assert!(sparse <= 300.0 && sparse > 299.9);
    }

    #[test]
    fn sampled_points_lie_on_the_triangle() {
        let mesh = SourceMesh::from_geometry(
            vec![[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]],
            vec![0, 1, 2],
        );
        let sampling = SurfaceSampling::new(0, &mesh, 10, 9);
        assert_eq!(sampling.points_per_triangle, 100);
        assert_eq!(sampling.candidates, 99);
        for i in 0..sampling.candidates {
            let p = sampling.point(&mesh, i) / sampling.scale;
            assert!(p.x >= -1e-6 && p.y >= -1e-6 && p.x + p.y <= 1.0 + 1e-5);
            assert_eq!(p.z, 0.0);
        }
    }
}
