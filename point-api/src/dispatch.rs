//! Compute dispatch contract shared by every backend and mirrored by `sample.wgsl`.

use bytemuck::{Pod, Zeroable};

/// Threads per work-group along x. Must match `@workgroup_size` in the kernel.
pub const WORKGROUP_SIZE: u32 = 64;
/// Per-axis work-group limit guaranteed by WebGPU.
pub const MAX_GROUPS_PER_AXIS: u32 = 65535;

/// Opaque handle to a buffer owned by a backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BufferId(pub u64);

/// Vertex and triangle-index buffers uploaded for one mesh.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MeshBufferIds {
    pub vertices: BufferId,
    pub triangles: BufferId,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KernelKind {
    /// Scatter points over the target mesh only.
    Resample,
    /// Interpolate each slot between the source and target surfaces.
    Transition,
}

/// Uniform block for the sampling kernels (48 bytes, std140 compatible).
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Pod, Zeroable)]
pub struct SampleParams {
    /// Slots to write this dispatch.
    pub point_count: u32,
    /// Threads per grid row (`groups_x * WORKGROUP_SIZE`).
    pub dispatch_width: u32,
    pub target_points_per_triangle: u32,
    pub target_candidates: u32,
    pub source_points_per_triangle: u32,
    pub source_candidates: u32,
    pub target_seed: u32,
    pub source_seed: u32,
    pub target_scale: f32,
    pub source_scale: f32,
    pub progress: f32,
    pub _pad: f32,
}

/// Buffers bound for one dispatch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SampleBindings {
    pub points: BufferId,
    pub target: MeshBufferIds,
    /// `None` for [`KernelKind::Resample`].
    pub source: Option<MeshBufferIds>,
}

/// 2D work-group grid covering `point_count` threads: `(groups_x, groups_y, dispatch_width)`.
pub fn dispatch_grid(point_count: u32) -> (u32, u32, u32) {
    if point_count == 0 {
        return (0, 0, 0);
    }
    let groups = point_count.div_ceil(WORKGROUP_SIZE);
    let groups_x = groups.min(MAX_GROUPS_PER_AXIS);
    let groups_y = groups.div_ceil(groups_x);
    (groups_x, groups_y, groups_x * WORKGROUP_SIZE)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn params_layout_is_48_bytes() {
        assert_eq!(std::mem::size_of::<SampleParams>(), 48);
    }

    #[test]
    fn grid_covers_all_points() {
        for n in [1u32, 63, 64, 65, 99, 10_000, 999_999, 5_000_000] {
            let (gx, gy, width) = dispatch_grid(n);
            assert!(gx <= MAX_GROUPS_PER_AXIS && gy <= MAX_GROUPS_PER_AXIS);
            assert_eq!(width, gx * WORKGROUP_SIZE);
            assert!(u64::from(gx) * u64::from(gy) * u64::from(WORKGROUP_SIZE) >= u64::from(n));
        }
    }

    #[test]
    fn empty_grid() {
        assert_eq!(dispatch_grid(0), (0, 0, 0));
    }
}
