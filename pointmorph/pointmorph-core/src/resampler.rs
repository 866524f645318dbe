//! Resampler: scatter a fixed budget of points over one mesh's surface.

use log::{debug, warn};
use point_api::{dispatch_grid, BufferId, KernelKind, PointCloudBackend, SampleBindings, SampleParams};

use crate::error::{MorphError, MorphResult};
use crate::sampling::MeshSlot;

/// Result of sampling a single mesh into the position buffer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResampleOutput {
    pub active_points: u32,
    pub step_size: f32,
}

/// Fill `points` with `slot.sampling.candidates` positions on `slot.mesh`.
///
/// One thread per (triangle, point-within-triangle) pair. A mesh with more triangles than the
/// buffer has slots gets zero points rather than an error.
pub fn resample<B: PointCloudBackend + ?Sized>(
    backend: &mut B,
    points: BufferId,
    slot: &MeshSlot<'_>,
) -> MorphResult<ResampleOutput> {
    let sampling = &slot.sampling;
    if sampling.triangle_count == 0 {
        return Err(MorphError::EmptyMesh { index: sampling.mesh_index });
    }
    if sampling.points_per_triangle == 0 {
        warn!(
            "mesh {} has {} triangles for {} slots; sampling yields no points",
            sampling.mesh_index,
            sampling.triangle_count,
            sampling.resolution * sampling.resolution
        );
    }

    let (groups_x, groups_y, dispatch_width) = dispatch_grid(sampling.candidates);
    let params = SampleParams {
        point_count: sampling.candidates,
        dispatch_width,
        target_points_per_triangle: sampling.points_per_triangle,
        target_candidates: sampling.candidates,
        source_points_per_triangle: sampling.points_per_triangle,
        source_candidates: sampling.candidates,
        target_seed: sampling.seed,
        source_seed: sampling.seed,
        target_scale: sampling.scale,
        source_scale: sampling.scale,
        progress: 1.0,
        _pad: 0.0,
    };
    if sampling.candidates > 0 {
        let bindings = SampleBindings { points, target: slot.buffers, source: None };
        backend
            .dispatch(KernelKind::Resample, &params, &bindings, (groups_x, groups_y))
            .map_err(MorphError::Backend)?;
    }
    debug!(
        "resampled mesh {}: {} points ({} per triangle), scale {:.3}",
        sampling.mesh_index, sampling.candidates, sampling.points_per_triangle, sampling.scale
    );
    Ok(ResampleOutput { active_points: sampling.candidates, step_size: sampling.natural_step_size() })
}
