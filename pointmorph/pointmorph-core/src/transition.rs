//! Transitioner: move the cloud from the current mesh's surface to the target's.
//!
//! Slot `i` blends source slot `i mod source_candidates` with target slot `i mod target_candidates`.
//! The pairing is purely index based; no geometric correspondence is solved for.

use log::debug;
use point_api::{dispatch_grid, BufferId, KernelKind, PointCloudBackend, SampleBindings, SampleParams};

use crate::error::{MorphError, MorphResult};
use crate::sampling::{lerp, step_size, MeshSlot, SurfaceSampling};

/// Per-frame morph state; reset whenever a new target is chosen.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TransitionState {
    pub current_mesh_index: usize,
    pub target_mesh_index: usize,
    /// Eased progress; InBack dips below 0 early in the ramp.
    pub progress: f32,
    pub is_transitioning: bool,
    pub active_point_count: u32,
    pub step_size: f32,
    pub interpolated_vertex_count: f32,
}

impl TransitionState {
    /// Resting state showing `sampling` alone.
    pub fn settled(sampling: &SurfaceSampling) -> Self {
        Self {
            current_mesh_index: sampling.mesh_index,
            target_mesh_index: sampling.mesh_index,
            progress: 0.0,
            is_transitioning: false,
            active_point_count: sampling.candidates,
            step_size: sampling.natural_step_size(),
            interpolated_vertex_count: sampling.vertex_count as f32,
        }
    }

    /// Enter a new transition toward `target`.
    pub fn begin(&mut self, target: &SurfaceSampling) {
        self.target_mesh_index = target.mesh_index;
        self.progress = 0.0;
        self.is_transitioning = true;
    }

    /// Target becomes current.
    pub fn settle(&mut self, target: &SurfaceSampling) {
        *self = Self::settled(target);
    }
}

/// Active count for eased `progress` when moving from `from` to `to` points.
///
/// Shrinking finishes within the first quarter (`progress * 4`); growing happens in the
/// `(progress - 0.5) * 4` window. Both parameters clamp to [0, 1], so the count is monotone in
/// progress and ends exactly at `to`.
pub fn interpolate_active_count(from: u32, to: u32, progress: f32) -> u32 {
    let t = if to < from {
        (progress * 4.0).clamp(0.0, 1.0)
    } else if to > from {
        ((progress - 0.5) * 4.0).clamp(0.0, 1.0)
    } else {
        return to;
    };
    lerp(from as f32, to as f32, t).round() as u32
}

/// One frame of the transition: dispatch the blend kernel and update `state`.
///
/// Points-per-triangle for the target is recomputed from its mesh on every call.
pub fn step_transition<B: PointCloudBackend + ?Sized>(
    backend: &mut B,
    points: BufferId,
    progress: f32,
    current: &MeshSlot<'_>,
    target: &MeshSlot<'_>,
    state: &mut TransitionState,
) -> MorphResult<()> {
    let source = &current.sampling;
    let target_sampling = SurfaceSampling::new(
        target.sampling.mesh_index,
        target.mesh,
        target.sampling.resolution,
        target.sampling.seed,
    );
    if target_sampling.triangle_count == 0 {
        return Err(MorphError::EmptyMesh { index: target_sampling.mesh_index });
    }

    let point_count = source.candidates.max(target_sampling.candidates);
    let (groups_x, groups_y, dispatch_width) = dispatch_grid(point_count);
    let params = SampleParams {
        point_count,
        dispatch_width,
        target_points_per_triangle: target_sampling.points_per_triangle,
        target_candidates: target_sampling.candidates,
        source_points_per_triangle: source.points_per_triangle,
        source_candidates: source.candidates,
        target_seed: target_sampling.seed,
        source_seed: source.seed,
        target_scale: target_sampling.scale,
        source_scale: source.scale,
        progress,
        _pad: 0.0,
    };
    if point_count > 0 {
        let bindings = SampleBindings { points, target: target.buffers, source: Some(current.buffers) };
        backend
            .dispatch(KernelKind::Transition, &params, &bindings, (groups_x, groups_y))
            .map_err(MorphError::Backend)?;
    }

    let linear = progress.clamp(0.0, 1.0);
    state.progress = progress;
    state.active_point_count = interpolate_active_count(source.candidates, target_sampling.candidates, progress);
    state.interpolated_vertex_count = lerp(source.vertex_count as f32, target_sampling.vertex_count as f32, linear);
    state.step_size = step_size(target_sampling.resolution, state.interpolated_vertex_count);
    debug!(
        "transition {} -> {}: progress {:.3}, {} active, step {:.1}",
        source.mesh_index, target_sampling.mesh_index, progress, state.active_point_count, state.step_size
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ease::{EaseKind, DEFAULT_BACK_OVERSHOOT};
    use crate::primitives;
    use crate::reference::CpuBackend;
    use crate::resampler::resample;
    use crate::resources::{GpuBuffer, MeshBuffers};
    use crate::sampling::point_capacity;
    use glam::Vec3;

    fn eased_samples(ease: EaseKind) -> Vec<f32> {
        (0..=200).map(|i| ease.apply(i as f32 / 200.0)).collect()
    }

    #[test]
    fn shrink_is_monotone_and_done_by_first_quarter() {
        for ease in [
            EaseKind::InCubic,
            EaseKind::InExpo,
            EaseKind::InBack { overshoot: DEFAULT_BACK_OVERSHOOT },
            EaseKind::InSine,
        ] {
            let mut last = u32::MAX;
            for p in eased_samples(ease) {
                let count = interpolate_active_count(9_999, 4_999, p);
                assert!(count <= last, "{} at {}", ease.name(), p);
                if p >= 0.25 {
                    assert_eq!(count, 4_999);
                }
                last = count;
            }
            assert_eq!(last, 4_999);
        }
    }

    #[test]
    fn grow_is_monotone_and_waits_for_second_half() {
        for ease in [EaseKind::InCubic, EaseKind::InBack { overshoot: DEFAULT_BACK_OVERSHOOT }, EaseKind::InSine] {
            let mut last = 0;
            for p in eased_samples(ease) {
                let count = interpolate_active_count(4_999, 9_999, p);
                assert!(count >= last);
                if p <= 0.5 {
                    assert_eq!(count, 4_999);
                }
                if p >= 0.75 {
                    assert_eq!(count, 9_999);
                }
                last = count;
            }
        }
    }

    #[test]
    fn equal_counts_stay_put() {
        assert_eq!(interpolate_active_count(99, 99, 0.3), 99);
    }

    #[test]
    fn blend_endpoints_match_each_surface() {
        let resolution = 20;
        let a = primitives::cube(1.0);
        let b = primitives::octahedron(2.0);
        let mut backend = CpuBackend::new();
        let mut points = GpuBuffer::new(backend.create_point_buffer(point_capacity(resolution)).unwrap());
        let mut buffers_a = MeshBuffers::upload(&mut backend, &a).unwrap();
        let mut buffers_b = MeshBuffers::upload(&mut backend, &b).unwrap();
        let current = MeshSlot { mesh: &a, buffers: buffers_a.ids().unwrap(), sampling: SurfaceSampling::new(0, &a, resolution, 10) };
        let target = MeshSlot { mesh: &b, buffers: buffers_b.ids().unwrap(), sampling: SurfaceSampling::new(1, &b, resolution, 20) };
        let id = points.id().unwrap();

        let out = resample(&mut backend, id, &current).unwrap();
        let mut state = TransitionState::settled(&current.sampling);
        assert_eq!(state.active_point_count, out.active_points);
        let before: Vec<[f32; 4]> = backend.points(id).unwrap().to_vec();

        state.begin(&target.sampling);
        step_transition(&mut backend, id, 0.0, &current, &target, &mut state).unwrap();
        let at_zero = backend.points(id).unwrap();
        for i in 0..current.sampling.candidates as usize {
            assert!(Vec3::from_slice(&at_zero[i][..3]).distance(Vec3::from_slice(&before[i][..3])) < 1e-5);
        }

        step_transition(&mut backend, id, 1.0, &current, &target, &mut state).unwrap();
        let at_one = backend.points(id).unwrap();
        for i in 0..target.sampling.candidates {
            let expected = target.sampling.point(&b, i);
            assert!(Vec3::from_slice(&at_one[i as usize][..3]).distance(expected) < 1e-5);
        }
        assert_eq!(state.active_point_count, target.sampling.candidates);
        assert_eq!(state.interpolated_vertex_count, b.vertex_count() as f32);
        assert_eq!(state.step_size, target.sampling.natural_step_size());

        points.release(&mut backend);
        buffers_a.release(&mut backend);
        buffers_b.release(&mut backend);
    }

    #[test]
    fn extra_slots_wrap_onto_smaller_source() {
        let resolution = 10;
        let a = primitives::quad();
        let b = primitives::triangle();
        let mut backend = CpuBackend::new();
        let mut points = GpuBuffer::new(backend.create_point_buffer(point_capacity(resolution)).unwrap());
        let mut buffers_a = MeshBuffers::upload(&mut backend, &a).unwrap();
        let mut buffers_b = MeshBuffers::upload(&mut backend, &b).unwrap();
        let current = MeshSlot { mesh: &a, buffers: buffers_a.ids().unwrap(), sampling: SurfaceSampling::new(0, &a, resolution, 1) };
        let target = MeshSlot { mesh: &b, buffers: buffers_b.ids().unwrap(), sampling: SurfaceSampling::new(1, &b, resolution, 2) };
        let mut state = TransitionState::settled(&current.sampling);
        state.begin(&target.sampling);
        step_transition(&mut backend, points.id().unwrap(), 0.5, &current, &target, &mut state).unwrap();
        let params = backend.last_params().unwrap();
        assert_eq!(params.point_count, 99);
        assert_eq!(params.target_points_per_triangle, 100);
        assert_eq!(params.source_points_per_triangle, 50);
        assert_eq!(state.active_point_count, 99);
        points.release(&mut backend);
        buffers_a.release(&mut backend);
        buffers_b.release(&mut backend);
    }
}
