//! PointMorph component: samples a random mesh on start, then keeps morphing toward new random
//! meshes until stopped. The host owns the frame loop and calls [`PointMorph::update`] once per
//! frame before rendering.

use log::{debug, info, warn};
use point_api::{BufferId, ExtractedPointCloud, MeshBufferIds, PointCloudBackend, SourceMesh};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::config::MorphConfig;
use crate::ease::{EaseKind, EasePolicy};
use crate::error::{MorphError, MorphResult};
use crate::resampler::resample;
use crate::resources::{GpuBuffer, MeshBuffers};
use crate::sampling::{point_capacity, MeshSlot, SurfaceSampling};
use crate::timeline::{Timeline, TimelineEvent};
use crate::transition::{step_transition, TransitionState};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Cue {
    BeginTransition,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Stopped,
    /// Showing the current mesh, waiting for the next transition.
    Idle,
    Transitioning,
}

/// Random index in `0..len` different from `current`, retrying until one is found.
/// `None` when there is no other mesh to pick.
pub fn pick_distinct_index<R: Rng + ?Sized>(rng: &mut R, len: usize, current: usize) -> Option<usize> {
    if len < 2 {
        return None;
    }
    loop {
        let index = rng.gen_range(0..len);
        if index != current {
            return Some(index);
        }
    }
}

fn resident(buffers: &MeshBuffers) -> MorphResult<MeshBufferIds> {
    buffers.ids().ok_or(MorphError::NotStarted)
}

pub struct PointMorph {
    meshes: Vec<SourceMesh>,
    config: MorphConfig,
    resolution: u32,
    policy: EasePolicy,
    rng: StdRng,
    timeline: Timeline<Cue>,
    points: GpuBuffer,
    current_buffers: MeshBuffers,
    target_buffers: MeshBuffers,
    current: Option<SurfaceSampling>,
    target: Option<SurfaceSampling>,
    ease: Option<EaseKind>,
    state: TransitionState,
    running: bool,
    completed: u64,
}

impl PointMorph {
    pub fn new(meshes: Vec<SourceMesh>, config: MorphConfig) -> MorphResult<Self> {
        if meshes.is_empty() {
            return Err(MorphError::NoMeshes);
        }
        for (index, mesh) in meshes.iter().enumerate() {
            if mesh.triangle_count() == 0 {
                return Err(MorphError::EmptyMesh { index });
            }
            let vertex_count = mesh.vertex_count();
            if let Some(&bad) = mesh.indices.iter().find(|&&i| i >= vertex_count) {
                return Err(MorphError::IndexOutOfRange { mesh: index, index: bad, vertex_count });
            }
        }
        config.validate()?;
        let policy = EasePolicy::new(config.ease_weights, config.back_overshoot)?;
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let resolution = config.effective_resolution();
        if resolution != config.resolution {
            warn!("resolution {} clamped to {}", config.resolution, resolution);
        }
        Ok(Self {
            meshes,
            config,
            resolution,
            policy,
            rng,
            timeline: Timeline::new(),
            points: GpuBuffer::default(),
            current_buffers: MeshBuffers::default(),
            target_buffers: MeshBuffers::default(),
            current: None,
            target: None,
            ease: None,
            state: TransitionState::default(),
            running: false,
            completed: 0,
        })
    }

    pub fn resolution(&self) -> u32 {
        self.resolution
    }

    pub fn config(&self) -> &MorphConfig {
        &self.config
    }

    pub fn mesh_count(&self) -> usize {
        self.meshes.len()
    }

    pub fn state(&self) -> &TransitionState {
        &self.state
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn phase(&self) -> Phase {
        match (self.running, self.state.is_transitioning) {
            (false, _) => Phase::Stopped,
            (true, false) => Phase::Idle,
            (true, true) => Phase::Transitioning,
        }
    }

    pub fn current_sampling(&self) -> Option<SurfaceSampling> {
        self.current
    }

    pub fn target_sampling(&self) -> Option<SurfaceSampling> {
        self.target
    }

    /// Ease of the running transition.
    pub fn current_ease(&self) -> Option<EaseKind> {
        self.ease
    }

    pub fn completed_transitions(&self) -> u64 {
        self.completed
    }

    /// Position buffer, while running.
    pub fn points(&self) -> Option<BufferId> {
        self.points.id()
    }

    /// What the renderer should draw this frame.
    pub fn draw_state(&self) -> ExtractedPointCloud {
        ExtractedPointCloud {
            points: self.points.id(),
            active_points: self.state.active_point_count,
            step_size: self.state.step_size,
        }
    }

    /// Allocate the point buffer, sample a random mesh and schedule the first transition.
    /// Calling start on a running component does nothing.
    pub fn start<B: PointCloudBackend + ?Sized>(&mut self, backend: &mut B) -> MorphResult<()> {
        if self.running {
            return Ok(());
        }
        let result = self.activate(backend);
        if result.is_err() {
            self.stop(backend);
        }
        result
    }

    /// Advance scheduling by `dt` seconds and hand the new draw state to `backend`.
    /// Any backend failure stops the component and is returned.
    pub fn update<B: PointCloudBackend + ?Sized>(&mut self, dt: f32, backend: &mut B) -> MorphResult<()> {
        if !self.running {
            return Err(MorphError::NotStarted);
        }
        let result = self.advance(dt, backend);
        match result {
            Ok(()) => backend.prepare(&self.draw_state()),
            Err(_) => self.stop(backend),
        }
        result
    }

    /// Release every buffer the component owns. Safe to call repeatedly.
    pub fn stop<B: PointCloudBackend + ?Sized>(&mut self, backend: &mut B) {
        self.timeline.clear();
        self.points.release(backend);
        self.current_buffers.release(backend);
        self.target_buffers.release(backend);
        if self.running {
            info!("point morph stopped after {} transitions", self.completed);
            backend.prepare(&ExtractedPointCloud::default());
        }
        self.running = false;
        self.current = None;
        self.target = None;
        self.ease = None;
        self.state = TransitionState::default();
    }

    fn activate<B: PointCloudBackend + ?Sized>(&mut self, backend: &mut B) -> MorphResult<()> {
        let capacity = point_capacity(self.resolution);
        let points = backend.create_point_buffer(capacity).map_err(MorphError::Backend)?;
        self.points = GpuBuffer::new(points);
        self.running = true;
        self.completed = 0;

        let index = self.rng.gen_range(0..self.meshes.len());
        let mesh = &self.meshes[index];
        self.current_buffers = MeshBuffers::upload(backend, mesh)?;
        let sampling = SurfaceSampling::new(index, mesh, self.resolution, self.rng.gen());
        let slot = MeshSlot { mesh, buffers: resident(&self.current_buffers)?, sampling };
        resample(backend, points, &slot)?;
        self.current = Some(sampling);
        self.state = TransitionState::settled(&sampling);
        info!(
            "point morph started: resolution {}, {} slots, mesh {} ({} points)",
            self.resolution, capacity, index, sampling.candidates
        );

        if self.meshes.len() >= 2 {
            self.timeline.push_hold(self.config.initial_delay);
            self.timeline.push_marker(Cue::BeginTransition);
        } else {
            warn!("only one mesh configured; transitions are disabled");
        }
        backend.prepare(&self.draw_state());
        Ok(())
    }

    fn advance<B: PointCloudBackend + ?Sized>(&mut self, dt: f32, backend: &mut B) -> MorphResult<()> {
        for event in self.timeline.advance(dt) {
            match event {
                TimelineEvent::Marker(Cue::BeginTransition) => self.begin_transition(backend)?,
                TimelineEvent::Progress(progress) => self.step(backend, progress)?,
                TimelineEvent::RampComplete => self.finish_transition(backend),
            }
        }
        Ok(())
    }

    fn begin_transition<B: PointCloudBackend + ?Sized>(&mut self, backend: &mut B) -> MorphResult<()> {
        let current = self.current.ok_or(MorphError::NotStarted)?;
        let Some(index) = pick_distinct_index(&mut self.rng, self.meshes.len(), current.mesh_index) else {
            return Ok(());
        };
        self.target_buffers.release(backend);
        let mesh = &self.meshes[index];
        self.target_buffers = MeshBuffers::upload(backend, mesh)?;
        let sampling = SurfaceSampling::new(index, mesh, self.resolution, self.rng.gen());
        let ease = self.policy.choose(&mut self.rng);
        self.state.begin(&sampling);
        self.target = Some(sampling);
        self.ease = Some(ease);
        self.timeline.push_ramp(self.config.transition_duration, ease);
        info!(
            "morphing mesh {} -> {} ({} -> {} points, {})",
            current.mesh_index,
            index,
            current.candidates,
            sampling.candidates,
            ease.name()
        );
        Ok(())
    }

    fn step<B: PointCloudBackend + ?Sized>(&mut self, backend: &mut B, progress: f32) -> MorphResult<()> {
        let (Some(current), Some(target)) = (self.current, self.target) else {
            return Ok(());
        };
        let points = self.points.id().ok_or(MorphError::NotStarted)?;
        let current = MeshSlot {
            mesh: &self.meshes[current.mesh_index],
            buffers: resident(&self.current_buffers)?,
            sampling: current,
        };
        let target = MeshSlot {
            mesh: &self.meshes[target.mesh_index],
            buffers: resident(&self.target_buffers)?,
            sampling: target,
        };
        step_transition(backend, points, progress, &current, &target, &mut self.state)
    }

    fn finish_transition<B: PointCloudBackend + ?Sized>(&mut self, backend: &mut B) {
        let Some(target) = self.target.take() else {
            return;
        };
        self.current_buffers.release(backend);
        self.current_buffers = std::mem::take(&mut self.target_buffers);
        self.current = Some(target);
        self.state.settle(&target);
        self.ease = None;
        self.completed += 1;
        debug!("mesh {} is now current ({} points)", target.mesh_index, target.candidates);
        self.timeline.push_hold(self.config.hold_duration);
        self.timeline.push_marker(Cue::BeginTransition);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::primitives;
    use crate::reference::CpuBackend;
    use point_api::ExtractedView;

    const DT: f32 = 1.0 / 60.0;

    fn config(resolution: u32, seed: u64) -> MorphConfig {
        MorphConfig {
            resolution,
            transition_duration: 1.0,
            hold_duration: 0.5,
            initial_delay: 0.25,
            seed: Some(seed),
            ..MorphConfig::default()
        }
    }

    fn pair() -> Vec<SourceMesh> {
        vec![primitives::triangle(), primitives::quad()]
    }

    #[test]
    fn start_samples_one_mesh() {
        for seed in 0..8 {
            let mut backend = CpuBackend::new();
            let mut morph = PointMorph::new(pair(), config(10, seed)).unwrap();
            morph.start(&mut backend).unwrap();
            let sampling = morph.current_sampling().unwrap();
            let expected_ppt = if sampling.mesh_index == 0 { 100 } else { 50 };
            assert_eq!(sampling.points_per_triangle, expected_ppt);
            assert_eq!(morph.state().active_point_count, 99);
            assert_eq!(morph.phase(), Phase::Idle);
            assert_eq!(backend.bound().active_points, 99);
            morph.stop(&mut backend);
        }
    }

    #[test]
    fn transition_ends_on_the_other_mesh() {
        let mut backend = CpuBackend::new();
        let mut morph = PointMorph::new(pair(), config(10, 21)).unwrap();
        morph.start(&mut backend).unwrap();
        let first = morph.state().current_mesh_index;
        let mut saw_transition = false;
        for _ in 0..200 {
            morph.update(DT, &mut backend).unwrap();
            if morph.phase() == Phase::Transitioning {
                saw_transition = true;
                assert_ne!(morph.state().target_mesh_index, morph.state().current_mesh_index);
            }
            if morph.completed_transitions() == 1 {
                break;
            }
        }
        assert!(saw_transition);
        assert_eq!(morph.completed_transitions(), 1);
        let state = morph.state();
        assert_eq!(state.current_mesh_index, 1 - first);
        assert!(!state.is_transitioning);
        let natural = morph.current_sampling().unwrap().candidates;
        assert!(state.active_point_count.abs_diff(natural) <= 1);
        morph.stop(&mut backend);
    }

    #[test]
    fn single_mesh_never_transitions() {
        let mut backend = CpuBackend::new();
        let mut morph = PointMorph::new(vec![primitives::cube(1.0)], config(16, 1)).unwrap();
        morph.start(&mut backend).unwrap();
        for _ in 0..300 {
            morph.update(DT, &mut backend).unwrap();
            assert_eq!(morph.phase(), Phase::Idle);
        }
        assert_eq!(backend.dispatch_count(), 1);
        morph.stop(&mut backend);
    }

    #[test]
    fn stop_is_idempotent_and_releases_everything() {
        let mut backend = CpuBackend::new();
        let mut morph = PointMorph::new(primitives::demo_set(), config(32, 4)).unwrap();
        morph.start(&mut backend).unwrap();
        for _ in 0..90 {
            morph.update(DT, &mut backend).unwrap();
        }
        morph.stop(&mut backend);
        morph.stop(&mut backend);
        assert_eq!(backend.live_buffers(), 0);
        assert_eq!(morph.points(), None);
        assert_eq!(morph.phase(), Phase::Stopped);
        assert_eq!(backend.bound(), &ExtractedPointCloud::default());
        assert_eq!(morph.update(DT, &mut backend), Err(MorphError::NotStarted));
    }

    #[test]
    fn mesh_buffers_do_not_accumulate_across_cycles() {
        let mut backend = CpuBackend::new();
        let mut morph = PointMorph::new(primitives::demo_set(), config(40, 9)).unwrap();
        morph.start(&mut backend).unwrap();
        while morph.completed_transitions() < 4 {
            morph.update(DT, &mut backend).unwrap();
            match morph.phase() {
                Phase::Idle => assert_eq!(backend.live_buffers(), 3),
                Phase::Transitioning => assert_eq!(backend.live_buffers(), 5),
                Phase::Stopped => unreachable!(),
            }
        }
        morph.stop(&mut backend);
    }

    #[test]
    fn active_count_is_monotone_within_each_transition() {
        let mut backend = CpuBackend::new();
        let mut morph = PointMorph::new(primitives::demo_set(), config(50, 77)).unwrap();
        morph.start(&mut backend).unwrap();
        let capacity = point_capacity(morph.resolution());
        let mut previous: Option<(usize, u32)> = None;
        while morph.completed_transitions() < 6 {
            morph.update(DT, &mut backend).unwrap();
            let state = morph.state();
            assert!(state.active_point_count < capacity);
            if !state.is_transitioning {
                previous = None;
                continue;
            }
            let from = morph.current_sampling().unwrap().candidates;
            let to = morph.target_sampling().unwrap().candidates;
            if let Some((target, last)) = previous {
                if target == state.target_mesh_index {
                    if to < from {
                        assert!(state.active_point_count <= last);
                    } else {
                        assert!(state.active_point_count >= last);
                    }
                }
            }
            previous = Some((state.target_mesh_index, state.active_point_count));
        }
        morph.stop(&mut backend);
    }

    #[test]
    fn renders_only_active_points() {
        let mut backend = CpuBackend::new();
        let mut morph = PointMorph::new(pair(), config(10, 2)).unwrap();
        morph.start(&mut backend).unwrap();
        morph.update(DT, &mut backend).unwrap();
        backend.render_frame(&ExtractedView::default()).unwrap();
        assert_eq!(backend.last_drawn(), morph.state().active_point_count);
        assert_eq!(backend.visible_points().len(), morph.state().active_point_count as usize);
        morph.stop(&mut backend);
    }

    #[test]
    fn rejects_invalid_mesh_lists() {
        assert!(matches!(PointMorph::new(Vec::new(), MorphConfig::default()), Err(MorphError::NoMeshes)));
        let empty = SourceMesh::from_geometry(vec![[0.0; 3]; 3], Vec::new());
        assert!(matches!(
            PointMorph::new(vec![primitives::quad(), empty], MorphConfig::default()),
            Err(MorphError::EmptyMesh { index: 1 })
        ));
        let broken = SourceMesh::from_geometry(vec![[0.0; 3]; 3], vec![0, 1, 3]);
        assert!(matches!(
            PointMorph::new(vec![broken], MorphConfig::default()),
            Err(MorphError::IndexOutOfRange { mesh: 0, index: 3, vertex_count: 3 })
        ));
    }

    #[test]
    fn allocation_failure_is_fatal_and_leaves_nothing_behind() {
        let mut backend = CpuBackend::new();
        backend.set_fail_allocations(true);
        let mut morph = PointMorph::new(pair(), config(10, 0)).unwrap();
        assert!(matches!(morph.start(&mut backend), Err(MorphError::Backend(_))));
        assert!(!morph.is_running());
        assert_eq!(backend.live_buffers(), 0);
    }

    #[test]
    fn failure_mid_run_stops_the_component() {
        let mut backend = CpuBackend::new();
        let mut morph = PointMorph::new(pair(), config(10, 5)).unwrap();
        morph.start(&mut backend).unwrap();
        backend.set_fail_allocations(true);
        let mut result = Ok(());
        for _ in 0..60 {
            result = morph.update(DT, &mut backend);
            if result.is_err() {
                break;
            }
        }
        assert!(matches!(result, Err(MorphError::Backend(_))));
        assert!(!morph.is_running());
        assert_eq!(backend.live_buffers(), 0);
    }

    #[test]
    fn picked_target_always_differs() {
        let mut rng = StdRng::seed_from_u64(99);
        for len in 2..7 {
            for current in 0..len {
                for _ in 0..200 {
                    let index = pick_distinct_index(&mut rng, len, current).unwrap();
                    assert_ne!(index, current);
                    assert!(index < len);
                }
            }
        }
        assert_eq!(pick_distinct_index(&mut rng, 1, 0), None);
    }

    #[test]
    fn out_of_range_resolution_is_clamped() {
        let morph = PointMorph::new(pair(), config(4, 0)).unwrap();
        assert_eq!(morph.resolution(), 10);
    }
}
