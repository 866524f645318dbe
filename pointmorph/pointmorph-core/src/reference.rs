//! CPU reference backend. Runs the sampling kernels serially with the same math as
//! `sample.wgsl` and records draw state instead of rasterising. Used by tests and the
//! `cpu_morph` debug binary.

use std::collections::HashMap;

use glam::Vec3;
use point_api::{
    BufferId, ExtractedPointCloud, ExtractedView, KernelKind, MeshBufferIds, PointCloudBackend,
    SampleBindings, SampleParams, SourceMesh, WORKGROUP_SIZE,
};

use crate::sampling::place_on_triangle;

#[derive(Debug)]
enum CpuBuffer {
    Points(Vec<[f32; 4]>),
    Vertices(Vec<[f32; 4]>),
    Triangles(Vec<u32>),
}

#[derive(Debug, Default)]
pub struct CpuBackend {
    buffers: HashMap<BufferId, CpuBuffer>,
    next_id: u64,
    bound: ExtractedPointCloud,
    dispatch_count: usize,
    frames_rendered: usize,
    released: usize,
    last_params: Option<SampleParams>,
    last_drawn: u32,
    fail_allocations: bool,
}

impl CpuBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every following allocation fail, as a lost device would.
    pub fn set_fail_allocations(&mut self, fail: bool) {
        self.fail_allocations = fail;
    }

    pub fn points(&self, id: BufferId) -> Option<&[[f32; 4]]> {
        match self.buffers.get(&id) {
            Some(CpuBuffer::Points(data)) => Some(data),
            _ => None,
        }
    }

    /// Positions the renderer would draw this frame.
    pub fn visible_points(&self) -> &[[f32; 4]] {
        match self.bound.points.and_then(|id| self.points(id)) {
            Some(data) => &data[..(self.bound.active_points as usize).min(data.len())],
            None => &[],
        }
    }

    pub fn bound(&self) -> &ExtractedPointCloud {
        &self.bound
    }

    pub fn live_buffers(&self) -> usize {
        self.buffers.len()
    }

    pub fn released_buffers(&self) -> usize {
        self.released
    }

    pub fn dispatch_count(&self) -> usize {
        self.dispatch_count
    }

    pub fn frames_rendered(&self) -> usize {
        self.frames_rendered
    }

    pub fn last_drawn(&self) -> u32 {
        self.last_drawn
    }

    pub fn last_params(&self) -> Option<SampleParams> {
        self.last_params
    }

    fn mint(&mut self, buffer: CpuBuffer) -> Result<BufferId, String> {
        if self.fail_allocations {
            return Err("cpu backend: allocation refused".to_string());
        }
        let id = BufferId(self.next_id);
        self.next_id += 1;
        self.buffers.insert(id, buffer);
        Ok(id)
    }

    fn mesh(&self, ids: MeshBufferIds) -> Result<(&[[f32; 4]], &[u32]), String> {
        match (self.buffers.get(&ids.vertices), self.buffers.get(&ids.triangles)) {
            (Some(CpuBuffer::Vertices(v)), Some(CpuBuffer::Triangles(t))) => Ok((v, t)),
            _ => Err(format!("cpu backend: {:?} is not a resident mesh", ids)),
        }
    }
}

fn surface_point(vertices: &[[f32; 4]], triangles: &[u32], ppt: u32, seed: u32, scale: f32, slot: u32) -> Vec3 {
    let tri = (slot / ppt) as usize;
    let vertex = |k: usize| Vec3::from_slice(&vertices[triangles[tri * 3 + k] as usize][..3]);
    place_on_triangle(vertex(0), vertex(1), vertex(2), seed, slot, scale)
}

impl PointCloudBackend for CpuBackend {
    fn create_point_buffer(&mut self, capacity: u32) -> Result<BufferId, String> {
        self.mint(CpuBuffer::Points(vec![[0.0; 4]; capacity as usize]))
    }

    fn upload_mesh(&mut self, mesh: &SourceMesh) -> Result<MeshBufferIds, String> {
        let vertices = mesh.positions.iter().map(|p| [p[0], p[1], p[2], 1.0]).collect();
        let vertices = self.mint(CpuBuffer::Vertices(vertices))?;
        let triangles = self.mint(CpuBuffer::Triangles(mesh.indices.clone()))?;
        Ok(MeshBufferIds { vertices, triangles })
    }

    fn release_buffer(&mut self, id: BufferId) {
        if self.buffers.remove(&id).is_some() {
            self.released += 1;
        }
    }

    fn dispatch(
        &mut self,
        kernel: KernelKind,
        params: &SampleParams,
        bindings: &SampleBindings,
        groups: (u32, u32),
    ) -> Result<(), String> {
        let threads = u64::from(groups.0) * u64::from(groups.1) * u64::from(WORKGROUP_SIZE);
        if threads < u64::from(params.point_count) {
            return Err(format!("cpu backend: grid {:?} too small for {} points", groups, params.point_count));
        }
        let mut out = match self.buffers.remove(&bindings.points) {
            Some(CpuBuffer::Points(data)) => data,
            Some(other) => {
                self.buffers.insert(bindings.points, other);
                return Err(format!("cpu backend: {:?} is not a point buffer", bindings.points));
            }
            None => return Err(format!("cpu backend: unknown point buffer {:?}", bindings.points)),
        };
        let result = (|| {
            if params.point_count as usize > out.len() {
                return Err(format!("cpu backend: {} points overrun capacity {}", params.point_count, out.len()));
            }
            let (tv, tt) = self.mesh(bindings.target)?;
            let (sv, st) = match (kernel, bindings.source) {
                (KernelKind::Transition, Some(source)) => self.mesh(source)?,
                (KernelKind::Transition, None) => return Err("cpu backend: transition without source mesh".to_string()),
                (KernelKind::Resample, _) => (tv, tt),
            };
            for i in 0..params.point_count {
                let target = (params.target_candidates > 0).then(|| {
                    let slot = i % params.target_candidates;
                    surface_point(tv, tt, params.target_points_per_triangle, params.target_seed, params.target_scale, slot)
                });
                let position = match kernel {
                    KernelKind::Resample => target.unwrap_or(Vec3::ZERO),
                    KernelKind::Transition => {
                        let source = (params.source_candidates > 0).then(|| {
                            let slot = i % params.source_candidates;
                            surface_point(sv, st, params.source_points_per_triangle, params.source_seed, params.source_scale, slot)
                        });
                        match (source, target) {
                            (Some(s), Some(t)) => s + (t - s) * params.progress,
                            (Some(s), None) => s,
                            (None, Some(t)) => t,
                            (None, None) => Vec3::ZERO,
                        }
                    }
                };
                out[i as usize] = [position.x, position.y, position.z, 1.0];
            }
            Ok(())
        })();
        self.buffers.insert(bindings.points, CpuBuffer::Points(out));
        result?;
        self.dispatch_count += 1;
        self.last_params = Some(*params);
        Ok(())
    }

    fn prepare(&mut self, cloud: &ExtractedPointCloud) {
        self.bound = cloud.clone();
    }

    fn render_frame(&mut self, _view: &ExtractedView) -> Result<(), String> {
        let drawn = match self.bound.points {
            Some(id) => {
                let capacity = self
                    .points(id)
                    .map(|data| data.len())
                    .ok_or_else(|| format!("cpu backend: bound buffer {:?} was released", id))?;
                if self.bound.active_points as usize > capacity {
                    return Err(format!(
                        "cpu backend: {} instances exceed capacity {}",
                        self.bound.active_points, capacity
                    ));
                }
                self.bound.active_points
            }
            None => 0,
        };
        self.last_drawn = drawn;
        self.frames_rendered += 1;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::primitives;
    use crate::resources::{GpuBuffer, MeshBuffers};

    #[test]
    fn release_is_idempotent() {
        let mut backend = CpuBackend::new();
        let mut points = GpuBuffer::new(backend.create_point_buffer(100).unwrap());
        let mut mesh = MeshBuffers::upload(&mut backend, &primitives::quad()).unwrap();
        assert_eq!(backend.live_buffers(), 3);

        points.release(&mut backend);
        mesh.release(&mut backend);
        points.release(&mut backend);
        mesh.release(&mut backend);

        assert!(points.is_released() && points.id().is_none());
        assert!(mesh.is_released() && mesh.ids().is_none());
        assert_eq!(backend.live_buffers(), 0);
        assert_eq!(backend.released_buffers(), 3);
    }

    #[test]
    fn unknown_release_is_ignored() {
        let mut backend = CpuBackend::new();
        backend.release_buffer(BufferId(1234));
        assert_eq!(backend.released_buffers(), 0);
    }

    #[test]
    fn undersized_grid_is_rejected() {
        let mut backend = CpuBackend::new();
        let mut points = GpuBuffer::new(backend.create_point_buffer(400).unwrap());
        let mut mesh = MeshBuffers::upload(&mut backend, &primitives::triangle()).unwrap();
        let params = SampleParams { point_count: 399, target_points_per_triangle: 400, target_candidates: 399, ..Default::default() };
        let bindings = SampleBindings { points: points.id().unwrap(), target: mesh.ids().unwrap(), source: None };
        assert!(backend.dispatch(KernelKind::Resample, &params, &bindings, (1, 1)).is_err());
        assert!(backend.points(points.id().unwrap()).is_some());
        points.release(&mut backend);
        mesh.release(&mut backend);
    }

    #[test]
    fn drawing_a_released_buffer_fails() {
        let mut backend = CpuBackend::new();
        let id = backend.create_point_buffer(100).unwrap();
        backend.prepare(&ExtractedPointCloud { points: Some(id), active_points: 50, step_size: 250.0 });
        backend.render_frame(&ExtractedView::default()).unwrap();
        assert_eq!(backend.last_drawn(), 50);
        backend.release_buffer(id);
        assert!(backend.render_frame(&ExtractedView::default()).is_err());
    }

    #[test]
    fn allocation_failure_surfaces() {
        let mut backend = CpuBackend::new();
        backend.set_fail_allocations(true);
        assert!(backend.create_point_buffer(100).is_err());
        assert!(backend.upload_mesh(&primitives::quad()).is_err());
    }
}
