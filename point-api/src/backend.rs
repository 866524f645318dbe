//! Trait for point-cloud backends (wgpu or CPU reference). The morph logic uses this to
//! allocate buffers, dispatch the sampling kernels and hand draw state to the renderer.

use crate::{BufferId, ExtractedPointCloud, ExtractedView, KernelKind, MeshBufferIds, SampleBindings, SampleParams, SourceMesh};
use raw_window_handle::{RawDisplayHandle, RawWindowHandle};

/// Backend the morph component drives regardless of where the work actually runs.
pub trait PointCloudBackend: Send {
    /// Allocate a position buffer holding `capacity` points.
    fn create_point_buffer(&mut self, capacity: u32) -> Result<BufferId, String>;

    /// Upload a mesh's vertices and triangle indices into fresh buffers.
    fn upload_mesh(&mut self, mesh: &SourceMesh) -> Result<MeshBufferIds, String>;

    /// Free a buffer. Ids the backend does not know are ignored.
    fn release_buffer(&mut self, id: BufferId);

    /// Run one sampling kernel over a `groups.0 x groups.1` work-group grid.
    fn dispatch(
        &mut self,
        kernel: KernelKind,
        params: &SampleParams,
        bindings: &SampleBindings,
        groups: (u32, u32),
    ) -> Result<(), String>;

    /// Bind the position buffer and draw scalars for the next frame.
    fn prepare(&mut self, cloud: &ExtractedPointCloud);

    /// Draw `active_points` instances. Submits work internally.
    fn render_frame(&mut self, view: &ExtractedView) -> Result<(), String>;
}

/// Extension for backends that can present to a window. Host passes raw handles (e.g. from winit);
/// the backend owns the surface and performs get_current_texture + present internally.
pub trait PointCloudBackendWindow: PointCloudBackend + Send {
    fn render_frame_to_window(
        &mut self,
        view: &ExtractedView,
        raw_window_handle: RawWindowHandle,
        raw_display_handle: RawDisplayHandle,
    ) -> Result<(), String>;
}
