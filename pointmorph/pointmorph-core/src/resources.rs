//! Owned handles for backend buffers. Each handle is released explicitly against the backend
//! that minted it; releasing twice is a no-op.

use log::{debug, warn};
use point_api::{BufferId, MeshBufferIds, PointCloudBackend, SourceMesh};

use crate::error::{MorphError, MorphResult};

#[derive(Debug, Default)]
pub struct GpuBuffer {
    id: Option<BufferId>,
}

impl GpuBuffer {
    pub fn new(id: BufferId) -> Self {
        Self { id: Some(id) }
    }

    pub fn id(&self) -> Option<BufferId> {
        self.id
    }

    pub fn is_released(&self) -> bool {
        self.id.is_none()
    }

    pub fn release<B: PointCloudBackend + ?Sized>(&mut self, backend: &mut B) {
        if let Some(id) = self.id.take() {
            debug!("releasing buffer {:?}", id);
            backend.release_buffer(id);
        }
    }
}

impl Drop for GpuBuffer {
    fn drop(&mut self) {
        if let Some(id) = self.id {
            warn!("buffer {:?} dropped without release; backend memory leaks until shutdown", id);
        }
    }
}

/// Vertex and triangle buffers for one resident mesh.
#[derive(Debug, Default)]
pub struct MeshBuffers {
    vertices: GpuBuffer,
    triangles: GpuBuffer,
}

impl MeshBuffers {
    pub fn upload<B: PointCloudBackend + ?Sized>(backend: &mut B, mesh: &SourceMesh) -> MorphResult<Self> {
        let ids = backend.upload_mesh(mesh).map_err(MorphError::Backend)?;
        debug!(
            "uploaded mesh: {} vertices, {} triangles -> {:?}",
            mesh.vertex_count(),
            mesh.triangle_count(),
            ids
        );
        Ok(Self { vertices: GpuBuffer::new(ids.vertices), triangles: GpuBuffer::new(ids.triangles) })
    }

    pub fn ids(&self) -> Option<MeshBufferIds> {
        Some(MeshBufferIds { vertices: self.vertices.id()?, triangles: self.triangles.id()? })
    }

    pub fn is_released(&self) -> bool {
        self.vertices.is_released() && self.triangles.is_released()
    }

    pub fn release<B: PointCloudBackend + ?Sized>(&mut self, backend: &mut B) {
        self.vertices.release(backend);
        self.triangles.release(backend);
    }
}
