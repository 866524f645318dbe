//! Storage buffers addressed by [`BufferId`]: point positions, mesh vertices and triangle indices.

use std::collections::HashMap;

use point_api::{BufferId, SourceMesh};

/// Bytes per stored position (`vec4<f32>`).
pub const POSITION_STRIDE: u64 = 16;

pub struct BufferRegistry {
    buffers: HashMap<BufferId, wgpu::Buffer>,
    next_id: u64,
}

impl Default for BufferRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl BufferRegistry {
    pub fn new() -> Self {
        Self { buffers: HashMap::new(), next_id: 1 }
    }

    fn insert(&mut self, buffer: wgpu::Buffer) -> BufferId {
        let id = BufferId(self.next_id);
        self.next_id += 1;
        self.buffers.insert(id, buffer);
        id
    }

    /// Zeroed `vec4<f32>` array with room for `capacity` points.
    pub fn create_points(&mut self, device: &wgpu::Device, capacity: u32) -> Result<BufferId, String> {
        let size = u64::from(capacity) * POSITION_STRIDE;
        if size == 0 {
            return Err("BufferRegistry: point buffer capacity must be > 0".to_string());
        }
        if size > device.limits().max_storage_buffer_binding_size as u64 {
            return Err(format!("BufferRegistry: {} points exceed the storage binding limit", capacity));
        }
        let buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("pointmorph_positions"),
            size,
            usage: wgpu::BufferUsages::STORAGE,
            mapped_at_creation: false,
        });
        Ok(self.insert(buffer))
    }

    /// Upload vertices (padded to `vec4`) and indices as two read-only storage buffers.
    pub fn upload_mesh(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        mesh: &SourceMesh,
    ) -> Result<(BufferId, BufferId), String> {
        if mesh.positions.is_empty() || mesh.indices.is_empty() {
            return Err("BufferRegistry: mesh has no vertices or triangles".to_string());
        }
        let vertices: Vec<[f32; 4]> = mesh.positions.iter().map(|p| [p[0], p[1], p[2], 1.0]).collect();
        let vertex_buf = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("pointmorph_mesh_vertices"),
            size: (vertices.len() as u64) * POSITION_STRIDE,
            usage: wgpu::BufferUsages::STORAGE | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        queue.write_buffer(&vertex_buf, 0, bytemuck::cast_slice(&vertices));
        let index_buf = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("pointmorph_mesh_triangles"),
            size: (mesh.indices.len() as u64) * 4,
            usage: wgpu::BufferUsages::STORAGE | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        queue.write_buffer(&index_buf, 0, bytemuck::cast_slice(&mesh.indices));
        Ok((self.insert(vertex_buf), self.insert(index_buf)))
    }

    pub fn get(&self, id: BufferId) -> Option<&wgpu::Buffer> {
        self.buffers.get(&id)
    }

    /// Destroy the buffer. Returns false for unknown ids.
    pub fn release(&mut self, id: BufferId) -> bool {
        match self.buffers.remove(&id) {
            Some(buffer) => {
                buffer.destroy();
                true
            }
            None => false,
        }
    }

    pub fn len(&self) -> usize {
        self.buffers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffers.is_empty()
    }

    /// Number of points a position buffer can hold.
    pub fn point_capacity(&self, id: BufferId) -> Option<u32> {
        self.get(id).map(|b| (b.size() / POSITION_STRIDE) as u32)
    }
}
