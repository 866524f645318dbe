//! Data types handed from the host and the morph logic to a backend.

/// Read-only triangle mesh supplied by the host's asset layer.
#[derive(Clone, Debug, Default)]
pub struct SourceMesh {
    /// Vertex positions in model space.
    pub positions: Vec<[f32; 3]>,
    /// Triangle list, three indices per triangle.
    pub indices: Vec<u32>,
    /// Size of the model-space bounding box.
    pub bounds_size: [f32; 3],
}

impl SourceMesh {
    pub fn new(positions: Vec<[f32; 3]>, indices: Vec<u32>, bounds_size: [f32; 3]) -> Self {
        Self { positions, indices, bounds_size }
    }

    /// Build a mesh and derive `bounds_size` from the vertex AABB.
    pub fn from_geometry(positions: Vec<[f32; 3]>, indices: Vec<u32>) -> Self {
        let mut min = [f32::MAX; 3];
        let mut max = [f32::MIN; 3];
        for p in &positions {
            for k in 0..3 {
                min[k] = min[k].min(p[k]);
                max[k] = max[k].max(p[k]);
            }
        }
        let bounds_size = if positions.is_empty() {
            [0.0; 3]
        } else {
            [max[0] - min[0], max[1] - min[1], max[2] - min[2]]
        };
        Self { positions, indices, bounds_size }
    }

    pub fn triangle_count(&self) -> u32 {
        (self.indices.len() / 3) as u32
    }

    pub fn vertex_count(&self) -> u32 {
        self.positions.len() as u32
    }

    /// Length of the bounding-size vector.
    pub fn bounds_magnitude(&self) -> f32 {
        let [x, y, z] = self.bounds_size;
        (x * x + y * y + z * z).sqrt()
    }
}

/// Material binding for the point draw: which buffer to read and how many instances are valid.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ExtractedPointCloud {
    /// Position buffer; `None` draws nothing.
    pub points: Option<crate::BufferId>,
    /// Instances to draw. Slots past this index hold stale data.
    pub active_points: u32,
    /// Density compensation constant; the point pass sizes quads by `2 / step_size`.
    pub step_size: f32,
}

/// View/camera data for the current frame.
#[derive(Clone, Debug)]
pub struct ExtractedView {
    pub view_proj: [f32; 16],
    pub viewport_size: (u32, u32),
    pub clear_color: [f32; 4],
}

impl Default for ExtractedView {
    fn default() -> Self {
        Self {
            view_proj: [
                1.0, 0.0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 0.0, 1.0,
            ],
            viewport_size: (800, 600),
            clear_color: [0.02, 0.02, 0.03, 1.0],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bounds_from_geometry() {
        let mesh = SourceMesh::from_geometry(
            vec![[0.0, 0.0, 0.0], [2.0, 0.0, 0.0], [0.0, 3.0, 0.0], [0.0, 0.0, 6.0]],
            vec![0, 1, 2],
        );
        assert_eq!(mesh.bounds_size, [2.0, 3.0, 6.0]);
        assert!((mesh.bounds_magnitude() - 7.0).abs() < 1e-6);
        assert_eq!(mesh.triangle_count(), 1);
        assert_eq!(mesh.vertex_count(), 4);
    }

    #[test]
    fn empty_geometry_has_zero_bounds() {
        let mesh = SourceMesh::from_geometry(Vec::new(), Vec::new());
        assert_eq!(mesh.bounds_size, [0.0; 3]);
        assert_eq!(mesh.triangle_count(), 0);
    }
}
