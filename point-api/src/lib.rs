//! Shared point-cloud backend API for PointMorph.
//! Defines the mesh input, compute dispatch parameters and the PointCloudBackend trait so the
//! morph logic can drive the wgpu backend or the CPU reference backend through the same code path.

mod backend;
mod dispatch;
mod extract;

pub use backend::{PointCloudBackend, PointCloudBackendWindow};
pub use dispatch::{
    dispatch_grid, BufferId, KernelKind, MeshBufferIds, SampleBindings, SampleParams,
    MAX_GROUPS_PER_AXIS, WORKGROUP_SIZE,
};
pub use extract::{ExtractedPointCloud, ExtractedView, SourceMesh};
pub use raw_window_handle::{RawDisplayHandle, RawWindowHandle};
