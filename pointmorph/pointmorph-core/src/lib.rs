//! pointmorph-core: backend-agnostic mesh resampling and morph scheduling.
//!
//! - [`resampler`]: scatter `R²` points over a single mesh.
//! - [`transition`]: blend two samplings into the same buffer frame by frame.
//! - [`morph`]: the [`PointMorph`] component that picks meshes and drives transitions.
//!
//! GPU work goes through [`point_api::PointCloudBackend`]; [`CpuBackend`] runs the same kernels on
//! the CPU.

pub mod config;
pub mod ease;
pub mod error;
pub mod morph;
pub mod primitives;
pub mod reference;
pub mod resampler;
pub mod resources;
pub mod sampling;
pub mod timeline;
pub mod transition;

pub use config::MorphConfig;
pub use ease::{EaseKind, EasePolicy};
pub use error::{MorphError, MorphResult};
pub use morph::{Phase, PointMorph};
pub use reference::CpuBackend;
pub use resampler::{resample, ResampleOutput};
pub use sampling::{MeshSlot, SurfaceSampling};
pub use transition::{step_transition, TransitionState};
