//! PointMorph bridge: implements point_api::PointCloudBackend using pointmorph-renderer.

mod plugin;
mod window_backend;

pub use plugin::PointMorphPlugin;
pub use window_backend::PointMorphWindowBackend;
