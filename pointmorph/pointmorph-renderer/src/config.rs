//! Renderer configuration: output format and point appearance.

#[derive(Clone, Debug)]
pub struct RendererConfig {
    /// Color target format for both the offscreen target and the swapchain (e.g. Rgba8Unorm or Bgra8Unorm).
    pub swapchain_format: wgpu::TextureFormat,
    /// Linear RGBA of every point.
    pub point_color: [f32; 4],
    /// Depth-test points against each other.
    pub depth_test: bool,
}

impl Default for RendererConfig {
    fn default() -> Self {
        Self {
            swapchain_format: wgpu::TextureFormat::Rgba8Unorm,
            point_color: [0.85, 0.9, 1.0, 1.0],
            depth_test: true,
        }
    }
}
