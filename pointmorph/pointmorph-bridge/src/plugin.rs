//! PointMorph plugin: implements PointCloudBackend for the host.

use log::{debug, warn};
use point_api::{
    BufferId, ExtractedPointCloud, ExtractedView, KernelKind, MeshBufferIds, PointCloudBackend, SampleBindings,
    SampleParams, SourceMesh,
};
use pointmorph_renderer::{Renderer, RendererConfig};

/// Owns the wgpu device/queue and renderer, plus the draw state bound by the last `prepare`.
pub struct PointMorphPlugin {
    renderer: Renderer,
    bound: ExtractedPointCloud,
}

impl PointMorphPlugin {
    /// Create with wgpu device and queue (default config).
    pub fn new(device: wgpu::Device, queue: wgpu::Queue) -> Result<Self, String> {
        Self::new_with_config(device, queue, RendererConfig::default())
    }

    pub fn new_with_config(device: wgpu::Device, queue: wgpu::Queue, config: RendererConfig) -> Result<Self, String> {
        let renderer = Renderer::new_with_config(device, queue, config)?;
        Ok(Self { renderer, bound: ExtractedPointCloud::default() })
    }

    /// Request an adapter without a surface and build a headless plugin.
    pub fn headless(config: RendererConfig) -> Result<Self, String> {
        pollster::block_on(async {
            let instance = wgpu::Instance::default();
            let adapter = instance
                .request_adapter(&wgpu::RequestAdapterOptions {
                    power_preference: wgpu::PowerPreference::default(),
                    compatible_surface: None,
                    force_fallback_adapter: false,
                })
                .await
                .ok_or("No adapter")?;
            let (device, queue) = adapter
                .request_device(&wgpu::DeviceDescriptor::default(), None)
                .await
                .map_err(|e| e.to_string())?;
            Self::new_with_config(device, queue, config)
        })
    }

    pub fn device(&self) -> &wgpu::Device {
        self.renderer.device()
    }
    pub fn queue(&self) -> &wgpu::Queue {
        self.renderer.queue()
    }
    pub fn renderer(&self) -> &Renderer {
        &self.renderer
    }
    pub fn bound(&self) -> &ExtractedPointCloud {
        &self.bound
    }

    /// Render one frame into `swapchain_view`. Use this when displaying in a window.
    pub fn render_frame_to_swapchain(
        &mut self,
        view: &ExtractedView,
        swapchain_view: &wgpu::TextureView,
    ) -> Result<(), String> {
        self.render_frame_impl(view, Some(swapchain_view))
    }

    fn render_frame_impl(
        &mut self,
        view: &ExtractedView,
        swapchain_view: Option<&wgpu::TextureView>,
    ) -> Result<(), String> {
        let mut encoder = self.renderer.device().create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("pointmorph_plugin_frame"),
        });
        self.renderer.encode_frame(&mut encoder, view, &self.bound, swapchain_view)?;
        let cmd = encoder.finish();
        self.renderer.submit([cmd]);
        Ok(())
    }
}

impl PointCloudBackend for PointMorphPlugin {
    fn create_point_buffer(&mut self, capacity: u32) -> Result<BufferId, String> {
        let id = self.renderer.create_point_buffer(capacity)?;
        debug!("point buffer {:?}: {} slots", id, capacity);
        Ok(id)
    }

    fn upload_mesh(&mut self, mesh: &SourceMesh) -> Result<MeshBufferIds, String> {
        self.renderer.upload_mesh(mesh)
    }

    fn release_buffer(&mut self, id: BufferId) {
        if !self.renderer.release_buffer(id) {
            warn!("release of unknown buffer {:?} ignored", id);
        }
    }

    fn dispatch(
        &mut self,
        kernel: KernelKind,
        params: &SampleParams,
        bindings: &SampleBindings,
        groups: (u32, u32),
    ) -> Result<(), String> {
        self.renderer.dispatch(kernel, params, bindings, groups)
    }

    fn prepare(&mut self, cloud: &ExtractedPointCloud) {
        self.bound = cloud.clone();
    }

    fn render_frame(&mut self, view: &ExtractedView) -> Result<(), String> {
        self.render_frame_impl(view, None)
    }
}
