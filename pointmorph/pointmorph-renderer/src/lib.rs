//! PointMorph Renderer: wgpu compute sampling kernels + instanced point pass.

pub mod buffers;
pub mod config;
pub mod point_pass;
pub mod resources;
pub mod sample_pass;

pub use buffers::BufferRegistry;
pub use config::RendererConfig;
pub use point_pass::{PointDraw, PointPass};
pub use resources::FrameResources;
pub use sample_pass::{SamplePass, SampleTargets};

use point_api::{
    BufferId, ExtractedPointCloud, ExtractedView, KernelKind, MeshBufferIds, SampleBindings, SampleParams,
    SourceMesh,
};

pub struct Renderer {
    device: wgpu::Device,
    queue: wgpu::Queue,
    config: RendererConfig,
    sample_pass: SamplePass,
    point_pass: PointPass,
    buffers: BufferRegistry,
    frame_resources: Option<FrameResources>,
}

impl Renderer {
    pub fn new(device: wgpu::Device, queue: wgpu::Queue) -> Result<Self, String> {
        Self::new_with_config(device, queue, RendererConfig::default())
    }

    pub fn new_with_config(device: wgpu::Device, queue: wgpu::Queue, config: RendererConfig) -> Result<Self, String> {
        let sample_pass = SamplePass::new(&device)?;
        let point_pass = PointPass::new(&device, config.swapchain_format, config.depth_test)?;
        Ok(Self {
            device,
            queue,
            config,
            sample_pass,
            point_pass,
            buffers: BufferRegistry::new(),
            frame_resources: None,
        })
    }

    pub fn device(&self) -> &wgpu::Device { &self.device }
    pub fn queue(&self) -> &wgpu::Queue { &self.queue }
    pub fn config(&self) -> &RendererConfig { &self.config }
    pub fn buffers(&self) -> &BufferRegistry { &self.buffers }

    pub fn create_point_buffer(&mut self, capacity: u32) -> Result<BufferId, String> {
        self.buffers.create_points(&self.device, capacity)
    }

    pub fn upload_mesh(&mut self, mesh: &SourceMesh) -> Result<MeshBufferIds, String> {
        let (vertices, triangles) = self.buffers.upload_mesh(&self.device, &self.queue, mesh)?;
        Ok(MeshBufferIds { vertices, triangles })
    }

    pub fn release_buffer(&mut self, id: BufferId) -> bool {
        self.buffers.release(id)
    }

    fn buffer(&self, id: BufferId) -> Result<&wgpu::Buffer, String> {
        self.buffers.get(id).ok_or_else(|| format!("Renderer: unknown buffer {:?}", id))
    }

    /// Encode and submit one sampling kernel.
    pub fn dispatch(
        &self,
        kernel: KernelKind,
        params: &SampleParams,
        bindings: &SampleBindings,
        groups: (u32, u32),
    ) -> Result<(), String> {
        let capacity = self.buffers.point_capacity(bindings.points).unwrap_or(0);
        if params.point_count > capacity {
            return Err(format!("Renderer: {} points overrun capacity {}", params.point_count, capacity));
        }
        let source = match (kernel, bindings.source) {
            (KernelKind::Resample, _) => bindings.target,
            (KernelKind::Transition, Some(source)) => source,
            (KernelKind::Transition, None) => return Err("Renderer: transition needs a source mesh".to_string()),
        };
        let targets = SampleTargets {
            points: self.buffer(bindings.points)?,
            target_vertices: self.buffer(bindings.target.vertices)?,
            target_triangles: self.buffer(bindings.target.triangles)?,
            source_vertices: self.buffer(source.vertices)?,
            source_triangles: self.buffer(source.triangles)?,
        };
        let mut encoder = self.device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("pointmorph_sample"),
        });
        self.sample_pass.encode(&mut encoder, &self.device, &self.queue, kernel, params, &targets, groups)?;
        self.submit([encoder.finish()]);
        Ok(())
    }

    pub fn ensure_frame_resources(&mut self, width: u32, height: u32) -> Result<(), String> {
        let existing = self.frame_resources.take();
        let new_res = FrameResources::ensure_size(&self.device, existing, self.config.swapchain_format, width, height)?;
        self.frame_resources = Some(new_res);
        Ok(())
    }

    /// Offscreen color target of the last headless frame.
    pub fn current_color_target(&self) -> Option<&wgpu::Texture> {
        self.frame_resources.as_ref().map(|f| &f.color)
    }

    /// Encode the point pass. Draws into `output_view` when given (e.g. swapchain), otherwise into
    /// the offscreen color target.
    pub fn encode_frame(
        &mut self,
        encoder: &mut wgpu::CommandEncoder,
        view: &ExtractedView,
        cloud: &ExtractedPointCloud,
        output_view: Option<&wgpu::TextureView>,
    ) -> Result<(), String> {
        let (width, height) = view.viewport_size;
        self.ensure_frame_resources(width, height)?;
        let frame = self.frame_resources.as_ref().ok_or("encode_frame: no frame resources")?;
        let draw = match cloud.points {
            Some(id) => {
                let positions = self.buffers.get(id).ok_or_else(|| format!("encode_frame: bound buffer {:?} was released", id))?;
                let capacity = self.buffers.point_capacity(id).unwrap_or(0);
                if cloud.active_points > capacity {
                    return Err(format!("encode_frame: {} instances exceed capacity {}", cloud.active_points, capacity));
                }
                Some(PointDraw { positions, active_points: cloud.active_points, step_size: cloud.step_size })
            }
            None => None,
        };
        let offscreen = frame.color_view();
        let target = output_view.unwrap_or(&offscreen);
        self.point_pass.encode(
            encoder,
            &self.device,
            &self.queue,
            target,
            &frame.depth_view(),
            (width, height),
            &view.view_proj,
            self.config.point_color,
            view.clear_color,
            draw,
        )
    }

    pub fn render_frame(&mut self, view: &ExtractedView, cloud: &ExtractedPointCloud) -> Result<wgpu::CommandBuffer, String> {
        let mut encoder = self.device.create_command_encoder(&wgpu::CommandEncoderDescriptor { label: Some("pointmorph_frame") });
        self.encode_frame(&mut encoder, view, cloud, None)?;
        Ok(encoder.finish())
    }

    pub fn submit(&self, command_buffers: impl IntoIterator<Item = wgpu::CommandBuffer>) {
        self.queue.submit(command_buffers);
    }
}
