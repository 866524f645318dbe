//! Window-capable backend: created from a window, implements PointCloudBackendWindow.

use point_api::{
    BufferId, ExtractedPointCloud, ExtractedView, KernelKind, MeshBufferIds, PointCloudBackend,
    PointCloudBackendWindow, SampleBindings, SampleParams, SourceMesh,
};
use pointmorph_renderer::RendererConfig;
use raw_window_handle::{HasDisplayHandle, HasWindowHandle};
use wgpu::SurfaceTargetUnsafe;

use crate::plugin::PointMorphPlugin;

/// Backend that owns the wgpu Instance and a PointMorphPlugin; can present to a window.
/// Created via `PointMorphWindowBackend::from_window(window, config)`; each frame use
/// `render_frame_to_window(view, raw_window_handle, raw_display_handle)`.
/// The surface is recreated each frame so its lifetime never outlives the window.
pub struct PointMorphWindowBackend {
    instance: wgpu::Instance,
    plugin: PointMorphPlugin,
}

impl PointMorphWindowBackend {
    /// The window is only used for its raw handles and for adapter selection.
    /// The host must keep it alive and pass its handles to `render_frame_to_window` every frame.
    pub fn from_window(
        window: &(impl HasWindowHandle + HasDisplayHandle),
        config: RendererConfig,
    ) -> Result<Box<dyn PointCloudBackendWindow>, String> {
        let (raw_window, raw_display) = {
            let wh = window.window_handle().map_err(|e| e.to_string())?;
            let dh = window.display_handle().map_err(|e| e.to_string())?;
            (wh.as_raw(), dh.as_raw())
        };
        let backend = pollster::block_on(Self::from_raw_handles_async(raw_window, raw_display, config))?;
        Ok(Box::new(backend))
    }

    async fn from_raw_handles_async(
        raw_window_handle: raw_window_handle::RawWindowHandle,
        raw_display_handle: raw_window_handle::RawDisplayHandle,
        config: RendererConfig,
    ) -> Result<Self, String> {
        let instance = wgpu::Instance::default();
        let target = SurfaceTargetUnsafe::RawHandle {
            raw_window_handle,
            raw_display_handle,
        };
        let surface = unsafe { instance.create_surface_unsafe(target).map_err(|e| e.to_string())? };
        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::default(),
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .ok_or("No adapter")?;
        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor::default(), None)
            .await
            .map_err(|e| e.to_string())?;
        let caps = surface.get_capabilities(&adapter);
        let format = caps
            .formats
            .first()
            .copied()
            .unwrap_or(config.swapchain_format);
        log::info!("surface format {:?} on {}", format, adapter.get_info().name);
        let config = RendererConfig {
            swapchain_format: format,
            ..config
        };
        let plugin = PointMorphPlugin::new_with_config(device, queue, config)?;
        drop(surface);
        Ok(Self { instance, plugin })
    }

    fn surface_config(format: wgpu::TextureFormat, width: u32, height: u32) -> wgpu::SurfaceConfiguration {
        wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format,
            width,
            height,
            present_mode: wgpu::PresentMode::Fifo,
            alpha_mode: wgpu::CompositeAlphaMode::Opaque,
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        }
    }
}

impl PointCloudBackend for PointMorphWindowBackend {
    fn create_point_buffer(&mut self, capacity: u32) -> Result<BufferId, String> {
        self.plugin.create_point_buffer(capacity)
    }

    fn upload_mesh(&mut self, mesh: &SourceMesh) -> Result<MeshBufferIds, String> {
        self.plugin.upload_mesh(mesh)
    }

    fn release_buffer(&mut self, id: BufferId) {
        self.plugin.release_buffer(id);
    }

    fn dispatch(
        &mut self,
        kernel: KernelKind,
        params: &SampleParams,
        bindings: &SampleBindings,
        groups: (u32, u32),
    ) -> Result<(), String> {
        self.plugin.dispatch(kernel, params, bindings, groups)
    }

    fn prepare(&mut self, cloud: &ExtractedPointCloud) {
        self.plugin.prepare(cloud);
    }

    fn render_frame(&mut self, view: &ExtractedView) -> Result<(), String> {
        self.plugin.render_frame(view)
    }
}

impl PointCloudBackendWindow for PointMorphWindowBackend {
    fn render_frame_to_window(
        &mut self,
        view: &ExtractedView,
        raw_window_handle: raw_window_handle::RawWindowHandle,
        raw_display_handle: raw_window_handle::RawDisplayHandle,
    ) -> Result<(), String> {
        let target = SurfaceTargetUnsafe::RawHandle {
            raw_window_handle,
            raw_display_handle,
        };
        let surface = unsafe {
            self.instance
                .create_surface_unsafe(target)
                .map_err(|e| e.to_string())?
        };
        let (width, height) = view.viewport_size;
        let config = Self::surface_config(
            self.plugin.renderer().config().swapchain_format,
            width.max(1),
            height.max(1),
        );
        surface.configure(self.plugin.device(), &config);

        let frame = match surface.get_current_texture() {
            Ok(f) => f,
            Err(wgpu::SurfaceError::Outdated) | Err(wgpu::SurfaceError::Lost) => {
                surface.configure(self.plugin.device(), &config);
                surface.get_current_texture().map_err(|e| e.to_string())?
            }
            Err(wgpu::SurfaceError::Timeout) => return Err("Surface get_current_texture timeout".to_string()),
            Err(e) => return Err(e.to_string()),
        };
        let viewport = frame.texture.create_view(&wgpu::TextureViewDescriptor::default());
        let view = ExtractedView {
            viewport_size: (width.max(1), height.max(1)),
            ..view.clone()
        };
        self.plugin.render_frame_to_swapchain(&view, &viewport)?;
        frame.present();
        Ok(())
    }
}
