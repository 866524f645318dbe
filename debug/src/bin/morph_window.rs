//! Backend-agnostic viewer: PointMorph + PointMorphWindowBackend, orbiting camera.
//! The host never touches wgpu; it only sees point_api types.
//! Run: cargo run -p debug --bin morph_window -- [config.toml]

use std::time::Instant;

use glam::{Mat4, Vec3};
use point_api::{ExtractedView, PointCloudBackendWindow};
use pointmorph_bridge::PointMorphWindowBackend;
use pointmorph_core::{primitives, MorphConfig, PointMorph};
use pointmorph_renderer::RendererConfig;
use raw_window_handle::{HasDisplayHandle, HasWindowHandle};
use winit::application::ApplicationHandler;
use winit::event::WindowEvent;
use winit::event_loop::ActiveEventLoop;
use winit::window::WindowId;

/// Radians per second.
const ORBIT_SPEED: f32 = 0.25;
const CAMERA_DISTANCE: f32 = 7.0;

struct App {
    window: Option<winit::window::Window>,
    backend: Option<Box<dyn PointCloudBackendWindow>>,
    morph: PointMorph,
    size: (u32, u32),
    last_frame: Option<Instant>,
    orbit: f32,
}

impl App {
    fn new(morph: PointMorph) -> Self {
        Self {
            window: None,
            backend: None,
            morph,
            size: (1280, 720),
            last_frame: None,
            orbit: 0.0,
        }
    }

    fn build_view_projection(&self) -> [f32; 16] {
        let (w, h) = self.size;
        let aspect = if h > 0 { w as f32 / h as f32 } else { 1.0 };
        let proj = Mat4::perspective_rh(std::f32::consts::FRAC_PI_4, aspect, 0.1, 100.0);
        let eye = Vec3::new(self.orbit.sin(), 0.35, self.orbit.cos()) * CAMERA_DISTANCE;
        let view = Mat4::look_at_rh(eye, Vec3::ZERO, Vec3::Y);
        (proj * view).to_cols_array()
    }

    fn shutdown(&mut self) {
        if let Some(backend) = self.backend.as_mut() {
            self.morph.stop(backend.as_mut());
        }
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }
        let attrs = winit::window::WindowAttributes::default()
            .with_title("PointMorph")
            .with_inner_size(winit::dpi::LogicalSize::new(1280, 720));
        let window = match event_loop.create_window(attrs) {
            Ok(w) => w,
            Err(e) => {
                log::error!("create window: {}", e);
                event_loop.exit();
                return;
            }
        };
        let phys = window.inner_size();
        self.size = (phys.width, phys.height);
        window.request_redraw();
        self.window = Some(window);
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _id: WindowId,
        event: WindowEvent,
    ) {
        match event {
            WindowEvent::CloseRequested => {
                self.shutdown();
                event_loop.exit();
            }
            WindowEvent::Resized(physical) => {
                self.size = (physical.width.max(1), physical.height.max(1));
                if let Some(ref w) = self.window {
                    w.request_redraw();
                }
            }
            WindowEvent::RedrawRequested => {
                let window = match &self.window {
                    Some(w) => w,
                    None => return,
                };
                self.size = {
                    let phys = window.inner_size();
                    (phys.width.max(1), phys.height.max(1))
                };
                if self.backend.is_none() {
                    let mut backend = match PointMorphWindowBackend::from_window(window, RendererConfig::default()) {
                        Ok(backend) => backend,
                        Err(e) => {
                            log::error!("PointMorphWindowBackend::from_window failed: {}", e);
                            event_loop.exit();
                            return;
                        }
                    };
                    if let Err(e) = self.morph.start(backend.as_mut()) {
                        log::error!("PointMorph::start failed: {}", e);
                        event_loop.exit();
                        return;
                    }
                    self.backend = Some(backend);
                }
                let (raw_window, raw_display) = match (window.window_handle(), window.display_handle()) {
                    (Ok(wh), Ok(dh)) => (wh.as_raw(), dh.as_raw()),
                    _ => return,
                };
                let now = Instant::now();
                let dt = self.last_frame.map(|t| (now - t).as_secs_f32()).unwrap_or(0.0);
                self.last_frame = Some(now);
                self.orbit += dt * ORBIT_SPEED;

                let view = ExtractedView {
                    view_proj: self.build_view_projection(),
                    viewport_size: self.size,
                    ..ExtractedView::default()
                };
                let backend = match &mut self.backend {
                    Some(b) => b,
                    None => return,
                };
                if let Err(e) = self.morph.update(dt, backend.as_mut()) {
                    log::error!("morph stopped: {}", e);
                    event_loop.exit();
                    return;
                }
                if let Err(e) = backend.render_frame_to_window(&view, raw_window, raw_display) {
                    log::warn!("frame skipped: {}", e);
                }
                window.request_redraw();
            }
            _ => {}
        }
    }
}

fn main() -> Result<(), String> {
    env_logger::init();
    let config = match std::env::args().nth(1) {
        Some(path) => MorphConfig::from_toml_file(&path).map_err(|e| e.to_string())?,
        None => MorphConfig::default(),
    };
    let morph = PointMorph::new(primitives::demo_set(), config).map_err(|e| e.to_string())?;
    let event_loop = winit::event_loop::EventLoop::new().map_err(|e| e.to_string())?;
    let mut app = App::new(morph);
    event_loop.run_app(&mut app).map_err(|e| e.to_string())?;
    app.shutdown();
    Ok(())
}
