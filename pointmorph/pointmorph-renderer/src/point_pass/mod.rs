//! Point pass: draw `active_points` round sprites from the position buffer.

use bytemuck::{Pod, Zeroable};
use wgpu::CommandEncoder;

use crate::resources::DEPTH_FORMAT;

const POINT_SHADER: &str = include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/shaders/points.wgsl"));

const VERTICES_PER_POINT: u32 = 6;

#[repr(C)]
#[derive(Clone, Copy, Pod, Zeroable)]
struct PointUniform {
    view_proj: [f32; 16],
    color: [f32; 4],
    extent: [f32; 4],
}

/// NDC half-extent of a sprite. The step constant maps to a diameter of `2 / step` on the vertical
/// axis; x is corrected for aspect so sprites stay round.
pub fn sprite_extent(step_size: f32, width: u32, height: u32) -> [f32; 2] {
    let radius = if step_size > 0.0 { 1.0 / step_size } else { 0.0 };
    let aspect = width.max(1) as f32 / height.max(1) as f32;
    [radius / aspect, radius]
}

/// What to draw this frame.
pub struct PointDraw<'a> {
    pub positions: &'a wgpu::Buffer,
    pub active_points: u32,
    pub step_size: f32,
}

pub struct PointPass {
    pipeline: wgpu::RenderPipeline,
    bind_group_layout: wgpu::BindGroupLayout,
    uniform_buf: wgpu::Buffer,
}

impl PointPass {
    pub fn new(device: &wgpu::Device, output_format: wgpu::TextureFormat, depth_test: bool) -> Result<Self, String> {
        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("point_shader"),
            source: wgpu::ShaderSource::Wgsl(POINT_SHADER.into()),
        });
        let uniform_size = std::mem::size_of::<PointUniform>() as u64;
        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("point_bind_group_layout"),
            entries: &[
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::VERTEX_FRAGMENT,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: std::num::NonZeroU64::new(uniform_size),
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 1,
                    visibility: wgpu::ShaderStages::VERTEX,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Storage { read_only: true },
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                },
            ],
        });
        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("point_pipeline_layout"),
            bind_group_layouts: &[&bind_group_layout],
            push_constant_ranges: &[],
        });
        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("point_pipeline"),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: Some("vs"),
                buffers: &[],
                compilation_options: Default::default(),
            },
            fragment: Some(wgpu::FragmentState {
                module: &shader,
                entry_point: Some("fs"),
                targets: &[Some(wgpu::ColorTargetState {
                    format: output_format,
                    blend: None,
                    write_mask: wgpu::ColorWrites::ALL,
                })],
                compilation_options: Default::default(),
            }),
            primitive: wgpu::PrimitiveState::default(),
            depth_stencil: Some(wgpu::DepthStencilState {
                format: DEPTH_FORMAT,
                depth_write_enabled: depth_test,
                depth_compare: if depth_test { wgpu::CompareFunction::LessEqual } else { wgpu::CompareFunction::Always },
                stencil: wgpu::StencilState::default(),
                bias: wgpu::DepthBiasState::default(),
            }),
            multisample: wgpu::MultisampleState::default(),
            multiview: None,
            cache: None,
        });
        let uniform_buf = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("point_uniform"),
            size: uniform_size,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        Ok(Self { pipeline, bind_group_layout, uniform_buf })
    }

    /// Clear `output_view` and draw the cloud on top. `draw = None` only clears.
    #[allow(clippy::too_many_arguments)]
    pub fn encode(
        &self,
        encoder: &mut CommandEncoder,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        output_view: &wgpu::TextureView,
        depth_view: &wgpu::TextureView,
        viewport: (u32, u32),
        view_proj: &[f32; 16],
        color: [f32; 4],
        clear_color: [f32; 4],
        draw: Option<PointDraw<'_>>,
    ) -> Result<(), String> {
        let bind_group = match &draw {
            Some(d) if d.active_points > 0 => {
                let [ex, ey] = sprite_extent(d.step_size, viewport.0, viewport.1);
                let uniform = PointUniform { view_proj: *view_proj, color, extent: [ex, ey, 0.0, 0.0] };
                queue.write_buffer(&self.uniform_buf, 0, bytemuck::bytes_of(&uniform));
                Some(device.create_bind_group(&wgpu::BindGroupDescriptor {
                    label: Some("point_bind_group"),
                    layout: &self.bind_group_layout,
                    entries: &[
                        wgpu::BindGroupEntry { binding: 0, resource: self.uniform_buf.as_entire_binding() },
                        wgpu::BindGroupEntry { binding: 1, resource: d.positions.as_entire_binding() },
                    ],
                }))
            }
            _ => None,
        };
        let mut rp = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("point_pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: output_view,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Clear(wgpu::Color {
                        r: clear_color[0] as f64,
                        g: clear_color[1] as f64,
                        b: clear_color[2] as f64,
                        a: clear_color[3] as f64,
                    }),
                    store: wgpu::StoreOp::Store,
                },
            })],
            depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                view: depth_view,
                depth_ops: Some(wgpu::Operations {
                    load: wgpu::LoadOp::Clear(1.0),
                    store: wgpu::StoreOp::Store,
                }),
                stencil_ops: None,
            }),
            timestamp_writes: None,
            occlusion_query_set: None,
        });
        if let (Some(bg), Some(d)) = (&bind_group, &draw) {
            rp.set_pipeline(&self.pipeline);
            rp.set_viewport(0.0, 0.0, viewport.0 as f32, viewport.1 as f32, 0.0, 1.0);
            rp.set_bind_group(0, bg, &[]);
            rp.draw(0..VERTICES_PER_POINT, 0..d.active_points);
        }
        drop(rp);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn uniform_matches_wgsl_layout() {
        assert_eq!(std::mem::size_of::<PointUniform>(), 96);
    }

    #[test]
    fn lower_step_draws_larger_sprites() {
        let sparse = sprite_extent(300.0, 800, 800);
        let dense = sprite_extent(250.0, 800, 800);
        assert!(dense[1] > sparse[1]);
        assert_eq!(sparse[0], sparse[1]);
    }

    #[test]
    fn wide_viewports_shrink_x() {
        let e = sprite_extent(250.0, 1600, 800);
        assert!((e[0] * 2.0 - e[1]).abs() < 1e-7);
        assert_eq!(sprite_extent(0.0, 800, 600), [0.0, 0.0]);
    }
}
