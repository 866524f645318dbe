//! Sample pass: the `resample` and `transition` compute kernels over a 2D work-group grid.

use point_api::{KernelKind, SampleParams, MAX_GROUPS_PER_AXIS};
use wgpu::CommandEncoder;

const SAMPLE_SHADER: &str = include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/shaders/sample.wgsl"));

const PARAMS_SIZE: u64 = std::mem::size_of::<SampleParams>() as u64;

/// Buffers bound for one kernel launch. Resample binds the target mesh into the source slots too.
pub struct SampleTargets<'a> {
    pub points: &'a wgpu::Buffer,
    pub target_vertices: &'a wgpu::Buffer,
    pub target_triangles: &'a wgpu::Buffer,
    pub source_vertices: &'a wgpu::Buffer,
    pub source_triangles: &'a wgpu::Buffer,
}

pub struct SamplePass {
    resample_pipeline: wgpu::ComputePipeline,
    transition_pipeline: wgpu::ComputePipeline,
    bind_group_layout: wgpu::BindGroupLayout,
    params_buf: wgpu::Buffer,
}

fn storage_entry(binding: u32, read_only: bool) -> wgpu::BindGroupLayoutEntry {
    wgpu::BindGroupLayoutEntry {
        binding,
        visibility: wgpu::ShaderStages::COMPUTE,
        ty: wgpu::BindingType::Buffer {
            ty: wgpu::BufferBindingType::Storage { read_only },
            has_dynamic_offset: false,
            min_binding_size: None,
        },
        count: None,
    }
}

impl SamplePass {
    pub fn new(device: &wgpu::Device) -> Result<Self, String> {
        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("sample_shader"),
            source: wgpu::ShaderSource::Wgsl(SAMPLE_SHADER.into()),
        });
        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("sample_bind_group_layout"),
            entries: &[
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::COMPUTE,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: std::num::NonZeroU64::new(PARAMS_SIZE),
                    },
                    count: None,
                },
                storage_entry(1, false),
                storage_entry(2, true),
                storage_entry(3, true),
                storage_entry(4, true),
                storage_entry(5, true),
            ],
        });
        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("sample_pipeline_layout"),
            bind_group_layouts: &[&bind_group_layout],
            push_constant_ranges: &[],
        });
        let make_pipeline = |label: &str, entry_point: &str| {
            device.create_compute_pipeline(&wgpu::ComputePipelineDescriptor {
                label: Some(label),
                layout: Some(&pipeline_layout),
                module: &shader,
                entry_point: Some(entry_point),
                compilation_options: Default::default(),
                cache: None,
            })
        };
        let resample_pipeline = make_pipeline("sample_resample_pipeline", "resample");
        let transition_pipeline = make_pipeline("sample_transition_pipeline", "transition");
        let params_buf = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("sample_params"),
            size: PARAMS_SIZE,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        Ok(Self { resample_pipeline, transition_pipeline, bind_group_layout, params_buf })
    }

    /// Encode one kernel launch. The params upload lands with the next submit, so submit before
    /// encoding another launch.
    pub fn encode(
        &self,
        encoder: &mut CommandEncoder,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        kernel: KernelKind,
        params: &SampleParams,
        targets: &SampleTargets<'_>,
        groups: (u32, u32),
    ) -> Result<(), String> {
        if groups.0 > MAX_GROUPS_PER_AXIS || groups.1 > MAX_GROUPS_PER_AXIS {
            return Err(format!("SamplePass: grid {:?} exceeds the per-axis limit", groups));
        }
        if groups.0 == 0 || groups.1 == 0 {
            return Ok(());
        }
        queue.write_buffer(&self.params_buf, 0, bytemuck::bytes_of(params));
        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("sample_bind_group"),
            layout: &self.bind_group_layout,
            entries: &[
                wgpu::BindGroupEntry { binding: 0, resource: self.params_buf.as_entire_binding() },
                wgpu::BindGroupEntry { binding: 1, resource: targets.points.as_entire_binding() },
                wgpu::BindGroupEntry { binding: 2, resource: targets.target_vertices.as_entire_binding() },
                wgpu::BindGroupEntry { binding: 3, resource: targets.target_triangles.as_entire_binding() },
                wgpu::BindGroupEntry { binding: 4, resource: targets.source_vertices.as_entire_binding() },
                wgpu::BindGroupEntry { binding: 5, resource: targets.source_triangles.as_entire_binding() },
            ],
        });
        let pipeline = match kernel {
            KernelKind::Resample => &self.resample_pipeline,
            KernelKind::Transition => &self.transition_pipeline,
        };
        let mut pass = encoder.begin_compute_pass(&wgpu::ComputePassDescriptor {
            label: Some("sample_pass"),
            timestamp_writes: None,
        });
        pass.set_pipeline(pipeline);
        pass.set_bind_group(0, &bind_group, &[]);
        pass.dispatch_workgroups(groups.0, groups.1, 1);
        drop(pass);
        Ok(())
    }
}
