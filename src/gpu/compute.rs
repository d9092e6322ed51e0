//! The GPGPU compute stage: ping-pong state textures and the update pipeline.
//!
//! Per-particle state lives in a pair of RGBA32F textures sized by the
//! [`FieldLayout`]. Each `step()` records one compute pass that reads the
//! current texture, runs the update body over every texel, writes the target
//! texture, and swaps the labels. The shader only ever reads the surface it
//! is not writing; the two surfaces never alias.

use bytemuck::{Pod, Zeroable};
use wgpu::util::DeviceExt;

use crate::error::SetupError;
use crate::layout::FieldLayout;
use crate::shaders;

/// Texel format of the state surfaces. One texel = one particle's
/// `[x, y, z, w]` state vector.
pub const STATE_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba32Float;

const WORKGROUP_SIZE: u32 = 8;

#[repr(C)]
#[derive(Copy, Clone, Pod, Zeroable)]
struct SimUniforms {
    time: f32,
    delta_time: f32,
    grid_size: u32,
    point_count: u32,
}

/// Which of the two state surfaces is current (readable) versus target
/// (being written). Swapping labels is the only mutation; the surfaces
/// themselves never move.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PingPong {
    current_is_b: bool,
}

impl PingPong {
    /// Fresh tracker: surface 0 is current.
    pub fn new() -> Self {
        Self::default()
    }

    /// Index of the surface holding the most recently computed state.
    #[inline]
    pub fn current(&self) -> usize {
        self.current_is_b as usize
    }

    /// Index of the surface the next step will write.
    #[inline]
    pub fn target(&self) -> usize {
        1 - self.current()
    }

    /// Flip the labels after a step.
    #[inline]
    pub fn swap(&mut self) {
        self.current_is_b = !self.current_is_b;
    }
}

/// Number of workgroups along one grid axis.
pub(crate) fn dispatch_size(grid_size: u32) -> u32 {
    grid_size.div_ceil(WORKGROUP_SIZE)
}

/// GPU-resident particle state and its update pipeline.
pub struct ComputeStage {
    layout: FieldLayout,
    pipeline: wgpu::ComputePipeline,
    uniform_buffer: wgpu::Buffer,
    views: [wgpu::TextureView; 2],
    /// One bind group per step direction, indexed by the current surface.
    bind_groups: [wgpu::BindGroup; 2],
    ping_pong: PingPong,
}

impl ComputeStage {
    /// Allocate both state surfaces, upload the initial state into the
    /// current one, and build the update pipeline from `update_body`.
    ///
    /// The shader is compiled inside a validation error scope; a rejected
    /// shader returns [`SetupError::InvalidShader`] before any surface has
    /// been allocated, leaving no partial state behind.
    pub fn new(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        layout: FieldLayout,
        initial_state: &[f32],
        update_body: &str,
    ) -> Result<Self, SetupError> {
        assert_eq!(
            initial_state.len(),
            (layout.texel_count() * crate::layout::CHANNELS) as usize,
            "initial state does not match the field layout"
        );

        let shader_src = shaders::compute_shader(update_body);
        device.push_error_scope(wgpu::ErrorFilter::Validation);
        let module = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("State Update Shader"),
            source: wgpu::ShaderSource::Wgsl(shader_src.into()),
        });
        if let Some(err) = pollster::block_on(device.pop_error_scope()) {
            return Err(SetupError::InvalidShader(err.to_string()));
        }

        let grid = layout.grid_size();
        let extent = wgpu::Extent3d {
            width: grid,
            height: grid,
            depth_or_array_layers: 1,
        };

        let state_descriptor = |label| wgpu::TextureDescriptor {
            label: Some(label),
            size: extent,
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: STATE_FORMAT,
            usage: wgpu::TextureUsages::TEXTURE_BINDING
                | wgpu::TextureUsages::STORAGE_BINDING
                | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        };

        let texture_a = device.create_texture(&state_descriptor("State Texture A"));
        let texture_b = device.create_texture(&state_descriptor("State Texture B"));
        let base_texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("Base State Texture"),
            size: extent,
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: STATE_FORMAT,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        });

        // Surface A starts as current; the base texture keeps the initial
        // state readable for respawn-style update bodies.
        let data_layout = wgpu::TexelCopyBufferLayout {
            offset: 0,
            bytes_per_row: Some(layout.bytes_per_row()),
            rows_per_image: Some(grid),
        };
        let bytes: &[u8] = bytemuck::cast_slice(initial_state);
        queue.write_texture(texture_a.as_image_copy(), bytes, data_layout, extent);
        queue.write_texture(base_texture.as_image_copy(), bytes, data_layout, extent);

        let uniforms = SimUniforms {
            time: 0.0,
            delta_time: 0.0,
            grid_size: grid,
            point_count: layout.point_count(),
        };
        let uniform_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Sim Uniform Buffer"),
            contents: bytemuck::bytes_of(&uniforms),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });

        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Compute Bind Group Layout"),
            entries: &[
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::COMPUTE,
                    ty: wgpu::BindingType::Texture {
                        sample_type: wgpu::TextureSampleType::Float { filterable: false },
                        view_dimension: wgpu::TextureViewDimension::D2,
                        multisampled: false,
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 1,
                    visibility: wgpu::ShaderStages::COMPUTE,
                    ty: wgpu::BindingType::StorageTexture {
                        access: wgpu::StorageTextureAccess::WriteOnly,
                        format: STATE_FORMAT,
                        view_dimension: wgpu::TextureViewDimension::D2,
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 2,
                    visibility: wgpu::ShaderStages::COMPUTE,
                    ty: wgpu::BindingType::Texture {
                        sample_type: wgpu::TextureSampleType::Float { filterable: false },
                        view_dimension: wgpu::TextureViewDimension::D2,
                        multisampled: false,
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 3,
                    visibility: wgpu::ShaderStages::COMPUTE,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                },
            ],
        });

        let view_a = texture_a.create_view(&wgpu::TextureViewDescriptor::default());
        let view_b = texture_b.create_view(&wgpu::TextureViewDescriptor::default());
        let base_view = base_texture.create_view(&wgpu::TextureViewDescriptor::default());

        let bind_group = |label, input: &wgpu::TextureView, output: &wgpu::TextureView| {
            device.create_bind_group(&wgpu::BindGroupDescriptor {
                label: Some(label),
                layout: &bind_group_layout,
                entries: &[
                    wgpu::BindGroupEntry {
                        binding: 0,
                        resource: wgpu::BindingResource::TextureView(input),
                    },
                    wgpu::BindGroupEntry {
                        binding: 1,
                        resource: wgpu::BindingResource::TextureView(output),
                    },
                    wgpu::BindGroupEntry {
                        binding: 2,
                        resource: wgpu::BindingResource::TextureView(&base_view),
                    },
                    wgpu::BindGroupEntry {
                        binding: 3,
                        resource: uniform_buffer.as_entire_binding(),
                    },
                ],
            })
        };

        let bind_groups = [
            bind_group("Compute Bind Group A->B", &view_a, &view_b),
            bind_group("Compute Bind Group B->A", &view_b, &view_a),
        ];

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Compute Pipeline Layout"),
            bind_group_layouts: &[&bind_group_layout],
            push_constant_ranges: &[],
        });

        let pipeline = device.create_compute_pipeline(&wgpu::ComputePipelineDescriptor {
            label: Some("Compute Pipeline"),
            layout: Some(&pipeline_layout),
            module: &module,
            entry_point: Some("main"),
            compilation_options: Default::default(),
            cache: None,
        });

        Ok(Self {
            layout,
            pipeline,
            uniform_buffer,
            views: [view_a, view_b],
            bind_groups,
            ping_pong: PingPong::new(),
        })
    }

    /// Upload the time uniforms consumed by the next `step()`.
    pub fn set_time(&self, queue: &wgpu::Queue, time: f32, delta_time: f32) {
        let uniforms = SimUniforms {
            time,
            delta_time,
            grid_size: self.layout.grid_size(),
            point_count: self.layout.point_count(),
        };
        queue.write_buffer(&self.uniform_buffer, 0, bytemuck::bytes_of(&uniforms));
    }

    /// Record one full-grid update pass into `encoder` and swap the ping
    /// and pong labels. The pass reads the surface that was current on
    /// entry and writes the other; after the swap, `current_index()` points
    /// at the freshly written surface.
    pub fn step(&mut self, encoder: &mut wgpu::CommandEncoder) {
        {
            let mut pass = encoder.begin_compute_pass(&wgpu::ComputePassDescriptor {
                label: Some("State Update Pass"),
                timestamp_writes: None,
            });
            pass.set_pipeline(&self.pipeline);
            pass.set_bind_group(0, &self.bind_groups[self.ping_pong.current()], &[]);
            let groups = dispatch_size(self.layout.grid_size());
            pass.dispatch_workgroups(groups, groups, 1);
        }
        self.ping_pong.swap();
    }

    /// Index (0 or 1) of the surface holding the most recently computed
    /// state. Stable until the next `step()` call; consumers select the
    /// bind group they pre-built for that surface.
    pub fn current_index(&self) -> usize {
        self.ping_pong.current()
    }

    /// Views of both state surfaces, in fixed order.
    pub fn state_views(&self) -> [&wgpu::TextureView; 2] {
        [&self.views[0], &self.views[1]]
    }

    /// The field layout the surfaces were allocated for.
    pub fn layout(&self) -> FieldLayout {
        self.layout
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn surfaces_never_alias() {
        let mut pp = PingPong::new();
        for _ in 0..1001 {
            assert_ne!(pp.current(), pp.target());
            let target_before = pp.target();
            pp.swap();
            // The surface just written becomes current.
            assert_eq!(pp.current(), target_before);
        }
    }

    #[test]
    fn swap_is_an_involution() {
        let mut pp = PingPong::new();
        assert_eq!(pp.current(), 0);
        pp.swap();
        assert_eq!(pp.current(), 1);
        pp.swap();
        assert_eq!(pp.current(), 0);
    }

    #[test]
    fn sim_uniforms_match_wgsl_layout() {
        // struct SimUniforms { time, delta_time, grid_size, point_count }
        assert_eq!(std::mem::size_of::<SimUniforms>(), 16);
    }

    #[test]
    fn dispatch_covers_the_grid() {
        assert_eq!(dispatch_size(8), 1);
        assert_eq!(dispatch_size(9), 2);
        assert_eq!(dispatch_size(200), 25);
        assert_eq!(dispatch_size(201), 26);
        for grid in 1..512 {
            assert!(dispatch_size(grid) * WORKGROUP_SIZE >= grid);
        }
    }
}
