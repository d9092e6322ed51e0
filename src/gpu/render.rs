//! The render stage: one point sprite per particle, decoded from the
//! compute stage's current state texture.
//!
//! No particle data crosses back to the host. The draw call issues exactly
//! `point_count` instances; each instance fetches its own texel and expands
//! to a screen-facing quad in the vertex shader.

use bytemuck::{Pod, Zeroable};
use glam::Vec2;
use wgpu::util::DeviceExt;

use crate::camera::Camera;
use crate::settings::RenderSettings;
use crate::shaders;

use super::DEPTH_FORMAT;

/// Per-frame render parameters, laid out to match the WGSL `RenderUniforms`
/// struct field for field.
#[repr(C)]
#[derive(Copy, Clone, Pod, Zeroable)]
pub struct RenderUniforms {
    pub view: [[f32; 4]; 4],
    pub proj: [[f32; 4]; 4],
    pub resolution: [f32; 2],
    pub base_size: f32,
    pub grid_size: u32,
}

/// Screen-space point size in pixels for a particle at `view_z`.
///
/// Nearer points are larger; scaling by the vertical resolution keeps the
/// apparent size independent of window size and pixel ratio. Points at or
/// behind the camera plane (`view_z >= 0`) clamp to zero, which degenerates
/// the sprite quad and rasterizes nothing.
pub fn point_size_px(base_size: f32, resolution_y: f32, view_z: f32) -> f32 {
    (base_size * resolution_y / -view_z).max(0.0)
}

/// Pipeline and per-surface bind groups for point-sprite drawing.
pub struct RenderStage {
    pipeline: wgpu::RenderPipeline,
    uniform_buffer: wgpu::Buffer,
    bind_groups: [wgpu::BindGroup; 2],
    grid_size: u32,
    point_count: u32,
    resolution: Vec2,
}

impl RenderStage {
    /// Build the render pipeline and one bind group per state surface.
    ///
    /// `state_views` must be the compute stage's two surfaces in fixed
    /// order; `record()` later selects by the compute stage's current
    /// index, so the stage always reads the surface written by the step
    /// recorded earlier in the same frame.
    pub fn new(
        device: &wgpu::Device,
        surface_format: wgpu::TextureFormat,
        state_views: [&wgpu::TextureView; 2],
        grid_size: u32,
        point_count: u32,
        resolution: Vec2,
    ) -> Self {
        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Point Sprite Shader"),
            source: wgpu::ShaderSource::Wgsl(shaders::render_shader().into()),
        });

        let uniforms = RenderUniforms {
            view: [[0.0; 4]; 4],
            proj: [[0.0; 4]; 4],
            resolution: resolution.into(),
            base_size: 0.0,
            grid_size,
        };
        let uniform_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Render Uniform Buffer"),
            contents: bytemuck::bytes_of(&uniforms),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });

        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Render Bind Group Layout"),
            entries: &[
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::VERTEX,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 1,
                    visibility: wgpu::ShaderStages::VERTEX,
                    ty: wgpu::BindingType::Texture {
                        sample_type: wgpu::TextureSampleType::Float { filterable: false },
                        view_dimension: wgpu::TextureViewDimension::D2,
                        multisampled: false,
                    },
                    count: None,
                },
            ],
        });

        let bind_groups = [0usize, 1].map(|i| {
            device.create_bind_group(&wgpu::BindGroupDescriptor {
                label: Some("Render Bind Group"),
                layout: &bind_group_layout,
                entries: &[
                    wgpu::BindGroupEntry {
                        binding: 0,
                        resource: uniform_buffer.as_entire_binding(),
                    },
                    wgpu::BindGroupEntry {
                        binding: 1,
                        resource: wgpu::BindingResource::TextureView(state_views[i]),
                    },
                ],
            })
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Render Pipeline Layout"),
            bind_group_layouts: &[&bind_group_layout],
            push_constant_ranges: &[],
        });

        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("Render Pipeline"),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: Some("vs_main"),
                buffers: &[],
                compilation_options: Default::default(),
            },
            fragment: Some(wgpu::FragmentState {
                module: &shader,
                entry_point: Some("fs_main"),
                targets: &[Some(wgpu::ColorTargetState {
                    format: surface_format,
                    blend: Some(wgpu::BlendState::ALPHA_BLENDING),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
                compilation_options: Default::default(),
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                strip_index_format: None,
                front_face: wgpu::FrontFace::Ccw,
                cull_mode: None,
                polygon_mode: wgpu::PolygonMode::Fill,
                unclipped_depth: false,
                conservative: false,
            },
            depth_stencil: Some(wgpu::DepthStencilState {
                format: DEPTH_FORMAT,
                depth_write_enabled: true,
                depth_compare: wgpu::CompareFunction::Less,
                stencil: wgpu::StencilState::default(),
                bias: wgpu::DepthBiasState::default(),
            }),
            multisample: wgpu::MultisampleState::default(),
            multiview: None,
            cache: None,
        });

        Self {
            pipeline,
            uniform_buffer,
            bind_groups,
            grid_size,
            point_count,
            resolution,
        }
    }

    /// Update the resolution uniform on viewport changes. Takes effect at
    /// the next `update_uniforms` upload.
    pub fn set_resolution(&mut self, resolution: Vec2) {
        self.resolution = resolution;
    }

    /// Upload the per-frame uniforms.
    pub fn update_uniforms(&self, queue: &wgpu::Queue, camera: &Camera, settings: &RenderSettings) {
        let uniforms = RenderUniforms {
            view: camera.view_matrix().to_cols_array_2d(),
            proj: camera.projection_matrix().to_cols_array_2d(),
            resolution: self.resolution.into(),
            base_size: settings.base_point_size(),
            grid_size: self.grid_size,
        };
        queue.write_buffer(&self.uniform_buffer, 0, bytemuck::bytes_of(&uniforms));
    }

    /// Record the particle draw into an open render pass, reading the state
    /// surface at `current`.
    pub fn record(&self, pass: &mut wgpu::RenderPass<'_>, current: usize) {
        pass.set_pipeline(&self.pipeline);
        pass.set_bind_group(0, &self.bind_groups[current], &[]);
        pass.draw(0..6, 0..self.point_count);
    }

    /// Number of particle instances drawn per frame.
    pub fn point_count(&self) -> u32 {
        self.point_count
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn uniforms_match_wgsl_layout() {
        // mat4 + mat4 + vec2 + f32 + u32, padded to a 16-byte multiple.
        assert_eq!(std::mem::size_of::<RenderUniforms>(), 144);
        assert_eq!(std::mem::offset_of!(RenderUniforms, resolution), 128);
        assert_eq!(std::mem::offset_of!(RenderUniforms, base_size), 136);
        assert_eq!(std::mem::offset_of!(RenderUniforms, grid_size), 140);
    }

    #[test]
    fn size_attenuates_with_depth() {
        // base 0.4 at 900 vertical pixels, five units in front of the lens.
        assert_eq!(point_size_px(0.4, 900.0, -5.0), 72.0);
        // Twice as far away, half the size.
        assert_eq!(point_size_px(0.4, 900.0, -10.0), 36.0);
        // Doubling the resolution doubles the pixel size.
        assert_eq!(point_size_px(0.4, 1800.0, -5.0), 144.0);
    }

    #[test]
    fn points_behind_the_camera_collapse_to_zero() {
        assert_eq!(point_size_px(0.4, 900.0, 0.0), 0.0);
        assert_eq!(point_size_px(0.4, 900.0, 3.0), 0.0);
    }
}
