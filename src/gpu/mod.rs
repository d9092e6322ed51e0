//! GPU-resident engine state: device context, compute and render stages,
//! and the per-frame recording that ties them together.
//!
//! One frame is: upload time uniforms, record the compute step, record the
//! render pass reading the surface that step just wrote, submit, present.
//! Everything runs on one queue, so the render pass's read of the state
//! texture is ordered after the compute pass's write without any host-side
//! synchronization.

mod compute;
mod preview;
mod render;

pub use compute::{ComputeStage, PingPong, STATE_FORMAT};
pub use preview::StatePreview;
pub use render::{point_size_px, RenderStage, RenderUniforms};

use std::sync::Arc;

use winit::window::Window;

use crate::camera::Camera;
use crate::error::{GpuError, SimulationError};
use crate::geometry::PointSet;
use crate::layout::FieldLayout;
use crate::settings::RenderSettings;
use crate::time::FrameClock;
use crate::viewport::{ResizeEvent, Viewport};

pub(crate) const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;

/// Device, queue and display surface.
pub struct GpuContext {
    pub(crate) surface: wgpu::Surface<'static>,
    pub(crate) device: wgpu::Device,
    pub(crate) queue: wgpu::Queue,
    pub(crate) config: wgpu::SurfaceConfiguration,
}

impl GpuContext {
    /// Request an adapter and device for `window` and configure its surface
    /// at `surface_size` physical pixels.
    pub async fn new(window: Arc<Window>, surface_size: (u32, u32)) -> Result<Self, GpuError> {
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::PRIMARY,
            ..Default::default()
        });

        let surface = instance.create_surface(window)?;

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .ok_or(GpuError::NoAdapter)?;

        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor {
                label: Some("Device"),
                required_features: wgpu::Features::empty(),
                required_limits: wgpu::Limits::default(),
                memory_hints: Default::default(),
                trace: Default::default(),
                experimental_features: Default::default(),
            })
            .await?;

        let surface_caps = surface.get_capabilities(&adapter);
        let surface_format = surface_caps
            .formats
            .iter()
            .find(|f| f.is_srgb())
            .copied()
            .unwrap_or(surface_caps.formats[0]);

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width: surface_size.0,
            height: surface_size.1,
            present_mode: wgpu::PresentMode::AutoVsync,
            alpha_mode: surface_caps.alpha_modes[0],
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &config);

        Ok(Self {
            surface,
            device,
            queue,
            config,
        })
    }

    /// Resize the display surface backing store.
    pub fn configure(&mut self, (width, height): (u32, u32)) {
        if width > 0 && height > 0 {
            self.config.width = width;
            self.config.height = height;
            self.surface.configure(&self.device, &self.config);
        }
    }
}

/// The full particle pipeline: compute stage, render stage, camera and
/// viewport state, driven one `frame()` at a time.
pub struct ParticlePipeline {
    context: GpuContext,
    compute: ComputeStage,
    render: RenderStage,
    preview: Option<StatePreview>,
    depth_texture: wgpu::TextureView,
    /// Orbit camera; the frame driver mutates it from input events.
    pub camera: Camera,
    /// Presentation tunables folded into the render uniforms each frame.
    pub settings: RenderSettings,
    viewport: Viewport,
    clock: FrameClock,
}

impl ParticlePipeline {
    /// Build the whole pipeline for a source point set.
    ///
    /// All setup errors (empty point set, invalid update shader, GPU
    /// initialization) surface here, before the first frame.
    pub async fn new(
        window: Arc<Window>,
        points: &PointSet,
        update_body: &str,
        settings: RenderSettings,
        with_preview: bool,
    ) -> Result<Self, SimulationError> {
        let layout = FieldLayout::for_point_count(points.len() as u32)?;

        let size = window.inner_size();
        let scale_factor = window.scale_factor();
        let viewport = Viewport::from_physical(size.width, size.height, scale_factor);

        let context = GpuContext::new(window, viewport.surface_size()).await?;

        let initial_state = layout.pack_points(points.positions());
        let compute = ComputeStage::new(
            &context.device,
            &context.queue,
            layout,
            &initial_state,
            update_body,
        )?;

        let mut camera = Camera::new();
        camera.set_aspect(viewport.aspect());

        let render = RenderStage::new(
            &context.device,
            context.config.format,
            compute.state_views(),
            layout.grid_size(),
            layout.point_count(),
            viewport.resolution(),
        );

        let preview = with_preview.then(|| {
            StatePreview::new(&context.device, context.config.format, compute.state_views())
        });

        let depth_texture = create_depth_texture(&context.device, &context.config);

        log::info!(
            "particle pipeline ready: {} particles on a {n}x{n} state grid ({} padding texels)",
            layout.point_count(),
            layout.padding_texels(),
            n = layout.grid_size(),
        );

        Ok(Self {
            context,
            compute,
            render,
            preview,
            depth_texture,
            camera,
            settings,
            viewport,
            clock: FrameClock::new(),
        })
    }

    /// Handle a window resize or pixel-ratio change.
    ///
    /// Updates the viewport, then pushes the new resolution into the render
    /// uniforms, the new aspect into the camera, and resizes the surface and
    /// depth buffer. The compute grid is untouched: simulation resolution is
    /// a function of particle count, never of display resolution.
    pub fn handle_resize(&mut self, event: ResizeEvent) {
        self.viewport.apply(event);
        self.context.configure(self.viewport.surface_size());
        self.depth_texture = create_depth_texture(&self.context.device, &self.context.config);
        self.render.set_resolution(self.viewport.resolution());
        self.camera.set_aspect(self.viewport.aspect());
        log::debug!(
            "viewport {}x{} @ {} -> resolution {:?}",
            self.viewport.width(),
            self.viewport.height(),
            self.viewport.pixel_ratio(),
            self.viewport.resolution(),
        );
    }

    /// Reconfigure the surface at the current viewport, after a lost or
    /// outdated swapchain.
    pub fn reconfigure(&mut self) {
        self.context.configure(self.viewport.surface_size());
        self.depth_texture = create_depth_texture(&self.context.device, &self.context.config);
    }

    /// Advance the simulation one step and draw the result.
    pub fn frame(&mut self) -> Result<(), wgpu::SurfaceError> {
        let (time, delta_time) = self.clock.update();
        self.compute.set_time(&self.context.queue, time, delta_time);
        self.render
            .update_uniforms(&self.context.queue, &self.camera, &self.settings);

        let output = self.context.surface.get_current_texture()?;
        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let mut encoder = self
            .context
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Frame Encoder"),
            });

        self.compute.step(&mut encoder);

        {
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Render Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    depth_slice: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(self.settings.wgpu_clear_color()),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &self.depth_texture,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                timestamp_writes: None,
                occlusion_query_set: None,
            });

            // After step() the swap has happened: current is the surface the
            // compute pass above just wrote, and queue ordering makes the
            // read-after-write safe.
            let current = self.compute.current_index();
            self.render.record(&mut pass, current);
            if let Some(preview) = &self.preview {
                preview.record(&mut pass, current);
            }
        }

        self.context.queue.submit(std::iter::once(encoder.finish()));
        output.present();

        Ok(())
    }

    /// The frame clock, for pausing or pinning a fixed delta.
    pub fn clock_mut(&mut self) -> &mut FrameClock {
        &mut self.clock
    }

    /// Current viewport state.
    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    /// Side length of the state grid, fixed at construction.
    pub fn grid_size(&self) -> u32 {
        self.compute.layout().grid_size()
    }
}

fn create_depth_texture(
    device: &wgpu::Device,
    config: &wgpu::SurfaceConfiguration,
) -> wgpu::TextureView {
    let texture = device.create_texture(&wgpu::TextureDescriptor {
        label: Some("Depth Texture"),
        size: wgpu::Extent3d {
            width: config.width,
            height: config.height,
            depth_or_array_layers: 1,
        },
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format: DEPTH_FORMAT,
        usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
        view_formats: &[],
    });
    texture.create_view(&wgpu::TextureViewDescriptor::default())
}
