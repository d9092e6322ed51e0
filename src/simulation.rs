//! Simulation builder and frame driver.
//!
//! The builder collects the source point set, the update-shader body and the
//! presentation settings, then `run()` hands everything to a winit event
//! loop. The frame driver owns timing and event routing only; all simulation
//! state stays GPU-resident inside [`ParticlePipeline`].

use std::sync::Arc;

use glam::Vec3;
use winit::{
    application::ApplicationHandler,
    event::{ElementState, MouseButton, MouseScrollDelta, WindowEvent},
    event_loop::{ActiveEventLoop, ControlFlow, EventLoop},
    window::{Window, WindowId},
};

use crate::error::{SetupError, SimulationError};
use crate::geometry::PointSet;
use crate::gpu::ParticlePipeline;
use crate::settings::RenderSettings;
use crate::shaders;
use crate::viewport::ResizeEvent;

/// A particle simulation builder.
///
/// Configure with method chaining, then call [`run`](Simulation::run):
///
/// ```ignore
/// use texflow::prelude::*;
///
/// Simulation::new(PointSet::uv_sphere(3.0, 64, 32))
///     .with_base_point_size(0.4)
///     .run()?;
/// ```
pub struct Simulation {
    points: PointSet,
    update_body: String,
    settings: RenderSettings,
    preview: bool,
    fixed_delta: Option<f32>,
    title: String,
}

impl Simulation {
    /// Create a simulation seeded from `points`, with the default
    /// flow-field update body.
    pub fn new(points: PointSet) -> Self {
        Self {
            points,
            update_body: shaders::FLOW_FIELD_UPDATE.to_string(),
            settings: RenderSettings::new(),
            preview: false,
            fixed_delta: None,
            title: "texflow".to_string(),
        }
    }

    /// Replace the per-texel update body. See the [`shaders`] module docs
    /// for the names in scope inside a body.
    pub fn with_update_body(mut self, body: impl Into<String>) -> Self {
        self.update_body = body.into();
        self
    }

    /// Replace the presentation settings wholesale.
    pub fn with_settings(mut self, settings: RenderSettings) -> Self {
        self.settings = settings;
        self
    }

    /// Set the background clear color.
    pub fn with_clear_color(mut self, color: Vec3) -> Self {
        self.settings.clear_color = color;
        self
    }

    /// Set the base point size, clamped to `[0, 1]`.
    pub fn with_base_point_size(mut self, size: f32) -> Self {
        self.settings.set_base_point_size(size);
        self
    }

    /// Show the raw state texture in the lower-right corner.
    pub fn with_state_preview(mut self, preview: bool) -> Self {
        self.preview = preview;
        self
    }

    /// Pin the per-frame delta for deterministic stepping.
    pub fn with_fixed_delta(mut self, delta: Option<f32>) -> Self {
        self.fixed_delta = delta;
        self
    }

    /// Set the window title.
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    /// Run the simulation. Blocks until the window closes.
    ///
    /// Setup errors (empty point set, invalid shader, GPU initialization)
    /// are returned before any frame is drawn.
    pub fn run(self) -> Result<(), SimulationError> {
        if self.points.is_empty() {
            return Err(SetupError::EmptyPointSet.into());
        }

        let event_loop = EventLoop::new()?;
        event_loop.set_control_flow(ControlFlow::Poll);

        let mut app = App::new(self);
        event_loop.run_app(&mut app)?;

        match app.fatal {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

/// winit application driving the pipeline once per display refresh.
struct App {
    config: Simulation,
    window: Option<Arc<Window>>,
    pipeline: Option<ParticlePipeline>,
    mouse_pressed: bool,
    last_mouse_pos: Option<(f64, f64)>,
    /// Setup failure captured inside the event loop, surfaced by `run()`.
    fatal: Option<SimulationError>,
}

impl App {
    fn new(config: Simulation) -> Self {
        Self {
            config,
            window: None,
            pipeline: None,
            mouse_pressed: false,
            last_mouse_pos: None,
            fatal: None,
        }
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }

        let window_attrs = Window::default_attributes()
            .with_title(self.config.title.clone())
            .with_inner_size(winit::dpi::LogicalSize::new(1280, 720));

        let window = match event_loop.create_window(window_attrs) {
            Ok(window) => Arc::new(window),
            Err(err) => {
                self.fatal = Some(err.into());
                event_loop.exit();
                return;
            }
        };
        self.window = Some(window.clone());

        match pollster::block_on(ParticlePipeline::new(
            window,
            &self.config.points,
            &self.config.update_body,
            self.config.settings,
            self.config.preview,
        )) {
            Ok(mut pipeline) => {
                pipeline.clock_mut().set_fixed_delta(self.config.fixed_delta);
                self.pipeline = Some(pipeline);
            }
            Err(err) => {
                log::error!("setup failed: {}", err);
                self.fatal = Some(err);
                event_loop.exit();
            }
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _id: WindowId, event: WindowEvent) {
        match event {
            WindowEvent::CloseRequested => {
                event_loop.exit();
            }
            WindowEvent::Resized(physical_size) => {
                if let (Some(pipeline), Some(window)) = (&mut self.pipeline, &self.window) {
                    pipeline.handle_resize(ResizeEvent::from_physical(
                        physical_size.width,
                        physical_size.height,
                        window.scale_factor(),
                    ));
                }
            }
            WindowEvent::ScaleFactorChanged { scale_factor, .. } => {
                if let (Some(pipeline), Some(window)) = (&mut self.pipeline, &self.window) {
                    let size = window.inner_size();
                    pipeline.handle_resize(ResizeEvent::from_physical(
                        size.width,
                        size.height,
                        scale_factor,
                    ));
                }
            }
            WindowEvent::MouseInput { state, button, .. } => {
                if button == MouseButton::Left {
                    self.mouse_pressed = state == ElementState::Pressed;
                    if !self.mouse_pressed {
                        self.last_mouse_pos = None;
                    }
                }
            }
            WindowEvent::CursorMoved { position, .. } => {
                if self.mouse_pressed {
                    if let Some((last_x, last_y)) = self.last_mouse_pos {
                        let dx = (position.x - last_x) as f32;
                        let dy = (position.y - last_y) as f32;
                        if let Some(pipeline) = &mut self.pipeline {
                            pipeline.camera.orbit(dx * 0.005, dy * 0.005);
                        }
                    }
                    self.last_mouse_pos = Some((position.x, position.y));
                }
            }
            WindowEvent::MouseWheel { delta, .. } => {
                let scroll = match delta {
                    MouseScrollDelta::LineDelta(_, y) => y,
                    MouseScrollDelta::PixelDelta(pos) => pos.y as f32 * 0.1,
                };
                if let Some(pipeline) = &mut self.pipeline {
                    pipeline.camera.zoom(scroll * 0.3);
                }
            }
            WindowEvent::RedrawRequested => {
                if let Some(pipeline) = &mut self.pipeline {
                    match pipeline.frame() {
                        Ok(()) => {}
                        Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                            pipeline.reconfigure();
                        }
                        Err(wgpu::SurfaceError::OutOfMemory) => {
                            log::error!("surface out of memory, stopping");
                            event_loop.exit();
                        }
                        Err(err) => log::warn!("frame skipped: {:?}", err),
                    }
                }
                if let Some(window) = &self.window {
                    window.request_redraw();
                }
            }
            _ => {}
        }
    }
}
