//! # texflow - texture-based GPGPU particle simulation
//!
//! A fixed population of particles lives entirely on the GPU: per-particle
//! state is encoded one texel per particle in a square RGBA32F texture, a
//! ping-pong compute pass advances it every frame, and a point-sprite render
//! pass decodes the current state texture directly in the vertex stage.
//! Nothing is read back to the host after initialization.
//!
//! ## Quick Start
//!
//! ```ignore
//! use texflow::prelude::*;
//!
//! fn main() -> Result<(), SimulationError> {
//!     Simulation::new(PointSet::uv_sphere(3.0, 128, 64))
//!         .with_base_point_size(0.4)
//!         .with_state_preview(true)
//!         .run()
//! }
//! ```
//!
//! ## Core Concepts
//!
//! ### State grid
//!
//! A point set of size `M` maps onto the smallest square grid that holds it,
//! `n = ceil(sqrt(M))`. Particle `i` owns texel `(i % n, i / n)`; the same
//! mapping writes the initial state and decodes it at render time, and both
//! sides are generated from [`layout`] and [`shaders`] so they cannot drift.
//! Texels past `M` are padding: zeroed once, never drawn.
//!
//! ### Ping-pong stepping
//!
//! Two identical state surfaces alternate roles each step. The update shader
//! reads the whole previous-frame texture (any texel may depend on any
//! other) and writes the whole next-frame texture; the surfaces never alias.
//! See [`gpu::ComputeStage`].
//!
//! ### Update bodies
//!
//! Behavior is a WGSL body spliced into a fixed harness. See the [`shaders`]
//! module for the contract and [`shaders::FLOW_FIELD_UPDATE`] for the stock
//! noise-flow behavior:
//!
//! ```ignore
//! Simulation::new(points)
//!     .with_update_body(r#"
//!         state = vec4<f32>(state.xyz + vec3<f32>(0.0, sim.delta_time, 0.0), state.w);
//!     "#)
//!     .run()?;
//! ```
//!
//! ### Display decoupling
//!
//! Window size and pixel ratio feed the render resolution uniform and the
//! camera aspect only. The state grid is sized by particle count alone; a
//! resize never reallocates simulation state.

pub mod camera;
pub mod error;
pub mod geometry;
pub mod gpu;
pub mod layout;
pub mod settings;
pub mod shaders;
mod simulation;
pub mod time;
pub mod viewport;

pub use camera::Camera;
pub use error::{GpuError, SetupError, SimulationError};
pub use geometry::PointSet;
pub use glam::{Vec2, Vec3, Vec4};
pub use layout::FieldLayout;
pub use settings::RenderSettings;
pub use simulation::Simulation;
pub use time::FrameClock;
pub use viewport::{ResizeEvent, Viewport};

/// Convenient re-exports for common usage.
///
/// ```ignore
/// use texflow::prelude::*;
/// ```
pub mod prelude {
    pub use crate::camera::Camera;
    pub use crate::error::SimulationError;
    pub use crate::geometry::PointSet;
    pub use crate::layout::FieldLayout;
    pub use crate::settings::RenderSettings;
    pub use crate::shaders::{FLOW_FIELD_UPDATE, IDENTITY_UPDATE};
    pub use crate::simulation::Simulation;
    pub use crate::viewport::{ResizeEvent, Viewport};
    pub use crate::{Vec2, Vec3, Vec4};
}
