//! Presentation settings for particle rendering.
//!
//! These are pure display parameters, separate from simulation state: a host
//! application (or an external tweak panel) mutates a [`RenderSettings`] and
//! the engine folds it into the render uniforms each frame. No simulation
//! parameter flows through here.

use glam::Vec3;

/// Upper bound for [`RenderSettings::base_point_size`].
pub const MAX_POINT_SIZE: f32 = 1.0;

/// Host-tunable rendering parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RenderSettings {
    /// Background clear color, linear RGB.
    pub clear_color: Vec3,
    /// Base point size before depth attenuation, in `[0, 1]`.
    base_point_size: f32,
}

impl RenderSettings {
    /// Settings matching the stock demo look: dark plum background,
    /// mid-range point size.
    pub fn new() -> Self {
        Self {
            clear_color: Vec3::new(0.161, 0.098, 0.122),
            base_point_size: 0.4,
        }
    }

    /// Set the base point size, clamped to `[0, MAX_POINT_SIZE]`.
    pub fn set_base_point_size(&mut self, size: f32) {
        self.base_point_size = size.clamp(0.0, MAX_POINT_SIZE);
    }

    /// Base point size before depth attenuation.
    #[inline]
    pub fn base_point_size(&self) -> f32 {
        self.base_point_size
    }

    /// Builder-style clear color override.
    pub fn with_clear_color(mut self, color: Vec3) -> Self {
        self.clear_color = color;
        self
    }

    /// Builder-style point size override, clamped like the setter.
    pub fn with_base_point_size(mut self, size: f32) -> Self {
        self.set_base_point_size(size);
        self
    }

    /// Clear color as a wgpu load-op color.
    pub fn wgpu_clear_color(&self) -> wgpu::Color {
        wgpu::Color {
            r: self.clear_color.x as f64,
            g: self.clear_color.y as f64,
            b: self.clear_color.z as f64,
            a: 1.0,
        }
    }
}

impl Default for RenderSettings {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn point_size_is_bounded() {
        let mut settings = RenderSettings::new();
        settings.set_base_point_size(4.2);
        assert_eq!(settings.base_point_size(), MAX_POINT_SIZE);
        settings.set_base_point_size(-1.0);
        assert_eq!(settings.base_point_size(), 0.0);

        let settings = RenderSettings::new().with_base_point_size(0.25);
        assert_eq!(settings.base_point_size(), 0.25);
    }

    #[test]
    fn defaults_are_presentation_only() {
        let settings = RenderSettings::default();
        assert_eq!(settings.base_point_size(), 0.4);
        let c = settings.wgpu_clear_color();
        assert!(c.r < 0.2 && c.g < 0.2 && c.b < 0.2);
    }
}
