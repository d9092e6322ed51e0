//! Orbit camera for viewing the particle field.

use glam::{Mat4, Vec3};

/// Orbit camera with a perspective projection.
///
/// Mouse-drag orbiting mutates `yaw`/`pitch`, scrolling mutates `distance`;
/// the viewport adapter owns `aspect` and updates it on resize.
pub struct Camera {
    /// Horizontal rotation angle in radians.
    pub yaw: f32,
    /// Vertical rotation angle in radians.
    pub pitch: f32,
    /// Distance from the target point.
    pub distance: f32,
    /// Point the camera orbits around.
    pub target: Vec3,
    /// Vertical field of view in radians.
    pub fov_y: f32,
    /// Near clip plane.
    pub near: f32,
    /// Far clip plane.
    pub far: f32,
    aspect: f32,
}

impl Camera {
    /// Camera framing the demo field: eye near (4.5, 4, 11) looking at the
    /// origin, 35 degree vertical field of view.
    pub fn new() -> Self {
        Self {
            yaw: 0.388,
            pitch: 0.324,
            distance: 12.5,
            target: Vec3::ZERO,
            fov_y: 35.0_f32.to_radians(),
            near: 0.1,
            far: 100.0,
            aspect: 16.0 / 9.0,
        }
    }

    /// Calculate the camera's world position.
    pub fn position(&self) -> Vec3 {
        let x = self.distance * self.pitch.cos() * self.yaw.sin();
        let y = self.distance * self.pitch.sin();
        let z = self.distance * self.pitch.cos() * self.yaw.cos();
        self.target + Vec3::new(x, y, z)
    }

    /// View matrix for rendering.
    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_at_rh(self.position(), self.target, Vec3::Y)
    }

    /// Perspective projection for the current aspect ratio.
    pub fn projection_matrix(&self) -> Mat4 {
        Mat4::perspective_rh(self.fov_y, self.aspect, self.near, self.far)
    }

    /// Current width-over-height aspect ratio.
    #[inline]
    pub fn aspect(&self) -> f32 {
        self.aspect
    }

    /// Update the projection aspect ratio (called on viewport changes).
    pub fn set_aspect(&mut self, aspect: f32) {
        if aspect.is_finite() && aspect > 0.0 {
            self.aspect = aspect;
        }
    }

    /// Apply a mouse-drag orbit delta. Pitch is clamped short of the poles.
    pub fn orbit(&mut self, delta_yaw: f32, delta_pitch: f32) {
        self.yaw -= delta_yaw;
        self.pitch = (self.pitch + delta_pitch).clamp(-1.5, 1.5);
    }

    /// Apply a scroll-wheel zoom delta.
    pub fn zoom(&mut self, delta: f32) {
        self.distance = (self.distance - delta).clamp(0.5, 60.0);
    }
}

impl Default for Camera {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec4;

    #[test]
    fn target_sits_in_front_of_camera() {
        let camera = Camera::new();
        let view = camera.view_matrix();
        let target_view = view * Vec4::new(0.0, 0.0, 0.0, 1.0);
        // View space looks down -Z, so a visible point has negative z.
        assert!(target_view.z < 0.0);
        assert!((target_view.z.abs() - camera.distance).abs() < 1e-3);
    }

    #[test]
    fn aspect_feeds_projection() {
        let mut camera = Camera::new();
        camera.set_aspect(2.0);
        let wide = camera.projection_matrix();
        camera.set_aspect(1.0);
        let square = camera.projection_matrix();
        // x scale halves when the aspect doubles.
        assert!((wide.col(0).x * 2.0 - square.col(0).x).abs() < 1e-6);

        // Degenerate aspect is ignored.
        camera.set_aspect(0.0);
        assert_eq!(camera.aspect(), 1.0);
    }

    #[test]
    fn orbit_clamps_pitch() {
        let mut camera = Camera::new();
        camera.orbit(0.0, 10.0);
        assert_eq!(camera.pitch, 1.5);
        camera.zoom(1000.0);
        assert_eq!(camera.distance, 0.5);
    }
}
