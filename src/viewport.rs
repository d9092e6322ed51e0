//! Viewport state and resize handling.
//!
//! The viewport owns the logical window size and device pixel ratio. The
//! render stage's resolution uniform and the camera's aspect ratio are both
//! pure functions of this state; the compute grid is not. Simulation
//! resolution depends on particle count alone, so a resize never touches it.

use glam::Vec2;

/// Device pixel ratios above this are clamped; rendering at full native
/// resolution on very dense displays costs fill rate without visible gain.
pub const MAX_PIXEL_RATIO: f32 = 2.0;

/// A window resize or pixel-ratio change reported by the host environment.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResizeEvent {
    /// New logical width in window units.
    pub width: u32,
    /// New logical height in window units.
    pub height: u32,
    /// New device pixel ratio.
    pub pixel_ratio: f32,
}

impl ResizeEvent {
    /// Build an event from a physical size and the window scale factor.
    pub fn from_physical(physical_width: u32, physical_height: u32, scale_factor: f64) -> Self {
        Self {
            width: (physical_width as f64 / scale_factor).round() as u32,
            height: (physical_height as f64 / scale_factor).round() as u32,
            pixel_ratio: scale_factor as f32,
        }
    }
}

/// Logical size plus pixel ratio of the display surface.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    width: u32,
    height: u32,
    pixel_ratio: f32,
}

impl Viewport {
    /// Create a viewport from logical dimensions and a device pixel ratio.
    ///
    /// The ratio is clamped to `(0, MAX_PIXEL_RATIO]`; zero-size dimensions
    /// are bumped to 1 so the surface and aspect ratio stay defined while a
    /// window is minimized.
    pub fn new(width: u32, height: u32, pixel_ratio: f32) -> Self {
        Self {
            width: width.max(1),
            height: height.max(1),
            pixel_ratio: clamp_ratio(pixel_ratio),
        }
    }

    /// Derive a viewport from a physical size and the window scale factor.
    pub fn from_physical(physical_width: u32, physical_height: u32, scale_factor: f64) -> Self {
        let ratio = clamp_ratio(scale_factor as f32);
        let width = (physical_width as f64 / scale_factor).round() as u32;
        let height = (physical_height as f64 / scale_factor).round() as u32;
        Self::new(width, height, ratio)
    }

    /// Apply a resize event.
    pub fn apply(&mut self, event: ResizeEvent) {
        *self = Self::new(event.width, event.height, event.pixel_ratio);
    }

    /// Logical width.
    #[inline]
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Logical height.
    #[inline]
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Clamped device pixel ratio.
    #[inline]
    pub fn pixel_ratio(&self) -> f32 {
        self.pixel_ratio
    }

    /// Rendered resolution in physical pixels, the value pushed into the
    /// render stage's resolution uniform and used to size the surface.
    #[inline]
    pub fn resolution(&self) -> Vec2 {
        Vec2::new(
            self.width as f32 * self.pixel_ratio,
            self.height as f32 * self.pixel_ratio,
        )
    }

    /// Surface backing-store size in whole pixels.
    pub fn surface_size(&self) -> (u32, u32) {
        let res = self.resolution();
        ((res.x.round() as u32).max(1), (res.y.round() as u32).max(1))
    }

    /// Width-over-height aspect ratio for the camera projection.
    #[inline]
    pub fn aspect(&self) -> f32 {
        self.width as f32 / self.height as f32
    }
}

fn clamp_ratio(ratio: f32) -> f32 {
    if ratio <= 0.0 || !ratio.is_finite() {
        1.0
    } else {
        ratio.min(MAX_PIXEL_RATIO)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolution_scales_by_pixel_ratio() {
        let mut vp = Viewport::new(800, 600, 1.0);
        assert_eq!(vp.resolution(), Vec2::new(800.0, 600.0));

        vp.apply(ResizeEvent {
            width: 1920,
            height: 1080,
            pixel_ratio: 2.0,
        });
        assert_eq!(vp.resolution(), Vec2::new(3840.0, 2160.0));
        assert_eq!(vp.surface_size(), (3840, 2160));
        assert!((vp.aspect() - 16.0 / 9.0).abs() < 1e-6);
    }

    #[test]
    fn pixel_ratio_is_clamped() {
        let vp = Viewport::new(100, 100, 3.0);
        assert_eq!(vp.pixel_ratio(), MAX_PIXEL_RATIO);

        let vp = Viewport::new(100, 100, 0.0);
        assert_eq!(vp.pixel_ratio(), 1.0);
    }

    #[test]
    fn from_physical_recovers_logical_size() {
        let vp = Viewport::from_physical(2560, 1440, 2.0);
        assert_eq!(vp.width(), 1280);
        assert_eq!(vp.height(), 720);
        assert_eq!(vp.resolution(), Vec2::new(2560.0, 1440.0));
    }

    #[test]
    fn minimized_window_keeps_surface_defined() {
        let vp = Viewport::new(0, 0, 1.0);
        assert_eq!(vp.surface_size(), (1, 1));
        assert!(vp.aspect().is_finite());
    }
}
