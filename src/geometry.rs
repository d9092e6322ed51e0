//! Source point sets that seed the particle field.
//!
//! Asset import is out of scope; a host application hands the engine a list
//! of positions from wherever it likes. These constructors cover the demo
//! and test cases with deterministic, dependency-free generators.

use std::f32::consts::{PI, TAU};

use glam::Vec3;

/// An ordered set of source positions, one particle per point.
#[derive(Debug, Clone, PartialEq)]
pub struct PointSet {
    points: Vec<Vec3>,
}

impl PointSet {
    /// Wrap an explicit list of positions.
    pub fn from_points(points: Vec<Vec3>) -> Self {
        Self { points }
    }

    /// Vertex grid of a UV sphere, seam and pole vertices included, matching
    /// the vertex layout of a conventional lat/long sphere mesh:
    /// `(segments + 1) * (rings + 1)` points.
    pub fn uv_sphere(radius: f32, segments: u32, rings: u32) -> Self {
        let segments = segments.max(3);
        let rings = rings.max(2);
        let mut points = Vec::with_capacity(((segments + 1) * (rings + 1)) as usize);
        for ring in 0..=rings {
            let v = ring as f32 / rings as f32;
            let phi = v * PI;
            for segment in 0..=segments {
                let u = segment as f32 / segments as f32;
                let theta = u * TAU;
                points.push(Vec3::new(
                    -radius * phi.sin() * theta.cos(),
                    radius * phi.cos(),
                    radius * phi.sin() * theta.sin(),
                ));
            }
        }
        Self { points }
    }

    /// `count` points spread evenly over a sphere surface by the golden-angle
    /// spiral. Denser and more uniform than the UV grid for large counts.
    pub fn fibonacci_sphere(count: u32, radius: f32) -> Self {
        let golden_angle = PI * (3.0 - 5.0_f32.sqrt());
        let points = (0..count)
            .map(|i| {
                let t = (i as f32 + 0.5) / count as f32;
                let y = 1.0 - 2.0 * t;
                let r = (1.0 - y * y).max(0.0).sqrt();
                let theta = golden_angle * i as f32;
                Vec3::new(r * theta.cos(), y, r * theta.sin()) * radius
            })
            .collect();
        Self { points }
    }

    /// Number of points, which is also the particle count.
    #[inline]
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Whether the set holds no points.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// The positions, in particle-index order.
    #[inline]
    pub fn positions(&self) -> &[Vec3] {
        &self.points
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn uv_sphere_has_grid_vertex_count() {
        let sphere = PointSet::uv_sphere(3.0, 32, 16);
        assert_eq!(sphere.len(), 33 * 17);
    }

    #[test]
    fn uv_sphere_points_lie_on_the_sphere() {
        let radius = 3.0;
        let sphere = PointSet::uv_sphere(radius, 12, 8);
        for p in sphere.positions() {
            assert!((p.length() - radius).abs() < 1e-4, "off-sphere point {p:?}");
        }
    }

    #[test]
    fn fibonacci_sphere_is_deterministic_and_on_surface() {
        let a = PointSet::fibonacci_sphere(500, 2.0);
        let b = PointSet::fibonacci_sphere(500, 2.0);
        assert_eq!(a, b);
        assert_eq!(a.len(), 500);
        for p in a.positions() {
            assert!((p.length() - 2.0).abs() < 1e-3);
        }
    }

    #[test]
    fn small_parameters_are_bumped_to_valid_grids() {
        let sphere = PointSet::uv_sphere(1.0, 0, 0);
        assert_eq!(sphere.len(), 4 * 3);
    }
}
