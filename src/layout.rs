//! Mapping a logical particle population onto a square state-texture grid.
//!
//! Each particle owns exactly one texel of an `n x n` RGBA32F texture, where
//! `n = ceil(sqrt(point_count))`. The same index-to-texel mapping is used to
//! write the initial state and, inside the render shader, to fetch the
//! simulated state for each drawn point; both sides are generated from this
//! module so they cannot drift apart.

use glam::Vec3;

use crate::error::SetupError;

/// Number of f32 channels per state texel (RGBA32F).
pub const CHANNELS: u32 = 4;

/// Layout of a particle population on a square state grid.
///
/// Texels with index `>= point_count` are padding: they are written as zero
/// at initialization and never fetched, because the render stage issues
/// exactly `point_count` instances.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldLayout {
    grid_size: u32,
    point_count: u32,
}

impl FieldLayout {
    /// Compute the smallest square grid that can hold `point_count` texels.
    ///
    /// Returns [`SetupError::EmptyPointSet`] for a zero count; a zero-size
    /// grid has no defined mapping.
    pub fn for_point_count(point_count: u32) -> Result<Self, SetupError> {
        if point_count == 0 {
            return Err(SetupError::EmptyPointSet);
        }
        let mut n = (point_count as f64).sqrt().ceil() as u32;
        // Float sqrt can land one off near perfect squares; settle exactly.
        while (n as u64) * (n as u64) < point_count as u64 {
            n += 1;
        }
        while n > 1 && ((n - 1) as u64) * ((n - 1) as u64) >= point_count as u64 {
            n -= 1;
        }
        Ok(Self {
            grid_size: n,
            point_count,
        })
    }

    /// Side length of the square state grid.
    #[inline]
    pub fn grid_size(&self) -> u32 {
        self.grid_size
    }

    /// Number of particles the grid was sized for.
    #[inline]
    pub fn point_count(&self) -> u32 {
        self.point_count
    }

    /// Total texels in the grid, including padding.
    #[inline]
    pub fn texel_count(&self) -> u32 {
        self.grid_size * self.grid_size
    }

    /// Texels allocated but never occupied by a particle.
    #[inline]
    pub fn padding_texels(&self) -> u32 {
        self.texel_count() - self.point_count
    }

    /// Grid coordinate of particle `index`.
    #[inline]
    pub fn texel(&self, index: u32) -> (u32, u32) {
        debug_assert!(index < self.texel_count());
        (index % self.grid_size, index / self.grid_size)
    }

    /// Bytes in one row of the RGBA32F state texture.
    #[inline]
    pub fn bytes_per_row(&self) -> u32 {
        self.grid_size * CHANNELS * 4
    }

    /// Pack source positions into the initial state texel stream.
    ///
    /// Texel `i` holds `[x, y, z, phase]` for point `i`, where `phase` is a
    /// deterministic per-index scalar in `[0, 1)` the update shader may use
    /// to desynchronize particles. Padding texels are zeroed. At most
    /// `point_count` points are consumed; a shorter slice leaves the
    /// remaining particle texels at zero as well.
    pub fn pack_points(&self, points: &[Vec3]) -> Vec<f32> {
        let mut data = vec![0.0f32; (self.texel_count() * CHANNELS) as usize];
        let used = points.len().min(self.point_count as usize);
        for (i, p) in points[..used].iter().enumerate() {
            let base = i * CHANNELS as usize;
            data[base] = p.x;
            data[base + 1] = p.y;
            data[base + 2] = p.z;
            data[base + 3] = index_phase(i as u32);
        }
        data
    }
}

/// Deterministic scalar in `[0, 1)` derived from a particle index.
pub fn index_phase(index: u32) -> f32 {
    let x = index.wrapping_mul(1103515245).wrapping_add(12345);
    let x = x ^ (x >> 16);
    (x & 0x7FFF_FFFF) as f32 / 0x7FFF_FFFF as f32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn grid_is_smallest_square() {
        for count in (1u32..=2000).chain([39999, 40000, 40001, 1_000_000]) {
            let layout = FieldLayout::for_point_count(count).unwrap();
            let n = layout.grid_size() as u64;
            assert!(n * n >= count as u64, "n*n < count for {}", count);
            assert!(
                (n - 1) * (n - 1) < count as u64,
                "(n-1)^2 >= count for {}",
                count
            );
        }
    }

    #[test]
    fn concrete_grid_sizes() {
        // 199^2 = 39601 < 40000 <= 200^2, so a perfect fit with no padding.
        let exact = FieldLayout::for_point_count(40_000).unwrap();
        assert_eq!(exact.grid_size(), 200);
        assert_eq!(exact.padding_texels(), 0);

        // One more point forces the next grid size up.
        let spill = FieldLayout::for_point_count(40_001).unwrap();
        assert_eq!(spill.grid_size(), 201);
        assert_eq!(spill.padding_texels(), 201 * 201 - 40_001);
        assert_eq!(spill.padding_texels(), 40_600);
    }

    #[test]
    fn zero_points_is_a_setup_error() {
        assert!(matches!(
            FieldLayout::for_point_count(0),
            Err(SetupError::EmptyPointSet)
        ));
    }

    #[test]
    fn mapping_is_a_bijection() {
        let layout = FieldLayout::for_point_count(1000).unwrap();
        let n = layout.grid_size();
        let mut seen = vec![false; layout.texel_count() as usize];
        for i in 0..layout.texel_count() {
            let (x, y) = layout.texel(i);
            assert!(x < n && y < n);
            let slot = (y * n + x) as usize;
            assert!(!seen[slot], "texel collision at index {}", i);
            seen[slot] = true;
        }
        assert!(seen.iter().all(|&s| s));
    }

    #[test]
    fn pack_round_trips_every_index() {
        let points: Vec<Vec3> = (0..37)
            .map(|i| Vec3::new(i as f32, i as f32 * 2.0, -(i as f32)))
            .collect();
        let layout = FieldLayout::for_point_count(points.len() as u32).unwrap();
        let data = layout.pack_points(&points);
        assert_eq!(data.len(), (layout.texel_count() * CHANNELS) as usize);

        for (i, p) in points.iter().enumerate() {
            let base = i * CHANNELS as usize;
            assert_eq!(data[base], p.x);
            assert_eq!(data[base + 1], p.y);
            assert_eq!(data[base + 2], p.z);
            let phase = data[base + 3];
            assert!((0.0..1.0).contains(&phase));
            assert_eq!(phase, index_phase(i as u32));
        }
    }

    #[test]
    fn padding_texels_stay_zero() {
        let points = vec![Vec3::ONE; 5];
        let layout = FieldLayout::for_point_count(5).unwrap();
        let data = layout.pack_points(&points);
        for texel in 5..layout.texel_count() {
            let base = (texel * CHANNELS) as usize;
            assert_eq!(&data[base..base + 4], &[0.0, 0.0, 0.0, 0.0]);
        }
    }

    #[test]
    fn bytes_per_row_matches_rgba32f() {
        let layout = FieldLayout::for_point_count(40_000).unwrap();
        assert_eq!(layout.bytes_per_row(), 200 * 16);
    }
}
