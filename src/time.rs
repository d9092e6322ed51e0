//! Frame timing for the simulation loop.
//!
//! One `update()` per frame produces the elapsed/delta pair fed to the
//! compute stage's time uniforms. A fixed delta can be pinned for
//! deterministic stepping; a fixed delta of zero makes every step a
//! pass-through copy of the previous state.

use std::time::{Duration, Instant};

/// Wall-clock frame timer.
#[derive(Debug)]
pub struct FrameClock {
    start: Instant,
    last_frame: Instant,
    elapsed_secs: f32,
    delta_secs: f32,
    frame_count: u64,
    paused: bool,
    pause_elapsed: Duration,
    fixed_delta: Option<f32>,
}

impl FrameClock {
    /// Create a clock starting from now.
    pub fn new() -> Self {
        let now = Instant::now();
        Self {
            start: now,
            last_frame: now,
            elapsed_secs: 0.0,
            delta_secs: 0.0,
            frame_count: 0,
            paused: false,
            pause_elapsed: Duration::ZERO,
            fixed_delta: None,
        }
    }

    /// Advance the clock. Call once per frame.
    ///
    /// Returns `(elapsed_time, delta_time)` in seconds.
    pub fn update(&mut self) -> (f32, f32) {
        let now = Instant::now();

        if self.paused {
            self.delta_secs = 0.0;
            return (self.elapsed_secs, 0.0);
        }

        let raw_delta = now.duration_since(self.last_frame).as_secs_f32();
        self.delta_secs = self.fixed_delta.unwrap_or(raw_delta);
        self.last_frame = now;
        self.elapsed_secs = (now.duration_since(self.start) - self.pause_elapsed).as_secs_f32();
        self.frame_count += 1;

        (self.elapsed_secs, self.delta_secs)
    }

    /// Total elapsed time in seconds, excluding paused spans.
    #[inline]
    pub fn elapsed(&self) -> f32 {
        self.elapsed_secs
    }

    /// Time since last frame in seconds.
    #[inline]
    pub fn delta(&self) -> f32 {
        self.delta_secs
    }

    /// Frames advanced since start.
    #[inline]
    pub fn frame(&self) -> u64 {
        self.frame_count
    }

    /// Whether the clock is paused.
    #[inline]
    pub fn is_paused(&self) -> bool {
        self.paused
    }

    /// Stop time: `update()` returns a zero delta until resumed.
    pub fn pause(&mut self) {
        self.paused = true;
    }

    /// Resume after a pause. The paused span is excluded from elapsed time.
    pub fn resume(&mut self) {
        if self.paused {
            let now = Instant::now();
            self.pause_elapsed += now.duration_since(self.last_frame);
            self.last_frame = now;
            self.paused = false;
        }
    }

    /// Pin the delta to a fixed value for deterministic stepping, or `None`
    /// to return to wall-clock deltas.
    pub fn set_fixed_delta(&mut self, delta: Option<f32>) {
        self.fixed_delta = delta;
    }
}

impl Default for FrameClock {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn update_advances_time() {
        let mut clock = FrameClock::new();
        assert_eq!(clock.frame(), 0);
        thread::sleep(Duration::from_millis(10));
        let (elapsed, delta) = clock.update();
        assert!(elapsed > 0.0);
        assert!(delta > 0.0);
        assert_eq!(clock.frame(), 1);
    }

    #[test]
    fn fixed_delta_overrides_wall_clock() {
        let mut clock = FrameClock::new();
        clock.set_fixed_delta(Some(1.0 / 60.0));
        thread::sleep(Duration::from_millis(30));
        let (_, delta) = clock.update();
        assert!((delta - 1.0 / 60.0).abs() < 1e-6);

        clock.set_fixed_delta(Some(0.0));
        let (_, delta) = clock.update();
        assert_eq!(delta, 0.0);
    }

    #[test]
    fn pause_freezes_elapsed_and_delta() {
        let mut clock = FrameClock::new();
        clock.update();
        clock.pause();
        let before = clock.elapsed();
        thread::sleep(Duration::from_millis(10));
        let (elapsed, delta) = clock.update();
        assert_eq!(elapsed, before);
        assert_eq!(delta, 0.0);
    }
}
