//! Frame clock: seconds elapsed between consecutive `delta` calls.

use std::time::{Duration, Instant};

#[derive(Debug)]
pub struct Clock {
    last_tick: Instant,
}

impl Clock {
    /// Create a running clock.
    pub fn new() -> Self {
        Self {
            last_tick: Instant::now(),
        }
    }

    /// Seconds since the previous call (or since creation on the first call).
    pub fn delta(&mut self) -> f32 {
        let now = Instant::now();
        let delta = now - self.last_tick;
        self.last_tick = now;
        delta.as_secs_f32()
    }
}

impl Default for Clock {
    fn default() -> Self {
        Self::new()
    }
}

/// Counts frames and reports the rate once per second.
#[derive(Debug)]
pub struct FpsCounter {
    window_start: Instant,
    frames: u32,
}

impl FpsCounter {
    pub fn new() -> Self {
        Self {
            window_start: Instant::now(),
            frames: 0,
        }
    }

    /// Register a frame. Returns the measured rate when a full second elapsed.
    pub fn frame(&mut self) -> Option<f32> {
        self.frames += 1;
        let elapsed = self.window_start.elapsed();
        if elapsed < Duration::from_secs(1) {
            return None;
        }
        let fps = self.frames as f32 / elapsed.as_secs_f32();
        self.frames = 0;
        self.window_start = Instant::now();
        Some(fps)
    }
}

impl Default for FpsCounter {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn delta_is_non_negative_and_resets() {
        let mut clock = Clock::new();
        std::thread::sleep(Duration::from_millis(5));
        let first = clock.delta();
        let second = clock.delta();
        assert!(first >= 0.005);
        assert!(second < first);
    }

    #[test]
    fn fps_counter_waits_for_a_full_second() {
        let mut fps = FpsCounter::new();
        assert!(fps.frame().is_none());
    }
}
