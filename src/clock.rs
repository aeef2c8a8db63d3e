use std::time::{Duration, Instant};

/// Longest frame time fed to the simulation; longer gaps (window dragged,
/// process paused) are dropped.
pub const MAX_FRAME_DT: Duration = Duration::from_millis(100);

/// Upper bound on physics steps run for one rendered frame.
pub const MAX_STEPS_PER_FRAME: u32 = 16;

/// Time between rendered frames: the display refresh rate clamped to
/// `max_hz`, or `max_hz` when the refresh rate is unknown.
pub fn frame_interval(refresh_millihertz: Option<u32>, max_hz: u32) -> Duration {
    let cap = max_hz.max(1) as f64;
    let hz = refresh_millihertz
        .map(|mhz| mhz as f64 / 1000.0)
        .filter(|hz| *hz > 0.0)
        .map_or(cap, |hz| hz.min(cap));
    Duration::from_secs_f64(1.0 / hz)
}

/// Fixed-timestep accumulator, keeps the simulation rate independent of
/// the render rate.
#[derive(Debug, Clone)]
pub struct FixedStep {
    step: f64,
    accumulator: f64,
}

impl FixedStep {
    pub fn new(hz: f64) -> Self {
        let hz = if hz.is_finite() && hz > 0.0 { hz } else { 60.0 };
        Self {
            step: 1.0 / hz,
            accumulator: 0.0,
        }
    }

    #[inline]
    pub fn step_seconds(&self) -> f64 {
        self.step
    }

    /// Adds frame time and returns how many whole steps are due.
    pub fn advance(&mut self, dt: Duration) -> u32 {
        self.accumulator += dt.min(MAX_FRAME_DT).as_secs_f64();

        let mut steps = 0;
        while self.accumulator >= self.step && steps < MAX_STEPS_PER_FRAME {
            self.accumulator -= self.step;
            steps += 1;
        }
        if self.accumulator >= self.step {
            tracing::warn!(dropped_secs = self.accumulator, "simulation falling behind");
            self.accumulator = 0.0;
        }
        steps
    }
}

/// Counts presented frames and reports the rate about once per second.
#[derive(Debug, Clone)]
pub struct FpsCounter {
    frames: u32,
    since: Instant,
}

impl FpsCounter {
    pub fn new(now: Instant) -> Self {
        Self { frames: 0, since: now }
    }

    pub fn frame(&mut self, now: Instant) -> Option<f64> {
        self.frames += 1;
        let elapsed = now.duration_since(self.since).as_secs_f64();
        if elapsed < 1.0 {
            return None;
        }
        let fps = self.frames as f64 / elapsed;
        self.frames = 0;
        self.since = now;
        Some(fps)
    }
}
