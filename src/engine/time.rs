use std::ops::{Add, AddAssign};
use std::time::Duration;

/// Simulation time since session start. Advanced by exactly one fixed `dt`
/// per tick, so timing windows are tick-accurate and replayable.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Timestamp(Duration);

impl Timestamp {
    pub const ZERO: Timestamp = Timestamp(Duration::ZERO);

    pub fn from_millis(ms: u64) -> Self {
        Self(Duration::from_millis(ms))
    }

    pub fn from_secs_f32(secs: f32) -> Self {
        Self(Duration::from_secs_f32(secs.max(0.0)))
    }

    pub fn as_duration(self) -> Duration {
        self.0
    }

    /// Time elapsed since `earlier`, zero if `earlier` is in the future.
    pub fn saturating_since(self, earlier: Timestamp) -> Duration {
        self.0.saturating_sub(earlier.0)
    }
}

impl Add<Duration> for Timestamp {
    type Output = Timestamp;

    fn add(self, rhs: Duration) -> Timestamp {
        Timestamp(self.0 + rhs)
    }
}

impl AddAssign<Duration> for Timestamp {
    fn add_assign(&mut self, rhs: Duration) {
        self.0 += rhs;
    }
}

/// Fixed-timestep accumulator decoupling simulation ticks from render frames.
///
/// Each render frame: `accumulate(frame_dt)`, then `while consume() { tick }`,
/// then render with `alpha()`, the fraction of the next fixed step already
/// elapsed.
pub struct FixedTimestep {
    dt: f32,
    accumulator: f32,
    max_steps: u32,
    steps_this_frame: u32,
}

impl FixedTimestep {
    pub fn new(dt: f32, max_steps: u32) -> Self {
        Self {
            dt,
            accumulator: 0.0,
            max_steps: max_steps.max(1),
            steps_this_frame: 0,
        }
    }

    pub fn dt(&self) -> f32 {
        self.dt
    }

    pub fn accumulate(&mut self, frame_dt: f32) {
        if frame_dt.is_finite() && frame_dt > 0.0 {
            self.accumulator += frame_dt;
        }
        self.steps_this_frame = 0;
    }

    /// Take one fixed step from the accumulator if enough time has built up.
    /// After `max_steps` in one frame the remaining backlog is dropped so a
    /// long stall cannot snowball into ever-longer frames.
    pub fn consume(&mut self) -> bool {
        if self.accumulator < self.dt {
            return false;
        }
        if self.steps_this_frame >= self.max_steps {
            let dropped = self.accumulator - self.accumulator % self.dt;
            log::debug!(
                "fixed timestep: dropping {:.1} ms of backlog after {} steps",
                dropped * 1000.0,
                self.steps_this_frame
            );
            self.accumulator -= dropped;
            return false;
        }
        self.accumulator -= self.dt;
        self.steps_this_frame += 1;
        true
    }

    /// Interpolation factor in `[0, 1)` for the current render frame.
    pub fn alpha(&self) -> f32 {
        (self.accumulator / self.dt).clamp(0.0, 1.0)
    }
}
