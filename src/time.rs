//! Fixed-step frame clock.
//!
//! `draw_web()` fires at the display's refresh rate with a variable delta.
//! `FrameClock` turns that into whole 100ms ticks plus, for frames longer
//! than [`MAX_FRAME_MS`] (background tab, sleeping laptop), a single lump of
//! catch-up seconds. Accrual is linear, so crediting the gap as one lump earns
//! the same as replaying it tick by tick.

/// Longest frame replayed as discrete ticks.
pub const MAX_FRAME_MS: f64 = 500.0;

/// Work for one rendered frame.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct FrameSteps {
    /// Whole reference ticks to apply.
    pub ticks: u32,
    /// Seconds beyond `MAX_FRAME_MS` to apply as one lump tick.
    pub catch_up_seconds: f64,
}

impl FrameSteps {
    /// Game time covered by this frame, ticks and lump together.
    ///
    /// Accrual is linear, so hosts can apply it as a single tick and write
    /// one snapshot per frame instead of one per tick.
    pub fn elapsed_seconds(&self, tick_seconds: f64) -> f64 {
        self.ticks as f64 * tick_seconds + self.catch_up_seconds
    }
}

pub struct FrameClock {
    ms_per_tick: f64,
    /// Milliseconds not yet consumed as ticks.
    accumulator: f64,
    pub total_ticks: u64,
    /// `None` until the first frame.
    last_timestamp: Option<f64>,
}

impl FrameClock {
    pub fn new(ticks_per_sec: u32) -> Self {
        Self {
            ms_per_tick: 1000.0 / ticks_per_sec.max(1) as f64,
            accumulator: 0.0,
            total_ticks: 0,
            last_timestamp: None,
        }
    }

    /// Feed a monotonic timestamp (`performance.now()`), once per frame.
    pub fn update(&mut self, now_ms: f64) -> FrameSteps {
        if !now_ms.is_finite() {
            return FrameSteps::default();
        }
        let delta = match self.last_timestamp {
            // Timestamps going backwards count as no time.
            Some(prev) => (now_ms - prev).max(0.0),
            None => 0.0,
        };
        self.last_timestamp = Some(now_ms);

        let excess = (delta - MAX_FRAME_MS).max(0.0);
        self.accumulator += delta.min(MAX_FRAME_MS);
        let ticks = (self.accumulator / self.ms_per_tick) as u32;
        self.accumulator -= ticks as f64 * self.ms_per_tick;
        self.total_ticks += ticks as u64;

        FrameSteps {
            ticks,
            catch_up_seconds: excess / 1000.0,
        }
    }
}
