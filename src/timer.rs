//! Timer
//!
//! A counting timer driven by the frame's delta time. One-shot timers
//! deactivate when their limit is hit; repeating timers reset and keep
//! counting. `has_runout` is only true for the frame the limit was reached.

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Timer {
    /// The amount of time to count up to.
    pub limit: f32,
    /// The current accumulated time.
    pub counter: f32,
    pub is_active: bool,
    pub is_one_shot: bool,
    /// Set on the tick the counter reached the limit.
    pub has_runout: bool,
}

impl Timer {
    #[must_use]
    pub fn new(limit: f32, one_shot: bool, active: bool) -> Self {
        Self {
            limit,
            counter: 0.0,
            is_active: active,
            is_one_shot: one_shot,
            has_runout: false,
        }
    }

    pub fn update(&mut self, dt: f32) {
        if !self.is_active {
            return;
        }

        self.has_runout = false;
        self.counter += dt;

        if self.counter < self.limit {
            return;
        }

        self.has_runout = true;
        self.counter = 0.0;

        if self.is_one_shot {
            self.is_active = false;
        }
    }

    pub fn reset(&mut self) {
        self.counter = 0.0;
        self.has_runout = false;
    }
}
