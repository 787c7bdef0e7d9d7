//! Learning rate schedules.

use serde::{Deserialize, Serialize};

/// Learning rate scheduler.
pub trait LrScheduler {
    /// Learning rate for the current step.
    fn get_lr(&self) -> f64;

    /// Advance one optimizer step.
    fn step(&mut self);
}

/// Linear warmup followed by linear decay to zero.
///
/// Multiplier on the base rate at step `t`:
/// - `t / warmup` while `t < warmup`
/// - `max(0, (total - t) / (total - warmup))` afterwards
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LinearWarmupSchedule {
    base_lr: f64,
    warmup_steps: usize,
    total_steps: usize,
    current_step: usize,
}

impl LinearWarmupSchedule {
    /// Create a schedule starting at step 0.
    pub fn new(base_lr: f64, warmup_steps: usize, total_steps: usize) -> Self {
        Self {
            base_lr,
            warmup_steps,
            total_steps,
            current_step: 0,
        }
    }

    /// Multiplier applied to the base rate at `step`.
    pub fn factor_at(&self, step: usize) -> f64 {
        if step < self.warmup_steps {
            return step as f64 / self.warmup_steps.max(1) as f64;
        }
        let remaining = self.total_steps.saturating_sub(step) as f64;
        let decay_span = self.total_steps.saturating_sub(self.warmup_steps).max(1) as f64;
        (remaining / decay_span).max(0.0)
    }

    /// Learning rate at `step`.
    pub fn lr_at(&self, step: usize) -> f64 {
        self.base_lr * self.factor_at(step)
    }

    /// Steps taken so far.
    pub fn current_step(&self) -> usize {
        self.current_step
    }

    /// Total optimizer steps the schedule spans.
    pub fn total_steps(&self) -> usize {
        self.total_steps
    }
}

impl LrScheduler for LinearWarmupSchedule {
    fn get_lr(&self) -> f64 {
        self.lr_at(self.current_step)
    }

    fn step(&mut self) {
        self.current_step += 1;
    }
}
