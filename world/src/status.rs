//! Slow accumulator carried by every enemy.

use std::time::Duration;

use tower_siege_core::geometry::scale_duration;

const MIN_FACTOR: f32 = 0.01;

/// Strongest-wins slow: the lowest factor and the longest duration survive a merge.
#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) struct SlowEffect {
    multiplier: f32,
    remaining: Duration,
}

impl SlowEffect {
    pub(crate) const fn none() -> Self {
        Self {
            multiplier: 1.0,
            remaining: Duration::ZERO,
        }
    }

    /// Merges a new slow into the current one.
    pub(crate) fn apply(&mut self, factor: f32, duration: Duration) {
        if duration.is_zero() || !factor.is_finite() {
            return;
        }
        let factor = factor.clamp(MIN_FACTOR, 1.0);
        self.multiplier = self.multiplier.min(factor);
        self.remaining = self.remaining.max(duration);
    }

    pub(crate) fn decay(&mut self, dt: Duration) {
        self.remaining = self.remaining.saturating_sub(dt);
        if self.remaining.is_zero() {
            self.multiplier = 1.0;
        }
    }

    pub(crate) const fn multiplier(&self) -> f32 {
        self.multiplier
    }

    pub(crate) const fn remaining(&self) -> Duration {
        self.remaining
    }
}

/// Weakens a slow by the target's resistance before it is merged.
pub(crate) fn resisted(factor: f32, duration: Duration, resistance: f32) -> (f32, Duration) {
    let resistance = resistance.clamp(0.0, 1.0);
    (
        factor + (1.0 - factor) * resistance,
        scale_duration(duration, 1.0 - resistance),
    )
}
