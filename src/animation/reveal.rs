//! Per-marker reveal scheduling.
//!
//! A transition is pure data (delay, duration, endpoints) so any surface can
//! drive it, and a headless caller can sample it at an arbitrary time.

use crate::{animation::easing::EasingType, core::geo::Point};
use std::time::Duration;

/// Reveal delays for `count` items in order, `i * stagger` each
pub fn stagger_delays(count: usize, stagger: Duration) -> Vec<Duration> {
    (0..count as u32).map(|i| stagger * i).collect()
}

/// Animated growth of one marker from an anchor to its projected position
#[derive(Debug, Clone, PartialEq)]
pub struct RevealTransition {
    pub delay: Duration,
    pub duration: Duration,
    /// Screen position at the start, where the marker is invisible
    pub from: Point,
    pub to: Point,
    pub target_radius: f64,
    pub target_opacity: f32,
    pub easing: EasingType,
}

/// Sampled marker state at one instant
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RevealFrame {
    pub position: Point,
    pub radius: f64,
    pub opacity: f32,
}

impl RevealFrame {
    pub fn is_visible(&self) -> bool {
        self.radius > 0.0 && self.opacity > 0.0
    }
}

impl RevealTransition {
    /// Time at which this marker reaches its final state
    pub fn end_time(&self) -> Duration {
        self.delay + self.duration
    }

    /// Eased progress in `[0, 1]` at `elapsed` since the render started
    pub fn progress_at(&self, elapsed: Duration) -> f64 {
        if elapsed <= self.delay {
            return if self.duration.is_zero() && elapsed == self.delay {
                1.0
            } else {
                0.0
            };
        }
        if self.duration.is_zero() {
            return 1.0;
        }
        let t = (elapsed - self.delay).as_secs_f64() / self.duration.as_secs_f64();
        self.easing.apply(t)
    }

    pub fn sample(&self, elapsed: Duration) -> RevealFrame {
        let t = self.progress_at(elapsed);
        RevealFrame {
            position: self.from.lerp(&self.to, t),
            radius: self.target_radius * t,
            opacity: self.target_opacity * t as f32,
        }
    }

    pub fn is_complete(&self, elapsed: Duration) -> bool {
        elapsed >= self.end_time()
    }

    pub fn final_frame(&self) -> RevealFrame {
        RevealFrame {
            position: self.to,
            radius: self.target_radius,
            opacity: self.target_opacity,
        }
    }
}
