//! Damped spring integrator for smoothing cursor motion.
//!
//! DESIGN
//! ======
//! Each `Spring` chases a target value under Hooke's law with viscous
//! damping. `step` integrates with semi-implicit Euler in fixed substeps so
//! the result does not depend on how the host slices frame time. A spring
//! that is close enough to rest snaps onto its target.

use crate::config::SpringConfig;

/// Largest integration substep, in seconds.
const MAX_SUBSTEP: f64 = 1.0 / 240.0;
/// Longest span one `step` integrates; longer gaps (a sleeping tab) are cut.
const MAX_STEP: f64 = 0.1;
/// Distance and speed below which a spring is considered at rest.
const REST_EPSILON: f64 = 0.01;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Spring {
    config: SpringConfig,
    value: f64,
    velocity: f64,
    target: f64,
}

impl Spring {
    #[must_use]
    pub fn new(config: SpringConfig, initial: f64) -> Self {
        Self { config, value: initial, velocity: 0.0, target: initial }
    }

    #[must_use]
    pub fn value(&self) -> f64 {
        self.value
    }

    #[must_use]
    pub fn target(&self) -> f64 {
        self.target
    }

    #[must_use]
    pub fn velocity(&self) -> f64 {
        self.velocity
    }

    pub fn set_target(&mut self, target: f64) {
        self.target = target;
    }

    /// Move to `value` immediately with no velocity.
    pub fn jump(&mut self, value: f64) {
        self.value = value;
        self.target = value;
        self.velocity = 0.0;
    }

    #[must_use]
    pub fn is_settled(&self) -> bool {
        (self.value - self.target).abs() < REST_EPSILON && self.velocity.abs() < REST_EPSILON
    }

    /// Advance the simulation by `dt` seconds, at most `MAX_STEP` of it.
    pub fn step(&mut self, dt: f64) {
        if dt <= 0.0 || self.is_settled() {
            if self.is_settled() {
                self.value = self.target;
                self.velocity = 0.0;
            }
            return;
        }

        let mass = self.config.mass.max(f64::EPSILON);
        let mut remaining = dt.min(MAX_STEP);
        while remaining > 0.0 {
            let h = remaining.min(MAX_SUBSTEP);
            let force = -self.config.stiffness * (self.value - self.target) - self.config.damping * self.velocity;
            self.velocity += force / mass * h;
            self.value += self.velocity * h;
            remaining -= h;
        }

        if self.is_settled() {
            self.value = self.target;
            self.velocity = 0.0;
        }
    }
}

/// Linear fade toward a target over a fixed duration.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Fade {
    value: f64,
    target: f64,
    /// Seconds for a full 0 → 1 transition.
    duration: f64,
}

impl Fade {
    #[must_use]
    pub fn new(initial: f64, duration: f64) -> Self {
        Self { value: initial, target: initial, duration }
    }

    #[must_use]
    pub fn value(&self) -> f64 {
        self.value
    }

    pub fn set_target(&mut self, target: f64) {
        self.target = target;
    }

    #[must_use]
    pub fn is_settled(&self) -> bool {
        self.value == self.target
    }

    pub fn step(&mut self, dt: f64) {
        if dt <= 0.0 {
            return;
        }
        if self.duration <= 0.0 {
            self.value = self.target;
            return;
        }
        let max_delta = dt / self.duration;
        let diff = self.target - self.value;
        if diff.abs() <= max_delta {
            self.value = self.target;
        } else {
            self.value += max_delta.copysign(diff);
        }
    }
}

#[cfg(test)]
#[path = "spring_test.rs"]
mod tests;
