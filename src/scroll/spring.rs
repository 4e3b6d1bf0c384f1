//! Damped spring filter for scroll smoothing.
//!
//! Fast scroll and trackpad input step the raw progress value hard enough
//! to produce visible frame-stepping. The spring trails the raw value with
//! near-critical damping so frame selection stays continuous. Tuning values
//! are the converged showcase settings: low stiffness for little bounce,
//! high damping against oscillation, tiny rest delta for precise settling.

/// Spring tuning parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpringConfig {
    pub stiffness: f64,
    pub damping: f64,
    /// Displacement/velocity threshold below which the spring snaps to rest.
    pub rest_delta: f64,
}

impl Default for SpringConfig {
    fn default() -> Self {
        Self {
            stiffness: 60.0,
            damping: 20.0,
            rest_delta: 0.0005,
        }
    }
}

/// Second-order spring integrated per animation-frame tick.
#[derive(Debug, Clone)]
pub struct Spring {
    config: SpringConfig,
    value: f64,
    velocity: f64,
    target: f64,
}

/// Integration substep ceiling. Ticks longer than this (dropped frames,
/// background tabs) are split so the explicit Euler step stays stable.
const MAX_STEP: f64 = 1.0 / 60.0;

impl Spring {
    pub fn new(config: SpringConfig) -> Self {
        Self {
            config,
            value: 0.0,
            velocity: 0.0,
            target: 0.0,
        }
    }

    /// Jump straight to a value, clearing velocity. Used on reset.
    pub fn snap_to(&mut self, value: f64) {
        self.value = value;
        self.velocity = 0.0;
        self.target = value;
    }

    pub fn set_target(&mut self, target: f64) {
        self.target = target;
    }

    pub fn target(&self) -> f64 {
        self.target
    }

    pub fn value(&self) -> f64 {
        self.value
    }

    /// Advance by `dt` seconds. Returns the new value.
    pub fn tick(&mut self, dt: f64) -> f64 {
        if dt <= 0.0 {
            return self.value;
        }
        let mut remaining = dt.min(0.25);
        while remaining > 0.0 {
            let step = remaining.min(MAX_STEP);
            remaining -= step;

            let displacement = self.target - self.value;
            let accel = self.config.stiffness * displacement - self.config.damping * self.velocity;
            self.velocity += accel * step;
            self.value += self.velocity * step;
        }

        if (self.target - self.value).abs() < self.config.rest_delta
            && self.velocity.abs() < self.config.rest_delta
        {
            self.value = self.target;
            self.velocity = 0.0;
        }
        self.value
    }

    pub fn is_at_rest(&self) -> bool {
        self.velocity == 0.0 && self.value == self.target
    }
}

impl Default for Spring {
    fn default() -> Self {
        Self::new(SpringConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settle(spring: &mut Spring, seconds: f64) {
        let steps = (seconds / MAX_STEP).ceil() as usize;
        for _ in 0..steps {
            spring.tick(MAX_STEP);
        }
    }

    #[test]
    fn converges_to_target() {
        let mut spring = Spring::default();
        spring.set_target(1.0);
        settle(&mut spring, 3.0);
        assert!(spring.is_at_rest());
        assert_eq!(spring.value(), 1.0);
    }

    #[test]
    fn trails_the_target_monotonically_from_rest() {
        let mut spring = Spring::default();
        spring.set_target(1.0);
        let mut prev = 0.0;
        for _ in 0..30 {
            let v = spring.tick(MAX_STEP);
            assert!(v >= prev - 1e-9, "spring moved away from target");
            prev = v;
        }
        // Still trailing after half a second at this stiffness.
        assert!(prev > 0.1 && prev < 1.01);
    }

    #[test]
    fn snap_clears_motion() {
        let mut spring = Spring::default();
        spring.set_target(1.0);
        settle(&mut spring, 0.2);
        spring.snap_to(0.0);
        assert!(spring.is_at_rest());
        assert_eq!(spring.value(), 0.0);
    }

    #[test]
    fn huge_tick_does_not_explode() {
        let mut spring = Spring::default();
        spring.set_target(1.0);
        spring.tick(10.0);
        assert!(spring.value().is_finite());
        assert!(spring.value().abs() < 2.0);
    }

    #[test]
    fn zero_dt_is_a_no_op() {
        let mut spring = Spring::default();
        spring.set_target(1.0);
        let before = spring.tick(MAX_STEP);
        assert_eq!(spring.tick(0.0), before);
    }
}
