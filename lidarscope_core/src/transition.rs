//! Time-driven visual transitions.
//!
//! Transitions are evaluated, never stepped: given the elapsed time since a
//! render pass began they return the value to draw. That keeps the renderer
//! free of timers and makes every frame reproducible from a timestamp.

use std::time::Duration;

/// Easing curve applied to normalized progress in `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Easing {
    Linear,
    /// Symmetric cubic, slow at both ends
    CubicInOut,
}

impl Easing {
    pub fn apply(self, t: f64) -> f64 {
        let t = t.clamp(0.0, 1.0);
        match self {
            Easing::Linear => t,
            Easing::CubicInOut => {
                let t2 = t * 2.0;
                if t2 <= 1.0 {
                    t2 * t2 * t2 / 2.0
                } else {
                    let u = t2 - 2.0;
                    (u * u * u + 2.0) / 2.0
                }
            }
        }
    }
}

/// A one-shot interpolation between two values.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tween {
    pub from: f64,
    pub to: f64,
    pub delay: Duration,
    pub duration: Duration,
    pub easing: Easing,
}

impl Tween {
    pub fn new(from: f64, to: f64, duration: Duration) -> Self {
        Self {
            from,
            to,
            delay: Duration::ZERO,
            duration,
            easing: Easing::CubicInOut,
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn with_easing(mut self, easing: Easing) -> Self {
        self.easing = easing;
        self
    }

    /// Normalized progress after `elapsed`, before easing.
    pub fn progress(&self, elapsed: Duration) -> f64 {
        let Some(active) = elapsed.checked_sub(self.delay) else {
            return 0.0;
        };
        if self.duration.is_zero() {
            return 1.0;
        }
        (active.as_secs_f64() / self.duration.as_secs_f64()).min(1.0)
    }

    pub fn value_at(&self, elapsed: Duration) -> f64 {
        let eased = self.easing.apply(self.progress(elapsed));
        self.from + (self.to - self.from) * eased
    }

    pub fn is_finished(&self, elapsed: Duration) -> bool {
        elapsed >= self.delay + self.duration
    }
}

/// An interpolation that restarts from `from` every `period`, forever.
///
/// There is no end state: the only way to stop a loop is to drop the
/// render pass that owns it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Loop {
    pub from: f64,
    pub to: f64,
    pub period: Duration,
    pub easing: Easing,
}

impl Loop {
    pub fn new(from: f64, to: f64, period: Duration) -> Self {
        Self {
            from,
            to,
            period,
            easing: Easing::Linear,
        }
    }

    /// Number of completed cycles after `elapsed`.
    pub fn cycle(&self, elapsed: Duration) -> u64 {
        if self.period.is_zero() {
            return 0;
        }
        (elapsed.as_nanos() / self.period.as_nanos()) as u64
    }

    /// Position within the current cycle, in `[0, 1)`.
    pub fn phase(&self, elapsed: Duration) -> f64 {
        if self.period.is_zero() {
            return 0.0;
        }
        let into_cycle = elapsed.as_nanos() % self.period.as_nanos();
        into_cycle as f64 / self.period.as_nanos() as f64
    }

    pub fn value_at(&self, elapsed: Duration) -> f64 {
        let eased = self.easing.apply(self.phase(elapsed));
        self.from + (self.to - self.from) * eased
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_easing_endpoints() {
        for easing in [Easing::Linear, Easing::CubicInOut] {
            assert_relative_eq!(easing.apply(0.0), 0.0);
            assert_relative_eq!(easing.apply(1.0), 1.0);
            assert_relative_eq!(easing.apply(0.5), 0.5);
        }
        assert_relative_eq!(Easing::CubicInOut.apply(0.25), 0.0625);
        assert_relative_eq!(Easing::CubicInOut.apply(0.75), 0.9375);
    }

    #[test]
    fn test_tween_respects_delay() {
        let fade = Tween::new(0.0, 0.8, Duration::from_millis(500))
            .with_delay(Duration::from_millis(20));

        assert_eq!(fade.value_at(Duration::ZERO), 0.0);
        assert_eq!(fade.value_at(Duration::from_millis(20)), 0.0);
        assert_relative_eq!(fade.value_at(Duration::from_millis(270)), 0.4, epsilon = 1e-9);
        assert_relative_eq!(fade.value_at(Duration::from_millis(520)), 0.8);
        assert_relative_eq!(fade.value_at(Duration::from_secs(60)), 0.8);

        assert!(!fade.is_finished(Duration::from_millis(519)));
        assert!(fade.is_finished(Duration::from_millis(520)));
    }

    #[test]
    fn test_linear_tween() {
        let t = Tween::new(10.0, 20.0, Duration::from_millis(100)).with_easing(Easing::Linear);
        assert_relative_eq!(t.value_at(Duration::from_millis(30)), 13.0, epsilon = 1e-9);
    }

    #[test]
    fn test_loop_restarts_every_period() {
        let spin = Loop::new(0.0, 360.0, Duration::from_millis(3000));

        assert_eq!(spin.value_at(Duration::ZERO), 0.0);
        assert_relative_eq!(spin.value_at(Duration::from_millis(750)), 90.0, epsilon = 1e-9);
        assert_eq!(spin.cycle(Duration::from_millis(2999)), 0);
        assert_eq!(spin.cycle(Duration::from_millis(3000)), 1);
        assert_eq!(spin.value_at(Duration::from_millis(3000)), 0.0);
        assert_relative_eq!(spin.value_at(Duration::from_millis(7500)), 180.0, epsilon = 1e-9);
    }

    #[test]
    fn test_loop_never_finishes() {
        let spin = Loop::new(0.0, 360.0, Duration::from_millis(3000));
        let n = 1_000;
        let late = Duration::from_millis(3000 * n + 1500);

        assert_eq!(spin.cycle(late), n);
        assert_relative_eq!(spin.value_at(late), 180.0, epsilon = 1e-6);
    }
}
