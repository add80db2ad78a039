//! Control primitives shared by the pressure and inventory subsystems.

use serde::{Deserialize, Serialize};

/// Proportional-integral controller with output clamp and integral
/// anti-windup.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PiController {
    pub kp: f64,
    pub ki: f64,
    pub out_min: f64,
    pub out_max: f64,
    pub integral_error: f64,
    pub last_error: f64,
}

impl PiController {
    pub fn new(kp: f64, ki: f64, out_min: f64, out_max: f64) -> Self {
        Self {
            kp,
            ki,
            out_min,
            out_max,
            integral_error: 0.0,
            last_error: 0.0,
        }
    }

    /// Advance by `dt_s` against `error` and return the clamped output.
    pub fn update(&mut self, error: f64, dt_s: f64) -> f64 {
        self.integral_error += error * dt_s;
        let raw = self.kp * error + self.ki * self.integral_error;
        let out = raw.clamp(self.out_min, self.out_max);
        // Back off the integrator while saturated so it does not wind up.
        if raw != out && self.ki != 0.0 {
            self.integral_error = (out - self.kp * error) / self.ki;
        }
        self.last_error = error;
        out
    }

    pub fn reset(&mut self) {
        self.integral_error = 0.0;
        self.last_error = 0.0;
    }
}

/// First-order lag: `y += (1 - exp(-dt/tau)) * (x - y)`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct FirstOrderLag {
    pub tau_s: f64,
    pub value: f64,
}

impl FirstOrderLag {
    pub fn new(tau_s: f64, initial: f64) -> Self {
        Self {
            tau_s,
            value: initial,
        }
    }

    pub fn update(&mut self, target: f64, dt_s: f64) -> f64 {
        let alpha = 1.0 - (-dt_s / self.tau_s).exp();
        self.value += alpha * (target - self.value);
        self.value
    }
}

/// Symmetric rate limiter: at most `rate_per_s * dt` of change per update.
pub fn rate_limit(current: f64, target: f64, rate_per_s: f64, dt_s: f64) -> f64 {
    let max_step = rate_per_s * dt_s;
    current + (target - current).clamp(-max_step, max_step)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn pi_drives_error_to_zero() {
        let mut pi = PiController::new(2.0, 0.5, -100.0, 100.0);
        let mut process = 0.0;
        for _ in 0..2000 {
            let out = pi.update(10.0 - process, 0.1);
            process += 0.05 * out * 0.1;
        }
        assert_relative_eq!(process, 10.0, max_relative = 0.02);
    }

    #[test]
    fn pi_output_respects_clamp() {
        let mut pi = PiController::new(1000.0, 0.0, -5.0, 5.0);
        assert_eq!(pi.update(1.0, 1.0), 5.0);
        assert_eq!(pi.update(-1.0, 1.0), -5.0);
    }

    #[test]
    fn anti_windup_recovers_quickly() {
        let mut pi = PiController::new(1.0, 1.0, 0.0, 1.0);
        // Saturate hard for a long time.
        for _ in 0..100 {
            pi.update(50.0, 1.0);
        }
        // A modest negative error must pull the output off the rail
        // immediately, not after unwinding a huge integral.
        let out = pi.update(-2.0, 1.0);
        assert!(out < 1.0, "output stuck at rail: {out}");
    }

    #[test]
    fn lag_reaches_63_percent_after_one_tau() {
        let mut lag = FirstOrderLag::new(20.0, 0.0);
        lag.update(1.0, 20.0);
        assert_relative_eq!(lag.value, 1.0 - (-1.0_f64).exp(), epsilon = 1e-12);
    }

    #[test]
    fn rate_limiter_caps_slew() {
        let out = rate_limit(0.0, 100.0, 2.0, 1.0);
        assert_eq!(out, 2.0);
        let out = rate_limit(0.0, -100.0, 2.0, 1.0);
        assert_eq!(out, -2.0);
        let out = rate_limit(0.0, 1.0, 2.0, 1.0);
        assert_eq!(out, 1.0);
    }
}
