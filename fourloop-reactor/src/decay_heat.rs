//! ANS-5.1 decay heat as six exponential groups.
//!
//! Group powers integrate against the fission-power history, so the model
//! is correct for arbitrary operation, not just trip-from-equilibrium.
//! Amplitudes are fitted to the standard curve anchors: 7 percent of rated
//! at shutdown, 5 percent at one minute, 3 percent at ten minutes.

use serde::{Deserialize, Serialize};

/// Group amplitudes, fraction of steady fission power.
pub const GROUP_AMPLITUDE: [f64; 6] = [
    0.003793, 0.016516, 0.022691, 0.014, 0.007, 0.006,
];

/// Group decay constants, 1/s.
pub const GROUP_DECAY: [f64; 6] = [0.5, 0.025, 0.0025, 2.5e-4, 2.5e-5, 2.5e-6];

/// Fraction of rated power carried promptly by fission; the complement is
/// the equilibrium decay-heat inventory.
pub fn prompt_fraction() -> f64 {
    1.0 - GROUP_AMPLITUDE.iter().sum::<f64>()
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct DecayHeatState {
    /// Per-group decay power, fraction of rated.
    pub groups: [f64; 6],
}

impl DecayHeatState {
    /// Equilibrium inventory for sustained operation at `power_frac`.
    pub fn equilibrium(power_frac: f64) -> Self {
        let mut groups = [0.0; 6];
        for i in 0..6 {
            groups[i] = GROUP_AMPLITUDE[i] * power_frac;
        }
        Self { groups }
    }

    pub fn clean() -> Self {
        Self { groups: [0.0; 6] }
    }

    /// Advance by `dt_s` with the current fission power fraction.
    pub fn advance(&mut self, fission_power_frac: f64, dt_s: f64) {
        for i in 0..6 {
            let target = GROUP_AMPLITUDE[i] * fission_power_frac.max(0.0);
            let e = (-GROUP_DECAY[i] * dt_s).exp();
            self.groups[i] = self.groups[i] * e + target * (1.0 - e);
        }
    }

    /// Total decay-heat power, fraction of rated.
    pub fn power_frac(&self) -> f64 {
        self.groups.iter().sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn decay_curve_at(t_s: f64) -> f64 {
        (0..6)
            .map(|i| GROUP_AMPLITUDE[i] * (-GROUP_DECAY[i] * t_s).exp())
            .sum()
    }

    #[test]
    fn curve_anchors() {
        assert_relative_eq!(decay_curve_at(0.0), 0.070, max_relative = 0.01);
        assert_relative_eq!(decay_curve_at(60.0), 0.050, max_relative = 0.01);
        assert_relative_eq!(decay_curve_at(600.0), 0.030, max_relative = 0.01);
    }

    #[test]
    fn trip_from_equilibrium_follows_curve() {
        let mut d = DecayHeatState::equilibrium(1.0);
        let mut t = 0.0;
        while t < 600.0 {
            d.advance(0.0, 1.0);
            t += 1.0;
        }
        assert_relative_eq!(d.power_frac(), decay_curve_at(600.0), max_relative = 1e-6);
    }

    #[test]
    fn partial_power_scales_linearly() {
        let half = DecayHeatState::equilibrium(0.5);
        let full = DecayHeatState::equilibrium(1.0);
        assert_relative_eq!(half.power_frac(), 0.5 * full.power_frac(), epsilon = 1e-12);
    }

    #[test]
    fn builds_in_during_operation() {
        let mut d = DecayHeatState::clean();
        d.advance(1.0, 3600.0);
        let after_1h = d.power_frac();
        assert!(after_1h > 0.02 && after_1h < 0.07);
        // Long operation approaches the full equilibrium inventory.
        for _ in 0..2000 {
            d.advance(1.0, 3600.0);
        }
        assert_relative_eq!(d.power_frac(), 0.070, max_relative = 0.01);
    }
}
