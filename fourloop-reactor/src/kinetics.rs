//! Six-group point kinetics.
//!
//! The prompt equation is integrated with an exponential step that is exact
//! for constant precursor source over the substep, so the integrator stays
//! stable through the stiff prompt transient of a trip without shrinking the
//! substep below the 10 ms cap.

use serde::{Deserialize, Serialize};

/// Effective delayed-neutron fraction.
pub const BETA_EFF: f64 = 0.0065;

/// Prompt neutron lifetime, seconds.
pub const LAMBDA_PROMPT: f64 = 20.0e-6;

/// Relative delayed-group yields (sum to 1, scaled by [`BETA_EFF`]).
pub const GROUP_FRACTIONS: [f64; 6] = [0.033, 0.219, 0.196, 0.395, 0.115, 0.042];

/// Delayed-group decay constants, 1/s.
pub const GROUP_LAMBDAS: [f64; 6] = [0.0124, 0.0305, 0.111, 0.301, 1.14, 3.01];

/// Largest kinetics substep, seconds.
pub const MAX_SUBSTEP_S: f64 = 0.010;

/// Startup rate per decade of period: SUR = 26.06 / tau, dpm.
const SUR_PER_INVERSE_PERIOD: f64 = 26.06;

/// Installed-source floor on normalized power; keeps a shutdown core at
/// source range instead of decaying to exactly zero.
pub const SOURCE_FLOOR: f64 = 1.0e-9;

/// Criticality classification; informational, not a failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Criticality {
    Subcritical,
    Critical,
    Supercritical,
}

/// Neutronic state advanced by [`KineticsState::advance`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KineticsState {
    /// Normalized neutron power (1.0 = rated).
    pub n: f64,
    /// Delayed precursor populations, normalized consistently with `n`.
    pub precursors: [f64; 6],
}

/// Per-step observables derived from the kinetics advance.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct KineticsOutput {
    pub neutron_power_frac: f64,
    pub reactor_period_sec: f64,
    pub startup_rate_dpm: f64,
    pub keff: f64,
    pub criticality: Criticality,
}

impl KineticsState {
    /// Equilibrium state at the given normalized power.
    pub fn equilibrium(power_frac: f64) -> Self {
        let mut precursors = [0.0; 6];
        for i in 0..6 {
            let beta_i = BETA_EFF * GROUP_FRACTIONS[i];
            precursors[i] = beta_i * power_frac / (LAMBDA_PROMPT * GROUP_LAMBDAS[i]);
        }
        Self {
            n: power_frac,
            precursors,
        }
    }

    /// Shutdown state: negligible source level.
    pub fn shutdown(source_frac: f64) -> Self {
        let mut s = Self::equilibrium(source_frac);
        s.n = source_frac;
        s
    }

    /// Advance the kinetics by `dt_s` at constant reactivity `rho_pcm`,
    /// internally substepping to [`MAX_SUBSTEP_S`].
    pub fn advance(&mut self, rho_pcm: f64, dt_s: f64) -> KineticsOutput {
        let rho = rho_pcm * 1.0e-5;
        let n_start = self.n.max(1e-12);
        let substeps = (dt_s / MAX_SUBSTEP_S).ceil().max(1.0) as usize;
        let h = dt_s / substeps as f64;
        let a = (rho - BETA_EFF) / LAMBDA_PROMPT;

        for _ in 0..substeps {
            let source: f64 = (0..6)
                .map(|i| GROUP_LAMBDAS[i] * self.precursors[i])
                .sum();
            // Exact prompt step for constant source.
            let ea = (a * h).exp();
            let n_new = if a.abs() > 1e-12 {
                self.n * ea + source * (ea - 1.0) / a
            } else {
                self.n + source * h
            };
            let n_mid = 0.5 * (self.n + n_new);
            for i in 0..6 {
                let lam = GROUP_LAMBDAS[i];
                let beta_i = BETA_EFF * GROUP_FRACTIONS[i];
                let el = (-lam * h).exp();
                let prod = beta_i * n_mid / LAMBDA_PROMPT;
                self.precursors[i] = self.precursors[i] * el + (prod / lam) * (1.0 - el);
            }
            self.n = n_new.max(SOURCE_FLOOR);
        }

        let ratio = (self.n.max(1e-15)) / n_start;
        let period = if (ratio - 1.0).abs() < 1e-12 {
            f64::INFINITY
        } else {
            dt_s / ratio.ln()
        };
        let startup_rate = if period.is_finite() {
            SUR_PER_INVERSE_PERIOD / period
        } else {
            0.0
        };
        let keff = 1.0 / (1.0 - rho);
        let criticality = if rho_pcm < -1.0 {
            Criticality::Subcritical
        } else if rho_pcm > 1.0 {
            Criticality::Supercritical
        } else {
            Criticality::Critical
        };
        KineticsOutput {
            neutron_power_frac: self.n,
            reactor_period_sec: period,
            startup_rate_dpm: startup_rate,
            keff,
            criticality,
        }
    }
}
