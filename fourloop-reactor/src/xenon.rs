//! Iodine-135 / Xenon-135 poison dynamics.
//!
//! The coupled pair is integrated in physical decay constants and scaled so
//! equilibrium xenon worth at rated power is -2800 pcm. The burnout term
//! gives the characteristic post-trip peak and the roughly six-hour approach
//! to equilibrium after a power change.

use serde::{Deserialize, Serialize};

/// I-135 decay constant, 1/s (6.58 h half-life).
pub const LAMBDA_I: f64 = 2.87e-5;

/// Xe-135 decay constant, 1/s (9.14 h half-life).
pub const LAMBDA_XE: f64 = 2.09e-5;

/// Xe-135 burnout rate at rated flux, 1/s.
pub const BURNOUT_AT_RATED: f64 = 3.5e-5;

/// Fission-yield split between iodine and direct xenon.
pub const YIELD_I: f64 = 0.061;
pub const YIELD_XE: f64 = 0.003;

/// Equilibrium xenon worth at rated power, pcm.
pub const EQUILIBRIUM_WORTH_PCM: f64 = -2800.0;

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct XenonState {
    /// I-135 inventory, production-normalized units.
    pub iodine: f64,
    /// Xe-135 inventory, production-normalized units.
    pub xenon: f64,
}

/// Inventory-to-pcm scale so that rated-power equilibrium maps to
/// [`EQUILIBRIUM_WORTH_PCM`].
fn pcm_per_unit() -> f64 {
    let i_eq = YIELD_I / LAMBDA_I;
    let xe_eq = (YIELD_XE + LAMBDA_I * i_eq) / (LAMBDA_XE + BURNOUT_AT_RATED);
    EQUILIBRIUM_WORTH_PCM / xe_eq
}

impl XenonState {
    /// Equilibrium inventories at the given normalized power.
    pub fn equilibrium(power_frac: f64) -> Self {
        let p = power_frac.max(0.0);
        let iodine = YIELD_I * p / LAMBDA_I;
        let xenon = (YIELD_XE * p + LAMBDA_I * iodine) / (LAMBDA_XE + BURNOUT_AT_RATED * p);
        Self { iodine, xenon }
    }

    /// Clean core: no iodine, no xenon.
    pub fn clean() -> Self {
        Self {
            iodine: 0.0,
            xenon: 0.0,
        }
    }

    /// Advance by `dt_s` at normalized power `power_frac`.
    pub fn advance(&mut self, power_frac: f64, dt_s: f64) {
        let p = power_frac.max(0.0);
        // Exponential update per species, exact for frozen cross terms over
        // the step; slow dynamics make this accurate at simulator steps.
        let i_prod = YIELD_I * p;
        let ei = (-LAMBDA_I * dt_s).exp();
        let i_new = self.iodine * ei + (i_prod / LAMBDA_I) * (1.0 - ei);

        let xe_removal = LAMBDA_XE + BURNOUT_AT_RATED * p;
        let i_mid = 0.5 * (self.iodine + i_new);
        let xe_prod = YIELD_XE * p + LAMBDA_I * i_mid;
        let ex = (-xe_removal * dt_s).exp();
        self.xenon = self.xenon * ex + (xe_prod / xe_removal) * (1.0 - ex);
        self.iodine = i_new;
    }

    /// Current xenon reactivity worth, pcm (negative).
    pub fn worth_pcm(&self) -> f64 {
        pcm_per_unit() * self.xenon
    }
}
