//! Reactivity assembly: Doppler, moderator, boron, rods, xenon.

use serde::{Deserialize, Serialize};

/// Doppler coefficient, pcm per sqrt(degree Rankine).
pub const ALPHA_DOPPLER: f64 = -2.5;

/// Differential boron worth, pcm/ppm.
pub const BORON_WORTH_PCM_PER_PPM: f64 = -9.0;

/// MTC endpoints: +5 pcm/F at 1500 ppm, -40 pcm/F at 100 ppm.
pub const MTC_HIGH_BORON_PPM: f64 = 1500.0;
pub const MTC_HIGH_BORON_PCM_PER_F: f64 = 5.0;
pub const MTC_LOW_BORON_PPM: f64 = 100.0;
pub const MTC_LOW_BORON_PCM_PER_F: f64 = -40.0;

/// Moderator temperature coefficient (pcm/F) as a linear function of boron.
pub fn mtc_pcm_per_f(boron_ppm: f64) -> f64 {
    let slope = (MTC_HIGH_BORON_PCM_PER_F - MTC_LOW_BORON_PCM_PER_F)
        / (MTC_HIGH_BORON_PPM - MTC_LOW_BORON_PPM);
    MTC_LOW_BORON_PCM_PER_F + slope * (boron_ppm - MTC_LOW_BORON_PPM)
}

/// Reference conditions against which feedback terms are measured, plus a
/// fixed excess calibrated at initialization so the preset starts at its
/// declared criticality state.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ReactivityReference {
    pub fuel_temp_f: f64,
    pub mod_temp_f: f64,
    pub boron_ppm: f64,
    /// Core excess reactivity at reference conditions with rods out, pcm.
    pub excess_pcm: f64,
}

/// Inputs to the per-step reactivity assembly.
#[derive(Debug, Clone, Copy)]
pub struct ReactivityInputs {
    pub fuel_temp_f: f64,
    pub mod_temp_f: f64,
    pub boron_ppm: f64,
    pub xenon_pcm: f64,
    /// Total inserted rod worth, pcm (negative).
    pub rod_worth_pcm: f64,
}

/// Component-by-component reactivity, pcm.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct ReactivityBreakdown {
    pub doppler_pcm: f64,
    pub moderator_pcm: f64,
    pub boron_pcm: f64,
    pub xenon_pcm: f64,
    pub rods_pcm: f64,
    pub excess_pcm: f64,
    pub total_pcm: f64,
}

/// Assemble total core reactivity from the feedback terms.
pub fn assemble(reference: &ReactivityReference, inputs: &ReactivityInputs) -> ReactivityBreakdown {
    let fuel_r = inputs.fuel_temp_f + 459.67;
    let fuel_ref_r = reference.fuel_temp_f + 459.67;
    let doppler = ALPHA_DOPPLER * (fuel_r.sqrt() - fuel_ref_r.sqrt());

    let moderator = mtc_pcm_per_f(inputs.boron_ppm) * (inputs.mod_temp_f - reference.mod_temp_f);

    let boron = BORON_WORTH_PCM_PER_PPM * (inputs.boron_ppm - reference.boron_ppm);

    let total = doppler
        + moderator
        + boron
        + inputs.xenon_pcm
        + inputs.rod_worth_pcm
        + reference.excess_pcm;

    ReactivityBreakdown {
        doppler_pcm: doppler,
        moderator_pcm: moderator,
        boron_pcm: boron,
        xenon_pcm: inputs.xenon_pcm,
        rods_pcm: inputs.rod_worth_pcm,
        excess_pcm: reference.excess_pcm,
        total_pcm: total,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn reference() -> ReactivityReference {
        ReactivityReference {
            fuel_temp_f: 1200.0,
            mod_temp_f: 588.5,
            boron_ppm: 900.0,
            excess_pcm: 0.0,
        }
    }

    #[test]
    fn mtc_endpoints() {
        assert_relative_eq!(mtc_pcm_per_f(1500.0), 5.0, epsilon = 1e-9);
        assert_relative_eq!(mtc_pcm_per_f(100.0), -40.0, epsilon = 1e-9);
        // Crosses zero somewhere in between.
        assert!(mtc_pcm_per_f(800.0) < 0.0);
        assert!(mtc_pcm_per_f(1400.0) > 0.0);
    }

    #[test]
    fn hotter_fuel_is_negative() {
        let r = reference();
        let base = ReactivityInputs {
            fuel_temp_f: 1200.0,
            mod_temp_f: 588.5,
            boron_ppm: 900.0,
            xenon_pcm: 0.0,
            rod_worth_pcm: 0.0,
        };
        let hot = ReactivityInputs {
            fuel_temp_f: 1400.0,
            ..base
        };
        assert_relative_eq!(assemble(&r, &base).total_pcm, 0.0, epsilon = 1e-9);
        assert!(assemble(&r, &hot).doppler_pcm < 0.0);
    }

    #[test]
    fn boration_is_negative() {
        let r = reference();
        let borated = ReactivityInputs {
            fuel_temp_f: 1200.0,
            mod_temp_f: 588.5,
            boron_ppm: 1000.0,
            xenon_pcm: 0.0,
            rod_worth_pcm: 0.0,
        };
        let b = assemble(&r, &borated);
        assert_relative_eq!(b.boron_pcm, -900.0, epsilon = 1e-9);
    }

    #[test]
    fn moderator_sign_flips_with_boron() {
        let r = reference();
        let hot_mod = |ppm: f64| ReactivityInputs {
            fuel_temp_f: 1200.0,
            mod_temp_f: 598.5,
            boron_ppm: ppm,
            xenon_pcm: 0.0,
            rod_worth_pcm: 0.0,
        };
        // Dilute core: heating the moderator is strongly negative.
        assert!(assemble(&r, &hot_mod(200.0)).moderator_pcm < 0.0);
        // Heavily borated core: slightly positive.
        assert!(assemble(&r, &hot_mod(1500.0)).moderator_pcm > 0.0);
    }
}
