//! Reactor subsystem: kinetics, feedback, rods, poisons and fuel thermal.
//!
//! [`Reactor`] bundles the neutronic and fuel-thermal state and advances it
//! as one unit each coordinator step. Everything downstream of the core
//! (loop temperatures, boron transport, steam generators) lives in sibling
//! crates and talks to this one through [`ReactorInputs`].

pub mod decay_heat;
pub mod fuel;
pub mod kinetics;
pub mod reactivity;
pub mod rods;
pub mod xenon;

pub use decay_heat::DecayHeatState;
pub use fuel::FuelState;
pub use kinetics::{Criticality, KineticsOutput, KineticsState};
pub use reactivity::{ReactivityBreakdown, ReactivityInputs, ReactivityReference};
pub use rods::{BankId, RodBanks, RodEvent, RodMode};
pub use xenon::XenonState;

use serde::{Deserialize, Serialize};

/// Per-step boundary conditions from the rest of the plant.
#[derive(Debug, Clone, Copy)]
pub struct ReactorInputs {
    pub mod_temp_f: f64,
    pub boron_ppm: f64,
    /// RCS flow as a fraction of rated four-pump flow.
    pub flow_frac: f64,
}

/// Per-step observables for the coordinator and snapshot.
#[derive(Debug, Clone)]
pub struct ReactorOutputs {
    pub kinetics: KineticsOutput,
    pub reactivity: ReactivityBreakdown,
    /// Fission power, fraction of rated.
    pub neutron_power_frac: f64,
    /// Decay heat, fraction of rated.
    pub decay_heat_frac: f64,
    /// Lagged heat to coolant, MWt.
    pub thermal_power_mwt: f64,
    pub xenon_pcm: f64,
    pub rod_events: Vec<RodEvent>,
}

/// The complete reactor-side state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Reactor {
    pub kinetics: KineticsState,
    pub xenon: XenonState,
    pub decay: DecayHeatState,
    pub rods: RodBanks,
    pub fuel: FuelState,
    pub reference: ReactivityReference,
}

impl Reactor {
    /// Hot-full-power equilibrium: bank D near the top, equilibrium xenon
    /// and decay heat, excess reactivity calibrated so the core is exactly
    /// critical at the reference point.
    pub fn hot_full_power(boron_ppm: f64, t_avg_f: f64) -> Self {
        let rods = RodBanks::at_power(215.0);
        let fuel = FuelState::steady(1.0, t_avg_f);
        let xenon = XenonState::equilibrium(1.0);
        let mut reference = ReactivityReference {
            fuel_temp_f: fuel.average.effective_f,
            mod_temp_f: t_avg_f,
            boron_ppm,
            excess_pcm: 0.0,
        };
        // Zero out the poison and rod load at the reference point.
        reference.excess_pcm = -(xenon.worth_pcm() + rods.inserted_worth_pcm());
        Self {
            kinetics: KineticsState::equilibrium(1.0),
            xenon,
            decay: DecayHeatState::equilibrium(1.0),
            rods,
            fuel,
            reference,
        }
    }

    /// Shutdown core at source level: all rods in, clean or decayed
    /// poisons, no decay-heat inventory.
    pub fn cold_shutdown(boron_ppm: f64, t_mod_f: f64) -> Self {
        // The excess calibration is a core property, taken at the same
        // hot-full-power reference the operating preset uses.
        let hfp = Self::hot_full_power(boron_ppm, 588.5);
        Self {
            kinetics: KineticsState::shutdown(kinetics::SOURCE_FLOOR),
            xenon: XenonState::clean(),
            decay: DecayHeatState::clean(),
            rods: RodBanks::all_inserted(),
            fuel: FuelState::steady(0.0, t_mod_f),
            reference: hfp.reference,
        }
    }

    /// Hot standby an hour after shutdown from power: rods in, decay heat
    /// and xenon aged from rated-power equilibrium.
    pub fn hot_standby(boron_ppm: f64, t_avg_f: f64) -> Self {
        let mut r = Self::cold_shutdown(boron_ppm, t_avg_f);
        let mut decay = DecayHeatState::equilibrium(1.0);
        decay.advance(0.0, 3600.0);
        let mut xenon = XenonState::equilibrium(1.0);
        xenon.advance(0.0, 3600.0);
        r.decay = decay;
        r.xenon = xenon;
        r.fuel = FuelState::steady(0.0, t_avg_f);
        r.fuel.thermal_power_frac = decay.power_frac();
        r
    }

    /// Advance the whole reactor subsystem by `dt_s`.
    pub fn update(&mut self, inputs: &ReactorInputs, dt_s: f64) -> ReactorOutputs {
        let rod_events = self.rods.update(dt_s);

        let xenon_pcm = self.xenon.worth_pcm();
        let breakdown = reactivity::assemble(
            &self.reference,
            &ReactivityInputs {
                fuel_temp_f: self.fuel.average.effective_f,
                mod_temp_f: inputs.mod_temp_f,
                boron_ppm: inputs.boron_ppm,
                xenon_pcm,
                rod_worth_pcm: self.rods.inserted_worth_pcm(),
            },
        );

        let kin = self.kinetics.advance(breakdown.total_pcm, dt_s);
        let n = kin.neutron_power_frac;

        self.decay.advance(n, dt_s);
        self.xenon.advance(n, dt_s);

        let core_power = decay_heat::prompt_fraction() * n + self.decay.power_frac();
        self.fuel
            .update(core_power, inputs.mod_temp_f, inputs.flow_frac, dt_s);

        ReactorOutputs {
            kinetics: kin,
            reactivity: breakdown,
            neutron_power_frac: n,
            decay_heat_frac: self.decay.power_frac(),
            thermal_power_mwt: self.fuel.thermal_power_mwt(),
            xenon_pcm,
            rod_events,
        }
    }

    /// Latch the trip: drop all banks.
    pub fn trip(&mut self) {
        self.rods.trip();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hfp_inputs() -> ReactorInputs {
        ReactorInputs {
            mod_temp_f: 588.5,
            boron_ppm: 900.0,
            flow_frac: 1.0,
        }
    }

    #[test]
    fn hot_full_power_holds_steady() {
        let mut r = Reactor::hot_full_power(900.0, 588.5);
        for _ in 0..60 {
            r.update(&hfp_inputs(), 1.0);
        }
        let out = r.update(&hfp_inputs(), 1.0);
        assert!(
            (0.97..1.03).contains(&out.neutron_power_frac),
            "n drifted to {}",
            out.neutron_power_frac
        );
    }

    #[test]
    fn trip_from_full_power() {
        let mut r = Reactor::hot_full_power(900.0, 588.5);
        r.trip();
        let mut t = 0.0;
        let mut out = r.update(&hfp_inputs(), 0.1);
        while t < 5.0 {
            out = r.update(&hfp_inputs(), 0.1);
            t += 0.1;
        }
        assert!(r.rods.all_rods_inserted());
        assert!(out.neutron_power_frac < 0.10);
        // Decay heat persists near 7 percent of rated.
        assert!(out.decay_heat_frac > 0.05 && out.decay_heat_frac < 0.08);
    }

    #[test]
    fn cold_shutdown_is_deeply_subcritical() {
        let mut r = Reactor::cold_shutdown(2000.0, 140.0);
        let out = r.update(
            &ReactorInputs {
                mod_temp_f: 140.0,
                boron_ppm: 2000.0,
                flow_frac: 0.05,
            },
            1.0,
        );
        assert!(out.reactivity.total_pcm < -5000.0);
        assert_eq!(out.kinetics.criticality, Criticality::Subcritical);
        assert!(out.neutron_power_frac <= 1e-6);
    }

    #[test]
    fn dilution_adds_reactivity() {
        let mut r = Reactor::hot_full_power(900.0, 588.5);
        let diluted = ReactorInputs {
            boron_ppm: 890.0,
            ..hfp_inputs()
        };
        let out = r.update(&diluted, 0.1);
        assert!(out.reactivity.boron_pcm > 0.0);
    }
}
