//! Westinghouse 4-loop reference values, consolidated.
//!
//! One module instead of figures scattered through the physics code.
//! Each value's doc comment states what it is and the engineering basis
//! behind the number; these are nominal textbook/design-class figures for
//! a generic 4-loop plant, not transcriptions of any plant's licensing
//! documents. Subsystem configurations are built from these in
//! [`crate::config`], so changing a number here changes the plant.

/// Reactor coolant system.
pub mod rcs {
    /// Rated core thermal power, MWt. Standard 4-loop NSSS rating.
    pub const RATED_POWER_MWT: f64 = 3411.0;
    /// RCS water volume excluding the pressurizer, ft3. Typical 4-loop
    /// cold geometric volume.
    pub const WATER_VOLUME_FT3: f64 = 11_500.0;
    /// Reactor vessel, piping and SG channel-head metal participating in
    /// heatup transients, lb.
    pub const METAL_MASS_LB: f64 = 2.2e6;
    /// Carbon/stainless lumped specific heat, BTU/(lb F).
    pub const METAL_CP: f64 = 0.12;
    /// Rated four-pump loop flow, gpm (4 x 24,400).
    pub const RATED_FLOW_GPM: f64 = 97_600.0;
    /// Full-power programmed average temperature, F.
    pub const T_AVG_FULL_POWER_F: f64 = 588.5;
    /// No-load programmed average temperature, F.
    pub const T_AVG_NO_LOAD_F: f64 = 557.0;
    /// Normal operating pressure, psia.
    pub const OPERATING_PRESSURE_PSIA: f64 = 2250.0;
    /// Insulation heat loss from the loop at temperature, BTU/hr.
    pub const AMBIENT_LOSS_BTU_HR: f64 = 3.4e6;
}

/// Pressurizer.
pub mod pzr {
    /// Total vessel volume, ft3. 1800 ft3 is the 4-loop vessel.
    pub const TOTAL_VOLUME_FT3: f64 = 1800.0;
    /// Vessel and internals metal mass, lb.
    pub const WALL_MASS_LB: f64 = 2.0e5;
    /// Installed heater capacity, kW (variable plus backup groups).
    pub const HEATER_MAX_KW: f64 = 1794.0;
    /// Heater element lag, s.
    pub const HEATER_TAU_S: f64 = 20.0;
    /// Maximum spray, gpm.
    pub const SPRAY_MAX_GPM: f64 = 900.0;
    /// Spray condensing efficiency; droplets leave before saturating.
    pub const SPRAY_EFFICIENCY: f64 = 0.85;
    /// Backup heaters full on below, psig.
    pub const HEATER_ON_BELOW_PSIG: f64 = 2210.0;
    /// Heater demand zero above, psig (pressure-program deadband; a bare
    /// single threshold chatters).
    pub const HEATER_OFF_ABOVE_PSIG: f64 = 2235.0;
    /// Spray ramp, psig.
    pub const SPRAY_START_PSIG: f64 = 2260.0;
    pub const SPRAY_FULL_PSIG: f64 = 2280.0;
    /// Power-operated relief valve setpoint, psig.
    pub const PORV_PSIG: f64 = 2335.0;
    /// Code safety valve setpoint, psig.
    pub const SAFETY_PSIG: f64 = 2485.0;
    /// Normal two-phase level program target at no load, percent.
    pub const NO_LOAD_LEVEL_PCT: f64 = 25.0;
    /// Full-power program level, percent.
    pub const FULL_POWER_LEVEL_PCT: f64 = 60.0;
}

/// Steam generators (aggregate of four).
pub mod sg {
    /// Total secondary shell volume, ft3 (4 x 5,940).
    pub const SECONDARY_VOLUME_FT3: f64 = 23_760.0;
    /// Tube-bundle conductance at rated flow, BTU/(hr F); sized so rated
    /// power transfers at the design primary-secondary delta-T.
    pub const UA_RATED: f64 = 1.94e8;
    /// No-load steam pressure, psia.
    pub const NO_LOAD_PRESSURE_PSIA: f64 = 1092.0;
    /// Aggregate shell and tube metal mass, lb.
    pub const METAL_MASS_LB: f64 = 1.4e6;
}

/// Chemical and volume control.
pub mod cvcs {
    /// VCT capacity, gal.
    pub const VCT_CAPACITY_GAL: f64 = 6000.0;
    /// Normal charging/letdown base flow, gpm.
    pub const BASE_FLOW_GPM: f64 = 75.0;
    /// Seal injection per running RCP, gpm.
    pub const SEAL_INJECTION_GPM_PER_RCP: f64 = 8.0;
    /// Seal leg returning to the VCT, gpm per RCP. The 3/5 split is the
    /// adjusted value the operating revisions settled on; the RCS leg
    /// below is ledgered as its own primary boundary flow.
    pub const SEAL_RETURN_VCT_GPM_PER_RCP: f64 = 3.0;
    /// Seal leg entering the RCS, bypassing the VCT, gpm per RCP.
    pub const SEAL_RETURN_RCS_GPM_PER_RCP: f64 = 5.0;
    /// VCT-to-core boron transport lag, s.
    pub const BORON_TRANSPORT_TAU_S: f64 = 600.0;
}

/// Kinetics and feedback.
pub mod kinetics {
    /// Effective delayed-neutron fraction.
    pub const BETA_EFF: f64 = 0.0065;
    /// Prompt neutron lifetime, s.
    pub const PROMPT_LIFETIME_S: f64 = 20.0e-6;
    /// Doppler coefficient, pcm per sqrt(degree R).
    pub const ALPHA_DOPPLER: f64 = -2.5;
    /// Differential boron worth, pcm/ppm.
    pub const BORON_WORTH_PCM_PER_PPM: f64 = -9.0;
    /// Equilibrium xenon worth at rated power, pcm.
    pub const XENON_EQUILIBRIUM_PCM: f64 = -2800.0;
    /// Kinetics substep cap, s.
    pub const MAX_SUBSTEP_S: f64 = 0.010;
}

/// Fuel.
pub mod fuel {
    /// UO2 melting point, F.
    pub const MELT_F: f64 = 5189.0;
    /// Fuel-to-coolant thermal lag, s.
    pub const TAU_FUEL_S: f64 = 7.0;
    /// Hot-channel peaking factor.
    pub const FQ_HOT: f64 = 2.0;
}

/// Reactor coolant pumps.
pub mod rcp {
    /// Heat input per pump at rated speed, MW.
    pub const HEAT_MW_PER_PUMP: f64 = 5.25;
    /// Coastdown time constant, s.
    pub const COASTDOWN_TAU_S: f64 = 12.0;
    /// Minimum suction pressure for a start, psig.
    pub const START_MIN_PSIG: f64 = 320.0;
    /// Sequencer lead delay and spacing, s.
    pub const STAGGER_FIRST_S: f64 = 2.0;
    pub const STAGGER_INTERVAL_S: f64 = 0.5;
}

/// Protection setpoints.
pub mod protection {
    /// High RCS pressure reactor trip, psig.
    pub const HIGH_PRESSURE_TRIP_PSIG: f64 = 2385.0;
    /// Low RCS pressure reactor trip, psig.
    pub const LOW_PRESSURE_TRIP_PSIG: f64 = 1885.0;
    /// High pressurizer level trip, percent.
    pub const HIGH_PZR_LEVEL_PCT: f64 = 92.0;
    /// Low VCT level alarm, percent.
    pub const LOW_VCT_LEVEL_PCT: f64 = 15.0;
    /// Overtemperature delta-T margin factor on rated loop delta-T.
    pub const OTDT_FACTOR: f64 = 1.12;
    /// Overpower delta-T factor.
    pub const OPDT_FACTOR: f64 = 1.09;
}
