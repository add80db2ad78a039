//! Plant-level state and the read-only snapshot.

use fourloop_pressure::BubblePhase;
use fourloop_reactor::Criticality;
use fourloop_secondary::SgRegime;
use fourloop_systems::RcpMask;
use serde::{Deserialize, Serialize};

use crate::alarms::AlarmKind;

/// Operating mode ladder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Mode {
    ColdShutdown,
    Heatup,
    HotStandby,
    Startup,
    PowerOperation,
    Tripped,
}

/// Which pressurizer equation set governs pressure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Regime {
    SolidPlant,
    TwoPhase,
}

/// Plant-level state owned by the engine. Subsystem internals live in the
/// subsystem structs; this is the cross-cutting thermodynamic picture plus
/// the canonical mass ledger.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlantState {
    pub sim_time_hr: f64,
    pub mode: Mode,
    pub regime: Regime,
    /// Canonical primary inventory, lb. Single source of truth; only
    /// boundary flows and logged reconciliations touch it.
    pub total_primary_mass_lb: f64,
    pub t_hot_f: f64,
    pub t_cold_f: f64,
    pub t_avg_f: f64,
    pub pressure_psia: f64,
    pub flow_gpm_total: f64,
    pub pzr_water_mass_lb: f64,
    pub pzr_steam_mass_lb: f64,
    pub pzr_water_volume_ft3: f64,
    pub pzr_steam_volume_ft3: f64,
    pub pzr_wall_temp_f: f64,
    pub pzr_heater_effective_kw: f64,
    /// Pressurizer water temperature (solid: integrated; two-phase: T_sat).
    pub t_pzr_f: f64,
    pub boron_ppm: f64,
}

impl PlantState {
    pub fn pzr_level_pct(&self) -> f64 {
        self.pzr_water_volume_ft3 / (self.pzr_water_volume_ft3 + self.pzr_steam_volume_ft3)
            * 100.0
    }
}

/// Read-only published picture of the plant, cloned out of the engine at
/// the end of every step.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlantSnapshot {
    pub sim_time_hr: f64,
    pub mode: Mode,
    pub regime: Regime,
    pub bubble_phase: BubblePhase,

    pub neutron_power_frac: f64,
    pub thermal_power_mwt: f64,
    pub decay_heat_frac: f64,
    pub keff: f64,
    pub reactor_period_sec: f64,
    pub startup_rate_dpm: f64,
    pub criticality: Criticality,
    pub reactivity_pcm: f64,
    pub xenon_pcm: f64,
    pub boron_ppm: f64,
    pub fuel_temp_f: f64,
    pub fuel_melt_margin_f: f64,
    pub bank_positions: [f64; 8],

    pub t_hot_f: f64,
    pub t_cold_f: f64,
    pub t_avg_f: f64,
    pub rcs_pressure_psia: f64,
    pub flow_gpm_total: f64,
    pub active_rcp_mask: RcpMask,

    pub pzr_level_pct: f64,
    pub pzr_water_mass_lb: f64,
    pub pzr_steam_mass_lb: f64,
    pub pzr_water_volume_ft3: f64,
    pub pzr_steam_volume_ft3: f64,
    pub t_pzr_f: f64,
    pub pzr_wall_temp_f: f64,
    pub pzr_heater_effective_kw: f64,
    pub total_primary_mass_lb: f64,

    pub sg_regime: SgRegime,
    pub sg_pressure_psia: f64,
    pub sg_temp_f: f64,
    pub sg_steam_mass_lb: f64,
    pub sg_water_mass_lb: f64,

    pub vct_level_pct: f64,
    pub vct_boron_ppm: f64,
    pub charging_flow_gpm: f64,
    pub letdown_flow_gpm: f64,
    pub seal_injection_gpm: f64,
    pub seal_return_gpm: f64,

    pub alarms: Vec<AlarmKind>,
}

impl PlantSnapshot {
    /// Serialize for host dashboards and log shippers.
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_default()
    }
}
