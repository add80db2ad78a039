//! Engine configuration: subsystem configs assembled from the plant
//! constants, plus the tunable policies. TOML-loadable for host tooling.

use crate::constants;
use fourloop_pressure::{BubbleConfig, PzrConfig, SolidPlantConfig};
use fourloop_secondary::{AuxHeatPolicy, SgConfig};
use fourloop_systems::{CvcsConfig, RcpConfig};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Largest accepted step, hours (10 s).
    pub max_dt_hr: f64,
    /// Solid-regime operating pressure setpoint for the letdown trim, psia.
    pub solid_pressure_setpoint_psia: f64,
    /// RCS geometric water volume (loop side), ft3.
    pub loop_volume_ft3: f64,
    /// Loop metal mass for heatup inertia, lb.
    pub loop_metal_mass_lb: f64,
    /// Loop ambient heat loss, BTU/hr.
    pub loop_ambient_loss_btu_hr: f64,
    pub pzr: PzrConfig,
    pub solid: SolidPlantConfig,
    pub bubble: BubbleConfig,
    pub sg: SgConfig,
    pub cvcs: CvcsConfig,
    pub rcp: RcpConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        let pzr = PzrConfig {
            total_volume_ft3: constants::pzr::TOTAL_VOLUME_FT3,
            wall_mass_lb: constants::pzr::WALL_MASS_LB,
            heater_max_kw: constants::pzr::HEATER_MAX_KW,
            heater_tau_s: constants::pzr::HEATER_TAU_S,
            spray_max_gpm: constants::pzr::SPRAY_MAX_GPM,
            spray_efficiency: constants::pzr::SPRAY_EFFICIENCY,
            heater_on_below_psig: constants::pzr::HEATER_ON_BELOW_PSIG,
            heater_off_above_psig: constants::pzr::HEATER_OFF_ABOVE_PSIG,
            spray_start_psig: constants::pzr::SPRAY_START_PSIG,
            spray_full_psig: constants::pzr::SPRAY_FULL_PSIG,
            porv_open_psig: constants::pzr::PORV_PSIG,
            safety_open_psig: constants::pzr::SAFETY_PSIG,
            ..PzrConfig::default()
        };
        let solid = SolidPlantConfig {
            wall_mass_lb: constants::pzr::WALL_MASS_LB,
            heater_max_kw: constants::pzr::HEATER_MAX_KW,
            heater_tau_s: constants::pzr::HEATER_TAU_S,
            ..SolidPlantConfig::default()
        };
        let bubble = BubbleConfig {
            drain_target_level_pct: constants::pzr::NO_LOAD_LEVEL_PCT,
            pressurize_setpoint_psia: constants::rcs::OPERATING_PRESSURE_PSIA,
            heater_max_kw: constants::pzr::HEATER_MAX_KW,
            ..BubbleConfig::default()
        };
        let sg = SgConfig {
            secondary_volume_ft3: constants::sg::SECONDARY_VOLUME_FT3,
            ua_rated: constants::sg::UA_RATED,
            metal_mass_lb: constants::sg::METAL_MASS_LB,
            vent_setpoint_psia: constants::sg::NO_LOAD_PRESSURE_PSIA,
            aux_heat_policy: AuxHeatPolicy::PassiveOnly,
            ..SgConfig::default()
        };
        let cvcs = CvcsConfig {
            vct_capacity_gal: constants::cvcs::VCT_CAPACITY_GAL,
            base_charging_gpm: constants::cvcs::BASE_FLOW_GPM,
            base_letdown_gpm: constants::cvcs::BASE_FLOW_GPM,
            seal_injection_gpm_per_rcp: constants::cvcs::SEAL_INJECTION_GPM_PER_RCP,
            seal_return_vct_gpm_per_rcp: constants::cvcs::SEAL_RETURN_VCT_GPM_PER_RCP,
            seal_return_rcs_gpm_per_rcp: constants::cvcs::SEAL_RETURN_RCS_GPM_PER_RCP,
            boron_transport_tau_s: constants::cvcs::BORON_TRANSPORT_TAU_S,
            ..CvcsConfig::default()
        };
        let rcp = RcpConfig {
            rated_flow_gpm: constants::rcs::RATED_FLOW_GPM / 4.0,
            heat_mw_per_pump: constants::rcp::HEAT_MW_PER_PUMP,
            coastdown_tau_s: constants::rcp::COASTDOWN_TAU_S,
            start_min_psig: constants::rcp::START_MIN_PSIG,
            stagger_first_s: constants::rcp::STAGGER_FIRST_S,
            stagger_interval_s: constants::rcp::STAGGER_INTERVAL_S,
            ..RcpConfig::default()
        };
        Self {
            max_dt_hr: 10.0 / 3600.0,
            solid_pressure_setpoint_psia: 325.0,
            loop_volume_ft3: constants::rcs::WATER_VOLUME_FT3,
            loop_metal_mass_lb: constants::rcs::METAL_MASS_LB,
            loop_ambient_loss_btu_hr: constants::rcs::AMBIENT_LOSS_BTU_HR,
            pzr,
            solid,
            bubble,
            sg,
            cvcs,
            rcp,
        }
    }
}

impl EngineConfig {
    /// Parse a configuration from TOML, with unspecified fields defaulted
    /// by serde at the table level.
    pub fn from_toml_str(s: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(s)
    }

    pub fn to_toml_string(&self) -> String {
        toml::to_string_pretty(self).unwrap_or_default()
    }
}
