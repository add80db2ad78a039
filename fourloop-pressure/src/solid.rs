//! Solid-plant (water-solid) pressure operation.
//!
//! With no steam bubble the whole primary is one compressible liquid
//! volume: pressure comes from the all-liquid closure and moves fast, so a
//! PI controller trims letdown above its base flow to bleed thermal
//! expansion. The pressurizer water temperature is integrated separately;
//! it lags the loop through surge-line conduction and is driven up by the
//! heaters until it reaches saturation and a bubble can be drawn.

use crate::control::{FirstOrderLag, PiController};
use crate::coupled::{self, SolidSolution, SolidSolveInput};
use crate::error::PressureError;
use fourloop_fluids as fluids;
use serde::{Deserialize, Serialize};

const BTU_PER_S_PER_KW: f64 = 0.947817;

/// Solid-plant process coefficients.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SolidPlantConfig {
    /// Surge-line conductance loop -> pressurizer, BTU/(hr F).
    pub surge_line_ua: f64,
    /// Pressurizer insulation loss conductance, BTU/(hr F).
    pub ambient_ua: f64,
    /// Containment reference temperature, F.
    pub ambient_ref_f: f64,
    /// Lumped metal participating in pressurizer heatup, lb.
    pub wall_mass_lb: f64,
    pub wall_cp: f64,
    pub heater_max_kw: f64,
    pub heater_tau_s: f64,
    /// Letdown trim authority above base flow, gpm.
    pub letdown_trim_max_gpm: f64,
    pub letdown_kp_gpm_per_psi: f64,
    pub letdown_ki: f64,
}

impl Default for SolidPlantConfig {
    fn default() -> Self {
        Self {
            surge_line_ua: 2_000.0,
            ambient_ua: 372.0,
            ambient_ref_f: 160.0,
            wall_mass_lb: 2.0e5,
            wall_cp: 0.12,
            heater_max_kw: 1794.0,
            heater_tau_s: 20.0,
            letdown_trim_max_gpm: 80.0,
            letdown_kp_gpm_per_psi: 1.5,
            letdown_ki: 0.02,
        }
    }
}

/// State carried while the plant is water-solid.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SolidPlantState {
    /// Pressurizer water temperature, F.
    pub t_pzr_f: f64,
    /// Pressurizer water mass from the last closure, lb.
    pub pzr_mass_lb: f64,
    pub heater: FirstOrderLag,
    pub letdown_pi: PiController,
    /// Latched when the pressurizer water reaches saturation.
    pub bubble_formed: bool,
}

impl SolidPlantState {
    pub fn new(cfg: &SolidPlantConfig, t_pzr_f: f64, p_psia: f64, pzr_volume_ft3: f64) -> Self {
        Self {
            t_pzr_f,
            pzr_mass_lb: pzr_volume_ft3 * fluids::rho_l(t_pzr_f, p_psia),
            heater: FirstOrderLag::new(cfg.heater_tau_s, 0.0),
            // Negative trim authority lets the controller back letdown off
            // below base when pressure sags.
            letdown_pi: PiController::new(
                cfg.letdown_kp_gpm_per_psi,
                cfg.letdown_ki,
                -60.0,
                cfg.letdown_trim_max_gpm,
            ),
            bubble_formed: false,
        }
    }
}

/// Per-step boundary conditions for the solid branch.
#[derive(Debug, Clone, Copy)]
pub struct SolidInputs {
    pub canonical_mass_lb: f64,
    pub loop_volume_ft3: f64,
    pub pzr_volume_ft3: f64,
    pub t_avg_f: f64,
    pub t_hot_f: f64,
    pub pressure_psia: f64,
    /// Operator pressure setpoint for the letdown trim, psia.
    pub pressure_setpoint_psia: f64,
    pub heater_demand_kw: f64,
    pub dt_s: f64,
}

/// Outcome of one solid-plant step.
#[derive(Debug, Clone, Copy)]
pub struct SolidOutcome {
    pub solution: SolidSolution,
    /// Additional letdown requested by the pressure controller, gpm.
    pub letdown_trim_gpm: f64,
    pub heater_effective_kw: f64,
    /// Surge-line conduction into the pressurizer, BTU.
    pub surge_line_energy_btu: f64,
    /// True on the step the pressurizer water first reaches saturation.
    pub bubble_detected: bool,
}

/// Advance the solid-plant branch by one step.
pub fn update(
    state: &mut SolidPlantState,
    cfg: &SolidPlantConfig,
    inp: &SolidInputs,
) -> Result<SolidOutcome, PressureError> {
    let dt = inp.dt_s;

    // Pressurizer water heatup: heaters, surge-line conduction, losses.
    let eff_kw = state.heater.update(inp.heater_demand_kw, dt);
    let q_heater = eff_kw * BTU_PER_S_PER_KW * dt;
    let q_surge_line = cfg.surge_line_ua * (inp.t_hot_f - state.t_pzr_f) / 3600.0 * dt;
    let q_ambient = cfg.ambient_ua * (state.t_pzr_f - cfg.ambient_ref_f).max(0.0) / 3600.0 * dt;
    let cp = fluids::cp_l(state.t_pzr_f, inp.pressure_psia);
    let heat_capacity = state.pzr_mass_lb * cp + cfg.wall_mass_lb * cfg.wall_cp;
    state.t_pzr_f += (q_heater + q_surge_line - q_ambient) / heat_capacity;

    // Close pressure against the fixed volume.
    let solution = coupled::solve_solid(
        &SolidSolveInput {
            canonical_mass_lb: inp.canonical_mass_lb,
            loop_volume_ft3: inp.loop_volume_ft3,
            pzr_volume_ft3: inp.pzr_volume_ft3,
            t_avg_f: inp.t_avg_f,
            t_pzr_f: state.t_pzr_f,
            p_start_psia: inp.pressure_psia,
        },
        state.pzr_mass_lb,
    )?;

    // Insurge mixes hot-leg water into the pressurizer.
    if solution.surge_lb > 0.0 && solution.pzr_water_mass_lb > 0.0 {
        state.t_pzr_f = (state.t_pzr_f * state.pzr_mass_lb + inp.t_hot_f * solution.surge_lb)
            / solution.pzr_water_mass_lb;
    }
    state.pzr_mass_lb = solution.pzr_water_mass_lb;

    // Letdown trim bleeds expansion when pressure runs above setpoint.
    let letdown_trim = state
        .letdown_pi
        .update(solution.pressure_psia - inp.pressure_setpoint_psia, dt);

    // Saturation watch: hand off to the bubble-formation sequence.
    let t_sat = fluids::t_sat(solution.pressure_psia);
    let bubble_detected = !state.bubble_formed && state.t_pzr_f >= t_sat;
    if bubble_detected {
        state.bubble_formed = true;
        tracing::info!(
            t_pzr = state.t_pzr_f,
            t_sat,
            pressure = solution.pressure_psia,
            "pressurizer water reached saturation"
        );
    }

    Ok(SolidOutcome {
        solution,
        letdown_trim_gpm: letdown_trim,
        heater_effective_kw: eff_kw,
        surge_line_energy_btu: q_surge_line,
        bubble_detected,
    })
}
