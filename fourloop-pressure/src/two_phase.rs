//! Two-phase pressurizer physics: the rate processes and the setpoint
//! demand layer.
//!
//! The water region carries an explicit bulk enthalpy; the steam dome is
//! treated as saturated at system pressure throughout. Rate processes move
//! mass and enthalpy between the regions at the step-start pressure; the
//! coupled solver then restores saturation and closes pressure, converting
//! any water-region energy imbalance into flash or rainout.

use crate::control::FirstOrderLag;
use fourloop_fluids as fluids;
use serde::{Deserialize, Serialize};

/// BTU per second per kW.
const BTU_PER_S_PER_KW: f64 = 0.947817;

/// psia at zero gauge pressure.
pub const PSIG_OFFSET: f64 = 14.696;

/// Pressurizer geometry and process coefficients.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PzrConfig {
    pub total_volume_ft3: f64,
    pub wall_mass_lb: f64,
    /// Steel specific heat, BTU/(lb F).
    pub wall_cp: f64,
    /// Wall-to-steam condensing conductance, BTU/(hr F).
    pub wall_ua_steam: f64,
    /// Wall-to-water sensible conductance, BTU/(hr F).
    pub wall_ua_water: f64,
    /// Insulation loss conductance to containment, BTU/(hr F).
    pub ambient_ua: f64,
    /// Containment reference temperature for the loss term, F.
    pub ambient_ref_f: f64,
    /// Installed heater capacity, kW.
    pub heater_max_kw: f64,
    /// Heater element thermal lag, s.
    pub heater_tau_s: f64,
    pub spray_max_gpm: f64,
    /// Fraction of the thermodynamic spray condensing potential realized.
    pub spray_efficiency: f64,
    /// Flash fraction of liquid mass per psi of depressurization.
    pub flash_coeff_per_psi: f64,
    /// Backup heaters full on at or below this gauge pressure.
    pub heater_on_below_psig: f64,
    /// All heater demand zero at or above this gauge pressure.
    pub heater_off_above_psig: f64,
    pub spray_start_psig: f64,
    pub spray_full_psig: f64,
    pub porv_open_psig: f64,
    pub porv_reseat_psig: f64,
    pub porv_capacity_lb_hr: f64,
    pub safety_open_psig: f64,
    pub safety_reseat_psig: f64,
    pub safety_capacity_lb_hr: f64,
}

impl Default for PzrConfig {
    fn default() -> Self {
        Self {
            total_volume_ft3: 1800.0,
            wall_mass_lb: 2.0e5,
            wall_cp: 0.12,
            wall_ua_steam: 175_000.0,
            wall_ua_water: 50_000.0,
            ambient_ua: 372.0,
            ambient_ref_f: 160.0,
            heater_max_kw: 1794.0,
            heater_tau_s: 20.0,
            spray_max_gpm: 900.0,
            spray_efficiency: 0.85,
            flash_coeff_per_psi: 1.0e-4,
            heater_on_below_psig: 2210.0,
            heater_off_above_psig: 2235.0,
            spray_start_psig: 2260.0,
            spray_full_psig: 2280.0,
            porv_open_psig: 2335.0,
            porv_reseat_psig: 2310.0,
            porv_capacity_lb_hr: 210_000.0,
            safety_open_psig: 2485.0,
            safety_reseat_psig: 2425.0,
            safety_capacity_lb_hr: 420_000.0,
        }
    }
}

/// Two-phase pressurizer state between solves.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PzrTwoPhaseState {
    pub water_mass_lb: f64,
    pub steam_mass_lb: f64,
    /// Bulk enthalpy of the water region, BTU/lb.
    pub water_enthalpy_btu_lb: f64,
    pub wall_temp_f: f64,
    pub heater: FirstOrderLag,
    pub porv_open: bool,
    pub safety_open: bool,
    pub last_pressure_psia: f64,
}

impl PzrTwoPhaseState {
    /// Saturated two-phase state at `p_psia` with the given level fraction.
    pub fn saturated(cfg: &PzrConfig, p_psia: f64, level_frac: f64) -> Self {
        let sat = fluids::sat_props(p_psia);
        let v_w = cfg.total_volume_ft3 * level_frac.clamp(0.0, 1.0);
        Self {
            water_mass_lb: v_w * sat.rho_f,
            steam_mass_lb: (cfg.total_volume_ft3 - v_w) * sat.rho_g,
            water_enthalpy_btu_lb: sat.h_f,
            wall_temp_f: sat.t_sat_f,
            heater: FirstOrderLag::new(cfg.heater_tau_s, 0.0),
            porv_open: false,
            safety_open: false,
            last_pressure_psia: p_psia,
        }
    }

    /// Effective (lagged) heater output, kW.
    pub fn heater_effective_kw(&self) -> f64 {
        self.heater.value
    }
}

/// Actuator demands produced by the setpoint layer. Relief valves act on
/// their own setpoints inside [`update_rates`].
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct PzrDemands {
    pub heater_demand_kw: f64,
    pub spray_flow_gpm: f64,
}

/// Pressure-program demand layer for normal two-phase control.
pub fn demand_layer(cfg: &PzrConfig, p_psia: f64, spray_override_frac: Option<f64>) -> PzrDemands {
    let psig = p_psia - PSIG_OFFSET;

    let heater_demand_kw = if psig <= cfg.heater_on_below_psig {
        cfg.heater_max_kw
    } else if psig >= cfg.heater_off_above_psig {
        0.0
    } else {
        let span = cfg.heater_off_above_psig - cfg.heater_on_below_psig;
        cfg.heater_max_kw * (cfg.heater_off_above_psig - psig) / span
    };

    let auto_spray_frac = if psig <= cfg.spray_start_psig {
        0.0
    } else if psig >= cfg.spray_full_psig {
        1.0
    } else {
        (psig - cfg.spray_start_psig) / (cfg.spray_full_psig - cfg.spray_start_psig)
    };
    let spray_frac = spray_override_frac.unwrap_or(auto_spray_frac).clamp(0.0, 1.0);

    PzrDemands {
        heater_demand_kw,
        spray_flow_gpm: spray_frac * cfg.spray_max_gpm,
    }
}

/// Per-step inputs to the rate-process layer.
#[derive(Debug, Clone, Copy)]
pub struct PzrRateInputs {
    pub pressure_psia: f64,
    pub heater_demand_kw: f64,
    pub spray_flow_gpm: f64,
    /// Cold-leg temperature feeding the spray line, F.
    pub spray_temp_f: f64,
    pub porv_force_open: bool,
    pub dt_s: f64,
}

/// Mass and energy moved by the rate processes this step.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct PzrRateOutcome {
    /// Steam vented through the PORV and safeties, lb. Ledger debit.
    pub relief_lb: f64,
    /// Spray water drawn from the cold leg, lb.
    pub spray_lb: f64,
    /// Steam condensed by spray, lb.
    pub spray_condensed_lb: f64,
    /// Steam condensed on the wall, lb.
    pub wall_condensed_lb: f64,
    /// Water flashed by falling pressure, lb.
    pub flash_lb: f64,
    /// Effective heater power after lag, kW.
    pub heater_effective_kw: f64,
    /// Heater energy into the water region, BTU.
    pub heater_energy_btu: f64,
}

/// Advance the rate processes at the step-start pressure.
pub fn update_rates(
    state: &mut PzrTwoPhaseState,
    cfg: &PzrConfig,
    inp: &PzrRateInputs,
) -> PzrRateOutcome {
    let dt = inp.dt_s;
    let sat = fluids::sat_props(inp.pressure_psia);
    let mut out = PzrRateOutcome::default();
    let mut h_total = state.water_mass_lb * state.water_enthalpy_btu_lb;

    // Heater bank: first-order element lag, energy into the water region.
    let eff_kw = state.heater.update(inp.heater_demand_kw, dt);
    out.heater_effective_kw = eff_kw;
    out.heater_energy_btu = eff_kw * BTU_PER_S_PER_KW * dt;
    h_total += out.heater_energy_btu;

    // Spray: cold-leg water condenses steam with finite efficiency. The
    // condensate and the spray water both land in the water region.
    if inp.spray_flow_gpm > 0.0 {
        let rho_spray = fluids::rho_l(inp.spray_temp_f, inp.pressure_psia);
        let m_spray = inp.spray_flow_gpm / 60.0 * dt / fluids::units::GAL_PER_FT3 * rho_spray;
        let h_spray = fluids::h_l(inp.spray_temp_f, inp.pressure_psia);
        let cp = fluids::cp_l(inp.spray_temp_f, inp.pressure_psia);
        let potential = m_spray * cp * (sat.t_sat_f - inp.spray_temp_f) / sat.h_fg;
        let m_cond = (cfg.spray_efficiency * potential).min(state.steam_mass_lb);
        state.steam_mass_lb -= m_cond;
        state.water_mass_lb += m_spray + m_cond;
        h_total += m_spray * h_spray + m_cond * sat.h_g;
        out.spray_lb = m_spray;
        out.spray_condensed_lb = m_cond;
    }

    // Wall: condensation on metal cooler than saturation; latent heat is
    // absorbed by the wall. Sensible exchange with the water region.
    let q_wall_steam = cfg.wall_ua_steam * (sat.t_sat_f - state.wall_temp_f) / 3600.0 * dt;
    if q_wall_steam > 0.0 {
        let m_wc = (q_wall_steam / sat.h_fg).min(state.steam_mass_lb);
        state.steam_mass_lb -= m_wc;
        state.water_mass_lb += m_wc;
        h_total += m_wc * sat.h_f;
        state.wall_temp_f += m_wc * sat.h_fg / (cfg.wall_mass_lb * cfg.wall_cp);
        out.wall_condensed_lb = m_wc;
    }
    // Water region sits at or just below saturation in two-phase service.
    let q_wall_water = cfg.wall_ua_water * (sat.t_sat_f - state.wall_temp_f) / 3600.0 * dt;
    h_total -= q_wall_water;
    state.wall_temp_f += q_wall_water / (cfg.wall_mass_lb * cfg.wall_cp);

    // Insulation loss, referenced to containment temperature.
    h_total -= cfg.ambient_ua * (sat.t_sat_f - cfg.ambient_ref_f).max(0.0) / 3600.0 * dt;

    // Flash against falling pressure; self-regulates depressurization.
    let dp = inp.pressure_psia - state.last_pressure_psia;
    if dp < 0.0 && state.water_mass_lb > 0.0 {
        let m_flash = (cfg.flash_coeff_per_psi * state.water_mass_lb * dp.abs())
            .min(0.25 * state.water_mass_lb);
        state.water_mass_lb -= m_flash;
        state.steam_mass_lb += m_flash;
        h_total -= m_flash * sat.h_g;
        out.flash_lb = m_flash;
    }

    // Relief: PORV with hysteresis, then the code safeties.
    let psig = inp.pressure_psia - PSIG_OFFSET;
    if inp.porv_force_open || psig >= cfg.porv_open_psig {
        state.porv_open = true;
    } else if psig <= cfg.porv_reseat_psig && !inp.porv_force_open {
        state.porv_open = false;
    }
    if psig >= cfg.safety_open_psig {
        state.safety_open = true;
    } else if psig <= cfg.safety_reseat_psig {
        state.safety_open = false;
    }
    let mut relief_rate_lb_hr = 0.0;
    if state.porv_open {
        relief_rate_lb_hr += cfg.porv_capacity_lb_hr;
    }
    if state.safety_open {
        relief_rate_lb_hr += cfg.safety_capacity_lb_hr;
    }
    if relief_rate_lb_hr > 0.0 {
        let m_relief = (relief_rate_lb_hr / 3600.0 * dt).min(state.steam_mass_lb);
        state.steam_mass_lb -= m_relief;
        out.relief_lb = m_relief;
        tracing::debug!(m_relief, psig, "pressurizer relief flow");
    }

    state.water_enthalpy_btu_lb = if state.water_mass_lb > 0.0 {
        h_total / state.water_mass_lb
    } else {
        sat.h_f
    };
    state.last_pressure_psia = inp.pressure_psia;
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn cfg() -> PzrConfig {
        PzrConfig::default()
    }

    fn hot_state(p: f64, level: f64) -> PzrTwoPhaseState {
        PzrTwoPhaseState::saturated(&cfg(), p, level)
    }

    #[test]
    fn saturated_constructor_fills_geometry() {
        let c = cfg();
        let s = hot_state(2250.0, 0.6);
        let sat = fluids::sat_props(2250.0);
        let v = s.water_mass_lb / sat.rho_f + s.steam_mass_lb / sat.rho_g;
        assert_relative_eq!(v, c.total_volume_ft3, max_relative = 1e-9);
    }

    #[test]
    fn heater_demand_follows_pressure_program() {
        let c = cfg();
        let full = demand_layer(&c, 2200.0 + PSIG_OFFSET, None);
        assert_eq!(full.heater_demand_kw, c.heater_max_kw);
        let off = demand_layer(&c, 2240.0 + PSIG_OFFSET, None);
        assert_eq!(off.heater_demand_kw, 0.0);
        let mid = demand_layer(&c, 2222.5 + PSIG_OFFSET, None);
        assert!(mid.heater_demand_kw > 0.0 && mid.heater_demand_kw < c.heater_max_kw);
    }

    #[test]
    fn spray_demand_ramps_between_setpoints() {
        let c = cfg();
        assert_eq!(demand_layer(&c, 2250.0 + PSIG_OFFSET, None).spray_flow_gpm, 0.0);
        let full = demand_layer(&c, 2290.0 + PSIG_OFFSET, None);
        assert_eq!(full.spray_flow_gpm, c.spray_max_gpm);
        let half = demand_layer(&c, 2270.0 + PSIG_OFFSET, None);
        assert_relative_eq!(half.spray_flow_gpm, 0.5 * c.spray_max_gpm, epsilon = 1e-9);
    }

    #[test]
    fn heater_lag_approaches_demand() {
        let c = cfg();
        let mut s = hot_state(2250.0, 0.6);
        let inp = PzrRateInputs {
            pressure_psia: 2250.0,
            heater_demand_kw: 1000.0,
            spray_flow_gpm: 0.0,
            spray_temp_f: 558.0,
            porv_force_open: false,
            dt_s: 20.0,
        };
        let out = update_rates(&mut s, &c, &inp);
        assert_relative_eq!(
            out.heater_effective_kw,
            1000.0 * (1.0 - (-1.0_f64).exp()),
            max_relative = 1e-9
        );
    }

    #[test]
    fn spray_condenses_steam() {
        let c = cfg();
        let mut s = hot_state(2250.0, 0.6);
        let steam_before = s.steam_mass_lb;
        let inp = PzrRateInputs {
            pressure_psia: 2250.0,
            heater_demand_kw: 0.0,
            spray_flow_gpm: 500.0,
            spray_temp_f: 558.0,
            porv_force_open: false,
            dt_s: 10.0,
        };
        let out = update_rates(&mut s, &c, &inp);
        assert!(out.spray_condensed_lb > 0.0);
        assert!(s.steam_mass_lb < steam_before);
        // Finite efficiency: below the thermodynamic potential.
        let sat = fluids::sat_props(2250.0);
        let cp = fluids::cp_l(558.0, 2250.0);
        let potential = out.spray_lb * cp * (sat.t_sat_f - 558.0) / sat.h_fg;
        assert!(out.spray_condensed_lb < potential);
    }

    #[test]
    fn cold_wall_condenses_and_warms() {
        let c = cfg();
        let mut s = hot_state(2250.0, 0.6);
        s.wall_temp_f -= 50.0;
        let wall_before = s.wall_temp_f;
        let inp = PzrRateInputs {
            pressure_psia: 2250.0,
            heater_demand_kw: 0.0,
            spray_flow_gpm: 0.0,
            spray_temp_f: 558.0,
            porv_force_open: false,
            dt_s: 10.0,
        };
        let out = update_rates(&mut s, &c, &inp);
        assert!(out.wall_condensed_lb > 0.0);
        assert!(s.wall_temp_f > wall_before);
    }

    #[test]
    fn falling_pressure_flashes_water() {
        let c = cfg();
        let mut s = hot_state(2250.0, 0.6);
        s.last_pressure_psia = 2300.0;
        let inp = PzrRateInputs {
            pressure_psia: 2250.0,
            heater_demand_kw: 0.0,
            spray_flow_gpm: 0.0,
            spray_temp_f: 558.0,
            porv_force_open: false,
            dt_s: 10.0,
        };
        let out = update_rates(&mut s, &c, &inp);
        assert!(out.flash_lb > 0.0);
        // Proportional to the pressure drop.
        assert_relative_eq!(
            out.flash_lb,
            c.flash_coeff_per_psi * 50.0 * (s.water_mass_lb + out.flash_lb),
            max_relative = 1e-6
        );
    }

    #[test]
    fn porv_opens_at_setpoint_and_reseats() {
        let c = cfg();
        let mut s = hot_state(2250.0, 0.6);
        let mut inp = PzrRateInputs {
            pressure_psia: c.porv_open_psig + PSIG_OFFSET + 1.0,
            heater_demand_kw: 0.0,
            spray_flow_gpm: 0.0,
            spray_temp_f: 558.0,
            porv_force_open: false,
            dt_s: 10.0,
        };
        let out = update_rates(&mut s, &c, &inp);
        assert!(s.porv_open);
        assert!(out.relief_lb > 0.0);

        inp.pressure_psia = c.porv_reseat_psig + PSIG_OFFSET - 1.0;
        let out = update_rates(&mut s, &c, &inp);
        assert!(!s.porv_open);
        assert_eq!(out.relief_lb, 0.0);
    }
}
