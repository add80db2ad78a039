//! Chemical and volume control: VCT inventory, charging and letdown,
//! seal-flow split, RWST makeup, BRS divert, and boron transport.
//!
//! All CVCS volumetric flows are metered at a common reference density so
//! balanced charging and letdown move identical mass. The 5 gpm-per-pump
//! seal leg that enters the RCS bypasses the VCT entirely and is reported
//! as its own primary boundary flow; folding it into letdown accounting is
//! the historical inventory bug this module exists to avoid.

use crate::rcp;
use fourloop_pressure::PiController;
use serde::{Deserialize, Serialize};

/// Pressurizer heater operating mode selected by the operator.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
pub enum HeaterMode {
    Off,
    /// Fixed manual output, kW.
    ManualPower(f64),
    /// Full heaters for drawing and growing the bubble.
    AutoBubbleFormation,
    /// Bubble-sequence pressurization PID owns the demand.
    AutoPressurize,
    /// Normal two-phase pressure program.
    #[default]
    AutoPid,
}

/// CVCS coefficients and setpoints.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CvcsConfig {
    /// VCT capacity, gal.
    pub vct_capacity_gal: f64,
    /// VCT level setpoint, percent.
    pub vct_level_setpoint_pct: f64,
    /// Base charging and letdown flows, gpm.
    pub base_charging_gpm: f64,
    pub base_letdown_gpm: f64,
    pub max_charging_gpm: f64,
    pub max_letdown_gpm: f64,
    /// Common metering density for CVCS flows, lb/ft3.
    pub reference_density_lb_ft3: f64,
    /// Seal flows per running RCP, gpm.
    pub seal_injection_gpm_per_rcp: f64,
    /// Seal leg returning to the VCT, gpm per RCP.
    pub seal_return_vct_gpm_per_rcp: f64,
    /// Seal leg entering the RCS (bypasses the VCT), gpm per RCP.
    pub seal_return_rcs_gpm_per_rcp: f64,
    /// RWST auto-makeup band, percent level.
    pub makeup_start_pct: f64,
    pub makeup_stop_pct: f64,
    pub makeup_flow_gpm: f64,
    /// Divert-to-BRS band, percent level.
    pub divert_start_pct: f64,
    pub divert_stop_pct: f64,
    /// RWST boron concentration, ppm.
    pub rwst_boron_ppm: f64,
    /// Boric-acid blender source concentration, ppm.
    pub boric_acid_ppm: f64,
    /// Blender feed-and-bleed flow through the VCT, gpm.
    pub blend_flow_gpm: f64,
    /// VCT-to-RCS boron delivery lag, s.
    pub boron_transport_tau_s: f64,
    /// Two-phase letdown modulation, gpm per percent of PZR level error.
    pub letdown_gpm_per_level_pct: f64,
}

impl Default for CvcsConfig {
    fn default() -> Self {
        Self {
            vct_capacity_gal: 6000.0,
            vct_level_setpoint_pct: 50.0,
            base_charging_gpm: 75.0,
            base_letdown_gpm: 75.0,
            max_charging_gpm: 150.0,
            max_letdown_gpm: 200.0,
            reference_density_lb_ft3: 62.0,
            seal_injection_gpm_per_rcp: 8.0,
            seal_return_vct_gpm_per_rcp: 3.0,
            seal_return_rcs_gpm_per_rcp: 5.0,
            makeup_start_pct: 20.0,
            makeup_stop_pct: 30.0,
            makeup_flow_gpm: 120.0,
            divert_start_pct: 80.0,
            divert_stop_pct: 70.0,
            rwst_boron_ppm: 2500.0,
            boric_acid_ppm: 7000.0,
            blend_flow_gpm: 30.0,
            boron_transport_tau_s: 600.0,
            letdown_gpm_per_level_pct: 4.0,
        }
    }
}

/// CVCS mutable state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CvcsState {
    pub vct_volume_gal: f64,
    pub vct_boron_ppm: f64,
    pub vct_temp_f: f64,
    /// VCT level PI driving the charging command.
    pub level_pi: PiController,
    /// Lagged boron concentration arriving at the charging nozzles, ppm.
    pub delivered_boron_ppm: f64,
    pub makeup_active: bool,
    pub divert_active: bool,
    pub heater_mode: HeaterMode,
    /// Flows realized last step, gpm.
    pub charging_flow_gpm: f64,
    pub letdown_flow_gpm: f64,
}

impl CvcsState {
    pub fn new(cfg: &CvcsConfig, vct_boron_ppm: f64) -> Self {
        Self {
            vct_volume_gal: cfg.vct_capacity_gal * cfg.vct_level_setpoint_pct / 100.0,
            vct_boron_ppm,
            vct_temp_f: 115.0,
            level_pi: PiController::new(1.5, 0.002, -50.0, 50.0),
            delivered_boron_ppm: vct_boron_ppm,
            makeup_active: false,
            divert_active: false,
            heater_mode: HeaterMode::default(),
            charging_flow_gpm: 0.0,
            letdown_flow_gpm: 0.0,
        }
    }

    pub fn vct_level_pct(&self, cfg: &CvcsConfig) -> f64 {
        self.vct_volume_gal / cfg.vct_capacity_gal * 100.0
    }
}

/// Per-step boundary conditions.
#[derive(Debug, Clone, Copy)]
pub struct CvcsInputs {
    /// Letdown trim requested by the solid-plant pressure controller or
    /// the bubble sequence, gpm.
    pub letdown_trim_gpm: f64,
    /// Two-phase level control: PZR level error, percent (actual - setpoint).
    pub pzr_level_error_pct: Option<f64>,
    /// Hold charging at a fixed value (bubble drain), gpm.
    pub charging_override_gpm: Option<f64>,
    /// Running reactor coolant pumps.
    pub active_rcps: usize,
    /// Operator boron target for the RCS, ppm.
    pub boron_demand_ppm: f64,
    /// Current RCS boron, ppm.
    pub rcs_boron_ppm: f64,
    /// Primary water mass for boron mixing, lb.
    pub primary_mass_lb: f64,
    pub dt_s: f64,
}

/// Flows and transfers realized this step.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct CvcsOutputs {
    pub charging_gpm: f64,
    pub letdown_gpm: f64,
    pub seal_injection_gpm: f64,
    pub seal_return_vct_gpm: f64,
    pub seal_return_rcs_gpm: f64,
    /// Primary boundary masses this step, lb.
    pub charging_lb: f64,
    pub letdown_lb: f64,
    pub seal_return_rcs_lb: f64,
    /// Net primary inventory change from CVCS, lb.
    pub net_primary_lb: f64,
    /// Updated RCS boron after transport and mixing, ppm.
    pub rcs_boron_ppm: f64,
    pub makeup_started: bool,
    pub divert_started: bool,
}

fn gpm_to_lb(gpm: f64, dt_s: f64, rho_lb_ft3: f64) -> f64 {
    gpm / 60.0 * dt_s / fourloop_fluids::units::GAL_PER_FT3 * rho_lb_ft3
}

/// Advance the CVCS one step.
pub fn update(state: &mut CvcsState, cfg: &CvcsConfig, inp: &CvcsInputs) -> CvcsOutputs {
    let dt = inp.dt_s;
    let mut out = CvcsOutputs::default();
    let n_rcp = inp.active_rcps as f64;

    // Charging command: VCT level PI around the base flow, unless the
    // bubble sequence is holding it back.
    let level_error = state.vct_level_pct(cfg) - cfg.vct_level_setpoint_pct;
    let pi_charging = (cfg.base_charging_gpm + state.level_pi.update(level_error, dt))
        .clamp(0.0, cfg.max_charging_gpm);
    let charging = inp
        .charging_override_gpm
        .map(|g| g.clamp(0.0, cfg.max_charging_gpm))
        .unwrap_or(pi_charging);

    // Letdown: pressure trim while solid, level balance while two-phase.
    let letdown = match inp.pzr_level_error_pct {
        Some(err) => cfg.base_letdown_gpm + cfg.letdown_gpm_per_level_pct * err
            + inp.letdown_trim_gpm,
        None => cfg.base_letdown_gpm + inp.letdown_trim_gpm,
    }
    .clamp(0.0, cfg.max_letdown_gpm);

    // Seal package.
    let seal_injection = cfg.seal_injection_gpm_per_rcp * n_rcp;
    let seal_return_vct = cfg.seal_return_vct_gpm_per_rcp * n_rcp;
    let seal_return_rcs = cfg.seal_return_rcs_gpm_per_rcp * n_rcp;

    // VCT inventory: letdown and the VCT seal leg come back; charging and
    // seal injection draw down; RWST makeup and BRS divert hold the band.
    let level = state.vct_level_pct(cfg);
    if !state.makeup_active && level < cfg.makeup_start_pct {
        state.makeup_active = true;
        out.makeup_started = true;
        tracing::info!(vct_level = level, "VCT auto-makeup from RWST started");
    } else if state.makeup_active && level >= cfg.makeup_stop_pct {
        state.makeup_active = false;
    }
    if !state.divert_active && level > cfg.divert_start_pct {
        state.divert_active = true;
        out.divert_started = true;
        tracing::info!(vct_level = level, "letdown diverting to boron recycle");
    } else if state.divert_active && level <= cfg.divert_stop_pct {
        state.divert_active = false;
    }

    let makeup_gpm = if state.makeup_active {
        cfg.makeup_flow_gpm
    } else {
        0.0
    };
    // Diverted letdown goes to the BRS instead of the VCT.
    let letdown_to_vct = if state.divert_active { 0.0 } else { letdown };

    let gal_per_s = |gpm: f64| gpm / 60.0 * dt;
    let vct_in_gal = gal_per_s(letdown_to_vct) + gal_per_s(seal_return_vct) + gal_per_s(makeup_gpm);
    let vct_out_gal = gal_per_s(charging) + gal_per_s(seal_injection);
    let vol_before = state.vct_volume_gal;
    state.vct_volume_gal = (state.vct_volume_gal + vct_in_gal - vct_out_gal)
        .clamp(0.0, cfg.vct_capacity_gal);

    // VCT boron: mix actual inflows, then let the boric-acid blender walk
    // the tank toward the operator target by feed-and-bleed.
    if state.vct_volume_gal > 1.0 {
        let in_ppm_weighted = gal_per_s(letdown_to_vct) * inp.rcs_boron_ppm
            + gal_per_s(seal_return_vct) * inp.rcs_boron_ppm
            + gal_per_s(makeup_gpm) * cfg.rwst_boron_ppm;
        if vct_in_gal > 0.0 {
            state.vct_boron_ppm = (vol_before * state.vct_boron_ppm + in_ppm_weighted)
                / (vol_before + vct_in_gal);
        }
        if (inp.boron_demand_ppm - state.vct_boron_ppm).abs() > 0.5 {
            let source_ppm = if inp.boron_demand_ppm > state.vct_boron_ppm {
                cfg.boric_acid_ppm
            } else {
                0.0
            };
            let frac = (gal_per_s(cfg.blend_flow_gpm) / state.vct_volume_gal).min(1.0);
            let next = state.vct_boron_ppm + frac * (source_ppm - state.vct_boron_ppm);
            // Stop at the target, never across it.
            state.vct_boron_ppm = if source_ppm > state.vct_boron_ppm {
                next.min(inp.boron_demand_ppm)
            } else {
                next.max(inp.boron_demand_ppm)
            };
        }
    }

    // Boron transport to the core: charging carries the lagged VCT
    // concentration; the loop mixes it over its own mass.
    let alpha = 1.0 - (-dt / cfg.boron_transport_tau_s).exp();
    state.delivered_boron_ppm += alpha * (state.vct_boron_ppm - state.delivered_boron_ppm);
    let charging_lb = gpm_to_lb(charging, dt, cfg.reference_density_lb_ft3);
    let letdown_lb = gpm_to_lb(letdown, dt, cfg.reference_density_lb_ft3);
    let seal_rcs_lb = gpm_to_lb(seal_return_rcs, dt, cfg.reference_density_lb_ft3);
    let mix_in = charging_lb + seal_rcs_lb;
    let rcs_boron = if inp.primary_mass_lb > 0.0 {
        let b_in = state.delivered_boron_ppm;
        (inp.rcs_boron_ppm * (inp.primary_mass_lb - mix_in).max(0.0) + b_in * mix_in)
            / inp.primary_mass_lb.max(1.0)
    } else {
        inp.rcs_boron_ppm
    };

    state.charging_flow_gpm = charging;
    state.letdown_flow_gpm = letdown;

    out.charging_gpm = charging;
    out.letdown_gpm = letdown;
    out.seal_injection_gpm = seal_injection;
    out.seal_return_vct_gpm = seal_return_vct;
    out.seal_return_rcs_gpm = seal_return_rcs;
    out.charging_lb = charging_lb;
    out.letdown_lb = letdown_lb;
    out.seal_return_rcs_lb = seal_rcs_lb;
    out.net_primary_lb = charging_lb + seal_rcs_lb - letdown_lb;
    out.rcs_boron_ppm = rcs_boron;
    out
}

/// Map the heater mode to a demand, given what the automatic layers want.
pub fn heater_demand_kw(
    mode: HeaterMode,
    auto_pid_demand_kw: f64,
    bubble_demand_kw: Option<f64>,
    heater_max_kw: f64,
) -> f64 {
    match mode {
        HeaterMode::Off => 0.0,
        HeaterMode::ManualPower(kw) => kw.clamp(0.0, heater_max_kw),
        HeaterMode::AutoBubbleFormation => bubble_demand_kw.unwrap_or(heater_max_kw),
        HeaterMode::AutoPressurize => bubble_demand_kw.unwrap_or(0.0),
        HeaterMode::AutoPid => auto_pid_demand_kw,
    }
}

/// Reference seal-split sanity: injection equals the sum of both returns.
pub fn seal_split_consistent(cfg: &CvcsConfig) -> bool {
    (cfg.seal_injection_gpm_per_rcp
        - cfg.seal_return_vct_gpm_per_rcp
        - cfg.seal_return_rcs_gpm_per_rcp)
        .abs()
        < 1e-9
}

/// Convenience: seal flows for `n` running pumps (used by displays).
pub fn seal_flows_gpm(cfg: &CvcsConfig, rcps: &rcp::RcpSet) -> (f64, f64, f64) {
    let n = rcps.running_count() as f64;
    (
        cfg.seal_injection_gpm_per_rcp * n,
        cfg.seal_return_vct_gpm_per_rcp * n,
        cfg.seal_return_rcs_gpm_per_rcp * n,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn cfg() -> CvcsConfig {
        CvcsConfig::default()
    }

    fn base_inputs() -> CvcsInputs {
        CvcsInputs {
            letdown_trim_gpm: 0.0,
            pzr_level_error_pct: None,
            charging_override_gpm: None,
            active_rcps: 0,
            boron_demand_ppm: 900.0,
            rcs_boron_ppm: 900.0,
            primary_mass_lb: 550_000.0,
            dt_s: 10.0,
        }
    }

    #[test]
    fn seal_split_adds_up() {
        assert!(seal_split_consistent(&cfg()));
    }

    #[test]
    fn balanced_flows_move_no_net_mass() {
        let c = cfg();
        let mut s = CvcsState::new(&c, 900.0);
        // At setpoint level the PI holds charging at base; base letdown
        // matches, so net primary transfer is zero.
        let out = update(&mut s, &c, &base_inputs());
        assert_relative_eq!(out.charging_gpm, c.base_charging_gpm, epsilon = 0.5);
        assert_relative_eq!(out.letdown_gpm, c.base_letdown_gpm, epsilon = 1e-9);
        assert_relative_eq!(out.net_primary_lb, 0.0, epsilon = 1.0);
    }

    #[test]
    fn seal_return_rcs_bypasses_vct_accounting() {
        let c = cfg();
        let mut s = CvcsState::new(&c, 900.0);
        let mut inp = base_inputs();
        inp.active_rcps = 4;
        let out = update(&mut s, &c, &inp);
        assert_eq!(out.seal_injection_gpm, 32.0);
        assert_eq!(out.seal_return_vct_gpm, 12.0);
        assert_eq!(out.seal_return_rcs_gpm, 20.0);
        // The RCS leg is its own boundary term, not folded into letdown.
        assert!(out.seal_return_rcs_lb > 0.0);
        assert_relative_eq!(
            out.net_primary_lb,
            out.charging_lb + out.seal_return_rcs_lb - out.letdown_lb,
            epsilon = 1e-9
        );
    }

    #[test]
    fn low_vct_level_starts_makeup() {
        let c = cfg();
        let mut s = CvcsState::new(&c, 900.0);
        s.vct_volume_gal = c.vct_capacity_gal * 0.15;
        let out = update(&mut s, &c, &base_inputs());
        assert!(out.makeup_started);
        assert!(s.makeup_active);
        // Hysteresis: stays on until the stop level.
        s.vct_volume_gal = c.vct_capacity_gal * 0.25;
        let out = update(&mut s, &c, &base_inputs());
        assert!(!out.makeup_started);
        assert!(s.makeup_active);
        s.vct_volume_gal = c.vct_capacity_gal * 0.35;
        update(&mut s, &c, &base_inputs());
        assert!(!s.makeup_active);
    }

    #[test]
    fn high_vct_level_diverts_to_brs() {
        let c = cfg();
        let mut s = CvcsState::new(&c, 900.0);
        s.vct_volume_gal = c.vct_capacity_gal * 0.85;
        let before = s.vct_volume_gal;
        let out = update(&mut s, &c, &base_inputs());
        assert!(out.divert_started);
        // Letdown is not returning to the VCT, so the level falls.
        assert!(s.vct_volume_gal < before);
    }

    #[test]
    fn boration_raises_rcs_boron_through_lag() {
        let c = cfg();
        let mut s = CvcsState::new(&c, 900.0);
        let mut inp = base_inputs();
        inp.boron_demand_ppm = 1100.0;
        // Force makeup on by dropping the level into the band.
        s.vct_volume_gal = c.vct_capacity_gal * 0.15;
        let mut boron = inp.rcs_boron_ppm;
        for _ in 0..1080 {
            inp.rcs_boron_ppm = boron;
            let out = update(&mut s, &c, &inp);
            boron = out.rcs_boron_ppm;
        }
        assert!(boron > 910.0, "RCS boron only reached {boron}");
        // Transport is lagged: nowhere near instantaneous equalization.
        assert!(boron < 1100.0);
    }

    #[test]
    fn dilution_lowers_vct_boron() {
        let c = cfg();
        let mut s = CvcsState::new(&c, 900.0);
        let mut inp = base_inputs();
        inp.boron_demand_ppm = 700.0;
        s.vct_volume_gal = c.vct_capacity_gal * 0.15;
        for _ in 0..360 {
            update(&mut s, &c, &inp);
        }
        assert!(s.vct_boron_ppm < 900.0);
    }

    #[test]
    fn two_phase_letdown_follows_level_error() {
        let c = cfg();
        let mut s = CvcsState::new(&c, 900.0);
        let mut inp = base_inputs();
        inp.pzr_level_error_pct = Some(5.0);
        let out = update(&mut s, &c, &inp);
        assert_relative_eq!(
            out.letdown_gpm,
            c.base_letdown_gpm + 5.0 * c.letdown_gpm_per_level_pct,
            epsilon = 1e-9
        );
    }

    #[test]
    fn heater_mode_mapping() {
        assert_eq!(heater_demand_kw(HeaterMode::Off, 500.0, Some(1794.0), 1794.0), 0.0);
        assert_eq!(
            heater_demand_kw(HeaterMode::ManualPower(3000.0), 0.0, None, 1794.0),
            1794.0
        );
        assert_eq!(
            heater_demand_kw(HeaterMode::AutoBubbleFormation, 0.0, Some(1794.0), 1794.0),
            1794.0
        );
        assert_eq!(heater_demand_kw(HeaterMode::AutoPid, 650.0, None, 1794.0), 650.0);
    }
}
