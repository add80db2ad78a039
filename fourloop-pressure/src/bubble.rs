//! Bubble-formation sequence and the regime-transition conservation
//! contract.
//!
//! Seven phases walk the plant from water-solid operation to normal
//! two-phase pressure control. The drain is thermodynamic: heater steam
//! production grows the dome and displaces liquid out the surge line; no
//! mass leaves the primary. Every regime boundary passes through
//! [`reconcile`], which bounds the ledger delta and fails the step when the
//! books do not close.

use crate::control::{rate_limit, PiController};
use crate::error::PressureError;
use serde::{Deserialize, Serialize};

/// Reconciliation warning threshold, lb.
pub const RTCC_WARN_LB: f64 = 10.0;

/// Reconciliation hard-failure threshold, lb.
pub const RTCC_ERROR_LB: f64 = 100.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BubblePhase {
    None,
    Detection,
    Verification,
    Drain,
    Stabilize,
    Pressurize,
    Complete,
}

impl BubblePhase {
    pub fn label(self) -> &'static str {
        match self {
            BubblePhase::None => "none",
            BubblePhase::Detection => "detection",
            BubblePhase::Verification => "verification",
            BubblePhase::Drain => "drain",
            BubblePhase::Stabilize => "stabilize",
            BubblePhase::Pressurize => "pressurize",
            BubblePhase::Complete => "complete",
        }
    }
}

/// Tuning for the formation sequence.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BubbleConfig {
    /// Confirmation hold in Detection, s.
    pub detection_hold_s: f64,
    /// Cross-check hold in Verification, s.
    pub verification_hold_s: f64,
    /// Allowed saturation-pressure mismatch in Verification, psi.
    pub verification_tolerance_psi: f64,
    /// Drain target level, percent.
    pub drain_target_level_pct: f64,
    /// Stabilize hold, s.
    pub stabilize_hold_s: f64,
    /// Level band treated as stable, percent.
    pub stabilize_band_pct: f64,
    /// Hot-standby pressure setpoint, psia.
    pub pressurize_setpoint_psia: f64,
    /// Pressurize deadband, psi.
    pub pressurize_deadband_psi: f64,
    /// Heater command slew bound, fraction of full power per second.
    pub heater_rate_frac_per_s: f64,
    pub heater_max_kw: f64,
    /// Hold inside the deadband before declaring Complete, s.
    pub pressurize_hold_s: f64,
}

impl Default for BubbleConfig {
    fn default() -> Self {
        Self {
            detection_hold_s: 60.0,
            verification_hold_s: 30.0,
            verification_tolerance_psi: 15.0,
            drain_target_level_pct: 25.0,
            stabilize_hold_s: 300.0,
            stabilize_band_pct: 3.0,
            pressurize_setpoint_psia: 2250.0,
            pressurize_deadband_psi: 5.0,
            heater_rate_frac_per_s: 0.10,
            heater_max_kw: 1794.0,
            pressurize_hold_s: 60.0,
        }
    }
}

/// Per-step observations the sequence gates on.
#[derive(Debug, Clone, Copy)]
pub struct BubbleInputs {
    pub t_pzr_f: f64,
    pub t_sat_f: f64,
    pub pressure_psia: f64,
    pub p_sat_of_t_pzr_psia: f64,
    pub pzr_level_pct: f64,
    /// True once the engine runs the two-phase branch.
    pub in_two_phase: bool,
    pub dt_s: f64,
}

/// What the sequence asks of the rest of the plant this step.
#[derive(Debug, Clone, Copy, Default)]
pub struct BubbleOutcome {
    /// Set on the step Verification completes: switch regimes under RTCC.
    pub request_two_phase: bool,
    /// Heater demand while the sequence owns the heaters, kW.
    pub heater_demand_kw: Option<f64>,
    /// Extra letdown requested to trim level during Drain, gpm.
    pub letdown_trim_gpm: f64,
    /// Charging clamp while the drain displaces liquid to CVCS, gpm.
    pub charging_hold_gpm: Option<f64>,
    /// Phase edge taken this step.
    pub transition: Option<(BubblePhase, BubblePhase)>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BubbleFsm {
    pub phase: BubblePhase,
    pub phase_time_s: f64,
    pub heater_cmd_kw: f64,
    pub pressurize_pi: PiController,
    hold_ok_s: f64,
}

impl BubbleFsm {
    pub fn new(cfg: &BubbleConfig) -> Self {
        Self {
            phase: BubblePhase::None,
            phase_time_s: 0.0,
            heater_cmd_kw: 0.0,
            // Gains in kW per psi of pressure error.
            pressurize_pi: PiController::new(40.0, 0.5, 0.0, cfg.heater_max_kw),
            hold_ok_s: 0.0,
        }
    }

    /// Already operating two-phase: sequence is complete.
    pub fn completed(cfg: &BubbleConfig) -> Self {
        let mut f = Self::new(cfg);
        f.phase = BubblePhase::Complete;
        f
    }

    fn enter(&mut self, next: BubblePhase, out: &mut BubbleOutcome) {
        tracing::info!(from = self.phase.label(), to = next.label(), "bubble phase");
        out.transition = Some((self.phase, next));
        self.phase = next;
        self.phase_time_s = 0.0;
        self.hold_ok_s = 0.0;
    }

    /// Advance the sequence one step.
    pub fn update(&mut self, cfg: &BubbleConfig, inp: &BubbleInputs) -> BubbleOutcome {
        let mut out = BubbleOutcome::default();
        self.phase_time_s += inp.dt_s;

        match self.phase {
            BubblePhase::None => {
                if inp.t_pzr_f >= inp.t_sat_f - 0.5 {
                    self.enter(BubblePhase::Detection, &mut out);
                }
            }
            BubblePhase::Detection => {
                // Hold at saturation; a dip resets the confirmation clock.
                if inp.t_pzr_f >= inp.t_sat_f - 1.0 {
                    self.hold_ok_s += inp.dt_s;
                } else {
                    self.hold_ok_s = 0.0;
                }
                out.heater_demand_kw = Some(cfg.heater_max_kw);
                if self.hold_ok_s >= cfg.detection_hold_s {
                    self.enter(BubblePhase::Verification, &mut out);
                }
            }
            BubblePhase::Verification => {
                let consistent = (inp.p_sat_of_t_pzr_psia - inp.pressure_psia).abs()
                    <= cfg.verification_tolerance_psi;
                if consistent {
                    self.hold_ok_s += inp.dt_s;
                } else {
                    self.hold_ok_s = 0.0;
                }
                out.heater_demand_kw = Some(cfg.heater_max_kw);
                if self.hold_ok_s >= cfg.verification_hold_s {
                    out.request_two_phase = true;
                    self.enter(BubblePhase::Drain, &mut out);
                }
            }
            BubblePhase::Drain => {
                // Full heaters grow the dome; CVCS takes the displaced
                // liquid at maximum letdown with charging held back. Mass
                // moves to the VCT/BRS, never out of the books.
                out.heater_demand_kw = Some(cfg.heater_max_kw);
                out.letdown_trim_gpm = 125.0;
                out.charging_hold_gpm = Some(25.0);
                if inp.in_two_phase && inp.pzr_level_pct <= cfg.drain_target_level_pct + 1.0 {
                    self.enter(BubblePhase::Stabilize, &mut out);
                }
            }
            BubblePhase::Stabilize => {
                // Back the heaters down to a hold level and let the regions
                // reach thermal equilibrium at the target level.
                out.heater_demand_kw = Some(0.15 * cfg.heater_max_kw);
                let in_band = (inp.pzr_level_pct - cfg.drain_target_level_pct).abs()
                    <= cfg.stabilize_band_pct;
                if in_band {
                    self.hold_ok_s += inp.dt_s;
                } else {
                    self.hold_ok_s = 0.0;
                }
                if self.hold_ok_s >= cfg.stabilize_hold_s {
                    self.pressurize_pi.reset();
                    self.enter(BubblePhase::Pressurize, &mut out);
                }
            }
            BubblePhase::Pressurize => {
                let error = cfg.pressurize_setpoint_psia - inp.pressure_psia;
                let demand = if error.abs() <= cfg.pressurize_deadband_psi {
                    self.hold_ok_s += inp.dt_s;
                    0.0
                } else {
                    self.hold_ok_s = 0.0;
                    self.pressurize_pi.update(error, inp.dt_s)
                };
                self.heater_cmd_kw = rate_limit(
                    self.heater_cmd_kw,
                    demand,
                    cfg.heater_rate_frac_per_s * cfg.heater_max_kw,
                    inp.dt_s,
                );
                out.heater_demand_kw = Some(self.heater_cmd_kw);
                if self.hold_ok_s >= cfg.pressurize_hold_s {
                    self.enter(BubblePhase::Complete, &mut out);
                }
            }
            BubblePhase::Complete => {}
        }
        out
    }
}

/// Regime-transition conservation contract.
///
/// `reconstructed` is the destination-regime inventory rebuilt from state;
/// `canonical` is the ledger. Returns the signed delta applied back to the
/// boundary accounts, or fails the handoff past the hard limit.
pub fn reconcile(canonical_lb: f64, reconstructed_lb: f64) -> Result<f64, PressureError> {
    let delta = reconstructed_lb - canonical_lb;
    if delta.abs() > RTCC_ERROR_LB {
        return Err(PressureError::RegimeHandoffFailure { delta_lb: delta });
    }
    if delta.abs() > RTCC_WARN_LB {
        tracing::warn!(delta_lb = delta, "regime reconciliation above warning band");
    } else {
        tracing::debug!(delta_lb = delta, "regime reconciliation");
    }
    Ok(delta)
}
