//! Aggregated steam-generator secondary side.

use fourloop_fluids as fluids;
use serde::{Deserialize, Serialize};

/// Atmospheric pressure floor for the secondary shell, psia.
const P_ATMOSPHERIC: f64 = 14.696;

/// Auxiliary secondary heating policy during heatup and hot-standby hold.
///
/// The conservative default is `PassiveOnly`: the secondary heats only
/// through the tubes, so primary and secondary never fully equalize during
/// a heatup and the hot-standby secondary stays far below no-load pressure.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
pub enum AuxHeatPolicy {
    #[default]
    PassiveOnly,
    /// Operator-set secondary temperature target, F.
    OperatorSetpoint(f64),
    /// Track the primary average temperature.
    AutoTrack,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SgRegime {
    Subcooled,
    Boiling,
    SteamDump,
}

/// Aggregate-SG geometry and coefficients (4 units summed).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SgConfig {
    /// Total secondary shell volume, ft3.
    pub secondary_volume_ft3: f64,
    /// Tube-bundle conductance at rated primary flow, BTU/(hr F).
    pub ua_rated: f64,
    /// Secondary metal mass participating in heatup, lb.
    pub metal_mass_lb: f64,
    pub metal_cp: f64,
    /// Stagnant-shell conductance factor before nucleate boiling starts.
    /// A subcooled, unmixed secondary stratifies and moves little heat.
    pub subcooled_ua_factor: f64,
    /// Bundle conductance ceiling under natural circulation, BTU/(hr F);
    /// without forced primary flow the tube-side film is the bottleneck.
    pub natural_circ_ua: f64,
    /// Rated turbine steam draw at full demand, lb/hr.
    pub turbine_rated_steam_lb_hr: f64,
    /// Steam vent capacity with bypass valves full open, lb/hr.
    pub vent_capacity_lb_hr: f64,
    /// Bypass/MSIV pressure setpoint while venting, psia.
    pub vent_setpoint_psia: f64,
    /// Proportional band above the setpoint for full vent, psi.
    pub vent_band_psi: f64,
    /// Auxiliary heating capacity when a policy enables it, BTU/hr.
    pub aux_heat_capacity_btu_hr: f64,
    pub aux_heat_policy: AuxHeatPolicy,
}

impl Default for SgConfig {
    fn default() -> Self {
        Self {
            secondary_volume_ft3: 23_760.0,
            ua_rated: 1.94e8,
            metal_mass_lb: 1.4e6,
            metal_cp: 0.12,
            subcooled_ua_factor: 5.0e-5,
            natural_circ_ua: 7.0e5,
            turbine_rated_steam_lb_hr: 1.73e7,
            vent_capacity_lb_hr: 6.0e6,
            vent_setpoint_psia: 1092.0,
            vent_band_psi: 50.0,
            aux_heat_capacity_btu_hr: 3.4e7,
            aux_heat_policy: AuxHeatPolicy::PassiveOnly,
        }
    }
}

/// Secondary-side state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SgState {
    pub regime: SgRegime,
    pub water_mass_lb: f64,
    pub steam_mass_lb: f64,
    pub secondary_temp_f: f64,
    pub secondary_pressure_psia: f64,
    /// All steam outlets shut (MSIVs and bypass).
    pub outlets_closed: bool,
    /// Dump-valve opening while in SteamDump, 0..1.
    pub dump_open_frac: f64,
}

impl SgState {
    /// Cold, wet-layup secondary at the given temperature.
    pub fn cold(cfg: &SgConfig, temp_f: f64, fill_frac: f64) -> Self {
        let rho = fluids::rho_l(temp_f, P_ATMOSPHERIC.max(fluids::p_sat(temp_f)));
        Self {
            regime: SgRegime::Subcooled,
            water_mass_lb: cfg.secondary_volume_ft3 * fill_frac * rho,
            steam_mass_lb: 0.0,
            secondary_temp_f: temp_f,
            secondary_pressure_psia: P_ATMOSPHERIC.max(fluids::p_sat(temp_f)),
            outlets_closed: false,
            dump_open_frac: 0.0,
        }
    }

    /// Saturated boiling secondary at `p_psia` with the given water fill.
    pub fn saturated(cfg: &SgConfig, p_psia: f64, fill_frac: f64) -> Self {
        let sat = fluids::sat_props(p_psia);
        let v_w = cfg.secondary_volume_ft3 * fill_frac;
        Self {
            regime: SgRegime::Boiling,
            water_mass_lb: v_w * sat.rho_f,
            steam_mass_lb: (cfg.secondary_volume_ft3 - v_w) * sat.rho_g,
            secondary_temp_f: sat.t_sat_f,
            secondary_pressure_psia: p_psia,
            outlets_closed: false,
            dump_open_frac: 0.0,
        }
    }
}

/// Per-step boundary conditions.
#[derive(Debug, Clone, Copy)]
pub struct SgInputs {
    /// Primary-side average tube temperature, F.
    pub t_primary_f: f64,
    /// Primary flow, fraction of rated (degrades tube conductance).
    pub primary_flow_frac: f64,
    /// Turbine steam demand, fraction of rated draw.
    pub turbine_demand_frac: f64,
    /// Request the steam-dump hold regime.
    pub steam_dump_requested: bool,
    pub dt_s: f64,
}

/// Per-step results for the coordinator's energy and mass books.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct SgOutputs {
    /// Heat removed from the primary, BTU.
    pub q_primary_btu: f64,
    /// Steam vented from the secondary, lb.
    pub steam_out_lb: f64,
    /// Feedwater makeup added, lb.
    pub feed_in_lb: f64,
    /// Auxiliary heat added to the secondary, BTU.
    pub q_aux_btu: f64,
    pub regime_change: Option<(SgRegime, SgRegime)>,
}

/// Saturated closed-vessel closure: distribute (water, steam) at pressure
/// `p` after adding `q_btu`, returning the volume residual.
fn boiling_residual(
    state: &SgState,
    cfg: &SgConfig,
    h_total: f64,
    p: f64,
) -> (f64, f64, f64, f64) {
    let sat = fluids::sat_props(p);
    let m_total_w = state.water_mass_lb;
    let excess = h_total - m_total_w * sat.h_f;
    let mut dm = excess / sat.h_fg;
    dm = dm.clamp(-state.steam_mass_lb, m_total_w);
    let m_w = m_total_w - dm;
    let m_s = state.steam_mass_lb + dm;
    let volume = m_w / sat.rho_f + m_s / sat.rho_g;
    (volume - cfg.secondary_volume_ft3, m_w, m_s, sat.t_sat_f)
}

fn solve_boiling(state: &mut SgState, cfg: &SgConfig, q_btu: f64) {
    let h_w = fluids::h_l(state.secondary_temp_f, state.secondary_pressure_psia);
    let h_total = state.water_mass_lb * h_w + q_btu;

    // The volume residual is monotone decreasing in pressure, so bracket
    // then bisect; the bracket expansion covers large single-step heat
    // additions without losing monotonicity.
    let mut lo = P_ATMOSPHERIC;
    let (r_lo, ..) = boiling_residual(state, cfg, h_total, lo);
    if r_lo <= 0.0 {
        // Quenched below atmospheric saturation; pin at the floor.
        let (_, m_w, m_s, t) = boiling_residual(state, cfg, h_total, lo);
        state.secondary_pressure_psia = lo;
        state.water_mass_lb = m_w;
        state.steam_mass_lb = m_s;
        state.secondary_temp_f = t;
        return;
    }
    let mut hi = (state.secondary_pressure_psia * 2.0).max(40.0);
    for _ in 0..10 {
        let (r, ..) = boiling_residual(state, cfg, h_total, hi);
        if r < 0.0 || hi >= fluids::P_MAX_PSIA {
            break;
        }
        hi = (hi * 2.0).min(fluids::P_MAX_PSIA);
    }
    for _ in 0..40 {
        let mid = 0.5 * (lo + hi);
        let (r, ..) = boiling_residual(state, cfg, h_total, mid);
        if r > 0.0 {
            lo = mid;
        } else {
            hi = mid;
        }
        if hi - lo < 0.02 {
            break;
        }
    }
    let p = 0.5 * (lo + hi);
    let (_, m_w, m_s, t) = boiling_residual(state, cfg, h_total, p);
    state.secondary_pressure_psia = p;
    state.water_mass_lb = m_w;
    state.steam_mass_lb = m_s;
    state.secondary_temp_f = t;
}

/// Advance the aggregated secondary by one step.
pub fn update(state: &mut SgState, cfg: &SgConfig, inp: &SgInputs) -> SgOutputs {
    let dt = inp.dt_s;
    let mut out = SgOutputs::default();
    let regime_before = state.regime;

    // Primary-to-secondary heat through the tube bundle. A stagnant
    // subcooled shell stratifies and takes almost nothing; nucleate
    // boiling restores the design conductance.
    let boiling_side = state.regime != SgRegime::Subcooled;
    let shell_factor = if boiling_side {
        1.0
    } else {
        cfg.subcooled_ua_factor
    };
    let mut ua = cfg.ua_rated * shell_factor * inp.primary_flow_frac.clamp(0.05, 1.2).powf(0.8);
    if inp.primary_flow_frac < 0.15 {
        ua = ua.min(cfg.natural_circ_ua);
    }
    let q = ua * (inp.t_primary_f - state.secondary_temp_f) / 3600.0 * dt;
    out.q_primary_btu = q;

    // Auxiliary heating per policy.
    let aux_wanted = match cfg.aux_heat_policy {
        AuxHeatPolicy::PassiveOnly => 0.0,
        AuxHeatPolicy::OperatorSetpoint(t_set) => {
            if state.secondary_temp_f < t_set {
                cfg.aux_heat_capacity_btu_hr
            } else {
                0.0
            }
        }
        AuxHeatPolicy::AutoTrack => {
            if state.secondary_temp_f < inp.t_primary_f - 5.0 {
                cfg.aux_heat_capacity_btu_hr
            } else {
                0.0
            }
        }
    };
    out.q_aux_btu = aux_wanted / 3600.0 * dt;
    let q_total = q + out.q_aux_btu;

    match state.regime {
        SgRegime::Subcooled => {
            // Sensible heatup against water plus shell metal.
            let cp = fluids::cp_l(state.secondary_temp_f, state.secondary_pressure_psia);
            let capacity = state.water_mass_lb * cp + cfg.metal_mass_lb * cfg.metal_cp;
            state.secondary_temp_f += q_total / capacity;
            state.secondary_pressure_psia =
                P_ATMOSPHERIC.max(fluids::p_sat(state.secondary_temp_f));
            if state.secondary_temp_f >= 212.0 {
                state.regime = SgRegime::Boiling;
            }
        }
        SgRegime::Boiling | SgRegime::SteamDump => {
            let q_kettle = q_total;
            solve_boiling(state, cfg, q_kettle);

            // Steam relief path: turbine draw, dump matching, or bypass.
            if !state.outlets_closed {
                let sat = fluids::sat_props(state.secondary_pressure_psia);
                let turbine_lb =
                    cfg.turbine_rated_steam_lb_hr / 3600.0 * dt * inp.turbine_demand_frac.clamp(0.0, 1.2);
                // Bypass modulates above the no-load setpoint in every
                // regime; the dump's heat-matching only engages once the
                // secondary is up at program pressure, so a tripped plant
                // first rides its pressure up and chokes the delta-T.
                let over = state.secondary_pressure_psia - cfg.vent_setpoint_psia;
                let bypass_frac = (over / cfg.vent_band_psi).clamp(0.0, 1.0);
                let bypass_lb = cfg.vent_capacity_lb_hr / 3600.0 * dt * bypass_frac;
                let dump_armed = (state.regime == SgRegime::SteamDump
                    || inp.steam_dump_requested)
                    && state.secondary_pressure_psia >= 0.95 * cfg.vent_setpoint_psia;
                let vent_lb = if dump_armed {
                    let matched = q_kettle.max(0.0) / sat.h_fg;
                    state.dump_open_frac = (matched
                        / (cfg.vent_capacity_lb_hr / 3600.0 * dt).max(1e-9))
                    .clamp(0.0, 1.0);
                    (matched.max(bypass_lb) + turbine_lb).min(state.steam_mass_lb)
                } else {
                    state.dump_open_frac = 0.0;
                    (bypass_lb + turbine_lb).min(state.steam_mass_lb)
                };
                if vent_lb > 0.0 {
                    state.steam_mass_lb -= vent_lb;
                    out.steam_out_lb = vent_lb;
                    // Feedwater holds secondary inventory while steaming.
                    state.water_mass_lb += vent_lb;
                    out.feed_in_lb = vent_lb;
                }
            }

            let requested = if inp.steam_dump_requested {
                SgRegime::SteamDump
            } else {
                SgRegime::Boiling
            };
            state.regime = requested;
            // Collapse back to subcooled if the kettle is quenched.
            if state.steam_mass_lb <= 0.0 && state.secondary_temp_f < 212.0 {
                state.regime = SgRegime::Subcooled;
                state.steam_mass_lb = 0.0;
            }
        }
    }

    if state.regime != regime_before {
        tracing::info!(?regime_before, regime = ?state.regime, "steam generator regime change");
        out.regime_change = Some((regime_before, state.regime));
    }
    out
}
