//! Coupled pressure-temperature-volume closure for the RCS and pressurizer.
//!
//! Given the loop average temperature and the canonical primary mass, the
//! solver finds the pressure at which the closed system fits its fixed
//! geometric volume. In the two-phase regime the pressurizer water is held
//! at saturation and the energy surplus or deficit of the water region is
//! converted to flash or condensation, which is what keeps an insurge from
//! behaving like dry gas compression. The solver never mutates the mass
//! ledger; it receives the canonical mass and hands it back unchanged.

use crate::error::PressureError;
use fourloop_fluids as fluids;
use serde::{Deserialize, Serialize};

/// Iteration cap.
pub const MAX_ITERATIONS: u32 = 20;

/// Convergence tolerance on pressure, psi.
pub const PRESSURE_TOL_PSI: f64 = 0.1;

/// Inputs to the two-phase closure.
#[derive(Debug, Clone, Copy)]
pub struct TwoPhaseSolveInput {
    pub canonical_mass_lb: f64,
    pub loop_volume_ft3: f64,
    pub pzr_volume_ft3: f64,
    pub t_avg_f: f64,
    /// Pressurizer water-region mass before surge, lb.
    pub water_mass_lb: f64,
    /// Pressurizer steam-region mass, lb.
    pub steam_mass_lb: f64,
    /// Bulk enthalpy of the water region, BTU/lb.
    pub water_enthalpy_btu_lb: f64,
    /// Enthalpy carried by insurge water from the hot leg, BTU/lb.
    pub surge_enthalpy_btu_lb: f64,
    pub p_start_psia: f64,
}

/// Converged two-phase plant state.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct TwoPhaseSolution {
    pub pressure_psia: f64,
    pub t_sat_f: f64,
    pub water_mass_lb: f64,
    pub steam_mass_lb: f64,
    pub water_volume_ft3: f64,
    pub steam_volume_ft3: f64,
    /// Mass moved loop -> pressurizer this solve (negative = outsurge).
    pub surge_lb: f64,
    /// Net phase change inside the pressurizer (positive = flashed).
    pub net_flash_lb: f64,
    /// Loop water mass at the converged pressure, lb.
    pub loop_mass_lb: f64,
    pub iterations: u32,
    /// The ledger value, returned unchanged for consistency checking.
    pub canonical_mass_lb: f64,
}

struct TwoPhaseResidual {
    residual_ft3: f64,
    water_mass_lb: f64,
    steam_mass_lb: f64,
    surge_lb: f64,
    net_flash_lb: f64,
    loop_mass_lb: f64,
    t_sat_f: f64,
}

fn two_phase_residual(input: &TwoPhaseSolveInput, p: f64) -> TwoPhaseResidual {
    let sat = fluids::sat_props(p);
    let loop_mass = input.loop_volume_ft3 * fluids::rho_l(input.t_avg_f, p);
    let pzr_mass_before = input.water_mass_lb + input.steam_mass_lb;
    let surge = input.canonical_mass_lb - loop_mass - pzr_mass_before;

    // Surge enters at hot-leg enthalpy; outsurge leaves at the bulk water
    // enthalpy, so it does not change the remaining water's specific state.
    let m_w1 = (input.water_mass_lb + surge).max(0.0);
    let h_w = if surge >= 0.0 {
        input.water_mass_lb * input.water_enthalpy_btu_lb + surge * input.surge_enthalpy_btu_lb
    } else {
        m_w1 * input.water_enthalpy_btu_lb
    };

    // Restore the water region to saturation: surplus enthalpy flashes to
    // steam, deficit condenses steam back (rainout).
    let excess_btu = h_w - m_w1 * sat.h_f;
    let mut dm = excess_btu / sat.h_fg;
    dm = dm.clamp(-input.steam_mass_lb, m_w1);
    let m_w2 = m_w1 - dm;
    let m_s2 = input.steam_mass_lb + dm;

    let volume = m_w2 / sat.rho_f + m_s2 / sat.rho_g;
    TwoPhaseResidual {
        residual_ft3: volume - input.pzr_volume_ft3,
        water_mass_lb: m_w2,
        steam_mass_lb: m_s2,
        surge_lb: surge,
        net_flash_lb: dm,
        loop_mass_lb: loop_mass,
        t_sat_f: sat.t_sat_f,
    }
}

/// Solve the two-phase closure by secant iteration on pressure.
pub fn solve_two_phase(input: &TwoPhaseSolveInput) -> Result<TwoPhaseSolution, PressureError> {
    let mut p0 = input.p_start_psia;
    let mut r0 = two_phase_residual(input, p0);
    if r0.residual_ft3.abs() < 1e-6 {
        return Ok(finish(input, p0, r0, 1));
    }
    // Volume shrinks with pressure, so step toward closure.
    let mut p1 = p0 + if r0.residual_ft3 > 0.0 { 10.0 } else { -10.0 };
    let mut r1 = two_phase_residual(input, p1);

    for iter in 2..=MAX_ITERATIONS {
        let denom = r1.residual_ft3 - r0.residual_ft3;
        if denom.abs() < 1e-12 {
            return Ok(finish(input, p1, r1, iter));
        }
        let p2 = (p1 - r1.residual_ft3 * (p1 - p0) / denom)
            .clamp(fluids::P_MIN_PSIA, fluids::P_MAX_PSIA);
        let r2 = two_phase_residual(input, p2);
        if (p2 - p1).abs() < PRESSURE_TOL_PSI {
            return Ok(finish(input, p2, r2, iter));
        }
        p0 = p1;
        r0 = r1;
        p1 = p2;
        r1 = r2;
    }

    Err(PressureError::SolverNonConvergence {
        iterations: MAX_ITERATIONS,
        residual: r1.residual_ft3,
    })
}

fn finish(
    input: &TwoPhaseSolveInput,
    p: f64,
    r: TwoPhaseResidual,
    iterations: u32,
) -> TwoPhaseSolution {
    let sat = fluids::sat_props(p);
    // Geometric closure is exact by construction: the water volume follows
    // the converged density and steam absorbs the residual.
    let water_volume = r.water_mass_lb / sat.rho_f;
    TwoPhaseSolution {
        pressure_psia: p,
        t_sat_f: r.t_sat_f,
        water_mass_lb: r.water_mass_lb,
        steam_mass_lb: r.steam_mass_lb,
        water_volume_ft3: water_volume,
        steam_volume_ft3: input.pzr_volume_ft3 - water_volume,
        surge_lb: r.surge_lb,
        net_flash_lb: r.net_flash_lb,
        loop_mass_lb: r.loop_mass_lb,
        iterations,
        canonical_mass_lb: input.canonical_mass_lb,
    }
}

/// Inputs to the all-liquid (solid plant) closure.
#[derive(Debug, Clone, Copy)]
pub struct SolidSolveInput {
    pub canonical_mass_lb: f64,
    pub loop_volume_ft3: f64,
    pub pzr_volume_ft3: f64,
    pub t_avg_f: f64,
    /// Pressurizer water temperature; lags the loop through the surge line.
    pub t_pzr_f: f64,
    pub p_start_psia: f64,
}

/// Converged solid-plant state.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct SolidSolution {
    pub pressure_psia: f64,
    pub loop_mass_lb: f64,
    pub pzr_water_mass_lb: f64,
    /// Mass moved loop -> pressurizer relative to `prior_pzr_mass_lb`.
    pub surge_lb: f64,
    pub iterations: u32,
    pub canonical_mass_lb: f64,
}

/// Solve the all-liquid closure: the whole primary is one compressible
/// water volume, so small mass or temperature changes move pressure fast.
pub fn solve_solid(
    input: &SolidSolveInput,
    prior_pzr_mass_lb: f64,
) -> Result<SolidSolution, PressureError> {
    let residual = |p: f64| -> f64 {
        input.loop_volume_ft3 * fluids::rho_l(input.t_avg_f, p)
            + input.pzr_volume_ft3 * fluids::rho_l(input.t_pzr_f, p)
            - input.canonical_mass_lb
    };

    let mut p0 = input.p_start_psia;
    let mut r0 = residual(p0);
    let mut p1 = p0 + if r0 > 0.0 { -10.0 } else { 10.0 };
    let mut r1 = residual(p1);

    let mut iterations = 1;
    for iter in 2..=MAX_ITERATIONS {
        iterations = iter;
        let denom = r1 - r0;
        if denom.abs() < 1e-12 {
            break;
        }
        let p2 = (p1 - r1 * (p1 - p0) / denom).clamp(fluids::P_MIN_PSIA, fluids::P_MAX_PSIA);
        let r2 = residual(p2);
        let converged = (p2 - p1).abs() < PRESSURE_TOL_PSI;
        p0 = p1;
        r0 = r1;
        p1 = p2;
        r1 = r2;
        if converged {
            break;
        }
    }

    if r1.abs() > 50.0 && iterations >= MAX_ITERATIONS {
        return Err(PressureError::SolverNonConvergence {
            iterations,
            residual: r1,
        });
    }

    let pzr_mass = input.pzr_volume_ft3 * fluids::rho_l(input.t_pzr_f, p1);
    Ok(SolidSolution {
        pressure_psia: p1,
        loop_mass_lb: input.loop_volume_ft3 * fluids::rho_l(input.t_avg_f, p1),
        pzr_water_mass_lb: pzr_mass,
        surge_lb: pzr_mass - prior_pzr_mass_lb,
        iterations,
        canonical_mass_lb: input.canonical_mass_lb,
    })
}

/// Free thermal expansion of the loop at fixed pressure, ft3. The coupled
/// solution always displaces less than this.
pub fn uncoupled_expansion_ft3(t_avg_f: f64, p_psia: f64, dt_f: f64, loop_volume_ft3: f64) -> f64 {
    loop_volume_ft3 * fluids::beta(t_avg_f, p_psia) * dt_f
}

/// Dry-compression pressure-rise estimate: the expansion volume pushed into
/// the steam space with no condensation. Upper bound on the coupled answer.
pub fn uncoupled_dp_estimate_psi(
    t_avg_f: f64,
    p_psia: f64,
    dt_f: f64,
    loop_volume_ft3: f64,
    steam_volume_ft3: f64,
) -> f64 {
    let dv = uncoupled_expansion_ft3(t_avg_f, p_psia, dt_f, loop_volume_ft3);
    p_psia * dv / steam_volume_ft3.max(1.0)
}
