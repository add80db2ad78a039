//! RCS loop temperature integration.
//!
//! One lumped loop node: core heat, pump heat and pressurizer surge-line
//! return against steam-generator removal and insulation losses, over the
//! water plus participating metal heat capacity. Hot- and cold-leg
//! temperatures are reconstructed from the transported power and flow.

use fourloop_fluids as fluids;

/// Per-step energy terms, BTU. Positive adds to the loop.
#[derive(Debug, Clone, Copy, Default)]
pub struct LoopEnergy {
    pub q_core_btu: f64,
    pub q_pumps_btu: f64,
    pub q_sg_btu: f64,
    pub q_ambient_btu: f64,
    /// Net enthalpy carried by surge flow out of the loop (insurge > 0
    /// removes hot water from the loop side).
    pub q_surge_btu: f64,
}

impl LoopEnergy {
    pub fn net_btu(&self) -> f64 {
        self.q_core_btu + self.q_pumps_btu - self.q_sg_btu - self.q_ambient_btu - self.q_surge_btu
    }
}

/// Integrate the loop average temperature.
pub fn advance_t_avg(
    t_avg_f: f64,
    energy: &LoopEnergy,
    loop_water_mass_lb: f64,
    metal_mass_lb: f64,
    metal_cp: f64,
    pressure_psia: f64,
) -> f64 {
    let cp = fluids::cp_l(t_avg_f, pressure_psia);
    let capacity = loop_water_mass_lb * cp + metal_mass_lb * metal_cp;
    t_avg_f + energy.net_btu() / capacity
}

/// Design hot-to-cold split at rated power and rated flow, F.
pub const LOOP_DT_RATED_F: f64 = 60.0;

/// Split average temperature into hot and cold legs. The split is anchored
/// to the design full-power delta-T and scales with transported power over
/// flow.
pub fn leg_temperatures(t_avg_f: f64, power_frac: f64, flow_frac: f64) -> (f64, f64) {
    if flow_frac < 0.01 {
        return (t_avg_f, t_avg_f);
    }
    let dt = (LOOP_DT_RATED_F * power_frac.max(0.0) / flow_frac).clamp(0.0, 120.0);
    (t_avg_f + 0.5 * dt, t_avg_f - 0.5 * dt)
}
