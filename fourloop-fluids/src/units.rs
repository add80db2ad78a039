//! Conversions between plant units (psia, degrees F, lb, ft3, BTU) and SI.

/// Pascals per psi.
pub const PA_PER_PSI: f64 = 6894.757293168;

/// J/kg per BTU/lb (exact by definition of the IT BTU).
pub const J_PER_KG_PER_BTU_PER_LB: f64 = 2326.0;

/// J/(kg K) per BTU/(lb F).
pub const J_PER_KG_K_PER_BTU_PER_LB_F: f64 = 4186.8;

/// kg/m3 per lb/ft3.
pub const KG_M3_PER_LB_FT3: f64 = 16.018463374;

/// Pounds per kilogram.
pub const LB_PER_KG: f64 = 2.2046226218;

/// Cubic feet per cubic metre.
pub const FT3_PER_M3: f64 = 35.314666721;

/// Gallons (US) per cubic foot.
pub const GAL_PER_FT3: f64 = 7.4805194805;

#[inline]
pub fn f_to_k(t_f: f64) -> f64 {
    (t_f - 32.0) / 1.8 + 273.15
}

#[inline]
pub fn k_to_f(t_k: f64) -> f64 {
    (t_k - 273.15) * 1.8 + 32.0
}

#[inline]
pub fn f_to_rankine(t_f: f64) -> f64 {
    t_f + 459.67
}

#[inline]
pub fn psia_to_pa(p_psia: f64) -> f64 {
    p_psia * PA_PER_PSI
}

#[inline]
pub fn pa_to_psia(p_pa: f64) -> f64 {
    p_pa / PA_PER_PSI
}

#[inline]
pub fn kg_m3_to_lb_ft3(rho: f64) -> f64 {
    rho / KG_M3_PER_LB_FT3
}

#[inline]
pub fn j_kg_to_btu_lb(h: f64) -> f64 {
    h / J_PER_KG_PER_BTU_PER_LB
}

#[inline]
pub fn j_kg_k_to_btu_lb_f(cp: f64) -> f64 {
    cp / J_PER_KG_K_PER_BTU_PER_LB_F
}
