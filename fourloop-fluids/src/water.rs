//! Water and steam properties in plant units.
//!
//! The validated band is 1..3000 psia and 100..705 F. Queries outside the
//! band are clamped to the boundary and logged; the `checked_` variants
//! return [`PropertyError`] instead. Liquid properties above 662 F use the
//! region-1 form extrapolated toward the critical point; accuracy degrades
//! there and callers holding the plant inside normal operating envelopes
//! never see it.

use crate::error::PropertyError;
use crate::if97;
use crate::units;

/// Lower validated pressure bound, psia.
pub const P_MIN_PSIA: f64 = 1.0;
/// Upper validated pressure bound, psia.
pub const P_MAX_PSIA: f64 = 3000.0;
/// Lower validated temperature bound, F.
pub const T_MIN_F: f64 = 100.0;
/// Upper validated temperature bound, F.
pub const T_MAX_F: f64 = 705.0;

fn check_p(p_psia: f64) -> Result<f64, PropertyError> {
    if !p_psia.is_finite() {
        return Err(PropertyError::NonFinite {
            var: "pressure_psia",
            value: p_psia,
        });
    }
    if p_psia < P_MIN_PSIA || p_psia > P_MAX_PSIA {
        return Err(PropertyError::out_of_range(
            "pressure_psia",
            p_psia,
            P_MIN_PSIA,
            P_MAX_PSIA,
        ));
    }
    Ok(units::psia_to_pa(p_psia))
}

fn check_t(t_f: f64) -> Result<f64, PropertyError> {
    if !t_f.is_finite() {
        return Err(PropertyError::NonFinite {
            var: "temperature_f",
            value: t_f,
        });
    }
    if t_f < T_MIN_F || t_f > T_MAX_F {
        return Err(PropertyError::out_of_range(
            "temperature_f",
            t_f,
            T_MIN_F,
            T_MAX_F,
        ));
    }
    Ok(units::f_to_k(t_f))
}

fn clamp_p(p_psia: f64) -> f64 {
    let clamped = p_psia.clamp(P_MIN_PSIA, P_MAX_PSIA);
    if clamped != p_psia {
        tracing::warn!(p_psia, clamped, "pressure outside property band, clamped");
    }
    units::psia_to_pa(clamped)
}

fn clamp_t(t_f: f64) -> f64 {
    let clamped = t_f.clamp(T_MIN_F, T_MAX_F);
    if clamped != t_f {
        tracing::warn!(t_f, clamped, "temperature outside property band, clamped");
    }
    units::f_to_k(clamped)
}

/// Saturation temperature (F) at `p_psia`.
pub fn t_sat(p_psia: f64) -> f64 {
    units::k_to_f(if97::t_sat(clamp_p(p_psia)))
}

/// Saturation pressure (psia) at `t_f`.
pub fn p_sat(t_f: f64) -> f64 {
    units::pa_to_psia(if97::p_sat(clamp_t(t_f)))
}

/// Compressed-liquid density (lb/ft3) at (`t_f`, `p_psia`).
pub fn rho_l(t_f: f64, p_psia: f64) -> f64 {
    let (t, p) = (clamp_t(t_f), clamp_p(p_psia));
    units::kg_m3_to_lb_ft3(1.0 / if97::v_region1(t, p))
}

/// Saturated-steam density (lb/ft3) at `p_psia`.
pub fn rho_v(p_psia: f64) -> f64 {
    let p = clamp_p(p_psia);
    let t = if97::t_sat(p);
    units::kg_m3_to_lb_ft3(1.0 / if97::v_region2(t, p))
}

/// Compressed-liquid specific enthalpy (BTU/lb) at (`t_f`, `p_psia`).
pub fn h_l(t_f: f64, p_psia: f64) -> f64 {
    let (t, p) = (clamp_t(t_f), clamp_p(p_psia));
    units::j_kg_to_btu_lb(if97::h_region1(t, p))
}

/// Saturated-steam specific enthalpy (BTU/lb) at `p_psia`.
pub fn h_g(p_psia: f64) -> f64 {
    let p = clamp_p(p_psia);
    let t = if97::t_sat(p);
    units::j_kg_to_btu_lb(if97::h_region2(t, p))
}

/// Latent heat of vaporization (BTU/lb) at `p_psia`.
pub fn h_fg(p_psia: f64) -> f64 {
    let p = clamp_p(p_psia);
    let t = if97::t_sat(p);
    units::j_kg_to_btu_lb(if97::h_region2(t, p) - if97::h_region1(t, p))
}

/// Liquid isobaric specific heat (BTU/(lb F)) at (`t_f`, `p_psia`).
pub fn cp_l(t_f: f64, p_psia: f64) -> f64 {
    let (t, p) = (clamp_t(t_f), clamp_p(p_psia));
    units::j_kg_k_to_btu_lb_f(if97::cp_region1(t, p))
}

/// Steam isobaric specific heat (BTU/(lb F)) at (`t_f`, `p_psia`).
pub fn cp_v(t_f: f64, p_psia: f64) -> f64 {
    let (t, p) = (clamp_t(t_f), clamp_p(p_psia));
    units::j_kg_k_to_btu_lb_f(if97::cp_region2(t, p))
}

/// Liquid volumetric thermal-expansion coefficient (1/F).
pub fn beta(t_f: f64, p_psia: f64) -> f64 {
    let (t, p) = (clamp_t(t_f), clamp_p(p_psia));
    if97::beta_region1(t, p) / 1.8
}

/// Liquid isothermal compressibility (1/psi).
pub fn kappa(t_f: f64, p_psia: f64) -> f64 {
    let (t, p) = (clamp_t(t_f), clamp_p(p_psia));
    if97::kappa_region1(t, p) * units::PA_PER_PSI
}

/// Checked variant of [`t_sat`].
pub fn t_sat_checked(p_psia: f64) -> Result<f64, PropertyError> {
    Ok(units::k_to_f(if97::t_sat(check_p(p_psia)?)))
}

/// Checked variant of [`p_sat`].
pub fn p_sat_checked(t_f: f64) -> Result<f64, PropertyError> {
    Ok(units::pa_to_psia(if97::p_sat(check_t(t_f)?)))
}

/// Checked variant of [`rho_l`].
pub fn rho_l_checked(t_f: f64, p_psia: f64) -> Result<f64, PropertyError> {
    let (t, p) = (check_t(t_f)?, check_p(p_psia)?);
    Ok(units::kg_m3_to_lb_ft3(1.0 / if97::v_region1(t, p)))
}

/// Checked variant of [`h_l`].
pub fn h_l_checked(t_f: f64, p_psia: f64) -> Result<f64, PropertyError> {
    let (t, p) = (check_t(t_f)?, check_p(p_psia)?);
    Ok(units::j_kg_to_btu_lb(if97::h_region1(t, p)))
}

/// Whether `(t_f, p_psia)` lies inside the validated band.
pub fn in_band(t_f: f64, p_psia: f64) -> bool {
    (T_MIN_F..=T_MAX_F).contains(&t_f) && (P_MIN_PSIA..=P_MAX_PSIA).contains(&p_psia)
}

/// Saturation-line property pack at a single pressure.
///
/// Batches the queries the two-phase pressurizer makes every step so the
/// saturation temperature is computed once.
#[derive(Debug, Clone, Copy)]
pub struct SatProps {
    pub p_psia: f64,
    pub t_sat_f: f64,
    /// Saturated-liquid density, lb/ft3.
    pub rho_f: f64,
    /// Saturated-steam density, lb/ft3.
    pub rho_g: f64,
    /// Saturated-liquid enthalpy, BTU/lb.
    pub h_f: f64,
    /// Saturated-steam enthalpy, BTU/lb.
    pub h_g: f64,
    /// Latent heat, BTU/lb.
    pub h_fg: f64,
}

/// Evaluate the full saturation pack at `p_psia`.
pub fn sat_props(p_psia: f64) -> SatProps {
    let p = clamp_p(p_psia);
    let t = if97::t_sat(p);
    let h_f = if97::h_region1(t, p);
    let h_g = if97::h_region2(t, p);
    SatProps {
        p_psia: units::pa_to_psia(p),
        t_sat_f: units::k_to_f(t),
        rho_f: units::kg_m3_to_lb_ft3(1.0 / if97::v_region1(t, p)),
        rho_g: units::kg_m3_to_lb_ft3(1.0 / if97::v_region2(t, p)),
        h_f: units::j_kg_to_btu_lb(h_f),
        h_g: units::j_kg_to_btu_lb(h_g),
        h_fg: units::j_kg_to_btu_lb(h_g - h_f),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    // Steam-table anchors (ASME units). Tolerance is the crate accuracy
    // target of 1 percent.

    #[test]
    fn saturation_at_atmospheric() {
        assert_relative_eq!(t_sat(14.696), 212.0, max_relative = 0.01);
        assert_relative_eq!(p_sat(212.0), 14.696, max_relative = 0.01);
    }

    #[test]
    fn saturation_at_operating_pressure() {
        // T_sat at 2250 psia is about 652.9 F.
        let t = t_sat(2250.0);
        assert!((651.0..655.0).contains(&t), "t_sat(2250) = {t}");
        // And at 1000 psia about 544.6 F.
        let t = t_sat(1000.0);
        assert!((543.0..546.5).contains(&t), "t_sat(1000) = {t}");
    }

    #[test]
    fn liquid_density_anchors() {
        // Cold water: ~62 lb/ft3 at 100 F.
        assert_relative_eq!(rho_l(100.0, 400.0), 62.0, max_relative = 0.01);
        // Hot-leg conditions: ~41.1 lb/ft3 at 619 F, 2250 psia.
        assert_relative_eq!(rho_l(619.0, 2250.0), 41.1, max_relative = 0.02);
    }

    #[test]
    fn steam_density_at_operating_pressure() {
        // Saturated steam at 2250 psia: ~6.3 lb/ft3.
        assert_relative_eq!(rho_v(2250.0), 6.3, max_relative = 0.05);
    }

    #[test]
    fn latent_heat_shrinks_toward_critical() {
        assert!(h_fg(100.0) > h_fg(1000.0));
        assert!(h_fg(1000.0) > h_fg(2500.0));
        assert!(h_fg(2500.0) > 0.0);
    }

    #[test]
    fn enthalpy_anchor_cold_and_hot() {
        // h_f at 212 F is ~180 BTU/lb.
        assert_relative_eq!(h_l(212.0, 14.696), 180.2, max_relative = 0.01);
        // h_g at 2250 psia is ~1115 BTU/lb.
        assert_relative_eq!(h_g(2250.0), 1115.0, max_relative = 0.015);
    }

    #[test]
    fn cp_rises_with_temperature() {
        assert!(cp_l(600.0, 2250.0) > cp_l(200.0, 2250.0));
        // ~1.0 BTU/(lb F) at low temperature.
        assert_relative_eq!(cp_l(150.0, 400.0), 1.0, max_relative = 0.02);
    }

    #[test]
    fn expansion_and_compressibility_signs() {
        let b = beta(557.0, 2250.0);
        let k = kappa(557.0, 2250.0);
        assert!(b > 0.0 && b < 2e-3, "beta = {b}");
        assert!(k > 0.0 && k < 1e-4, "kappa = {k}");
    }

    #[test]
    fn out_of_band_clamps() {
        // Clamped query equals the boundary query.
        assert_eq!(t_sat(0.1), t_sat(P_MIN_PSIA));
        assert_eq!(rho_l(50.0, 2250.0), rho_l(T_MIN_F, 2250.0));
    }

    #[test]
    fn checked_variants_reject() {
        assert!(t_sat_checked(0.1).is_err());
        assert!(t_sat_checked(2250.0).is_ok());
        assert!(rho_l_checked(50.0, 2250.0).is_err());
        assert!(h_l_checked(f64::NAN, 2250.0).is_err());
    }

    #[test]
    fn sat_pack_is_consistent() {
        let s = sat_props(2250.0);
        assert_relative_eq!(s.h_fg, s.h_g - s.h_f, epsilon = 1e-9);
        assert!(s.rho_f > s.rho_g);
        assert_relative_eq!(s.t_sat_f, t_sat(2250.0), epsilon = 1e-9);
    }
}
