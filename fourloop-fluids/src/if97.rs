//! IAPWS-IF97 fundamental equations, regions 1, 2 and 4, evaluated in SI.
//!
//! Region 1 covers compressed liquid, region 2 superheated and saturated
//! steam, region 4 the saturation line. All inputs are kelvin and pascal;
//! unit conversion to plant units happens in [`crate::water`]. Coefficient
//! tables are transcribed from the 2007 revised release of IAPWS-IF97.

/// Specific gas constant of ordinary water, J/(kg K).
pub const R_WATER: f64 = 461.526;

/// Critical temperature, K.
pub const T_CRIT: f64 = 647.096;

/// Critical pressure, Pa.
pub const P_CRIT: f64 = 22.064e6;

/// Upper temperature bound of region 1; the liquid form is extrapolated
/// above this up to the critical temperature.
pub const T_REGION1_MAX: f64 = 623.15;

// ---------------------------------------------------------------------------
// Region 4: saturation line
// ---------------------------------------------------------------------------

const N4: [f64; 10] = [
    1167.0521452767,
    -724213.16703206,
    -17.073846940092,
    12020.82470247,
    -3232555.0322333,
    14.91510861353,
    -4823.2657361591,
    405113.40542057,
    -0.23855557567849,
    650.17534844798,
];

/// Saturation pressure (Pa) at temperature `t` (K).
pub fn p_sat(t: f64) -> f64 {
    let theta = t + N4[8] / (t - N4[9]);
    let a = theta * theta + N4[0] * theta + N4[1];
    let b = N4[2] * theta * theta + N4[3] * theta + N4[4];
    let c = N4[5] * theta * theta + N4[6] * theta + N4[7];
    let frac = 2.0 * c / (-b + (b * b - 4.0 * a * c).sqrt());
    frac.powi(4) * 1.0e6
}

/// Saturation temperature (K) at pressure `p` (Pa).
pub fn t_sat(p: f64) -> f64 {
    let beta = (p / 1.0e6).powf(0.25);
    let e = beta * beta + N4[2] * beta + N4[5];
    let f = N4[0] * beta * beta + N4[3] * beta + N4[6];
    let g = N4[1] * beta * beta + N4[4] * beta + N4[7];
    let d = 2.0 * g / (-f - (f * f - 4.0 * e * g).sqrt());
    let half = N4[9] + d;
    (half - (half * half - 4.0 * (N4[8] + N4[9] * d)).sqrt()) * 0.5
}

// ---------------------------------------------------------------------------
// Region 1: compressed liquid
// ---------------------------------------------------------------------------

const I1: [i32; 34] = [
    0, 0, 0, 0, 0, 0, 0, 0, 1, 1, 1, 1, 1, 1, 2, 2, 2, 2, 2, 3, 3, 3, 4, 4, 4, 5, 8, 8, 21, 23,
    29, 30, 31, 32,
];
const J1: [i32; 34] = [
    -2, -1, 0, 1, 2, 3, 4, 5, -9, -7, -1, 0, 1, 3, -3, 0, 1, 3, 17, -4, 0, 6, -5, -2, 10, -8,
    -11, -6, -29, -31, -38, -39, -40, -41,
];
const N1: [f64; 34] = [
    0.14632971213167,
    -0.84548187169114,
    -3.756360367204,
    3.3855169168385,
    -0.95791963387872,
    0.15772038513228,
    -0.016616417199501,
    8.1214629983568e-4,
    2.8319080123804e-4,
    -6.0706301565874e-4,
    -0.018990068218419,
    -0.032529748770505,
    -0.021841717175414,
    -5.283835796993e-5,
    -4.7184321073267e-4,
    -3.0001780793026e-4,
    4.7661393906987e-5,
    -4.4141845330846e-6,
    -7.2694996297594e-16,
    -3.1679644845054e-5,
    -2.8270797985312e-6,
    -8.5205128120103e-10,
    -2.2425281908e-6,
    -6.5171222895601e-7,
    -1.4341729937924e-13,
    -4.0516996860117e-7,
    -1.2734301741641e-9,
    -1.7424871230634e-10,
    -6.8762131295531e-19,
    1.4478307828521e-20,
    2.6335781662795e-23,
    -1.1947622640071e-23,
    1.8228094581404e-24,
    -9.3537087292458e-26,
];

const R1_P_STAR: f64 = 16.53e6;
const R1_T_STAR: f64 = 1386.0;

/// Dimensionless Gibbs derivatives for region 1 at (pi, tau).
struct Gibbs1 {
    g_pi: f64,
    g_pipi: f64,
    g_tau: f64,
    g_tautau: f64,
    g_pitau: f64,
}

fn gibbs1(pi: f64, tau: f64) -> Gibbs1 {
    let x = 7.1 - pi;
    let y = tau - 1.222;
    let mut g = Gibbs1 {
        g_pi: 0.0,
        g_pipi: 0.0,
        g_tau: 0.0,
        g_tautau: 0.0,
        g_pitau: 0.0,
    };
    for k in 0..34 {
        let i = I1[k];
        let j = J1[k];
        let n = N1[k];
        let xi = x.powi(i);
        let yj = y.powi(j);
        let fi = f64::from(i);
        let fj = f64::from(j);
        g.g_pi += -n * fi * x.powi(i - 1) * yj;
        g.g_pipi += n * fi * (fi - 1.0) * x.powi(i - 2) * yj;
        g.g_tau += n * xi * fj * y.powi(j - 1);
        g.g_tautau += n * xi * fj * (fj - 1.0) * y.powi(j - 2);
        g.g_pitau += -n * fi * x.powi(i - 1) * fj * y.powi(j - 1);
    }
    g
}

/// Specific volume (m3/kg) of compressed liquid at (t K, p Pa).
pub fn v_region1(t: f64, p: f64) -> f64 {
    let pi = p / R1_P_STAR;
    let tau = R1_T_STAR / t;
    let g = gibbs1(pi, tau);
    R_WATER * t * pi * g.g_pi / p
}

/// Specific enthalpy (J/kg) of compressed liquid at (t K, p Pa).
pub fn h_region1(t: f64, p: f64) -> f64 {
    let pi = p / R1_P_STAR;
    let tau = R1_T_STAR / t;
    let g = gibbs1(pi, tau);
    R_WATER * t * tau * g.g_tau
}

/// Isobaric specific heat (J/(kg K)) of compressed liquid at (t K, p Pa).
pub fn cp_region1(t: f64, p: f64) -> f64 {
    let pi = p / R1_P_STAR;
    let tau = R1_T_STAR / t;
    let g = gibbs1(pi, tau);
    -R_WATER * tau * tau * g.g_tautau
}

/// Volumetric thermal expansion coefficient (1/K) of compressed liquid.
pub fn beta_region1(t: f64, p: f64) -> f64 {
    let pi = p / R1_P_STAR;
    let tau = R1_T_STAR / t;
    let g = gibbs1(pi, tau);
    (1.0 - tau * g.g_pitau / g.g_pi) / t
}

/// Isothermal compressibility (1/Pa) of compressed liquid.
pub fn kappa_region1(t: f64, p: f64) -> f64 {
    let pi = p / R1_P_STAR;
    let tau = R1_T_STAR / t;
    let g = gibbs1(pi, tau);
    -pi * g.g_pipi / (g.g_pi * p)
}

// ---------------------------------------------------------------------------
// Region 2: steam
// ---------------------------------------------------------------------------

const J0_2: [i32; 9] = [0, 1, -5, -4, -3, -2, -1, 2, 3];
const N0_2: [f64; 9] = [
    -9.6927686500217,
    10.086655968018,
    -0.005608791128302,
    0.071452738081455,
    -0.40710498223928,
    1.4240819171444,
    -4.383951131945,
    -0.28408632460772,
    0.021268463753307,
];

const I2: [i32; 43] = [
    1, 1, 1, 1, 1, 2, 2, 2, 2, 2, 3, 3, 3, 3, 3, 4, 4, 4, 5, 6, 6, 6, 7, 7, 7, 8, 8, 9, 10, 10,
    10, 16, 16, 18, 20, 20, 20, 21, 22, 23, 24, 24, 24,
];
const J2: [i32; 43] = [
    0, 1, 2, 3, 6, 1, 2, 4, 7, 36, 0, 1, 3, 6, 35, 1, 2, 3, 7, 3, 16, 35, 0, 11, 25, 8, 36, 13,
    4, 10, 14, 29, 50, 57, 20, 35, 48, 21, 53, 39, 26, 40, 58,
];
const N2: [f64; 43] = [
    -1.7731742473213e-3,
    -0.017834862292358,
    -0.045996013696365,
    -0.057581259083432,
    -0.05032527872793,
    -3.3032641670203e-5,
    -1.8948987516315e-4,
    -3.9392777243355e-3,
    -0.043797295650573,
    -2.6674547914087e-5,
    2.0481737692309e-8,
    4.3870667284435e-7,
    -3.227767723857e-5,
    -1.5033924542148e-3,
    -0.040668253562649,
    -7.8847309559367e-10,
    1.2790717852285e-8,
    4.8225372718507e-7,
    2.2922076337661e-6,
    -1.6714766451061e-11,
    -2.1171472321355e-3,
    -23.895741934104,
    -5.905956432427e-18,
    -1.2621808899101e-6,
    -0.038946842435739,
    1.1256211360459e-11,
    -8.2311340897998,
    1.9809712802088e-8,
    1.0406965210174e-19,
    -1.0234747095929e-13,
    -1.0018179379511e-9,
    -8.0882908646985e-11,
    0.10693031879409,
    -0.33662250574171,
    8.9185845355421e-25,
    3.0629316876232e-13,
    -4.2002467698208e-6,
    -5.9056029685639e-26,
    3.7826947613457e-6,
    -1.2768608934681e-15,
    7.3087610595061e-29,
    5.5414715350778e-17,
    -9.436970724121e-7,
];

const R2_T_STAR: f64 = 540.0;

struct Gibbs2 {
    g_pi: f64,
    g_pipi: f64,
    g_tau: f64,
    g_tautau: f64,
}

fn gibbs2(pi: f64, tau: f64) -> Gibbs2 {
    // Ideal-gas part.
    let mut g0_tau = 0.0;
    let mut g0_tautau = 0.0;
    for k in 0..9 {
        let j = f64::from(J0_2[k]);
        g0_tau += N0_2[k] * j * tau.powi(J0_2[k] - 1);
        g0_tautau += N0_2[k] * j * (j - 1.0) * tau.powi(J0_2[k] - 2);
    }
    // Residual part.
    let y = tau - 0.5;
    let mut gr_pi = 0.0;
    let mut gr_pipi = 0.0;
    let mut gr_tau = 0.0;
    let mut gr_tautau = 0.0;
    for k in 0..43 {
        let i = I2[k];
        let j = J2[k];
        let n = N2[k];
        let fi = f64::from(i);
        let fj = f64::from(j);
        let yj = y.powi(j);
        gr_pi += n * fi * pi.powi(i - 1) * yj;
        gr_pipi += n * fi * (fi - 1.0) * pi.powi(i - 2) * yj;
        gr_tau += n * pi.powi(i) * fj * y.powi(j - 1);
        gr_tautau += n * pi.powi(i) * fj * (fj - 1.0) * y.powi(j - 2);
    }
    Gibbs2 {
        g_pi: 1.0 / pi + gr_pi,
        g_pipi: -1.0 / (pi * pi) + gr_pipi,
        g_tau: g0_tau + gr_tau,
        g_tautau: g0_tautau + gr_tautau,
    }
}

/// Specific volume (m3/kg) of steam at (t K, p Pa).
pub fn v_region2(t: f64, p: f64) -> f64 {
    let pi = p / 1.0e6;
    let tau = R2_T_STAR / t;
    let g = gibbs2(pi, tau);
    R_WATER * t * pi * g.g_pi / p
}

/// Specific enthalpy (J/kg) of steam at (t K, p Pa).
pub fn h_region2(t: f64, p: f64) -> f64 {
    let pi = p / 1.0e6;
    let tau = R2_T_STAR / t;
    let g = gibbs2(pi, tau);
    R_WATER * t * tau * g.g_tau
}

/// Isobaric specific heat (J/(kg K)) of steam at (t K, p Pa).
pub fn cp_region2(t: f64, p: f64) -> f64 {
    let pi = p / 1.0e6;
    let tau = R2_T_STAR / t;
    let g = gibbs2(pi, tau);
    -R_WATER * tau * tau * g.g_tautau
}

/// Isothermal compressibility (1/Pa) of steam at (t K, p Pa).
pub fn kappa_region2(t: f64, p: f64) -> f64 {
    let pi = p / 1.0e6;
    let tau = R2_T_STAR / t;
    let g = gibbs2(pi, tau);
    -pi * g.g_pipi / (g.g_pi * p)
}
