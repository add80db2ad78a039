//! Water and steam thermodynamic properties for the four-loop plant core.
//!
//! The public surface works in plant units (psia, F, lb/ft3, BTU/lb); the
//! IF97 fundamental equations underneath work in SI. Everything here is a
//! pure function of its inputs, so property lookups are bit-stable across
//! runs for identical arguments.

pub mod error;
pub mod if97;
pub mod units;
pub mod water;

pub use error::PropertyError;
pub use water::{
    beta, cp_l, cp_v, h_fg, h_g, h_l, h_l_checked, in_band, kappa, p_sat, p_sat_checked, rho_l,
    rho_l_checked, rho_v, sat_props, t_sat, t_sat_checked, SatProps, P_MAX_PSIA, P_MIN_PSIA,
    T_MAX_F, T_MIN_F,
};
