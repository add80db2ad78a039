//! Property query errors.

use thiserror::Error;

/// A fluid-property query outside the validated band.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PropertyError {
    /// Input exceeded the validated range for the property set.
    #[error("{var} = {value:.3} outside validated range [{lo:.1}, {hi:.1}]")]
    OutOfRange {
        /// Which input was out of range ("pressure_psia" or "temperature_f").
        var: &'static str,
        value: f64,
        lo: f64,
        hi: f64,
    },

    /// Input was NaN or infinite.
    #[error("{var} must be finite, got {value}")]
    NonFinite { var: &'static str, value: f64 },
}

impl PropertyError {
    pub fn out_of_range(var: &'static str, value: f64, lo: f64, hi: f64) -> Self {
        Self::OutOfRange { var, value, lo, hi }
    }
}
