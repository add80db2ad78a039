//! Pressure-side failure taxonomy.

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum PressureError {
    /// The coupled solver exhausted its iteration cap.
    #[error("coupled solver failed to converge after {iterations} iterations, residual {residual:.3}")]
    SolverNonConvergence { iterations: u32, residual: f64 },

    /// A regime-boundary reconciliation exceeded the hard threshold.
    #[error("regime handoff reconciliation delta {delta_lb:.1} lb exceeds limit")]
    RegimeHandoffFailure { delta_lb: f64 },

    /// Geometry or sign invariant broken after a solve.
    #[error("invariant violated: {which}")]
    InvariantViolation { which: &'static str },
}
