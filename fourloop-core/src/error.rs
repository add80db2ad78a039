//! Step-level failure taxonomy. Non-recoverable faults roll the engine
//! back to the pre-step state; recoverable conditions surface as events.

use fourloop_pressure::PressureError;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Which conserved bucket a conservation check found broken.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Bucket {
    PrimaryMass,
    PrimaryEnergy,
    SecondaryMass,
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum StepFault {
    #[error("dt of {dt_hr} hr outside (0, {max_hr}]")]
    InvalidDt { dt_hr: f64, max_hr: f64 },

    #[error("coupled solver failed: {iterations} iterations, residual {residual}")]
    SolverNonConvergence { iterations: u32, residual: f64 },

    #[error("conservation violated in {bucket:?}: delta {delta_lb} lb")]
    ConservationViolation { bucket: Bucket, delta_lb: f64 },

    #[error("invariant violated: {which}")]
    InvariantViolation { which: &'static str },

    #[error("regime handoff failed: reconciliation delta {delta_lb} lb")]
    RegimeHandoffFailure { delta_lb: f64 },
}

impl From<PressureError> for StepFault {
    fn from(e: PressureError) -> Self {
        match e {
            PressureError::SolverNonConvergence {
                iterations,
                residual,
            } => StepFault::SolverNonConvergence {
                iterations,
                residual,
            },
            PressureError::RegimeHandoffFailure { delta_lb } => {
                StepFault::RegimeHandoffFailure { delta_lb }
            }
            PressureError::InvariantViolation { which } => StepFault::InvariantViolation { which },
        }
    }
}
