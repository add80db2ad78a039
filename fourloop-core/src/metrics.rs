//! Per-step counters for host instrumentation. Counters only; no wall
//! clocks, so metrics never perturb determinism.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct StepMetrics {
    /// Coupled-solver iterations spent this step.
    pub solver_iterations: u32,
    /// Kinetics substeps taken.
    pub kinetics_substeps: u32,
    /// Events emitted this step.
    pub events_emitted: u32,
    /// Total steps completed since construction or reset.
    pub steps_completed: u64,
}
