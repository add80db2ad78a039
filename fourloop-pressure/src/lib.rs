//! Primary-pressure physics: solid-plant and two-phase pressurizer models,
//! the coupled P-T-V closure, and the bubble-formation sequence that moves
//! the plant between them.

pub mod bubble;
pub mod control;
pub mod coupled;
pub mod error;
pub mod solid;
pub mod two_phase;

pub use bubble::{reconcile, BubbleConfig, BubbleFsm, BubbleInputs, BubbleOutcome, BubblePhase};
pub use control::{rate_limit, FirstOrderLag, PiController};
pub use coupled::{
    solve_solid, solve_two_phase, uncoupled_dp_estimate_psi, uncoupled_expansion_ft3,
    SolidSolution, SolidSolveInput, TwoPhaseSolution, TwoPhaseSolveInput,
};
pub use error::PressureError;
pub use solid::{SolidInputs, SolidOutcome, SolidPlantConfig, SolidPlantState};
pub use two_phase::{
    demand_layer, update_rates, PzrConfig, PzrDemands, PzrRateInputs, PzrRateOutcome,
    PzrTwoPhaseState, PSIG_OFFSET,
};
