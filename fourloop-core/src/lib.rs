//! Four-loop PWR plant simulator core.
//!
//! The engine is a deterministic, single-threaded, time-stepped model of a
//! Westinghouse 4-loop plant from cold shutdown through bubble formation
//! to hot standby and power. Hosts drive it with [`Engine::step`], read
//! [`PlantSnapshot`]s, and consume the typed event stream; rendering,
//! logging sinks and platform glue live outside this workspace.

pub mod alarms;
pub mod config;
pub mod constants;
pub mod engine;
pub mod error;
pub mod events;
pub mod heatup;
pub mod hzp;
pub mod ic;
pub mod inputs;
pub mod ledger;
pub mod metrics;
pub mod replay;
pub mod state;

pub use alarms::{AlarmKind, AlarmManager, Severity};
pub use config::EngineConfig;
pub use engine::{Engine, StepEnergy, StepResult};
pub use error::{Bucket, StepFault};
pub use events::{Event, EventKind};
pub use ic::InitialCondition;
pub use inputs::{OperatorAction, OperatorInputs, RcpCommand};
pub use metrics::StepMetrics;
pub use replay::InputScript;
pub use state::{Mode, PlantSnapshot, PlantState, Regime};

// Re-export the subsystem vocabulary hosts need to interpret snapshots.
pub use fourloop_pressure::BubblePhase;
pub use fourloop_reactor::{BankId, Criticality};
pub use fourloop_secondary::{AuxHeatPolicy, SgRegime};
pub use fourloop_systems::{HeaterMode, RcpMask};
