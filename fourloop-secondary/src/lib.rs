//! Steam generator secondary model, four units aggregated as one
//! equivalent kettle.
//!
//! Three regimes: Subcooled (closed, sensible heating at atmospheric),
//! Boiling (saturated; steam either vents through the bypass/MSIVs or
//! accumulates against the fixed shell volume when isolated), and
//! SteamDump (dump valve matches primary heat input for hot-standby hold).
//! Pressure in the boiling regime comes from a saturated closed-vessel
//! closure, so an isolated generator pressurizes as steam accumulates
//! instead of being pinned to atmospheric.

pub mod sg;

pub use sg::{
    AuxHeatPolicy, SgConfig, SgInputs, SgOutputs, SgRegime, SgState,
};
