//! Inventory and support systems: CVCS/VCT and the reactor coolant pumps.

pub mod cvcs;
pub mod rcp;

pub use cvcs::{
    heater_demand_kw, seal_flows_gpm, seal_split_consistent, CvcsConfig, CvcsInputs, CvcsOutputs,
    CvcsState, HeaterMode,
};
pub use rcp::{PumpState, RcpConfig, RcpMask, RcpSet, StartRejection};
