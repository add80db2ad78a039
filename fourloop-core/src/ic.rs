//! Named initial-condition presets.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum InitialCondition {
    /// Water-solid, 160 F, 325 psia, core shut down on rods and boron.
    ColdShutdownSolid,
    /// Two-phase at 2250 psia / 557 F no-load, RCPs off, secondary cold
    /// per the passive heatup policy.
    HotStandby,
    /// 100 percent power, 2250 psia, programmed temperatures, equilibrium
    /// xenon and decay heat.
    HotFullPower,
}

impl InitialCondition {
    pub fn label(self) -> &'static str {
        match self {
            InitialCondition::ColdShutdownSolid => "cold-shutdown-solid",
            InitialCondition::HotStandby => "hot-standby",
            InitialCondition::HotFullPower => "hot-full-power",
        }
    }
}
