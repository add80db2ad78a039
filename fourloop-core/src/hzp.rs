//! Hot-standby hold control.
//!
//! At hot zero power the plant sheds decay and pump heat through the SG
//! steam dump while the pressurizer program holds 2250 psia. This layer
//! only decides which automatic systems are asked to act; the physics
//! lives in the subsystem crates.

use crate::state::Mode;

/// Demands the hold controller places on the subsystems.
#[derive(Debug, Clone, Copy, Default)]
pub struct HzpDemands {
    /// Ask the SG for the steam-dump regime.
    pub steam_dump: bool,
}

/// Decide the hold demands for this step.
pub fn hold_demands(mode: Mode, t_avg_f: f64, no_load_t_avg_f: f64) -> HzpDemands {
    match mode {
        Mode::HotStandby | Mode::Startup => HzpDemands {
            // Dump only once there is heat to shed; below the no-load
            // program the plant is still warming.
            steam_dump: t_avg_f >= no_load_t_avg_f - 2.0,
        },
        Mode::Tripped => HzpDemands { steam_dump: true },
        _ => HzpDemands::default(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dump_engages_at_no_load_temperature() {
        assert!(hold_demands(Mode::HotStandby, 557.0, 557.0).steam_dump);
        assert!(!hold_demands(Mode::HotStandby, 500.0, 557.0).steam_dump);
    }

    #[test]
    fn dump_idle_during_heatup_and_power() {
        assert!(!hold_demands(Mode::Heatup, 557.0, 557.0).steam_dump);
        assert!(!hold_demands(Mode::PowerOperation, 588.5, 557.0).steam_dump);
    }

    #[test]
    fn tripped_plant_dumps() {
        assert!(hold_demands(Mode::Tripped, 560.0, 557.0).steam_dump);
    }
}
