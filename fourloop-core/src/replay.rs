//! Input capture and replay.
//!
//! A script records the exact `(dt, inputs)` sequence fed to an engine.
//! Replaying it against a fresh engine built from the same initial
//! condition reproduces the trajectory bit-for-bit, which is the working
//! definition of determinism this crate is held to. Scripts serialize to
//! JSON so a host can ship a reproduction alongside a bug report.

use crate::config::EngineConfig;
use crate::engine::Engine;
use crate::error::StepFault;
use crate::ic::InitialCondition;
use crate::inputs::OperatorInputs;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScriptEntry {
    pub dt_hr: f64,
    pub inputs: OperatorInputs,
}

/// A recorded run: the initial condition plus every step's inputs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InputScript {
    pub ic: InitialCondition,
    pub entries: Vec<ScriptEntry>,
}

impl InputScript {
    pub fn new(ic: InitialCondition) -> Self {
        Self {
            ic,
            entries: Vec::new(),
        }
    }

    /// Record one step's worth of inputs.
    pub fn record(&mut self, dt_hr: f64, inputs: &OperatorInputs) {
        self.entries.push(ScriptEntry {
            dt_hr,
            inputs: inputs.clone(),
        });
    }

    /// Step a fresh engine through the whole script.
    pub fn replay(&self, cfg: EngineConfig) -> Result<Engine, StepFault> {
        let mut engine = Engine::with_config(self.ic, cfg);
        for entry in &self.entries {
            engine.step(entry.dt_hr, &entry.inputs)?;
        }
        Ok(engine)
    }

    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_default()
    }

    pub fn from_json(s: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(s)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::inputs::{OperatorAction, RcpCommand};

    const DT: f64 = 10.0 / 3600.0;

    fn sample_script() -> InputScript {
        let mut script = InputScript::new(InitialCondition::HotFullPower);
        for i in 0..40 {
            let inputs = match i {
                5 => OperatorInputs::one(OperatorAction::ChangeBoron { delta_ppm: 2.0 }),
                20 => OperatorInputs::one(OperatorAction::Rcp {
                    pump: 1,
                    command: RcpCommand::Stop,
                }),
                _ => OperatorInputs::none(),
            };
            script.record(DT, &inputs);
        }
        script
    }

    #[test]
    fn replay_matches_live_run() {
        let script = sample_script();
        let mut live = Engine::new(InitialCondition::HotFullPower);
        for entry in &script.entries {
            live.step(entry.dt_hr, &entry.inputs).unwrap();
        }
        let replayed = script.replay(EngineConfig::default()).unwrap();

        let a = live.snapshot();
        let b = replayed.snapshot();
        assert_eq!(a.rcs_pressure_psia.to_bits(), b.rcs_pressure_psia.to_bits());
        assert_eq!(
            a.total_primary_mass_lb.to_bits(),
            b.total_primary_mass_lb.to_bits()
        );
        assert_eq!(a.t_avg_f.to_bits(), b.t_avg_f.to_bits());
        assert_eq!(a.sim_time_hr.to_bits(), b.sim_time_hr.to_bits());
    }

    #[test]
    fn script_json_round_trip() {
        let script = sample_script();
        let back = InputScript::from_json(&script.to_json()).unwrap();
        assert_eq!(back, script);
        assert_eq!(back.len(), 40);
    }

    #[test]
    fn replay_surfaces_step_faults() {
        let mut script = InputScript::new(InitialCondition::ColdShutdownSolid);
        script.record(1.0, &OperatorInputs::none());
        assert!(matches!(
            script.replay(EngineConfig::default()),
            Err(StepFault::InvalidDt { .. })
        ));
    }
}
