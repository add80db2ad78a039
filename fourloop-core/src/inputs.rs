//! Typed operator-input surface. Inputs are applied at step boundaries;
//! anything that violates a permissive is surfaced as an `InputRejected`
//! event and the step continues.

use crate::state::Mode;
use fourloop_reactor::BankId;
use fourloop_systems::HeaterMode;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RcpCommand {
    Start,
    Stop,
}

/// One operator action.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum OperatorAction {
    SetBankTarget { bank: BankId, target_steps: f64 },
    WithdrawInSequence,
    InsertInSequence,
    StopRods,
    Trip { reason: String },
    SetBoronDemandPpm(f64),
    ChangeBoron { delta_ppm: f64 },
    Rcp { pump: usize, command: RcpCommand },
    SetHeaterMode(HeaterMode),
    RequestMode(Mode),
    SetSprayDemandFraction(f64),
    PorvForceOpen(bool),
    AcknowledgeAlarms,
}

/// The batch of actions applied at the top of a step.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OperatorInputs {
    pub actions: Vec<OperatorAction>,
}

impl OperatorInputs {
    pub fn none() -> Self {
        Self::default()
    }

    pub fn one(action: OperatorAction) -> Self {
        Self {
            actions: vec![action],
        }
    }

    pub fn push(&mut self, action: OperatorAction) -> &mut Self {
        self.actions.push(action);
        self
    }
}
