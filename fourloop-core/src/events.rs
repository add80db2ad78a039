//! Ordered, append-only per-step event stream.

use crate::alarms::AlarmKind;
use crate::state::{Mode, Regime};
use fourloop_pressure::BubblePhase;
use fourloop_reactor::BankId;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum EventKind {
    AlarmSet(AlarmKind),
    AlarmCleared(AlarmKind),
    RegimeTransition {
        from: Regime,
        to: Regime,
        reconciliation_delta_lb: f64,
    },
    BubblePhase {
        from: BubblePhase,
        to: BubblePhase,
    },
    BankAtLimit(BankId),
    Trip {
        reason: String,
    },
    ModeChange {
        from: Mode,
        to: Mode,
    },
    InputRejected {
        reason: String,
    },
    Warning {
        category: String,
        detail: String,
    },
}

/// An event stamped with simulated time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    pub sim_time_hr: f64,
    pub kind: EventKind,
}

/// Per-step event queue; drained into each `StepResult`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EventQueue {
    q: VecDeque<Event>,
}

impl EventQueue {
    pub fn push(&mut self, sim_time_hr: f64, kind: EventKind) {
        self.q.push_back(Event { sim_time_hr, kind });
    }

    pub fn drain(&mut self) -> Vec<Event> {
        self.q.drain(..).collect()
    }

    pub fn len(&self) -> usize {
        self.q.len()
    }

    pub fn is_empty(&self) -> bool {
        self.q.is_empty()
    }
}
