//! Setpoint evaluation with edge detection and latching.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum AlarmKind {
    OverTempDeltaT,
    OverPowerDeltaT,
    HighRcsPressure,
    LowRcsPressure,
    HighPzrLevel,
    LowPzrLevel,
    LowVctLevel,
    HighSgPressure,
    PorvOpen,
    LowReactorPeriod,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Severity {
    Info,
    Warn,
    Trip,
}

impl AlarmKind {
    pub fn severity(self) -> Severity {
        match self {
            AlarmKind::HighRcsPressure
            | AlarmKind::LowRcsPressure
            | AlarmKind::OverTempDeltaT
            | AlarmKind::OverPowerDeltaT => Severity::Trip,
            AlarmKind::HighPzrLevel
            | AlarmKind::LowPzrLevel
            | AlarmKind::LowVctLevel
            | AlarmKind::HighSgPressure
            | AlarmKind::LowReactorPeriod => Severity::Warn,
            AlarmKind::PorvOpen => Severity::Info,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
struct AlarmState {
    active: bool,
    latched: bool,
}

/// Edge transitions reported to the event stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlarmEdge {
    Set(AlarmKind),
    Cleared(AlarmKind),
}

/// Latching alarm annunciator. `evaluate` is fed every condition each
/// step; rising edges set and latch, falling edges clear the active state
/// but the latch holds until acknowledged.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AlarmManager {
    states: BTreeMap<AlarmKind, AlarmState>,
}

impl AlarmManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one condition; returns the edge if one occurred.
    pub fn evaluate(&mut self, kind: AlarmKind, condition: bool) -> Option<AlarmEdge> {
        let s = self.states.entry(kind).or_default();
        if condition && !s.active {
            s.active = true;
            s.latched = true;
            return Some(AlarmEdge::Set(kind));
        }
        if !condition && s.active {
            s.active = false;
            return Some(AlarmEdge::Cleared(kind));
        }
        None
    }

    pub fn is_active(&self, kind: AlarmKind) -> bool {
        self.states.get(&kind).map(|s| s.active).unwrap_or(false)
    }

    pub fn is_latched(&self, kind: AlarmKind) -> bool {
        self.states.get(&kind).map(|s| s.latched).unwrap_or(false)
    }

    /// Operator acknowledge: drops latches whose condition has cleared.
    pub fn acknowledge(&mut self) {
        for s in self.states.values_mut() {
            if !s.active {
                s.latched = false;
            }
        }
    }

    /// Currently active alarms in deterministic order.
    pub fn active(&self) -> Vec<AlarmKind> {
        self.states
            .iter()
            .filter(|(_, s)| s.active)
            .map(|(k, _)| *k)
            .collect()
    }

    /// Any active trip-severity alarm.
    pub fn trip_demanded(&self) -> Option<AlarmKind> {
        self.states
            .iter()
            .find(|(k, s)| s.active && k.severity() == Severity::Trip)
            .map(|(k, _)| *k)
    }
}
