//! Rod bank positions, sequencing and trip dynamics.
//!
//! Eight banks: four shutdown (SA..SD) withdrawn fully before the control
//! banks, then control banks A..D withdrawn in overlapped sequence. Bank D
//! is the regulating bank. Worth follows the integral S-curve; a tripped
//! bank free-falls with a dashpot deceleration over the last 34 steps.

use serde::{Deserialize, Serialize};

/// Steps of travel per bank.
pub const FULL_OUT_STEPS: f64 = 228.0;

/// Overlap between successive control banks, steps.
pub const CONTROL_BANK_OVERLAP_STEPS: f64 = 100.0;

/// Normal drive speed, steps/s (48 steps/min).
pub const DRIVE_SPEED_STEPS_PER_S: f64 = 0.8;

/// Dashpot entry position for a dropping rod, steps.
pub const DASHPOT_STEPS: f64 = 34.0;

/// Free-fall speed above the dashpot, steps/s (194 steps in 1.4 s).
pub const DROP_SPEED_STEPS_PER_S: f64 = 138.6;

/// Dashpot speed, steps/s (34 steps in 0.6 s).
pub const DASHPOT_SPEED_STEPS_PER_S: f64 = 56.7;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BankId {
    ShutdownA,
    ShutdownB,
    ShutdownC,
    ShutdownD,
    ControlA,
    ControlB,
    ControlC,
    ControlD,
}

impl BankId {
    pub const ALL: [BankId; 8] = [
        BankId::ShutdownA,
        BankId::ShutdownB,
        BankId::ShutdownC,
        BankId::ShutdownD,
        BankId::ControlA,
        BankId::ControlB,
        BankId::ControlC,
        BankId::ControlD,
    ];

    pub fn index(self) -> usize {
        Self::ALL.iter().position(|b| *b == self).unwrap_or(0)
    }

    pub fn label(self) -> &'static str {
        match self {
            BankId::ShutdownA => "SA",
            BankId::ShutdownB => "SB",
            BankId::ShutdownC => "SC",
            BankId::ShutdownD => "SD",
            BankId::ControlA => "A",
            BankId::ControlB => "B",
            BankId::ControlC => "C",
            BankId::ControlD => "D",
        }
    }
}

/// Integral rod worth fraction at inserted fraction `x` in [0, 1].
///
/// Cosine-flux S-curve: 50 percent insertion carries 50 percent worth,
/// 60 percent carries 65.5 percent.
pub fn s_curve(x: f64) -> f64 {
    let x = x.clamp(0.0, 1.0);
    0.5 * (1.0 - (std::f64::consts::PI * x).cos())
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RodBank {
    pub id: BankId,
    /// Bank position, steps withdrawn (0 = fully inserted).
    pub position_steps: f64,
    pub target_steps: f64,
    pub trip_dropping: bool,
    /// Total bank worth when fully inserted, pcm.
    pub worth_pcm: f64,
}

impl RodBank {
    fn inserted_worth_pcm(&self) -> f64 {
        let inserted = 1.0 - self.position_steps / FULL_OUT_STEPS;
        -self.worth_pcm * s_curve(inserted)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RodMode {
    Hold,
    Manual,
    SequenceWithdraw,
    SequenceInsert,
}

/// Events raised while moving banks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RodEvent {
    BankAtTop(BankId),
    BankAtBottom(BankId),
    AllRodsInserted,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RodBanks {
    pub banks: [RodBank; 8],
    pub mode: RodMode,
    pub tripped: bool,
}

/// Per-bank fully-inserted worths, pcm. Shutdown banks carry the larger
/// share of total shutdown margin; control-bank worths taper A..D.
const BANK_WORTH_PCM: [f64; 8] = [
    1200.0, 1200.0, 1200.0, 1200.0, 800.0, 1000.0, 1100.0, 900.0,
];

impl RodBanks {
    /// All banks at `position` steps.
    pub fn uniform(position: f64) -> Self {
        let banks = BankId::ALL.map(|id| RodBank {
            id,
            position_steps: position,
            target_steps: position,
            trip_dropping: false,
            worth_pcm: BANK_WORTH_PCM[id.index()],
        });
        Self {
            banks,
            mode: RodMode::Hold,
            tripped: false,
        }
    }

    /// All rods out except the regulating bank at `bank_d_steps`.
    pub fn at_power(bank_d_steps: f64) -> Self {
        let mut r = Self::uniform(FULL_OUT_STEPS);
        let d = BankId::ControlD.index();
        r.banks[d].position_steps = bank_d_steps;
        r.banks[d].target_steps = bank_d_steps;
        r
    }

    pub fn all_inserted() -> Self {
        Self::uniform(0.0)
    }

    /// Total inserted rod worth, pcm (negative).
    pub fn inserted_worth_pcm(&self) -> f64 {
        self.banks.iter().map(|b| b.inserted_worth_pcm()).sum()
    }

    pub fn set_target(&mut self, id: BankId, target_steps: f64) {
        let b = &mut self.banks[id.index()];
        b.target_steps = target_steps.clamp(0.0, FULL_OUT_STEPS);
        self.mode = RodMode::Manual;
    }

    pub fn stop(&mut self) {
        self.mode = RodMode::Hold;
        for b in &mut self.banks {
            b.target_steps = b.position_steps;
        }
    }

    /// Drop all banks. Positions ramp to zero in [`RodBanks::update`].
    pub fn trip(&mut self) {
        if !self.tripped {
            tracing::info!("reactor trip: all banks dropping");
        }
        self.tripped = true;
        self.mode = RodMode::Hold;
        for b in &mut self.banks {
            b.trip_dropping = b.position_steps > 0.0;
            b.target_steps = 0.0;
        }
    }

    /// Reset trip latches after all banks are seated.
    pub fn reset_trip(&mut self) {
        if self.all_rods_inserted() {
            self.tripped = false;
            for b in &mut self.banks {
                b.trip_dropping = false;
            }
        }
    }

    pub fn all_rods_inserted(&self) -> bool {
        self.banks.iter().all(|b| b.position_steps <= 0.0)
    }

    pub fn any_dropping(&self) -> bool {
        self.banks.iter().any(|b| b.trip_dropping)
    }

    pub fn positions(&self) -> [f64; 8] {
        let mut p = [0.0; 8];
        for (i, b) in self.banks.iter().enumerate() {
            p[i] = b.position_steps;
        }
        p
    }

    /// Advance bank motion by `dt_s`, returning limit events.
    pub fn update(&mut self, dt_s: f64) -> Vec<RodEvent> {
        let mut events = Vec::new();
        if self.tripped {
            let was_inserted = self.all_rods_inserted();
            for b in &mut self.banks {
                if b.position_steps > 0.0 {
                    let speed = if b.position_steps > DASHPOT_STEPS {
                        DROP_SPEED_STEPS_PER_S
                    } else {
                        DASHPOT_SPEED_STEPS_PER_S
                    };
                    b.position_steps = (b.position_steps - speed * dt_s).max(0.0);
                    if b.position_steps == 0.0 {
                        b.trip_dropping = false;
                        events.push(RodEvent::BankAtBottom(b.id));
                    }
                }
            }
            if !was_inserted && self.all_rods_inserted() {
                events.push(RodEvent::AllRodsInserted);
            }
            return events;
        }

        match self.mode {
            RodMode::Hold => {}
            RodMode::Manual => {
                for b in &mut self.banks {
                    step_toward(b, dt_s, &mut events);
                }
            }
            RodMode::SequenceWithdraw => {
                self.apply_sequence_targets(true);
                for b in &mut self.banks {
                    step_toward(b, dt_s, &mut events);
                }
            }
            RodMode::SequenceInsert => {
                self.apply_sequence_targets(false);
                for b in &mut self.banks {
                    step_toward(b, dt_s, &mut events);
                }
            }
        }
        events
    }

    /// Gate each bank's target so banks move one at a time, with the
    /// control banks overlapped by [`CONTROL_BANK_OVERLAP_STEPS`].
    fn apply_sequence_targets(&mut self, withdraw: bool) {
        // Shutdown banks sequence without overlap.
        let shutdown = [
            BankId::ShutdownA,
            BankId::ShutdownB,
            BankId::ShutdownC,
            BankId::ShutdownD,
        ];
        let control = [
            BankId::ControlA,
            BankId::ControlB,
            BankId::ControlC,
            BankId::ControlD,
        ];

        if withdraw {
            let mut prior_clear = true;
            for id in shutdown {
                let b = &mut self.banks[id.index()];
                b.target_steps = if prior_clear { FULL_OUT_STEPS } else { b.position_steps };
                prior_clear = prior_clear && b.position_steps >= FULL_OUT_STEPS;
            }
            let shutdown_clear = prior_clear;
            let mut prior_pos = if shutdown_clear { FULL_OUT_STEPS } else { 0.0 };
            for (i, id) in control.iter().enumerate() {
                let b = &mut self.banks[id.index()];
                let start_gate = if i == 0 {
                    shutdown_clear
                } else {
                    prior_pos >= FULL_OUT_STEPS - CONTROL_BANK_OVERLAP_STEPS
                };
                b.target_steps = if start_gate {
                    FULL_OUT_STEPS
                } else {
                    b.position_steps
                };
                prior_pos = b.position_steps;
            }
        } else {
            // Insert control banks in reverse order (D first), then shutdown.
            let mut prior_pos: f64 = 0.0;
            for (i, id) in control.iter().rev().enumerate() {
                let b = &mut self.banks[id.index()];
                let start_gate = if i == 0 {
                    true
                } else {
                    prior_pos <= CONTROL_BANK_OVERLAP_STEPS
                };
                b.target_steps = if start_gate { 0.0 } else { b.position_steps };
                prior_pos = b.position_steps;
            }
            let controls_seated = control
                .iter()
                .all(|id| self.banks[id.index()].position_steps <= 0.0);
            for id in shutdown.iter().rev() {
                let b = &mut self.banks[id.index()];
                b.target_steps = if controls_seated { 0.0 } else { b.position_steps };
            }
        }
    }
}

fn step_toward(b: &mut RodBank, dt_s: f64, events: &mut Vec<RodEvent>) {
    let delta = b.target_steps - b.position_steps;
    if delta.abs() < 1e-9 {
        return;
    }
    let travel = DRIVE_SPEED_STEPS_PER_S * dt_s;
    if delta.abs() <= travel {
        b.position_steps = b.target_steps;
    } else {
        b.position_steps += travel * delta.signum();
    }
    if b.position_steps >= FULL_OUT_STEPS {
        events.push(RodEvent::BankAtTop(b.id));
    } else if b.position_steps <= 0.0 {
        events.push(RodEvent::BankAtBottom(b.id));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn s_curve_anchors() {
        assert_relative_eq!(s_curve(0.0), 0.0, epsilon = 1e-12);
        assert_relative_eq!(s_curve(0.5), 0.5, epsilon = 1e-12);
        assert_relative_eq!(s_curve(0.6), 0.655, epsilon = 1e-3);
        assert_relative_eq!(s_curve(1.0), 1.0, epsilon = 1e-12);
    }

    #[test]
    fn all_out_has_zero_worth() {
        let r = RodBanks::uniform(FULL_OUT_STEPS);
        assert_relative_eq!(r.inserted_worth_pcm(), 0.0, epsilon = 1e-9);
    }

    #[test]
    fn all_in_carries_full_worth() {
        let r = RodBanks::all_inserted();
        let total: f64 = BANK_WORTH_PCM.iter().sum();
        assert_relative_eq!(r.inserted_worth_pcm(), -total, epsilon = 1e-6);
    }

    #[test]
    fn trip_seats_all_banks_within_two_seconds() {
        let mut r = RodBanks::uniform(FULL_OUT_STEPS);
        r.trip();
        assert!(r.any_dropping());
        let mut t = 0.0;
        while !r.all_rods_inserted() && t < 5.0 {
            r.update(0.01);
            t += 0.01;
        }
        assert!(t <= 2.1, "drop took {t} s");
    }

    #[test]
    fn dashpot_slows_final_travel() {
        let mut r = RodBanks::uniform(FULL_OUT_STEPS);
        r.trip();
        // After one second of free fall the bank is inside the dashpot band.
        for _ in 0..100 {
            r.update(0.01);
        }
        let pos = r.banks[0].position_steps;
        assert!(pos < DASHPOT_STEPS && pos > 0.0, "pos = {pos}");
    }

    #[test]
    fn sequence_withdraw_moves_shutdown_banks_first() {
        let mut r = RodBanks::all_inserted();
        r.mode = RodMode::SequenceWithdraw;
        for _ in 0..600 {
            r.update(1.0);
        }
        // 600 s at 0.8 steps/s: SA and most of SB should have moved;
        // control banks untouched.
        assert!(r.banks[BankId::ShutdownA.index()].position_steps >= FULL_OUT_STEPS);
        assert_eq!(r.banks[BankId::ControlA.index()].position_steps, 0.0);
    }

    #[test]
    fn sequence_overlap_starts_next_control_bank_early() {
        let mut r = RodBanks::all_inserted();
        for id in [
            BankId::ShutdownA,
            BankId::ShutdownB,
            BankId::ShutdownC,
            BankId::ShutdownD,
        ] {
            r.banks[id.index()].position_steps = FULL_OUT_STEPS;
        }
        r.mode = RodMode::SequenceWithdraw;
        // Drive bank A up to the overlap point.
        while r.banks[BankId::ControlA.index()].position_steps
            < FULL_OUT_STEPS - CONTROL_BANK_OVERLAP_STEPS
        {
            r.update(1.0);
        }
        let before_b = r.banks[BankId::ControlB.index()].position_steps;
        r.update(5.0);
        assert!(
            r.banks[BankId::ControlB.index()].position_steps > before_b,
            "bank B should begin moving at 100-step overlap"
        );
    }
}
