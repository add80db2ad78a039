//! Canonical primary-mass ledger with compensated accumulation.
//!
//! Boundary flows are small against the half-million-pound inventory, so
//! naive accumulation drifts. Neumaier summation holds twenty sim-hours of
//! balanced CVCS to sub-pound drift, and the fixed application order keeps
//! runs bit-stable.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct MassLedger {
    total_lb: f64,
    compensation: f64,
}

impl MassLedger {
    pub fn new(total_lb: f64) -> Self {
        Self {
            total_lb,
            compensation: 0.0,
        }
    }

    pub fn total_lb(&self) -> f64 {
        self.total_lb + self.compensation
    }

    /// Apply one boundary flow (positive into the primary).
    pub fn apply(&mut self, delta_lb: f64) {
        let t = self.total_lb + delta_lb;
        // Neumaier: track the low-order bits lost in the add.
        if self.total_lb.abs() >= delta_lb.abs() {
            self.compensation += (self.total_lb - t) + delta_lb;
        } else {
            self.compensation += (delta_lb - t) + self.total_lb;
        }
        self.total_lb = t;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn balanced_flows_cancel_exactly() {
        let mut l = MassLedger::new(5.5e5);
        // 20 sim-hours of 10-second steps, +/- 103 lb per step.
        for _ in 0..7200 {
            l.apply(103.0);
            l.apply(-103.0);
        }
        assert_eq!(l.total_lb(), 5.5e5);
    }

    #[test]
    fn compensation_beats_naive_summation() {
        let mut l = MassLedger::new(5.5e5);
        let mut naive = 5.5e5_f64;
        let small = 1.0e-4;
        for _ in 0..1_000_000 {
            l.apply(small);
            naive += small;
        }
        let exact = 5.5e5 + 100.0;
        assert!((l.total_lb() - exact).abs() <= (naive - exact).abs());
        assert!((l.total_lb() - exact).abs() < 1e-6);
    }
}
