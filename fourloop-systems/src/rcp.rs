//! Reactor coolant pumps: permissive-gated staggered starts, affinity-law
//! flow and heat, exponential coastdown, and the natural-circulation floor.

use bitflags::bitflags;
use serde::{Deserialize, Serialize};

bitflags! {
    /// Which pumps are at or near rated speed. Serde impls come from the
    /// bitflags `serde` feature.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
    pub struct RcpMask: u8 {
        const P1 = 0b0001;
        const P2 = 0b0010;
        const P3 = 0b0100;
        const P4 = 0b1000;
    }
}

/// Pump and loop-flow coefficients.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RcpConfig {
    /// Rated flow per pump, gpm (97,600 total for four).
    pub rated_flow_gpm: f64,
    /// Motor heat into the coolant per pump at rated speed, MW.
    pub heat_mw_per_pump: f64,
    /// Coastdown time constant, s.
    pub coastdown_tau_s: f64,
    /// Spin-up ramp time to rated speed, s.
    pub spinup_s: f64,
    /// Minimum suction pressure for a start, psig.
    pub start_min_psig: f64,
    /// Delay from an accepted first start to breaker close, s.
    pub stagger_first_s: f64,
    /// Spacing between subsequent breaker closes, s.
    pub stagger_interval_s: f64,
    /// Natural-circulation flow bounds, gpm.
    pub nat_circ_min_gpm: f64,
    pub nat_circ_max_gpm: f64,
    /// Loop delta-T range mapped across the natural-circulation band, F.
    pub nat_circ_dt_lo_f: f64,
    pub nat_circ_dt_hi_f: f64,
}

impl Default for RcpConfig {
    fn default() -> Self {
        Self {
            rated_flow_gpm: 24_400.0,
            heat_mw_per_pump: 5.25,
            coastdown_tau_s: 12.0,
            spinup_s: 1.0,
            start_min_psig: 320.0,
            stagger_first_s: 2.0,
            stagger_interval_s: 0.5,
            nat_circ_min_gpm: 12_000.0,
            nat_circ_max_gpm: 23_000.0,
            nat_circ_dt_lo_f: 5.0,
            nat_circ_dt_hi_f: 50.0,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct PumpState {
    /// Shaft speed, fraction of rated.
    pub speed_frac: f64,
    /// Breaker closed and pump driving toward rated speed.
    pub running: bool,
    /// Seconds until breaker close for a sequenced start.
    pub start_delay_s: Option<f64>,
}

/// Why a start command was refused.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum StartRejection {
    BubbleNotFormed,
    PressureBelowMinimum { psig: f64, required_psig: f64 },
    AlreadyRunning,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RcpSet {
    pub pumps: [PumpState; 4],
}

impl RcpSet {
    pub fn all_stopped() -> Self {
        Self {
            pumps: [PumpState::default(); 4],
        }
    }

    pub fn all_running() -> Self {
        let mut s = Self::all_stopped();
        for p in &mut s.pumps {
            p.running = true;
            p.speed_frac = 1.0;
        }
        s
    }

    /// Sequence a start. Permissives: bubble drawn and suction pressure
    /// above the minimum. The breaker closes after the stagger delay.
    pub fn command_start(
        &mut self,
        cfg: &RcpConfig,
        pump: usize,
        bubble_formed: bool,
        pressure_psig: f64,
    ) -> Result<(), StartRejection> {
        let p = &mut self.pumps[pump];
        if p.running || p.start_delay_s.is_some() {
            return Err(StartRejection::AlreadyRunning);
        }
        if !bubble_formed {
            return Err(StartRejection::BubbleNotFormed);
        }
        if pressure_psig < cfg.start_min_psig {
            return Err(StartRejection::PressureBelowMinimum {
                psig: pressure_psig,
                required_psig: cfg.start_min_psig,
            });
        }
        // First pump in the sequence waits the lead delay; each later one
        // queues behind the longest outstanding delay.
        let longest = self
            .pumps
            .iter()
            .filter_map(|q| q.start_delay_s)
            .fold(0.0_f64, f64::max);
        let delay = if longest == 0.0 {
            cfg.stagger_first_s
        } else {
            longest + cfg.stagger_interval_s
        };
        self.pumps[pump].start_delay_s = Some(delay);
        tracing::info!(pump, delay, "RCP start sequenced");
        Ok(())
    }

    pub fn command_stop(&mut self, pump: usize) {
        let p = &mut self.pumps[pump];
        p.running = false;
        p.start_delay_s = None;
    }

    /// Advance spin-up, stagger timers and coastdown.
    pub fn update(&mut self, cfg: &RcpConfig, dt_s: f64) {
        for p in &mut self.pumps {
            if let Some(delay) = p.start_delay_s {
                let remaining = delay - dt_s;
                if remaining <= 0.0 {
                    p.start_delay_s = None;
                    p.running = true;
                } else {
                    p.start_delay_s = Some(remaining);
                }
            }
            if p.running {
                p.speed_frac = (p.speed_frac + dt_s / cfg.spinup_s).min(1.0);
            } else {
                p.speed_frac *= (-dt_s / cfg.coastdown_tau_s).exp();
                if p.speed_frac < 1e-3 {
                    p.speed_frac = 0.0;
                }
            }
        }
    }

    /// Forced flow from running and coasting pumps, gpm (affinity: flow
    /// follows speed).
    pub fn forced_flow_gpm(&self, cfg: &RcpConfig) -> f64 {
        self.pumps
            .iter()
            .map(|p| cfg.rated_flow_gpm * p.speed_frac)
            .sum()
    }

    /// Total loop flow including the natural-circulation floor, gpm.
    pub fn total_flow_gpm(&self, cfg: &RcpConfig, loop_dt_f: f64) -> f64 {
        let forced = self.forced_flow_gpm(cfg);
        if forced > 0.05 * cfg.rated_flow_gpm {
            return forced;
        }
        // All pumps effectively stopped: thermal driving head circulates.
        if loop_dt_f <= cfg.nat_circ_dt_lo_f {
            return forced.max(cfg.nat_circ_min_gpm * (loop_dt_f / cfg.nat_circ_dt_lo_f).max(0.0));
        }
        let frac = ((loop_dt_f - cfg.nat_circ_dt_lo_f)
            / (cfg.nat_circ_dt_hi_f - cfg.nat_circ_dt_lo_f))
            .clamp(0.0, 1.0);
        cfg.nat_circ_min_gpm + frac * (cfg.nat_circ_max_gpm - cfg.nat_circ_min_gpm)
    }

    /// Pump heat into the coolant, MW (affinity: power follows speed cubed).
    pub fn heat_mw(&self, cfg: &RcpConfig) -> f64 {
        self.pumps
            .iter()
            .map(|p| cfg.heat_mw_per_pump * p.speed_frac.powi(3))
            .sum()
    }

    pub fn active_mask(&self) -> RcpMask {
        let mut mask = RcpMask::empty();
        let bits = [RcpMask::P1, RcpMask::P2, RcpMask::P3, RcpMask::P4];
        for (p, bit) in self.pumps.iter().zip(bits) {
            if p.running {
                mask |= bit;
            }
        }
        mask
    }

    pub fn running_count(&self) -> usize {
        self.pumps.iter().filter(|p| p.running).count()
    }
}
