//! Pellet-gap-clad radial conduction and the fuel thermal lag.
//!
//! Two channels are carried: the core-average rod (Fq = 1.0) and the hot
//! rod (Fq = 2.0). Temperatures resolve the radial stack from coolant film
//! through clad, gap and pellet at the channel linear heat rate.

use serde::{Deserialize, Serialize};

/// Rated core thermal power, MWt.
pub const RATED_POWER_MWT: f64 = 3411.0;

/// Fraction of fission energy deposited in the fuel pellet.
pub const FUEL_DEPOSITION_FRACTION: f64 = 0.974;

/// Fuel rods in the core (193 assemblies x 264 rods).
pub const ROD_COUNT: f64 = 50_952.0;

/// Active fuel length per rod, ft.
pub const ACTIVE_LENGTH_FT: f64 = 12.0;

/// Pellet diameter, ft (0.3088 in).
pub const PELLET_DIAMETER_FT: f64 = 0.3088 / 12.0;

/// Clad outer diameter, ft (0.374 in).
pub const CLAD_OD_FT: f64 = 0.374 / 12.0;

/// Clad inner diameter, ft (0.329 in).
pub const CLAD_ID_FT: f64 = 0.329 / 12.0;

/// Zircaloy conductivity, BTU/hr ft F.
pub const K_CLAD: f64 = 9.6;

/// Gap conductance, BTU/hr ft2 F. Beginning of life.
pub const GAP_CONDUCTANCE_BOL: f64 = 500.0;

/// Gap conductance, BTU/hr ft2 F. End of life (pellet swell closes the gap).
pub const GAP_CONDUCTANCE_EOL: f64 = 1760.0;

/// Film coefficient at rated flow, BTU/hr ft2 F.
pub const FILM_COEFF_RATED: f64 = 5500.0;

/// UO2 melting temperature, F.
pub const FUEL_MELT_F: f64 = 5189.0;

/// Fuel thermal time constant, s.
pub const TAU_FUEL_S: f64 = 7.0;

/// Hot-channel peaking factor.
pub const FQ_HOT: f64 = 2.0;

/// UO2 conductivity, BTU/hr ft F, decreasing with temperature.
/// Anchored at 1.73 at 1832 F.
pub fn k_fuel(t_f: f64) -> f64 {
    let t = t_f.clamp(400.0, 5200.0);
    1.73 * (1832.0 + 460.0) / (t + 460.0)
}

/// Core-average linear heat rate at rated power, BTU/hr ft.
pub fn rated_linear_heat_rate() -> f64 {
    let q_fuel_btu_hr = RATED_POWER_MWT * 1.0e3 * 3412.14 * FUEL_DEPOSITION_FRACTION;
    q_fuel_btu_hr / (ROD_COUNT * ACTIVE_LENGTH_FT)
}

/// Radial temperature stack for one channel.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct ChannelTemps {
    pub clad_outer_f: f64,
    pub clad_inner_f: f64,
    pub pellet_surface_f: f64,
    pub centerline_f: f64,
    /// Rowlands-weighted effective fuel temperature for Doppler feedback.
    pub effective_f: f64,
}

/// Fuel thermal state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FuelState {
    pub average: ChannelTemps,
    pub hot: ChannelTemps,
    /// Lagged heat delivery to the coolant, fraction of rated.
    pub thermal_power_frac: f64,
    /// Gap conductance in use (burnup-dependent input, fixed per run).
    pub gap_conductance: f64,
}

fn solve_channel(q_prime: f64, t_cool_f: f64, film_coeff: f64, gap_h: f64) -> ChannelTemps {
    let dt_film = q_prime / (std::f64::consts::PI * CLAD_OD_FT * film_coeff);
    let dt_clad =
        q_prime * (CLAD_OD_FT / CLAD_ID_FT).ln() / (2.0 * std::f64::consts::PI * K_CLAD);
    let dt_gap = q_prime / (std::f64::consts::PI * PELLET_DIAMETER_FT * gap_h);

    let clad_outer = t_cool_f + dt_film;
    let clad_inner = clad_outer + dt_clad;
    let surface = clad_inner + dt_gap;

    // Pellet conduction with temperature-dependent k; two fixed-point
    // passes are enough for the weak k(T) dependence.
    let mut dt_pellet = q_prime / (4.0 * std::f64::consts::PI * k_fuel(surface + 400.0));
    for _ in 0..2 {
        let t_avg = surface + 0.5 * dt_pellet;
        dt_pellet = q_prime / (4.0 * std::f64::consts::PI * k_fuel(t_avg));
    }
    let centerline = surface + dt_pellet;
    ChannelTemps {
        clad_outer_f: clad_outer,
        clad_inner_f: clad_inner,
        pellet_surface_f: surface,
        centerline_f: centerline,
        effective_f: surface + (4.0 / 9.0) * (centerline - surface),
    }
}

impl FuelState {
    /// Steady state at `power_frac` with the given coolant temperature.
    pub fn steady(power_frac: f64, t_cool_f: f64) -> Self {
        let mut s = Self {
            average: ChannelTemps::default(),
            hot: ChannelTemps::default(),
            thermal_power_frac: power_frac,
            gap_conductance: GAP_CONDUCTANCE_BOL,
        };
        s.resolve_temps(power_frac, t_cool_f, 1.0);
        s
    }

    fn resolve_temps(&mut self, power_frac: f64, t_cool_f: f64, flow_frac: f64) {
        let q_prime = rated_linear_heat_rate() * power_frac.max(0.0);
        // Dittus-Boelter flow dependence with a natural-circulation floor.
        let film = FILM_COEFF_RATED * flow_frac.clamp(0.05, 1.2).powf(0.8);
        self.average = solve_channel(q_prime, t_cool_f, film, self.gap_conductance);
        self.hot = solve_channel(q_prime * FQ_HOT, t_cool_f, film, self.gap_conductance);
    }

    /// Advance the thermal lag and re-resolve the radial stack.
    ///
    /// `core_power_frac` is fission plus decay heat; the lagged value is
    /// the heat actually delivered to the coolant.
    pub fn update(&mut self, core_power_frac: f64, t_cool_f: f64, flow_frac: f64, dt_s: f64) {
        let alpha = 1.0 - (-dt_s / TAU_FUEL_S).exp();
        self.thermal_power_frac += alpha * (core_power_frac - self.thermal_power_frac);
        self.resolve_temps(self.thermal_power_frac, t_cool_f, flow_frac);
    }

    /// Heat delivered to the coolant, MWt.
    pub fn thermal_power_mwt(&self) -> f64 {
        self.thermal_power_frac * RATED_POWER_MWT
    }

    /// Margin from hot-channel centerline to melt, F.
    pub fn melt_margin_f(&self) -> f64 {
        FUEL_MELT_F - self.hot.centerline_f
    }
}
