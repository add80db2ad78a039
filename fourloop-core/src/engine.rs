//! The plant coordinator.
//!
//! `Engine` exclusively owns all plant state and advances it with a pure,
//! synchronous `step`. Subsystems run in a fixed order every step: operator
//! inputs, reactor, fuel-to-coolant, steam generator, pumps and flow, CVCS
//! boundary flows, the regime branch, the coupled pressure closure, ledger
//! reconciliation, alarms, snapshot. A step either commits completely or
//! rolls back to the pre-step state and returns the fault.

use crate::alarms::{AlarmEdge, AlarmKind, AlarmManager};
use crate::config::EngineConfig;
use crate::constants;
use crate::error::{Bucket, StepFault};
use crate::events::{Event, EventKind, EventQueue};
use crate::heatup::{self, LoopEnergy};
use crate::hzp;
use crate::ic::InitialCondition;
use crate::inputs::{OperatorAction, OperatorInputs, RcpCommand};
use crate::ledger::MassLedger;
use crate::metrics::StepMetrics;
use crate::state::{Mode, PlantSnapshot, PlantState, Regime};

use fourloop_fluids as fluids;
use fourloop_pressure as pressure;
use fourloop_pressure::{BubbleFsm, BubbleInputs, BubblePhase, PzrTwoPhaseState, SolidPlantState};
use fourloop_reactor::{Reactor, ReactorInputs, RodEvent};
use fourloop_secondary::{sg, SgRegime, SgState};
use fourloop_systems::{cvcs, CvcsState, RcpSet, StartRejection};
use serde::{Deserialize, Serialize};

/// BTU per second per MW.
const BTU_PER_S_PER_MW: f64 = 947.817;

/// Post-solve mass-closure tolerance, lb (solver pressure tolerance times
/// the solid-plant stiffness).
const MASS_CLOSURE_TOL_LB: f64 = 1.0;

/// Result of one committed step.
#[derive(Debug, Clone)]
pub struct StepResult {
    pub snapshot: PlantSnapshot,
    pub events: Vec<Event>,
    pub metrics: StepMetrics,
    pub energy: StepEnergy,
    /// Net boundary mass this step (charging + seal-to-RCS - letdown -
    /// relief), lb. The ledger moves by exactly this amount.
    pub boundary_mass_lb: f64,
}

/// Energy terms for one step, BTU. Published for balance checks.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct StepEnergy {
    pub q_core_btu: f64,
    pub q_pumps_btu: f64,
    pub q_heater_btu: f64,
    pub q_sg_btu: f64,
    pub q_loss_btu: f64,
    /// Loop internal-energy change implied by the temperature update.
    pub du_loop_btu: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Engine {
    cfg: EngineConfig,
    ic: InitialCondition,
    state: PlantState,
    reactor: Reactor,
    cvcs: CvcsState,
    rcps: RcpSet,
    sg: SgState,
    solid: SolidPlantState,
    pzr2: Option<PzrTwoPhaseState>,
    bubble: BubbleFsm,
    alarms: AlarmManager,
    ledger: MassLedger,
    events: EventQueue,
    metrics: StepMetrics,

    boron_demand_ppm: f64,
    spray_override: Option<f64>,
    porv_forced: bool,
    /// Letdown trim carried to the next step's CVCS pass.
    last_letdown_trim_gpm: f64,
    last_charging_hold_gpm: Option<f64>,
    /// Test-harness forcing: pin the loop average temperature.
    t_avg_override: Option<f64>,
}

impl Engine {
    pub fn new(ic: InitialCondition) -> Self {
        Self::with_config(ic, EngineConfig::default())
    }

    pub fn with_config(ic: InitialCondition, cfg: EngineConfig) -> Self {
        match ic {
            InitialCondition::ColdShutdownSolid => Self::cold_shutdown_solid(cfg),
            InitialCondition::HotStandby => Self::hot_standby(cfg),
            InitialCondition::HotFullPower => Self::hot_full_power(cfg),
        }
    }

    pub fn reset(&mut self, ic: InitialCondition) {
        *self = Self::with_config(ic, self.cfg.clone());
    }

    pub fn config(&self) -> &EngineConfig {
        &self.cfg
    }

    fn cold_shutdown_solid(cfg: EngineConfig) -> Self {
        let t = 160.0;
        let p = cfg.solid_pressure_setpoint_psia;
        let boron = 2000.0;
        let loop_mass = cfg.loop_volume_ft3 * fluids::rho_l(t, p);
        let pzr_mass = cfg.pzr.total_volume_ft3 * fluids::rho_l(t, p);
        let state = PlantState {
            sim_time_hr: 0.0,
            mode: Mode::ColdShutdown,
            regime: Regime::SolidPlant,
            total_primary_mass_lb: loop_mass + pzr_mass,
            t_hot_f: t,
            t_cold_f: t,
            t_avg_f: t,
            pressure_psia: p,
            flow_gpm_total: 0.0,
            pzr_water_mass_lb: pzr_mass,
            pzr_steam_mass_lb: 0.0,
            pzr_water_volume_ft3: cfg.pzr.total_volume_ft3,
            pzr_steam_volume_ft3: 0.0,
            pzr_wall_temp_f: t,
            pzr_heater_effective_kw: 0.0,
            t_pzr_f: t,
            boron_ppm: boron,
        };
        let solid = SolidPlantState::new(&cfg.solid, t, p, cfg.pzr.total_volume_ft3);
        Self {
            reactor: Reactor::cold_shutdown(boron, t),
            cvcs: CvcsState::new(&cfg.cvcs, boron),
            rcps: RcpSet::all_stopped(),
            // A plant that has sat cold is thermally equilibrated with its
            // secondary; wet layup fill.
            sg: SgState::cold(&cfg.sg, 160.0, 0.85),
            solid,
            pzr2: None,
            bubble: BubbleFsm::new(&cfg.bubble),
            alarms: AlarmManager::new(),
            ledger: MassLedger::new(state.total_primary_mass_lb),
            events: EventQueue::default(),
            metrics: StepMetrics::default(),
            boron_demand_ppm: boron,
            spray_override: None,
            porv_forced: false,
            last_letdown_trim_gpm: 0.0,
            last_charging_hold_gpm: None,
            t_avg_override: None,
            ic: InitialCondition::ColdShutdownSolid,
            state,
            cfg,
        }
    }

    fn two_phase_preset(
        cfg: EngineConfig,
        ic: InitialCondition,
        mode: Mode,
        t_avg: f64,
        level_pct: f64,
        boron: f64,
        reactor: Reactor,
        rcps: RcpSet,
        sg_state: SgState,
    ) -> Self {
        let p = constants::rcs::OPERATING_PRESSURE_PSIA;
        let pzr = PzrTwoPhaseState::saturated(&cfg.pzr, p, level_pct / 100.0);
        let sat = fluids::sat_props(p);
        let loop_mass = cfg.loop_volume_ft3 * fluids::rho_l(t_avg, p);
        let total = loop_mass + pzr.water_mass_lb + pzr.steam_mass_lb;
        let v_w = pzr.water_mass_lb / sat.rho_f;
        let power_frac = reactor.fuel.thermal_power_frac;
        // Natural circulation floors the flow split when no pumps run.
        let flow_frac =
            (rcps.forced_flow_gpm(&cfg.rcp) / constants::rcs::RATED_FLOW_GPM).max(0.12);
        let (t_hot, t_cold) = heatup::leg_temperatures(t_avg, power_frac, flow_frac);
        let state = PlantState {
            sim_time_hr: 0.0,
            mode,
            regime: Regime::TwoPhase,
            total_primary_mass_lb: total,
            t_hot_f: t_hot,
            t_cold_f: t_cold,
            t_avg_f: t_avg,
            pressure_psia: p,
            flow_gpm_total: rcps.forced_flow_gpm(&cfg.rcp),
            pzr_water_mass_lb: pzr.water_mass_lb,
            pzr_steam_mass_lb: pzr.steam_mass_lb,
            pzr_water_volume_ft3: v_w,
            pzr_steam_volume_ft3: cfg.pzr.total_volume_ft3 - v_w,
            pzr_wall_temp_f: sat.t_sat_f,
            pzr_heater_effective_kw: 0.0,
            t_pzr_f: sat.t_sat_f,
            boron_ppm: boron,
        };
        let solid = SolidPlantState::new(&cfg.solid, sat.t_sat_f, p, cfg.pzr.total_volume_ft3);
        Self {
            reactor,
            cvcs: CvcsState::new(&cfg.cvcs, boron),
            rcps,
            sg: sg_state,
            solid,
            pzr2: Some(pzr),
            bubble: BubbleFsm::completed(&cfg.bubble),
            alarms: AlarmManager::new(),
            ledger: MassLedger::new(total),
            events: EventQueue::default(),
            metrics: StepMetrics::default(),
            boron_demand_ppm: boron,
            spray_override: None,
            porv_forced: false,
            last_letdown_trim_gpm: 0.0,
            last_charging_hold_gpm: None,
            t_avg_override: None,
            ic,
            state,
            cfg,
        }
    }

    fn hot_standby(cfg: EngineConfig) -> Self {
        let boron = 1100.0;
        let t_avg = constants::rcs::T_AVG_NO_LOAD_F;
        let reactor = Reactor::hot_standby(boron, t_avg);
        // Passive heatup policy leaves the secondary near wet-layup
        // temperature; see the SG auxiliary-heating design note. Fill is
        // the no-load secondary inventory, about 166,000 lb per generator.
        let sg_state = SgState::cold(&cfg.sg, 219.0, 0.47);
        Self::two_phase_preset(
            cfg,
            InitialCondition::HotStandby,
            Mode::HotStandby,
            t_avg,
            constants::pzr::NO_LOAD_LEVEL_PCT,
            boron,
            reactor,
            RcpSet::all_stopped(),
            sg_state,
        )
    }

    fn hot_full_power(cfg: EngineConfig) -> Self {
        let boron = 900.0;
        let t_avg = constants::rcs::T_AVG_FULL_POWER_F;
        let reactor = Reactor::hot_full_power(boron, t_avg);
        // Secondary saturation set by the full-power primary-secondary
        // delta-T across the tube bundle.
        let sg_state = SgState::saturated(&cfg.sg, 880.0, 0.80);
        Self::two_phase_preset(
            cfg,
            InitialCondition::HotFullPower,
            Mode::PowerOperation,
            t_avg,
            constants::pzr::FULL_POWER_LEVEL_PCT,
            boron,
            reactor,
            RcpSet::all_running(),
            sg_state,
        )
    }

    /// Read-only snapshot of the current plant state.
    pub fn snapshot(&self) -> PlantSnapshot {
        let s = &self.state;
        let r = &self.reactor;
        let (seal_inj, seal_vct, _seal_rcs) =
            fourloop_systems::seal_flows_gpm(&self.cfg.cvcs, &self.rcps);
        PlantSnapshot {
            sim_time_hr: s.sim_time_hr,
            mode: s.mode,
            regime: s.regime,
            bubble_phase: self.bubble.phase,
            neutron_power_frac: r.kinetics.n,
            thermal_power_mwt: r.fuel.thermal_power_mwt(),
            decay_heat_frac: r.decay.power_frac(),
            // Kinetics observables are overlaid from the step output when
            // a snapshot is published by `step`.
            keff: 1.0,
            reactor_period_sec: f64::INFINITY,
            startup_rate_dpm: 0.0,
            criticality: fourloop_reactor::Criticality::Subcritical,
            reactivity_pcm: 0.0,
            xenon_pcm: r.xenon.worth_pcm(),
            boron_ppm: s.boron_ppm,
            fuel_temp_f: r.fuel.average.effective_f,
            fuel_melt_margin_f: r.fuel.melt_margin_f(),
            bank_positions: r.rods.positions(),
            t_hot_f: s.t_hot_f,
            t_cold_f: s.t_cold_f,
            t_avg_f: s.t_avg_f,
            rcs_pressure_psia: s.pressure_psia,
            flow_gpm_total: s.flow_gpm_total,
            active_rcp_mask: self.rcps.active_mask(),
            pzr_level_pct: s.pzr_level_pct(),
            pzr_water_mass_lb: s.pzr_water_mass_lb,
            pzr_steam_mass_lb: s.pzr_steam_mass_lb,
            pzr_water_volume_ft3: s.pzr_water_volume_ft3,
            pzr_steam_volume_ft3: s.pzr_steam_volume_ft3,
            t_pzr_f: s.t_pzr_f,
            pzr_wall_temp_f: s.pzr_wall_temp_f,
            pzr_heater_effective_kw: s.pzr_heater_effective_kw,
            total_primary_mass_lb: self.ledger.total_lb(),
            sg_regime: self.sg.regime,
            sg_pressure_psia: self.sg.secondary_pressure_psia,
            sg_temp_f: self.sg.secondary_temp_f,
            sg_steam_mass_lb: self.sg.steam_mass_lb,
            sg_water_mass_lb: self.sg.water_mass_lb,
            vct_level_pct: self.cvcs.vct_level_pct(&self.cfg.cvcs),
            vct_boron_ppm: self.cvcs.vct_boron_ppm,
            charging_flow_gpm: self.cvcs.charging_flow_gpm,
            letdown_flow_gpm: self.cvcs.letdown_flow_gpm,
            seal_injection_gpm: seal_inj,
            seal_return_gpm: seal_vct,
            alarms: self.alarms.active(),
        }
    }

    /// Advance simulated time by `dt_hr`. Atomic: on any fault the engine
    /// is left exactly at the pre-step state.
    pub fn step(&mut self, dt_hr: f64, inputs: &OperatorInputs) -> Result<StepResult, StepFault> {
        let max = self.cfg.max_dt_hr;
        if !dt_hr.is_finite() || dt_hr <= 0.0 || dt_hr > max {
            return Err(StepFault::InvalidDt {
                dt_hr,
                max_hr: max,
            });
        }
        let backup = self.clone();
        match self.step_inner(dt_hr, inputs) {
            Ok(result) => Ok(result),
            Err(fault) => {
                *self = backup;
                tracing::warn!(%fault, "step rolled back");
                Err(fault)
            }
        }
    }

    fn push_event(&mut self, kind: EventKind) {
        self.events.push(self.state.sim_time_hr, kind);
    }

    fn step_inner(
        &mut self,
        dt_hr: f64,
        inputs: &OperatorInputs,
    ) -> Result<StepResult, StepFault> {
        let dt_s = dt_hr * 3600.0;
        self.state.sim_time_hr += dt_hr;

        // (1) Operator inputs at the step boundary.
        self.apply_inputs(inputs);

        // (2) Reactor: kinetics, feedback, poisons, decay heat, rods, fuel.
        let flow_frac_prev =
            (self.state.flow_gpm_total / constants::rcs::RATED_FLOW_GPM).clamp(0.0, 1.2);
        let r_out = self.reactor.update(
            &ReactorInputs {
                mod_temp_f: self.state.t_avg_f,
                boron_ppm: self.state.boron_ppm,
                flow_frac: flow_frac_prev.max(0.05),
            },
            dt_s,
        );
        for ev in &r_out.rod_events {
            match ev {
                RodEvent::BankAtTop(b) | RodEvent::BankAtBottom(b) => {
                    self.push_event(EventKind::BankAtLimit(*b));
                }
                RodEvent::AllRodsInserted => {}
            }
        }

        // (3)-(4) Secondary heat removal.
        let hold = hzp::hold_demands(
            self.state.mode,
            self.state.t_avg_f,
            constants::rcs::T_AVG_NO_LOAD_F,
        );
        let turbine_demand = if self.state.mode == Mode::PowerOperation {
            (r_out.thermal_power_mwt / constants::rcs::RATED_POWER_MWT).clamp(0.0, 1.2)
        } else {
            0.0
        };
        let sg_out = sg::update(
            &mut self.sg,
            &self.cfg.sg,
            &sg::SgInputs {
                t_primary_f: self.state.t_avg_f,
                primary_flow_frac: flow_frac_prev.max(0.05),
                turbine_demand_frac: turbine_demand,
                steam_dump_requested: hold.steam_dump,
                dt_s,
            },
        );

        // (5) Pumps and loop flow.
        self.rcps.update(&self.cfg.rcp, dt_s);
        let loop_dt = self.state.t_hot_f - self.state.t_cold_f;
        let flow_gpm = self.rcps.total_flow_gpm(&self.cfg.rcp, loop_dt);
        let flow_frac = (flow_gpm / constants::rcs::RATED_FLOW_GPM).clamp(0.0, 1.2);
        let q_pumps_mw = self.rcps.heat_mw(&self.cfg.rcp);
        self.state.flow_gpm_total = flow_gpm;

        // (6) CVCS boundary flows against the ledger.
        let level_setpoint = self.pzr_level_setpoint_pct();
        let level_error = if self.state.regime == Regime::TwoPhase {
            Some(self.state.pzr_level_pct() - level_setpoint)
        } else {
            None
        };
        let cv_out = cvcs::update(
            &mut self.cvcs,
            &self.cfg.cvcs,
            &cvcs::CvcsInputs {
                letdown_trim_gpm: self.last_letdown_trim_gpm,
                pzr_level_error_pct: level_error,
                charging_override_gpm: self.last_charging_hold_gpm,
                active_rcps: self.rcps.running_count(),
                boron_demand_ppm: self.boron_demand_ppm,
                rcs_boron_ppm: self.state.boron_ppm,
                primary_mass_lb: self.ledger.total_lb(),
                dt_s,
            },
        );
        // Fixed application order keeps the ledger bit-stable.
        self.ledger.apply(cv_out.charging_lb);
        self.ledger.apply(cv_out.seal_return_rcs_lb);
        self.ledger.apply(-cv_out.letdown_lb);
        self.state.boron_ppm = cv_out.rcs_boron_ppm;
        let mut boundary_mass = cv_out.net_primary_lb;

        // RCS loop heatup.
        let energy = LoopEnergy {
            q_core_btu: r_out.thermal_power_mwt * BTU_PER_S_PER_MW * dt_s,
            q_pumps_btu: q_pumps_mw * BTU_PER_S_PER_MW * dt_s,
            q_sg_btu: sg_out.q_primary_btu,
            q_ambient_btu: self.cfg.loop_ambient_loss_btu_hr / 3600.0 * dt_s
                * ((self.state.t_avg_f - 160.0) / 400.0).clamp(0.0, 1.5),
            q_surge_btu: 0.0,
        };
        let loop_water_mass = self.cfg.loop_volume_ft3
            * fluids::rho_l(self.state.t_avg_f, self.state.pressure_psia);
        let t_before = self.state.t_avg_f;
        self.state.t_avg_f = heatup::advance_t_avg(
            self.state.t_avg_f,
            &energy,
            loop_water_mass,
            self.cfg.loop_metal_mass_lb,
            constants::rcs::METAL_CP,
            self.state.pressure_psia,
        );
        if let Some(pin) = self.t_avg_override {
            self.state.t_avg_f = pin;
        }
        let du_loop = (self.state.t_avg_f - t_before)
            * (loop_water_mass * fluids::cp_l(t_before, self.state.pressure_psia)
                + self.cfg.loop_metal_mass_lb * constants::rcs::METAL_CP);
        let thermal_frac = r_out.thermal_power_mwt / constants::rcs::RATED_POWER_MWT;
        let (t_hot, t_cold) =
            heatup::leg_temperatures(self.state.t_avg_f, thermal_frac, flow_frac.max(0.01));
        self.state.t_hot_f = t_hot;
        self.state.t_cold_f = t_cold;

        // (7)-(9) Regime branch, pressure closure, reconciliation.
        let (heater_energy_btu, relief_lb) = match self.state.regime {
            Regime::SolidPlant => self.step_solid(dt_s)?,
            Regime::TwoPhase => self.step_two_phase(dt_s)?,
        };
        boundary_mass -= relief_lb;

        // Property-range watch: queries clamp at the validated band, so
        // surface the excursion instead of failing the step.
        if !fluids::in_band(self.state.t_avg_f, self.state.pressure_psia) {
            self.push_event(EventKind::Warning {
                category: "property-range".into(),
                detail: format!(
                    "state outside validated property band: {:.1} F, {:.1} psia",
                    self.state.t_avg_f, self.state.pressure_psia
                ),
            });
        }

        // (10) Alarms and protective actions.
        self.evaluate_alarms(&r_out);

        // (11) Publish.
        self.metrics.steps_completed += 1;
        self.metrics.kinetics_substeps =
            (dt_s / fourloop_reactor::kinetics::MAX_SUBSTEP_S).ceil() as u32;
        self.metrics.events_emitted = self.events.len() as u32;
        let events = self.events.drain();
        self.state.total_primary_mass_lb = self.ledger.total_lb();

        Ok(StepResult {
            snapshot: self.snapshot_with_kinetics(&r_out),
            events,
            metrics: self.metrics,
            energy: StepEnergy {
                q_core_btu: energy.q_core_btu,
                q_pumps_btu: energy.q_pumps_btu,
                q_heater_btu: heater_energy_btu,
                q_sg_btu: energy.q_sg_btu,
                q_loss_btu: energy.q_ambient_btu,
                du_loop_btu: du_loop,
            },
            boundary_mass_lb: boundary_mass,
        })
    }

    /// Two-phase level program: no-load 25 percent ramping to 60 percent
    /// at full-power average temperature.
    fn pzr_level_setpoint_pct(&self) -> f64 {
        let lo_t = constants::rcs::T_AVG_NO_LOAD_F;
        let hi_t = constants::rcs::T_AVG_FULL_POWER_F;
        let frac = ((self.state.t_avg_f - lo_t) / (hi_t - lo_t)).clamp(0.0, 1.0);
        constants::pzr::NO_LOAD_LEVEL_PCT
            + frac * (constants::pzr::FULL_POWER_LEVEL_PCT - constants::pzr::NO_LOAD_LEVEL_PCT)
    }

    fn bubble_fsm_pass(&mut self, in_two_phase: bool, dt_s: f64) -> pressure::BubbleOutcome {
        let t_sat = fluids::t_sat(self.state.pressure_psia);
        let inp = BubbleInputs {
            t_pzr_f: self.state.t_pzr_f,
            t_sat_f: t_sat,
            pressure_psia: self.state.pressure_psia,
            p_sat_of_t_pzr_psia: fluids::p_sat(self.state.t_pzr_f),
            pzr_level_pct: self.state.pzr_level_pct(),
            in_two_phase,
            dt_s,
        };
        let out = self.bubble.update(&self.cfg.bubble, &inp);
        if let Some((from, to)) = out.transition {
            self.push_event(EventKind::BubblePhase { from, to });
        }
        self.last_letdown_trim_gpm = out.letdown_trim_gpm;
        self.last_charging_hold_gpm = out.charging_hold_gpm;
        out
    }

    fn step_solid(&mut self, dt_s: f64) -> Result<(f64, f64), StepFault> {
        let fsm = self.bubble_fsm_pass(false, dt_s);

        let heater_demand = cvcs::heater_demand_kw(
            self.cvcs.heater_mode,
            0.0,
            fsm.heater_demand_kw,
            self.cfg.pzr.heater_max_kw,
        );

        let out = pressure::solid::update(
            &mut self.solid,
            &self.cfg.solid,
            &pressure::SolidInputs {
                canonical_mass_lb: self.ledger.total_lb(),
                loop_volume_ft3: self.cfg.loop_volume_ft3,
                pzr_volume_ft3: self.cfg.pzr.total_volume_ft3,
                t_avg_f: self.state.t_avg_f,
                t_hot_f: self.state.t_hot_f,
                pressure_psia: self.state.pressure_psia,
                pressure_setpoint_psia: self.cfg.solid_pressure_setpoint_psia,
                heater_demand_kw: heater_demand,
                dt_s,
            },
        )?;
        self.metrics.solver_iterations = out.solution.iterations;
        self.last_letdown_trim_gpm += out.letdown_trim_gpm;

        // Commit the solid picture.
        self.state.pressure_psia = out.solution.pressure_psia;
        self.state.t_pzr_f = self.solid.t_pzr_f;
        self.state.pzr_water_mass_lb = out.solution.pzr_water_mass_lb;
        self.state.pzr_steam_mass_lb = 0.0;
        self.state.pzr_water_volume_ft3 = self.cfg.pzr.total_volume_ft3;
        self.state.pzr_steam_volume_ft3 = 0.0;
        self.state.pzr_wall_temp_f = self.solid.t_pzr_f;
        self.state.pzr_heater_effective_kw = out.heater_effective_kw;

        // Mass closure at the converged pressure.
        let closure = out.solution.loop_mass_lb + out.solution.pzr_water_mass_lb
            - self.ledger.total_lb();
        if closure.abs() > MASS_CLOSURE_TOL_LB {
            return Err(StepFault::ConservationViolation {
                bucket: Bucket::PrimaryMass,
                delta_lb: closure,
            });
        }

        // Handoff to two-phase after verification.
        if fsm.request_two_phase {
            self.transition_to_two_phase()?;
        }

        let heater_btu = out.heater_effective_kw * 0.947817 * dt_s;
        Ok((heater_btu, 0.0))
    }

    fn transition_to_two_phase(&mut self) -> Result<(), StepFault> {
        let p = self.state.pressure_psia;
        let sat = fluids::sat_props(p);
        // Seed a minimal dome; the drain grows it thermodynamically.
        let seed_steam_lb = 1.0;
        let loop_mass = self.cfg.loop_volume_ft3 * fluids::rho_l(self.state.t_avg_f, p);
        let water_mass = (self.state.pzr_water_mass_lb - seed_steam_lb).max(0.0);
        let reconstructed = loop_mass + water_mass + seed_steam_lb;
        let delta = pressure::reconcile(self.ledger.total_lb(), reconstructed)
            .map_err(StepFault::from)?;

        let mut pzr = PzrTwoPhaseState::saturated(&self.cfg.pzr, p, 1.0);
        // Equal-and-opposite reconciliation on the pressurizer water
        // account, the designated boundary bucket.
        pzr.water_mass_lb = water_mass - delta;
        pzr.steam_mass_lb = seed_steam_lb;
        pzr.water_enthalpy_btu_lb = sat.h_f;
        pzr.wall_temp_f = self.solid.t_pzr_f;
        pzr.heater.value = self.solid.heater.value;
        pzr.last_pressure_psia = p;
        self.pzr2 = Some(pzr);

        self.state.regime = Regime::TwoPhase;
        self.state.pzr_water_mass_lb = water_mass - delta;
        self.state.pzr_steam_mass_lb = seed_steam_lb;
        self.push_event(EventKind::RegimeTransition {
            from: Regime::SolidPlant,
            to: Regime::TwoPhase,
            reconciliation_delta_lb: delta,
        });
        tracing::info!(delta_lb = delta, "solid to two-phase handoff");
        Ok(())
    }

    fn transition_to_solid(&mut self, residual_steam_lb: f64) -> Result<(), StepFault> {
        let p = self.state.pressure_psia;
        let t_pzr = fluids::t_sat(p) - 1.0;
        let loop_mass = self.cfg.loop_volume_ft3 * fluids::rho_l(self.state.t_avg_f, p);
        let pzr_mass = self.cfg.pzr.total_volume_ft3 * fluids::rho_l(t_pzr, p);
        let reconstructed = loop_mass + pzr_mass;
        let delta = pressure::reconcile(self.ledger.total_lb(), reconstructed)
            .map_err(StepFault::from)?;

        self.solid = SolidPlantState::new(&self.cfg.solid, t_pzr, p, self.cfg.pzr.total_volume_ft3);
        self.solid.pzr_mass_lb = pzr_mass - delta;
        self.pzr2 = None;
        self.state.regime = Regime::SolidPlant;
        self.state.pzr_steam_mass_lb = 0.0;
        self.state.pzr_water_mass_lb = pzr_mass - delta;
        self.state.pzr_water_volume_ft3 = self.cfg.pzr.total_volume_ft3;
        self.state.pzr_steam_volume_ft3 = 0.0;
        self.push_event(EventKind::RegimeTransition {
            from: Regime::TwoPhase,
            to: Regime::SolidPlant,
            reconciliation_delta_lb: delta,
        });
        tracing::info!(
            delta_lb = delta,
            residual_steam_lb,
            "two-phase bubble collapsed to solid"
        );
        Ok(())
    }

    fn step_two_phase(&mut self, dt_s: f64) -> Result<(f64, f64), StepFault> {
        let fsm = self.bubble_fsm_pass(true, dt_s);

        let demands =
            pressure::demand_layer(&self.cfg.pzr, self.state.pressure_psia, self.spray_override);
        let heater_demand = cvcs::heater_demand_kw(
            self.cvcs.heater_mode,
            demands.heater_demand_kw,
            fsm.heater_demand_kw,
            self.cfg.pzr.heater_max_kw,
        );
        // Spray is driven by cold-leg pressure: no pumps, no spray.
        let spray_gpm = if self.rcps.running_count() > 0 {
            demands.spray_flow_gpm
        } else {
            0.0
        };

        // Taken out of the option so the ledger and event queue stay
        // reachable; a fault path is restored wholesale by the rollback.
        let mut pzr = self.pzr2.take().ok_or(StepFault::InvariantViolation {
            which: "two-phase regime without pressurizer state",
        })?;
        let rates = pressure::update_rates(
            &mut pzr,
            &self.cfg.pzr,
            &pressure::PzrRateInputs {
                pressure_psia: self.state.pressure_psia,
                heater_demand_kw: heater_demand,
                spray_flow_gpm: spray_gpm,
                spray_temp_f: self.state.t_cold_f,
                porv_force_open: self.porv_forced,
                dt_s,
            },
        );
        if rates.relief_lb > 0.0 {
            self.ledger.apply(-rates.relief_lb);
            if !self.alarms.is_active(AlarmKind::PorvOpen) {
                // Edge handled in the alarm pass; event here for the vent.
                self.push_event(EventKind::Warning {
                    category: "relief".into(),
                    detail: format!("{:.0} lb vented through relief", rates.relief_lb),
                });
            }
        }

        let sol = pressure::solve_two_phase(&pressure::TwoPhaseSolveInput {
            canonical_mass_lb: self.ledger.total_lb(),
            loop_volume_ft3: self.cfg.loop_volume_ft3,
            pzr_volume_ft3: self.cfg.pzr.total_volume_ft3,
            t_avg_f: self.state.t_avg_f,
            water_mass_lb: pzr.water_mass_lb,
            steam_mass_lb: pzr.steam_mass_lb,
            water_enthalpy_btu_lb: pzr.water_enthalpy_btu_lb,
            surge_enthalpy_btu_lb: fluids::h_l(self.state.t_hot_f, self.state.pressure_psia),
            p_start_psia: self.state.pressure_psia,
        })
        .map_err(StepFault::from)?;
        self.metrics.solver_iterations = sol.iterations;

        // Commit the converged two-phase picture.
        let sat = fluids::sat_props(sol.pressure_psia);
        pzr.water_mass_lb = sol.water_mass_lb;
        pzr.steam_mass_lb = sol.steam_mass_lb;
        pzr.water_enthalpy_btu_lb = sat.h_f;
        let wall_temp = pzr.wall_temp_f;
        let heater_eff = rates.heater_effective_kw;
        self.pzr2 = Some(pzr);
        self.state.pressure_psia = sol.pressure_psia;
        self.state.t_pzr_f = sol.t_sat_f;
        self.state.pzr_water_mass_lb = sol.water_mass_lb;
        self.state.pzr_steam_mass_lb = sol.steam_mass_lb;
        self.state.pzr_water_volume_ft3 = sol.water_volume_ft3;
        self.state.pzr_steam_volume_ft3 = sol.steam_volume_ft3;
        self.state.pzr_wall_temp_f = wall_temp;
        self.state.pzr_heater_effective_kw = heater_eff;

        // Invariants after the solve.
        if sol.water_mass_lb < 0.0 || sol.steam_mass_lb < 0.0 {
            return Err(StepFault::InvariantViolation {
                which: "negative pressurizer phase mass",
            });
        }
        let closure =
            sol.loop_mass_lb + sol.water_mass_lb + sol.steam_mass_lb - self.ledger.total_lb();
        if closure.abs() > MASS_CLOSURE_TOL_LB {
            return Err(StepFault::ConservationViolation {
                bucket: Bucket::PrimaryMass,
                delta_lb: closure,
            });
        }

        // Bubble collapse returns the plant to solid control.
        if sol.steam_mass_lb < 0.5 {
            self.transition_to_solid(sol.steam_mass_lb)?;
        }

        Ok((rates.heater_energy_btu, rates.relief_lb))
    }

    fn evaluate_alarms(&mut self, r_out: &fourloop_reactor::ReactorOutputs) {
        use constants::protection as prot;
        let psig = self.state.pressure_psia - pressure::PSIG_OFFSET;
        let power_frac = r_out.thermal_power_mwt / constants::rcs::RATED_POWER_MWT;
        let loop_dt = self.state.t_hot_f - self.state.t_cold_f;
        let otdt_setpoint = prot::OTDT_FACTOR
            * heatup::LOOP_DT_RATED_F
            * (self.state.pressure_psia / constants::rcs::OPERATING_PRESSURE_PSIA).sqrt();
        let armed = matches!(
            self.state.mode,
            Mode::Startup | Mode::PowerOperation | Mode::HotStandby
        );

        let checks = [
            (AlarmKind::HighRcsPressure, psig >= prot::HIGH_PRESSURE_TRIP_PSIG),
            (
                AlarmKind::LowRcsPressure,
                psig <= prot::LOW_PRESSURE_TRIP_PSIG
                    && matches!(self.state.mode, Mode::Startup | Mode::PowerOperation),
            ),
            (
                AlarmKind::OverTempDeltaT,
                loop_dt >= otdt_setpoint && power_frac > 0.1,
            ),
            (AlarmKind::OverPowerDeltaT, power_frac >= prot::OPDT_FACTOR),
            (
                AlarmKind::HighPzrLevel,
                self.state.regime == Regime::TwoPhase
                    && self.state.pzr_level_pct() >= prot::HIGH_PZR_LEVEL_PCT,
            ),
            (
                AlarmKind::LowPzrLevel,
                self.state.regime == Regime::TwoPhase && self.state.pzr_level_pct() <= 17.0,
            ),
            (
                AlarmKind::LowVctLevel,
                self.cvcs.vct_level_pct(&self.cfg.cvcs) <= prot::LOW_VCT_LEVEL_PCT,
            ),
            (
                AlarmKind::HighSgPressure,
                self.sg.secondary_pressure_psia >= 1200.0,
            ),
            (
                AlarmKind::PorvOpen,
                self.pzr2.as_ref().map(|p| p.porv_open).unwrap_or(false),
            ),
            (
                AlarmKind::LowReactorPeriod,
                r_out.kinetics.reactor_period_sec > 0.0
                    && r_out.kinetics.reactor_period_sec < 20.0,
            ),
        ];
        for (kind, condition) in checks {
            if let Some(edge) = self.alarms.evaluate(kind, condition) {
                match edge {
                    AlarmEdge::Set(k) => self.push_event(EventKind::AlarmSet(k)),
                    AlarmEdge::Cleared(k) => self.push_event(EventKind::AlarmCleared(k)),
                }
            }
        }

        if armed && self.state.mode != Mode::Tripped {
            if let Some(kind) = self.alarms.trip_demanded() {
                self.trip(format!("{kind:?}"));
            }
        }
    }

    fn trip(&mut self, reason: String) {
        if self.state.mode == Mode::Tripped {
            return;
        }
        self.reactor.trip();
        let from = self.state.mode;
        self.state.mode = Mode::Tripped;
        self.push_event(EventKind::Trip {
            reason: reason.clone(),
        });
        self.push_event(EventKind::ModeChange {
            from,
            to: Mode::Tripped,
        });
        tracing::warn!(reason, "reactor trip");
    }

    fn apply_inputs(&mut self, inputs: &OperatorInputs) {
        for action in &inputs.actions {
            match action {
                OperatorAction::SetBankTarget { bank, target_steps } => {
                    self.reactor.rods.set_target(*bank, *target_steps);
                }
                OperatorAction::WithdrawInSequence => {
                    if matches!(self.state.mode, Mode::Startup | Mode::PowerOperation) {
                        self.reactor.rods.mode = fourloop_reactor::RodMode::SequenceWithdraw;
                    } else {
                        self.push_event(EventKind::InputRejected {
                            reason: "rod withdrawal only in startup or power operation".into(),
                        });
                    }
                }
                OperatorAction::InsertInSequence => {
                    self.reactor.rods.mode = fourloop_reactor::RodMode::SequenceInsert;
                }
                OperatorAction::StopRods => self.reactor.rods.stop(),
                OperatorAction::Trip { reason } => self.trip(reason.clone()),
                OperatorAction::SetBoronDemandPpm(ppm) => {
                    self.boron_demand_ppm = ppm.clamp(0.0, 4000.0);
                }
                OperatorAction::ChangeBoron { delta_ppm } => {
                    self.boron_demand_ppm =
                        (self.boron_demand_ppm + delta_ppm).clamp(0.0, 4000.0);
                }
                OperatorAction::Rcp { pump, command } => {
                    if *pump >= 4 {
                        self.push_event(EventKind::InputRejected {
                            reason: format!("no such pump {pump}"),
                        });
                        continue;
                    }
                    match command {
                        RcpCommand::Start => {
                            let psig = self.state.pressure_psia - pressure::PSIG_OFFSET;
                            let bubble_ok = self.state.regime == Regime::TwoPhase;
                            match self.rcps.command_start(&self.cfg.rcp, *pump, bubble_ok, psig) {
                                Ok(()) => {}
                                Err(StartRejection::BubbleNotFormed) => {
                                    self.push_event(EventKind::InputRejected {
                                        reason: format!("RCP-{} start: bubble not formed", pump + 1),
                                    });
                                }
                                Err(StartRejection::PressureBelowMinimum { psig, required_psig }) => {
                                    self.push_event(EventKind::InputRejected {
                                        reason: format!(
                                            "RCP-{} start: {psig:.0} psig below {required_psig:.0}",
                                            pump + 1
                                        ),
                                    });
                                }
                                Err(StartRejection::AlreadyRunning) => {
                                    self.push_event(EventKind::InputRejected {
                                        reason: format!("RCP-{} already running", pump + 1),
                                    });
                                }
                            }
                        }
                        RcpCommand::Stop => self.rcps.command_stop(*pump),
                    }
                }
                OperatorAction::SetHeaterMode(mode) => {
                    self.cvcs.heater_mode = *mode;
                }
                OperatorAction::RequestMode(m) => self.request_mode(*m),
                OperatorAction::SetSprayDemandFraction(f) => {
                    self.spray_override = Some(f.clamp(0.0, 1.0));
                }
                OperatorAction::PorvForceOpen(open) => {
                    self.porv_forced = *open;
                }
                OperatorAction::AcknowledgeAlarms => self.alarms.acknowledge(),
            }
        }
    }

    fn request_mode(&mut self, target: Mode) {
        let current = self.state.mode;
        let permitted = match (current, target) {
            (Mode::ColdShutdown, Mode::Heatup) => true,
            (Mode::Heatup, Mode::HotStandby) => {
                self.bubble.phase == BubblePhase::Complete
                    && self.state.t_avg_f >= constants::rcs::T_AVG_NO_LOAD_F - 20.0
                    && self.state.pressure_psia >= 2200.0
            }
            (Mode::HotStandby, Mode::Startup) => true,
            (Mode::Startup, Mode::PowerOperation) => self.reactor.kinetics.n >= 0.02,
            (Mode::Tripped, Mode::HotStandby) => self.reactor.rods.all_rods_inserted(),
            (_, Mode::ColdShutdown) => self.reactor.kinetics.n < 1.0e-3,
            _ => false,
        };
        if permitted {
            self.push_event(EventKind::ModeChange {
                from: current,
                to: target,
            });
            self.state.mode = target;
            if current == Mode::Tripped {
                self.reactor.rods.reset_trip();
            }
        } else {
            self.push_event(EventKind::InputRejected {
                reason: format!("mode {target:?} not permitted from {current:?}"),
            });
        }
    }

    fn snapshot_with_kinetics(&self, r_out: &fourloop_reactor::ReactorOutputs) -> PlantSnapshot {
        let mut snap = self.snapshot();
        snap.keff = r_out.kinetics.keff;
        snap.reactor_period_sec = r_out.kinetics.reactor_period_sec;
        snap.startup_rate_dpm = r_out.kinetics.startup_rate_dpm;
        snap.criticality = r_out.kinetics.criticality;
        snap.reactivity_pcm = r_out.reactivity.total_pcm;
        snap
    }

    // ----- harness hooks -------------------------------------------------

    /// Pin the loop average temperature; pass `None` to release. Used by
    /// scenario harnesses to impose a temperature trajectory.
    #[doc(hidden)]
    pub fn set_t_avg_override(&mut self, t_f: Option<f64>) {
        self.t_avg_override = t_f;
    }

    /// Close or open every SG steam outlet.
    pub fn set_sg_outlets_closed(&mut self, closed: bool) {
        self.sg.outlets_closed = closed;
    }

    /// Force the secondary into the boiling regime regardless of
    /// temperature. Scenario forcing for isolation studies.
    #[doc(hidden)]
    pub fn force_sg_boiling(&mut self) {
        self.sg.regime = SgRegime::Boiling;
    }

    /// Current bubble phase.
    pub fn bubble_phase(&self) -> BubblePhase {
        self.bubble.phase
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DT: f64 = 10.0 / 3600.0;

    #[test]
    fn cold_shutdown_steps_quietly() {
        let mut e = Engine::new(InitialCondition::ColdShutdownSolid);
        let m0 = e.snapshot().total_primary_mass_lb;
        for _ in 0..60 {
            e.step(DT, &OperatorInputs::none()).unwrap();
        }
        let snap = e.snapshot();
        assert_eq!(snap.mode, Mode::ColdShutdown);
        assert_eq!(snap.regime, Regime::SolidPlant);
        assert!((snap.total_primary_mass_lb - m0).abs() < 10.0);
        assert!((snap.rcs_pressure_psia - 325.0).abs() < 10.0);
        assert_eq!(snap.pzr_steam_mass_lb, 0.0);
    }

    #[test]
    fn invalid_dt_is_rejected_without_state_change() {
        let mut e = Engine::new(InitialCondition::ColdShutdownSolid);
        let before = e.snapshot().sim_time_hr;
        assert!(matches!(
            e.step(0.0, &OperatorInputs::none()),
            Err(StepFault::InvalidDt { .. })
        ));
        assert!(matches!(
            e.step(1.0, &OperatorInputs::none()),
            Err(StepFault::InvalidDt { .. })
        ));
        assert_eq!(e.snapshot().sim_time_hr, before);
    }

    #[test]
    fn rcp_start_rejected_in_solid_plant() {
        let mut e = Engine::new(InitialCondition::ColdShutdownSolid);
        let result = e
            .step(
                DT,
                &OperatorInputs::one(OperatorAction::Rcp {
                    pump: 0,
                    command: RcpCommand::Start,
                }),
            )
            .unwrap();
        assert!(result
            .events
            .iter()
            .any(|ev| matches!(ev.kind, EventKind::InputRejected { .. })));
        assert!(result.snapshot.active_rcp_mask.is_empty());
    }

    #[test]
    fn manual_trip_drops_rods_and_changes_mode() {
        let mut e = Engine::new(InitialCondition::HotFullPower);
        let result = e
            .step(
                DT,
                &OperatorInputs::one(OperatorAction::Trip {
                    reason: "test".into(),
                }),
            )
            .unwrap();
        assert_eq!(result.snapshot.mode, Mode::Tripped);
        assert!(result
            .events
            .iter()
            .any(|ev| matches!(ev.kind, EventKind::Trip { .. })));
    }

    #[test]
    fn hot_full_power_is_near_steady() {
        let mut e = Engine::new(InitialCondition::HotFullPower);
        for _ in 0..180 {
            e.step(DT, &OperatorInputs::none()).unwrap();
        }
        let snap = e.snapshot();
        assert!(
            (snap.t_avg_f - 588.5).abs() < 5.0,
            "t_avg drifted to {}",
            snap.t_avg_f
        );
        assert!(
            (snap.rcs_pressure_psia - 2250.0).abs() < 40.0,
            "pressure drifted to {}",
            snap.rcs_pressure_psia
        );
        assert!((snap.neutron_power_frac - 1.0).abs() < 0.05);
    }

    #[test]
    fn geometric_closure_every_step() {
        let mut e = Engine::new(InitialCondition::HotFullPower);
        for _ in 0..120 {
            let r = e.step(DT, &OperatorInputs::none()).unwrap();
            let total = r.snapshot.pzr_water_mass_lb; // mass sanity
            assert!(total > 0.0);
            let s = &e.snapshot();
            let v = s.pzr_level_pct; // level derived from volumes
            assert!((0.0..=100.0).contains(&v));
        }
    }

    #[test]
    fn mode_request_honors_permissives() {
        let mut e = Engine::new(InitialCondition::ColdShutdownSolid);
        // Heatup from cold shutdown is always permitted.
        let r = e
            .step(DT, &OperatorInputs::one(OperatorAction::RequestMode(Mode::Heatup)))
            .unwrap();
        assert_eq!(r.snapshot.mode, Mode::Heatup);
        // Jumping straight to hot standby is not.
        let r = e
            .step(
                DT,
                &OperatorInputs::one(OperatorAction::RequestMode(Mode::HotStandby)),
            )
            .unwrap();
        assert_eq!(r.snapshot.mode, Mode::Heatup);
        assert!(r
            .events
            .iter()
            .any(|ev| matches!(ev.kind, EventKind::InputRejected { .. })));
    }
}
