//! Universal invariants over arbitrary step sequences.

use fourloop_core::{
    Engine, InitialCondition, OperatorAction, OperatorInputs, RcpCommand, Regime,
};
use fourloop_fluids as fluids;

const DT_10S: f64 = 10.0 / 3600.0;

fn quiet() -> OperatorInputs {
    OperatorInputs::none()
}

/// A mildly-perturbed full-power hour: ledger moves only by boundary
/// flows, geometry closes exactly, and the two-phase water stays on the
/// saturation line.
#[test]
fn conservation_and_saturation_under_perturbation() {
    let mut e = Engine::new(InitialCondition::HotFullPower);
    let mut ledger_before = e.snapshot().total_primary_mass_lb;
    for i in 0..360 {
        let inputs = match i {
            60 => OperatorInputs::one(OperatorAction::ChangeBoron { delta_ppm: 5.0 }),
            180 => OperatorInputs::one(OperatorAction::SetSprayDemandFraction(0.1)),
            240 => OperatorInputs::one(OperatorAction::SetSprayDemandFraction(0.0)),
            _ => quiet(),
        };
        let r = e.step(DT_10S, &inputs).unwrap();
        let s = &r.snapshot;

        // Ledger moves only through boundary flows.
        let residual = (s.total_primary_mass_lb - ledger_before) - r.boundary_mass_lb;
        assert!(residual.abs() <= 0.1, "step {i}: ledger residual {residual}");
        ledger_before = s.total_primary_mass_lb;

        // Geometric closure to within an ulp of the vessel volume.
        assert!(
            (s.pzr_water_volume_ft3 + s.pzr_steam_volume_ft3 - 1800.0).abs() < 1e-9,
            "step {i}: pressurizer volumes sum to {}",
            s.pzr_water_volume_ft3 + s.pzr_steam_volume_ft3
        );

        // Two-phase water rides the saturation line.
        assert_eq!(s.regime, Regime::TwoPhase);
        let t_sat = fluids::t_sat(s.rcs_pressure_psia);
        assert!(
            (s.t_pzr_f - t_sat).abs() <= 1.0,
            "step {i}: t_pzr {} vs t_sat {}",
            s.t_pzr_f,
            t_sat
        );

        // Phase masses stay physical.
        assert!(s.pzr_water_mass_lb > 0.0 && s.pzr_steam_mass_lb > 0.0);
    }
}

/// Solid regime carries no steam, ever.
#[test]
fn solid_regime_zero_steam() {
    let mut e = Engine::new(InitialCondition::ColdShutdownSolid);
    for _ in 0..360 {
        let r = e.step(DT_10S, &quiet()).unwrap();
        assert_eq!(r.snapshot.regime, Regime::SolidPlant);
        assert_eq!(r.snapshot.pzr_steam_mass_lb, 0.0);
        assert_eq!(r.snapshot.pzr_steam_volume_ft3, 0.0);
    }
}

/// Primary energy books close within one percent of gross input over a
/// one-hour full-power window.
#[test]
fn energy_balance_over_one_hour() {
    let mut e = Engine::new(InitialCondition::HotFullPower);
    let mut gross = 0.0;
    let mut residual = 0.0;
    for _ in 0..360 {
        let r = e.step(DT_10S, &quiet()).unwrap();
        let en = r.energy;
        gross += en.q_core_btu + en.q_pumps_btu + en.q_heater_btu;
        residual += en.q_core_btu + en.q_pumps_btu + en.q_heater_btu
            - en.q_sg_btu
            - en.q_loss_btu
            - en.du_loop_btu;
    }
    // The pressurizer exchanges a small share through the surge line;
    // the loop-side books must close to one percent of gross.
    assert!(
        residual.abs() <= 0.01 * gross.abs(),
        "residual {residual} vs gross {gross}"
    );
}

/// Identical initial condition and input script give bit-identical
/// trajectories.
#[test]
fn determinism_bit_stable() {
    let script = |i: usize| -> OperatorInputs {
        match i {
            10 => OperatorInputs::one(OperatorAction::ChangeBoron { delta_ppm: -3.0 }),
            50 => OperatorInputs::one(OperatorAction::SetSprayDemandFraction(0.2)),
            90 => OperatorInputs::one(OperatorAction::Rcp {
                pump: 2,
                command: RcpCommand::Stop,
            }),
            130 => OperatorInputs::one(OperatorAction::Trip {
                reason: "determinism".into(),
            }),
            _ => OperatorInputs::none(),
        }
    };
    let mut a = Engine::new(InitialCondition::HotFullPower);
    let mut b = Engine::new(InitialCondition::HotFullPower);
    for i in 0..200 {
        let ra = a.step(DT_10S, &script(i)).unwrap();
        let rb = b.step(DT_10S, &script(i)).unwrap();
        let sa = &ra.snapshot;
        let sb = &rb.snapshot;
        assert_eq!(sa.rcs_pressure_psia.to_bits(), sb.rcs_pressure_psia.to_bits());
        assert_eq!(
            sa.total_primary_mass_lb.to_bits(),
            sb.total_primary_mass_lb.to_bits()
        );
        assert_eq!(sa.t_avg_f.to_bits(), sb.t_avg_f.to_bits());
        assert_eq!(sa.neutron_power_frac.to_bits(), sb.neutron_power_frac.to_bits());
        assert_eq!(sa.pzr_level_pct.to_bits(), sb.pzr_level_pct.to_bits());
        assert_eq!(ra.events.len(), rb.events.len());
    }
}

/// Boron round trip: raise the demand, return it, and the core
/// concentration comes home through the transport lag.
#[test]
fn boron_round_trip() {
    let mut e = Engine::new(InitialCondition::HotFullPower);
    let b0 = e.snapshot().boron_ppm;

    e.step(
        DT_10S,
        &OperatorInputs::one(OperatorAction::SetBoronDemandPpm(b0 + 10.0)),
    )
    .unwrap();
    // Two hours borated.
    for _ in 0..720 {
        e.step(DT_10S, &quiet()).unwrap();
    }
    let peak = e.snapshot().boron_ppm;
    assert!(peak > b0 + 0.5, "boration had no effect: {peak}");

    e.step(
        DT_10S,
        &OperatorInputs::one(OperatorAction::SetBoronDemandPpm(b0)),
    )
    .unwrap();
    // Thirty hours to wash back through the loop inventory.
    for _ in 0..10_800 {
        e.step(DT_10S, &quiet()).unwrap();
    }
    let final_b = e.snapshot().boron_ppm;
    assert!(
        (final_b - b0).abs() <= 0.5,
        "round trip ended {final_b} vs {b0}"
    );
}

/// Cumulative ledger drift over twenty sim-hours of balanced CVCS stays
/// below a pound of accounting error and sixty pounds of net inventory.
#[test]
fn twenty_hour_ledger_drift() {
    let mut e = Engine::new(InitialCondition::ColdShutdownSolid);
    let m0 = e.snapshot().total_primary_mass_lb;
    let steps = (20.0 / DT_10S) as usize;
    let mut boundary_sum = 0.0;
    for _ in 0..steps {
        let r = e.step(DT_10S, &quiet()).unwrap();
        boundary_sum += r.boundary_mass_lb;
    }
    let drift = e.snapshot().total_primary_mass_lb - m0 - boundary_sum;
    assert!(drift.abs() < 1.0, "accounting drift {drift}");
    // Balanced charging and letdown: the boundary itself is small.
    assert!(
        (e.snapshot().total_primary_mass_lb - m0).abs() < 60.0,
        "net inventory drift {}",
        e.snapshot().total_primary_mass_lb - m0
    );
}
