//! End-to-end physics scenarios
//!
//! Each test drives a simulator the way the app does, through its commands
//! and a [`Scheduler`], and checks the result against closed-form physics.

use approx::assert_relative_eq;
use physlab::config::LabConfig;
use physlab::simulation::charge::{ChargeMode, ChargeSimulation};
use physlab::simulation::circuit::{Resistor, solve_parallel, solve_series};
use physlab::simulation::heat::{HeatEvent, HeatSimulation};
use physlab::simulation::optics::{
    RayEnd, ReflectionCommand, ReflectionSimulation, RefractionCommand, RefractionSimulation, snell,
};
use physlab::simulation::pendulum::{Mode, PendulumSimulation};
use physlab::simulation::projectile::ProjectileSimulation;
use physlab::simulation::thermal::{ExpansionKind, Material, expansion};
use physlab::simulation::{Phase, Scheduler, Simulation, StepOutcome, Vector};
use strum::IntoEnumIterator;

const FRAME: f64 = 1.0 / 60.0;

fn resistors(values: &[(f64, bool)]) -> Vec<Resistor> {
    values
        .iter()
        .enumerate()
        .map(|(id, &(resistance, on))| Resistor { id, resistance, on })
        .collect()
}

/// Ticks a scheduler at 60 Hz until it finishes or `frames` run out.
fn run_frames<S: Simulation>(scheduler: &mut Scheduler<S>, frames: usize) {
    for frame in 0..frames {
        scheduler.tick(frame as f64 * FRAME);
        if scheduler.phase() == Phase::Finished {
            return;
        }
    }
}

#[test]
fn test_series_circuit_laws() {
    let broken = resistors(&[(100.0, true), (200.0, false), (50.0, true)]);
    assert_eq!(solve_series(12.0, &broken).current, 0.0);

    let closed = resistors(&[(100.0, true), (200.0, true), (300.0, true)]);
    let solution = solve_series(12.0, &closed);
    assert_relative_eq!(solution.current, 12.0 / 600.0, epsilon = 1e-12);
    let drops: f64 = solution.readings.iter().map(|r| r.voltage).sum();
    assert_relative_eq!(drops, 12.0, epsilon = 1e-9);
}

#[test]
fn test_parallel_circuit_laws() {
    let equal = resistors(&[(80.0, true), (80.0, true)]);
    let solution = solve_parallel(12.0, &equal);
    assert_relative_eq!(solution.equivalent_resistance.unwrap(), 40.0, epsilon = 1e-9);

    let open = resistors(&[(80.0, false), (80.0, false)]);
    let solution = solve_parallel(12.0, &open);
    assert_eq!(solution.equivalent_resistance, None);
    assert_eq!(solution.total_current, 0.0);
}

#[test]
fn test_charge_conserved_until_equilibrium() {
    let config = LabConfig::default();
    for mode in ChargeMode::iter() {
        let simulation = ChargeSimulation::new(mode, &config.charge, Some(7));
        let initial = simulation.initial_ledger();
        let mut scheduler = Scheduler::new(simulation, config.scheduler.max_frame_dt);
        scheduler.start();
        for frame in 0..2000 {
            scheduler.tick(frame as f64 * FRAME);
            let q = scheduler.simulation().ledger();
            assert_eq!(initial.donor - q.donor, q.acceptor - initial.acceptor);
        }
    }
}

#[test]
fn test_charge_equilibrium_is_sticky() {
    let config = LabConfig::default();
    let simulation = ChargeSimulation::new(ChargeMode::Friction, &config.charge, Some(3));
    let mut scheduler = Scheduler::new(simulation, config.scheduler.max_frame_dt);
    scheduler.start();
    run_frames(&mut scheduler, 20_000);
    assert_eq!(scheduler.phase(), Phase::Finished);

    let settled = scheduler.simulation().ledger();
    assert_eq!(scheduler.simulation_mut().step(1.0), StepOutcome::Finished);
    assert_eq!(scheduler.simulation().ledger(), settled);

    scheduler.reset();
    assert_eq!(scheduler.phase(), Phase::Idle);
    assert!(!scheduler.simulation().equilibrium());
}

#[test]
fn test_heat_reaches_weighted_equilibrium_once() {
    let config = LabConfig::default();
    let mut simulation = HeatSimulation::new(&config.heat);
    let expected = simulation.final_temperature();
    let mut events = Vec::new();
    for _ in 0..20_000 {
        let outcome = simulation.step(FRAME);
        events.extend(simulation.drain_events());
        if outcome == StepOutcome::Finished {
            break;
        }
    }
    assert!(simulation.equilibrium());
    assert_eq!(events.len(), 1);
    let HeatEvent::EquilibriumReached { temperature } = events[0];
    assert_relative_eq!(temperature, expected, epsilon = 0.05);

    let settled = simulation.temperatures();
    for _ in 0..50 {
        simulation.step(FRAME);
    }
    assert_eq!(simulation.temperatures(), settled);
    assert!(simulation.drain_events().is_empty());
}

#[test]
fn test_pendulum_returns_after_one_period() {
    let config = LabConfig::default();
    let mut simulation = PendulumSimulation::new(&config.pendulum);
    assert_relative_eq!(simulation.period(), 2.006, epsilon = 1e-3);

    let steps = (simulation.period() / config.pendulum.time_step).round() as usize;
    for _ in 0..steps {
        simulation.step(FRAME);
    }
    let Mode::Single(state) = simulation.mode() else {
        panic!("default pendulum is single");
    };
    assert!((state.theta.to_degrees() - 30.0).abs() < 2.0);
}

#[test]
fn test_projectile_matches_drag_free_range() {
    let config = LabConfig::default();
    let simulation = ProjectileSimulation::new(&config.projectile, &config.camera, Some(1));
    let (range, height) = simulation.predictions();
    assert_relative_eq!(range, 254.8, epsilon = 0.1);
    assert_relative_eq!(height, 63.7, epsilon = 0.1);

    let mut scheduler = Scheduler::new(simulation, config.scheduler.max_frame_dt);
    scheduler.start();
    run_frames(&mut scheduler, 100_000);
    assert_eq!(scheduler.phase(), Phase::Finished);

    let flight = scheduler.simulation().flights().iter().next().unwrap();
    let landing = flight.trajectory.back().unwrap();
    assert!((landing.x - 254.8).abs() / 254.8 < 0.03);
    assert!((flight.max_height() - 63.7).abs() / 63.7 < 0.03);
}

#[test]
fn test_reflection_law_survives_drags() {
    let mut simulation = ReflectionSimulation::new();
    let pointer = [
        Vector::new(-30.0, 250.0),
        Vector::new(-320.0, 60.0),
        Vector::new(90.0, 90.0),
        Vector::new(-5.0, 5.0),
    ];
    for (i, point) in pointer.into_iter().enumerate() {
        let end = if i % 2 == 0 { RayEnd::Incident(0) } else { RayEnd::Reflected(0) };
        simulation.apply(ReflectionCommand::Drag(end, point));
        let ray = simulation.rays()[0];
        assert!((ray.incidence() - ray.reflection()).abs() < 0.1);
        assert_eq!(simulation.incidence(), simulation.reflection());
    }
}

#[test]
fn test_snell_through_slab() {
    let refraction = snell(1.0, 1.5, 30.0);
    assert_relative_eq!(refraction.angle, (0.5_f64 / 1.5).asin().to_degrees(), epsilon = 1e-9);
    assert_relative_eq!(refraction.angle, 19.47, epsilon = 0.01);

    let mut simulation = RefractionSimulation::new();
    simulation.apply(RefractionCommand::SetIncidence(45.0));
    let trace = simulation.trace();
    assert!(!trace.inside.total_internal_reflection);
    assert_relative_eq!(trace.outgoing.angle, 45.0, epsilon = 1e-9);
}

#[test]
fn test_zero_temperature_change_means_zero_expansion() {
    for material in Material::iter() {
        for kind in ExpansionKind::iter() {
            assert_eq!(expansion(kind, 1.0e6, material.alpha(), 0.0), 0.0);
        }
    }
}
