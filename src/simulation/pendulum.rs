//! Single and double pendulum, integrated with semi-implicit Euler at a fixed step.
//!
//! World coordinates put the pivot at the origin with y pointing up, so a bob
//! hanging at rest sits at `(0, -L)`.

use log::debug;
use std::f64::consts::PI;
use strum_macros::EnumIter;

use super::history::HistorySeries;
use super::variables::{DAMPING, GRAVITY, PENDULUM_ANGLE, PENDULUM_LENGTH, PENDULUM_MASS};
use super::{Scalar, Simulation, StepOutcome, Vector, finite_or};
use crate::config::PendulumConfig;

/// Largest |θ| in radians for which the small-angle form is used when enabled.
pub const SMALL_ANGLE_LIMIT: Scalar = 0.2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter)]
pub enum PendulumKind {
    Single,
    Double,
}

impl std::fmt::Display for PendulumKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PendulumKind::Single => write!(f, "Single"),
            PendulumKind::Double => write!(f, "Double"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PendulumParams {
    pub length: Scalar,
    pub mass: Scalar,
    pub gravity: Scalar,
    pub initial_angle: Scalar,
    pub damping_enabled: bool,
    pub damping: Scalar,
    pub small_angle: bool,
    pub length1: Scalar,
    pub length2: Scalar,
    pub mass1: Scalar,
    pub mass2: Scalar,
    pub angle1: Scalar,
    pub angle2: Scalar,
    pub trail_enabled: bool,
}

impl Default for PendulumParams {
    fn default() -> Self {
        Self {
            length: PENDULUM_LENGTH.default,
            mass: PENDULUM_MASS.default,
            gravity: GRAVITY.default,
            initial_angle: PENDULUM_ANGLE.default,
            damping_enabled: false,
            damping: DAMPING.default,
            small_angle: false,
            length1: PENDULUM_LENGTH.default,
            length2: PENDULUM_LENGTH.default,
            mass1: PENDULUM_MASS.default,
            mass2: PENDULUM_MASS.default,
            angle1: 45.0,
            angle2: 30.0,
            trail_enabled: true,
        }
    }
}

/// Angles in commands are degrees; state is kept in radians.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PendulumCommand {
    SetKind(PendulumKind),
    SetLength(Scalar),
    SetMass(Scalar),
    SetGravity(Scalar),
    SetInitialAngle(Scalar),
    SetDampingEnabled(bool),
    SetDamping(Scalar),
    SetSmallAngle(bool),
    SetLength1(Scalar),
    SetLength2(Scalar),
    SetMass1(Scalar),
    SetMass2(Scalar),
    SetAngle1(Scalar),
    SetAngle2(Scalar),
    SetTrail(bool),
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SingleState {
    pub theta: Scalar,
    pub omega: Scalar,
}

#[derive(Debug, Clone)]
pub struct DoubleState {
    pub theta1: Scalar,
    pub omega1: Scalar,
    pub theta2: Scalar,
    pub omega2: Scalar,
    /// Positions of the lower bob.
    pub trail: HistorySeries<Vector>,
}

#[derive(Debug, Clone)]
pub enum Mode {
    Single(SingleState),
    Double(DoubleState),
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Energy {
    pub kinetic: Scalar,
    pub potential: Scalar,
}

impl Energy {
    pub fn total(&self) -> Scalar {
        self.kinetic + self.potential
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PendulumSample {
    /// Degrees.
    pub displacement: Scalar,
    pub angular_velocity: Scalar,
    pub energy: Energy,
}

/// Force magnitudes acting on the single bob, in newtons.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BobForces {
    pub weight: Scalar,
    pub tension: Scalar,
    pub restoring: Scalar,
}

pub struct PendulumSimulation {
    params: PendulumParams,
    mode: Mode,
    time: Scalar,
    history: HistorySeries<PendulumSample>,
    config: PendulumConfig,
}

impl PendulumSimulation {
    pub fn new(config: &PendulumConfig) -> Self {
        let params = PendulumParams::default();
        let mode = Mode::Single(single_from(&params));
        PendulumSimulation {
            params,
            mode,
            time: 0.0,
            history: HistorySeries::new(config.history_capacity),
            config: config.clone(),
        }
    }

    pub fn params(&self) -> &PendulumParams {
        &self.params
    }

    pub fn mode(&self) -> &Mode {
        &self.mode
    }

    pub fn kind(&self) -> PendulumKind {
        match self.mode {
            Mode::Single(_) => PendulumKind::Single,
            Mode::Double(_) => PendulumKind::Double,
        }
    }

    pub fn time(&self) -> Scalar {
        self.time
    }

    pub fn history(&self) -> &HistorySeries<PendulumSample> {
        &self.history
    }

    /// Theoretical small-oscillation period 2π√(L/g).
    pub fn period(&self) -> Scalar {
        2.0 * PI * (self.params.length / self.params.gravity).sqrt()
    }

    pub fn frequency(&self) -> Scalar {
        1.0 / self.period()
    }

    /// Bob speed at the bottom of an undamped swing from the initial angle.
    pub fn max_speed(&self) -> Scalar {
        let p = &self.params;
        (2.0 * p.gravity * p.length * (1.0 - p.initial_angle.to_radians().cos())).sqrt()
    }

    /// Bob positions; the second entry is `None` for a single pendulum.
    pub fn bob_positions(&self) -> (Vector, Option<Vector>) {
        let p = &self.params;
        match &self.mode {
            Mode::Single(s) => (hanging(p.length, s.theta), None),
            Mode::Double(d) => {
                let first = hanging(p.length1, d.theta1);
                (first, Some(first + hanging(p.length2, d.theta2)))
            }
        }
    }

    pub fn energy(&self) -> Energy {
        let p = &self.params;
        match &self.mode {
            Mode::Single(s) => {
                let height = p.length * (1.0 - s.theta.cos());
                let speed = p.length * s.omega;
                Energy {
                    kinetic: 0.5 * p.mass * speed * speed,
                    potential: p.mass * p.gravity * height,
                }
            }
            Mode::Double(d) => {
                let delta = d.theta2 - d.theta1;
                let v1 = p.length1 * d.omega1;
                let v2 = p.length2 * d.omega2;
                let ke1 = 0.5 * p.mass1 * v1 * v1;
                let ke2 = 0.5 * p.mass2 * (v1 * v1 + v2 * v2 + 2.0 * v1 * v2 * delta.cos());
                let pe = -p.mass1 * p.gravity * p.length1 * d.theta1.cos()
                    - p.mass2
                        * p.gravity
                        * (p.length1 * d.theta1.cos() + p.length2 * d.theta2.cos());
                Energy {
                    kinetic: ke1 + ke2,
                    potential: pe,
                }
            }
        }
    }

    /// Linear speed of the (lower) bob.
    pub fn speed(&self) -> Scalar {
        let p = &self.params;
        match &self.mode {
            Mode::Single(s) => (p.length * s.omega).abs(),
            Mode::Double(d) => {
                let v1 = Vector::new(d.theta1.cos(), d.theta1.sin()) * p.length1 * d.omega1;
                let v2 = Vector::new(d.theta2.cos(), d.theta2.sin()) * p.length2 * d.omega2;
                (v1 + v2).length()
            }
        }
    }

    /// Weight, string tension and tangential restoring force on the single bob.
    pub fn forces(&self) -> Option<BobForces> {
        let Mode::Single(s) = &self.mode else {
            return None;
        };
        let p = &self.params;
        let weight = p.mass * p.gravity;
        Some(BobForces {
            weight,
            tension: weight * s.theta.cos() + p.mass * p.length * s.omega * s.omega,
            restoring: weight * s.theta.sin(),
        })
    }

    fn rebuild(&mut self) {
        self.mode = match self.kind() {
            PendulumKind::Single => Mode::Single(single_from(&self.params)),
            PendulumKind::Double => Mode::Double(double_from(&self.params, &self.config)),
        };
        self.time = 0.0;
        self.history.clear();
    }

    /// Initial-condition edits only take effect on a pendulum that has not moved yet.
    fn rebuild_if_unstarted(&mut self) {
        if self.time == 0.0 {
            self.rebuild();
        }
    }

    fn step_single(params: &PendulumParams, state: &mut SingleState, dt: Scalar) {
        let ratio = params.gravity / params.length;
        let mut alpha = if params.small_angle && state.theta.abs() < SMALL_ANGLE_LIMIT {
            -ratio * state.theta
        } else {
            -ratio * state.theta.sin()
        };
        if params.damping_enabled {
            alpha -= params.damping * state.omega;
        }
        state.omega = finite_or(state.omega + alpha * dt, 0.0);
        state.theta = finite_or(state.theta + state.omega * dt, 0.0);
    }

    fn step_double(params: &PendulumParams, state: &mut DoubleState, dt: Scalar, floor: Scalar) {
        let (mut alpha1, mut alpha2) = double_accelerations(params, state, floor);
        if params.damping_enabled {
            alpha1 -= params.damping * state.omega1;
            alpha2 -= params.damping * state.omega2;
        }
        state.omega1 = finite_or(state.omega1 + alpha1 * dt, 0.0);
        state.omega2 = finite_or(state.omega2 + alpha2 * dt, 0.0);
        state.theta1 = finite_or(state.theta1 + state.omega1 * dt, 0.0);
        state.theta2 = finite_or(state.theta2 + state.omega2 * dt, 0.0);
    }
}

fn hanging(length: Scalar, theta: Scalar) -> Vector {
    Vector::new(length * theta.sin(), -length * theta.cos())
}

fn single_from(params: &PendulumParams) -> SingleState {
    SingleState {
        theta: params.initial_angle.to_radians(),
        omega: 0.0,
    }
}

fn double_from(params: &PendulumParams, config: &PendulumConfig) -> DoubleState {
    DoubleState {
        theta1: params.angle1.to_radians(),
        omega1: 0.0,
        theta2: params.angle2.to_radians(),
        omega2: 0.0,
        trail: HistorySeries::new(config.trail_capacity),
    }
}

/// Angular accelerations of the coupled pendulum from the Lagrangian equations.
///
/// The shared denominator `(m1+m2)L1 - m2 L1 cos²Δθ` is floored at `floor`
/// (keeping its sign) and a non-finite result is replaced by zero.
pub fn double_accelerations(
    params: &PendulumParams,
    state: &DoubleState,
    floor: Scalar,
) -> (Scalar, Scalar) {
    let (m1, m2, l1, l2, g) = (
        params.mass1,
        params.mass2,
        params.length1,
        params.length2,
        params.gravity,
    );
    let (t1, t2, w1, w2) = (state.theta1, state.theta2, state.omega1, state.omega2);
    let delta = t2 - t1;
    let (sin_d, cos_d) = delta.sin_cos();

    let mut denom1 = (m1 + m2) * l1 - m2 * l1 * cos_d * cos_d;
    if denom1.abs() < floor {
        denom1 = floor.copysign(denom1);
    }
    let denom2 = (l2 / l1) * denom1;

    let num1 = -m2 * l1 * w1 * w1 * sin_d * cos_d + m2 * g * t2.sin() * cos_d
        + m2 * l2 * w2 * w2 * sin_d
        - (m1 + m2) * g * t1.sin();
    let num2 = -m2 * l2 * w2 * w2 * sin_d * cos_d + (m1 + m2) * g * t1.sin() * cos_d
        + (m1 + m2) * l1 * w1 * w1 * sin_d
        - (m1 + m2) * g * t2.sin();

    (finite_or(num1 / denom1, 0.0), finite_or(num2 / denom2, 0.0))
}

impl Simulation for PendulumSimulation {
    type Command = PendulumCommand;

    fn name(&self) -> &'static str {
        "pendulum"
    }

    fn apply(&mut self, command: PendulumCommand) {
        debug!("Pendulum command {command:?}");
        let current = self.kind();
        let p = &mut self.params;
        match command {
            PendulumCommand::SetKind(kind) => {
                if kind != current {
                    self.mode = match kind {
                        PendulumKind::Single => Mode::Single(single_from(p)),
                        PendulumKind::Double => Mode::Double(double_from(p, &self.config)),
                    };
                    self.time = 0.0;
                    self.history.clear();
                }
            }
            PendulumCommand::SetLength(v) => p.length = PENDULUM_LENGTH.sanitize(v, p.length),
            PendulumCommand::SetMass(v) => p.mass = PENDULUM_MASS.sanitize(v, p.mass),
            PendulumCommand::SetGravity(v) => p.gravity = GRAVITY.sanitize(v, p.gravity),
            PendulumCommand::SetInitialAngle(v) => {
                p.initial_angle = PENDULUM_ANGLE.sanitize(v, p.initial_angle);
                self.rebuild_if_unstarted();
            }
            PendulumCommand::SetDampingEnabled(on) => p.damping_enabled = on,
            PendulumCommand::SetDamping(v) => p.damping = DAMPING.sanitize(v, p.damping),
            PendulumCommand::SetSmallAngle(on) => p.small_angle = on,
            PendulumCommand::SetLength1(v) => p.length1 = PENDULUM_LENGTH.sanitize(v, p.length1),
            PendulumCommand::SetLength2(v) => p.length2 = PENDULUM_LENGTH.sanitize(v, p.length2),
            PendulumCommand::SetMass1(v) => p.mass1 = PENDULUM_MASS.sanitize(v, p.mass1),
            PendulumCommand::SetMass2(v) => p.mass2 = PENDULUM_MASS.sanitize(v, p.mass2),
            PendulumCommand::SetAngle1(v) => {
                p.angle1 = PENDULUM_ANGLE.sanitize(v, p.angle1);
                self.rebuild_if_unstarted();
            }
            PendulumCommand::SetAngle2(v) => {
                p.angle2 = PENDULUM_ANGLE.sanitize(v, p.angle2);
                self.rebuild_if_unstarted();
            }
            PendulumCommand::SetTrail(on) => {
                p.trail_enabled = on;
                if let (false, Mode::Double(d)) = (on, &mut self.mode) {
                    d.trail.clear();
                }
            }
        }
    }

    /// One fixed step per tick; the wall-clock `dt` only gates whether to step.
    fn step(&mut self, dt: Scalar) -> StepOutcome {
        if dt <= 0.0 {
            return StepOutcome::Continue;
        }
        let h = self.config.time_step;
        match &mut self.mode {
            Mode::Single(state) => Self::step_single(&self.params, state, h),
            Mode::Double(state) => {
                Self::step_double(&self.params, state, h, self.config.denominator_floor)
            }
        }
        self.time += h;

        if self.params.trail_enabled {
            let p = &self.params;
            if let Mode::Double(d) = &mut self.mode {
                let bob = hanging(p.length1, d.theta1) + hanging(p.length2, d.theta2);
                d.trail.push(self.time, bob);
            }
        }

        let (displacement, angular_velocity) = match &self.mode {
            Mode::Single(s) => (s.theta, s.omega),
            Mode::Double(d) => (d.theta1, d.omega1),
        };
        let sample = PendulumSample {
            displacement: displacement.to_degrees(),
            angular_velocity,
            energy: self.energy(),
        };
        self.history.push(self.time, sample);
        StepOutcome::Continue
    }

    fn reset(&mut self) {
        self.rebuild();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn simulation() -> PendulumSimulation {
        PendulumSimulation::new(&PendulumConfig::default())
    }

    #[test]
    fn test_period_matches_formula() {
        let sim = simulation();
        assert_relative_eq!(sim.period(), 2.006, epsilon = 1e-3);
    }

    #[test]
    fn test_released_bob_swings_toward_centre() {
        let mut sim = simulation();
        sim.step(0.016);
        let Mode::Single(s) = sim.mode() else {
            panic!("expected single mode");
        };
        assert!(s.omega < 0.0);
        assert!(s.theta < 30f64.to_radians());
    }

    #[test]
    fn test_zero_dt_does_not_step() {
        let mut sim = simulation();
        sim.step(0.0);
        assert_eq!(sim.time(), 0.0);
        assert!(sim.history().is_empty());
    }

    #[test]
    fn test_damping_removes_energy() {
        let mut damped = simulation();
        damped.apply(PendulumCommand::SetDampingEnabled(true));
        damped.apply(PendulumCommand::SetDamping(0.5));
        let start = damped.energy().total();
        for _ in 0..500 {
            damped.step(0.016);
        }
        assert!(damped.energy().total() < 0.5 * start);
    }

    #[test]
    fn test_small_angle_form_used_only_near_rest() {
        let params = PendulumParams {
            small_angle: true,
            ..PendulumParams::default()
        };
        let mut near = SingleState {
            theta: 0.1,
            omega: 0.0,
        };
        PendulumSimulation::step_single(&params, &mut near, 1.0);
        assert_relative_eq!(near.omega, -9.81 * 0.1);

        let mut far = SingleState {
            theta: 0.5,
            omega: 0.0,
        };
        PendulumSimulation::step_single(&params, &mut far, 1.0);
        assert_relative_eq!(far.omega, -9.81 * 0.5f64.sin());
    }

    #[test]
    fn test_double_mode_records_trail() {
        let mut sim = simulation();
        sim.apply(PendulumCommand::SetKind(PendulumKind::Double));
        for _ in 0..10 {
            sim.step(0.016);
        }
        let Mode::Double(d) = sim.mode() else {
            panic!("expected double mode");
        };
        assert_eq!(d.trail.len(), 10);
        sim.apply(PendulumCommand::SetTrail(false));
        let Mode::Double(d) = sim.mode() else {
            panic!("expected double mode");
        };
        assert!(d.trail.is_empty());
    }

    #[test]
    fn test_double_accelerations_stay_finite_for_degenerate_inputs() {
        let params = PendulumParams {
            mass1: 0.0,
            ..PendulumParams::default()
        };
        let state = DoubleState {
            theta1: 0.3,
            omega1: 2.0,
            theta2: 0.3,
            omega2: -1.0,
            trail: HistorySeries::new(1),
        };
        let (a1, a2) = double_accelerations(&params, &state, 1e-9);
        assert!(a1.is_finite());
        assert!(a2.is_finite());
    }

    #[test]
    fn test_double_at_rest_stays_at_rest() {
        let params = PendulumParams::default();
        let state = DoubleState {
            theta1: 0.0,
            omega1: 0.0,
            theta2: 0.0,
            omega2: 0.0,
            trail: HistorySeries::new(1),
        };
        let (a1, a2) = double_accelerations(&params, &state, 1e-9);
        assert_relative_eq!(a1, 0.0);
        assert_relative_eq!(a2, 0.0);
    }

    #[test]
    fn test_angle_edit_applies_only_before_motion() {
        let mut sim = simulation();
        sim.apply(PendulumCommand::SetInitialAngle(10.0));
        let Mode::Single(s) = sim.mode() else {
            panic!("expected single mode");
        };
        assert_relative_eq!(s.theta, 10f64.to_radians());
        sim.step(0.016);
        sim.apply(PendulumCommand::SetInitialAngle(60.0));
        let Mode::Single(s) = sim.mode() else {
            panic!("expected single mode");
        };
        assert!(s.theta < 10f64.to_radians());
        sim.reset();
        let Mode::Single(s) = sim.mode() else {
            panic!("expected single mode");
        };
        assert_relative_eq!(s.theta, 60f64.to_radians());
    }

    #[test]
    fn test_forces_at_rest() {
        let mut sim = simulation();
        sim.apply(PendulumCommand::SetInitialAngle(0.0));
        let forces = sim.forces().unwrap();
        assert_relative_eq!(forces.weight, 9.81);
        assert_relative_eq!(forces.tension, 9.81);
        assert_relative_eq!(forces.restoring, 0.0);
    }
}
