//! Projectile launches with optional quadratic drag, alone or two side by side.

use log::{debug, info};
use rand::Rng;
use rand_chacha::ChaCha8Rng;
use std::collections::VecDeque;

use super::camera::{Bounds, CameraView, FollowTarget};
use super::history::HistorySeries;
use super::variables::{DRAG_COEFFICIENT, GRAVITY, LAUNCH_ANGLE, LAUNCH_SPEED, PROJECTILE_MASS};
use super::{Scalar, Simulation, StepOutcome, Vector, rng_from_optional_seed, safe_div};
use crate::config::{CameraConfig, ProjectileConfig};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LaunchParams {
    /// Launch speed in m/s.
    pub speed: Scalar,
    /// Elevation in degrees.
    pub angle: Scalar,
    pub gravity: Scalar,
    pub mass: Scalar,
    pub drag_coefficient: Scalar,
    pub air_resistance: bool,
}

impl Default for LaunchParams {
    fn default() -> Self {
        Self {
            speed: LAUNCH_SPEED.default,
            angle: LAUNCH_ANGLE.default,
            gravity: GRAVITY.default,
            mass: PROJECTILE_MASS.default,
            drag_coefficient: DRAG_COEFFICIENT.default,
            air_resistance: false,
        }
    }
}

impl LaunchParams {
    fn second() -> Self {
        Self {
            speed: 60.0,
            angle: 30.0,
            ..Self::default()
        }
    }

    pub fn initial_velocity(&self) -> Vector {
        let (sin, cos) = self.angle.to_radians().sin_cos();
        Vector::new(cos, sin) * self.speed
    }

    /// Drag-free range v0² sin 2θ / g.
    pub fn predicted_range(&self) -> Scalar {
        safe_div(self.speed * self.speed * (2.0 * self.angle.to_radians()).sin(), self.gravity)
    }

    pub fn predicted_max_height(&self) -> Scalar {
        let sin = self.angle.to_radians().sin();
        safe_div(self.speed * self.speed * sin * sin, 2.0 * self.gravity)
    }

    pub fn predicted_time_of_flight(&self) -> Scalar {
        safe_div(2.0 * self.speed * self.angle.to_radians().sin(), self.gravity)
    }

    fn apply(&mut self, parameter: LaunchParameter) {
        match parameter {
            LaunchParameter::Speed(v) => self.speed = LAUNCH_SPEED.sanitize(v, self.speed),
            LaunchParameter::Angle(v) => self.angle = LAUNCH_ANGLE.sanitize(v, self.angle),
            LaunchParameter::Gravity(v) => self.gravity = GRAVITY.sanitize(v, self.gravity),
            LaunchParameter::Mass(v) => self.mass = PROJECTILE_MASS.sanitize(v, self.mass),
            LaunchParameter::DragCoefficient(v) => {
                self.drag_coefficient = DRAG_COEFFICIENT.sanitize(v, self.drag_coefficient)
            }
            LaunchParameter::AirResistance(on) => self.air_resistance = on,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LaunchParameter {
    Speed(Scalar),
    Angle(Scalar),
    Gravity(Scalar),
    Mass(Scalar),
    DragCoefficient(Scalar),
    AirResistance(bool),
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ProjectileCommand {
    /// Edits the launch parameters of projectile `slot` (0 or 1).
    Set { slot: usize, parameter: LaunchParameter },
    SetComparison(bool),
    /// Copies the first projectile's parameters onto the second.
    SyncParameters,
    Randomize,
    SetAutoScale(bool),
    SetFollow(Option<FollowTarget>),
    SetViewport(Vector),
    Pan(Vector),
    Zoom { factor: Scalar, anchor: Vector },
    ResetView,
}

#[derive(Debug, Clone)]
pub struct Flight {
    pub params: LaunchParams,
    pub position: Vector,
    pub velocity: Vector,
    pub trajectory: VecDeque<Vector>,
    capacity: usize,
    /// Flight time at `position`.
    elapsed: Scalar,
    /// Flight time of the newest trajectory point.
    recorded_time: Scalar,
    peak_height: Scalar,
}

impl Flight {
    fn new(params: LaunchParams, capacity: usize) -> Self {
        Flight {
            params,
            position: Vector::ZERO,
            velocity: params.initial_velocity(),
            trajectory: VecDeque::new(),
            capacity: capacity.max(2),
            elapsed: 0.0,
            recorded_time: 0.0,
            peak_height: 0.0,
        }
    }

    pub fn airborne(&self) -> bool {
        self.position.y >= 0.0
    }

    pub fn speed(&self) -> Scalar {
        self.velocity.length()
    }

    pub fn acceleration(&self, air_density: Scalar, area: Scalar) -> Vector {
        let mut acceleration = Vector::new(0.0, -self.params.gravity);
        if self.params.air_resistance {
            let speed = self.speed();
            if speed > 0.0 {
                let drag = 0.5 * self.params.drag_coefficient * air_density * area * speed * speed;
                acceleration -= self.velocity / speed * safe_div(drag, self.params.mass);
            }
        }
        acceleration
    }

    /// Records the current position, then integrates one explicit Euler step.
    fn advance(&mut self, dt: Scalar, air_density: Scalar, area: Scalar) {
        if self.trajectory.len() == self.capacity {
            self.trajectory.pop_front();
        }
        self.trajectory.push_back(self.position);
        self.recorded_time = self.elapsed;
        self.peak_height = self.peak_height.max(self.position.y);

        let acceleration = self.acceleration(air_density, area);
        self.velocity += acceleration * dt;
        self.position += self.velocity * dt;
        self.elapsed += dt;
        if !self.position.is_finite() || !self.velocity.is_finite() {
            self.velocity = Vector::ZERO;
            self.position.y = -1.0;
        }
    }

    /// Highest recorded point, including points the trajectory cap has dropped.
    pub fn max_height(&self) -> Scalar {
        self.peak_height
    }

    pub fn results(&self) -> FlightResults {
        FlightResults {
            time_of_flight: self.recorded_time,
            max_height: self.peak_height,
            range: self.trajectory.back().map_or(0.0, |p| p.x),
            final_speed: self.speed(),
        }
    }
}

#[derive(Debug, Clone)]
pub enum Flights {
    Single(Flight),
    Comparison([Flight; 2]),
}

impl Flights {
    pub fn iter(&self) -> impl Iterator<Item = &Flight> {
        match self {
            Flights::Single(flight) => std::slice::from_ref(flight).iter(),
            Flights::Comparison(flights) => flights.iter(),
        }
    }

    fn iter_mut(&mut self) -> impl Iterator<Item = &mut Flight> {
        match self {
            Flights::Single(flight) => std::slice::from_mut(flight).iter_mut(),
            Flights::Comparison(flights) => flights.iter_mut(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FlightResults {
    pub time_of_flight: Scalar,
    pub max_height: Scalar,
    pub range: Scalar,
    pub final_speed: Scalar,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Winner {
    First,
    Second,
    Tie,
}

impl Winner {
    fn of(first: Scalar, second: Scalar) -> Self {
        if first > second {
            Winner::First
        } else if second > first {
            Winner::Second
        } else {
            Winner::Tie
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ComparisonResults {
    pub first: FlightResults,
    pub second: FlightResults,
    pub range_winner: Winner,
    pub height_winner: Winner,
    pub time_winner: Winner,
    pub range_difference: Scalar,
    pub height_difference: Scalar,
    pub time_difference: Scalar,
}

impl ComparisonResults {
    pub fn new(first: FlightResults, second: FlightResults) -> Self {
        ComparisonResults {
            first,
            second,
            range_winner: Winner::of(first.range, second.range),
            height_winner: Winner::of(first.max_height, second.max_height),
            time_winner: Winner::of(first.time_of_flight, second.time_of_flight),
            range_difference: (first.range - second.range).abs(),
            height_difference: (first.max_height - second.max_height).abs(),
            time_difference: (first.time_of_flight - second.time_of_flight).abs(),
        }
    }
}

/// Speed and height of each projectile at one instant, for the comparison graphs.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ComparisonSample {
    pub speeds: [Scalar; 2],
    pub heights: [Scalar; 2],
}

pub struct ProjectileSimulation {
    launches: [LaunchParams; 2],
    comparison: bool,
    flights: Flights,
    time: Scalar,
    results: Option<ComparisonResults>,
    history: HistorySeries<ComparisonSample>,
    camera: CameraView,
    rng: ChaCha8Rng,
    config: ProjectileConfig,
}

impl ProjectileSimulation {
    pub fn new(config: &ProjectileConfig, camera: &CameraConfig, seed: Option<u64>) -> Self {
        let launches = [LaunchParams::default(), LaunchParams::second()];
        ProjectileSimulation {
            launches,
            comparison: false,
            flights: Flights::Single(Flight::new(launches[0], config.trajectory_capacity)),
            time: 0.0,
            results: None,
            history: HistorySeries::new(config.history_capacity),
            camera: CameraView::new(camera),
            rng: rng_from_optional_seed(seed),
            config: config.clone(),
        }
    }

    pub fn launch_params(&self, slot: usize) -> Option<&LaunchParams> {
        self.launches.get(slot)
    }

    pub fn comparison(&self) -> bool {
        self.comparison
    }

    pub fn flights(&self) -> &Flights {
        &self.flights
    }

    pub fn time(&self) -> Scalar {
        self.time
    }

    pub fn results(&self) -> Option<&ComparisonResults> {
        self.results.as_ref()
    }

    pub fn history(&self) -> &HistorySeries<ComparisonSample> {
        &self.history
    }

    pub fn camera(&self) -> &CameraView {
        &self.camera
    }

    pub fn has_flown(&self) -> bool {
        self.flights.iter().any(|f| !f.trajectory.is_empty())
    }

    fn build_flights(&self) -> Flights {
        let capacity = self.config.trajectory_capacity;
        if self.comparison {
            Flights::Comparison([
                Flight::new(self.launches[0], capacity),
                Flight::new(self.launches[1], capacity),
            ])
        } else {
            Flights::Single(Flight::new(self.launches[0], capacity))
        }
    }

    /// Drag-free landing point and apex over every active launch.
    pub fn predictions(&self) -> (Scalar, Scalar) {
        let active = if self.comparison { &self.launches[..] } else { &self.launches[..1] };
        active.iter().fold((0.0, 0.0), |(range, height), p| {
            (range.max(p.predicted_range()), height.max(p.predicted_max_height()))
        })
    }

    fn bounds(&self) -> Bounds {
        let mut bounds = Bounds::origin();
        for flight in self.flights.iter() {
            for point in &flight.trajectory {
                bounds.include(*point);
            }
        }
        let (range, height) = self.predictions();
        bounds.include(Vector::new(range, height));
        bounds
    }

    fn follow_point(&self) -> Option<Vector> {
        let target = self.camera.follow()?;
        match (&self.flights, target) {
            (Flights::Single(flight), _) => Some(flight.position),
            (Flights::Comparison([first, _]), FollowTarget::First) => Some(first.position),
            (Flights::Comparison([_, second]), FollowTarget::Second) => Some(second.position),
            (Flights::Comparison(flights), FollowTarget::Both) => {
                let airborne: Vec<Vector> =
                    flights.iter().filter(|f| f.airborne()).map(|f| f.position).collect();
                if airborne.is_empty() {
                    None
                } else {
                    Some(airborne.iter().copied().sum::<Vector>() / airborne.len() as Scalar)
                }
            }
        }
    }

    fn relaunch_if_unstarted(&mut self) {
        if self.time == 0.0 {
            self.flights = self.build_flights();
        }
    }

    fn randomize(&mut self) {
        for launch in &mut self.launches {
            launch.speed = self.rng.random_range(20.0..=100.0_f64).round();
            launch.angle = self.rng.random_range(15.0..=75.0_f64).round();
        }
        info!(
            "Randomized launches: {:.0} m/s at {:.0}°, {:.0} m/s at {:.0}°",
            self.launches[0].speed, self.launches[0].angle, self.launches[1].speed, self.launches[1].angle
        );
    }
}

impl Simulation for ProjectileSimulation {
    type Command = ProjectileCommand;

    fn name(&self) -> &'static str {
        "projectile"
    }

    fn apply(&mut self, command: ProjectileCommand) {
        debug!("Projectile command {command:?}");
        match command {
            ProjectileCommand::Set { slot, parameter } => {
                if let Some(launch) = self.launches.get_mut(slot) {
                    launch.apply(parameter);
                    self.relaunch_if_unstarted();
                }
            }
            ProjectileCommand::SetComparison(on) => {
                if on != self.comparison {
                    self.comparison = on;
                    self.reset();
                }
            }
            ProjectileCommand::SyncParameters => {
                self.launches[1] = self.launches[0];
                self.relaunch_if_unstarted();
            }
            ProjectileCommand::Randomize => {
                self.randomize();
                self.relaunch_if_unstarted();
            }
            ProjectileCommand::SetAutoScale(on) => {
                self.camera.set_auto_scale(on);
                if on {
                    let bounds = self.bounds();
                    self.camera.fit(bounds, self.comparison);
                }
            }
            ProjectileCommand::SetFollow(target) => self.camera.set_follow(target),
            ProjectileCommand::SetViewport(size) => self.camera.set_viewport(size),
            ProjectileCommand::Pan(delta) => self.camera.pan(delta),
            ProjectileCommand::Zoom { factor, anchor } => self.camera.zoom(factor, anchor),
            ProjectileCommand::ResetView => self.camera.reset_view(),
        }
    }

    /// One fixed step per tick with positive `dt`, whatever its size.
    fn step(&mut self, dt: Scalar) -> StepOutcome {
        if dt <= 0.0 {
            return StepOutcome::Continue;
        }
        let h = self.config.time_step;
        let (density, area) = (self.config.air_density, self.config.reference_area);
        self.time += h;
        for flight in self.flights.iter_mut().filter(|f| f.airborne()) {
            flight.advance(h, density, area);
        }

        if let Flights::Comparison([first, second]) = &self.flights {
            self.history.push(
                self.time,
                ComparisonSample {
                    speeds: [first.speed(), second.speed()],
                    heights: [first.position.y.max(0.0), second.position.y.max(0.0)],
                },
            );
        }

        let bounds = self.bounds();
        let follow = self.follow_point();
        self.camera.update(bounds, self.comparison, follow);

        if self.flights.iter().any(Flight::airborne) {
            return StepOutcome::Continue;
        }
        if let Flights::Comparison([first, second]) = &self.flights {
            let results = ComparisonResults::new(first.results(), second.results());
            info!(
                "Comparison finished: ranges {:.1} m and {:.1} m",
                results.first.range, results.second.range
            );
            self.results = Some(results);
        }
        StepOutcome::Finished
    }

    fn observe_host_time(&mut self, now: Scalar) {
        self.camera.set_host_time(now);
    }

    fn reset(&mut self) {
        self.flights = self.build_flights();
        self.time = 0.0;
        self.results = None;
        self.history.clear();
        self.camera.reset_view();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::simulation::Scheduler;
    use approx::assert_relative_eq;

    fn simulation() -> ProjectileSimulation {
        ProjectileSimulation::new(&ProjectileConfig::default(), &CameraConfig::default(), Some(3))
    }

    fn run(sim: &mut ProjectileSimulation) -> usize {
        let mut steps = 0;
        while sim.step(0.02) == StepOutcome::Continue {
            steps += 1;
            assert!(steps < 100_000, "projectile never landed");
        }
        steps + 1
    }

    #[test]
    fn test_predictions() {
        let launch = LaunchParams::default();
        assert_relative_eq!(launch.predicted_range(), 254.84, epsilon = 0.01);
        assert_relative_eq!(launch.predicted_max_height(), 63.71, epsilon = 0.01);
        assert_relative_eq!(launch.predicted_time_of_flight(), 7.208, epsilon = 1e-3);
    }

    #[test]
    fn test_trajectory_starts_at_origin_and_stays_above_ground() {
        let mut sim = simulation();
        run(&mut sim);
        let Flights::Single(flight) = sim.flights() else {
            panic!("expected single flight");
        };
        assert_eq!(flight.trajectory.front(), Some(&Vector::ZERO));
        assert!(flight.trajectory.iter().all(|p| p.y >= 0.0));
        assert!(flight.position.y < 0.0);
    }

    #[test]
    fn test_drag_shortens_range() {
        let mut plain = simulation();
        run(&mut plain);
        let mut dragged = simulation();
        dragged.apply(ProjectileCommand::Set {
            slot: 0,
            parameter: LaunchParameter::AirResistance(true),
        });
        run(&mut dragged);
        let range = |sim: &ProjectileSimulation| {
            sim.flights().iter().next().and_then(|f| f.trajectory.back()).map(|p| p.x)
        };
        assert!(range(&dragged).unwrap() < range(&plain).unwrap());
    }

    #[test]
    fn test_comparison_reports_winners() {
        let mut sim = simulation();
        sim.apply(ProjectileCommand::SetComparison(true));
        run(&mut sim);
        let results = sim.results().unwrap();
        // 60 m/s at 30° carries further (317.8 m) but 50 m/s at 45° climbs higher
        assert_eq!(results.range_winner, Winner::Second);
        assert_eq!(results.height_winner, Winner::First);
        assert_relative_eq!(
            results.range_difference,
            (results.first.range - results.second.range).abs()
        );
        assert!(!sim.history().is_empty());
    }

    #[test]
    fn test_sync_makes_a_tie() {
        let mut sim = simulation();
        sim.apply(ProjectileCommand::SetComparison(true));
        sim.apply(ProjectileCommand::SyncParameters);
        run(&mut sim);
        let results = sim.results().unwrap();
        assert_eq!(results.range_winner, Winner::Tie);
        assert_eq!(results.time_difference, 0.0);
    }

    #[test]
    fn test_randomize_stays_in_range() {
        let mut sim = simulation();
        for _ in 0..20 {
            sim.apply(ProjectileCommand::Randomize);
            for slot in 0..2 {
                let launch = sim.launch_params(slot).unwrap();
                assert!((20.0..=100.0).contains(&launch.speed));
                assert!((15.0..=75.0).contains(&launch.angle));
            }
        }
    }

    #[test]
    fn test_trajectory_is_capped() {
        let config = ProjectileConfig {
            trajectory_capacity: 16,
            ..ProjectileConfig::default()
        };
        let mut sim = ProjectileSimulation::new(&config, &CameraConfig::default(), Some(1));
        run(&mut sim);
        let Flights::Single(flight) = sim.flights() else {
            panic!("expected single flight");
        };
        assert_eq!(flight.trajectory.len(), 16);
    }

    #[test]
    fn test_results_survive_trajectory_cap() {
        let mut full = simulation();
        run(&mut full);
        let capped_config = ProjectileConfig {
            trajectory_capacity: 16,
            ..ProjectileConfig::default()
        };
        let mut capped = ProjectileSimulation::new(&capped_config, &CameraConfig::default(), Some(3));
        run(&mut capped);
        let results = |sim: &ProjectileSimulation| sim.flights().iter().next().unwrap().results();
        let (full, capped) = (results(&full), results(&capped));
        assert_relative_eq!(capped.time_of_flight, full.time_of_flight, epsilon = 1e-9);
        assert_relative_eq!(capped.max_height, full.max_height, epsilon = 1e-9);
        assert_relative_eq!(capped.range, full.range, epsilon = 1e-9);
        assert_relative_eq!(full.time_of_flight, 7.2, epsilon = 0.05);
        assert_relative_eq!(full.max_height, 63.7, epsilon = 0.7);
    }

    #[test]
    fn test_camera_cooldown_runs_on_host_time_at_full_speed() {
        let mut scheduler = Scheduler::new(simulation(), 0.25);
        scheduler.set_time_scale(10.0);
        scheduler.start();
        scheduler.tick(0.0);
        scheduler.push(ProjectileCommand::Pan(Vector::new(10.0, 0.0)));
        let mut frame = 1;
        scheduler.tick(1.0 / 60.0);
        while scheduler.simulation().camera().suspended() {
            frame += 1;
            scheduler.tick(frame as Scalar / 60.0);
            assert!(frame < 600, "cooldown never lifted");
        }
        let held_for = (frame - 1) as Scalar / 60.0;
        assert!((1.99..2.05).contains(&held_for), "held for {held_for} s");
    }

    #[test]
    fn test_camera_cooldown_lifts_while_paused() {
        let mut scheduler = Scheduler::new(simulation(), 0.25);
        scheduler.start();
        scheduler.tick(0.0);
        scheduler.pause();
        scheduler.push(ProjectileCommand::Zoom {
            factor: 1.1,
            anchor: Vector::new(100.0, 100.0),
        });
        scheduler.tick(0.5);
        assert!(scheduler.simulation().camera().suspended());
        scheduler.tick(3.0);
        assert!(!scheduler.simulation().camera().suspended());
    }

    #[test]
    fn test_invalid_slot_is_ignored() {
        let mut sim = simulation();
        sim.apply(ProjectileCommand::Set {
            slot: 5,
            parameter: LaunchParameter::Speed(10.0),
        });
        assert_eq!(sim.launch_params(0).unwrap().speed, 50.0);
    }
}
