//! Electron transfer between two bodies: friction, induction and conduction.
//!
//! Scene coordinates are drawing units with the origin at the top-left and y
//! pointing down. Each mode moves electrons from a donor body to an acceptor
//! body; every arrival credits both bodies in one [`Ledger::transfer`], so the
//! donor's gain always equals the acceptor's loss.

use log::{debug, info};
use rand::Rng;
use rand_chacha::ChaCha8Rng;
use strum_macros::EnumIter;

use super::history::HistorySeries;
use super::variables::SPEED;
use super::{Scalar, Simulation, StepOutcome, Vector, rng_from_optional_seed};
use crate::config::ChargeConfig;

pub const SCENE_SIZE: Vector = Vector::new(800.0, 400.0);

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter)]
pub enum ChargeMode {
    /// Rubbing wool on a rod: wool gives electrons to the rod.
    Friction,
    /// A charged rod near a sphere pushes the sphere's electrons into the ground.
    Induction,
    /// A neutral body touching a positive one gives it electrons.
    Conduction,
}

impl ChargeMode {
    pub fn donor_name(&self) -> &'static str {
        match self {
            ChargeMode::Friction => "Wool",
            ChargeMode::Induction => "Sphere",
            ChargeMode::Conduction => "Right",
        }
    }

    pub fn acceptor_name(&self) -> &'static str {
        match self {
            ChargeMode::Friction => "Rod",
            ChargeMode::Induction => "Ground",
            ChargeMode::Conduction => "Left",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            ChargeMode::Friction => {
                "Friction: electrons move from wool to rod, leaving rod negative and wool positive."
            }
            ChargeMode::Induction => {
                "Induction: electrons in the sphere are repelled by the nearby negative rod; with ground, electrons leave to earth."
            }
            ChargeMode::Conduction => {
                "Conduction: electrons move from the neutral object to the positively charged one on contact."
            }
        }
    }
}

impl std::fmt::Display for ChargeMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ChargeMode::Friction => write!(f, "Friction"),
            ChargeMode::Induction => write!(f, "Induction"),
            ChargeMode::Conduction => write!(f, "Conduction"),
        }
    }
}

/// Net charges in elementary charges.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Ledger {
    pub donor: i32,
    pub acceptor: i32,
}

impl Ledger {
    /// One electron leaves the donor and lands on the acceptor.
    pub fn transfer(&mut self) {
        self.donor += 1;
        self.acceptor -= 1;
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Electron {
    pub position: Vector,
    pub velocity: Vector,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ChargeCommand {
    SetMode(ChargeMode),
    SetGrounded(bool),
    SetSpeed(Scalar),
}

pub struct ChargeSimulation {
    mode: ChargeMode,
    grounded: bool,
    speed: Scalar,
    ledger: Ledger,
    electrons: Vec<Electron>,
    emission_budget: Scalar,
    started: bool,
    equilibrium: bool,
    time: Scalar,
    history: HistorySeries<Ledger>,
    rng: ChaCha8Rng,
    config: ChargeConfig,
}

impl ChargeSimulation {
    pub fn new(mode: ChargeMode, config: &ChargeConfig, seed: Option<u64>) -> Self {
        let mut simulation = ChargeSimulation {
            mode,
            grounded: false,
            speed: SPEED.default,
            ledger: Ledger::default(),
            electrons: Vec::new(),
            emission_budget: 0.0,
            started: false,
            equilibrium: false,
            time: 0.0,
            history: HistorySeries::new(config.history_capacity),
            rng: rng_from_optional_seed(seed),
            config: config.clone(),
        };
        simulation.ledger = simulation.initial_ledger();
        simulation
    }

    pub fn initial_ledger(&self) -> Ledger {
        match self.mode {
            ChargeMode::Conduction => Ledger {
                donor: 0,
                acceptor: self.config.conduction_initial_charge,
            },
            _ => Ledger::default(),
        }
    }

    pub fn mode(&self) -> ChargeMode {
        self.mode
    }

    pub fn grounded(&self) -> bool {
        self.grounded
    }

    pub fn speed(&self) -> Scalar {
        self.speed
    }

    pub fn ledger(&self) -> Ledger {
        self.ledger
    }

    pub fn electrons(&self) -> &[Electron] {
        &self.electrons
    }

    pub fn equilibrium(&self) -> bool {
        self.equilibrium
    }

    pub fn history(&self) -> &HistorySeries<Ledger> {
        &self.history
    }

    /// Electrons emitted per second at the current speed.
    pub fn emission_rate(&self) -> Scalar {
        (self.config.base_rate + self.config.rate_gain * self.speed) * self.speed
    }

    fn at_equilibrium(&self) -> bool {
        let cap = self.config.cap;
        let q = self.ledger;
        match self.mode {
            ChargeMode::Friction => q.acceptor.abs() >= cap,
            ChargeMode::Induction => self.grounded && q.donor >= cap,
            ChargeMode::Conduction => q.acceptor <= 0 || q.donor >= cap,
        }
    }

    fn emitting(&self) -> bool {
        if self.equilibrium {
            return false;
        }
        match self.mode {
            ChargeMode::Induction => self.grounded && self.ledger.donor < self.config.cap,
            _ => true,
        }
    }

    /// Random start and end points of one electron's path.
    fn path(&mut self) -> (Vector, Vector) {
        let (w, h) = (SCENE_SIZE.x, SCENE_SIZE.y);
        let rng = &mut self.rng;
        match self.mode {
            ChargeMode::Friction => (
                Vector::new(130.0 + rng.random_range(0.0..60.0), h / 2.0 + rng.random_range(-20.0..20.0)),
                Vector::new(w - 190.0 + rng.random_range(0.0..60.0), h / 2.0 + rng.random_range(-20.0..20.0)),
            ),
            ChargeMode::Induction => (
                Vector::new(w / 2.0 + 80.0 + rng.random_range(0.0..40.0), h / 2.0 + rng.random_range(-20.0..20.0)),
                Vector::new(w / 2.0 + 200.0, h / 2.0 + 80.0),
            ),
            ChargeMode::Conduction => (
                Vector::new(w / 2.0 + 100.0 + rng.random_range(0.0..40.0), h / 2.0 + rng.random_range(-20.0..20.0)),
                Vector::new(w / 2.0 - 120.0, h / 2.0 + rng.random_range(-10.0..10.0)),
            ),
        }
    }

    fn arrived(&self, electron: &Electron) -> bool {
        let w = SCENE_SIZE.x;
        match self.mode {
            ChargeMode::Friction => electron.position.x > w - 220.0,
            ChargeMode::Induction => electron.position.x > w / 2.0 + 180.0,
            ChargeMode::Conduction => electron.position.x < w / 2.0 - 140.0,
        }
    }

    /// Velocity is the whole displacement times a factor, so every path takes about the same time.
    fn emit(&mut self, factor: Scalar) {
        let (start, end) = self.path();
        self.electrons.push(Electron {
            position: start,
            velocity: (end - start) * factor * self.speed,
        });
    }

    fn burst(&mut self) {
        if !self.emitting() {
            return;
        }
        debug!("Seeding {} electrons", self.config.burst_size);
        for _ in 0..self.config.burst_size {
            self.emit(self.config.burst_velocity_factor);
        }
    }

    fn record(&mut self) {
        self.history.push(self.time, self.ledger);
    }
}

impl Simulation for ChargeSimulation {
    type Command = ChargeCommand;

    fn name(&self) -> &'static str {
        "charge transfer"
    }

    fn apply(&mut self, command: ChargeCommand) {
        debug!("Charge command {command:?}");
        match command {
            ChargeCommand::SetMode(mode) => {
                if mode != self.mode {
                    self.mode = mode;
                    self.reset();
                }
            }
            ChargeCommand::SetGrounded(grounded) => {
                let connecting = grounded && !self.grounded;
                self.grounded = grounded;
                if connecting && self.started && self.mode == ChargeMode::Induction {
                    self.burst();
                }
            }
            ChargeCommand::SetSpeed(speed) => self.speed = SPEED.sanitize(speed, self.speed),
        }
    }

    fn step(&mut self, dt: Scalar) -> StepOutcome {
        if self.equilibrium {
            return StepOutcome::Finished;
        }
        if dt <= 0.0 {
            return StepOutcome::Continue;
        }
        self.time += dt;

        if self.emitting() {
            self.emission_budget += self.emission_rate() * dt;
            while self.emission_budget >= 1.0 {
                self.emission_budget -= 1.0;
                self.emit(self.config.velocity_factor);
            }
        } else {
            self.emission_budget = 0.0;
        }

        for electron in &mut self.electrons {
            electron.position += electron.velocity * dt;
        }

        let mut remaining = Vec::with_capacity(self.electrons.len());
        for electron in std::mem::take(&mut self.electrons) {
            if self.equilibrium {
                continue;
            }
            if self.arrived(&electron) {
                self.ledger.transfer();
                self.equilibrium = self.at_equilibrium();
            } else {
                remaining.push(electron);
            }
        }
        self.electrons = if self.equilibrium { Vec::new() } else { remaining };
        self.record();

        if self.equilibrium {
            info!(
                "{} reached equilibrium: {} {:+}e, {} {:+}e",
                self.mode,
                self.mode.donor_name(),
                self.ledger.donor,
                self.mode.acceptor_name(),
                self.ledger.acceptor
            );
            StepOutcome::Finished
        } else {
            StepOutcome::Continue
        }
    }

    fn reset(&mut self) {
        self.ledger = self.initial_ledger();
        self.electrons.clear();
        self.emission_budget = 0.0;
        self.started = false;
        self.equilibrium = false;
        self.time = 0.0;
        self.history.clear();
    }

    fn on_start(&mut self) {
        self.started = true;
        self.burst();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn simulation(mode: ChargeMode) -> ChargeSimulation {
        ChargeSimulation::new(mode, &ChargeConfig::default(), Some(11))
    }

    fn run_to_end(sim: &mut ChargeSimulation) -> usize {
        sim.on_start();
        let mut ticks = 0;
        while sim.step(1.0 / 60.0) == StepOutcome::Continue {
            ticks += 1;
            assert!(ticks < 10_000, "never reached equilibrium");
        }
        ticks
    }

    #[test]
    fn test_friction_stops_exactly_at_cap() {
        let mut sim = simulation(ChargeMode::Friction);
        run_to_end(&mut sim);
        assert_eq!(sim.ledger(), Ledger { donor: 20, acceptor: -20 });
        assert!(sim.electrons().is_empty());
    }

    #[test]
    fn test_induction_needs_ground() {
        let mut sim = simulation(ChargeMode::Induction);
        sim.on_start();
        for _ in 0..300 {
            sim.step(1.0 / 60.0);
        }
        assert_eq!(sim.ledger(), Ledger::default());
        assert!(sim.electrons().is_empty());

        sim.apply(ChargeCommand::SetGrounded(true));
        assert_eq!(sim.electrons().len(), 12);
        while sim.step(1.0 / 60.0) == StepOutcome::Continue {}
        assert_eq!(sim.ledger(), Ledger { donor: 20, acceptor: -20 });
    }

    #[test]
    fn test_conduction_neutralises_positive_body() {
        let mut sim = simulation(ChargeMode::Conduction);
        assert_eq!(sim.ledger().acceptor, 10);
        run_to_end(&mut sim);
        assert_eq!(sim.ledger(), Ledger { donor: 10, acceptor: 0 });
    }

    #[test]
    fn test_conservation_every_tick() {
        for mode in [ChargeMode::Friction, ChargeMode::Conduction] {
            let mut sim = simulation(mode);
            let initial = sim.initial_ledger();
            sim.on_start();
            for _ in 0..200 {
                sim.step(1.0 / 60.0);
                let q = sim.ledger();
                assert_eq!(initial.donor - q.donor, q.acceptor - initial.acceptor);
            }
        }
    }

    #[test]
    fn test_equilibrium_is_sticky() {
        let mut sim = simulation(ChargeMode::Friction);
        run_to_end(&mut sim);
        let settled = sim.ledger();
        let samples = sim.history().len();
        for _ in 0..100 {
            assert_eq!(sim.step(0.1), StepOutcome::Finished);
        }
        sim.apply(ChargeCommand::SetSpeed(10.0));
        sim.step(0.1);
        assert_eq!(sim.ledger(), settled);
        assert_eq!(sim.history().len(), samples);
        sim.reset();
        assert_eq!(sim.ledger(), Ledger::default());
        assert!(!sim.equilibrium());
    }

    #[test]
    fn test_speed_raises_emission_rate() {
        let mut sim = simulation(ChargeMode::Friction);
        assert_eq!(sim.emission_rate(), 14.0);
        sim.apply(ChargeCommand::SetSpeed(2.0));
        assert_eq!(sim.emission_rate(), 36.0);
    }

    #[test]
    fn test_burst_does_not_advance_time() {
        let mut sim = simulation(ChargeMode::Friction);
        sim.on_start();
        assert_eq!(sim.electrons().len(), 12);
        sim.step(0.0);
        assert_eq!(sim.electrons().len(), 12);
        assert!(sim.history().is_empty());
    }
}
