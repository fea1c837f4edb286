//! Series and parallel resistor networks.
//!
//! The electrical solution is a pure function of the voltage and resistor
//! list, recomputed whenever it is asked for. Only the electron animation
//! carries state between ticks.

use log::{debug, info};
use ndarray::Array1;
use rand::Rng;
use rand_chacha::ChaCha8Rng;
use strum_macros::EnumIter;

use super::variables::{RESISTANCE, VOLTAGE};
use super::{EPSILON, Scalar, Simulation, StepOutcome, rng_from_optional_seed};
use crate::config::CircuitConfig;

/// Width of a drawn resistor along the wire, in track units.
pub const RESISTOR_WIDTH: Scalar = 80.0;
const SERIES_LEFT_MARGIN: Scalar = 150.0;
const SERIES_TOP_LENGTH: Scalar = 770.0;
const SERIES_MIN_GAP: Scalar = 20.0;
/// Where a parallel branch's resistor begins and ends, and the branch's full length.
pub const BRANCH_RESISTOR_START: Scalar = 320.0;
pub const BRANCH_RESISTOR_END: Scalar = 420.0;
pub const BRANCH_LENGTH: Scalar = 600.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter)]
pub enum Topology {
    Series,
    Parallel,
}

impl std::fmt::Display for Topology {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Topology::Series => write!(f, "Series"),
            Topology::Parallel => write!(f, "Parallel"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Resistor {
    pub id: usize,
    pub resistance: Scalar,
    pub on: bool,
}

/// Ohm's-law values for one resistor.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResistorReading {
    pub id: usize,
    pub resistance: Scalar,
    pub current: Scalar,
    pub voltage: Scalar,
    pub power: Scalar,
    pub on: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SeriesSolution {
    pub total_resistance: Scalar,
    pub current: Scalar,
    pub total_power: Scalar,
    /// True when any resistor is switched off, which breaks the only path.
    pub open: bool,
    pub readings: Vec<ResistorReading>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ParallelSolution {
    /// `None` when no branch is switched on.
    pub equivalent_resistance: Option<Scalar>,
    pub total_current: Scalar,
    pub total_power: Scalar,
    pub readings: Vec<ResistorReading>,
}

fn resistances(resistors: &[Resistor]) -> Array1<Scalar> {
    resistors.iter().map(|r| RESISTANCE.clamp(r.resistance)).collect()
}

fn on_mask(resistors: &[Resistor]) -> Array1<Scalar> {
    resistors.iter().map(|r| if r.on { 1.0 } else { 0.0 }).collect()
}

pub fn solve_series(voltage: Scalar, resistors: &[Resistor]) -> SeriesSolution {
    let r = resistances(resistors);
    let on = on_mask(resistors);
    let total_resistance = (&r * &on).sum();
    let open = resistors.iter().any(|r| !r.on);
    let current = if open || resistors.is_empty() || total_resistance <= 0.0 {
        0.0
    } else {
        voltage / total_resistance
    };
    let drops = &r * &on * current;
    let total_power = drops.sum() * current;

    let readings = resistors
        .iter()
        .zip(r.iter().zip(drops.iter()))
        .map(|(resistor, (&resistance, &drop))| ResistorReading {
            id: resistor.id,
            resistance,
            current: if resistor.on { current } else { 0.0 },
            voltage: drop,
            power: drop * current,
            on: resistor.on,
        })
        .collect();

    SeriesSolution {
        total_resistance,
        current,
        total_power,
        open,
        readings,
    }
}

pub fn solve_parallel(voltage: Scalar, resistors: &[Resistor]) -> ParallelSolution {
    let r = resistances(resistors);
    let on = on_mask(resistors);
    let currents = r.mapv(|r| voltage / r.max(EPSILON)) * &on;
    let conductance = (r.mapv(|r| 1.0 / r.max(EPSILON)) * &on).sum();
    let equivalent_resistance = if resistors.iter().any(|r| r.on) && conductance > 0.0 {
        Some(1.0 / conductance)
    } else {
        None
    };
    let total_current = currents.sum();

    let readings = resistors
        .iter()
        .zip(r.iter().zip(currents.iter()))
        .map(|(resistor, (&resistance, &current))| ResistorReading {
            id: resistor.id,
            resistance,
            current,
            voltage: if resistor.on { voltage } else { 0.0 },
            power: current * voltage,
            on: resistor.on,
        })
        .collect();

    ParallelSolution {
        equivalent_resistance,
        total_current,
        total_power: total_current * voltage,
        readings,
    }
}

/// Start and end of each resistor along the series track.
pub fn series_layout(count: usize) -> Vec<(Scalar, Scalar)> {
    let spacing = if count > 1 {
        ((SERIES_TOP_LENGTH - SERIES_LEFT_MARGIN - RESISTOR_WIDTH) / (count - 1) as Scalar)
            .max(RESISTOR_WIDTH + SERIES_MIN_GAP)
    } else {
        0.0
    };
    (0..count)
        .map(|k| {
            let start = SERIES_LEFT_MARGIN + k as Scalar * spacing;
            (start, start + RESISTOR_WIDTH)
        })
        .collect()
}

/// Length of the closed series loop for `count` resistors.
pub fn series_track_length(count: usize) -> Scalar {
    let end = series_layout(count).last().map_or(0.0, |span| span.1);
    (end + 300.0).max(1000.0)
}

/// A drifting charge carrier. `lane` is the branch's resistor id in a parallel circuit.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Electron {
    pub lane: usize,
    pub distance: Scalar,
}

impl Electron {
    pub fn in_branch_resistor(&self) -> bool {
        (BRANCH_RESISTOR_START..BRANCH_RESISTOR_END).contains(&self.distance)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CircuitCommand {
    SetVoltage(Scalar),
    AddResistor(Scalar),
    RemoveResistor(usize),
    SetResistance { id: usize, resistance: Scalar },
    Toggle(usize),
}

pub struct CircuitSimulation {
    topology: Topology,
    voltage: Scalar,
    resistors: Vec<Resistor>,
    next_id: usize,
    electrons: Vec<Electron>,
    rng: ChaCha8Rng,
    config: CircuitConfig,
}

impl CircuitSimulation {
    pub fn new(topology: Topology, config: &CircuitConfig, seed: Option<u64>) -> Self {
        let mut simulation = CircuitSimulation {
            topology,
            voltage: VOLTAGE.clamp(config.voltage),
            resistors: Vec::new(),
            next_id: 0,
            electrons: Vec::new(),
            rng: rng_from_optional_seed(seed),
            config: config.clone(),
        };
        simulation.install_defaults();
        simulation
    }

    fn install_defaults(&mut self) {
        let defaults = match self.topology {
            Topology::Series => self.config.series_resistors.clone(),
            Topology::Parallel => self.config.parallel_resistors.clone(),
        };
        self.resistors.clear();
        self.next_id = 0;
        for resistance in defaults {
            self.add_resistor(resistance);
        }
    }

    pub fn topology(&self) -> Topology {
        self.topology
    }

    pub fn voltage(&self) -> Scalar {
        self.voltage
    }

    pub fn resistors(&self) -> &[Resistor] {
        &self.resistors
    }

    pub fn electrons(&self) -> &[Electron] {
        &self.electrons
    }

    pub fn series(&self) -> SeriesSolution {
        solve_series(self.voltage, &self.resistors)
    }

    pub fn parallel(&self) -> ParallelSolution {
        solve_parallel(self.voltage, &self.resistors)
    }

    pub fn total_current(&self) -> Scalar {
        match self.topology {
            Topology::Series => self.series().current,
            Topology::Parallel => self.parallel().total_current,
        }
    }

    fn add_resistor(&mut self, resistance: Scalar) -> usize {
        let id = self.next_id;
        self.next_id += 1;
        self.resistors.push(Resistor {
            id,
            resistance: RESISTANCE.sanitize(resistance, RESISTANCE.default),
            on: true,
        });
        id
    }

    fn resistor_mut(&mut self, id: usize) -> Option<&mut Resistor> {
        self.resistors.iter_mut().find(|r| r.id == id)
    }

    fn spawn_chance(rate: Scalar, dt: Scalar) -> Scalar {
        (rate * dt).clamp(0.0, 1.0)
    }

    fn step_series(&mut self, dt: Scalar) {
        let current = self.series().current;
        let layout = series_layout(self.resistors.len());
        let track = series_track_length(self.resistors.len());

        if current > 0.0 {
            let rate = (current * 6.0).clamp(1.0, 8.0);
            if self.rng.random_bool(Self::spawn_chance(rate, dt)) {
                self.electrons.push(Electron {
                    lane: 0,
                    distance: 0.0,
                });
            }
        }
        let cap = self.config.series_particle_cap;
        if self.electrons.len() > cap {
            let excess = self.electrons.len() - cap;
            self.electrons.drain(..excess);
        }

        for electron in &mut self.electrons {
            let inside = layout
                .iter()
                .any(|(start, end)| (*start..*end).contains(&electron.distance));
            let speed = if inside {
                20.0 + 15.0 * current
            } else {
                40.0 + 30.0 * current
            };
            electron.distance += speed * dt;
        }
        self.electrons.retain(|e| e.distance < track);
    }

    fn step_parallel(&mut self, dt: Scalar) {
        let solution = self.parallel();
        for reading in solution.readings.iter().filter(|r| r.on && r.current > 0.0) {
            let rate = (reading.current * 4.0).clamp(1.0, 8.0);
            if self.rng.random_bool(Self::spawn_chance(rate, dt)) {
                self.electrons.push(Electron {
                    lane: reading.id,
                    distance: 0.0,
                });
            }
        }

        let cap = self.config.parallel_particle_cap;
        for reading in &solution.readings {
            let count = self.electrons.iter().filter(|e| e.lane == reading.id).count();
            let mut excess = count.saturating_sub(cap);
            self.electrons.retain(|e| {
                if e.lane == reading.id && excess > 0 {
                    excess -= 1;
                    false
                } else {
                    true
                }
            });
        }

        for electron in &mut self.electrons {
            let current = solution
                .readings
                .iter()
                .find(|r| r.id == electron.lane)
                .map_or(0.0, |r| r.current);
            let speed = if electron.in_branch_resistor() {
                15.0 + 10.0 * current
            } else {
                30.0 + 20.0 * current
            };
            electron.distance += speed * dt;
        }
        let live: Vec<usize> = self.resistors.iter().filter(|r| r.on).map(|r| r.id).collect();
        self.electrons
            .retain(|e| e.distance < BRANCH_LENGTH && live.contains(&e.lane));
    }
}

impl Simulation for CircuitSimulation {
    type Command = CircuitCommand;

    fn name(&self) -> &'static str {
        match self.topology {
            Topology::Series => "series circuit",
            Topology::Parallel => "parallel circuit",
        }
    }

    fn apply(&mut self, command: CircuitCommand) {
        debug!("Circuit command {command:?}");
        match command {
            CircuitCommand::SetVoltage(v) => self.voltage = VOLTAGE.sanitize(v, self.voltage),
            CircuitCommand::AddResistor(resistance) => {
                let id = self.add_resistor(resistance);
                info!("Added resistor {id}");
            }
            CircuitCommand::RemoveResistor(id) => {
                self.resistors.retain(|r| r.id != id);
                self.electrons.retain(|e| self.topology == Topology::Series || e.lane != id);
            }
            CircuitCommand::SetResistance { id, resistance } => {
                if let Some(resistor) = self.resistor_mut(id) {
                    resistor.resistance = RESISTANCE.sanitize(resistance, resistor.resistance);
                }
            }
            CircuitCommand::Toggle(id) => {
                if let Some(resistor) = self.resistor_mut(id) {
                    resistor.on = !resistor.on;
                }
            }
        }
    }

    fn step(&mut self, dt: Scalar) -> StepOutcome {
        if dt > 0.0 {
            match self.topology {
                Topology::Series => self.step_series(dt),
                Topology::Parallel => self.step_parallel(dt),
            }
        }
        StepOutcome::Continue
    }

    /// Restores the default resistor set and clears the animation.
    fn reset(&mut self) {
        self.electrons.clear();
        self.voltage = VOLTAGE.clamp(self.config.voltage);
        self.install_defaults();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn resistor(id: usize, resistance: Scalar, on: bool) -> Resistor {
        Resistor { id, resistance, on }
    }

    #[test]
    fn test_series_current_and_drops() {
        let resistors = [resistor(0, 100.0, true), resistor(1, 200.0, true)];
        let solution = solve_series(12.0, &resistors);
        assert_relative_eq!(solution.total_resistance, 300.0);
        assert_relative_eq!(solution.current, 0.04);
        let drop_sum: Scalar = solution.readings.iter().map(|r| r.voltage).sum();
        assert_relative_eq!(drop_sum, 12.0, epsilon = 1e-12);
        assert_relative_eq!(solution.total_power, 0.48, epsilon = 1e-12);
        assert!(solution.readings.iter().all(|r| r.current == solution.current));
    }

    #[test]
    fn test_series_open_switch_stops_current() {
        let resistors = [resistor(0, 100.0, true), resistor(1, 200.0, false)];
        let solution = solve_series(12.0, &resistors);
        assert!(solution.open);
        assert_eq!(solution.current, 0.0);
        assert_eq!(solution.total_power, 0.0);
    }

    #[test]
    fn test_series_clamps_tiny_resistance() {
        let solution = solve_series(1.0, &[resistor(0, 0.0, true)]);
        assert_relative_eq!(solution.current, 10.0);
    }

    #[test]
    fn test_parallel_equal_branches_halve() {
        let resistors = [resistor(0, 50.0, true), resistor(1, 50.0, true)];
        let solution = solve_parallel(10.0, &resistors);
        assert_relative_eq!(solution.equivalent_resistance.unwrap(), 25.0);
        assert_relative_eq!(solution.total_current, 0.4);
        assert_relative_eq!(solution.total_power, 4.0);
    }

    #[test]
    fn test_parallel_off_branch_is_independent() {
        let resistors = [resistor(0, 60.0, true), resistor(1, 120.0, false)];
        let solution = solve_parallel(12.0, &resistors);
        assert_relative_eq!(solution.readings[0].current, 0.2);
        assert_eq!(solution.readings[1].current, 0.0);
        assert_relative_eq!(solution.equivalent_resistance.unwrap(), 60.0);
    }

    #[test]
    fn test_parallel_all_off_has_no_equivalent() {
        let resistors = [resistor(0, 60.0, false), resistor(1, 120.0, false)];
        let solution = solve_parallel(12.0, &resistors);
        assert_eq!(solution.equivalent_resistance, None);
        assert_eq!(solution.total_current, 0.0);
    }

    #[test]
    fn test_commands_edit_resistors() {
        let mut sim = CircuitSimulation::new(Topology::Series, &CircuitConfig::default(), Some(1));
        assert_eq!(sim.resistors().len(), 2);
        sim.apply(CircuitCommand::AddResistor(300.0));
        sim.apply(CircuitCommand::SetResistance {
            id: 0,
            resistance: Scalar::NAN,
        });
        assert_eq!(sim.resistors()[0].resistance, 100.0);
        sim.apply(CircuitCommand::Toggle(1));
        assert!(sim.series().open);
        sim.apply(CircuitCommand::RemoveResistor(1));
        assert_relative_eq!(sim.series().current, 12.0 / 400.0);
        sim.reset();
        assert_eq!(sim.resistors().len(), 2);
    }

    #[test]
    fn test_series_electrons_flow_only_when_closed() {
        let mut sim = CircuitSimulation::new(Topology::Series, &CircuitConfig::default(), Some(9));
        for _ in 0..600 {
            sim.step(1.0 / 60.0);
        }
        assert!(!sim.electrons().is_empty());
        assert!(sim.electrons().len() <= 100);

        sim.reset();
        assert!(sim.electrons().is_empty());
        sim.apply(CircuitCommand::Toggle(0));
        for _ in 0..600 {
            sim.step(1.0 / 60.0);
        }
        assert!(sim.electrons().is_empty());
    }

    #[test]
    fn test_parallel_electrons_respect_branch_cap() {
        let config = CircuitConfig {
            parallel_particle_cap: 3,
            ..CircuitConfig::default()
        };
        let mut sim = CircuitSimulation::new(Topology::Parallel, &config, Some(4));
        for _ in 0..2000 {
            sim.step(1.0 / 60.0);
            for id in [0, 1] {
                assert!(sim.electrons().iter().filter(|e| e.lane == id).count() <= 3);
            }
        }
    }

    #[test]
    fn test_series_layout_keeps_minimum_gap() {
        let layout = series_layout(12);
        for pair in layout.windows(2) {
            assert!(pair[1].0 - pair[0].1 >= SERIES_MIN_GAP - 1e-9);
        }
        assert!(series_track_length(12) > layout[11].1);
    }
}
