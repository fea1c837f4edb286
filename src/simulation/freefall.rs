//! Dropping objects on different planets.

use log::{debug, info};
use static_assertions::const_assert;
use strum_macros::EnumIter;

use super::history::HistorySeries;
use super::variables::{DROP_HEIGHT_FEET, GRAVITY};
use super::{EPSILON, Scalar, Simulation, StepOutcome};
use crate::config::FreeFallConfig;

pub const METERS_PER_FOOT: Scalar = 0.3048;
/// Side-by-side lanes in a comparison drop.
pub const LANES: usize = 2;
const_assert!(LANES == 2);

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter)]
pub enum Planet {
    Mercury,
    Venus,
    Earth,
    Moon,
    Mars,
    Jupiter,
    Saturn,
    Uranus,
    Neptune,
    /// Gravity typed in by the user.
    Custom,
}

impl Planet {
    /// Surface gravity in m/s², `None` for [`Planet::Custom`].
    pub fn gravity(&self) -> Option<Scalar> {
        match self {
            Planet::Mercury => Some(3.7),
            Planet::Venus => Some(8.87),
            Planet::Earth => Some(9.81),
            Planet::Moon => Some(1.62),
            Planet::Mars => Some(3.71),
            Planet::Jupiter => Some(24.79),
            Planet::Saturn => Some(10.44),
            Planet::Uranus => Some(8.69),
            Planet::Neptune => Some(11.15),
            Planet::Custom => None,
        }
    }
}

impl std::fmt::Display for Planet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Planet::Mercury => write!(f, "Mercury"),
            Planet::Venus => write!(f, "Venus"),
            Planet::Earth => write!(f, "Earth"),
            Planet::Moon => write!(f, "Moon"),
            Planet::Mars => write!(f, "Mars"),
            Planet::Jupiter => write!(f, "Jupiter"),
            Planet::Saturn => write!(f, "Saturn"),
            Planet::Uranus => write!(f, "Uranus"),
            Planet::Neptune => write!(f, "Neptune"),
            Planet::Custom => write!(f, "Custom"),
        }
    }
}

/// t = √(2h/g), stretched by `air_factor` when air resistance is on.
pub fn fall_time(height_feet: Scalar, gravity: Scalar, air_factor: Option<Scalar>) -> Scalar {
    let height = height_feet.max(0.0) * METERS_PER_FOOT;
    let t = (2.0 * height / gravity.max(EPSILON)).sqrt();
    t * air_factor.unwrap_or(1.0)
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DropSetup {
    pub planet: Planet,
    pub custom_gravity: Scalar,
    pub height_feet: Scalar,
}

impl Default for DropSetup {
    fn default() -> Self {
        DropSetup {
            planet: Planet::Earth,
            custom_gravity: GRAVITY.default,
            height_feet: DROP_HEIGHT_FEET.default,
        }
    }
}

impl DropSetup {
    pub fn gravity(&self) -> Scalar {
        self.planet.gravity().unwrap_or(self.custom_gravity)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Fall {
    pub setup: DropSetup,
    pub duration: Scalar,
    pub elapsed: Scalar,
}

impl Fall {
    pub fn landed(&self) -> bool {
        self.elapsed >= self.duration
    }

    pub fn remaining(&self) -> Scalar {
        (self.duration - self.elapsed).max(0.0)
    }

    /// Fraction of the height fallen so far; accelerates like t².
    pub fn progress(&self) -> Scalar {
        if self.duration <= EPSILON {
            return 1.0;
        }
        (self.elapsed / self.duration).clamp(0.0, 1.0).powi(2)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct DropRecord {
    pub label: String,
    pub fall_time: Scalar,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FreeFallCommand {
    SetPlanet(usize, Planet),
    SetCustomGravity(usize, Scalar),
    SetHeight(usize, Scalar),
    SetAirResistance(bool),
    Drop,
    DropBoth,
    ReplayLast,
    ClearHistory,
}

pub struct FreeFallSimulation {
    setups: [DropSetup; LANES],
    air_resistance: bool,
    falls: [Option<Fall>; LANES],
    last_drop: Option<DropSetup>,
    history: HistorySeries<DropRecord>,
    time: Scalar,
    config: FreeFallConfig,
}

impl FreeFallSimulation {
    pub fn new(config: &FreeFallConfig) -> Self {
        FreeFallSimulation {
            setups: [DropSetup::default(), DropSetup {
                planet: Planet::Moon,
                ..DropSetup::default()
            }],
            air_resistance: false,
            falls: [None; LANES],
            last_drop: None,
            history: HistorySeries::new(config.drop_history_capacity),
            time: 0.0,
            config: config.clone(),
        }
    }

    pub fn setup(&self, lane: usize) -> Option<&DropSetup> {
        self.setups.get(lane)
    }

    pub fn air_resistance(&self) -> bool {
        self.air_resistance
    }

    pub fn falls(&self) -> &[Option<Fall>; LANES] {
        &self.falls
    }

    pub fn history(&self) -> &HistorySeries<DropRecord> {
        &self.history
    }

    pub fn last_drop(&self) -> Option<&DropSetup> {
        self.last_drop.as_ref()
    }

    pub fn fall_time(&self, setup: &DropSetup) -> Scalar {
        let factor = self.air_resistance.then_some(self.config.air_resistance_factor);
        fall_time(setup.height_feet, setup.gravity(), factor)
    }

    fn launch(&mut self, lane: usize, setup: DropSetup) {
        let duration = self.fall_time(&setup);
        self.falls[lane] = Some(Fall {
            setup,
            duration,
            elapsed: 0.0,
        });
        info!(
            "Dropping from {:.0} ft on {} ({:.2} m/s²): {:.2} s",
            setup.height_feet,
            setup.planet,
            setup.gravity(),
            duration
        );
    }

    fn record(&mut self, label: String, fall_time: Scalar) {
        self.history.push(self.time, DropRecord { label, fall_time });
    }
}

impl Simulation for FreeFallSimulation {
    type Command = FreeFallCommand;

    fn name(&self) -> &'static str {
        "free fall"
    }

    fn apply(&mut self, command: FreeFallCommand) {
        debug!("Free fall command {command:?}");
        match command {
            FreeFallCommand::SetPlanet(lane, planet) => {
                if let Some(setup) = self.setups.get_mut(lane) {
                    setup.planet = planet;
                }
            }
            FreeFallCommand::SetCustomGravity(lane, v) => {
                if let Some(setup) = self.setups.get_mut(lane) {
                    setup.custom_gravity = GRAVITY.sanitize(v, setup.custom_gravity);
                }
            }
            FreeFallCommand::SetHeight(lane, v) => {
                if let Some(setup) = self.setups.get_mut(lane) {
                    setup.height_feet = DROP_HEIGHT_FEET.sanitize(v, setup.height_feet);
                }
            }
            FreeFallCommand::SetAirResistance(on) => self.air_resistance = on,
            FreeFallCommand::Drop => {
                let setup = self.setups[0];
                self.falls = [None; LANES];
                self.launch(0, setup);
                self.last_drop = Some(setup);
                let time = self.fall_time(&setup);
                self.record(
                    format!("Dropped {:.0} ft on {}", setup.height_feet, setup.planet),
                    time,
                );
            }
            FreeFallCommand::DropBoth => {
                let [first, second] = self.setups;
                self.launch(0, first);
                self.launch(1, second);
                let time = self.fall_time(&first).max(self.fall_time(&second));
                self.record(format!("Compared drop: {} vs {}", first.planet, second.planet), time);
            }
            FreeFallCommand::ReplayLast => {
                if let Some(setup) = self.last_drop {
                    self.falls = [None; LANES];
                    self.launch(0, setup);
                }
            }
            FreeFallCommand::ClearHistory => self.history.clear(),
        }
    }

    fn step(&mut self, dt: Scalar) -> StepOutcome {
        if dt <= 0.0 {
            return StepOutcome::Continue;
        }
        self.time += dt;
        for fall in self.falls.iter_mut().flatten() {
            if !fall.landed() {
                fall.elapsed = (fall.elapsed + dt).min(fall.duration);
            }
        }
        StepOutcome::Continue
    }

    fn reset(&mut self) {
        self.falls = [None; LANES];
        self.time = 0.0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_fall_time_on_earth() {
        // 100 ft = 30.48 m
        assert_relative_eq!(fall_time(100.0, 9.81, None), 2.4929, epsilon = 1e-3);
        assert_relative_eq!(fall_time(100.0, 9.81, Some(1.5)), 2.4929 * 1.5, epsilon = 1e-3);
    }

    #[test]
    fn test_custom_planet_uses_typed_gravity() {
        let setup = DropSetup {
            planet: Planet::Custom,
            custom_gravity: 4.0,
            height_feet: 10.0,
        };
        assert_eq!(setup.gravity(), 4.0);
        assert_eq!(Planet::Jupiter.gravity(), Some(24.79));
    }

    #[test]
    fn test_drop_lands_after_fall_time() {
        let mut sim = FreeFallSimulation::new(&FreeFallConfig::default());
        sim.apply(FreeFallCommand::Drop);
        let fall = sim.falls()[0].unwrap();
        assert_eq!(fall.progress(), 0.0);
        let steps = (fall.duration / 0.1).ceil() as usize;
        for _ in 0..steps {
            sim.step(0.1);
        }
        let fall = sim.falls()[0].unwrap();
        assert!(fall.landed());
        assert_eq!(fall.remaining(), 0.0);
        assert_eq!(fall.progress(), 1.0);
    }

    #[test]
    fn test_comparison_moon_slower() {
        let mut sim = FreeFallSimulation::new(&FreeFallConfig::default());
        sim.apply(FreeFallCommand::DropBoth);
        let [earth, moon] = sim.falls().map(|f| f.unwrap());
        assert!(moon.duration > earth.duration);
        sim.step(1.0);
        let [earth, moon] = sim.falls().map(|f| f.unwrap());
        assert!(earth.progress() > moon.progress());
    }

    #[test]
    fn test_history_bounded_and_replay() {
        let mut sim = FreeFallSimulation::new(&FreeFallConfig::default());
        assert_eq!(sim.last_drop(), None);
        sim.apply(FreeFallCommand::SetHeight(0, 400.0));
        for _ in 0..30 {
            sim.apply(FreeFallCommand::Drop);
        }
        assert_eq!(sim.history().len(), 20);
        sim.apply(FreeFallCommand::SetHeight(0, 50.0));
        sim.apply(FreeFallCommand::ReplayLast);
        assert_eq!(sim.falls()[0].unwrap().setup.height_feet, 400.0);
    }

    #[test]
    fn test_air_resistance_stretches_drop() {
        let mut sim = FreeFallSimulation::new(&FreeFallConfig::default());
        let setup = *sim.setup(0).unwrap();
        let plain = sim.fall_time(&setup);
        sim.apply(FreeFallCommand::SetAirResistance(true));
        assert_relative_eq!(sim.fall_time(&setup), plain * 1.5, epsilon = 1e-12);
    }
}
