//! Thermal expansion of a bar, plate or block.
//!
//! The expansion itself is the pure function [`expansion`]; the simulation only
//! animates the displayed temperature toward a target and samples a graph.

use log::debug;
use strum_macros::EnumIter;

use super::history::HistorySeries;
use super::variables::{EXPANSION_TEMPERATURE, INITIAL_AREA, INITIAL_LENGTH, INITIAL_VOLUME, RAMP_RATE};
use super::{Scalar, Simulation, StepOutcome};
use crate::config::ThermalConfig;

/// Temperature the specimen is measured at before heating, in °C.
pub const REFERENCE_TEMPERATURE: Scalar = 20.0;
/// Target change per press of the heat or cool button.
pub const TARGET_STEP: Scalar = 50.0;
/// Fraction of the ramp rate the target keeps creeping at while heating or cooling.
const CREEP_FRACTION: Scalar = 0.1;
const SNAP: Scalar = 0.01;

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter)]
pub enum Material {
    Iron,
    Copper,
    Aluminum,
    Brass,
    Glass,
    Steel,
    Gold,
    Silver,
    Zinc,
    Lead,
}

impl Material {
    /// Linear expansion coefficient α in 1/°C.
    pub fn alpha(&self) -> Scalar {
        let micro = match self {
            Material::Iron => 12.0,
            Material::Copper => 17.0,
            Material::Aluminum => 23.0,
            Material::Brass => 19.0,
            Material::Glass => 9.0,
            Material::Steel => 11.0,
            Material::Gold => 14.0,
            Material::Silver => 18.0,
            Material::Zinc => 30.0,
            Material::Lead => 29.0,
        };
        micro * 1e-6
    }
}

impl std::fmt::Display for Material {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Material::Iron => write!(f, "Iron"),
            Material::Copper => write!(f, "Copper"),
            Material::Aluminum => write!(f, "Aluminum"),
            Material::Brass => write!(f, "Brass"),
            Material::Glass => write!(f, "Glass"),
            Material::Steel => write!(f, "Steel"),
            Material::Gold => write!(f, "Gold"),
            Material::Silver => write!(f, "Silver"),
            Material::Zinc => write!(f, "Zinc"),
            Material::Lead => write!(f, "Lead"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter)]
pub enum ExpansionKind {
    Linear,
    Areal,
    Volumetric,
}

impl ExpansionKind {
    /// Multiplier on α: 1, 2 and 3 for length, area and volume.
    pub fn factor(&self) -> Scalar {
        match self {
            ExpansionKind::Linear => 1.0,
            ExpansionKind::Areal => 2.0,
            ExpansionKind::Volumetric => 3.0,
        }
    }

    pub fn unit(&self) -> &'static str {
        match self {
            ExpansionKind::Linear => "mm",
            ExpansionKind::Areal => "mm²",
            ExpansionKind::Volumetric => "mm³",
        }
    }
}

impl std::fmt::Display for ExpansionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ExpansionKind::Linear => write!(f, "Linear"),
            ExpansionKind::Areal => write!(f, "Areal"),
            ExpansionKind::Volumetric => write!(f, "Volumetric"),
        }
    }
}

/// ΔL = L₀αΔT, ΔA = A₀·2αΔT, ΔV = V₀·3αΔT.
pub fn expansion(kind: ExpansionKind, initial: Scalar, alpha: Scalar, delta_t: Scalar) -> Scalar {
    initial * kind.factor() * alpha * delta_t
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Drive {
    Idle,
    Heating,
    Cooling,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ExpansionParams {
    pub material: Material,
    pub comparison_material: Material,
    pub comparison: bool,
    pub kind: ExpansionKind,
    pub initial_length: Scalar,
    pub initial_area: Scalar,
    pub initial_volume: Scalar,
    pub ramp_rate: Scalar,
}

impl ExpansionParams {
    fn new(ramp_rate: Scalar) -> Self {
        ExpansionParams {
            material: Material::Iron,
            comparison_material: Material::Copper,
            comparison: false,
            kind: ExpansionKind::Linear,
            initial_length: INITIAL_LENGTH.default,
            initial_area: INITIAL_AREA.default,
            initial_volume: INITIAL_VOLUME.default,
            ramp_rate: RAMP_RATE.clamp(ramp_rate),
        }
    }

    pub fn initial_size(&self) -> Scalar {
        match self.kind {
            ExpansionKind::Linear => self.initial_length,
            ExpansionKind::Areal => self.initial_area,
            ExpansionKind::Volumetric => self.initial_volume,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Reading {
    pub change: Scalar,
    pub final_size: Scalar,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ExpansionSample {
    pub temperature: Scalar,
    pub primary: Scalar,
    pub secondary: Option<Scalar>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ThermalCommand {
    SetMaterial(Material),
    SetComparisonMaterial(Material),
    SetComparison(bool),
    SetKind(ExpansionKind),
    SetInitialSize(ExpansionKind, Scalar),
    SetTarget(Scalar),
    SetRampRate(Scalar),
    Heat,
    Cool,
    Hold,
}

pub struct ThermalSimulation {
    params: ExpansionParams,
    temperature: Scalar,
    target: Scalar,
    drive: Drive,
    time: Scalar,
    since_sample: Scalar,
    history: HistorySeries<ExpansionSample>,
    config: ThermalConfig,
}

impl ThermalSimulation {
    pub fn new(config: &ThermalConfig) -> Self {
        ThermalSimulation {
            params: ExpansionParams::new(config.ramp_rate),
            temperature: REFERENCE_TEMPERATURE,
            target: REFERENCE_TEMPERATURE,
            drive: Drive::Idle,
            time: 0.0,
            since_sample: 0.0,
            history: HistorySeries::new(config.history_capacity),
            config: config.clone(),
        }
    }

    pub fn params(&self) -> &ExpansionParams {
        &self.params
    }

    pub fn temperature(&self) -> Scalar {
        self.temperature
    }

    pub fn target(&self) -> Scalar {
        self.target
    }

    pub fn drive(&self) -> Drive {
        self.drive
    }

    pub fn history(&self) -> &HistorySeries<ExpansionSample> {
        &self.history
    }

    pub fn delta_t(&self) -> Scalar {
        self.temperature - REFERENCE_TEMPERATURE
    }

    pub fn reading(&self, material: Material) -> Reading {
        let initial = self.params.initial_size();
        let change = expansion(self.params.kind, initial, material.alpha(), self.delta_t());
        Reading {
            change,
            final_size: initial + change,
        }
    }

    pub fn primary(&self) -> Reading {
        self.reading(self.params.material)
    }

    /// Reading for the second material when comparing.
    pub fn secondary(&self) -> Option<Reading> {
        self.params
            .comparison
            .then(|| self.reading(self.params.comparison_material))
    }

    /// Whether the displayed temperature has caught up and nothing drives it.
    pub fn settled(&self) -> bool {
        self.drive == Drive::Idle && (self.target - self.temperature).abs() < SNAP
    }

    fn sample(&mut self) {
        let sample = ExpansionSample {
            temperature: self.temperature,
            primary: self.primary().change,
            secondary: self.secondary().map(|r| r.change),
        };
        self.history.push(self.time, sample);
    }

    fn restart_graph(&mut self) {
        self.history.clear();
        self.since_sample = 0.0;
    }
}

impl Simulation for ThermalSimulation {
    type Command = ThermalCommand;

    fn name(&self) -> &'static str {
        "thermal expansion"
    }

    fn apply(&mut self, command: ThermalCommand) {
        debug!("Thermal command {command:?}");
        let p = &mut self.params;
        match command {
            ThermalCommand::SetMaterial(material) => {
                p.material = material;
                self.restart_graph();
            }
            ThermalCommand::SetComparisonMaterial(material) => {
                p.comparison_material = material;
                self.restart_graph();
            }
            ThermalCommand::SetComparison(on) => {
                p.comparison = on;
                self.restart_graph();
            }
            ThermalCommand::SetKind(kind) => {
                p.kind = kind;
                self.restart_graph();
            }
            ThermalCommand::SetInitialSize(kind, v) => match kind {
                ExpansionKind::Linear => p.initial_length = INITIAL_LENGTH.sanitize(v, p.initial_length),
                ExpansionKind::Areal => p.initial_area = INITIAL_AREA.sanitize(v, p.initial_area),
                ExpansionKind::Volumetric => {
                    p.initial_volume = INITIAL_VOLUME.sanitize(v, p.initial_volume)
                }
            },
            ThermalCommand::SetTarget(v) => {
                self.target = EXPANSION_TEMPERATURE.sanitize(v, self.target);
                self.drive = Drive::Idle;
            }
            ThermalCommand::SetRampRate(v) => p.ramp_rate = RAMP_RATE.sanitize(v, p.ramp_rate),
            ThermalCommand::Heat => {
                self.drive = Drive::Heating;
                self.target = EXPANSION_TEMPERATURE.clamp(self.target + TARGET_STEP);
            }
            ThermalCommand::Cool => {
                self.drive = Drive::Cooling;
                self.target = EXPANSION_TEMPERATURE.clamp(self.target - TARGET_STEP);
            }
            ThermalCommand::Hold => self.drive = Drive::Idle,
        }
    }

    fn step(&mut self, dt: Scalar) -> StepOutcome {
        if dt <= 0.0 {
            return StepOutcome::Continue;
        }
        self.time += dt;
        let rate = self.params.ramp_rate;

        let creep = rate * dt * CREEP_FRACTION;
        match self.drive {
            Drive::Heating => self.target = EXPANSION_TEMPERATURE.clamp(self.target + creep),
            Drive::Cooling => self.target = EXPANSION_TEMPERATURE.clamp(self.target - creep),
            Drive::Idle => {}
        }

        let diff = self.target - self.temperature;
        self.temperature += diff.signum() * diff.abs().min(rate * dt);
        if (self.target - self.temperature).abs() < SNAP {
            self.temperature = self.target;
        }

        self.since_sample += dt;
        if self.since_sample >= self.config.sample_interval {
            self.since_sample = 0.0;
            self.sample();
        }
        StepOutcome::Continue
    }

    fn reset(&mut self) {
        self.temperature = REFERENCE_TEMPERATURE;
        self.target = REFERENCE_TEMPERATURE;
        self.drive = Drive::Idle;
        self.time = 0.0;
        self.restart_graph();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use strum::IntoEnumIterator;

    #[test]
    fn test_no_temperature_change_no_expansion() {
        for material in Material::iter() {
            for kind in ExpansionKind::iter() {
                assert_eq!(expansion(kind, 100.0, material.alpha(), 0.0), 0.0);
            }
        }
    }

    #[test]
    fn test_expansion_factors() {
        let alpha = Material::Iron.alpha();
        assert_relative_eq!(expansion(ExpansionKind::Linear, 100.0, alpha, 100.0), 0.12, epsilon = 1e-12);
        assert_relative_eq!(expansion(ExpansionKind::Areal, 10_000.0, alpha, 100.0), 24.0, epsilon = 1e-9);
        assert_relative_eq!(
            expansion(ExpansionKind::Volumetric, 1.0e6, alpha, 100.0),
            3600.0,
            epsilon = 1e-6
        );
    }

    #[test]
    fn test_ramp_rate_limits_temperature() {
        let mut sim = ThermalSimulation::new(&ThermalConfig::default());
        sim.apply(ThermalCommand::SetTarget(120.0));
        sim.step(0.5);
        assert_relative_eq!(sim.temperature(), 60.0, epsilon = 1e-9);
        sim.step(0.5);
        assert_relative_eq!(sim.temperature(), 100.0, epsilon = 1e-9);
        sim.step(0.5);
        assert_eq!(sim.temperature(), 120.0);
        assert!(sim.settled());
    }

    #[test]
    fn test_heat_moves_target_and_creeps() {
        let mut sim = ThermalSimulation::new(&ThermalConfig::default());
        sim.apply(ThermalCommand::Heat);
        assert_eq!(sim.target(), 70.0);
        sim.step(1.0);
        assert_relative_eq!(sim.target(), 78.0, epsilon = 1e-9);
        assert!(!sim.settled());
        sim.apply(ThermalCommand::Hold);
        assert_eq!(sim.drive(), Drive::Idle);
    }

    #[test]
    fn test_target_clamped() {
        let mut sim = ThermalSimulation::new(&ThermalConfig::default());
        for _ in 0..20 {
            sim.apply(ThermalCommand::Cool);
        }
        assert_eq!(sim.target(), -50.0);
        sim.apply(ThermalCommand::SetTarget(900.0));
        assert_eq!(sim.target(), 500.0);
    }

    #[test]
    fn test_graph_sampling_interval() {
        let mut sim = ThermalSimulation::new(&ThermalConfig::default());
        sim.apply(ThermalCommand::SetComparison(true));
        sim.apply(ThermalCommand::SetTarget(200.0));
        for _ in 0..10 {
            sim.step(0.05);
        }
        assert_eq!(sim.history().len(), 5);
        let latest = sim.history().latest().unwrap().value;
        assert!(latest.secondary.unwrap() > latest.primary);
    }

    #[test]
    fn test_history_capped() {
        let mut sim = ThermalSimulation::new(&ThermalConfig::default());
        for _ in 0..200 {
            sim.step(0.1);
        }
        assert_eq!(sim.history().len(), 50);
    }

    #[test]
    fn test_reset_returns_to_reference() {
        let mut sim = ThermalSimulation::new(&ThermalConfig::default());
        sim.apply(ThermalCommand::Heat);
        sim.step(1.0);
        sim.reset();
        assert_eq!(sim.temperature(), REFERENCE_TEMPERATURE);
        assert_eq!(sim.primary().change, 0.0);
        assert!(sim.history().is_empty());
    }
}
