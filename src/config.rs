//! Tunable constants for every simulator, loadable from a TOML file.
//!
//! Missing keys take their defaults, so a config file only needs the values
//! it wants to change.

use log::{info, warn};
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

use crate::simulation::Scalar;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("TOML serialize error: {0}")]
    Serialize(#[from] toml::ser::Error),
}

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
#[serde(default)]
pub struct LabConfig {
    /// Seed for every random draw; entropy-seeded when absent.
    pub seed: Option<u64>,
    pub scheduler: SchedulerConfig,
    pub pendulum: PendulumConfig,
    pub projectile: ProjectileConfig,
    pub camera: CameraConfig,
    pub charge: ChargeConfig,
    pub heat: HeatConfig,
    pub circuit: CircuitConfig,
    pub thermal: ThermalConfig,
    pub freefall: FreeFallConfig,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(default)]
pub struct SchedulerConfig {
    /// Longest wall-clock gap a single tick may cover, in seconds.
    pub max_frame_dt: Scalar,
    /// Time advanced by a manual single step.
    pub manual_step_dt: Scalar,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            max_frame_dt: 0.25,
            manual_step_dt: 1.0 / 60.0,
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(default)]
pub struct PendulumConfig {
    pub time_step: Scalar,
    pub history_capacity: usize,
    pub trail_capacity: usize,
    /// Floor for the double pendulum's shared denominator.
    pub denominator_floor: Scalar,
}

impl Default for PendulumConfig {
    fn default() -> Self {
        Self {
            time_step: 0.016,
            history_capacity: 1000,
            trail_capacity: 500,
            denominator_floor: 1e-9,
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(default)]
pub struct ProjectileConfig {
    pub time_step: Scalar,
    pub trajectory_capacity: usize,
    pub history_capacity: usize,
    pub air_density: Scalar,
    pub reference_area: Scalar,
}

impl Default for ProjectileConfig {
    fn default() -> Self {
        Self {
            time_step: 0.02,
            trajectory_capacity: 10_000,
            history_capacity: 1000,
            air_density: 1.225,
            reference_area: 0.05,
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(default)]
pub struct CameraConfig {
    /// Pixels per metre before any zooming.
    pub base_scale: Scalar,
    pub min_scale: Scalar,
    pub max_scale: Scalar,
    pub smoothing: Scalar,
    pub padding_fraction: Scalar,
    pub padding_margin: Scalar,
    /// Seconds after the last manual pan or zoom before auto-scale resumes.
    pub interaction_cooldown: Scalar,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            base_scale: 4.0,
            min_scale: 0.5,
            max_scale: 10.0,
            smoothing: 0.1,
            padding_fraction: 0.2,
            padding_margin: 10.0,
            interaction_cooldown: 2.0,
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(default)]
pub struct ChargeConfig {
    /// Charge magnitude, in elementary charges, that ends a run.
    pub cap: i32,
    pub base_rate: Scalar,
    pub rate_gain: Scalar,
    pub velocity_factor: Scalar,
    pub burst_velocity_factor: Scalar,
    pub burst_size: usize,
    pub conduction_initial_charge: i32,
    pub history_capacity: usize,
}

impl Default for ChargeConfig {
    fn default() -> Self {
        Self {
            cap: 20,
            base_rate: 10.0,
            rate_gain: 4.0,
            velocity_factor: 0.65,
            burst_velocity_factor: 0.7,
            burst_size: 12,
            conduction_initial_charge: 10,
            history_capacity: 300,
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(default)]
pub struct HeatConfig {
    pub equilibrium_threshold: Scalar,
    pub history_capacity: usize,
}

impl Default for HeatConfig {
    fn default() -> Self {
        Self {
            equilibrium_threshold: 0.01,
            history_capacity: 120,
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(default)]
pub struct CircuitConfig {
    pub voltage: Scalar,
    pub series_resistors: Vec<Scalar>,
    pub parallel_resistors: Vec<Scalar>,
    pub series_particle_cap: usize,
    pub parallel_particle_cap: usize,
}

impl Default for CircuitConfig {
    fn default() -> Self {
        Self {
            voltage: 12.0,
            series_resistors: vec![100.0, 200.0],
            parallel_resistors: vec![60.0, 120.0],
            series_particle_cap: 100,
            parallel_particle_cap: 50,
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(default)]
pub struct ThermalConfig {
    /// Degrees per second the displayed temperature moves toward its target.
    pub ramp_rate: Scalar,
    pub sample_interval: Scalar,
    pub history_capacity: usize,
}

impl Default for ThermalConfig {
    fn default() -> Self {
        Self {
            ramp_rate: 80.0,
            sample_interval: 0.08,
            history_capacity: 50,
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(default)]
pub struct FreeFallConfig {
    pub drop_history_capacity: usize,
    /// Multiplier on fall time when air resistance is enabled.
    pub air_resistance_factor: Scalar,
}

impl Default for FreeFallConfig {
    fn default() -> Self {
        Self {
            drop_history_capacity: 20,
            air_resistance_factor: 1.5,
        }
    }
}

/// Keeps `value` when it is finite and above `floor`, otherwise warns and uses `default`.
fn above(name: &str, value: Scalar, floor: Scalar, inclusive: bool, default: Scalar) -> Scalar {
    let ok = value.is_finite() && if inclusive { value >= floor } else { value > floor };
    if ok {
        value
    } else {
        warn!("Config value {name} = {value} is out of range. Using {default}.");
        default
    }
}

fn positive(name: &str, value: Scalar, default: Scalar) -> Scalar {
    above(name, value, 0.0, false, default)
}

fn non_negative(name: &str, value: Scalar, default: Scalar) -> Scalar {
    above(name, value, 0.0, true, default)
}

impl SchedulerConfig {
    fn validated(self) -> Self {
        let d = Self::default();
        Self {
            max_frame_dt: positive("scheduler.max_frame_dt", self.max_frame_dt, d.max_frame_dt),
            manual_step_dt: positive("scheduler.manual_step_dt", self.manual_step_dt, d.manual_step_dt),
        }
    }
}

impl PendulumConfig {
    fn validated(self) -> Self {
        let d = Self::default();
        Self {
            time_step: positive("pendulum.time_step", self.time_step, d.time_step),
            denominator_floor: positive("pendulum.denominator_floor", self.denominator_floor, d.denominator_floor),
            ..self
        }
    }
}

impl ProjectileConfig {
    fn validated(self) -> Self {
        let d = Self::default();
        Self {
            time_step: positive("projectile.time_step", self.time_step, d.time_step),
            air_density: non_negative("projectile.air_density", self.air_density, d.air_density),
            reference_area: non_negative("projectile.reference_area", self.reference_area, d.reference_area),
            ..self
        }
    }
}

impl CameraConfig {
    fn validated(self) -> Self {
        let d = Self::default();
        let mut min_scale = positive("camera.min_scale", self.min_scale, d.min_scale);
        let mut max_scale = positive("camera.max_scale", self.max_scale, d.max_scale);
        if min_scale > max_scale {
            warn!("Config camera.min_scale {min_scale} exceeds camera.max_scale {max_scale}. Using defaults.");
            min_scale = d.min_scale;
            max_scale = d.max_scale;
        }
        let base_scale = positive("camera.base_scale", self.base_scale, d.base_scale).clamp(min_scale, max_scale);
        let smoothing = if self.smoothing.is_finite() && self.smoothing > 0.0 && self.smoothing <= 1.0 {
            self.smoothing
        } else {
            warn!("Config value camera.smoothing = {} is out of range. Using {}.", self.smoothing, d.smoothing);
            d.smoothing
        };
        Self {
            base_scale,
            min_scale,
            max_scale,
            smoothing,
            padding_fraction: non_negative("camera.padding_fraction", self.padding_fraction, d.padding_fraction),
            padding_margin: non_negative("camera.padding_margin", self.padding_margin, d.padding_margin),
            interaction_cooldown: non_negative(
                "camera.interaction_cooldown",
                self.interaction_cooldown,
                d.interaction_cooldown,
            ),
        }
    }
}

impl ChargeConfig {
    fn validated(self) -> Self {
        let d = Self::default();
        let cap = if self.cap > 0 {
            self.cap
        } else {
            warn!("Config value charge.cap = {} is out of range. Using {}.", self.cap, d.cap);
            d.cap
        };
        Self {
            cap,
            base_rate: non_negative("charge.base_rate", self.base_rate, d.base_rate),
            rate_gain: non_negative("charge.rate_gain", self.rate_gain, d.rate_gain),
            velocity_factor: positive("charge.velocity_factor", self.velocity_factor, d.velocity_factor),
            burst_velocity_factor: positive(
                "charge.burst_velocity_factor",
                self.burst_velocity_factor,
                d.burst_velocity_factor,
            ),
            ..self
        }
    }
}

impl HeatConfig {
    fn validated(self) -> Self {
        let d = Self::default();
        Self {
            equilibrium_threshold: positive(
                "heat.equilibrium_threshold",
                self.equilibrium_threshold,
                d.equilibrium_threshold,
            ),
            ..self
        }
    }
}

impl CircuitConfig {
    fn validated(self) -> Self {
        let d = Self::default();
        let resistors = |name: &str, values: Vec<Scalar>| -> Vec<Scalar> {
            values
                .into_iter()
                .filter(|&r| {
                    let ok = r.is_finite() && r > 0.0;
                    if !ok {
                        warn!("Dropping resistor {r} from {name}.");
                    }
                    ok
                })
                .collect()
        };
        Self {
            voltage: non_negative("circuit.voltage", self.voltage, d.voltage),
            series_resistors: resistors("circuit.series_resistors", self.series_resistors),
            parallel_resistors: resistors("circuit.parallel_resistors", self.parallel_resistors),
            ..self
        }
    }
}

impl ThermalConfig {
    fn validated(self) -> Self {
        let d = Self::default();
        Self {
            ramp_rate: positive("thermal.ramp_rate", self.ramp_rate, d.ramp_rate),
            sample_interval: positive("thermal.sample_interval", self.sample_interval, d.sample_interval),
            ..self
        }
    }
}

impl FreeFallConfig {
    fn validated(self) -> Self {
        let d = Self::default();
        Self {
            air_resistance_factor: positive(
                "freefall.air_resistance_factor",
                self.air_resistance_factor,
                d.air_resistance_factor,
            ),
            ..self
        }
    }
}

impl LabConfig {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&content)?;
        Ok(config.validated())
    }

    /// Replaces every out-of-range value with its default, logging each one.
    pub fn validated(self) -> Self {
        Self {
            seed: self.seed,
            scheduler: self.scheduler.validated(),
            pendulum: self.pendulum.validated(),
            projectile: self.projectile.validated(),
            camera: self.camera.validated(),
            charge: self.charge.validated(),
            heat: self.heat.validated(),
            circuit: self.circuit.validated(),
            thermal: self.thermal.validated(),
            freefall: self.freefall.validated(),
        }
    }

    /// Load configuration from a file, falling back to defaults if it is missing or invalid
    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        match Self::load(path) {
            Ok(config) => config,
            Err(ConfigError::Io(e)) => {
                info!("Config file {} not readable ({e}). Using defaults.", path.display());
                Self::default()
            }
            Err(e) => {
                warn!("Failed to load config file {}: {e}. Using defaults.", path.display());
                Self::default()
            }
        }
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_file_keeps_defaults() {
        let config: LabConfig = toml::from_str(
            r#"
            seed = 7

            [charge]
            cap = 30
            "#,
        )
        .unwrap();
        assert_eq!(config.seed, Some(7));
        assert_eq!(config.charge.cap, 30);
        assert_eq!(config.charge.burst_size, 12);
        assert_eq!(config.pendulum, PendulumConfig::default());
    }

    #[test]
    fn test_round_trip_through_toml() {
        let config = LabConfig::default();
        let text = toml::to_string_pretty(&config).unwrap();
        let back: LabConfig = toml::from_str(&text).unwrap();
        assert_eq!(back, config);
    }

    #[test]
    fn test_missing_file_uses_defaults() {
        let config = LabConfig::load_or_default("/nonexistent/physlab.toml");
        assert_eq!(config, LabConfig::default());
    }

    #[test]
    fn test_defaults_pass_validation_unchanged() {
        assert_eq!(LabConfig::default().validated(), LabConfig::default());
    }

    #[test]
    fn test_out_of_range_values_fall_back_to_defaults() {
        let config: LabConfig = toml::from_str(
            r#"
            [scheduler]
            max_frame_dt = -1.0

            [pendulum]
            time_step = 0.0

            [projectile]
            time_step = 0.0
            air_density = 1.0

            [camera]
            min_scale = 20.0
            max_scale = 5.0
            interaction_cooldown = -3.0

            [charge]
            cap = 0
            base_rate = -2.0

            [thermal]
            ramp_rate = 0.0
            sample_interval = -0.5

            [circuit]
            series_resistors = [100.0, 0.0, -5.0, 300.0]
            "#,
        )
        .unwrap();
        let config = config.validated();
        let defaults = LabConfig::default();
        assert_eq!(config.scheduler.max_frame_dt, defaults.scheduler.max_frame_dt);
        assert_eq!(config.pendulum.time_step, defaults.pendulum.time_step);
        assert_eq!(config.projectile.time_step, defaults.projectile.time_step);
        assert_eq!(config.projectile.air_density, 1.0);
        assert_eq!(config.camera.min_scale, defaults.camera.min_scale);
        assert_eq!(config.camera.max_scale, defaults.camera.max_scale);
        assert_eq!(config.camera.interaction_cooldown, defaults.camera.interaction_cooldown);
        assert_eq!(config.charge.cap, defaults.charge.cap);
        assert_eq!(config.charge.base_rate, defaults.charge.base_rate);
        assert_eq!(config.thermal.ramp_rate, defaults.thermal.ramp_rate);
        assert_eq!(config.thermal.sample_interval, defaults.thermal.sample_interval);
        assert_eq!(config.circuit.series_resistors, vec![100.0, 300.0]);
    }

    #[test]
    fn test_base_scale_is_kept_inside_zoom_limits() {
        let config = LabConfig {
            camera: CameraConfig {
                base_scale: 50.0,
                ..CameraConfig::default()
            },
            ..LabConfig::default()
        };
        assert_eq!(config.validated().camera.base_scale, 10.0);
    }

    #[test]
    fn test_load_validates_file_values() {
        let path = std::env::temp_dir().join(format!("physlab-invalid-{}.toml", std::process::id()));
        std::fs::write(&path, "[projectile]\ntime_step = 0.0\n").unwrap();
        let loaded = LabConfig::load(&path).unwrap();
        std::fs::remove_file(&path).unwrap();
        assert_eq!(loaded.projectile.time_step, ProjectileConfig::default().time_step);
    }

    #[test]
    fn test_save_and_load() {
        let path = std::env::temp_dir().join(format!("physlab-config-{}.toml", std::process::id()));
        let mut config = LabConfig::default();
        config.circuit.voltage = 9.0;
        config.save(&path).unwrap();
        let loaded = LabConfig::load(&path).unwrap();
        std::fs::remove_file(&path).unwrap();
        assert_eq!(loaded.circuit.voltage, 9.0);
    }
}
