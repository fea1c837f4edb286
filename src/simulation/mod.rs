//! Contains all simulation logic
//!
//! Every simulator implements [`Simulation`] and is driven by a
//! [`Scheduler`], which owns the clock and the queue of pending commands.
//! Steppers never fail: numeric edge cases are clamped at the source.

pub mod camera;
pub mod charge;
pub mod circuit;
pub mod freefall;
pub mod heat;
pub mod history;
pub mod optics;
pub mod pendulum;
pub mod projectile;
pub mod scheduler;
pub mod thermal;
pub mod variables;

use rand_chacha::{ChaCha8Rng, rand_core::SeedableRng};

pub use history::{HistorySeries, Sample};
pub use scheduler::{Phase, Scheduler, SimulationClock, Tick};

pub type Scalar = f64;
pub type Vector = glam::DVec2;

/// Floor substituted for resistances, distances and masses before dividing.
pub const EPSILON: Scalar = 1e-9;

/// Result of advancing a simulation by one step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepOutcome {
    Continue,
    /// A terminal condition was reached (equilibrium, ground impact).
    Finished,
}

/// A self-contained simulator: parameters, dynamic state and stepper.
pub trait Simulation {
    type Command;

    /// Short human readable name used in log lines.
    fn name(&self) -> &'static str;

    /// Applies a queued parameter change. Called by the scheduler before stepping.
    fn apply(&mut self, command: Self::Command);

    /// Advances the dynamic state by `dt` seconds of wall time.
    fn step(&mut self, dt: Scalar) -> StepOutcome;

    /// Returns the dynamic state to its initial conditions, keeping parameters.
    fn reset(&mut self);

    /// Immediate action taken when the user presses start, before the first tick.
    fn on_start(&mut self) {}

    /// Unscaled host time in seconds, seen at the top of every tick whether or
    /// not the simulation is running.
    fn observe_host_time(&mut self, _now: Scalar) {}
}

/// Deterministic generator for a fixed seed, entropy-seeded otherwise.
pub fn rng_from_optional_seed(seed: Option<u64>) -> ChaCha8Rng {
    match seed {
        Some(seed) => ChaCha8Rng::seed_from_u64(seed),
        None => ChaCha8Rng::from_rng(&mut rand::rng()),
    }
}

/// Replaces a non-finite value with `fallback`.
pub fn finite_or(value: Scalar, fallback: Scalar) -> Scalar {
    if value.is_finite() { value } else { fallback }
}

/// Divides by `denominator`, flooring its magnitude at [`EPSILON`] and keeping its sign.
pub fn safe_div(numerator: Scalar, denominator: Scalar) -> Scalar {
    let floored = if denominator.abs() < EPSILON {
        EPSILON.copysign(denominator)
    } else {
        denominator
    };
    finite_or(numerator / floored, 0.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_safe_div_floors_small_denominators() {
        assert_eq!(safe_div(1.0, 0.0), 1e9);
        assert_eq!(safe_div(1.0, -0.0), -1e9);
        assert_eq!(safe_div(6.0, 3.0), 2.0);
    }

    #[test]
    fn test_finite_or() {
        assert_eq!(finite_or(Scalar::NAN, 2.0), 2.0);
        assert_eq!(finite_or(Scalar::INFINITY, 2.0), 2.0);
        assert_eq!(finite_or(1.5, 2.0), 1.5);
    }
}
