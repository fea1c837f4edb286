//! Adjustable parameter ranges shared by the simulators and the controls that edit them.

use thiserror::Error;

use super::Scalar;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Variable {
    pub default: Scalar,
    pub min: Scalar,
    pub max: Scalar,
}

#[derive(Debug, Error, PartialEq)]
pub enum ParameterError {
    #[error("'{0}' is not a number")]
    NotANumber(String),

    #[error("value {0} is not finite")]
    NotFinite(Scalar),
}

impl Variable {
    pub fn clamp(&self, value: Scalar) -> Scalar {
        value.clamp(self.min, self.max)
    }

    /// Clamps `value` into range, falling back to `previous` (or the default
    /// when that is unusable too) for NaN and infinities.
    pub fn sanitize(&self, value: Scalar, previous: Scalar) -> Scalar {
        if value.is_finite() {
            self.clamp(value)
        } else if previous.is_finite() {
            log::warn!("Rejected non-finite parameter value, keeping {previous}");
            self.clamp(previous)
        } else {
            self.default
        }
    }

    /// Parses free-text input and clamps it into range.
    pub fn parse(&self, text: &str) -> Result<Scalar, ParameterError> {
        let value: Scalar = text
            .trim()
            .parse()
            .map_err(|_| ParameterError::NotANumber(text.to_string()))?;
        if !value.is_finite() {
            return Err(ParameterError::NotFinite(value));
        }
        Ok(self.clamp(value))
    }

    pub fn range(&self) -> std::ops::RangeInclusive<Scalar> {
        self.min..=self.max
    }
}

/// Host speed multiplier applied to wall time.
pub const SPEED: Variable = Variable {
    default: 1.0,
    min: 0.1,
    max: 10.0,
};

pub const PENDULUM_LENGTH: Variable = Variable {
    default: 1.0,
    min: 0.1,
    max: 5.0,
};
pub const PENDULUM_MASS: Variable = Variable {
    default: 1.0,
    min: 0.1,
    max: 10.0,
};
pub const GRAVITY: Variable = Variable {
    default: 9.81,
    min: 0.1,
    max: 50.0,
};
pub const PENDULUM_ANGLE: Variable = Variable {
    default: 30.0,
    min: -179.0,
    max: 179.0,
};
pub const DAMPING: Variable = Variable {
    default: 0.02,
    min: 0.0,
    max: 2.0,
};

pub const LAUNCH_SPEED: Variable = Variable {
    default: 50.0,
    min: 1.0,
    max: 200.0,
};
pub const LAUNCH_ANGLE: Variable = Variable {
    default: 45.0,
    min: 0.0,
    max: 90.0,
};
pub const DRAG_COEFFICIENT: Variable = Variable {
    default: 0.47,
    min: 0.0,
    max: 2.0,
};
pub const PROJECTILE_MASS: Variable = Variable {
    default: 1.0,
    min: 0.1,
    max: 100.0,
};

pub const RESISTANCE: Variable = Variable {
    default: 100.0,
    min: 0.1,
    max: 10_000.0,
};
pub const VOLTAGE: Variable = Variable {
    default: 12.0,
    min: 0.0,
    max: 240.0,
};

pub const CONTACT_AREA: Variable = Variable {
    default: 0.01,
    min: 1e-4,
    max: 1.0,
};
pub const THICKNESS: Variable = Variable {
    default: 0.02,
    min: 1e-9,
    max: 1.0,
};
pub const BODY_TEMPERATURE: Variable = Variable {
    default: 100.0,
    min: -273.15,
    max: 2000.0,
};
pub const BODY_MASS: Variable = Variable {
    default: 1.0,
    min: 0.01,
    max: 100.0,
};
pub const CONDUCTIVITY: Variable = Variable {
    default: 10.0,
    min: 0.01,
    max: 1000.0,
};
pub const SPECIFIC_HEAT: Variable = Variable {
    default: 500.0,
    min: 1.0,
    max: 5000.0,
};

pub const INCIDENCE_ANGLE: Variable = Variable {
    default: 30.0,
    min: 1.0,
    max: 89.0,
};
pub const REFRACTION_ANGLE: Variable = Variable {
    default: 30.0,
    min: 0.0,
    max: 90.0,
};
pub const MIRROR_RADIUS: Variable = Variable {
    default: 200.0,
    min: 50.0,
    max: 1000.0,
};

pub const EXPANSION_TEMPERATURE: Variable = Variable {
    default: 20.0,
    min: -50.0,
    max: 500.0,
};
pub const RAMP_RATE: Variable = Variable {
    default: 80.0,
    min: 1.0,
    max: 500.0,
};
/// mm
pub const INITIAL_LENGTH: Variable = Variable {
    default: 100.0,
    min: 1.0,
    max: 10_000.0,
};
/// mm²
pub const INITIAL_AREA: Variable = Variable {
    default: 10_000.0,
    min: 1.0,
    max: 1.0e8,
};
/// mm³
pub const INITIAL_VOLUME: Variable = Variable {
    default: 1.0e6,
    min: 1.0,
    max: 1.0e12,
};

pub const DROP_HEIGHT_FEET: Variable = Variable {
    default: 100.0,
    min: 1.0,
    max: 10_000.0,
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_falls_back_on_nan() {
        assert_eq!(PENDULUM_LENGTH.sanitize(Scalar::NAN, 2.0), 2.0);
        assert_eq!(PENDULUM_LENGTH.sanitize(Scalar::NAN, Scalar::NAN), 1.0);
        assert_eq!(PENDULUM_LENGTH.sanitize(100.0, 2.0), 5.0);
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert_eq!(
            RESISTANCE.parse("abc"),
            Err(ParameterError::NotANumber("abc".to_string()))
        );
        assert!(matches!(RESISTANCE.parse("inf"), Err(ParameterError::NotFinite(_))));
        assert_eq!(RESISTANCE.parse(" 0.0 "), Ok(0.1));
        assert_eq!(RESISTANCE.parse("220"), Ok(220.0));
    }
}
