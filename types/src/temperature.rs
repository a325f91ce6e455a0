//! Sampling temperature, validated at construction.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A sampling temperature guaranteed to lie in `[0.0, 1.0]`.
///
/// Construction is the only validation point; once a `Temperature` exists it
/// can be persisted without further checks.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(try_from = "f64", into = "f64")]
pub struct Temperature(f64);

#[derive(Debug, Clone, Copy, PartialEq, Error)]
#[error("temperature {value} is out of range; expected a value in [0.0, 1.0]")]
pub struct TemperatureRangeError {
    value: f64,
}

impl TemperatureRangeError {
    #[must_use]
    pub const fn value(&self) -> f64 {
        self.value
    }
}

impl Temperature {
    pub const DEFAULT: Temperature = Temperature(0.5);

    pub fn new(value: f64) -> Result<Self, TemperatureRangeError> {
        // NaN fails both comparisons and is rejected here too.
        if (0.0..=1.0).contains(&value) {
            Ok(Self(value))
        } else {
            Err(TemperatureRangeError { value })
        }
    }

    #[must_use]
    pub const fn value(self) -> f64 {
        self.0
    }
}

impl Default for Temperature {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl fmt::Display for Temperature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.1}", self.0)
    }
}

impl TryFrom<f64> for Temperature {
    type Error = TemperatureRangeError;

    fn try_from(value: f64) -> Result<Self, Self::Error> {
        Temperature::new(value)
    }
}

impl From<Temperature> for f64 {
    fn from(temperature: Temperature) -> Self {
        temperature.value()
    }
}
