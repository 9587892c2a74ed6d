//! Error types.
//!
//! Only construction and control can fail. Once an [`Engine`](crate::engine::Engine)
//! exists, ticking never returns an error: referential faults are recovered
//! locally and contention misses are ordinary outcomes.

use crate::id::CityId;

/// Invalid construction parameters. Fatal for the construction attempt.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConfigError {
    #[error("scenario has no cities")]
    NoCities,

    #[error("city '{city}' has no gates")]
    NoGates { city: String },

    #[error("rate '{name}' must be positive and finite, got {value}")]
    NonPositiveRate { name: &'static str, value: f64 },

    #[error("speed range is invalid: min {min}, max {max}")]
    InvalidSpeedRange { min: f64, max: f64 },

    #[error("pipeline {index} references unknown city {city:?}")]
    UnknownCity { index: usize, city: CityId },

    #[error("pipeline {index} starts and ends at the same city {city:?}")]
    LoopPipeline { index: usize, city: CityId },

    #[error("pipeline {index} has zero capacity")]
    ZeroCapacity { index: usize },

    #[error("event log capacity must be at least 1")]
    ZeroLogCapacity,

    #[error("ceiling {ceiling} ft must be above ground {ground} ft")]
    InvertedAltitudes { ground: f64, ceiling: f64 },

    #[error("gate distance {distance} for city '{city}' must lie in (0, {ring_radius}]")]
    GateOutsideRing {
        city: String,
        distance: f64,
        ring_radius: f64,
    },

    #[error("start hour {0} is outside 0..24")]
    InvalidStartHour(u8),

    #[error("demand profile needs 24 hourly and 7 daily entries, got {hourly} and {daily}")]
    ProfileShape { hourly: usize, daily: usize },

    #[error("demand multiplier must be finite and non-negative, got {0}")]
    InvalidMultiplier(f64),
}

/// A control command the engine refused. The engine is left unchanged.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ControlError {
    #[error("speed multiplier must be positive and finite, got {0}")]
    InvalidSpeed(f64),
}

/// Check that a named rate is strictly positive and finite.
pub(crate) fn require_positive(name: &'static str, value: f64) -> Result<(), ConfigError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(ConfigError::NonPositiveRate { name, value })
    }
}
