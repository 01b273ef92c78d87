//! Error types for plantwatch-core.
//!
//! The evaluation functions in this crate are total and never fail. Errors
//! only arise from configuration validation, which the persistence layer runs
//! before storing plants, sensors and alert rules.

use thiserror::Error;

use crate::validation::ValidationIssue;

/// Errors raised when a configuration is rejected.
///
/// This enum is marked `#[non_exhaustive]` to allow adding new error variants
/// in future versions without breaking downstream code.
#[derive(Debug, Clone, PartialEq, Error)]
#[non_exhaustive]
pub enum Error {
    /// A range has its maximum below its minimum.
    #[error("{label}: maximum {max} is below minimum {min}")]
    InvertedRange {
        /// Human label of the measurement type.
        label: String,
        /// Configured minimum.
        min: f64,
        /// Configured maximum.
        max: f64,
    },

    /// A sensor's unit disagrees with the unit its plant expects.
    #[error("Unit conflict for {measurement}: sensor uses '{sensor_unit}', plant expects '{plant_unit}'")]
    UnitConflict {
        /// Measurement type key.
        measurement: String,
        /// Unit declared by the sensor.
        sensor_unit: String,
        /// Unit configured on the plant.
        plant_unit: String,
    },

    /// A comparison rule has no threshold.
    #[error("Condition {0} requires a threshold")]
    MissingThreshold(String),

    /// A sensor declares a zero sampling interval.
    #[error("Reading interval must be greater than zero")]
    ZeroInterval,

    /// A required text field is blank.
    #[error("Field '{0}' must not be empty")]
    EmptyField(&'static str),

    /// Several issues were found at once.
    #[error("Invalid configuration: {}", join_issues(.0))]
    Invalid(Vec<ValidationIssue>),
}

fn join_issues(issues: &[ValidationIssue]) -> String {
    issues
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// Result type alias using plantwatch-core's Error type.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_inverted_range_display() {
        let err = Error::InvertedRange {
            label: "Temperatura".to_string(),
            min: 30.0,
            max: 10.0,
        };
        assert_eq!(
            err.to_string(),
            "Temperatura: maximum 10 is below minimum 30"
        );
    }

    #[test]
    fn test_unit_conflict_display() {
        let err = Error::UnitConflict {
            measurement: "TEMPERATURE".to_string(),
            sensor_unit: "°F".to_string(),
            plant_unit: "°C".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("°F"));
        assert!(msg.contains("°C"));
    }

    #[test]
    fn test_invalid_joins_issues() {
        let err = Error::Invalid(vec![
            ValidationIssue::ZeroInterval,
            ValidationIssue::EmptyField("name"),
        ]);
        let msg = err.to_string();
        assert!(msg.contains("; "));
        assert!(msg.contains("name"));
    }
}
