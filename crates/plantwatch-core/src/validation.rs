//! Configuration validation for plants, sensors and alert rules.
//!
//! The evaluation engine tolerates any configuration, but the store refuses
//! to persist configurations that would make evaluation meaningless: ranges
//! with `max < min`, sensors whose unit disagrees with their plant, and
//! comparison rules without a threshold.
//!
//! # Example
//!
//! ```
//! use plantwatch_core::validation::{ValidationIssue, validate_plant};
//! use plantwatch_types::{MeasurementType, Plant};
//!
//! let plant = Plant::new(1, "Fern")
//!     .with_legacy(&MeasurementType::Ph, Some(7.0), Some(5.0), None);
//!
//! let result = validate_plant(&plant);
//! assert!(!result.is_valid());
//! assert!(matches!(result.issues[0], ValidationIssue::InvertedRange { .. }));
//! ```

use serde::Serialize;
use tracing::warn;

use plantwatch_types::{AlertCondition, AlertRule, Bounds, MeasurementType, Plant, Sensor};

use crate::error::{Error, Result};

/// A single problem found in a configuration.
///
/// This enum is marked `#[non_exhaustive]` to allow adding new issue types
/// in future versions without breaking downstream code.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[non_exhaustive]
pub enum ValidationIssue {
    /// A range has its maximum below its minimum.
    InvertedRange { label: String, min: f64, max: f64 },
    /// A sensor's unit disagrees with the plant's configured unit.
    UnitConflict {
        measurement: String,
        sensor_unit: String,
        plant_unit: String,
    },
    /// A comparison condition has no threshold.
    MissingThreshold { condition: AlertCondition },
    /// Sampling interval of zero seconds.
    ZeroInterval,
    /// A required text field is blank.
    EmptyField(&'static str),
}

impl std::fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ValidationIssue::InvertedRange { label, min, max } => {
                write!(f, "{label}: maximum {max} is below minimum {min}")
            }
            ValidationIssue::UnitConflict {
                measurement,
                sensor_unit,
                plant_unit,
            } => write!(
                f,
                "unit conflict for {measurement}: sensor uses '{sensor_unit}', plant expects '{plant_unit}'"
            ),
            ValidationIssue::MissingThreshold { condition } => {
                write!(f, "condition {condition} requires a threshold")
            }
            ValidationIssue::ZeroInterval => write!(f, "reading interval must be greater than zero"),
            ValidationIssue::EmptyField(field) => write!(f, "field '{field}' must not be empty"),
        }
    }
}

impl From<ValidationIssue> for Error {
    fn from(issue: ValidationIssue) -> Self {
        match issue {
            ValidationIssue::InvertedRange { label, min, max } => {
                Error::InvertedRange { label, min, max }
            }
            ValidationIssue::UnitConflict {
                measurement,
                sensor_unit,
                plant_unit,
            } => Error::UnitConflict {
                measurement,
                sensor_unit,
                plant_unit,
            },
            ValidationIssue::MissingThreshold { condition } => {
                Error::MissingThreshold(condition.to_string())
            }
            ValidationIssue::ZeroInterval => Error::ZeroInterval,
            ValidationIssue::EmptyField(field) => Error::EmptyField(field),
        }
    }
}

/// Result of validating a configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ValidationResult {
    /// Problems found, in check order.
    pub issues: Vec<ValidationIssue>,
}

impl ValidationResult {
    /// A result with no issues.
    pub fn valid() -> Self {
        Self::default()
    }

    /// Whether no issues were found.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.issues.is_empty()
    }

    fn push(&mut self, issue: ValidationIssue) {
        warn!(%issue, "Configuration rejected");
        self.issues.push(issue);
    }

    /// Convert into a hard failure: a single issue maps to its own error
    /// variant, several issues to [`Error::Invalid`].
    pub fn into_result(mut self) -> Result<()> {
        match self.issues.len() {
            0 => Ok(()),
            1 => Err(self.issues.remove(0).into()),
            _ => Err(Error::Invalid(self.issues)),
        }
    }
}

fn check_bounds(result: &mut ValidationResult, label: &str, bounds: Bounds) {
    if let (Some(min), Some(max)) = (bounds.min, bounds.max)
        && max < min
    {
        result.push(ValidationIssue::InvertedRange {
            label: label.to_string(),
            min,
            max,
        });
    }
}

/// Validate a plant's name, legacy triples and ideal ranges.
#[must_use]
pub fn validate_plant(plant: &Plant) -> ValidationResult {
    let mut result = ValidationResult::valid();
    if plant.name.trim().is_empty() {
        result.push(ValidationIssue::EmptyField("name"));
    }
    for measurement in &MeasurementType::BUILTIN {
        if let Some(legacy) = plant.legacy(measurement) {
            check_bounds(&mut result, measurement.label(), legacy.bounds());
        }
    }
    for range in &plant.ideal_ranges {
        check_bounds(&mut result, range.measurement.label(), range.bounds());
    }
    result
}

/// Validate a sensor's own fields.
#[must_use]
pub fn validate_sensor(sensor: &Sensor) -> ValidationResult {
    let mut result = ValidationResult::valid();
    if sensor.hardware_id.trim().is_empty() {
        result.push(ValidationIssue::EmptyField("hardware_id"));
    }
    if sensor.name.trim().is_empty() {
        result.push(ValidationIssue::EmptyField("name"));
    }
    if sensor.reading_interval_secs == 0 {
        result.push(ValidationIssue::ZeroInterval);
    }
    result
}

/// Check a sensor's unit against the unit its plant configures for the
/// sensor's measurement type. Plants without a unit for that type accept any.
pub fn check_unit(measurement: &MeasurementType, sensor_unit: &str, plant: &Plant) -> Result<()> {
    match plant.expected_unit(measurement) {
        Some(plant_unit) if plant_unit.trim() != sensor_unit.trim() => {
            let issue = ValidationIssue::UnitConflict {
                measurement: measurement.to_string(),
                sensor_unit: sensor_unit.to_string(),
                plant_unit: plant_unit.to_string(),
            };
            warn!(%issue, plant_id = plant.id, "Configuration rejected");
            Err(issue.into())
        }
        _ => Ok(()),
    }
}

/// Validate an alert rule's name and threshold presence.
#[must_use]
pub fn validate_rule(rule: &AlertRule) -> ValidationResult {
    let mut result = ValidationResult::valid();
    if rule.name.trim().is_empty() {
        result.push(ValidationIssue::EmptyField("name"));
    }
    if rule.condition.requires_threshold() && rule.threshold.is_none() {
        result.push(ValidationIssue::MissingThreshold {
            condition: rule.condition,
        });
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use plantwatch_types::IdealRange;

    #[test]
    fn test_valid_plant() {
        let plant = Plant::new(1, "Basil")
            .with_legacy(&MeasurementType::Temperature, Some(10.0), Some(30.0), Some("°C"))
            .with_ideal_range(IdealRange::new(MeasurementType::Ph, "pH", Some(6.0), Some(6.0)));
        assert!(validate_plant(&plant).is_valid());
        assert!(validate_plant(&plant).into_result().is_ok());
    }

    #[test]
    fn test_single_sided_bounds_are_valid() {
        let plant = Plant::new(1, "Basil")
            .with_legacy(&MeasurementType::Light, None, Some(1000.0), None);
        assert!(validate_plant(&plant).is_valid());
    }

    #[test]
    fn test_inverted_legacy_range() {
        let plant = Plant::new(1, "Basil")
            .with_legacy(&MeasurementType::Humidity, Some(80.0), Some(40.0), None);
        let err = validate_plant(&plant).into_result().unwrap_err();
        assert_eq!(
            err,
            Error::InvertedRange {
                label: "Umidade".to_string(),
                min: 80.0,
                max: 40.0
            }
        );
    }

    #[test]
    fn test_inverted_ideal_range_uses_type_label() {
        let plant = Plant::new(1, "Basil").with_ideal_range(IdealRange::new(
            "co2".parse().unwrap(),
            "ppm",
            Some(900.0),
            Some(400.0),
        ));
        let result = validate_plant(&plant);
        assert_eq!(
            result.issues,
            vec![ValidationIssue::InvertedRange {
                label: "CO2".to_string(),
                min: 900.0,
                max: 400.0
            }]
        );
    }

    #[test]
    fn test_multiple_issues_collected() {
        let plant = Plant::new(1, "  ")
            .with_legacy(&MeasurementType::Ph, Some(8.0), Some(5.0), None);
        let result = validate_plant(&plant);
        assert_eq!(result.issues.len(), 2);
        assert!(matches!(result.into_result(), Err(Error::Invalid(issues)) if issues.len() == 2));
    }

    #[test]
    fn test_sensor_validation() {
        let sensor = Sensor::new(1, "", "Bench", MeasurementType::Ph).with_interval(0);
        let result = validate_sensor(&sensor);
        assert_eq!(
            result.issues,
            vec![
                ValidationIssue::EmptyField("hardware_id"),
                ValidationIssue::ZeroInterval
            ]
        );
    }

    #[test]
    fn test_unit_conflict_with_legacy_unit() {
        let plant = Plant::new(1, "Basil")
            .with_legacy(&MeasurementType::Temperature, Some(10.0), Some(30.0), Some("°C"));
        assert!(check_unit(&MeasurementType::Temperature, "°C", &plant).is_ok());
        let err = check_unit(&MeasurementType::Temperature, "°F", &plant).unwrap_err();
        assert!(matches!(err, Error::UnitConflict { .. }));
    }

    #[test]
    fn test_unit_conflict_with_ideal_range_unit() {
        let co2: MeasurementType = "CO2".parse().unwrap();
        let plant = Plant::new(1, "Basil").with_ideal_range(IdealRange::new(
            co2.clone(),
            "ppm",
            None,
            Some(1000.0),
        ));
        assert!(check_unit(&co2, "ppm", &plant).is_ok());
        assert!(check_unit(&co2, "mg/m3", &plant).is_err());
    }

    #[test]
    fn test_unit_unconfigured_accepts_anything() {
        let plant = Plant::new(1, "Basil");
        assert!(check_unit(&MeasurementType::Light, "lux", &plant).is_ok());
    }

    #[test]
    fn test_rule_threshold_presence() {
        let missing = AlertRule::new(
            1,
            "Hot",
            MeasurementType::Temperature,
            AlertCondition::GreaterThan,
            None,
        );
        assert_eq!(
            validate_rule(&missing).into_result().unwrap_err(),
            Error::MissingThreshold("GREATER_THAN".to_string())
        );

        let out_of_range = AlertRule::new(
            2,
            "Out",
            MeasurementType::Temperature,
            AlertCondition::OutOfRange,
            None,
        );
        assert!(validate_rule(&out_of_range).is_valid());
    }

    #[test]
    fn test_issue_display() {
        let issue = ValidationIssue::MissingThreshold {
            condition: AlertCondition::Equals,
        };
        assert_eq!(issue.to_string(), "condition EQUALS requires a threshold");
    }
}
