//! Alert rule evaluation against newly ingested readings.
//!
//! Every enabled rule bound to the reading's sensor, with a measurement type
//! matching the sensor's, is checked. Each match produces one [`AlertDraft`].
//! There is no deduplication: a rule that keeps matching keeps firing.
//!
//! # Example
//!
//! ```
//! use plantwatch_core::rules::RuleEvaluator;
//! use plantwatch_types::{AlertCondition, AlertRule, MeasurementType, Reading, ReadingStatus, Sensor};
//! use time::OffsetDateTime;
//!
//! let sensor = Sensor::new(3, "hw-3", "Bench", MeasurementType::Temperature);
//! let rule = AlertRule::new(1, "Too hot", MeasurementType::Temperature, AlertCondition::GreaterThan, Some(30.0))
//!     .with_sensors([3]);
//!
//! let mut reading = Reading::new(3, 31.5, OffsetDateTime::now_utc());
//! reading.status = ReadingStatus::Normal;
//!
//! let drafts = RuleEvaluator::default().evaluate(&[rule], &sensor, &reading);
//! assert_eq!(drafts.len(), 1);
//! assert_eq!(drafts[0].title, "Too hot");
//! ```

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use tracing::{debug, warn};

use plantwatch_types::{AlertCondition, AlertRule, AlertSeverity, Reading, ReadingStatus, Sensor};

/// Absolute tolerance used by `EQUALS` rules unless configured otherwise.
pub const DEFAULT_EQUALS_TOLERANCE: f64 = 1e-9;

/// Evaluates alert rules against readings.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RuleEvaluator {
    /// Maximum absolute difference at which `EQUALS` matches.
    pub equals_tolerance: f64,
}

impl Default for RuleEvaluator {
    fn default() -> Self {
        Self {
            equals_tolerance: DEFAULT_EQUALS_TOLERANCE,
        }
    }
}

/// Everything needed to persist a newly fired, active alert.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AlertDraft {
    /// Rule that fired.
    pub rule_id: i64,
    /// Owner of the rule.
    pub owner_id: i64,
    /// Sensor whose reading matched.
    pub sensor_id: i64,
    /// Plant the sensor is attached to.
    pub plant_id: Option<i64>,
    /// Alert title, taken from the rule name.
    pub title: String,
    /// Alert description.
    pub description: String,
    /// Severity copied from the rule.
    pub severity: AlertSeverity,
    /// Reading value.
    pub value: f64,
    /// Unit of the value.
    pub unit: Option<String>,
    /// Reading timestamp.
    #[serde(with = "time::serde::rfc3339")]
    pub fired_at: OffsetDateTime,
}

impl RuleEvaluator {
    /// Create an evaluator with a custom `EQUALS` tolerance.
    ///
    /// Negative or non-finite tolerances fall back to the default.
    pub fn new(equals_tolerance: f64) -> Self {
        if equals_tolerance.is_finite() && equals_tolerance >= 0.0 {
            Self { equals_tolerance }
        } else {
            warn!(equals_tolerance, "Ignoring invalid EQUALS tolerance");
            Self::default()
        }
    }

    /// Whether `rule`'s condition holds for a reading.
    ///
    /// `status` is the reading's stored classification, used by
    /// `OUT_OF_RANGE`. Comparison rules without a threshold never match.
    #[must_use]
    pub fn matches(&self, rule: &AlertRule, value: f64, status: ReadingStatus) -> bool {
        match (rule.condition, rule.threshold) {
            (AlertCondition::OutOfRange, _) => status == ReadingStatus::Critical,
            (AlertCondition::GreaterThan, Some(threshold)) => value > threshold,
            (AlertCondition::LessThan, Some(threshold)) => value < threshold,
            (AlertCondition::Equals, Some(threshold)) => {
                (value - threshold).abs() <= self.equals_tolerance
            }
            (condition, None) => {
                warn!(rule_id = rule.id, %condition, "Rule has no threshold, skipping");
                false
            }
        }
    }

    /// Rules that apply to readings from `sensor`: enabled, bound to it, and
    /// for the same measurement type (compared without regard to case).
    pub fn applicable_rules<'a>(
        &self,
        rules: &'a [AlertRule],
        sensor: &'a Sensor,
    ) -> impl Iterator<Item = &'a AlertRule> + 'a {
        rules.iter().filter(move |rule| {
            rule.enabled
                && rule.is_bound_to(sensor.id)
                && rule.measurement.matches(&sensor.measurement)
        })
    }

    /// Evaluate every applicable rule and return one draft per match.
    #[must_use]
    pub fn evaluate(&self, rules: &[AlertRule], sensor: &Sensor, reading: &Reading) -> Vec<AlertDraft> {
        let drafts: Vec<AlertDraft> = self
            .applicable_rules(rules, sensor)
            .filter(|rule| self.matches(rule, reading.value, reading.status))
            .map(|rule| draft(rule, sensor, reading))
            .collect();

        debug!(
            sensor_id = sensor.id,
            value = reading.value,
            fired = drafts.len(),
            "Evaluated alert rules"
        );
        drafts
    }
}

fn draft(rule: &AlertRule, sensor: &Sensor, reading: &Reading) -> AlertDraft {
    let label = sensor.measurement.label();
    let description = rule.description.clone().unwrap_or_else(|| {
        let subject = match (rule.condition, rule.threshold) {
            (AlertCondition::GreaterThan, Some(t)) => format!("acima de {t}"),
            (AlertCondition::LessThan, Some(t)) => format!("abaixo de {t}"),
            (AlertCondition::Equals, Some(t)) => format!("igual a {t}"),
            _ => "fora da faixa ideal".to_string(),
        };
        format!("{label} {subject} no sensor {}: {}", sensor.name, reading.value)
    });
    let unit = rule
        .unit
        .clone()
        .or_else(|| (!sensor.unit.is_empty()).then(|| sensor.unit.clone()));

    AlertDraft {
        rule_id: rule.id,
        owner_id: rule.owner_id,
        sensor_id: sensor.id,
        plant_id: sensor.plant_id,
        title: rule.name.clone(),
        description,
        severity: rule.severity,
        value: reading.value,
        unit,
        fired_at: reading.created_at,
    }
}
