//! Alert rules, fired alerts and their history.

use core::fmt;
use core::str::FromStr;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::error::ParseError;
use crate::types::MeasurementType;

/// Comparison applied by an [`AlertRule`] to a reading value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(rename_all = "SCREAMING_SNAKE_CASE")
)]
pub enum AlertCondition {
    /// Value strictly above the threshold.
    GreaterThan,
    /// Value strictly below the threshold.
    LessThan,
    /// Value equal to the threshold, within a tolerance.
    Equals,
    /// Value outside the linked plant's resolved bounds.
    OutOfRange,
}

impl AlertCondition {
    /// Canonical name.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            AlertCondition::GreaterThan => "GREATER_THAN",
            AlertCondition::LessThan => "LESS_THAN",
            AlertCondition::Equals => "EQUALS",
            AlertCondition::OutOfRange => "OUT_OF_RANGE",
        }
    }

    /// Whether this condition compares against a rule threshold.
    #[must_use]
    pub fn requires_threshold(&self) -> bool {
        !matches!(self, AlertCondition::OutOfRange)
    }
}

impl FromStr for AlertCondition {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().replace('-', "_").as_str() {
            "GREATER_THAN" | "GT" | ">" => Ok(AlertCondition::GreaterThan),
            "LESS_THAN" | "LT" | "<" => Ok(AlertCondition::LessThan),
            "EQUALS" | "EQ" | "=" => Ok(AlertCondition::Equals),
            "OUT_OF_RANGE" => Ok(AlertCondition::OutOfRange),
            _ => Err(ParseError::UnknownCondition(s.to_string())),
        }
    }
}

impl fmt::Display for AlertCondition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Severity assigned to alerts fired by a rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(rename_all = "UPPERCASE")
)]
pub enum AlertSeverity {
    /// Informational.
    Low,
    /// Worth a look.
    #[default]
    Medium,
    /// Needs attention soon.
    High,
    /// Needs attention now.
    Critical,
}

impl AlertSeverity {
    /// Canonical name.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            AlertSeverity::Low => "LOW",
            AlertSeverity::Medium => "MEDIUM",
            AlertSeverity::High => "HIGH",
            AlertSeverity::Critical => "CRITICAL",
        }
    }
}

impl FromStr for AlertSeverity {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "LOW" => Ok(AlertSeverity::Low),
            "MEDIUM" => Ok(AlertSeverity::Medium),
            "HIGH" => Ok(AlertSeverity::High),
            "CRITICAL" => Ok(AlertSeverity::Critical),
            _ => Err(ParseError::UnknownSeverity(s.to_string())),
        }
    }
}

impl fmt::Display for AlertSeverity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Lifecycle state of a fired alert. `Active` moves to `Resolved` once.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(rename_all = "UPPERCASE")
)]
pub enum AlertStatus {
    /// Fired and not yet handled.
    #[default]
    #[cfg_attr(feature = "serde", serde(alias = "ATIVO"))]
    Active,
    /// Closed by a user.
    #[cfg_attr(feature = "serde", serde(alias = "RESOLVIDO"))]
    Resolved,
}

impl AlertStatus {
    /// Canonical name.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            AlertStatus::Active => "ACTIVE",
            AlertStatus::Resolved => "RESOLVED",
        }
    }
}

impl FromStr for AlertStatus {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "ACTIVE" | "ATIVO" => Ok(AlertStatus::Active),
            "RESOLVED" | "RESOLVIDO" => Ok(AlertStatus::Resolved),
            _ => Err(ParseError::UnknownAlertStatus(s.to_string())),
        }
    }
}

impl fmt::Display for AlertStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A user-defined condition that fires an [`Alert`] when a reading matches.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct AlertRule {
    /// Database identifier.
    pub id: i64,
    /// User that owns the rule.
    pub owner_id: i64,
    /// Display name, used as the fired alert's title.
    pub name: String,
    /// Optional description copied into fired alerts.
    #[cfg_attr(feature = "serde", serde(default, skip_serializing_if = "Option::is_none"))]
    pub description: Option<String>,
    /// Measurement type the rule applies to.
    #[cfg_attr(feature = "serde", serde(rename = "type"))]
    pub measurement: MeasurementType,
    /// Unit the threshold is expressed in.
    #[cfg_attr(feature = "serde", serde(default, skip_serializing_if = "Option::is_none"))]
    pub unit: Option<String>,
    /// Comparison to apply.
    pub condition: AlertCondition,
    /// Threshold for comparison conditions.
    #[cfg_attr(feature = "serde", serde(default, skip_serializing_if = "Option::is_none"))]
    pub threshold: Option<f64>,
    /// Severity of fired alerts.
    pub severity: AlertSeverity,
    /// Disabled rules never fire.
    pub enabled: bool,
    /// Sensors the rule is bound to.
    #[cfg_attr(feature = "serde", serde(default))]
    pub sensor_ids: Vec<i64>,
    /// Creation time.
    #[cfg_attr(feature = "serde", serde(with = "time::serde::rfc3339"))]
    pub created_at: OffsetDateTime,
    /// Last modification time.
    #[cfg_attr(feature = "serde", serde(with = "time::serde::rfc3339"))]
    pub updated_at: OffsetDateTime,
}

impl AlertRule {
    /// Create an enabled rule with no bound sensors.
    pub fn new(
        id: i64,
        name: impl Into<String>,
        measurement: MeasurementType,
        condition: AlertCondition,
        threshold: Option<f64>,
    ) -> Self {
        let now = OffsetDateTime::now_utc();
        Self {
            id,
            owner_id: 0,
            name: name.into(),
            description: None,
            measurement,
            unit: None,
            condition,
            threshold,
            severity: AlertSeverity::default(),
            enabled: true,
            sensor_ids: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Bind the rule to the given sensors.
    #[must_use]
    pub fn with_sensors(mut self, sensor_ids: impl IntoIterator<Item = i64>) -> Self {
        self.sensor_ids = sensor_ids.into_iter().collect();
        self
    }

    /// Set the severity of fired alerts.
    #[must_use]
    pub fn with_severity(mut self, severity: AlertSeverity) -> Self {
        self.severity = severity;
        self
    }

    /// Whether the rule is bound to `sensor_id`.
    #[must_use]
    pub fn is_bound_to(&self, sensor_id: i64) -> bool {
        self.sensor_ids.contains(&sensor_id)
    }
}

/// A fired alert.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Alert {
    /// Database identifier.
    pub id: i64,
    /// User that owns the alert.
    pub owner_id: i64,
    /// Rule that fired it, if the rule still exists.
    #[cfg_attr(feature = "serde", serde(default, skip_serializing_if = "Option::is_none"))]
    pub rule_id: Option<i64>,
    /// Sensor whose reading fired it.
    pub sensor_id: i64,
    /// Plant the sensor was attached to at firing time.
    #[cfg_attr(feature = "serde", serde(default, skip_serializing_if = "Option::is_none"))]
    pub plant_id: Option<i64>,
    /// Short title.
    pub title: String,
    /// Longer description.
    #[cfg_attr(feature = "serde", serde(default, skip_serializing_if = "Option::is_none"))]
    pub description: Option<String>,
    /// Lifecycle state.
    pub status: AlertStatus,
    /// Severity copied from the rule.
    pub severity: AlertSeverity,
    /// Reading value that fired it.
    #[cfg_attr(feature = "serde", serde(default, skip_serializing_if = "Option::is_none"))]
    pub value: Option<f64>,
    /// Unit of the value.
    #[cfg_attr(feature = "serde", serde(default, skip_serializing_if = "Option::is_none"))]
    pub unit: Option<String>,
    /// When the alert fired.
    #[cfg_attr(feature = "serde", serde(with = "time::serde::rfc3339"))]
    pub fired_at: OffsetDateTime,
    /// When the alert was resolved.
    #[cfg_attr(
        feature = "serde",
        serde(default, with = "time::serde::rfc3339::option", skip_serializing_if = "Option::is_none")
    )]
    pub resolved_at: Option<OffsetDateTime>,
    /// User that resolved the alert.
    #[cfg_attr(feature = "serde", serde(default, skip_serializing_if = "Option::is_none"))]
    pub resolved_by: Option<i64>,
    /// Comment left on resolution.
    #[cfg_attr(feature = "serde", serde(default, skip_serializing_if = "Option::is_none"))]
    pub resolved_comment: Option<String>,
    /// Timeline, oldest first.
    #[cfg_attr(feature = "serde", serde(default))]
    pub events: Vec<AlertEvent>,
}

impl Alert {
    /// Whether the alert is still open.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.status == AlertStatus::Active
    }
}

/// One entry in an alert's timeline.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct AlertEvent {
    /// Database identifier.
    pub id: i64,
    /// Alert this event belongs to.
    pub alert_id: i64,
    /// Short title.
    pub title: String,
    /// Optional detail.
    #[cfg_attr(feature = "serde", serde(default, skip_serializing_if = "Option::is_none"))]
    pub message: Option<String>,
    /// When it happened.
    #[cfg_attr(feature = "serde", serde(with = "time::serde::rfc3339"))]
    pub at: OffsetDateTime,
    /// User that caused it, if any.
    #[cfg_attr(feature = "serde", serde(default, skip_serializing_if = "Option::is_none"))]
    pub by: Option<i64>,
}
