//! Core types for plants, sensors and readings.

use core::fmt;
use core::str::FromStr;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::error::ParseError;

/// Sampling cadence assumed for sensors that do not declare one.
pub const DEFAULT_READING_INTERVAL_SECS: u32 = 60;

/// Kind of quantity a sensor measures.
///
/// The four built-in variants have dedicated legacy fields on [`Plant`].
/// Everything else is carried as [`MeasurementType::Custom`] and can only be
/// configured through the plant's [`IdealRange`] list.
///
/// Parsing is case-insensitive and custom keys are normalized to upper case,
/// so `"co2"` and `"CO2"` compare equal.
///
/// ```
/// use plantwatch_types::MeasurementType;
///
/// assert_eq!("temperature".parse::<MeasurementType>().unwrap(), MeasurementType::Temperature);
/// assert_eq!("co2".parse::<MeasurementType>().unwrap(), MeasurementType::Custom("CO2".into()));
/// assert_eq!(MeasurementType::Ph.label(), "PH");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(into = "String", try_from = "String")
)]
pub enum MeasurementType {
    /// Air or substrate temperature.
    Temperature,
    /// Relative or soil humidity.
    Humidity,
    /// Soil or solution pH.
    Ph,
    /// Luminosity.
    Light,
    /// Any other measurement, keyed by its upper-case name.
    Custom(String),
}

impl MeasurementType {
    /// Built-in measurement types, in the order alerts are checked and reported.
    pub const BUILTIN: [MeasurementType; 4] = [
        MeasurementType::Temperature,
        MeasurementType::Humidity,
        MeasurementType::Ph,
        MeasurementType::Light,
    ];

    /// Canonical upper-case key, as stored in the database.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            MeasurementType::Temperature => "TEMPERATURE",
            MeasurementType::Humidity => "HUMIDITY",
            MeasurementType::Ph => "PH",
            MeasurementType::Light => "LIGHT",
            MeasurementType::Custom(key) => key,
        }
    }

    /// Human-readable label used in per-sensor alert messages.
    #[must_use]
    pub fn label(&self) -> &str {
        match self.builtin_index() {
            Some(0) => "Temperatura",
            Some(1) => "Umidade",
            Some(2) => "PH",
            Some(3) => "Luminosidade",
            _ => self.as_str(),
        }
    }

    /// Label used in plant-level alert messages.
    #[must_use]
    pub fn plant_label(&self) -> &str {
        match self.builtin_index() {
            Some(0) => "Temperatura",
            Some(1) => "Umidade",
            Some(2) => "pH",
            Some(3) => "Luz",
            _ => self.as_str(),
        }
    }

    /// Case-insensitive comparison of the canonical keys.
    ///
    /// Unlike `==`, this also matches a hand-built `Custom("co2")` against
    /// the parsed `"CO2"`, or `Custom("ph")` against [`MeasurementType::Ph`].
    #[must_use]
    pub fn matches(&self, other: &MeasurementType) -> bool {
        self.as_str().eq_ignore_ascii_case(other.as_str())
    }

    /// Whether this is one of the four types with legacy plant fields.
    #[must_use]
    pub fn is_builtin(&self) -> bool {
        self.builtin_index().is_some()
    }

    /// Position in [`MeasurementType::BUILTIN`].
    fn builtin_index(&self) -> Option<usize> {
        match self {
            MeasurementType::Temperature => Some(0),
            MeasurementType::Humidity => Some(1),
            MeasurementType::Ph => Some(2),
            MeasurementType::Light => Some(3),
            MeasurementType::Custom(key) => ["TEMPERATURE", "HUMIDITY", "PH", "LIGHT"]
                .iter()
                .position(|builtin| key.eq_ignore_ascii_case(builtin)),
        }
    }
}

impl FromStr for MeasurementType {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key = s.trim().to_uppercase();
        match key.as_str() {
            "" => Err(ParseError::EmptyMeasurementType),
            "TEMPERATURE" => Ok(MeasurementType::Temperature),
            "HUMIDITY" => Ok(MeasurementType::Humidity),
            "PH" => Ok(MeasurementType::Ph),
            "LIGHT" => Ok(MeasurementType::Light),
            _ => Ok(MeasurementType::Custom(key)),
        }
    }
}

impl TryFrom<String> for MeasurementType {
    type Error = ParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<MeasurementType> for String {
    fn from(value: MeasurementType) -> Self {
        match value {
            MeasurementType::Custom(key) => key,
            builtin => builtin.as_str().to_string(),
        }
    }
}

impl fmt::Display for MeasurementType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Resolved comparison bounds for one measurement type.
///
/// Either side may be absent. `Bounds::NONE` means no thresholds are
/// configured, which classifies every reading as normal.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Bounds {
    /// Lower bound (inclusive).
    pub min: Option<f64>,
    /// Upper bound (inclusive).
    pub max: Option<f64>,
}

impl Bounds {
    /// No bounds configured.
    pub const NONE: Bounds = Bounds {
        min: None,
        max: None,
    };

    /// Create bounds from optional sides.
    #[must_use]
    pub const fn new(min: Option<f64>, max: Option<f64>) -> Self {
        Self { min, max }
    }

    /// Bounds with both sides set.
    #[must_use]
    pub const fn between(min: f64, max: f64) -> Self {
        Self {
            min: Some(min),
            max: Some(max),
        }
    }

    /// True when neither side is set.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.min.is_none() && self.max.is_none()
    }
}

/// One legacy `{min, max, unit}` triple stored directly on a plant.
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct LegacyRange {
    /// Lower bound.
    #[cfg_attr(feature = "serde", serde(default, skip_serializing_if = "Option::is_none"))]
    pub min: Option<f64>,
    /// Upper bound.
    #[cfg_attr(feature = "serde", serde(default, skip_serializing_if = "Option::is_none"))]
    pub max: Option<f64>,
    /// Unit the bounds are expressed in.
    #[cfg_attr(feature = "serde", serde(default, skip_serializing_if = "Option::is_none"))]
    pub unit: Option<String>,
}

impl LegacyRange {
    /// The bounds carried by this triple.
    #[must_use]
    pub fn bounds(&self) -> Bounds {
        Bounds::new(self.min, self.max)
    }

    /// True when at least one bound is configured.
    #[must_use]
    pub fn has_bounds(&self) -> bool {
        self.min.is_some() || self.max.is_some()
    }
}

/// A user-configured ideal range for one measurement type on a plant.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct IdealRange {
    /// Measurement type this range applies to.
    #[cfg_attr(feature = "serde", serde(rename = "type"))]
    pub measurement: MeasurementType,
    /// Unit the bounds are expressed in.
    pub unit: String,
    /// Lower bound.
    #[cfg_attr(feature = "serde", serde(default, skip_serializing_if = "Option::is_none"))]
    pub min: Option<f64>,
    /// Upper bound.
    #[cfg_attr(feature = "serde", serde(default, skip_serializing_if = "Option::is_none"))]
    pub max: Option<f64>,
}

impl IdealRange {
    /// Create an ideal range.
    pub fn new(
        measurement: MeasurementType,
        unit: impl Into<String>,
        min: Option<f64>,
        max: Option<f64>,
    ) -> Self {
        Self {
            measurement,
            unit: unit.into(),
            min,
            max,
        }
    }

    /// The bounds carried by this range.
    #[must_use]
    pub fn bounds(&self) -> Bounds {
        Bounds::new(self.min, self.max)
    }
}

/// A monitored plant and its configured ideal conditions.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Plant {
    /// Database identifier.
    pub id: i64,
    /// User that created the plant.
    pub owner_id: i64,
    /// Display name.
    pub name: String,
    /// Botanical species.
    pub species: String,
    /// Where the plant is kept.
    pub location: String,
    /// Legacy temperature bounds.
    #[cfg_attr(feature = "serde", serde(default))]
    pub temperature: LegacyRange,
    /// Legacy humidity bounds.
    #[cfg_attr(feature = "serde", serde(default))]
    pub humidity: LegacyRange,
    /// Legacy pH bounds.
    #[cfg_attr(feature = "serde", serde(default))]
    pub ph: LegacyRange,
    /// Legacy luminosity bounds.
    #[cfg_attr(feature = "serde", serde(default))]
    pub light: LegacyRange,
    /// Generic ideal ranges, in configuration order.
    #[cfg_attr(feature = "serde", serde(default))]
    pub ideal_ranges: Vec<IdealRange>,
    /// Free-form notes.
    #[cfg_attr(feature = "serde", serde(default, skip_serializing_if = "Option::is_none"))]
    pub notes: Option<String>,
    /// Notes about growing conditions.
    #[cfg_attr(feature = "serde", serde(default, skip_serializing_if = "Option::is_none"))]
    pub notes_conditions: Option<String>,
    /// Creation time.
    #[cfg_attr(feature = "serde", serde(with = "time::serde::rfc3339"))]
    pub created_at: OffsetDateTime,
    /// Last modification time.
    #[cfg_attr(feature = "serde", serde(with = "time::serde::rfc3339"))]
    pub updated_at: OffsetDateTime,
}

impl Plant {
    /// Create a plant with no configured ranges.
    pub fn new(id: i64, name: impl Into<String>) -> Self {
        let now = OffsetDateTime::now_utc();
        Self {
            id,
            owner_id: 0,
            name: name.into(),
            species: String::new(),
            location: String::new(),
            temperature: LegacyRange::default(),
            humidity: LegacyRange::default(),
            ph: LegacyRange::default(),
            light: LegacyRange::default(),
            ideal_ranges: Vec::new(),
            notes: None,
            notes_conditions: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Set the legacy bounds for a built-in type. Custom types are ignored.
    #[must_use]
    pub fn with_legacy(
        mut self,
        measurement: &MeasurementType,
        min: Option<f64>,
        max: Option<f64>,
        unit: Option<&str>,
    ) -> Self {
        if let Some(legacy) = self.legacy_mut(measurement) {
            *legacy = LegacyRange {
                min,
                max,
                unit: unit.map(str::to_string),
            };
        }
        self
    }

    /// Append an ideal range.
    #[must_use]
    pub fn with_ideal_range(mut self, range: IdealRange) -> Self {
        self.ideal_ranges.push(range);
        self
    }

    /// Legacy triple for a built-in type, `None` for custom types.
    #[must_use]
    pub fn legacy(&self, measurement: &MeasurementType) -> Option<&LegacyRange> {
        match measurement.builtin_index()? {
            0 => Some(&self.temperature),
            1 => Some(&self.humidity),
            2 => Some(&self.ph),
            _ => Some(&self.light),
        }
    }

    /// Mutable legacy triple for a built-in type.
    pub fn legacy_mut(&mut self, measurement: &MeasurementType) -> Option<&mut LegacyRange> {
        match measurement.builtin_index()? {
            0 => Some(&mut self.temperature),
            1 => Some(&mut self.humidity),
            2 => Some(&mut self.ph),
            _ => Some(&mut self.light),
        }
    }

    /// First ideal range configured for `measurement`, compared without
    /// regard to case.
    #[must_use]
    pub fn ideal_range(&self, measurement: &MeasurementType) -> Option<&IdealRange> {
        self.ideal_ranges
            .iter()
            .find(|range| range.measurement.matches(measurement))
    }

    /// Unit the plant expects for `measurement`, if any is configured.
    ///
    /// The legacy unit wins for built-in types; otherwise the first matching
    /// ideal range's unit is used.
    #[must_use]
    pub fn expected_unit(&self, measurement: &MeasurementType) -> Option<&str> {
        self.legacy(measurement)
            .and_then(|legacy| legacy.unit.as_deref())
            .or_else(|| self.ideal_range(measurement).map(|r| r.unit.as_str()))
    }
}

/// A physical sensor owned by a user, optionally attached to a plant.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Sensor {
    /// Database identifier.
    pub id: i64,
    /// User that owns the sensor.
    pub owner_id: i64,
    /// Plant the sensor is attached to.
    #[cfg_attr(feature = "serde", serde(default, skip_serializing_if = "Option::is_none"))]
    pub plant_id: Option<i64>,
    /// Globally unique hardware identifier.
    pub hardware_id: String,
    /// Display name.
    pub name: String,
    /// What the sensor measures.
    #[cfg_attr(feature = "serde", serde(rename = "type"))]
    pub measurement: MeasurementType,
    /// Unit of the reported values.
    pub unit: String,
    /// Where the sensor is installed.
    pub location: String,
    /// Whether threshold breaches should be reported.
    pub alerts_enabled: bool,
    /// Expected sampling cadence in seconds.
    #[cfg_attr(feature = "serde", serde(default = "default_interval"))]
    pub reading_interval_secs: u32,
    /// Free-form notes.
    #[cfg_attr(feature = "serde", serde(default, skip_serializing_if = "Option::is_none"))]
    pub notes: Option<String>,
    /// Creation time.
    #[cfg_attr(feature = "serde", serde(with = "time::serde::rfc3339"))]
    pub created_at: OffsetDateTime,
    /// Last modification time.
    #[cfg_attr(feature = "serde", serde(with = "time::serde::rfc3339"))]
    pub updated_at: OffsetDateTime,
}

#[cfg(feature = "serde")]
fn default_interval() -> u32 {
    DEFAULT_READING_INTERVAL_SECS
}

impl Sensor {
    /// Create an unattached sensor with alerts enabled and the default cadence.
    pub fn new(
        id: i64,
        hardware_id: impl Into<String>,
        name: impl Into<String>,
        measurement: MeasurementType,
    ) -> Self {
        let now = OffsetDateTime::now_utc();
        Self {
            id,
            owner_id: 0,
            plant_id: None,
            hardware_id: hardware_id.into(),
            name: name.into(),
            measurement,
            unit: String::new(),
            location: String::new(),
            alerts_enabled: true,
            reading_interval_secs: DEFAULT_READING_INTERVAL_SECS,
            notes: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Attach to a plant.
    #[must_use]
    pub fn with_plant(mut self, plant_id: i64) -> Self {
        self.plant_id = Some(plant_id);
        self
    }

    /// Set the reporting unit.
    #[must_use]
    pub fn with_unit(mut self, unit: impl Into<String>) -> Self {
        self.unit = unit.into();
        self
    }

    /// Set the expected sampling cadence.
    #[must_use]
    pub fn with_interval(mut self, secs: u32) -> Self {
        self.reading_interval_secs = secs;
        self
    }

    /// Enable or disable threshold alerts.
    #[must_use]
    pub fn with_alerts(mut self, enabled: bool) -> Self {
        self.alerts_enabled = enabled;
        self
    }
}

/// Classification attached to a reading at ingestion time.
///
/// Ordered by severity: `Normal < Attention < Critical`.
///
/// Serialized as `NORMAL`, `ATTENTION` and `CRITICAL`. The legacy stored
/// spellings `ATENCAO` and `CRITICO` are accepted on input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(rename_all = "UPPERCASE")
)]
pub enum ReadingStatus {
    /// Comfortably inside the configured range.
    #[default]
    Normal,
    /// Inside the range but within the warning band of an edge.
    #[cfg_attr(feature = "serde", serde(alias = "ATENCAO"))]
    Attention,
    /// Outside the configured range.
    #[cfg_attr(feature = "serde", serde(alias = "CRITICO"))]
    Critical,
}

impl ReadingStatus {
    /// Canonical upper-case name.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            ReadingStatus::Normal => "NORMAL",
            ReadingStatus::Attention => "ATTENTION",
            ReadingStatus::Critical => "CRITICAL",
        }
    }
}

impl FromStr for ReadingStatus {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "NORMAL" => Ok(ReadingStatus::Normal),
            "ATTENTION" | "ATENCAO" => Ok(ReadingStatus::Attention),
            "CRITICAL" | "CRITICO" => Ok(ReadingStatus::Critical),
            _ => Err(ParseError::UnknownReadingStatus(s.to_string())),
        }
    }
}

impl fmt::Display for ReadingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Connectivity and alert status of a sensor or plant.
///
/// Displayed and serialized as `OFFLINE`, `ONLINE` and `EM ALERTA`.
///
/// ```
/// use plantwatch_types::SensorStatus;
///
/// assert_eq!(SensorStatus::InAlert.to_string(), "EM ALERTA");
/// assert_eq!("em_alerta".parse::<SensorStatus>().unwrap(), SensorStatus::InAlert);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum SensorStatus {
    /// No recent reading.
    #[default]
    #[cfg_attr(feature = "serde", serde(rename = "OFFLINE"))]
    Offline,
    /// Reporting on schedule with no breaches.
    #[cfg_attr(feature = "serde", serde(rename = "ONLINE"))]
    Online,
    /// At least one threshold breach.
    #[cfg_attr(
        feature = "serde",
        serde(rename = "EM ALERTA", alias = "EM_ALERTA", alias = "IN_ALERT")
    )]
    InAlert,
}

impl SensorStatus {
    /// Display name.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            SensorStatus::Offline => "OFFLINE",
            SensorStatus::Online => "ONLINE",
            SensorStatus::InAlert => "EM ALERTA",
        }
    }
}

impl FromStr for SensorStatus {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "OFFLINE" => Ok(SensorStatus::Offline),
            "ONLINE" => Ok(SensorStatus::Online),
            "EM ALERTA" | "EM_ALERTA" | "IN_ALERT" | "IN-ALERT" => Ok(SensorStatus::InAlert),
            _ => Err(ParseError::UnknownSensorStatus(s.to_string())),
        }
    }
}

impl fmt::Display for SensorStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One timestamped sample from a sensor. Immutable once stored.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Reading {
    /// Database identifier.
    pub id: i64,
    /// Sensor that produced the value.
    pub sensor_id: i64,
    /// Measured value.
    pub value: f64,
    /// When the reading was recorded.
    #[cfg_attr(feature = "serde", serde(with = "time::serde::rfc3339"))]
    pub created_at: OffsetDateTime,
    /// Classification computed at ingestion.
    #[cfg_attr(feature = "serde", serde(rename = "statusReading", default))]
    pub status: ReadingStatus,
}

impl Reading {
    /// Create an unclassified (normal) reading.
    pub fn new(sensor_id: i64, value: f64, created_at: OffsetDateTime) -> Self {
        Self {
            id: 0,
            sensor_id,
            value,
            created_at,
            status: ReadingStatus::Normal,
        }
    }
}
