//! Input and view models for stored data.

use serde::{Deserialize, Serialize};

use plantwatch_core::{PlantHealth, SensorHealth};
use plantwatch_types::{
    Alert, AlertCondition, AlertSeverity, DEFAULT_READING_INTERVAL_SECS, IdealRange, LegacyRange,
    MeasurementType, Plant, Reading, Sensor,
};

/// Fields for a new plant.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NewPlant {
    /// User creating the plant.
    pub owner_id: i64,
    /// Display name.
    pub name: String,
    /// Botanical species.
    pub species: String,
    /// Where the plant is kept.
    pub location: String,
    /// Legacy temperature bounds.
    pub temperature: LegacyRange,
    /// Legacy humidity bounds.
    pub humidity: LegacyRange,
    /// Legacy pH bounds.
    pub ph: LegacyRange,
    /// Legacy luminosity bounds.
    pub light: LegacyRange,
    /// Generic ideal ranges, in order.
    pub ideal_ranges: Vec<IdealRange>,
    /// Free-form notes.
    pub notes: Option<String>,
    /// Notes about growing conditions.
    pub notes_conditions: Option<String>,
}

impl NewPlant {
    /// A plant with just a name.
    pub fn new(owner_id: i64, name: impl Into<String>) -> Self {
        Self {
            owner_id,
            name: name.into(),
            ..Default::default()
        }
    }

    /// Append an ideal range.
    #[must_use]
    pub fn with_ideal_range(mut self, range: IdealRange) -> Self {
        self.ideal_ranges.push(range);
        self
    }

    pub(crate) fn into_plant(self) -> Plant {
        let mut plant = Plant::new(0, self.name);
        plant.owner_id = self.owner_id;
        plant.species = self.species;
        plant.location = self.location;
        plant.temperature = self.temperature;
        plant.humidity = self.humidity;
        plant.ph = self.ph;
        plant.light = self.light;
        plant.ideal_ranges = self.ideal_ranges;
        plant.notes = self.notes;
        plant.notes_conditions = self.notes_conditions;
        plant
    }
}

/// Partial update for a plant. `None` leaves a field unchanged.
///
/// When `ideal_ranges` is supplied it replaces the whole list.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlantUpdate {
    pub name: Option<String>,
    pub species: Option<String>,
    pub location: Option<String>,
    pub temperature: Option<LegacyRange>,
    pub humidity: Option<LegacyRange>,
    pub ph: Option<LegacyRange>,
    pub light: Option<LegacyRange>,
    pub ideal_ranges: Option<Vec<IdealRange>>,
    pub notes: Option<String>,
    pub notes_conditions: Option<String>,
}

impl PlantUpdate {
    pub(crate) fn apply(self, plant: &mut Plant) {
        if let Some(name) = self.name {
            plant.name = name;
        }
        if let Some(species) = self.species {
            plant.species = species;
        }
        if let Some(location) = self.location {
            plant.location = location;
        }
        if let Some(range) = self.temperature {
            plant.temperature = range;
        }
        if let Some(range) = self.humidity {
            plant.humidity = range;
        }
        if let Some(range) = self.ph {
            plant.ph = range;
        }
        if let Some(range) = self.light {
            plant.light = range;
        }
        if let Some(ranges) = self.ideal_ranges {
            plant.ideal_ranges = ranges;
        }
        if self.notes.is_some() {
            plant.notes = self.notes;
        }
        if self.notes_conditions.is_some() {
            plant.notes_conditions = self.notes_conditions;
        }
    }
}

/// Fields for a new sensor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewSensor {
    /// Globally unique hardware identifier.
    pub hardware_id: String,
    /// Display name.
    pub name: String,
    /// What the sensor measures.
    #[serde(rename = "type")]
    pub measurement: MeasurementType,
    /// Unit of reported values.
    #[serde(default)]
    pub unit: String,
    /// Where the sensor is installed.
    #[serde(default)]
    pub location: String,
    /// Plant to attach to.
    #[serde(default)]
    pub plant_id: Option<i64>,
    /// Whether threshold breaches are reported.
    #[serde(default = "enabled")]
    pub alerts_enabled: bool,
    /// Expected sampling cadence in seconds.
    #[serde(default = "default_interval")]
    pub reading_interval_secs: u32,
    /// Free-form notes.
    #[serde(default)]
    pub notes: Option<String>,
}

fn enabled() -> bool {
    true
}

fn default_interval() -> u32 {
    DEFAULT_READING_INTERVAL_SECS
}

impl NewSensor {
    /// An unattached sensor with alerts on and the default cadence.
    pub fn new(
        hardware_id: impl Into<String>,
        name: impl Into<String>,
        measurement: MeasurementType,
    ) -> Self {
        Self {
            hardware_id: hardware_id.into(),
            name: name.into(),
            measurement,
            unit: String::new(),
            location: String::new(),
            plant_id: None,
            alerts_enabled: true,
            reading_interval_secs: DEFAULT_READING_INTERVAL_SECS,
            notes: None,
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

    pub(crate) fn into_sensor(self, owner_id: i64) -> Sensor {
        let mut sensor = Sensor::new(0, self.hardware_id, self.name, self.measurement)
            .with_unit(self.unit)
            .with_interval(self.reading_interval_secs)
            .with_alerts(self.alerts_enabled);
        sensor.owner_id = owner_id;
        sensor.plant_id = self.plant_id;
        sensor.location = self.location;
        sensor.notes = self.notes;
        sensor
    }
}

/// Partial update for a sensor.
///
/// `plant_id: Some(None)` detaches the sensor from its plant.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SensorUpdate {
    pub name: Option<String>,
    pub unit: Option<String>,
    pub location: Option<String>,
    pub plant_id: Option<Option<i64>>,
    pub alerts_enabled: Option<bool>,
    pub reading_interval_secs: Option<u32>,
    pub notes: Option<String>,
}

impl SensorUpdate {
    pub(crate) fn apply(self, sensor: &mut Sensor) {
        if let Some(name) = self.name {
            sensor.name = name;
        }
        if let Some(unit) = self.unit {
            sensor.unit = unit;
        }
        if let Some(location) = self.location {
            sensor.location = location;
        }
        if let Some(plant_id) = self.plant_id {
            sensor.plant_id = plant_id;
        }
        if let Some(enabled) = self.alerts_enabled {
            sensor.alerts_enabled = enabled;
        }
        if let Some(secs) = self.reading_interval_secs {
            sensor.reading_interval_secs = secs;
        }
        if self.notes.is_some() {
            sensor.notes = self.notes;
        }
    }
}

/// Fields for a new alert rule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewAlertRule {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(rename = "type")]
    pub measurement: MeasurementType,
    #[serde(default)]
    pub unit: Option<String>,
    pub condition: AlertCondition,
    #[serde(default)]
    pub threshold: Option<f64>,
    #[serde(default)]
    pub severity: AlertSeverity,
    #[serde(default = "enabled")]
    pub enabled: bool,
    #[serde(default)]
    pub sensor_ids: Vec<i64>,
}

impl NewAlertRule {
    /// An enabled, medium-severity rule with no bound sensors.
    pub fn new(
        name: impl Into<String>,
        measurement: MeasurementType,
        condition: AlertCondition,
        threshold: Option<f64>,
    ) -> Self {
        Self {
            name: name.into(),
            description: None,
            measurement,
            unit: None,
            condition,
            threshold,
            severity: AlertSeverity::default(),
            enabled: true,
            sensor_ids: Vec::new(),
        }
    }

    /// Bind to these sensors.
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
}

/// Partial update for an alert rule.
///
/// `sensor_ids` replaces the bound set when supplied. `threshold: Some(None)`
/// clears the threshold.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AlertRuleUpdate {
    pub name: Option<String>,
    pub description: Option<String>,
    pub unit: Option<String>,
    pub condition: Option<AlertCondition>,
    pub threshold: Option<Option<f64>>,
    pub severity: Option<AlertSeverity>,
    pub enabled: Option<bool>,
    pub sensor_ids: Option<Vec<i64>>,
}

/// A plant with its evaluated health.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlantStatusView {
    #[serde(flatten)]
    pub plant: Plant,
    pub health: PlantHealth,
}

/// A sensor with its latest reading and evaluated health.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SensorStatusView {
    #[serde(flatten)]
    pub sensor: Sensor,
    pub last_reading: Option<Reading>,
    pub health: SensorHealth,
}

/// Result of ingesting one reading.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IngestOutcome {
    /// The stored reading with its classification.
    pub reading: Reading,
    /// Alerts fired by the reading, in rule order.
    pub alerts: Vec<Alert>,
}

/// Distinct values used to populate plant filters.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PlantOptions {
    pub species: Vec<String>,
    pub locations: Vec<String>,
    pub types: Vec<MeasurementType>,
    pub units: Vec<String>,
}

/// Pagination metadata.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PageMeta {
    /// Items matching the filters, across all pages.
    pub total: usize,
    /// Current 1-based page.
    pub page: u32,
    /// Last page number; 0 when nothing matched.
    pub last_page: u32,
}

/// One page of results.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Page<T> {
    pub data: Vec<T>,
    pub meta: PageMeta,
}

impl<T> Page<T> {
    /// Cut `page` (1-based) of size `limit` out of the full result set.
    pub fn paginate(items: Vec<T>, page: u32, limit: u32) -> Self {
        let page = page.max(1);
        let limit = limit.max(1);
        let total = items.len();
        let last_page = total.div_ceil(limit as usize) as u32;
        let skip = (page as usize - 1).saturating_mul(limit as usize);
        let data = items.into_iter().skip(skip).take(limit as usize).collect();
        Self {
            data,
            meta: PageMeta {
                total,
                page,
                last_page,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_paginate_middle_page() {
        let page = Page::paginate((1..=25).collect::<Vec<_>>(), 2, 10);
        assert_eq!(page.data, (11..=20).collect::<Vec<_>>());
        assert_eq!(
            page.meta,
            PageMeta {
                total: 25,
                page: 2,
                last_page: 3
            }
        );
    }

    #[test]
    fn test_paginate_past_end_is_empty() {
        let page = Page::paginate(vec![1, 2, 3], 5, 2);
        assert!(page.data.is_empty());
        assert_eq!(page.meta.last_page, 2);
    }

    #[test]
    fn test_paginate_empty() {
        let page = Page::<i32>::paginate(Vec::new(), 1, 10);
        assert_eq!(page.meta.total, 0);
        assert_eq!(page.meta.last_page, 0);
    }

    #[test]
    fn test_plant_update_replaces_ideal_ranges() {
        let mut plant = NewPlant::new(1, "Fern")
            .with_ideal_range(IdealRange::new(MeasurementType::Ph, "pH", Some(5.0), Some(6.0)))
            .into_plant();
        PlantUpdate {
            ideal_ranges: Some(Vec::new()),
            location: Some("Porch".into()),
            ..Default::default()
        }
        .apply(&mut plant);
        assert!(plant.ideal_ranges.is_empty());
        assert_eq!(plant.location, "Porch");
        assert_eq!(plant.name, "Fern");
    }

    #[test]
    fn test_sensor_update_detaches_plant() {
        let mut sensor = NewSensor::new("hw", "Bench", MeasurementType::Light)
            .with_plant(3)
            .into_sensor(1);
        SensorUpdate {
            plant_id: Some(None),
            ..Default::default()
        }
        .apply(&mut sensor);
        assert_eq!(sensor.plant_id, None);
        assert_eq!(sensor.owner_id, 1);
    }

    #[test]
    fn test_new_sensor_deserialize_defaults() {
        let sensor: NewSensor =
            serde_json::from_str(r#"{"hardware_id":"A1","name":"Soil","type":"ph"}"#).unwrap();
        assert_eq!(sensor.measurement, MeasurementType::Ph);
        assert!(sensor.alerts_enabled);
        assert_eq!(sensor.reading_interval_secs, DEFAULT_READING_INTERVAL_SECS);
    }
}
