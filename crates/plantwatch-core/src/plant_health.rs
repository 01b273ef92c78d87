//! Plant-level health folded from the health of its sensors.
//!
//! The plant status takes the most severe view across its sensors: any
//! breach puts the plant in alert, otherwise one online sensor is enough to
//! call it online, otherwise it is offline.
//!
//! # Example
//!
//! ```
//! use plantwatch_core::plant_health::{SensorSnapshot, evaluate};
//! use plantwatch_types::{MeasurementType, Plant, Reading, Sensor, SensorStatus};
//! use time::{Duration, OffsetDateTime};
//!
//! let now = OffsetDateTime::now_utc();
//! let plant = Plant::new(1, "Basil")
//!     .with_legacy(&MeasurementType::Humidity, Some(40.0), Some(70.0), Some("%"));
//! let sensor = Sensor::new(1, "hw-1", "Leaf", MeasurementType::Humidity).with_plant(1);
//! let reading = Reading::new(1, 85.0, now - Duration::seconds(30));
//!
//! let health = evaluate(&plant, &[SensorSnapshot::new(sensor, Some(reading))], now);
//! assert_eq!(health.status, SensorStatus::InAlert);
//! assert_eq!(health.alert_messages, vec!["Umidade alta no sensor Leaf: 85"]);
//! ```

use serde::Serialize;
use time::OffsetDateTime;
use tracing::debug;

use plantwatch_types::{MeasurementType, Plant, Reading, Sensor, SensorStatus};

use crate::connectivity::sensor_is_online;
use crate::sensor_health::plant_breaches;

/// A sensor paired with its most recent reading.
#[derive(Debug, Clone, PartialEq)]
pub struct SensorSnapshot {
    /// The sensor.
    pub sensor: Sensor,
    /// Its most recent reading, if any.
    pub last_reading: Option<Reading>,
}

impl SensorSnapshot {
    /// Pair a sensor with its latest reading.
    pub fn new(sensor: Sensor, last_reading: Option<Reading>) -> Self {
        Self {
            sensor,
            last_reading,
        }
    }
}

/// Most recent value seen for one measurement type.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct LastValue {
    /// Reading value.
    pub value: f64,
    /// When it was recorded.
    #[serde(with = "time::serde::rfc3339")]
    pub at: OffsetDateTime,
    /// Sensor that reported it.
    pub sensor_id: i64,
}

/// Latest value per built-in measurement type across a plant's sensors.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct LastValues {
    /// Latest temperature.
    pub temperature: Option<LastValue>,
    /// Latest humidity.
    pub humidity: Option<LastValue>,
    /// Latest pH.
    pub ph: Option<LastValue>,
    /// Latest luminosity.
    pub light: Option<LastValue>,
}

impl LastValues {
    /// Latest value for a built-in type. Always `None` for custom types.
    #[must_use]
    pub fn get(&self, measurement: &MeasurementType) -> Option<&LastValue> {
        match measurement {
            MeasurementType::Temperature => self.temperature.as_ref(),
            MeasurementType::Humidity => self.humidity.as_ref(),
            MeasurementType::Ph => self.ph.as_ref(),
            MeasurementType::Light => self.light.as_ref(),
            MeasurementType::Custom(_) => None,
        }
    }

    fn slot(&mut self, measurement: &MeasurementType) -> Option<&mut Option<LastValue>> {
        match measurement {
            MeasurementType::Temperature => Some(&mut self.temperature),
            MeasurementType::Humidity => Some(&mut self.humidity),
            MeasurementType::Ph => Some(&mut self.ph),
            MeasurementType::Light => Some(&mut self.light),
            MeasurementType::Custom(_) => None,
        }
    }

    /// Record `candidate` if it is strictly newer than the current value.
    #[must_use]
    fn with(mut self, measurement: &MeasurementType, candidate: LastValue) -> Self {
        if let Some(slot) = self.slot(measurement)
            && slot.as_ref().is_none_or(|current| candidate.at > current.at)
        {
            *slot = Some(candidate);
        }
        self
    }
}

/// Aggregated health of one plant.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlantHealth {
    /// Aggregate status.
    pub status: SensorStatus,
    /// Breach messages naming each sensor, in sensor order.
    pub alert_messages: Vec<String>,
    /// Latest value per built-in measurement type.
    pub last_values: LastValues,
    /// Number of sensors considered.
    pub sensors_count: usize,
    /// Number of sensors that are online.
    pub online_count: usize,
    /// Number of breaches found.
    pub alert_count: usize,
}

#[derive(Default)]
struct Fold {
    messages: Vec<String>,
    last_values: LastValues,
    sensors: usize,
    online: usize,
    alerts: usize,
}

impl Fold {
    fn step(mut self, plant: &Plant, snapshot: &SensorSnapshot, now: OffsetDateTime) -> Self {
        let sensor = &snapshot.sensor;
        let reading = snapshot.last_reading.as_ref();
        let online = sensor_is_online(sensor, reading, now);
        let breaches = plant_breaches(sensor, reading, Some(plant));

        let label = sensor.measurement.plant_label();
        self.alerts += breaches.len();
        self.messages.extend(
            breaches
                .iter()
                .map(|b| b.message_for_sensor(label, &sensor.name)),
        );
        self.sensors += 1;
        self.online += usize::from(online);

        if let Some(reading) = reading {
            self.last_values = self.last_values.with(
                &sensor.measurement,
                LastValue {
                    value: reading.value,
                    at: reading.created_at,
                    sensor_id: sensor.id,
                },
            );
        }
        self
    }

    fn finish(self) -> PlantHealth {
        let status = if self.alerts > 0 {
            SensorStatus::InAlert
        } else if self.online > 0 {
            SensorStatus::Online
        } else {
            SensorStatus::Offline
        };
        PlantHealth {
            status,
            alert_messages: self.messages,
            last_values: self.last_values,
            sensors_count: self.sensors,
            online_count: self.online,
            alert_count: self.alerts,
        }
    }
}

/// Evaluate a plant against the sensors attached to it.
///
/// Every alert-enabled sensor with a reading is checked, whether or not it is
/// still online, so a stale out-of-range reading keeps the plant in alert.
/// Alert-disabled sensors contribute no messages. A plant with no sensors is
/// offline.
#[must_use]
pub fn evaluate(plant: &Plant, sensors: &[SensorSnapshot], now: OffsetDateTime) -> PlantHealth {
    let health = sensors
        .iter()
        .fold(Fold::default(), |acc, snapshot| acc.step(plant, snapshot, now))
        .finish();

    debug!(
        plant_id = plant.id,
        status = %health.status,
        sensors = health.sensors_count,
        online = health.online_count,
        alerts = health.alert_count,
        "Evaluated plant health"
    );

    health
}
