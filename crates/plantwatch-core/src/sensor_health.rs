//! Per-sensor health: connectivity combined with threshold breaches.

use serde::Serialize;
use time::OffsetDateTime;
use tracing::debug;

use plantwatch_types::{Plant, Reading, Sensor, SensorStatus};

use crate::connectivity::sensor_is_online;
use crate::thresholds::{Breach, breaches, resolve};

/// Health of one sensor at a point in time.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SensorHealth {
    /// Aggregate status.
    pub status: SensorStatus,
    /// Human-readable breach messages, in check order.
    pub alert_messages: Vec<String>,
}

impl SensorHealth {
    /// Whether the sensor reported recently.
    #[must_use]
    pub fn is_online(&self) -> bool {
        self.status != SensorStatus::Offline
    }
}

/// High/low checks for a sensor's last reading against its plant.
///
/// Nothing is checked unless alerts are enabled, the sensor is linked to a
/// plant and it has a reading. Connectivity is not considered here.
pub(crate) fn plant_breaches(
    sensor: &Sensor,
    last_reading: Option<&Reading>,
    plant: Option<&Plant>,
) -> Vec<Breach> {
    match (sensor.alerts_enabled, plant, last_reading) {
        (true, Some(plant), Some(reading)) => {
            let bounds = resolve(&sensor.measurement, Some(plant));
            breaches(reading.value, bounds)
        }
        _ => Vec::new(),
    }
}

/// Evaluate a sensor's status and alert messages.
///
/// `plant` should be the plant the sensor is attached to, if any.
#[must_use]
pub fn evaluate(
    sensor: &Sensor,
    last_reading: Option<&Reading>,
    plant: Option<&Plant>,
    now: OffsetDateTime,
) -> SensorHealth {
    let online = sensor_is_online(sensor, last_reading, now);
    // An offline sensor reports no breaches of its own.
    let breaches = if online {
        plant_breaches(sensor, last_reading, plant)
    } else {
        Vec::new()
    };
    let label = sensor.measurement.label();
    let alert_messages: Vec<String> = breaches.iter().map(|b| b.message(label)).collect();

    let status = if !online {
        SensorStatus::Offline
    } else if alert_messages.is_empty() {
        SensorStatus::Online
    } else {
        SensorStatus::InAlert
    };

    debug!(
        sensor_id = sensor.id,
        %status,
        alerts = alert_messages.len(),
        "Evaluated sensor health"
    );

    SensorHealth {
        status,
        alert_messages,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use plantwatch_types::{IdealRange, MeasurementType};
    use time::Duration;
    use time::macros::datetime;

    const NOW: OffsetDateTime = datetime!(2024-06-01 12:00:00 UTC);

    fn plant() -> Plant {
        Plant::new(7, "Basil")
            .with_legacy(&MeasurementType::Temperature, Some(10.0), Some(30.0), Some("°C"))
    }

    fn sensor() -> Sensor {
        Sensor::new(1, "hw-1", "Bench", MeasurementType::Temperature).with_plant(7)
    }

    fn reading(value: f64, age_secs: i64) -> Reading {
        Reading::new(1, value, NOW - Duration::seconds(age_secs))
    }

    #[test]
    fn test_online_without_breach() {
        let r = reading(20.0, 10);
        let health = evaluate(&sensor(), Some(&r), Some(&plant()), NOW);
        assert_eq!(health.status, SensorStatus::Online);
        assert!(health.alert_messages.is_empty());
        assert!(health.is_online());
    }

    #[test]
    fn test_high_breach_message() {
        let r = reading(35.0, 10);
        let health = evaluate(&sensor(), Some(&r), Some(&plant()), NOW);
        assert_eq!(health.status, SensorStatus::InAlert);
        assert_eq!(health.alert_messages, vec!["Temperatura alto: 35"]);
    }

    #[test]
    fn test_low_breach_message() {
        let r = reading(2.5, 10);
        let health = evaluate(&sensor(), Some(&r), Some(&plant()), NOW);
        assert_eq!(health.alert_messages, vec!["Temperatura baixo: 2.5"]);
    }

    #[test]
    fn test_attention_band_is_not_an_alert() {
        let r = reading(10.5, 10);
        let health = evaluate(&sensor(), Some(&r), Some(&plant()), NOW);
        assert_eq!(health.status, SensorStatus::Online);
    }

    #[test]
    fn test_stale_reading_is_offline_even_when_breaching() {
        let r = reading(99.0, 120);
        let health = evaluate(&sensor(), Some(&r), Some(&plant()), NOW);
        assert_eq!(health.status, SensorStatus::Offline);
        assert!(health.alert_messages.is_empty());
    }

    #[test]
    fn test_no_reading_is_offline() {
        let health = evaluate(&sensor(), None, Some(&plant()), NOW);
        assert_eq!(health.status, SensorStatus::Offline);
    }

    #[test]
    fn test_alerts_disabled_suppresses_messages() {
        let r = reading(99.0, 10);
        let health = evaluate(&sensor().with_alerts(false), Some(&r), Some(&plant()), NOW);
        assert_eq!(health.status, SensorStatus::Online);
        assert!(health.alert_messages.is_empty());
    }

    #[test]
    fn test_no_plant_suppresses_messages() {
        let r = reading(99.0, 10);
        let health = evaluate(&sensor(), Some(&r), None, NOW);
        assert_eq!(health.status, SensorStatus::Online);
    }

    #[test]
    fn test_custom_type_uses_ideal_range_label() {
        let co2: MeasurementType = "co2".parse().unwrap();
        let plant = Plant::new(7, "Orchid").with_ideal_range(IdealRange::new(
            co2.clone(),
            "ppm",
            Some(400.0),
            Some(1000.0),
        ));
        let sensor = Sensor::new(2, "hw-2", "Air", co2).with_plant(7);
        let r = reading(1500.0, 5);
        let health = evaluate(&sensor, Some(&r), Some(&plant), NOW);
        assert_eq!(health.alert_messages, vec!["CO2 alto: 1500"]);
    }

    #[test]
    fn test_evaluation_is_idempotent() {
        let r = reading(35.0, 10);
        let p = plant();
        let s = sensor();
        let first = evaluate(&s, Some(&r), Some(&p), NOW);
        let second = evaluate(&s, Some(&r), Some(&p), NOW);
        assert_eq!(first, second);
    }
}
