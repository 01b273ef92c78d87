//! Integration tests for plantwatch-core
//!
//! These tests drive the evaluation engine end to end over in-memory
//! snapshots: resolve, classify, sensor and plant aggregation, and rule
//! evaluation, with a fixed `now`.

use plantwatch_core::plant_health::{self, SensorSnapshot};
use plantwatch_core::rules::RuleEvaluator;
use plantwatch_core::{classify, resolve, sensor_health};
use plantwatch_types::{
    AlertCondition, AlertRule, IdealRange, MeasurementType, Plant, Reading, ReadingStatus, Sensor,
    SensorStatus,
};
use time::macros::datetime;
use time::{Duration, OffsetDateTime};

const NOW: OffsetDateTime = datetime!(2025-03-10 08:30:00 UTC);

fn greenhouse_plant() -> Plant {
    Plant::new(42, "Tomato")
        .with_legacy(&MeasurementType::Temperature, Some(18.0), Some(28.0), Some("°C"))
        .with_legacy(&MeasurementType::Humidity, Some(50.0), Some(80.0), Some("%"))
        .with_ideal_range(IdealRange::new(
            MeasurementType::Temperature,
            "°C",
            Some(0.0),
            Some(100.0),
        ))
        .with_ideal_range(IdealRange::new(MeasurementType::Ph, "pH", Some(5.5), Some(6.8)))
        .with_ideal_range(IdealRange::new(
            "co2".parse().unwrap(),
            "ppm",
            Some(400.0),
            Some(1500.0),
        ))
}

/// Classify at ingestion, then evaluate with the stored reading.
fn ingest(sensor: &Sensor, plant: &Plant, value: f64, age_secs: i64) -> Reading {
    let mut reading = Reading::new(sensor.id, value, NOW - Duration::seconds(age_secs));
    reading.status = classify(value, resolve(&sensor.measurement, Some(plant)));
    reading
}

#[test]
fn test_pipeline_from_ingestion_to_plant_status() {
    let plant = greenhouse_plant();
    let temp = Sensor::new(1, "T-1", "Air temp", MeasurementType::Temperature).with_plant(42);
    let hum = Sensor::new(2, "H-1", "Air humidity", MeasurementType::Humidity).with_plant(42);
    let ph = Sensor::new(3, "P-1", "Soil pH", MeasurementType::Ph)
        .with_plant(42)
        .with_interval(600);
    let co2 = Sensor::new(4, "C-1", "CO2", "CO2".parse().unwrap()).with_plant(42);

    let temp_reading = ingest(&temp, &plant, 31.0, 20);
    let hum_reading = ingest(&hum, &plant, 52.0, 20);
    let ph_reading = ingest(&ph, &plant, 6.0, 500);
    let co2_reading = ingest(&co2, &plant, 300.0, 5);

    // Legacy temperature bounds win over the 0..100 ideal range.
    assert_eq!(temp_reading.status, ReadingStatus::Critical);
    assert_eq!(hum_reading.status, ReadingStatus::Attention);
    assert_eq!(ph_reading.status, ReadingStatus::Normal);
    assert_eq!(co2_reading.status, ReadingStatus::Critical);

    let snapshots = vec![
        SensorSnapshot::new(temp.clone(), Some(temp_reading.clone())),
        SensorSnapshot::new(hum, Some(hum_reading)),
        SensorSnapshot::new(ph, Some(ph_reading)),
        SensorSnapshot::new(co2, Some(co2_reading)),
    ];
    let health = plant_health::evaluate(&plant, &snapshots, NOW);

    assert_eq!(health.status, SensorStatus::InAlert);
    assert_eq!(health.sensors_count, 4);
    assert_eq!(health.online_count, 4);
    assert_eq!(
        health.alert_messages,
        vec![
            "Temperatura alta no sensor Air temp: 31",
            "CO2 baixa no sensor CO2: 300",
        ]
    );
    assert_eq!(health.last_values.temperature.map(|v| v.value), Some(31.0));
    assert_eq!(health.last_values.ph.map(|v| v.value), Some(6.0));

    let sensor = sensor_health::evaluate(&temp, Some(&temp_reading), Some(&plant), NOW);
    assert_eq!(sensor.status, SensorStatus::InAlert);
    assert_eq!(sensor.alert_messages, vec!["Temperatura alto: 31"]);
}

#[test]
fn test_plant_goes_offline_as_time_passes() {
    let plant = greenhouse_plant();
    let temp = Sensor::new(1, "T-1", "Air temp", MeasurementType::Temperature).with_plant(42);
    let reading = ingest(&temp, &plant, 20.0, 0);
    let snapshots = [SensorSnapshot::new(temp, Some(reading))];

    assert_eq!(
        plant_health::evaluate(&plant, &snapshots, NOW + Duration::seconds(119)).status,
        SensorStatus::Online
    );
    assert_eq!(
        plant_health::evaluate(&plant, &snapshots, NOW + Duration::seconds(120)).status,
        SensorStatus::Offline
    );
}

#[test]
fn test_stale_breach_outlives_connectivity() {
    let plant = greenhouse_plant();
    let temp = Sensor::new(1, "T-1", "Air temp", MeasurementType::Temperature).with_plant(42);
    let reading = ingest(&temp, &plant, 35.0, 0);
    let later = NOW + Duration::seconds(600);

    let snapshots = [SensorSnapshot::new(temp.clone(), Some(reading.clone()))];
    let health = plant_health::evaluate(&plant, &snapshots, later);
    assert_eq!(health.status, SensorStatus::InAlert);
    assert_eq!(health.online_count, 0);

    // The sensor itself reports offline without messages.
    let sensor = sensor_health::evaluate(&temp, Some(&reading), Some(&plant), later);
    assert_eq!(sensor.status, SensorStatus::Offline);
    assert!(sensor.alert_messages.is_empty());
}

#[test]
fn test_rules_fire_on_stored_classification() {
    let plant = greenhouse_plant();
    let temp = Sensor::new(1, "T-1", "Air temp", MeasurementType::Temperature).with_plant(42);
    let rules = [
        AlertRule::new(
            10,
            "Heat",
            MeasurementType::Temperature,
            AlertCondition::GreaterThan,
            Some(27.0),
        )
        .with_sensors([1]),
        AlertRule::new(
            11,
            "Out of range",
            MeasurementType::Temperature,
            AlertCondition::OutOfRange,
            None,
        )
        .with_sensors([1]),
    ];

    let warm = ingest(&temp, &plant, 27.5, 0);
    assert_eq!(warm.status, ReadingStatus::Attention);
    let fired: Vec<i64> = RuleEvaluator::default()
        .evaluate(&rules, &temp, &warm)
        .iter()
        .map(|d| d.rule_id)
        .collect();
    assert_eq!(fired, vec![10]);

    let hot = ingest(&temp, &plant, 30.0, 0);
    let fired: Vec<i64> = RuleEvaluator::default()
        .evaluate(&rules, &temp, &hot)
        .iter()
        .map(|d| d.rule_id)
        .collect();
    assert_eq!(fired, vec![10, 11]);
}
