//! On-disk persistence tests for plantwatch-store.

use plantwatch_core::RuleEvaluator;
use plantwatch_store::{AlertQuery, NewAlertRule, NewPlant, NewSensor, PlantQuery, Store};
use plantwatch_types::{
    AlertCondition, IdealRange, LegacyRange, MeasurementType, ReadingStatus, SensorStatus,
};
use tempfile::TempDir;
use time::macros::datetime;

#[test]
fn test_critical_reading_survives_reopen() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("nested").join("plants.db");
    let at = datetime!(2025-03-10 08:30:00.250 UTC);

    let (sensor_id, reading) = {
        let store = Store::open(&path).unwrap();
        let mut plant = NewPlant::new(1, "Tomato");
        plant.humidity = LegacyRange {
            min: Some(50.0),
            max: Some(80.0),
            unit: Some("%".into()),
        };
        let plant = store.create_plant(plant).unwrap();
        let sensor = store
            .create_sensor(
                1,
                NewSensor::new("H-1", "Leaf", MeasurementType::Humidity)
                    .with_plant(plant.id)
                    .with_unit("%"),
            )
            .unwrap();
        let outcome = store.ingest_reading(sensor.id, 91.0, at).unwrap();
        assert_eq!(outcome.reading.status, ReadingStatus::Critical);
        (sensor.id, outcome.reading)
    };

    let store = Store::open(&path).unwrap();
    let stored = store.latest_reading(sensor_id).unwrap().unwrap();
    assert_eq!(stored, reading);
    assert_eq!(stored.created_at, at);
    assert_eq!(stored.status, ReadingStatus::Critical);
}

#[test]
fn test_custom_type_end_to_end() {
    let dir = TempDir::new().unwrap();
    let store = Store::open(dir.path().join("data.db")).unwrap();
    let co2: MeasurementType = "CO2".parse().unwrap();
    let now = datetime!(2025-03-10 08:30:00 UTC);

    let plant = store
        .create_plant(NewPlant::new(1, "Orchid").with_ideal_range(IdealRange::new(
            co2.clone(),
            "ppm",
            Some(400.0),
            Some(1200.0),
        )))
        .unwrap();
    let sensor = store
        .create_sensor(
            1,
            NewSensor::new("C-1", "Air CO2", co2.clone())
                .with_plant(plant.id)
                .with_unit("ppm"),
        )
        .unwrap();

    let outcome = store.ingest_reading(sensor.id, 1500.0, now).unwrap();
    assert_eq!(outcome.reading.status, ReadingStatus::Critical);

    let page = store.list_plants(&PlantQuery::new().owner(1), now).unwrap();
    assert_eq!(page.meta.total, 1);
    let view = &page.data[0];
    assert_eq!(view.health.status, SensorStatus::InAlert);
    assert_eq!(view.health.alert_messages, vec!["CO2 alta no sensor Air CO2: 1500"]);
    // Custom types have no last-value slot
    assert_eq!(view.health.last_values.temperature, None);
}

#[test]
fn test_equals_tolerance_is_configurable() {
    let dir = TempDir::new().unwrap();
    let store = Store::open(dir.path().join("data.db"))
        .unwrap()
        .with_rule_evaluator(RuleEvaluator::new(0.05));
    let now = datetime!(2025-03-10 08:30:00 UTC);

    let sensor = store
        .create_sensor(1, NewSensor::new("P-1", "Soil pH", MeasurementType::Ph))
        .unwrap();
    store
        .create_rule(
            1,
            NewAlertRule::new("Neutral", MeasurementType::Ph, AlertCondition::Equals, Some(7.0))
                .with_sensors([sensor.id]),
        )
        .unwrap();

    assert_eq!(store.ingest_reading(sensor.id, 7.04, now).unwrap().alerts.len(), 1);
    assert!(store.ingest_reading(sensor.id, 7.2, now).unwrap().alerts.is_empty());
    assert_eq!(
        store.list_alerts(&AlertQuery::new().sensor(sensor.id)).unwrap().len(),
        1
    );
}
