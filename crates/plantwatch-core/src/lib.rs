//! Health evaluation engine for plant monitoring sensors.
//!
//! This crate turns raw sensor readings and plant configuration into
//! statuses. Every function here is pure: inputs are snapshots already
//! fetched from storage and `now` is always passed in, so the same snapshot
//! evaluated twice gives the same answer.
//!
//! # Components
//!
//! - **Threshold resolution**: [`thresholds::resolve`] picks a plant's
//!   effective bounds for a measurement type
//! - **Reading classification**: [`thresholds::classify`] tags a value as
//!   normal, attention or critical
//! - **Connectivity**: [`connectivity::is_online`] judges recency against the
//!   sensor's sampling interval
//! - **Sensor and plant health**: [`sensor_health::evaluate`] and
//!   [`plant_health::evaluate`] combine the above into statuses and alert
//!   messages
//! - **Alert rules**: [`RuleEvaluator`] matches user rules against new
//!   readings
//! - **Validation**: configuration checks run before anything is stored
//!
//! # Quick Start
//!
//! ```
//! use plantwatch_core::{classify, resolve, sensor_health};
//! use plantwatch_types::{MeasurementType, Plant, Reading, ReadingStatus, Sensor, SensorStatus};
//! use time::{Duration, OffsetDateTime};
//!
//! let now = OffsetDateTime::now_utc();
//! let plant = Plant::new(1, "Basil")
//!     .with_legacy(&MeasurementType::Temperature, Some(10.0), Some(30.0), Some("°C"));
//! let sensor = Sensor::new(1, "hw-1", "Bench", MeasurementType::Temperature).with_plant(1);
//!
//! let status = classify(34.0, resolve(&sensor.measurement, Some(&plant)));
//! assert_eq!(status, ReadingStatus::Critical);
//!
//! let reading = Reading::new(1, 34.0, now - Duration::seconds(15));
//! let health = sensor_health::evaluate(&sensor, Some(&reading), Some(&plant), now);
//! assert_eq!(health.status, SensorStatus::InAlert);
//! assert_eq!(health.alert_messages, vec!["Temperatura alto: 34"]);
//! ```

pub mod connectivity;
pub mod error;
pub mod plant_health;
pub mod rules;
pub mod sensor_health;
pub mod thresholds;
pub mod validation;

pub use connectivity::{GRACE_PERIOD_SECS, is_online, tolerance};
pub use error::{Error, Result};
pub use plant_health::{LastValue, LastValues, PlantHealth, SensorSnapshot};
pub use rules::{AlertDraft, DEFAULT_EQUALS_TOLERANCE, RuleEvaluator};
pub use sensor_health::SensorHealth;
pub use thresholds::{
    ATTENTION_MARGIN_RATIO, Breach, BoundsSource, ResolvedBounds, breaches, classify, resolve,
    resolve_tagged,
};
pub use validation::{ValidationIssue, ValidationResult};

// Re-export from plantwatch-types
pub use plantwatch_types::{
    Bounds, MeasurementType, Plant, Reading, ReadingStatus, Sensor, SensorStatus,
};
