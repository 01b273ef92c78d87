//! Shared domain types for plant monitoring.
//!
//! This crate provides the plain data model used by the evaluation engine
//! (plantwatch-core), the SQLite store (plantwatch-store) and the CLI.
//!
//! # Features
//!
//! - Plants with legacy per-type bounds and generic ideal ranges
//! - Sensors, readings and their classifications
//! - Alert rules, fired alerts and alert timelines
//! - Error types for parsing textual enum values
//!
//! # Example
//!
//! ```
//! use plantwatch_types::{MeasurementType, Plant, ReadingStatus};
//!
//! let plant = Plant::new(1, "Monstera")
//!     .with_legacy(&MeasurementType::Temperature, Some(18.0), Some(28.0), Some("°C"));
//! assert_eq!(plant.expected_unit(&MeasurementType::Temperature), Some("°C"));
//! assert_eq!("CRITICO".parse::<ReadingStatus>().unwrap(), ReadingStatus::Critical);
//! ```

pub mod alert;
pub mod error;
pub mod types;

pub use alert::{Alert, AlertCondition, AlertEvent, AlertRule, AlertSeverity, AlertStatus};
pub use error::{ParseError, ParseResult};
pub use types::{
    Bounds, DEFAULT_READING_INTERVAL_SECS, IdealRange, LegacyRange, MeasurementType, Plant,
    Reading, ReadingStatus, Sensor, SensorStatus,
};
