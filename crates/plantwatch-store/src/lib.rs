//! Local persistence and ingestion pipeline for plant monitoring.
//!
//! This crate provides SQLite-based storage for plants, sensors, readings
//! and alerts, and wires the evaluation engine from `plantwatch-core` into
//! the write path.
//!
//! # Features
//!
//! - Plants with legacy bounds and ordered ideal ranges
//! - Sensors with unique hardware ids, attached to at most one plant
//! - Readings classified once at ingestion and stored with that status
//! - Alert rules evaluated on every ingested reading
//! - Alert timelines with a single ACTIVE to RESOLVED transition
//! - Paginated plant and sensor listings filtered by evaluated status
//!
//! # Example
//!
//! ```
//! use plantwatch_store::{NewPlant, NewSensor, Store};
//! use plantwatch_types::{LegacyRange, MeasurementType, ReadingStatus};
//! use time::OffsetDateTime;
//!
//! let store = Store::open_in_memory()?;
//!
//! let mut plant = NewPlant::new(1, "Tomato");
//! plant.temperature = LegacyRange { min: Some(18.0), max: Some(28.0), unit: Some("°C".into()) };
//! let plant = store.create_plant(plant)?;
//!
//! let sensor = store.create_sensor(
//!     1,
//!     NewSensor::new("T-1", "Air", MeasurementType::Temperature).with_plant(plant.id),
//! )?;
//!
//! let outcome = store.ingest_reading(sensor.id, 31.0, OffsetDateTime::now_utc())?;
//! assert_eq!(outcome.reading.status, ReadingStatus::Critical);
//! # Ok::<(), plantwatch_store::Error>(())
//! ```

mod alerts;
mod error;
mod models;
mod queries;
mod schema;
mod store;

pub use alerts::{FIRED_EVENT_TITLE, RESOLVED_EVENT_TITLE};
pub use error::{Error, Result};
pub use models::{
    AlertRuleUpdate, IngestOutcome, NewAlertRule, NewPlant, NewSensor, Page, PageMeta,
    PlantOptions, PlantStatusView, PlantUpdate, SensorStatusView, SensorUpdate,
};
pub use queries::{AlertQuery, DEFAULT_PAGE_SIZE, PlantQuery, ReadingQuery, SensorQuery, SortOrder};
pub use schema::SCHEMA_VERSION;
pub use store::Store;

/// Default database path following platform conventions.
///
/// - Linux: `~/.local/share/plantwatch/data.db`
/// - macOS: `~/Library/Application Support/plantwatch/data.db`
/// - Windows: `C:\Users\<user>\AppData\Local\plantwatch\data.db`
pub fn default_db_path() -> std::path::PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| std::path::PathBuf::from("."))
        .join("plantwatch")
        .join("data.db")
}
