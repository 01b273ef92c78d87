//! Main store implementation.

use std::path::Path;
use std::str::FromStr;

use rusqlite::types::Type;
use rusqlite::{Connection, OptionalExtension, Row, params};
use time::OffsetDateTime;
use tracing::{debug, info};

use plantwatch_core::plant_health::{self, SensorSnapshot};
use plantwatch_core::validation::{check_unit, validate_plant, validate_sensor};
use plantwatch_core::{RuleEvaluator, classify, resolve, sensor_health};
use plantwatch_types::{
    IdealRange, LegacyRange, MeasurementType, Plant, Reading, ReadingStatus, Sensor,
};

use crate::error::{Error, Result};
use crate::models::{
    IngestOutcome, NewPlant, NewSensor, Page, PlantOptions, PlantStatusView, PlantUpdate,
    SensorStatusView, SensorUpdate,
};
use crate::queries::{Params, PlantQuery, ReadingQuery, SensorQuery};
use crate::schema;

/// SQLite-based store for plants, sensors, readings and alerts.
///
/// Every reading is classified once, when it is ingested, and the stored
/// classification is what rules and reports see afterwards.
pub struct Store {
    pub(crate) conn: Connection,
    evaluator: RuleEvaluator,
}

impl Store {
    /// Open or create a database at the given path.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();

        // Create parent directories if needed
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
            && !parent.exists()
        {
            std::fs::create_dir_all(parent).map_err(|e| Error::CreateDirectory {
                path: parent.to_path_buf(),
                source: e,
            })?;
        }

        info!("Opening database at {}", path.display());
        let conn = Connection::open(path)?;

        conn.execute_batch(
            "PRAGMA foreign_keys = ON;
             PRAGMA journal_mode = WAL;
             PRAGMA synchronous = NORMAL;",
        )?;

        schema::initialize(&conn)?;

        Ok(Self {
            conn,
            evaluator: RuleEvaluator::default(),
        })
    }

    /// Open the default database location.
    pub fn open_default() -> Result<Self> {
        Self::open(crate::default_db_path())
    }

    /// Open an in-memory database (for testing).
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        schema::initialize(&conn)?;
        Ok(Self {
            conn,
            evaluator: RuleEvaluator::default(),
        })
    }

    /// Use `evaluator` for rules checked at ingestion.
    #[must_use]
    pub fn with_rule_evaluator(mut self, evaluator: RuleEvaluator) -> Self {
        self.evaluator = evaluator;
        self
    }

    /// The evaluator used at ingestion.
    pub fn rule_evaluator(&self) -> RuleEvaluator {
        self.evaluator
    }

    pub(crate) fn query_ids(&self, sql: &str, params: &Params) -> Result<Vec<i64>> {
        debug!("Executing query: {}", sql);
        let params_ref: Vec<&dyn rusqlite::ToSql> = params.iter().map(|p| p.as_ref()).collect();
        let mut stmt = self.conn.prepare(sql)?;
        let ids = stmt
            .query_map(params_ref.as_slice(), |row| row.get(0))?
            .collect::<std::result::Result<Vec<i64>, _>>()?;
        Ok(ids)
    }
}

// === Column helpers ===

/// Unix milliseconds, the resolution timestamps are stored at.
pub(crate) fn to_millis(at: OffsetDateTime) -> i64 {
    at.unix_timestamp_nanos().div_euclid(1_000_000) as i64
}

/// Inverse of [`to_millis`].
pub(crate) fn from_millis(ms: i64) -> Result<OffsetDateTime> {
    OffsetDateTime::from_unix_timestamp_nanos(i128::from(ms) * 1_000_000)
        .map_err(|e| Error::InvalidTimestamp(e.to_string()))
}

pub(crate) fn column_time(row: &Row<'_>, idx: usize) -> rusqlite::Result<OffsetDateTime> {
    let ms: i64 = row.get(idx)?;
    OffsetDateTime::from_unix_timestamp_nanos(i128::from(ms) * 1_000_000)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Integer, Box::new(e)))
}

pub(crate) fn column_opt_time(
    row: &Row<'_>,
    idx: usize,
) -> rusqlite::Result<Option<OffsetDateTime>> {
    match row.get::<_, Option<i64>>(idx)? {
        Some(_) => column_time(row, idx).map(Some),
        None => Ok(None),
    }
}

/// Parse a TEXT column holding an enum name.
pub(crate) fn column_parse<T>(row: &Row<'_>, idx: usize) -> rusqlite::Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    let text: String = row.get(idx)?;
    text.parse()
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

const PLANT_COLUMNS: &str = "id, owner_id, name, species, location, \
     temperature_min, temperature_max, temperature_unit, \
     humidity_min, humidity_max, humidity_unit, \
     ph_min, ph_max, ph_unit, \
     light_min, light_max, light_unit, \
     notes, notes_conditions, created_at, updated_at";

const SENSOR_COLUMNS: &str = "id, owner_id, plant_id, hardware_id, name, measurement, unit, \
     location, alerts_enabled, reading_interval_secs, notes, created_at, updated_at";

fn legacy_from_row(row: &Row<'_>, start: usize) -> rusqlite::Result<LegacyRange> {
    Ok(LegacyRange {
        min: row.get(start)?,
        max: row.get(start + 1)?,
        unit: row.get(start + 2)?,
    })
}

fn plant_from_row(row: &Row<'_>) -> rusqlite::Result<Plant> {
    Ok(Plant {
        id: row.get(0)?,
        owner_id: row.get(1)?,
        name: row.get(2)?,
        species: row.get(3)?,
        location: row.get(4)?,
        temperature: legacy_from_row(row, 5)?,
        humidity: legacy_from_row(row, 8)?,
        ph: legacy_from_row(row, 11)?,
        light: legacy_from_row(row, 14)?,
        ideal_ranges: Vec::new(),
        notes: row.get(17)?,
        notes_conditions: row.get(18)?,
        created_at: column_time(row, 19)?,
        updated_at: column_time(row, 20)?,
    })
}

fn sensor_from_row(row: &Row<'_>) -> rusqlite::Result<Sensor> {
    Ok(Sensor {
        id: row.get(0)?,
        owner_id: row.get(1)?,
        plant_id: row.get(2)?,
        hardware_id: row.get(3)?,
        name: row.get(4)?,
        measurement: column_parse(row, 5)?,
        unit: row.get(6)?,
        location: row.get(7)?,
        alerts_enabled: row.get(8)?,
        reading_interval_secs: row.get(9)?,
        notes: row.get(10)?,
        created_at: column_time(row, 11)?,
        updated_at: column_time(row, 12)?,
    })
}

fn reading_from_row(row: &Row<'_>) -> rusqlite::Result<Reading> {
    Ok(Reading {
        id: row.get(0)?,
        sensor_id: row.get(1)?,
        value: row.get(2)?,
        created_at: column_time(row, 3)?,
        status: column_parse::<ReadingStatus>(row, 4)?,
    })
}

/// Copy the first ideal range of each built-in type into its legacy triple
/// when that triple is entirely unset.
fn mirror_ideal_ranges(plant: &mut Plant) {
    for measurement in &MeasurementType::BUILTIN {
        let Some(range) = plant.ideal_range(measurement).cloned() else {
            continue;
        };
        if let Some(legacy) = plant.legacy_mut(measurement)
            && *legacy == LegacyRange::default()
        {
            *legacy = LegacyRange {
                min: range.min,
                max: range.max,
                unit: Some(range.unit),
            };
        }
    }
}

fn write_ideal_ranges(conn: &Connection, plant_id: i64, ranges: &[IdealRange]) -> Result<()> {
    conn.execute("DELETE FROM ideal_ranges WHERE plant_id = ?", [plant_id])?;
    let mut stmt = conn.prepare(
        "INSERT INTO ideal_ranges (plant_id, position, measurement, unit, min, max)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
    )?;
    for (position, range) in ranges.iter().enumerate() {
        stmt.execute(params![
            plant_id,
            position as i64,
            range.measurement.as_str(),
            range.unit,
            range.min,
            range.max,
        ])?;
    }
    Ok(())
}

// Plant operations
impl Store {
    /// Validate and store a new plant.
    ///
    /// The first ideal range of each built-in type fills the matching legacy
    /// triple when that triple was left unset.
    pub fn create_plant(&self, new: NewPlant) -> Result<Plant> {
        let mut plant = new.into_plant();
        mirror_ideal_ranges(&mut plant);
        validate_plant(&plant).into_result()?;

        let now = to_millis(OffsetDateTime::now_utc());
        let tx = self.conn.unchecked_transaction()?;
        tx.execute(
            "INSERT INTO plants (owner_id, name, species, location,
             temperature_min, temperature_max, temperature_unit,
             humidity_min, humidity_max, humidity_unit,
             ph_min, ph_max, ph_unit,
             light_min, light_max, light_unit,
             notes, notes_conditions, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16,
                     ?17, ?18, ?19, ?19)",
            params![
                plant.owner_id,
                plant.name,
                plant.species,
                plant.location,
                plant.temperature.min,
                plant.temperature.max,
                plant.temperature.unit,
                plant.humidity.min,
                plant.humidity.max,
                plant.humidity.unit,
                plant.ph.min,
                plant.ph.max,
                plant.ph.unit,
                plant.light.min,
                plant.light.max,
                plant.light.unit,
                plant.notes,
                plant.notes_conditions,
                now,
            ],
        )?;
        let id = tx.last_insert_rowid();
        write_ideal_ranges(&tx, id, &plant.ideal_ranges)?;
        tx.commit()?;

        info!(plant_id = id, name = %plant.name, "Created plant");
        self.get_plant(id)
    }

    fn find_plant(&self, id: i64) -> Result<Option<Plant>> {
        let sql = format!("SELECT {PLANT_COLUMNS} FROM plants WHERE id = ?");
        let plant = self
            .conn
            .query_row(&sql, [id], plant_from_row)
            .optional()?;

        match plant {
            Some(mut plant) => {
                plant.ideal_ranges = self.load_ideal_ranges(id)?;
                Ok(Some(plant))
            }
            None => Ok(None),
        }
    }

    fn load_ideal_ranges(&self, plant_id: i64) -> Result<Vec<IdealRange>> {
        let mut stmt = self.conn.prepare(
            "SELECT measurement, unit, min, max FROM ideal_ranges
             WHERE plant_id = ? ORDER BY position",
        )?;
        let ranges = stmt
            .query_map([plant_id], |row| {
                Ok(IdealRange {
                    measurement: column_parse(row, 0)?,
                    unit: row.get(1)?,
                    min: row.get(2)?,
                    max: row.get(3)?,
                })
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(ranges)
    }

    /// Get a plant by ID, with its ideal ranges.
    pub fn get_plant(&self, id: i64) -> Result<Plant> {
        self.find_plant(id)?.ok_or(Error::PlantNotFound(id))
    }

    /// Apply a partial update. Supplied ideal ranges replace the stored list.
    pub fn update_plant(&self, id: i64, update: PlantUpdate) -> Result<Plant> {
        let mut plant = self.get_plant(id)?;
        let replace_ranges = update.ideal_ranges.is_some();
        update.apply(&mut plant);
        mirror_ideal_ranges(&mut plant);
        validate_plant(&plant).into_result()?;

        let tx = self.conn.unchecked_transaction()?;
        tx.execute(
            "UPDATE plants SET name = ?2, species = ?3, location = ?4,
             temperature_min = ?5, temperature_max = ?6, temperature_unit = ?7,
             humidity_min = ?8, humidity_max = ?9, humidity_unit = ?10,
             ph_min = ?11, ph_max = ?12, ph_unit = ?13,
             light_min = ?14, light_max = ?15, light_unit = ?16,
             notes = ?17, notes_conditions = ?18, updated_at = ?19
             WHERE id = ?1",
            params![
                id,
                plant.name,
                plant.species,
                plant.location,
                plant.temperature.min,
                plant.temperature.max,
                plant.temperature.unit,
                plant.humidity.min,
                plant.humidity.max,
                plant.humidity.unit,
                plant.ph.min,
                plant.ph.max,
                plant.ph.unit,
                plant.light.min,
                plant.light.max,
                plant.light.unit,
                plant.notes,
                plant.notes_conditions,
                to_millis(OffsetDateTime::now_utc()),
            ],
        )?;
        if replace_ranges {
            write_ideal_ranges(&tx, id, &plant.ideal_ranges)?;
        }
        tx.commit()?;

        info!(plant_id = id, "Updated plant");
        self.get_plant(id)
    }

    /// Delete a plant. Its sensors stay registered but are detached.
    pub fn delete_plant(&self, id: i64) -> Result<()> {
        let deleted = self.conn.execute("DELETE FROM plants WHERE id = ?", [id])?;
        if deleted == 0 {
            return Err(Error::PlantNotFound(id));
        }
        info!(plant_id = id, "Deleted plant");
        Ok(())
    }

    /// Evaluate a plant against its sensors' latest readings.
    pub fn plant_status(&self, id: i64, now: OffsetDateTime) -> Result<PlantStatusView> {
        let plant = self.get_plant(id)?;
        let snapshots = self.plant_snapshots(id)?;
        let health = plant_health::evaluate(&plant, &snapshots, now);
        Ok(PlantStatusView { plant, health })
    }

    fn plant_snapshots(&self, plant_id: i64) -> Result<Vec<SensorSnapshot>> {
        let sql = format!("SELECT {SENSOR_COLUMNS} FROM sensors WHERE plant_id = ? ORDER BY id");
        let mut stmt = self.conn.prepare(&sql)?;
        let sensors = stmt
            .query_map([plant_id], sensor_from_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        sensors
            .into_iter()
            .map(|sensor| {
                let last_reading = self.latest_reading(sensor.id)?;
                Ok(SensorSnapshot::new(sensor, last_reading))
            })
            .collect()
    }

    /// List plants with their evaluated status.
    ///
    /// The status filter applies to the evaluated status, so every plant
    /// matching the text filters is evaluated before the page is cut.
    pub fn list_plants(
        &self,
        query: &PlantQuery,
        now: OffsetDateTime,
    ) -> Result<Page<PlantStatusView>> {
        let (sql, params) = query.build_sql();
        let mut views = Vec::new();
        for id in self.query_ids(&sql, &params)? {
            let view = self.plant_status(id, now)?;
            if query.status.is_none_or(|status| view.health.status == status) {
                views.push(view);
            }
        }
        Ok(Page::paginate(views, query.page, query.limit))
    }

    /// Distinct values for plant filter menus, sorted.
    pub fn plant_options(&self) -> Result<PlantOptions> {
        let strings = |sql: &str| -> Result<Vec<String>> {
            let mut stmt = self.conn.prepare(sql)?;
            let values = stmt
                .query_map([], |row| row.get(0))?
                .collect::<std::result::Result<Vec<String>, _>>()?;
            Ok(values)
        };

        let mut stmt = self
            .conn
            .prepare("SELECT DISTINCT measurement FROM ideal_ranges ORDER BY measurement")?;
        let types = stmt
            .query_map([], |row| column_parse::<MeasurementType>(row, 0))?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(PlantOptions {
            species: strings(
                "SELECT DISTINCT species FROM plants WHERE species <> '' ORDER BY species",
            )?,
            locations: strings(
                "SELECT DISTINCT location FROM plants WHERE location <> '' ORDER BY location",
            )?,
            types,
            units: strings("SELECT DISTINCT unit FROM ideal_ranges WHERE unit <> '' ORDER BY unit")?,
        })
    }
}

// Sensor operations
impl Store {
    /// Register a sensor for `owner_id`.
    ///
    /// The plant, when given, must exist and must not configure a different
    /// unit for the sensor's measurement type.
    pub fn create_sensor(&self, owner_id: i64, new: NewSensor) -> Result<Sensor> {
        let sensor = new.into_sensor(owner_id);
        validate_sensor(&sensor).into_result()?;
        if let Some(plant_id) = sensor.plant_id {
            let plant = self.get_plant(plant_id)?;
            check_unit(&sensor.measurement, &sensor.unit, &plant)?;
        }
        if self.find_sensor_by_hardware_id(&sensor.hardware_id)?.is_some() {
            return Err(Error::HardwareIdConflict(sensor.hardware_id));
        }

        let now = to_millis(OffsetDateTime::now_utc());
        self.conn.execute(
            "INSERT INTO sensors (owner_id, plant_id, hardware_id, name, measurement, unit,
             location, alerts_enabled, reading_interval_secs, notes, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?11)",
            params![
                sensor.owner_id,
                sensor.plant_id,
                sensor.hardware_id,
                sensor.name,
                sensor.measurement.as_str(),
                sensor.unit,
                sensor.location,
                sensor.alerts_enabled,
                sensor.reading_interval_secs,
                sensor.notes,
                now,
            ],
        )?;
        let id = self.conn.last_insert_rowid();

        info!(sensor_id = id, hardware_id = %sensor.hardware_id, "Registered sensor");
        self.get_sensor(id)
    }

    /// Get a sensor by ID.
    pub fn get_sensor(&self, id: i64) -> Result<Sensor> {
        let sql = format!("SELECT {SENSOR_COLUMNS} FROM sensors WHERE id = ?");
        self.conn
            .query_row(&sql, [id], sensor_from_row)
            .optional()?
            .ok_or_else(|| Error::SensorNotFound(id.to_string()))
    }

    /// Look a sensor up by its hardware identifier.
    pub fn find_sensor_by_hardware_id(&self, hardware_id: &str) -> Result<Option<Sensor>> {
        let sql = format!("SELECT {SENSOR_COLUMNS} FROM sensors WHERE hardware_id = ?");
        let sensor = self
            .conn
            .query_row(&sql, [hardware_id], sensor_from_row)
            .optional()?;
        Ok(sensor)
    }

    /// Apply a partial update.
    pub fn update_sensor(&self, id: i64, update: SensorUpdate) -> Result<Sensor> {
        let mut sensor = self.get_sensor(id)?;
        update.apply(&mut sensor);
        validate_sensor(&sensor).into_result()?;
        if let Some(plant_id) = sensor.plant_id {
            let plant = self.get_plant(plant_id)?;
            check_unit(&sensor.measurement, &sensor.unit, &plant)?;
        }

        self.conn.execute(
            "UPDATE sensors SET plant_id = ?2, name = ?3, unit = ?4, location = ?5,
             alerts_enabled = ?6, reading_interval_secs = ?7, notes = ?8, updated_at = ?9
             WHERE id = ?1",
            params![
                id,
                sensor.plant_id,
                sensor.name,
                sensor.unit,
                sensor.location,
                sensor.alerts_enabled,
                sensor.reading_interval_secs,
                sensor.notes,
                to_millis(OffsetDateTime::now_utc()),
            ],
        )?;

        info!(sensor_id = id, "Updated sensor");
        self.get_sensor(id)
    }

    /// Delete a sensor together with its readings.
    pub fn delete_sensor(&self, id: i64) -> Result<()> {
        let deleted = self.conn.execute("DELETE FROM sensors WHERE id = ?", [id])?;
        if deleted == 0 {
            return Err(Error::SensorNotFound(id.to_string()));
        }
        info!(sensor_id = id, "Deleted sensor");
        Ok(())
    }

    /// Evaluate a sensor against its latest reading and its plant.
    pub fn sensor_status(&self, id: i64, now: OffsetDateTime) -> Result<SensorStatusView> {
        let sensor = self.get_sensor(id)?;
        let last_reading = self.latest_reading(id)?;
        let plant = match sensor.plant_id {
            Some(plant_id) => self.find_plant(plant_id)?,
            None => None,
        };
        let health = sensor_health::evaluate(&sensor, last_reading.as_ref(), plant.as_ref(), now);
        Ok(SensorStatusView {
            sensor,
            last_reading,
            health,
        })
    }

    /// List sensors with their evaluated status.
    pub fn list_sensors(
        &self,
        query: &SensorQuery,
        now: OffsetDateTime,
    ) -> Result<Page<SensorStatusView>> {
        let (sql, params) = query.build_sql();
        let mut views = Vec::new();
        for id in self.query_ids(&sql, &params)? {
            let view = self.sensor_status(id, now)?;
            if query.status.is_none_or(|status| view.health.status == status) {
                views.push(view);
            }
        }
        Ok(Page::paginate(views, query.page, query.limit))
    }
}

// Reading operations
impl Store {
    /// Store a reading, classifying it and firing any matching alert rules.
    ///
    /// The reading and the alerts it fires are written in one transaction.
    /// `at` is stored at millisecond resolution and the returned reading
    /// carries the stored timestamp.
    pub fn ingest_reading(
        &self,
        sensor_id: i64,
        value: f64,
        at: OffsetDateTime,
    ) -> Result<IngestOutcome> {
        if !value.is_finite() {
            return Err(Error::NonFiniteValue(value));
        }

        let sensor = self.get_sensor(sensor_id)?;
        let plant = match sensor.plant_id {
            Some(plant_id) => self.find_plant(plant_id)?,
            None => None,
        };
        let status = classify(value, resolve(&sensor.measurement, plant.as_ref()));
        let rules = self.rules_for_sensor(sensor_id)?;

        let created_at = to_millis(at);
        let tx = self.conn.unchecked_transaction()?;
        tx.execute(
            "INSERT INTO readings (sensor_id, value, created_at, status) VALUES (?1, ?2, ?3, ?4)",
            params![sensor_id, value, created_at, status.as_str()],
        )?;
        let reading = Reading {
            id: tx.last_insert_rowid(),
            sensor_id,
            value,
            created_at: from_millis(created_at)?,
            status,
        };

        let alerts = self
            .evaluator
            .evaluate(&rules, &sensor, &reading)
            .iter()
            .map(|draft| crate::alerts::insert_alert(&tx, draft))
            .collect::<Result<Vec<_>>>()?;
        tx.commit()?;

        info!(
            sensor_id,
            value,
            status = %reading.status,
            alerts = alerts.len(),
            "Ingested reading"
        );
        Ok(IngestOutcome { reading, alerts })
    }

    /// Query readings with filters.
    pub fn query_readings(&self, query: &ReadingQuery) -> Result<Vec<Reading>> {
        let sql = query.build_sql();
        let (_, params) = query.build_where();

        debug!("Executing query: {}", sql);

        let params_ref: Vec<&dyn rusqlite::ToSql> = params.iter().map(|p| p.as_ref()).collect();

        let mut stmt = self.conn.prepare(&sql)?;
        let readings = stmt
            .query_map(params_ref.as_slice(), reading_from_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(readings)
    }

    /// Get the latest reading for a sensor.
    pub fn latest_reading(&self, sensor_id: i64) -> Result<Option<Reading>> {
        let query = ReadingQuery::new().sensor(sensor_id).limit(1);
        let mut readings = self.query_readings(&query)?;
        Ok(readings.pop())
    }

    /// Count readings, optionally for one sensor.
    pub fn count_readings(&self, sensor_id: Option<i64>) -> Result<u64> {
        let count: i64 = match sensor_id {
            Some(id) => self.conn.query_row(
                "SELECT COUNT(*) FROM readings WHERE sensor_id = ?",
                [id],
                |row| row.get(0),
            )?,
            None => self
                .conn
                .query_row("SELECT COUNT(*) FROM readings", [], |row| row.get(0))?,
        };

        Ok(count as u64)
    }
}
