//! Query builders for readings, plants, sensors and alerts.
//!
//! All builders follow the same fluent pattern: start from `new()`, chain
//! the filters you need, and pass the query to the matching
//! [`Store`](crate::Store) method.
//!
//! # Example
//!
//! ```
//! use plantwatch_store::{PlantQuery, ReadingQuery, SortOrder, Store};
//! use plantwatch_types::SensorStatus;
//! use time::{Duration, OffsetDateTime};
//!
//! let store = Store::open_in_memory()?;
//! let now = OffsetDateTime::now_utc();
//!
//! // Last hour of readings for one sensor, newest first
//! let readings = store.query_readings(&ReadingQuery::new().sensor(1).since(now - Duration::hours(1)))?;
//!
//! // Second page of alerting plants named like "tomato"
//! let query = PlantQuery::new()
//!     .name("tomato")
//!     .status(SensorStatus::InAlert)
//!     .order(SortOrder::Desc)
//!     .page(2);
//! let page = store.list_plants(&query, now)?;
//! assert_eq!(page.meta.page, 2);
//! # Ok::<(), plantwatch_store::Error>(())
//! ```

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use plantwatch_types::{AlertSeverity, AlertStatus, MeasurementType, ReadingStatus, SensorStatus};

use crate::store::to_millis;

/// Default page size for plant and sensor listings.
pub const DEFAULT_PAGE_SIZE: u32 = 10;

/// Sort direction by name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    /// A to Z.
    #[default]
    Asc,
    /// Z to A.
    Desc,
}

impl SortOrder {
    pub(crate) fn sql(self) -> &'static str {
        match self {
            SortOrder::Asc => "ASC",
            SortOrder::Desc => "DESC",
        }
    }
}

pub(crate) type Params = Vec<Box<dyn rusqlite::ToSql>>;

fn where_clause(conditions: &[&str]) -> String {
    if conditions.is_empty() {
        String::new()
    } else {
        format!("WHERE {}", conditions.join(" AND "))
    }
}

/// Fluent query builder for sensor readings.
///
/// By default, queries return results ordered by `created_at` descending
/// (newest first).
#[derive(Debug, Default, Clone)]
pub struct ReadingQuery {
    /// Filter by sensor.
    pub sensor_id: Option<i64>,
    /// Filter readings at or after this time.
    pub since: Option<OffsetDateTime>,
    /// Filter readings at or before this time.
    pub until: Option<OffsetDateTime>,
    /// Filter by stored classification.
    pub status: Option<ReadingStatus>,
    /// Maximum number of results.
    pub limit: Option<u32>,
    /// Offset for pagination.
    pub offset: Option<u32>,
    /// Order by created_at descending (newest first).
    pub newest_first: bool,
}

impl ReadingQuery {
    /// Create a new query with default settings (all sensors, newest first).
    pub fn new() -> Self {
        Self {
            newest_first: true,
            ..Default::default()
        }
    }

    /// Only include readings from this sensor.
    pub fn sensor(mut self, sensor_id: i64) -> Self {
        self.sensor_id = Some(sensor_id);
        self
    }

    /// Filter to readings created at or after this time.
    pub fn since(mut self, time: OffsetDateTime) -> Self {
        self.since = Some(time);
        self
    }

    /// Filter to readings created at or before this time.
    pub fn until(mut self, time: OffsetDateTime) -> Self {
        self.until = Some(time);
        self
    }

    /// Only include readings with this classification.
    pub fn status(mut self, status: ReadingStatus) -> Self {
        self.status = Some(status);
        self
    }

    /// Limit the maximum number of results returned.
    pub fn limit(mut self, limit: u32) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Skip the first N results.
    pub fn offset(mut self, offset: u32) -> Self {
        self.offset = Some(offset);
        self
    }

    /// Order results oldest first.
    pub fn oldest_first(mut self) -> Self {
        self.newest_first = false;
        self
    }

    /// Build the SQL WHERE clause and parameters.
    pub(crate) fn build_where(&self) -> (String, Params) {
        let mut conditions = Vec::new();
        let mut params: Params = Vec::new();

        if let Some(sensor_id) = self.sensor_id {
            conditions.push("sensor_id = ?");
            params.push(Box::new(sensor_id));
        }

        if let Some(since) = self.since {
            conditions.push("created_at >= ?");
            params.push(Box::new(to_millis(since)));
        }

        if let Some(until) = self.until {
            conditions.push("created_at <= ?");
            params.push(Box::new(to_millis(until)));
        }

        if let Some(status) = self.status {
            conditions.push("status = ?");
            params.push(Box::new(status.as_str()));
        }

        (where_clause(&conditions), params)
    }

    /// Build the full SQL query.
    pub(crate) fn build_sql(&self) -> String {
        let (where_clause, _) = self.build_where();
        let order = if self.newest_first { "DESC" } else { "ASC" };

        let mut sql = format!(
            "SELECT id, sensor_id, value, created_at, status FROM readings {where_clause} \
             ORDER BY created_at {order}, id {order}"
        );

        // SQLite needs a LIMIT before OFFSET
        match (self.limit, self.offset) {
            (Some(limit), Some(offset)) => sql.push_str(&format!(" LIMIT {limit} OFFSET {offset}")),
            (Some(limit), None) => sql.push_str(&format!(" LIMIT {limit}")),
            (None, Some(offset)) => sql.push_str(&format!(" LIMIT -1 OFFSET {offset}")),
            (None, None) => {}
        }

        sql
    }
}

/// Query builder for plant listings.
///
/// The text filters are case-insensitive substring matches. The status
/// filter is applied after health evaluation, before pagination.
#[derive(Debug, Clone, PartialEq)]
pub struct PlantQuery {
    /// Only plants owned by this user.
    pub owner_id: Option<i64>,
    /// Name substring.
    pub name: Option<String>,
    /// Species substring.
    pub species: Option<String>,
    /// Location substring.
    pub location: Option<String>,
    /// Evaluated status.
    pub status: Option<SensorStatus>,
    /// Name ordering.
    pub order: SortOrder,
    /// 1-based page number.
    pub page: u32,
    /// Page size.
    pub limit: u32,
}

impl Default for PlantQuery {
    fn default() -> Self {
        Self {
            owner_id: None,
            name: None,
            species: None,
            location: None,
            status: None,
            order: SortOrder::Asc,
            page: 1,
            limit: DEFAULT_PAGE_SIZE,
        }
    }
}

impl PlantQuery {
    /// First page of all plants, A to Z.
    pub fn new() -> Self {
        Self::default()
    }

    /// Only plants owned by this user.
    pub fn owner(mut self, owner_id: i64) -> Self {
        self.owner_id = Some(owner_id);
        self
    }

    /// Name contains `name`.
    pub fn name(mut self, name: &str) -> Self {
        self.name = Some(name.to_string());
        self
    }

    /// Species contains `species`.
    pub fn species(mut self, species: &str) -> Self {
        self.species = Some(species.to_string());
        self
    }

    /// Location contains `location`.
    pub fn location(mut self, location: &str) -> Self {
        self.location = Some(location.to_string());
        self
    }

    /// Evaluated status equals `status`.
    pub fn status(mut self, status: SensorStatus) -> Self {
        self.status = Some(status);
        self
    }

    /// Sort by name in this direction.
    pub fn order(mut self, order: SortOrder) -> Self {
        self.order = order;
        self
    }

    /// Select a page (1-based; 0 is treated as 1).
    pub fn page(mut self, page: u32) -> Self {
        self.page = page.max(1);
        self
    }

    /// Page size (at least 1).
    pub fn limit(mut self, limit: u32) -> Self {
        self.limit = limit.max(1);
        self
    }

    pub(crate) fn build_sql(&self) -> (String, Params) {
        let mut conditions = Vec::new();
        let mut params: Params = Vec::new();

        if let Some(owner_id) = self.owner_id {
            conditions.push("owner_id = ?");
            params.push(Box::new(owner_id));
        }
        if let Some(ref name) = self.name {
            conditions.push("name LIKE '%' || ? || '%'");
            params.push(Box::new(name.clone()));
        }
        if let Some(ref species) = self.species {
            conditions.push("species LIKE '%' || ? || '%'");
            params.push(Box::new(species.clone()));
        }
        if let Some(ref location) = self.location {
            conditions.push("location LIKE '%' || ? || '%'");
            params.push(Box::new(location.clone()));
        }

        let sql = format!(
            "SELECT id FROM plants {} ORDER BY name COLLATE NOCASE {}, id ASC",
            where_clause(&conditions),
            self.order.sql()
        );
        (sql, params)
    }
}

/// Query builder for sensor listings.
#[derive(Debug, Clone, PartialEq)]
pub struct SensorQuery {
    /// Only sensors owned by this user.
    pub owner_id: Option<i64>,
    /// Only sensors attached to this plant.
    pub plant_id: Option<i64>,
    /// Name substring.
    pub name: Option<String>,
    /// Exact measurement type.
    pub measurement: Option<MeasurementType>,
    /// Location substring.
    pub location: Option<String>,
    /// Attached plant's name substring.
    pub plant_name: Option<String>,
    /// Evaluated status.
    pub status: Option<SensorStatus>,
    /// Name ordering.
    pub order: SortOrder,
    /// 1-based page number.
    pub page: u32,
    /// Page size.
    pub limit: u32,
}

impl Default for SensorQuery {
    fn default() -> Self {
        Self {
            owner_id: None,
            plant_id: None,
            name: None,
            measurement: None,
            location: None,
            plant_name: None,
            status: None,
            order: SortOrder::Asc,
            page: 1,
            limit: DEFAULT_PAGE_SIZE,
        }
    }
}

impl SensorQuery {
    /// First page of all sensors, A to Z.
    pub fn new() -> Self {
        Self::default()
    }

    /// Only sensors owned by this user.
    pub fn owner(mut self, owner_id: i64) -> Self {
        self.owner_id = Some(owner_id);
        self
    }

    /// Only sensors attached to this plant.
    pub fn plant(mut self, plant_id: i64) -> Self {
        self.plant_id = Some(plant_id);
        self
    }

    /// Name contains `name`.
    pub fn name(mut self, name: &str) -> Self {
        self.name = Some(name.to_string());
        self
    }

    /// Measurement type equals `measurement`.
    pub fn measurement(mut self, measurement: MeasurementType) -> Self {
        self.measurement = Some(measurement);
        self
    }

    /// Location contains `location`.
    pub fn location(mut self, location: &str) -> Self {
        self.location = Some(location.to_string());
        self
    }

    /// Attached plant's name contains `plant_name`.
    pub fn plant_name(mut self, plant_name: &str) -> Self {
        self.plant_name = Some(plant_name.to_string());
        self
    }

    /// Evaluated status equals `status`.
    pub fn status(mut self, status: SensorStatus) -> Self {
        self.status = Some(status);
        self
    }

    /// Sort by name in this direction.
    pub fn order(mut self, order: SortOrder) -> Self {
        self.order = order;
        self
    }

    /// Select a page (1-based; 0 is treated as 1).
    pub fn page(mut self, page: u32) -> Self {
        self.page = page.max(1);
        self
    }

    /// Page size (at least 1).
    pub fn limit(mut self, limit: u32) -> Self {
        self.limit = limit.max(1);
        self
    }

    pub(crate) fn build_sql(&self) -> (String, Params) {
        let mut conditions = Vec::new();
        let mut params: Params = Vec::new();

        if let Some(owner_id) = self.owner_id {
            conditions.push("s.owner_id = ?");
            params.push(Box::new(owner_id));
        }
        if let Some(plant_id) = self.plant_id {
            conditions.push("s.plant_id = ?");
            params.push(Box::new(plant_id));
        }
        if let Some(ref name) = self.name {
            conditions.push("s.name LIKE '%' || ? || '%'");
            params.push(Box::new(name.clone()));
        }
        if let Some(ref measurement) = self.measurement {
            conditions.push("s.measurement = ?");
            params.push(Box::new(measurement.as_str().to_string()));
        }
        if let Some(ref location) = self.location {
            conditions.push("s.location LIKE '%' || ? || '%'");
            params.push(Box::new(location.clone()));
        }
        if let Some(ref plant_name) = self.plant_name {
            conditions.push("p.name LIKE '%' || ? || '%'");
            params.push(Box::new(plant_name.clone()));
        }

        let sql = format!(
            "SELECT s.id FROM sensors s LEFT JOIN plants p ON p.id = s.plant_id {} \
             ORDER BY s.name COLLATE NOCASE {}, s.id ASC",
            where_clause(&conditions),
            self.order.sql()
        );
        (sql, params)
    }
}

/// Query builder for fired alerts. Newest first.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AlertQuery {
    /// Only alerts owned by this user.
    pub owner_id: Option<i64>,
    /// Lifecycle status.
    pub status: Option<AlertStatus>,
    /// Only alerts fired by this sensor.
    pub sensor_id: Option<i64>,
    /// Only alerts for this plant.
    pub plant_id: Option<i64>,
    /// Minimum severity.
    pub min_severity: Option<AlertSeverity>,
    /// Maximum number of results.
    pub limit: Option<u32>,
}

impl AlertQuery {
    /// All alerts, newest first.
    pub fn new() -> Self {
        Self::default()
    }

    /// Only alerts owned by this user.
    pub fn owner(mut self, owner_id: i64) -> Self {
        self.owner_id = Some(owner_id);
        self
    }

    /// Only active alerts.
    pub fn active(mut self) -> Self {
        self.status = Some(AlertStatus::Active);
        self
    }

    /// Only alerts with this status.
    pub fn status(mut self, status: AlertStatus) -> Self {
        self.status = Some(status);
        self
    }

    /// Only alerts fired by this sensor.
    pub fn sensor(mut self, sensor_id: i64) -> Self {
        self.sensor_id = Some(sensor_id);
        self
    }

    /// Only alerts for this plant.
    pub fn plant(mut self, plant_id: i64) -> Self {
        self.plant_id = Some(plant_id);
        self
    }

    /// Only alerts at or above this severity.
    pub fn min_severity(mut self, severity: AlertSeverity) -> Self {
        self.min_severity = Some(severity);
        self
    }

    /// Limit the maximum number of results returned.
    pub fn limit(mut self, limit: u32) -> Self {
        self.limit = Some(limit);
        self
    }

    pub(crate) fn build_sql(&self) -> (String, Params) {
        let mut conditions = Vec::new();
        let mut params: Params = Vec::new();

        if let Some(owner_id) = self.owner_id {
            conditions.push("owner_id = ?");
            params.push(Box::new(owner_id));
        }
        if let Some(status) = self.status {
            conditions.push("status = ?");
            params.push(Box::new(status.as_str()));
        }
        if let Some(sensor_id) = self.sensor_id {
            conditions.push("sensor_id = ?");
            params.push(Box::new(sensor_id));
        }
        if let Some(plant_id) = self.plant_id {
            conditions.push("plant_id = ?");
            params.push(Box::new(plant_id));
        }
        if let Some(severity) = self.min_severity {
            conditions.push("severity_rank >= ?");
            params.push(Box::new(severity_rank(severity)));
        }

        let mut sql = format!(
            "SELECT id FROM alerts {} ORDER BY fired_at DESC, id DESC",
            where_clause(&conditions)
        );
        if let Some(limit) = self.limit {
            sql.push_str(&format!(" LIMIT {limit}"));
        }
        (sql, params)
    }
}

/// Numeric rank stored next to the severity name so it can be compared in SQL.
pub(crate) fn severity_rank(severity: AlertSeverity) -> i64 {
    match severity {
        AlertSeverity::Low => 0,
        AlertSeverity::Medium => 1,
        AlertSeverity::High => 2,
        AlertSeverity::Critical => 3,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reading_query_defaults() {
        let q = ReadingQuery::new();
        assert!(q.newest_first);
        assert!(q.sensor_id.is_none());
        let sql = q.build_sql();
        assert!(sql.contains("ORDER BY created_at DESC"));
        assert!(!sql.contains("WHERE"));
    }

    #[test]
    fn test_reading_query_builder_chain() {
        let now = OffsetDateTime::now_utc();
        let q = ReadingQuery::new()
            .sensor(3)
            .since(now)
            .status(ReadingStatus::Critical)
            .limit(5)
            .offset(10)
            .oldest_first();

        let (where_clause, params) = q.build_where();
        assert!(where_clause.contains("sensor_id = ?"));
        assert!(where_clause.contains("created_at >= ?"));
        assert!(where_clause.contains("status = ?"));
        assert_eq!(params.len(), 3);

        let sql = q.build_sql();
        assert!(sql.contains("ORDER BY created_at ASC"));
        assert!(sql.ends_with("LIMIT 5 OFFSET 10"));
    }

    #[test]
    fn test_reading_query_offset_without_limit() {
        let sql = ReadingQuery::new().offset(4).build_sql();
        assert!(sql.ends_with("LIMIT -1 OFFSET 4"));
    }

    #[test]
    fn test_plant_query_page_and_limit_clamped() {
        let q = PlantQuery::new().page(0).limit(0);
        assert_eq!(q.page, 1);
        assert_eq!(q.limit, 1);
    }

    #[test]
    fn test_plant_query_sql() {
        let (sql, params) = PlantQuery::new()
            .owner(1)
            .species("solanum")
            .order(SortOrder::Desc)
            .build_sql();
        assert!(sql.contains("owner_id = ?"));
        assert!(sql.contains("species LIKE"));
        assert!(sql.contains("DESC"));
        assert_eq!(params.len(), 2);
    }

    #[test]
    fn test_sensor_query_sql_joins_plants() {
        let (sql, params) = SensorQuery::new()
            .plant_name("basil")
            .measurement(MeasurementType::Ph)
            .build_sql();
        assert!(sql.contains("LEFT JOIN plants"));
        assert!(sql.contains("p.name LIKE"));
        assert!(sql.contains("s.measurement = ?"));
        assert_eq!(params.len(), 2);
    }

    #[test]
    fn test_alert_query_sql() {
        let (sql, params) = AlertQuery::new()
            .active()
            .min_severity(AlertSeverity::High)
            .limit(20)
            .build_sql();
        assert!(sql.contains("status = ?"));
        assert!(sql.contains("severity_rank >= ?"));
        assert!(sql.ends_with("LIMIT 20"));
        assert_eq!(params.len(), 2);
    }

    #[test]
    fn test_sort_order_serde() {
        assert_eq!(serde_json::to_string(&SortOrder::Desc).unwrap(), "\"desc\"");
    }
}
