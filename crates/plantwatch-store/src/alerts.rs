//! Alert rule and fired alert persistence.

use rusqlite::{Connection, OptionalExtension, Row, params};
use time::OffsetDateTime;
use tracing::info;

use plantwatch_core::AlertDraft;
use plantwatch_core::validation::validate_rule;
use plantwatch_types::{Alert, AlertEvent, AlertRule, AlertStatus};

use crate::error::{Error, Result};
use crate::models::{AlertRuleUpdate, NewAlertRule};
use crate::queries::{AlertQuery, severity_rank};
use crate::store::{Store, column_opt_time, column_parse, column_time, to_millis};

/// Title of the timeline event written when an alert fires.
pub const FIRED_EVENT_TITLE: &str = "Alerta disparado";
/// Title of the timeline event written when an alert is resolved.
pub const RESOLVED_EVENT_TITLE: &str = "Alerta resolvido";

const RULE_COLUMNS: &str = "id, owner_id, name, description, measurement, unit, condition, \
     threshold, severity, enabled, created_at, updated_at";

const ALERT_COLUMNS: &str = "id, owner_id, rule_id, sensor_id, plant_id, title, description, \
     status, severity, value, unit, fired_at, resolved_at, resolved_by, resolved_comment";

fn rule_from_row(row: &Row<'_>) -> rusqlite::Result<AlertRule> {
    Ok(AlertRule {
        id: row.get(0)?,
        owner_id: row.get(1)?,
        name: row.get(2)?,
        description: row.get(3)?,
        measurement: column_parse(row, 4)?,
        unit: row.get(5)?,
        condition: column_parse(row, 6)?,
        threshold: row.get(7)?,
        severity: column_parse(row, 8)?,
        enabled: row.get(9)?,
        sensor_ids: Vec::new(),
        created_at: column_time(row, 10)?,
        updated_at: column_time(row, 11)?,
    })
}

fn alert_from_row(row: &Row<'_>) -> rusqlite::Result<Alert> {
    Ok(Alert {
        id: row.get(0)?,
        owner_id: row.get(1)?,
        rule_id: row.get(2)?,
        sensor_id: row.get(3)?,
        plant_id: row.get(4)?,
        title: row.get(5)?,
        description: row.get(6)?,
        status: column_parse(row, 7)?,
        severity: column_parse(row, 8)?,
        value: row.get(9)?,
        unit: row.get(10)?,
        fired_at: column_time(row, 11)?,
        resolved_at: column_opt_time(row, 12)?,
        resolved_by: row.get(13)?,
        resolved_comment: row.get(14)?,
        events: Vec::new(),
    })
}

fn load_rule_sensors(conn: &Connection, rule_id: i64) -> Result<Vec<i64>> {
    let mut stmt = conn.prepare(
        "SELECT sensor_id FROM alert_rule_sensors WHERE rule_id = ? ORDER BY sensor_id",
    )?;
    let ids = stmt
        .query_map([rule_id], |row| row.get(0))?
        .collect::<std::result::Result<Vec<i64>, _>>()?;
    Ok(ids)
}

fn write_rule_sensors(conn: &Connection, rule_id: i64, sensor_ids: &[i64]) -> Result<()> {
    conn.execute("DELETE FROM alert_rule_sensors WHERE rule_id = ?", [rule_id])?;
    let mut stmt = conn
        .prepare("INSERT OR IGNORE INTO alert_rule_sensors (rule_id, sensor_id) VALUES (?1, ?2)")?;
    for sensor_id in sensor_ids {
        stmt.execute(params![rule_id, sensor_id])?;
    }
    Ok(())
}

fn insert_event(
    conn: &Connection,
    alert_id: i64,
    title: &str,
    message: Option<&str>,
    at: OffsetDateTime,
    by: Option<i64>,
) -> Result<()> {
    conn.execute(
        "INSERT INTO alert_events (alert_id, title, message, at, by_user)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        params![alert_id, title, message, to_millis(at), by],
    )?;
    Ok(())
}

fn fetch_alert(conn: &Connection, id: i64) -> Result<Alert> {
    let sql = format!("SELECT {ALERT_COLUMNS} FROM alerts WHERE id = ?");
    let mut alert = conn
        .query_row(&sql, [id], alert_from_row)
        .optional()?
        .ok_or(Error::AlertNotFound(id))?;

    let mut stmt = conn.prepare(
        "SELECT id, alert_id, title, message, at, by_user FROM alert_events
         WHERE alert_id = ? ORDER BY at, id",
    )?;
    alert.events = stmt
        .query_map([id], |row| {
            Ok(AlertEvent {
                id: row.get(0)?,
                alert_id: row.get(1)?,
                title: row.get(2)?,
                message: row.get(3)?,
                at: column_time(row, 4)?,
                by: row.get(5)?,
            })
        })?
        .collect::<std::result::Result<Vec<_>, _>>()?;

    Ok(alert)
}

/// Persist a fired alert as ACTIVE with its "fired" timeline event.
pub(crate) fn insert_alert(conn: &Connection, draft: &AlertDraft) -> Result<Alert> {
    conn.execute(
        "INSERT INTO alerts (owner_id, rule_id, sensor_id, plant_id, title, description,
         status, severity, severity_rank, value, unit, fired_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)",
        params![
            draft.owner_id,
            draft.rule_id,
            draft.sensor_id,
            draft.plant_id,
            draft.title,
            draft.description,
            AlertStatus::Active.as_str(),
            draft.severity.as_str(),
            severity_rank(draft.severity),
            draft.value,
            draft.unit,
            to_millis(draft.fired_at),
        ],
    )?;
    let id = conn.last_insert_rowid();
    insert_event(
        conn,
        id,
        FIRED_EVENT_TITLE,
        Some(&draft.description),
        draft.fired_at,
        None,
    )?;

    info!(alert_id = id, rule_id = draft.rule_id, sensor_id = draft.sensor_id, "Alert fired");
    fetch_alert(conn, id)
}

// Alert rule operations
impl Store {
    fn check_rule_sensors(&self, owner_id: i64, sensor_ids: &[i64]) -> Result<()> {
        for &sensor_id in sensor_ids {
            let sensor = self.get_sensor(sensor_id)?;
            if sensor.owner_id != owner_id {
                return Err(Error::SensorNotFound(sensor_id.to_string()));
            }
        }
        Ok(())
    }

    /// Validate and store a rule for `owner_id`.
    ///
    /// Every bound sensor must exist and belong to the same owner.
    pub fn create_rule(&self, owner_id: i64, new: NewAlertRule) -> Result<AlertRule> {
        let now = OffsetDateTime::now_utc();
        let rule = AlertRule {
            id: 0,
            owner_id,
            name: new.name,
            description: new.description,
            measurement: new.measurement,
            unit: new.unit,
            condition: new.condition,
            threshold: new.threshold,
            severity: new.severity,
            enabled: new.enabled,
            sensor_ids: new.sensor_ids,
            created_at: now,
            updated_at: now,
        };
        validate_rule(&rule).into_result()?;
        self.check_rule_sensors(owner_id, &rule.sensor_ids)?;

        let tx = self.conn.unchecked_transaction()?;
        tx.execute(
            "INSERT INTO alert_rules (owner_id, name, description, measurement, unit, condition,
             threshold, severity, enabled, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?10)",
            params![
                owner_id,
                rule.name,
                rule.description,
                rule.measurement.as_str(),
                rule.unit,
                rule.condition.as_str(),
                rule.threshold,
                rule.severity.as_str(),
                rule.enabled,
                to_millis(now),
            ],
        )?;
        let id = tx.last_insert_rowid();
        write_rule_sensors(&tx, id, &rule.sensor_ids)?;
        tx.commit()?;

        info!(rule_id = id, name = %rule.name, condition = %rule.condition, "Created alert rule");
        self.get_rule(id)
    }

    /// Get a rule by ID, with its bound sensors.
    pub fn get_rule(&self, id: i64) -> Result<AlertRule> {
        let sql = format!("SELECT {RULE_COLUMNS} FROM alert_rules WHERE id = ?");
        let mut rule = self
            .conn
            .query_row(&sql, [id], rule_from_row)
            .optional()?
            .ok_or(Error::RuleNotFound(id))?;
        rule.sensor_ids = load_rule_sensors(&self.conn, id)?;
        Ok(rule)
    }

    /// All rules owned by `owner_id`, oldest first.
    pub fn list_rules(&self, owner_id: i64) -> Result<Vec<AlertRule>> {
        let sql = format!("SELECT {RULE_COLUMNS} FROM alert_rules WHERE owner_id = ? ORDER BY id");
        self.load_rules(&sql, owner_id)
    }

    /// Rules bound to a sensor, in creation order.
    pub(crate) fn rules_for_sensor(&self, sensor_id: i64) -> Result<Vec<AlertRule>> {
        let sql = format!(
            "SELECT {RULE_COLUMNS} FROM alert_rules
             WHERE id IN (SELECT rule_id FROM alert_rule_sensors WHERE sensor_id = ?)
             ORDER BY id"
        );
        self.load_rules(&sql, sensor_id)
    }

    fn load_rules(&self, sql: &str, param: i64) -> Result<Vec<AlertRule>> {
        let mut stmt = self.conn.prepare(sql)?;
        let mut rules = stmt
            .query_map([param], rule_from_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        for rule in &mut rules {
            rule.sensor_ids = load_rule_sensors(&self.conn, rule.id)?;
        }
        Ok(rules)
    }

    /// Apply a partial update. Supplied sensor ids replace the bound set.
    pub fn update_rule(&self, id: i64, update: AlertRuleUpdate) -> Result<AlertRule> {
        let mut rule = self.get_rule(id)?;
        if let Some(name) = update.name {
            rule.name = name;
        }
        if update.description.is_some() {
            rule.description = update.description;
        }
        if update.unit.is_some() {
            rule.unit = update.unit;
        }
        if let Some(condition) = update.condition {
            rule.condition = condition;
        }
        if let Some(threshold) = update.threshold {
            rule.threshold = threshold;
        }
        if let Some(severity) = update.severity {
            rule.severity = severity;
        }
        if let Some(enabled) = update.enabled {
            rule.enabled = enabled;
        }
        validate_rule(&rule).into_result()?;
        if let Some(ref sensor_ids) = update.sensor_ids {
            self.check_rule_sensors(rule.owner_id, sensor_ids)?;
        }

        let tx = self.conn.unchecked_transaction()?;
        tx.execute(
            "UPDATE alert_rules SET name = ?2, description = ?3, unit = ?4, condition = ?5,
             threshold = ?6, severity = ?7, enabled = ?8, updated_at = ?9
             WHERE id = ?1",
            params![
                id,
                rule.name,
                rule.description,
                rule.unit,
                rule.condition.as_str(),
                rule.threshold,
                rule.severity.as_str(),
                rule.enabled,
                to_millis(OffsetDateTime::now_utc()),
            ],
        )?;
        if let Some(ref sensor_ids) = update.sensor_ids {
            write_rule_sensors(&tx, id, sensor_ids)?;
        }
        tx.commit()?;

        info!(rule_id = id, "Updated alert rule");
        self.get_rule(id)
    }

    /// Delete a rule. Alerts it already fired are kept.
    pub fn delete_rule(&self, id: i64) -> Result<()> {
        let deleted = self
            .conn
            .execute("DELETE FROM alert_rules WHERE id = ?", [id])?;
        if deleted == 0 {
            return Err(Error::RuleNotFound(id));
        }
        info!(rule_id = id, "Deleted alert rule");
        Ok(())
    }
}

// Fired alert operations
impl Store {
    /// List alerts, newest first, with their timelines.
    pub fn list_alerts(&self, query: &AlertQuery) -> Result<Vec<Alert>> {
        let (sql, params) = query.build_sql();
        self.query_ids(&sql, &params)?
            .into_iter()
            .map(|id| fetch_alert(&self.conn, id))
            .collect()
    }

    /// Get an alert with its timeline.
    pub fn get_alert(&self, id: i64) -> Result<Alert> {
        fetch_alert(&self.conn, id)
    }

    /// Move an active alert to RESOLVED and record who closed it.
    ///
    /// Resolving an alert twice fails with [`Error::AlertAlreadyResolved`].
    pub fn resolve_alert(
        &self,
        id: i64,
        by: i64,
        comment: Option<&str>,
        now: OffsetDateTime,
    ) -> Result<Alert> {
        let tx = self.conn.unchecked_transaction()?;
        let alert = fetch_alert(&tx, id)?;
        if !alert.is_active() {
            return Err(Error::AlertAlreadyResolved(id));
        }

        tx.execute(
            "UPDATE alerts SET status = ?2, resolved_at = ?3, resolved_by = ?4,
             resolved_comment = ?5 WHERE id = ?1",
            params![
                id,
                AlertStatus::Resolved.as_str(),
                to_millis(now),
                by,
                comment,
            ],
        )?;
        insert_event(&tx, id, RESOLVED_EVENT_TITLE, comment, now, Some(by))?;
        tx.commit()?;

        info!(alert_id = id, resolved_by = by, "Alert resolved");
        self.get_alert(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{NewPlant, NewSensor};
    use plantwatch_types::{AlertCondition, AlertSeverity, LegacyRange, MeasurementType, Sensor};
    use time::macros::datetime;

    const NOW: OffsetDateTime = datetime!(2025-06-01 12:00:00 UTC);

    fn setup() -> (Store, Sensor) {
        let store = Store::open_in_memory().unwrap();
        let mut plant = NewPlant::new(1, "Tomato");
        plant.temperature = LegacyRange {
            min: Some(18.0),
            max: Some(28.0),
            unit: Some("°C".into()),
        };
        let plant = store.create_plant(plant).unwrap();
        let sensor = store
            .create_sensor(
                1,
                NewSensor::new("T-1", "Greenhouse", MeasurementType::Temperature)
                    .with_plant(plant.id)
                    .with_unit("°C"),
            )
            .unwrap();
        (store, sensor)
    }

    fn heat_rule(sensor_id: i64) -> NewAlertRule {
        NewAlertRule::new(
            "Heat",
            MeasurementType::Temperature,
            AlertCondition::GreaterThan,
            Some(30.0),
        )
        .with_sensors([sensor_id])
        .with_severity(AlertSeverity::High)
    }

    #[test]
    fn test_create_and_get_rule() {
        let (store, sensor) = setup();
        let rule = store.create_rule(1, heat_rule(sensor.id)).unwrap();

        let fetched = store.get_rule(rule.id).unwrap();
        assert_eq!(fetched.name, "Heat");
        assert_eq!(fetched.condition, AlertCondition::GreaterThan);
        assert_eq!(fetched.severity, AlertSeverity::High);
        assert_eq!(fetched.sensor_ids, vec![sensor.id]);
        assert_eq!(store.list_rules(1).unwrap().len(), 1);
        assert!(store.list_rules(2).unwrap().is_empty());
    }

    #[test]
    fn test_create_rule_requires_threshold() {
        let (store, sensor) = setup();
        let rule = NewAlertRule::new("Eq", MeasurementType::Temperature, AlertCondition::Equals, None)
            .with_sensors([sensor.id]);
        let err = store.create_rule(1, rule).unwrap_err();
        assert!(matches!(
            err,
            Error::Validation(plantwatch_core::Error::MissingThreshold(_))
        ));
    }

    #[test]
    fn test_create_rule_rejects_foreign_sensor() {
        let (store, sensor) = setup();
        let err = store.create_rule(2, heat_rule(sensor.id)).unwrap_err();
        assert!(matches!(err, Error::SensorNotFound(_)));
        let err = store.create_rule(1, heat_rule(999)).unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn test_ingest_fires_alert_with_event() {
        let (store, sensor) = setup();
        store.create_rule(1, heat_rule(sensor.id)).unwrap();

        let quiet = store.ingest_reading(sensor.id, 29.0, NOW).unwrap();
        assert!(quiet.alerts.is_empty());

        let outcome = store.ingest_reading(sensor.id, 31.0, NOW).unwrap();
        assert_eq!(outcome.alerts.len(), 1);
        let alert = &outcome.alerts[0];
        assert_eq!(alert.status, AlertStatus::Active);
        assert_eq!(alert.title, "Heat");
        assert_eq!(alert.severity, AlertSeverity::High);
        assert_eq!(alert.value, Some(31.0));
        assert_eq!(alert.unit.as_deref(), Some("°C"));
        assert_eq!(alert.fired_at, NOW);
        assert_eq!(alert.events.len(), 1);
        assert_eq!(alert.events[0].title, FIRED_EVENT_TITLE);

        // No deduplication
        store.ingest_reading(sensor.id, 32.0, NOW).unwrap();
        assert_eq!(store.list_alerts(&AlertQuery::new().active()).unwrap().len(), 2);
    }

    #[test]
    fn test_out_of_range_uses_stored_status() {
        let (store, sensor) = setup();
        store
            .create_rule(
                1,
                NewAlertRule::new(
                    "Out",
                    MeasurementType::Temperature,
                    AlertCondition::OutOfRange,
                    None,
                )
                .with_sensors([sensor.id]),
            )
            .unwrap();

        let attention = store.ingest_reading(sensor.id, 27.5, NOW).unwrap();
        assert!(attention.alerts.is_empty());
        let critical = store.ingest_reading(sensor.id, 12.0, NOW).unwrap();
        assert_eq!(critical.alerts.len(), 1);
    }

    #[test]
    fn test_disabled_rule_never_fires() {
        let (store, sensor) = setup();
        let rule = store.create_rule(1, heat_rule(sensor.id)).unwrap();
        store
            .update_rule(
                rule.id,
                AlertRuleUpdate {
                    enabled: Some(false),
                    ..Default::default()
                },
            )
            .unwrap();

        let outcome = store.ingest_reading(sensor.id, 40.0, NOW).unwrap();
        assert!(outcome.alerts.is_empty());
    }

    #[test]
    fn test_resolve_alert_once() {
        let (store, sensor) = setup();
        store.create_rule(1, heat_rule(sensor.id)).unwrap();
        let outcome = store.ingest_reading(sensor.id, 35.0, NOW).unwrap();
        let id = outcome.alerts[0].id;

        let later = datetime!(2025-06-01 12:30:00 UTC);
        let resolved = store
            .resolve_alert(id, 7, Some("Opened the vents"), later)
            .unwrap();
        assert_eq!(resolved.status, AlertStatus::Resolved);
        assert_eq!(resolved.resolved_at, Some(later));
        assert_eq!(resolved.resolved_by, Some(7));
        assert_eq!(resolved.resolved_comment.as_deref(), Some("Opened the vents"));
        assert_eq!(resolved.events.len(), 2);
        assert_eq!(resolved.events[1].title, RESOLVED_EVENT_TITLE);
        assert_eq!(resolved.events[1].by, Some(7));

        assert!(matches!(
            store.resolve_alert(id, 7, None, later),
            Err(Error::AlertAlreadyResolved(_))
        ));
        assert!(matches!(
            store.resolve_alert(999, 7, None, later),
            Err(Error::AlertNotFound(999))
        ));
        assert!(
            store
                .list_alerts(&AlertQuery::new().active())
                .unwrap()
                .is_empty()
        );
    }

    #[test]
    fn test_alert_query_severity_filter() {
        let (store, sensor) = setup();
        store.create_rule(1, heat_rule(sensor.id)).unwrap();
        store
            .create_rule(
                1,
                NewAlertRule::new(
                    "Warm",
                    MeasurementType::Temperature,
                    AlertCondition::GreaterThan,
                    Some(25.0),
                )
                .with_sensors([sensor.id])
                .with_severity(AlertSeverity::Low),
            )
            .unwrap();
        store.ingest_reading(sensor.id, 31.0, NOW).unwrap();

        let all = store.list_alerts(&AlertQuery::new().owner(1)).unwrap();
        assert_eq!(all.len(), 2);
        let high = store
            .list_alerts(&AlertQuery::new().min_severity(AlertSeverity::High))
            .unwrap();
        assert_eq!(high.len(), 1);
        assert_eq!(high[0].title, "Heat");
    }

    #[test]
    fn test_delete_rule_keeps_alerts() {
        let (store, sensor) = setup();
        let rule = store.create_rule(1, heat_rule(sensor.id)).unwrap();
        let outcome = store.ingest_reading(sensor.id, 35.0, NOW).unwrap();

        store.delete_rule(rule.id).unwrap();
        let alert = store.get_alert(outcome.alerts[0].id).unwrap();
        assert_eq!(alert.rule_id, None);
        assert!(matches!(store.get_rule(rule.id), Err(Error::RuleNotFound(_))));
    }
}
