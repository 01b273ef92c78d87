//! Output formatting for plants, sensors, readings, rules and alerts.

use anyhow::Result;
use owo_colors::OwoColorize;
use tabled::builder::Builder;
use time::OffsetDateTime;
use time::macros::format_description;

use plantwatch_core::LastValues;
use plantwatch_store::{
    IngestOutcome, Page, PageMeta, PlantOptions, PlantStatusView, SensorStatusView,
};
use plantwatch_types::{Alert, AlertRule, IdealRange, LegacyRange, MeasurementType, Reading};

use crate::style;

/// Options for formatting output.
#[derive(Debug, Clone, Copy, Default)]
pub struct FormatOptions {
    /// Disable colored output.
    pub no_color: bool,
    /// Use compact JSON output (no pretty-printing).
    pub compact: bool,
}

impl FormatOptions {
    pub fn new(no_color: bool) -> Self {
        Self {
            no_color,
            compact: false,
        }
    }

    /// Serialize value to JSON string, respecting compact option.
    pub fn as_json<T: serde::Serialize>(&self, value: &T) -> Result<String> {
        let json = if self.compact {
            serde_json::to_string(value)?
        } else {
            serde_json::to_string_pretty(value)?
        };
        Ok(json + "\n")
    }
}

// ============================================================================
// Value helpers
// ============================================================================

/// Format a timestamp as `YYYY-MM-DD HH:MM:SS`.
#[must_use]
pub fn format_time(at: OffsetDateTime) -> String {
    at.format(format_description!(
        "[year]-[month]-[day] [hour]:[minute]:[second]"
    ))
    .unwrap_or_else(|_| "Unknown".to_string())
}

/// Format a value with an optional unit.
#[must_use]
pub fn format_value(value: f64, unit: &str) -> String {
    if unit.is_empty() {
        format!("{}", value)
    } else {
        format!("{} {}", value, unit)
    }
}

/// Format optional bounds as `18 .. 28 °C`, `>= 18` or `<= 28`.
#[must_use]
pub fn format_bounds(min: Option<f64>, max: Option<f64>, unit: Option<&str>) -> String {
    let text = match (min, max) {
        (Some(min), Some(max)) => format!("{} .. {}", min, max),
        (Some(min), None) => format!(">= {}", min),
        (None, Some(max)) => format!("<= {}", max),
        (None, None) => return "-".to_string(),
    };
    match unit {
        Some(unit) if !unit.is_empty() => format!("{} {}", text, unit),
        _ => text,
    }
}

/// Format a relative age such as `45s ago` or `3m 10s ago`.
#[must_use]
pub fn format_age(at: OffsetDateTime, now: OffsetDateTime) -> String {
    let seconds = (now - at).whole_seconds().max(0);
    if seconds < 60 {
        format!("{}s ago", seconds)
    } else if seconds < 3600 {
        format!("{}m {}s ago", seconds / 60, seconds % 60)
    } else if seconds < 86_400 {
        format!("{}h {}m ago", seconds / 3600, (seconds % 3600) / 60)
    } else {
        format!("{}d ago", seconds / 86_400)
    }
}

fn format_page_footer(meta: &PageMeta) -> String {
    format!(
        "Page {} of {} ({} total)\n",
        meta.page,
        meta.last_page.max(1),
        meta.total
    )
}

fn format_last_values(values: &LastValues) -> String {
    let parts: Vec<String> = MeasurementType::BUILTIN
        .iter()
        .filter_map(|m| values.get(m).map(|v| format!("{} {}", m.label(), v.value)))
        .collect();
    if parts.is_empty() {
        "-".to_string()
    } else {
        parts.join(", ")
    }
}

// ============================================================================
// Plants
// ============================================================================

#[must_use]
pub fn format_plant_list_text(page: &Page<PlantStatusView>, opts: &FormatOptions) -> String {
    if page.data.is_empty() {
        return "No plants found.\n".to_string();
    }

    let mut builder = Builder::default();
    builder.push_record(["ID", "Name", "Species", "Location", "Status", "Sensors", "Last values"]);
    for view in &page.data {
        builder.push_record([
            view.plant.id.to_string(),
            view.plant.name.clone(),
            view.plant.species.clone(),
            view.plant.location.clone(),
            style::format_sensor_status(view.health.status, opts.no_color),
            format!(
                "{}/{}",
                view.health.online_count, view.health.sensors_count
            ),
            format_last_values(&view.health.last_values),
        ]);
    }

    let mut table = builder.build();
    style::apply_table_style(&mut table);
    format!("{}\n{}", table, format_page_footer(&page.meta))
}

fn legacy_row(measurement: &MeasurementType, range: &LegacyRange) -> Option<[String; 2]> {
    range.has_bounds().then(|| {
        [
            measurement.label().to_string(),
            format_bounds(range.min, range.max, range.unit.as_deref()),
        ]
    })
}

fn ideal_row(range: &IdealRange) -> [String; 2] {
    [
        range.measurement.label().to_string(),
        format_bounds(range.min, range.max, Some(&range.unit)),
    ]
}

#[must_use]
pub fn format_plant_text(
    view: &PlantStatusView,
    sensors: &[SensorStatusView],
    opts: &FormatOptions,
) -> String {
    let plant = &view.plant;
    let health = &view.health;
    let mut output = format!(
        "{}\n\n",
        style::format_title(&format!("{} (#{})", plant.name, plant.id), opts.no_color)
    );

    output.push_str(&format!(
        "Status:    {}\n",
        style::format_sensor_status(health.status, opts.no_color)
    ));
    if !plant.species.is_empty() {
        output.push_str(&format!("Species:   {}\n", plant.species));
    }
    if !plant.location.is_empty() {
        output.push_str(&format!("Location:  {}\n", plant.location));
    }
    output.push_str(&format!(
        "Sensors:   {} ({} online, {} breaches)\n",
        health.sensors_count, health.online_count, health.alert_count
    ));
    if let Some(notes) = &plant.notes {
        output.push_str(&format!("Notes:     {}\n", notes));
    }

    let legacy = [
        (MeasurementType::Temperature, &plant.temperature),
        (MeasurementType::Humidity, &plant.humidity),
        (MeasurementType::Ph, &plant.ph),
        (MeasurementType::Light, &plant.light),
    ];
    let mut ranges: Vec<[String; 2]> = legacy
        .iter()
        .filter_map(|(m, r)| legacy_row(m, r))
        .collect();
    for range in &plant.ideal_ranges {
        if plant
            .legacy(&range.measurement)
            .is_none_or(|legacy| !legacy.has_bounds())
        {
            ranges.push(ideal_row(range));
        }
    }
    if !ranges.is_empty() {
        let mut builder = Builder::default();
        builder.push_record(["Type", "Ideal range"]);
        for row in ranges {
            builder.push_record(row);
        }
        let mut table = builder.build();
        style::apply_table_style(&mut table);
        output.push_str(&format!("\n{}\n", table));
    }

    if !health.alert_messages.is_empty() {
        output.push('\n');
        for message in &health.alert_messages {
            output.push_str(&style::format_warning(message, opts.no_color));
            output.push('\n');
        }
    }

    if !sensors.is_empty() {
        output.push('\n');
        output.push_str(&sensor_table(sensors, opts));
    }

    output
}

#[must_use]
pub fn format_options_text(options: &PlantOptions, opts: &FormatOptions) -> String {
    let join = |items: &[String]| {
        if items.is_empty() {
            "-".to_string()
        } else {
            items.join(", ")
        }
    };
    let types: Vec<String> = options.types.iter().map(|t| t.to_string()).collect();
    let label = |text: &str| {
        if opts.no_color {
            text.to_string()
        } else {
            format!("{}", text.bold())
        }
    };
    format!(
        "{}   {}\n{} {}\n{}     {}\n{}     {}\n",
        label("Species:"),
        join(&options.species),
        label("Locations:"),
        join(&options.locations),
        label("Types:"),
        join(&types),
        label("Units:"),
        join(&options.units),
    )
}

// ============================================================================
// Sensors
// ============================================================================

fn sensor_table(sensors: &[SensorStatusView], opts: &FormatOptions) -> String {
    let mut builder = Builder::default();
    builder.push_record(["ID", "Hardware", "Name", "Type", "Plant", "Status", "Last reading"]);
    for view in sensors {
        let sensor = &view.sensor;
        let last = view
            .last_reading
            .as_ref()
            .map(|r| {
                format!(
                    "{} {}",
                    format_value(r.value, &sensor.unit),
                    style::format_reading_status(r.status, opts.no_color)
                )
            })
            .unwrap_or_else(|| "-".to_string());
        builder.push_record([
            sensor.id.to_string(),
            sensor.hardware_id.clone(),
            sensor.name.clone(),
            sensor.measurement.to_string(),
            sensor
                .plant_id
                .map(|id| id.to_string())
                .unwrap_or_else(|| "-".to_string()),
            style::format_sensor_status(view.health.status, opts.no_color),
            last,
        ]);
    }
    let mut table = builder.build();
    style::apply_table_style(&mut table);
    format!("{}\n", table)
}

#[must_use]
pub fn format_sensor_list_text(page: &Page<SensorStatusView>, opts: &FormatOptions) -> String {
    if page.data.is_empty() {
        return "No sensors found.\n".to_string();
    }
    format!(
        "{}{}",
        sensor_table(&page.data, opts),
        format_page_footer(&page.meta)
    )
}

#[must_use]
pub fn format_sensor_text(
    view: &SensorStatusView,
    readings: &[Reading],
    now: OffsetDateTime,
    opts: &FormatOptions,
) -> String {
    let sensor = &view.sensor;
    let mut output = format!(
        "{}\n\n",
        style::format_title(
            &format!("{} ({})", sensor.name, sensor.hardware_id),
            opts.no_color
        )
    );
    output.push_str(&format!(
        "Status:    {}\n",
        style::format_sensor_status(view.health.status, opts.no_color)
    ));
    output.push_str(&format!("Type:      {}\n", sensor.measurement));
    if !sensor.unit.is_empty() {
        output.push_str(&format!("Unit:      {}\n", sensor.unit));
    }
    if let Some(plant_id) = sensor.plant_id {
        output.push_str(&format!("Plant:     #{}\n", plant_id));
    }
    output.push_str(&format!(
        "Interval:  {}s{}\n",
        sensor.reading_interval_secs,
        if sensor.alerts_enabled {
            ""
        } else {
            " (alerts off)"
        }
    ));
    if let Some(reading) = &view.last_reading {
        output.push_str(&format!(
            "Last seen: {}\n",
            format_age(reading.created_at, now)
        ));
    }
    for message in &view.health.alert_messages {
        output.push_str(&style::format_warning(message, opts.no_color));
        output.push('\n');
    }

    output.push('\n');
    output.push_str(&format_readings_text(readings, &sensor.unit, opts));
    output
}

#[must_use]
pub fn format_readings_text(readings: &[Reading], unit: &str, opts: &FormatOptions) -> String {
    if readings.is_empty() {
        return "No readings recorded.\n".to_string();
    }
    let mut builder = Builder::default();
    builder.push_record(["Time", "Value", "Status"]);
    for reading in readings {
        builder.push_record([
            format_time(reading.created_at),
            format_value(reading.value, unit),
            style::format_reading_status(reading.status, opts.no_color),
        ]);
    }
    let mut table = builder.build();
    style::apply_table_style(&mut table);
    format!("{}\n", table)
}

#[must_use]
pub fn format_ingest_text(outcome: &IngestOutcome, unit: &str, opts: &FormatOptions) -> String {
    let reading = &outcome.reading;
    let mut output = format!(
        "{}\n",
        style::format_success(
            &format!(
                "Recorded {} for sensor #{} {}",
                format_value(reading.value, unit),
                reading.sensor_id,
                style::format_reading_status(reading.status, opts.no_color)
            ),
            opts.no_color
        )
    );
    for alert in &outcome.alerts {
        output.push_str(&style::format_warning(
            &format!(
                "Alert #{} fired: {} ({})",
                alert.id,
                alert.title,
                style::format_severity(alert.severity, opts.no_color)
            ),
            opts.no_color,
        ));
        output.push('\n');
    }
    output
}

// ============================================================================
// Rules and alerts
// ============================================================================

#[must_use]
pub fn format_rules_text(rules: &[AlertRule], opts: &FormatOptions) -> String {
    if rules.is_empty() {
        return "No alert rules defined.\n".to_string();
    }
    let mut builder = Builder::default();
    builder.push_record(["ID", "Name", "Type", "Condition", "Severity", "Sensors", "Enabled"]);
    for rule in rules {
        let condition = match rule.threshold {
            Some(threshold) => format!(
                "{} {}",
                rule.condition,
                format_value(threshold, rule.unit.as_deref().unwrap_or(""))
            ),
            None => rule.condition.to_string(),
        };
        let sensors: Vec<String> = rule.sensor_ids.iter().map(|id| id.to_string()).collect();
        builder.push_record([
            rule.id.to_string(),
            rule.name.clone(),
            rule.measurement.to_string(),
            condition,
            style::format_severity(rule.severity, opts.no_color),
            sensors.join(", "),
            if rule.enabled { "yes" } else { "no" }.to_string(),
        ]);
    }
    let mut table = builder.build();
    style::apply_table_style(&mut table);
    format!("{}\n", table)
}

#[must_use]
pub fn format_alerts_text(alerts: &[Alert], opts: &FormatOptions) -> String {
    if alerts.is_empty() {
        return "No alerts found.\n".to_string();
    }
    let mut builder = Builder::default();
    builder.push_record(["ID", "Fired", "Title", "Severity", "Sensor", "Value", "Status"]);
    for alert in alerts {
        builder.push_record([
            alert.id.to_string(),
            format_time(alert.fired_at),
            alert.title.clone(),
            style::format_severity(alert.severity, opts.no_color),
            alert.sensor_id.to_string(),
            alert
                .value
                .map(|v| format_value(v, alert.unit.as_deref().unwrap_or("")))
                .unwrap_or_else(|| "-".to_string()),
            style::format_alert_status(alert.status, opts.no_color),
        ]);
    }
    let mut table = builder.build();
    style::apply_table_style(&mut table);
    format!("{}\n", table)
}

#[must_use]
pub fn format_alert_text(alert: &Alert, opts: &FormatOptions) -> String {
    let mut output = format!(
        "{}\n\n",
        style::format_title(&format!("Alert #{}: {}", alert.id, alert.title), opts.no_color)
    );
    output.push_str(&format!(
        "Status:    {}\n",
        style::format_alert_status(alert.status, opts.no_color)
    ));
    output.push_str(&format!(
        "Severity:  {}\n",
        style::format_severity(alert.severity, opts.no_color)
    ));
    if let Some(description) = &alert.description {
        output.push_str(&format!("Details:   {}\n", description));
    }
    output.push_str(&format!("Sensor:    #{}\n", alert.sensor_id));
    if let Some(plant_id) = alert.plant_id {
        output.push_str(&format!("Plant:     #{}\n", plant_id));
    }
    if let Some(comment) = &alert.resolved_comment {
        output.push_str(&format!("Comment:   {}\n", comment));
    }

    output.push_str("\nTimeline:\n");
    for event in &alert.events {
        let by = event
            .by
            .map(|user| format!(" by user {}", user))
            .unwrap_or_default();
        output.push_str(&format!(
            "  {}  {}{}\n",
            format_time(event.at),
            event.title,
            by
        ));
        if let Some(message) = &event.message {
            output.push_str(&format!("      {}\n", message));
        }
    }
    output
}
