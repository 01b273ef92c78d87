//! Sensor command - register sensors and inspect their readings.

use anyhow::Result;
use serde::Serialize;
use time::OffsetDateTime;
use tracing::info;

use plantwatch_store::{NewSensor, ReadingQuery, SensorQuery, SensorStatusView, SortOrder};
use plantwatch_types::Reading;

use crate::cli::SensorAction;
use crate::format::{format_sensor_list_text, format_sensor_text};

use super::CommandContext;

#[derive(Serialize)]
struct SensorDetail<'a> {
    #[serde(flatten)]
    view: &'a SensorStatusView,
    readings: &'a [Reading],
}

/// Execute the sensor command.
pub fn cmd_sensor(ctx: &CommandContext, action: SensorAction) -> Result<()> {
    match action {
        SensorAction::Add {
            hardware_id,
            name,
            measurement,
            unit,
            plant,
            location,
            interval,
            no_alerts,
        } => {
            let mut new = NewSensor::new(hardware_id, name, measurement)
                .with_unit(unit)
                .with_interval(interval)
                .with_alerts(!no_alerts);
            new.location = location;
            if let Some(plant_id) = plant {
                let owner = ctx.store.get_plant(plant_id)?.owner_id;
                ctx.check_owner(owner, || format!("Plant not found: {}", plant_id))?;
                new = new.with_plant(plant_id);
            }

            let sensor = ctx.store.create_sensor(ctx.user_id, new)?;
            info!(
                "Registered sensor {} ({}) as {}",
                sensor.id, sensor.hardware_id, sensor.measurement
            );
            ctx.emit(&sensor, || {
                format!(
                    "Registered sensor #{}: {} ({})\n",
                    sensor.id, sensor.name, sensor.hardware_id
                )
            })
        }
        SensorAction::List {
            plant,
            name,
            measurement,
            plant_name,
            status,
            desc,
            page,
            limit,
        } => {
            let mut query = SensorQuery::new().owner(ctx.user_id).page(page).limit(limit);
            if let Some(plant_id) = plant {
                query = query.plant(plant_id);
            }
            if let Some(name) = &name {
                query = query.name(name);
            }
            if let Some(measurement) = measurement {
                query = query.measurement(measurement);
            }
            if let Some(plant_name) = &plant_name {
                query = query.plant_name(plant_name);
            }
            if let Some(status) = status {
                query = query.status(status);
            }
            if desc {
                query = query.order(SortOrder::Desc);
            }

            let page = ctx.store.list_sensors(&query, OffsetDateTime::now_utc())?;
            ctx.emit(&page, || format_sensor_list_text(&page, &ctx.opts))
        }
        SensorAction::Show { sensor, readings } => {
            let sensor = ctx.resolve_sensor(&sensor)?;
            let now = OffsetDateTime::now_utc();
            let view = ctx.store.sensor_status(sensor.id, now)?;
            let recent = ctx
                .store
                .query_readings(&ReadingQuery::new().sensor(sensor.id).limit(readings))?;
            let detail = SensorDetail {
                view: &view,
                readings: &recent,
            };
            ctx.emit(&detail, || format_sensor_text(&view, &recent, now, &ctx.opts))
        }
        SensorAction::Remove { sensor } => {
            let sensor = ctx.resolve_sensor(&sensor)?;
            ctx.store.delete_sensor(sensor.id)?;
            info!("Deleted sensor {} ({})", sensor.id, sensor.hardware_id);
            ctx.emit(&sensor, || {
                format!("Deleted sensor #{}: {}\n", sensor.id, sensor.name)
            })
        }
    }
}
