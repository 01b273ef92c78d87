//! Plant command - manage plants and report their health.

use anyhow::Result;
use time::OffsetDateTime;
use tracing::info;

use plantwatch_store::{NewPlant, PlantQuery, PlantUpdate, SensorQuery, SortOrder};
use plantwatch_types::{IdealRange, Plant};

use crate::cli::{LegacyArgs, PlantAction};
use crate::format::{format_options_text, format_plant_list_text, format_plant_text};

use super::CommandContext;

/// Execute the plant command.
pub fn cmd_plant(ctx: &CommandContext, action: PlantAction) -> Result<()> {
    match action {
        PlantAction::Add {
            name,
            species,
            location,
            notes,
            legacy,
            ranges,
        } => {
            let mut new = NewPlant::new(ctx.user_id, name);
            new.species = species;
            new.location = location;
            new.notes = notes;
            new.ideal_ranges = ranges.into_iter().map(IdealRange::from).collect();
            let LegacyArgs {
                temperature,
                humidity,
                ph,
                light,
            } = legacy;
            new.temperature = temperature.map(Into::into).unwrap_or_default();
            new.humidity = humidity.map(Into::into).unwrap_or_default();
            new.ph = ph.map(Into::into).unwrap_or_default();
            new.light = light.map(Into::into).unwrap_or_default();

            let plant = ctx.store.create_plant(new)?;
            info!("Created plant {} ({})", plant.id, plant.name);
            ctx.emit(&plant, || {
                format!("Created plant #{}: {}\n", plant.id, plant.name)
            })
        }
        PlantAction::List {
            name,
            species,
            location,
            status,
            desc,
            page,
            limit,
        } => {
            let mut query = PlantQuery::new().owner(ctx.user_id).page(page).limit(limit);
            if let Some(name) = &name {
                query = query.name(name);
            }
            if let Some(species) = &species {
                query = query.species(species);
            }
            if let Some(location) = &location {
                query = query.location(location);
            }
            if let Some(status) = status {
                query = query.status(status);
            }
            if desc {
                query = query.order(SortOrder::Desc);
            }

            let page = ctx.store.list_plants(&query, OffsetDateTime::now_utc())?;
            ctx.emit(&page, || format_plant_list_text(&page, &ctx.opts))
        }
        PlantAction::Show { id } => {
            owned_plant(ctx, id)?;
            let now = OffsetDateTime::now_utc();
            let view = ctx.store.plant_status(id, now)?;
            let sensors = ctx
                .store
                .list_sensors(
                    &SensorQuery::new()
                        .owner(ctx.user_id)
                        .plant(id)
                        .limit(u32::MAX),
                    now,
                )?
                .data;
            ctx.emit(&view, || format_plant_text(&view, &sensors, &ctx.opts))
        }
        PlantAction::Update {
            id,
            name,
            species,
            location,
            notes,
            legacy,
            ranges,
            clear_ranges,
        } => {
            owned_plant(ctx, id)?;
            let ideal_ranges = if clear_ranges {
                Some(Vec::new())
            } else if ranges.is_empty() {
                None
            } else {
                Some(ranges.into_iter().map(IdealRange::from).collect())
            };
            let update = PlantUpdate {
                name,
                species,
                location,
                temperature: legacy.temperature.map(Into::into),
                humidity: legacy.humidity.map(Into::into),
                ph: legacy.ph.map(Into::into),
                light: legacy.light.map(Into::into),
                ideal_ranges,
                notes,
                notes_conditions: None,
            };
            let plant = ctx.store.update_plant(id, update)?;
            info!("Updated plant {}", plant.id);
            ctx.emit(&plant, || format!("Updated plant #{}: {}\n", plant.id, plant.name))
        }
        PlantAction::Remove { id } => {
            let plant = owned_plant(ctx, id)?;
            ctx.store.delete_plant(id)?;
            info!("Deleted plant {}", id);
            ctx.emit(&plant, || format!("Deleted plant #{}: {}\n", plant.id, plant.name))
        }
        PlantAction::Options => {
            let options = ctx.store.plant_options()?;
            ctx.emit(&options, || format_options_text(&options, &ctx.opts))
        }
    }
}

/// Load a plant owned by the current user.
fn owned_plant(ctx: &CommandContext, id: i64) -> Result<Plant> {
    let plant = ctx.store.get_plant(id)?;
    ctx.check_owner(plant.owner_id, || format!("Plant not found: {}", id))?;
    Ok(plant)
}
