//! Alert command - list, inspect and resolve fired alerts.

use anyhow::Result;
use time::OffsetDateTime;
use tracing::info;

use plantwatch_store::AlertQuery;
use plantwatch_types::Alert;

use crate::cli::AlertAction;
use crate::format::{format_alert_text, format_alerts_text};

use super::CommandContext;

/// Execute the alert command.
pub fn cmd_alert(ctx: &CommandContext, action: AlertAction) -> Result<()> {
    match action {
        AlertAction::List {
            active,
            sensor,
            plant,
            min_severity,
            limit,
        } => {
            let mut query = AlertQuery::new().owner(ctx.user_id).limit(limit);
            if active {
                query = query.active();
            }
            if let Some(reference) = sensor {
                query = query.sensor(ctx.resolve_sensor(&reference)?.id);
            }
            if let Some(plant_id) = plant {
                query = query.plant(plant_id);
            }
            if let Some(severity) = min_severity {
                query = query.min_severity(severity);
            }
            let alerts = ctx.store.list_alerts(&query)?;
            ctx.emit(&alerts, || format_alerts_text(&alerts, &ctx.opts))
        }
        AlertAction::Show { id } => {
            let alert = owned_alert(ctx, id)?;
            ctx.emit(&alert, || format_alert_text(&alert, &ctx.opts))
        }
        AlertAction::Resolve { id, comment } => {
            owned_alert(ctx, id)?;
            let alert = ctx.store.resolve_alert(
                id,
                ctx.user_id,
                comment.as_deref(),
                OffsetDateTime::now_utc(),
            )?;
            info!("Resolved alert {}", id);
            ctx.emit(&alert, || format!("Resolved alert #{}: {}\n", alert.id, alert.title))
        }
    }
}

fn owned_alert(ctx: &CommandContext, id: i64) -> Result<Alert> {
    let alert = ctx.store.get_alert(id)?;
    ctx.check_owner(alert.owner_id, || format!("Alert not found: {}", id))?;
    Ok(alert)
}
