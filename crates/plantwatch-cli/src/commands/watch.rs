//! Watch command - periodically report a plant's status.

use std::time::Duration;

use anyhow::Result;
use owo_colors::OwoColorize;
use time::OffsetDateTime;
use tracing::debug;

use plantwatch_store::PlantStatusView;

use crate::cli::OutputFormat;
use crate::format::{FormatOptions, format_time};
use crate::style;

use super::CommandContext;

/// Arguments for the watch command.
pub struct WatchArgs {
    pub plant_id: i64,
    pub interval: u64,
    pub count: u32,
}

/// One status line: time, status badge, counts and breach messages.
fn format_watch_line(view: &PlantStatusView, now: OffsetDateTime, opts: &FormatOptions) -> String {
    let health = &view.health;
    let mut line = format!(
        "[{}] {} {}/{} online",
        format_time(now),
        style::format_sensor_status(health.status, opts.no_color),
        health.online_count,
        health.sensors_count
    );
    if !health.alert_messages.is_empty() {
        line.push_str(" | ");
        line.push_str(&health.alert_messages.join("; "));
    }
    line.push('\n');
    line
}

pub async fn cmd_watch(ctx: &CommandContext, args: WatchArgs) -> Result<()> {
    let WatchArgs {
        plant_id,
        interval,
        count,
    } = args;

    let plant = ctx.store.get_plant(plant_id)?;
    ctx.check_owner(plant.owner_id, || format!("Plant not found: {}", plant_id))?;

    if !ctx.quiet {
        let header = if ctx.opts.no_color {
            format!("Watching: {} (#{})", plant.name, plant.id)
        } else {
            format!("Watching: {} (#{})", plant.name.green(), plant.id)
        };
        eprintln!("{}", header);
        if count > 0 {
            eprintln!(
                "Interval: {}s | Count: {} | Press Ctrl+C to stop",
                interval, count
            );
        } else {
            eprintln!("Interval: {}s | Press Ctrl+C to stop", interval);
        }
        eprintln!("{}", "-".repeat(50));
    }

    let mut reports = 0u32;
    loop {
        let now = OffsetDateTime::now_utc();
        let view = ctx.store.plant_status(plant_id, now)?;
        debug!(
            "Plant {} status {} ({} breaches)",
            plant_id, view.health.status, view.health.alert_count
        );
        match ctx.format {
            OutputFormat::Json => {
                let opts = FormatOptions {
                    compact: true,
                    ..ctx.opts
                };
                print!("{}", opts.as_json(&view)?);
            }
            OutputFormat::Text => print!("{}", format_watch_line(&view, now, &ctx.opts)),
        }
        reports += 1;

        if count > 0 && reports >= count {
            return Ok(());
        }

        // Wait for next interval with graceful shutdown support
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                eprintln!("\nShutting down...");
                return Ok(());
            }
            _ = tokio::time::sleep(Duration::from_secs(interval)) => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use plantwatch_core::PlantHealth;
    use plantwatch_types::{Plant, SensorStatus};
    use time::macros::datetime;

    #[test]
    fn test_watch_line_lists_breaches() {
        let view = PlantStatusView {
            plant: Plant::new(1, "Tomato"),
            health: PlantHealth {
                status: SensorStatus::InAlert,
                alert_messages: vec!["Temperatura alta no sensor Air: 31".into()],
                last_values: Default::default(),
                sensors_count: 2,
                online_count: 2,
                alert_count: 1,
            },
        };
        let line = format_watch_line(
            &view,
            datetime!(2025-03-10 08:00:00 UTC),
            &FormatOptions::new(true),
        );
        assert_eq!(
            line,
            "[2025-03-10 08:00:00] [EM ALERTA] 2/2 online | Temperatura alta no sensor Air: 31\n"
        );
    }
}
