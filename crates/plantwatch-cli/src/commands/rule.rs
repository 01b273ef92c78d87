//! Rule command - manage user-defined alert rules.

use anyhow::Result;
use tracing::info;

use plantwatch_store::NewAlertRule;

use crate::cli::RuleAction;
use crate::format::format_rules_text;

use super::CommandContext;

/// Execute the rule command.
pub fn cmd_rule(ctx: &CommandContext, action: RuleAction) -> Result<()> {
    match action {
        RuleAction::Add {
            name,
            measurement,
            condition,
            threshold,
            severity,
            unit,
            description,
            sensors,
        } => {
            let sensor_ids = sensors
                .iter()
                .map(|reference| ctx.resolve_sensor(reference).map(|s| s.id))
                .collect::<Result<Vec<_>>>()?;
            let mut new = NewAlertRule::new(name, measurement, condition, threshold)
                .with_severity(severity)
                .with_sensors(sensor_ids);
            new.unit = unit;
            new.description = description;

            let rule = ctx.store.create_rule(ctx.user_id, new)?;
            info!(
                "Created rule {} ({} {}) on {} sensor(s)",
                rule.id,
                rule.measurement,
                rule.condition,
                rule.sensor_ids.len()
            );
            ctx.emit(&rule, || format!("Created rule #{}: {}\n", rule.id, rule.name))
        }
        RuleAction::List => {
            let rules = ctx.store.list_rules(ctx.user_id)?;
            ctx.emit(&rules, || format_rules_text(&rules, &ctx.opts))
        }
        RuleAction::Remove { id } => {
            let rule = ctx.store.get_rule(id)?;
            ctx.check_owner(rule.owner_id, || format!("Alert rule not found: {}", id))?;
            ctx.store.delete_rule(id)?;
            info!("Deleted rule {}", id);
            ctx.emit(&rule, || format!("Deleted rule #{}: {}\n", rule.id, rule.name))
        }
    }
}
