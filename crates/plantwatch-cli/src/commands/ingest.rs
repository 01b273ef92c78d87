//! Ingest command - record a reading and report fired alerts.

use anyhow::{Context, Result};
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;

use crate::format::format_ingest_text;

use super::CommandContext;

/// Parse an RFC 3339 timestamp, or use the current time.
fn parse_at(at: Option<&str>) -> Result<OffsetDateTime> {
    match at {
        Some(text) => OffsetDateTime::parse(text, &Rfc3339)
            .with_context(|| format!("Invalid timestamp '{}': expected RFC 3339", text)),
        None => Ok(OffsetDateTime::now_utc()),
    }
}

/// Execute the ingest command.
pub fn cmd_ingest(ctx: &CommandContext, sensor: &str, value: f64, at: Option<&str>) -> Result<()> {
    let sensor = ctx.resolve_sensor(sensor)?;
    let at = parse_at(at)?;
    let outcome = ctx.store.ingest_reading(sensor.id, value, at)?;
    ctx.emit(&outcome, || format_ingest_text(&outcome, &sensor.unit, &ctx.opts))
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::datetime;

    #[test]
    fn test_parse_at() {
        assert_eq!(
            parse_at(Some("2025-03-10T08:30:00Z")).unwrap(),
            datetime!(2025-03-10 08:30:00 UTC)
        );
        assert_eq!(
            parse_at(Some("2025-03-10T08:30:00-03:00")).unwrap(),
            datetime!(2025-03-10 11:30:00 UTC)
        );
        assert!(parse_at(Some("yesterday")).is_err());
        assert!(parse_at(None).is_ok());
    }
}
