//! Visual styling utilities for the CLI.
//!
//! Status badges, severity colors and message prefixes shared by every
//! command. Every function takes a `no_color` switch so output stays
//! pipe-friendly.

use owo_colors::OwoColorize;

use plantwatch_types::{AlertSeverity, AlertStatus, ReadingStatus, SensorStatus};

// ============================================================================
// Status Badges
// ============================================================================

/// Format a reading classification as a badge.
#[must_use]
pub fn format_reading_status(status: ReadingStatus, no_color: bool) -> String {
    let label = status.as_str();
    if no_color {
        return format!("[{}]", label);
    }
    match status {
        ReadingStatus::Normal => format!("[{}]", label.green()),
        ReadingStatus::Attention => format!("[{}]", label.yellow()),
        ReadingStatus::Critical => format!("[{}]", label.red().bold()),
    }
}

/// Format a sensor or plant status as a badge.
#[must_use]
pub fn format_sensor_status(status: SensorStatus, no_color: bool) -> String {
    let label = status.as_str();
    if no_color {
        return format!("[{}]", label);
    }
    match status {
        SensorStatus::Online => format!("[{}]", label.green()),
        SensorStatus::InAlert => format!("[{}]", label.red().bold()),
        SensorStatus::Offline => format!("[{}]", label.dimmed()),
    }
}

/// Format an alert severity.
#[must_use]
pub fn format_severity(severity: AlertSeverity, no_color: bool) -> String {
    let label = severity.as_str();
    if no_color {
        return label.to_string();
    }
    match severity {
        AlertSeverity::Low => format!("{}", label.cyan()),
        AlertSeverity::Medium => format!("{}", label.yellow()),
        // Orange (RGB: 255, 165, 0)
        AlertSeverity::High => format!("{}", label.truecolor(255, 165, 0)),
        AlertSeverity::Critical => format!("{}", label.red().bold()),
    }
}

/// Format an alert lifecycle state.
#[must_use]
pub fn format_alert_status(status: AlertStatus, no_color: bool) -> String {
    let label = status.as_str();
    if no_color {
        return label.to_string();
    }
    match status {
        AlertStatus::Active => format!("{}", label.red()),
        AlertStatus::Resolved => format!("{}", label.green()),
    }
}

// ============================================================================
// Messages
// ============================================================================

/// Format a success message.
pub fn format_success(message: &str, no_color: bool) -> String {
    if no_color {
        format!("[OK] {}", message)
    } else {
        format!("{} {}", "[OK]".green(), message)
    }
}

/// Format a warning message.
pub fn format_warning(message: &str, no_color: bool) -> String {
    if no_color {
        format!("[!!] {}", message)
    } else {
        format!("{} {}", "[!!]".yellow(), message)
    }
}

/// Format a title header.
pub fn format_title(title: &str, no_color: bool) -> String {
    let rule = "━".repeat(title.chars().count());
    if no_color {
        format!("{}\n{}", title, rule)
    } else {
        format!("{}\n{}", title.bold(), rule.dimmed())
    }
}

/// Apply the standard table style.
pub fn apply_table_style(table: &mut tabled::Table) {
    use tabled::settings::Style;
    table.with(Style::rounded());
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_color_badges_are_plain() {
        assert_eq!(
            format_reading_status(ReadingStatus::Critical, true),
            "[CRITICAL]"
        );
        assert_eq!(
            format_sensor_status(SensorStatus::InAlert, true),
            "[EM ALERTA]"
        );
        assert_eq!(format_severity(AlertSeverity::High, true), "HIGH");
        assert_eq!(format_alert_status(AlertStatus::Resolved, true), "RESOLVED");
    }

    #[test]
    fn test_colored_badges_contain_escape_codes() {
        let badge = format_sensor_status(SensorStatus::Online, false);
        assert!(badge.contains("\u{1b}["));
        assert!(badge.contains("ONLINE"));
    }

    #[test]
    fn test_messages() {
        assert_eq!(format_success("done", true), "[OK] done");
        assert_eq!(format_warning("careful", true), "[!!] careful");
        assert_eq!(format_title("Plants", true), "Plants\n━━━━━━");
    }
}
