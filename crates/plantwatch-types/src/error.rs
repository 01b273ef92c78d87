//! Error types for parsing plantwatch domain values.

use thiserror::Error;

/// Errors that can occur when parsing plantwatch enumerations from their
/// textual representation (database columns, CLI arguments, JSON payloads).
///
/// This enum is marked `#[non_exhaustive]` to allow adding new error variants
/// in future versions without breaking downstream code.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum ParseError {
    /// Unknown reading classification.
    #[error("Unknown reading status: {0}")]
    UnknownReadingStatus(String),

    /// Unknown sensor or plant status.
    #[error("Unknown sensor status: {0} (expected OFFLINE, ONLINE or EM ALERTA)")]
    UnknownSensorStatus(String),

    /// Unknown alert rule condition.
    #[error("Unknown alert condition: {0}")]
    UnknownCondition(String),

    /// Unknown alert severity.
    #[error("Unknown alert severity: {0}")]
    UnknownSeverity(String),

    /// Unknown alert lifecycle status.
    #[error("Unknown alert status: {0}")]
    UnknownAlertStatus(String),

    /// A measurement type key was empty after trimming.
    #[error("Measurement type must not be empty")]
    EmptyMeasurementType,
}

/// Result type alias using plantwatch-types' ParseError type.
pub type ParseResult<T> = std::result::Result<T, ParseError>;
