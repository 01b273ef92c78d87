//! Error types for plantwatch-store.

use std::path::PathBuf;

/// Result type for plantwatch-store operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in plantwatch-store.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    /// Database error from SQLite.
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// Failed to create database directory.
    #[error("Failed to create database directory {path}: {source}")]
    CreateDirectory {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Plant not found (or not visible to the caller).
    #[error("Plant not found: {0}")]
    PlantNotFound(i64),

    /// Sensor not found (or not visible to the caller).
    #[error("Sensor not found: {0}")]
    SensorNotFound(String),

    /// Alert rule not found.
    #[error("Alert rule not found: {0}")]
    RuleNotFound(i64),

    /// Alert not found.
    #[error("Alert not found: {0}")]
    AlertNotFound(i64),

    /// Another sensor already uses this hardware identifier.
    #[error("Hardware id already registered: {0}")]
    HardwareIdConflict(String),

    /// The alert was already resolved.
    #[error("Alert {0} is already resolved")]
    AlertAlreadyResolved(i64),

    /// Configuration rejected by validation.
    #[error(transparent)]
    Validation(#[from] plantwatch_core::Error),

    /// Reading values must be finite.
    #[error("Reading value must be a finite number, got {0}")]
    NonFiniteValue(f64),

    /// Invalid timestamp.
    #[error("Invalid timestamp: {0}")]
    InvalidTimestamp(String),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Whether this error means the requested entity does not exist.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            Error::PlantNotFound(_)
                | Error::SensorNotFound(_)
                | Error::RuleNotFound(_)
                | Error::AlertNotFound(_)
        )
    }
}
