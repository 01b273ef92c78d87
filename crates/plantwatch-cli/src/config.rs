//! Configuration file management.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use plantwatch_core::{DEFAULT_EQUALS_TOLERANCE, RuleEvaluator};

use crate::cli::OutputFormat;

/// Environment variable that overrides the config file location.
pub const CONFIG_ENV: &str = "PLANTWATCH_CONFIG";

/// Seconds between `watch` reports when neither the flag nor the config sets one.
pub const DEFAULT_WATCH_INTERVAL: u64 = 30;

/// Configuration file structure
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Database file
    #[serde(default)]
    pub database: Option<PathBuf>,

    /// User that owns created plants, sensors and rules
    #[serde(default = "default_user_id")]
    pub user_id: i64,

    /// Default output format ("text" or "json")
    #[serde(default)]
    pub format: Option<String>,

    /// Disable colored output
    #[serde(default)]
    pub no_color: bool,

    /// Absolute tolerance for EQUALS rules
    #[serde(default)]
    pub equals_tolerance: Option<f64>,

    /// Seconds between `watch` reports
    #[serde(default)]
    pub watch_interval: Option<u64>,
}

fn default_user_id() -> i64 {
    1
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database: None,
            user_id: default_user_id(),
            format: None,
            no_color: false,
            equals_tolerance: None,
            watch_interval: None,
        }
    }
}

impl Config {
    /// Config file path, honoring `PLANTWATCH_CONFIG`.
    pub fn path() -> PathBuf {
        if let Ok(path) = std::env::var(CONFIG_ENV)
            && !path.is_empty()
        {
            return PathBuf::from(path);
        }
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("plantwatch")
            .join("config.toml")
    }

    /// Load config from file, or return default if not found
    pub fn load() -> Self {
        Self::load_from(&Self::path())
    }

    /// Load config from `path`. A missing or unreadable file yields the default.
    pub fn load_from(path: &Path) -> Self {
        if path.exists() {
            match fs::read_to_string(path) {
                Ok(content) => match toml::from_str(&content) {
                    Ok(config) => return config,
                    Err(e) => {
                        eprintln!("Warning: Failed to parse config: {}", e);
                    }
                },
                Err(e) => {
                    eprintln!("Warning: Failed to read config: {}", e);
                }
            }
        }
        Self::default()
    }

    /// Save config to file
    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::path())
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }
        let content = toml::to_string_pretty(self).context("Failed to serialize config")?;
        fs::write(path, content)
            .with_context(|| format!("Failed to write config: {}", path.display()))?;
        Ok(())
    }

    /// Database path: the `--db` flag, then the config, then the platform default.
    pub fn database_path(&self, flag: Option<&Path>) -> PathBuf {
        flag.map(Path::to_path_buf)
            .or_else(|| self.database.clone())
            .unwrap_or_else(plantwatch_store::default_db_path)
    }

    /// Rule evaluator with the configured EQUALS tolerance.
    pub fn rule_evaluator(&self) -> RuleEvaluator {
        match self.equals_tolerance {
            Some(tolerance) if tolerance.is_finite() && tolerance >= 0.0 => {
                RuleEvaluator::new(tolerance)
            }
            Some(tolerance) => {
                eprintln!(
                    "Warning: Ignoring invalid equals_tolerance {}, using {}",
                    tolerance, DEFAULT_EQUALS_TOLERANCE
                );
                RuleEvaluator::default()
            }
            None => RuleEvaluator::default(),
        }
    }

    /// Output format: `--json` wins, then the config value, then text.
    pub fn output_format(&self, json_flag: bool) -> OutputFormat {
        if json_flag {
            return OutputFormat::Json;
        }
        match self.format.as_deref().map(str::parse::<OutputFormat>) {
            Some(Ok(format)) => format,
            Some(Err(e)) => {
                eprintln!("Warning: {}", e);
                OutputFormat::Text
            }
            None => OutputFormat::Text,
        }
    }

    /// Watch interval: the flag, then the config, then the default.
    pub fn watch_interval(&self, flag: Option<u64>) -> u64 {
        flag.or(self.watch_interval)
            .unwrap_or(DEFAULT_WATCH_INTERVAL)
            .max(1)
    }
}
