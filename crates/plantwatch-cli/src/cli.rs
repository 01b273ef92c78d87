//! CLI argument definitions using clap.

use std::path::PathBuf;
use std::str::FromStr;

use clap::{Parser, Subcommand, ValueEnum};

use plantwatch_types::{
    AlertCondition, AlertSeverity, IdealRange, LegacyRange, MeasurementType, SensorStatus,
};

/// Output format for commands
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "text" => Ok(OutputFormat::Text),
            "json" => Ok(OutputFormat::Json),
            other => Err(format!("unknown output format '{other}' (expected text or json)")),
        }
    }
}

/// Bounds written as `MIN..MAX[:UNIT]`. Either side may be left empty.
#[derive(Debug, Clone, PartialEq)]
pub struct BoundsArg {
    pub min: Option<f64>,
    pub max: Option<f64>,
    pub unit: Option<String>,
}

fn parse_side(text: &str) -> Result<Option<f64>, String> {
    let text = text.trim();
    if text.is_empty() {
        return Ok(None);
    }
    text.parse()
        .map(Some)
        .map_err(|_| format!("'{text}' is not a number"))
}

impl FromStr for BoundsArg {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (bounds, unit) = match s.split_once(':') {
            Some((bounds, unit)) if !unit.trim().is_empty() => {
                (bounds, Some(unit.trim().to_string()))
            }
            Some((bounds, _)) => (bounds, None),
            None => (s, None),
        };
        let (min, max) = bounds
            .split_once("..")
            .ok_or_else(|| format!("expected MIN..MAX[:UNIT], got '{s}'"))?;
        Ok(Self {
            min: parse_side(min)?,
            max: parse_side(max)?,
            unit,
        })
    }
}

impl From<BoundsArg> for LegacyRange {
    fn from(arg: BoundsArg) -> Self {
        LegacyRange {
            min: arg.min,
            max: arg.max,
            unit: arg.unit,
        }
    }
}

/// Ideal range written as `TYPE=MIN..MAX[:UNIT]`, e.g. `co2=400..1200:ppm`.
#[derive(Debug, Clone, PartialEq)]
pub struct RangeArg {
    pub measurement: MeasurementType,
    pub bounds: BoundsArg,
}

impl FromStr for RangeArg {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (measurement, bounds) = s
            .split_once('=')
            .ok_or_else(|| format!("expected TYPE=MIN..MAX[:UNIT], got '{s}'"))?;
        Ok(Self {
            measurement: measurement.parse().map_err(|e| format!("{e}"))?,
            bounds: bounds.parse()?,
        })
    }
}

impl From<RangeArg> for IdealRange {
    fn from(arg: RangeArg) -> Self {
        IdealRange::new(
            arg.measurement,
            arg.bounds.unit.unwrap_or_default(),
            arg.bounds.min,
            arg.bounds.max,
        )
    }
}

#[derive(Parser)]
#[command(name = "plantwatch")]
#[command(author, version, about = "Monitor plants through their sensors", long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Suppress non-essential output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Output as JSON (shorthand for format = "json" in the config)
    #[arg(long, global = true)]
    pub json: bool,

    /// Disable colored output
    #[arg(long, global = true, env = "NO_COLOR")]
    pub no_color: bool,

    /// Database file (defaults to the config value, then the platform data dir)
    #[arg(long, global = true, env = "PLANTWATCH_DB")]
    pub db: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

/// Legacy per-type bounds shared by `plant add` and `plant update`.
#[derive(Debug, Clone, Default, clap::Args)]
pub struct LegacyArgs {
    /// Temperature bounds, MIN..MAX[:UNIT]
    #[arg(long, allow_hyphen_values = true)]
    pub temperature: Option<BoundsArg>,

    /// Humidity bounds, MIN..MAX[:UNIT]
    #[arg(long)]
    pub humidity: Option<BoundsArg>,

    /// pH bounds, MIN..MAX[:UNIT]
    #[arg(long)]
    pub ph: Option<BoundsArg>,

    /// Luminosity bounds, MIN..MAX[:UNIT]
    #[arg(long)]
    pub light: Option<BoundsArg>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Manage plants
    Plant {
        #[command(subcommand)]
        action: PlantAction,
    },

    /// Manage sensors
    Sensor {
        #[command(subcommand)]
        action: SensorAction,
    },

    /// Record a reading for a sensor (by hardware id or numeric id)
    Ingest {
        /// Sensor hardware id or numeric id
        sensor: String,

        /// Measured value
        #[arg(allow_hyphen_values = true)]
        value: f64,

        /// Reading time as RFC 3339 (defaults to now)
        #[arg(long)]
        at: Option<String>,
    },

    /// Manage alert rules
    Rule {
        #[command(subcommand)]
        action: RuleAction,
    },

    /// Inspect and resolve fired alerts
    Alert {
        #[command(subcommand)]
        action: AlertAction,
    },

    /// Continuously report a plant's status
    Watch {
        /// Plant id
        #[arg(short, long)]
        plant: i64,

        /// Seconds between reports (defaults to the config value, then 30)
        #[arg(short, long)]
        interval: Option<u64>,

        /// Number of reports before exiting (0 = unlimited)
        #[arg(short = 'n', long, default_value = "0")]
        count: u32,
    },

    /// Manage CLI configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
pub enum PlantAction {
    /// Create a plant
    Add {
        /// Display name
        name: String,

        #[arg(long, default_value = "")]
        species: String,

        #[arg(long, default_value = "")]
        location: String,

        #[arg(long)]
        notes: Option<String>,

        #[command(flatten)]
        legacy: LegacyArgs,

        /// Ideal range, TYPE=MIN..MAX[:UNIT] (repeatable)
        #[arg(long = "range")]
        ranges: Vec<RangeArg>,
    },

    /// List plants with their current status
    List {
        /// Name contains
        #[arg(long)]
        name: Option<String>,

        /// Species contains
        #[arg(long)]
        species: Option<String>,

        /// Location contains
        #[arg(long)]
        location: Option<String>,

        /// Only plants with this status (online, offline, em_alerta)
        #[arg(long)]
        status: Option<SensorStatus>,

        /// Sort Z to A
        #[arg(long)]
        desc: bool,

        #[arg(long, default_value = "1")]
        page: u32,

        #[arg(long, default_value = "10")]
        limit: u32,
    },

    /// Show one plant with its status and sensors
    Show { id: i64 },

    /// Update a plant
    Update {
        id: i64,

        #[arg(long)]
        name: Option<String>,

        #[arg(long)]
        species: Option<String>,

        #[arg(long)]
        location: Option<String>,

        #[arg(long)]
        notes: Option<String>,

        #[command(flatten)]
        legacy: LegacyArgs,

        /// Replace the ideal ranges, TYPE=MIN..MAX[:UNIT] (repeatable)
        #[arg(long = "range")]
        ranges: Vec<RangeArg>,

        /// Remove every ideal range
        #[arg(long, conflicts_with = "ranges")]
        clear_ranges: bool,
    },

    /// Delete a plant (its sensors are detached)
    Remove { id: i64 },

    /// Distinct species, locations, types and units
    Options,
}

#[derive(Subcommand)]
pub enum SensorAction {
    /// Register a sensor
    Add {
        /// Globally unique hardware id
        hardware_id: String,

        /// Display name
        name: String,

        /// Measurement type (temperature, humidity, ph, light or any custom key)
        #[arg(short = 't', long = "type")]
        measurement: MeasurementType,

        #[arg(short, long, default_value = "")]
        unit: String,

        /// Plant to attach to
        #[arg(short, long)]
        plant: Option<i64>,

        #[arg(long, default_value = "")]
        location: String,

        /// Expected seconds between readings
        #[arg(long, default_value = "60")]
        interval: u32,

        /// Do not report threshold breaches
        #[arg(long)]
        no_alerts: bool,
    },

    /// List sensors with their current status
    List {
        /// Attached to this plant
        #[arg(short, long)]
        plant: Option<i64>,

        /// Name contains
        #[arg(long)]
        name: Option<String>,

        /// Measurement type
        #[arg(short = 't', long = "type")]
        measurement: Option<MeasurementType>,

        /// Attached plant's name contains
        #[arg(long)]
        plant_name: Option<String>,

        /// Only sensors with this status
        #[arg(long)]
        status: Option<SensorStatus>,

        #[arg(long)]
        desc: bool,

        #[arg(long, default_value = "1")]
        page: u32,

        #[arg(long, default_value = "10")]
        limit: u32,
    },

    /// Show one sensor with its latest readings
    Show {
        /// Sensor hardware id or numeric id
        sensor: String,

        /// Number of recent readings to show
        #[arg(short = 'n', long, default_value = "10")]
        readings: u32,
    },

    /// Delete a sensor and its readings
    Remove {
        /// Sensor hardware id or numeric id
        sensor: String,
    },
}

#[derive(Subcommand)]
pub enum RuleAction {
    /// Create an alert rule
    Add {
        /// Rule name, used as the alert title
        name: String,

        /// Measurement type
        #[arg(short = 't', long = "type")]
        measurement: MeasurementType,

        /// greater_than, less_than, equals or out_of_range
        #[arg(short, long)]
        condition: AlertCondition,

        #[arg(long, allow_hyphen_values = true)]
        threshold: Option<f64>,

        #[arg(long, default_value = "medium")]
        severity: AlertSeverity,

        #[arg(short, long)]
        unit: Option<String>,

        #[arg(short, long)]
        description: Option<String>,

        /// Bound sensor, hardware id or numeric id (repeatable)
        #[arg(short, long = "sensor", required = true)]
        sensors: Vec<String>,
    },

    /// List your alert rules
    List,

    /// Delete a rule (its alerts are kept)
    Remove { id: i64 },
}

#[derive(Subcommand)]
pub enum AlertAction {
    /// List fired alerts, newest first
    List {
        /// Only active alerts
        #[arg(long)]
        active: bool,

        /// Fired by this sensor (hardware id or numeric id)
        #[arg(long)]
        sensor: Option<String>,

        /// For this plant
        #[arg(long)]
        plant: Option<i64>,

        /// At or above this severity
        #[arg(long)]
        min_severity: Option<AlertSeverity>,

        #[arg(long, default_value = "50")]
        limit: u32,
    },

    /// Show an alert with its timeline
    Show { id: i64 },

    /// Resolve an active alert
    Resolve {
        id: i64,

        #[arg(short, long)]
        comment: Option<String>,
    },
}

#[derive(Subcommand)]
pub enum ConfigAction {
    /// Print the effective configuration
    Show,
    /// Print the config file path
    Path,
    /// Write a config file with defaults
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_bounds_arg_parsing() {
        let full: BoundsArg = "18..28:°C".parse().unwrap();
        assert_eq!(full.min, Some(18.0));
        assert_eq!(full.max, Some(28.0));
        assert_eq!(full.unit.as_deref(), Some("°C"));

        let open: BoundsArg = "..1000".parse().unwrap();
        assert_eq!(open.min, None);
        assert_eq!(open.max, Some(1000.0));
        assert_eq!(open.unit, None);

        let negative: BoundsArg = "-5..5".parse().unwrap();
        assert_eq!(negative.min, Some(-5.0));

        assert!("18-28".parse::<BoundsArg>().is_err());
        assert!("a..b".parse::<BoundsArg>().is_err());
    }

    #[test]
    fn test_range_arg_parsing() {
        let range: RangeArg = "co2=400..1200:ppm".parse().unwrap();
        assert_eq!(range.measurement, MeasurementType::Custom("CO2".into()));
        let ideal: IdealRange = range.into();
        assert_eq!(ideal.unit, "ppm");
        assert_eq!(ideal.min, Some(400.0));

        assert!("400..1200".parse::<RangeArg>().is_err());
        assert!("=1..2".parse::<RangeArg>().is_err());
    }

    #[test]
    fn test_parse_ingest_with_negative_value() {
        let cli = Cli::try_parse_from(["plantwatch", "ingest", "T-1", "-3.5"]).unwrap();
        match cli.command {
            Commands::Ingest { sensor, value, at } => {
                assert_eq!(sensor, "T-1");
                assert_eq!(value, -3.5);
                assert!(at.is_none());
            }
            _ => panic!("expected ingest"),
        }
    }

    #[test]
    fn test_parse_rule_add() {
        let cli = Cli::try_parse_from([
            "plantwatch",
            "rule",
            "add",
            "Heat",
            "--type",
            "temperature",
            "--condition",
            "gt",
            "--threshold",
            "30",
            "--sensor",
            "T-1",
            "--sensor",
            "2",
        ])
        .unwrap();
        match cli.command {
            Commands::Rule {
                action:
                    RuleAction::Add {
                        condition,
                        severity,
                        sensors,
                        ..
                    },
            } => {
                assert_eq!(condition, AlertCondition::GreaterThan);
                assert_eq!(severity, AlertSeverity::Medium);
                assert_eq!(sensors, vec!["T-1", "2"]);
            }
            _ => panic!("expected rule add"),
        }
    }

    #[test]
    fn test_parse_plant_list_status() {
        let cli =
            Cli::try_parse_from(["plantwatch", "--json", "plant", "list", "--status", "em_alerta"])
                .unwrap();
        assert!(cli.json);
        match cli.command {
            Commands::Plant {
                action: PlantAction::List { status, .. },
            } => assert_eq!(status, Some(SensorStatus::InAlert)),
            _ => panic!("expected plant list"),
        }
    }

    #[test]
    fn test_output_format_from_str() {
        assert_eq!("JSON".parse::<OutputFormat>().unwrap(), OutputFormat::Json);
        assert!("csv".parse::<OutputFormat>().is_err());
    }
}
