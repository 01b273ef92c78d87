//! Command implementations for the CLI.

mod alert;
mod config;
mod ingest;
mod plant;
mod rule;
mod sensor;
mod watch;

use anyhow::{Context, Result, bail};
use serde::Serialize;
use tracing::debug;

use plantwatch_store::Store;
use plantwatch_types::Sensor;

use crate::cli::{Cli, Commands, OutputFormat};
use crate::config::Config;
use crate::format::FormatOptions;

pub use alert::cmd_alert;
pub use config::cmd_config;
pub use ingest::cmd_ingest;
pub use plant::cmd_plant;
pub use rule::cmd_rule;
pub use sensor::cmd_sensor;
pub use watch::{WatchArgs, cmd_watch};

/// State shared by every command that touches the database.
pub struct CommandContext {
    pub store: Store,
    pub user_id: i64,
    pub format: OutputFormat,
    pub opts: FormatOptions,
    pub quiet: bool,
}

impl CommandContext {
    /// Open the store selected by the flags and config.
    pub fn open(cli: &Cli, config: &Config) -> Result<Self> {
        let path = config.database_path(cli.db.as_deref());
        debug!("Opening database at {}", path.display());
        let store = Store::open(&path)
            .with_context(|| format!("Failed to open database: {}", path.display()))?
            .with_rule_evaluator(config.rule_evaluator());
        Ok(Self {
            store,
            user_id: config.user_id,
            format: config.output_format(cli.json),
            opts: FormatOptions::new(cli.no_color || config.no_color),
            quiet: cli.quiet,
        })
    }

    /// Print `value` as JSON, or the text rendering otherwise.
    pub fn emit<T: Serialize>(&self, value: &T, text: impl FnOnce() -> String) -> Result<()> {
        match self.format {
            OutputFormat::Json => print!("{}", self.opts.as_json(value)?),
            OutputFormat::Text => print!("{}", text()),
        }
        Ok(())
    }

    /// Look up a sensor by hardware id, falling back to its numeric id.
    pub fn resolve_sensor(&self, reference: &str) -> Result<Sensor> {
        let sensor = match self.store.find_sensor_by_hardware_id(reference)? {
            Some(sensor) => sensor,
            None => match reference.parse::<i64>() {
                Ok(id) => self.store.get_sensor(id)?,
                Err(_) => bail!("Sensor not found: {}", reference),
            },
        };
        self.check_owner(sensor.owner_id, || format!("Sensor not found: {}", reference))?;
        Ok(sensor)
    }

    /// Fail with `message` when a record belongs to another user.
    pub fn check_owner(&self, owner_id: i64, message: impl FnOnce() -> String) -> Result<()> {
        if owner_id != self.user_id {
            bail!(message());
        }
        Ok(())
    }
}

/// Dispatch a parsed command line.
pub async fn run(cli: Cli, config: Config) -> Result<()> {
    if let Commands::Config { action } = &cli.command {
        return cmd_config(action, &config, cli.json);
    }

    let ctx = CommandContext::open(&cli, &config)?;
    match cli.command {
        Commands::Plant { action } => cmd_plant(&ctx, action),
        Commands::Sensor { action } => cmd_sensor(&ctx, action),
        Commands::Ingest { sensor, value, at } => cmd_ingest(&ctx, &sensor, value, at.as_deref()),
        Commands::Rule { action } => cmd_rule(&ctx, action),
        Commands::Alert { action } => cmd_alert(&ctx, action),
        Commands::Watch {
            plant,
            interval,
            count,
        } => {
            cmd_watch(
                &ctx,
                WatchArgs {
                    plant_id: plant,
                    interval: config.watch_interval(interval),
                    count,
                },
            )
            .await
        }
        Commands::Config { .. } => Ok(()),
    }
}
