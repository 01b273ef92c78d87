//! Config command - inspect and initialize the config file.

use anyhow::{Result, bail};

use crate::cli::ConfigAction;
use crate::config::Config;

/// Execute the config command.
pub fn cmd_config(action: &ConfigAction, config: &Config, json: bool) -> Result<()> {
    match action {
        ConfigAction::Show => {
            if json {
                println!("{}", serde_json::to_string_pretty(config)?);
            } else {
                print!("{}", toml::to_string_pretty(config)?);
            }
        }
        ConfigAction::Path => println!("{}", Config::path().display()),
        ConfigAction::Init { force } => {
            let path = Config::path();
            if path.exists() && !force {
                bail!(
                    "Config file already exists: {} (use --force to overwrite)",
                    path.display()
                );
            }
            Config::default().save()?;
            println!("Wrote {}", path.display());
        }
    }
    Ok(())
}
