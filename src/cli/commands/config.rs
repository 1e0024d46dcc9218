//! Config command implementation.
//!
//! View and initialize cainiao configuration settings.

use std::path::PathBuf;

use crate::cli::{Cli, ConfigAction, ConfigArgs};
use crate::config::{default_config_path, Config};
use crate::error::{Result, TrackerError};

/// Run the config command.
pub fn run(cli: &Cli, args: &ConfigArgs) -> Result<()> {
    match &args.action {
        ConfigAction::Show => show_config(cli),
        ConfigAction::Path => show_config_path(cli),
        ConfigAction::Init { force } => init_config(cli, *force),
    }
}

fn config_path(cli: &Cli) -> Result<PathBuf> {
    match &cli.config {
        Some(path) => Ok(path.clone()),
        None => default_config_path(),
    }
}

/// Show the effective configuration.
fn show_config(cli: &Cli) -> Result<()> {
    let config = cli.load_config()?;

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&config)?);
        return Ok(());
    }

    let toml = toml::to_string_pretty(&config).map_err(|e| TrackerError::InvalidConfig {
        message: e.to_string(),
    })?;
    println!("# {}", config_path(cli)?.display());
    println!("# store: {}", cli.store_path(&config)?.display());
    println!();
    print!("{toml}");

    Ok(())
}

/// Show configuration file path.
fn show_config_path(cli: &Cli) -> Result<()> {
    let path = config_path(cli)?;
    if cli.json {
        println!(
            "{}",
            serde_json::json!({ "path": path, "exists": path.exists() })
        );
    } else {
        println!("{}", path.display());
    }
    Ok(())
}

/// Initialize configuration file with defaults.
fn init_config(cli: &Cli, force: bool) -> Result<()> {
    let path = config_path(cli)?;

    if path.exists() && !force {
        println!("Configuration file already exists at: {}", path.display());
        println!("Use 'cainiao config init --force' to reset it to defaults.");
        return Ok(());
    }

    Config::default().save_to(&path)?;
    println!("Created configuration file at: {}", path.display());

    Ok(())
}
