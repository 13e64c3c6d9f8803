use std::path::PathBuf;

use clap::Subcommand;
use retune_core::RetuneConfig;

#[derive(Subcommand)]
pub enum ConfigAction {
    /// Get a config value
    Get {
        /// Dot-separated key (e.g. "breaks.break_minutes")
        key: String,
        #[arg(long)]
        config: Option<PathBuf>,
    },
    /// Set a config value
    Set {
        /// Dot-separated key
        key: String,
        /// New value
        value: String,
        #[arg(long)]
        config: Option<PathBuf>,
    },
    /// List all config values
    List {
        #[arg(long)]
        config: Option<PathBuf>,
    },
    /// Reset config to defaults
    Reset {
        #[arg(long)]
        config: Option<PathBuf>,
    },
    /// Print the config file location
    Path,
}

fn target(config: Option<PathBuf>) -> Result<PathBuf, Box<dyn std::error::Error>> {
    match config {
        Some(p) => Ok(p),
        None => Ok(RetuneConfig::path()?),
    }
}

pub fn run(action: ConfigAction) -> Result<(), Box<dyn std::error::Error>> {
    match action {
        ConfigAction::Get { key, config } => {
            let config = RetuneConfig::load_from(&target(config)?)?;
            match config.get(&key) {
                Some(value) => println!("{value}"),
                None => return Err(format!("unknown key: {key}").into()),
            }
        }
        ConfigAction::Set { key, value, config } => {
            let path = target(config)?;
            let mut config = RetuneConfig::load_from(&path)?;
            config.set(&key, &value)?;
            config.save_to(&path)?;
            println!("ok");
        }
        ConfigAction::List { config } => {
            let config = RetuneConfig::load_from(&target(config)?)?;
            println!("{}", serde_json::to_string_pretty(&config)?);
        }
        ConfigAction::Reset { config } => {
            RetuneConfig::default().save_to(&target(config)?)?;
            println!("config reset to defaults");
        }
        ConfigAction::Path => {
            println!("{}", RetuneConfig::path()?.display());
        }
    }
    Ok(())
}
