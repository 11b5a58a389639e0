use anyhow::{Context, Result};
use clap::Parser;
use log::info;
use serde::Deserialize;
use std::fs;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[clap(name = "tagscan", version, about)]
pub struct Cli {
    /// Path to configuration file
    #[clap(long, default_value = "./config.toml")]
    pub config: PathBuf,

    /// Override the scan history file path
    #[clap(long)]
    pub storage_path: Option<PathBuf>,

    /// Pretend the tag radio is switched off
    #[clap(long)]
    pub radio_off: bool,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Where the persisted scan history lives
    pub storage_path: PathBuf,
    /// Whether the simulated radio reports itself available
    pub radio_available: bool,
    /// Delay before the simulated radio produces a tag, in milliseconds
    pub discovery_delay_ms: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            storage_path: PathBuf::from("./scan_history.json"),
            radio_available: true,
            discovery_delay_ms: 1500,
        }
    }
}

pub fn load_config(cli: &Cli) -> Result<Config> {
    let mut config = if cli.config.exists() {
        let config_content = fs::read_to_string(&cli.config)
            .with_context(|| format!("Failed to read config file: {:?}", cli.config))?;

        toml::from_str(&config_content).context("Failed to parse config file")?
    } else {
        info!("No config file at {:?}, using defaults", cli.config);
        Config::default()
    };

    // Apply CLI overrides
    if let Some(ref storage_path) = cli.storage_path {
        config.storage_path = storage_path.clone();
    }

    if cli.radio_off {
        config.radio_available = false;
    }

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_toml_fills_in_defaults() {
        let config: Config = toml::from_str(r#"storage_path = "/tmp/scans.json""#).unwrap();

        assert_eq!(config.storage_path, PathBuf::from("/tmp/scans.json"));
        assert!(config.radio_available);
        assert_eq!(config.discovery_delay_ms, 1500);
    }

    #[test]
    fn cli_overrides_win_over_defaults() {
        let cli = Cli::parse_from([
            "tagscan",
            "--config",
            "/nonexistent/config.toml",
            "--storage-path",
            "/tmp/override.json",
            "--radio-off",
        ]);

        let config = load_config(&cli).unwrap();

        assert_eq!(config.storage_path, PathBuf::from("/tmp/override.json"));
        assert!(!config.radio_available);
    }
}
