mod config;
mod console;
mod error;
mod log_entry;
mod log_store;
mod radio;
mod session;
mod storage;
mod summary;

use anyhow::Result;
use clap::Parser;
use log::info;
use std::time::Duration;
use tokio::sync::mpsc;

use crate::log_store::LogStore;
use crate::radio::SimulatedRadio;
use crate::session::ScanSession;
use crate::storage::FileStore;

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    info!("Starting tagscan");

    // Parse command-line arguments
    let cli = config::Cli::parse();

    // Load configuration
    let config = config::load_config(&cli)?;
    info!("Configuration loaded successfully");

    // Load the persisted scan history
    let store = FileStore::new(config.storage_path.clone());
    let history = LogStore::load(store).await;
    info!("Loaded {} past scan(s)", history.entries().len());

    // The simulated driver stands in for the device's tag radio
    let radio = SimulatedRadio::new(
        config.radio_available,
        Duration::from_millis(config.discovery_delay_ms),
    );

    let (command_tx, command_rx) = mpsc::channel(8);

    // Spawn the session actor
    let session = ScanSession::new(radio, history);
    let session_handle = tokio::spawn(session.run(command_rx));

    // Spawn the console input task
    let console_handle = tokio::spawn(console::run(command_tx));

    tokio::select! {
        _ = session_handle => {
            info!("Scan session ended");
        }
        _ = console_handle => {
            info!("Console input closed");
        }
    }

    Ok(())
}
