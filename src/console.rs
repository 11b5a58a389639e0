use anyhow::Result;
use log::warn;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;

use crate::session::SessionCommand;

/// Stdin-driven stand-in for the scanning screen: one command per line,
/// forwarded into the session actor.
pub async fn run(commands: mpsc::Sender<SessionCommand>) -> Result<()> {
    println!("Commands: [t]oggle scan, [c]heck availability, [h]istory, [q]uit");

    let reader = BufReader::new(tokio::io::stdin());
    let mut lines = reader.lines();

    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let Some(command) = parse_command(line) else {
            warn!("Unknown command: {}", line);
            continue;
        };

        commands
            .send(command)
            .await
            .map_err(|e| anyhow::anyhow!("Failed to send session command: {}", e))?;

        if command == SessionCommand::Teardown {
            break;
        }
    }

    Ok(())
}

fn parse_command(line: &str) -> Option<SessionCommand> {
    match line {
        "t" | "toggle" | "scan" => Some(SessionCommand::Toggle),
        "c" | "check" => Some(SessionCommand::CheckAvailability),
        "h" | "history" => Some(SessionCommand::ShowHistory),
        "q" | "quit" | "exit" => Some(SessionCommand::Teardown),
        _ => None,
    }
}
