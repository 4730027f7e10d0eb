//! Reachy Tic-Tac-Toe - command-line launcher.

#![warn(missing_docs)]

use anyhow::{Context, Result};
use clap::Parser;
use reachy_playground::cli::{Cli, Command};
use reachy_playground::{Opponent, PlayOptions, recorder};
use reachy_tictactoe::{EventSink, PlaygroundConfig};
use std::path::PathBuf;
use tokio::sync::watch;
use tracing::{info, instrument, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    match cli.command {
        Command::Play {
            config,
            games,
            opponent,
            seed,
            events,
        } => play(config, games, opponent, seed, events).await,
        Command::Config => print_config(),
    }
}

fn init_tracing() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,reachy_tictactoe=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}

/// Play games on the simulated table
#[instrument(skip_all)]
async fn play(
    config: Option<PathBuf>,
    games: Option<u64>,
    opponent: Opponent,
    seed: Option<u64>,
    events: Option<PathBuf>,
) -> Result<()> {
    init_tracing();

    let config = match config {
        Some(path) => PlaygroundConfig::from_file(&path)
            .with_context(|| format!("Loading {}", path.display()))?,
        None => {
            let config = PlaygroundConfig::default();
            config.validate()?;
            config
        }
    };

    let (sink, log) = match events {
        Some(path) => {
            let (sink, rx) = EventSink::channel();
            let handle = recorder::spawn(&path, rx)
                .await
                .with_context(|| format!("Opening event log {}", path.display()))?;
            (sink, Some(handle))
        }
        None => (EventSink::disabled(), None),
    };

    let (stop, shutdown) = watch::channel(false);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupted, finishing the current game");
            let _ = stop.send(true);
        }
    });

    let options = PlayOptions {
        games,
        opponent,
        seed,
    };
    info!(%opponent, ?games, "Starting play");
    let summary = reachy_playground::run(&config, &options, sink, shutdown).await?;

    if let Some(handle) = log {
        let written = handle.await??;
        info!(written, "Event log written");
    }

    println!("{summary}");
    Ok(())
}

/// Print the default configuration
fn print_config() -> Result<()> {
    print!("{}", PlaygroundConfig::default().to_toml()?);
    Ok(())
}
