//! Command-line interface for reachy-tictactoe.

use crate::sim::Opponent;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Reachy Tic-Tac-Toe - a robot that plays across a physical board
#[derive(Parser, Debug)]
#[command(name = "reachy-tictactoe")]
#[command(about = "Play tic-tac-toe against the robot on a simulated table", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Subcommand to run
    #[command(subcommand)]
    pub command: Command,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Play games on the simulated table
    Play {
        /// Path to a table configuration file (TOML)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Number of games to play (omit to play until interrupted)
        #[arg(short, long)]
        games: Option<u64>,

        /// How the simulated human plays
        #[arg(long, value_enum, default_value_t = Opponent::Perfect)]
        opponent: Opponent,

        /// Seed for the coin flip and the simulated human
        #[arg(long)]
        seed: Option<u64>,

        /// Write every game event to this file as JSON lines
        #[arg(long)]
        events: Option<PathBuf>,
    },

    /// Print the default table configuration as TOML
    Config,
}
