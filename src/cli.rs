//! Command-line interface for strictly_werewolf.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Strictly Werewolf - social deduction moderator for agents
#[derive(Parser, Debug)]
#[command(name = "strictly_werewolf")]
#[command(about = "Werewolf moderator for random, scripted and human agents", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Subcommand to run
    #[command(subcommand)]
    pub command: Command,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Play a single game
    Play {
        /// Path to a TOML game configuration
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Seed for every random choice (overrides the config)
        #[arg(long)]
        seed: Option<u64>,

        /// Write the JSON game summary here
        #[arg(long)]
        summary: Option<PathBuf>,
    },

    /// Run several games back to back with shared memory
    Batch {
        /// Path to a TOML game configuration
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Number of games (overrides benchmark.num_games)
        #[arg(short, long)]
        games: Option<u32>,

        /// Directory for per-game summaries and the batch report
        #[arg(short, long, default_value = "results")]
        out: PathBuf,
    },
}
