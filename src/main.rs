//! Strictly Werewolf - command-line entry point.

#![warn(missing_docs)]

use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use strictly_werewolf::cli::{Cli, Command};
use strictly_werewolf::{BatchRunner, Game, GameConfig, MetricsCollector, RoleRegistry, TracingListener};
use tracing::info;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with(fmt::layer())
        .init();

    let cli = Cli::parse();

    match cli.command {
        Command::Play { config, seed, summary } => run_play(config, seed, summary).await,
        Command::Batch { config, games, out } => run_batch(config, games, out).await,
    }
}

fn load_config(path: Option<PathBuf>) -> Result<GameConfig> {
    match path {
        Some(path) => Ok(GameConfig::from_file(path)?),
        None => {
            info!("No config given, using the classic 7-player game");
            Ok(GameConfig::default())
        }
    }
}

/// Play one game and optionally export its summary
async fn run_play(config: Option<PathBuf>, seed: Option<u64>, summary: Option<PathBuf>) -> Result<()> {
    let mut config = load_config(config)?;
    if let Some(seed) = seed {
        config = config.with_seed(seed);
    }
    let game_name = config.game_name().clone();

    let metrics = Arc::new(Mutex::new(MetricsCollector::new()));
    let record = Game::new(config, RoleRegistry::with_builtins())
        .with_listener(Box::new(TracingListener))
        .with_listener(Box::new(metrics.clone()))
        .run()
        .await?;

    println!("{} (seed {})", record.end().outcome(), record.seed());
    println!("{}", record.end().reason());

    if let Some(path) = summary {
        let collector = metrics
            .lock()
            .map_err(|_| anyhow::anyhow!("metrics lock poisoned"))?;
        collector
            .summary(&game_name, record.final_state().players())
            .write_json(&path)?;
        println!("Summary written to {}", path.display());
    }
    Ok(())
}

/// Run a batch and write the report
async fn run_batch(config: Option<PathBuf>, games: Option<u32>, out: PathBuf) -> Result<()> {
    let config = load_config(config)?;
    let report = BatchRunner::new(config, RoleRegistry::with_builtins())
        .with_out_dir(&out)
        .run(games)
        .await?;
    for (result, count) in report.results() {
        println!("{}: {}", result, count);
    }
    println!("Reports written to {}", out.display());
    Ok(())
}
