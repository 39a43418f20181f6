//! Sequential multi-game runs.
//!
//! Games share nothing but the cross-game memory, and run one after
//! another so each sees the learnings of the games before it.

use crate::config::GameConfig;
use crate::game::{Game, GameError};
use crate::memory::CrossGameMemory;
use crate::metrics::GameSummary;
use anyhow::{Context, Result};
use derive_getters::Getters;
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::PathBuf;
use strictly_werewolf_core::RoleRegistry;
use tracing::{info, instrument};

/// Aggregate of a batch.
#[derive(Debug, Clone, Serialize, Getters)]
pub struct BatchReport {
    /// Per-game summaries in run order.
    games: Vec<GameSummary>,
    /// Wins per team name, plus "draw".
    results: BTreeMap<String, u32>,
}

/// Runs several games back to back.
pub struct BatchRunner {
    config: GameConfig,
    registry: RoleRegistry,
    memory: CrossGameMemory,
    out_dir: Option<PathBuf>,
}

impl BatchRunner {
    /// Creates a runner with an empty memory and no export directory.
    pub fn new(config: GameConfig, registry: RoleRegistry) -> Self {
        Self {
            config,
            registry,
            memory: CrossGameMemory::new(),
            out_dir: None,
        }
    }

    /// Shares an existing memory.
    pub fn with_memory(mut self, memory: CrossGameMemory) -> Self {
        self.memory = memory;
        self
    }

    /// Writes per-game summaries and the report under `dir`.
    pub fn with_out_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.out_dir = Some(dir.into());
        self
    }

    /// The shared memory.
    pub fn memory(&self) -> &CrossGameMemory {
        &self.memory
    }

    /// Seed for game `index` (zero-based). Every game gets its own.
    pub fn game_seed(&self, base: u64, index: u32) -> u64 {
        base.wrapping_add(u64::from(index))
    }

    /// Seed for role assignment.
    ///
    /// `None` lets roles follow the game seed; without rotation every game
    /// deals roles from the base seed, so seating repeats while play varies.
    pub fn role_seed(&self, base: u64) -> Option<u64> {
        (!*self.config.benchmark().rotate_roles()).then_some(base)
    }

    /// Runs `games` games, or the configured count when `None`.
    #[instrument(skip(self))]
    pub async fn run(&self, games: Option<u32>) -> Result<BatchReport> {
        let games = games.unwrap_or(*self.config.benchmark().num_games());
        let base = self.config.seed().unwrap_or_else(rand::random);
        if let Some(dir) = &self.out_dir {
            std::fs::create_dir_all(dir).with_context(|| format!("Failed to create {}", dir.display()))?;
        }

        let mut summaries = Vec::new();
        let mut results: BTreeMap<String, u32> = BTreeMap::new();
        for index in 0..games {
            let number = index + 1;
            let config = self.config.clone().with_seed(self.game_seed(base, index));
            let mut game = Game::new(config, self.registry.clone())
                .with_learnings(self.memory.snapshot())
                .with_game_number(number);
            if let Some(role_seed) = self.role_seed(base) {
                game = game.with_role_seed(role_seed);
            }
            let record = game
                .run()
                .await
                .map_err(|e: GameError| anyhow::anyhow!("Game {} failed: {}", number, e))?;

            for (name, learnings) in record.learnings() {
                self.memory.append(name, learnings.iter().cloned());
            }
            let summary = GameSummary::from_events(
                self.config.game_name(),
                record.final_state().players(),
                record.final_state().events(),
            );
            let key = record
                .end()
                .winning_team()
                .map_or_else(|| "draw".to_string(), |team| team.to_string());
            *results.entry(key).or_insert(0) += 1;
            info!(game = number, outcome = %record.end().outcome(), "Batch game finished");

            if let Some(dir) = &self.out_dir {
                summary.write_json(dir.join(format!("game_{:03}.json", number)))?;
            }
            summaries.push(summary);
        }

        let report = BatchReport {
            games: summaries,
            results,
        };
        if let Some(dir) = &self.out_dir {
            let json = serde_json::to_string_pretty(&report).context("Failed to serialize batch report")?;
            std::fs::write(dir.join("batch_summary.json"), json).context("Failed to write batch report")?;
        }
        info!(games, results = ?report.results, "Batch complete");
        Ok(report)
    }
}
