//! Per-game summaries derived from the event log.

use crate::listener::EventListener;
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use derive_getters::Getters;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use strictly_werewolf_core::{EliminationCause, EventKind, GameEvent, Outcome, PlayerId, PlayerSlot, Team};
use tracing::{info, instrument};

/// Per-player outcome of a game.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, derive_more::Display)]
#[serde(rename_all = "snake_case")]
pub enum PlayerResult {
    /// On the winning team.
    #[display("win")]
    Win,
    /// On a losing team.
    #[display("loss")]
    Loss,
    /// The game was drawn or never finished.
    #[display("draw")]
    Draw,
}

/// Statistics for one player.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Getters)]
pub struct PlayerSummary {
    /// Display name.
    name: String,
    /// Assigned role.
    role: String,
    /// Team.
    team: Team,
    /// Speeches on any channel.
    speeches: u32,
    /// Non-abstaining votes cast.
    votes_cast: u32,
    /// Votes received.
    votes_received: u32,
    /// Night abilities used.
    abilities_used: u32,
    /// Day of elimination, or the last day for survivors.
    survived_until: u32,
    /// Still alive at the end.
    is_alive: bool,
    /// How the player died.
    elimination_cause: Option<EliminationCause>,
    /// Result for this player.
    result: PlayerResult,
}

/// Summary of a whole game.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Getters)]
pub struct GameSummary {
    /// Configured game name.
    game_name: String,
    /// When the summary was made.
    timestamp: DateTime<Utc>,
    /// Last day reached.
    total_days: u32,
    /// Final outcome, if the log contains one.
    outcome: Option<Outcome>,
    /// Why the game ended.
    reason: Option<String>,
    /// Per-player statistics keyed by id.
    players: BTreeMap<PlayerId, PlayerSummary>,
}

impl GameSummary {
    /// Projects a summary from the roster and the event log alone.
    #[instrument(skip_all, fields(events = events.len()))]
    pub fn from_events(game_name: &str, roster: &[PlayerSlot], events: &[GameEvent]) -> Self {
        let total_days = events.iter().map(|e| e.day).max().unwrap_or(0);
        let end = events.iter().rev().find_map(|e| match &e.kind {
            EventKind::GameEnd(end) => Some(end),
            _ => None,
        });

        let mut players: BTreeMap<PlayerId, PlayerSummary> = roster
            .iter()
            .map(|slot| {
                let result = match end.map(|e| e.outcome()) {
                    Some(Outcome::Winner(team)) if team == slot.team() => PlayerResult::Win,
                    Some(Outcome::Winner(_)) => PlayerResult::Loss,
                    Some(Outcome::Draw) | None => PlayerResult::Draw,
                };
                let summary = PlayerSummary {
                    name: slot.name().clone(),
                    role: slot.role().clone(),
                    team: slot.team().clone(),
                    speeches: 0,
                    votes_cast: 0,
                    votes_received: 0,
                    abilities_used: 0,
                    survived_until: total_days,
                    is_alive: true,
                    elimination_cause: None,
                    result,
                };
                (slot.player_id().clone(), summary)
            })
            .collect();

        for event in events {
            match &event.kind {
                EventKind::Speech { player_id, .. } => {
                    if let Some(p) = players.get_mut(player_id) {
                        p.speeches += 1;
                    }
                }
                EventKind::Vote {
                    voter_id,
                    target_id: Some(target),
                } => {
                    if let Some(p) = players.get_mut(voter_id) {
                        p.votes_cast += 1;
                    }
                    if let Some(p) = players.get_mut(target) {
                        p.votes_received += 1;
                    }
                }
                EventKind::AbilityUse { player_id, .. } => {
                    if let Some(p) = players.get_mut(player_id) {
                        p.abilities_used += 1;
                    }
                }
                EventKind::Elimination { player_id, cause, .. } => {
                    if let Some(p) = players.get_mut(player_id) {
                        p.is_alive = false;
                        p.survived_until = event.day;
                        p.elimination_cause = Some(*cause);
                    }
                }
                _ => {}
            }
        }

        Self {
            game_name: game_name.to_string(),
            timestamp: Utc::now(),
            total_days,
            outcome: end.map(|e| e.outcome().clone()),
            reason: end.map(|e| e.reason().clone()),
            players,
        }
    }

    /// Writes the summary as pretty JSON.
    #[instrument(skip(self, path), fields(path = %path.as_ref().display()))]
    pub fn write_json(&self, path: impl AsRef<Path>) -> Result<()> {
        let json = serde_json::to_string_pretty(self).context("Failed to serialize game summary")?;
        std::fs::write(path.as_ref(), json)
            .with_context(|| format!("Failed to write {}", path.as_ref().display()))?;
        info!("Game summary written");
        Ok(())
    }
}

/// Listener that keeps every event for a summary.
#[derive(Debug, Default, Clone)]
pub struct MetricsCollector {
    events: Vec<GameEvent>,
}

impl MetricsCollector {
    /// Creates an empty collector.
    pub fn new() -> Self {
        Self::default()
    }

    /// Summary of the events seen so far.
    pub fn summary(&self, game_name: &str, roster: &[PlayerSlot]) -> GameSummary {
        GameSummary::from_events(game_name, roster, &self.events)
    }
}

impl EventListener for MetricsCollector {
    fn on_event(&mut self, event: &GameEvent) -> Result<()> {
        self.events.push(event.clone());
        Ok(())
    }
}
