//! Full-game orchestration.
//!
//! One game runs its phases strictly in order. The transition contract
//! is checked after every phase, and victory after dawn and after the
//! vote result. The day limit ends the game by the configured policy.

use crate::agents::{Agent, build_agent};
use crate::config::{ConfigError, GameConfig};
use crate::listener::EventListener;
use crate::moderator::Moderator;
use crate::setup::{SeatAssignment, SetupError, assign_roles, initial_state};
use derive_getters::Getters;
use rand::rngs::StdRng;
use rand::{RngCore, SeedableRng};
use std::collections::BTreeMap;
use strictly_werewolf_core::{GameEnd, GameState, Outcome, Phase, RoleRegistry, TransitionContract, check_victory};
use tracing::{info, instrument, warn};

/// Why a game could not start.
#[derive(Debug, Clone, derive_more::Display, derive_more::Error, derive_more::From)]
pub enum GameError {
    /// The configuration is invalid.
    #[display("{_0}")]
    Config(ConfigError),
    /// Seats could not be assigned.
    #[display("{_0}")]
    Setup(SetupError),
}

/// Everything a finished game leaves behind.
#[derive(Debug, Clone, Getters)]
pub struct GameRecord {
    /// Seed every random choice was drawn from.
    seed: u64,
    /// How the game ended.
    end: GameEnd,
    /// Terminal state, including the full event log.
    final_state: GameState,
    /// Learnings extracted from each knowledge base, by display name.
    learnings: BTreeMap<String, Vec<String>>,
}

/// A configured game, ready to run once.
pub struct Game {
    config: GameConfig,
    registry: RoleRegistry,
    listeners: Vec<Box<dyn EventListener>>,
    learnings: BTreeMap<String, Vec<String>>,
    game_number: u32,
    role_seed: Option<u64>,
}

impl Game {
    /// Creates a game from a configuration and role registry.
    pub fn new(config: GameConfig, registry: RoleRegistry) -> Self {
        Self {
            config,
            registry,
            listeners: Vec::new(),
            learnings: BTreeMap::new(),
            game_number: 1,
            role_seed: None,
        }
    }

    /// Adds an event listener.
    pub fn with_listener(mut self, listener: Box<dyn EventListener>) -> Self {
        self.listeners.push(listener);
        self
    }

    /// Prior-game learnings keyed by display name.
    pub fn with_learnings(mut self, learnings: BTreeMap<String, Vec<String>>) -> Self {
        self.learnings = learnings;
        self
    }

    /// Position of this game within a batch.
    pub fn with_game_number(mut self, game_number: u32) -> Self {
        self.game_number = game_number;
        self
    }

    /// Draws role assignment from its own seed instead of the game seed.
    pub fn with_role_seed(mut self, role_seed: u64) -> Self {
        self.role_seed = Some(role_seed);
        self
    }

    /// Runs the game with the agents named in the configuration.
    pub async fn run(self) -> Result<GameRecord, GameError> {
        self.run_with(|seat, seed| build_agent(*seat.agent(), seat.slot().name(), seed))
            .await
    }

    /// Runs the game, building each seat's agent with `make_agent`.
    ///
    /// The factory receives the seat and a per-seat seed.
    #[instrument(skip_all, fields(game = %self.config.game_name(), number = self.game_number))]
    pub async fn run_with<F>(self, mut make_agent: F) -> Result<GameRecord, GameError>
    where
        F: FnMut(&SeatAssignment, u64) -> Box<dyn Agent>,
    {
        self.config.validate(&self.registry)?;
        let seed = self.config.seed().unwrap_or_else(rand::random);
        let mut rng = StdRng::seed_from_u64(seed);
        let seats = match self.role_seed {
            Some(role_seed) => assign_roles(&self.config, &self.registry, &mut StdRng::seed_from_u64(role_seed))?,
            None => assign_roles(&self.config, &self.registry, &mut rng)?,
        };
        let mut state = initial_state(&seats)?;

        let agents = seats
            .iter()
            .map(|seat| (seat.slot().player_id().clone(), make_agent(seat, rng.next_u64())))
            .collect();
        let mut moderator = Moderator::new(
            self.config.clone(),
            self.registry.clone(),
            &state,
            agents,
            rng.next_u64(),
        );
        for listener in self.listeners {
            moderator.add_listener(listener);
        }
        moderator.inject_learnings(|name| self.learnings.get(name).cloned().unwrap_or_default());

        info!(seed, players = state.players().len(), "Game starting");
        let max_days = *self.config.max_days();
        state = moderator.run_game_start(state).await;

        let end = loop {
            if let Some(end) = check_victory(&state) {
                break end;
            }
            if state.day() >= max_days {
                break timeout_end(&self.config, &state);
            }

            let before = state.clone();
            state = moderator.advance(state, Phase::Night);
            state = moderator.run_night(state).await;
            state = checked(&before, state);

            let before = state.clone();
            state = moderator.advance(state, Phase::Dawn);
            let since = state.events().len();
            state = moderator.run_dawn(state);
            state = checked(&before, state);
            if let Some(end) = check_victory(&state) {
                break end;
            }
            state = moderator.run_reflection(state, since).await;

            let before = state.clone();
            state = moderator.advance(state, Phase::DayDiscussion);
            state = moderator.run_discussion(state).await;
            state = checked(&before, state);

            let before = state.clone();
            state = moderator.advance(state, Phase::DayVote);
            let (next, result) = moderator.run_vote(state).await;
            state = checked(&before, next);

            let before = state.clone();
            state = moderator.advance(state, Phase::DayVoteResult);
            let since = state.events().len();
            state = moderator.run_vote_result(state, &result);
            state = checked(&before, state);
            if let Some(end) = check_victory(&state) {
                break end;
            }
            state = moderator.run_reflection(state, since).await;
        };

        let before = state.clone();
        state = moderator.finish(state, end.clone()).await;
        state = checked(&before, state);
        info!(outcome = %end.outcome(), reason = %end.reason(), days = state.day(), "Game over");

        Ok(GameRecord {
            seed,
            end,
            final_state: state,
            learnings: moderator.extract_learnings(self.game_number).into_iter().collect(),
        })
    }
}

fn checked(before: &GameState, after: GameState) -> GameState {
    if let Err(violations) = TransitionContract::check(before, &after) {
        warn!(phase = %after.phase(), count = violations.len(), "Transition contract violated");
    }
    after
}

/// Result when the day limit is reached.
pub fn timeout_end(config: &GameConfig, state: &GameState) -> GameEnd {
    let reason = format!("Day limit of {} reached.", config.max_days());
    match config.timeout_policy().winner() {
        Some(team) => {
            let winners = state
                .players_by_team(&team)
                .into_iter()
                .map(|p| p.player_id().clone())
                .collect();
            GameEnd::new(Outcome::Winner(team), winners, reason)
        }
        None => GameEnd::new(Outcome::Draw, Vec::new(), reason),
    }
}
