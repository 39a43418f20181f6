//! Game configuration loaded from TOML.

use derive_getters::Getters;
use derive_more::{Display, Error};
use derive_setters::Setters;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use strictly_werewolf_core::{ChannelPolicy, RoleRegistry, Team, TieBreaker};
use tracing::{debug, info, instrument};

/// A role and how many seats get it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Getters)]
pub struct RoleSlot {
    /// Role name, a registry key.
    role: String,
    /// Number of seats.
    #[serde(default = "default_count")]
    count: usize,
}

impl RoleSlot {
    /// Creates a role slot.
    pub fn new(role: impl Into<String>, count: usize) -> Self {
        Self {
            role: role.into(),
            count,
        }
    }
}

fn default_count() -> usize {
    1
}

/// Which agent implementation drives a seat.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, Display)]
#[serde(rename_all = "snake_case")]
pub enum AgentKind {
    /// Seeded random baseline.
    #[default]
    #[display("random")]
    Random,
    /// Replays a fixed script; passes when it runs out.
    #[display("scripted")]
    Scripted,
    /// Reads tool invocations from stdin.
    #[display("human")]
    Human,
}

/// One configured seat.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Getters)]
pub struct PlayerConfig {
    /// Display name.
    name: String,
    /// Agent driving the seat.
    #[serde(default)]
    agent: AgentKind,
}

impl PlayerConfig {
    /// Creates a seat configuration.
    pub fn new(name: impl Into<String>, agent: AgentKind) -> Self {
        Self {
            name: name.into(),
            agent,
        }
    }
}

/// Voting rules.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, Getters, Setters)]
#[serde(default)]
#[setters(prefix = "with_")]
pub struct VotingConfig {
    /// What a tied vote does.
    tie_breaker: TieBreaker,
}

/// Communication toggles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Getters, Setters)]
#[serde(default)]
#[setters(prefix = "with_")]
pub struct CommunicationConfig {
    /// Run a pack chat before night actions.
    allow_wolf_chat: bool,
    /// Open direct channels between players.
    allow_dms: bool,
    /// Speaking rounds per discussion phase.
    discussion_rounds: u32,
    /// Speech is truncated to this many characters.
    max_speech_length: usize,
}

impl Default for CommunicationConfig {
    fn default() -> Self {
        Self {
            allow_wolf_chat: true,
            allow_dms: false,
            discussion_rounds: 2,
            max_speech_length: 500,
        }
    }
}

/// Settings for batch runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Getters, Setters)]
#[serde(default)]
#[setters(prefix = "with_")]
pub struct BenchmarkConfig {
    /// Games per batch.
    num_games: u32,
    /// Reshuffle roles each game; otherwise every game deals the same seating.
    rotate_roles: bool,
}

impl Default for BenchmarkConfig {
    fn default() -> Self {
        Self {
            num_games: 10,
            rotate_roles: true,
        }
    }
}

/// Outcome when the day limit is reached without a winner.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, Display)]
#[serde(rename_all = "snake_case")]
pub enum TimeoutPolicy {
    /// Nobody wins.
    #[default]
    #[display("draw")]
    Draw,
    /// The pack wins.
    #[display("werewolf")]
    Werewolf,
    /// The village wins.
    #[display("village")]
    Village,
}

impl TimeoutPolicy {
    /// Team credited with the win, if any.
    pub fn winner(self) -> Option<Team> {
        match self {
            TimeoutPolicy::Draw => None,
            TimeoutPolicy::Werewolf => Some(Team::Werewolf),
            TimeoutPolicy::Village => Some(Team::Village),
        }
    }
}

/// Full game configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Getters, Setters)]
#[serde(default)]
#[setters(prefix = "with_")]
pub struct GameConfig {
    /// Label used in exports.
    #[setters(into)]
    game_name: String,
    /// Seats at the table.
    num_players: usize,
    /// Shuffle display-name order in briefings.
    randomize_names: bool,
    /// Seed for every random choice in a game.
    #[setters(strip_option)]
    seed: Option<u64>,
    /// Role composition.
    roles: Vec<RoleSlot>,
    /// Per-seat names and agents; missing seats get defaults.
    players: Vec<PlayerConfig>,
    /// Voting rules.
    voting: VotingConfig,
    /// Communication toggles.
    communication: CommunicationConfig,
    /// Run reflection turns after dawn and after the vote.
    reflection: bool,
    /// Day limit.
    max_days: u32,
    /// Tool invocations allowed per turn.
    max_rounds: usize,
    /// Seconds an agent may take for one turn.
    turn_timeout_secs: u64,
    /// Outcome at the day limit.
    timeout_policy: TimeoutPolicy,
    /// Batch settings.
    benchmark: BenchmarkConfig,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            game_name: "classic_7p".to_string(),
            num_players: 7,
            randomize_names: true,
            seed: None,
            roles: vec![
                RoleSlot::new("werewolf", 2),
                RoleSlot::new("seer", 1),
                RoleSlot::new("doctor", 1),
                RoleSlot::new("villager", 3),
            ],
            players: Vec::new(),
            voting: VotingConfig::default(),
            communication: CommunicationConfig::default(),
            reflection: true,
            max_days: 15,
            max_rounds: 6,
            turn_timeout_secs: 120,
            timeout_policy: TimeoutPolicy::default(),
            benchmark: BenchmarkConfig::default(),
        }
    }
}

impl GameConfig {
    /// Loads configuration from a TOML file.
    #[instrument(skip(path), fields(path = %path.as_ref().display()))]
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        debug!("Loading config from file");
        let content = std::fs::read_to_string(path.as_ref())
            .map_err(|e| ConfigError::new(format!("Failed to read config file: {}", e)))?;
        let config = Self::from_toml(&content)?;
        info!(game = %config.game_name, players = config.num_players, "Config loaded successfully");
        Ok(config)
    }

    /// Parses configuration from TOML text.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(|e| ConfigError::new(format!("Failed to parse config: {}", e)))
    }

    /// Checks the configuration against a role registry.
    #[instrument(skip_all)]
    pub fn validate(&self, registry: &RoleRegistry) -> Result<(), ConfigError> {
        if self.num_players == 0 {
            return Err(ConfigError::new("num_players must be at least 1".to_string()));
        }
        if self.communication.discussion_rounds == 0 {
            return Err(ConfigError::new(
                "communication.discussion_rounds must be at least 1".to_string(),
            ));
        }
        if self.max_rounds == 0 {
            return Err(ConfigError::new("max_rounds must be at least 1".to_string()));
        }
        if let Some(slot) = self.roles.iter().find(|slot| !registry.contains(&slot.role)) {
            return Err(ConfigError::new(format!("Unknown role '{}'", slot.role)));
        }
        let humans = self
            .players
            .iter()
            .take(self.num_players)
            .filter(|p| p.agent == AgentKind::Human)
            .count();
        if humans > 1 {
            return Err(ConfigError::new(format!(
                "At most one human player can share stdin, found {}",
                humans
            )));
        }
        let names = self.seat_names();
        let ids: Vec<String> = (1..=names.len()).map(|i| format!("p{}", i)).collect();
        let mut seen = std::collections::BTreeSet::new();
        for name in &names {
            let key = name.trim().to_lowercase();
            if key.is_empty() {
                return Err(ConfigError::new("Player names must not be empty".to_string()));
            }
            if ids.contains(&key) {
                return Err(ConfigError::new(format!(
                    "Player name '{}' collides with a seat id",
                    name
                )));
            }
            if !seen.insert(key) {
                return Err(ConfigError::new(format!("Duplicate player name '{}'", name)));
            }
        }
        Ok(())
    }

    /// Display names for every seat: configured names in order, then
    /// `Player_{i}`.
    pub fn seat_names(&self) -> Vec<String> {
        (0..self.num_players)
            .map(|i| {
                self.players
                    .get(i)
                    .map(|p| p.name.clone())
                    .unwrap_or_else(|| format!("Player_{}", i + 1))
            })
            .collect()
    }

    /// Role names expanded by count, in configured order.
    pub fn role_list(&self) -> Vec<String> {
        self.roles
            .iter()
            .flat_map(|slot| std::iter::repeat_n(slot.role.clone(), slot.count))
            .collect()
    }

    /// Channels this configuration opens.
    pub fn channel_policy(&self) -> ChannelPolicy {
        ChannelPolicy::new(self.communication.allow_wolf_chat, self.communication.allow_dms)
    }

    /// Per-turn agent timeout.
    pub fn turn_timeout(&self) -> Duration {
        Duration::from_secs(self.turn_timeout_secs)
    }
}

/// Configuration error.
#[derive(Debug, Clone, Display, Error)]
#[display("Config error: {} at {}:{}", message, file, line)]
pub struct ConfigError {
    /// Error message.
    pub message: String,
    /// Line number where error occurred.
    pub line: u32,
    /// Source file where error occurred.
    pub file: &'static str,
}

impl ConfigError {
    /// Creates a new configuration error at the caller's location.
    #[track_caller]
    pub fn new(message: String) -> Self {
        let loc = std::panic::Location::caller();
        Self {
            message,
            line: loc.line(),
            file: loc.file(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_classic_game() {
        let config = GameConfig::default();
        assert_eq!(config.role_list().len(), 7);
        assert_eq!(*config.max_days(), 15);
        assert_eq!(*config.timeout_policy(), TimeoutPolicy::Draw);
        assert!(config.validate(&RoleRegistry::with_builtins()).is_ok());
    }

    #[test]
    fn test_unknown_role_rejected() {
        let config = GameConfig::default().with_roles(vec![RoleSlot::new("vampire", 1)]);
        let err = config.validate(&RoleRegistry::with_builtins()).unwrap_err();
        assert!(err.message.contains("vampire"));
    }

    #[test]
    fn test_duplicate_names_rejected() {
        let config = GameConfig::default().with_players(vec![
            PlayerConfig::new("Ash", AgentKind::Random),
            PlayerConfig::new("ASH", AgentKind::Random),
        ]);
        let err = config.validate(&RoleRegistry::with_builtins()).unwrap_err();
        assert!(err.message.contains("Duplicate player name"));
    }

    #[test]
    fn test_configured_name_may_not_shadow_default_name() {
        let config = GameConfig::default().with_players(vec![PlayerConfig::new("Player_3", AgentKind::Random)]);
        assert!(config.validate(&RoleRegistry::with_builtins()).is_err());
    }

    #[test]
    fn test_name_colliding_with_seat_id_rejected() {
        let config = GameConfig::default().with_players(vec![PlayerConfig::new("P3", AgentKind::Random)]);
        let err = config.validate(&RoleRegistry::with_builtins()).unwrap_err();
        assert!(err.message.contains("seat id"));
    }

    #[test]
    fn test_second_human_seat_rejected() {
        let config = GameConfig::default().with_players(vec![
            PlayerConfig::new("Ada", AgentKind::Human),
            PlayerConfig::new("Bo", AgentKind::Human),
        ]);
        let err = config.validate(&RoleRegistry::with_builtins()).unwrap_err();
        assert!(err.message.contains("At most one human"));

        let single = GameConfig::default().with_players(vec![
            PlayerConfig::new("Ada", AgentKind::Human),
            PlayerConfig::new("Bo", AgentKind::Random),
        ]);
        assert!(single.validate(&RoleRegistry::with_builtins()).is_ok());
    }

    #[test]
    fn test_seat_names_fill_defaults() {
        let config = GameConfig::default()
            .with_num_players(3)
            .with_players(vec![PlayerConfig::new("Ada", AgentKind::Human)]);
        assert_eq!(config.seat_names(), vec!["Ada", "Player_2", "Player_3"]);
    }

    #[test]
    fn test_zero_rounds_rejected() {
        let config = GameConfig::default()
            .with_communication(CommunicationConfig::default().with_discussion_rounds(0));
        assert!(config.validate(&RoleRegistry::with_builtins()).is_err());
    }

    #[test]
    fn test_unknown_tie_breaker_fails_to_parse() {
        let result = GameConfig::from_toml("[voting]\ntie_breaker = \"coin_flip\"\n");
        assert!(result.is_err());
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = GameConfig::from_toml("num_players = 5\n[communication]\nallow_dms = true\n")
            .expect("valid toml");
        assert_eq!(*config.num_players(), 5);
        assert!(*config.communication().allow_dms());
        assert!(*config.communication().allow_wolf_chat());
        assert_eq!(*config.communication().discussion_rounds(), 2);
    }
}
