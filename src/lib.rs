//! Strictly Werewolf - moderator and agent harness for social deduction
//!
//! Runs Werewolf games among autonomous agents on top of the pure rules
//! engine in `strictly_werewolf_core`.
//!
//! # Architecture
//!
//! - **Config**: TOML [`GameConfig`] with validated role composition
//! - **Setup**: seeded role assignment and the initial state
//! - **Briefings**: per-player text built only from a [`GameStateView`]
//! - **Toolkit**: per-turn tool allow-lists with validation and fallbacks
//! - **Agents**: the [`Agent`] trait with random, scripted and human players
//! - **Moderator / Game**: phase driver and the full day/night loop
//! - **Metrics / Batch**: event-log summaries and multi-game runs
//!
//! # Example
//!
//! ```no_run
//! use strictly_werewolf::{Game, GameConfig, RoleRegistry};
//!
//! # async fn example() -> anyhow::Result<()> {
//! let config = GameConfig::default().with_seed(42);
//! let record = Game::new(config, RoleRegistry::with_builtins()).run().await?;
//! println!("{}", record.end().outcome());
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![forbid(unsafe_code)]

// Private module declarations
mod agents;
mod batch;
mod briefing;
mod config;
mod game;
mod knowledge_base;
mod listener;
mod memory;
mod metrics;
mod moderator;
mod names;
mod setup;
mod toolkit;

pub mod cli;

// Crate-level exports - Configuration
pub use config::{
    AgentKind, BenchmarkConfig, CommunicationConfig, ConfigError, GameConfig, PlayerConfig, RoleSlot,
    TimeoutPolicy, VotingConfig,
};

// Crate-level exports - Setup
pub use setup::{FILLER_ROLE, SeatAssignment, SetupError, assign_roles, initial_state, role_pool};

// Crate-level exports - Briefings and memory
pub use briefing::BriefingBuilder;
pub use knowledge_base::KnowledgeBase;
pub use memory::CrossGameMemory;
pub use names::NameBook;

// Crate-level exports - Toolkit
pub use toolkit::{
    AssessmentArgs, DirectMessageArgs, MessageArgs, NoteArgs, TargetArgs, ToolResult, ToolSpec, Toolkit,
    ToolkitSettings, TurnKind, ability_targets, clean_speech, parse_invocation, vote_targets,
};

// Crate-level exports - Agents
pub use agents::{Agent, HumanAgent, RandomAgent, ScriptedAgent, Transcript, build_agent};

// Crate-level exports - Orchestration
pub use game::{Game, GameError, GameRecord, timeout_end};
pub use moderator::{GAME_START_ROUNDS, Moderator, Seat, TurnOutcome};

// Crate-level exports - Listeners, metrics, batches
pub use batch::{BatchReport, BatchRunner};
pub use listener::{EventListener, EventRecorder, TracingListener};
pub use metrics::{GameSummary, MetricsCollector, PlayerResult, PlayerSummary};

// Rules engine re-exports
pub use strictly_werewolf_core::{
    Ability, Action, ChannelId, EliminationCause, EventKind, GameEnd, GameEvent, GameState, GameStateView,
    Outcome, Phase, PlayerId, PlayerSlot, Role, RoleRegistry, Team, TieBreaker,
};
