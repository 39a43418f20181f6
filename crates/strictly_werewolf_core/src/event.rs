//! Game events: the append-only, authoritative history of a game.
//!
//! Every derived view (briefings, metrics, replay) is a projection over
//! this log. Each event carries the day and phase it happened in.

use crate::{ChannelId, EliminationCause, Phase, PlayerId, Team};
use derive_getters::Getters;
use derive_new::new;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A single entry in the event log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, new)]
pub struct GameEvent {
    /// Day the event happened on.
    pub day: u32,
    /// Phase the event happened in.
    pub phase: Phase,
    /// What happened.
    pub kind: EventKind,
}

/// Tagged union of everything that can happen in a game.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EventKind {
    /// The phase changed.
    PhaseChange {
        /// Phase being left.
        old_phase: Phase,
        /// Phase being entered.
        new_phase: Phase,
    },
    /// A player spoke.
    Speech {
        /// Speaker.
        player_id: PlayerId,
        /// Speech text.
        content: String,
        /// Channel the speech was made on.
        channel: ChannelId,
    },
    /// A player cast (or withheld) a vote.
    Vote {
        /// Voter.
        voter_id: PlayerId,
        /// Voted player, `None` for abstention.
        target_id: Option<PlayerId>,
    },
    /// Aggregate vote tally.
    VoteResult(VoteResult),
    /// A player died. The role is public by game convention.
    Elimination {
        /// Eliminated player.
        player_id: PlayerId,
        /// Their role, revealed on death.
        role: String,
        /// How they died.
        cause: EliminationCause,
    },
    /// A player used a night ability. Visible only to the actor.
    AbilityUse {
        /// Acting player.
        player_id: PlayerId,
        /// Ability name.
        ability: String,
        /// Target player.
        target_id: PlayerId,
    },
    /// Information revealed privately to one player.
    PrivateReveal {
        /// Recipient of the information.
        player_id: PlayerId,
        /// Player the information is about.
        subject_id: PlayerId,
        /// Subject's role.
        role: String,
        /// Subject's team.
        team: Team,
        /// Human-readable rendering.
        info: String,
    },
    /// Summary of the night's resolution.
    NightResult(NightResult),
    /// The game ended.
    GameEnd(GameEnd),
    /// Captured agent reasoning. Visible only to its author.
    Reasoning {
        /// Reasoning player.
        player_id: PlayerId,
        /// Free text.
        reasoning: String,
        /// Kind of action the reasoning led to.
        action_type: String,
    },
}

impl EventKind {
    /// Short name of the event kind.
    pub fn name(&self) -> &'static str {
        match self {
            EventKind::PhaseChange { .. } => "phase_change",
            EventKind::Speech { .. } => "speech",
            EventKind::Vote { .. } => "vote",
            EventKind::VoteResult(_) => "vote_result",
            EventKind::Elimination { .. } => "elimination",
            EventKind::AbilityUse { .. } => "ability_use",
            EventKind::PrivateReveal { .. } => "private_reveal",
            EventKind::NightResult(_) => "night_result",
            EventKind::GameEnd(_) => "game_end",
            EventKind::Reasoning { .. } => "reasoning",
        }
    }
}

/// Outcome of a night's resolution.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, Getters, new)]
pub struct NightResult {
    /// Players actually killed.
    kills: Vec<PlayerId>,
    /// Every protected player, whether targeted or not.
    protected: Vec<PlayerId>,
    /// Adopted kill targets cancelled by protection.
    saved: Vec<PlayerId>,
}

/// Aggregate result of a day vote.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, Getters, new)]
pub struct VoteResult {
    /// Votes received per target; abstentions excluded.
    tally: BTreeMap<PlayerId, u32>,
    /// Player to eliminate, if any.
    eliminated_id: Option<PlayerId>,
    /// Whether the top count was shared.
    tie: bool,
}

/// How a finished game was decided.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "team", rename_all = "snake_case")]
pub enum Outcome {
    /// A team won.
    Winner(Team),
    /// Nobody won.
    Draw,
}

impl Outcome {
    /// Returns the winning team if there is one.
    pub fn winner(&self) -> Option<&Team> {
        match self {
            Outcome::Winner(team) => Some(team),
            Outcome::Draw => None,
        }
    }
}

impl std::fmt::Display for Outcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Outcome::Winner(team) => write!(f, "{} wins", team),
            Outcome::Draw => write!(f, "draw"),
        }
    }
}

/// Terminal game result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Getters, new)]
pub struct GameEnd {
    /// Who won.
    outcome: Outcome,
    /// Every player on the winning side, alive or dead.
    winners: Vec<PlayerId>,
    /// Human-readable explanation.
    reason: String,
}

impl GameEnd {
    /// Winning team, `None` for a draw.
    pub fn winning_team(&self) -> Option<&Team> {
        self.outcome.winner()
    }
}
