//! Core domain types shared by every layer of the engine.

use derive_more::{Display, From};
use serde::{Deserialize, Serialize};
use strum::{EnumIter, EnumString, IntoStaticStr};
use tracing::instrument;

/// Stable identifier of a player for the whole game.
#[derive(
    Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Display, From,
)]
#[serde(transparent)]
pub struct PlayerId(String);

impl PlayerId {
    /// Creates a new player id.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the id as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for PlayerId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl AsRef<str> for PlayerId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Phases of the day/night cycle, in order of progression.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    Display,
    EnumIter,
    EnumString,
    IntoStaticStr,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE", ascii_case_insensitive)]
pub enum Phase {
    /// Roles are being assigned.
    #[display("SETUP")]
    Setup,
    /// Players with night abilities act.
    #[display("NIGHT")]
    Night,
    /// Night actions are resolved.
    #[display("DAWN")]
    Dawn,
    /// Alive players speak in turn.
    #[display("DAY_DISCUSSION")]
    DayDiscussion,
    /// Alive players vote on an elimination.
    #[display("DAY_VOTE")]
    DayVote,
    /// The vote outcome is applied.
    #[display("DAY_VOTE_RESULT")]
    DayVoteResult,
    /// Terminal phase.
    #[display("GAME_OVER")]
    GameOver,
}

impl Phase {
    /// Returns the phase that follows this one in the fixed cycle.
    ///
    /// `DayVoteResult` loops back to `Night`; `GameOver` is absorbing.
    /// Ending the game early is the orchestrator's call, not the cycle's.
    #[instrument]
    pub fn next(self) -> Self {
        match self {
            Phase::Setup => Phase::Night,
            Phase::Night => Phase::Dawn,
            Phase::Dawn => Phase::DayDiscussion,
            Phase::DayDiscussion => Phase::DayVote,
            Phase::DayVote => Phase::DayVoteResult,
            Phase::DayVoteResult => Phase::Night,
            Phase::GameOver => Phase::GameOver,
        }
    }

    /// Returns true if `to` is a legal successor of this phase.
    ///
    /// Any non-terminal phase may jump to `GameOver`.
    pub fn can_transition_to(self, to: Phase) -> bool {
        to == self.next() || (to == Phase::GameOver && self != Phase::GameOver)
    }
}

/// Win-condition grouping a role belongs to.
///
/// Serialized as its plain string form so custom teams round-trip.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Display)]
#[serde(from = "String", into = "String")]
pub enum Team {
    /// The village (uninformed majority).
    #[display("village")]
    Village,
    /// The werewolf pack (informed minority).
    #[display("werewolf")]
    Werewolf,
    /// Placeholder used when a view scrubs another player's team.
    #[display("unknown")]
    Unknown,
    /// A team added by a custom role.
    #[display("{_0}")]
    Custom(String),
}

impl From<String> for Team {
    fn from(value: String) -> Self {
        match value.as_str() {
            "village" => Team::Village,
            "werewolf" => Team::Werewolf,
            "unknown" => Team::Unknown,
            _ => Team::Custom(value),
        }
    }
}

impl From<&str> for Team {
    fn from(value: &str) -> Self {
        Team::from(value.to_string())
    }
}

impl From<Team> for String {
    fn from(team: Team) -> Self {
        team.to_string()
    }
}

/// Why a player left the game.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display)]
#[serde(rename_all = "snake_case")]
pub enum EliminationCause {
    /// Voted out during the day.
    #[display("vote")]
    Vote,
    /// Killed by the werewolves at night.
    #[display("wolf_kill")]
    WolfKill,
}

/// Named communication channel a speech was made on.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Display)]
#[serde(rename_all = "snake_case")]
pub enum ChannelId {
    /// Town square, everyone reads.
    #[display("public")]
    Public,
    /// Private pack channel.
    #[display("wolf")]
    Wolf,
    /// Private channel between two players; ids kept in sorted order.
    #[display("dm:{_0}:{_1}")]
    Direct(PlayerId, PlayerId),
}

impl ChannelId {
    /// Builds a direct-message channel id with canonical member ordering.
    pub fn direct(a: PlayerId, b: PlayerId) -> Self {
        if a <= b {
            ChannelId::Direct(a, b)
        } else {
            ChannelId::Direct(b, a)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_phase_cycle_loops_back_to_night() {
        let mut phase = Phase::Setup;
        let mut seen = Vec::new();
        for _ in 0..7 {
            phase = phase.next();
            seen.push(phase);
        }
        assert_eq!(
            seen,
            vec![
                Phase::Night,
                Phase::Dawn,
                Phase::DayDiscussion,
                Phase::DayVote,
                Phase::DayVoteResult,
                Phase::Night,
                Phase::Dawn,
            ]
        );
    }

    #[test]
    fn test_phase_game_over_reachable_from_any_live_phase() {
        assert!(Phase::Dawn.can_transition_to(Phase::GameOver));
        assert!(Phase::DayVoteResult.can_transition_to(Phase::GameOver));
        assert!(!Phase::GameOver.can_transition_to(Phase::Night));
        assert!(!Phase::Night.can_transition_to(Phase::DayVote));
    }

    #[test]
    fn test_phase_parses_case_insensitively() {
        assert_eq!(Phase::from_str("day_vote").unwrap(), Phase::DayVote);
        assert_eq!(Phase::from_str("NIGHT").unwrap(), Phase::Night);
    }

    #[test]
    fn test_team_round_trips_custom_names() {
        assert_eq!(Team::from("village"), Team::Village);
        assert_eq!(Team::from("cult"), Team::Custom("cult".to_string()));
        assert_eq!(Team::Custom("cult".to_string()).to_string(), "cult");
        let json = serde_json::to_string(&Team::Werewolf).unwrap();
        assert_eq!(json, "\"werewolf\"");
    }

    #[test]
    fn test_direct_channel_is_order_independent() {
        let a = ChannelId::direct(PlayerId::from("p2"), PlayerId::from("p1"));
        let b = ChannelId::direct(PlayerId::from("p1"), PlayerId::from("p2"));
        assert_eq!(a, b);
        assert_eq!(a.to_string(), "dm:p1:p2");
    }
}
