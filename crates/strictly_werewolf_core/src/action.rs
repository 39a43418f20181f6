//! First-class action types submitted by agents.
//!
//! Actions are intents, not side effects. The moderator is the only
//! component that turns an action into events or state.

use crate::PlayerId;
use derive_more::Display;
use serde::{Deserialize, Serialize};

/// A player-submitted intent for one phase-turn.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Display)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Action {
    /// Say something on the channel the phase allows.
    #[display("speak({content:?})")]
    Speak {
        /// Speech text.
        content: String,
    },
    /// Vote to eliminate a player; `None` abstains.
    #[display("vote({})", target.as_ref().map(|t| t.as_str()).unwrap_or("no_one"))]
    Vote {
        /// Voted player, if any.
        target: Option<PlayerId>,
    },
    /// Use a role ability on a target.
    #[display("use_ability({ability}, {target})")]
    UseAbility {
        /// Ability name as defined by the role.
        ability: String,
        /// Target player.
        target: PlayerId,
    },
    /// Chose not to act, or a fallback after failure.
    #[display("no_action({reason})")]
    NoAction {
        /// Short machine-readable reason.
        reason: String,
    },
}

impl Action {
    /// Creates a [`Action::NoAction`] with the given reason.
    pub fn no_action(reason: impl Into<String>) -> Self {
        Action::NoAction {
            reason: reason.into(),
        }
    }

    /// Creates an abstaining vote.
    pub fn abstain() -> Self {
        Action::Vote { target: None }
    }

    /// Short name of the action kind, used in logs and metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            Action::Speak { .. } => "speak",
            Action::Vote { .. } => "vote",
            Action::UseAbility { .. } => "use_ability",
            Action::NoAction { .. } => "no_action",
        }
    }
}
