//! Agent trait and built-in implementations.

mod human;
mod random;
mod scripted;

pub use human::HumanAgent;
pub use random::RandomAgent;
pub use scripted::{ScriptedAgent, Transcript};

use crate::config::AgentKind;
use crate::toolkit::Toolkit;
use anyhow::Result;
use strictly_werewolf_core::{Action, GameEnd};

/// Something that plays a seat.
///
/// An agent sees only its briefing and toolkit. Errors and panics are
/// caught by the moderator and turned into a `NoAction` for the turn.
#[async_trait::async_trait]
pub trait Agent: Send {
    /// Display name of the agent.
    fn name(&self) -> &str;

    /// Plays one turn and returns its action.
    ///
    /// `max_rounds` overrides the toolkit's invocation budget when set lower.
    async fn run_phase(&mut self, briefing: &str, toolkit: &mut Toolkit<'_>, max_rounds: Option<usize>)
    -> Result<Action>;

    /// Called once when the game ends.
    async fn on_game_end(&mut self, _end: &GameEnd) {}
}

/// Builds the configured agent for a seat.
///
/// Human seats read stdin, so this must run inside a tokio runtime.
pub fn build_agent(kind: AgentKind, name: &str, seed: u64) -> Box<dyn Agent> {
    match kind {
        AgentKind::Random => Box::new(RandomAgent::new(name, seed)),
        AgentKind::Scripted => Box::new(ScriptedAgent::new(name, Vec::new())),
        AgentKind::Human => Box::new(HumanAgent::stdin(name)),
    }
}

/// Effective round budget for a turn.
pub(crate) fn round_budget(toolkit: &Toolkit<'_>, max_rounds: Option<usize>) -> usize {
    max_rounds.map_or(toolkit.max_rounds(), |m| m.min(toolkit.max_rounds()))
}
