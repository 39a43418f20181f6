//! Agent that replays fixed tool invocations.

use super::{Agent, round_budget};
use crate::toolkit::{Toolkit, parse_invocation};
use anyhow::Result;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use strictly_werewolf_core::{Action, GameEnd};
use tracing::debug;

/// Shared record of every briefing and tool output an agent received.
pub type Transcript = Arc<Mutex<Vec<String>>>;

/// Replays a queue of `(tool, args)` steps.
///
/// A turn consumes steps until one is terminal. When the queue runs dry
/// the agent passes. A repeating script is refilled at the start of
/// every turn.
#[derive(Debug, Default)]
pub struct ScriptedAgent {
    name: String,
    queue: VecDeque<(String, String)>,
    repeat: Vec<(String, String)>,
    transcript: Option<Transcript>,
}

impl ScriptedAgent {
    /// Creates an agent that plays `steps` once across the game.
    pub fn new(name: impl Into<String>, steps: Vec<(String, String)>) -> Self {
        Self {
            name: name.into(),
            queue: steps.into(),
            ..Self::default()
        }
    }

    /// Creates an agent that plays `steps` at the start of every turn.
    pub fn repeating(name: impl Into<String>, steps: Vec<(String, String)>) -> Self {
        Self {
            name: name.into(),
            repeat: steps,
            ..Self::default()
        }
    }

    /// Parses `USE: tool(args)` lines into a one-shot script; other lines are skipped.
    pub fn from_lines<'a>(name: impl Into<String>, lines: impl IntoIterator<Item = &'a str>) -> Self {
        Self::new(name, lines.into_iter().filter_map(parse_invocation).collect())
    }

    /// Records briefings and tool outputs into `transcript`.
    pub fn with_transcript(mut self, transcript: Transcript) -> Self {
        self.transcript = Some(transcript);
        self
    }

    fn record(&self, text: &str) {
        if let Some(transcript) = &self.transcript {
            transcript
                .lock()
                .unwrap_or_else(|poisoned| poisoned.into_inner())
                .push(text.to_string());
        }
    }
}

#[async_trait::async_trait]
impl Agent for ScriptedAgent {
    fn name(&self) -> &str {
        &self.name
    }

    async fn run_phase(
        &mut self,
        briefing: &str,
        toolkit: &mut Toolkit<'_>,
        max_rounds: Option<usize>,
    ) -> Result<Action> {
        self.record(briefing);
        if self.queue.is_empty() {
            self.queue.extend(self.repeat.iter().cloned());
        }
        let budget = round_budget(toolkit, max_rounds);
        for _ in 0..budget {
            let Some((tool, args)) = self.queue.pop_front() else {
                break;
            };
            let result = toolkit.invoke(&tool, &args);
            debug!(agent = %self.name, %tool, terminal = result.is_terminal(), "Scripted step");
            self.record(result.output());
            if let Some(action) = result.into_action() {
                return Ok(action);
            }
        }
        if self.repeat.is_empty() {
            Ok(toolkit.invoke("pass_turn", "").into_action().unwrap_or_else(|| toolkit.fallback_action()))
        } else {
            self.queue.clear();
            Ok(toolkit.fallback_action())
        }
    }

    async fn on_game_end(&mut self, end: &GameEnd) {
        self.record(&format!("Game over: {}. {}", end.outcome(), end.reason()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::briefing::BriefingBuilder;
    use crate::knowledge_base::KnowledgeBase;
    use crate::names::NameBook;
    use crate::toolkit::{ToolkitSettings, TurnKind};
    use strictly_werewolf_core::{GameState, GameStateView, PlayerSlot, Team};

    fn state() -> GameState {
        GameState::new(vec![
            PlayerSlot::new("p1", "Ash", "werewolf", Team::Werewolf),
            PlayerSlot::new("p2", "Birch", "villager", Team::Village),
        ])
        .expect("valid roster")
    }

    #[tokio::test]
    async fn test_script_retries_after_invalid_target() {
        let state = state();
        let briefings = BriefingBuilder::new(NameBook::new(state.players()), false, 1);
        let mut kb = KnowledgeBase::new("Birch");
        let view = GameStateView::new(&state, &"p2".into()).expect("seated");
        let mut toolkit = Toolkit::new(
            TurnKind::Vote,
            view,
            &briefings,
            &mut kb,
            ToolkitSettings::new(6, 100, false, false, 1),
        );
        let transcript = Transcript::default();
        let mut agent =
            ScriptedAgent::from_lines("Birch", ["USE: vote(Zed)", "chatter", "USE: vote(Ash)"])
                .with_transcript(transcript.clone());

        let action = agent.run_phase("brief", &mut toolkit, None).await.expect("scripted");
        assert_eq!(action, Action::Vote { target: Some("p1".into()) });
        let lines = transcript.lock().expect("not poisoned").clone();
        assert_eq!(lines[0], "brief");
        assert!(lines[1].starts_with("Error: 'Zed' is not a valid target"));
    }

    #[tokio::test]
    async fn test_empty_script_passes() {
        let state = state();
        let briefings = BriefingBuilder::new(NameBook::new(state.players()), false, 1);
        let mut kb = KnowledgeBase::new("Birch");
        let view = GameStateView::new(&state, &"p2".into()).expect("seated");
        let mut toolkit = Toolkit::new(
            TurnKind::Discussion,
            view,
            &briefings,
            &mut kb,
            ToolkitSettings::new(6, 100, false, false, 1),
        );
        let mut agent = ScriptedAgent::new("Birch", Vec::new());
        let action = agent.run_phase("", &mut toolkit, None).await.expect("scripted");
        assert_eq!(action, Action::no_action("pass_turn"));
    }
}
