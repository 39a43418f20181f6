//! Human player driven by typed tool invocations.

use super::{Agent, round_budget};
use crate::toolkit::{Toolkit, parse_invocation};
use anyhow::Result;
use strictly_werewolf_core::{Action, GameEnd};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tracing::debug;

/// Human player reading `USE: tool(args)` lines.
pub struct HumanAgent {
    name: String,
    input_rx: mpsc::UnboundedReceiver<String>,
    echo: bool,
}

impl HumanAgent {
    /// Creates a human agent fed from a channel of input lines.
    pub fn new(name: impl Into<String>, input_rx: mpsc::UnboundedReceiver<String>) -> Self {
        Self {
            name: name.into(),
            input_rx,
            echo: false,
        }
    }

    /// Creates a human agent reading stdin and printing to stdout.
    ///
    /// Must be called inside a tokio runtime. Only one stdin agent may
    /// exist per process; `GameConfig::validate` rejects a second human seat.
    pub fn stdin(name: impl Into<String>) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        tokio::spawn(async move {
            let mut lines = BufReader::new(tokio::io::stdin()).lines();
            while let Ok(Some(line)) = lines.next_line().await {
                if tx.send(line).is_err() {
                    break;
                }
            }
        });
        Self {
            name: name.into(),
            input_rx: rx,
            echo: true,
        }
    }

    fn show(&self, text: &str) {
        if self.echo {
            println!("{}", text);
        }
    }
}

#[async_trait::async_trait]
impl Agent for HumanAgent {
    fn name(&self) -> &str {
        &self.name
    }

    async fn run_phase(
        &mut self,
        briefing: &str,
        toolkit: &mut Toolkit<'_>,
        max_rounds: Option<usize>,
    ) -> Result<Action> {
        self.show(briefing);
        self.show(&toolkit.format_for_prompt());
        let budget = round_budget(toolkit, max_rounds);
        let mut used = 0;
        while used < budget {
            let Some(line) = self.input_rx.recv().await else {
                anyhow::bail!("Input channel closed");
            };
            let Some((tool, args)) = parse_invocation(&line) else {
                self.show("Type a tool call as: USE: tool_name(args)");
                continue;
            };
            used += 1;
            let result = toolkit.invoke(&tool, &args);
            debug!(agent = %self.name, %tool, terminal = result.is_terminal(), "Human invocation");
            self.show(result.output());
            if let Some(action) = result.into_action() {
                return Ok(action);
            }
        }
        Ok(toolkit.fallback_action())
    }

    async fn on_game_end(&mut self, end: &GameEnd) {
        self.show(&format!("Game over: {}. {}", end.outcome(), end.reason()));
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

    #[tokio::test]
    async fn test_human_lines_drive_toolkit() {
        let state = GameState::new(vec![
            PlayerSlot::new("p1", "Ash", "werewolf", Team::Werewolf),
            PlayerSlot::new("p2", "Birch", "villager", Team::Village),
        ])
        .expect("valid roster");
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
        let (tx, rx) = mpsc::unbounded_channel();
        for line in ["hello?", "USE: write_notes(Ash is quiet)", "USE: speak(Ash, why so quiet?)"] {
            tx.send(line.to_string()).expect("receiver alive");
        }
        let mut agent = HumanAgent::new("Birch", rx);
        let action = agent.run_phase("", &mut toolkit, None).await.expect("human input");
        assert_eq!(
            action,
            Action::Speak {
                content: "Ash, why so quiet?".into()
            }
        );
        assert_eq!(toolkit.knowledge().read_notes(), "- Ash is quiet");
    }

    #[tokio::test]
    async fn test_closed_input_is_an_error() {
        let state = GameState::new(vec![PlayerSlot::new("p1", "Ash", "villager", Team::Village)])
            .expect("valid roster");
        let briefings = BriefingBuilder::new(NameBook::new(state.players()), false, 1);
        let mut kb = KnowledgeBase::new("Ash");
        let view = GameStateView::new(&state, &"p1".into()).expect("seated");
        let mut toolkit = Toolkit::new(
            TurnKind::Reflection,
            view,
            &briefings,
            &mut kb,
            ToolkitSettings::new(6, 100, false, false, 1),
        );
        let (tx, rx) = mpsc::unbounded_channel::<String>();
        drop(tx);
        let mut agent = HumanAgent::new("Ash", rx);
        assert!(agent.run_phase("", &mut toolkit, None).await.is_err());
    }
}
