//! Seeded random baseline.

use super::Agent;
use crate::toolkit::{Toolkit, TurnKind};
use anyhow::Result;
use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use strictly_werewolf_core::Action;
use tracing::debug;

const LINES: [&str; 5] = [
    "I don't have a strong read yet.",
    "Let's hear from the quieter players.",
    "I'm watching how people vote today.",
    "Something about last night doesn't add up.",
    "I'll keep an open mind for now.",
];

const PACK_LINES: [&str; 3] = [
    "Let's pick someone who won't be missed.",
    "I'll follow your lead tonight.",
    "Agreed, let's keep it quiet.",
];

/// Picks uniformly among valid choices. Never writes notes.
#[derive(Debug)]
pub struct RandomAgent {
    name: String,
    rng: StdRng,
}

impl RandomAgent {
    /// Creates a random agent with its own seed.
    pub fn new(name: impl Into<String>, seed: u64) -> Self {
        Self {
            name: name.into(),
            rng: StdRng::seed_from_u64(seed),
        }
    }

    fn pick(&mut self, options: &[String]) -> Option<String> {
        options.choose(&mut self.rng).cloned()
    }

    fn pick_line(&mut self, lines: &[&str]) -> String {
        lines.choose(&mut self.rng).map(|l| l.to_string()).unwrap_or_default()
    }
}

#[async_trait::async_trait]
impl Agent for RandomAgent {
    fn name(&self) -> &str {
        &self.name
    }

    async fn run_phase(
        &mut self,
        _briefing: &str,
        toolkit: &mut Toolkit<'_>,
        _max_rounds: Option<usize>,
    ) -> Result<Action> {
        let targets = toolkit.valid_targets();
        let (tool, args) = match toolkit.kind() {
            TurnKind::Vote => ("vote", self.pick(&targets).unwrap_or_else(|| "no_one".to_string())),
            TurnKind::Night(Some(_)) => match self.pick(&targets) {
                Some(target) => ("use_ability", target),
                None => ("pass_turn", String::new()),
            },
            TurnKind::Discussion => ("speak", self.pick_line(&LINES)),
            TurnKind::WolfChat => ("wolf_say", self.pick_line(&PACK_LINES)),
            TurnKind::Night(None) | TurnKind::GameStart | TurnKind::Reflection => ("pass_turn", String::new()),
        };
        debug!(agent = %self.name, tool, args = %args, "Random choice");
        if tool != "pass_turn" {
            toolkit.record_reasoning(format!("Chose {}({}) at random.", tool, args));
        }
        let result = toolkit.invoke(tool, &args);
        Ok(result.into_action().unwrap_or_else(|| toolkit.fallback_action()))
    }
}
