//! Tests that agents never learn hidden roles through briefings or tools.
//!
//! Every text an agent receives is captured, then checked against the
//! true roster: a role or team word may only appear when the reader owns
//! it, a dead player revealed it, or the reader investigated its holder.

use anyhow::Result;
use regex::Regex;
use std::collections::BTreeSet;
use std::sync::{Arc, Mutex};
use strictly_werewolf::{
    Action, Agent, ChannelId, CommunicationConfig, EventKind, Game, GameConfig, GameState, GameStateView, PlayerId,
    RandomAgent, RoleRegistry, Team, Toolkit,
};

const PROBES: [&str; 6] = [
    "get_alive_players",
    "get_all_players",
    "get_day_events",
    "get_vote_history",
    "read_notes",
    "read_assessments",
];

/// Everything one player saw during one turn.
#[derive(Debug, Clone)]
struct Turn {
    reader: PlayerId,
    alive: Vec<PlayerId>,
    revealed: Vec<PlayerId>,
    texts: Vec<String>,
}

type Log = Arc<Mutex<Vec<Turn>>>;

/// Probes every read-only tool, then lets a random agent act.
struct ProbingAgent {
    inner: RandomAgent,
    log: Log,
}

#[async_trait::async_trait]
impl Agent for ProbingAgent {
    fn name(&self) -> &str {
        self.inner.name()
    }

    async fn run_phase(&mut self, briefing: &str, toolkit: &mut Toolkit<'_>, max_rounds: Option<usize>) -> Result<Action> {
        let view = toolkit.view();
        let reader = view.my_player().player_id().clone();
        let alive = view.alive_players().iter().map(|p| p.player_id().clone()).collect();
        let revealed = view
            .events()
            .iter()
            .filter_map(|e| match &e.kind {
                EventKind::PrivateReveal { subject_id, .. } => Some(subject_id.clone()),
                _ => None,
            })
            .collect();

        let mut texts = vec![briefing.to_string()];
        let mut early = None;
        for probe in PROBES {
            let result = toolkit.invoke(probe, "");
            texts.push(result.output().clone());
            if let Some(action) = result.into_action() {
                early = Some(action);
                break;
            }
        }
        self.log
            .lock()
            .expect("not poisoned")
            .push(Turn {
                reader,
                alive,
                revealed,
                texts,
            });
        match early {
            Some(action) => Ok(action),
            None => self.inner.run_phase(briefing, toolkit, max_rounds).await,
        }
    }
}

fn labels(state: &GameState, id: &PlayerId) -> Vec<String> {
    state
        .get_player(id)
        .map(|p| vec![p.role().clone(), p.team().to_string()])
        .unwrap_or_default()
}

/// Role and team words `turn.reader` must not see.
fn forbidden(state: &GameState, turn: &Turn) -> BTreeSet<String> {
    let hidden: BTreeSet<String> = turn
        .alive
        .iter()
        .filter(|id| **id != turn.reader && !turn.revealed.contains(id))
        .flat_map(|id| labels(state, id))
        .collect();
    let mut allowed: BTreeSet<String> = labels(state, &turn.reader).into_iter().collect();
    allowed.extend(turn.revealed.iter().flat_map(|id| labels(state, id)));
    allowed.extend(
        state
            .players()
            .iter()
            .filter(|p| !turn.alive.contains(p.player_id()))
            .flat_map(|p| labels(state, p.player_id())),
    );
    hidden.difference(&allowed).cloned().collect()
}

async fn probed_game(seed: u64) -> (GameState, Vec<Turn>) {
    let log = Log::default();
    let config = GameConfig::default()
        .with_seed(seed)
        .with_max_rounds(20)
        .with_communication(CommunicationConfig::default().with_allow_dms(true));
    let record = Game::new(config, RoleRegistry::with_builtins())
        .run_with(|seat, agent_seed| {
            Box::new(ProbingAgent {
                inner: RandomAgent::new(seat.slot().name().clone(), agent_seed),
                log: log.clone(),
            }) as Box<dyn Agent>
        })
        .await
        .expect("valid config");
    let turns = log.lock().expect("not poisoned").clone();
    (record.final_state().clone(), turns)
}

#[tokio::test]
async fn test_no_hidden_role_reaches_any_agent() {
    for seed in [1, 2, 3] {
        let (state, turns) = probed_game(seed).await;
        assert!(!turns.is_empty());
        for turn in &turns {
            for word in forbidden(&state, turn) {
                let pattern = Regex::new(&format!(r"(?i)\b{}\b", regex::escape(&word))).expect("valid pattern");
                for text in &turn.texts {
                    assert!(
                        !pattern.is_match(text),
                        "seed {}: {} saw '{}' in:\n{}",
                        seed,
                        turn.reader,
                        word,
                        text
                    );
                }
            }
        }
    }
}

#[tokio::test]
async fn test_views_hide_private_events() {
    let (state, _) = probed_game(4).await;
    for player in state.players() {
        let me = player.player_id();
        let view = GameStateView::new(&state, me).expect("seated");
        for event in view.events() {
            match &event.kind {
                EventKind::PrivateReveal { player_id, .. }
                | EventKind::AbilityUse { player_id, .. }
                | EventKind::Reasoning { player_id, .. } => assert_eq!(player_id, me),
                EventKind::Speech {
                    channel: ChannelId::Wolf,
                    ..
                } => assert_eq!(*player.team(), Team::Werewolf),
                EventKind::Speech {
                    channel: ChannelId::Direct(a, b),
                    ..
                } => assert!(a == me || b == me),
                _ => {}
            }
        }

        for other in view.alive_players().iter().filter(|p| p.player_id() != me) {
            assert_eq!(other.role(), "unknown");
            assert_eq!(*other.team(), Team::Unknown);
        }
    }
}
