//! Phase driver.
//!
//! The moderator briefs agents, hands them per-turn toolkits, collects
//! their actions and turns valid ones into events and state. It is the
//! only writer of night actions and the only emitter of events.
//!
//! Agent turns within a phase run concurrently except for the pack chat
//! and discussion rounds, which are sequential so each speaker sees the
//! speeches before theirs. A failing, panicking or slow agent yields a
//! `NoAction` for that turn; the phase always completes.

use crate::agents::Agent;
use crate::briefing::BriefingBuilder;
use crate::config::GameConfig;
use crate::knowledge_base::KnowledgeBase;
use crate::listener::EventListener;
use crate::names::NameBook;
use crate::toolkit::{Toolkit, ToolkitSettings, TurnKind, ability_targets, clean_speech, vote_targets};
use futures::FutureExt;
use futures::future::join_all;
use rand::rngs::StdRng;
use rand::{RngCore, SeedableRng};
use std::collections::HashMap;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::time::Duration;
use strictly_werewolf_core::{
    Ability, Action, ChannelId, ChannelManager, EventKind, GameEnd, GameEvent, GameState, GameStateView, Message,
    Phase, PlayerId, RoleRegistry, Team, VoteResult, apply_vote_result, resolve_night, tally_votes,
};
use tracing::{debug, info, instrument, warn};

/// Round cap for the game-start turn.
pub const GAME_START_ROUNDS: usize = 3;

/// One seated agent and its private memory.
pub struct Seat {
    player_id: PlayerId,
    agent: Box<dyn Agent>,
    kb: KnowledgeBase,
}

impl Seat {
    /// Seat id.
    pub fn player_id(&self) -> &PlayerId {
        &self.player_id
    }

    /// The seat's knowledge base.
    pub fn knowledge(&self) -> &KnowledgeBase {
        &self.kb
    }
}

/// What one agent turn produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TurnOutcome {
    /// Acting player.
    pub player_id: PlayerId,
    /// Returned action, or the substituted fallback.
    pub action: Action,
    /// Reasoning the agent attached.
    pub reasoning: Vec<String>,
    /// Direct messages queued during the turn.
    pub outbox: Vec<(PlayerId, String)>,
}

struct Request {
    player_id: PlayerId,
    kind: TurnKind,
    briefing: String,
    settings: ToolkitSettings,
}

/// Drives one game's phases.
pub struct Moderator {
    config: GameConfig,
    registry: RoleRegistry,
    seats: Vec<Seat>,
    briefings: BriefingBuilder,
    channels: ChannelManager,
    listeners: Vec<Box<dyn EventListener>>,
    rng: StdRng,
}

impl Moderator {
    /// Seats `agents` at the table described by `state`.
    ///
    /// Agents are matched to seats by id; seats without an agent are
    /// skipped when soliciting turns.
    pub fn new(
        config: GameConfig,
        registry: RoleRegistry,
        state: &GameState,
        agents: Vec<(PlayerId, Box<dyn Agent>)>,
        seed: u64,
    ) -> Self {
        let mut rng = StdRng::seed_from_u64(seed);
        let names = NameBook::new(state.players());
        let mut agents: HashMap<PlayerId, Box<dyn Agent>> = agents.into_iter().collect();
        let seats = state
            .players()
            .iter()
            .filter_map(|slot| {
                let agent = agents.remove(slot.player_id())?;
                Some(Seat {
                    player_id: slot.player_id().clone(),
                    agent,
                    kb: KnowledgeBase::new(slot.name().clone()),
                })
            })
            .collect();

        let ids: Vec<PlayerId> = state.players().iter().map(|p| p.player_id().clone()).collect();
        let wolves: Vec<PlayerId> = state
            .players_by_team(&Team::Werewolf)
            .into_iter()
            .map(|p| p.player_id().clone())
            .collect();
        let mut channels = ChannelManager::new();
        channels.create_channels(&ids, &wolves, config.channel_policy());

        let briefings = BriefingBuilder::new(names, *config.randomize_names(), rng.next_u64());
        Self {
            config,
            registry,
            seats,
            briefings,
            channels,
            listeners: Vec::new(),
            rng,
        }
    }

    /// Registers an event listener.
    pub fn add_listener(&mut self, listener: Box<dyn EventListener>) {
        self.listeners.push(listener);
    }

    /// Seated agents in table order.
    pub fn seats(&self) -> &[Seat] {
        &self.seats
    }

    /// Loads prior-game learnings into every knowledge base.
    pub fn inject_learnings(&mut self, lookup: impl Fn(&str) -> Vec<String>) {
        for seat in &mut self.seats {
            let learnings = lookup(seat.kb.player_name());
            if !learnings.is_empty() {
                seat.kb.inject_learnings(&learnings);
            }
        }
    }

    /// Learnings from this game, keyed by display name.
    pub fn extract_learnings(&self, game_number: u32) -> Vec<(String, Vec<String>)> {
        self.seats
            .iter()
            .map(|s| (s.kb.player_name().to_string(), s.kb.extract_learnings(game_number)))
            .filter(|(_, learnings)| !learnings.is_empty())
            .collect()
    }

    /// Moves to `to`, advancing the day when a night begins.
    pub fn advance(&mut self, state: GameState, to: Phase) -> GameState {
        let from = state.phase();
        if !from.can_transition_to(to) {
            warn!(%from, %to, "Unexpected phase transition");
        }
        let day = if to == Phase::Night { state.day() + 1 } else { state.day() };
        info!(day, %from, %to, "Phase change");
        let next = state.with_day(day).with_phase(to);
        self.emit(
            next,
            GameEvent::new(
                day,
                to,
                EventKind::PhaseChange {
                    old_phase: from,
                    new_phase: to,
                },
            ),
        )
    }

    /// Role reveal turn for every player.
    #[instrument(skip_all)]
    pub async fn run_game_start(&mut self, state: GameState) -> GameState {
        let rounds = (*self.config.max_rounds()).min(GAME_START_ROUNDS);
        let empty = KnowledgeBase::default();
        let mut requests = Vec::new();
        for id in state.alive_ids() {
            let Some(role) = state
                .get_player(&id)
                .and_then(|p| self.registry.get(p.role()))
                .cloned()
            else {
                warn!(player = %id, "Seat has no registered role; skipping game start");
                continue;
            };
            let Ok(view) = GameStateView::new(&state, &id) else {
                continue;
            };
            let kb = kb_of(&self.seats, &id).unwrap_or(&empty);
            let briefing = self.briefings.game_start(&view, &role, kb);
            let settings = self.settings(rounds);
            requests.push(Request {
                player_id: id,
                kind: TurnKind::GameStart,
                briefing,
                settings,
            });
        }
        let outcomes = self.solicit_all(&state, requests).await;
        self.record_reasoning(state, &outcomes)
    }

    /// Night: optional pack chat, then one ability turn per eligible player.
    ///
    /// Players without a night ability are not asked.
    #[instrument(skip_all, fields(day = state.day()))]
    pub async fn run_night(&mut self, state: GameState) -> GameState {
        let state = state.clear_night_actions();
        let mut state = self.run_wolf_chat(state).await;
        let day = state.day();
        let rounds = *self.config.max_rounds();
        let empty = KnowledgeBase::default();

        let mut requests = Vec::new();
        for id in state.alive_ids() {
            let Some(ability) = self.night_ability(&state, &id) else {
                continue;
            };
            let Ok(view) = GameStateView::new(&state, &id) else {
                continue;
            };
            let targets = self.briefings.names().names(&ability_targets(&view, &ability));
            let chat = if *view.my_player().team() == Team::Werewolf {
                self.pack_lines(&id, day)
            } else {
                Vec::new()
            };
            let kb = kb_of(&self.seats, &id).unwrap_or(&empty);
            let briefing = self.briefings.night(&view, kb, Some(&ability), targets, &chat);
            let settings = self.settings(rounds);
            requests.push(Request {
                player_id: id,
                kind: TurnKind::Night(Some(ability)),
                briefing,
                settings,
            });
        }

        let outcomes = self.solicit_all(&state, requests).await;
        state = self.record_reasoning(state, &outcomes);
        for outcome in outcomes {
            let id = outcome.player_id;
            match self.accept_ability(&state, &id, outcome.action) {
                Ok((ability, target)) => {
                    debug!(player = %id, %ability, %target, "Night action recorded");
                    state = state.with_night_action(
                        id.clone(),
                        Action::UseAbility {
                            ability: ability.clone(),
                            target: target.clone(),
                        },
                    );
                    state = self.emit(
                        state,
                        GameEvent::new(
                            day,
                            Phase::Night,
                            EventKind::AbilityUse {
                                player_id: id,
                                ability,
                                target_id: target,
                            },
                        ),
                    );
                }
                Err(fallback) => state = state.with_night_action(id, fallback),
            }
        }
        state
    }

    /// Sequential pack chat; each wolf sees the lines posted before theirs.
    async fn run_wolf_chat(&mut self, mut state: GameState) -> GameState {
        let wolves: Vec<PlayerId> = state
            .alive_players()
            .into_iter()
            .filter(|p| *p.team() == Team::Werewolf)
            .map(|p| p.player_id().clone())
            .collect();
        if !*self.config.communication().allow_wolf_chat() || wolves.len() < 2 {
            return state;
        }

        let day = state.day();
        let rounds = *self.config.max_rounds();
        let empty = KnowledgeBase::default();
        let mut posted = 0;
        for id in wolves {
            let briefing = {
                let Ok(view) = GameStateView::new(&state, &id) else {
                    continue;
                };
                let prior = self.pack_lines(&id, day);
                let kb = kb_of(&self.seats, &id).unwrap_or(&empty);
                self.briefings.wolf_chat(&view, kb, &prior)
            };
            let settings = self.settings(rounds);
            let outcome = self.solicit_one(&state, id.clone(), TurnKind::WolfChat, briefing, settings).await;
            state = self.record_reasoning(state, std::slice::from_ref(&outcome));
            if let Action::Speak { content } = outcome.action {
                let (next, accepted) = self.speak(state, &id, ChannelId::Wolf, &content);
                state = next;
                posted += usize::from(accepted.is_some());
            }
        }
        debug!(messages = posted, "Pack chat finished");
        state
    }

    /// Tonight's pack messages readable by `reader`, as `Name: text`.
    fn pack_lines(&self, reader: &PlayerId, day: u32) -> Vec<String> {
        self.channels
            .visible_messages(reader)
            .into_iter()
            .filter(|m| *m.channel() == ChannelId::Wolf && *m.day() == day)
            .map(|m| format!("{}: {}", self.briefings.names().name(m.sender_id()), m.content()))
            .collect()
    }

    /// Dawn: resolves the night and emits its events.
    #[instrument(skip_all, fields(day = state.day()))]
    pub fn run_dawn(&mut self, state: GameState) -> GameState {
        let (next, events) = resolve_night(&state, &self.registry, &mut self.rng);
        self.notify(&events);
        next
    }

    /// Discussion rounds; each alive player speaks once per round in seat order.
    #[instrument(skip_all, fields(day = state.day()))]
    pub async fn run_discussion(&mut self, mut state: GameState) -> GameState {
        let rounds = *self.config.communication().discussion_rounds();
        let max_rounds = *self.config.max_rounds();
        let empty = KnowledgeBase::default();
        for round in 1..=rounds {
            debug!(round, "Discussion round");
            for id in state.alive_ids() {
                let briefing = {
                    let Ok(view) = GameStateView::new(&state, &id) else {
                        continue;
                    };
                    let speeches = self.briefings.discussion_speeches(&view);
                    let kb = kb_of(&self.seats, &id).unwrap_or(&empty);
                    self.briefings.discussion(&view, kb, &speeches)
                };
                let settings = self.settings(max_rounds);
                let outcome = self
                    .solicit_one(&state, id.clone(), TurnKind::Discussion, briefing, settings)
                    .await;
                state = self.record_reasoning(state, std::slice::from_ref(&outcome));
                for (to, text) in &outcome.outbox {
                    state = self.speak(state, &id, ChannelId::direct(id.clone(), to.clone()), text).0;
                }
                if let Action::Speak { content } = &outcome.action {
                    state = self.speak(state, &id, ChannelId::Public, content).0;
                }
            }
        }
        state
    }

    /// Vote: every alive player votes, then the ballots are tallied.
    ///
    /// One vote event per voter precedes the tally. Votes for dead, absent
    /// or self targets count as abstentions.
    #[instrument(skip_all, fields(day = state.day()))]
    pub async fn run_vote(&mut self, mut state: GameState) -> (GameState, VoteResult) {
        let rounds = *self.config.max_rounds();
        let empty = KnowledgeBase::default();
        let mut requests = Vec::new();
        for id in state.alive_ids() {
            let Ok(view) = GameStateView::new(&state, &id) else {
                continue;
            };
            let targets = self.briefings.names().names(&vote_targets(&view));
            let kb = kb_of(&self.seats, &id).unwrap_or(&empty);
            let briefing = self.briefings.vote(&view, kb, targets);
            let settings = self.settings(rounds);
            requests.push(Request {
                player_id: id,
                kind: TurnKind::Vote,
                briefing,
                settings,
            });
        }

        let outcomes = self.solicit_all(&state, requests).await;
        state = self.record_reasoning(state, &outcomes);
        let day = state.day();
        let mut ballots = Vec::new();
        for outcome in outcomes {
            let voter = outcome.player_id;
            let target = match outcome.action {
                Action::Vote { target: Some(target) } if is_vote_target(&state, &voter, &target) => Some(target),
                Action::Vote { target: Some(target) } => {
                    warn!(%voter, %target, "Invalid vote counted as abstention");
                    None
                }
                _ => None,
            };
            state = self.emit(
                state,
                GameEvent::new(
                    day,
                    Phase::DayVote,
                    EventKind::Vote {
                        voter_id: voter.clone(),
                        target_id: target.clone(),
                    },
                ),
            );
            ballots.push((voter, target));
        }

        let result = tally_votes(&ballots, *self.config.voting().tie_breaker(), &mut self.rng);
        state = self.emit(
            state,
            GameEvent::new(day, Phase::DayVote, EventKind::VoteResult(result.clone())),
        );
        (state, result)
    }

    /// Applies a tallied vote.
    #[instrument(skip_all, fields(eliminated = ?result.eliminated_id()))]
    pub fn run_vote_result(&mut self, state: GameState, result: &VoteResult) -> GameState {
        let (next, event) = apply_vote_result(&state, result);
        if let Some(event) = event {
            self.notify(std::slice::from_ref(&event));
        }
        next
    }

    /// Notes-only turn summarising visible events from `since` on.
    ///
    /// Does nothing when reflection is disabled.
    #[instrument(skip_all, fields(day = state.day()))]
    pub async fn run_reflection(&mut self, state: GameState, since: usize) -> GameState {
        if !*self.config.reflection() {
            return state;
        }
        let rounds = *self.config.max_rounds();
        let empty = KnowledgeBase::default();
        let mut requests = Vec::new();
        for id in state.alive_ids() {
            let Ok(view) = GameStateView::new(&state, &id) else {
                continue;
            };
            let summary = self.briefings.event_summary(&view, since);
            let kb = kb_of(&self.seats, &id).unwrap_or(&empty);
            let briefing = self.briefings.reflection(&view, kb, &summary);
            let settings = self.settings(rounds);
            requests.push(Request {
                player_id: id,
                kind: TurnKind::Reflection,
                briefing,
                settings,
            });
        }
        let outcomes = self.solicit_all(&state, requests).await;
        self.record_reasoning(state, &outcomes)
    }

    /// Enters `GAME_OVER`, records the end and tells every agent.
    #[instrument(skip_all, fields(outcome = %end.outcome()))]
    pub async fn finish(&mut self, state: GameState, end: GameEnd) -> GameState {
        let state = self.advance(state, Phase::GameOver);
        let day = state.day();
        let state = self.emit(
            state,
            GameEvent::new(day, Phase::GameOver, EventKind::GameEnd(end.clone())),
        );
        for seat in &mut self.seats {
            if AssertUnwindSafe(seat.agent.on_game_end(&end))
                .catch_unwind()
                .await
                .is_err()
            {
                warn!(player = %seat.player_id, "Agent panicked in on_game_end");
            }
        }
        state
    }

    fn settings(&mut self, max_rounds: usize) -> ToolkitSettings {
        let communication = self.config.communication();
        ToolkitSettings::new(
            max_rounds,
            *communication.max_speech_length(),
            *communication.allow_dms(),
            *self.config.randomize_names(),
            self.rng.next_u64(),
        )
    }

    fn night_ability(&self, state: &GameState, id: &PlayerId) -> Option<Ability> {
        let slot = state.get_player(id)?;
        let role = self.registry.get(slot.role())?;
        role.abilities_for(Phase::Night).first().map(|a| (*a).clone())
    }

    /// Checks a night answer against the offered ability and its targets.
    ///
    /// Returns the ability and target to record, or the no-action to store.
    fn accept_ability(&self, state: &GameState, id: &PlayerId, action: Action) -> Result<(String, PlayerId), Action> {
        let (name, target) = match action {
            Action::UseAbility { ability, target } => (ability, target),
            Action::NoAction { reason } => return Err(Action::NoAction { reason }),
            _ => return Err(Action::no_action("no_ability_used")),
        };
        let offered = self.night_ability(state, id);
        let legal = match (&offered, GameStateView::new(state, id)) {
            (Some(ability), Ok(view)) => *ability.name() == name && ability_targets(&view, ability).contains(&target),
            _ => false,
        };
        if legal {
            Ok((name, target))
        } else {
            warn!(player = %id, ability = %name, %target, "Illegal night action rejected");
            Err(Action::no_action("no_ability_used"))
        }
    }

    /// Cleans and posts speech if the channel allows it.
    ///
    /// Returns the text as posted, or `None` when it was empty after
    /// cleaning or refused by the channel.
    fn speak(
        &mut self,
        state: GameState,
        speaker: &PlayerId,
        channel: ChannelId,
        content: &str,
    ) -> (GameState, Option<String>) {
        let content = clean_speech(content, *self.config.communication().max_speech_length());
        if content.is_empty() {
            debug!(player = %speaker, %channel, "Empty speech dropped");
            return (state, None);
        }
        let message = Message::new(speaker.clone(), channel.clone(), content.clone(), state.day(), state.phase());
        if !self.channels.send(message) {
            return (state, None);
        }
        let event = GameEvent::new(
            state.day(),
            state.phase(),
            EventKind::Speech {
                player_id: speaker.clone(),
                content: content.clone(),
                channel,
            },
        );
        (self.emit(state, event), Some(content))
    }

    fn record_reasoning(&mut self, mut state: GameState, outcomes: &[TurnOutcome]) -> GameState {
        for outcome in outcomes {
            for reasoning in &outcome.reasoning {
                let event = GameEvent::new(
                    state.day(),
                    state.phase(),
                    EventKind::Reasoning {
                        player_id: outcome.player_id.clone(),
                        reasoning: reasoning.clone(),
                        action_type: outcome.action.kind().to_string(),
                    },
                );
                state = self.emit(state, event);
            }
        }
        state
    }

    fn emit(&mut self, state: GameState, event: GameEvent) -> GameState {
        self.notify(std::slice::from_ref(&event));
        state.with_event(event)
    }

    fn notify(&mut self, events: &[GameEvent]) {
        for event in events {
            for listener in &mut self.listeners {
                match catch_unwind(AssertUnwindSafe(|| listener.on_event(event))) {
                    Ok(Ok(())) => {}
                    Ok(Err(e)) => warn!(error = %e, event = event.kind.name(), "Listener failed"),
                    Err(_) => warn!(event = event.kind.name(), "Listener panicked"),
                }
            }
        }
    }

    async fn solicit_one(
        &mut self,
        state: &GameState,
        player_id: PlayerId,
        kind: TurnKind,
        briefing: String,
        settings: ToolkitSettings,
    ) -> TurnOutcome {
        let fallback = TurnOutcome {
            player_id: player_id.clone(),
            action: Action::no_action("no_agent"),
            reasoning: Vec::new(),
            outbox: Vec::new(),
        };
        let request = Request {
            player_id,
            kind,
            briefing,
            settings,
        };
        self.solicit_all(state, vec![request])
            .await
            .pop()
            .unwrap_or(fallback)
    }

    /// Runs the requested turns concurrently; results come back in seat order.
    async fn solicit_all(&mut self, state: &GameState, requests: Vec<Request>) -> Vec<TurnOutcome> {
        let timeout = self.config.turn_timeout();
        let briefings = &self.briefings;
        let mut pending: HashMap<PlayerId, Request> = requests
            .into_iter()
            .map(|r| (r.player_id.clone(), r))
            .collect();
        let turns: Vec<_> = self
            .seats
            .iter_mut()
            .filter_map(|seat| {
                let request = pending.remove(&seat.player_id)?;
                Some(run_turn(seat, state, briefings, request, timeout))
            })
            .collect();
        for id in pending.keys() {
            warn!(player = %id, "No agent seated; turn skipped");
        }
        join_all(turns).await
    }
}

fn kb_of<'s>(seats: &'s [Seat], id: &PlayerId) -> Option<&'s KnowledgeBase> {
    seats.iter().find(|s| &s.player_id == id).map(|s| &s.kb)
}

fn is_vote_target(state: &GameState, voter: &PlayerId, target: &PlayerId) -> bool {
    target != voter && state.get_player(target).is_some_and(|p| p.is_alive())
}

async fn run_turn(
    seat: &mut Seat,
    state: &GameState,
    briefings: &BriefingBuilder,
    request: Request,
    timeout: Duration,
) -> TurnOutcome {
    let Request {
        player_id,
        kind,
        briefing,
        settings,
    } = request;
    let view = match GameStateView::new(state, &player_id) {
        Ok(view) => view,
        Err(e) => {
            warn!(error = %e, "Cannot build view; substituting no action");
            return TurnOutcome {
                player_id,
                action: Action::no_action("unknown_player"),
                reasoning: Vec::new(),
                outbox: Vec::new(),
            };
        }
    };
    debug!(player = %player_id, agent = seat.agent.name(), phase = %state.phase(), "Soliciting turn");
    let mut toolkit = Toolkit::new(kind, view, briefings, &mut seat.kb, settings);
    let call = AssertUnwindSafe(seat.agent.run_phase(&briefing, &mut toolkit, Some(settings.max_rounds))).catch_unwind();
    let action = match tokio::time::timeout(timeout, call).await {
        Ok(Ok(Ok(action))) => action,
        Ok(Ok(Err(e))) => {
            warn!(player = %player_id, error = %e, "Agent failed; substituting no action");
            Action::no_action("agent_error")
        }
        Ok(Err(_)) => {
            warn!(player = %player_id, "Agent panicked; substituting no action");
            Action::no_action("agent_panic")
        }
        Err(_) => {
            warn!(player = %player_id, ?timeout, "Agent timed out; substituting no action");
            Action::no_action("timeout")
        }
    };
    debug!(player = %player_id, action = %action, "Turn complete");
    TurnOutcome {
        player_id,
        action,
        reasoning: toolkit.take_reasoning(),
        outbox: toolkit.take_outbox(),
    }
}
