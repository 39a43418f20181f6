//! Per-phase text briefings.
//!
//! Briefings are built from a [`GameStateView`] only, so they can never
//! print a field the viewer is not entitled to. Generic text avoids role
//! and team words; those appear only for the viewer's own role, public
//! eliminations and private reveals addressed to the viewer.

use crate::knowledge_base::KnowledgeBase;
use crate::names::NameBook;
use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use std::collections::BTreeMap;
use strictly_werewolf_core::{Ability, ChannelId, EventKind, GameEvent, GameStateView, Phase, Role};

/// Builds curated briefings for agents.
#[derive(Debug, Clone)]
pub struct BriefingBuilder {
    names: NameBook,
    randomize_names: bool,
    rng: StdRng,
}

impl BriefingBuilder {
    /// Creates a builder; `seed` drives name-order shuffling.
    pub fn new(names: NameBook, randomize_names: bool, seed: u64) -> Self {
        Self {
            names,
            randomize_names,
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Name lookup shared with the toolkit.
    pub fn names(&self) -> &NameBook {
        &self.names
    }

    fn shuffled(&mut self, mut names: Vec<String>) -> Vec<String> {
        if self.randomize_names {
            names.shuffle(&mut self.rng);
        }
        names
    }

    fn alive_names(&self, view: &GameStateView<'_>) -> Vec<String> {
        view.alive_players()
            .iter()
            .map(|p| self.names.name(p.player_id()))
            .collect()
    }

    fn finish(mut lines: Vec<String>, kb: &KnowledgeBase) -> String {
        let summary = kb.summarize_for_briefing();
        if !summary.is_empty() {
            lines.push(summary);
        }
        lines.join("\n")
    }

    /// Briefing delivered once before the first night.
    pub fn game_start(&mut self, view: &GameStateView<'_>, role: &Role, kb: &KnowledgeBase) -> String {
        let me = view.my_player();
        let everyone = view.all_players().iter().map(|p| p.name().clone()).collect();
        let roster = self
            .shuffled(everyone)
            .iter()
            .map(|n| format!("  - {}", n))
            .collect::<Vec<_>>()
            .join("\n");
        let mut lines = vec![
            "=== Game Start ===".to_string(),
            format!("Welcome, {}! A new game is beginning.", me.name()),
            String::new(),
            format!("Your role: {}", role.name()),
            format!("Role description: {}", role.description()),
            format!("Role instructions: {}", role.instructions()),
            String::new(),
        ];
        let allies = view.known_allies();
        if !allies.is_empty() {
            let names = allies.iter().map(|a| a.name().clone()).collect();
            lines.push(format!("Your pack: {}", self.shuffled(names).join(", ")));
            lines.push(String::new());
        }
        lines.push(format!("Players in the game:\n{}", roster));
        lines.push(String::new());
        lines.push(
            "This is the game start phase. Use write_notes and assess_player to prepare, \
             then pass_turn when ready."
                .to_string(),
        );
        Self::finish(lines, kb)
    }

    /// Briefing for the pack chat before night abilities.
    pub fn wolf_chat(&mut self, view: &GameStateView<'_>, kb: &KnowledgeBase, prior: &[String]) -> String {
        let me = self.names.name(view.my_player().player_id());
        let allies: Vec<String> = view
            .known_allies()
            .iter()
            .filter(|a| *a.is_alive())
            .map(|a| a.name().clone())
            .collect();
        let others: Vec<String> = self
            .alive_names(view)
            .into_iter()
            .filter(|n| *n != me && !allies.contains(n))
            .collect();
        let mut lines = vec![
            format!("=== Pack Chat (Night {}) ===", view.day()),
            format!("You are {}. Only your pack can see this channel.", me),
            format!("Your pack: {}", self.shuffled(allies).join(", ")),
            String::new(),
            format!("Other living players: {}", or_none(self.shuffled(others))),
            String::new(),
        ];
        if !prior.is_empty() {
            lines.push("=== Pack Messages ===".to_string());
            lines.extend(prior.iter().map(|m| format!("  {}", m)));
            lines.push(String::new());
        }
        lines.push("Agree on a target for tonight. Use wolf_say to speak, or pass_turn to stay silent.".to_string());
        lines.push(String::new());
        Self::finish(lines, kb)
    }

    /// Briefing for a night ability.
    pub fn night(
        &mut self,
        view: &GameStateView<'_>,
        kb: &KnowledgeBase,
        ability: Option<&Ability>,
        valid_targets: Vec<String>,
        pack_chat: &[String],
    ) -> String {
        let me = view.my_player();
        let mut lines = vec![
            format!("=== Night Phase (Day {}) ===", view.day()),
            format!("You are {}, role: {}.", me.name(), me.role()),
            String::new(),
        ];
        let allies: Vec<String> = view.known_allies().iter().map(|a| a.name().clone()).collect();
        if !allies.is_empty() {
            lines.push(format!("Your pack: {}", self.shuffled(allies).join(", ")));
            lines.push(String::new());
        }
        if !pack_chat.is_empty() {
            lines.push("=== Pack Chat (just now) ===".to_string());
            lines.extend(pack_chat.iter().map(|m| format!("  {}", m)));
            lines.push(String::new());
            lines.push("Follow through on what your pack agreed.".to_string());
            lines.push(String::new());
        }
        match ability {
            Some(ability) => {
                lines.push(format!("Your ability: {}", ability.name()));
                lines.push(format!("  {}", ability.description()));
                lines.push(format!("Valid targets: {}", self.shuffled(valid_targets).join(", ")));
                lines.push(String::new());
                lines.push("Choose a target with the use_ability tool.".to_string());
            }
            None => lines.push("You have nothing to do tonight. Use pass_turn.".to_string()),
        }
        lines.push(String::new());
        Self::finish(lines, kb)
    }

    /// Briefing for one discussion turn.
    pub fn discussion(
        &mut self,
        view: &GameStateView<'_>,
        kb: &KnowledgeBase,
        speeches_so_far: &[(String, String)],
    ) -> String {
        let me = view.my_player();
        let alive = self.alive_names(view);
        let dead: Vec<String> = view
            .all_players()
            .iter()
            .filter(|p| !*p.is_alive())
            .map(|p| p.name().clone())
            .collect();
        let mut lines = vec![
            format!("=== Discussion Phase (Day {}) ===", view.day()),
            format!("You are {}, role: {}.", me.name(), me.role()),
            String::new(),
            format!("Alive players: {}", self.shuffled(alive).join(", ")),
            String::new(),
        ];
        if !dead.is_empty() {
            lines.push(format!("Eliminated players: {}", self.shuffled(dead).join(", ")));
            lines.push(String::new());
        }
        self.push_day_events(&mut lines, view);
        if !speeches_so_far.is_empty() {
            lines.push("=== Discussion So Far ===".to_string());
            lines.extend(speeches_so_far.iter().map(|(who, what)| format!("  [{}]: {}", who, what)));
            lines.push(String::new());
        }
        lines.push("It's your turn to speak. Use the speak tool to address the group.".to_string());
        lines.push(String::new());
        Self::finish(lines, kb)
    }

    /// Briefing for the vote.
    pub fn vote(&mut self, view: &GameStateView<'_>, kb: &KnowledgeBase, valid_targets: Vec<String>) -> String {
        let me = view.my_player();
        let mut lines = vec![
            format!("=== Voting Phase (Day {}) ===", view.day()),
            format!("You are {}, role: {}.", me.name(), me.role()),
            String::new(),
            format!("Valid vote targets: {}", self.shuffled(valid_targets).join(", ")),
            "(You may also vote for 'no_one' to abstain.)".to_string(),
            String::new(),
        ];
        let speeches = self.discussion_speeches(view);
        if !speeches.is_empty() {
            lines.push("=== Discussion Summary ===".to_string());
            lines.extend(speeches.iter().map(|(who, what)| format!("  [{}]: {}", who, what)));
            lines.push(String::new());
        }
        self.push_day_events(&mut lines, view);
        lines.push("Cast your vote using the vote tool.".to_string());
        lines.push(String::new());
        Self::finish(lines, kb)
    }

    /// Briefing for a reflection turn.
    pub fn reflection(&mut self, view: &GameStateView<'_>, kb: &KnowledgeBase, summary: &str) -> String {
        let me = self.names.name(view.my_player().player_id());
        let alive = self.alive_names(view);
        let lines = vec![
            "=== Reflection ===".to_string(),
            format!("You are {}.", me),
            String::new(),
            format!("Alive players: {}", self.shuffled(alive).join(", ")),
            String::new(),
            "=== What Just Happened ===".to_string(),
            summary.to_string(),
            String::new(),
            "Update your notes and assessments, then use pass_turn.".to_string(),
            String::new(),
        ];
        Self::finish(lines, kb)
    }

    /// Text for the events the viewer can see from `offset` on.
    pub fn event_summary(&self, view: &GameStateView<'_>, offset: usize) -> String {
        let parts: Vec<String> = view
            .events_since(offset)
            .into_iter()
            .filter_map(|e| self.describe(e, true))
            .collect();
        if parts.is_empty() {
            "Nothing notable happened.".to_string()
        } else {
            parts.join("\n")
        }
    }

    /// Notable visible events of the current day.
    pub fn day_events(&self, view: &GameStateView<'_>) -> Vec<String> {
        view.events()
            .into_iter()
            .filter(|e| e.day == view.day())
            .filter_map(|e| self.describe(e, false))
            .collect()
    }

    /// Public discussion speeches of the current day as (name, text).
    pub fn discussion_speeches(&self, view: &GameStateView<'_>) -> Vec<(String, String)> {
        view.events()
            .into_iter()
            .filter(|e| e.day == view.day() && e.phase == Phase::DayDiscussion)
            .filter_map(|e| match &e.kind {
                EventKind::Speech {
                    player_id,
                    content,
                    channel: ChannelId::Public,
                } => Some((self.names.name(player_id), content.clone())),
                _ => None,
            })
            .collect()
    }

    /// Every vote so far, grouped by day.
    pub fn vote_history(&self, view: &GameStateView<'_>) -> String {
        let mut days: BTreeMap<u32, Vec<String>> = BTreeMap::new();
        for event in view.events() {
            let line = match &event.kind {
                EventKind::Vote { voter_id, target_id } => format!(
                    "  {} voted for {}",
                    self.names.name(voter_id),
                    target_id
                        .as_ref()
                        .map(|t| self.names.name(t))
                        .unwrap_or_else(|| "no one".to_string())
                ),
                EventKind::VoteResult(result) => match result.eliminated_id() {
                    Some(id) => format!("  Result: {} eliminated", self.names.name(id)),
                    None if *result.tie() => "  Result: tie, no elimination".to_string(),
                    None => "  Result: no elimination".to_string(),
                },
                _ => continue,
            };
            days.entry(event.day).or_default().push(line);
        }
        if days.is_empty() {
            return "(no votes yet)".to_string();
        }
        days.into_iter()
            .flat_map(|(day, lines)| std::iter::once(format!("Day {}:", day)).chain(lines))
            .collect::<Vec<_>>()
            .join("\n")
    }

    fn push_day_events(&self, lines: &mut Vec<String>, view: &GameStateView<'_>) {
        let events = self.day_events(view);
        if !events.is_empty() {
            lines.push("=== Today's Events ===".to_string());
            lines.extend(events.iter().map(|e| format!("  {}", e)));
            lines.push(String::new());
        }
    }

    /// Renders one visible event. `quiet_nights` also reports nights with no deaths.
    fn describe(&self, event: &GameEvent, quiet_nights: bool) -> Option<String> {
        match &event.kind {
            EventKind::NightResult(result) => {
                let mut text = if result.kills().is_empty() {
                    if !quiet_nights && result.saved().is_empty() {
                        return None;
                    }
                    "Nobody died during the night.".to_string()
                } else {
                    format!("Night results: {} killed.", self.names.names(result.kills()).join(", "))
                };
                if !result.saved().is_empty() {
                    text.push_str(&format!(
                        " {} was attacked but survived.",
                        self.names.names(result.saved()).join(", ")
                    ));
                }
                Some(text)
            }
            EventKind::Elimination { player_id, role, cause } => Some(format!(
                "{} was eliminated (role: {}, cause: {}).",
                self.names.name(player_id),
                role,
                cause
            )),
            EventKind::VoteResult(result) => match result.eliminated_id() {
                Some(id) => Some(format!("Vote result: {} was voted out.", self.names.name(id))),
                None if *result.tie() => Some("Vote result: tie, no one was eliminated.".to_string()),
                None => Some("Vote result: no one was eliminated.".to_string()),
            },
            EventKind::PrivateReveal { info, .. } => Some(format!("Private info: {}", info)),
            _ => None,
        }
    }
}

fn or_none(names: Vec<String>) -> String {
    if names.is_empty() {
        "(none)".to_string()
    } else {
        names.join(", ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use strictly_werewolf_core::{
        EliminationCause, GameState, NightResult, PlayerId, PlayerSlot, RoleRegistry, Team,
    };

    fn state() -> GameState {
        GameState::new(vec![
            PlayerSlot::new("p1", "Ash", "werewolf", Team::Werewolf),
            PlayerSlot::new("p2", "Birch", "seer", Team::Village),
            PlayerSlot::new("p3", "Cedar", "doctor", Team::Village),
            PlayerSlot::new("p4", "Dune", "villager", Team::Village),
        ])
        .expect("valid roster")
        .with_day(1)
    }

    fn builder(state: &GameState) -> BriefingBuilder {
        BriefingBuilder::new(NameBook::new(state.players()), true, 1)
    }

    #[test]
    fn test_saved_player_described_without_naming_protector() {
        let state = state().with_event(GameEvent::new(
            1,
            Phase::Dawn,
            EventKind::NightResult(NightResult::new(vec![], vec!["p4".into()], vec!["p4".into()])),
        ));
        let view = GameStateView::new(&state, &"p2".into()).expect("seated");
        let summary = builder(&state).event_summary(&view, 0);
        assert_eq!(summary, "Nobody died during the night. Dune was attacked but survived.");
        assert!(!summary.contains("doctor"));
    }

    #[test]
    fn test_game_start_lists_pack_only_for_wolves() {
        let state = state();
        let registry = RoleRegistry::with_builtins();
        let mut builder = builder(&state);
        let kb = KnowledgeBase::new("Birch");
        let seer_view = GameStateView::new(&state, &"p2".into()).expect("seated");
        let text = builder.game_start(&seer_view, registry.get("seer").expect("builtin"), &kb);
        assert!(text.contains("Your role: seer"));
        assert!(!text.contains("Your pack"));
        assert!(!text.contains("werewolf"));
    }

    #[test]
    fn test_vote_history_groups_by_day() {
        let state = state()
            .with_event(GameEvent::new(
                1,
                Phase::DayVote,
                EventKind::Vote {
                    voter_id: "p1".into(),
                    target_id: Some("p2".into()),
                },
            ))
            .with_event(GameEvent::new(
                1,
                Phase::DayVote,
                EventKind::Vote {
                    voter_id: "p2".into(),
                    target_id: None,
                },
            ));
        let view = GameStateView::new(&state, &"p3".into()).expect("seated");
        let history = builder(&state).vote_history(&view);
        assert_eq!(history, "Day 1:\n  Ash voted for Birch\n  Birch voted for no one");
    }

    #[test]
    fn test_elimination_reveals_role_publicly() {
        let state = state()
            .with_player_killed(&PlayerId::from("p1"))
            .expect("alive")
            .with_event(GameEvent::new(
                1,
                Phase::DayVoteResult,
                EventKind::Elimination {
                    player_id: "p1".into(),
                    role: "werewolf".into(),
                    cause: EliminationCause::Vote,
                },
            ));
        let view = GameStateView::new(&state, &"p4".into()).expect("seated");
        let events = builder(&state).day_events(&view);
        assert_eq!(events, vec!["Ash was eliminated (role: werewolf, cause: vote)."]);
    }
}
