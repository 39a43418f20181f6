//! Immutable game state with copy-on-write transitions.
//!
//! A [`GameState`] is never written in place. Every transition takes
//! `&self` and returns a new snapshot; collections are shared behind
//! [`Arc`] and only cloned when a transition actually touches them.

use crate::{Action, GameEvent, Phase, PlayerId, Team};
use derive_getters::Getters;
use derive_more::{Display, Error};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, instrument};

/// Errors raised by state transitions.
#[derive(Debug, Clone, PartialEq, Eq, Display, Error)]
pub enum StateError {
    /// No player with this id is seated.
    #[display("unknown player: {player_id}")]
    UnknownPlayer {
        /// Offending id.
        player_id: PlayerId,
    },
    /// The player is already dead.
    #[display("player already dead: {player_id}")]
    AlreadyDead {
        /// Offending id.
        player_id: PlayerId,
    },
    /// Two seats share an id.
    #[display("duplicate player id: {player_id}")]
    DuplicatePlayer {
        /// Offending id.
        player_id: PlayerId,
    },
}

/// One seat at the table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Getters)]
pub struct PlayerSlot {
    /// Stable identifier.
    player_id: PlayerId,
    /// Display name.
    name: String,
    /// Role name, a key into the role registry.
    role: String,
    /// Team derived from the role.
    team: Team,
    #[getter(skip)]
    is_alive: bool,
    /// Open extension map.
    metadata: BTreeMap<String, serde_json::Value>,
}

impl PlayerSlot {
    /// Creates a living player.
    pub fn new(
        player_id: impl Into<PlayerId>,
        name: impl Into<String>,
        role: impl Into<String>,
        team: Team,
    ) -> Self {
        Self {
            player_id: player_id.into(),
            name: name.into(),
            role: role.into(),
            team,
            is_alive: true,
            metadata: BTreeMap::new(),
        }
    }

    /// Whether the player is still in the game.
    pub fn is_alive(&self) -> bool {
        self.is_alive
    }

    /// Returns a copy of this slot marked dead.
    pub fn killed(&self) -> Self {
        Self {
            is_alive: false,
            ..self.clone()
        }
    }

    /// Returns a copy with role, team and metadata hidden.
    pub fn scrubbed(&self) -> Self {
        Self {
            player_id: self.player_id.clone(),
            name: self.name.clone(),
            role: "unknown".to_string(),
            team: Team::Unknown,
            is_alive: self.is_alive,
            metadata: BTreeMap::new(),
        }
    }
}

/// Snapshot of a game at one point in time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameState {
    day: u32,
    phase: Phase,
    players: Arc<Vec<PlayerSlot>>,
    events: Arc<Vec<GameEvent>>,
    night_actions: Arc<Vec<(PlayerId, Action)>>,
}

impl GameState {
    /// Creates the initial state: day 0, `SETUP`, empty logs.
    ///
    /// Fails if two seats share an id.
    #[instrument(skip(players), fields(count = players.len()))]
    pub fn new(players: Vec<PlayerSlot>) -> Result<Self, StateError> {
        let mut seen = std::collections::BTreeSet::new();
        for slot in &players {
            if !seen.insert(slot.player_id().clone()) {
                return Err(StateError::DuplicatePlayer {
                    player_id: slot.player_id().clone(),
                });
            }
        }
        Ok(Self {
            day: 0,
            phase: Phase::Setup,
            players: Arc::new(players),
            events: Arc::new(Vec::new()),
            night_actions: Arc::new(Vec::new()),
        })
    }

    /// Current day, incremented each night.
    pub fn day(&self) -> u32 {
        self.day
    }

    /// Current phase.
    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Every seat, in creation order.
    pub fn players(&self) -> &[PlayerSlot] {
        &self.players
    }

    /// The full event log.
    pub fn events(&self) -> &[GameEvent] {
        &self.events
    }

    /// Pending night actions in submission order.
    pub fn night_actions(&self) -> &[(PlayerId, Action)] {
        &self.night_actions
    }

    /// Pending night action of one player.
    pub fn night_action(&self, player_id: &PlayerId) -> Option<&Action> {
        self.night_actions
            .iter()
            .find(|(id, _)| id == player_id)
            .map(|(_, action)| action)
    }

    /// Looks up a player by id.
    pub fn get_player(&self, player_id: &PlayerId) -> Option<&PlayerSlot> {
        self.players.iter().find(|p| p.player_id() == player_id)
    }

    /// Living players in seat order.
    pub fn alive_players(&self) -> Vec<&PlayerSlot> {
        self.players.iter().filter(|p| p.is_alive()).collect()
    }

    /// Ids of living players in seat order.
    pub fn alive_ids(&self) -> Vec<PlayerId> {
        self.players
            .iter()
            .filter(|p| p.is_alive())
            .map(|p| p.player_id().clone())
            .collect()
    }

    /// Players holding a role, alive or dead.
    pub fn players_by_role(&self, role: &str) -> Vec<&PlayerSlot> {
        self.players.iter().filter(|p| p.role() == role).collect()
    }

    /// Players on a team, alive or dead.
    pub fn players_by_team(&self, team: &Team) -> Vec<&PlayerSlot> {
        self.players.iter().filter(|p| p.team() == team).collect()
    }

    /// Number of living players on a team.
    pub fn alive_count(&self, team: &Team) -> usize {
        self.players
            .iter()
            .filter(|p| p.is_alive() && p.team() == team)
            .count()
    }

    /// Returns a copy in a new phase.
    pub fn with_phase(&self, phase: Phase) -> Self {
        Self {
            phase,
            ..self.clone()
        }
    }

    /// Returns a copy on a new day.
    pub fn with_day(&self, day: u32) -> Self {
        Self { day, ..self.clone() }
    }

    /// Returns a copy with one player marked dead.
    #[instrument(skip(self))]
    pub fn with_player_killed(&self, player_id: &PlayerId) -> Result<Self, StateError> {
        let index = self
            .players
            .iter()
            .position(|p| p.player_id() == player_id)
            .ok_or_else(|| StateError::UnknownPlayer {
                player_id: player_id.clone(),
            })?;
        if !self.players[index].is_alive() {
            return Err(StateError::AlreadyDead {
                player_id: player_id.clone(),
            });
        }
        let mut next = self.clone();
        let players = Arc::make_mut(&mut next.players);
        players[index] = players[index].killed();
        debug!(%player_id, "Player marked dead");
        Ok(next)
    }

    /// Returns a copy with a night action recorded.
    ///
    /// A second submission from the same player replaces the first
    /// and keeps its original position.
    pub fn with_night_action(&self, player_id: PlayerId, action: Action) -> Self {
        let mut next = self.clone();
        let actions = Arc::make_mut(&mut next.night_actions);
        match actions.iter_mut().find(|(id, _)| *id == player_id) {
            Some(entry) => entry.1 = action,
            None => actions.push((player_id, action)),
        }
        next
    }

    /// Returns a copy with no pending night actions.
    pub fn clear_night_actions(&self) -> Self {
        Self {
            night_actions: Arc::new(Vec::new()),
            ..self.clone()
        }
    }

    /// Returns a copy with one event appended.
    pub fn with_event(&self, event: GameEvent) -> Self {
        let mut next = self.clone();
        Arc::make_mut(&mut next.events).push(event);
        next
    }

    /// Returns a copy with events appended in order.
    pub fn with_events(&self, events: impl IntoIterator<Item = GameEvent>) -> Self {
        let mut next = self.clone();
        Arc::make_mut(&mut next.events).extend(events);
        next
    }

    /// Replaces one seat wholesale. Used by tests to build corrupt states.
    #[doc(hidden)]
    pub fn with_player_replaced(&self, slot: PlayerSlot) -> Self {
        let mut next = self.clone();
        let players = Arc::make_mut(&mut next.players);
        if let Some(existing) = players
            .iter_mut()
            .find(|p| p.player_id() == slot.player_id())
        {
            *existing = slot;
        }
        next
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::EventKind;

    fn roster() -> Vec<PlayerSlot> {
        vec![
            PlayerSlot::new("p1", "Alice", "werewolf", Team::Werewolf),
            PlayerSlot::new("p2", "Bob", "seer", Team::Village),
            PlayerSlot::new("p3", "Cara", "villager", Team::Village),
        ]
    }

    #[test]
    fn test_new_state_starts_in_setup() {
        let state = GameState::new(roster()).expect("valid roster");
        assert_eq!(state.day(), 0);
        assert_eq!(state.phase(), Phase::Setup);
        assert!(state.events().is_empty());
        assert_eq!(state.alive_ids().len(), 3);
    }

    #[test]
    fn test_duplicate_ids_rejected() {
        let mut players = roster();
        players.push(PlayerSlot::new("p1", "Dup", "villager", Team::Village));
        assert!(matches!(
            GameState::new(players),
            Err(StateError::DuplicatePlayer { .. })
        ));
    }

    #[test]
    fn test_kill_leaves_original_untouched() {
        let before = GameState::new(roster()).expect("valid roster");
        let after = before
            .with_player_killed(&PlayerId::from("p3"))
            .expect("p3 alive");
        assert!(before.get_player(&"p3".into()).expect("seated").is_alive());
        assert!(!after.get_player(&"p3".into()).expect("seated").is_alive());
        assert_eq!(before.players().len(), after.players().len());
    }

    #[test]
    fn test_kill_rejects_unknown_and_dead() {
        let state = GameState::new(roster()).expect("valid roster");
        assert!(matches!(
            state.with_player_killed(&"p9".into()),
            Err(StateError::UnknownPlayer { .. })
        ));
        let dead = state.with_player_killed(&"p2".into()).expect("alive");
        assert!(matches!(
            dead.with_player_killed(&"p2".into()),
            Err(StateError::AlreadyDead { .. })
        ));
    }

    #[test]
    fn test_night_action_resubmission_replaces() {
        let state = GameState::new(roster())
            .expect("valid roster")
            .with_night_action("p1".into(), Action::no_action("thinking"))
            .with_night_action("p2".into(), Action::no_action("idle"))
            .with_night_action(
                "p1".into(),
                Action::UseAbility {
                    ability: "kill".into(),
                    target: "p3".into(),
                },
            );
        assert_eq!(state.night_actions().len(), 2);
        assert_eq!(state.night_actions()[0].0, PlayerId::from("p1"));
        assert_eq!(state.night_action(&"p1".into()).map(Action::kind), Some("use_ability"));
        assert!(state.clear_night_actions().night_actions().is_empty());
    }

    #[test]
    fn test_events_append_in_order() {
        let state = GameState::new(roster()).expect("valid roster");
        let first = GameEvent::new(
            0,
            Phase::Setup,
            EventKind::PhaseChange {
                old_phase: Phase::Setup,
                new_phase: Phase::Night,
            },
        );
        let second = GameEvent::new(
            1,
            Phase::Night,
            EventKind::PhaseChange {
                old_phase: Phase::Night,
                new_phase: Phase::Dawn,
            },
        );
        let next = state.with_event(first.clone()).with_events(vec![second.clone()]);
        assert_eq!(next.events(), &[first, second]);
        assert!(state.events().is_empty());
    }

    #[test]
    fn test_team_queries() {
        let state = GameState::new(roster()).expect("valid roster");
        assert_eq!(state.alive_count(&Team::Village), 2);
        assert_eq!(state.players_by_team(&Team::Werewolf).len(), 1);
        assert_eq!(state.players_by_role("seer")[0].name(), "Bob");
    }
}
