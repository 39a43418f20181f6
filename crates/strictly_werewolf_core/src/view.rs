//! Per-player projections of game state.
//!
//! A [`GameStateView`] is the only state access an agent-facing layer
//! should hold. Other players' roles, teams and metadata are scrubbed,
//! and events are filtered by [`is_visible_to`].

use crate::{ChannelId, EventKind, GameEvent, GameState, Phase, PlayerId, PlayerSlot, StateError, Team};
use derive_getters::Getters;
use serde::Serialize;
use tracing::instrument;

/// What anyone may know about a seat.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Getters)]
pub struct PublicPlayer {
    /// Stable id.
    player_id: PlayerId,
    /// Display name.
    name: String,
    /// Whether still in the game.
    is_alive: bool,
}

/// Returns true if `viewer` may see `event`.
///
/// Private reveals, ability uses and reasoning belong to one player.
/// Wolf-channel speech is for the pack; direct messages are for the two
/// members. Everything else is public.
pub fn is_visible_to(event: &GameEvent, viewer: &PlayerSlot) -> bool {
    let me = viewer.player_id();
    match &event.kind {
        EventKind::PrivateReveal { player_id, .. }
        | EventKind::AbilityUse { player_id, .. }
        | EventKind::Reasoning { player_id, .. } => player_id == me,
        EventKind::Speech { channel, .. } => match channel {
            ChannelId::Public => true,
            ChannelId::Wolf => *viewer.team() == Team::Werewolf,
            ChannelId::Direct(a, b) => a == me || b == me,
        },
        _ => true,
    }
}

/// Read-only projection of a [`GameState`] for one player.
#[derive(Debug, Clone, Copy)]
pub struct GameStateView<'a> {
    state: &'a GameState,
    viewer: &'a PlayerSlot,
}

impl<'a> GameStateView<'a> {
    /// Builds the view for `viewer_id`.
    #[instrument(skip(state))]
    pub fn new(state: &'a GameState, viewer_id: &PlayerId) -> Result<Self, StateError> {
        let viewer = state
            .get_player(viewer_id)
            .ok_or_else(|| StateError::UnknownPlayer {
                player_id: viewer_id.clone(),
            })?;
        Ok(Self { state, viewer })
    }

    /// The viewer's own, unscrubbed seat.
    pub fn my_player(&self) -> &'a PlayerSlot {
        self.viewer
    }

    /// Current day.
    pub fn day(&self) -> u32 {
        self.state.day()
    }

    /// Current phase.
    pub fn phase(&self) -> Phase {
        self.state.phase()
    }

    /// Living players; only the viewer's own entry keeps role and team.
    pub fn alive_players(&self) -> Vec<PlayerSlot> {
        self.state
            .alive_players()
            .into_iter()
            .map(|p| {
                if p.player_id() == self.viewer.player_id() {
                    p.clone()
                } else {
                    p.scrubbed()
                }
            })
            .collect()
    }

    /// Every seat as id, name and liveness. Never carries a role.
    pub fn all_players(&self) -> Vec<PublicPlayer> {
        self.state
            .players()
            .iter()
            .map(|p| PublicPlayer {
                player_id: p.player_id().clone(),
                name: p.name().clone(),
                is_alive: p.is_alive(),
            })
            .collect()
    }

    /// Events the viewer may see, in log order.
    pub fn events(&self) -> Vec<&'a GameEvent> {
        self.state
            .events()
            .iter()
            .filter(|e| is_visible_to(e, self.viewer))
            .collect()
    }

    /// Visible events starting at a log offset.
    pub fn events_since(&self, offset: usize) -> Vec<&'a GameEvent> {
        self.state
            .events()
            .iter()
            .skip(offset)
            .filter(|e| is_visible_to(e, self.viewer))
            .collect()
    }

    /// Other pack members, when the viewer is in the pack.
    ///
    /// Village players learn nothing about allies.
    pub fn known_allies(&self) -> Vec<PublicPlayer> {
        if *self.viewer.team() != Team::Werewolf {
            return Vec::new();
        }
        self.state
            .players_by_team(&Team::Werewolf)
            .into_iter()
            .filter(|p| p.player_id() != self.viewer.player_id())
            .map(|p| PublicPlayer {
                player_id: p.player_id().clone(),
                name: p.name().clone(),
                is_alive: p.is_alive(),
            })
            .collect()
    }
}
