//! Night actions come from seated players.

use super::Invariant;
use crate::GameState;

/// Invariant: every pending night action belongs to a seated player.
pub struct KnownActorsInvariant;

impl Invariant<GameState> for KnownActorsInvariant {
    fn holds(state: &GameState) -> bool {
        state
            .night_actions()
            .iter()
            .all(|(id, _)| state.get_player(id).is_some())
    }

    fn description() -> &'static str {
        "Night actions come only from seated players"
    }
}
