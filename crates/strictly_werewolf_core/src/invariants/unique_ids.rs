//! Player ids are unique.

use super::Invariant;
use crate::GameState;
use std::collections::BTreeSet;

/// Invariant: no two seats share a player id.
pub struct UniqueIdsInvariant;

impl Invariant<GameState> for UniqueIdsInvariant {
    fn holds(state: &GameState) -> bool {
        let mut seen = BTreeSet::new();
        state.players().iter().all(|p| seen.insert(p.player_id()))
    }

    fn description() -> &'static str {
        "Player ids are unique"
    }
}
