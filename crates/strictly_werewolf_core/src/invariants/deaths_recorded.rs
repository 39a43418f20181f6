//! Deaths and elimination events agree.

use super::Invariant;
use crate::{EventKind, GameState};

/// Invariant: every dead player has exactly one elimination event, and
/// living players have none.
pub struct DeathsRecordedInvariant;

impl Invariant<GameState> for DeathsRecordedInvariant {
    fn holds(state: &GameState) -> bool {
        state.players().iter().all(|p| {
            let eliminations = state
                .events()
                .iter()
                .filter(|e| {
                    matches!(&e.kind, EventKind::Elimination { player_id, .. } if player_id == p.player_id())
                })
                .count();
            if p.is_alive() {
                eliminations == 0
            } else {
                eliminations == 1
            }
        })
    }

    fn description() -> &'static str {
        "Every dead player has exactly one elimination event"
    }
}
