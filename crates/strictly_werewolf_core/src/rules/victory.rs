//! Victory conditions.

use crate::{GameEnd, GameState, Outcome, Team};
use tracing::{info, instrument};

/// Checks whether the game is over.
///
/// No living wolves means the village wins; this includes an empty
/// table. Otherwise the pack wins once living wolves are at least as
/// many as living villagers. Winners include dead team members.
#[instrument(skip(state), fields(day = state.day()))]
pub fn check_victory(state: &GameState) -> Option<GameEnd> {
    let wolves = state.alive_count(&Team::Werewolf);
    let villagers = state.alive_count(&Team::Village);

    let (team, reason) = if wolves == 0 {
        (Team::Village, "All werewolves have been eliminated.")
    } else if wolves >= villagers {
        (Team::Werewolf, "Werewolves equal or outnumber the villagers.")
    } else {
        return None;
    };

    let winners = state
        .players_by_team(&team)
        .into_iter()
        .map(|p| p.player_id().clone())
        .collect();
    info!(%team, wolves, villagers, "Victory condition met");
    Some(GameEnd::new(Outcome::Winner(team), winners, reason.to_string()))
}
