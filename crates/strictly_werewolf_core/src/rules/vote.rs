//! Day-vote tallying and application.
//!
//! Tallying and applying are separate steps so the moderator can run
//! reflection turns between them.

use crate::{EliminationCause, EventKind, GameEvent, GameState, Phase, PlayerId, VoteResult};
use rand::Rng;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::{info, instrument, warn};

/// What to do when the top vote count is shared.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    derive_more::Display,
    strum::EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum TieBreaker {
    /// Nobody is eliminated on a tie.
    #[default]
    #[display("no_elimination")]
    NoElimination,
    /// A tied target is chosen uniformly at random.
    #[display("random")]
    Random,
}

/// Tallies ballots into a [`VoteResult`].
///
/// Abstentions are excluded from the tally. An empty tally eliminates
/// nobody and is not a tie.
#[instrument(skip(ballots, rng), fields(ballots = ballots.len()))]
pub fn tally_votes<R: Rng + ?Sized>(
    ballots: &[(PlayerId, Option<PlayerId>)],
    tie_breaker: TieBreaker,
    rng: &mut R,
) -> VoteResult {
    let mut tally: BTreeMap<PlayerId, u32> = BTreeMap::new();
    for target in ballots.iter().filter_map(|(_, target)| target.as_ref()) {
        *tally.entry(target.clone()).or_insert(0) += 1;
    }

    let Some(top) = tally.values().copied().max() else {
        return VoteResult::new(tally, None, false);
    };
    let leaders: Vec<&PlayerId> = tally
        .iter()
        .filter(|(_, count)| **count == top)
        .map(|(id, _)| id)
        .collect();

    let tie = leaders.len() > 1;
    let eliminated = match (tie, tie_breaker) {
        (false, _) => leaders.first().map(|id| (*id).clone()),
        (true, TieBreaker::NoElimination) => None,
        (true, TieBreaker::Random) => leaders.choose(rng).map(|id| (*id).clone()),
    };
    info!(?eliminated, tie, "Votes tallied");
    VoteResult::new(tally, eliminated, tie)
}

/// Applies a tallied vote to state.
///
/// Returns the new state and the elimination event, if a living player
/// was eliminated. The event is appended to the returned state.
#[instrument(skip(state, result), fields(eliminated = ?result.eliminated_id()))]
pub fn apply_vote_result(state: &GameState, result: &VoteResult) -> (GameState, Option<GameEvent>) {
    let Some(target) = result.eliminated_id() else {
        return (state.clone(), None);
    };
    let Some(slot) = state.get_player(target).filter(|p| p.is_alive()) else {
        warn!(%target, "Vote target is not a living player");
        return (state.clone(), None);
    };
    let role = slot.role().clone();
    match state.with_player_killed(target) {
        Ok(next) => {
            let event = GameEvent::new(
                state.day(),
                Phase::DayVoteResult,
                EventKind::Elimination {
                    player_id: target.clone(),
                    role,
                    cause: EliminationCause::Vote,
                },
            );
            (next.with_event(event.clone()), Some(event))
        }
        Err(e) => {
            warn!(error = %e, "Vote elimination skipped");
            (state.clone(), None)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn ballot(voter: &str, target: Option<&str>) -> (PlayerId, Option<PlayerId>) {
        (PlayerId::from(voter), target.map(PlayerId::from))
    }

    #[test]
    fn test_plurality_wins() {
        let mut rng = StdRng::seed_from_u64(3);
        let ballots = vec![
            ballot("p1", Some("p3")),
            ballot("p2", Some("p3")),
            ballot("p3", Some("p1")),
            ballot("p4", None),
        ];
        let result = tally_votes(&ballots, TieBreaker::NoElimination, &mut rng);
        assert_eq!(result.eliminated_id(), &Some(PlayerId::from("p3")));
        assert!(!result.tie());
        assert_eq!(result.tally().get(&PlayerId::from("p3")), Some(&2));
        assert_eq!(result.tally().len(), 2);
    }

    #[test]
    fn test_tie_without_elimination() {
        let mut rng = StdRng::seed_from_u64(3);
        let ballots = vec![
            ballot("p1", Some("a")),
            ballot("p2", Some("a")),
            ballot("p3", Some("b")),
            ballot("p4", Some("b")),
            ballot("p5", Some("c")),
        ];
        let result = tally_votes(&ballots, TieBreaker::NoElimination, &mut rng);
        assert!(*result.tie());
        assert_eq!(result.eliminated_id(), &None);
    }

    #[test]
    fn test_random_tie_break_picks_a_leader() {
        let mut rng = StdRng::seed_from_u64(9);
        let ballots = vec![ballot("p1", Some("a")), ballot("p2", Some("b"))];
        let result = tally_votes(&ballots, TieBreaker::Random, &mut rng);
        assert!(*result.tie());
        let chosen = result.eliminated_id().clone().expect("random tie-break eliminates");
        assert!(chosen == PlayerId::from("a") || chosen == PlayerId::from("b"));
    }

    #[test]
    fn test_all_abstain() {
        let mut rng = StdRng::seed_from_u64(3);
        let ballots = vec![ballot("p1", None), ballot("p2", None)];
        let result = tally_votes(&ballots, TieBreaker::Random, &mut rng);
        assert!(result.tally().is_empty());
        assert_eq!(result.eliminated_id(), &None);
        assert!(!result.tie());
    }

    #[test]
    fn test_tie_breaker_parses() {
        assert_eq!("random".parse::<TieBreaker>().ok(), Some(TieBreaker::Random));
        assert!("coin_flip".parse::<TieBreaker>().is_err());
        assert_eq!(TieBreaker::default(), TieBreaker::NoElimination);
    }
}
