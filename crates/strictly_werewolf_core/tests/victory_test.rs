//! Victory conditions and day-vote application.

use rand::SeedableRng;
use rand::rngs::StdRng;
use strictly_werewolf_core::{
    EliminationCause, EventKind, GameState, PlayerId, PlayerSlot, Team, TieBreaker, apply_vote_result,
    check_victory, tally_votes,
};

fn classic_state() -> GameState {
    GameState::new(vec![
        PlayerSlot::new("w1", "A", "werewolf", Team::Werewolf),
        PlayerSlot::new("w2", "B", "werewolf", Team::Werewolf),
        PlayerSlot::new("s", "C", "seer", Team::Village),
        PlayerSlot::new("d", "D", "doctor", Team::Village),
        PlayerSlot::new("v1", "E", "villager", Team::Village),
        PlayerSlot::new("v2", "F", "villager", Team::Village),
        PlayerSlot::new("v3", "G", "villager", Team::Village),
    ])
    .expect("valid roster")
}

fn vote_out(state: &GameState, target: &str) -> GameState {
    let mut rng = StdRng::seed_from_u64(0);
    let ballots: Vec<(PlayerId, Option<PlayerId>)> = state
        .alive_ids()
        .into_iter()
        .map(|voter| (voter, Some(PlayerId::from(target))))
        .collect();
    let result = tally_votes(&ballots, TieBreaker::NoElimination, &mut rng);
    let (next, event) = apply_vote_result(state, &result);
    let event = event.expect("elimination applied");
    assert!(matches!(
        event.kind,
        EventKind::Elimination { cause: EliminationCause::Vote, .. }
    ));
    next
}

#[test]
fn test_village_wins_after_voting_out_every_wolf() {
    let state = classic_state();
    let day1 = vote_out(&state, "w1");
    assert!(check_victory(&day1).is_none());
    let day2 = vote_out(&day1.with_day(2), "v3");
    assert!(check_victory(&day2).is_none());
    let day3 = vote_out(&day2.with_day(3), "w2");

    let end = check_victory(&day3).expect("game over");
    assert_eq!(end.winning_team(), Some(&Team::Village));
    let expected: Vec<PlayerId> = ["s", "d", "v1", "v2", "v3"].into_iter().map(PlayerId::from).collect();
    assert_eq!(end.winners(), &expected);
}

#[test]
fn test_wolves_win_at_parity() {
    let state = ["s", "d", "v1"]
        .into_iter()
        .fold(classic_state(), |s, id| vote_out(&s, id));
    let end = check_victory(&state).expect("2 wolves vs 2 villagers");
    assert_eq!(end.winning_team(), Some(&Team::Werewolf));
    assert_eq!(end.winners().len(), 2);
}

#[test]
fn test_victory_conditions_are_exclusive_and_exhaustive() {
    for wolves in 0..4usize {
        for villagers in 0..6usize {
            let mut players = Vec::new();
            for i in 0..wolves {
                players.push(PlayerSlot::new(format!("w{i}"), "W", "werewolf", Team::Werewolf));
            }
            for i in 0..villagers {
                players.push(PlayerSlot::new(format!("v{i}"), "V", "villager", Team::Village));
            }
            let state = GameState::new(players).expect("unique ids");
            let result = check_victory(&state).map(|end| end.winning_team().cloned());
            let expected = if wolves == 0 {
                Some(Some(Team::Village))
            } else if wolves >= villagers {
                Some(Some(Team::Werewolf))
            } else {
                None
            };
            assert_eq!(result, expected, "wolves={wolves} villagers={villagers}");
        }
    }
}

#[test]
fn test_tie_leaves_state_unchanged() {
    let state = classic_state();
    let mut rng = StdRng::seed_from_u64(0);
    let ballots = vec![
        (PlayerId::from("w1"), Some(PlayerId::from("s"))),
        (PlayerId::from("w2"), Some(PlayerId::from("s"))),
        (PlayerId::from("s"), Some(PlayerId::from("w1"))),
        (PlayerId::from("d"), Some(PlayerId::from("w1"))),
        (PlayerId::from("v1"), Some(PlayerId::from("v2"))),
    ];
    let result = tally_votes(&ballots, TieBreaker::NoElimination, &mut rng);
    assert!(*result.tie());
    assert_eq!(result.eliminated_id(), &None);

    let (next, event) = apply_vote_result(&state, &result);
    assert!(event.is_none());
    assert_eq!(next, state);
}
