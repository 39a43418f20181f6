//! End-to-end games driven through the orchestrator.

use rand::SeedableRng;
use rand::rngs::StdRng;
use std::collections::BTreeMap;
use strictly_werewolf::{
    Agent, EventKind, Game, GameConfig, Outcome, Phase, PlayerId, RoleRegistry, RoleSlot, ScriptedAgent, Team,
    TimeoutPolicy, Transcript, assign_roles,
};
use strictly_werewolf_core::{GameInvariants, InvariantSet};

fn small_config() -> GameConfig {
    GameConfig::default()
        .with_num_players(5)
        .with_roles(vec![RoleSlot::new("werewolf", 1), RoleSlot::new("seer", 1), RoleSlot::new("doctor", 1)])
        .with_max_days(4)
}

fn steps(items: &[(&str, &str)]) -> Vec<(String, String)> {
    items
        .iter()
        .map(|(tool, args)| (tool.to_string(), args.to_string()))
        .collect()
}

#[tokio::test]
async fn test_random_game_reaches_game_over() {
    let record = Game::new(GameConfig::default().with_seed(7), RoleRegistry::with_builtins())
        .run()
        .await
        .expect("valid config");

    let state = record.final_state();
    assert_eq!(state.phase(), Phase::GameOver);
    assert!(state.day() <= 15);
    assert_eq!(state.players().len(), 7);
    let last = state.events().last().expect("events recorded");
    assert!(matches!(last.kind, EventKind::GameEnd(_)));
    assert!(GameInvariants::check_all(state).is_ok());
}

#[tokio::test]
async fn test_same_seed_replays_identically() {
    let run = || async {
        Game::new(GameConfig::default().with_seed(99), RoleRegistry::with_builtins())
            .run()
            .await
            .expect("valid config")
    };
    let first = run().await;
    let second = run().await;
    assert_eq!(first.final_state().events(), second.final_state().events());
    assert_eq!(first.end(), second.end());
}

#[tokio::test]
async fn test_phase_changes_follow_the_cycle() {
    let record = Game::new(GameConfig::default().with_seed(3), RoleRegistry::with_builtins())
        .run()
        .await
        .expect("valid config");
    let changes: Vec<(Phase, Phase)> = record
        .final_state()
        .events()
        .iter()
        .filter_map(|e| match e.kind {
            EventKind::PhaseChange { old_phase, new_phase } => Some((old_phase, new_phase)),
            _ => None,
        })
        .collect();
    assert_eq!(changes.first(), Some(&(Phase::Setup, Phase::Night)));
    assert_eq!(changes.last().map(|c| c.1), Some(Phase::GameOver));
    assert!(changes.iter().all(|(from, to)| from.can_transition_to(*to)));
}

#[tokio::test]
async fn test_passive_table_hits_day_limit() {
    let config = small_config().with_max_days(2).with_seed(5);
    let record = Game::new(config.clone(), RoleRegistry::with_builtins())
        .run_with(|seat, _| Box::new(ScriptedAgent::new(seat.slot().name().clone(), Vec::new())) as Box<dyn Agent>)
        .await
        .expect("valid config");
    assert_eq!(*record.end().outcome(), Outcome::Draw);
    assert!(record.end().winners().is_empty());
    assert_eq!(record.final_state().day(), 2);
    assert_eq!(record.final_state().alive_players().len(), 5);

    let record = Game::new(
        config.with_timeout_policy(TimeoutPolicy::Village),
        RoleRegistry::with_builtins(),
    )
    .run_with(|seat, _| Box::new(ScriptedAgent::new(seat.slot().name().clone(), Vec::new())) as Box<dyn Agent>)
    .await
    .expect("valid config");
    assert_eq!(record.end().winning_team(), Some(&Team::Village));
    assert_eq!(record.end().winners().len(), 4);
}

#[tokio::test]
async fn test_unanimous_vote_removes_the_wolf() {
    let config = small_config().with_reflection(false).with_seed(21);
    // The game draws seats from the same seeded stream first.
    let registry = RoleRegistry::with_builtins();
    let seats = assign_roles(&config, &registry, &mut StdRng::seed_from_u64(21)).expect("valid config");
    let wolf_name = seats
        .iter()
        .find(|seat| seat.slot().role() == "werewolf")
        .map(|seat| seat.slot().name().clone())
        .expect("one wolf");

    let record = Game::new(config, registry)
        .run_with(|seat, _| {
            Box::new(ScriptedAgent::repeating(
                seat.slot().name().clone(),
                steps(&[("vote", wolf_name.as_str())]),
            )) as Box<dyn Agent>
        })
        .await
        .expect("valid config");

    assert_eq!(record.end().winning_team(), Some(&Team::Village));
    assert_eq!(record.end().winners().len(), 4);
    let state = record.final_state();
    assert_eq!(state.day(), 1);

    let votes: Vec<&Option<PlayerId>> = state
        .events()
        .iter()
        .filter_map(|e| match &e.kind {
            EventKind::Vote { target_id, .. } => Some(target_id),
            _ => None,
        })
        .collect();
    assert_eq!(votes.len(), 5);
    assert_eq!(votes.iter().filter(|t| t.is_none()).count(), 1);

    let eliminated: Vec<&String> = state
        .events()
        .iter()
        .filter_map(|e| match &e.kind {
            EventKind::Elimination { role, .. } => Some(role),
            _ => None,
        })
        .collect();
    assert_eq!(eliminated, vec!["werewolf"]);
}

#[tokio::test]
async fn test_learnings_flow_in_and_out() {
    let transcript = Transcript::default();
    let mut prior = BTreeMap::new();
    prior.insert("Player_1".to_string(), vec!["Game 1 notes: trust the quiet ones".to_string()]);

    let config = small_config().with_max_days(1).with_seed(8);
    let record = Game::new(config, RoleRegistry::with_builtins())
        .with_learnings(prior)
        .with_game_number(2)
        .run_with(|seat, _| {
            let agent = ScriptedAgent::repeating(
                seat.slot().name().clone(),
                steps(&[("write_notes", "observed"), ("pass_turn", "")]),
            );
            if seat.slot().name() == "Player_1" {
                Box::new(agent.with_transcript(transcript.clone())) as Box<dyn Agent>
            } else {
                Box::new(agent) as Box<dyn Agent>
            }
        })
        .await
        .expect("valid config");

    let seen = transcript.lock().expect("not poisoned").join("\n");
    assert!(seen.contains("Lessons from Prior Games"));
    assert!(seen.contains("trust the quiet ones"));

    let learnings = &record.learnings()["Player_1"];
    assert!(learnings[0].starts_with("Game 2 notes: observed"));
    assert_eq!(record.learnings().len(), 5);
}

#[tokio::test]
async fn test_invalid_config_is_rejected() {
    let config = GameConfig::default().with_roles(vec![RoleSlot::new("vampire", 2)]);
    let result = Game::new(config, RoleRegistry::with_builtins()).run().await;
    assert!(result.is_err());
}

#[tokio::test]
async fn test_duplicate_player_names_are_rejected() {
    use strictly_werewolf::{AgentKind, GameError, PlayerConfig};

    let config = small_config().with_players(vec![
        PlayerConfig::new("Ash", AgentKind::Random),
        PlayerConfig::new("Ash", AgentKind::Random),
    ]);
    let result = Game::new(config, RoleRegistry::with_builtins()).run().await;
    assert!(matches!(result, Err(GameError::Config(_))));
}
