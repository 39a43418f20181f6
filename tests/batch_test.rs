//! Tests for sequential multi-game runs.

use strictly_werewolf::{BatchRunner, BenchmarkConfig, CrossGameMemory, GameConfig, GameSummary, RoleRegistry};

fn config() -> GameConfig {
    GameConfig::default()
        .with_seed(11)
        .with_max_days(5)
        .with_reflection(false)
}

#[tokio::test]
async fn test_batch_writes_each_game_and_summary() {
    let dir = tempfile::tempdir().expect("temp dir");
    let runner = BatchRunner::new(config(), RoleRegistry::with_builtins()).with_out_dir(dir.path());

    let report = runner.run(Some(3)).await.expect("batch runs");
    assert_eq!(report.games().len(), 3);
    assert_eq!(report.results().values().sum::<u32>(), 3);

    for number in 1..=3 {
        let path = dir.path().join(format!("game_{:03}.json", number));
        let summary: GameSummary =
            serde_json::from_str(&std::fs::read_to_string(&path).expect("readable")).expect("valid summary");
        assert_eq!(summary.players().len(), 7);
        assert!(summary.outcome().is_some());
    }
    let report_json: serde_json::Value = serde_json::from_str(
        &std::fs::read_to_string(dir.path().join("batch_summary.json")).expect("readable"),
    )
    .expect("valid json");
    assert_eq!(report_json["games"].as_array().map(Vec::len), Some(3));
}

#[test]
fn test_every_game_gets_its_own_seed() {
    let rotating = BatchRunner::new(config(), RoleRegistry::with_builtins());
    assert_eq!(rotating.game_seed(100, 0), 100);
    assert_eq!(rotating.game_seed(100, 2), 102);
    assert_eq!(rotating.role_seed(100), None);

    let fixed = BatchRunner::new(
        config().with_benchmark(BenchmarkConfig::default().with_rotate_roles(false)),
        RoleRegistry::with_builtins(),
    );
    assert_eq!(fixed.game_seed(100, 2), 102);
    assert_eq!(fixed.role_seed(100), Some(100));
}

#[tokio::test]
async fn test_fixed_roles_keep_seating_across_games() {
    let config = config().with_benchmark(BenchmarkConfig::default().with_rotate_roles(false));
    let report = BatchRunner::new(config, RoleRegistry::with_builtins())
        .run(Some(3))
        .await
        .expect("batch runs");
    let seating = |summary: &GameSummary| -> Vec<(String, String)> {
        summary
            .players()
            .iter()
            .map(|(id, p)| (id.to_string(), p.role().clone()))
            .collect()
    };
    let first = seating(&report.games()[0]);
    assert!(report.games().iter().all(|g| seating(g) == first));
    assert_eq!(report.results().values().sum::<u32>(), 3);
}

#[tokio::test]
async fn test_shared_memory_survives_the_batch() {
    let memory = CrossGameMemory::new();
    memory.append("Player_1", vec!["Game 0 notes: seeded".to_string()]);
    let runner = BatchRunner::new(config(), RoleRegistry::with_builtins()).with_memory(memory.clone());
    runner.run(Some(1)).await.expect("batch runs");

    // Random agents write no notes, so only the seeded entry remains.
    assert_eq!(runner.memory().learnings_for("Player_1"), vec!["Game 0 notes: seeded"]);
    assert_eq!(memory.snapshot().len(), 1);
}
