use super::*;
use std::time::Duration;

const D1: ResourceBudget = ResourceBudget::Depth(1);

fn outcome(a: &str, b: &str, score_a: f64, budget: ResourceBudget) -> Outcome {
    Outcome {
        a: a.to_string(),
        b: b.to_string(),
        score_a,
        budget,
    }
}

fn no_shuffle_one_fold() -> EloConfig {
    EloConfig {
        folds: 1,
        shuffle: false,
        ..EloConfig::default()
    }
}

#[test]
fn test_expected_score_equal_ratings() {
    assert!((expected_score(1000.0, 1000.0) - 0.5).abs() < 1e-12);
    assert!(expected_score(1400.0, 1000.0) > 0.9);
}

#[test]
fn test_update_is_zero_sum() {
    for (ra, rb, s) in [(1000.0, 1000.0, 1.0), (1210.0, 950.0, 0.0), (800.0, 1300.0, 0.5)] {
        let (na, nb) = update_pair(ra, rb, s, K_FACTOR);
        assert!(((na + nb) - (ra + rb)).abs() < 1e-9);
    }
}

#[test]
fn test_four_game_scenario() {
    let games = vec![
        outcome("A", "B", 1.0, D1),
        outcome("A", "B", 1.0, D1),
        outcome("B", "A", 1.0, D1),
        outcome("A", "B", 0.5, D1),
    ];
    let rows = estimate(&games, &no_shuffle_one_fold());

    // One bucket for d1 and the combined one, two competitors each.
    assert_eq!(rows.len(), 4);
    let a = &rows[0];
    let b = &rows[1];
    assert_eq!((a.bucket, a.competitor.as_str()), (Bucket::Budget(D1), "A"));
    assert_eq!((b.bucket, b.competitor.as_str()), (Bucket::Budget(D1), "B"));
    assert!((a.mean - 1010.67).abs() < 0.01, "A = {}", a.mean);
    assert!((b.mean - 989.33).abs() < 0.01, "B = {}", b.mean);
    assert_eq!(a.std, 0.0);
    assert_eq!(rows[2].bucket, Bucket::All);
    assert_eq!(rows[2].mean, a.mean);
}

#[test]
fn test_buckets_are_separate_and_sorted() {
    let t = ResourceBudget::Time(Duration::from_millis(100));
    let games = vec![
        outcome("A", "B", 1.0, D1),
        outcome("C", "B", 0.0, t),
    ];
    let rows = estimate(&games, &no_shuffle_one_fold());
    let keys: Vec<(String, &str)> = rows
        .iter()
        .map(|r| (r.bucket.to_string(), r.competitor.as_str()))
        .collect();
    assert_eq!(
        keys,
        [
            ("d1".to_string(), "A"),
            ("d1".to_string(), "B"),
            ("0.1s".to_string(), "B"),
            ("0.1s".to_string(), "C"),
            ("all".to_string(), "A"),
            ("all".to_string(), "B"),
            ("all".to_string(), "C"),
        ]
    );
}

#[test]
fn test_folds_are_reproducible_for_a_seed() {
    let mut games = Vec::new();
    for i in 0..30 {
        let s = [1.0, 0.5, 0.0][i % 3];
        games.push(outcome("A", "B", s, D1));
        games.push(outcome("B", "C", 1.0 - s, D1));
        games.push(outcome("C", "A", s, D1));
    }
    let cfg = EloConfig {
        folds: 25,
        seed: 99,
        ..EloConfig::default()
    };
    let first = estimate(&games, &cfg);
    assert_eq!(first, estimate(&games, &cfg));
    assert!(first.iter().all(|r| r.folds == 25 && r.min <= r.mean && r.mean <= r.max));
    assert!(first.iter().any(|r| r.std > 0.0));
}

#[test]
fn test_aborted_games_have_no_outcome() {
    use crate::game::{GameRecord, GameResult};
    let record = GameRecord {
        id: 1,
        round: 0,
        white: "A".to_string(),
        black: "B".to_string(),
        budget: D1,
        moves: vec![],
        result: GameResult::Aborted,
        termination: String::new(),
        date: String::new(),
        book_plies: 0,
    };
    assert!(Outcome::from_record(&record).is_none());

    let won = GameRecord {
        result: GameResult::BlackWin,
        ..record
    };
    assert_eq!(Outcome::from_record(&won).unwrap().score_a, 0.0);
}

#[test]
fn test_empty_input_has_no_rows() {
    assert!(estimate(&[], &EloConfig::default()).is_empty());
}
