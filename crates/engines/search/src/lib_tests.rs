use super::*;
use chess_core::move_to_uci;
use std::time::{Duration, Instant};

#[test]
fn test_depth_zero_is_treated_as_one() {
    let mut engine = SearchEvaluator::material("material", 1);
    let outcome = engine.search(&Position::startpos(), ResourceBudget::Depth(0));
    assert_eq!(outcome.depth, 1);
    assert!(outcome.best_move.is_some());
}

#[test]
fn test_tie_break_keeps_first_enumerated_move() {
    let pos = Position::startpos();
    let mut engine = SearchEvaluator::material("material", 1);
    let mv = engine.propose_move(&pos, ResourceBudget::Depth(1)).unwrap();
    assert_eq!(mv, legal_moves(&pos)[0]);
}

#[test]
fn test_takes_hanging_queen_as_white() {
    let pos = Position::from_fen("4k3/8/8/3q4/8/8/8/3RK3 w - - 0 1").unwrap();
    let mut engine = SearchEvaluator::material("material", 1);
    let mv = engine.propose_move(&pos, ResourceBudget::Depth(2)).unwrap();
    assert_eq!(move_to_uci(mv), "d1d5");
}

#[test]
fn test_takes_hanging_queen_as_black() {
    let pos = Position::from_fen("3rk3/8/8/3Q4/8/8/8/4K3 b - - 0 1").unwrap();
    let mut engine = SearchEvaluator::material("material", 1);
    let mv = engine.propose_move(&pos, ResourceBudget::Depth(2)).unwrap();
    assert_eq!(move_to_uci(mv), "d8d5");
}

#[test]
fn test_time_budget_returns_legal_move_near_deadline() {
    let pos = Position::startpos();
    let mut engine = SearchEvaluator::material("material", 1);
    let start = Instant::now();
    let outcome = engine.search(&pos, ResourceBudget::Time(Duration::from_millis(50)));
    let elapsed = start.elapsed();

    let mv = outcome.best_move.unwrap();
    assert!(legal_moves(&pos).contains(&mv));
    assert!(outcome.depth >= 1);
    assert!(elapsed < Duration::from_millis(50 + 450), "overran: {elapsed:?}");
}

#[test]
fn test_zero_time_falls_back_to_seeded_random_move() {
    let pos = Position::startpos();
    let budget = ResourceBudget::Time(Duration::ZERO);
    let mut a = SearchEvaluator::material("a", 42);
    let mut b = SearchEvaluator::material("b", 42);

    let first = a.search(&pos, budget);
    assert_eq!(first.depth, 0);
    assert!(first.stopped);
    assert_eq!(first.best_move, b.search(&pos, budget).best_move);
}

#[test]
fn test_iteration_callback_sees_each_depth() {
    let pos = Position::from_fen("4k3/8/8/3q4/8/8/8/3RK3 w - - 0 1").unwrap();
    let mut engine = SearchEvaluator::material("material", 1);
    let tc = TimeControl::new(None);
    let mut depths = Vec::new();
    engine.search_with(&pos, ResourceBudget::Depth(3), &tc, |it| depths.push(it.depth));
    assert_eq!(depths, vec![3]);
}

#[test]
fn test_new_game_drops_evaluation_cache() {
    let mut engine = SearchEvaluator::material("material", 1);
    engine
        .propose_move(&Position::startpos(), ResourceBudget::Depth(2))
        .unwrap();
    assert!(engine.cached_evaluations() > 0);
    engine.new_game().unwrap();
    assert_eq!(engine.cached_evaluations(), 0);
}

#[test]
fn test_no_legal_moves_is_an_error() {
    let pos = Position::from_fen("k7/2K5/1Q6/8/8/8/8/8 b - - 0 1").unwrap();
    let mut engine = SearchEvaluator::material("material", 1);
    assert!(matches!(
        engine.propose_move(&pos, ResourceBudget::Depth(2)),
        Err(PolicyError::IllegalMoveProposed { .. })
    ));
}

#[test]
fn test_analyse_reports_side_to_move_view() {
    let pos = Position::from_fen("4k3/8/8/8/8/8/8/Q3K3 b - - 0 1").unwrap();
    let mut engine = SearchEvaluator::material("material", 1);
    assert_eq!(engine.analyse(&pos, 1).unwrap(), Score::Centipawns(-900));
}

#[test]
fn test_analyse_reports_mate() {
    let pos = Position::from_fen("6k1/5ppp/8/8/8/8/5PPP/4Q1K1 w - - 0 1").unwrap();
    let mut engine = SearchEvaluator::material("material", 1);
    assert_eq!(engine.analyse(&pos, 2).unwrap(), Score::Mate(1));
}
