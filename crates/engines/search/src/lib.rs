//! Search-based move policy
//!
//! Negamax with alpha-beta pruning over a pluggable [`Evaluator`]. Depth
//! budgets search straight to the requested depth; time budgets deepen one
//! ply at a time and keep the last depth that finished before the deadline.

mod eval;
mod search;

use std::collections::HashMap;

use chess_core::{
    Move, MovePolicy, PolicyError, Position, PositionAnalyzer, ResourceBudget, Score, TimeControl,
    legal_moves,
};
use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;

pub use eval::{Evaluator, MaterialEvaluator, piece_value};
pub use search::{MATE_SCORE, is_mate_score, to_score};

use search::Searcher;

/// Deepest iteration attempted under a time budget.
pub const MAX_ITERATIVE_DEPTH: u8 = 64;

/// Progress of one finished iteration, for UCI `info` output.
#[derive(Debug, Clone, Copy)]
pub struct Iteration {
    pub depth: u8,
    pub best_move: Move,
    pub score: f64,
    pub nodes: u64,
}

/// What a search produced.
#[derive(Debug, Clone, Copy)]
pub struct SearchOutcome {
    /// None only when the position has no legal moves.
    pub best_move: Option<Move>,
    /// Side to move's view; 0 when no depth completed.
    pub score: f64,
    /// Deepest completed depth, 0 if the move is the random fallback.
    pub depth: u8,
    pub nodes: u64,
    pub stopped: bool,
}

/// In-process competitor: minimax over an evaluation function.
pub struct SearchEvaluator {
    name: String,
    evaluator: Box<dyn Evaluator>,
    rng: StdRng,
    /// White's-view evaluations keyed by position hash; lives for one game.
    cache: HashMap<u64, f64>,
}

impl SearchEvaluator {
    pub fn new(name: impl Into<String>, evaluator: Box<dyn Evaluator>, seed: u64) -> Self {
        Self {
            name: name.into(),
            evaluator,
            rng: StdRng::seed_from_u64(seed),
            cache: HashMap::new(),
        }
    }

    pub fn material(name: impl Into<String>, seed: u64) -> Self {
        Self::new(name, Box::new(MaterialEvaluator), seed)
    }

    pub fn cached_evaluations(&self) -> usize {
        self.cache.len()
    }

    pub fn search(&mut self, pos: &Position, budget: ResourceBudget) -> SearchOutcome {
        let tc = TimeControl::for_budget(budget);
        self.search_with(pos, budget, &tc, |_| {})
    }

    /// Searches under `budget`, also stopping when `tc` is stopped from
    /// outside. `on_iteration` sees every completed depth.
    pub fn search_with(
        &mut self,
        pos: &Position,
        budget: ResourceBudget,
        tc: &TimeControl,
        mut on_iteration: impl FnMut(&Iteration),
    ) -> SearchOutcome {
        let moves = legal_moves(pos);
        if moves.is_empty() {
            return SearchOutcome {
                best_move: None,
                score: 0.0,
                depth: 0,
                nodes: 0,
                stopped: false,
            };
        }

        let depths = match budget {
            ResourceBudget::Depth(n) => n.max(1)..=n.max(1),
            ResourceBudget::Time(_) => 1..=MAX_ITERATIVE_DEPTH,
        };

        let mut searcher = Searcher::new(self.evaluator.as_ref(), &mut self.cache, tc);
        let mut completed: Option<(u8, search::RootResult)> = None;
        let mut stopped = false;

        for depth in depths {
            let Some(result) = searcher.search_root(pos, depth) else {
                stopped = true;
                break;
            };
            on_iteration(&Iteration {
                depth,
                best_move: result.best_move,
                score: result.score,
                nodes: searcher.nodes,
            });
            completed = Some((depth, result));
            if is_mate_score(result.score) {
                break;
            }
        }
        let nodes = searcher.nodes;

        match completed {
            Some((depth, result)) => SearchOutcome {
                best_move: Some(result.best_move),
                score: result.score,
                depth,
                nodes,
                stopped,
            },
            None => {
                let fallback = moves.choose(&mut self.rng).copied();
                log::debug!(
                    "{}: no depth finished within {budget}, playing a random move",
                    self.name
                );
                SearchOutcome {
                    best_move: fallback,
                    score: 0.0,
                    depth: 0,
                    nodes,
                    stopped,
                }
            }
        }
    }
}

impl MovePolicy for SearchEvaluator {
    fn name(&self) -> &str {
        &self.name
    }

    fn propose_move(&mut self, pos: &Position, budget: ResourceBudget) -> Result<Move, PolicyError> {
        self.search(pos, budget)
            .best_move
            .ok_or_else(|| PolicyError::IllegalMoveProposed {
                policy: self.name.clone(),
                text: "(none)".to_string(),
                fen: pos.to_fen(),
            })
    }

    fn new_game(&mut self) -> Result<(), PolicyError> {
        self.cache = HashMap::new();
        Ok(())
    }
}

impl PositionAnalyzer for SearchEvaluator {
    fn name(&self) -> &str {
        &self.name
    }

    fn analyse(&mut self, pos: &Position, depth: u8) -> Result<Score, PolicyError> {
        if legal_moves(pos).is_empty() {
            return Ok(if pos.in_check(pos.side_to_move) {
                Score::Mate(0)
            } else {
                Score::Centipawns(0)
            });
        }
        let outcome = self.search(pos, ResourceBudget::Depth(depth));
        Ok(to_score(outcome.score))
    }
}

#[cfg(test)]
#[path = "lib_tests.rs"]
mod lib_tests;
