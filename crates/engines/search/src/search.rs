//! Negamax search with alpha-beta pruning

use std::collections::HashMap;

use chess_core::{Color, Move, Position, Score, TimeControl, legal_moves_into};

use crate::eval::Evaluator;

/// Score of "side to move is mated right now"; mates further away score
/// one less per ply so the search prefers the quickest one.
pub const MATE_SCORE: f64 = 1_000_000.0;
const MATE_THRESHOLD: f64 = MATE_SCORE - 1_000.0;

/// Above this many cached evaluations the cache starts over.
const CACHE_LIMIT: usize = 1 << 20;

/// Best root move of one completed depth.
#[derive(Debug, Clone, Copy)]
pub struct RootResult {
    pub best_move: Move,
    /// From the side to move's point of view.
    pub score: f64,
}

/// One search over a single position. Borrows the per-game evaluation cache
/// from its owner for the duration of the move.
pub struct Searcher<'a> {
    evaluator: &'a dyn Evaluator,
    cache: &'a mut HashMap<u64, f64>,
    tc: &'a TimeControl,
    pub nodes: u64,
}

impl<'a> Searcher<'a> {
    pub fn new(
        evaluator: &'a dyn Evaluator,
        cache: &'a mut HashMap<u64, f64>,
        tc: &'a TimeControl,
    ) -> Self {
        Self {
            evaluator,
            cache,
            tc,
            nodes: 0,
        }
    }

    /// Searches every root move to `depth` plies.
    ///
    /// Returns None if the position has no legal moves or the clock ran out
    /// before the depth finished; a partial depth is never reported.
    pub fn search_root(&mut self, pos: &Position, depth: u8) -> Option<RootResult> {
        let mut tmp = pos.clone();
        let mut moves = Vec::with_capacity(64);
        legal_moves_into(&mut tmp, &mut moves);

        let mut best: Option<RootResult> = None;
        let mut alpha = -f64::INFINITY;

        let mut history = Vec::with_capacity(depth as usize + 1);
        history.push(tmp.position_hash());

        for mv in moves {
            if self.out_of_time() {
                return None;
            }

            let undo = tmp.make_move(mv);
            history.push(tmp.position_hash());
            self.nodes += 1;

            let result = self.negamax(
                &mut tmp,
                depth.saturating_sub(1),
                1,
                -f64::INFINITY,
                -alpha,
                &mut history,
            );

            history.pop();
            tmp.unmake_move(mv, undo);

            let score = -result?;
            // Strictly greater keeps the first move among equals.
            if best.is_none_or(|b| score > b.score) {
                best = Some(RootResult {
                    best_move: mv,
                    score,
                });
                alpha = alpha.max(score);
            }
        }

        best
    }

    /// Returns None when the search was aborted by the clock.
    fn negamax(
        &mut self,
        pos: &mut Position,
        depth: u8,
        ply: u32,
        mut alpha: f64,
        beta: f64,
        history: &mut Vec<u64>,
    ) -> Option<f64> {
        if self.out_of_time() {
            return None;
        }

        if pos.is_fifty_move_draw() || pos.is_insufficient_material() {
            return Some(0.0);
        }

        let key = history.last().copied().unwrap_or_else(|| pos.position_hash());
        if history.iter().filter(|&&k| k == key).count() >= 3 {
            return Some(0.0);
        }

        let mut moves = Vec::with_capacity(64);
        legal_moves_into(pos, &mut moves);

        if moves.is_empty() {
            if pos.in_check(pos.side_to_move) {
                return Some(-(MATE_SCORE - f64::from(ply)));
            }
            return Some(0.0);
        }

        if depth == 0 {
            return Some(self.static_eval(pos));
        }

        let mut best = -f64::INFINITY;

        for mv in moves {
            let undo = pos.make_move(mv);
            history.push(pos.position_hash());
            self.nodes += 1;

            let result = self.negamax(pos, depth - 1, ply + 1, -beta, -alpha, history);

            history.pop();
            pos.unmake_move(mv, undo);

            let score = -result?;
            if score > best {
                best = score;
            }
            if best > alpha {
                alpha = best;
            }
            if alpha >= beta {
                break;
            }
        }

        Some(best)
    }

    /// Evaluator output turned to the side to move's view, cached by hash.
    fn static_eval(&mut self, pos: &Position) -> f64 {
        if self.cache.len() >= CACHE_LIMIT {
            self.cache.clear();
        }
        let evaluator = self.evaluator;
        let white = *self
            .cache
            .entry(pos.position_hash())
            .or_insert_with(|| evaluator.evaluate(pos));
        match pos.side_to_move {
            Color::White => white,
            Color::Black => -white,
        }
    }

    fn out_of_time(&self) -> bool {
        self.tc.is_stopped() || (self.tc.should_check_time(self.nodes) && self.tc.check_time())
    }
}

pub fn is_mate_score(score: f64) -> bool {
    score.abs() >= MATE_THRESHOLD
}

/// Converts a search score into centipawns or "mate in N moves".
pub fn to_score(score: f64) -> Score {
    if is_mate_score(score) {
        let plies = (MATE_SCORE - score.abs()).round() as i32;
        let moves = (plies + 1) / 2;
        Score::Mate(if score > 0.0 { moves } else { -moves })
    } else {
        Score::Centipawns(score.round() as i32)
    }
}

#[cfg(test)]
#[path = "search_tests.rs"]
mod search_tests;
