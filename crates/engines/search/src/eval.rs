//! Static evaluation seam.

use chess_core::{Color, PieceKind, Position};

/// Scores a position from White's point of view.
///
/// The search negates the value for Black and handles mate and draw
/// leaves itself, so implementations only need to judge quiet material
/// and placement.
pub trait Evaluator: Send {
    fn evaluate(&self, pos: &Position) -> f64;
}

impl<E: Evaluator + ?Sized> Evaluator for Box<E> {
    fn evaluate(&self, pos: &Position) -> f64 {
        (**self).evaluate(pos)
    }
}

/// Plain material count in centipawns.
#[derive(Debug, Clone, Copy, Default)]
pub struct MaterialEvaluator;

impl Evaluator for MaterialEvaluator {
    fn evaluate(&self, pos: &Position) -> f64 {
        let mut score = 0i32;
        for sq in 0..64u8 {
            if let Some(pc) = pos.piece_at(sq) {
                let v = piece_value(pc.kind);
                score += if pc.color == Color::White { v } else { -v };
            }
        }
        f64::from(score)
    }
}

#[inline]
pub fn piece_value(kind: PieceKind) -> i32 {
    match kind {
        PieceKind::Pawn => 100,
        PieceKind::Knight => 320,
        PieceKind::Bishop => 330,
        PieceKind::Rook => 500,
        PieceKind::Queen => 900,
        PieceKind::King => 0,
    }
}

#[cfg(test)]
#[path = "eval_tests.rs"]
mod eval_tests;
