//! Terminal-position detection for complete games.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::{board::Position, movegen::legal_moves, types::Color};

/// Why a game ended by the rules.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Termination {
    /// The named side delivered mate.
    Checkmate(Color),
    Stalemate,
    FiftyMoveRule,
    ThreefoldRepetition,
    InsufficientMaterial,
}

impl Termination {
    /// Winner, or None for every draw.
    pub fn winner(self) -> Option<Color> {
        match self {
            Termination::Checkmate(c) => Some(c),
            _ => None,
        }
    }
}

impl fmt::Display for Termination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Termination::Checkmate(_) => "checkmate",
            Termination::Stalemate => "stalemate",
            Termination::FiftyMoveRule => "fifty-move rule",
            Termination::ThreefoldRepetition => "threefold repetition",
            Termination::InsufficientMaterial => "insufficient material",
        };
        f.write_str(s)
    }
}

/// Checks whether `pos` ends the game.
///
/// `history` holds the position hashes of every position reached so far in
/// the game, including `pos` itself; it is only used for repetition.
pub fn termination(pos: &Position, history: &[u64]) -> Option<Termination> {
    if legal_moves(pos).is_empty() {
        return Some(if pos.in_check(pos.side_to_move) {
            Termination::Checkmate(pos.side_to_move.other())
        } else {
            Termination::Stalemate
        });
    }
    if pos.is_fifty_move_draw() {
        return Some(Termination::FiftyMoveRule);
    }
    if pos.is_insufficient_material() {
        return Some(Termination::InsufficientMaterial);
    }
    let key = pos.position_hash();
    if history.iter().filter(|&&k| k == key).count() >= 3 {
        return Some(Termination::ThreefoldRepetition);
    }
    None
}
