//! Legal move generation
//!
//! Moves are generated per piece without regard to checks, then each one is
//! played on a scratch position and kept only if the mover's king is safe.

use crate::board::{CASTLE_RULES, Position};
use crate::types::*;

/// Generate all legal moves, returning a freshly allocated vector.
pub fn legal_moves(pos: &Position) -> Vec<Move> {
    let mut scratch = pos.clone();
    let mut out = Vec::with_capacity(64);
    legal_moves_into(&mut scratch, &mut out);
    out
}

/// Generate all legal moves into `out`, reusing its allocation. `pos` is
/// restored before returning.
pub fn legal_moves_into(pos: &mut Position, out: &mut Vec<Move>) {
    out.clear();
    pseudo_legal(pos, out);

    let mover = pos.side_to_move;
    out.retain(|&mv| {
        let undo = pos.make_move(mv);
        let safe = !pos.in_check(mover);
        pos.unmake_move(mv, undo);
        safe
    });
}

fn pseudo_legal(pos: &Position, out: &mut Vec<Move>) {
    let us = pos.side_to_move;
    for (from, pc) in pos.pieces().filter(|(_, pc)| pc.color == us) {
        match pc.kind {
            PieceKind::Pawn => pawn_moves(pos, from, us, out),
            PieceKind::Knight => step_moves(pos, from, us, &KNIGHT_STEPS, out),
            PieceKind::Bishop => slide_moves(pos, from, us, &DIAGONALS, out),
            PieceKind::Rook => slide_moves(pos, from, us, &ORTHOGONALS, out),
            PieceKind::Queen => {
                slide_moves(pos, from, us, &DIAGONALS, out);
                slide_moves(pos, from, us, &ORTHOGONALS, out);
            }
            PieceKind::King => {
                step_moves(pos, from, us, &KING_STEPS, out);
                castle_moves(pos, from, us, out);
            }
        }
    }
}

/// Pushes a pawn move, expanded into the four promotions on the last rank.
fn push_pawn_move(from: u8, to: u8, last_rank: i8, out: &mut Vec<Move>) {
    if rank_of(to) != last_rank {
        out.push(Move::new(from, to));
        return;
    }
    for kind in PieceKind::PROMOTIONS {
        out.push(Move {
            promo: Some(kind),
            ..Move::new(from, to)
        });
    }
}

fn pawn_moves(pos: &Position, from: u8, us: Color, out: &mut Vec<Move>) {
    let fwd = us.forward();
    let last_rank = us.other().home_rank();

    if let Some(one) = offset(from, (0, fwd))
        && pos.piece_at(one).is_none()
    {
        push_pawn_move(from, one, last_rank, out);
        if rank_of(from) == us.pawn_rank()
            && let Some(two) = offset(from, (0, 2 * fwd))
            && pos.piece_at(two).is_none()
        {
            out.push(Move::new(from, two));
        }
    }

    for side in [-1, 1] {
        let Some(to) = offset(from, (side, fwd)) else {
            continue;
        };
        match pos.piece_at(to) {
            Some(target) if target.color != us => push_pawn_move(from, to, last_rank, out),
            None if pos.en_passant == Some(to) => out.push(Move {
                is_en_passant: true,
                ..Move::new(from, to)
            }),
            _ => {}
        }
    }
}

/// Knight and king moves: one step in each direction.
fn step_moves(pos: &Position, from: u8, us: Color, steps: &[Step], out: &mut Vec<Move>) {
    for &step in steps {
        if let Some(to) = offset(from, step)
            && pos.piece_at(to).is_none_or(|pc| pc.color != us)
        {
            out.push(Move::new(from, to));
        }
    }
}

/// Rays that stop at the first piece, capturing it if it is an enemy.
fn slide_moves(pos: &Position, from: u8, us: Color, rays: &[Step], out: &mut Vec<Move>) {
    for &ray in rays {
        let mut cur = from;
        while let Some(to) = offset(cur, ray) {
            match pos.piece_at(to) {
                None => out.push(Move::new(from, to)),
                Some(pc) => {
                    if pc.color != us {
                        out.push(Move::new(from, to));
                    }
                    break;
                }
            }
            cur = to;
        }
    }
}

fn castle_moves(pos: &Position, from: u8, us: Color, out: &mut Vec<Move>) {
    let mut rules = CASTLE_RULES
        .iter()
        .enumerate()
        .filter(|&(i, rule)| rule.color == us && rule.king_from == from && pos.castling.has(i))
        .peekable();
    // No castling out of check.
    if rules.peek().is_none() || pos.in_check(us) {
        return;
    }

    let them = us.other();
    for (_, rule) in rules {
        let clear = rule.empty.iter().all(|&s| pos.piece_at(s).is_none());
        if clear && !rule.passes.iter().any(|&s| pos.is_square_attacked(s, them)) {
            out.push(Move {
                is_castle: true,
                ..Move::new(rule.king_from, rule.king_to)
            });
        }
    }
}

#[cfg(test)]
#[path = "movegen_tests.rs"]
mod movegen_tests;
