//! Zobrist keys used by [`Position::position_hash`](crate::Position::position_hash).
//!
//! The game runner and the search both detect threefold repetition by
//! comparing these hashes, so the table is generated at compile time from a
//! fixed seed and is identical in every process of a tournament.

use crate::types::Piece;

const PIECE_KEYS: usize = 2 * 6 * 64;
const CASTLING_OFFSET: usize = PIECE_KEYS;
const EP_OFFSET: usize = CASTLING_OFFSET + 4;
const KEY_COUNT: usize = EP_OFFSET + 8;

/// Flat key table: pieces by (color, kind, square), then one key per
/// castling right, then one per en-passant file.
pub struct ZobristKeys {
    keys: [u64; KEY_COUNT],
    pub side_to_move: u64,
}

/// xorshift64 step.
const fn next_key(mut state: u64) -> u64 {
    state ^= state << 13;
    state ^= state >> 7;
    state ^= state << 17;
    state
}

impl ZobristKeys {
    const fn generate(seed: u64) -> Self {
        let mut state = seed;
        let mut keys = [0u64; KEY_COUNT];
        let mut i = 0;
        while i < KEY_COUNT {
            state = next_key(state);
            keys[i] = state;
            i += 1;
        }
        ZobristKeys {
            keys,
            side_to_move: next_key(state),
        }
    }

    #[inline(always)]
    pub fn piece_key(&self, piece: Piece, sq: u8) -> u64 {
        self.keys[(piece.color.idx() * 6 + piece.kind.idx()) * 64 + sq as usize]
    }

    /// Key of the castling right at `rule` in [`CASTLE_RULES`](crate::CASTLE_RULES).
    #[inline(always)]
    pub fn castling_key(&self, rule: usize) -> u64 {
        self.keys[CASTLING_OFFSET + rule]
    }

    #[inline(always)]
    pub fn ep_key(&self, file: u8) -> u64 {
        self.keys[EP_OFFSET + file as usize]
    }
}

pub static ZOBRIST: ZobristKeys = ZobristKeys::generate(0x1234_5678_9ABC_DEF0);

#[cfg(test)]
#[path = "zobrist_tests.rs"]
mod zobrist_tests;
