//! Board-to-tensor encoding.

use chess_core::{Color, PieceKind, Position};

/// 2 colors x 6 piece kinds x 64 squares.
pub const NUM_FEATURES: usize = 768;

/// Feature index of a piece: color block (0 or 384), then kind plane, then
/// square (a1 = 0).
#[inline]
pub fn feature_index(color: Color, kind: PieceKind, sq: u8) -> usize {
    let color_offset = match color {
        Color::White => 0,
        Color::Black => 384,
    };
    color_offset + kind.idx() * 64 + sq as usize
}

/// Indices of the one-hot inputs that are set, in square order.
pub fn active_features(pos: &Position) -> Vec<usize> {
    (0..64u8)
        .filter_map(|sq| {
            pos.piece_at(sq)
                .map(|pc| feature_index(pc.color, pc.kind, sq))
        })
        .collect()
}

/// Dense one-hot encoding of every piece on the board.
pub fn extract_features(pos: &Position) -> Vec<f32> {
    let mut features = vec![0.0; NUM_FEATURES];
    for idx in active_features(pos) {
        features[idx] = 1.0;
    }
    features
}

#[cfg(test)]
#[path = "features_tests.rs"]
mod features_tests;
