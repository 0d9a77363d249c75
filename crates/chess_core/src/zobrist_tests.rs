use super::*;
use crate::board::Position;
use crate::movegen::legal_moves;
use crate::types::{Color, PieceKind};

#[test]
fn test_piece_keys_unique() {
    let mut seen = std::collections::HashSet::new();
    for color in [Color::White, Color::Black] {
        for kind in PieceKind::ALL {
            for sq in 0..64u8 {
                assert!(seen.insert(ZOBRIST.piece_key(Piece::new(color, kind), sq)));
            }
        }
    }
    for rule in 0..4 {
        assert!(seen.insert(ZOBRIST.castling_key(rule)));
    }
    for file in 0..8 {
        assert!(seen.insert(ZOBRIST.ep_key(file)));
    }
    assert!(seen.insert(ZOBRIST.side_to_move));
}

#[test]
fn test_hash_returns_after_knight_shuffle() {
    // Ng1-f3, Ng8-f6, Nf3-g1, Nf6-g8 brings back the start position
    let mut pos = Position::startpos();
    let start = pos.position_hash();
    for txt in ["g1f3", "g8f6", "f3g1", "f6g8"] {
        let mv = crate::uci::parse_uci_move(&pos, txt).unwrap();
        pos.make_move(mv);
    }
    assert_eq!(pos.position_hash(), start);
}

#[test]
fn test_hash_distinguishes_side_to_move() {
    let white = Position::from_fen("8/8/8/4k3/8/4K3/8/8 w - - 0 1").unwrap();
    let black = Position::from_fen("8/8/8/4k3/8/4K3/8/8 b - - 0 1").unwrap();
    assert_ne!(white.position_hash(), black.position_hash());
}

#[test]
fn test_hash_unchanged_by_make_unmake() {
    let mut pos = Position::startpos();
    let before = pos.position_hash();
    for mv in legal_moves(&pos) {
        let undo = pos.make_move(mv);
        assert_ne!(pos.position_hash(), before);
        pos.unmake_move(mv, undo);
        assert_eq!(pos.position_hash(), before);
    }
}
