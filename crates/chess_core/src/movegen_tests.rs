use super::*;

#[test]
fn test_startpos_moves() {
    let pos = Position::startpos();
    let moves = legal_moves(&pos);
    // Starting position has 20 legal moves
    assert_eq!(moves.len(), 20);
}

#[test]
fn test_kiwipete_moves() {
    // Kiwipete position - complex with many move types
    let pos =
        Position::from_fen("r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R w KQkq -")
            .unwrap();
    let moves = legal_moves(&pos);
    assert_eq!(moves.len(), 48);
}

#[test]
fn test_castling_moves_are_flagged() {
    let pos = Position::from_fen("r3k2r/8/8/8/8/8/8/R3K2R w KQkq - 0 1").unwrap();
    let castles: Vec<Move> = legal_moves(&pos).into_iter().filter(|m| m.is_castle).collect();
    assert_eq!(castles.len(), 2);
}

#[test]
fn test_en_passant_generated() {
    let pos = Position::from_fen("4k3/8/8/3pP3/8/8/8/4K3 w - d6 0 1").unwrap();
    let ep: Vec<Move> = legal_moves(&pos)
        .into_iter()
        .filter(|m| m.is_en_passant)
        .collect();
    assert_eq!(ep.len(), 1);
    assert_eq!(sq_to_coord(ep[0].to), "d6");
}

#[test]
fn test_promotions_cover_four_pieces() {
    let pos = Position::from_fen("8/4P3/8/8/8/k7/8/4K3 w - - 0 1").unwrap();
    let promos = legal_moves(&pos)
        .into_iter()
        .filter(|m| m.promo.is_some())
        .count();
    assert_eq!(promos, 4);
}

#[test]
fn test_pinned_piece_cannot_move_off_line() {
    // White knight on e2 pinned by the rook on e8
    let pos = Position::from_fen("4r1k1/8/8/8/8/8/4N3/4K3 w - - 0 1").unwrap();
    assert!(legal_moves(&pos).iter().all(|m| m.from != 12));
}
