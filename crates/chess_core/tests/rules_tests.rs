//! Game-ending rules and the bookkeeping they rely on.

use chess_core::{Color, Position, Termination, legal_moves, parse_uci_move, termination};

fn fen(text: &str) -> Position {
    Position::from_fen(text).unwrap()
}

/// Plays coordinate moves from `pos`, returning the hash history including
/// the starting position.
fn play(pos: &mut Position, moves: &[&str]) -> Vec<u64> {
    let mut history = vec![pos.position_hash()];
    for text in moves {
        let mv = parse_uci_move(pos, text).unwrap_or_else(|| panic!("illegal move {text}"));
        pos.make_move(mv);
        history.push(pos.position_hash());
    }
    history
}

#[test]
fn test_mate_and_stalemate() {
    let mated = fen("r1bqkb1r/pppp1Qpp/2n2n2/4p3/2B1P3/8/PPPP1PPP/RNB1K1NR b KQkq - 0 4");
    let t = termination(&mated, &[]);
    assert_eq!(t, Some(Termination::Checkmate(Color::White)));
    assert_eq!(t.and_then(Termination::winner), Some(Color::White));
    assert_eq!(t.map(|t| t.to_string()).as_deref(), Some("checkmate"));

    for stalemate in ["k7/2K5/1Q6/8/8/8/8/8 b - - 0 1", "6k1/6P1/6K1/8/8/8/8/8 b - - 0 1"] {
        let pos = fen(stalemate);
        assert!(!pos.in_check(Color::Black), "{stalemate}");
        assert_eq!(termination(&pos, &[]), Some(Termination::Stalemate), "{stalemate}");
    }

    // Check with an escape is not an ending.
    let checked = fen("rnbqkbnr/ppppp1pp/8/5p1Q/4P3/8/PPPP1PPP/RNB1KBNR b KQkq - 1 2");
    assert!(checked.in_check(Color::Black));
    assert!(!legal_moves(&checked).is_empty());
    assert_eq!(termination(&checked, &[]), None);
}

#[test]
fn test_insufficient_material_table() {
    let cases = [
        ("8/8/8/4k3/8/4K3/8/8 w - - 0 1", true),
        ("8/8/8/4k3/8/4KB2/8/8 w - - 0 1", true),
        ("8/8/8/4k3/8/4KN2/8/8 w - - 0 1", true),
        ("8/8/4n3/4k3/8/4K3/8/8 w - - 0 1", true),
        ("5b2/8/8/4k3/8/4K3/8/2B5 w - - 0 1", true),
        ("2b5/8/8/4k3/8/4K3/8/2B5 w - - 0 1", false),
        ("8/8/8/4k3/8/4K3/3NN3/8 w - - 0 1", false),
        ("8/8/8/4k3/8/4K3/4P3/8 w - - 0 1", false),
        ("8/8/8/4k3/8/4K3/8/4R3 w - - 0 1", false),
    ];
    for (text, expected) in cases {
        assert_eq!(fen(text).is_insufficient_material(), expected, "{text}");
    }
}

#[test]
fn test_fifty_move_counter() {
    assert!(fen("8/8/8/4k3/8/4K3/8/R7 w - - 100 60").is_fifty_move_draw());
    assert!(!fen("8/8/8/4k3/8/4K3/8/R7 w - - 99 60").is_fifty_move_draw());

    let mut pos = fen("8/8/8/4k3/8/3K4/4P3/R7 w - - 98 60");
    play(&mut pos, &["a1a2"]);
    assert_eq!(pos.halfmove_clock, 99);
    play(&mut pos, &["e5f5", "e2e4"]);
    assert_eq!(pos.halfmove_clock, 0);
    assert_eq!(termination(&pos, &[]), None);

    let mut pos = fen("8/8/8/4k3/8/4K3/8/R7 w - - 99 60");
    let history = play(&mut pos, &["a1a2"]);
    assert_eq!(termination(&pos, &history), Some(Termination::FiftyMoveRule));
}

#[test]
fn test_threefold_by_knight_shuffle() {
    let mut pos = Position::startpos();
    let shuffle = ["g1f3", "g8f6", "f3g1", "f6g8"];
    let mut history = play(&mut pos, &shuffle);
    assert_eq!(termination(&pos, &history), None);

    let more = play(&mut pos, &shuffle);
    history.extend_from_slice(&more[1..]);
    assert_eq!(
        termination(&pos, &history),
        Some(Termination::ThreefoldRepetition)
    );
}

#[test]
fn test_threefold_needs_three_occurrences() {
    let pos = Position::startpos();
    let h = pos.position_hash();
    assert_eq!(termination(&pos, &[h, 1, h]), None);
    assert_eq!(
        termination(&pos, &[h, 2, h, 3, h]),
        Some(Termination::ThreefoldRepetition)
    );
    assert_eq!(termination(&pos, &[h]), None);
}

#[test]
fn test_hash_covers_castling_and_en_passant() {
    let base = "rnbqkbnr/pppppppp/8/8/4P3/8/PPPP1PPP/RNBQKBNR b";
    let hash = |rest: &str| fen(&format!("{base} {rest}")).position_hash();
    assert_ne!(hash("KQkq e3 0 1"), hash("KQkq - 0 1"));
    assert_ne!(hash("KQkq - 0 1"), hash("Kq - 0 1"));
    // Move counters are not part of the identity.
    assert_eq!(hash("KQkq - 0 1"), hash("KQkq - 7 12"));
}

#[test]
fn test_rook_capture_removes_castling_right() {
    let mut pos = fen("r3k2r/8/8/8/8/8/6b1/R3K2R b KQkq - 0 1");
    play(&mut pos, &["g2h1"]);
    assert_eq!(pos.to_fen(), "r3k2r/8/8/8/8/8/8/R3K2b w Qkq - 0 2");

    play(&mut pos, &["a1a8"]);
    assert_eq!(pos.to_fen(), "R3k2r/8/8/8/8/8/8/4K2b b k - 0 2");
}

#[test]
fn test_castling_moves_rook_and_unmakes() {
    let mut pos = fen("r3k2r/8/8/8/8/8/8/R3K2R w KQkq - 3 9");
    let before = pos.to_fen();
    let mv = parse_uci_move(&pos, "e1c1").unwrap();
    assert!(mv.is_castle);

    let undo = pos.make_move(mv);
    assert_eq!(pos.to_fen(), "r3k2r/8/8/8/8/8/8/2KR3R b kq - 4 9");
    pos.unmake_move(mv, undo);
    assert_eq!(pos.to_fen(), before);
}

#[test]
fn test_castling_blocked_through_attacked_square() {
    // The bishop on a6 covers f1.
    let pos = fen("4k3/8/b7/8/8/8/8/4K2R w K - 0 1");
    assert!(parse_uci_move(&pos, "e1g1").is_none());
    let free = fen("4k3/8/8/8/8/8/8/4K2R w K - 0 1");
    assert!(parse_uci_move(&free, "e1g1").is_some());
}

#[test]
fn test_en_passant_capture_and_unmake() {
    let mut pos = Position::startpos();
    play(&mut pos, &["e2e4", "a7a6", "e4e5", "d7d5"]);
    assert_eq!(
        pos.to_fen(),
        "rnbqkbnr/1pp1pppp/p7/3pP3/8/8/PPPP1PPP/RNBQKBNR w KQkq d6 0 3"
    );

    let before = pos.to_fen();
    let mv = parse_uci_move(&pos, "e5d6").unwrap();
    assert!(mv.is_en_passant);
    let undo = pos.make_move(mv);
    assert_eq!(
        pos.to_fen(),
        "rnbqkbnr/1pp1pppp/p2P4/8/8/8/PPPP1PPP/RNBQKBNR b KQkq - 0 3"
    );
    pos.unmake_move(mv, undo);
    assert_eq!(pos.to_fen(), before);
}

#[test]
fn test_promotion_unmakes_to_pawn() {
    let mut pos = fen("1r2k3/P7/8/8/8/8/8/4K3 w - - 0 1");
    let before = pos.to_fen();
    for text in ["a7a8q", "a7b8n"] {
        let mv = parse_uci_move(&pos, text).unwrap();
        let undo = pos.make_move(mv);
        assert_ne!(pos.to_fen(), before);
        pos.unmake_move(mv, undo);
        assert_eq!(pos.to_fen(), before, "{text}");
    }
}

#[test]
fn test_termination_serializes_with_winner() {
    let json = serde_json::to_string(&Termination::Checkmate(Color::Black)).unwrap();
    assert_eq!(json, r#"{"Checkmate":"black"}"#);
    let back: Termination = serde_json::from_str(&json).unwrap();
    assert_eq!(back, Termination::Checkmate(Color::Black));

    let draw: Termination = serde_json::from_str(r#""ThreefoldRepetition""#).unwrap();
    assert_eq!(draw, Termination::ThreefoldRepetition);
}
