use super::*;
use std::time::Duration;

#[test]
fn test_parse_sets_castle_flag() {
    let pos = Position::from_fen("r3k2r/8/8/8/8/8/8/R3K2R w KQkq - 0 1").unwrap();
    let mv = parse_uci_move(&pos, "e1g1").unwrap();
    assert!(mv.is_castle);
    assert_eq!(move_to_uci(mv), "e1g1");
}

#[test]
fn test_parse_rejects_illegal_and_malformed() {
    let pos = Position::startpos();
    assert!(parse_uci_move(&pos, "e2e5").is_none());
    assert!(parse_uci_move(&pos, "0000").is_none());
    assert!(parse_uci_move(&pos, "(none)").is_none());
    assert!(parse_uci_move(&pos, "e2e4q").is_none());
}

#[test]
fn test_parse_promotion_piece() {
    let pos = Position::from_fen("8/4P3/8/8/8/k7/8/4K3 w - - 0 1").unwrap();
    let mv = parse_uci_move(&pos, "e7e8n").unwrap();
    assert_eq!(mv.promo, Some(PieceKind::Knight));
    assert!(parse_uci_move(&pos, "e7e8").is_none());
}

#[test]
fn test_position_startpos_with_moves() {
    let mut pos = Position::from_fen("8/8/8/4k3/8/4K3/8/8 w - - 0 1").unwrap();
    set_position_from_uci(&mut pos, &["startpos", "moves", "e2e4", "e7e5"]).unwrap();
    assert_eq!(
        pos.to_fen(),
        "rnbqkbnr/pppp1ppp/8/4p3/4P3/8/PPPP1PPP/RNBQKBNR w KQkq e6 0 2"
    );
}

#[test]
fn test_position_fen_round_trip() {
    let fen = "r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R w KQkq - 0 1";
    let mut pos = Position::startpos();
    let args: Vec<&str> = std::iter::once("fen")
        .chain(fen.split_whitespace())
        .collect();
    set_position_from_uci(&mut pos, &args).unwrap();
    assert_eq!(pos.to_fen(), fen);
    assert_eq!(position_command(&pos), format!("position fen {fen}"));
}

#[test]
fn test_go_command_per_budget() {
    assert_eq!(go_command(ResourceBudget::Depth(6)), "go depth 6");
    assert_eq!(
        go_command(ResourceBudget::Time(Duration::from_millis(250))),
        "go movetime 250"
    );
    assert_eq!(
        go_command(ResourceBudget::Time(Duration::from_micros(10))),
        "go movetime 1"
    );
}
