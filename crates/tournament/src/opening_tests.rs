use super::*;
use chess_core::move_to_uci;

const BOOK: &str = "\
# two king's pawn lines and a queen's gambit
e2e4 e7e5 g1f3
e2e4 c7c5

d2d4 d7d5 c2c4  # QGD
";

fn texts(moves: Vec<Move>) -> Vec<String> {
    moves.into_iter().map(move_to_uci).collect()
}

#[test]
fn test_distinct_continuations_from_start() {
    let book = OpeningBook::from_text(BOOK).unwrap();
    assert_eq!(book.len(), 3);
    assert_eq!(texts(book.lookup_moves(&Position::startpos())), ["e2e4", "d2d4"]);
}

#[test]
fn test_lookup_follows_transpositions_by_hash() {
    let book = OpeningBook::from_text(BOOK).unwrap();
    let mut pos = Position::startpos();
    pos.make_move(parse_uci_move(&pos, "e2e4").unwrap());
    assert_eq!(texts(book.lookup_moves(&pos)), ["e7e5", "c7c5"]);

    pos.make_move(parse_uci_move(&pos, "c7c5").unwrap());
    assert!(book.lookup_moves(&pos).is_empty());
}

#[test]
fn test_illegal_book_move_reports_line() {
    let err = OpeningBook::from_text("e2e4\ne2e4 e2e4\n").unwrap_err();
    assert!(matches!(err, BookError::IllegalMove { line: 2, .. }));
}

#[test]
fn test_no_book_is_empty() {
    assert!(NoBook.lookup_moves(&Position::startpos()).is_empty());
    assert!(OpeningBook::from_text("# nothing\n").unwrap().is_empty());
}
