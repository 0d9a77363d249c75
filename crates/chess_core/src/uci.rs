//! Coordinate move notation and the `position` command, shared by the UCI
//! engine binary, the engine supervisor and the game-record importer.

use crate::{
    board::{FenError, Position},
    movegen::legal_moves,
    time_control::ResourceBudget,
    types::*,
};

pub fn move_to_uci(mv: Move) -> String {
    let mut s = String::new();
    s.push_str(&sq_to_coord(mv.from));
    s.push_str(&sq_to_coord(mv.to));
    if let Some(p) = mv.promo {
        let ch = match p {
            PieceKind::Queen => 'q',
            PieceKind::Rook => 'r',
            PieceKind::Bishop => 'b',
            PieceKind::Knight => 'n',
            _ => 'q',
        };
        s.push(ch);
    }
    s
}

/// Resolves coordinate text against the legal moves of `pos`, so castling and
/// en-passant flags come out right. Returns None for anything that is not a
/// legal move here.
pub fn parse_uci_move(pos: &Position, txt: &str) -> Option<Move> {
    let txt = txt.trim();
    if txt.len() < 4 || !txt.is_ascii() {
        return None;
    }
    let from = coord_to_sq(&txt[0..2])?;
    let to = coord_to_sq(&txt[2..4])?;
    let promo = match txt.as_bytes().get(4).map(|b| b.to_ascii_lowercase()) {
        None => None,
        Some(b'q') => Some(PieceKind::Queen),
        Some(b'r') => Some(PieceKind::Rook),
        Some(b'b') => Some(PieceKind::Bishop),
        Some(b'n') => Some(PieceKind::Knight),
        Some(_) => return None,
    };

    legal_moves(pos)
        .into_iter()
        .find(|m| m.from == from && m.to == to && m.promo == promo)
}

/// Applies the arguments of a UCI `position` command:
/// `startpos [moves ...]` or `fen <6 fields> [moves ...]`.
/// Unknown or illegal trailing moves stop the replay.
pub fn set_position_from_uci(pos: &mut Position, args: &[&str]) -> Result<(), FenError> {
    let mut i = 0;
    match args.first() {
        Some(&"fen") => {
            let end = args
                .iter()
                .position(|&a| a == "moves")
                .unwrap_or(args.len());
            *pos = Position::from_fen(&args[1..end].join(" "))?;
            i = end;
        }
        Some(&"startpos") => {
            *pos = Position::startpos();
            i = 1;
        }
        _ => *pos = Position::startpos(),
    }

    if i < args.len() && args[i] == "moves" {
        for txt in &args[i + 1..] {
            match parse_uci_move(pos, txt) {
                Some(mv) => {
                    pos.make_move(mv);
                }
                None => break,
            }
        }
    }
    Ok(())
}

/// `position fen ...` line describing `pos`.
pub fn position_command(pos: &Position) -> String {
    format!("position fen {}", pos.to_fen())
}

/// `go` line for a budget.
pub fn go_command(budget: ResourceBudget) -> String {
    match budget {
        ResourceBudget::Depth(d) => format!("go depth {}", d.max(1)),
        ResourceBudget::Time(t) => format!("go movetime {}", t.as_millis().max(1)),
    }
}

#[cfg(test)]
#[path = "uci_tests.rs"]
mod uci_tests;
