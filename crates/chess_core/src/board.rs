use thiserror::Error;

use crate::types::*;
use crate::zobrist::ZOBRIST;

/// Reasons a FEN string was rejected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FenError {
    #[error("expected at least 4 FEN fields, found {0}")]
    MissingFields(usize),
    #[error("invalid board section: {0}")]
    BadBoard(String),
    #[error("invalid piece character: {0}")]
    BadPiece(char),
    #[error("invalid side to move: {0}")]
    BadSideToMove(String),
    #[error("invalid castling character: {0}")]
    BadCastling(char),
    #[error("invalid en-passant square: {0}")]
    BadEnPassant(String),
    #[error("invalid move counter: {0}")]
    BadCounter(String),
}

/// Geometry of one castling move. Index in [`CASTLE_RULES`] is the bit of
/// the matching right in [`CastlingRights`].
#[derive(Debug)]
pub struct CastleRule {
    pub color: Color,
    pub fen: char,
    pub king_from: u8,
    pub king_to: u8,
    pub rook_from: u8,
    pub rook_to: u8,
    /// Squares between king and rook.
    pub empty: &'static [u8],
    /// Squares the king crosses or lands on; none may be attacked.
    pub passes: &'static [u8],
}

pub const CASTLE_RULES: [CastleRule; 4] = [
    CastleRule {
        color: Color::White,
        fen: 'K',
        king_from: 4,
        king_to: 6,
        rook_from: 7,
        rook_to: 5,
        empty: &[5, 6],
        passes: &[5, 6],
    },
    CastleRule {
        color: Color::White,
        fen: 'Q',
        king_from: 4,
        king_to: 2,
        rook_from: 0,
        rook_to: 3,
        empty: &[3, 2, 1],
        passes: &[3, 2],
    },
    CastleRule {
        color: Color::Black,
        fen: 'k',
        king_from: 60,
        king_to: 62,
        rook_from: 63,
        rook_to: 61,
        empty: &[61, 62],
        passes: &[61, 62],
    },
    CastleRule {
        color: Color::Black,
        fen: 'q',
        king_from: 60,
        king_to: 58,
        rook_from: 56,
        rook_to: 59,
        empty: &[59, 58, 57],
        passes: &[59, 58],
    },
];

/// One bit per entry of [`CASTLE_RULES`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct CastlingRights(u8);

impl CastlingRights {
    pub const NONE: CastlingRights = CastlingRights(0);
    pub const ALL: CastlingRights = CastlingRights(0b1111);

    pub fn has(self, rule: usize) -> bool {
        self.0 & (1 << rule) != 0
    }

    pub fn grant(&mut self, rule: usize) {
        self.0 |= 1 << rule;
    }

    /// Drops every right whose king or rook square is `square`.
    fn touch(&mut self, square: u8) {
        for (i, rule) in CASTLE_RULES.iter().enumerate() {
            if square == rule.king_from || square == rule.rook_from {
                self.0 &= !(1 << i);
            }
        }
    }

    fn from_fen(field: &str) -> Result<Self, FenError> {
        let mut rights = CastlingRights::NONE;
        if field == "-" {
            return Ok(rights);
        }
        for c in field.chars() {
            let rule = CASTLE_RULES
                .iter()
                .position(|r| r.fen == c)
                .ok_or(FenError::BadCastling(c))?;
            rights.grant(rule);
        }
        Ok(rights)
    }

    fn to_fen(self) -> String {
        let field: String = CASTLE_RULES
            .iter()
            .enumerate()
            .filter(|&(i, _)| self.has(i))
            .map(|(_, r)| r.fen)
            .collect();
        if field.is_empty() {
            "-".to_string()
        } else {
            field
        }
    }
}

#[derive(Clone, Debug)]
pub struct Position {
    pub board: [Option<Piece>; 64],
    pub side_to_move: Color,
    pub castling: CastlingRights,
    /// Square behind a pawn that just advanced two ranks.
    pub en_passant: Option<u8>,
    pub halfmove_clock: u32,
    pub fullmove_number: u32,
}

/// What [`Position::unmake_move`] needs to restore.
#[derive(Clone, Debug)]
pub struct Undo {
    pub moved: Piece,
    /// Square and piece removed by the move; differs from `to` for en passant.
    pub captured: Option<(u8, Piece)>,
    /// Rook relocation of a castling move.
    pub rook_move: Option<(u8, u8)>,
    pub castling: CastlingRights,
    pub en_passant: Option<u8>,
    pub halfmove_clock: u32,
    pub fullmove_number: u32,
}

const BACK_RANK: [PieceKind; 8] = [
    PieceKind::Rook,
    PieceKind::Knight,
    PieceKind::Bishop,
    PieceKind::Queen,
    PieceKind::King,
    PieceKind::Bishop,
    PieceKind::Knight,
    PieceKind::Rook,
];

impl Position {
    pub fn startpos() -> Self {
        let mut board = [None; 64];
        for (file, kind) in BACK_RANK.into_iter().enumerate() {
            board[file] = Some(Piece::new(Color::White, kind));
            board[8 + file] = Some(Piece::new(Color::White, PieceKind::Pawn));
            board[48 + file] = Some(Piece::new(Color::Black, PieceKind::Pawn));
            board[56 + file] = Some(Piece::new(Color::Black, kind));
        }
        Position {
            board,
            side_to_move: Color::White,
            castling: CastlingRights::ALL,
            en_passant: None,
            halfmove_clock: 0,
            fullmove_number: 1,
        }
    }

    /// Parses a Forsyth-Edwards Notation string. The move counters are
    /// optional and default to `0 1`.
    pub fn from_fen(fen: &str) -> Result<Self, FenError> {
        let fields: Vec<&str> = fen.split_whitespace().collect();
        let &[placement, stm, castling, ep, ref counters @ ..] = fields.as_slice() else {
            return Err(FenError::MissingFields(fields.len()));
        };

        let ranks: Vec<&str> = placement.split('/').collect();
        if ranks.len() != 8 {
            return Err(FenError::BadBoard(placement.to_string()));
        }
        let mut board = [None; 64];
        // FEN lists rank 8 first.
        for (row, text) in ranks.iter().enumerate() {
            let rank = 7 - row as i8;
            let bad_rank = || FenError::BadBoard(text.to_string());
            let mut file: i8 = 0;
            for ch in text.chars() {
                if let Some(skip) = ch.to_digit(10) {
                    file += skip as i8;
                } else {
                    let piece = Piece::from_char(ch).ok_or(FenError::BadPiece(ch))?;
                    let s = sq(file, rank).ok_or_else(bad_rank)?;
                    board[s as usize] = Some(piece);
                    file += 1;
                }
                if file > 8 {
                    return Err(bad_rank());
                }
            }
            if file != 8 {
                return Err(bad_rank());
            }
        }

        let side_to_move = match stm {
            "w" => Color::White,
            "b" => Color::Black,
            other => return Err(FenError::BadSideToMove(other.to_string())),
        };

        let en_passant = match ep {
            "-" => None,
            coord => Some(
                coord_to_sq(coord).ok_or_else(|| FenError::BadEnPassant(coord.to_string()))?,
            ),
        };

        let counter = |idx: usize, default: u32| -> Result<u32, FenError> {
            match counters.get(idx) {
                Some(text) => text.parse().map_err(|_| FenError::BadCounter(text.to_string())),
                None => Ok(default),
            }
        };

        Ok(Position {
            board,
            side_to_move,
            castling: CastlingRights::from_fen(castling)?,
            en_passant,
            halfmove_clock: counter(0, 0)?,
            fullmove_number: counter(1, 1)?,
        })
    }

    /// Serialises the position back to FEN. This is what gets sent to
    /// external engines with `position fen`.
    pub fn to_fen(&self) -> String {
        let mut rows = Vec::with_capacity(8);
        for rank in (0..8u8).rev() {
            let mut row = String::new();
            let mut empty = 0u8;
            for s in rank * 8..rank * 8 + 8 {
                match self.piece_at(s) {
                    Some(pc) => {
                        if empty > 0 {
                            row.push(char::from(b'0' + empty));
                            empty = 0;
                        }
                        row.push(pc.to_char());
                    }
                    None => empty += 1,
                }
            }
            if empty > 0 {
                row.push(char::from(b'0' + empty));
            }
            rows.push(row);
        }

        let stm = match self.side_to_move {
            Color::White => 'w',
            Color::Black => 'b',
        };
        let ep = self.en_passant.map_or_else(|| "-".to_string(), sq_to_coord);
        format!(
            "{} {stm} {} {ep} {} {}",
            rows.join("/"),
            self.castling.to_fen(),
            self.halfmove_clock,
            self.fullmove_number
        )
    }

    /// Zobrist hash of the placement, side to move, castling rights and
    /// en-passant file. Two positions that count as "the same" for threefold
    /// repetition share a hash.
    pub fn position_hash(&self) -> u64 {
        let mut h = 0u64;
        for (s, slot) in self.board.iter().enumerate() {
            if let Some(pc) = slot {
                h ^= ZOBRIST.piece_key(*pc, s as u8);
            }
        }
        if self.side_to_move == Color::Black {
            h ^= ZOBRIST.side_to_move;
        }
        for rule in 0..CASTLE_RULES.len() {
            if self.castling.has(rule) {
                h ^= ZOBRIST.castling_key(rule);
            }
        }
        if let Some(ep) = self.en_passant {
            h ^= ZOBRIST.ep_key(ep % 8);
        }
        h
    }

    /// Fifty full moves without a capture or pawn move.
    pub fn is_fifty_move_draw(&self) -> bool {
        self.halfmove_clock >= 100
    }

    /// Neither side can ever deliver mate: bare kings, a single minor piece,
    /// or bishops that all stand on the same square color.
    pub fn is_insufficient_material(&self) -> bool {
        let mut minors = Vec::new();
        for (s, pc) in self.pieces() {
            match pc.kind {
                PieceKind::King => {}
                PieceKind::Knight | PieceKind::Bishop => minors.push((pc.kind, s)),
                _ => return false,
            }
        }
        let shade = |s: u8| (file_of(s) + rank_of(s)) % 2;
        match minors.as_slice() {
            [] | [_] => true,
            [(_, first), ..] => minors
                .iter()
                .all(|&(kind, s)| kind == PieceKind::Bishop && shade(s) == shade(*first)),
        }
    }

    /// Occupied squares with their pieces, a1 first.
    pub fn pieces(&self) -> impl Iterator<Item = (u8, Piece)> + '_ {
        self.board
            .iter()
            .enumerate()
            .filter_map(|(s, slot)| slot.map(|pc| (s as u8, pc)))
    }

    pub fn king_sq(&self, c: Color) -> Option<u8> {
        let king = Piece::new(c, PieceKind::King);
        self.pieces().find(|&(_, pc)| pc == king).map(|(s, _)| s)
    }

    pub fn piece_at(&self, sq: u8) -> Option<Piece> {
        self.board[sq as usize]
    }

    pub fn set_piece(&mut self, sq: u8, pc: Option<Piece>) {
        self.board[sq as usize] = pc;
    }

    pub fn in_check(&self, c: Color) -> bool {
        self.king_sq(c)
            .is_some_and(|k| self.is_square_attacked(k, c.other()))
    }

    /// First piece met walking from `from` along `step`.
    fn first_along(&self, from: u8, step: Step) -> Option<Piece> {
        let mut cur = from;
        while let Some(next) = offset(cur, step) {
            if let Some(pc) = self.piece_at(next) {
                return Some(pc);
            }
            cur = next;
        }
        None
    }

    pub fn is_square_attacked(&self, target: u8, by: Color) -> bool {
        let stands = |step: Step, kind: PieceKind| {
            offset(target, step).and_then(|s| self.piece_at(s)) == Some(Piece::new(by, kind))
        };
        let rides = |step: Step, kinds: [PieceKind; 2]| {
            self.first_along(target, step)
                .is_some_and(|pc| pc.color == by && kinds.contains(&pc.kind))
        };

        // An attacking pawn sits one rank behind the target, seen from its side.
        let behind = -by.forward();
        [(-1, behind), (1, behind)]
            .into_iter()
            .any(|step| stands(step, PieceKind::Pawn))
            || KNIGHT_STEPS.into_iter().any(|step| stands(step, PieceKind::Knight))
            || KING_STEPS.into_iter().any(|step| stands(step, PieceKind::King))
            || DIAGONALS
                .into_iter()
                .any(|step| rides(step, [PieceKind::Bishop, PieceKind::Queen]))
            || ORTHOGONALS
                .into_iter()
                .any(|step| rides(step, [PieceKind::Rook, PieceKind::Queen]))
    }

    /// Plays `mv`, which must come from the move generator for this
    /// position.
    ///
    /// # Panics
    ///
    /// If the from-square is empty.
    pub fn make_move(&mut self, mv: Move) -> Undo {
        let moved = self.board[mv.from as usize]
            .take()
            .expect("make_move: empty from-square");

        let mut undo = Undo {
            moved,
            captured: None,
            rook_move: None,
            castling: self.castling,
            en_passant: self.en_passant,
            halfmove_clock: self.halfmove_clock,
            fullmove_number: self.fullmove_number,
        };

        // An en-passant victim stands beside the from-square, on the target file.
        let victim_sq = if mv.is_en_passant {
            sq(file_of(mv.to), rank_of(mv.from))
        } else {
            Some(mv.to)
        };
        if let Some(s) = victim_sq
            && let Some(victim) = self.board[s as usize].take()
        {
            undo.captured = Some((s, victim));
        }

        let promotes =
            moved.kind == PieceKind::Pawn && rank_of(mv.to) == moved.color.other().home_rank();
        let placed = if promotes {
            Piece::new(moved.color, mv.promo.unwrap_or(PieceKind::Queen))
        } else {
            moved
        };
        self.set_piece(mv.to, Some(placed));

        if mv.is_castle
            && moved.kind == PieceKind::King
            && let Some(rule) = CASTLE_RULES
                .iter()
                .find(|r| r.king_from == mv.from && r.king_to == mv.to)
        {
            let rook = self.board[rule.rook_from as usize].take();
            self.set_piece(rule.rook_to, rook);
            undo.rook_move = Some((rule.rook_from, rule.rook_to));
        }

        self.castling.touch(mv.from);
        self.castling.touch(mv.to);

        self.en_passant = None;
        if moved.kind == PieceKind::Pawn && (rank_of(mv.to) - rank_of(mv.from)).abs() == 2 {
            self.en_passant = sq(file_of(mv.from), (rank_of(mv.from) + rank_of(mv.to)) / 2);
        }

        if moved.kind == PieceKind::Pawn || undo.captured.is_some() {
            self.halfmove_clock = 0;
        } else {
            self.halfmove_clock += 1;
        }
        if self.side_to_move == Color::Black {
            self.fullmove_number += 1;
        }
        self.side_to_move = self.side_to_move.other();
        undo
    }

    pub fn unmake_move(&mut self, mv: Move, undo: Undo) {
        self.side_to_move = self.side_to_move.other();
        self.castling = undo.castling;
        self.en_passant = undo.en_passant;
        self.halfmove_clock = undo.halfmove_clock;
        self.fullmove_number = undo.fullmove_number;

        if let Some((rook_from, rook_to)) = undo.rook_move {
            let rook = self.board[rook_to as usize].take();
            self.set_piece(rook_from, rook);
        }
        self.set_piece(mv.to, None);
        self.set_piece(mv.from, Some(undo.moved));
        if let Some((s, victim)) = undo.captured {
            self.set_piece(s, Some(victim));
        }
    }
}
