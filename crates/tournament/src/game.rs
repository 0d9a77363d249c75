//! Playing one game between two policies.

use chess_core::{
    Color, Move, MovePolicy, PolicyError, Position, ResourceBudget, legal_moves, move_to_uci,
    termination,
};
use rand::Rng;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};

use crate::opening::OpeningSource;

/// Book moves are only consulted below this ply unless configured.
pub const DEFAULT_BOOK_PLIES: usize = 20;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GameResult {
    WhiteWin,
    BlackWin,
    Draw,
    Aborted,
}

impl GameResult {
    /// PGN result token.
    pub fn token(self) -> &'static str {
        match self {
            GameResult::WhiteWin => "1-0",
            GameResult::BlackWin => "0-1",
            GameResult::Draw => "1/2-1/2",
            GameResult::Aborted => "*",
        }
    }

    pub fn from_token(token: &str) -> Option<Self> {
        match token {
            "1-0" => Some(GameResult::WhiteWin),
            "0-1" => Some(GameResult::BlackWin),
            "1/2-1/2" => Some(GameResult::Draw),
            "*" => Some(GameResult::Aborted),
            _ => None,
        }
    }

    /// White's score, None for an aborted game.
    pub fn white_score(self) -> Option<f64> {
        match self {
            GameResult::WhiteWin => Some(1.0),
            GameResult::BlackWin => Some(0.0),
            GameResult::Draw => Some(0.5),
            GameResult::Aborted => None,
        }
    }
}

/// A finished (or abandoned) game. Never modified after creation.
#[derive(Debug, Clone, PartialEq)]
pub struct GameRecord {
    pub id: u64,
    /// Repetition index of the pairing.
    pub round: u32,
    pub white: String,
    pub black: String,
    pub budget: ResourceBudget,
    /// From the start position, each legal in the position before it.
    pub moves: Vec<Move>,
    pub result: GameResult,
    pub termination: String,
    /// `YYYY.MM.DD`
    pub date: String,
    /// Leading moves taken from the opening book.
    pub book_plies: usize,
}

impl GameRecord {
    pub fn is_aborted(&self) -> bool {
        self.result == GameResult::Aborted
    }

    pub fn player(&self, color: Color) -> &str {
        match color {
            Color::White => &self.white,
            Color::Black => &self.black,
        }
    }
}

/// Identity of a game within a tournament.
#[derive(Debug, Clone, Copy, Default)]
pub struct GameMeta {
    pub id: u64,
    pub round: u32,
}

#[derive(Debug, Clone, Copy)]
pub struct GameSettings {
    pub book_ply_limit: usize,
}

impl Default for GameSettings {
    fn default() -> Self {
        Self {
            book_ply_limit: DEFAULT_BOOK_PLIES,
        }
    }
}

/// The side whose policy ended the game early, and why.
#[derive(Debug, Clone, PartialEq)]
pub struct SideFailure {
    pub side: Color,
    pub error: PolicyError,
}

#[derive(Debug, Clone)]
pub struct PlayedGame {
    pub record: GameRecord,
    pub failure: Option<SideFailure>,
}

/// Plays a game from the start position until it ends by the rules or a
/// policy fails. Every move, book or policy, is checked for legality before
/// it is applied.
pub fn run_game<'a>(
    white: &'a mut dyn MovePolicy,
    black: &'a mut dyn MovePolicy,
    book: &dyn OpeningSource,
    budget: ResourceBudget,
    settings: &GameSettings,
    meta: GameMeta,
    rng: &mut impl Rng,
) -> PlayedGame {
    let mut game = GameState::new(white.name(), black.name(), budget, meta);

    for side in [Color::White, Color::Black] {
        let policy = match side {
            Color::White => &mut *white,
            Color::Black => &mut *black,
        };
        if let Err(error) = policy.new_game() {
            return game.abandon(side, error);
        }
    }

    while game.moves.len() < settings.book_ply_limit && game.outcome().is_none() {
        let legal = legal_moves(&game.pos);
        let candidates: Vec<Move> = book
            .lookup_moves(&game.pos)
            .into_iter()
            .filter(|mv| legal.contains(mv))
            .collect();
        let Some(&mv) = candidates.choose(rng) else {
            break;
        };
        game.push(mv);
        game.book_plies += 1;
    }

    loop {
        if let Some((result, reason)) = game.outcome() {
            return game.finish(result, reason);
        }

        let side = game.pos.side_to_move;
        let policy = match side {
            Color::White => &mut *white,
            Color::Black => &mut *black,
        };

        match policy.propose_move(&game.pos, budget) {
            Ok(mv) if legal_moves(&game.pos).contains(&mv) => game.push(mv),
            Ok(mv) => {
                let error = PolicyError::IllegalMoveProposed {
                    policy: policy.name().to_string(),
                    text: move_to_uci(mv),
                    fen: game.pos.to_fen(),
                };
                return game.abandon(side, error);
            }
            Err(error) => return game.abandon(side, error),
        }
    }
}

struct GameState {
    white: String,
    black: String,
    budget: ResourceBudget,
    meta: GameMeta,
    pos: Position,
    moves: Vec<Move>,
    history: Vec<u64>,
    book_plies: usize,
}

impl GameState {
    fn new(white: &str, black: &str, budget: ResourceBudget, meta: GameMeta) -> Self {
        let pos = Position::startpos();
        let history = vec![pos.position_hash()];
        Self {
            white: white.to_string(),
            black: black.to_string(),
            budget,
            meta,
            pos,
            moves: Vec::new(),
            history,
            book_plies: 0,
        }
    }

    fn push(&mut self, mv: Move) {
        self.pos.make_move(mv);
        self.history.push(self.pos.position_hash());
        self.moves.push(mv);
    }

    fn outcome(&self) -> Option<(GameResult, String)> {
        let t = termination(&self.pos, &self.history)?;
        let result = match t.winner() {
            Some(Color::White) => GameResult::WhiteWin,
            Some(Color::Black) => GameResult::BlackWin,
            None => GameResult::Draw,
        };
        Some((result, t.to_string()))
    }

    fn abandon(self, side: Color, error: PolicyError) -> PlayedGame {
        log::warn!(
            "game {} ({} vs {}) aborted at ply {}: {error}",
            self.meta.id,
            self.white,
            self.black,
            self.moves.len()
        );
        let reason = format!("abandoned: {error}");
        let mut played = self.finish(GameResult::Aborted, reason);
        played.failure = Some(SideFailure { side, error });
        played
    }

    fn finish(self, result: GameResult, termination: String) -> PlayedGame {
        PlayedGame {
            record: GameRecord {
                id: self.meta.id,
                round: self.meta.round,
                white: self.white,
                black: self.black,
                budget: self.budget,
                moves: self.moves,
                result,
                termination,
                date: chrono::Local::now().format("%Y.%m.%d").to_string(),
                book_plies: self.book_plies,
            },
            failure: None,
        }
    }
}

#[cfg(test)]
#[path = "game_tests.rs"]
mod game_tests;
