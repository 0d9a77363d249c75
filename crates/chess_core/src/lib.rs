pub mod board;
pub mod movegen;
pub mod perft;
pub mod status;
pub mod time_control;
pub mod types;
pub mod uci;
pub mod zobrist;

// Re-export core game logic (not policy-specific)
pub use board::*;
pub use movegen::*;
pub use perft::perft;
pub use status::*;
pub use time_control::*;
pub use types::*;
pub use uci::*;
pub use zobrist::ZOBRIST;

use thiserror::Error;

// =============================================================================
// Policy traits — implemented by every competitor (external engines, searches)
// =============================================================================

/// Why a policy could not produce what was asked of it.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PolicyError {
    /// The engine process could not be spawned or did not finish its handshake.
    #[error("engine {engine} failed to launch: {reason}")]
    Launch { engine: String, reason: String },

    /// The engine died or hung and the restart allowance is used up.
    #[error("engine {engine} unavailable after {restarts} restart(s): {reason}")]
    EngineUnavailable {
        engine: String,
        restarts: u32,
        reason: String,
    },

    /// The policy answered with something that is not a legal move.
    #[error("{policy} proposed illegal move {text:?} in {fen}")]
    IllegalMoveProposed {
        policy: String,
        text: String,
        fen: String,
    },

    /// An analysis search finished without reporting any score.
    #[error("{engine} reported no score")]
    MissingScore { engine: String },
}

/// Evaluation as reported by an analysis policy, relative to the side to move.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Score {
    Centipawns(i32),
    /// Mate in N moves; negative when the side to move is getting mated.
    Mate(i32),
}

impl Score {
    pub fn centipawns(self) -> Option<i32> {
        match self {
            Score::Centipawns(cp) => Some(cp),
            Score::Mate(_) => None,
        }
    }
}

/// A source of moves for one side of a game.
///
/// Implementations are owned by exactly one game at a time; the tournament
/// never calls into the same instance from two threads.
pub trait MovePolicy: Send {
    /// Competitor name written into game records.
    fn name(&self) -> &str;

    /// Chooses a move for the side to move in `pos`, within `budget`.
    fn propose_move(&mut self, pos: &Position, budget: ResourceBudget)
    -> Result<Move, PolicyError>;

    /// Reset per-game state (caches, engine hash tables) before a new game.
    fn new_game(&mut self) -> Result<(), PolicyError> {
        Ok(())
    }
}

/// Fixed-depth evaluator used to replay finished games for accuracy analysis.
pub trait PositionAnalyzer: Send {
    fn name(&self) -> &str;

    fn analyse(&mut self, pos: &Position, depth: u8) -> Result<Score, PolicyError>;
}
