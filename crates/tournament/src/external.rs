//! Move policy backed by a supervised engine process.

use chess_core::{
    Move, MovePolicy, PolicyError, Position, PositionAnalyzer, ResourceBudget, Score,
    parse_uci_move,
};

use crate::supervisor::{EngineConfig, EngineSupervisor};

pub struct ExternalEnginePolicy {
    supervisor: EngineSupervisor,
}

impl ExternalEnginePolicy {
    /// Launches the engine; fails with `PolicyError::Launch`.
    pub fn start(config: EngineConfig) -> Result<Self, PolicyError> {
        let mut supervisor = EngineSupervisor::new(config);
        supervisor.start()?;
        Ok(Self { supervisor })
    }

    pub fn supervisor(&self) -> &EngineSupervisor {
        &self.supervisor
    }
}

impl MovePolicy for ExternalEnginePolicy {
    fn name(&self) -> &str {
        self.supervisor.name()
    }

    fn propose_move(&mut self, pos: &Position, budget: ResourceBudget) -> Result<Move, PolicyError> {
        let text = self.supervisor.request_move(pos, budget)?;
        parse_uci_move(pos, &text).ok_or_else(|| PolicyError::IllegalMoveProposed {
            policy: self.supervisor.name().to_string(),
            text,
            fen: pos.to_fen(),
        })
    }

    fn new_game(&mut self) -> Result<(), PolicyError> {
        self.supervisor.new_game()
    }
}

impl PositionAnalyzer for ExternalEnginePolicy {
    fn name(&self) -> &str {
        self.supervisor.name()
    }

    fn analyse(&mut self, pos: &Position, depth: u8) -> Result<Score, PolicyError> {
        self.supervisor.analyse(pos, depth)
    }
}
