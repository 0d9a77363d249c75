//! Engine benchmark tournaments
//!
//! This crate provides infrastructure for:
//! - Supervising UCI engine subprocesses with bounded restarts
//! - Playing games between move policies, opening book first
//! - Scheduling round-robin tournaments on a worker pool
//! - Estimating Elo with Monte Carlo folds over game order
//! - Measuring average centipawn loss with a fixed-depth analyzer
//!
//! # Usage
//!
//! ```bash
//! # Play a tournament, then rate and analyse it
//! cargo run -p tournament -- run tournament.toml
//!
//! # Re-rate recorded games with more folds
//! cargo run -p tournament -- elo results/games_*.pgn --folds 100
//! ```

pub mod acpl;
pub mod config;
pub mod elo;
pub mod external;
pub mod game;
pub mod opening;
pub mod record;
pub mod results;
pub mod scheduler;
pub mod stats;
pub mod supervisor;

pub use acpl::{AcplSummary, AnalyzerFactory, GameAccuracy, analyse_game, analyse_records};
pub use config::{CompetitorConfig, ConfigError, TournamentConfig};
pub use elo::{Bucket, EloConfig, EloSummary, Outcome, estimate, outcomes};
pub use external::ExternalEnginePolicy;
pub use game::{GameRecord, GameResult, GameSettings, PlayedGame, run_game};
pub use opening::{NoBook, OpeningBook, OpeningSource};
pub use record::{RecordError, append_record, parse_records, read_records, write_record};
pub use scheduler::{PolicyFactory, Scheduler, SchedulerSettings, Task, TaskReport, schedule};
pub use supervisor::{EngineConfig, EngineState, EngineSupervisor};
