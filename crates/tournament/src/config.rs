//! Tournament configuration (TOML)
//!
//! ```toml
//! seed = 7
//! workers = 4
//! repetitions = 2
//! budgets = ["d2", "d4", "100ms"]
//! book = "books/openings.txt"
//!
//! [[competitors]]
//! kind = "search"
//! name = "material"
//!
//! [[competitors]]
//! kind = "search"
//! name = "net"
//! evaluator = "network"
//! weights = "models/net.json"
//!
//! [[competitors]]
//! kind = "external"
//! name = "stockfish"
//! path = "/usr/bin/stockfish"
//! options = { Threads = "1" }
//!
//! [acpl]
//! depth = 8
//! analyzer = { kind = "search", name = "analyzer" }
//! ```

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use chess_core::{MovePolicy, PolicyError, PositionAnalyzer, ResourceBudget};
use neural_engine::NetworkEvaluator;
use search_engine::{Evaluator, MaterialEvaluator, SearchEvaluator};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::elo::{DEFAULT_FOLDS, EloConfig, INITIAL_ELO, K_FACTOR};
use crate::external::ExternalEnginePolicy;
use crate::game::DEFAULT_BOOK_PLIES;
use crate::scheduler::PolicyFactory;
use crate::supervisor::EngineConfig;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid config: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("invalid config: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EvaluatorKind {
    #[default]
    Material,
    Network,
}

/// One tournament participant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum CompetitorConfig {
    /// A UCI engine subprocess.
    External(EngineConfig),
    /// The in-process searcher.
    Search {
        name: String,
        #[serde(default)]
        evaluator: EvaluatorKind,
        /// JSON weights, required for `evaluator = "network"`.
        #[serde(default)]
        weights: Option<PathBuf>,
    },
}

impl CompetitorConfig {
    pub fn name(&self) -> &str {
        match self {
            CompetitorConfig::External(engine) => &engine.name,
            CompetitorConfig::Search { name, .. } => name,
        }
    }

    fn evaluator(&self) -> Result<Box<dyn Evaluator>, PolicyError> {
        let CompetitorConfig::Search {
            name,
            evaluator,
            weights,
        } = self
        else {
            return Err(PolicyError::Launch {
                engine: self.name().to_string(),
                reason: "not an in-process searcher".to_string(),
            });
        };
        match (evaluator, weights) {
            (EvaluatorKind::Material, _) => Ok(Box::new(MaterialEvaluator)),
            (EvaluatorKind::Network, Some(path)) => NetworkEvaluator::load(path)
                .map(|net| Box::new(net) as Box<dyn Evaluator>)
                .map_err(|e| PolicyError::Launch {
                    engine: name.clone(),
                    reason: e.to_string(),
                }),
            (EvaluatorKind::Network, None) => Err(PolicyError::Launch {
                engine: name.clone(),
                reason: "network evaluator without weights".to_string(),
            }),
        }
    }

    /// Starts a move policy for this competitor.
    pub fn build_policy(&self, seed: u64) -> Result<Box<dyn MovePolicy>, PolicyError> {
        match self {
            CompetitorConfig::External(engine) => {
                Ok(Box::new(ExternalEnginePolicy::start(engine.clone())?))
            }
            CompetitorConfig::Search { name, .. } => Ok(Box::new(SearchEvaluator::new(
                name.clone(),
                self.evaluator()?,
                seed,
            ))),
        }
    }

    /// Starts a fixed-depth analyzer for this competitor.
    pub fn build_analyzer(&self, seed: u64) -> Result<Box<dyn PositionAnalyzer>, PolicyError> {
        match self {
            CompetitorConfig::External(engine) => {
                Ok(Box::new(ExternalEnginePolicy::start(engine.clone())?))
            }
            CompetitorConfig::Search { name, .. } => Ok(Box::new(SearchEvaluator::new(
                name.clone(),
                self.evaluator()?,
                seed,
            ))),
        }
    }
}

fn default_workers() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
}

fn default_repetitions() -> u32 {
    1
}

fn default_book_plies() -> usize {
    DEFAULT_BOOK_PLIES
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("results")
}

fn default_folds() -> usize {
    DEFAULT_FOLDS
}

fn default_initial_elo() -> f64 {
    INITIAL_ELO
}

fn default_k_factor() -> f64 {
    K_FACTOR
}

fn default_acpl_depth() -> u8 {
    8
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AcplConfig {
    #[serde(default = "default_acpl_depth")]
    pub depth: u8,
    #[serde(default = "default_workers")]
    pub workers: usize,
    pub analyzer: CompetitorConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TournamentConfig {
    #[serde(default)]
    pub seed: u64,
    #[serde(default = "default_workers")]
    pub workers: usize,
    #[serde(default = "default_repetitions")]
    pub repetitions: u32,
    pub budgets: Vec<ResourceBudget>,
    #[serde(default)]
    pub book: Option<PathBuf>,
    #[serde(default = "default_book_plies")]
    pub book_plies: usize,
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
    #[serde(default = "default_folds")]
    pub folds: usize,
    #[serde(default = "default_initial_elo")]
    pub initial_elo: f64,
    #[serde(default = "default_k_factor")]
    pub k_factor: f64,
    #[serde(default)]
    pub acpl: Option<AcplConfig>,
    pub competitors: Vec<CompetitorConfig>,
}

impl TournamentConfig {
    pub fn from_toml(text: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml(&text)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.competitors.len() < 2 {
            return Err(ConfigError::Invalid(
                "at least two competitors are needed".to_string(),
            ));
        }
        let mut names = HashSet::new();
        for c in &self.competitors {
            if !names.insert(c.name()) {
                return Err(ConfigError::Invalid(format!(
                    "duplicate competitor name {:?}",
                    c.name()
                )));
            }
        }
        if self.budgets.is_empty() {
            return Err(ConfigError::Invalid("no budgets given".to_string()));
        }
        if self.workers == 0 {
            return Err(ConfigError::Invalid("workers must be at least 1".to_string()));
        }
        if self.folds == 0 {
            return Err(ConfigError::Invalid("folds must be at least 1".to_string()));
        }
        if let Some(acpl) = &self.acpl {
            if acpl.depth == 0 || acpl.workers == 0 {
                return Err(ConfigError::Invalid(
                    "acpl depth and workers must be at least 1".to_string(),
                ));
            }
        }
        Ok(())
    }

    pub fn elo_config(&self) -> EloConfig {
        EloConfig {
            initial: self.initial_elo,
            k: self.k_factor,
            folds: self.folds,
            seed: self.seed,
            ..EloConfig::default()
        }
    }
}

impl PolicyFactory for TournamentConfig {
    fn competitor_names(&self) -> Vec<String> {
        self.competitors.iter().map(|c| c.name().to_string()).collect()
    }

    fn build(&self, competitor: usize, seed: u64) -> Result<Box<dyn MovePolicy>, PolicyError> {
        match self.competitors.get(competitor) {
            Some(c) => c.build_policy(seed),
            None => Err(PolicyError::Launch {
                engine: format!("#{competitor}"),
                reason: "no such competitor".to_string(),
            }),
        }
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod config_tests;
