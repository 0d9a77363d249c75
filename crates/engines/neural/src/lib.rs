//! Neural Network Evaluator
//!
//! Feed-forward scoring model for [`search_engine::SearchEvaluator`]. The
//! board is encoded as 768 one-hot piece-square inputs; weights are read
//! from JSON:
//!
//! ```text
//! { "layers": [ { "weights": [[...768...], ...], "bias": [...] }, ... ],
//!   "scale": 1.0 }
//! ```
//!
//! Training happens elsewhere; this crate only runs inference.

mod features;
mod network;

use std::path::Path;

use chess_core::Position;
use search_engine::Evaluator;

pub use features::{NUM_FEATURES, active_features, extract_features, feature_index};
pub use network::{Layer, Network, NetworkError, NetworkWeights};

/// Hidden layer sizes of the untrained default network.
pub const DEFAULT_HIDDEN: [usize; 2] = [128, 32];

/// Scores positions with a network, from White's point of view.
#[derive(Debug, Clone)]
pub struct NetworkEvaluator {
    network: Network,
}

impl NetworkEvaluator {
    pub fn new(network: Network) -> Self {
        Self { network }
    }

    pub fn load(path: &Path) -> Result<Self, NetworkError> {
        Network::load(path).map(Self::new)
    }

    /// Randomly initialised 768-128-32-1 network.
    pub fn untrained(seed: u64) -> Self {
        Self::new(Network::random(&DEFAULT_HIDDEN, seed))
    }

    pub fn network(&self) -> &Network {
        &self.network
    }
}

impl Evaluator for NetworkEvaluator {
    fn evaluate(&self, pos: &Position) -> f64 {
        f64::from(self.network.forward(&active_features(pos)))
    }
}
