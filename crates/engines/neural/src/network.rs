//! Dense feed-forward network: ReLU hidden layers, linear output.

use std::fs;
use std::path::Path;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::features::NUM_FEATURES;

#[derive(Debug, Error)]
pub enum NetworkError {
    #[error("cannot read weights {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed weights: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("network has no layers")]
    Empty,

    #[error("layer {layer}: {what} has {found} entries, expected {expected}")]
    Shape {
        layer: usize,
        what: &'static str,
        expected: usize,
        found: usize,
    },
}

/// One affine layer; `weights[out][in]`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Layer {
    pub weights: Vec<Vec<f32>>,
    pub bias: Vec<f32>,
}

impl Layer {
    fn outputs(&self) -> usize {
        self.weights.len()
    }
}

/// On-disk form of a network.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NetworkWeights {
    pub layers: Vec<Layer>,
    /// Multiplier applied to the raw output to bring it to centipawns.
    #[serde(default = "default_scale")]
    pub scale: f32,
}

fn default_scale() -> f32 {
    1.0
}

#[derive(Debug, Clone)]
pub struct Network {
    layers: Vec<Layer>,
    scale: f32,
}

impl Network {
    /// Validates that the layers chain from 768 inputs to one output.
    pub fn new(weights: NetworkWeights) -> Result<Self, NetworkError> {
        let NetworkWeights { layers, scale } = weights;
        if layers.is_empty() {
            return Err(NetworkError::Empty);
        }

        let mut expected_inputs = NUM_FEATURES;
        for (i, layer) in layers.iter().enumerate() {
            if layer.outputs() == 0 {
                return Err(NetworkError::Shape {
                    layer: i,
                    what: "weights",
                    expected: 1,
                    found: 0,
                });
            }
            for row in &layer.weights {
                if row.len() != expected_inputs {
                    return Err(NetworkError::Shape {
                        layer: i,
                        what: "weight row",
                        expected: expected_inputs,
                        found: row.len(),
                    });
                }
            }
            if layer.bias.len() != layer.outputs() {
                return Err(NetworkError::Shape {
                    layer: i,
                    what: "bias",
                    expected: layer.outputs(),
                    found: layer.bias.len(),
                });
            }
            expected_inputs = layer.outputs();
        }

        if expected_inputs != 1 {
            return Err(NetworkError::Shape {
                layer: layers.len() - 1,
                what: "output layer",
                expected: 1,
                found: expected_inputs,
            });
        }

        Ok(Self { layers, scale })
    }

    pub fn from_json(json: &str) -> Result<Self, NetworkError> {
        Self::new(serde_json::from_str(json)?)
    }

    pub fn load(path: &Path) -> Result<Self, NetworkError> {
        let text = fs::read_to_string(path).map_err(|source| NetworkError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json(&text)
    }

    /// Untrained network with uniform weights in [-0.1, 0.1), for
    /// exercising the pipeline before real weights exist.
    pub fn random(hidden: &[usize], seed: u64) -> Self {
        let mut rng = StdRng::seed_from_u64(seed);
        let mut layers = Vec::with_capacity(hidden.len() + 1);
        let mut inputs = NUM_FEATURES;
        for &outputs in hidden.iter().chain(std::iter::once(&1)) {
            let weights = (0..outputs)
                .map(|_| (0..inputs).map(|_| rng.gen_range(-0.1..0.1)).collect())
                .collect();
            let bias = (0..outputs).map(|_| rng.gen_range(-0.1..0.1)).collect();
            layers.push(Layer { weights, bias });
            inputs = outputs;
        }
        Self { layers, scale: 1.0 }
    }

    pub fn weights(&self) -> NetworkWeights {
        NetworkWeights {
            layers: self.layers.clone(),
            scale: self.scale,
        }
    }

    /// Runs the network on a one-hot input given by its set indices.
    ///
    /// The first layer only sums the columns of active features.
    pub fn forward(&self, active: &[usize]) -> f32 {
        let Some((first, rest)) = self.layers.split_first() else {
            return 0.0;
        };

        let mut acts: Vec<f32> = first
            .weights
            .iter()
            .zip(&first.bias)
            .map(|(row, b)| b + active.iter().map(|&i| row[i]).sum::<f32>())
            .collect();

        for layer in rest {
            for a in &mut acts {
                *a = a.max(0.0);
            }
            acts = layer
                .weights
                .iter()
                .zip(&layer.bias)
                .map(|(row, b)| b + row.iter().zip(&acts).map(|(w, x)| w * x).sum::<f32>())
                .collect();
        }

        acts[0] * self.scale
    }
}

#[cfg(test)]
#[path = "network_tests.rs"]
mod network_tests;
