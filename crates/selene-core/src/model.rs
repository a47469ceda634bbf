//! Fixed recurrent model mapping a short window of gaps to the next gap.
//!
//! The network is a stacked LSTM (input width 1) whose final hidden state
//! feeds a linear head. Weights use PyTorch's layout so an exported
//! `state_dict` can be converted to the JSON artifact directly:
//! gate rows are ordered input, forget, cell, output.

use rand::Rng;
use rand::SeedableRng;
use rand::rngs::SmallRng;
use serde::{Deserialize, Serialize};

use crate::constants::{HIDDEN_SIZE, NUM_LAYERS};
use crate::error::ModelError;

/// Capability interface for anything that can predict the next gap.
pub trait CycleModel: Send + Sync {
    /// Predict the next gap from the given window, oldest first.
    fn forward(&self, window: &[f64]) -> Result<f64, ModelError>;

    /// Whether the parameters came from a trained artifact.
    fn is_trained(&self) -> bool {
        true
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LstmLayer {
    pub weight_ih: Vec<Vec<f64>>,
    pub weight_hh: Vec<Vec<f64>>,
    pub bias_ih: Vec<f64>,
    pub bias_hh: Vec<f64>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LinearHead {
    pub weight: Vec<f64>,
    pub bias: f64,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LstmCycleModel {
    pub hidden_size: usize,
    pub layers: Vec<LstmLayer>,
    pub head: LinearHead,
}

fn sigmoid(x: f64) -> f64 {
    1.0 / (1.0 + (-x).exp())
}

fn matvec(m: &[Vec<f64>], v: &[f64], what: &'static str) -> Result<Vec<f64>, ModelError> {
    m.iter()
        .map(|row| {
            if row.len() != v.len() {
                return Err(ModelError::Shape {
                    what,
                    expected: v.len(),
                    got: row.len(),
                });
            }
            Ok(row.iter().zip(v).map(|(w, x)| w * x).sum::<f64>())
        })
        .collect()
}

fn expect_len(what: &'static str, expected: usize, got: usize) -> Result<(), ModelError> {
    if expected == got {
        Ok(())
    } else {
        Err(ModelError::Shape {
            what,
            expected,
            got,
        })
    }
}

impl LstmLayer {
    fn filled(input: usize, hidden: usize, mut fill: impl FnMut() -> f64) -> Self {
        let mut matrix = |cols: usize| -> Vec<Vec<f64>> {
            (0..4 * hidden)
                .map(|_| (0..cols).map(|_| fill()).collect())
                .collect()
        };
        let weight_ih = matrix(input);
        let weight_hh = matrix(hidden);
        let bias_ih = (0..4 * hidden).map(|_| fill()).collect();
        let bias_hh = (0..4 * hidden).map(|_| fill()).collect();
        Self {
            weight_ih,
            weight_hh,
            bias_ih,
            bias_hh,
        }
    }

    /// Run the layer over a sequence, returning every hidden state.
    fn run(&self, hidden: usize, inputs: &[Vec<f64>]) -> Result<Vec<Vec<f64>>, ModelError> {
        expect_len("weight_ih rows", 4 * hidden, self.weight_ih.len())?;
        expect_len("weight_hh rows", 4 * hidden, self.weight_hh.len())?;
        expect_len("bias_ih", 4 * hidden, self.bias_ih.len())?;
        expect_len("bias_hh", 4 * hidden, self.bias_hh.len())?;

        let mut h = vec![0.0; hidden];
        let mut c = vec![0.0; hidden];
        let mut outputs = Vec::with_capacity(inputs.len());

        for x in inputs {
            let from_input = matvec(&self.weight_ih, x, "weight_ih")?;
            let from_hidden = matvec(&self.weight_hh, &h, "weight_hh")?;
            let gates: Vec<f64> = (0..4 * hidden)
                .map(|k| from_input[k] + self.bias_ih[k] + from_hidden[k] + self.bias_hh[k])
                .collect();

            for j in 0..hidden {
                let i = sigmoid(gates[j]);
                let f = sigmoid(gates[hidden + j]);
                let g = gates[2 * hidden + j].tanh();
                let o = sigmoid(gates[3 * hidden + j]);
                c[j] = f * c[j] + i * g;
                h[j] = o * c[j].tanh();
            }
            outputs.push(h.clone());
        }
        Ok(outputs)
    }
}

impl LstmCycleModel {
    /// Parameters drawn uniformly from ±1/√hidden, as a freshly built
    /// PyTorch LSTM would have them.
    pub fn random(hidden_size: usize, num_layers: usize, rng: &mut impl Rng) -> Self {
        let k = 1.0 / (hidden_size.max(1) as f64).sqrt();
        let layers = (0..num_layers)
            .map(|l| {
                let input = if l == 0 { 1 } else { hidden_size };
                LstmLayer::filled(input, hidden_size, || rng.random_range(-k..=k))
            })
            .collect();
        let head = LinearHead {
            weight: (0..hidden_size).map(|_| rng.random_range(-k..=k)).collect(),
            bias: rng.random_range(-k..=k),
        };
        Self {
            hidden_size,
            layers,
            head,
        }
    }

    /// All-zero recurrent weights: the output is always `value`.
    pub fn constant(hidden_size: usize, num_layers: usize, value: f64) -> Self {
        let layers = (0..num_layers)
            .map(|l| {
                let input = if l == 0 { 1 } else { hidden_size };
                LstmLayer::filled(input, hidden_size, || 0.0)
            })
            .collect();
        Self {
            hidden_size,
            layers,
            head: LinearHead {
                weight: vec![0.0; hidden_size],
                bias: value,
            },
        }
    }

    /// Check every tensor against the declared hidden size.
    pub fn validate(&self) -> Result<(), ModelError> {
        if self.layers.is_empty() {
            return Err(ModelError::InvalidArtifact("no LSTM layers".to_string()));
        }
        let h = self.hidden_size;
        for (l, layer) in self.layers.iter().enumerate() {
            let input = if l == 0 { 1 } else { h };
            expect_len("weight_ih rows", 4 * h, layer.weight_ih.len())?;
            expect_len("weight_hh rows", 4 * h, layer.weight_hh.len())?;
            expect_len("bias_ih", 4 * h, layer.bias_ih.len())?;
            expect_len("bias_hh", 4 * h, layer.bias_hh.len())?;
            for row in &layer.weight_ih {
                expect_len("weight_ih cols", input, row.len())?;
            }
            for row in &layer.weight_hh {
                expect_len("weight_hh cols", h, row.len())?;
            }
        }
        expect_len("head weight", h, self.head.weight.len())
    }

    pub fn from_json(json: &str) -> Result<Self, ModelError> {
        let model: Self =
            serde_json::from_str(json).map_err(|e| ModelError::InvalidArtifact(e.to_string()))?;
        model.validate().map_err(|e| match e {
            ModelError::InvalidArtifact(_) => e,
            other => ModelError::InvalidArtifact(other.to_string()),
        })?;
        Ok(model)
    }

    pub fn to_json(&self) -> Result<String, ModelError> {
        serde_json::to_string(self).map_err(|e| ModelError::InvalidArtifact(e.to_string()))
    }
}

impl CycleModel for LstmCycleModel {
    fn forward(&self, window: &[f64]) -> Result<f64, ModelError> {
        if window.is_empty() {
            return Err(ModelError::EmptyWindow);
        }
        let mut sequence: Vec<Vec<f64>> = window.iter().map(|&g| vec![g]).collect();
        for layer in &self.layers {
            sequence = layer.run(self.hidden_size, &sequence)?;
        }
        let last = sequence.last().ok_or(ModelError::EmptyWindow)?;
        expect_len("head weight", last.len(), self.head.weight.len())?;
        let out: f64 = self
            .head
            .weight
            .iter()
            .zip(last)
            .map(|(w, h)| w * h)
            .sum::<f64>()
            + self.head.bias;
        if out.is_finite() {
            Ok(out)
        } else {
            Err(ModelError::NonFinite(out))
        }
    }
}

/// The engine's model: either restored from an artifact or left untrained.
///
/// Untrained parameters are kept for inspection and benchmarking but never
/// answer a forecast: `forward` reports [`ModelError::Untrained`] so callers
/// fall back to the statistical estimate.
#[derive(Clone, Debug, PartialEq)]
pub enum SequenceModel {
    Loaded(LstmCycleModel),
    Untrained(LstmCycleModel),
}

impl SequenceModel {
    /// Randomly initialised network. Deterministic for a given seed.
    pub fn untrained(seed: u64) -> Self {
        let mut rng = SmallRng::seed_from_u64(seed);
        SequenceModel::Untrained(LstmCycleModel::random(HIDDEN_SIZE, NUM_LAYERS, &mut rng))
    }

    pub fn from_json(json: &str) -> Result<Self, ModelError> {
        LstmCycleModel::from_json(json).map(SequenceModel::Loaded)
    }

    pub fn network(&self) -> &LstmCycleModel {
        match self {
            SequenceModel::Loaded(m) | SequenceModel::Untrained(m) => m,
        }
    }
}

impl CycleModel for SequenceModel {
    fn forward(&self, window: &[f64]) -> Result<f64, ModelError> {
        match self {
            SequenceModel::Loaded(m) => m.forward(window),
            SequenceModel::Untrained(_) => Err(ModelError::Untrained),
        }
    }

    fn is_trained(&self) -> bool {
        matches!(self, SequenceModel::Loaded(_))
    }
}
