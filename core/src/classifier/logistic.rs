use crate::prelude::{ClassifierError, SequenceScorer};
use ndarray::{Array1, Array2, ArrayView3, Axis};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// On-disk weights asset: one weight per window position plus a bias.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogisticWeights {
    pub weights: Vec<f32>,
    pub bias: f32,
}

/// Logistic sequence scorer: `sigmoid(w · x + b)`.
#[derive(Debug, Clone)]
pub struct LogisticScorer {
    weights: Array1<f32>,
    bias: f32,
}

impl LogisticScorer {
    pub fn new(weights: Vec<f32>, bias: f32) -> Self {
        Self {
            weights: Array1::from(weights),
            bias,
        }
    }

    pub fn from_json_str(contents: &str) -> Result<Self, ClassifierError> {
        let asset: LogisticWeights = serde_json::from_str(contents)
            .map_err(|err| ClassifierError::Scorer(format!("parsing weights: {}", err)))?;
        if asset.weights.is_empty() {
            return Err(ClassifierError::Scorer("weights asset is empty".into()));
        }
        Ok(Self::new(asset.weights, asset.bias))
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ClassifierError> {
        let path_ref = path.as_ref();
        let contents = fs::read_to_string(path_ref).map_err(|err| {
            ClassifierError::Scorer(format!("reading weights {}: {}", path_ref.display(), err))
        })?;
        Self::from_json_str(&contents)
    }
}

fn sigmoid(value: f32) -> f32 {
    1.0 / (1.0 + (-value).exp())
}

impl SequenceScorer for LogisticScorer {
    fn input_len(&self) -> usize {
        self.weights.len()
    }

    fn run(&self, input: ArrayView3<'_, f32>) -> Result<Array2<f32>, ClassifierError> {
        if input.dim() != (1, self.weights.len(), 1) {
            return Err(ClassifierError::InvalidInputShape {
                expected: self.weights.len(),
                actual: input.len(),
            });
        }
        let sequence = input
            .index_axis_move(Axis(2), 0)
            .index_axis_move(Axis(0), 0);
        let logit = sequence.dot(&self.weights) + self.bias;
        Ok(Array2::from_elem((1, 1), sigmoid(logit)))
    }
}
