use crate::prelude::{ClassifierError, SequenceScorer};
use ndarray::{Array2, ArrayView3};

/// Scorer that returns the same score for every window.
///
/// Used for dry runs without a trained model.
#[derive(Debug, Clone)]
pub struct FixedScorer {
    input_len: usize,
    score: f32,
}

impl FixedScorer {
    pub fn new(input_len: usize, score: f32) -> Self {
        Self { input_len, score }
    }
}

impl SequenceScorer for FixedScorer {
    fn input_len(&self) -> usize {
        self.input_len
    }

    fn run(&self, input: ArrayView3<'_, f32>) -> Result<Array2<f32>, ClassifierError> {
        if input.dim() != (1, self.input_len, 1) {
            return Err(ClassifierError::InvalidInputShape {
                expected: self.input_len,
                actual: input.len(),
            });
        }
        Ok(Array2::from_elem((1, 1), self.score))
    }
}
