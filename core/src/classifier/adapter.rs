use crate::prelude::{ClassifierError, SequenceScorer};
use ndarray::Array3;
use serde::{Deserialize, Serialize};

/// Scores strictly above this value are abnormal.
pub const DEFAULT_ABNORMAL_THRESHOLD: f32 = 0.66;

/// Binary driving-behaviour classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Verdict {
    Normal,
    Abnormal,
}

impl Verdict {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Normal => "normal driving",
            Self::Abnormal => "abnormal driving",
        }
    }
}

/// Applies the decision rule. The comparison is strict: a score equal to the
/// threshold is normal.
pub fn decide(score: f32, threshold: f32) -> Verdict {
    if score > threshold {
        Verdict::Abnormal
    } else {
        Verdict::Normal
    }
}

/// Wraps the opaque scorer behind the fixed `[1, N, 1]` input contract.
pub struct ClassifierAdapter {
    scorer: Option<Box<dyn SequenceScorer>>,
    input_len: usize,
    threshold: f32,
}

impl ClassifierAdapter {
    /// Creates an adapter with no model loaded.
    pub fn new(input_len: usize, threshold: f32) -> Self {
        Self {
            scorer: None,
            input_len,
            threshold,
        }
    }

    pub fn with_scorer(
        mut self,
        scorer: Box<dyn SequenceScorer>,
    ) -> Result<Self, ClassifierError> {
        self.load(scorer)?;
        Ok(self)
    }

    /// Installs a scorer, rejecting one whose input length differs from the window.
    pub fn load(&mut self, scorer: Box<dyn SequenceScorer>) -> Result<(), ClassifierError> {
        if scorer.input_len() != self.input_len {
            return Err(ClassifierError::InvalidInputShape {
                expected: self.input_len,
                actual: scorer.input_len(),
            });
        }
        self.scorer = Some(scorer);
        Ok(())
    }

    pub fn unload(&mut self) {
        self.scorer = None;
    }

    pub fn is_loaded(&self) -> bool {
        self.scorer.is_some()
    }

    pub fn input_len(&self) -> usize {
        self.input_len
    }

    pub fn threshold(&self) -> f32 {
        self.threshold
    }

    /// Runs the scorer on `window` and returns the raw, unclamped score.
    pub fn score(&self, window: &[f32]) -> Result<f32, ClassifierError> {
        if window.len() != self.input_len {
            return Err(ClassifierError::InvalidInputShape {
                expected: self.input_len,
                actual: window.len(),
            });
        }
        let scorer = self
            .scorer
            .as_ref()
            .ok_or(ClassifierError::ModelUnavailable)?;

        let input = Array3::from_shape_vec((1, self.input_len, 1), window.to_vec()).map_err(
            |_| ClassifierError::InvalidInputShape {
                expected: self.input_len,
                actual: window.len(),
            },
        )?;
        let output = scorer.run(input.view())?;
        if output.dim() != (1, 1) {
            return Err(ClassifierError::Scorer(format!(
                "expected [1, 1] output, got {:?}",
                output.shape()
            )));
        }
        Ok(output[[0, 0]])
    }

    pub fn classify(&self, window: &[f32]) -> Result<Verdict, ClassifierError> {
        self.score(window)
            .map(|score| decide(score, self.threshold))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classifier::fixed::FixedScorer;
    use ndarray::{Array2, ArrayView3};

    struct WideOutput;

    impl SequenceScorer for WideOutput {
        fn input_len(&self) -> usize {
            3
        }

        fn run(&self, _input: ArrayView3<'_, f32>) -> Result<Array2<f32>, ClassifierError> {
            Ok(Array2::zeros((1, 2)))
        }
    }

    #[test]
    fn decision_threshold_is_strict() {
        assert_eq!(decide(0.661, 0.66), Verdict::Abnormal);
        assert_eq!(decide(0.66, 0.66), Verdict::Normal);
        assert_eq!(decide(0.0, 0.66), Verdict::Normal);
    }

    #[test]
    fn unloaded_model_fails_fast() {
        let adapter = ClassifierAdapter::new(3, DEFAULT_ABNORMAL_THRESHOLD);
        assert!(matches!(
            adapter.classify(&[1.0, 2.0, 3.0]),
            Err(ClassifierError::ModelUnavailable)
        ));
    }

    #[test]
    fn wrong_window_length_is_rejected() {
        let adapter = ClassifierAdapter::new(3, DEFAULT_ABNORMAL_THRESHOLD)
            .with_scorer(Box::new(FixedScorer::new(3, 0.9)))
            .unwrap();
        assert!(matches!(
            adapter.classify(&[1.0, 2.0]),
            Err(ClassifierError::InvalidInputShape {
                expected: 3,
                actual: 2
            })
        ));
    }

    #[test]
    fn mismatched_scorer_cannot_be_loaded() {
        let mut adapter = ClassifierAdapter::new(10, DEFAULT_ABNORMAL_THRESHOLD);
        assert!(adapter.load(Box::new(FixedScorer::new(4, 0.1))).is_err());
        assert!(!adapter.is_loaded());
    }

    #[test]
    fn scorer_output_shape_is_checked() {
        let adapter = ClassifierAdapter::new(3, DEFAULT_ABNORMAL_THRESHOLD)
            .with_scorer(Box::new(WideOutput))
            .unwrap();
        assert!(matches!(
            adapter.score(&[0.0; 3]),
            Err(ClassifierError::Scorer(_))
        ));
    }

    #[test]
    fn loaded_model_produces_verdict() {
        let adapter = ClassifierAdapter::new(3, DEFAULT_ABNORMAL_THRESHOLD)
            .with_scorer(Box::new(FixedScorer::new(3, 0.7)))
            .unwrap();
        assert_eq!(adapter.classify(&[0.0; 3]).unwrap(), Verdict::Abnormal);
    }
}
