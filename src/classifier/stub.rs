//! Model-free classifiers.

use super::{ClassifierError, ConfidenceScore, GestureClassifier};
use crate::encoding::Tensor;
use std::time::Duration;

/// Detector that never reports the gesture.
///
/// Runs the full pipeline without a model artifact.
#[derive(Debug, Default, Clone, Copy)]
pub struct StubClassifier;

impl GestureClassifier for StubClassifier {
    fn classify(&mut self, _input: &Tensor) -> Result<ConfidenceScore, ClassifierError> {
        Ok(ConfidenceScore::ZERO)
    }

    fn name(&self) -> &str {
        "stub"
    }
}

/// Returns the same score for every frame, optionally after a delay.
#[derive(Debug, Clone)]
pub struct ConstantClassifier {
    score: ConfidenceScore,
    latency: Duration,
}

impl ConstantClassifier {
    /// Always returns `score`.
    pub fn new(score: ConfidenceScore) -> Self {
        Self {
            score,
            latency: Duration::ZERO,
        }
    }

    /// Simulates inference cost.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }
}

impl GestureClassifier for ConstantClassifier {
    fn classify(&mut self, _input: &Tensor) -> Result<ConfidenceScore, ClassifierError> {
        if !self.latency.is_zero() {
            std::thread::sleep(self.latency);
        }
        Ok(self.score)
    }

    fn name(&self) -> &str {
        "constant"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn blank() -> Tensor {
        Tensor::from_values(vec![0.0; Tensor::LEN]).unwrap()
    }

    #[test]
    fn test_stub_never_detects() {
        let mut stub = StubClassifier;
        for _ in 0..3 {
            assert_eq!(stub.classify(&blank()).unwrap(), ConfidenceScore::ZERO);
        }
    }

    #[test]
    fn test_constant_latency() {
        let score = ConfidenceScore::new(0.9).unwrap();
        let mut classifier = ConstantClassifier::new(score).with_latency(Duration::from_millis(20));

        let start = std::time::Instant::now();
        assert_eq!(classifier.classify(&blank()).unwrap(), score);
        assert!(start.elapsed() >= Duration::from_millis(20));
    }
}
