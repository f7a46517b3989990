//! Gesture classification.
//!
//! The classifier is a black box: one [`Tensor`] in, one
//! [`ConfidenceScore`] out. Implementations may keep internal state and
//! need not be reentrant; the pipeline calls them from a single worker
//! and never concurrently.

mod model;
#[cfg(feature = "onnx")]
mod onnx;
mod stub;

pub use model::{ModelSource, MODEL_FILE_NAME};
#[cfg(feature = "onnx")]
pub use onnx::OnnxClassifier;
pub use stub::{ConstantClassifier, StubClassifier};

use crate::encoding::Tensor;
use thiserror::Error;

/// Errors raised while running inference on one frame.
#[derive(Debug, Clone, Error)]
pub enum ClassifierError {
    /// The backend failed to run.
    #[error("inference failed: {0}")]
    Inference(String),

    /// The model produced no output.
    #[error("model produced no output")]
    EmptyOutput,

    /// The score is NaN or outside `[0, 1]`.
    #[error("score {0} outside [0, 1]")]
    ScoreOutOfRange(f32),

    /// The classifier panicked.
    #[error("classifier panicked: {0}")]
    Panicked(String),
}

/// Errors raised while loading the model artifact at startup.
#[derive(Debug, Error)]
pub enum ModelLoadError {
    /// No artifact at the expected path.
    #[error("model artifact not found: {0}")]
    NotFound(String),

    /// The artifact exists but could not be read.
    #[error("failed to read model artifact {path}: {source}")]
    Read {
        /// Artifact path.
        path: String,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The artifact is empty or not a valid model.
    #[error("invalid model artifact: {0}")]
    Invalid(String),

    /// Built without an inference backend.
    #[error("no inference backend compiled in (enable the `onnx` feature)")]
    BackendUnavailable,
}

/// Classifier confidence that the gesture is present, in `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, serde::Serialize)]
pub struct ConfidenceScore(f32);

impl ConfidenceScore {
    /// Certain absence.
    pub const ZERO: Self = Self(0.0);

    /// Wraps a raw score, rejecting NaN and values outside `[0, 1]`.
    pub fn new(value: f32) -> Result<Self, ClassifierError> {
        if (0.0..=1.0).contains(&value) {
            Ok(Self(value))
        } else {
            Err(ClassifierError::ScoreOutOfRange(value))
        }
    }

    /// Returns the raw value.
    #[inline]
    pub fn value(self) -> f32 {
        self.0
    }
}

impl std::fmt::Display for ConfidenceScore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:.3}", self.0)
    }
}

/// Trait for gesture classifiers.
pub trait GestureClassifier: Send {
    /// Scores one input tensor.
    fn classify(&mut self, input: &Tensor) -> Result<ConfidenceScore, ClassifierError>;

    /// Short name for logs.
    fn name(&self) -> &str;
}

impl<C: GestureClassifier + ?Sized> GestureClassifier for Box<C> {
    fn classify(&mut self, input: &Tensor) -> Result<ConfidenceScore, ClassifierError> {
        (**self).classify(input)
    }

    fn name(&self) -> &str {
        (**self).name()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_score_bounds() {
        assert!(ConfidenceScore::new(0.0).is_ok());
        assert!(ConfidenceScore::new(1.0).is_ok());
        assert!(matches!(
            ConfidenceScore::new(1.01),
            Err(ClassifierError::ScoreOutOfRange(_))
        ));
        assert!(ConfidenceScore::new(-0.1).is_err());
        assert!(ConfidenceScore::new(f32::NAN).is_err());
    }

    #[test]
    fn test_score_display() {
        assert_eq!(ConfidenceScore::new(0.95).unwrap().to_string(), "0.950");
    }
}
