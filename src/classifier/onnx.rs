//! ONNX Runtime backed classifier.

use super::{ClassifierError, ConfidenceScore, GestureClassifier, ModelLoadError, ModelSource};
use crate::encoding::Tensor;
use ndarray::ArrayView4;
use ort::{
    inputs,
    session::{builder::GraphOptimizationLevel, Session},
    value::TensorRef,
};

/// Classifier running the bundled model through ONNX Runtime.
///
/// The model takes a `[1, 224, 224, 3]` f32 input and returns a single
/// probability in its first output.
pub struct OnnxClassifier {
    session: Session,
    source: String,
}

impl OnnxClassifier {
    /// Loads and prepares the model. A missing or corrupt artifact is an
    /// error here, never on a frame.
    pub fn load(source: &ModelSource) -> Result<Self, ModelLoadError> {
        let bytes = source.read()?;

        let session = Session::builder()
            .map_err(|e| ModelLoadError::Invalid(format!("failed to create session builder: {e}")))?
            .with_optimization_level(GraphOptimizationLevel::Level3)
            .map_err(|e| ModelLoadError::Invalid(e.to_string()))?
            .with_intra_threads(2)
            .map_err(|e| ModelLoadError::Invalid(e.to_string()))?
            .commit_from_memory(&bytes)
            .map_err(|e| ModelLoadError::Invalid(format!("{}: {e}", source.describe())))?;

        tracing::info!(model = %source.describe(), "Gesture model loaded");

        Ok(Self {
            session,
            source: source.describe(),
        })
    }
}

impl GestureClassifier for OnnxClassifier {
    fn classify(&mut self, input: &Tensor) -> Result<ConfidenceScore, ClassifierError> {
        let [n, h, w, c] = Tensor::SHAPE;
        let array = ArrayView4::from_shape((n, h, w, c), input.as_slice())
            .map_err(|e| ClassifierError::Inference(e.to_string()))?;
        let tensor = TensorRef::from_array_view(array)
            .map_err(|e| ClassifierError::Inference(format!("failed to create tensor ref: {e}")))?;

        let outputs = self
            .session
            .run(inputs![tensor])
            .map_err(|e| ClassifierError::Inference(e.to_string()))?;
        if outputs.len() == 0 {
            return Err(ClassifierError::EmptyOutput);
        }

        let scores = outputs[0]
            .try_extract_array::<f32>()
            .map_err(|e| ClassifierError::Inference(format!("output is not f32: {e}")))?;
        let raw = scores.iter().next().copied().ok_or(ClassifierError::EmptyOutput)?;

        ConfidenceScore::new(raw)
    }

    fn name(&self) -> &str {
        &self.source
    }
}
