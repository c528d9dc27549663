use std::path::PathBuf;
use std::sync::Mutex;

use ort::session::Session;
use ort::value::TensorRef;

use super::error::InferenceError;
use crate::models::{InputTensor, ScoreVector, NUM_CLASSES};

/// The "classify tensor into logits" capability the pipeline depends on.
///
/// Implementations are loaded once and shared read-only across concurrent
/// callers, hence `Send + Sync` and `&self`.
pub trait DigitModel: Send + Sync {
    fn infer(&self, input: &InputTensor) -> Result<ScoreVector, InferenceError>;
}

/// Information about a loaded classifier handle.
#[derive(Debug, Clone)]
pub struct ModelInfo {
    /// Path the weights were loaded from
    pub model_path: PathBuf,
    /// Name of the graph input fed with the `(1, 1, 28, 28)` tensor
    pub input_name: String,
    /// Name of the graph output holding the 10 logits
    pub output_name: String,
}

/// Digit classifier backed by an ONNX Runtime session.
///
/// An ONNX inference session carries no training state: dropout and batch
/// norm are frozen into the graph, so the handle is in evaluation mode for
/// its whole lifetime.
///
/// `Session::run` needs exclusive access, so only the forward pass goes
/// through the mutex. Decoding and pre/post-processing run outside it.
#[derive(Debug)]
pub struct OnnxClassifier {
    pub(crate) session: Mutex<Session>,
    pub(crate) info: ModelInfo,
}

// Compile-time verification of thread-safety
const _: () = {
    fn assert_send_sync<T: Send + Sync>() {}
    fn verify_thread_safety() {
        assert_send_sync::<OnnxClassifier>();
    }
};

impl OnnxClassifier {
    /// Creates a new ClassifierBuilder for fluent construction
    pub fn builder() -> super::builder::ClassifierBuilder {
        super::builder::ClassifierBuilder::new()
    }

    pub fn info(&self) -> &ModelInfo {
        &self.info
    }
}

impl DigitModel for OnnxClassifier {
    fn infer(&self, input: &InputTensor) -> Result<ScoreVector, InferenceError> {
        let tensor = TensorRef::from_array_view(input.as_array().view())
            .map_err(|e| InferenceError::Tensor(e.to_string()))?;

        let mut session = self.session.lock().map_err(|_| InferenceError::Poisoned)?;
        let outputs = session
            .run(ort::inputs![self.info.input_name.as_str() => tensor])
            .map_err(|e| InferenceError::Run(e.to_string()))?;

        let (_, data) = outputs[self.info.output_name.as_str()]
            .try_extract_tensor::<f32>()
            .map_err(|e| InferenceError::Output(e.to_string()))?;

        let scores = ScoreVector::from_slice(data).ok_or(InferenceError::ScoreCount {
            expected: NUM_CLASSES,
            actual: data.len(),
        })?;
        if scores.0.iter().any(|s| !s.is_finite()) {
            return Err(InferenceError::Output("model produced non-finite scores".into()));
        }
        Ok(scores)
    }
}
