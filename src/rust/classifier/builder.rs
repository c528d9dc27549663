use std::sync::Mutex;

use log::{error, info};
use ort::session::Session;
use ort::value::ValueType;

use super::error::ModelLoadError;
use super::model::{ModelInfo, OnnxClassifier};
use crate::models::{INPUT_SIZE, NUM_CLASSES};
use crate::runtime::{create_session_builder, RuntimeConfig};
use crate::weights::WeightsSource;

/// A builder for constructing an OnnxClassifier with a fluent interface.
#[derive(Default, Debug)]
pub struct ClassifierBuilder {
    weights: Option<WeightsSource>,
    runtime_config: RuntimeConfig,
}

impl ClassifierBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the runtime configuration for ONNX model execution
    ///
    /// # Example
    /// ```
    /// use digitserve::{ClassifierBuilder, RuntimeConfig};
    ///
    /// let builder = ClassifierBuilder::new()
    ///     .with_runtime_config(RuntimeConfig::default());
    /// ```
    pub fn with_runtime_config(mut self, config: RuntimeConfig) -> Self {
        self.runtime_config = config;
        self
    }

    /// Sets the weights blob to load.
    pub fn with_weights(mut self, weights: WeightsSource) -> Self {
        self.weights = Some(weights);
        self
    }

    /// Loads and validates the classifier.
    ///
    /// Loading is all-or-nothing. Fails with:
    /// - `NotFound` if the weights file is missing
    /// - `ChecksumMismatch` if a pinned digest does not match
    /// - `Runtime` if ONNX Runtime cannot parse the blob
    /// - `Incompatible` if the graph signature is not a 28×28 → 10 classifier
    ///
    /// # Example
    /// ```no_run
    /// # fn main() -> Result<(), Box<dyn std::error::Error>> {
    /// use digitserve::{ClassifierBuilder, WeightsSource};
    ///
    /// let classifier = ClassifierBuilder::new()
    ///     .with_weights(WeightsSource::new("model_weights.onnx"))
    ///     .build()?;
    /// println!("loaded {:?}", classifier.info().model_path);
    /// # Ok(())
    /// # }
    /// ```
    pub fn build(self) -> Result<OnnxClassifier, ModelLoadError> {
        let weights = self
            .weights
            .ok_or_else(|| ModelLoadError::Build("Weights source must be set".to_string()))?;
        weights.verify()?;

        let path = weights.path().to_path_buf();
        let session = create_session_builder(&self.runtime_config)?
            .commit_from_file(&path)
            .map_err(|e| {
                error!("Failed to load model from {:?}: {}", path, e);
                ModelLoadError::Runtime {
                    path: path.clone(),
                    reason: e.to_string(),
                }
            })?;

        let (input_name, output_name) = Self::validate_model(&session)?;
        info!("Model structure validated successfully");

        Ok(OnnxClassifier {
            session: Mutex::new(session),
            info: ModelInfo {
                model_path: path,
                input_name,
                output_name,
            },
        })
    }

    /// Validates that the model has the digit classifier's input/output
    /// structure and returns the input and output names.
    fn validate_model(session: &Session) -> Result<(String, String), ModelLoadError> {
        let inputs = &session.inputs;
        if inputs.len() != 1 {
            return Err(ModelLoadError::Incompatible(format!(
                "Model must have exactly 1 input, found {}",
                inputs.len()
            )));
        }
        let input = &inputs[0];
        if let ValueType::Tensor { shape, .. } = &input.input_type {
            let dims: Vec<i64> = shape.iter().copied().collect();
            check_input_dims(&dims)?;
        } else {
            return Err(ModelLoadError::Incompatible(format!(
                "Input '{}' is not a tensor",
                input.name
            )));
        }

        let output = session.outputs.first().ok_or_else(|| {
            ModelLoadError::Incompatible("Model must have at least 1 output for class scores".into())
        })?;
        if let ValueType::Tensor { shape, .. } = &output.output_type {
            let dims: Vec<i64> = shape.iter().copied().collect();
            check_output_dims(&dims)?;
        }

        Ok((input.name.clone(), output.name.clone()))
    }
}

/// Expects `[batch, 1, 28, 28]`; negative entries are dynamic and accepted.
fn check_input_dims(dims: &[i64]) -> Result<(), ModelLoadError> {
    let size = i64::from(INPUT_SIZE);
    let expected = [1, 1, size, size];
    let compatible = dims.len() == expected.len()
        && dims.iter().zip(expected).all(|(&d, e)| d < 0 || d == e);
    if !compatible {
        return Err(ModelLoadError::Incompatible(format!(
            "expected input shape [1, 1, {size}, {size}], model declares {dims:?}"
        )));
    }
    Ok(())
}

fn check_output_dims(dims: &[i64]) -> Result<(), ModelLoadError> {
    match dims.last() {
        Some(&d) if d >= 0 && d != NUM_CLASSES as i64 => Err(ModelLoadError::Incompatible(format!(
            "expected {NUM_CLASSES} class scores, model declares output shape {dims:?}"
        ))),
        _ => Ok(()),
    }
}
