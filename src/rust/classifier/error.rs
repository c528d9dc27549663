use std::io;
use std::path::PathBuf;

/// Errors raised while acquiring the classifier handle.
///
/// All of these are fatal: the online service refuses to become ready and the
/// batch tool terminates before touching any input file.
#[derive(Debug, thiserror::Error)]
pub enum ModelLoadError {
    /// The weights file does not exist
    #[error("Model file not found: {}", .0.display())]
    NotFound(PathBuf),
    /// The weights file exists but could not be read
    #[error("Failed to read model file {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    /// The weights digest did not match the configured one
    #[error("Weights checksum mismatch: expected {expected}, got {actual}")]
    ChecksumMismatch { expected: String, actual: String },
    /// ONNX Runtime rejected the blob
    #[error("Failed to load model from {}: {reason}", path.display())]
    Runtime { path: PathBuf, reason: String },
    /// The graph loaded but its signature does not match the digit classifier
    #[error("Incompatible model architecture: {0}")]
    Incompatible(String),
    /// No weights source was given to the builder
    #[error("Build error: {0}")]
    Build(String),
}

impl From<ort::Error> for ModelLoadError {
    fn from(err: ort::Error) -> Self {
        ModelLoadError::Build(err.to_string())
    }
}

/// Failure of a single forward pass.
#[derive(Debug, thiserror::Error)]
pub enum InferenceError {
    #[error("Failed to create input tensor: {0}")]
    Tensor(String),
    #[error("Failed to run model: {0}")]
    Run(String),
    #[error("Failed to extract output tensor: {0}")]
    Output(String),
    #[error("Expected {expected} class scores, model produced {actual}")]
    ScoreCount { expected: usize, actual: usize },
    #[error("Classifier session lock poisoned")]
    Poisoned,
}
