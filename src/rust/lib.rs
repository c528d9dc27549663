//! Handwritten digit recognition over 28×28 grayscale input, served two ways:
//! a synchronous HTTP endpoint for single images and a batch tool that turns a
//! directory of images into a CSV table.
//!
//! Both paths share one [`InferenceService`], so an image is decoded, resized
//! and normalised identically whichever way it arrives.
//!
//! # Basic Usage
//!
//! ```no_run
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! use digitserve::{InferenceService, MediaType, RawImage, RuntimeConfig, WeightsSource};
//!
//! let service = InferenceService::load(
//!     WeightsSource::new("model_weights.onnx"),
//!     RuntimeConfig::default(),
//! )?;
//!
//! let bytes = std::fs::read("digit.png")?;
//! let prediction = service.classify(&RawImage::new(bytes, MediaType::Png))?;
//! println!("digit {} ({:.1}%)", prediction.digit, prediction.confidence * 100.0);
//! # Ok(())
//! # }
//! ```
//!
//! # Thread Safety
//!
//! `InferenceService` is `Send + Sync`; wrap it in an `Arc` to share the single
//! loaded classifier across threads or request handlers.

pub mod batch;
pub mod classifier;
pub mod config;
pub mod error;
pub mod models;
pub mod pipeline;
mod runtime;
pub mod server;
pub mod weights;

pub use batch::{run_batch, BatchError, BatchRunner, BatchSummary, FileOutcome, SkipReason};
pub use classifier::{
    ClassifierBuilder, DigitModel, InferenceError, ModelInfo, ModelLoadError, OnnxClassifier,
};
pub use config::{BatchArgs, BatchConfig, ServeArgs, ServerConfig};
pub use error::{ClassificationError, DecodeError, UnsupportedMediaType};
pub use models::{
    BatchResultRow, HealthResponse, InputTensor, MediaType, PixelGrid, Prediction, RawImage,
    ScoreVector, INPUT_SIZE, NUM_CLASSES,
};
pub use pipeline::InferenceService;
pub use runtime::{create_session_builder, OptimizationLevel, RuntimeConfig};
pub use weights::WeightsSource;

/// Initialises `env_logger` with an `info` default, overridable via `RUST_LOG`.
pub fn init_logger() {
    let _ = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .try_init();
}
