mod builder;
mod error;
mod model;
pub(crate) mod utils;

pub use builder::ClassifierBuilder;
pub use error::{InferenceError, ModelLoadError};
pub use model::{DigitModel, ModelInfo, OnnxClassifier};
