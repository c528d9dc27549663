//! The shared inference pipeline used by both the HTTP server and the batch tool.

pub mod decode;
pub mod postprocess;
pub mod preprocess;
mod service;

pub use service::InferenceService;
