//! Command-line and environment configuration for both binaries.

use std::net::SocketAddr;
use std::path::PathBuf;

use clap::Parser;

use crate::runtime::{OptimizationLevel, RuntimeConfig};
use crate::weights::WeightsSource;

pub const DEFAULT_MODEL_PATH: &str = "model_weights.pth";
pub const DEFAULT_BIND: &str = "0.0.0.0:8000";
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

/// Options shared by everything that loads the classifier.
#[derive(clap::Args, Debug, Clone)]
pub struct ModelArgs {
    /// Path to the model weights (an ONNX graph, whatever the extension)
    #[arg(long, env = "DIGITSERVE_MODEL_PATH", default_value = DEFAULT_MODEL_PATH)]
    pub model_path: PathBuf,

    /// Expected SHA-256 of the weights file (hex); loading fails on mismatch
    #[arg(long, env = "DIGITSERVE_MODEL_SHA256")]
    pub model_sha256: Option<String>,

    /// Threads used within a single inference (0 lets ONNX Runtime decide)
    #[arg(long, env = "DIGITSERVE_INTRA_THREADS", default_value_t = 0)]
    pub intra_threads: usize,

    /// Graph optimisation level applied at load time
    #[arg(long, env = "DIGITSERVE_OPTIMIZATION", value_enum, default_value_t = OptimizationLevel::All)]
    pub optimization: OptimizationLevel,
}

impl ModelArgs {
    pub fn weights(&self) -> WeightsSource {
        let source = WeightsSource::new(&self.model_path);
        match &self.model_sha256 {
            Some(digest) => source.with_expected_sha256(digest.clone()),
            None => source,
        }
    }

    pub fn runtime(&self) -> RuntimeConfig {
        RuntimeConfig {
            intra_threads: self.intra_threads,
            optimization_level: self.optimization,
            ..RuntimeConfig::default()
        }
    }
}

/// MNIST digit recognition API
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct ServeArgs {
    #[command(flatten)]
    pub model: ModelArgs,

    /// Address to listen on
    #[arg(long, env = "DIGITSERVE_BIND", default_value = DEFAULT_BIND)]
    pub bind: SocketAddr,

    /// Largest accepted request body in bytes
    #[arg(long, env = "DIGITSERVE_MAX_UPLOAD_BYTES", default_value_t = DEFAULT_MAX_UPLOAD_BYTES)]
    pub max_upload_bytes: usize,
}

/// Batch predict digits from images using a trained MNIST model
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct BatchArgs {
    #[command(flatten)]
    pub model: ModelArgs,

    /// Directory containing images to process
    #[arg(long, default_value = "test")]
    pub image_dir: PathBuf,

    /// Output CSV file path
    #[arg(long, default_value = "result.csv")]
    pub output: PathBuf,
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub weights: WeightsSource,
    pub runtime: RuntimeConfig,
    pub bind: SocketAddr,
    pub max_upload_bytes: usize,
}

impl From<ServeArgs> for ServerConfig {
    fn from(args: ServeArgs) -> Self {
        Self {
            weights: args.model.weights(),
            runtime: args.model.runtime(),
            bind: args.bind,
            max_upload_bytes: args.max_upload_bytes,
        }
    }
}

#[derive(Debug, Clone)]
pub struct BatchConfig {
    pub weights: WeightsSource,
    pub runtime: RuntimeConfig,
    pub image_dir: PathBuf,
    pub output: PathBuf,
}

impl From<BatchArgs> for BatchConfig {
    fn from(args: BatchArgs) -> Self {
        Self {
            weights: args.model.weights(),
            runtime: args.model.runtime(),
            image_dir: args.image_dir,
            output: args.output,
        }
    }
}
