use ort::session::builder::{GraphOptimizationLevel, SessionBuilder};
use ort::session::Session;
use ort::Result as OrtResult;
use std::sync::Once;

static INIT: Once = Once::new();

/// Graph optimisation applied when the classifier session is created.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum OptimizationLevel {
    Disable,
    Basic,
    Extended,
    #[default]
    All,
}

impl From<OptimizationLevel> for GraphOptimizationLevel {
    fn from(level: OptimizationLevel) -> Self {
        match level {
            OptimizationLevel::Disable => GraphOptimizationLevel::Disable,
            OptimizationLevel::Basic => GraphOptimizationLevel::Level1,
            OptimizationLevel::Extended => GraphOptimizationLevel::Level2,
            OptimizationLevel::All => GraphOptimizationLevel::Level3,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct RuntimeConfig {
    pub inter_threads: usize, // 0 lets ONNX Runtime decide
    pub intra_threads: usize, // 0 lets ONNX Runtime decide
    pub optimization_level: OptimizationLevel,
}

pub fn ensure_initialized() {
    INIT.call_once(|| {
        // Only the first committed environment takes effect; sessions share it.
        let _ = ort::init().with_name("digitserve").commit();
        log::debug!("ONNX Runtime environment initialised");
    });
}

pub fn create_session_builder(config: &RuntimeConfig) -> OrtResult<SessionBuilder> {
    ensure_initialized();
    let mut builder = Session::builder()?;

    if config.inter_threads > 0 {
        builder = builder.with_inter_threads(config.inter_threads)?;
    }
    if config.intra_threads > 0 {
        builder = builder.with_intra_threads(config.intra_threads)?;
    }

    builder = builder.with_optimization_level(config.optimization_level.into())?;

    Ok(builder)
}
