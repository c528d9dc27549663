use crate::classifier::InferenceError;

/// The declared media type of an upload is outside the accepted set.
///
/// Raised by the serving shells before any decoding happens.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Invalid file type: {0}. Only JPEG and PNG are supported.")]
pub struct UnsupportedMediaType(pub String);

/// The byte stream is not a valid image of the declared encoding.
#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
    /// The bytes carry no recognisable image signature
    #[error("cannot identify image file: {0}")]
    Unidentified(#[source] image::ImageError),
    /// The bytes are a valid image of another format than the declared one
    #[error("declared {declared} but data is {actual}")]
    FormatMismatch {
        declared: &'static str,
        actual: String,
    },
    /// Recognised format, but the stream is corrupt or truncated
    #[error("{0}")]
    Malformed(#[source] image::ImageError),
}

/// Any failure inside the classify pipeline.
///
/// Decode problems stay distinguishable through [`ClassificationError::is_decode`]
/// so the batch shell can word its warnings accordingly.
#[derive(Debug, thiserror::Error)]
pub enum ClassificationError {
    #[error(transparent)]
    Decode(#[from] DecodeError),
    #[error("preprocessing failed: {0}")]
    Preprocess(String),
    #[error(transparent)]
    Inference(#[from] InferenceError),
    #[error("inference task failed: {0}")]
    Task(String),
}

impl ClassificationError {
    pub fn is_decode(&self) -> bool {
        matches!(self, Self::Decode(_))
    }
}
