//! Data contracts shared by the inference pipeline and both serving shells.

use std::fmt;

use image::{GrayImage, ImageFormat};
use ndarray::Array4;
use serde::{Deserialize, Serialize};

use crate::error::UnsupportedMediaType;

/// Side length of the square grid the classifier consumes.
pub const INPUT_SIZE: u32 = 28;

/// One score per digit 0-9.
pub const NUM_CLASSES: usize = 10;

/// The two encodings the service accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MediaType {
    Jpeg,
    Png,
}

impl MediaType {
    /// Parses a declared content type. Only the exact strings `image/jpeg`
    /// and `image/png` are accepted.
    pub fn from_mime(mime: &str) -> Result<Self, UnsupportedMediaType> {
        match mime {
            "image/jpeg" => Ok(Self::Jpeg),
            "image/png" => Ok(Self::Png),
            other => Err(UnsupportedMediaType(other.to_string())),
        }
    }

    /// Maps a file extension (any letter case) to its encoding.
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "jpg" | "jpeg" => Some(Self::Jpeg),
            "png" => Some(Self::Png),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Jpeg => "image/jpeg",
            Self::Png => "image/png",
        }
    }

    pub(crate) fn image_format(&self) -> ImageFormat {
        match self {
            Self::Jpeg => ImageFormat::Jpeg,
            Self::Png => ImageFormat::Png,
        }
    }
}

impl fmt::Display for MediaType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Encoded image bytes together with their declared encoding.
#[derive(Debug, Clone)]
pub struct RawImage {
    pub bytes: Vec<u8>,
    pub media_type: MediaType,
}

impl RawImage {
    pub fn new(bytes: impl Into<Vec<u8>>, media_type: MediaType) -> Self {
        Self {
            bytes: bytes.into(),
            media_type,
        }
    }
}

/// Decoded single-channel intensity grid at the image's native size.
#[derive(Debug, Clone, PartialEq)]
pub struct PixelGrid(pub GrayImage);

impl PixelGrid {
    pub fn width(&self) -> u32 {
        self.0.width()
    }

    pub fn height(&self) -> u32 {
        self.0.height()
    }
}

/// Normalised classifier input of shape `(1, 1, 28, 28)` with values in `[0, 1]`.
#[derive(Debug, Clone, PartialEq)]
pub struct InputTensor(pub(crate) Array4<f32>);

impl InputTensor {
    pub const SHAPE: [usize; 4] = [1, 1, INPUT_SIZE as usize, INPUT_SIZE as usize];

    pub fn as_array(&self) -> &Array4<f32> {
        &self.0
    }

    pub fn shape(&self) -> &[usize] {
        self.0.shape()
    }
}

/// Raw per-class logits for digits 0-9.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoreVector(pub [f32; NUM_CLASSES]);

impl ScoreVector {
    pub fn from_slice(scores: &[f32]) -> Option<Self> {
        <[f32; NUM_CLASSES]>::try_from(scores).ok().map(Self)
    }
}

/// The discrete answer for one image.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Prediction {
    /// Predicted digit (0-9)
    pub digit: u8,
    /// Softmax probability of the predicted digit (0.0-1.0)
    pub confidence: f32,
}

/// Body of `GET /health`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
}

impl Default for HealthResponse {
    fn default() -> Self {
        Self {
            status: "ok".to_string(),
        }
    }
}

/// One line of the batch results table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BatchResultRow {
    pub filename: String,
    pub predicted_digit: u8,
    pub confidence: f32,
}

impl BatchResultRow {
    pub fn new(filename: impl Into<String>, prediction: Prediction) -> Self {
        Self {
            filename: filename.into(),
            predicted_digit: prediction.digit,
            confidence: prediction.confidence,
        }
    }
}
