#![allow(dead_code)]

pub mod onnx;

use std::fs;
use std::io::{self, Cursor};
use std::path::{Path, PathBuf};

use digitserve::{DigitModel, InferenceError, InputTensor, ScoreVector};
use env_logger::{Builder, Env};
use image::{DynamicImage, GrayImage, ImageFormat, Luma, Rgb, RgbImage};

// Initialize test logger
pub fn init() {
    let _ = Builder::from_env(Env::default().default_filter_or("warn"))
        .is_test(true)
        .try_init();
}

/// Predicts the digit closest to `mean brightness * 9`, with logits falling
/// off linearly around it.
pub struct BrightnessModel;

impl DigitModel for BrightnessModel {
    fn infer(&self, input: &InputTensor) -> Result<ScoreVector, InferenceError> {
        let mean = input.as_array().mean().unwrap_or(0.0);
        let target = (mean * 9.0).round();
        let mut scores = [0.0f32; 10];
        for (i, s) in scores.iter_mut().enumerate() {
            *s = -2.0 * (i as f32 - target).abs();
        }
        Ok(ScoreVector(scores))
    }
}

pub fn gray_png(value: u8, width: u32, height: u32) -> Vec<u8> {
    encode(
        DynamicImage::ImageLuma8(GrayImage::from_pixel(width, height, Luma([value]))),
        ImageFormat::Png,
    )
}

pub fn rgb_jpeg(value: u8, width: u32, height: u32) -> Vec<u8> {
    encode(
        DynamicImage::ImageRgb8(RgbImage::from_pixel(width, height, Rgb([value, value, value]))),
        ImageFormat::Jpeg,
    )
}

fn encode(img: DynamicImage, format: ImageFormat) -> Vec<u8> {
    let mut buf = Cursor::new(Vec::new());
    img.write_to(&mut buf, format).expect("encode test image");
    buf.into_inner()
}

/// Writes an encoded ONNX graph into `dir` and returns its path.
pub fn write_model(dir: &Path, name: &str, bytes: &[u8]) -> io::Result<PathBuf> {
    let path = dir.join(name);
    fs::write(&path, bytes)?;
    Ok(path)
}
