use std::fmt;

use log::info;

use super::{decode, postprocess, preprocess};
use crate::classifier::{ClassifierBuilder, DigitModel, ModelLoadError};
use crate::error::ClassificationError;
use crate::models::{Prediction, RawImage};
use crate::runtime::RuntimeConfig;
use crate::weights::WeightsSource;

/// Decode → preprocess → classify → score, behind one call.
///
/// Owns the only classifier handle of the process. Both serving shells hold
/// the same service, so they cannot drift apart in how images are prepared.
/// `classify` keeps no per-call state on `self`, so an `Arc<InferenceService>`
/// can serve any number of concurrent callers.
pub struct InferenceService {
    model: Box<dyn DigitModel>,
}

impl InferenceService {
    /// Wraps an already loaded model.
    pub fn new(model: impl DigitModel + 'static) -> Self {
        Self {
            model: Box::new(model),
        }
    }

    /// Loads the ONNX classifier from `weights`, failing fast if it is
    /// missing or does not fit the expected architecture.
    pub fn load(weights: WeightsSource, runtime: RuntimeConfig) -> Result<Self, ModelLoadError> {
        info!("Loading model from {:?}...", weights.path());
        let classifier = ClassifierBuilder::new()
            .with_runtime_config(runtime)
            .with_weights(weights)
            .build()?;

        let model_info = classifier.info();
        info!(
            "Model loaded successfully (input '{}', output '{}')",
            model_info.input_name, model_info.output_name
        );
        Ok(Self::new(classifier))
    }

    /// Classifies one encoded image.
    ///
    /// Decode and preprocessing failures short-circuit before the classifier
    /// is invoked.
    pub fn classify(&self, image: &RawImage) -> Result<Prediction, ClassificationError> {
        let grid = decode::decode(&image.bytes, image.media_type)?;
        let tensor = preprocess::prepare(&grid)?;
        let scores = self.model.infer(&tensor)?;
        Ok(postprocess::score(&scores))
    }
}

impl fmt::Debug for InferenceService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InferenceService").finish_non_exhaustive()
    }
}

impl Drop for InferenceService {
    fn drop(&mut self) {
        info!("Model cleaned up");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classifier::InferenceError;
    use crate::error::DecodeError;
    use crate::models::{InputTensor, MediaType, ScoreVector};
    use image::{DynamicImage, GrayImage, ImageFormat, Luma};
    use std::io::Cursor;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::thread;

    /// Scores each digit by how bright the image is, so different inputs give
    /// different answers.
    struct BrightnessModel;

    impl DigitModel for BrightnessModel {
        fn infer(&self, input: &InputTensor) -> Result<ScoreVector, InferenceError> {
            let mean = input.as_array().mean().unwrap_or(0.0);
            let target = (mean * 9.0).round();
            let mut scores = [0.0f32; 10];
            for (i, s) in scores.iter_mut().enumerate() {
                *s = -(i as f32 - target).abs();
            }
            Ok(ScoreVector(scores))
        }
    }

    struct CountingModel(Arc<AtomicUsize>);

    impl DigitModel for CountingModel {
        fn infer(&self, _input: &InputTensor) -> Result<ScoreVector, InferenceError> {
            self.0.fetch_add(1, Ordering::SeqCst);
            Ok(ScoreVector([0.0; 10]))
        }
    }

    struct FailingModel;

    impl DigitModel for FailingModel {
        fn infer(&self, _input: &InputTensor) -> Result<ScoreVector, InferenceError> {
            Err(InferenceError::Run("device lost".into()))
        }
    }

    fn png_of(value: u8, w: u32, h: u32) -> RawImage {
        let img = DynamicImage::ImageLuma8(GrayImage::from_pixel(w, h, Luma([value])));
        let mut buf = Cursor::new(Vec::new());
        img.write_to(&mut buf, ImageFormat::Png).unwrap();
        RawImage::new(buf.into_inner(), MediaType::Png)
    }

    #[test]
    fn test_classify_in_range() {
        let service = InferenceService::new(BrightnessModel);
        for value in [0, 60, 128, 255] {
            let prediction = service.classify(&png_of(value, 50, 70)).unwrap();
            assert!(prediction.digit <= 9);
            assert!((0.0..=1.0).contains(&prediction.confidence));
        }
        assert_eq!(service.classify(&png_of(0, 28, 28)).unwrap().digit, 0);
        assert_eq!(service.classify(&png_of(255, 28, 28)).unwrap().digit, 9);
    }

    #[test]
    fn test_classify_is_idempotent() {
        let service = InferenceService::new(BrightnessModel);
        let image = png_of(77, 40, 40);
        let a = service.classify(&image).unwrap();
        let b = service.classify(&image).unwrap();
        assert_eq!(a.digit, b.digit);
        assert_eq!(a.confidence.to_bits(), b.confidence.to_bits());
    }

    #[test]
    fn test_decode_failure_never_reaches_model() {
        let calls = Arc::new(AtomicUsize::new(0));
        let service = InferenceService::new(CountingModel(Arc::clone(&calls)));

        let result = service.classify(&RawImage::new(b"garbage".to_vec(), MediaType::Png));
        assert!(matches!(
            result,
            Err(ClassificationError::Decode(DecodeError::Unidentified(_)))
        ));
        assert!(result.unwrap_err().is_decode());
        assert_eq!(calls.load(Ordering::SeqCst), 0);

        service.classify(&png_of(1, 3, 3)).unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_model_failure_is_classification_error() {
        let service = InferenceService::new(FailingModel);
        let err = service.classify(&png_of(10, 28, 28)).unwrap_err();
        assert!(!err.is_decode());
        assert!(err.to_string().contains("device lost"));
    }

    #[test]
    fn test_concurrent_calls_do_not_interfere() {
        let service = Arc::new(InferenceService::new(BrightnessModel));
        let expected: Vec<_> = (0..8u8)
            .map(|i| service.classify(&png_of(i * 32, 30, 30)).unwrap())
            .collect();

        let handles: Vec<_> = (0..8u8)
            .map(|i| {
                let service = Arc::clone(&service);
                thread::spawn(move || service.classify(&png_of(i * 32, 30, 30)).unwrap())
            })
            .collect();

        for (handle, expected) in handles.into_iter().zip(expected) {
            assert_eq!(handle.join().unwrap(), expected);
        }
    }
}
