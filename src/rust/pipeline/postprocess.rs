use ndarray::ArrayView1;

use crate::classifier::utils::{argmax, softmax};
use crate::models::{Prediction, ScoreVector};

/// Turns logits into a digit and its softmax probability.
///
/// Both values come from the same `ScoreVector`; ties resolve to the lowest
/// digit.
pub fn score(scores: &ScoreVector) -> Prediction {
    let logits = ArrayView1::from(&scores.0[..]);
    let digit = argmax(logits);
    let probs = softmax(logits);

    Prediction {
        digit: digit as u8,
        confidence: probs[digit].clamp(0.0, 1.0),
    }
}
