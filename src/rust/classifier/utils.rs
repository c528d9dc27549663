use ndarray::{Array1, ArrayView1};

/// Numerically stable softmax; the result sums to 1.
pub(crate) fn softmax(logits: ArrayView1<f32>) -> Array1<f32> {
    let max = logits.fold(f32::NEG_INFINITY, |acc, &x| acc.max(x));
    let exps = logits.mapv(|x| (x - max).exp());
    let sum = exps.sum();
    exps / sum
}

/// Index of the largest value; the first occurrence wins on ties.
pub(crate) fn argmax(values: ArrayView1<f32>) -> usize {
    let mut best = 0;
    for (i, &v) in values.iter().enumerate() {
        if v > values[best] {
            best = i;
        }
    }
    best
}
