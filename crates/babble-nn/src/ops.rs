//! Row-wise primitives over `[batch, width]` matrices.

use ndarray::{Array1, Array2, ArrayView1, ArrayView2, Axis};

/// Numerically stable softmax of each row.
///
/// Rows containing NaN, or made only of `-inf`, come out as NaN.
pub fn softmax_rows(logits: ArrayView2<'_, f32>) -> Array2<f32> {
    let mut out = logits.to_owned();
    for mut row in out.axis_iter_mut(Axis(0)) {
        let max = row.iter().copied().fold(f32::NEG_INFINITY, f32::max);
        row.mapv_inplace(|v| (v - max).exp());
        let sum = row.sum();
        row.mapv_inplace(|v| v / sum);
    }
    out
}

/// Index of the largest entry; the first one wins ties.
///
/// NaN entries never win. An empty or all-NaN row yields 0.
pub fn argmax(row: ArrayView1<'_, f32>) -> usize {
    let mut best = 0;
    let mut best_value = f32::NEG_INFINITY;
    let mut seen = false;
    for (i, &v) in row.iter().enumerate() {
        if v.is_nan() {
            continue;
        }
        if !seen || v > best_value {
            best = i;
            best_value = v;
            seen = true;
        }
    }
    best
}

/// [`argmax`] of every row.
pub fn argmax_rows(m: ArrayView2<'_, f32>) -> Vec<usize> {
    m.axis_iter(Axis(0)).map(argmax).collect()
}

/// One-hot vector of `width` with a 1.0 at `index`.
pub fn one_hot(index: usize, width: usize) -> Array1<f32> {
    let mut v = Array1::zeros(width);
    if index < width {
        v[index] = 1.0;
    }
    v
}

/// One one-hot row per index.
pub fn one_hot_rows(indices: &[usize], width: usize) -> Array2<f32> {
    let mut m = Array2::zeros((indices.len(), width));
    for (row, &i) in indices.iter().enumerate() {
        if i < width {
            m[[row, i]] = 1.0;
        }
    }
    m
}

/// Row-wise inner product of two equally shaped matrices.
pub fn row_dot(a: ArrayView2<'_, f32>, b: ArrayView2<'_, f32>) -> Array1<f32> {
    (&a * &b).sum_axis(Axis(1))
}
