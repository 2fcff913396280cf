//! Token selection: Gumbel-softmax relaxation, straight-through
//! hardening and plain categorical draws.
//!
//! In training the Sender draws a relaxed categorical sample
//! `soft = softmax((ln p + g) / tau)` with Gumbel noise `g`, then hardens
//! it to `hard = one_hot(argmax(soft))`. The straight-through value is
//! `soft + (hard - soft)` with the bracket detached from the gradient:
//! numerically it is exactly `hard`, and a backward rule routes the
//! gradient through `soft`. [`StraightThrough`] keeps both halves so
//! that such a rule can be attached without re-running the forward pass.

use babble_core::GameError;
use ndarray::{Array2, ArrayView2, Axis};
use rand::distr::weighted::WeightedIndex;
use rand::distr::Distribution;
use rand::Rng;

use crate::ops::{argmax_rows, one_hot_rows, softmax_rows};

/// A batch of straight-through relaxed tokens.
#[derive(Clone, Debug, PartialEq)]
pub struct StraightThrough {
    /// Forward value: one-hot rows of the arg-max of `soft`.
    pub hard: Array2<f32>,
    /// Gradient surrogate: the relaxed sample.
    pub soft: Array2<f32>,
    /// The arg-max index of each row.
    pub indices: Vec<usize>,
}

impl StraightThrough {
    /// Harden a relaxed sample.
    pub fn from_soft(soft: Array2<f32>) -> Self {
        let indices = argmax_rows(soft.view());
        let hard = one_hot_rows(&indices, soft.ncols());
        Self {
            hard,
            soft,
            indices,
        }
    }

    /// A batch whose hard and soft halves are both the given one-hot rows.
    ///
    /// Used for tokens that carry no sampling noise, such as the start
    /// seed and post-termination padding.
    pub fn constant(indices: Vec<usize>, width: usize) -> Self {
        let hard = one_hot_rows(&indices, width);
        Self {
            soft: hard.clone(),
            hard,
            indices,
        }
    }
}

/// Standard Gumbel noise `-ln(-ln(u))`, `u ~ U(0, 1)`.
pub fn gumbel_noise<R: Rng + ?Sized>(rows: usize, cols: usize, rng: &mut R) -> Array2<f32> {
    Array2::from_shape_simple_fn((rows, cols), || {
        let u: f64 = rng.random::<f64>().max(1e-20); // avoid ln(0)
        (-(-u.ln()).ln()) as f32
    })
}

/// A relaxed categorical sample from each row of `probs` at temperature `tau`.
///
/// A non-positive `tau` is not rejected; it yields NaN/Inf rows.
pub fn gumbel_softmax<R: Rng + ?Sized>(
    probs: ArrayView2<'_, f32>,
    tau: f32,
    rng: &mut R,
) -> Array2<f32> {
    let (rows, cols) = probs.dim();
    let noise = gumbel_noise(rows, cols, rng);
    let perturbed = (probs.mapv(f32::ln) + noise) / tau;
    softmax_rows(perturbed.view())
}

/// Draw a relaxed sample and harden it.
pub fn straight_through<R: Rng + ?Sized>(
    probs: ArrayView2<'_, f32>,
    tau: f32,
    rng: &mut R,
) -> StraightThrough {
    StraightThrough::from_soft(gumbel_softmax(probs, tau, rng))
}

/// One categorical draw per row of `probs`.
///
/// Rows need not be exactly normalised; each is drawn against its own
/// total.
///
/// # Errors
///
/// Returns [`GameError::ShapeMismatch`] if a row has a negative or
/// non-finite weight, or sums to zero.
pub fn categorical<R: Rng + ?Sized>(
    probs: ArrayView2<'_, f32>,
    rng: &mut R,
) -> Result<Vec<usize>, GameError> {
    probs
        .axis_iter(Axis(0))
        .enumerate()
        .map(|(b, row)| {
            let dist = WeightedIndex::new(row.iter().copied()).map_err(|e| {
                GameError::ShapeMismatch {
                    what: "probabilities",
                    reason: format!("row {b}: {e}"),
                }
            })?;
            Ok(dist.sample(rng))
        })
        .collect()
}
