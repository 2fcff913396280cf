//! Contrastive scoring of the Receiver's guess.
//!
//! Every candidate's score is the inner product of its feature vector
//! with the Receiver's projected vector. The per-example loss is a
//! multi-way hinge, weighted by the message's stopping length:
//!
//! ```text
//! loss[b] = len[b] * Σ_i max(0, margin - target[b] + distractor[b][i])
//! ```
//!
//! An example is correct when the target strictly outscores every
//! distractor; a tie counts as a miss.

use babble_core::GameError;
use ndarray::{Array1, Array2, ArrayView2};
use smallvec::SmallVec;

use crate::validate::check_features;

/// Hinge penalty of one distractor against the target.
pub fn hinge(margin: f32, target_score: f32, distractor_score: f32) -> f32 {
    (margin - target_score + distractor_score).max(0.0)
}

/// `true` iff the target (first candidate) is the strict maximum.
pub fn target_wins(candidates: &[f32]) -> bool {
    match candidates.split_first() {
        Some((&target, rest)) => rest.iter().all(|&d| target > d),
        None => false,
    }
}

/// Scores, losses and correctness for one batch.
#[derive(Clone, Debug, PartialEq)]
pub struct Scores {
    /// `target[b]`.
    pub target: Array1<f32>,
    /// `distractors[[b, i]]`, one column per distractor in input order.
    pub distractors: Array2<f32>,
    /// Length-weighted hinge loss of every example.
    pub loss: Array1<f32>,
    /// Whether the target won, per example.
    pub correct: Vec<bool>,
}

impl Scores {
    /// Mean of the per-example losses.
    pub fn mean_loss(&self) -> f32 {
        self.loss.mean().unwrap_or(f32::NAN)
    }

    /// Fraction of examples where the target won, in `[0, 1]`.
    pub fn accuracy(&self) -> f32 {
        if self.correct.is_empty() {
            return f32::NAN;
        }
        let hits = self.correct.iter().filter(|&&c| c).count();
        hits as f32 / self.correct.len() as f32
    }

    /// Every candidate's score for example `b`, target first.
    pub fn candidates(&self, b: usize) -> SmallVec<[f32; 8]> {
        std::iter::once(self.target[b])
            .chain(self.distractors.row(b).iter().copied())
            .collect()
    }
}

/// Turns the Receiver's guess into scores, loss and accuracy.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ContrastiveScorer {
    margin: f32,
}

impl ContrastiveScorer {
    /// A scorer with the given hinge margin.
    pub fn new(margin: f32) -> Self {
        Self { margin }
    }

    /// The hinge margin.
    pub fn margin(&self) -> f32 {
        self.margin
    }

    /// Score one batch.
    ///
    /// `projected`, `target` and every distractor must share the shape
    /// `[batch, n_features]`; `lengths` holds one stopping length per
    /// example.
    ///
    /// # Errors
    ///
    /// - [`GameError::NoDistractors`] if `distractors` is empty.
    /// - [`GameError::BatchMismatch`] / [`GameError::FeatureMismatch`] if
    ///   any matrix disagrees with `projected`.
    /// - [`GameError::LengthMismatch`] if `lengths` does not cover the batch.
    pub fn score(
        &self,
        projected: ArrayView2<'_, f32>,
        target: ArrayView2<'_, f32>,
        distractors: &[ArrayView2<'_, f32>],
        lengths: &[usize],
    ) -> Result<Scores, GameError> {
        if distractors.is_empty() {
            return Err(GameError::NoDistractors);
        }
        let (batch, features) = projected.dim();
        check_features("target", target, batch, features)?;
        for (i, d) in distractors.iter().enumerate() {
            check_features(&format!("distractor {i}"), d.view(), batch, features)?;
        }
        if lengths.len() != batch {
            return Err(GameError::LengthMismatch {
                expected: batch,
                found: lengths.len(),
            });
        }

        let target_scores = babble_nn::ops::row_dot(target, projected);
        let mut distractor_scores = Array2::zeros((batch, distractors.len()));
        for (i, d) in distractors.iter().enumerate() {
            distractor_scores
                .column_mut(i)
                .assign(&babble_nn::ops::row_dot(d.view(), projected));
        }

        let mut loss = Array1::zeros(batch);
        let mut correct = Vec::with_capacity(batch);
        for b in 0..batch {
            let t = target_scores[b];
            let row = distractor_scores.row(b);
            let hinge_sum: f32 = row.iter().map(|&d| hinge(self.margin, t, d)).sum();
            loss[b] = hinge_sum * lengths[b] as f32;

            let candidates: SmallVec<[f32; 8]> =
                std::iter::once(t).chain(row.iter().copied()).collect();
            correct.push(target_wins(&candidates));
        }

        Ok(Scores {
            target: target_scores,
            distractors: distractor_scores,
            loss,
            correct,
        })
    }
}

impl Default for ContrastiveScorer {
    fn default() -> Self {
        Self::new(1.0)
    }
}
