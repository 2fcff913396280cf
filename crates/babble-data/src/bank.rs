//! Gathering candidate tuples into game batches.

use babble_core::{GameConfig, GameError};
use babble_game::GameInputs;
use ndarray::{Array2, ArrayView2, Axis};
use tracing::debug;

use crate::error::DataError;
use crate::sampler::Candidates;
use crate::stats::FeatureStats;

/// Item features, one row per item, addressed by candidate indices.
#[derive(Clone, Debug, PartialEq)]
pub struct FeatureBank {
    features: Array2<f32>,
}

impl FeatureBank {
    /// A bank over `features`.
    ///
    /// # Errors
    ///
    /// Returns [`DataError::EmptyDataset`] if `features` has no rows.
    pub fn new(features: Array2<f32>) -> Result<Self, DataError> {
        if features.nrows() == 0 {
            return Err(DataError::EmptyDataset);
        }
        Ok(Self { features })
    }

    /// A bank over `features` standardised with `stats`.
    ///
    /// # Errors
    ///
    /// Any error from [`FeatureStats::normalise`] or [`FeatureBank::new`].
    pub fn normalised(
        features: ArrayView2<'_, f32>,
        stats: &FeatureStats,
    ) -> Result<Self, DataError> {
        Self::new(stats.normalise(features)?)
    }

    /// Number of items.
    pub fn len(&self) -> usize {
        self.features.nrows()
    }

    /// `true` if the bank holds no items; never the case for a built bank.
    pub fn is_empty(&self) -> bool {
        self.features.nrows() == 0
    }

    /// Features per item.
    pub fn n_features(&self) -> usize {
        self.features.ncols()
    }

    /// The underlying matrix.
    pub fn features(&self) -> ArrayView2<'_, f32> {
        self.features.view()
    }

    /// Stack `tuples` into one batch: row `b` of the targets is item
    /// `tuples[b][0]`, row `b` of distractor matrix `i` is item
    /// `tuples[b][i + 1]`.
    ///
    /// # Errors
    ///
    /// - [`DataError::EmptyDataset`] if `tuples` is empty.
    /// - [`DataError::NoDistractors`] if the tuples carry no distractors.
    /// - [`DataError::Game`] wrapping [`GameError::ShapeMismatch`] if the
    ///   tuples disagree on width.
    /// - [`DataError::IndexOutOfRange`] for an index past the bank.
    pub fn gather(&self, tuples: &[Candidates]) -> Result<GameInputs, DataError> {
        let width = tuples.first().ok_or(DataError::EmptyDataset)?.len();
        if width < 2 {
            return Err(DataError::NoDistractors);
        }
        for c in tuples {
            if c.len() != width {
                return Err(GameError::ShapeMismatch {
                    what: "candidates",
                    reason: format!(
                        "tuple of {} items in a batch of {width}-item tuples",
                        c.len()
                    ),
                }
                .into());
            }
            if let Some(&index) = c.iter().find(|&&i| i >= self.len()) {
                return Err(DataError::IndexOutOfRange {
                    index,
                    len: self.len(),
                });
            }
        }

        let column = |slot: usize| {
            let rows: Vec<usize> = tuples.iter().map(|c| c[slot]).collect();
            self.features.select(Axis(0), &rows)
        };
        let targets = column(0);
        let distractors = (1..width).map(column).collect();
        Ok(GameInputs::new(targets, distractors))
    }

    /// Split `tuples` into consecutive batches of the game's batch size
    /// and gather each. A trailing partial batch is dropped.
    ///
    /// # Errors
    ///
    /// - [`DataError::Game`] wrapping [`GameError::FeatureMismatch`] if
    ///   the bank's feature width is not the game's.
    /// - Any error from [`gather`](Self::gather).
    pub fn batches(
        &self,
        tuples: &[Candidates],
        config: &GameConfig,
    ) -> Result<Vec<GameInputs>, DataError> {
        if self.n_features() != config.n_features() {
            return Err(GameError::FeatureMismatch {
                input: "feature bank".to_string(),
                expected: config.n_features(),
                found: self.n_features(),
            }
            .into());
        }
        let chunks = tuples.chunks_exact(config.batch_size());
        let dropped = chunks.remainder().len();
        let batches = chunks
            .map(|chunk| self.gather(chunk))
            .collect::<Result<Vec<_>, _>>()?;
        debug!(batches = batches.len(), dropped, "gathered batches");
        Ok(batches)
    }
}
