//! Candidate tuples: one target plus `k` distinct distractors.

use rand::seq::{index, SliceRandom};
use rand::Rng;
use smallvec::SmallVec;
use tracing::debug;

use crate::error::DataError;

/// Item indices for one example: the target first, then its distractors.
pub type Candidates = SmallVec<[usize; 8]>;

/// Draws distractors for every item of a dataset.
///
/// Every item is a target exactly once per pass, in index order or
/// shuffled. Distractors are drawn uniformly without replacement from
/// the other `n - 1` items, so they are distinct and never equal the
/// target.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DistractorSampler {
    n: usize,
    k: usize,
    shuffle: bool,
}

impl DistractorSampler {
    /// A sampler over `n` items drawing `k` distractors per target.
    ///
    /// # Errors
    ///
    /// - [`DataError::NoDistractors`] if `k == 0`.
    /// - [`DataError::TooManyDistractors`] if `k >= n`.
    pub fn new(n: usize, k: usize, shuffle: bool) -> Result<Self, DataError> {
        if k == 0 {
            return Err(DataError::NoDistractors);
        }
        if k >= n {
            return Err(DataError::TooManyDistractors { k, n });
        }
        Ok(Self { n, k, shuffle })
    }

    /// Number of items.
    pub fn len(&self) -> usize {
        self.n
    }

    /// `true` if there are no items; never the case for a built sampler.
    pub fn is_empty(&self) -> bool {
        self.n == 0
    }

    /// Distractors per target.
    pub fn k(&self) -> usize {
        self.k
    }

    /// Whether target order is shuffled on every pass.
    pub fn shuffles(&self) -> bool {
        self.shuffle
    }

    /// Distractors for a single target.
    ///
    /// Indices are drawn from `0..n-1` and shifted past the target, which
    /// keeps the draw uniform over the remaining items.
    pub fn distractors_for<R: Rng + ?Sized>(&self, target: usize, rng: &mut R) -> Candidates {
        let mut out = Candidates::with_capacity(self.k + 1);
        out.push(target);
        out.extend(
            index::sample(rng, self.n - 1, self.k)
                .iter()
                .map(|i| if i >= target { i + 1 } else { i }),
        );
        out
    }

    /// One pass over the dataset: a candidate tuple per item.
    pub fn epoch<R: Rng + ?Sized>(&self, rng: &mut R) -> Vec<Candidates> {
        let mut targets: Vec<usize> = (0..self.n).collect();
        if self.shuffle {
            targets.shuffle(rng);
        }
        let tuples: Vec<_> = targets
            .into_iter()
            .map(|t| self.distractors_for(t, rng))
            .collect();
        debug!(items = self.n, k = self.k, shuffle = self.shuffle, "sampled epoch");
        tuples
    }
}
